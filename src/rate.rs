//! Decimation and interpolation rate control.

use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Rate controller.
///
/// This struct holds the decimation (or interpolation) rate of a DSP channel
/// together with the set of rates that the device supports. The stored rate is
/// always a member of the allowed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateController {
    rate: u32,
    allowed: BTreeSet<u32>,
}

impl RateController {
    /// Creates a new rate controller.
    ///
    /// Fails with [`Error::UnsupportedRate`] if the initial `rate` is not in
    /// the `allowed` set.
    pub fn new(rate: u32, allowed: BTreeSet<u32>) -> Result<RateController> {
        if !allowed.contains(&rate) {
            return Err(Error::UnsupportedRate { rate });
        }
        Ok(RateController { rate, allowed })
    }

    /// Gives the current rate.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Gives the set of allowed rates.
    pub fn allowed(&self) -> &BTreeSet<u32> {
        &self.allowed
    }

    /// Sets a new rate.
    ///
    /// If `rate` is not allowed, the current rate is kept and
    /// [`Error::UnsupportedRate`] is returned.
    pub fn set_rate(&mut self, rate: u32) -> Result<()> {
        if !self.allowed.contains(&rate) {
            return Err(Error::UnsupportedRate { rate });
        }
        self.rate = rate;
        Ok(())
    }

    /// Gives the baseband sample rate for a given clock rate.
    ///
    /// This is the `clock_rate` divided by the current rate.
    pub fn bandwidth(&self, clock_rate: f64) -> f64 {
        clock_rate / f64::from(self.rate)
    }
}
