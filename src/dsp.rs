//! DSP channels.
//!
//! This module contains the DDC ([`RxDsp`]) and DUC ([`TxDsp`]) channels of the
//! USRP2. Both are controlled through the [`DspChannel`] trait, which gives
//! access to a closed set of properties per channel kind. Properties can also
//! be addressed by name, which is how the command line interface uses them.
//!
//! Every validated change is written to the FPGA registers straight away, so
//! the registers always mirror the configuration held by the channel.

use crate::error::{Error, Result};
use crate::rate::RateController;
use crate::tuner;
use std::collections::BTreeSet;
use std::str::FromStr;
use usrp_json::PropertyValue;

pub mod constants;
mod rx;
mod tx;

pub use rx::{RxDsp, RxProperty, RxSetting};
pub use tx::{TxDsp, TxProperty, TxSetting};

/// DSP channel property access.
///
/// Each channel kind has a `Property` enum listing the properties that can be
/// read and a `Setting` enum listing the properties that can be written,
/// together with their new value.
pub trait DspChannel {
    /// Readable properties.
    type Property: FromStr<Err = Error> + Copy;
    /// Writable properties with their values.
    type Setting;

    /// Names of all the properties of the channel, readable or writable.
    const PROPERTY_NAMES: &'static [&'static str];

    /// Reads a property.
    ///
    /// This has no side effects.
    fn get(&self, property: Self::Property) -> PropertyValue;

    /// Writes a property.
    ///
    /// If the value is not valid, an error is returned and neither the
    /// configuration nor the registers are modified.
    fn set(&mut self, setting: Self::Setting) -> Result<()>;

    /// Builds a setting from a property name and a value given as text.
    fn parse_setting(name: &str, value: &str) -> Result<Self::Setting>;

    /// Reads a property given its name.
    ///
    /// Fails with [`Error::UnknownProperty`] if there is no readable property
    /// with that name.
    fn get_by_name(&self, name: &str) -> Result<PropertyValue> {
        Ok(self.get(name.parse()?))
    }

    /// Writes a property given its name and a value given as text.
    ///
    /// Fails with [`Error::UnknownProperty`] if there is no writable property
    /// with that name.
    fn set_by_name(&mut self, name: &str, value: &str) -> Result<()> {
        let setting = Self::parse_setting(name, value)?;
        self.set(setting)
    }
}

/// Configuration of a DSP channel.
///
/// This holds the decimation or interpolation rate and the NCO frequency
/// offset of a channel. The rate is always one of the allowed rates and the
/// frequency offset is always within the Nyquist zone of the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    rate: RateController,
    frequency: f64,
}

impl ChannelConfig {
    /// Creates a configuration with the given `rate` and zero frequency offset.
    pub fn new(rate: u32, allowed_rates: BTreeSet<u32>) -> Result<ChannelConfig> {
        Ok(ChannelConfig {
            rate: RateController::new(rate, allowed_rates)?,
            frequency: 0.0,
        })
    }

    /// Gives the decimation or interpolation rate.
    pub fn rate(&self) -> u32 {
        self.rate.rate()
    }

    /// Gives the set of allowed rates.
    pub fn allowed_rates(&self) -> &BTreeSet<u32> {
        self.rate.allowed()
    }

    /// Gives the frequency offset in Hz.
    ///
    /// This is the frequency achieved by the NCO, which can differ slightly
    /// from the one that was requested.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Gives the baseband sample rate for a given clock rate.
    pub fn bandwidth(&self, clock_rate: f64) -> f64 {
        self.rate.bandwidth(clock_rate)
    }

    /// Changes the rate and writes it to the registers with `sync`.
    ///
    /// If `sync` fails, the previous rate is restored and written again.
    fn update_rate(&mut self, rate: u32, mut sync: impl FnMut(u32) -> Result<()>) -> Result<()> {
        let previous = self.rate.rate();
        self.rate.set_rate(rate)?;
        if let Err(e) = sync(rate) {
            self.rate.set_rate(previous)?;
            if let Err(err) = sync(previous) {
                tracing::error!("error reverting rate registers: {err}");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Tunes the NCO and writes the frequency word with `sync`.
    ///
    /// The stored frequency is only updated if `sync` succeeds.
    fn update_frequency(
        &mut self,
        frequency: f64,
        clock_rate: f64,
        sync: impl FnOnce(i32) -> Result<()>,
    ) -> Result<()> {
        let tuning = tuner::tune(frequency, clock_rate)?;
        sync(tuning.word)?;
        tracing::debug!(
            requested = frequency,
            achieved = tuning.achieved_frequency,
            word = tuning.word,
            "NCO tuned"
        );
        self.frequency = tuning.achieved_frequency;
        Ok(())
    }
}

fn parse_value<T: FromStr>(property: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::InvalidValue {
        property: property.to_string(),
        value: value.to_string(),
    })
}

macro_rules! impl_property_names {
    ($ty:ty, $($s:expr => $v:ident),*) => {
        impl $ty {
            /// All the readable properties.
            pub const ALL: &'static [$ty] = &[$(<$ty>::$v),*];
        }

        impl std::str::FromStr for $ty {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> crate::error::Result<Self> {
                Ok(match s {
                    $(
                        $s => <$ty>::$v,
                    )*
                        _ => return Err(crate::error::Error::UnknownProperty(s.to_string())),
                })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", match self {
                    $(
                        <$ty>::$v => $s,
                    )*
                })
            }
        }
    }
}

pub(crate) use impl_property_names;
