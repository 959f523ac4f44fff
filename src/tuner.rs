//! NCO frequency tuning.
//!
//! This module converts a frequency offset into the phase increment word of
//! the 32-bit NCOs in the DDC and DUC.

use crate::error::{Error, Result};

/// Result of tuning an NCO.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TuningResult {
    /// Phase increment word to write to the NCO frequency register.
    pub word: i32,
    /// Frequency in Hz that the NCO actually produces with `word`.
    pub achieved_frequency: f64,
}

/// Calculates the NCO word for a frequency offset.
///
/// The `frequency` is given in Hz and must lie in the Nyquist zone of the
/// `clock_rate`, which is the sample rate at which the NCO runs. The word is
/// the phase increment per clock in units of 2^-32 cycles, rounded to the
/// nearest integer (ties away from zero). A frequency of exactly half the clock
/// rate wraps around to the most negative word, as the phase accumulator in
/// the hardware does.
///
/// Because of the finite NCO resolution, the achieved frequency differs in
/// general from the requested one. Callers should store the achieved frequency
/// returned in [`TuningResult`].
pub fn tune(frequency: f64, clock_rate: f64) -> Result<TuningResult> {
    if !(-0.5 * clock_rate..=0.5 * clock_rate).contains(&frequency) {
        return Err(Error::InvalidFrequency {
            frequency,
            clock_rate,
        });
    }
    const SCALE: f64 = (1u64 << 32) as f64;
    let cycles_per_sample = frequency / clock_rate;
    // the rounded value is within [-2^31, 2^31]; truncating to 32 bits wraps
    let word = (cycles_per_sample * SCALE).round() as i64 as i32;
    let achieved_frequency = (f64::from(word) / SCALE) * clock_rate;
    Ok(TuningResult {
        word,
        achieved_frequency,
    })
}
