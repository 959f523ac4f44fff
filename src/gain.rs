//! DUC gain compensation.
//!
//! The DUC interpolates with a CIC filter, optionally followed by halfband
//! stages. The CIC gain grows with the cube of its interpolation, so the
//! samples are scaled before the CIC to keep the output level independent of
//! the interpolation. The halfband stages have unity gain and need no
//! compensation.

use crate::dsp::constants::{DUC_GAIN_CALIBRATION, MAX_CIC_INTERPOLATION};

/// Gives the interpolation done by the CIC for a total interpolation.
///
/// Each halfband stage interpolates by 2, and halfbands are added while the
/// CIC interpolation would be larger than the CIC can handle.
pub fn cic_interpolation(interpolation: u32) -> u32 {
    let mut cic = interpolation;
    while cic > MAX_CIC_INTERPOLATION {
        cic /= 2;
    }
    cic
}

/// Calculates the IQ scale that compensates the DUC gain.
///
/// The scale is `4096 * 2^ceil(log2(g)) / (1.65 * g)`, where `g` is the cube
/// of the CIC interpolation, rounded to the nearest integer. The power of two
/// is the bit growth that the FPGA already removes by shifting, and the
/// constant 1.65 was calibrated on hardware. The same scale is used for the
/// in-phase and the quadrature components.
pub fn duc_scale(interpolation: u32) -> i16 {
    let cic = f64::from(cic_interpolation(interpolation));
    let gain = cic.powi(3);
    let scale = (4096.0 * 2f64.powf(gain.log2().ceil())) / (DUC_GAIN_CALIBRATION * gain);
    scale
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Packs the in-phase and quadrature scales into a register word.
///
/// The in-phase scale goes in the upper 16 bits.
pub fn iq_scale_word(i: i16, q: i16) -> u32 {
    (u32::from(i as u16) << 16) | u32::from(q as u16)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cic_interpolation() {
        assert_eq!(super::cic_interpolation(16), 16);
        assert_eq!(super::cic_interpolation(128), 128);
        assert_eq!(super::cic_interpolation(130), 65);
        assert_eq!(super::cic_interpolation(256), 128);
        assert_eq!(super::cic_interpolation(512), 128);
        assert_eq!(super::cic_interpolation(260), 65);
    }

    #[test]
    fn duc_scale() {
        // gain 4096 = 2^12, so the scale is 4096 / 1.65 = 2482.42
        assert_eq!(super::duc_scale(16), 2482);
        assert_eq!(super::duc_scale(16), super::duc_scale(16));
        // gain 125, next power of two 128: 4096 * 128 / (1.65 * 125) = 2542.06
        assert_eq!(super::duc_scale(5), 2542);
        // gain 27, next power of two 32: 4096 * 32 / (1.65 * 27) = 2942.14
        assert_eq!(super::duc_scale(3), 2942);
        // halfbands do not change the scale
        assert_eq!(super::duc_scale(256), super::duc_scale(128));
        assert_eq!(super::duc_scale(1), 2482);
    }

    #[test]
    fn iq_scale_word() {
        assert_eq!(super::iq_scale_word(1024, 1024), 0x0400_0400);
        assert_eq!(super::iq_scale_word(-1, 1), 0xffff_0001);
        assert_eq!(super::iq_scale_word(2482, 2482), 0x09b2_09b2);
    }
}
