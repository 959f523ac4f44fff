//! USRP2 DSP constants.
//!
//! This module contains constants that define the register map, the control
//! protocol identifiers and the power-on defaults of the USRP2 DSP chain.

/// Decimation used by the DDC after the device is opened.
pub const DEFAULT_DECIMATION: u32 = 16;

/// Interpolation used by the DUC after the device is opened.
pub const DEFAULT_INTERPOLATION: u32 = 16;

/// Master clock rate of the USRP2 DSP chain in Hz.
pub const DEFAULT_CLOCK_RATE: f64 = 100e6;

/// Fixed IQ scaling applied by the DDC.
pub const RX_SCALE_IQ: i16 = 1024;

/// Largest interpolation handled by the CIC alone in the DUC.
///
/// Higher interpolations are reached by adding halfband stages after the CIC.
pub const MAX_CIC_INTERPOLATION: u32 = 128;

/// Gain of the DUC datapath after the CIC, calibrated on hardware.
pub const DUC_GAIN_CALIBRATION: f64 = 1.65;

/// Base address of the settings bus.
const SETTINGS_BASE: u32 = 0xd000;

const fn settings_reg(n: u32) -> u32 {
    SETTINGS_BASE + 4 * n
}

const SR_RX_DSP: u32 = 160;
const SR_TX_DSP: u32 = 208;

/// DDC NCO frequency word.
pub const FR_DSP_RX_FREQ: u32 = settings_reg(SR_RX_DSP);
/// DDC IQ scale word.
pub const FR_DSP_RX_SCALE_IQ: u32 = settings_reg(SR_RX_DSP + 1);
/// DDC decimation.
pub const FR_DSP_RX_DECIM_RATE: u32 = settings_reg(SR_RX_DSP + 2);

/// DUC NCO frequency word.
pub const FR_DSP_TX_FREQ: u32 = settings_reg(SR_TX_DSP);
/// DUC IQ scale word.
pub const FR_DSP_TX_SCALE_IQ: u32 = settings_reg(SR_TX_DSP + 1);
/// DUC interpolation.
pub const FR_DSP_TX_INTERP_RATE: u32 = settings_reg(SR_TX_DSP + 2);

/// Control request: send a stream command to the DDC.
pub const CTRL_ID_STREAM_COMMAND: u32 = b'{' as u32;
/// Control response: stream command accepted.
pub const CTRL_ID_STREAM_COMMAND_ACK: u32 = b'}' as u32;
/// Control request: write a register.
pub const CTRL_ID_POKE: u32 = b'p' as u32;
/// Control response: register written.
pub const CTRL_ID_POKE_ACK: u32 = b'P' as u32;
/// Control request: read a register.
pub const CTRL_ID_PEEK: u32 = b'r' as u32;
/// Control response: register value.
pub const CTRL_ID_PEEK_ACK: u32 = b'R' as u32;

/// Gives the decimation and interpolation rates supported by the USRP2.
///
/// Every rate from 4 to 128 is supported by the CIC alone. Up to 256 the rate
/// must be even, and up to 512 it must be a multiple of 4, since each halfband
/// stage doubles the rate.
pub fn default_allowed_rates() -> std::collections::BTreeSet<u32> {
    (4..=128)
        .chain((130..=256).step_by(2))
        .chain((260..=512).step_by(4))
        .collect()
}
