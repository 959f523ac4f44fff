//! usrp-dsp configures the DSP front end of a USRP2 software defined radio.
//! It tunes the NCOs of the digital down-converter (DDC) and up-converter
//! (DUC), sets their decimation and interpolation, compensates the gain of
//! the DUC CIC interpolator, and sends stream commands to the DDC over the
//! control link. The DSP channels are accessed through named properties.

#![warn(missing_docs)]

pub mod app;
pub mod args;
pub mod device;
pub mod dsp;
pub mod error;
pub mod gain;
#[cfg(test)]
mod mock;
pub mod rate;
pub mod regs;
pub mod stream;
pub mod transport;
pub mod tuner;

pub use error::{Error, Result};
