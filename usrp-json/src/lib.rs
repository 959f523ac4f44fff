//! usrp-json contains the JSON schemas for the property values and stream
//! commands used by usrp-dsp.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Streaming modes.
///
/// This enum lists the ways in which the receive DSP can be asked to stream
/// samples.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StreamMode {
    /// Stream continuously until a stop command is received.
    StartContinuous,
    /// Stop a continuous stream.
    StopContinuous,
    /// Stream a fixed number of samples and then stop.
    NumSamplesAndDone,
    /// Stream a fixed number of samples and expect another command to be
    /// chained after this one.
    NumSamplesAndMore,
}

macro_rules! impl_str_conv {
    ($ty:ty, $($s:expr => $v:ident),*) => {
        impl std::str::FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, ()> {
                Ok(match s {
                    $(
                        $s => <$ty>::$v,
                    )*
                        _ => return Err(()),
                })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", match self {
                    $(
                        <$ty>::$v => $s,
                    )*
                })
            }
        }
    }
}

impl_str_conv!(StreamMode,
               "start_continuous" => StartContinuous,
               "stop_continuous" => StopContinuous,
               "num_samps_and_done" => NumSamplesAndDone,
               "num_samps_and_more" => NumSamplesAndMore);

/// Stream command JSON schema.
///
/// A stream command tells the receive DSP when to start or stop sending
/// samples and how many of them to send.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StreamCommand {
    /// Streaming mode.
    pub mode: StreamMode,
    /// Number of samples to stream.
    ///
    /// Ignored by the hardware for continuous streaming and forced to zero for
    /// [`StreamMode::StopContinuous`].
    #[serde(default)]
    pub num_samples: u32,
    /// Start the command as soon as it is received.
    ///
    /// If this is `false`, the command starts at the time given by
    /// `time_secs` and `time_ticks`.
    #[serde(default = "default_stream_now")]
    pub stream_now: bool,
    /// Whole seconds of the start time.
    #[serde(default)]
    pub time_secs: u32,
    /// Clock ticks of the start time.
    #[serde(default)]
    pub time_ticks: u32,
}

fn default_stream_now() -> bool {
    true
}

impl StreamCommand {
    /// Creates a stream command that is executed immediately.
    pub fn now(mode: StreamMode, num_samples: u32) -> StreamCommand {
        StreamCommand {
            mode,
            num_samples,
            stream_now: true,
            time_secs: 0,
            time_ticks: 0,
        }
    }

    /// Creates a stream command that is executed at a given time.
    pub fn at(mode: StreamMode, num_samples: u32, time_secs: u32, time_ticks: u32) -> StreamCommand {
        StreamCommand {
            mode,
            num_samples,
            stream_now: false,
            time_secs,
            time_ticks,
        }
    }
}

/// Property value JSON schema.
///
/// This is the value returned when reading a DSP channel property. Each
/// property always produces the same variant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Text value, such as the channel name.
    String(String),
    /// Decimation or interpolation rate.
    Rate(u32),
    /// Set of allowed decimation or interpolation rates.
    Rates(BTreeSet<u32>),
    /// Floating point value, such as a frequency or a sample rate in Hz.
    Double(f64),
}
