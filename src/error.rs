//! DSP control errors.
//!
//! This module defines the [`Error`] type returned by the DSP channels and the
//! components they are built from.

/// DSP control error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested frequency is beyond the Nyquist limit of the clock.
    #[error("frequency {frequency} Hz is out of range with clock rate {clock_rate} Hz")]
    InvalidFrequency {
        /// Requested frequency in Hz.
        frequency: f64,
        /// Reference clock rate in Hz.
        clock_rate: f64,
    },
    /// The requested rate is not in the set of rates allowed by the device.
    #[error("rate {rate} is not supported by the device")]
    UnsupportedRate {
        /// Requested decimation or interpolation.
        rate: u32,
    },
    /// The property name is not recognized by the channel.
    #[error("unknown property {0:?}")]
    UnknownProperty(String),
    /// A property value given as text could not be parsed.
    #[error("invalid value {value:?} for property {property}")]
    InvalidValue {
        /// Property name.
        property: String,
        /// Offending value.
        value: String,
    },
    /// The device did not acknowledge a control request as expected.
    #[error(
        "control acknowledgment mismatch: expected {expected:#010x}, received {}",
        fmt_ack(.received)
    )]
    ProtocolAckMismatch {
        /// Expected acknowledgment identifier.
        expected: u32,
        /// Received identifier, or `None` if no valid response arrived.
        received: Option<u32>,
    },
    /// The register or control link failed.
    #[error("transport error")]
    Transport(#[from] std::io::Error),
}

fn fmt_ack(received: &Option<u32>) -> String {
    match received {
        Some(id) => format!("{id:#010x}"),
        None => "nothing".to_string(),
    }
}

/// Result type with [`Error`] as its error.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        let e = Error::ProtocolAckMismatch {
            expected: 0x7d,
            received: Some(0x20),
        };
        assert_eq!(
            e.to_string(),
            "control acknowledgment mismatch: expected 0x0000007d, received 0x00000020"
        );
        let e = Error::ProtocolAckMismatch {
            expected: 0x7d,
            received: None,
        };
        assert_eq!(
            e.to_string(),
            "control acknowledgment mismatch: expected 0x0000007d, received nothing"
        );
        assert_eq!(
            Error::UnknownProperty("gain".to_string()).to_string(),
            "unknown property \"gain\""
        );
    }
}
