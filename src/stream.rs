//! Stream commands.
//!
//! This module encodes the stream commands that start and stop the sample
//! stream of the DDC and sends them to the device through a
//! [`ControlChannel`].
//!
//! The request is laid out in network byte order as follows:
//!
//! | field        | type |
//! |--------------|------|
//! | command id   | u32  |
//! | now          | u8   |
//! | seconds      | u32  |
//! | ticks        | u32  |
//! | continuous   | u8   |
//! | chain        | u8   |
//! | num samples  | u32  |
//!
//! The response starts with a u32 acknowledgment identifier.

use crate::dsp::constants::{CTRL_ID_STREAM_COMMAND, CTRL_ID_STREAM_COMMAND_ACK};
use crate::error::Result;
use crate::transport::{exchange_acked, ControlChannel};
use bytes::{BufMut, Bytes, BytesMut};
use usrp_json::{StreamCommand, StreamMode};

/// Length in bytes of an encoded stream command.
pub const STREAM_COMMAND_LEN: usize = 19;

/// State of a [`StreamCommandEncoder`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EncoderState {
    /// No exchange in flight. A new command can be issued.
    Idle,
    /// A request has been sent and its acknowledgment is awaited.
    AwaitingAck,
}

/// Stream command encoder.
///
/// Sends stream commands over a control channel and checks that the device
/// acknowledges them. A command that is not acknowledged fails with
/// [`Error::ProtocolAckMismatch`](crate::Error::ProtocolAckMismatch) and is not
/// retried. The encoder goes back to [`EncoderState::Idle`] after every
/// command, whether it succeeded or not.
#[derive(Debug)]
pub struct StreamCommandEncoder<C> {
    channel: C,
    state: EncoderState,
}

/// Encodes a stream command request.
///
/// The continuous and chain flags are derived from the mode. For
/// [`StreamMode::StopContinuous`] the number of samples is always sent as 0.
pub fn encode(command: &StreamCommand) -> Bytes {
    let (continuous, chain, num_samples) = match command.mode {
        StreamMode::StartContinuous => (true, false, command.num_samples),
        StreamMode::StopContinuous => (false, false, 0),
        StreamMode::NumSamplesAndDone => (false, false, command.num_samples),
        StreamMode::NumSamplesAndMore => (false, true, command.num_samples),
    };
    let mut request = BytesMut::with_capacity(STREAM_COMMAND_LEN);
    request.put_u32(CTRL_ID_STREAM_COMMAND);
    request.put_u8(command.stream_now.into());
    request.put_u32(command.time_secs);
    request.put_u32(command.time_ticks);
    request.put_u8(continuous.into());
    request.put_u8(chain.into());
    request.put_u32(num_samples);
    request.freeze()
}

impl<C: ControlChannel> StreamCommandEncoder<C> {
    /// Creates a new encoder that sends its commands through `channel`.
    pub fn new(channel: C) -> StreamCommandEncoder<C> {
        StreamCommandEncoder {
            channel,
            state: EncoderState::Idle,
        }
    }

    /// Gives the current state of the encoder.
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Sends a stream command and waits for its acknowledgment.
    pub fn issue(&mut self, command: &StreamCommand) -> Result<()> {
        if self.state != EncoderState::Idle {
            // only reachable if a previous exchange panicked
            tracing::warn!("previous stream command exchange did not complete");
        }
        let request = encode(command);
        tracing::info!(
            mode = %command.mode,
            num_samples = command.num_samples,
            stream_now = command.stream_now,
            "issuing stream command"
        );
        self.state = EncoderState::AwaitingAck;
        let result = exchange_acked(&mut self.channel, &request, CTRL_ID_STREAM_COMMAND_ACK);
        self.state = EncoderState::Idle;
        if let Err(err) = &result {
            tracing::error!("stream command failed: {err}");
        }
        result.map(|_| ())
    }
}
