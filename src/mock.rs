//! Test doubles for the register and control interfaces.

use crate::regs::RegisterIo;
use crate::transport::ControlChannel;
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

/// Register file that records every write.
#[derive(Debug, Default)]
pub struct MockRegisters {
    pub values: HashMap<u32, u32>,
    pub writes: Vec<(u32, u32)>,
}

impl MockRegisters {
    pub fn shared() -> Arc<Mutex<MockRegisters>> {
        Arc::new(Mutex::new(MockRegisters::default()))
    }
}

impl RegisterIo for MockRegisters {
    fn write_register(&mut self, addr: u32, value: u32) -> io::Result<()> {
        self.writes.push((addr, value));
        self.values.insert(addr, value);
        Ok(())
    }

    fn read_register(&mut self, addr: u32) -> io::Result<u32> {
        Ok(self.values.get(&addr).copied().unwrap_or(0))
    }
}

/// Control channel that answers with scripted responses.
///
/// When the script is exhausted, the exchange times out.
#[derive(Debug, Default)]
pub struct MockControl {
    pub requests: Vec<Bytes>,
    pub responses: VecDeque<Bytes>,
}

impl MockControl {
    pub fn shared() -> Arc<Mutex<MockControl>> {
        Arc::new(Mutex::new(MockControl::default()))
    }

    pub fn push_ack(&mut self, id: u32) {
        let mut response = BytesMut::new();
        response.put_u32(id);
        self.responses.push_back(response.freeze());
    }
}

impl ControlChannel for MockControl {
    fn exchange(&mut self, request: &[u8], _expected: u32) -> io::Result<Bytes> {
        self.requests.push(Bytes::copy_from_slice(request));
        self.responses
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "no response"))
    }
}

/// Device link with both register and control access, as
/// [`UdpControl`](crate::transport::UdpControl) gives.
#[derive(Debug, Default)]
pub struct MockDevice {
    pub regs: MockRegisters,
    pub control: MockControl,
}

impl MockDevice {
    /// Gives a shared link that acknowledges the first `acks` stream commands.
    pub fn shared_acking(acks: usize) -> Arc<Mutex<MockDevice>> {
        let mut device = MockDevice::default();
        for _ in 0..acks {
            device
                .control
                .push_ack(crate::dsp::constants::CTRL_ID_STREAM_COMMAND_ACK);
        }
        Arc::new(Mutex::new(device))
    }
}

impl RegisterIo for MockDevice {
    fn write_register(&mut self, addr: u32, value: u32) -> io::Result<()> {
        self.regs.write_register(addr, value)
    }

    fn read_register(&mut self, addr: u32) -> io::Result<u32> {
        self.regs.read_register(addr)
    }
}

impl ControlChannel for MockDevice {
    fn exchange(&mut self, request: &[u8], expected: u32) -> io::Result<Bytes> {
        self.control.exchange(request, expected)
    }
}
