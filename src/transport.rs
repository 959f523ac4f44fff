//! Control link.
//!
//! This module defines the [`ControlChannel`] trait, used to exchange control
//! packets with the device, and [`UdpControl`], which implements it over the
//! USRP2 UDP control port. `UdpControl` also gives register access by sending
//! peek and poke control packets.

use crate::dsp::constants::{CTRL_ID_PEEK, CTRL_ID_PEEK_ACK, CTRL_ID_POKE, CTRL_ID_POKE_ACK};
use crate::error::Error;
use crate::regs::{lock, RegisterIo};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Blocking request/response channel.
///
/// Each call to [`ControlChannel::exchange`] sends one request and waits for
/// its response, so there is never more than one request outstanding.
/// Implementations report a missing response with an error of kind
/// [`io::ErrorKind::TimedOut`] or [`io::ErrorKind::WouldBlock`].
pub trait ControlChannel {
    /// Sends `request` and returns the response.
    ///
    /// `expected` is the acknowledgment identifier that the response should
    /// start with. Implementations may skip responses that start with a
    /// different identifier, such as late answers to earlier requests.
    fn exchange(&mut self, request: &[u8], expected: u32) -> io::Result<Bytes>;
}

impl<T: ControlChannel + ?Sized> ControlChannel for &mut T {
    fn exchange(&mut self, request: &[u8], expected: u32) -> io::Result<Bytes> {
        (**self).exchange(request, expected)
    }
}

/// Shares a control channel between several owners.
///
/// The lock is held for the whole exchange.
impl<T: ControlChannel + ?Sized> ControlChannel for Arc<Mutex<T>> {
    fn exchange(&mut self, request: &[u8], expected: u32) -> io::Result<Bytes> {
        lock(&**self)?.exchange(request, expected)
    }
}

/// Consumes the acknowledgment identifier at the start of a response.
///
/// Returns [`Error::ProtocolAckMismatch`] if the response is too short to
/// contain an identifier or if the identifier is not `expected`.
pub fn read_ack(response: &mut impl Buf, expected: u32) -> Result<(), Error> {
    if response.remaining() < 4 {
        return Err(Error::ProtocolAckMismatch {
            expected,
            received: None,
        });
    }
    match response.get_u32() {
        id if id == expected => Ok(()),
        id => Err(Error::ProtocolAckMismatch {
            expected,
            received: Some(id),
        }),
    }
}

/// Performs an exchange and checks the acknowledgment of the response.
///
/// A missing response is reported as [`Error::ProtocolAckMismatch`]. On
/// success, the rest of the response after the identifier is returned.
pub fn exchange_acked<C: ControlChannel + ?Sized>(
    channel: &mut C,
    request: &[u8],
    expected: u32,
) -> Result<Bytes, Error> {
    let mut response = match channel.exchange(request, expected) {
        Ok(response) => response,
        Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
            return Err(Error::ProtocolAckMismatch {
                expected,
                received: None,
            })
        }
        Err(e) => return Err(Error::Transport(e)),
    };
    read_ack(&mut response, expected)?;
    Ok(response)
}

/// USRP2 control link over UDP.
///
/// Responses that arrive after their exchange has timed out are discarded, so
/// that they are never taken as the response to a later request.
#[derive(Debug)]
pub struct UdpControl {
    socket: UdpSocket,
    addr: SocketAddr,
    timeout: Duration,
}

// large enough for any control response
const MAX_RESPONSE_LEN: usize = 1500;

impl UdpControl {
    /// Opens a control link to the device at `addr`.
    ///
    /// Each exchange waits at most `timeout` for the response.
    pub fn connect(addr: SocketAddr, timeout: Duration) -> io::Result<UdpControl> {
        let bind = if addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(bind)?;
        socket.connect(addr)?;
        tracing::info!("opened control link to {addr} from {}", socket.local_addr()?);
        Ok(UdpControl {
            socket,
            addr,
            timeout,
        })
    }

    /// Gives the address of the device.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    fn discard_pending(&mut self, buffer: &mut [u8]) -> io::Result<()> {
        self.socket.set_nonblocking(true)?;
        let result = loop {
            match self.socket.recv(buffer) {
                Ok(len) => tracing::warn!(len, "discarding late control response"),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                // ICMP errors of earlier sends are reported once
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => continue,
                Err(e) => break Err(e),
            }
        };
        self.socket.set_nonblocking(false)?;
        result
    }
}

impl ControlChannel for UdpControl {
    fn exchange(&mut self, request: &[u8], expected: u32) -> io::Result<Bytes> {
        let mut buffer = vec![0; MAX_RESPONSE_LEN];
        self.discard_pending(&mut buffer)?;
        self.socket.send(request)?;
        let deadline = Instant::now() + self.timeout;
        // last response with a wrong identifier, returned if nothing better comes
        let mut unexpected = None;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.socket.set_read_timeout(Some(remaining))?;
            let len = match self.socket.recv(&mut buffer) {
                Ok(len) => len,
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    break
                }
                Err(e) => return Err(e),
            };
            tracing::trace!(request_len = request.len(), response_len = len, "control exchange");
            let response = Bytes::copy_from_slice(&buffer[..len]);
            if response.len() >= 4 && response[..4] == expected.to_be_bytes() {
                return Ok(response);
            }
            tracing::warn!(len, expected, "skipping unexpected control response");
            unexpected = Some(response);
        }
        unexpected.ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "no control response"))
    }
}

fn into_io_error(e: Error) -> io::Error {
    match e {
        Error::Transport(e) => e,
        e => io::Error::new(io::ErrorKind::InvalidData, e),
    }
}

impl RegisterIo for UdpControl {
    fn write_register(&mut self, addr: u32, value: u32) -> io::Result<()> {
        let mut request = BytesMut::with_capacity(12);
        request.put_u32(CTRL_ID_POKE);
        request.put_u32(addr);
        request.put_u32(value);
        exchange_acked(self, &request, CTRL_ID_POKE_ACK).map_err(into_io_error)?;
        Ok(())
    }

    fn read_register(&mut self, addr: u32) -> io::Result<u32> {
        let mut request = BytesMut::with_capacity(8);
        request.put_u32(CTRL_ID_PEEK);
        request.put_u32(addr);
        let mut response =
            exchange_acked(self, &request, CTRL_ID_PEEK_ACK).map_err(into_io_error)?;
        if response.remaining() < 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "peek response too short",
            ));
        }
        Ok(response.get_u32())
    }
}
