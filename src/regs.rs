//! Register access.
//!
//! This module defines the [`RegisterIo`] trait, which is how the DSP channels
//! write the FPGA registers of the device.

use std::io;
use std::sync::{Arc, Mutex};

/// Register read and write access.
///
/// Addresses and values are 32-bit words. Implementations report faults of
/// the underlying bus or link as [`io::Error`].
pub trait RegisterIo {
    /// Writes `value` to the register at `addr`.
    fn write_register(&mut self, addr: u32, value: u32) -> io::Result<()>;

    /// Reads the register at `addr`.
    fn read_register(&mut self, addr: u32) -> io::Result<u32>;
}

impl<T: RegisterIo + ?Sized> RegisterIo for &mut T {
    fn write_register(&mut self, addr: u32, value: u32) -> io::Result<()> {
        (**self).write_register(addr, value)
    }

    fn read_register(&mut self, addr: u32) -> io::Result<u32> {
        (**self).read_register(addr)
    }
}

/// Shares a register interface between several owners.
impl<T: RegisterIo + ?Sized> RegisterIo for Arc<Mutex<T>> {
    fn write_register(&mut self, addr: u32, value: u32) -> io::Result<()> {
        lock(&**self)?.write_register(addr, value)
    }

    fn read_register(&mut self, addr: u32) -> io::Result<u32> {
        lock(&**self)?.read_register(addr)
    }
}

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> io::Result<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| io::Error::other("device link mutex poisoned"))
}
