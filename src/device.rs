//! USRP2 device.
//!
//! This module contains [`Device`], which owns the DSP channels of a device
//! and the link through which they reach it.

use crate::dsp::{RxDsp, TxDsp};
use crate::error::Result;
use crate::regs::RegisterIo;
use crate::transport::ControlChannel;
use std::collections::BTreeSet;

/// USRP2 device.
///
/// The DDC and the DUC are independent channels. They share the device link
/// `L`, which is cloned for each of them, and the master clock rate, which
/// they only read.
#[derive(Debug)]
pub struct Device<L> {
    link: L,
    clock_rate: f64,
    rx: RxDsp<L, L>,
    tx: TxDsp<L>,
}

impl<L: RegisterIo + ControlChannel + Clone> Device<L> {
    /// Opens a device.
    ///
    /// Both channels are set to their defaults and the registers are written
    /// accordingly. Any stream left running in the DDC is stopped.
    pub fn open(
        name: &str,
        link: L,
        clock_rate: f64,
        allowed_rates: BTreeSet<u32>,
    ) -> Result<Device<L>> {
        let rx = RxDsp::new(
            name,
            link.clone(),
            link.clone(),
            clock_rate,
            allowed_rates.clone(),
        )?;
        let tx = TxDsp::new(name, link.clone(), clock_rate, allowed_rates)?;
        tracing::info!("opened {name} with clock rate {clock_rate} Hz");
        Ok(Device {
            link,
            clock_rate,
            rx,
            tx,
        })
    }

    /// Gives the master clock rate in Hz.
    pub fn clock_rate(&self) -> f64 {
        self.clock_rate
    }

    /// Gives access to the DDC.
    pub fn rx(&mut self) -> &mut RxDsp<L, L> {
        &mut self.rx
    }

    /// Gives access to the DUC.
    pub fn tx(&mut self) -> &mut TxDsp<L> {
        &mut self.tx
    }

    /// Reads a register directly.
    pub fn peek(&mut self, addr: u32) -> Result<u32> {
        Ok(self.link.read_register(addr)?)
    }

    /// Writes a register directly.
    ///
    /// This bypasses the DSP channels, so their configuration no longer
    /// mirrors the registers if a DSP register is written.
    pub fn poke(&mut self, addr: u32, value: u32) -> Result<()> {
        tracing::debug!("poke {addr:#010x} = {value:#010x}");
        Ok(self.link.write_register(addr, value)?)
    }
}
