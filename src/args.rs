//! usrp-dsp CLI arguments.
//!
//! This module contains the definition of the CLI arguments for the usrp-dsp
//! application.

use crate::dsp::constants::DEFAULT_CLOCK_RATE;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;

/// usrp-dsp CLI arguments.
#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Control address of the device
    #[clap(long, default_value = "192.168.10.2:49152")]
    pub addr: SocketAddr,
    /// Master clock rate of the device in Hz
    #[clap(long, default_value_t = DEFAULT_CLOCK_RATE, value_parser = parse_clock_rate)]
    pub clock_rate: f64,
    /// Time to wait for each control response in milliseconds
    #[clap(long, default_value_t = 1000)]
    pub timeout_ms: u64,
    /// Device name, used as prefix of the channel names
    #[clap(long, default_value = "usrp2")]
    pub name: String,
    /// Operation to perform
    #[clap(subcommand)]
    pub command: Command,
}

/// usrp-dsp operations.
#[derive(Subcommand, Debug, Clone, Eq, PartialEq)]
pub enum Command {
    /// Access a property of the receive DSP (DDC)
    Rx {
        /// Property operation
        #[clap(subcommand)]
        op: PropertyOp,
    },
    /// Access a property of the transmit DSP (DUC)
    Tx {
        /// Property operation
        #[clap(subcommand)]
        op: PropertyOp,
    },
    /// List the properties of the DSP channels
    Props,
    /// Read a register
    Peek {
        /// Register address (decimal or 0x-prefixed hex)
        #[clap(value_parser = parse_u32)]
        addr: u32,
    },
    /// Write a register
    Poke {
        /// Register address (decimal or 0x-prefixed hex)
        #[clap(value_parser = parse_u32)]
        addr: u32,
        /// Register value (decimal or 0x-prefixed hex)
        #[clap(value_parser = parse_u32)]
        value: u32,
    },
}

/// Property operation.
#[derive(Subcommand, Debug, Clone, Eq, PartialEq)]
pub enum PropertyOp {
    /// Read a property
    Get {
        /// Property name
        name: String,
    },
    /// Write a property
    Set {
        /// Property name
        name: String,
        /// New value (stream commands are given as JSON or as a mode name)
        value: String,
    },
}

fn parse_u32(s: &str) -> Result<u32, std::num::ParseIntError> {
    match s.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn parse_clock_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    // also rejects NaN
    if rate > 0.0 && rate.is_finite() {
        Ok(rate)
    } else {
        Err(format!("clock rate must be positive, got {s}"))
    }
}
