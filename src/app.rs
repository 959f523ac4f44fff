//! usrp-dsp application.
//!
//! This module contains a top-level structure [`App`] that represents the whole
//! usrp-dsp application.

use crate::{
    args::{Args, Command, PropertyOp},
    device::Device,
    dsp::{constants::default_allowed_rates, DspChannel, RxDsp, TxDsp},
    regs::RegisterIo,
    transport::{ControlChannel, UdpControl},
};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Device link used by the application.
pub type Link = Arc<Mutex<UdpControl>>;

/// usrp-dsp application.
///
/// This struct represents the usrp-dsp application. It owns the device and
/// the operation requested on the command line.
#[derive(Debug)]
pub struct App {
    device: Device<Link>,
    command: Command,
}

impl App {
    /// Creates a new application.
    ///
    /// This opens the control link and initializes the device.
    #[tracing::instrument(name = "App::new", level = "debug")]
    pub fn new(args: &Args) -> Result<App> {
        let link = UdpControl::connect(args.addr, Duration::from_millis(args.timeout_ms))
            .with_context(|| format!("failed to open control link to {}", args.addr))?;
        let device = Device::open(
            &args.name,
            Arc::new(Mutex::new(link)),
            args.clock_rate,
            default_allowed_rates(),
        )
        .context("failed to open device")?;
        Ok(App {
            device,
            command: args.command.clone(),
        })
    }

    /// Runs the application.
    ///
    /// The result of the operation is printed to stdout as JSON.
    #[tracing::instrument(name = "App::run", level = "debug", skip_all)]
    pub fn run(mut self) -> Result<()> {
        let output = execute(&mut self.device, &self.command)?;
        if !output.is_null() {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Ok(())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct PropertyNames {
    rx: &'static [&'static str],
    tx: &'static [&'static str],
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct RegisterValue {
    addr: String,
    value: String,
}

/// Performs an operation on a device.
///
/// Returns the JSON value to be shown to the user, which is `null` if the
/// operation produces no value. After writing a readable property, its new
/// value is returned, so that the frequency actually achieved by the NCO is
/// reported.
pub fn execute<L>(device: &mut Device<L>, command: &Command) -> Result<Value>
where
    L: RegisterIo + ControlChannel + Clone,
{
    Ok(match command {
        Command::Rx { op } => property_op(device.rx(), op)?,
        Command::Tx { op } => property_op(device.tx(), op)?,
        Command::Props => serde_json::to_value(PropertyNames {
            rx: RxDsp::<L, L>::PROPERTY_NAMES,
            tx: TxDsp::<L>::PROPERTY_NAMES,
        })?,
        Command::Peek { addr } => {
            let value = device
                .peek(*addr)
                .with_context(|| format!("failed to read register {addr:#010x}"))?;
            serde_json::to_value(RegisterValue {
                addr: format!("{addr:#010x}"),
                value: format!("{value:#010x}"),
            })?
        }
        Command::Poke { addr, value } => {
            device
                .poke(*addr, *value)
                .with_context(|| format!("failed to write register {addr:#010x}"))?;
            Value::Null
        }
    })
}

fn property_op<D: DspChannel>(dsp: &mut D, op: &PropertyOp) -> Result<Value> {
    Ok(match op {
        PropertyOp::Get { name } => serde_json::to_value(
            dsp.get_by_name(name)
                .with_context(|| format!("failed to get {name}"))?,
        )?,
        PropertyOp::Set { name, value } => {
            dsp.set_by_name(name, value)
                .with_context(|| format!("failed to set {name} to {value}"))?;
            match dsp.get_by_name(name) {
                Ok(value) => serde_json::to_value(value)?,
                // write-only property
                Err(_) => Value::Null,
            }
        }
    })
}
