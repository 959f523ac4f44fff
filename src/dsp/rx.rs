//! Receive DSP.
//!
//! The DDC channel, which also sends the stream commands that start and stop
//! the sample stream.

use super::constants::{
    DEFAULT_DECIMATION, FR_DSP_RX_DECIM_RATE, FR_DSP_RX_FREQ, FR_DSP_RX_SCALE_IQ, RX_SCALE_IQ,
};
use super::{impl_property_names, parse_value, ChannelConfig, DspChannel};
use crate::error::{Error, Result};
use crate::gain::iq_scale_word;
use crate::regs::RegisterIo;
use crate::stream::StreamCommandEncoder;
use crate::transport::ControlChannel;
use std::collections::BTreeSet;
use usrp_json::{PropertyValue, StreamCommand, StreamMode};

/// Receive DSP (DDC).
///
/// The DDC shifts the received signal by the NCO frequency and decimates it.
/// Registers are written through `R` and stream commands are sent through
/// `C`.
#[derive(Debug)]
pub struct RxDsp<R, C> {
    name: String,
    regs: R,
    clock_rate: f64,
    config: ChannelConfig,
    stream: StreamCommandEncoder<C>,
}

/// Readable DDC properties.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RxProperty {
    /// Name of the channel.
    Name,
    /// Input sample rate, which is the clock rate.
    IfRate,
    /// Output sample rate, which is the clock rate divided by the decimation.
    BbRate,
    /// Decimation.
    Decim,
    /// Set of allowed decimations.
    Decims,
    /// NCO frequency offset.
    Freq,
}

impl_property_names!(RxProperty,
                     "name" => Name,
                     "if_rate" => IfRate,
                     "bb_rate" => BbRate,
                     "decim" => Decim,
                     "decims" => Decims,
                     "freq" => Freq);

/// Writable DDC properties.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RxSetting {
    /// Sets the decimation.
    Decim(u32),
    /// Sets the NCO frequency offset in Hz.
    Freq(f64),
    /// Issues a stream command.
    StreamCmd(StreamCommand),
}

impl<R: RegisterIo, C: ControlChannel> RxDsp<R, C> {
    /// Opens the DDC of a device.
    ///
    /// The DDC starts with the default decimation and zero frequency offset,
    /// which are written to the registers. Then a stop command is sent, in
    /// case the device was left streaming.
    ///
    /// `clock_rate` is the master clock rate of the device in Hz and
    /// `allowed_rates` is the set of decimations that the device supports.
    #[tracing::instrument(name = "RxDsp::new", level = "debug", skip(regs, control, allowed_rates))]
    pub fn new(
        device_name: &str,
        regs: R,
        control: C,
        clock_rate: f64,
        allowed_rates: BTreeSet<u32>,
    ) -> Result<RxDsp<R, C>> {
        let mut dsp = RxDsp {
            name: format!("{device_name} ddc0"),
            regs,
            clock_rate,
            config: ChannelConfig::new(DEFAULT_DECIMATION, allowed_rates)?,
            stream: StreamCommandEncoder::new(control),
        };
        dsp.sync_all()?;
        dsp.stream
            .issue(&StreamCommand::now(StreamMode::StopContinuous, 0))?;
        Ok(dsp)
    }

    /// Gives the configuration of the DDC.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Gives the stream command encoder of the DDC.
    pub fn stream(&self) -> &StreamCommandEncoder<C> {
        &self.stream
    }

    fn sync_all(&mut self) -> Result<()> {
        write_rate_registers(&mut self.regs, self.config.rate())?;
        let word = crate::tuner::tune(self.config.frequency(), self.clock_rate)?.word;
        self.regs.write_register(FR_DSP_RX_FREQ, word as u32)?;
        Ok(())
    }

    fn set_decimation(&mut self, decimation: u32) -> Result<()> {
        let regs = &mut self.regs;
        self.config
            .update_rate(decimation, |d| write_rate_registers(regs, d))?;
        tracing::debug!(
            decimation,
            bb_rate = self.config.bandwidth(self.clock_rate),
            "DDC decimation set"
        );
        Ok(())
    }

    fn set_frequency(&mut self, frequency: f64) -> Result<()> {
        let regs = &mut self.regs;
        self.config.update_frequency(frequency, self.clock_rate, |word| {
            regs.write_register(FR_DSP_RX_FREQ, word as u32)?;
            Ok(())
        })
    }
}

fn write_rate_registers<R: RegisterIo>(regs: &mut R, decimation: u32) -> Result<()> {
    regs.write_register(FR_DSP_RX_DECIM_RATE, decimation)?;
    regs.write_register(FR_DSP_RX_SCALE_IQ, iq_scale_word(RX_SCALE_IQ, RX_SCALE_IQ))?;
    Ok(())
}

impl<R: RegisterIo, C: ControlChannel> DspChannel for RxDsp<R, C> {
    type Property = RxProperty;
    type Setting = RxSetting;

    const PROPERTY_NAMES: &'static [&'static str] = &[
        "name",
        "if_rate",
        "bb_rate",
        "decim",
        "decims",
        "freq",
        "stream_cmd",
    ];

    fn get(&self, property: RxProperty) -> PropertyValue {
        match property {
            RxProperty::Name => PropertyValue::String(self.name.clone()),
            RxProperty::IfRate => PropertyValue::Double(self.clock_rate),
            RxProperty::BbRate => PropertyValue::Double(self.config.bandwidth(self.clock_rate)),
            RxProperty::Decim => PropertyValue::Rate(self.config.rate()),
            RxProperty::Decims => PropertyValue::Rates(self.config.allowed_rates().clone()),
            RxProperty::Freq => PropertyValue::Double(self.config.frequency()),
        }
    }

    fn set(&mut self, setting: RxSetting) -> Result<()> {
        match setting {
            RxSetting::Decim(decimation) => self.set_decimation(decimation),
            RxSetting::Freq(frequency) => self.set_frequency(frequency),
            RxSetting::StreamCmd(command) => self.stream.issue(&command),
        }
    }

    fn parse_setting(name: &str, value: &str) -> Result<RxSetting> {
        Ok(match name {
            "decim" => RxSetting::Decim(parse_value(name, value)?),
            "freq" => RxSetting::Freq(parse_value(name, value)?),
            "stream_cmd" => RxSetting::StreamCmd(parse_stream_command(value)?),
            _ => return Err(Error::UnknownProperty(name.to_string())),
        })
    }
}

/// Parses a stream command given either as JSON or as a bare mode name.
///
/// A bare mode name such as `start_continuous` gives a command that is
/// executed immediately and requests zero samples.
fn parse_stream_command(value: &str) -> Result<StreamCommand> {
    if let Ok(mode) = value.trim().parse::<StreamMode>() {
        return Ok(StreamCommand::now(mode, 0));
    }
    serde_json::from_str(value).map_err(|_| Error::InvalidValue {
        property: "stream_cmd".to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dsp::constants::{default_allowed_rates, CTRL_ID_STREAM_COMMAND_ACK};
    use crate::mock::{MockControl, MockRegisters};
    use crate::stream::EncoderState;
    use std::sync::{Arc, Mutex};

    type Regs = Arc<Mutex<MockRegisters>>;
    type Control = Arc<Mutex<MockControl>>;

    fn open() -> (RxDsp<Regs, Control>, Regs, Control) {
        let regs = MockRegisters::shared();
        let control = MockControl::shared();
        control.lock().unwrap().push_ack(CTRL_ID_STREAM_COMMAND_ACK);
        let dsp = RxDsp::new(
            "usrp2",
            Arc::clone(&regs),
            Arc::clone(&control),
            100e6,
            default_allowed_rates(),
        )
        .unwrap();
        regs.lock().unwrap().writes.clear();
        (dsp, regs, control)
    }

    #[test]
    fn initial_sync() {
        let regs = MockRegisters::shared();
        let control = MockControl::shared();
        control.lock().unwrap().push_ack(CTRL_ID_STREAM_COMMAND_ACK);
        let dsp = RxDsp::new(
            "usrp2",
            Arc::clone(&regs),
            Arc::clone(&control),
            100e6,
            default_allowed_rates(),
        )
        .unwrap();
        assert_eq!(
            regs.lock().unwrap().writes,
            [
                (FR_DSP_RX_DECIM_RATE, 16),
                (FR_DSP_RX_SCALE_IQ, 0x0400_0400),
                (FR_DSP_RX_FREQ, 0)
            ]
        );
        // stop command to kill any stream left running
        let control = control.lock().unwrap();
        assert_eq!(control.requests.len(), 1);
        assert_eq!(&control.requests[0][13..], &[0, 0, 0, 0, 0, 0]);
        assert_eq!(dsp.get(RxProperty::Decim), PropertyValue::Rate(16));
        assert_eq!(dsp.get(RxProperty::Freq), PropertyValue::Double(0.0));
    }

    #[test]
    fn open_fails_without_ack() {
        let result = RxDsp::new(
            "usrp2",
            MockRegisters::default(),
            MockControl::default(),
            100e6,
            default_allowed_rates(),
        );
        assert!(matches!(
            result,
            Err(Error::ProtocolAckMismatch { received: None, .. })
        ));
    }

    #[test]
    fn get_properties() {
        let (dsp, regs, _) = open();
        assert_eq!(
            dsp.get_by_name("name").unwrap(),
            PropertyValue::String("usrp2 ddc0".to_string())
        );
        assert_eq!(dsp.get_by_name("if_rate").unwrap(), PropertyValue::Double(100e6));
        assert_eq!(dsp.get_by_name("bb_rate").unwrap(), PropertyValue::Double(6.25e6));
        assert_eq!(
            dsp.get_by_name("decims").unwrap(),
            PropertyValue::Rates(default_allowed_rates())
        );
        for property in RxProperty::ALL {
            assert_eq!(
                dsp.get_by_name(&property.to_string()).unwrap(),
                dsp.get(*property)
            );
        }
        assert!(regs.lock().unwrap().writes.is_empty());
    }

    #[test]
    fn unknown_property() {
        let (mut dsp, regs, _) = open();
        for name in ["interp", "stream_cmd", "gain"] {
            assert!(matches!(
                dsp.get_by_name(name),
                Err(Error::UnknownProperty(n)) if n == name
            ));
        }
        for name in ["if_rate", "bb_rate", "decims", "name", "interp"] {
            assert!(matches!(
                dsp.set_by_name(name, "1"),
                Err(Error::UnknownProperty(n)) if n == name
            ));
        }
        assert!(regs.lock().unwrap().writes.is_empty());
    }

    #[test]
    fn set_decimation() {
        let (mut dsp, regs, _) = open();
        dsp.set_by_name("decim", "8").unwrap();
        assert_eq!(dsp.get(RxProperty::Decim), PropertyValue::Rate(8));
        assert_eq!(dsp.get(RxProperty::BbRate), PropertyValue::Double(12.5e6));
        assert_eq!(
            regs.lock().unwrap().writes,
            [(FR_DSP_RX_DECIM_RATE, 8), (FR_DSP_RX_SCALE_IQ, 0x0400_0400)]
        );
    }

    #[test]
    fn unsupported_decimation() {
        let (mut dsp, regs, _) = open();
        assert!(matches!(
            dsp.set(RxSetting::Decim(129)),
            Err(Error::UnsupportedRate { rate: 129 })
        ));
        assert_eq!(dsp.get(RxProperty::Decim), PropertyValue::Rate(16));
        assert_eq!(dsp.get(RxProperty::BbRate), PropertyValue::Double(6.25e6));
        assert!(regs.lock().unwrap().writes.is_empty());
        assert!(matches!(
            dsp.set_by_name("decim", "-4"),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn set_frequency() {
        let (mut dsp, regs, _) = open();
        dsp.set(RxSetting::Freq(-25e6)).unwrap();
        assert_eq!(dsp.get(RxProperty::Freq), PropertyValue::Double(-25e6));
        assert_eq!(
            regs.lock().unwrap().writes,
            [(FR_DSP_RX_FREQ, 0xc000_0000)]
        );
        dsp.set_by_name("freq", "1e6").unwrap();
        let PropertyValue::Double(achieved) = dsp.get(RxProperty::Freq) else {
            panic!("freq is not a double");
        };
        assert!((achieved - 1e6).abs() < 0.02);
        assert_eq!(regs.lock().unwrap().values[&FR_DSP_RX_FREQ], 42949673);
    }

    #[test]
    fn invalid_frequency() {
        let (mut dsp, regs, _) = open();
        dsp.set(RxSetting::Freq(10e6)).unwrap();
        regs.lock().unwrap().writes.clear();
        assert!(matches!(
            dsp.set(RxSetting::Freq(50e6 + 1.0)),
            Err(Error::InvalidFrequency { .. })
        ));
        let PropertyValue::Double(freq) = dsp.get(RxProperty::Freq) else {
            panic!("freq is not a double");
        };
        assert!((freq - 10e6).abs() < 0.02);
        assert!(regs.lock().unwrap().writes.is_empty());
    }

    #[test]
    fn stream_command() {
        let (mut dsp, regs, control) = open();
        control.lock().unwrap().push_ack(CTRL_ID_STREAM_COMMAND_ACK);
        dsp.set_by_name(
            "stream_cmd",
            r#"{"mode": "NumSamplesAndMore", "num_samples": 256}"#,
        )
        .unwrap();
        {
            let control = control.lock().unwrap();
            assert_eq!(control.requests.len(), 2);
            assert_eq!(&control.requests[1][13..], &[0, 1, 0, 0, 1, 0]);
        }
        // stream commands do not touch the registers
        assert!(regs.lock().unwrap().writes.is_empty());

        control.lock().unwrap().push_ack(b' ' as u32);
        assert!(matches!(
            dsp.set_by_name("stream_cmd", "start_continuous"),
            Err(Error::ProtocolAckMismatch {
                received: Some(0x20),
                ..
            })
        ));
        assert_eq!(dsp.stream().state(), EncoderState::Idle);
        control.lock().unwrap().push_ack(CTRL_ID_STREAM_COMMAND_ACK);
        dsp.set(RxSetting::StreamCmd(StreamCommand::now(
            StreamMode::StopContinuous,
            99,
        )))
        .unwrap();
        assert!(matches!(
            dsp.set_by_name("stream_cmd", "go"),
            Err(Error::InvalidValue { .. })
        ));
        assert_eq!(control.lock().unwrap().requests.len(), 4);
    }
}
