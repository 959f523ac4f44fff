//! Transmit DSP.

use super::constants::{
    DEFAULT_INTERPOLATION, FR_DSP_TX_FREQ, FR_DSP_TX_INTERP_RATE, FR_DSP_TX_SCALE_IQ,
};
use super::{impl_property_names, parse_value, ChannelConfig, DspChannel};
use crate::error::{Error, Result};
use crate::gain::{duc_scale, iq_scale_word};
use crate::regs::RegisterIo;
use std::collections::BTreeSet;
use usrp_json::PropertyValue;

/// Transmit DSP (DUC).
///
/// The DUC interpolates the signal to be transmitted and shifts it by the NCO
/// frequency. Its IQ scale compensates the gain of the CIC interpolator, so it
/// is recalculated every time that the interpolation changes.
#[derive(Debug)]
pub struct TxDsp<R> {
    name: String,
    regs: R,
    clock_rate: f64,
    config: ChannelConfig,
}

/// Readable DUC properties.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TxProperty {
    /// Name of the channel.
    Name,
    /// Output sample rate, which is the clock rate.
    IfRate,
    /// Input sample rate, which is the clock rate divided by the interpolation.
    BbRate,
    /// Interpolation.
    Interp,
    /// Set of allowed interpolations.
    Interps,
    /// NCO frequency offset.
    Freq,
}

impl_property_names!(TxProperty,
                     "name" => Name,
                     "if_rate" => IfRate,
                     "bb_rate" => BbRate,
                     "interp" => Interp,
                     "interps" => Interps,
                     "freq" => Freq);

/// Writable DUC properties.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TxSetting {
    /// Sets the interpolation.
    Interp(u32),
    /// Sets the NCO frequency offset in Hz.
    Freq(f64),
}

impl<R: RegisterIo> TxDsp<R> {
    /// Opens the DUC of a device.
    ///
    /// The DUC starts with the default interpolation and zero frequency
    /// offset, which are written to the registers.
    #[tracing::instrument(name = "TxDsp::new", level = "debug", skip(regs, allowed_rates))]
    pub fn new(
        device_name: &str,
        regs: R,
        clock_rate: f64,
        allowed_rates: BTreeSet<u32>,
    ) -> Result<TxDsp<R>> {
        let mut dsp = TxDsp {
            name: format!("{device_name} duc0"),
            regs,
            clock_rate,
            config: ChannelConfig::new(DEFAULT_INTERPOLATION, allowed_rates)?,
        };
        write_rate_registers(&mut dsp.regs, dsp.config.rate())?;
        let word = crate::tuner::tune(dsp.config.frequency(), dsp.clock_rate)?.word;
        dsp.regs.write_register(FR_DSP_TX_FREQ, word as u32)?;
        Ok(dsp)
    }

    /// Gives the configuration of the DUC.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    fn set_interpolation(&mut self, interpolation: u32) -> Result<()> {
        let regs = &mut self.regs;
        self.config
            .update_rate(interpolation, |i| write_rate_registers(regs, i))?;
        tracing::debug!(
            interpolation,
            bb_rate = self.config.bandwidth(self.clock_rate),
            "DUC interpolation set"
        );
        Ok(())
    }

    fn set_frequency(&mut self, frequency: f64) -> Result<()> {
        let regs = &mut self.regs;
        self.config.update_frequency(frequency, self.clock_rate, |word| {
            regs.write_register(FR_DSP_TX_FREQ, word as u32)?;
            Ok(())
        })
    }
}

fn write_rate_registers<R: RegisterIo>(regs: &mut R, interpolation: u32) -> Result<()> {
    let scale = duc_scale(interpolation);
    tracing::trace!(interpolation, scale, "writing DUC rate registers");
    regs.write_register(FR_DSP_TX_INTERP_RATE, interpolation)?;
    regs.write_register(FR_DSP_TX_SCALE_IQ, iq_scale_word(scale, scale))?;
    Ok(())
}

impl<R: RegisterIo> DspChannel for TxDsp<R> {
    type Property = TxProperty;
    type Setting = TxSetting;

    const PROPERTY_NAMES: &'static [&'static str] =
        &["name", "if_rate", "bb_rate", "interp", "interps", "freq"];

    fn get(&self, property: TxProperty) -> PropertyValue {
        match property {
            TxProperty::Name => PropertyValue::String(self.name.clone()),
            TxProperty::IfRate => PropertyValue::Double(self.clock_rate),
            TxProperty::BbRate => PropertyValue::Double(self.config.bandwidth(self.clock_rate)),
            TxProperty::Interp => PropertyValue::Rate(self.config.rate()),
            TxProperty::Interps => PropertyValue::Rates(self.config.allowed_rates().clone()),
            TxProperty::Freq => PropertyValue::Double(self.config.frequency()),
        }
    }

    fn set(&mut self, setting: TxSetting) -> Result<()> {
        match setting {
            TxSetting::Interp(interpolation) => self.set_interpolation(interpolation),
            TxSetting::Freq(frequency) => self.set_frequency(frequency),
        }
    }

    fn parse_setting(name: &str, value: &str) -> Result<TxSetting> {
        Ok(match name {
            "interp" => TxSetting::Interp(parse_value(name, value)?),
            "freq" => TxSetting::Freq(parse_value(name, value)?),
            _ => return Err(Error::UnknownProperty(name.to_string())),
        })
    }
}
