//! Simulated ADC
//!
//! Sixteen channels. Tests set the voltage each channel sees as a raw code;
//! a single-shot conversion latches it as the channel's result.

use halcyon_hal::adc::{Adc, AdcError};

/// Number of simulated channels
pub const ADC_CHANNELS: usize = 16;

/// Single-shot ADC model
#[derive(Debug, Clone, Default)]
pub struct SimAdc {
    initialised: bool,
    configured: u16,
    inputs: [u16; ADC_CHANNELS],
    results: [Option<u16>; ADC_CHANNELS],
}

impl SimAdc {
    /// Powered-down ADC
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw code channel `channel` will convert to
    pub fn set_input(&mut self, channel: u8, code: u16) {
        if let Some(input) = self.inputs.get_mut(channel as usize) {
            *input = code;
        }
    }
}

impl Adc for SimAdc {
    fn init(&mut self) {
        self.initialised = true;
        self.configured = 0;
        self.results = [None; ADC_CHANNELS];
    }

    fn setup_channel(&mut self, channel: u8) -> Result<(), AdcError> {
        if channel as usize >= ADC_CHANNELS {
            return Err(AdcError::InvalidChannel);
        }
        self.configured |= 1 << channel;
        Ok(())
    }

    fn trigger_single(&mut self, channel: u8) -> Result<(), AdcError> {
        let index = channel as usize;
        if index >= ADC_CHANNELS {
            return Err(AdcError::InvalidChannel);
        }
        if !self.initialised || self.configured & (1 << channel) == 0 {
            return Err(AdcError::NotConfigured);
        }
        self.results[index] = Some(self.inputs[index]);
        Ok(())
    }

    fn result(&self, channel: u8) -> Option<u16> {
        self.results.get(channel as usize).copied().flatten()
    }
}
