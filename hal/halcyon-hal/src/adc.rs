//! Internal ADC abstractions
//!
//! Least-common-denominator view of a microcontroller ADC: one interface,
//! several channels, single-shot conversions. Anything fancier (autoscan,
//! DMA, differential inputs) is left to the application.

/// Errors from ADC operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// Channel number does not exist on this ADC
    InvalidChannel,
    /// Channel was never set up
    NotConfigured,
    /// A conversion is already running
    Busy,
}

/// Internal ADC
pub trait Adc {
    /// Power up the converter with default settings
    fn init(&mut self);

    /// Prepare a channel for single conversions
    fn setup_channel(&mut self, channel: u8) -> Result<(), AdcError>;

    /// Start one conversion; the result is collected with [`Adc::result`]
    fn trigger_single(&mut self, channel: u8) -> Result<(), AdcError>;

    /// Latest completed conversion for a channel, if any
    fn result(&self, channel: u8) -> Option<u16>;
}
