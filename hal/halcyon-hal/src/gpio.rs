//! GPIO abstractions
//!
//! Pins are addressed the way the peripheral map names them: a port number
//! plus a pin mask within that port. A mask may cover several pins, in which
//! case the operation applies to all of them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A pin (or group of pins) on one port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinSelector {
    /// Port number
    pub port: u8,
    /// Pin mask within the port
    pub pin: u16,
}

impl PinSelector {
    /// Select a group of pins by mask
    pub const fn new(port: u8, pin: u16) -> Self {
        Self { port, pin }
    }

    /// Select a single pin by its bit number
    ///
    /// Ports are 16 pins wide; a bit number of 16 or more selects no pin.
    pub const fn bit(port: u8, bit: u8) -> Self {
        let pin = match 1u16.checked_shl(bit as u32) {
            Some(mask) => mask,
            None => 0,
        };
        Self { port, pin }
    }
}

/// Digital I/O on a whole microcontroller
///
/// Implementations handle the register manipulation for the specific chip.
/// All calls are single register operations with no internal state.
pub trait Gpio {
    /// Configure pins as push-pull outputs
    fn conf_output(&mut self, pin: PinSelector);

    /// Configure pins as inputs
    fn conf_input(&mut self, pin: PinSelector);

    /// Hand pins over to a peripheral
    ///
    /// On platforms where it matters, the MSB of `periph` selects output
    /// (set) or input (clear); the low seven bits pick the peripheral.
    fn conf_periph(&mut self, pin: PinSelector, periph: u8);

    /// Drive pins high
    fn set_output_high(&mut self, pin: PinSelector);

    /// Drive pins low
    fn set_output_low(&mut self, pin: PinSelector);

    /// Flip pin output state
    fn set_output_toggle(&mut self, pin: PinSelector);

    /// Configure pins as inputs with pull-up
    fn conf_input_pullup(&mut self, pin: PinSelector);

    /// Configure pins as inputs with pull-down
    fn conf_input_pulldown(&mut self, pin: PinSelector);

    /// Configure pins as high-impedance inputs
    fn conf_input_hiz(&mut self, pin: PinSelector);

    /// Read a single input pin
    fn get_input(&self, pin: PinSelector) -> bool;

    /// Drive pins to a specific level
    fn set_output(&mut self, pin: PinSelector, high: bool) {
        if high {
            self.set_output_high(pin);
        } else {
            self.set_output_low(pin);
        }
    }
}

/// Direction bit for [`Gpio::conf_periph`]
pub const PERIPH_OUTPUT: u8 = 0x80;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_selector() {
        assert_eq!(PinSelector::bit(2, 0), PinSelector::new(2, 0x0001));
        assert_eq!(PinSelector::bit(2, 15).pin, 0x8000);
    }

    #[test]
    fn test_bit_past_port_width_selects_nothing() {
        assert_eq!(PinSelector::bit(0, 16).pin, 0);
        assert_eq!(PinSelector::bit(1, u8::MAX), PinSelector::new(1, 0));
    }
}
