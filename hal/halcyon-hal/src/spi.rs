//! SPI bus abstractions
//!
//! The platform side of the SPI contract is deliberately small: a shift
//! engine that clocks one byte at a time and reports completion from its
//! interrupt handler as an [`SpiEvent`]. Queueing, slave selection and
//! callbacks live in `halcyon-core`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// SPI master shift engine
///
/// Implemented once per platform. Every method must return quickly; the
/// only call allowed to spin is [`SpiPeripheral::txrx_bare`].
pub trait SpiPeripheral {
    /// Bring the peripheral up with its bus-wide defaults
    fn init(&mut self, config: &SpiConfig);

    /// Whether clock shape and frequency can be changed per slave
    fn supports_clock_control(&self) -> bool {
        true
    }

    /// Apply a slave's clock configuration
    ///
    /// Only ever called with the slave selected and before its first
    /// clock edge.
    fn configure_clock(&mut self, clock: &ClockConfig);

    /// Load one byte into the shift register and start clocking
    ///
    /// The interrupt handler reports the byte clocked in at the same time
    /// as [`SpiEvent::Transferred`], or [`SpiEvent::Fault`].
    fn start_byte(&mut self, byte: u8);

    /// Stop whatever the shift engine is doing after a fault
    fn abort(&mut self) {}

    /// Exchange a single byte without buffers or interrupts
    ///
    /// Debug only. Mixing this with queued transactions loses data, and the
    /// peripheral may need to be initialised without interrupts for it to
    /// work at all.
    fn txrx_bare(&mut self, byte: u8) -> u8;
}

/// Completion signal posted by the SPI interrupt handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiEvent {
    /// The byte started by `start_byte` finished; carries the byte received
    Transferred(u8),
    /// The bus reported a fault while shifting
    Fault(SpiFault),
}

/// Hardware faults reported during a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiFault {
    /// Received byte was not read before the next one arrived
    Overrun,
    /// Another master drove the bus
    ModeFault,
    /// Frame or CRC check failed
    Framing,
    /// Anything the platform cannot classify
    Other,
}

/// Bus-wide SPI configuration applied at `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiConfig {
    /// Clock used for slaves that carry no clock configuration of their own
    pub clock: ClockConfig,
    /// Byte clocked out once a transaction's transmit data runs out
    pub fill_byte: u8,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            fill_byte: 0xFF,
        }
    }
}

/// Clock shape and frequency for one slave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockConfig {
    /// Clock polarity
    pub polarity: Polarity,
    /// Clock phase
    pub phase: Phase,
    /// Bit order on the wire
    pub bit_order: BitOrder,
    /// Word width in bits (typically 8)
    pub word_bits: u8,
    /// Divider applied to the peripheral clock
    pub divider: u8,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::new(Mode::Mode0)
    }
}

impl ClockConfig {
    /// 8-bit, MSB-first clock in the given mode, undivided
    pub const fn new(mode: Mode) -> Self {
        let (polarity, phase) = mode.split();
        Self {
            polarity,
            phase,
            bit_order: BitOrder::MsbFirst,
            word_bits: 8,
            divider: 1,
        }
    }

    /// Same clock with a different divider
    pub const fn with_divider(mut self, divider: u8) -> Self {
        self.divider = divider;
        self
    }

    /// Same clock with a different bit order
    pub const fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    /// Same clock with a different word width
    pub const fn with_word_bits(mut self, word_bits: u8) -> Self {
        self.word_bits = word_bits;
        self
    }

    /// The SPI mode matching this polarity and phase
    pub fn mode(&self) -> Mode {
        match (self.polarity, self.phase) {
            (Polarity::IdleLow, Phase::CaptureOnFirstTransition) => Mode::Mode0,
            (Polarity::IdleLow, Phase::CaptureOnSecondTransition) => Mode::Mode1,
            (Polarity::IdleHigh, Phase::CaptureOnFirstTransition) => Mode::Mode2,
            (Polarity::IdleHigh, Phase::CaptureOnSecondTransition) => Mode::Mode3,
        }
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// Bit order on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl Mode {
    const fn split(self) -> (Polarity, Phase) {
        match self {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        mode.split()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips_through_clock() {
        for mode in [Mode::Mode0, Mode::Mode1, Mode::Mode2, Mode::Mode3] {
            assert_eq!(ClockConfig::new(mode).mode(), mode);
        }
    }

    #[test]
    fn test_clock_builders() {
        let clock = ClockConfig::new(Mode::Mode3)
            .with_divider(16)
            .with_bit_order(BitOrder::LsbFirst)
            .with_word_bits(16);
        assert_eq!(clock.polarity, Polarity::IdleHigh);
        assert_eq!(clock.phase, Phase::CaptureOnSecondTransition);
        assert_eq!(clock.divider, 16);
        assert_eq!(clock.bit_order, BitOrder::LsbFirst);
        assert_eq!(clock.word_bits, 16);
    }

    #[test]
    fn test_default_config() {
        let config = SpiConfig::default();
        assert_eq!(config.clock.mode(), Mode::Mode0);
        assert_eq!(config.fill_byte, 0xFF);
    }
}
