//! Slave descriptors and the arbiter that selects them
//!
//! A [`Slave`] is created once at configuration time and borrowed by every
//! transaction addressed to it. How it is selected is fixed at creation:
//! either a pair of functions supplied by the board, or one output pin that
//! is pulled low while the slave is addressed.

use halcyon_hal::gpio::{Gpio, PinSelector};
use halcyon_hal::spi::{ClockConfig, SpiPeripheral};

/// How a slave is selected
#[derive(Debug, Clone, Copy)]
pub enum Selector {
    /// Board-supplied select/deselect actions
    Functions { select: fn(), deselect: fn() },
    /// Active-low chip select pin
    Pin(PinSelector),
}

/// An addressable SPI target
#[derive(Debug, Clone)]
pub struct Slave {
    clock: Option<ClockConfig>,
    selector: Selector,
}

impl Slave {
    /// Slave selected through a pair of functions
    pub const fn with_functions(select: fn(), deselect: fn()) -> Self {
        Self {
            clock: None,
            selector: Selector::Functions { select, deselect },
        }
    }

    /// Slave selected by pulling a pin low
    pub const fn with_pin(pin: PinSelector) -> Self {
        Self {
            clock: None,
            selector: Selector::Pin(pin),
        }
    }

    /// Give the slave its own clock configuration
    ///
    /// Slaves without one are clocked with the bus default.
    pub const fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.clock = Some(clock);
        self
    }

    /// The slave's own clock configuration, if it has one
    pub fn clock(&self) -> Option<&ClockConfig> {
        self.clock.as_ref()
    }

    /// How the slave is selected
    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// Turns slave descriptors into pin wiggles, function calls and clock
/// changes
///
/// This is the only place that looks inside a [`Selector`].
#[derive(Debug)]
pub struct SlaveArbiter<G: Gpio> {
    gpio: G,
    default_clock: ClockConfig,
    /// Clock last pushed to the peripheral, if known
    applied: Option<ClockConfig>,
}

impl<G: Gpio> SlaveArbiter<G> {
    /// Create an arbiter driving chip selects through `gpio`
    pub fn new(gpio: G, default_clock: ClockConfig) -> Self {
        Self {
            gpio,
            default_clock,
            applied: None,
        }
    }

    /// Forget which clock the peripheral has
    ///
    /// Called after the peripheral is (re)initialised with its defaults.
    pub fn reset_clock(&mut self) {
        self.applied = Some(self.default_clock);
    }

    /// Put a slave into its idle, deselected state
    pub fn init_slave(&mut self, slave: &Slave) {
        match slave.selector {
            Selector::Functions { deselect, .. } => deselect(),
            Selector::Pin(pin) => {
                self.gpio.set_output_high(pin);
                self.gpio.conf_output(pin);
            }
        }
    }

    /// Select a slave and shape the clock for it
    ///
    /// The clock is only touched when the platform supports per-slave
    /// control and the wanted clock differs from the one already applied.
    pub fn select<P: SpiPeripheral>(&mut self, slave: &Slave, spi: &mut P) {
        self.assert_select(slave);
        if spi.supports_clock_control() {
            let wanted = slave.clock.unwrap_or(self.default_clock);
            if self.applied != Some(wanted) {
                spi.configure_clock(&wanted);
                self.applied = Some(wanted);
            }
        }
    }

    /// Assert a slave's select line without touching the clock
    pub fn assert_select(&mut self, slave: &Slave) {
        match slave.selector {
            Selector::Functions { select, .. } => select(),
            Selector::Pin(pin) => self.gpio.set_output_low(pin),
        }
    }

    /// Release a slave's select line
    pub fn deselect(&mut self, slave: &Slave) {
        match slave.selector {
            Selector::Functions { deselect, .. } => deselect(),
            Selector::Pin(pin) => self.gpio.set_output_high(pin),
        }
    }

    /// The GPIO driver
    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Mutable access to the GPIO driver
    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }
}
