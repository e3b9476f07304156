//! Core system control: watchdog, power and clocks
//!
//! One-off operations used during startup and in the main loop.

/// Primary watchdog
pub trait Watchdog {
    /// Stop the watchdog so it cannot reset the chip
    fn hold(&mut self);

    /// Start the watchdog
    fn start(&mut self);

    /// Kick the watchdog
    fn clear(&mut self);

    /// Set the watchdog up with a default interval
    fn init(&mut self);
}

/// Power and clock defaults
pub trait PowerClock {
    /// Raise the core voltage to the highest level available
    fn power_set_full(&mut self);

    /// Switch the clock tree to the platform's default configuration
    fn clock_set_default(&mut self);
}
