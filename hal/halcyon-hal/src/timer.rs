//! Timer abstractions
//!
//! Least-common-denominator timer modes:
//!
//! - `Up`: count to TOP, reset
//! - `UpDown`: count to TOP, count back to zero
//! - `Continuous`: count to the counter maximum
//!
//! which between them cover low-frequency periodic timers, edge counting and
//! PWM. On some families channel 0 is spent holding TOP.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimerMode {
    /// Halted
    Stop,
    /// Count to TOP, reset
    Up,
    /// Count to TOP, then back down
    UpDown,
    /// Count to the counter maximum
    Continuous,
}

/// Channel output behaviour on compare match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputMode {
    /// Output follows the output bit
    Output,
    Set,
    Toggle,
    Reset,
    /// PWM: set at TOP, reset at compare
    ResetSet,
    /// PWM: reset at TOP, set at compare
    SetReset,
}

/// Hardware timer
pub trait Timer {
    /// Select the clock source and default prescaler
    fn init(&mut self);

    fn set_prescaler(&mut self, prescaler: u8);

    /// Start (or stop) counting in the given mode
    fn set_mode(&mut self, mode: TimerMode);

    fn enable_int_overflow(&mut self);
    fn disable_int_overflow(&mut self);
    fn enable_int_top(&mut self);
    fn disable_int_top(&mut self);

    fn set_top(&mut self, top: u16);
    fn get_top(&self) -> u16;

    fn set_outmode_ch(&mut self, channel: u8, mode: OutputMode);
    fn enable_int_ch(&mut self, channel: u8);
    fn disable_int_ch(&mut self, channel: u8);

    /// Set a channel's compare match value
    fn set_cmr_ch(&mut self, channel: u8, value: u16);
    /// Get a channel's compare match value
    fn get_cmr_ch(&self, channel: u8) -> u16;
}
