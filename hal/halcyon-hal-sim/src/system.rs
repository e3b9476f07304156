//! Simulated watchdog and power/clock control

use halcyon_hal::system::{PowerClock, Watchdog};

/// Watchdog counter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// Counter stopped
    Held,
    /// Counter running; must be cleared periodically
    Running,
}

/// Watchdog that counts its clears
#[derive(Debug, Clone)]
pub struct SimWatchdog {
    state: WatchdogState,
    clears: usize,
}

impl Default for SimWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWatchdog {
    /// Watchdog as it comes out of reset
    pub fn new() -> Self {
        Self {
            state: WatchdogState::Held,
            clears: 0,
        }
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    /// Clears while running
    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl Watchdog for SimWatchdog {
    fn hold(&mut self) {
        self.state = WatchdogState::Held;
    }

    fn start(&mut self) {
        self.state = WatchdogState::Running;
    }

    fn clear(&mut self) {
        if self.state == WatchdogState::Running {
            self.clears += 1;
        }
    }

    fn init(&mut self) {
        self.state = WatchdogState::Running;
        self.clears = 0;
    }
}

/// Power and clock switches
#[derive(Debug, Clone, Default)]
pub struct SimPower {
    full_power: bool,
    default_clock: bool,
}

impl SimPower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `power_set_full` has run
    pub fn is_full_power(&self) -> bool {
        self.full_power
    }

    /// Whether `clock_set_default` has run
    pub fn has_default_clock(&self) -> bool {
        self.default_clock
    }
}

impl PowerClock for SimPower {
    fn power_set_full(&mut self) {
        self.full_power = true;
    }

    fn clock_set_default(&mut self) {
        self.default_clock = true;
    }
}
