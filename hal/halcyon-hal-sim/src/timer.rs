//! Simulated timer
//!
//! A 16-bit counter with four compare channels. [`SimTimer::tick`] advances
//! the counter by one prescaled count and reports the interrupts that would
//! have fired.

use halcyon_hal::timer::{OutputMode, Timer, TimerMode};

/// Compare channels per timer
pub const TIMER_CHANNELS: usize = 4;

/// Interrupts raised by one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerIrqs {
    pub overflow: bool,
    pub top: bool,
    /// Bit n set when channel n matched
    pub channels: u8,
}

#[derive(Debug, Clone, Copy, Default)]
struct CompareChannel {
    outmode: Option<OutputMode>,
    interrupt: bool,
    value: u16,
}

/// Register model of one timer
#[derive(Debug, Clone)]
pub struct SimTimer {
    prescaler: u8,
    mode: TimerMode,
    top: u16,
    counter: u16,
    counting_down: bool,
    int_overflow: bool,
    int_top: bool,
    channels: [CompareChannel; TIMER_CHANNELS],
}

impl Default for SimTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTimer {
    /// Stopped timer with everything cleared
    pub fn new() -> Self {
        Self {
            prescaler: 0,
            mode: TimerMode::Stop,
            top: u16::MAX,
            counter: 0,
            counting_down: false,
            int_overflow: false,
            int_top: false,
            channels: [CompareChannel::default(); TIMER_CHANNELS],
        }
    }

    /// Current count
    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Current prescaler setting
    pub fn prescaler(&self) -> u8 {
        self.prescaler
    }

    /// Current counting mode
    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Output mode of a compare channel
    pub fn outmode(&self, channel: u8) -> Option<OutputMode> {
        self.channels
            .get(channel as usize)
            .and_then(|c| c.outmode)
    }

    /// Advance by one count
    pub fn tick(&mut self) -> TimerIrqs {
        let mut irqs = TimerIrqs::default();
        match self.mode {
            TimerMode::Stop => return irqs,
            TimerMode::Up => {
                if self.counter >= self.top {
                    self.counter = 0;
                    irqs.overflow = true;
                } else {
                    self.counter += 1;
                    irqs.top = self.counter == self.top;
                }
            }
            TimerMode::UpDown => {
                if self.counting_down {
                    self.counter = self.counter.saturating_sub(1);
                    if self.counter == 0 {
                        self.counting_down = false;
                        irqs.overflow = true;
                    }
                } else {
                    self.counter = self.counter.saturating_add(1).min(self.top);
                    if self.counter == self.top {
                        self.counting_down = true;
                        irqs.top = true;
                    }
                }
            }
            TimerMode::Continuous => {
                self.counter = self.counter.wrapping_add(1);
                irqs.overflow = self.counter == 0;
            }
        }

        irqs.overflow &= self.int_overflow;
        irqs.top &= self.int_top;
        for (n, ch) in self.channels.iter().enumerate() {
            if ch.interrupt && ch.value == self.counter {
                irqs.channels |= 1 << n;
            }
        }
        irqs
    }

    fn channel_mut(&mut self, channel: u8) -> Option<&mut CompareChannel> {
        self.channels.get_mut(channel as usize)
    }
}

impl Timer for SimTimer {
    fn init(&mut self) {
        *self = Self::new();
    }

    fn set_prescaler(&mut self, prescaler: u8) {
        self.prescaler = prescaler;
    }

    fn set_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.counting_down = false;
    }

    fn enable_int_overflow(&mut self) {
        self.int_overflow = true;
    }

    fn disable_int_overflow(&mut self) {
        self.int_overflow = false;
    }

    fn enable_int_top(&mut self) {
        self.int_top = true;
    }

    fn disable_int_top(&mut self) {
        self.int_top = false;
    }

    fn set_top(&mut self, top: u16) {
        self.top = top;
    }

    fn get_top(&self) -> u16 {
        self.top
    }

    fn set_outmode_ch(&mut self, channel: u8, mode: OutputMode) {
        if let Some(ch) = self.channel_mut(channel) {
            ch.outmode = Some(mode);
        }
    }

    fn enable_int_ch(&mut self, channel: u8) {
        if let Some(ch) = self.channel_mut(channel) {
            ch.interrupt = true;
        }
    }

    fn disable_int_ch(&mut self, channel: u8) {
        if let Some(ch) = self.channel_mut(channel) {
            ch.interrupt = false;
        }
    }

    fn set_cmr_ch(&mut self, channel: u8, value: u16) {
        if let Some(ch) = self.channel_mut(channel) {
            ch.value = value;
        }
    }

    fn get_cmr_ch(&self, channel: u8) -> u16 {
        self.channels.get(channel as usize).map_or(0, |c| c.value)
    }
}
