//! Simulated SPI shift engine
//!
//! Every started byte completes at once: the engine posts the reply into
//! its event channel, where [`halcyon_core::SpiBus::react`] picks it up.
//! Replies come from a script when one is loaded and echo the transmitted
//! byte otherwise.

use std::collections::VecDeque;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use halcyon_hal::spi::{ClockConfig, SpiConfig, SpiEvent, SpiFault, SpiPeripheral};

/// Events one simulated bus can have in flight
pub const SPI_EVENT_DEPTH: usize = 4;

/// Channel the simulated SPI interrupt posts into
pub type SpiEvents = Channel<CriticalSectionRawMutex, SpiEvent, SPI_EVENT_DEPTH>;

/// Something the engine was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiAction {
    Init(SpiConfig),
    Clock(ClockConfig),
    Byte(u8),
    Abort,
    Bare(u8),
}

/// Loopback SPI engine
pub struct SimSpi<'c> {
    events: &'c SpiEvents,
    clock_control: bool,
    replies: VecDeque<u8>,
    faults: VecDeque<(usize, SpiFault)>,
    started: usize,
    actions: Vec<SpiAction>,
    dropped: usize,
}

impl<'c> SimSpi<'c> {
    /// Engine posting into `events`
    pub fn new(events: &'c SpiEvents) -> Self {
        Self {
            events,
            clock_control: true,
            replies: VecDeque::new(),
            faults: VecDeque::new(),
            started: 0,
            actions: Vec::new(),
            dropped: 0,
        }
    }

    /// Model a platform whose clock cannot change per slave
    pub fn with_fixed_clock(mut self) -> Self {
        self.clock_control = false;
        self
    }

    /// Queue bytes to be clocked in, in order
    pub fn script_replies(&mut self, bytes: &[u8]) {
        self.replies.extend(bytes.iter().copied());
    }

    /// Fail the `index`th byte started from now on (0 is the next one)
    ///
    /// Faults may be added in any order. A second fault on the same byte
    /// replaces the first.
    pub fn fault_at(&mut self, index: usize, fault: SpiFault) {
        let at = self.started + index;
        match self.faults.binary_search_by_key(&at, |&(i, _)| i) {
            Ok(pos) => self.faults[pos] = (at, fault),
            Err(pos) => self.faults.insert(pos, (at, fault)),
        }
    }

    /// Everything the engine was asked to do
    pub fn actions(&self) -> &[SpiAction] {
        &self.actions
    }

    /// Bytes clocked out through `start_byte`
    pub fn sent(&self) -> Vec<u8> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                SpiAction::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Clock configurations applied, in order
    pub fn clocks(&self) -> Vec<ClockConfig> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                SpiAction::Clock(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Events lost because the channel was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn post(&mut self, event: SpiEvent) {
        if self.events.try_send(event).is_err() {
            self.dropped += 1;
        }
    }
}

impl SpiPeripheral for SimSpi<'_> {
    fn init(&mut self, config: &SpiConfig) {
        self.actions.push(SpiAction::Init(*config));
    }

    fn supports_clock_control(&self) -> bool {
        self.clock_control
    }

    fn configure_clock(&mut self, clock: &ClockConfig) {
        self.actions.push(SpiAction::Clock(*clock));
    }

    fn start_byte(&mut self, byte: u8) {
        self.actions.push(SpiAction::Byte(byte));
        let index = self.started;
        self.started += 1;

        if let Some(&(at, fault)) = self.faults.front() {
            if at == index {
                self.faults.pop_front();
                self.post(SpiEvent::Fault(fault));
                return;
            }
        }
        let reply = self.replies.pop_front().unwrap_or(byte);
        self.post(SpiEvent::Transferred(reply));
    }

    fn abort(&mut self) {
        self.actions.push(SpiAction::Abort);
    }

    fn txrx_bare(&mut self, byte: u8) -> u8 {
        self.actions.push(SpiAction::Bare(byte));
        self.replies.pop_front().unwrap_or(byte)
    }
}
