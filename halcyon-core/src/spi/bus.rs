//! SPI bus context and its interrupt reactor
//!
//! [`SpiBus`] owns the shift engine, the slave arbiter and the pending
//! queue. Foreground code submits [`Transaction`]s; the platform's interrupt
//! handler posts one [`SpiEvent`] per clocked byte and [`SpiBus::react`]
//! turns those into the next byte, the next slave, or a completion callback.
//!
//! A finished transaction is parked in the bus until its owner collects it
//! with [`SpiBus::take_completed`] or [`SpiBus::pop_completed`], which hands
//! the buffers back for the next exchange.
//!
//! ```text
//!   enqueue ──► queue ──► Selecting ──► Clocking ──► Deselecting ──► Idle
//!                             ▲            │  ▲                        │
//!                             │            └──┘ Transferred            │
//!                             └──────────── next pending ◄─────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use halcyon_hal::gpio::Gpio;
use halcyon_hal::spi::{SpiConfig, SpiEvent, SpiPeripheral};

use super::queue::{QueueFull, TransactionQueue};
use super::slave::{Slave, SlaveArbiter};
use super::transaction::{Completion, Status, Transaction, TransactionId};
use crate::config::SpiMap;

/// Where the bus is in servicing a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiState {
    /// Nothing in service
    Idle,
    /// Asserting the select and shaping the clock
    Selecting,
    /// Bytes in flight
    Clocking,
    /// Releasing the select and reporting completion
    Deselecting,
}

/// The transaction currently on the wire
struct Active<'a> {
    id: TransactionId,
    txn: Transaction<'a>,
    clocked: usize,
}

/// A transaction that has left the bus and waits for its owner
struct Finished<'a> {
    id: TransactionId,
    txn: Transaction<'a>,
    status: Status,
}

/// One SPI bus with up to `N` pending transactions
pub struct SpiBus<'a, P: SpiPeripheral, G: Gpio, const N: usize> {
    intfnum: u8,
    peripheral: P,
    arbiter: SlaveArbiter<G>,
    queue: TransactionQueue<'a, N>,
    config: SpiConfig,
    state: SpiState,
    active: Option<Active<'a>>,
    completed: Vec<Finished<'a>, N>,
}

impl<'a, P: SpiPeripheral, G: Gpio, const N: usize> SpiBus<'a, P, G, N> {
    /// Create a bus context; call [`SpiBus::init`] before use
    pub fn new(intfnum: u8, peripheral: P, gpio: G, config: SpiConfig) -> Self {
        Self {
            intfnum,
            peripheral,
            arbiter: SlaveArbiter::new(gpio, config.clock),
            queue: TransactionQueue::new(),
            config,
            state: SpiState::Idle,
            active: None,
            completed: Vec::new(),
        }
    }

    /// Create a bus context from its peripheral map entry
    pub fn from_map(map: &SpiMap, peripheral: P, gpio: G) -> Self {
        Self::new(map.intfnum, peripheral, gpio, map.config)
    }

    /// Bring the peripheral up with the bus defaults
    pub fn init(&mut self) {
        self.peripheral.init(&self.config);
        self.arbiter.reset_clock();
        info!("spi{=u8}: init", self.intfnum);
    }

    /// Put a slave into its deselected state
    ///
    /// Call once per slave before its first transaction.
    pub fn init_slave(&mut self, slave: &Slave) {
        self.arbiter.init_slave(slave);
    }

    /// Select a slave by hand
    ///
    /// Only meaningful together with [`SpiBus::txrx_bare`] while the queue
    /// is empty.
    pub fn select_slave(&mut self, slave: &Slave) {
        self.arbiter.select(slave, &mut self.peripheral);
    }

    /// Release a slave selected with [`SpiBus::select_slave`]
    pub fn deselect_slave(&mut self, slave: &Slave) {
        self.arbiter.deselect(slave);
    }

    /// Append a transaction to the queue
    ///
    /// Service starts at once if the bus is idle. When every slot is taken
    /// the transaction is handed back untouched.
    pub fn enqueue(&mut self, txn: Transaction<'a>) -> Result<TransactionId, QueueFull<'a>> {
        let id = self.queue.push_back(txn)?;
        trace!("spi{=u8}: queued, {=usize} pending", self.intfnum, self.queue.len());
        self.kick();
        Ok(id)
    }

    /// Put a transaction at the head of the queue
    ///
    /// It runs next, after whatever is already in service.
    pub fn enqueue_priority(
        &mut self,
        txn: Transaction<'a>,
    ) -> Result<TransactionId, QueueFull<'a>> {
        let id = self.queue.push_front(txn)?;
        trace!("spi{=u8}: queued at head", self.intfnum);
        self.kick();
        Ok(id)
    }

    /// Withdraw a transaction that has not started yet
    ///
    /// Returns it if it was still queued. Started, finished and unknown
    /// transactions are left alone and `None` is returned.
    pub fn cancel(&mut self, id: TransactionId) -> Option<Transaction<'a>> {
        let txn = self.queue.remove(id);
        if txn.is_some() {
            debug!("spi{=u8}: cancelled", self.intfnum);
        }
        txn
    }

    /// Whether nothing is queued and nothing is in service
    pub fn queue_empty(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Number of queued transactions, not counting the one in service
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// The transaction on the wire, if any
    pub fn in_service(&self) -> Option<TransactionId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Queued transactions in the order they will run
    pub fn pending_ids(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.queue.ids()
    }

    /// Collect a finished transaction and its outcome
    ///
    /// Returns `None` while it is still queued or in service, and once it
    /// has been collected. The bus keeps the last `N` finished transactions;
    /// older uncollected ones are dropped.
    pub fn take_completed(&mut self, id: TransactionId) -> Option<(Transaction<'a>, Status)> {
        let pos = self.completed.iter().position(|f| f.id == id)?;
        let done = self.completed.remove(pos);
        Some((done.txn, done.status))
    }

    /// Collect the oldest finished transaction
    pub fn pop_completed(&mut self) -> Option<(TransactionId, Transaction<'a>, Status)> {
        if self.completed.is_empty() {
            return None;
        }
        let done = self.completed.remove(0);
        Some((done.id, done.txn, done.status))
    }

    /// Number of finished transactions waiting to be collected
    pub fn completed(&self) -> usize {
        self.completed.len()
    }

    /// Current reactor state
    pub fn state(&self) -> SpiState {
        self.state
    }

    /// Exchange one byte directly, bypassing the queue (debug only)
    pub fn txrx_bare(&mut self, byte: u8) -> u8 {
        self.peripheral.txrx_bare(byte)
    }

    /// The shift engine
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// Mutable access to the shift engine
    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    /// The GPIO driver used for chip selects
    pub fn gpio(&self) -> &G {
        self.arbiter.gpio()
    }

    /// Mutable access to the GPIO driver used for chip selects
    pub fn gpio_mut(&mut self) -> &mut G {
        self.arbiter.gpio_mut()
    }

    /// Handle everything currently waiting in `events`
    ///
    /// Work is bounded by the channel capacity: at most `E` events are taken
    /// per call, even if handling them makes the platform post more.
    /// Returns the number of events handled.
    pub fn react<M: RawMutex, const E: usize>(&mut self, events: &Channel<M, SpiEvent, E>) -> usize {
        let mut handled = 0;
        while handled < E {
            match events.try_receive() {
                Ok(event) => {
                    self.on_event(event);
                    handled += 1;
                }
                Err(_) => break,
            }
        }
        handled
    }

    /// Handle one completion signal from the shift engine
    pub fn on_event(&mut self, event: SpiEvent) {
        let Some(mut active) = self.active.take() else {
            warn!("spi{=u8}: {} while idle, ignored", self.intfnum, event);
            return;
        };

        match event {
            SpiEvent::Transferred(byte) => {
                if let Some(slot) = active.txn.rx.get_mut(active.clocked) {
                    *slot = byte;
                }
                active.clocked += 1;
                if active.clocked < active.txn.clocked_len() {
                    let next = self.out_byte(&active.txn, active.clocked);
                    self.active = Some(active);
                    self.peripheral.start_byte(next);
                    return;
                }
                self.finish(active, Status::Complete);
            }
            SpiEvent::Fault(fault) => {
                warn!(
                    "spi{=u8}: fault {} after {=usize} bytes",
                    self.intfnum, fault, active.clocked
                );
                self.peripheral.abort();
                self.finish(active, Status::Fault(fault));
            }
        }

        self.start_next();
    }

    fn kick(&mut self) {
        if self.active.is_none() {
            self.start_next();
        }
    }

    /// Take pending transactions until one is on the wire or none are left
    fn start_next(&mut self) {
        while self.active.is_none() {
            let Some((id, txn)) = self.queue.pop_front() else {
                self.state = SpiState::Idle;
                return;
            };

            if txn.clocked_len() == 0 {
                // nothing to clock, so the slave is never selected
                report(id, &txn, 0, Status::Complete);
                self.park(id, txn, Status::Complete);
                continue;
            }

            self.state = SpiState::Selecting;
            self.arbiter.select(txn.slave, &mut self.peripheral);

            self.state = SpiState::Clocking;
            let first = self.out_byte(&txn, 0);
            self.active = Some(Active {
                id,
                txn,
                clocked: 0,
            });
            self.peripheral.start_byte(first);
        }
    }

    fn finish(&mut self, active: Active<'a>, status: Status) {
        self.state = SpiState::Deselecting;
        self.arbiter.deselect(active.txn.slave);
        report(active.id, &active.txn, active.clocked, status);
        self.park(active.id, active.txn, status);
        self.state = SpiState::Idle;
    }

    fn park(&mut self, id: TransactionId, txn: Transaction<'a>, status: Status) {
        if self.completed.is_full() {
            // full means non-empty, N is at least one
            let _ = self.completed.remove(0);
            debug!("spi{=u8}: oldest completion never collected", self.intfnum);
        }
        let _ = self.completed.push(Finished { id, txn, status });
    }

    fn out_byte(&self, txn: &Transaction<'_>, index: usize) -> u8 {
        txn.tx.get(index).copied().unwrap_or(self.config.fill_byte)
    }
}

fn report(id: TransactionId, txn: &Transaction<'_>, clocked: usize, status: Status) {
    if let Some(callback) = txn.callback {
        let received = &txn.rx[..clocked.min(txn.rx.len())];
        callback(&Completion {
            id,
            status,
            transmitted: clocked,
            received,
        });
    }
}
