//! Transmit and receive rings of one serial interface
//!
//! The application is the only producer of the transmit ring and the only
//! consumer of the receive ring; the reactor is the other side of each.
//! Ring capacities are const generics, and a map entry may ask for a
//! shorter effective length than the storage provides.

use heapless::Deque;

use halcyon_hal::uart::{LockMode, LockToken};

use super::lock::LockArbiter;
use crate::config::ConfigError;

/// Paired rings with their lock and overrun counter
#[derive(Debug)]
pub struct BufferedChannel<const TX: usize, const RX: usize> {
    tx: Deque<u8, TX>,
    rx: Deque<u8, RX>,
    tx_limit: usize,
    rx_limit: usize,
    lock: LockArbiter,
    overruns: u32,
}

impl<const TX: usize, const RX: usize> Default for BufferedChannel<TX, RX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const TX: usize, const RX: usize> BufferedChannel<TX, RX> {
    /// Channel using the full storage of both rings
    pub const fn new() -> Self {
        Self {
            tx: Deque::new(),
            rx: Deque::new(),
            tx_limit: TX,
            rx_limit: RX,
            lock: LockArbiter::new(),
            overruns: 0,
        }
    }

    /// Channel limited to `tx_len` and `rx_len` bytes
    ///
    /// Both lengths must be non-zero and fit the storage.
    pub fn with_limits(tx_len: usize, rx_len: usize) -> Result<Self, ConfigError> {
        if tx_len == 0 || tx_len > TX || rx_len == 0 || rx_len > RX {
            return Err(ConfigError::InvalidBufferLength);
        }
        let mut channel = Self::new();
        channel.tx_limit = tx_len;
        channel.rx_limit = rx_len;
        Ok(channel)
    }

    /// Effective transmit ring length
    pub fn tx_capacity(&self) -> usize {
        self.tx_limit
    }

    /// Effective receive ring length
    pub fn rx_capacity(&self) -> usize {
        self.rx_limit
    }

    /// Unused transmit headroom
    pub fn tx_free(&self) -> usize {
        self.tx_limit - self.tx.len()
    }

    /// Bytes waiting to be sent
    pub fn tx_pending(&self) -> usize {
        self.tx.len()
    }

    /// The transmit lock
    pub fn lock(&self) -> &LockArbiter {
        &self.lock
    }

    /// Reserve `len` bytes of headroom under `token`
    pub fn reqlock(&mut self, len: usize, token: LockToken) -> bool {
        let free = self.tx_free();
        let granted = self.lock.request(token, len, free);
        if !granted {
            trace!(
                "reqlock {=u8} for {=usize} refused, {=usize} free",
                token.value(),
                len,
                free
            );
        }
        granted
    }

    /// Abandon `token`'s reservation
    pub fn release(&mut self, token: LockToken) -> bool {
        self.lock.release(token)
    }

    /// Append one byte
    pub fn putc(&mut self, byte: u8, token: LockToken, mode: LockMode) -> bool {
        let allowed = match mode {
            LockMode::Managed => self.lock.admits(token),
            LockMode::Held => self.lock.is_held_by(token),
        };
        if !allowed || self.tx_free() == 0 {
            return false;
        }
        if self.tx.push_back(byte).is_err() {
            return false;
        }
        self.lock.consume(token, 1);
        true
    }

    /// Append as much of `data` as fits; returns the count written
    ///
    /// Writes nothing while another token holds the lock.
    pub fn write(&mut self, data: &[u8], token: LockToken) -> usize {
        if !self.lock.admits(token) {
            return 0;
        }
        let n = data.len().min(self.tx_free());
        for &byte in &data[..n] {
            // room was checked above
            let _ = self.tx.push_back(byte);
        }
        self.lock.consume(token, n);
        n
    }

    /// Move up to `out.len()` pending bytes into `out`
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let mut n = 0;
        for slot in out.iter_mut() {
            match self.tx.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    /// Store a received byte; counts an overrun and drops it if full
    pub fn fill(&mut self, byte: u8) -> bool {
        if self.rx.len() >= self.rx_limit || self.rx.push_back(byte).is_err() {
            self.overruns = self.overruns.saturating_add(1);
            return false;
        }
        true
    }

    /// Unread received bytes
    pub fn population_rxb(&self) -> usize {
        self.rx.len()
    }

    /// Drop every unread byte
    pub fn discard_rxb(&mut self) {
        self.rx.clear();
    }

    /// Take one received byte
    pub fn getc(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    /// Copy out up to `buf.len()` received bytes
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.rx.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    /// Bytes dropped because the receive ring was full
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Empty both rings, drop the lock and zero the overrun counter
    pub fn reset(&mut self) {
        self.tx.clear();
        self.rx.clear();
        self.lock.reset();
        self.overruns = 0;
    }
}
