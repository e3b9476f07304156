//! Transmit ring lock
//!
//! One producer at a time may hold a reservation of transmit headroom. The
//! reservation shrinks as the holder writes and the lock drops by itself
//! when it reaches zero, so a producer that reserves exactly what it then
//! writes never has to release explicitly.

use halcyon_hal::uart::LockToken;

/// Single-owner token lock over a transmit ring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockArbiter {
    holder: Option<LockToken>,
    reserved: usize,
}

impl LockArbiter {
    /// An unheld lock
    pub const fn new() -> Self {
        Self {
            holder: None,
            reserved: 0,
        }
    }

    /// Current holder
    pub fn holder(&self) -> Option<LockToken> {
        self.holder
    }

    /// Bytes still reserved by the holder
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Whether `token` holds the lock
    pub fn is_held_by(&self, token: LockToken) -> bool {
        self.holder == Some(token)
    }

    /// Whether `token` may write: the lock is free or it is the holder
    pub fn admits(&self, token: LockToken) -> bool {
        self.holder.is_none() || self.is_held_by(token)
    }

    /// Reserve `len` more bytes for `token` out of `free` bytes of headroom
    ///
    /// A holder asking again extends its reservation. A zero-length request
    /// succeeds when the lock admits `token` but takes nothing.
    pub fn request(&mut self, token: LockToken, len: usize, free: usize) -> bool {
        if !self.admits(token) {
            return false;
        }
        let Some(wanted) = self.reserved.checked_add(len).filter(|&w| w <= free) else {
            return false;
        };
        if len > 0 {
            self.holder = Some(token);
            self.reserved = wanted;
        }
        true
    }

    /// Account for `n` bytes written by `token`
    pub fn consume(&mut self, token: LockToken, n: usize) {
        if !self.is_held_by(token) {
            return;
        }
        self.reserved = self.reserved.saturating_sub(n);
        if self.reserved == 0 {
            self.holder = None;
        }
    }

    /// Drop `token`'s reservation; false if it did not hold the lock
    pub fn release(&mut self, token: LockToken) -> bool {
        if !self.is_held_by(token) {
            return false;
        }
        self.reset();
        true
    }

    /// Forget any holder
    pub fn reset(&mut self) {
        self.holder = None;
        self.reserved = 0;
    }
}
