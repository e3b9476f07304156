//! Pending-transaction queue for one SPI bus
//!
//! Transactions are moved into a fixed slot arena when submitted and
//! addressed by [`TransactionId`] from then on. The queue order is a list of
//! slot numbers, head first. Because submission moves the transaction, the
//! same transaction can never sit in the queue twice.

use core::fmt;

use heapless::Vec;

use super::transaction::{Transaction, TransactionId};

/// The arena had no free slot; the rejected transaction is handed back
pub struct QueueFull<'a>(pub Transaction<'a>);

impl fmt::Debug for QueueFull<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueueFull").field(&self.0).finish()
    }
}

/// Ordered set of transactions waiting for the bus
pub struct TransactionQueue<'a, const N: usize> {
    slots: [Option<Transaction<'a>>; N],
    generations: [u32; N],
    order: Vec<u8, N>,
}

impl<'a, const N: usize> Default for TransactionQueue<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> TransactionQueue<'a, N> {
    const CAPACITY_OK: () = assert!(N > 0 && N <= 256, "queue depth must be 1..=256");

    /// Create an empty queue
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;
        Self {
            slots: core::array::from_fn(|_| None),
            generations: [0; N],
            order: Vec::new(),
        }
    }

    /// Number of queued transactions
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether every slot is taken
    pub fn is_full(&self) -> bool {
        self.order.is_full()
    }

    /// Append at the tail
    pub fn push_back(&mut self, txn: Transaction<'a>) -> Result<TransactionId, QueueFull<'a>> {
        let id = self.store(txn)?;
        // `store` found a free slot, so the order list has room too
        let _ = self.order.push(id.slot);
        Ok(id)
    }

    /// Insert at the head
    pub fn push_front(&mut self, txn: Transaction<'a>) -> Result<TransactionId, QueueFull<'a>> {
        let id = self.store(txn)?;
        let _ = self.order.insert(0, id.slot);
        Ok(id)
    }

    /// Take the head
    pub fn pop_front(&mut self) -> Option<(TransactionId, Transaction<'a>)> {
        if self.order.is_empty() {
            return None;
        }
        let slot = self.order.remove(0);
        let id = self.id_of(slot);
        self.release(slot).map(|txn| (id, txn))
    }

    /// Take a transaction out by id, wherever it is in the queue
    ///
    /// Returns `None` (and changes nothing) if the id is not queued.
    pub fn remove(&mut self, id: TransactionId) -> Option<Transaction<'a>> {
        if !self.contains(id) {
            return None;
        }
        let pos = self.order.iter().position(|&s| s == id.slot)?;
        self.order.remove(pos);
        self.release(id.slot)
    }

    /// Whether `id` is currently queued
    pub fn contains(&self, id: TransactionId) -> bool {
        let slot = id.slot as usize;
        slot < N && self.slots[slot].is_some() && self.generations[slot] == id.generation
    }

    /// Ids in service order
    pub fn ids(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.order.iter().map(|&slot| self.id_of(slot))
    }

    /// Id of the head, if any
    pub fn peek(&self) -> Option<TransactionId> {
        self.order.first().map(|&slot| self.id_of(slot))
    }

    fn id_of(&self, slot: u8) -> TransactionId {
        TransactionId {
            slot,
            generation: self.generations[slot as usize],
        }
    }

    fn store(&mut self, txn: Transaction<'a>) -> Result<TransactionId, QueueFull<'a>> {
        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = Some(txn);
                Ok(self.id_of(slot as u8))
            }
            None => Err(QueueFull(txn)),
        }
    }

    fn release(&mut self, slot: u8) -> Option<Transaction<'a>> {
        let slot = slot as usize;
        let txn = self.slots[slot].take();
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        txn
    }

    /// Structural check used by tests: every queued slot is occupied and
    /// listed once, and every occupied slot is queued
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        let listed_once = self
            .order
            .iter()
            .all(|&s| self.order.iter().filter(|&&t| t == s).count() == 1);
        let all_occupied = self
            .order
            .iter()
            .all(|&s| self.slots[s as usize].is_some());
        occupied == self.order.len() && listed_once && all_occupied
    }
}
