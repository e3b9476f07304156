//! SPI transactions
//!
//! A transaction is one logical exchange with one slave: some bytes out,
//! some bytes in, and a callback when it is over. The two sides need not be
//! the same length; the bus clocks the longer of the two, padding the
//! transmit side with its fill byte and discarding surplus received bytes.

use core::fmt;

use halcyon_hal::spi::SpiFault;

use super::slave::Slave;

/// Completion callback
///
/// Runs in interrupt context, so it must be short and must not touch the
/// bus it was called from.
pub type Callback<'a> = &'a (dyn Fn(&Completion<'_>) + Sync);

/// Identity of a submitted transaction
///
/// Ids are generational: once a transaction leaves the queue its id never
/// matches anything again, even if the slot is reused. The generation is 32
/// bits wide, so an id only comes back after 2^32 reuses of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransactionId {
    pub(crate) slot: u8,
    pub(crate) generation: u32,
}

/// Outcome of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Every byte was clocked
    Complete,
    /// The bus faulted part way; the slave was deselected
    Fault(SpiFault),
}

/// What a completion callback gets to see
#[derive(Debug)]
pub struct Completion<'c> {
    /// The finished transaction
    pub id: TransactionId,
    /// How it ended
    pub status: Status,
    /// Bytes clocked out before it ended
    pub transmitted: usize,
    /// Received bytes, as far as they got
    pub received: &'c [u8],
}

/// One logical SPI exchange
pub struct Transaction<'a> {
    pub(crate) tx: &'a [u8],
    pub(crate) rx: &'a mut [u8],
    pub(crate) slave: &'a Slave,
    pub(crate) callback: Option<Callback<'a>>,
}

impl<'a> Transaction<'a> {
    /// Full-duplex exchange
    pub fn new(slave: &'a Slave, tx: &'a [u8], rx: &'a mut [u8]) -> Self {
        Self {
            tx,
            rx,
            slave,
            callback: None,
        }
    }

    /// Transmit-only exchange
    pub fn write(slave: &'a Slave, tx: &'a [u8]) -> Self {
        Self::new(slave, tx, &mut [])
    }

    /// Receive-only exchange; the fill byte is clocked out
    pub fn read(slave: &'a Slave, rx: &'a mut [u8]) -> Self {
        Self::new(slave, &[], rx)
    }

    /// Attach a completion callback
    pub fn with_callback(mut self, callback: Callback<'a>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Bytes to transmit
    pub fn tx_len(&self) -> usize {
        self.tx.len()
    }

    /// Bytes to receive
    pub fn rx_len(&self) -> usize {
        self.rx.len()
    }

    /// Bytes that will actually be clocked
    pub fn clocked_len(&self) -> usize {
        self.tx.len().max(self.rx.len())
    }

    /// The addressed slave
    pub fn slave(&self) -> &'a Slave {
        self.slave
    }

    /// Received data so far (all of it once the transaction completed)
    pub fn rx(&self) -> &[u8] {
        self.rx
    }

    /// Give the buffers back
    pub fn into_parts(self) -> (&'a [u8], &'a mut [u8]) {
        (self.tx, self.rx)
    }

    /// Give the receive buffer back
    pub fn into_rx(self) -> &'a mut [u8] {
        self.rx
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("tx_len", &self.tx.len())
            .field("rx_len", &self.rx.len())
            .field("slave", self.slave)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
