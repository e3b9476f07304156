//! Serial communication abstractions (UART and USB-CDC)
//!
//! Both transports share one shape: the application fills a transmit ring
//! under a [`LockToken`] and triggers a drain, while the interrupt handler
//! reports progress as [`SerialEvent`]s. UARTs move one byte per transfer,
//! USB-CDC moves whole packets; [`SerialPeripheral::packet_size`] is the
//! only thing that differs.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest transmit unit any serial peripheral may ask for
pub const MAX_PACKET_SIZE: usize = 64;

/// Serial transmit/receive engine
///
/// Implemented once per platform and per transport kind.
pub trait SerialPeripheral {
    /// Bring the peripheral up
    fn init(&mut self);

    /// Bytes moved per hardware transfer
    ///
    /// 1 for byte-oriented UARTs, the endpoint size for USB-CDC. Values
    /// above [`MAX_PACKET_SIZE`] are clamped.
    fn packet_size(&self) -> usize {
        1
    }

    /// Hand one chunk of at most `packet_size()` bytes to the hardware
    ///
    /// Completion is reported as [`SerialEvent::TxDone`].
    fn start_transmit(&mut self, chunk: &[u8]);

    /// Send one byte without buffers or interrupts (debug only)
    fn putc_bare(&mut self, byte: u8);

    /// Receive one byte without buffers or interrupts (debug only)
    ///
    /// Spins until a byte arrives.
    fn getc_bare(&mut self) -> u8;
}

/// Signal posted by a serial interrupt handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialEvent {
    /// The chunk passed to `start_transmit` has left the peripheral
    TxDone,
    /// A byte arrived
    Received(u8),
}

/// Identity of one logical producer on a transmit ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockToken(u8);

impl LockToken {
    /// Create a token from a caller-chosen value
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// The raw token value
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// How `putc` interacts with the transmit lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockMode {
    /// Take and drop the lock for this one byte; give up at once if it is
    /// held by someone else
    Managed,
    /// The caller already holds the lock under the given token
    Held,
}

/// Buffered serial surface used by application code
///
/// Nothing here blocks. Every call answers with success, a count, or a
/// status, and retrying is up to the caller.
pub trait Transport {
    /// Start or continue draining full packets from the transmit ring
    ///
    /// Call only with at least one byte pending.
    fn send_trigger(&mut self);

    /// Drain everything, including a trailing partial packet
    fn send_flush(&mut self);

    /// Reserve `len` bytes of transmit headroom under `token`
    ///
    /// Fails immediately when another token holds the lock or the headroom
    /// is not there. The reservation is consumed by the holder's writes and
    /// the lock drops when it reaches zero.
    fn reqlock(&mut self, len: usize, token: LockToken) -> bool;

    /// Abandon whatever is left of `token`'s reservation
    fn release(&mut self, token: LockToken) -> bool;

    /// Append one byte
    fn putc(&mut self, byte: u8, token: LockToken, mode: LockMode) -> bool;

    /// Append as much of `data` as fits; returns the count written
    fn write(&mut self, data: &[u8], token: LockToken) -> usize;

    /// Unread bytes in the receive ring
    fn population_rxb(&self) -> usize;

    /// Drop every unread byte
    fn discard_rxb(&mut self);

    /// Take one received byte
    fn getc(&mut self) -> Option<u8>;

    /// Copy out up to `buf.len()` received bytes; returns the count copied
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Formatted write through the same lock rules as [`Transport::write`]
    ///
    /// Returns the number of bytes written, or 0 if the output did not fit.
    /// Bytes that did fit before the failure stay in the ring, so reserve
    /// enough headroom first when the message must not be split.
    fn print(&mut self, token: LockToken, args: fmt::Arguments<'_>) -> usize
    where
        Self: Sized,
    {
        let mut writer = TokenWriter {
            transport: self,
            token,
            written: 0,
        };
        match fmt::write(&mut writer, args) {
            Ok(()) => writer.written,
            Err(_) => 0,
        }
    }
}

struct TokenWriter<'t, T: Transport> {
    transport: &'t mut T,
    token: LockToken,
    written: usize,
}

impl<T: Transport> fmt::Write for TokenWriter<'_, T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let n = self.transport.write(s.as_bytes(), self.token);
        self.written += n;
        if n == s.len() {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    Two,
}
