//! Board-agnostic core of the Halcyon HAL
//!
//! This crate holds everything in the peripheral layer that has state:
//!
//! - [`spi`]: the transaction queue that multiplexes many slave-addressed
//!   exchanges over one bus, the slave arbiter, and the interrupt reactor
//!   that clocks them out
//! - [`serial`]: the token-locked transmit ring, the receive ring with its
//!   overrun counter, and the reactor that drains and fills them for UARTs
//!   and USB-CDC alike
//! - [`config`]: the peripheral map describing which interfaces exist
//!
//! Every interface is an owned context value. Firmware typically parks it in
//! an `embassy_sync::blocking_mutex::Mutex<CriticalSectionRawMutex,
//! RefCell<_>>` shared by foreground code and the interrupt handler, while
//! the handler itself only posts events into a bounded
//! `embassy_sync::channel::Channel` that [`spi::SpiBus::react`] and
//! [`serial::SerialInterface::react`] consume.
//!
//! Nothing in here blocks or allocates.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod config;
pub mod serial;
pub mod spi;

pub use config::{ConfigError, PeripheralMap};
pub use serial::{BufferedChannel, LockArbiter, SerialInterface, TxState};
pub use spi::{
    Completion, QueueFull, Selector, Slave, SlaveArbiter, SpiBus, SpiState, Status, Transaction,
    TransactionId, TransactionQueue,
};
