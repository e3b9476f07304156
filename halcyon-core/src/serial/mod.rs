//! Buffered serial transport shared by UARTs and USB-CDC
//!
//! Application code writes into a [`BufferedChannel`] under a lock token and
//! triggers a drain; the [`SerialInterface`] reactor hands chunks to the
//! peripheral and fills the receive ring from its events. The application
//! side is reached through [`halcyon_hal::uart::Transport`].

mod channel;
mod interface;
mod lock;

pub use channel::BufferedChannel;
pub use interface::{SerialInterface, TxState};
pub use lock::LockArbiter;
