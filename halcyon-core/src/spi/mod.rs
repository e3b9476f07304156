//! SPI transaction scheduling
//!
//! Many logical exchanges, each addressed to a possibly different slave,
//! share one physical bus. Submitted [`Transaction`]s wait in a
//! [`TransactionQueue`]; the [`SpiBus`] reactor takes them one at a time,
//! has the [`SlaveArbiter`] select the slave and shape the clock, clocks the
//! bytes and reports through the transaction's callback.

mod bus;
mod queue;
mod slave;
mod transaction;

pub use bus::{SpiBus, SpiState};
pub use queue::{QueueFull, TransactionQueue};
pub use slave::{Selector, Slave, SlaveArbiter};
pub use transaction::{Callback, Completion, Status, Transaction, TransactionId};
