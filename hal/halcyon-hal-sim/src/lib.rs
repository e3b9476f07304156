//! Host simulation platform for Halcyon
//!
//! Implements every `halcyon-hal` platform trait against in-memory state so
//! `halcyon-core` can be exercised on a development machine:
//!
//! - [`SimSpi`] - loopback shift engine with scripted replies and fault
//!   injection, posting [`SpiEvent`](halcyon_hal::SpiEvent)s like an ISR would
//! - [`SimGpio`] - port/pin register model that records every action
//! - [`SimSerial`] - UART or USB-CDC engine recording each transmitted chunk
//! - [`SimId`], [`SimEntropy`], [`SimAdc`], [`SimTimer`], [`SimWatchdog`],
//!   [`SimPower`], [`SimUsb`] - the simple collaborators
//! - [`board`] - board maps loaded from TOML
//!
//! Simulated interrupts post into `embassy_sync` channels guarded by
//! `CriticalSectionRawMutex`, the same arrangement firmware uses.

pub mod adc;
pub mod board;
pub mod entropy;
pub mod gpio;
pub mod id;
pub mod serial;
pub mod spi;
pub mod system;
pub mod timer;
pub mod usb;

pub use adc::SimAdc;
pub use board::{load_board, load_map, Board, BoardError, BoardSlave};
pub use entropy::SimEntropy;
pub use gpio::{parse_pin, GpioAction, PinMode, SimGpio};
pub use id::SimId;
pub use serial::{SerialEvents, SimSerial, SERIAL_EVENT_DEPTH};
pub use spi::{SimSpi, SpiAction, SpiEvents, SPI_EVENT_DEPTH};
pub use system::{SimPower, SimWatchdog, WatchdogState};
pub use timer::SimTimer;
pub use usb::SimUsb;
