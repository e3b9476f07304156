//! Halcyon Hardware Abstraction Layer
//!
//! This crate defines the call contract between portable firmware and the
//! per-platform code that pokes registers. A platform crate implements the
//! traits in here; `halcyon-core` builds the buffered, interrupt-driven
//! SPI and serial machinery on top of them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application firmware                   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  halcyon-core (queues, rings, reactors) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  halcyon-hal (this crate - contract)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ halcyon-hal-  │       │ halcyon-hal-  │
//! │     sim       │       │  <your chip>  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`spi::SpiPeripheral`] - Byte-at-a-time SPI shift engine
//! - [`uart::SerialPeripheral`] - UART / USB-CDC transmit and receive engine
//! - [`uart::Transport`] - Buffered serial surface seen by the application
//! - [`gpio::Gpio`] - Port/pin addressed digital I/O
//! - [`adc::Adc`], [`timer::Timer`], [`system::Watchdog`], [`system::PowerClock`]
//! - [`entropy::EntropySource`], [`id::UniqueId`], [`usb::UsbDevice`]

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod entropy;
pub mod gpio;
pub mod id;
pub mod spi;
pub mod system;
pub mod timer;
pub mod uart;
pub mod usb;

// Re-export key traits at crate root for convenience
pub use adc::Adc;
pub use entropy::EntropySource;
pub use gpio::{Gpio, PinSelector};
pub use id::UniqueId;
pub use spi::{SpiEvent, SpiFault, SpiPeripheral};
pub use system::{PowerClock, Watchdog};
pub use timer::Timer;
pub use uart::{LockMode, LockToken, SerialEvent, SerialPeripheral, Transport};
pub use usb::{UsbDevice, UsbStatus};
