//! USB device core control
//!
//! The HAL only switches the USB device on and off and reports where it is
//! in enumeration. Descriptors, endpoints and class handling stay in the
//! platform's USB stack; USB-CDC data moves through
//! [`crate::uart::SerialPeripheral`] like any other serial transport.

/// Connection status of the USB device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbStatus {
    /// Host is not connected
    Disconnected,
    /// Host is connected but has not enumerated us
    NotEnumerated,
    /// Enumeration in progress
    Enumerating,
    /// Ready for use
    Active,
    /// Host has placed the device in suspend
    Suspended,
    /// Suspended before enumeration
    NoEnumSuspended,
    /// USB error
    Error,
}

impl UsbStatus {
    /// Whether class traffic (e.g. CDC data) can flow
    pub fn is_active(&self) -> bool {
        matches!(self, UsbStatus::Active)
    }
}

/// USB device core
pub trait UsbDevice {
    /// Initialise USB and connect if possible
    fn init(&mut self);

    /// Enable the module (only needed when toggling USB at runtime)
    fn enable(&mut self);

    /// Disable the module
    fn disable(&mut self);

    /// Connect to the host
    fn connect(&mut self);

    /// Disconnect from the host
    fn disconnect(&mut self);

    /// Current connection status
    fn status(&self) -> UsbStatus;
}
