//! Simulated USB device core
//!
//! The device side follows the calls made through [`UsbDevice`]; the host
//! side (enumeration, suspend, resume) is driven by the test.

use halcyon_hal::usb::{UsbDevice, UsbStatus};

/// USB device core with a scriptable host
#[derive(Debug, Clone)]
pub struct SimUsb {
    status: UsbStatus,
    enabled: bool,
}

impl Default for SimUsb {
    fn default() -> Self {
        Self::new()
    }
}

impl SimUsb {
    pub fn new() -> Self {
        Self {
            status: UsbStatus::Disconnected,
            enabled: false,
        }
    }

    /// Host starts enumerating a connected device
    pub fn host_reset(&mut self) {
        if self.status == UsbStatus::NotEnumerated {
            self.status = UsbStatus::Enumerating;
        }
    }

    /// Host selects a configuration
    pub fn host_configure(&mut self) {
        if self.status == UsbStatus::Enumerating {
            self.status = UsbStatus::Active;
        }
    }

    /// Host suspends the bus
    pub fn host_suspend(&mut self) {
        self.status = match self.status {
            UsbStatus::Active => UsbStatus::Suspended,
            UsbStatus::NotEnumerated | UsbStatus::Enumerating => UsbStatus::NoEnumSuspended,
            other => other,
        };
    }

    /// Host resumes the bus
    pub fn host_resume(&mut self) {
        self.status = match self.status {
            UsbStatus::Suspended => UsbStatus::Active,
            UsbStatus::NoEnumSuspended => UsbStatus::NotEnumerated,
            other => other,
        };
    }

    /// Force the error state
    pub fn fail(&mut self) {
        self.status = UsbStatus::Error;
    }

    /// Whether the device core is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl UsbDevice for SimUsb {
    fn init(&mut self) {
        *self = Self::new();
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.status = UsbStatus::Disconnected;
    }

    fn connect(&mut self) {
        if self.enabled && self.status == UsbStatus::Disconnected {
            self.status = UsbStatus::NotEnumerated;
        }
    }

    fn disconnect(&mut self) {
        self.status = UsbStatus::Disconnected;
    }

    fn status(&self) -> UsbStatus {
        self.status
    }
}
