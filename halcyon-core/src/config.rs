//! Peripheral map
//!
//! Describes which serial and SPI interfaces a board enables and how each
//! is set up. The map is plain data: firmware usually builds it as a
//! constant, host tooling can deserialize it (with the `serde` feature).

use heapless::Vec;

use halcyon_hal::spi::SpiConfig;
use halcyon_hal::uart::{DataBits, Parity, StopBits, UartConfig, MAX_PACKET_SIZE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum UART interfaces per map
pub const MAX_UARTS: usize = 4;

/// Maximum USB-CDC interfaces per map
pub const MAX_USBCDC: usize = 2;

/// Maximum SPI buses per map
pub const MAX_SPI: usize = 4;

/// Default ring length for serial interfaces
pub const DEFAULT_BUFFER_LEN: usize = 64;

/// Full-speed USB bulk endpoint size
pub const USBCDC_PACKET_SIZE: usize = 64;

/// Errors found while validating a peripheral map or building an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Two interfaces of the same kind share an interface number
    DuplicateInterface(u8),
    /// A ring length is zero or exceeds the interface's storage
    InvalidBufferLength,
    /// More interfaces than the map can hold
    TooManyInterfaces,
    /// Packet size is zero or above the largest supported packet
    InvalidPacketSize,
}

/// One UART interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartMap {
    /// Interface number
    pub intfnum: u8,
    /// Line settings
    #[cfg_attr(feature = "serde", serde(default))]
    pub config: UartConfig,
    /// Transmit ring length in bytes
    #[cfg_attr(feature = "serde", serde(default = "default_buffer_len"))]
    pub tx_buffer: usize,
    /// Receive ring length in bytes
    #[cfg_attr(feature = "serde", serde(default = "default_buffer_len"))]
    pub rx_buffer: usize,
}

impl UartMap {
    /// UART with default line settings and ring lengths
    pub const fn new(intfnum: u8) -> Self {
        Self {
            intfnum,
            config: UartConfig {
                baudrate: 115200,
                data_bits: DataBits::Eight,
                parity: Parity::None,
                stop_bits: StopBits::One,
            },
            tx_buffer: DEFAULT_BUFFER_LEN,
            rx_buffer: DEFAULT_BUFFER_LEN,
        }
    }

    /// Same interface with different ring lengths
    pub const fn with_buffers(mut self, tx_buffer: usize, rx_buffer: usize) -> Self {
        self.tx_buffer = tx_buffer;
        self.rx_buffer = rx_buffer;
        self
    }
}

/// One USB-CDC interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UsbCdcMap {
    /// Interface number
    pub intfnum: u8,
    /// Bulk endpoint size
    #[cfg_attr(feature = "serde", serde(default = "default_packet_size"))]
    pub packet_size: usize,
    /// Transmit ring length in bytes
    #[cfg_attr(feature = "serde", serde(default = "default_buffer_len"))]
    pub tx_buffer: usize,
    /// Receive ring length in bytes
    #[cfg_attr(feature = "serde", serde(default = "default_buffer_len"))]
    pub rx_buffer: usize,
}

impl UsbCdcMap {
    /// CDC interface with a full-speed endpoint and default ring lengths
    pub const fn new(intfnum: u8) -> Self {
        Self {
            intfnum,
            packet_size: USBCDC_PACKET_SIZE,
            tx_buffer: DEFAULT_BUFFER_LEN * 2,
            rx_buffer: DEFAULT_BUFFER_LEN * 2,
        }
    }
}

/// One SPI bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiMap {
    /// Interface number
    pub intfnum: u8,
    /// Bus defaults
    #[cfg_attr(feature = "serde", serde(default))]
    pub config: SpiConfig,
}

impl SpiMap {
    /// SPI bus with default clock
    pub fn new(intfnum: u8) -> Self {
        Self {
            intfnum,
            config: SpiConfig::default(),
        }
    }
}

/// Ring sizing shared by UART and USB-CDC interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialMap {
    /// Interface number
    pub intfnum: u8,
    /// Transmit ring length in bytes
    pub tx_buffer: usize,
    /// Receive ring length in bytes
    pub rx_buffer: usize,
}

impl From<&UartMap> for SerialMap {
    fn from(map: &UartMap) -> Self {
        Self {
            intfnum: map.intfnum,
            tx_buffer: map.tx_buffer,
            rx_buffer: map.rx_buffer,
        }
    }
}

impl From<&UsbCdcMap> for SerialMap {
    fn from(map: &UsbCdcMap) -> Self {
        Self {
            intfnum: map.intfnum,
            tx_buffer: map.tx_buffer,
            rx_buffer: map.rx_buffer,
        }
    }
}

/// Complete peripheral map of a board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeripheralMap {
    /// Enabled UARTs
    #[cfg_attr(feature = "serde", serde(default))]
    pub uart: Vec<UartMap, MAX_UARTS>,
    /// Enabled USB-CDC interfaces
    #[cfg_attr(feature = "serde", serde(default))]
    pub usbcdc: Vec<UsbCdcMap, MAX_USBCDC>,
    /// Enabled SPI buses
    #[cfg_attr(feature = "serde", serde(default))]
    pub spi: Vec<SpiMap, MAX_SPI>,
}

impl PeripheralMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a UART
    pub fn add_uart(&mut self, uart: UartMap) -> Result<(), ConfigError> {
        self.uart
            .push(uart)
            .map_err(|_| ConfigError::TooManyInterfaces)
    }

    /// Add a USB-CDC interface
    pub fn add_usbcdc(&mut self, cdc: UsbCdcMap) -> Result<(), ConfigError> {
        self.usbcdc
            .push(cdc)
            .map_err(|_| ConfigError::TooManyInterfaces)
    }

    /// Add an SPI bus
    pub fn add_spi(&mut self, spi: SpiMap) -> Result<(), ConfigError> {
        self.spi.push(spi).map_err(|_| ConfigError::TooManyInterfaces)
    }

    /// Look up a UART by interface number
    pub fn uart(&self, intfnum: u8) -> Option<&UartMap> {
        self.uart.iter().find(|u| u.intfnum == intfnum)
    }

    /// Look up a USB-CDC interface by interface number
    pub fn usbcdc(&self, intfnum: u8) -> Option<&UsbCdcMap> {
        self.usbcdc.iter().find(|u| u.intfnum == intfnum)
    }

    /// Look up an SPI bus by interface number
    pub fn spi(&self, intfnum: u8) -> Option<&SpiMap> {
        self.spi.iter().find(|s| s.intfnum == intfnum)
    }

    /// Check the map for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unique(self.uart.iter().map(|u| u.intfnum))?;
        check_unique(self.usbcdc.iter().map(|u| u.intfnum))?;
        check_unique(self.spi.iter().map(|s| s.intfnum))?;

        for uart in &self.uart {
            if uart.tx_buffer == 0 || uart.rx_buffer == 0 {
                return Err(ConfigError::InvalidBufferLength);
            }
        }
        for cdc in &self.usbcdc {
            if cdc.packet_size == 0 || cdc.packet_size > MAX_PACKET_SIZE {
                return Err(ConfigError::InvalidPacketSize);
            }
            if cdc.tx_buffer == 0 || cdc.rx_buffer == 0 {
                return Err(ConfigError::InvalidBufferLength);
            }
        }
        Ok(())
    }
}

fn check_unique(numbers: impl Iterator<Item = u8> + Clone) -> Result<(), ConfigError> {
    for (i, n) in numbers.clone().enumerate() {
        if numbers.clone().skip(i + 1).any(|m| m == n) {
            return Err(ConfigError::DuplicateInterface(n));
        }
    }
    Ok(())
}

#[cfg(feature = "serde")]
fn default_buffer_len() -> usize {
    DEFAULT_BUFFER_LEN
}

#[cfg(feature = "serde")]
fn default_packet_size() -> usize {
    USBCDC_PACKET_SIZE
}
