//! Board description files
//!
//! A board file is TOML listing the interfaces a board enables and the SPI
//! slaves wired to each bus:
//!
//! ```toml
//! [[uart]]
//! intfnum = 0
//! tx_buffer = 32
//!
//! [[usbcdc]]
//! intfnum = 0
//!
//! [[spi]]
//! intfnum = 1
//!
//! [[slave]]
//! bus = 1
//! cs = "PA4"
//! mode = 3
//! divider = 8
//! ```

use serde::Deserialize;

use halcyon_core::config::{ConfigError, PeripheralMap, SpiMap, UartMap, UsbCdcMap};
use halcyon_core::spi::Slave;
use halcyon_hal::spi::{BitOrder, ClockConfig, Mode};

use crate::gpio::parse_pin;

/// Board file loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Not valid TOML, or fields of the wrong shape
    Parse,
    /// The interfaces do not form a valid map
    Invalid(ConfigError),
    /// A chip select is not a pin name like `PA4`
    InvalidPin,
    /// A slave names a bus the board does not enable
    UnknownBus(u8),
    /// SPI mode outside 0..=3
    InvalidMode(u8),
}

impl From<ConfigError> for BoardError {
    fn from(e: ConfigError) -> Self {
        BoardError::Invalid(e)
    }
}

/// An SPI slave and the bus it hangs off
#[derive(Debug, Clone)]
pub struct BoardSlave {
    /// Interface number of the bus
    pub bus: u8,
    pub slave: Slave,
}

/// Everything a board file describes
#[derive(Debug, Clone)]
pub struct Board {
    pub map: PeripheralMap,
    pub slaves: Vec<BoardSlave>,
}

impl Board {
    /// Slaves on one bus, in file order
    pub fn slaves_on(&self, bus: u8) -> impl Iterator<Item = &Slave> {
        self.slaves
            .iter()
            .filter(move |s| s.bus == bus)
            .map(|s| &s.slave)
    }
}

#[derive(Deserialize)]
struct BoardFile {
    #[serde(default)]
    uart: Vec<UartMap>,
    #[serde(default)]
    usbcdc: Vec<UsbCdcMap>,
    #[serde(default)]
    spi: Vec<SpiMap>,
    #[serde(default)]
    slave: Vec<SlaveEntry>,
}

#[derive(Deserialize)]
struct SlaveEntry {
    bus: u8,
    cs: String,
    mode: Option<u8>,
    divider: Option<u8>,
    #[serde(default)]
    lsb_first: bool,
}

impl SlaveEntry {
    fn build(&self) -> Result<Slave, BoardError> {
        let pin = parse_pin(&self.cs).ok_or(BoardError::InvalidPin)?;
        let mut slave = Slave::with_pin(pin);

        if self.mode.is_some() || self.divider.is_some() || self.lsb_first {
            let mode = match self.mode.unwrap_or(0) {
                0 => Mode::Mode0,
                1 => Mode::Mode1,
                2 => Mode::Mode2,
                3 => Mode::Mode3,
                other => return Err(BoardError::InvalidMode(other)),
            };
            let mut clock = ClockConfig::new(mode).with_divider(self.divider.unwrap_or(1));
            if self.lsb_first {
                clock = clock.with_bit_order(BitOrder::LsbFirst);
            }
            slave = slave.with_clock(clock);
        }
        Ok(slave)
    }
}

/// Parse a board file
pub fn load_board(text: &str) -> Result<Board, BoardError> {
    let file: BoardFile = toml::from_str(text).map_err(|_| BoardError::Parse)?;

    let mut map = PeripheralMap::new();
    for uart in file.uart {
        map.add_uart(uart)?;
    }
    for cdc in file.usbcdc {
        map.add_usbcdc(cdc)?;
    }
    for spi in file.spi {
        map.add_spi(spi)?;
    }
    map.validate()?;

    let mut slaves = Vec::with_capacity(file.slave.len());
    for entry in &file.slave {
        if map.spi(entry.bus).is_none() {
            return Err(BoardError::UnknownBus(entry.bus));
        }
        slaves.push(BoardSlave {
            bus: entry.bus,
            slave: entry.build()?,
        });
    }

    Ok(Board { map, slaves })
}

/// Parse only the peripheral map of a board file
pub fn load_map(text: &str) -> Result<PeripheralMap, BoardError> {
    load_board(text).map(|board| board.map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_hal::gpio::PinSelector;
    use halcyon_hal::uart::Parity;

    #[test]
    fn test_full_board() {
        let board = load_board(
            r#"
            [[uart]]
            intfnum = 0
            tx_buffer = 32

            [uart.config]
            baudrate = 9600
            data_bits = "Eight"
            parity = "Even"
            stop_bits = "One"

            [[usbcdc]]
            intfnum = 0
            packet_size = 16

            [[spi]]
            intfnum = 1

            [[slave]]
            bus = 1
            cs = "PA4"

            [[slave]]
            bus = 1
            cs = "PB0"
            mode = 3
            divider = 8
            "#,
        )
        .unwrap();

        let uart = board.map.uart(0).unwrap();
        assert_eq!(uart.tx_buffer, 32);
        assert_eq!(uart.rx_buffer, 64);
        assert_eq!(uart.config.parity, Parity::Even);
        assert_eq!(board.map.usbcdc(0).map(|c| c.packet_size), Some(16));

        let slaves: Vec<&Slave> = board.slaves_on(1).collect();
        assert_eq!(slaves.len(), 2);
        assert!(slaves[0].clock().is_none());
        let clock = slaves[1].clock().unwrap();
        assert_eq!(clock.mode(), Mode::Mode3);
        assert_eq!(clock.divider, 8);
        assert!(matches!(
            slaves[1].selector(),
            halcyon_core::spi::Selector::Pin(p) if *p == PinSelector::bit(1, 0)
        ));
    }

    #[test]
    fn test_empty_file_is_empty_map() {
        assert_eq!(load_map("").unwrap(), PeripheralMap::new());
    }

    #[test]
    fn test_errors() {
        assert_eq!(load_map("[[uart]]\nintfnum = \"x\"").err(), Some(BoardError::Parse));
        assert_eq!(
            load_map("[[uart]]\nintfnum = 1\n[[uart]]\nintfnum = 1").err(),
            Some(BoardError::Invalid(ConfigError::DuplicateInterface(1)))
        );
        assert_eq!(
            load_board("[[slave]]\nbus = 2\ncs = \"PA1\"").err(),
            Some(BoardError::UnknownBus(2))
        );
        assert_eq!(
            load_board("[[spi]]\nintfnum = 0\n[[slave]]\nbus = 0\ncs = \"Q1\"").err(),
            Some(BoardError::InvalidPin)
        );
        assert_eq!(
            load_board("[[spi]]\nintfnum = 0\n[[slave]]\nbus = 0\ncs = \"PA1\"\nmode = 4").err(),
            Some(BoardError::InvalidMode(4))
        );
    }
}
