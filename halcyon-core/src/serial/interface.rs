//! Serial interface context and its interrupt reactor
//!
//! One type serves UARTs and USB-CDC alike. The only difference is the
//! transmit unit reported by [`SerialPeripheral::packet_size`]: a trigger
//! sends only whole packets, a flush also sends the partial one at the end.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use halcyon_hal::uart::{
    LockMode, LockToken, SerialEvent, SerialPeripheral, Transport, MAX_PACKET_SIZE,
};

use super::channel::BufferedChannel;
use crate::config::{ConfigError, SerialMap};

/// Transmit side of the reactor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    /// No chunk in flight
    Idle,
    /// A chunk has been handed to the hardware
    Draining,
}

/// One UART or USB-CDC interface with `TX`/`RX` bytes of ring storage
#[derive(Debug)]
pub struct SerialInterface<P: SerialPeripheral, const TX: usize, const RX: usize> {
    intfnum: u8,
    peripheral: P,
    channel: BufferedChannel<TX, RX>,
    tx_state: TxState,
    flush_pending: bool,
}

impl<P: SerialPeripheral, const TX: usize, const RX: usize> SerialInterface<P, TX, RX> {
    /// Create an interface using all of the ring storage
    pub fn new(intfnum: u8, peripheral: P) -> Self {
        Self {
            intfnum,
            peripheral,
            channel: BufferedChannel::new(),
            tx_state: TxState::Idle,
            flush_pending: false,
        }
    }

    /// Create an interface sized by its peripheral map entry
    pub fn from_map(map: impl Into<SerialMap>, peripheral: P) -> Result<Self, ConfigError> {
        let map = map.into();
        Ok(Self {
            intfnum: map.intfnum,
            peripheral,
            channel: BufferedChannel::with_limits(map.tx_buffer, map.rx_buffer)?,
            tx_state: TxState::Idle,
            flush_pending: false,
        })
    }

    /// Bring the peripheral up and start from empty rings
    pub fn init(&mut self) {
        self.peripheral.init();
        self.channel.reset();
        self.tx_state = TxState::Idle;
        self.flush_pending = false;
        info!(
            "serial{=u8}: init, packet {=usize}, tx {=usize}, rx {=usize}",
            self.intfnum,
            self.packet_size(),
            self.channel.tx_capacity(),
            self.channel.rx_capacity()
        );
    }

    /// Interface number
    pub fn intfnum(&self) -> u8 {
        self.intfnum
    }

    /// Transmit unit, clamped to `1..=MAX_PACKET_SIZE`
    pub fn packet_size(&self) -> usize {
        self.peripheral.packet_size().clamp(1, MAX_PACKET_SIZE)
    }

    /// Whether the drain path is idle
    pub fn tx_ready(&self) -> bool {
        self.tx_state == TxState::Idle
    }

    /// Current transmit state
    pub fn tx_state(&self) -> TxState {
        self.tx_state
    }

    /// Bytes dropped because the receive ring was full
    pub fn overruns(&self) -> u32 {
        self.channel.overruns()
    }

    /// The rings
    pub fn channel(&self) -> &BufferedChannel<TX, RX> {
        &self.channel
    }

    /// The platform engine
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// Mutable access to the platform engine
    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    /// Send one byte, bypassing the rings (debug only)
    pub fn putc_bare(&mut self, byte: u8) {
        self.peripheral.putc_bare(byte);
    }

    /// Receive one byte, bypassing the rings (debug only)
    pub fn getc_bare(&mut self) -> u8 {
        self.peripheral.getc_bare()
    }

    /// Handle everything currently waiting in `events`, at most `E`
    ///
    /// Returns the number of events handled.
    pub fn react<M: RawMutex, const E: usize>(
        &mut self,
        events: &Channel<M, SerialEvent, E>,
    ) -> usize {
        let mut handled = 0;
        while handled < E {
            match events.try_receive() {
                Ok(event) => {
                    self.on_event(event);
                    handled += 1;
                }
                Err(_) => break,
            }
        }
        handled
    }

    /// Handle one signal from the peripheral
    pub fn on_event(&mut self, event: SerialEvent) {
        match event {
            SerialEvent::TxDone => {
                if self.tx_state != TxState::Draining {
                    warn!("serial{=u8}: TxDone while idle, ignored", self.intfnum);
                    return;
                }
                self.tx_state = TxState::Idle;
                self.start_chunk();
            }
            SerialEvent::Received(byte) => {
                if !self.channel.fill(byte) {
                    warn!(
                        "serial{=u8}: rx overrun ({=u32} total)",
                        self.intfnum,
                        self.channel.overruns()
                    );
                }
            }
        }
    }

    /// Hand the next chunk to the hardware if there is one worth sending
    fn start_chunk(&mut self) {
        let pending = self.channel.tx_pending();
        if pending == 0 {
            self.flush_pending = false;
            return;
        }
        let size = self.packet_size();
        if pending < size && !self.flush_pending {
            return;
        }

        let mut chunk = [0u8; MAX_PACKET_SIZE];
        let n = self.channel.drain_into(&mut chunk[..size]);
        if self.channel.tx_pending() == 0 {
            self.flush_pending = false;
        }
        self.tx_state = TxState::Draining;
        self.peripheral.start_transmit(&chunk[..n]);
    }
}

impl<P: SerialPeripheral, const TX: usize, const RX: usize> Transport
    for SerialInterface<P, TX, RX>
{
    fn send_trigger(&mut self) {
        if self.tx_state == TxState::Idle {
            self.start_chunk();
        }
    }

    fn send_flush(&mut self) {
        self.flush_pending = true;
        if self.tx_state == TxState::Idle {
            self.start_chunk();
        }
    }

    fn reqlock(&mut self, len: usize, token: LockToken) -> bool {
        self.channel.reqlock(len, token)
    }

    fn release(&mut self, token: LockToken) -> bool {
        self.channel.release(token)
    }

    fn putc(&mut self, byte: u8, token: LockToken, mode: LockMode) -> bool {
        self.channel.putc(byte, token, mode)
    }

    fn write(&mut self, data: &[u8], token: LockToken) -> usize {
        self.channel.write(data, token)
    }

    fn population_rxb(&self) -> usize {
        self.channel.population_rxb()
    }

    fn discard_rxb(&mut self) {
        self.channel.discard_rxb();
    }

    fn getc(&mut self) -> Option<u8> {
        self.channel.getc()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.channel.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UartMap, UsbCdcMap};
    use std::vec::Vec;

    /// Peripheral that records each chunk handed to it
    #[derive(Debug, Default)]
    struct Wire {
        packet: usize,
        chunks: Vec<Vec<u8>>,
        bare: Vec<u8>,
    }

    impl SerialPeripheral for Wire {
        fn init(&mut self) {}
        fn packet_size(&self) -> usize {
            self.packet
        }
        fn start_transmit(&mut self, chunk: &[u8]) {
            self.chunks.push(chunk.to_vec());
        }
        fn putc_bare(&mut self, byte: u8) {
            self.bare.push(byte);
        }
        fn getc_bare(&mut self) -> u8 {
            0x42
        }
    }

    const T: LockToken = LockToken::new(1);

    fn uart() -> SerialInterface<Wire, 16, 8> {
        let mut s = SerialInterface::new(0, Wire { packet: 1, ..Default::default() });
        s.init();
        s
    }

    fn cdc() -> SerialInterface<Wire, 128, 64> {
        let mut s = SerialInterface::new(1, Wire { packet: 4, ..Default::default() });
        s.init();
        s
    }

    /// Acknowledge chunks until the drain path goes idle
    fn drain<const TX: usize, const RX: usize>(s: &mut SerialInterface<Wire, TX, RX>) {
        while !s.tx_ready() {
            s.on_event(SerialEvent::TxDone);
        }
    }

    #[test]
    fn test_uart_sends_byte_by_byte() {
        let mut s = uart();
        assert_eq!(s.write(b"abc", T), 3);
        s.send_trigger();
        assert!(!s.tx_ready());
        drain(&mut s);
        let sent: Vec<u8> = s.peripheral().chunks.concat();
        assert_eq!(sent, b"abc");
        assert_eq!(s.peripheral().chunks.len(), 3);
    }

    #[test]
    fn test_trigger_holds_partial_packet() {
        let mut s = cdc();
        s.write(b"0123456", T);
        s.send_trigger();
        drain(&mut s);
        assert_eq!(s.peripheral().chunks, [b"0123".to_vec()]);
        assert_eq!(s.channel().tx_pending(), 3);

        s.send_flush();
        drain(&mut s);
        assert_eq!(s.peripheral().chunks[1], b"456");
        assert_eq!(s.channel().tx_pending(), 0);
    }

    #[test]
    fn test_flush_pending_survives_multiple_chunks() {
        let mut s = cdc();
        s.write(b"0123456789", T);
        s.send_flush();
        drain(&mut s);
        assert_eq!(
            s.peripheral().chunks,
            [b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]
        );
        assert!(s.tx_ready());
    }

    #[test]
    fn test_trigger_while_draining_is_harmless() {
        let mut s = uart();
        s.write(b"xy", T);
        s.send_trigger();
        s.send_trigger();
        assert_eq!(s.peripheral().chunks.len(), 1);
        drain(&mut s);
        assert_eq!(s.peripheral().chunks.len(), 2);
    }

    #[test]
    fn test_packet_size_clamped() {
        let mut s: SerialInterface<Wire, 8, 8> =
            SerialInterface::new(0, Wire { packet: 0, ..Default::default() });
        assert_eq!(s.packet_size(), 1);
        s.peripheral_mut().packet = 512;
        assert_eq!(s.packet_size(), MAX_PACKET_SIZE);
    }

    #[test]
    fn test_receive_and_overrun() {
        let mut s: SerialInterface<Wire, 8, 2> =
            SerialInterface::new(0, Wire { packet: 1, ..Default::default() });
        s.init();
        s.on_event(SerialEvent::Received(1));
        s.on_event(SerialEvent::Received(2));
        s.on_event(SerialEvent::Received(3));
        assert_eq!(s.overruns(), 1);
        assert_eq!(s.population_rxb(), 2);
        assert_eq!(s.getc(), Some(1));
        assert_eq!(s.getc(), Some(2));
        assert_eq!(s.getc(), None);
    }

    #[test]
    fn test_stray_tx_done_ignored() {
        let mut s = uart();
        s.on_event(SerialEvent::TxDone);
        assert!(s.tx_ready());
        assert!(s.peripheral().chunks.is_empty());
    }

    #[test]
    fn test_print_through_lock() {
        let mut s = uart();
        assert!(s.reqlock(8, T));
        assert_eq!(s.print(T, format_args!("n={}", 7)), 3);
        assert_eq!(s.channel().lock().reserved(), 5);
        assert_eq!(s.print(LockToken::new(2), format_args!("x")), 0);
        assert!(s.release(T));
        assert_eq!(s.print(LockToken::new(2), format_args!("x")), 1);
    }

    #[test]
    fn test_from_map_sizes_rings() {
        let s: SerialInterface<Wire, 64, 64> =
            SerialInterface::from_map(&UartMap::new(3).with_buffers(10, 20), Wire::default())
                .unwrap();
        assert_eq!(s.intfnum(), 3);
        assert_eq!(s.channel().tx_capacity(), 10);
        assert_eq!(s.channel().rx_capacity(), 20);

        let too_big = SerialInterface::<Wire, 64, 64>::from_map(&UsbCdcMap::new(0), Wire::default());
        assert_eq!(too_big.err(), Some(ConfigError::InvalidBufferLength));
    }

    #[test]
    fn test_react_drains_channel() {
        use embassy_sync::blocking_mutex::raw::NoopRawMutex;

        let events: Channel<NoopRawMutex, SerialEvent, 4> = Channel::new();
        let mut s = uart();
        events.try_send(SerialEvent::Received(b'h')).unwrap();
        events.try_send(SerialEvent::Received(b'i')).unwrap();
        assert_eq!(s.react(&events), 2);
        let mut buf = [0u8; 4];
        assert_eq!(s.read(&mut buf), 2);
        assert_eq!(&buf[..2], b"hi");
    }

    #[test]
    fn test_bare_io_forwarded() {
        let mut s = uart();
        s.putc_bare(b'!');
        assert_eq!(s.getc_bare(), 0x42);
        assert_eq!(s.peripheral().bare, b"!");
    }
}
