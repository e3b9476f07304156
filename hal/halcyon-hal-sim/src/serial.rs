//! Simulated UART and USB-CDC engines
//!
//! A chunk handed to [`SimSerial`] is recorded and, unless completion is
//! manual, acknowledged right away with [`SerialEvent::TxDone`]. Received
//! bytes are injected by the test and arrive through the same channel.

use std::collections::VecDeque;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use halcyon_core::config::USBCDC_PACKET_SIZE;
use halcyon_hal::uart::{SerialEvent, SerialPeripheral};

/// Events one simulated serial interface can have pending
pub const SERIAL_EVENT_DEPTH: usize = 32;

/// Channel the simulated serial interrupt posts into
pub type SerialEvents = Channel<CriticalSectionRawMutex, SerialEvent, SERIAL_EVENT_DEPTH>;

/// Recording serial engine
pub struct SimSerial<'c> {
    events: &'c SerialEvents,
    packet: usize,
    auto_complete: bool,
    inits: usize,
    chunks: Vec<Vec<u8>>,
    bare_out: Vec<u8>,
    bare_in: VecDeque<u8>,
}

impl<'c> SimSerial<'c> {
    /// Byte-oriented UART
    pub fn uart(events: &'c SerialEvents) -> Self {
        Self::with_packet_size(events, 1)
    }

    /// Full-speed USB-CDC data interface
    pub fn usbcdc(events: &'c SerialEvents) -> Self {
        Self::with_packet_size(events, USBCDC_PACKET_SIZE)
    }

    /// Engine with an arbitrary transmit unit
    pub fn with_packet_size(events: &'c SerialEvents, packet: usize) -> Self {
        Self {
            events,
            packet,
            auto_complete: true,
            inits: 0,
            chunks: Vec::new(),
            bare_out: Vec::new(),
            bare_in: VecDeque::new(),
        }
    }

    /// Leave chunks in flight until [`SimSerial::complete`] is called
    pub fn manual_completion(mut self) -> Self {
        self.auto_complete = false;
        self
    }

    /// Acknowledge the chunk in flight
    pub fn complete(&self) -> bool {
        self.events.try_send(SerialEvent::TxDone).is_ok()
    }

    /// Deliver received bytes; returns how many fit in the event channel
    pub fn receive(&self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .take_while(|&&b| self.events.try_send(SerialEvent::Received(b)).is_ok())
            .count()
    }

    /// Chunks handed to the hardware, in order
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Every byte transmitted through the rings
    pub fn sent(&self) -> Vec<u8> {
        self.chunks.concat()
    }

    /// Bytes sent with `putc_bare`
    pub fn bare_out(&self) -> &[u8] {
        &self.bare_out
    }

    /// Queue bytes for `getc_bare`
    pub fn feed_bare(&mut self, bytes: &[u8]) {
        self.bare_in.extend(bytes.iter().copied());
    }

    /// Times `init` was called
    pub fn inits(&self) -> usize {
        self.inits
    }
}

impl SerialPeripheral for SimSerial<'_> {
    fn init(&mut self) {
        self.inits += 1;
    }

    fn packet_size(&self) -> usize {
        self.packet
    }

    fn start_transmit(&mut self, chunk: &[u8]) {
        self.chunks.push(chunk.to_vec());
        if self.auto_complete {
            self.complete();
        }
    }

    fn putc_bare(&mut self, byte: u8) {
        self.bare_out.push(byte);
    }

    /// Returns 0 when nothing was fed; a real engine would spin instead
    fn getc_bare(&mut self) -> u8 {
        self.bare_in.pop_front().unwrap_or(0)
    }
}
