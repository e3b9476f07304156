//! SPI bus scenarios on the simulated platform

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use proptest::prelude::*;

use halcyon_core::config::SpiMap;
use halcyon_core::spi::{Completion, Slave, SpiBus, Status, Transaction};
use halcyon_hal::gpio::PinSelector;
use halcyon_hal::spi::{ClockConfig, Mode, SpiConfig, SpiFault};
use halcyon_hal_sim::{GpioAction, PinMode, SimGpio, SimSpi, SpiAction, SpiEvents};

type Bus<'a, 'c> = SpiBus<'a, SimSpi<'c>, SimGpio, 8>;

fn bus<'a, 'c>(events: &'c SpiEvents) -> Bus<'a, 'c> {
    let mut bus = Bus::new(0, SimSpi::new(events), SimGpio::new(), SpiConfig::default());
    bus.init();
    bus
}

/// Let the simulated interrupt run until the bus has nothing left to do
fn run(bus: &mut Bus<'_, '_>, events: &SpiEvents) {
    while !bus.queue_empty() {
        assert!(bus.react(events) > 0, "bus stalled with work queued");
    }
}

#[test]
fn test_priority_transaction_overtakes_queued_one() {
    let events = SpiEvents::new();
    let cs = Slave::with_pin(PinSelector::bit(0, 4));
    let order = StdMutex::new(Vec::new());
    let record = |c: &Completion<'_>| order.lock().unwrap().push(c.transmitted);

    let mut bus = bus(&events);
    bus.init_slave(&cs);

    // T0 keeps the bus busy so that T1 is still waiting when T2 arrives
    bus.enqueue(Transaction::write(&cs, &[0; 3]).with_callback(&record))
        .unwrap();
    bus.enqueue(Transaction::write(&cs, &[1; 4]).with_callback(&record))
        .unwrap();
    bus.enqueue_priority(Transaction::write(&cs, &[2; 2]).with_callback(&record))
        .unwrap();
    run(&mut bus, &events);

    assert_eq!(*order.lock().unwrap(), [3, 2, 4]);
    assert_eq!(bus.peripheral().sent(), [0, 0, 0, 2, 2, 1, 1, 1, 1]);
}

#[test]
fn test_priority_on_idle_bus_starts_at_once() {
    let events = SpiEvents::new();
    let cs = Slave::with_pin(PinSelector::bit(0, 4));
    let mut bus = bus(&events);

    let id = bus
        .enqueue_priority(Transaction::write(&cs, &[9]))
        .unwrap();
    assert_eq!(bus.in_service(), Some(id));
    run(&mut bus, &events);
    assert!(bus.queue_empty());
}

#[test]
fn test_read_id_with_fill_byte() {
    let events = SpiEvents::new();
    let flash = Slave::with_pin(PinSelector::bit(1, 2));
    let tx = [0x9F];
    let mut rx = [0u8; 4];
    let id = StdMutex::new(Vec::new());
    let on_done = |c: &Completion<'_>| {
        assert_eq!(c.status, Status::Complete);
        id.lock().unwrap().extend_from_slice(&c.received[1..]);
    };

    let mut bus = bus(&events);
    bus.init_slave(&flash);
    bus.peripheral_mut().script_replies(&[0x00, 0xEF, 0x40, 0x18]);
    bus.enqueue(Transaction::new(&flash, &tx, &mut rx).with_callback(&on_done))
        .unwrap();
    run(&mut bus, &events);

    assert_eq!(*id.lock().unwrap(), [0xEF, 0x40, 0x18]);
    assert_eq!(bus.peripheral().sent(), [0x9F, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn test_status_poll_reuses_one_buffer() {
    let events = SpiEvents::new();
    let flash = Slave::with_pin(PinSelector::bit(1, 2));
    let read_status = [0x05];
    let mut buf = [0u8; 2];
    let mut rx: &mut [u8] = &mut buf;

    let mut bus = bus(&events);
    bus.init_slave(&flash);
    // busy, busy, ready
    bus.peripheral_mut()
        .script_replies(&[0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);

    let mut polls = 0;
    loop {
        polls += 1;
        let id = bus
            .enqueue(Transaction::new(&flash, &read_status, std::mem::take(&mut rx)))
            .unwrap();
        run(&mut bus, &events);
        let (txn, status) = bus.take_completed(id).expect("finished");
        assert_eq!(status, Status::Complete);
        rx = txn.into_rx();
        if rx[1] & 0x01 == 0 {
            break;
        }
    }

    assert_eq!(polls, 3);
    assert_eq!(bus.completed(), 0);
    assert_eq!(bus.peripheral().sent(), [0x05, 0xFF, 0x05, 0xFF, 0x05, 0xFF]);
}

#[test]
fn test_chip_select_wraps_every_transaction() {
    let events = SpiEvents::new();
    let pin = PinSelector::bit(0, 7);
    let cs = Slave::with_pin(pin);

    let mut bus = bus(&events);
    bus.init_slave(&cs);
    assert_eq!(bus.gpio().mode(0, 7), Some(PinMode::Output));
    assert!(bus.gpio().level(pin));

    bus.gpio_mut().clear_actions();
    bus.enqueue(Transaction::write(&cs, &[1, 2])).unwrap();
    bus.enqueue(Transaction::write(&cs, &[3])).unwrap();
    run(&mut bus, &events);

    assert_eq!(
        bus.gpio().actions(),
        [
            GpioAction::Low(pin),
            GpioAction::High(pin),
            GpioAction::Low(pin),
            GpioAction::High(pin),
        ]
    );
}

static SELECTS: AtomicUsize = AtomicUsize::new(0);
static DESELECTS: AtomicUsize = AtomicUsize::new(0);

fn select() {
    SELECTS.fetch_add(1, Ordering::SeqCst);
}

fn deselect() {
    DESELECTS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_function_selector() {
    let events = SpiEvents::new();
    let display = Slave::with_functions(select, deselect);

    let mut bus = bus(&events);
    bus.init_slave(&display);
    assert_eq!(DESELECTS.load(Ordering::SeqCst), 1);

    bus.enqueue(Transaction::write(&display, &[0xAE, 0xAF]))
        .unwrap();
    run(&mut bus, &events);

    assert_eq!(SELECTS.load(Ordering::SeqCst), 1);
    assert_eq!(DESELECTS.load(Ordering::SeqCst), 2);
    assert!(bus.gpio().actions().is_empty());
}

#[test]
fn test_clock_follows_slave() {
    let events = SpiEvents::new();
    let slow = ClockConfig::new(Mode::Mode3).with_divider(16);
    let sensor = Slave::with_pin(PinSelector::bit(0, 0)).with_clock(slow);
    let flash = Slave::with_pin(PinSelector::bit(0, 1));

    let mut bus = bus(&events);
    for cs in [&sensor, &sensor, &flash, &flash, &sensor] {
        bus.enqueue(Transaction::write(cs, &[0])).unwrap();
    }
    run(&mut bus, &events);

    assert_eq!(
        bus.peripheral().clocks(),
        [slow, ClockConfig::default(), slow]
    );
    // clock changes land between select and the first byte
    let actions = bus.peripheral().actions();
    assert_eq!(actions[1], SpiAction::Clock(slow));
    assert_eq!(actions[2], SpiAction::Byte(0));
}

#[test]
fn test_fixed_clock_platform() {
    let events = SpiEvents::new();
    let sensor = Slave::with_pin(PinSelector::bit(0, 0))
        .with_clock(ClockConfig::new(Mode::Mode2));
    let mut bus = Bus::new(
        0,
        SimSpi::new(&events).with_fixed_clock(),
        SimGpio::new(),
        SpiConfig::default(),
    );
    bus.init();
    bus.enqueue(Transaction::write(&sensor, &[1])).unwrap();
    run(&mut bus, &events);
    assert!(bus.peripheral().clocks().is_empty());
}

#[test]
fn test_fault_is_reported_and_queue_continues() {
    let events = SpiEvents::new();
    let cs = Slave::with_pin(PinSelector::bit(0, 3));
    let pin = PinSelector::bit(0, 3);
    let results = StdMutex::new(Vec::new());
    let record = |c: &Completion<'_>| {
        results
            .lock()
            .unwrap()
            .push((c.status, c.transmitted, c.received.to_vec()))
    };
    let mut rx_a = [0u8; 3];
    let mut rx_b = [0u8; 1];

    let mut bus = bus(&events);
    bus.init_slave(&cs);
    bus.peripheral_mut().fault_at(1, SpiFault::ModeFault);
    bus.enqueue(Transaction::new(&cs, &[1, 2, 3], &mut rx_a).with_callback(&record))
        .unwrap();
    bus.enqueue(Transaction::new(&cs, &[4], &mut rx_b).with_callback(&record))
        .unwrap();
    run(&mut bus, &events);

    assert_eq!(
        *results.lock().unwrap(),
        [
            (Status::Fault(SpiFault::ModeFault), 1, vec![1]),
            (Status::Complete, 1, vec![4]),
        ]
    );
    assert!(bus.peripheral().actions().contains(&SpiAction::Abort));
    assert!(bus.gpio().level(pin));
}

#[test]
fn test_cancel_before_service() {
    let events = SpiEvents::new();
    let cs = Slave::with_pin(PinSelector::bit(0, 0));
    let calls = StdMutex::new(0);
    let count = |_: &Completion<'_>| *calls.lock().unwrap() += 1;

    let mut bus = bus(&events);
    let first = bus
        .enqueue(Transaction::write(&cs, &[1]).with_callback(&count))
        .unwrap();
    let second = bus
        .enqueue(Transaction::write(&cs, &[2]).with_callback(&count))
        .unwrap();

    assert!(bus.cancel(first).is_none(), "already in service");
    let withdrawn = bus.cancel(second).expect("still queued");
    assert_eq!(withdrawn.tx_len(), 1);
    assert!(bus.cancel(second).is_none());

    run(&mut bus, &events);
    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(bus.peripheral().sent(), [1]);
}

#[test]
fn test_shared_between_foreground_and_interrupt() {
    let events = SpiEvents::new();
    let cs = Slave::with_pin(PinSelector::bit(0, 0));
    let done = StdMutex::new(false);
    let on_done = |_: &Completion<'_>| *done.lock().unwrap() = true;

    let map = SpiMap::new(2);
    let shared: Mutex<CriticalSectionRawMutex, RefCell<Bus<'_, '_>>> =
        Mutex::new(RefCell::new(Bus::from_map(&map, SimSpi::new(&events), SimGpio::new())));

    shared.lock(|bus| {
        let mut bus = bus.borrow_mut();
        bus.init();
        bus.init_slave(&cs);
        bus.enqueue(Transaction::write(&cs, b"hello").with_callback(&on_done))
            .unwrap();
    });

    // interrupt side
    while shared.lock(|bus| bus.borrow_mut().react(&events)) > 0 {}

    assert!(*done.lock().unwrap());
    assert!(shared.lock(|bus| bus.borrow().queue_empty()));
}

#[test]
fn test_bare_exchange() {
    let events = SpiEvents::new();
    let cs = Slave::with_pin(PinSelector::bit(0, 0));
    let mut bus = bus(&events);
    bus.peripheral_mut().script_replies(&[0x5A]);
    bus.select_slave(&cs);
    assert_eq!(bus.txrx_bare(0x00), 0x5A);
    assert_eq!(bus.txrx_bare(0x33), 0x33);
    bus.deselect_slave(&cs);
    assert!(bus.queue_empty());
    assert!(events.try_receive().is_err());
}

proptest! {
    #[test]
    fn prop_every_transaction_completes_once(
        shapes in proptest::collection::vec((0usize..6, 0usize..6), 1..12)
    ) {
        let events = SpiEvents::new();
        let cs = Slave::with_pin(PinSelector::bit(0, 0));
        let tx_data: Vec<Vec<u8>> = shapes
            .iter()
            .enumerate()
            .map(|(i, &(tx, _))| vec![i as u8; tx])
            .collect();
        let mut rx_data: Vec<Vec<u8>> = shapes.iter().map(|&(_, rx)| vec![0; rx]).collect();
        let seen = StdMutex::new(Vec::new());
        let record = |c: &Completion<'_>| {
            seen.lock().unwrap().push((c.transmitted, c.received.to_vec()));
        };

        let mut bus = bus(&events);
        let mut expected = Vec::new();
        for (tx, rx) in tx_data.iter().zip(rx_data.iter_mut()) {
            let clocked = tx.len().max(rx.len());
            let mut echo: Vec<u8> = tx.clone();
            echo.resize(clocked, 0xFF);
            echo.truncate(rx.len());
            expected.push((clocked, echo));

            let txn = Transaction::new(&cs, tx, rx).with_callback(&record);
            if let Err(full) = bus.enqueue(txn) {
                // room frees up as the bus works through the queue
                let mut txn = Some(full.0);
                while let Some(t) = txn.take() {
                    bus.react(&events);
                    if let Err(again) = bus.enqueue(t) {
                        txn = Some(again.0);
                    }
                }
            }
        }
        run(&mut bus, &events);

        prop_assert_eq!(&*seen.lock().unwrap(), &expected);
    }
}
