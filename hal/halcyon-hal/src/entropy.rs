//! Entropy accumulation
//!
//! Entropy sources usually borrow clocks or ADCs that the rest of the
//! system needs, so accumulation is a startup-only phase: enter it, pull the
//! bytes needed to seed a PRNG, and leave before initialising anything else.
//! This is the one place in the HAL where calls block.
//!
//! No hashing or whitening happens here; that belongs to the application.

/// Raw entropy source
pub trait EntropySource {
    /// Take over whatever the source needs, remembering what it changed
    fn init(&mut self);

    /// Accumulate and return one byte (blocking)
    fn get_byte(&mut self) -> u8;

    /// Put everything `init` touched back the way it was
    fn deinit(&mut self);
}

/// Scoped accumulation phase
///
/// Calls [`EntropySource::init`] on creation and
/// [`EntropySource::deinit`] when dropped, so the borrowed peripherals are
/// always handed back.
pub struct Accumulator<'a, E: EntropySource> {
    source: &'a mut E,
}

impl<'a, E: EntropySource> Accumulator<'a, E> {
    /// Enter the accumulation phase
    pub fn new(source: &'a mut E) -> Self {
        source.init();
        Self { source }
    }

    /// Accumulate one byte
    pub fn get_byte(&mut self) -> u8 {
        self.source.get_byte()
    }

    /// Fill a whole buffer
    pub fn fill(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.source.get_byte();
        }
    }
}

impl<E: EntropySource> Drop for Accumulator<'_, E> {
    fn drop(&mut self) {
        self.source.deinit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        active: bool,
        next: u8,
        deinits: u8,
    }

    impl EntropySource for Counter {
        fn init(&mut self) {
            self.active = true;
        }
        fn get_byte(&mut self) -> u8 {
            assert!(self.active);
            self.next = self.next.wrapping_add(1);
            self.next
        }
        fn deinit(&mut self) {
            self.active = false;
            self.deinits += 1;
        }
    }

    #[test]
    fn test_accumulator_restores_on_drop() {
        let mut source = Counter::default();
        {
            let mut acc = Accumulator::new(&mut source);
            let mut seed = [0u8; 3];
            acc.fill(&mut seed);
            assert_eq!(seed, [1, 2, 3]);
            assert_eq!(acc.get_byte(), 4);
        }
        assert!(!source.active);
        assert_eq!(source.deinits, 1);
    }
}
