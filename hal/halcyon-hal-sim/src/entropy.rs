//! Simulated entropy source
//!
//! A xorshift generator stands in for the noisy clock or ADC a real chip
//! would sample. Deterministic for a given seed, which is what tests want.

use halcyon_hal::entropy::EntropySource;

/// Deterministic entropy source
#[derive(Debug, Clone)]
pub struct SimEntropy {
    state: u32,
    active: bool,
    sessions: usize,
}

impl SimEntropy {
    /// Source seeded with `seed` (zero is replaced by a fixed constant)
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
            active: false,
            sessions: 0,
        }
    }

    /// Whether an accumulation phase is open
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Completed accumulation phases
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl EntropySource for SimEntropy {
    fn init(&mut self) {
        self.active = true;
    }

    /// Outside an accumulation phase there is nothing to sample; returns 0
    fn get_byte(&mut self) -> u8 {
        if !self.active {
            return 0;
        }
        (self.next() >> 24) as u8
    }

    fn deinit(&mut self) {
        if self.active {
            self.active = false;
            self.sessions += 1;
        }
    }
}
