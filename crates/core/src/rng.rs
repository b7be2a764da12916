//! RNG module - deterministic randomness and tile bag generation
//!
//! Every random decision in a round (bag order, pile placement, jitter,
//! reshuffles) is drawn from one seeded [`SimpleRng`], so the same seed always
//! deals the same board.

use crate::error::ConfigError;
use triple_tray_types::TileTypeId;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Generate a float in [0, 1) from the high 24 bits
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Generate a float in [-amplitude, amplitude)
    pub fn next_signed(&mut self, amplitude: f32) -> f32 {
        (self.next_f32() * 2.0 - 1.0) * amplitude
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// Derive the seed for a later level from the session seed
pub fn derive_seed(base: u32, level: u32) -> u32 {
    let mut rng = SimpleRng::new(base ^ level.wrapping_mul(0x9E37_79B9));
    rng.next_u32()
}

/// Shuffled multiset of tile types for one round
///
/// Every type appears `triples_per_type * match_count` times, so a round dealt
/// from a bag can always be cleared by matching alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBag {
    draws: Vec<TileTypeId>,
}

impl TileBag {
    /// Build and shuffle a bag for the given types
    pub fn build(
        types: &[TileTypeId],
        triples_per_type: usize,
        match_count: usize,
        rng: &mut SimpleRng,
    ) -> Result<Self, ConfigError> {
        if types.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let per_type = triples_per_type * match_count;
        if per_type == 0 {
            return Err(ConfigError::ZeroMultiplicity);
        }

        let mut draws = Vec::with_capacity(types.len() * per_type);
        for &kind in types {
            draws.extend(std::iter::repeat(kind).take(per_type));
        }
        rng.shuffle(&mut draws);
        Ok(Self { draws })
    }

    /// Take the next draw (from the end of the bag)
    pub fn pop(&mut self) -> Option<TileTypeId> {
        self.draws.pop()
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn as_slice(&self) -> &[TileTypeId] {
        &self.draws
    }
}
