//! Per-step reservoir sampling
//!
//! Decides which of an unbounded stream of samples offered during one step
//! are kept under a fixed budget of `N` slots (Algorithm R):
//!
//! - the first `N` offers fill slots `0..N` in order;
//! - offer number `k > N` is kept with probability `N / k` and, when kept,
//!   evicts a slot chosen uniformly from `[0, N)` by an independent draw.
//!
//! Every sample seen so far is therefore retained with probability
//! `N / seen_count`, regardless of stream order.
//!
//! ## Example
//!
//! ```rust
//! use trueno_vislog::sampling::{ReservoirSampler, RngSource, SampleDecision};
//!
//! let mut rng = RngSource::seeded(42);
//! let mut sampler = ReservoirSampler::new(2);
//!
//! assert_eq!(sampler.offer(&mut rng), SampleDecision::Keep(0));
//! assert_eq!(sampler.offer(&mut rng), SampleDecision::Keep(1));
//! // From here on each offer is kept with probability 2 / seen_count
//! let _ = sampler.offer(&mut rng);
//! assert_eq!(sampler.seen_count(), 3);
//! ```

mod policy;

pub use policy::{Always, EveryNSteps, SamplingPolicy};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random draws for the sampler.
///
/// Implementations must cover `[0, 1)` uniformly; a biased source silently
/// breaks the equal-retention guarantee and is not detected by the sampler.
pub trait UniformSource {
    /// Uniform draw in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Uniform index in `[0, bound)`. `bound` must be positive.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn next_index(&mut self, bound: usize) -> usize {
        let scaled = (self.next_uniform() * bound as f64) as usize;
        scaled.min(bound.saturating_sub(1))
    }
}

/// [`UniformSource`] backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R = StdRng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Deterministic source for reproducible runs and tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> UniformSource for RngSource<R> {
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn next_index(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }
}

/// Outcome of offering one sample to a [`ReservoirSampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDecision {
    /// Store the sample in this slot, replacing any previous occupant.
    Keep(usize),
    /// Drop the sample.
    Discard,
}

impl SampleDecision {
    /// Slot index for kept samples.
    #[must_use]
    pub const fn slot(self) -> Option<usize> {
        match self {
            Self::Keep(index) => Some(index),
            Self::Discard => None,
        }
    }
}

/// Reservoir sampler for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservoirSampler {
    capacity: usize,
    seen: usize,
}

impl ReservoirSampler {
    /// Create a sampler with `capacity` slots and nothing seen.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self { capacity, seen: 0 }
    }

    /// Slots available to the step.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples offered so far.
    #[must_use]
    pub const fn seen_count(&self) -> usize {
        self.seen
    }

    /// Forget every offer, keeping the capacity.
    pub fn reset(&mut self) {
        self.seen = 0;
    }

    /// Offer the next sample of the stream.
    ///
    /// `seen_count` grows by one on every call, whatever the outcome.
    #[allow(clippy::cast_precision_loss)]
    pub fn offer<U: UniformSource + ?Sized>(&mut self, rng: &mut U) -> SampleDecision {
        self.seen += 1;

        if self.capacity == 0 {
            return SampleDecision::Discard;
        }
        if self.seen <= self.capacity {
            return SampleDecision::Keep(self.seen - 1);
        }

        let accept = self.capacity as f64 / self.seen as f64;
        if rng.next_uniform() < accept {
            SampleDecision::Keep(rng.next_index(self.capacity))
        } else {
            SampleDecision::Discard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of uniform draws.
    struct ScriptedSource {
        draws: Vec<f64>,
        next: usize,
    }

    impl ScriptedSource {
        fn new(draws: Vec<f64>) -> Self {
            Self { draws, next: 0 }
        }
    }

    impl UniformSource for ScriptedSource {
        fn next_uniform(&mut self) -> f64 {
            let value = self.draws[self.next % self.draws.len()];
            self.next += 1;
            value
        }
    }

    #[test]
    fn test_fill_phase_keeps_in_order() {
        let mut rng = ScriptedSource::new(vec![0.99]);
        let mut sampler = ReservoirSampler::new(3);

        assert_eq!(sampler.offer(&mut rng), SampleDecision::Keep(0));
        assert_eq!(sampler.offer(&mut rng), SampleDecision::Keep(1));
        assert_eq!(sampler.offer(&mut rng), SampleDecision::Keep(2));
        // Fill phase never consults the random source
        assert_eq!(rng.next, 0);
    }

    #[test]
    fn test_accept_uses_probability_after_increment() {
        // 4th offer with N=2: p = 2/4 = 0.5
        let mut sampler = ReservoirSampler::new(2);
        let mut rng = ScriptedSource::new(vec![0.9]);
        sampler.offer(&mut rng);
        sampler.offer(&mut rng);
        assert_eq!(sampler.offer(&mut rng), SampleDecision::Discard); // 0.9 >= 2/3

        let mut rng = ScriptedSource::new(vec![0.49, 0.75]);
        assert_eq!(sampler.offer(&mut rng), SampleDecision::Keep(1));
        assert_eq!(sampler.seen_count(), 4);
    }

    #[test]
    fn test_eviction_draw_is_independent() {
        let mut sampler = ReservoirSampler::new(4);
        let mut fill = ScriptedSource::new(vec![0.0]);
        for _ in 0..4 {
            sampler.offer(&mut fill);
        }

        // Acceptance draw 0.0, eviction draw 0.0 -> slot 0 (not the newest index)
        let mut rng = ScriptedSource::new(vec![0.0, 0.0]);
        assert_eq!(sampler.offer(&mut rng), SampleDecision::Keep(0));
        assert_eq!(rng.next, 2);
    }

    #[test]
    fn test_zero_capacity_discards() {
        let mut rng = ScriptedSource::new(vec![0.0]);
        let mut sampler = ReservoirSampler::new(0);
        for _ in 0..5 {
            assert_eq!(sampler.offer(&mut rng), SampleDecision::Discard);
        }
        assert_eq!(sampler.seen_count(), 5);
        assert_eq!(rng.next, 0);
    }

    #[test]
    fn test_reset_clears_seen_count() {
        let mut rng = RngSource::seeded(1);
        let mut sampler = ReservoirSampler::new(2);
        for _ in 0..10 {
            sampler.offer(&mut rng);
        }
        sampler.reset();
        assert_eq!(sampler.seen_count(), 0);
        assert_eq!(sampler.offer(&mut rng), SampleDecision::Keep(0));
    }

    #[test]
    fn test_default_next_index_stays_in_bounds() {
        let mut rng = ScriptedSource::new(vec![0.0, 0.5, 0.999_999]);
        assert_eq!(rng.next_index(10), 0);
        assert_eq!(rng.next_index(10), 5);
        assert_eq!(rng.next_index(10), 9);
    }

    #[test]
    fn test_rng_source_range() {
        let mut rng = RngSource::seeded(7);
        for _ in 0..1000 {
            let u = rng.next_uniform();
            assert!((0.0..1.0).contains(&u));
            assert!(rng.next_index(3) < 3);
        }
    }

    #[test]
    fn test_sample_decision_slot() {
        assert_eq!(SampleDecision::Keep(3).slot(), Some(3));
        assert_eq!(SampleDecision::Discard.slot(), None);
    }
}
