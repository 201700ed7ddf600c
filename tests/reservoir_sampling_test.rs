//! Statistical tests for per-step reservoir sampling
//!
//! Verifies the Algorithm R guarantees:
//! 1. Streams no longer than the budget are kept whole, in order
//! 2. Longer streams fill exactly `N` slots
//! 3. Every sample of a stream is retained with probability `N / L`
//!
//! Toyota Way: Jidoka (Built-in Quality)

use std::collections::HashSet;

use trueno_vislog::sampling::{ReservoirSampler, RngSource, SampleDecision, UniformSource};

/// Run one stream of `len` samples and return which sample ids survived.
fn run_stream<U: UniformSource>(rng: &mut U, capacity: usize, len: usize) -> Vec<Option<usize>> {
    let mut reservoir = vec![None; capacity];
    let mut sampler = ReservoirSampler::new(capacity);
    for sample in 0..len {
        if let SampleDecision::Keep(slot) = sampler.offer(rng) {
            reservoir[slot] = Some(sample);
        }
    }
    assert_eq!(sampler.seen_count(), len);
    reservoir
}

#[test]
fn test_short_stream_kept_in_order() {
    let mut rng = RngSource::seeded(1);
    let mut sampler = ReservoirSampler::new(8);

    let decisions: Vec<SampleDecision> = (0..5).map(|_| sampler.offer(&mut rng)).collect();
    let expected: Vec<SampleDecision> = (0..5).map(SampleDecision::Keep).collect();

    assert_eq!(decisions, expected);
}

#[test]
fn test_stream_equal_to_capacity_fills_every_slot() {
    let mut rng = RngSource::seeded(2);
    let reservoir = run_stream(&mut rng, 6, 6);
    assert_eq!(reservoir, (0..6).map(Some).collect::<Vec<_>>());
}

#[test]
fn test_long_stream_fills_exactly_capacity() {
    let mut rng = RngSource::seeded(3);
    for len in [11, 50, 1000] {
        let reservoir = run_stream(&mut rng, 10, len);
        let kept: HashSet<usize> = reservoir.iter().flatten().copied().collect();
        assert_eq!(kept.len(), 10, "stream of {len} must fill all 10 slots");
        assert!(kept.iter().all(|&s| s < len));
    }
}

#[test]
fn test_kept_slots_always_in_range() {
    let mut rng = RngSource::seeded(4);
    let mut sampler = ReservoirSampler::new(3);
    for _ in 0..10_000 {
        if let SampleDecision::Keep(slot) = sampler.offer(&mut rng) {
            assert!(slot < 3);
        }
    }
}

#[test]
fn test_discard_rate_tracks_acceptance_probability() {
    // Offer k > N is accepted with probability N / k; over the whole stream
    // the expected number of accepts is N + sum_{k=N+1}^{L} N / k.
    let capacity = 10;
    let len = 1000;
    let trials = 2000;
    let mut rng = RngSource::seeded(5);

    let mut accepted = 0usize;
    for _ in 0..trials {
        let mut sampler = ReservoirSampler::new(capacity);
        for _ in 0..len {
            if sampler.offer(&mut rng) != SampleDecision::Discard {
                accepted += 1;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let expected_per_trial: f64 = capacity as f64
        + ((capacity + 1)..=len)
            .map(|k| capacity as f64 / k as f64)
            .sum::<f64>();
    #[allow(clippy::cast_precision_loss)]
    let observed_per_trial = accepted as f64 / f64::from(trials);

    let relative_error = (observed_per_trial - expected_per_trial).abs() / expected_per_trial;
    assert!(
        relative_error < 0.02,
        "observed {observed_per_trial:.2} accepts per stream, expected {expected_per_trial:.2}"
    );
}

#[test]
#[allow(clippy::cast_precision_loss)]
fn test_retention_frequency_is_uniform() {
    // 10,000 streams of L=1000 with N=10: each sample should survive in
    // N / L = 1% of the streams (expected count 100, sd ~10).
    let capacity = 10;
    let len = 1000;
    let trials = 10_000;
    let mut rng = RngSource::seeded(42);

    let mut survived = vec![0u32; len];
    for _ in 0..trials {
        for sample in run_stream(&mut rng, capacity, len).into_iter().flatten() {
            survived[sample] += 1;
        }
    }

    let expected = f64::from(trials) * capacity as f64 / len as f64;

    for (sample, &count) in survived.iter().enumerate() {
        let deviation = (f64::from(count) - expected).abs();
        assert!(
            deviation < expected * 0.5,
            "sample {sample} survived {count} times, expected ~{expected}"
        );
    }

    // Chi-square over 999 degrees of freedom: mean 999, sd ~44.7
    let chi_square: f64 = survived
        .iter()
        .map(|&c| (f64::from(c) - expected).powi(2) / expected)
        .sum();
    assert!(chi_square < 1250.0, "chi-square {chi_square:.1} too large");

    // Early (fill phase) and late samples are treated alike
    let early: u32 = survived[..capacity].iter().sum();
    let late: u32 = survived[len - capacity..].iter().sum();
    let per_group = expected * capacity as f64;
    assert!((f64::from(early) - per_group).abs() < per_group * 0.2);
    assert!((f64::from(late) - per_group).abs() < per_group * 0.2);
}

#[test]
fn test_zero_capacity_never_keeps() {
    let mut rng = RngSource::seeded(6);
    let mut sampler = ReservoirSampler::new(0);
    assert!((0..100).all(|_| sampler.offer(&mut rng) == SampleDecision::Discard));
    assert_eq!(sampler.seen_count(), 100);
}

#[test]
fn test_seeded_sources_are_reproducible() {
    let a = run_stream(&mut RngSource::seeded(9), 5, 500);
    let b = run_stream(&mut RngSource::seeded(9), 5, 500);
    assert_eq!(a, b);
}
