//! Step sampling policies: which steps get a record at all.

use serde::{Deserialize, Serialize};

/// Decides whether a step is sampled.
pub trait SamplingPolicy {
    /// Whether `step_id` should produce a record.
    fn should_sample_step(&self, step_id: u64) -> bool;
}

/// Sample every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Always;

impl SamplingPolicy for Always {
    fn should_sample_step(&self, _step_id: u64) -> bool {
        true
    }
}

/// Sample steps whose id is a multiple of `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveryNSteps {
    period: u64,
}

impl EveryNSteps {
    /// Create a policy; a period of 0 is treated as 1.
    #[must_use]
    pub const fn new(period: u64) -> Self {
        Self {
            period: if period == 0 { 1 } else { period },
        }
    }

    /// Steps between samples.
    #[must_use]
    pub const fn period(&self) -> u64 {
        self.period
    }
}

impl Default for EveryNSteps {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SamplingPolicy for EveryNSteps {
    fn should_sample_step(&self, step_id: u64) -> bool {
        step_id % self.period == 0
    }
}

impl<F> SamplingPolicy for F
where
    F: Fn(u64) -> bool,
{
    fn should_sample_step(&self, step_id: u64) -> bool {
        self(step_id)
    }
}
