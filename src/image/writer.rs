//! Image writer: step lifecycle plus reservoir-sampled slot writes.

use std::sync::Arc;

use chrono::Utc;

use super::{codec, ElementType, ImageConfig, PayloadElement};
use crate::record::RecordHandle;
use crate::sampling::{
    EveryNSteps, ReservoirSampler, RngSource, SampleDecision, SamplingPolicy, UniformSource,
};
use crate::storage::RecordStore;
use crate::{Error, Result};

/// Lifecycle phase of the writer's current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// No step started yet.
    Idle,
    /// A step is accepting offers.
    Open,
    /// The last step was finished.
    Closed,
}

#[derive(Debug)]
enum StepState {
    Idle,
    /// `record` is `None` when the policy declined the step
    Open {
        step_id: u64,
        record: Option<RecordHandle>,
    },
    Closed {
        step_id: u64,
    },
}

/// Writes reservoir-sampled images for one series.
///
/// One step is open at a time and samples are offered sequentially; the
/// writer is the only writer of the records it creates.
#[derive(Debug)]
pub struct ImageWriter<S: RecordStore, P = EveryNSteps, U = RngSource> {
    store: Arc<S>,
    tag: String,
    num_samples: usize,
    element_type: ElementType,
    policy: P,
    rng: U,
    sampler: ReservoirSampler,
    state: StepState,
    last_step: Option<u64>,
}

impl<S: RecordStore> ImageWriter<S> {
    /// Create a writer from a configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration fails validation
    pub fn new(store: Arc<S>, tag: impl Into<String>, config: &ImageConfig) -> Result<Self> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(RngSource::from_entropy, RngSource::seeded);
        Ok(Self::with_parts(
            store,
            tag,
            config.num_samples,
            config.element_type,
            EveryNSteps::new(config.sample_period),
            rng,
        ))
    }
}

impl<S, P, U> ImageWriter<S, P, U>
where
    S: RecordStore,
    P: SamplingPolicy,
    U: UniformSource,
{
    /// Create a writer with an explicit policy and random source.
    pub fn with_parts(
        store: Arc<S>,
        tag: impl Into<String>,
        num_samples: usize,
        element_type: ElementType,
        policy: P,
        rng: U,
    ) -> Self {
        Self {
            store,
            tag: tag.into(),
            num_samples,
            element_type,
            policy,
            rng,
            sampler: ReservoirSampler::new(num_samples),
            state: StepState::Idle,
            last_step: None,
        }
    }

    /// Series tag written to.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Slots reserved per sampled step.
    #[must_use]
    pub const fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Store records are written to.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> StepPhase {
        match self.state {
            StepState::Idle => StepPhase::Idle,
            StepState::Open { .. } => StepPhase::Open,
            StepState::Closed { .. } => StepPhase::Closed,
        }
    }

    /// Id of the open or most recently closed step.
    #[must_use]
    pub const fn step_id(&self) -> Option<u64> {
        match self.state {
            StepState::Idle => None,
            StepState::Open { step_id, .. } | StepState::Closed { step_id } => Some(step_id),
        }
    }

    /// Whether the open step was selected by the sampling policy.
    #[must_use]
    pub const fn is_sampling(&self) -> bool {
        matches!(self.state, StepState::Open { record: Some(_), .. })
    }

    /// Samples offered during the current (or last) sampled step.
    #[must_use]
    pub const fn seen_count(&self) -> usize {
        self.sampler.seen_count()
    }

    /// Open step `step_id`.
    ///
    /// If the policy selects the step a record with `num_samples` slots is
    /// created and stamped with the current time. Returns whether the step is
    /// sampled. An already open step is abandoned without persisting.
    ///
    /// # Errors
    /// - `StepOrder` if `step_id` does not exceed the previous step id
    /// - any error from the store while creating the record
    pub fn start_step(&mut self, step_id: u64) -> Result<bool> {
        if let Some(last) = self.last_step {
            if step_id <= last {
                return Err(Error::StepOrder {
                    last,
                    requested: step_id,
                });
            }
        }

        let record = if self.policy.should_sample_step(step_id) {
            Some(
                self.store
                    .create_record(&self.tag, step_id, Utc::now(), self.num_samples)?,
            )
        } else {
            None
        };

        if let StepState::Open { step_id: open, .. } = self.state {
            tracing::warn!(tag = %self.tag, step = open, "step abandoned without finish_step");
        }

        let sampled = record.is_some();
        self.sampler.reset();
        self.last_step = Some(step_id);
        self.state = StepState::Open { step_id, record };

        tracing::debug!(tag = %self.tag, step = step_id, sampled, "step started");
        Ok(sampled)
    }

    /// Offer the next sample of the open step.
    ///
    /// Returns the slot to write with [`set_sample`](Self::set_sample), or
    /// `Discard`. Steps not selected by the policy, and writers without an
    /// open step, discard everything without counting the offer.
    pub fn offer(&mut self) -> SampleDecision {
        if !self.is_sampling() {
            return SampleDecision::Discard;
        }
        let decision = self.sampler.offer(&mut self.rng);
        tracing::trace!(
            tag = %self.tag,
            seen = self.sampler.seen_count(),
            ?decision,
            "sample offered"
        );
        decision
    }

    /// Write a sample into slot `index` of the open step.
    ///
    /// All checks run before the store is touched. Writing a slot again
    /// replaces its previous contents.
    ///
    /// # Errors
    /// - `ElementTypeMismatch` if `E` differs from the configured element type
    /// - `SizeNotPositive` if the shape is empty or has a zero dimension
    /// - `ShapeMismatch` if the shape product differs from `data.len()`
    /// - `NoOpenStep` if no sampled step is open
    /// - `IndexOutOfRange` if `index >= num_samples` or `index > seen_count`
    /// - any error from the store while writing
    pub fn set_sample<E: PayloadElement>(
        &mut self,
        index: usize,
        shape: &[u64],
        data: &[E],
    ) -> Result<()> {
        if E::ELEMENT_TYPE != self.element_type {
            return Err(Error::ElementTypeMismatch {
                configured: self.element_type,
                given: E::ELEMENT_TYPE,
            });
        }

        let slot = codec::pack(shape, data)?;

        let StepState::Open {
            record: Some(handle),
            ..
        } = &self.state
        else {
            return Err(Error::NoOpenStep);
        };

        let seen = self.sampler.seen_count();
        if index >= self.num_samples || index > seen {
            return Err(Error::IndexOutOfRange {
                index,
                capacity: self.num_samples,
                seen,
            });
        }

        let (payload, shape) = slot.into_parts();
        self.store.write_slot(handle, index, payload, shape)
    }

    /// Close the open step and return the next step id.
    ///
    /// When the policy selects the next step every buffered record is
    /// persisted. The step is closed even if persisting fails.
    ///
    /// # Errors
    /// - `NoOpenStep` if no step is open
    /// - any error from the store while persisting
    pub fn finish_step(&mut self) -> Result<u64> {
        let StepState::Open { step_id, .. } = self.state else {
            return Err(Error::NoOpenStep);
        };
        self.state = StepState::Closed { step_id };

        let next = step_id.saturating_add(1);
        tracing::debug!(
            tag = %self.tag,
            step = step_id,
            seen = self.sampler.seen_count(),
            "step finished"
        );

        if self.policy.should_sample_step(next) {
            if let Err(err) = self.store.persist() {
                tracing::warn!(tag = %self.tag, step = step_id, error = %err, "persist failed");
                return Err(err);
            }
        }
        Ok(next)
    }
}
