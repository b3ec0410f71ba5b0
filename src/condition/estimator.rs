use crate::condition::buffer::SampleBuffer;
use crate::condition::scheduler::EmissionScheduler;
use crate::condition::smoother::{SignalSmoother, SmoothedSignals};
use crate::condition::types::{ConditionState, FeatureSample, Tier};
use crate::condition::{confidence, explain, scorer};
use crate::config::EstimatorConfig;
use crate::error::{ConfigError, InputError};

/// Result of one `estimate` pull.
#[derive(Debug, Clone)]
pub enum Estimate {
    State(ConditionState),
    /// Too soon since the last emission.
    Throttled { next_in_s: f64 },
    /// Nothing ingested since construction or the last reset.
    Unavailable,
}

impl Estimate {
    pub fn into_state(self) -> Option<ConditionState> {
        match self {
            Self::State(state) => Some(state),
            _ => None,
        }
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }
}

/// Turns the sample stream into periodic condition states. One per session;
/// not safe for concurrent use.
pub struct ConditionEstimator {
    config: EstimatorConfig,
    buffer: SampleBuffer,
    smoother: SignalSmoother,
    scheduler: EmissionScheduler,
    tier: Tier,
}

impl ConditionEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            buffer: SampleBuffer::new(config.window_s, config.max_buffer_samples),
            smoother: SignalSmoother::new(config.smoothing_alpha),
            scheduler: EmissionScheduler::new(config.emit_interval_s),
            tier: Tier::TelemetryOnly,
            config,
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Rejected samples leave every piece of state untouched.
    pub fn ingest(&mut self, sample: FeatureSample) -> Result<SmoothedSignals, InputError> {
        if let Err(err) = self.buffer.check(&sample) {
            tracing::warn!(error = %err, "feature sample rejected");
            return Err(err);
        }

        if sample.tier != self.tier {
            self.set_tier(sample.tier);
        }
        let signals = self.smoother.update(&sample);
        self.buffer.push(sample)?;
        Ok(signals)
    }

    pub fn set_tier(&mut self, tier: Tier) {
        if tier != self.tier {
            tracing::debug!(from = self.tier.level(), to = tier.level(), "perception tier changed");
            self.tier = tier;
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn signals(&self) -> SmoothedSignals {
        self.smoother.current()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn estimate(&mut self, now: f64) -> Estimate {
        if self.buffer.is_empty() {
            return Estimate::Unavailable;
        }
        if !now.is_finite() {
            tracing::warn!(now, "estimate requested with a non-finite clock");
            return Estimate::Unavailable;
        }
        if !self.scheduler.try_claim(now) {
            return Estimate::Throttled {
                next_in_s: self.scheduler.wait_s(now),
            };
        }

        let state = self.build_state(now);
        tracing::debug!(
            dominant = %state.dominant,
            confidence = state.confidence,
            drivers = state.drivers.len(),
            "condition state emitted"
        );
        Estimate::State(state)
    }

    /// Current state without claiming an emission slot.
    pub fn peek(&self, now: f64) -> Option<ConditionState> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.build_state(now))
        }
    }

    fn build_state(&self, now: f64) -> ConditionState {
        let signals = self.smoother.current();
        let evidence = self.buffer.evidence();
        let scores = scorer::score(&signals);
        let confidence = confidence::assess(self.tier, &evidence);

        ConditionState {
            timestamp: now,
            tier: self.tier,
            dominant: scores.dominant(),
            scores,
            confidence,
            drivers: explain::drivers(&signals),
            not_used: explain::not_used(self.tier, &evidence),
            below_threshold: confidence < self.config.confidence_threshold,
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.smoother.reset();
        self.scheduler.reset();
    }
}
