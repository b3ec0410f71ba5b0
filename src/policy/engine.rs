use std::collections::HashMap;

use uuid::Uuid;

use crate::condition::ConditionState;
use crate::config::PolicyConfig;
use crate::error::ConfigError;
use crate::policy::feedback::{adjust_cooldown, ResponseTally};
use crate::policy::gates::{self, GateInputs, RATE_LIMIT_WINDOW_S};
use crate::policy::history::{InterventionLog, SustainHistory};
use crate::policy::selector::{choose_class, InterventionSelector};
use crate::policy::types::{
    InterventionClass, InterventionDecision, InterventionRecord, ResponseChoice,
};

/// Gate chain, selector and feedback loop for one learning session.
///
/// Time comes from the evaluated state's timestamp; nothing here reads a clock.
pub struct PolicyEngine {
    config: PolicyConfig,
    initial_cooldown_s: f64,
    history: SustainHistory,
    log: InterventionLog,
    last_intervention_at: Option<f64>,
    last_class: Option<InterventionClass>,
    latest_seen: Option<f64>,
    selector: InterventionSelector,
    issued: HashMap<InterventionClass, u32>,
    responses: ResponseTally,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            initial_cooldown_s: config.cooldown_s,
            selector: InterventionSelector::new(config.seed),
            config,
            history: SustainHistory::default(),
            log: InterventionLog::default(),
            last_intervention_at: None,
            last_class: None,
            latest_seen: None,
            issued: HashMap::new(),
            responses: ResponseTally::default(),
        })
    }

    pub fn with_seed(mut config: PolicyConfig, seed: u64) -> Result<Self, ConfigError> {
        config.seed = Some(seed);
        Self::new(config)
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn cooldown_s(&self) -> f64 {
        self.config.cooldown_s
    }

    pub fn last_intervention_at(&self) -> Option<f64> {
        self.last_intervention_at
    }

    pub fn records(&self) -> impl Iterator<Item = &InterventionRecord> {
        self.log.records()
    }

    pub fn issued_counts(&self) -> &HashMap<InterventionClass, u32> {
        &self.issued
    }

    pub fn responses(&self) -> ResponseTally {
        self.responses
    }

    pub fn evaluate(&mut self, state: &ConditionState) -> InterventionDecision {
        let now = self.clamp_time(state.timestamp);

        self.history
            .record(now, state.dominant, self.config.sustained_window_s);
        self.log.prune(now, RATE_LIMIT_WINDOW_S);

        let inputs = GateInputs {
            state,
            now,
            config: &self.config,
            history: &self.history,
            log: &self.log,
            last_intervention_at: self.last_intervention_at,
        };
        let candidates = match gates::run(&inputs) {
            Ok(candidates) => candidates,
            Err(abstention) => {
                tracing::debug!(
                    gate = abstention.gate.as_str(),
                    dominant = %state.dominant,
                    reasoning = %abstention.reasoning,
                    "policy abstained"
                );
                return InterventionDecision::abstain(
                    abstention.gate,
                    abstention.reasoning,
                    abstention.next_evaluation_s,
                );
            }
        };

        // Non-empty: the relevance gate already required it.
        let class = choose_class(candidates, &self.config.preferences, self.last_class)
            .unwrap_or(candidates[0]);
        let intervention = self
            .selector
            .build(class, state, &self.config.preferences, now);

        self.log.push(now, class);
        self.last_intervention_at = Some(now);
        self.last_class = Some(class);
        *self.issued.entry(class).or_insert(0) += 1;

        let next = self.config.effective_cooldown_s();
        let reasoning = format!(
            "sustained '{}' at confidence {:.2}; offering '{}'",
            state.dominant, state.confidence, class
        );
        tracing::info!(
            id = %intervention.id,
            class = class.as_str(),
            dominant = %state.dominant,
            confidence = state.confidence,
            "intervention issued"
        );
        InterventionDecision::intervene(intervention, reasoning, next)
    }

    /// Applies learner feedback to the cooldown and returns the new value.
    pub fn record_response(&mut self, id: Uuid, choice: ResponseChoice) -> f64 {
        let before = self.config.cooldown_s;
        let after = adjust_cooldown(before, choice);
        self.config.cooldown_s = after;
        self.responses.record(choice);

        if after != before {
            tracing::info!(%id, choice = choice.as_str(), before, after, "cooldown adjusted");
        } else {
            tracing::debug!(%id, choice = choice.as_str(), cooldown = after, "response recorded");
        }
        after
    }

    /// Discards histories and timers and restores the configured cooldown. A
    /// seeded engine also restarts its phrasing and id sequence.
    pub fn reset(&mut self) {
        self.history.clear();
        self.log.clear();
        self.last_intervention_at = None;
        self.last_class = None;
        self.latest_seen = None;
        self.issued.clear();
        self.responses = ResponseTally::default();
        self.config.cooldown_s = self.initial_cooldown_s;
        if let Some(seed) = self.config.seed {
            self.selector.reseed(seed);
        }
    }

    /// Evaluation time never moves backwards. A non-finite or older timestamp
    /// is evaluated at the latest seen time, or at 0 before any state; the
    /// result always becomes the new latest time.
    fn clamp_time(&mut self, timestamp: f64) -> f64 {
        let floor = self.latest_seen;
        let now = match floor {
            _ if !timestamp.is_finite() => {
                let at = floor.unwrap_or(0.0);
                tracing::warn!(timestamp, at, "state timestamp not finite, clamping");
                at
            }
            Some(latest) if timestamp < latest => {
                tracing::warn!(timestamp, latest, "state older than latest evaluation, clamping");
                latest
            }
            _ => timestamp,
        };
        self.latest_seen = Some(now);
        now
    }
}
