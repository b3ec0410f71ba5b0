use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::condition::{ConditionEstimator, ConditionLabel, ConditionState, Estimate, FeatureSample, Tier};
use crate::config::EngineConfig;
use crate::error::{ConfigError, InputError};
use crate::policy::{InterventionClass, InterventionDecision, PolicyEngine, ResponseChoice, ResponseTally};

/// What one `tick` produced.
#[derive(Debug, Clone)]
pub enum SessionTick {
    /// No sample ingested yet.
    Unavailable,
    Throttled { next_in_s: f64 },
    Evaluated {
        state: ConditionState,
        decision: InterventionDecision,
    },
}

impl SessionTick {
    pub fn decision(&self) -> Option<&InterventionDecision> {
        match self {
            Self::Evaluated { decision, .. } => Some(decision),
            _ => None,
        }
    }

    pub fn state(&self) -> Option<&ConditionState> {
        match self {
            Self::Evaluated { state, .. } => Some(state),
            _ => None,
        }
    }
}

/// In-memory tally of one session. Never persisted here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub samples_ingested: u64,
    pub samples_rejected: u64,
    pub states_emitted: u64,
    pub dominant_counts: BTreeMap<ConditionLabel, u32>,
    pub interventions: BTreeMap<InterventionClass, u32>,
    pub responses: ResponseTally,
    pub cooldown_s: f64,
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_state_at: Option<f64>,
}

/// One estimator and one policy engine, owned together. All calls for a
/// session go through here.
pub struct LearningSession {
    id: String,
    estimator: ConditionEstimator,
    policy: PolicyEngine,
    samples_ingested: u64,
    samples_rejected: u64,
    states_emitted: u64,
    dominant_counts: HashMap<ConditionLabel, u32>,
    last_state_at: Option<f64>,
}

impl LearningSession {
    pub fn new(id: impl Into<String>, config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            id: id.into(),
            estimator: ConditionEstimator::new(config.estimator.clone())?,
            policy: PolicyEngine::new(config.policy.clone())?,
            samples_ingested: 0,
            samples_rejected: 0,
            states_emitted: 0,
            dominant_counts: HashMap::new(),
            last_state_at: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn estimator(&self) -> &ConditionEstimator {
        &self.estimator
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub fn ingest(&mut self, sample: FeatureSample) -> Result<(), InputError> {
        match self.estimator.ingest(sample) {
            Ok(_) => {
                self.samples_ingested += 1;
                Ok(())
            }
            Err(err) => {
                self.samples_rejected += 1;
                Err(err)
            }
        }
    }

    pub fn set_tier(&mut self, tier: Tier) {
        self.estimator.set_tier(tier);
    }

    /// Emits a state if one is due and runs it through the gate chain.
    pub fn tick(&mut self, now: f64) -> SessionTick {
        let state = match self.estimator.estimate(now) {
            Estimate::State(state) => state,
            Estimate::Throttled { next_in_s } => return SessionTick::Throttled { next_in_s },
            Estimate::Unavailable => return SessionTick::Unavailable,
        };

        self.states_emitted += 1;
        self.last_state_at = Some(state.timestamp);
        *self.dominant_counts.entry(state.dominant).or_insert(0) += 1;

        let decision = self.policy.evaluate(&state);
        SessionTick::Evaluated { state, decision }
    }

    pub fn respond(&mut self, id: Uuid, choice: ResponseChoice) -> f64 {
        self.policy.record_response(id, choice)
    }

    pub fn reset(&mut self) {
        tracing::debug!(session = %self.id, "session reset");
        self.estimator.reset();
        self.policy.reset();
        self.samples_ingested = 0;
        self.samples_rejected = 0;
        self.states_emitted = 0;
        self.dominant_counts.clear();
        self.last_state_at = None;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            samples_ingested: self.samples_ingested,
            samples_rejected: self.samples_rejected,
            states_emitted: self.states_emitted,
            dominant_counts: self.dominant_counts.iter().map(|(k, v)| (*k, *v)).collect(),
            interventions: self
                .policy
                .issued_counts()
                .iter()
                .map(|(k, v)| (*k, *v))
                .collect(),
            responses: self.policy.responses(),
            cooldown_s: self.policy.cooldown_s(),
            tier: self.estimator.tier(),
            last_state_at: self.last_state_at,
        }
    }
}

pub type SharedSession = Arc<Mutex<LearningSession>>;

/// Host-side map of active sessions. Each session sits behind its own lock so
/// calls for one learner are serialized and sessions never share state.
pub struct SessionRegistry {
    config: EngineConfig,
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the existing session for `id` or starts a new one.
    pub fn open(&self, id: &str) -> Result<SharedSession, ConfigError> {
        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(id) {
            return Ok(Arc::clone(existing));
        }
        let session = Arc::new(Mutex::new(LearningSession::new(id, &self.config)?));
        sessions.insert(id.to_string(), Arc::clone(&session));
        tracing::info!(session = id, "learning session opened");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn close(&self, id: &str) -> Option<SessionSummary> {
        let session = self.sessions.lock().remove(id)?;
        let summary = session.lock().summary();
        tracing::info!(
            session = id,
            states = summary.states_emitted,
            interventions = summary.interventions.values().sum::<u32>(),
            "learning session closed"
        );
        Some(summary)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
