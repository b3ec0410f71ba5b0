use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::condition::ConditionLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionClass {
    Reset,
    Pace,
    Hint,
    Modality,
    Agency,
}

impl InterventionClass {
    pub const ALL: [InterventionClass; 5] = [
        Self::Reset,
        Self::Pace,
        Self::Hint,
        Self::Modality,
        Self::Agency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Pace => "pace",
            Self::Hint => "hint",
            Self::Modality => "modality",
            Self::Agency => "agency",
        }
    }

    /// Classes that offer an extra "alternative" choice between accept and dismiss.
    pub fn offers_alternative(&self) -> bool {
        matches!(self, Self::Agency | Self::Modality)
    }
}

impl std::fmt::Display for InterventionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Accept,
    Alternative,
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionOption {
    pub kind: OptionKind,
    pub label: String,
}

/// An offer shown to the learner. `class` is the load-bearing field; the
/// message is cosmetic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub id: Uuid,
    pub class: InterventionClass,
    pub condition: ConditionLabel,
    pub message: String,
    pub options: Vec<InterventionOption>,
    /// Descriptions of the drivers behind the triggering state.
    pub drivers: Vec<String>,
    pub confidence: f64,
    pub issued_at: f64,
}

impl Intervention {
    pub fn dismiss_count(&self) -> usize {
        self.options
            .iter()
            .filter(|o| o.kind == OptionKind::Dismiss)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterventionRecord {
    pub timestamp: f64,
    pub class: InterventionClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyGate {
    Relevance,
    Confidence,
    Sustain,
    Cooldown,
    RateLimit,
}

impl PolicyGate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Confidence => "confidence",
            Self::Sustain => "sustain",
            Self::Cooldown => "cooldown",
            Self::RateLimit => "rate_limit",
        }
    }
}

/// Outcome of one `evaluate` call. Abstentions are ordinary results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionDecision {
    pub should_intervene: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<Intervention>,
    pub reasoning: String,
    pub next_evaluation_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<PolicyGate>,
}

impl InterventionDecision {
    pub fn abstain(gate: PolicyGate, reasoning: String, next_evaluation_s: f64) -> Self {
        Self {
            should_intervene: false,
            intervention: None,
            reasoning,
            next_evaluation_s,
            blocked_by: Some(gate),
        }
    }

    pub fn intervene(intervention: Intervention, reasoning: String, next_evaluation_s: f64) -> Self {
        Self {
            should_intervene: true,
            intervention: Some(intervention),
            reasoning,
            next_evaluation_s,
            blocked_by: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseChoice {
    Accept,
    Alternative,
    Dismiss,
}

impl ResponseChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Alternative => "alternative",
            Self::Dismiss => "dismiss",
        }
    }
}

impl From<OptionKind> for ResponseChoice {
    fn from(kind: OptionKind) -> Self {
        match kind {
            OptionKind::Accept => Self::Accept,
            OptionKind::Alternative => Self::Alternative,
            OptionKind::Dismiss => Self::Dismiss,
        }
    }
}
