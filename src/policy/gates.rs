//! The ordered gate chain. Each gate either lets the state through or
//! abstains with a reason and a suggested re-evaluation delay.

use crate::condition::{ConditionLabel, ConditionState};
use crate::config::PolicyConfig;
use crate::policy::history::{InterventionLog, SustainHistory};
use crate::policy::types::{InterventionClass, PolicyGate};

pub const SUSTAIN_RATIO: f64 = 0.6;
pub const RATE_LIMIT_WINDOW_S: f64 = 600.0;

const RELEVANCE_RETRY_S: f64 = 10.0;
const CONFIDENCE_RETRY_S: f64 = 5.0;
const SUSTAIN_RETRY_S: f64 = 5.0;
const RATE_LIMIT_RETRY_S: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Abstention {
    pub gate: PolicyGate,
    pub reasoning: String,
    pub next_evaluation_s: f64,
}

impl Abstention {
    fn new(gate: PolicyGate, reasoning: String, next_evaluation_s: f64) -> Self {
        Self {
            gate,
            reasoning,
            next_evaluation_s,
        }
    }
}

pub fn candidate_classes(label: ConditionLabel) -> &'static [InterventionClass] {
    use InterventionClass::*;
    match label {
        ConditionLabel::Attentive => &[],
        ConditionLabel::Wandering => &[Reset, Modality],
        ConditionLabel::Confused => &[Hint, Pace, Modality],
        ConditionLabel::Overloaded => &[Pace, Reset],
        ConditionLabel::Fatigued => &[Reset, Pace],
    }
}

pub struct GateInputs<'a> {
    pub state: &'a ConditionState,
    pub now: f64,
    pub config: &'a PolicyConfig,
    pub history: &'a SustainHistory,
    pub log: &'a InterventionLog,
    pub last_intervention_at: Option<f64>,
}

/// Runs all five gates in order and returns the candidate set on success.
pub fn run(inputs: &GateInputs<'_>) -> Result<&'static [InterventionClass], Abstention> {
    let candidates = relevance(inputs.state.dominant)?;
    confidence(inputs.state.confidence, inputs.config)?;
    sustain(inputs.state.dominant, inputs.now, inputs.config, inputs.history)?;
    cooldown(inputs.now, inputs.last_intervention_at, inputs.config)?;
    rate_limit(inputs.now, inputs.config, inputs.log)?;
    Ok(candidates)
}

pub fn relevance(label: ConditionLabel) -> Result<&'static [InterventionClass], Abstention> {
    let candidates = candidate_classes(label);
    if candidates.is_empty() {
        return Err(Abstention::new(
            PolicyGate::Relevance,
            format!("relevance: dominant condition '{label}' has no candidate interventions"),
            RELEVANCE_RETRY_S,
        ));
    }
    Ok(candidates)
}

/// Values outside [0, 1], NaN included, always abstain.
pub fn confidence(confidence: f64, config: &PolicyConfig) -> Result<(), Abstention> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(Abstention::new(
            PolicyGate::Confidence,
            format!("confidence: {confidence} is not a valid confidence in [0, 1]"),
            CONFIDENCE_RETRY_S,
        ));
    }
    let threshold = config.effective_confidence_threshold();
    if confidence < threshold {
        return Err(Abstention::new(
            PolicyGate::Confidence,
            format!(
                "confidence: {confidence:.2} below threshold {threshold:.2} (short by {:.2})",
                threshold - confidence
            ),
            CONFIDENCE_RETRY_S,
        ));
    }
    Ok(())
}

pub fn sustain(
    label: ConditionLabel,
    now: f64,
    config: &PolicyConfig,
    history: &SustainHistory,
) -> Result<(), Abstention> {
    let window = config.sustained_window_s;
    let share = history.share(label, now, window);
    if share.total == 0 {
        return Err(Abstention::new(
            PolicyGate::Sustain,
            format!("sustain: no condition history in the last {window:.0}s"),
            SUSTAIN_RETRY_S,
        ));
    }

    let ratio = share.ratio();
    if ratio < SUSTAIN_RATIO {
        return Err(Abstention::new(
            PolicyGate::Sustain,
            format!(
                "sustain: '{label}' dominated {}/{} states ({:.0}%) in the last {window:.0}s, needs {:.0}% (short by {:.0} points)",
                share.matching,
                share.total,
                ratio * 100.0,
                SUSTAIN_RATIO * 100.0,
                (SUSTAIN_RATIO - ratio) * 100.0
            ),
            SUSTAIN_RETRY_S,
        ));
    }
    Ok(())
}

pub fn cooldown(
    now: f64,
    last_intervention_at: Option<f64>,
    config: &PolicyConfig,
) -> Result<(), Abstention> {
    let Some(last) = last_intervention_at else {
        return Ok(());
    };
    let required = config.effective_cooldown_s();
    let elapsed = now - last;
    if elapsed < required {
        let remaining = required - elapsed;
        return Err(Abstention::new(
            PolicyGate::Cooldown,
            format!("cooldown: {elapsed:.1}s since last intervention, {remaining:.1}s of {required:.1}s remaining"),
            remaining,
        ));
    }
    Ok(())
}

pub fn rate_limit(now: f64, config: &PolicyConfig, log: &InterventionLog) -> Result<(), Abstention> {
    let recent = log.count_within(now, RATE_LIMIT_WINDOW_S);
    let max = config.max_per_10min as usize;
    if recent >= max {
        return Err(Abstention::new(
            PolicyGate::RateLimit,
            format!(
                "rate limit: {recent} interventions in the last {RATE_LIMIT_WINDOW_S:.0}s, limit is {max}"
            ),
            RATE_LIMIT_RETRY_S,
        ));
    }
    Ok(())
}
