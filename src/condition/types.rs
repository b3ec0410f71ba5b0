use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Perception capability level of the producing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[derive(Default)]
pub enum Tier {
    #[default]
    TelemetryOnly = 0,
    Rgb = 1,
    Depth = 2,
}

impl Tier {
    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn has_camera(&self) -> bool {
        *self != Self::TelemetryOnly
    }
}

impl TryFrom<u8> for Tier {
    type Error = InputError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::TelemetryOnly),
            1 => Ok(Self::Rgb),
            2 => Ok(Self::Depth),
            other => Err(InputError::InvalidTier(other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.level()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityFlags {
    pub face_present: bool,
    pub low_light: bool,
    pub motion_blur: bool,
}

/// Head pose in radians.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Pose {
    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite() && self.roll.is_finite()
    }
}

/// Gaze offset from screen centre, each axis in [-1, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Gaze {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub confidence: f64,
}

impl Gaze {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eyes {
    pub blink_rate_30s: f64,
    #[serde(default)]
    pub openness_l: f64,
    #[serde(default)]
    pub openness_r: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distance {
    pub face_scale: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Expressivity {
    pub smile: f64,
    pub brow_furrow: f64,
    pub jaw_open: f64,
    pub squint: f64,
}

/// Pre-aggregated interaction telemetry. Always present on a sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(default)]
    pub scroll_speed: f64,
    pub tap_rate_10s: f64,
    pub retry_count_60s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_element_id: Option<String>,
}

impl Interaction {
    pub(crate) fn check_finite(&self) -> Result<(), InputError> {
        if !self.scroll_speed.is_finite() {
            return Err(InputError::NonFiniteTelemetry("scroll_speed"));
        }
        if !self.tap_rate_10s.is_finite() {
            return Err(InputError::NonFiniteTelemetry("tap_rate_10s"));
        }
        if !self.retry_count_60s.is_finite() {
            return Err(InputError::NonFiniteTelemetry("retry_count_60s"));
        }
        if matches!(self.idle_seconds, Some(idle) if !idle.is_finite()) {
            return Err(InputError::NonFiniteTelemetry("idle_seconds"));
        }
        Ok(())
    }
}

/// One normalized observation from the perception and telemetry producers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSample {
    /// Seconds on the caller's clock.
    pub timestamp: f64,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub quality: QualityFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<Pose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze: Option<Gaze>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyes: Option<Eyes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expressivity: Option<Expressivity>,
    pub interaction: Interaction,
}

impl FeatureSample {
    pub fn telemetry(timestamp: f64, interaction: Interaction) -> Self {
        Self {
            timestamp,
            interaction,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLabel {
    Attentive,
    Wandering,
    Confused,
    Overloaded,
    Fatigued,
}

impl ConditionLabel {
    /// Declared priority order; dominant-label ties resolve to the earliest entry.
    pub const ALL: [ConditionLabel; 5] = [
        Self::Attentive,
        Self::Wandering,
        Self::Confused,
        Self::Overloaded,
        Self::Fatigued,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attentive => "attentive",
            Self::Wandering => "wandering",
            Self::Confused => "confused",
            Self::Overloaded => "overloaded",
            Self::Fatigued => "fatigued",
        }
    }
}

impl std::fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent per-label scores in [0, 1]. They overlap and do not sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionScores {
    pub attentive: f64,
    pub wandering: f64,
    pub confused: f64,
    pub overloaded: f64,
    pub fatigued: f64,
}

impl ConditionScores {
    pub fn get(&self, label: ConditionLabel) -> f64 {
        match label {
            ConditionLabel::Attentive => self.attentive,
            ConditionLabel::Wandering => self.wandering,
            ConditionLabel::Confused => self.confused,
            ConditionLabel::Overloaded => self.overloaded,
            ConditionLabel::Fatigued => self.fatigued,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConditionLabel, f64)> + '_ {
        ConditionLabel::ALL.iter().map(move |&label| (label, self.get(label)))
    }

    pub fn dominant(&self) -> ConditionLabel {
        let mut best = ConditionLabel::Attentive;
        let mut best_score = self.attentive;
        for (label, score) in self.iter().skip(1) {
            if score > best_score {
                best = label;
                best_score = score;
            }
        }
        best
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalChannel {
    GazeStability,
    PoseStability,
    BlinkRate,
    InteractionPace,
    RetryRate,
    IdleTime,
}

impl SignalChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GazeStability => "gaze_stability",
            Self::PoseStability => "pose_stability",
            Self::BlinkRate => "blink_rate",
            Self::InteractionPace => "interaction_pace",
            Self::RetryRate => "retry_rate",
            Self::IdleTime => "idle_time",
        }
    }
}

/// Perception inputs that can be missing from a state's evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerceptionSource {
    Gaze,
    Pose,
    Blink,
    Distance,
    Expressivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub description: String,
    pub channels: Vec<SignalChannel>,
    pub weight: f64,
}

/// One emitted snapshot of the learner's estimated condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionState {
    pub timestamp: f64,
    pub tier: Tier,
    pub scores: ConditionScores,
    pub confidence: f64,
    pub drivers: Vec<Driver>,
    pub not_used: Vec<PerceptionSource>,
    pub dominant: ConditionLabel,
    /// Confidence is under the estimator's threshold. Informational only.
    pub below_threshold: bool,
}

impl ConditionState {
    pub fn driver_descriptions(&self) -> Vec<String> {
        self.drivers.iter().map(|d| d.description.clone()).collect()
    }
}
