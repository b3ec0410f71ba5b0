use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const MIN_COOLDOWN_S: f64 = 60.0;
pub const MAX_COOLDOWN_S: f64 = 300.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatorConfig {
    /// Age limit of the sample buffer, seconds.
    pub window_s: f64,
    pub emit_interval_s: f64,
    /// States below this confidence are flagged, not suppressed.
    pub confidence_threshold: f64,
    pub smoothing_alpha: f64,
    pub max_buffer_samples: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            window_s: 60.0,
            emit_interval_s: 2.0,
            confidence_threshold: 0.5,
            smoothing_alpha: 0.15,
            max_buffer_samples: 2048,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.window_s.is_finite() || self.window_s <= 0.0 {
            return Err(ConfigError::out_of_range("window_s", self.window_s, "> 0"));
        }
        if !self.emit_interval_s.is_finite()
            || self.emit_interval_s <= 0.0
            || self.emit_interval_s > self.window_s
        {
            return Err(ConfigError::out_of_range(
                "emit_interval_s",
                self.emit_interval_s,
                "(0, window_s]",
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::out_of_range(
                "estimator.confidence_threshold",
                self.confidence_threshold,
                "[0, 1]",
            ));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::out_of_range(
                "smoothing_alpha",
                self.smoothing_alpha,
                "(0, 1]",
            ));
        }
        if self.max_buffer_samples == 0 {
            return Err(ConfigError::out_of_range("max_buffer_samples", 0.0, ">= 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Fewer,
    #[default]
    Default,
    More,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fewer => "fewer",
            Self::Default => "default",
            Self::More => "more",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fewer" => Self::Fewer,
            "more" => Self::More,
            _ => Self::Default,
        }
    }

    pub fn confidence_threshold(&self, base: f64) -> f64 {
        match self {
            Self::Fewer => base + 0.1,
            Self::Default => base,
            Self::More => (base - 0.1).max(0.3),
        }
    }

    pub fn cooldown_factor(&self) -> f64 {
        match self {
            Self::Fewer => 1.5,
            Self::Default => 1.0,
            Self::More => 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_modality: Option<String>,
    pub offer_breaks: bool,
    pub offer_hints: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            frequency: Frequency::Default,
            preferred_modality: None,
            offer_breaks: true,
            offer_hints: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    pub confidence_threshold: f64,
    pub sustained_window_s: f64,
    /// Mutated by learner feedback, always within [60, 300].
    pub cooldown_s: f64,
    pub max_per_10min: u32,
    pub preferences: Preferences,
    /// Seed for phrasing and id generation. `None` seeds from the clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            sustained_window_s: 30.0,
            cooldown_s: 120.0,
            max_per_10min: 3,
            preferences: Preferences::default(),
            seed: None,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::out_of_range(
                "policy.confidence_threshold",
                self.confidence_threshold,
                "[0, 1]",
            ));
        }
        if !self.sustained_window_s.is_finite() || self.sustained_window_s <= 0.0 {
            return Err(ConfigError::out_of_range(
                "sustained_window_s",
                self.sustained_window_s,
                "> 0",
            ));
        }
        if !(MIN_COOLDOWN_S..=MAX_COOLDOWN_S).contains(&self.cooldown_s) {
            return Err(ConfigError::out_of_range(
                "cooldown_s",
                self.cooldown_s,
                "[60, 300]",
            ));
        }
        if self.max_per_10min == 0 {
            return Err(ConfigError::out_of_range("max_per_10min", 0.0, ">= 1"));
        }
        Ok(())
    }

    pub fn effective_confidence_threshold(&self) -> f64 {
        self.preferences
            .frequency
            .confidence_threshold(self.confidence_threshold)
    }

    pub fn effective_cooldown_s(&self) -> f64 {
        self.cooldown_s * self.preferences.frequency.cooldown_factor()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub estimator: EstimatorConfig,
    pub policy: PolicyConfig,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_value("CONDITION_WINDOW_S") {
            config.estimator.window_s = val;
        }
        if let Some(val) = env_value("CONDITION_EMIT_INTERVAL_S") {
            config.estimator.emit_interval_s = val;
        }
        if let Some(val) = env_value("CONDITION_CONFIDENCE_THRESHOLD") {
            config.estimator.confidence_threshold = val;
        }
        if let Some(val) = env_value("CONDITION_SMOOTHING_ALPHA") {
            config.estimator.smoothing_alpha = val;
        }
        if let Some(val) = env_value("POLICY_CONFIDENCE_THRESHOLD") {
            config.policy.confidence_threshold = val;
        }
        if let Some(val) = env_value("POLICY_SUSTAINED_WINDOW_S") {
            config.policy.sustained_window_s = val;
        }
        if let Some(val) = env_value("POLICY_COOLDOWN_S") {
            config.policy.cooldown_s = val;
        }
        if let Some(val) = env_value("POLICY_MAX_PER_10MIN") {
            config.policy.max_per_10min = val;
        }
        if let Ok(val) = std::env::var("POLICY_FREQUENCY") {
            config.policy.preferences.frequency = Frequency::parse(&val);
        }
        if let Ok(val) = std::env::var("POLICY_PREFERRED_MODALITY") {
            let val = val.trim();
            if !val.is_empty() {
                config.policy.preferences.preferred_modality = Some(val.to_string());
            }
        }
        if let Some(val) = env_value("POLICY_OFFER_BREAKS") {
            config.policy.preferences.offer_breaks = val;
        }
        if let Some(val) = env_value("POLICY_OFFER_HINTS") {
            config.policy.preferences.offer_hints = val;
        }
        if let Some(val) = env_value("POLICY_SEED") {
            config.policy.seed = Some(val);
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.estimator.validate()?;
        self.policy.validate()
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable config override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn cooldown_outside_bounds_is_rejected() {
        let mut policy = PolicyConfig::default();
        policy.cooldown_s = 30.0;
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::OutOfRange { field: "cooldown_s", .. })
        ));
        policy.cooldown_s = 301.0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn emit_interval_must_fit_window() {
        let config = EstimatorConfig {
            window_s: 5.0,
            emit_interval_s: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn frequency_adjustments() {
        assert!((Frequency::Fewer.confidence_threshold(0.5) - 0.6).abs() < 1e-9);
        assert!((Frequency::More.confidence_threshold(0.5) - 0.4).abs() < 1e-9);
        assert!((Frequency::More.confidence_threshold(0.35) - 0.3).abs() < 1e-9);
        assert_eq!(Frequency::Default.confidence_threshold(0.5), 0.5);
        assert_eq!(Frequency::Fewer.cooldown_factor(), 1.5);
        assert_eq!(Frequency::More.cooldown_factor(), 0.7);
    }

    #[test]
    fn frequency_parse_falls_back_to_default() {
        assert_eq!(Frequency::parse("FEWER"), Frequency::Fewer);
        assert_eq!(Frequency::parse(" more "), Frequency::More);
        assert_eq!(Frequency::parse("often"), Frequency::Default);
    }
}
