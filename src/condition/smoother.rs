use serde::{Deserialize, Serialize};

use crate::condition::types::FeatureSample;

pub const DEFAULT_ALPHA: f64 = 0.15;

/// Session-long decaying aggregates of the six derived channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmoothedSignals {
    pub gaze_stability: f64,
    pub pose_stability: f64,
    pub blink_rate: f64,
    pub interaction_pace: f64,
    pub retry_rate: f64,
    pub idle_time: f64,
}

impl Default for SmoothedSignals {
    fn default() -> Self {
        Self {
            gaze_stability: 0.5,
            pose_stability: 0.5,
            blink_rate: 0.0,
            interaction_pace: 0.0,
            retry_rate: 0.0,
            idle_time: 0.0,
        }
    }
}

pub fn gaze_stability(x: f64, y: f64) -> f64 {
    (1.0 - 2.0 * (x * x + y * y).sqrt()).max(0.0)
}

pub fn pose_stability(yaw: f64, pitch: f64, roll: f64) -> f64 {
    (1.0 - 2.0 * (yaw.abs() + pitch.abs() + roll.abs())).max(0.0)
}

#[inline]
fn ewma(current: f64, observed: f64, alpha: f64) -> f64 {
    alpha * observed + (1.0 - alpha) * current
}

pub struct SignalSmoother {
    alpha: f64,
    signals: SmoothedSignals,
}

impl SignalSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            signals: SmoothedSignals::default(),
        }
    }

    /// Channels whose source field is absent keep their previous value.
    pub fn update(&mut self, sample: &FeatureSample) -> SmoothedSignals {
        let alpha = self.alpha;
        let s = &mut self.signals;

        if let Some(gaze) = sample.gaze.filter(|g| g.is_finite()) {
            s.gaze_stability = ewma(s.gaze_stability, gaze_stability(gaze.x, gaze.y), alpha);
        }

        if let Some(pose) = sample.pose.filter(|p| p.is_finite()) {
            s.pose_stability = ewma(
                s.pose_stability,
                pose_stability(pose.yaw, pose.pitch, pose.roll),
                alpha,
            );
        }

        // Blink rate moves slowly, half the usual factor.
        if let Some(eyes) = sample.eyes.filter(|e| e.blink_rate_30s.is_finite()) {
            s.blink_rate = ewma(s.blink_rate, eyes.blink_rate_30s, alpha * 0.5);
        }

        let interaction = &sample.interaction;
        s.interaction_pace = ewma(s.interaction_pace, interaction.tap_rate_10s, alpha);
        s.retry_rate = ewma(s.retry_rate, interaction.retry_count_60s, alpha);
        if let Some(idle) = interaction.idle_seconds {
            s.idle_time = ewma(s.idle_time, idle, alpha);
        }

        self.signals
    }

    pub fn current(&self) -> SmoothedSignals {
        self.signals
    }

    pub fn reset(&mut self) {
        self.signals = SmoothedSignals::default();
    }
}

impl Default for SignalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}
