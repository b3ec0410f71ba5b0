#![allow(dead_code)]

use danci_condition::condition::{
    ConditionLabel, ConditionScores, ConditionState, FeatureSample, Gaze, Interaction, Pose,
    QualityFlags, Tier,
};

pub fn telemetry(ts: f64, tap: f64, retry: f64, idle: Option<f64>) -> FeatureSample {
    FeatureSample::telemetry(
        ts,
        Interaction {
            tap_rate_10s: tap,
            retry_count_60s: retry,
            idle_seconds: idle,
            ..Default::default()
        },
    )
}

/// Camera sample with a visible face.
pub fn camera(ts: f64, gaze_x: f64, yaw: Option<f64>, interaction: Interaction) -> FeatureSample {
    FeatureSample {
        timestamp: ts,
        tier: Tier::Rgb,
        quality: QualityFlags {
            face_present: true,
            ..Default::default()
        },
        gaze: Some(Gaze {
            x: gaze_x,
            y: 0.0,
            confidence: 0.9,
        }),
        pose: yaw.map(|yaw| Pose {
            yaw,
            pitch: 0.0,
            roll: 0.0,
        }),
        interaction,
        ..Default::default()
    }
}

pub fn state(ts: f64, dominant: ConditionLabel, confidence: f64) -> ConditionState {
    ConditionState {
        timestamp: ts,
        tier: Tier::Rgb,
        scores: ConditionScores::default(),
        confidence,
        drivers: vec![],
        not_used: vec![],
        dominant,
        below_threshold: false,
    }
}
