use std::cmp::Ordering;

use crate::condition::buffer::BufferEvidence;
use crate::condition::smoother::SmoothedSignals;
use crate::condition::types::{Driver, PerceptionSource, SignalChannel, Tier};

fn driver(description: impl Into<String>, channel: SignalChannel, weight: f64) -> Driver {
    Driver {
        description: description.into(),
        channels: vec![channel],
        weight,
    }
}

/// Human-readable reasons behind the current scores, heaviest first.
pub fn drivers(signals: &SmoothedSignals) -> Vec<Driver> {
    let mut out = Vec::new();

    if signals.gaze_stability < 0.4 {
        out.push(driver("frequent gaze breaks", SignalChannel::GazeStability, 0.4));
    }
    if signals.pose_stability < 0.4 {
        out.push(driver("head pose drift", SignalChannel::PoseStability, 0.3));
    }
    if signals.retry_rate > 0.5 {
        let retries = signals.retry_rate.round() as u32;
        out.push(driver(
            format!("{retries} retries in last minute"),
            SignalChannel::RetryRate,
            0.35,
        ));
    }
    if signals.idle_time > 10.0 {
        out.push(driver("extended idle period", SignalChannel::IdleTime, 0.25));
    }
    if signals.blink_rate > 0.3 {
        out.push(driver("elevated blink rate", SignalChannel::BlinkRate, 0.2));
    }
    if signals.interaction_pace < 0.05 {
        out.push(driver(
            "slower response times",
            SignalChannel::InteractionPace,
            0.2,
        ));
    }

    // sort_by is stable, ties keep declaration order
    out.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
    out
}

/// Perception sources that did not contribute to this estimate.
pub fn not_used(tier: Tier, evidence: &BufferEvidence) -> Vec<PerceptionSource> {
    if !tier.has_camera() {
        return vec![
            PerceptionSource::Gaze,
            PerceptionSource::Pose,
            PerceptionSource::Blink,
            PerceptionSource::Distance,
        ];
    }

    let mut out = Vec::new();
    if !evidence.has_gaze {
        out.push(PerceptionSource::Gaze);
    }
    if !evidence.has_expressivity {
        out.push(PerceptionSource::Expressivity);
    }
    out
}
