use crate::condition::smoother::SmoothedSignals;
use crate::condition::types::ConditionScores;

/// Five independently clamped weighted sums over the smoothed channels.
pub fn score(signals: &SmoothedSignals) -> ConditionScores {
    let gaze = signals.gaze_stability;
    let pose = signals.pose_stability;
    let blink = signals.blink_rate;
    let pace = signals.interaction_pace;
    let retry = signals.retry_rate;
    let idle = signals.idle_time;

    let attentive = 0.4 * gaze + 0.3 * pose + if pace > 0.05 { 0.3 } else { 0.1 };

    let wandering =
        0.4 * (1.0 - gaze) + 0.3 * (1.0 - pose) + if idle > 10.0 { 0.3 } else { 0.03 * idle };

    let confused = (0.3 * retry).min(0.4)
        + if pace < 0.1 && retry > 0.0 { 0.3 } else { 0.0 }
        + 0.15 * (1.0 - gaze);

    let overloaded = 0.4 * (blink - 0.3).max(0.0) * 2.0
        + if retry > 1.0 { 0.3 } else { 0.3 * retry }
        + if pace > 0.5 { 0.2 } else { 0.0 };

    let fatigued = 0.3 * (blink - 0.25).max(0.0) * 2.0
        + if idle > 5.0 { (0.03 * idle).min(0.3) } else { 0.0 }
        + if pace < 0.05 { 0.3 } else { 0.0 };

    ConditionScores {
        attentive: clamp01(attentive),
        wandering: clamp01(wandering),
        confused: clamp01(confused),
        overloaded: clamp01(overloaded),
        fatigued: clamp01(fatigued),
    }
}

#[inline]
fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
