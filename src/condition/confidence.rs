use crate::condition::buffer::BufferEvidence;
use crate::condition::types::Tier;

const TIER_WEIGHT: f64 = 0.15;
const BUFFER_SATURATION: f64 = 100.0;
const MAX_BUFFER_CONTRIBUTION: f64 = 0.3;
const GAZE_BONUS: f64 = 0.15;
const FACE_BONUS: f64 = 0.15;
const BASE: f64 = 0.10;

/// Monotone in tier and in data availability, bounded to [0, 1].
pub fn assess(tier: Tier, evidence: &BufferEvidence) -> f64 {
    let tier_part = TIER_WEIGHT * tier.level() as f64;
    let buffer_part = (evidence.len as f64 / BUFFER_SATURATION).min(MAX_BUFFER_CONTRIBUTION);
    let gaze_part = if evidence.has_gaze { GAZE_BONUS } else { 0.0 };
    let face_part = if evidence.has_face { FACE_BONUS } else { 0.0 };

    (tier_part + buffer_part + gaze_part + face_part + BASE).clamp(0.0, 1.0)
}
