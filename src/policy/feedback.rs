use serde::{Deserialize, Serialize};

use crate::config::{MAX_COOLDOWN_S, MIN_COOLDOWN_S};
use crate::policy::types::ResponseChoice;

pub const DISMISS_STEP_S: f64 = 15.0;
pub const ACCEPT_STEP_S: f64 = 5.0;

/// New cooldown after a learner response, kept within [60, 300].
///
/// `Alternative` has no effect on spacing; it is counted but otherwise left
/// for a future selection-side hook.
pub fn adjust_cooldown(cooldown_s: f64, choice: ResponseChoice) -> f64 {
    match choice {
        ResponseChoice::Dismiss => (cooldown_s + DISMISS_STEP_S).min(MAX_COOLDOWN_S),
        ResponseChoice::Accept => (cooldown_s - ACCEPT_STEP_S).max(MIN_COOLDOWN_S),
        ResponseChoice::Alternative => cooldown_s,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTally {
    pub accepted: u32,
    pub alternatives: u32,
    pub dismissed: u32,
}

impl ResponseTally {
    pub fn record(&mut self, choice: ResponseChoice) {
        let slot = match choice {
            ResponseChoice::Accept => &mut self.accepted,
            ResponseChoice::Alternative => &mut self.alternatives,
            ResponseChoice::Dismiss => &mut self.dismissed,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.accepted + self.alternatives + self.dismissed
    }
}
