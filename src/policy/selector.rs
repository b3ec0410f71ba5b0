use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::{Builder, Uuid};

use crate::condition::ConditionState;
use crate::config::Preferences;
use crate::policy::types::{Intervention, InterventionClass, InterventionOption, OptionKind};

const RESET_PHRASES: [&str; 3] = [
    "Want to take a short break and come back fresh?",
    "A quick pause might help. Step away for a minute?",
    "How about a short reset before the next item?",
];

const PACE_PHRASES: [&str; 3] = [
    "Would it help to slow things down a little?",
    "Let's take this one step at a time. Slow the pace?",
    "Want fewer items at once for a bit?",
];

const HINT_PHRASES: [&str; 3] = [
    "This one looks tricky. Want a hint?",
    "Stuck? A small hint is ready if you want it.",
    "Would a nudge in the right direction help?",
];

const MODALITY_PHRASES: [&str; 3] = [
    "Want to try this in a different format?",
    "Another way of presenting this might click. Switch it up?",
    "Would a different view of this material help?",
];

const MODALITY_PREFERRED_PHRASES: [&str; 3] = [
    "Want to try this as {modality} instead?",
    "This might click better as {modality}. Switch over?",
    "How about switching to {modality} for this part?",
];

const AGENCY_PHRASES: [&str; 3] = [
    "Would you like to choose what to do next?",
    "You're in control. Pick how to continue?",
    "Want to decide the next step yourself?",
];

fn phrases(class: InterventionClass) -> &'static [&'static str; 3] {
    match class {
        InterventionClass::Reset => &RESET_PHRASES,
        InterventionClass::Pace => &PACE_PHRASES,
        InterventionClass::Hint => &HINT_PHRASES,
        InterventionClass::Modality => &MODALITY_PHRASES,
        InterventionClass::Agency => &AGENCY_PHRASES,
    }
}

fn accept_label(class: InterventionClass) -> &'static str {
    match class {
        InterventionClass::Reset => "Take a break",
        InterventionClass::Pace => "Slow down",
        InterventionClass::Hint => "Show hint",
        InterventionClass::Modality => "Switch format",
        InterventionClass::Agency => "Choose next step",
    }
}

/// Accept first, dismiss last, and exactly one dismiss.
pub fn options_for(class: InterventionClass) -> Vec<InterventionOption> {
    let mut options = vec![InterventionOption {
        kind: OptionKind::Accept,
        label: accept_label(class).to_string(),
    }];
    if class.offers_alternative() {
        options.push(InterventionOption {
            kind: OptionKind::Alternative,
            label: "Something else".to_string(),
        });
    }
    options.push(InterventionOption {
        kind: OptionKind::Dismiss,
        label: "Not now".to_string(),
    });
    options
}

/// Narrows the gate-approved candidates by preference and recency.
///
/// Fallback order: classes differing from `last` within the preference-filtered
/// set, then the filtered set, then the unfiltered candidates. Within the chosen
/// set the first class wins.
pub fn choose_class(
    candidates: &[InterventionClass],
    preferences: &Preferences,
    last: Option<InterventionClass>,
) -> Option<InterventionClass> {
    let filtered: Vec<InterventionClass> = candidates
        .iter()
        .copied()
        .filter(|c| match c {
            InterventionClass::Reset => preferences.offer_breaks,
            InterventionClass::Hint => preferences.offer_hints,
            _ => true,
        })
        .collect();

    let fresh = filtered.iter().copied().find(|c| Some(*c) != last);
    fresh
        .or_else(|| filtered.first().copied())
        .or_else(|| candidates.first().copied())
}

/// Builds intervention payloads. Phrasing and ids come from a seedable RNG so
/// runs can be reproduced exactly.
pub struct InterventionSelector {
    rng: ChaCha8Rng,
}

impl InterventionSelector {
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    fn message(&mut self, class: InterventionClass, preferences: &Preferences) -> String {
        let index = self.rng.random_range(0..3);
        match (class, preferences.preferred_modality.as_deref()) {
            (InterventionClass::Modality, Some(modality)) => {
                MODALITY_PREFERRED_PHRASES[index].replace("{modality}", modality)
            }
            _ => phrases(class)[index].to_string(),
        }
    }

    pub fn build(
        &mut self,
        class: InterventionClass,
        state: &ConditionState,
        preferences: &Preferences,
        now: f64,
    ) -> Intervention {
        let message = self.message(class, preferences);
        let id: Uuid = Builder::from_random_bytes(self.rng.random()).into_uuid();
        Intervention {
            id,
            class,
            condition: state.dominant,
            message,
            options: options_for(class),
            drivers: state.driver_descriptions(),
            confidence: state.confidence,
            issued_at: now,
        }
    }
}
