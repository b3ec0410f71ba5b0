use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::condition::{ConditionState, FeatureSample};
use crate::error::ReplayError;
use crate::policy::{InterventionDecision, ResponseChoice};
use crate::session::{LearningSession, SessionTick};

/// Reads newline-delimited JSON samples. Blank lines are skipped; line numbers
/// in errors are 1-based.
pub fn load_samples(path: impl AsRef<Path>) -> Result<Vec<FeatureSample>, ReplayError> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let sample = serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse {
            line: idx + 1,
            source,
        })?;
        samples.push(sample);
    }

    Ok(samples)
}

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    /// Seconds between ticks on the synthetic clock.
    pub tick_s: f64,
    /// Answer every issued intervention with this choice.
    pub respond_with: Option<ResponseChoice>,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            tick_s: 1.0,
            respond_with: None,
        }
    }
}

impl ReplayOptions {
    pub fn validate(&self) -> Result<(), ReplayError> {
        if !self.tick_s.is_finite() || self.tick_s <= 0.0 {
            return Err(ReplayError::Argument(format!(
                "tick interval must be a positive number of seconds, got {}",
                self.tick_s
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReplayEvent {
    State(ConditionState),
    #[serde(rename_all = "camelCase")]
    Decision {
        at: f64,
        decision: InterventionDecision,
    },
    #[serde(rename_all = "camelCase")]
    Response {
        at: f64,
        choice: ResponseChoice,
        cooldown_s: f64,
    },
    #[serde(rename_all = "camelCase")]
    Rejected { index: usize, reason: String },
}

/// Upper bound on synthetic clock ticks in one replay.
pub const MAX_REPLAY_TICKS: u64 = 1_000_000;

/// Tick `k` falls at `start + k * step`, so large timestamps cannot stall it.
struct SyntheticClock {
    start: f64,
    step: f64,
    next: u64,
}

impl SyntheticClock {
    fn at(&self, k: u64) -> f64 {
        self.start + k as f64 * self.step
    }

    /// Index of the last tick that can fall at or before `until`. Ticks past
    /// it are never run even when `start` is too large for `step` to move it.
    fn last_index(&self, until: f64) -> Result<u64, ReplayError> {
        let span = ((until - self.start) / self.step).max(0.0);
        if span > MAX_REPLAY_TICKS as f64 {
            return Err(ReplayError::Argument(format!(
                "reaching t={until} from t={} at {}s per tick exceeds {MAX_REPLAY_TICKS} ticks",
                self.start, self.step
            )));
        }
        Ok(span.floor() as u64 + 1)
    }
}

/// Feeds `samples` into `session` in order, ticking every `tick_s` seconds of
/// the synthetic clock. Each tick sees only samples stamped at or before it.
/// A replay spanning more than [`MAX_REPLAY_TICKS`] ticks is an argument error.
pub fn run(
    session: &mut LearningSession,
    samples: impl IntoIterator<Item = FeatureSample>,
    options: ReplayOptions,
) -> Result<Vec<ReplayEvent>, ReplayError> {
    options.validate()?;

    let mut events = Vec::new();
    let mut clock: Option<SyntheticClock> = None;
    let mut last_ts: Option<f64> = None;

    for (index, sample) in samples.into_iter().enumerate() {
        let ts = sample.timestamp;
        if let Some(clock) = clock.as_mut() {
            if ts.is_finite() {
                advance(session, clock, ts, false, options, &mut events)?;
            }
        }

        match session.ingest(sample) {
            Ok(()) => {
                if clock.is_none() {
                    clock = Some(SyntheticClock {
                        start: ts,
                        step: options.tick_s,
                        next: 0,
                    });
                }
                last_ts = Some(ts);
            }
            Err(err) => events.push(ReplayEvent::Rejected {
                index,
                reason: err.to_string(),
            }),
        }
    }

    if let (Some(mut clock), Some(end)) = (clock, last_ts) {
        advance(session, &mut clock, end, true, options, &mut events)?;
    }

    Ok(events)
}

/// Ticks up to `until`, exclusive unless `inclusive`.
fn advance(
    session: &mut LearningSession,
    clock: &mut SyntheticClock,
    until: f64,
    inclusive: bool,
    options: ReplayOptions,
    events: &mut Vec<ReplayEvent>,
) -> Result<(), ReplayError> {
    let last = clock.last_index(until)?;
    while clock.next <= last {
        let now = clock.at(clock.next);
        let due = if inclusive { now <= until } else { now < until };
        if !due {
            break;
        }
        tick(session, now, options, events);
        clock.next += 1;
    }
    Ok(())
}

fn tick(session: &mut LearningSession, now: f64, options: ReplayOptions, events: &mut Vec<ReplayEvent>) {
    let SessionTick::Evaluated { state, decision } = session.tick(now) else {
        return;
    };

    let issued = decision.intervention.as_ref().map(|i| i.id);
    events.push(ReplayEvent::State(state));
    events.push(ReplayEvent::Decision { at: now, decision });

    if let (Some(id), Some(choice)) = (issued, options.respond_with) {
        let cooldown_s = session.respond(id, choice);
        events.push(ReplayEvent::Response {
            at: now,
            choice,
            cooldown_s,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Interaction;
    use crate::config::EngineConfig;

    fn sample(ts: f64) -> FeatureSample {
        FeatureSample::telemetry(
            ts,
            Interaction {
                tap_rate_10s: 0.2,
                ..Default::default()
            },
        )
    }

    #[test]
    fn rejects_bad_tick_interval() {
        let mut session = LearningSession::new("r", &EngineConfig::default()).unwrap();
        let options = ReplayOptions {
            tick_s: 0.0,
            respond_with: None,
        };
        assert!(matches!(
            run(&mut session, vec![sample(0.0)], options),
            Err(ReplayError::Argument(_))
        ));
    }

    #[test]
    fn ticks_follow_emission_interval() {
        let mut session = LearningSession::new("r", &EngineConfig::default()).unwrap();
        let samples: Vec<_> = (0..=10).map(|i| sample(i as f64)).collect();
        let events = run(&mut session, samples, ReplayOptions::default()).unwrap();

        let states: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                ReplayEvent::State(s) => Some(s.timestamp),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn huge_gap_is_refused() {
        let mut session = LearningSession::new("r", &EngineConfig::default()).unwrap();
        let samples = vec![sample(0.0), sample(1.7e9)];
        assert!(matches!(
            run(&mut session, samples, ReplayOptions::default()),
            Err(ReplayError::Argument(_))
        ));
    }

    #[test]
    fn clock_advances_at_large_timestamps() {
        let mut session = LearningSession::new("r", &EngineConfig::default()).unwrap();
        let samples = vec![sample(1e17), sample(1e17 + 64.0)];
        let events = run(&mut session, samples, ReplayOptions::default()).unwrap();
        assert!(events.iter().any(|e| matches!(e, ReplayEvent::State(_))));
        assert_eq!(session.summary().samples_ingested, 2);

        let mut session = LearningSession::new("r", &EngineConfig::default()).unwrap();
        let samples = vec![sample(1e300), sample(1e300)];
        assert!(run(&mut session, samples, ReplayOptions::default()).is_ok());
    }

    #[test]
    fn rejected_samples_are_reported() {
        let mut session = LearningSession::new("r", &EngineConfig::default()).unwrap();
        let samples = vec![sample(5.0), sample(3.0), sample(6.0)];
        let events = run(&mut session, samples, ReplayOptions::default()).unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, ReplayEvent::Rejected { index: 1, .. })));
        assert_eq!(session.summary().samples_rejected, 1);
    }
}
