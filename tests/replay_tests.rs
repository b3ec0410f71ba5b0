mod common;

use std::io::Write;
use std::sync::Arc;
use std::thread;

use danci_condition::condition::{ConditionLabel, Interaction, Tier};
use danci_condition::config::{EngineConfig, Frequency};
use danci_condition::error::ReplayError;
use danci_condition::policy::ResponseChoice;
use danci_condition::replay::{self, ReplayEvent, ReplayOptions};
use danci_condition::session::{LearningSession, SessionRegistry};

use common::{camera, telemetry};

fn write_jsonl(lines: &[String]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn wandering_lines(count: usize) -> Vec<String> {
    let interaction = Interaction {
        tap_rate_10s: 0.02,
        idle_seconds: Some(12.0),
        ..Default::default()
    };
    (0..count)
        .map(|t| serde_json::to_string(&camera(t as f64, 0.45, Some(0.35), interaction.clone())).unwrap())
        .collect()
}

#[test]
fn loads_jsonl_and_skips_blank_lines() {
    let mut lines = wandering_lines(3);
    lines.insert(1, String::new());
    lines.push(
        r#"{"timestamp": 3.5, "interaction": {"tapRate10s": 0.1, "retryCount60s": 2}}"#.to_string(),
    );
    let file = write_jsonl(&lines);

    let samples = replay::load_samples(file.path()).unwrap();
    assert_eq!(samples.len(), 4);
    assert_eq!(samples[0].tier, Tier::Rgb);
    assert!(samples[0].gaze.is_some());
    assert_eq!(samples[3].tier, Tier::TelemetryOnly);
    assert_eq!(samples[3].interaction.retry_count_60s, 2.0);
}

#[test]
fn parse_errors_carry_the_line_number() {
    let mut lines = wandering_lines(2);
    lines.push(r#"{"timestamp": 2.0, "tier": 7, "interaction": {"tapRate10s": 0, "retryCount60s": 0}}"#.to_string());
    let file = write_jsonl(&lines);

    match replay::load_samples(file.path()) {
        Err(ReplayError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected parse error, got {other:?}"),
    }

    assert!(matches!(
        replay::load_samples(file.path().with_extension("missing")),
        Err(ReplayError::Io(_))
    ));
}

#[test]
fn replay_drives_feedback_loop() {
    let file = write_jsonl(&wandering_lines(200));
    let samples = replay::load_samples(file.path()).unwrap();

    let mut config = EngineConfig::default();
    config.policy.confidence_threshold = 0.5;
    config.policy.seed = Some(5);
    let mut session = LearningSession::new("replay", &config).unwrap();
    let options = ReplayOptions {
        tick_s: 2.0,
        respond_with: Some(ResponseChoice::Dismiss),
    };
    let events = replay::run(&mut session, samples, options).unwrap();

    let responses: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            ReplayEvent::Response { cooldown_s, .. } => Some(*cooldown_s),
            _ => None,
        })
        .collect();
    assert_eq!(responses, vec![135.0, 150.0]);

    let summary = session.summary();
    assert_eq!(summary.samples_ingested, 200);
    assert_eq!(summary.states_emitted, 100);
    assert_eq!(summary.responses.dismissed, 2);
    assert_eq!(summary.cooldown_s, 150.0);
    assert_eq!(summary.dominant_counts.get(&ConditionLabel::Wandering), Some(&100));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["sessionId"], "replay");
    assert_eq!(json["interventions"]["reset"], 1);
    assert_eq!(json["interventions"]["modality"], 1);
}

#[test]
fn registry_keeps_sessions_apart() {
    let registry = Arc::new(SessionRegistry::new(EngineConfig::default()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let session = registry.open(&format!("learner-{n}")).unwrap();
                for t in 0..(10 * (n + 1)) {
                    let mut guard = session.lock();
                    guard.ingest(telemetry(t as f64, 0.2, 0.0, None)).unwrap();
                    guard.tick(t as f64);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 4);
    for n in 0..4u64 {
        let summary = registry.close(&format!("learner-{n}")).unwrap();
        assert_eq!(summary.samples_ingested, 10 * (n + 1));
        assert_eq!(summary.states_emitted, 5 * (n + 1));
    }
    assert!(registry.is_empty());
}

#[test]
fn env_overrides_apply_and_bad_values_are_ignored() {
    // only test in the crate that touches these variables
    std::env::set_var("POLICY_COOLDOWN_S", "90");
    std::env::set_var("POLICY_FREQUENCY", "fewer");
    std::env::set_var("POLICY_MAX_PER_10MIN", "not-a-number");
    std::env::set_var("CONDITION_EMIT_INTERVAL_S", "1.5");

    let config = EngineConfig::from_env();

    std::env::remove_var("POLICY_COOLDOWN_S");
    std::env::remove_var("POLICY_FREQUENCY");
    std::env::remove_var("POLICY_MAX_PER_10MIN");
    std::env::remove_var("CONDITION_EMIT_INTERVAL_S");

    assert_eq!(config.policy.cooldown_s, 90.0);
    assert_eq!(config.policy.preferences.frequency, Frequency::Fewer);
    assert_eq!(config.policy.max_per_10min, 3);
    assert_eq!(config.estimator.emit_interval_s, 1.5);
    assert!(config.validate().is_ok());
}
