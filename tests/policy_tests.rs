mod common;

use danci_condition::condition::ConditionLabel;
use danci_condition::config::{Frequency, PolicyConfig, Preferences};
use danci_condition::policy::{
    InterventionClass, OptionKind, PolicyEngine, PolicyGate, ResponseChoice,
};

use common::state;

fn engine(config: PolicyConfig) -> PolicyEngine {
    PolicyEngine::with_seed(config, 42).unwrap()
}

fn fast_config() -> PolicyConfig {
    PolicyConfig {
        cooldown_s: 60.0,
        ..Default::default()
    }
}

#[test]
fn brief_confusion_after_attentive_run_is_not_sustained() {
    let mut policy = engine(PolicyConfig::default());
    for t in 0..10 {
        let decision = policy.evaluate(&state(t as f64, ConditionLabel::Attentive, 0.9));
        assert_eq!(decision.blocked_by, Some(PolicyGate::Relevance));
        assert_eq!(decision.next_evaluation_s, 10.0);
    }

    let decision = policy.evaluate(&state(10.0, ConditionLabel::Confused, 0.9));
    assert!(!decision.should_intervene);
    assert_eq!(decision.blocked_by, Some(PolicyGate::Sustain));
    assert_eq!(decision.next_evaluation_s, 5.0);
    assert!(decision.reasoning.contains("1/11"));
}

#[test]
fn low_confidence_abstains_before_sustain() {
    let mut policy = engine(PolicyConfig::default());
    let decision = policy.evaluate(&state(0.0, ConditionLabel::Fatigued, 0.4));
    assert_eq!(decision.blocked_by, Some(PolicyGate::Confidence));
    assert_eq!(decision.next_evaluation_s, 5.0);
}

#[test]
fn malformed_confidence_never_intervenes() {
    let mut policy = engine(PolicyConfig::default());
    let nan = policy.evaluate(&state(0.0, ConditionLabel::Wandering, f64::NAN));
    assert!(!nan.should_intervene);
    assert!(nan.intervention.is_none());
    assert_eq!(nan.blocked_by, Some(PolicyGate::Confidence));
    assert!(nan.reasoning.contains("NaN"));

    let over = policy.evaluate(&state(1.0, ConditionLabel::Wandering, 1.5));
    assert_eq!(over.blocked_by, Some(PolicyGate::Confidence));
    assert!(over.reasoning.contains("1.5"));

    assert_eq!(policy.last_intervention_at(), None);
    assert!(policy.issued_counts().is_empty());
}

#[test]
fn second_attempt_right_after_intervention_hits_cooldown() {
    let mut policy = engine(PolicyConfig::default());
    let first = policy.evaluate(&state(100.0, ConditionLabel::Wandering, 0.8));
    assert!(first.should_intervene);
    assert_eq!(first.next_evaluation_s, 120.0);

    let second = policy.evaluate(&state(100.5, ConditionLabel::Wandering, 0.8));
    assert!(!second.should_intervene);
    assert_eq!(second.blocked_by, Some(PolicyGate::Cooldown));
    assert!((second.next_evaluation_s - 119.5).abs() < 1e-9);
    assert_eq!(policy.last_intervention_at(), Some(100.0));
}

#[test]
fn rate_limit_caps_interventions_per_ten_minutes() {
    let mut policy = engine(fast_config());
    for t in [0.0, 60.0, 120.0] {
        let decision = policy.evaluate(&state(t, ConditionLabel::Wandering, 0.9));
        assert!(decision.should_intervene, "expected intervention at {t}");
    }

    let limited = policy.evaluate(&state(180.0, ConditionLabel::Wandering, 0.9));
    assert_eq!(limited.blocked_by, Some(PolicyGate::RateLimit));
    assert_eq!(limited.next_evaluation_s, 60.0);

    // the first record has aged out of the 600s window
    let reopened = policy.evaluate(&state(600.0, ConditionLabel::Wandering, 0.9));
    assert!(reopened.should_intervene);

    let times: Vec<f64> = policy.records().map(|r| r.timestamp).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn classes_rotate_and_respect_preferences() {
    let mut policy = engine(fast_config());
    let classes: Vec<InterventionClass> = [0.0, 60.0, 120.0]
        .into_iter()
        .filter_map(|t| {
            policy
                .evaluate(&state(t, ConditionLabel::Wandering, 0.9))
                .intervention
                .map(|i| i.class)
        })
        .collect();
    assert_eq!(
        classes,
        vec![
            InterventionClass::Reset,
            InterventionClass::Modality,
            InterventionClass::Reset
        ]
    );

    let mut no_hints = engine(PolicyConfig {
        preferences: Preferences {
            offer_hints: false,
            ..Default::default()
        },
        ..Default::default()
    });
    let decision = no_hints.evaluate(&state(0.0, ConditionLabel::Confused, 0.9));
    assert_eq!(
        decision.intervention.map(|i| i.class),
        Some(InterventionClass::Pace)
    );
}

#[test]
fn every_issued_intervention_has_one_dismiss() {
    let mut policy = engine(fast_config());
    let labels = [
        ConditionLabel::Wandering,
        ConditionLabel::Confused,
        ConditionLabel::Overloaded,
    ];
    let mut t = 0.0;
    for label in labels {
        // fill the sustain window with the new label first
        for step in 0..5 {
            policy.evaluate(&state(t + step as f64, label, 0.9));
        }
        t += 200.0;
    }
    let issued = policy.issued_counts().values().sum::<u32>();
    assert!(issued >= 1);

    for label in labels {
        let mut fresh = engine(fast_config());
        let decision = fresh.evaluate(&state(0.0, label, 0.9));
        let intervention = decision.intervention.unwrap();
        assert_eq!(intervention.dismiss_count(), 1);
        assert_eq!(
            intervention.options.last().map(|o| o.kind),
            Some(OptionKind::Dismiss)
        );
    }
}

#[test]
fn three_dismissals_stretch_cooldown_to_165() {
    let mut policy = engine(PolicyConfig::default());
    let decision = policy.evaluate(&state(0.0, ConditionLabel::Fatigued, 0.9));
    let id = decision.intervention.unwrap().id;

    let mut cooldown = policy.cooldown_s();
    for _ in 0..3 {
        cooldown = policy.record_response(id, ResponseChoice::Dismiss);
    }
    assert_eq!(cooldown, 165.0);
    assert_eq!(policy.cooldown_s(), 165.0);

    // the longer cooldown gates the next attempt
    let blocked = policy.evaluate(&state(130.0, ConditionLabel::Fatigued, 0.9));
    assert_eq!(blocked.blocked_by, Some(PolicyGate::Cooldown));
    assert!((blocked.next_evaluation_s - 35.0).abs() < 1e-9);

    assert_eq!(policy.responses().dismissed, 3);
}

#[test]
fn feedback_stays_within_bounds() {
    let mut policy = engine(PolicyConfig::default());
    let decision = policy.evaluate(&state(0.0, ConditionLabel::Overloaded, 0.9));
    let id = decision.intervention.unwrap().id;

    for _ in 0..40 {
        policy.record_response(id, ResponseChoice::Dismiss);
    }
    assert_eq!(policy.cooldown_s(), 300.0);
    for _ in 0..80 {
        policy.record_response(id, ResponseChoice::Accept);
    }
    assert_eq!(policy.cooldown_s(), 60.0);
    assert_eq!(policy.record_response(id, ResponseChoice::Alternative), 60.0);

    policy.reset();
    assert_eq!(policy.cooldown_s(), 120.0);
    assert_eq!(policy.last_intervention_at(), None);
    assert_eq!(policy.responses().total(), 0);
}

#[test]
fn frequency_preference_scales_cooldown() {
    let mut policy = engine(PolicyConfig {
        preferences: Preferences {
            frequency: Frequency::More,
            ..Default::default()
        },
        ..Default::default()
    });
    let decision = policy.evaluate(&state(0.0, ConditionLabel::Wandering, 0.55));
    assert!(decision.should_intervene);
    assert!((decision.next_evaluation_s - 84.0).abs() < 1e-9);

    let blocked = policy.evaluate(&state(80.0, ConditionLabel::Wandering, 0.55));
    assert_eq!(blocked.blocked_by, Some(PolicyGate::Cooldown));
    assert!(policy
        .evaluate(&state(85.0, ConditionLabel::Wandering, 0.55))
        .should_intervene);
}

#[test]
fn same_seed_same_interventions() {
    let run = || {
        let mut policy = engine(PolicyConfig::default());
        policy
            .evaluate(&state(0.0, ConditionLabel::Confused, 0.9))
            .intervention
            .unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.id, b.id);
    assert_eq!(a.message, b.message);
    assert_eq!(a.class, InterventionClass::Hint);
}

#[test]
fn stale_state_is_evaluated_at_latest_time() {
    let mut policy = engine(PolicyConfig::default());
    assert!(policy
        .evaluate(&state(50.0, ConditionLabel::Wandering, 0.9))
        .should_intervene);
    let stale = policy.evaluate(&state(10.0, ConditionLabel::Wandering, 0.9));
    assert_eq!(stale.blocked_by, Some(PolicyGate::Cooldown));
    assert!((stale.next_evaluation_s - 120.0).abs() < 1e-9);
}
