use std::process::ExitCode;

use danci_condition::config::EngineConfig;
use danci_condition::error::ReplayError;
use danci_condition::logging::{self, LoggingConfig};
use danci_condition::policy::ResponseChoice;
use danci_condition::replay::{self, ReplayOptions};
use danci_condition::session::LearningSession;

const USAGE: &str = "usage: danci-condition-replay <samples.jsonl> [tick_seconds] [accept|alternative|dismiss]";

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let _log_guard = logging::init_tracing(&LoggingConfig::from_env());

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ReplayError::Argument(msg)) => {
            eprintln!("{msg}\n{USAGE}");
            ExitCode::from(2)
        }
        Err(err) => {
            tracing::error!(error = %err, "replay failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), ReplayError> {
    let path = args
        .first()
        .ok_or_else(|| ReplayError::Argument("missing samples file".to_string()))?;
    let options = parse_options(&args[1..])?;

    let config = EngineConfig::from_env();
    config.validate()?;

    let samples = replay::load_samples(path)?;
    tracing::info!(path = %path, samples = samples.len(), tick_s = options.tick_s, "replaying samples");

    let mut session = LearningSession::new(path.as_str(), &config)?;
    for event in replay::run(&mut session, samples, options)? {
        print_json(&event);
    }
    print_json(&session.summary());

    Ok(())
}

fn parse_options(args: &[String]) -> Result<ReplayOptions, ReplayError> {
    let mut options = ReplayOptions::default();
    if let Some(raw) = args.first() {
        options.tick_s = raw
            .parse()
            .map_err(|_| ReplayError::Argument(format!("invalid tick interval: {raw}")))?;
    }
    if let Some(raw) = args.get(1) {
        options.respond_with = Some(match raw.as_str() {
            "accept" => ResponseChoice::Accept,
            "alternative" => ResponseChoice::Alternative,
            "dismiss" => ResponseChoice::Dismiss,
            other => return Err(ReplayError::Argument(format!("unknown response: {other}"))),
        });
    }
    options.validate()?;
    Ok(options)
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(err) => tracing::warn!(error = %err, "failed to serialize replay output"),
    }
}
