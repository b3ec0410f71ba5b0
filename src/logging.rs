use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "condition-replay.log";
const CRATE_TARGETS: [&str; 2] = ["danci_condition", "danci_condition_replay"];

/// Keeps the non-blocking file writer alive. Drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// A bare level (`debug`) applies to this crate only; anything with `=` or
    /// `,` is taken as a full filter directive.
    pub level: String,
    pub file_logs: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logs: false,
            log_dir: PathBuf::from("./logs"),
        }
    }
}

impl LoggingConfig {
    /// Reads `RUST_LOG`, `ENABLE_FILE_LOGS` and `LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(level) = lookup("RUST_LOG").filter(|v| !v.trim().is_empty()) {
            config.level = level.trim().to_string();
        }
        if let Some(flag) = lookup("ENABLE_FILE_LOGS") {
            config.file_logs = matches!(flag.trim(), "true" | "1");
        }
        if let Some(dir) = lookup("LOG_DIR").filter(|v| !v.trim().is_empty()) {
            config.log_dir = PathBuf::from(dir.trim());
        }
        config
    }

    pub fn directives(&self) -> String {
        if self.level.contains('=') || self.level.contains(',') {
            return self.level.clone();
        }
        let mut directives = String::from("warn");
        for target in CRATE_TARGETS {
            directives.push_str(&format!(",{target}={}", self.level));
        }
        directives
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(self.directives()).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Human-readable logs go to stderr; stdout is left for replay output. With
/// `file_logs` set, a daily rolling file under `log_dir` gets the same events.
pub fn init_tracing(config: &LoggingConfig) -> Option<FileLogGuard> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let mut guard = None;
    let mut dir_error = None;
    let file_layer = if config.file_logs {
        match std::fs::create_dir_all(&config.log_dir) {
            Ok(()) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, LOG_FILE_PREFIX);
                let (writer, worker) = tracing_appender::non_blocking(appender);
                guard = Some(FileLogGuard { _guard: worker });
                Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
            }
            Err(err) => {
                dir_error = Some(err);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(err) = dir_error {
        tracing::warn!(
            dir = %config.log_dir.display(),
            error = %err,
            "log directory unavailable, file logging disabled"
        );
    }

    guard
}
