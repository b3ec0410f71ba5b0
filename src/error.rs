use thiserror::Error;

/// A feature sample the estimator refused to ingest. Rejected samples never
/// touch the buffer or the smoothed channels.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("non-monotonic timestamp: got {got}, newest buffered is {previous}")]
    NonMonotonicTimestamp { previous: f64, got: f64 },
    #[error("timestamp is not finite: {0}")]
    NonFiniteTimestamp(f64),
    #[error("invalid tier {0}, expected 0, 1 or 2")]
    InvalidTier(u8),
    #[error("interaction field {0} is not finite")]
    NonFiniteTelemetry(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn out_of_range(field: &'static str, value: f64, expected: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value,
            expected,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: invalid sample: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid argument: {0}")]
    Argument(String),
}
