pub mod buffer;
pub mod confidence;
pub mod estimator;
pub mod explain;
pub mod scheduler;
pub mod scorer;
pub mod smoother;
pub mod types;

pub use buffer::{BufferEvidence, SampleBuffer};
pub use estimator::{ConditionEstimator, Estimate};
pub use scheduler::EmissionScheduler;
pub use smoother::{SignalSmoother, SmoothedSignals};
pub use types::*;
