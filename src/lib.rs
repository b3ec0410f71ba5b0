pub mod condition;
pub mod config;
pub mod error;
pub mod logging;
pub mod policy;
pub mod replay;
pub mod session;

pub use condition::{ConditionEstimator, ConditionLabel, ConditionState, Estimate, FeatureSample, Tier};
pub use config::{EngineConfig, EstimatorConfig, PolicyConfig, Preferences};
pub use error::{ConfigError, InputError, ReplayError};
pub use policy::{Intervention, InterventionClass, InterventionDecision, PolicyEngine, ResponseChoice};
pub use session::{LearningSession, SessionRegistry, SessionSummary, SessionTick};
