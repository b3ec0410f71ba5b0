pub mod engine;
pub mod feedback;
pub mod gates;
pub mod history;
pub mod selector;
pub mod types;

pub use engine::PolicyEngine;
pub use feedback::{adjust_cooldown, ResponseTally};
pub use gates::{candidate_classes, Abstention};
pub use selector::InterventionSelector;
pub use types::*;
