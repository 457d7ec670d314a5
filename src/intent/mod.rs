//! Intent taxonomy and LLM-backed classification.

pub mod classifier;
pub mod fence;
pub mod types;

pub use classifier::{IntentClassifier, parse_intent_reply};
pub use fence::strip_code_fence;
pub use types::Intent;
