//! Concrete resolution plugins, one per vendor/check, plus the terminal
//! decider. Standard chain order: knowledge-based addresses, state ID,
//! device fraud, decider.

mod decider;
mod device_fraud;
mod kbv;
mod state_id;

pub use decider::DeciderPlugin;
pub use device_fraud::DeviceFraudPlugin;
pub use kbv::KnowledgeBasedPlugin;
pub use state_id::StateIdPlugin;
