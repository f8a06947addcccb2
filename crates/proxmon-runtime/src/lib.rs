// proxmon-runtime: Gateway, resource directory, action orchestration
// Depends on proxmon-core

pub mod directory;
pub mod gateway;
pub mod orchestrator;

pub use directory::Snapshot;
pub use gateway::Gateway;
pub use orchestrator::{Action, ActionKind, Orchestrator};
