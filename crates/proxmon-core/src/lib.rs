// proxmon-core: Pure types, config, poll policy, formatting
// No internal proxmon dependencies; this is the foundation crate.

pub mod config;
pub mod error;
pub mod node;
pub mod outcome;
pub mod resource;
pub mod retry;
pub mod time;
