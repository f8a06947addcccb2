//! # proxmon: Interactive console for Proxmox VE clusters
//!
//! Facade crate that re-exports the proxmon workspace crates so consumers
//! can depend on a single `proxmon` library.
//!
//! ## Crate breakdown
//!
//! | Module | Crate | Purpose |
//! |--------|-------|---------|
//! | [`core`] | proxmon-core | Resource/node model, outcomes, errors, config, poll policy |
//! | [`runtime`] | proxmon-runtime | Gateway, resource directory, action orchestrator |
//! | [`cli`] | proxmon-cli | Command router, console loop, settings, tables |

pub use proxmon_cli as cli;
pub use proxmon_core as core;
pub use proxmon_runtime as runtime;
