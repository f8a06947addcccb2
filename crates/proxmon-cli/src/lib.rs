// proxmon-cli: Clap entry point, interactive console, settings, tables
// Depends on proxmon-core, proxmon-runtime

pub mod commands;
pub mod console;
pub mod display;
pub mod logging;
pub mod router;
pub mod settings;
pub mod ui;

pub use commands::run;
