// asadm - offline cluster reports.
//
// A captured snapshot stands in for the info client: the engine crate turns
// its per-node dictionaries into summaries, feature tables, stop-writes
// diagnoses and histograms; the sheet engine here lays per-node listings out
// as row-style tables.

mod args;
mod commands;
pub mod config;
mod handlers;
pub mod logging;
pub mod presentation;
pub mod snapshot;
pub mod types;

pub use args::{Cli, Commands, ConfigCommand};
pub use commands::run;
