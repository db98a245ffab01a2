//! Wikiprobe CLI Library
//!
//! Command-line interface for running the Wikipedia suites.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{resolve_suites, Cli, ColorArg, Commands, FormatArg, ListArgs, RunArgs, SuiteArg};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, ProgressReporter, RunSummary};
pub use runner::RunPlan;
