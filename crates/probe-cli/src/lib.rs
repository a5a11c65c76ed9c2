//! storefront-probe CLI library
//!
//! Argument parsing, logging setup, terminal output and the suite runner
//! behind the `storefront-probe` binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{
    CartAction, CartArgs, Cli, ColorArg, Commands, ConfigAction, ConfigArgs, RunArgs, SuiteTarget,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{summary_line, Reporter};
pub use runner::{render_response, ProbeRunner, RunReport};
