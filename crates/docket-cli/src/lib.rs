//! Docket CLI library.
//!
//! Argument parsing, command execution and terminal output for the `docket`
//! binary. The extraction itself lives in `docket-pipeline`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use error::{CliError, Result};
pub use output::Formatter;
