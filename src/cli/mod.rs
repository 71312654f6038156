mod commands;
mod context;
mod io;
pub mod output;
mod shell;
pub mod terminal;

pub use context::{CliError, CliMode, CliOptions, FAIL_SUBMISSIONS_ENV};
pub use shell::{run_cli, SCRIPT_MODE_ENV};
