//! CLI domain: argument parsing and command routing.

mod parse;
mod route;

pub use parse::{Cli, Commands, ComposeArgs};
pub use route::{apply_cli_overrides, compose_output, load_config};
