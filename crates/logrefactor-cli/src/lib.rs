//! Logrefactor CLI - command parsing and report printing for the
//! `logrefactor` binary
//!
//! The binary stays a thin shell: [`build_cli`] defines the arguments,
//! [`parse_command`] turns matches into a [`CliCommand`], and [`execute`]
//! runs it against any writer so tests can capture the output.

pub mod commands;

pub use commands::{build_cli, execute, parse_command, CliCommand};
