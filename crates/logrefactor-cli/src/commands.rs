//! Subcommand definitions and execution

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use logrefactor_core::{TemplateConfig, TransformSummary, DEFAULT_PATTERN, VERSION};

/// Available commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Scan a tree and write the catalog
    Collect {
        path: PathBuf,
        output: PathBuf,
        pattern: String,
    },
    /// Apply an edited catalog
    Transform {
        input: PathBuf,
        path: PathBuf,
        dry_run: bool,
        config: Option<PathBuf>,
        auto_map: bool,
    },
}

pub fn build_cli() -> Command {
    Command::new("logrefactor")
        .version(VERSION)
        .about("Migrate Go format-string log calls to structured logging")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("collect")
                .about("Scan a source tree and write a CSV catalog of log calls")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_name("DIR")
                        .help("Root of the source tree")
                        .default_value("."),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("CSV")
                        .help("Catalog file to write")
                        .default_value("log_entries.csv"),
                )
                .arg(
                    Arg::new("pattern")
                        .long("pattern")
                        .value_name("REGEX")
                        .help("Callee names to match")
                        .default_value(DEFAULT_PATTERN),
                ),
        )
        .subcommand(
            Command::new("transform")
                .about("Rewrite log calls according to an edited catalog")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .value_name("CSV")
                        .help("Edited catalog")
                        .default_value("log_entries.csv"),
                )
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_name("DIR")
                        .help("Root the catalog's relative paths resolve against")
                        .default_value("."),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Show the changes without writing files")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_name("JSON")
                        .help("Output style configuration (defaults to slog)"),
                )
                .arg(
                    Arg::new("no-auto-map")
                        .long("no-auto-map")
                        .help("Only render fields given in StructuredFieldOverride")
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Turn parsed arguments into a command
pub fn parse_command(matches: &ArgMatches) -> Result<CliCommand> {
    let path_arg = |m: &ArgMatches, name: &str| -> Result<PathBuf> {
        m.get_one::<String>(name)
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("missing --{name}"))
    };

    match matches.subcommand() {
        Some(("collect", m)) => Ok(CliCommand::Collect {
            path: path_arg(m, "path")?,
            output: path_arg(m, "output")?,
            pattern: m
                .get_one::<String>("pattern")
                .cloned()
                .unwrap_or_else(|| DEFAULT_PATTERN.to_string()),
        }),
        Some(("transform", m)) => Ok(CliCommand::Transform {
            input: path_arg(m, "input")?,
            path: path_arg(m, "path")?,
            dry_run: m.get_flag("dry-run"),
            config: m.get_one::<String>("config").map(PathBuf::from),
            auto_map: !m.get_flag("no-auto-map"),
        }),
        Some((other, _)) => Err(anyhow!("Unknown command: {other}")),
        None => Err(anyhow!("No command given")),
    }
}

/// Run a command, printing to `out`. Returns false when any file failed.
pub fn execute(command: &CliCommand, out: &mut impl Write) -> Result<bool> {
    match command {
        CliCommand::Collect {
            path,
            output,
            pattern,
        } => {
            let count = logrefactor_core::collect(path, output, pattern)?;
            writeln!(out, "Collected {count} log calls into {}", output.display())?;
            Ok(true)
        }
        CliCommand::Transform {
            input,
            path,
            dry_run,
            config,
            auto_map,
        } => {
            let config = TemplateConfig::load(config.as_deref())?;
            let summary = logrefactor_core::transform(input, path, *dry_run, &config, *auto_map)?;
            print_summary(&summary, *dry_run, out)?;
            Ok(summary.success())
        }
    }
}

fn print_summary(summary: &TransformSummary, dry_run: bool, out: &mut impl Write) -> Result<()> {
    for file in &summary.files {
        for modification in &file.modifications {
            writeln!(out, "{modification}")?;
        }
        if file.changed {
            let verb = if dry_run { "Would update" } else { "Updated" };
            writeln!(out, "{verb}: {}", file.path.display())?;
        }
    }

    for error in &summary.errors {
        writeln!(out, "Error: {error}")?;
    }

    writeln!(
        out,
        "{} entries applied, {} skipped; {} of {} files {}",
        summary.entries_applied,
        summary.entries_skipped,
        summary.files_changed,
        summary.files_processed,
        if dry_run { "would change" } else { "changed" }
    )?;
    Ok(())
}
