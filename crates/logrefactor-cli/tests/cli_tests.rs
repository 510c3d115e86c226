use std::fs;

use logrefactor::{execute, CliCommand};
use logrefactor_core::{catalog, DEFAULT_PATTERN};
use tempfile::TempDir;

const SOURCE: &str = "package main\n\nfunc run(err error) {\n\tlog.Printf(\"error: %v\", err)\n}\n";

#[test]
fn test_collect_then_dry_run_transform() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let file = dir.path().join("main.go");
    fs::write(&file, SOURCE)?;
    let csv = dir.path().join("log_entries.csv");

    let mut out = Vec::new();
    let ok = execute(
        &CliCommand::Collect {
            path: dir.path().to_path_buf(),
            output: csv.clone(),
            pattern: DEFAULT_PATTERN.to_string(),
        },
        &mut out,
    )?;
    assert!(ok);
    assert!(String::from_utf8(out)?.starts_with("Collected 1 log calls"));

    let mut records = catalog::import_csv(&csv)?;
    records[0].new_message = "Failed to process request".to_string();
    catalog::export_csv(&records, &csv)?;

    let mut out = Vec::new();
    let ok = execute(
        &CliCommand::Transform {
            input: csv,
            path: dir.path().to_path_buf(),
            dry_run: true,
            config: None,
            auto_map: true,
        },
        &mut out,
    )?;
    let printed = String::from_utf8(out)?;

    assert!(ok);
    assert!(printed.contains("  Old: log.Printf(\"error: %v\", err)"));
    assert!(printed.contains("  New: log.info(\"Failed to process request\", slog.Any(\"error\", err))"));
    assert!(printed.contains("Would update: "));
    assert_eq!(fs::read_to_string(&file)?, SOURCE);
    Ok(())
}

#[test]
fn test_missing_catalog_is_an_error() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let result = execute(
        &CliCommand::Transform {
            input: dir.path().join("absent.csv"),
            path: dir.path().to_path_buf(),
            dry_run: false,
            config: None,
            auto_map: true,
        },
        &mut Vec::new(),
    );
    assert!(result.is_err());
    Ok(())
}
