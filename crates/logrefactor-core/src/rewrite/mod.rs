/*!
# Transformer

Applies an edited catalog to a source tree. Catalog entries are grouped by
file; every entry with a change becomes one generated call, and each file is
patched in one pass. Failures are kept local: a bad entry skips that entry,
a file that cannot be read or parsed skips that file. Only configuration and
catalog problems stop the run, and both are detected before any file is
opened.

With `dry_run` every step runs except the final write.
*/

pub mod patcher;
pub mod styles;
pub mod template;

pub use patcher::{splice, write_atomically, AppliedEdit, Edit, PatchOutcome, SourcePatcher};
pub use styles::{escape_quotes, CallGenerator, CallRenderer, LogCall, RenderError};
pub use template::TemplateStyle;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::ast::Position;
use crate::catalog::{self, CallSiteRecord};
use crate::config::TemplateConfig;
use crate::error::{RefactorError, Result};

/// Longest preview line, including the trailing ellipsis
const PREVIEW_WIDTH: usize = 80;

/// One replaced call, for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub id: String,
    pub path: PathBuf,
    pub position: Position,
    pub old: String,
    pub new: String,
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}:{} [{}]", self.path.display(), self.position, self.id)?;
        writeln!(f, "  Old: {}", preview(&self.old))?;
        write!(f, "  New: {}", preview(&self.new))
    }
}

/// Outcome for one source file
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: PathBuf,
    pub modifications: Vec<Modification>,
    /// Content differs from the file on disk
    pub changed: bool,
    /// Content was written back
    pub written: bool,
}

/// Summary of a transform run
#[derive(Debug, Default)]
pub struct TransformSummary {
    pub files_processed: u64,
    pub files_changed: u64,
    pub entries_applied: u64,
    pub entries_skipped: u64,
    pub files: Vec<FileReport>,
    /// Entry-level problems; the run still succeeds
    pub warnings: Vec<String>,
    /// File-level failures
    pub errors: Vec<String>,
}

impl TransformSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: TransformSummary) {
        self.files_processed += other.files_processed;
        self.files_changed += other.files_changed;
        self.entries_applied += other.entries_applied;
        self.entries_skipped += other.entries_skipped;
        self.files.extend(other.files);
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn modifications(&self) -> impl Iterator<Item = &Modification> {
        self.files.iter().flat_map(|file| file.modifications.iter())
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.entries_applied + self.entries_skipped;
        if total == 0 {
            0.0
        } else {
            (self.entries_applied as f64) / (total as f64)
        }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    fn skip(&mut self, message: String) {
        warn!("{message}");
        self.entries_skipped += 1;
        self.warnings.push(message);
    }
}

/// Catalog-driven rewriter
pub struct Transformer {
    generator: CallGenerator,
    patcher: SourcePatcher,
    dry_run: bool,
    auto_map: bool,
}

impl Transformer {
    /// Fails with `Config` when the style or template is unusable
    pub fn new(config: &TemplateConfig) -> Result<Self> {
        Ok(Self {
            generator: CallGenerator::from_config(config)?,
            patcher: SourcePatcher::new()?,
            dry_run: false,
            auto_map: true,
        })
    }

    /// Report without writing
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Derive fields from analyzed arguments when an entry has no override
    pub fn auto_map(mut self, auto_map: bool) -> Self {
        self.auto_map = auto_map;
        self
    }

    pub fn generator(&self) -> &CallGenerator {
        &self.generator
    }

    /// Load `catalog_path` and apply it to files under `root`
    pub fn transform_catalog(&mut self, catalog_path: &Path, root: &Path) -> Result<TransformSummary> {
        let records = catalog::import_csv(catalog_path)?;
        info!(
            "applying {} catalog entries from {} ({} style{})",
            records.len(),
            catalog_path.display(),
            self.generator.style(),
            if self.dry_run { ", dry run" } else { "" }
        );
        Ok(self.transform_records(records, root))
    }

    /// Apply already loaded entries. File paths are used as given when they
    /// exist, otherwise resolved against `root`.
    pub fn transform_records(&mut self, records: Vec<CallSiteRecord>, root: &Path) -> TransformSummary {
        let mut summary = TransformSummary::new();
        let mut by_file: IndexMap<PathBuf, Vec<CallSiteRecord>> = IndexMap::new();
        let mut seen = HashSet::new();

        for record in records {
            if record.is_noop() {
                debug!("{}: no change requested", record.id);
                continue;
            }
            let path = resolve_path(root, &record.file_path);
            if !seen.insert((path.clone(), record.line, record.column)) {
                summary.skip(format!(
                    "{}: duplicate entry for {}:{}:{}",
                    record.id,
                    path.display(),
                    record.line,
                    record.column
                ));
                continue;
            }
            by_file.entry(path).or_default().push(record);
        }

        for (path, records) in by_file {
            summary.files_processed += 1;
            match self.transform_file(&path, &records) {
                Ok(file_summary) => summary.merge(file_summary),
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    summary.entries_skipped += records.len() as u64;
                    summary.errors.push(e.to_string());
                }
            }
        }

        info!(
            "{} entries applied, {} skipped, {} of {} files {}",
            summary.entries_applied,
            summary.entries_skipped,
            summary.files_changed,
            summary.files_processed,
            if self.dry_run { "would change" } else { "changed" }
        );
        summary
    }

    /// Patch one file with its entries. Errors here are read, parse and
    /// write failures for the file as a whole.
    pub fn transform_file(&mut self, path: &Path, records: &[CallSiteRecord]) -> Result<TransformSummary> {
        let mut summary = TransformSummary::new();
        let source = fs::read_to_string(path).map_err(|e| RefactorError::io(path, e))?;

        let mut edits = Vec::with_capacity(records.len());
        for record in records {
            match self.generator.generate(record, self.auto_map) {
                Ok(replacement) => edits.push(Edit {
                    id: record.id.clone(),
                    position: Position::new(record.line, record.column),
                    replacement,
                }),
                Err(e) => summary.skip(e.to_string()),
            }
        }

        let mut report = FileReport {
            path: path.to_path_buf(),
            ..FileReport::default()
        };
        if edits.is_empty() {
            summary.files.push(report);
            return Ok(summary);
        }

        let original = source.clone();
        let outcome = self.patcher.patch(path, source, edits)?;
        for edit in outcome.unmatched.iter() {
            summary.skip(format!("{}: no call starts at {}:{}", edit.id, path.display(), edit.position));
        }
        for edit in outcome.overlapping.iter() {
            summary.skip(format!("{}: nested inside another replaced call in {}", edit.id, path.display()));
        }

        summary.entries_applied += outcome.applied.len() as u64;
        report.modifications = outcome
            .applied
            .into_iter()
            .map(|applied| Modification {
                id: applied.id,
                path: path.to_path_buf(),
                position: applied.start,
                old: applied.original,
                new: applied.replacement,
            })
            .collect();

        report.changed = outcome.content != original;
        if report.changed {
            summary.files_changed += 1;
            if !self.dry_run {
                write_atomically(path, &outcome.content)?;
                report.written = true;
                debug!("wrote {}", path.display());
            }
        }

        summary.files.push(report);
        Ok(summary)
    }
}

/// Apply the catalog at `catalog_path` to the tree at `root`.
///
/// Returns `Config` or `Catalog` errors before any file is touched; all
/// other problems are collected in the summary.
pub fn transform(
    catalog_path: &Path,
    root: &Path,
    dry_run: bool,
    config: &TemplateConfig,
    auto_map: bool,
) -> Result<TransformSummary> {
    Transformer::new(config)?
        .dry_run(dry_run)
        .auto_map(auto_map)
        .transform_catalog(catalog_path, root)
}

fn resolve_path(root: &Path, file_path: &Path) -> PathBuf {
    if file_path.is_absolute() || file_path.exists() {
        file_path.to_path_buf()
    } else {
        root.join(file_path)
    }
}

/// First line of `text`, cut to the preview width
pub fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= PREVIEW_WIDTH {
        return line.to_string();
    }
    let cut: String = line.chars().take(PREVIEW_WIDTH - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Level;
    use crate::config::OutputStyle;
    use pretty_assertions::assert_eq;

    fn record(id: &str, file: &Path, line: usize, column: usize, new_message: &str) -> CallSiteRecord {
        CallSiteRecord {
            id: id.to_string(),
            file_path: file.to_path_buf(),
            line,
            column,
            package: "main".to_string(),
            original_callee: "log.Printf".to_string(),
            level: Level::Info,
            message_template: "\"x %d\"".to_string(),
            arguments: catalog::parse_argument_details("n(unknown)=n[%d]"),
            new_callee: String::new(),
            new_message: new_message.to_string(),
            field_override: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn preview_truncates_long_lines() {
        assert_eq!(preview("short\nsecond"), "short");
        let long = "x".repeat(100);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), 80);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn noop_entries_never_touch_files() {
        let mut transformer = Transformer::new(&TemplateConfig::default()).unwrap();
        let summary = transformer.transform_records(
            vec![record("LOG-0001", Path::new("missing/main.go"), 1, 1, "")],
            Path::new("."),
        );
        assert_eq!(summary.files_processed, 0);
        assert!(summary.success());
    }

    #[test]
    fn unreadable_file_is_a_file_error() {
        let mut transformer = Transformer::new(&TemplateConfig::new(OutputStyle::Zap, "log")).unwrap();
        let summary = transformer.transform_records(
            vec![record("LOG-0001", Path::new("does/not/exist.go"), 4, 2, "changed")],
            Path::new("/nonexistent-root"),
        );
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.entries_skipped, 1);
        assert!(!summary.success());
    }

    #[test]
    fn duplicate_positions_keep_the_first_entry() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("main.go");
        fs::write(&path, "package main\n\nfunc f() {\n\tlog.Printf(\"x %d\", n)\n}\n")?;

        let mut transformer = Transformer::new(&TemplateConfig::new(OutputStyle::Zap, "log"))?;
        let summary = transformer.transform_records(
            vec![
                record("LOG-0001", &path, 4, 2, "first"),
                record("LOG-0002", &path, 4, 2, "second"),
            ],
            dir.path(),
        );

        assert_eq!(summary.entries_applied, 1);
        assert_eq!(summary.entries_skipped, 1);
        assert_eq!(
            fs::read_to_string(&path)?,
            "package main\n\nfunc f() {\n\tlog.Info(\"first\", zap.Any(\"n\", n))\n}\n"
        );
        Ok(())
    }
}
