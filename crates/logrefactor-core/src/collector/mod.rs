/*!
# Collector

Walks a Go source tree, finds call expressions whose callee name matches the
operator's pattern, and turns each into a [`CallSiteRecord`].

Identifiers come from one counter shared by every file of a run, so their
order follows file-visit order and is stable for a given tree. Files are
visited in file-name order.
*/

pub mod arguments;

pub use arguments::{analyze_call, extract_format_verbs, infer_type, suggest_key, CallAnalysis};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::ast::{AstWalker, CalleePattern, Position};
use crate::catalog::{self, CallSiteRecord, Level};
use crate::error::{RefactorError, Result};
use crate::parser::{GoParser, ParsedSource, Parser};

/// Call-site scanner with a run-wide identifier counter
pub struct Collector {
    parser: Box<dyn Parser>,
    pattern: CalleePattern,
    next_id: usize,
    skipped: Vec<String>,
}

impl Collector {
    /// Compile `pattern` once for the whole run
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            parser: Box::new(GoParser::new()?),
            pattern: CalleePattern::new(pattern)?,
            next_id: 1,
            skipped: Vec::new(),
        })
    }

    /// Use a different source parser
    pub fn with_parser(mut self, parser: Box<dyn Parser>) -> Self {
        self.parser = parser;
        self
    }

    /// Scan every matching source file under `root` (or `root` itself when
    /// it is a file). Unparsable files are skipped with a warning.
    pub fn scan_path(&mut self, root: &Path) -> Result<Vec<CallSiteRecord>> {
        if !root.exists() {
            return Err(RefactorError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "path does not exist"),
            ));
        }

        let mut records = Vec::new();
        for path in self.source_files(root)? {
            match self.scan_file(&path) {
                Ok(found) => records.extend(found),
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    self.skipped.push(format!("{}: {e}", path.display()));
                }
            }
        }

        info!(
            "collected {} call sites from {} ({} files skipped)",
            records.len(),
            root.display(),
            self.skipped.len()
        );
        Ok(records)
    }

    /// Parse and scan one file
    pub fn scan_file(&mut self, path: &Path) -> Result<Vec<CallSiteRecord>> {
        let parsed = self.parser.parse_file(path)?;
        Ok(self.scan_source(path, &parsed))
    }

    /// Scan an already parsed file. Records are returned in document order.
    pub fn scan_source(&mut self, path: &Path, parsed: &ParsedSource) -> Vec<CallSiteRecord> {
        let source = parsed.bytes();
        let package = parsed.package_name();
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for call in AstWalker::find_all(parsed.root(), source, &self.pattern) {
            let position = call.start();
            // A chained call shares its start with the inner call, keep the outer one
            if !seen.insert(position) {
                debug!("{}:{position}: nested call at the same position skipped", path.display());
                continue;
            }

            let callee = call.callee_name(source);
            let analysis = analyze_call(&call, source);
            records.push(self.record(path, position, &package, callee, analysis));
        }

        records
    }

    /// Files and directories that failed during the last scans
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    fn record(
        &mut self,
        path: &Path,
        position: Position,
        package: &str,
        callee: String,
        analysis: CallAnalysis,
    ) -> CallSiteRecord {
        let id = CallSiteRecord::format_id(self.next_id);
        self.next_id += 1;

        CallSiteRecord {
            id,
            file_path: path.to_path_buf(),
            line: position.line,
            column: position.column,
            package: package.to_string(),
            level: Level::classify(&callee),
            original_callee: callee,
            message_template: analysis.message_template,
            arguments: analysis.arguments,
            new_callee: String::new(),
            new_message: String::new(),
            field_override: String::new(),
            notes: String::new(),
        }
    }

    fn source_files(&mut self, root: &Path) -> Result<Vec<PathBuf>> {
        let extensions = self.parser.extensions();
        let mut files = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("cannot read directory entry: {e}");
                    self.skipped.push(e.to_string());
                    continue;
                }
            };

            let path = entry.path();
            let wanted = entry.file_type().is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.contains(&ext));
            if wanted {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }
}

/// Scan `root` for call sites whose callee matches `pattern`.
///
/// Fails with `InvalidPattern` before reading anything if the pattern does
/// not compile.
pub fn scan(root: &Path, pattern: &str) -> Result<Vec<CallSiteRecord>> {
    let mut collector = Collector::new(pattern)?;
    collector.scan_path(root)
}

/// Scan `root` and export the catalog to `output`. Returns the record count.
pub fn collect(root: &Path, output: &Path, pattern: &str) -> Result<usize> {
    let records = scan(root, pattern)?;
    catalog::export_csv(&records, output)?;
    Ok(records.len())
}
