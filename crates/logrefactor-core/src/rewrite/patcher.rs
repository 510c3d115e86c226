/*!
# Source Patcher

Replaces whole call expressions inside one file. The file is parsed again,
each requested position is matched against the start of a call, and the new
text is spliced in a single pass over the original content: untouched spans
are copied byte for byte, so formatting and comments outside the replaced
calls survive unchanged.

A replacement nested inside another replaced call is dropped and reported,
the enclosing one wins.
*/

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::ast::{collapse_whitespace, node_text, AstWalker, Position, PositionPattern};
use crate::error::{RefactorError, Result};
use crate::parser::{GoParser, Parser};

/// A requested replacement of the call starting at `position`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub id: String,
    pub position: Position,
    pub replacement: String,
}

/// A replacement that was spliced into the content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    pub id: String,
    pub start: Position,
    pub end: Position,
    /// Replaced call text, whitespace collapsed
    pub original: String,
    pub replacement: String,
}

/// Result of patching one file
#[derive(Debug, Clone, Default)]
pub struct PatchOutcome {
    pub content: String,
    pub applied: Vec<AppliedEdit>,
    /// No call starts at the requested position
    pub unmatched: Vec<Edit>,
    /// Overlaps a replacement that was already applied
    pub overlapping: Vec<Edit>,
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Position-keyed call replacer
pub struct SourcePatcher {
    parser: Box<dyn Parser>,
}

impl SourcePatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: Box::new(GoParser::new()?),
        })
    }

    /// Apply `edits` to `source`. Fails only when the source does not parse.
    pub fn patch(&mut self, path: &Path, source: String, edits: Vec<Edit>) -> Result<PatchOutcome> {
        let parsed = self.parser.parse(source, path)?;
        let bytes = parsed.bytes();

        let mut pending: HashMap<Position, Edit> = HashMap::with_capacity(edits.len());
        for edit in edits {
            if let Some(previous) = pending.insert(edit.position, edit) {
                warn!("{}:{}: duplicate replacement {} ignored", path.display(), previous.position, previous.id);
            }
        }

        let pattern = PositionPattern::new(pending.keys().copied());
        let mut spans: Vec<(Range<usize>, String)> = Vec::new();
        let mut applied = Vec::new();
        let mut overlapping = Vec::new();
        let mut covered_until = 0usize;

        // Pre-order walk: an enclosing call comes before anything inside it
        for call in AstWalker::find_all(parsed.root(), bytes, &pattern) {
            let Some(edit) = pending.remove(&call.start()) else {
                // Inner call of a chain sharing the start position
                continue;
            };

            let range = call.byte_range();
            if range.start < covered_until {
                warn!(
                    "{}:{}: {} lies inside another replaced call, skipped",
                    path.display(),
                    edit.position,
                    edit.id
                );
                overlapping.push(edit);
                continue;
            }

            debug!("{}:{}: replacing call for {}", path.display(), edit.position, edit.id);
            covered_until = range.end;
            applied.push(AppliedEdit {
                id: edit.id,
                start: call.start(),
                end: call.end(),
                original: collapse_whitespace(node_text(call.node, bytes)),
                replacement: edit.replacement.clone(),
            });
            spans.push((range, edit.replacement));
        }

        let mut unmatched: Vec<Edit> = pending.into_values().collect();
        unmatched.sort_by_key(|edit| edit.position);
        for edit in &unmatched {
            warn!("{}:{}: no call found for {}", path.display(), edit.position, edit.id);
        }

        let content = splice(&parsed.source, &spans);
        Ok(PatchOutcome {
            content,
            applied,
            unmatched,
            overlapping,
        })
    }
}

/// Copy `source`, substituting each range. Ranges must be sorted and
/// disjoint.
pub fn splice(source: &str, spans: &[(Range<usize>, String)]) -> String {
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for (range, replacement) in spans {
        output.push_str(&source[cursor..range.start]);
        output.push_str(replacement);
        cursor = range.end;
    }
    output.push_str(&source[cursor..]);
    output
}

/// Replace `path` with `content` through a temporary file in the same
/// directory, keeping the original permissions.
pub fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path).map_err(|e| RefactorError::io(path, e))?.permissions();

    let mut file = NamedTempFile::new_in(dir).map_err(|e| RefactorError::io(dir, e))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| RefactorError::io(file.path(), e))?;
    fs::set_permissions(file.path(), permissions).map_err(|e| RefactorError::io(file.path(), e))?;
    file.persist(path).map_err(|e| RefactorError::io(path, e.error))?;
    Ok(())
}
