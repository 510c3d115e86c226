/*!
# Catalog

The editable table of discovered call sites. Records are produced by the
collector, exported to CSV for an operator to edit, and read back by the
transformer.
*/

pub mod resolve;
pub mod store;

pub use resolve::{parse_override, resolve_fields, serialize_fields};
pub use store::{export_csv, import_csv, write_csv, read_csv, CATALOG_COLUMNS};

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Log level inferred from a callee name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
    Unknown,
}

/// Level vocabulary in priority order. The first entry found as a
/// case-insensitive substring of the callee wins.
const LEVEL_VOCABULARY: &[(&str, Level)] = &[
    ("trace", Level::Trace),
    ("debug", Level::Debug),
    ("info", Level::Info),
    ("warn", Level::Warn),
    ("warning", Level::Warn),
    ("error", Level::Error),
    ("fatal", Level::Fatal),
    ("panic", Level::Panic),
];

/// Marker for print-style functions (`Printf`, `Println`), logged at info
const PRINT_MARKER: &str = "print";

impl Level {
    /// Classify a callee name such as `log.Fatalf` or `logger.Warning`
    pub fn classify(callee: &str) -> Self {
        let lower = callee.to_lowercase();
        LEVEL_VOCABULARY
            .iter()
            .find(|(word, _)| lower.contains(word))
            .map(|(_, level)| *level)
            .unwrap_or(if lower.contains(PRINT_MARKER) {
                Level::Info
            } else {
                Level::Unknown
            })
    }

    /// Parse a catalog cell; anything unrecognised is `Unknown`
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "trace" => Level::Trace,
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warn" | "warning" => Level::Warn,
            "error" => Level::Error,
            "fatal" => Level::Fatal,
            "panic" => Level::Panic,
            _ => Level::Unknown,
        }
    }

    /// Title-case name, as stored in the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "Trace",
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Warn => "Warn",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
            Level::Panic => "Panic",
            Level::Unknown => "Unknown",
        }
    }

    /// Level used when emitting code: `Unknown` has no logger method, so it
    /// is written as `Info`.
    pub fn effective(self) -> Self {
        match self {
            Level::Unknown => Level::Info,
            level => level,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic type of an argument expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Int,
    Float,
    Bool,
    Rune,
    Error,
    FuncResult,
    Nil,
    Unknown,
}

impl TypeTag {
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "string" => TypeTag::String,
            "int" => TypeTag::Int,
            "float" => TypeTag::Float,
            "bool" => TypeTag::Bool,
            "rune" => TypeTag::Rune,
            "error" => TypeTag::Error,
            "func_result" | "function-result" => TypeTag::FuncResult,
            "nil" => TypeTag::Nil,
            _ => TypeTag::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::Rune => "rune",
            TypeTag::Error => "error",
            TypeTag::FuncResult => "func_result",
            TypeTag::Nil => "nil",
            TypeTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analysis of one positional argument following the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCandidate {
    /// Zero-based position among the arguments after the message
    pub index: usize,
    pub expression: String,
    pub leaf_name: String,
    pub type_tag: TypeTag,
    /// Format verb paired by position, e.g. `%v`
    pub format_verb: Option<String>,
    pub suggested_key: String,
}

impl FieldCandidate {
    /// Catalog form: `key(type)=expression[verb]`
    pub fn to_detail(&self) -> String {
        let mut detail = format!("{}({})={}", self.suggested_key, self.type_tag, self.expression);
        if let Some(verb) = &self.format_verb {
            detail.push_str(&format!("[{verb}]"));
        }
        detail
    }

    /// Parse one `key(type)=expression[verb]` segment.
    ///
    /// The bracketed suffix is treated as a verb only when it starts with
    /// `%`, so `items[i]` keeps its index.
    pub fn parse_detail(index: usize, segment: &str) -> Option<Self> {
        static DETAIL: OnceLock<Regex> = OnceLock::new();
        let detail = DETAIL.get_or_init(|| {
            Regex::new(r"(?s)^(?P<key>[^(]*)\((?P<type>[^)]*)\)=(?P<expr>.*?)(?:\[(?P<verb>%[^\]]*)\])?$")
                .expect("argument detail pattern is valid")
        });

        let caps = detail.captures(segment.trim())?;
        let key = caps["key"].trim().to_string();
        let expression = caps["expr"].trim().to_string();
        if key.is_empty() || expression.is_empty() {
            return None;
        }

        Some(Self {
            index,
            leaf_name: leaf_of(&expression),
            type_tag: TypeTag::parse(&caps["type"]),
            format_verb: caps.name("verb").map(|v| v.as_str().to_string()),
            suggested_key: key,
            expression,
        })
    }
}

/// Trailing member segment of a rendered expression, without call parens
fn leaf_of(expression: &str) -> String {
    let head = expression.split('(').next().unwrap_or(expression);
    head.rsplit('.').next().unwrap_or(head).to_string()
}

/// Serialize candidates for the ArgumentDetails column
pub fn format_argument_details(arguments: &[FieldCandidate]) -> String {
    arguments
        .iter()
        .map(FieldCandidate::to_detail)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Split an ArgumentDetails cell on the `;` separators that sit outside
/// string, rune and raw literals and outside brackets.
fn split_details(details: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in details.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && open != '`' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                segments.push(&details[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&details[start..]);
    segments
}

/// Parse an ArgumentDetails cell. Segments that do not follow the
/// `key(type)=expression[verb]` shape are dropped.
pub fn parse_argument_details(details: &str) -> Vec<FieldCandidate> {
    split_details(details)
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            let parsed = FieldCandidate::parse_detail(0, segment);
            if parsed.is_none() {
                tracing::warn!("ignoring malformed argument detail `{segment}`");
            }
            parsed
        })
        .enumerate()
        .map(|(index, candidate)| FieldCandidate { index, ..candidate })
        .collect()
}

/// One discovered log invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSiteRecord {
    /// Stable identifier, `LOG-0001`
    pub id: String,
    pub file_path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub package: String,
    pub original_callee: String,
    pub level: Level,
    /// Message literal as written, quotes included
    pub message_template: String,
    pub arguments: Vec<FieldCandidate>,

    // Operator-editable columns
    pub new_callee: String,
    pub new_message: String,
    pub field_override: String,
    pub notes: String,
}

impl CallSiteRecord {
    pub fn format_id(sequence: usize) -> String {
        format!("LOG-{sequence:04}")
    }

    /// Rows with nothing to change are never rewritten
    pub fn is_noop(&self) -> bool {
        (self.new_message.is_empty() && self.new_callee.is_empty())
            || (self.new_message == self.message_template
                && self.new_callee == self.original_callee)
    }

    /// Level to render: one named by NewCallee wins over the scanned level
    pub fn target_level(&self) -> Level {
        if !self.new_callee.is_empty() {
            let level = Level::classify(&self.new_callee);
            if level != Level::Unknown {
                return level;
            }
        }
        self.level
    }

    /// Message to render: NewMessage, else the original template, with
    /// surrounding quote characters removed
    pub fn target_message(&self) -> String {
        let message = if self.new_message.is_empty() {
            &self.message_template
        } else {
            &self.new_message
        };
        message.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
    }
}

/// A resolved field, exactly as it will be rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub key: String,
    pub expression: String,
    #[serde(rename = "type", default = "unknown_type")]
    pub type_name: String,
}

fn unknown_type() -> String {
    TypeTag::Unknown.as_str().to_string()
}

impl FieldMapping {
    pub fn new(key: impl Into<String>, expression: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expression: expression.into(),
            type_name: type_name.into(),
        }
    }

    pub fn tag(&self) -> TypeTag {
        TypeTag::parse(&self.type_name)
    }
}

impl From<&FieldCandidate> for FieldMapping {
    fn from(candidate: &FieldCandidate) -> Self {
        Self::new(
            candidate.suggested_key.clone(),
            candidate.expression.clone(),
            candidate.type_tag.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_levels_by_priority() {
        assert_eq!(Level::classify("log.Printf"), Level::Info);
        assert_eq!(Level::classify("log.Fatalf"), Level::Fatal);
        assert_eq!(Level::classify("logger.Warning"), Level::Warn);
        assert_eq!(Level::classify("logrus.Errorf"), Level::Error);
        assert_eq!(Level::classify("logger.WithError(err).Info"), Level::Info);
        assert_eq!(Level::classify("log.Output"), Level::Unknown);
    }

    #[test]
    fn parses_level_cells() {
        assert_eq!(Level::parse("warning"), Level::Warn);
        assert_eq!(Level::parse("ERROR"), Level::Error);
        assert_eq!(Level::parse(""), Level::Unknown);
    }

    #[test]
    fn detail_roundtrips_through_catalog_form() {
        let candidate = FieldCandidate {
            index: 0,
            expression: "user.Name".to_string(),
            leaf_name: "Name".to_string(),
            type_tag: TypeTag::Unknown,
            format_verb: Some("%s".to_string()),
            suggested_key: "name".to_string(),
        };
        assert_eq!(candidate.to_detail(), "name(unknown)=user.Name[%s]");
        assert_eq!(FieldCandidate::parse_detail(0, &candidate.to_detail()), Some(candidate));
    }

    #[test]
    fn index_expressions_are_not_verbs() {
        let parsed = FieldCandidate::parse_detail(0, "items(unknown)=items[i]").unwrap();
        assert_eq!(parsed.expression, "items[i]");
        assert_eq!(parsed.format_verb, None);
    }

    #[test]
    fn parses_argument_detail_lists() {
        let parsed = parse_argument_details("error(error)=err[%v]; count(int)=n; garbage");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].index, 1);
        assert_eq!(parsed[1].suggested_key, "count");
        assert_eq!(parsed[1].type_tag, TypeTag::Int);
    }

    #[test]
    fn noop_rows_are_detected() {
        let mut record = CallSiteRecord {
            id: CallSiteRecord::format_id(1),
            file_path: "main.go".into(),
            line: 1,
            column: 1,
            package: "main".to_string(),
            original_callee: "log.Printf".to_string(),
            level: Level::Info,
            message_template: "\"hi\"".to_string(),
            arguments: Vec::new(),
            new_callee: String::new(),
            new_message: String::new(),
            field_override: String::new(),
            notes: String::new(),
        };
        assert_eq!(record.id, "LOG-0001");
        assert!(record.is_noop());

        record.new_message = "hello".to_string();
        assert!(!record.is_noop());
        assert_eq!(record.target_message(), "hello");

        record.new_callee = "logger.Warn".to_string();
        assert_eq!(record.target_level(), Level::Warn);
    }

    #[test]
    fn details_with_separators_inside_expressions_survive() {
        let expressions = [
            r#""a; b""#,
            r#"m[k](x, "y;z")"#,
            "';'",
            "`raw; \"text\"`",
            r#"fmt.Sprint("q\";", []int{1, 2}[0])"#,
            "func() { a(); return }()",
        ];
        let candidates: Vec<FieldCandidate> = expressions
            .iter()
            .enumerate()
            .map(|(index, expression)| FieldCandidate {
                index,
                expression: expression.to_string(),
                leaf_name: String::new(),
                type_tag: TypeTag::String,
                format_verb: (index % 2 == 0).then(|| "%v".to_string()),
                suggested_key: format!("arg{index}"),
            })
            .collect();

        let parsed = parse_argument_details(&format_argument_details(&candidates));
        let summary = |list: &[FieldCandidate]| -> Vec<(usize, String, String, Option<String>)> {
            list.iter()
                .map(|c| (c.index, c.suggested_key.clone(), c.expression.clone(), c.format_verb.clone()))
                .collect()
        };
        assert_eq!(summary(&parsed), summary(&candidates));
    }
}
