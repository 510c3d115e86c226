// Parser module - wraps tree-sitter grammars behind a small trait
use std::path::Path;

use tree_sitter::Tree;

use crate::error::{RefactorError, Result};

/// A parsed source file: the text and the syntax tree built from it.
///
/// Node positions in `tree` refer to `source`, so the two always travel
/// together.
pub struct ParsedSource {
    pub source: String,
    pub tree: Tree,
}

impl ParsedSource {
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    /// Name from the file's `package` clause, empty if there is none
    pub fn package_name(&self) -> String {
        let root = self.root();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|child| child.kind() == "package_clause");

        let Some(clause) = clause else {
            return String::new();
        };

        let mut cursor = clause.walk();
        let name = clause
            .named_children(&mut cursor)
            .find(|child| child.kind() == "package_identifier")
            .and_then(|ident| ident.utf8_text(self.bytes()).ok())
            .map(str::to_string);
        name.unwrap_or_default()
    }
}

/// Trait for source-language parsers
pub trait Parser {
    /// Parse source text. `path` is only used for error reporting.
    fn parse(&mut self, source: String, path: &Path) -> Result<ParsedSource>;

    /// Read and parse a file
    fn parse_file(&mut self, path: &Path) -> Result<ParsedSource> {
        let source = std::fs::read_to_string(path).map_err(|e| RefactorError::io(path, e))?;
        self.parse(source, path)
    }

    /// File extensions this parser handles, without the dot
    fn extensions(&self) -> &'static [&'static str];

    /// Get parser name for debugging
    fn name(&self) -> &'static str;
}

/// Go parser using tree-sitter-go
pub struct GoParser {
    parser: tree_sitter::Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| RefactorError::Config(format!("failed to load Go grammar: {e}")))?;

        Ok(Self { parser })
    }
}

impl Parser for GoParser {
    fn parse(&mut self, source: String, path: &Path) -> Result<ParsedSource> {
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| RefactorError::parse(path, "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let position = first_error_position(root)
                .map(|(line, column)| format!(" near {line}:{column}"))
                .unwrap_or_default();
            return Err(RefactorError::parse(path, format!("syntax error{position}")));
        }

        Ok(ParsedSource { source, tree })
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn name(&self) -> &'static str {
        "go"
    }
}

/// 1-based position of the first error or missing node, in document order
fn first_error_position(node: tree_sitter::Node) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        let point = node.start_position();
        return Some((point.row + 1, point.column + 1));
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error_position)
}

/// Create a parser for a source language
pub fn create_parser(language: &str) -> Result<Box<dyn Parser>> {
    match language {
        "go" => Ok(Box::new(GoParser::new()?)),
        _ => Err(RefactorError::Config(format!(
            "unknown source language: {language}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_name() {
        let mut parser = GoParser::new().unwrap();
        let parsed = parser
            .parse("package billing\n\nfunc main() {}\n".to_string(), Path::new("a.go"))
            .unwrap();
        assert_eq!(parsed.package_name(), "billing");
    }

    #[test]
    fn reports_syntax_errors() {
        let mut parser = GoParser::new().unwrap();
        let err = parser
            .parse("package main\n\nfunc main( {\n".to_string(), Path::new("bad.go"))
            .err()
            .unwrap();
        assert!(matches!(err, RefactorError::Parse { .. }));
        assert!(err.to_string().contains("bad.go"));
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(create_parser("cobol").is_err());
        assert_eq!(create_parser("go").unwrap().name(), "go");
    }
}
