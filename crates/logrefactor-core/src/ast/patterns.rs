/*!
# Call Pattern Matching Utilities

Predicates over call expressions and a document-order walker that collects
the calls matching them. The scanner matches on callee names; the patcher
matches on start positions.
*/

use std::collections::HashSet;

use regex::Regex;
use tree_sitter::Node;

use super::{CallExpr, Position};
use crate::error::Result;

/// Pattern matcher for call expressions
pub trait AstPattern {
    /// Check if this pattern matches the given call
    fn matches(&self, call: &CallExpr, source: &[u8]) -> bool;
}

/// Matches calls whose canonical callee name contains a regex match.
///
/// Compiled once per run and shared across files.
#[derive(Debug, Clone)]
pub struct CalleePattern {
    regex: Regex,
}

impl CalleePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn is_match(&self, callee: &str) -> bool {
        self.regex.is_match(callee)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl AstPattern for CalleePattern {
    fn matches(&self, call: &CallExpr, source: &[u8]) -> bool {
        self.is_match(&call.callee_name(source))
    }
}

/// Matches calls starting at one of a set of positions
pub struct PositionPattern {
    positions: HashSet<Position>,
}

impl PositionPattern {
    pub fn new(positions: impl IntoIterator<Item = Position>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
        }
    }
}

impl AstPattern for PositionPattern {
    fn matches(&self, call: &CallExpr, _source: &[u8]) -> bool {
        self.positions.contains(&call.start())
    }
}

/// Utility for deep tree traversal and pattern matching
pub struct AstWalker;

impl AstWalker {
    /// Every call expression under `root`, in document (pre-) order
    pub fn calls(root: Node<'_>) -> Vec<CallExpr<'_>> {
        let mut calls = Vec::new();
        let mut cursor = root.walk();

        loop {
            if let Some(call) = CallExpr::from_node(cursor.node()) {
                calls.push(call);
            }

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return calls;
                }
            }
        }
    }

    /// Find all calls matching a pattern, in document order
    pub fn find_all<'t, P: AstPattern>(
        root: Node<'t>,
        source: &[u8],
        pattern: &P,
    ) -> Vec<CallExpr<'t>> {
        Self::calls(root)
            .into_iter()
            .filter(|call| pattern.matches(call, source))
            .collect()
    }

    /// Find the first call matching a pattern
    pub fn find_first<'t, P: AstPattern>(
        root: Node<'t>,
        source: &[u8],
        pattern: &P,
    ) -> Option<CallExpr<'t>> {
        Self::calls(root)
            .into_iter()
            .find(|call| pattern.matches(call, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{GoParser, Parser};
    use std::path::Path;

    const SOURCE: &str = r#"package main

func run() {
	log.Printf("a %d", 1)
	fmt.Println("not a log")
	logrus.Info("b")
}
"#;

    #[test]
    fn finds_matching_calls_in_order() {
        let mut parser = GoParser::new().unwrap();
        let parsed = parser.parse(SOURCE.to_string(), Path::new("m.go")).unwrap();
        let pattern = CalleePattern::new(r"log\.|logrus\.").unwrap();

        let found = AstWalker::find_all(parsed.root(), parsed.bytes(), &pattern);
        let names: Vec<_> = found.iter().map(|c| c.callee_name(parsed.bytes())).collect();
        assert_eq!(names, vec!["log.Printf", "logrus.Info"]);
    }

    #[test]
    fn position_pattern_selects_by_start() {
        let mut parser = GoParser::new().unwrap();
        let parsed = parser.parse(SOURCE.to_string(), Path::new("m.go")).unwrap();
        let pattern = PositionPattern::new([Position::new(6, 2)]);

        let call = AstWalker::find_first(parsed.root(), parsed.bytes(), &pattern).unwrap();
        assert_eq!(call.callee_name(parsed.bytes()), "logrus.Info");
    }

    #[test]
    fn invalid_regex_is_reported() {
        assert!(CalleePattern::new("log\\.(").is_err());
    }
}
