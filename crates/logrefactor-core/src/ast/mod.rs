// Typed views over tree-sitter Go syntax nodes
// The scanner and the patcher both walk call expressions through these views,
// so position and span rules live in one place.

pub mod patterns;
pub mod source_gen;

pub use patterns::{AstPattern, AstWalker, CalleePattern, PositionPattern};
pub use source_gen::{collapse_whitespace, render, ToSource};

use std::fmt;
use std::ops::Range;

use tree_sitter::Node;

/// 1-based line and byte column of a node's first character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn start_of(node: Node) -> Self {
        let point = node.start_position();
        Self::new(point.row + 1, point.column + 1)
    }

    pub fn end_of(node: Node) -> Self {
        let point = node.end_position();
        Self::new(point.row + 1, point.column + 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A call expression split into callee and arguments
#[derive(Debug, Clone)]
pub struct CallExpr<'t> {
    pub node: Node<'t>,
    pub function: Node<'t>,
    pub arguments: Vec<Node<'t>>,
}

impl<'t> CallExpr<'t> {
    /// View `node` as a call, if it is one
    pub fn from_node(node: Node<'t>) -> Option<Self> {
        if node.kind() != "call_expression" {
            return None;
        }
        let function = node.child_by_field_name("function")?;
        let arguments = node
            .child_by_field_name("arguments")
            .map(|list| {
                let mut cursor = list.walk();
                list.named_children(&mut cursor)
                    .filter(|arg| !arg.is_extra())
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            node,
            function,
            arguments,
        })
    }

    pub fn start(&self) -> Position {
        Position::start_of(self.node)
    }

    pub fn end(&self) -> Position {
        Position::end_of(self.node)
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.node.start_byte()..self.node.end_byte()
    }

    /// Canonical callee name: `receiver.method` when the callee is a member
    /// access on a plain identifier, otherwise the rendered callee.
    pub fn callee_name(&self, source: &[u8]) -> String {
        if self.function.kind() == "selector_expression" {
            let operand = self.function.child_by_field_name("operand");
            let field = self.function.child_by_field_name("field");
            if let (Some(operand), Some(field)) = (operand, field) {
                if operand.kind() == "identifier" {
                    return format!("{}.{}", node_text(operand, source), node_text(field, source));
                }
            }
        }
        render(self.function, source)
    }
}

/// Source text of a node; empty when the span is not valid UTF-8
pub fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or_default()
}

/// True for Go string literal nodes, interpreted or raw
pub fn is_string_literal(node: Node) -> bool {
    matches!(
        node.kind(),
        "interpreted_string_literal" | "raw_string_literal"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{GoParser, Parser};
    use std::path::Path;

    fn parse(src: &str) -> crate::parser::ParsedSource {
        let mut parser = GoParser::new().unwrap();
        parser.parse(src.to_string(), Path::new("t.go")).unwrap()
    }

    #[test]
    fn callee_name_joins_receiver_and_method() {
        let parsed = parse("package main\n\nfunc f() {\n\tlog.Printf(\"x %d\", 1)\n}\n");
        let calls = AstWalker::calls(parsed.root());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].callee_name(parsed.bytes()), "log.Printf");
        assert_eq!(calls[0].start(), Position::new(4, 2));
        assert_eq!(calls[0].arguments.len(), 2);
    }

    #[test]
    fn chained_callee_falls_back_to_rendering() {
        let parsed =
            parse("package main\n\nfunc f() {\n\tlogger.WithField(\"k\", v).Info(\"done\")\n}\n");
        let calls = AstWalker::calls(parsed.root());
        // outer call first, document order
        assert_eq!(
            calls[0].callee_name(parsed.bytes()),
            "logger.WithField(\"k\", v).Info"
        );
        assert_eq!(calls[1].callee_name(parsed.bytes()), "logger.WithField");
    }
}
