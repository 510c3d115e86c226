// Canonical source rendering for Go expression nodes
// Used for catalog cells (callee names, argument expressions). The output is
// emitted back into Go files, so it must stay equivalent to the input: literal
// tokens are copied verbatim and comments are dropped. Output is a single line
// unless a raw string literal spans lines.

use tree_sitter::Node;

use super::node_text;

/// Literal kinds copied as one token, never split into their children
const ATOMIC_KINDS: &[&str] = &[
    "interpreted_string_literal",
    "raw_string_literal",
    "rune_literal",
];

/// Tokens after which a Go line break ends the statement
const STATEMENT_END_KINDS: &[&str] = &[
    "identifier",
    "field_identifier",
    "package_identifier",
    "type_identifier",
    "int_literal",
    "float_literal",
    "imaginary_literal",
    "rune_literal",
    "interpreted_string_literal",
    "raw_string_literal",
    "true",
    "false",
    "nil",
    "iota",
    "break",
    "continue",
    "fallthrough",
    "return",
    "++",
    "--",
    ")",
    "]",
    "}",
];

/// Trait for types that can generate their source code representation
pub trait ToSource {
    fn to_source(&self) -> String;
}

/// A node paired with the source it was parsed from
#[derive(Clone, Copy)]
pub struct SourceNode<'a> {
    pub node: Node<'a>,
    pub source: &'a [u8],
}

impl<'a> SourceNode<'a> {
    pub fn new(node: Node<'a>, source: &'a [u8]) -> Self {
        Self { node, source }
    }

    fn field(&self, name: &str) -> Option<SourceNode<'a>> {
        self.node
            .child_by_field_name(name)
            .map(|node| SourceNode::new(node, self.source))
    }

    fn text(&self) -> &'a str {
        node_text(self.node, self.source)
    }

    fn first_named_child(&self) -> Option<SourceNode<'a>> {
        let mut cursor = self.node.walk();
        let child = self
            .node
            .named_children(&mut cursor)
            .find(|child| !child.is_extra());
        child.map(|node| SourceNode::new(node, self.source))
    }

    fn render_arguments(&self) -> String {
        let Some(list) = self.field("arguments") else {
            return "()".to_string();
        };
        let mut cursor = list.node.walk();
        let args = list
            .node
            .named_children(&mut cursor)
            .filter(|arg| !arg.is_extra())
            .map(|arg| SourceNode::new(arg, self.source).to_source())
            .collect::<Vec<_>>()
            .join(", ");
        format!("({args})")
    }

    /// Join the node's tokens on one line. Whitespace between tokens becomes
    /// one space; a line break that ends a statement becomes `; `.
    fn render_tokens(&self) -> String {
        let mut tokens = Vec::new();
        collect_tokens(self.node, self.source, &mut tokens);

        let mut output = String::new();
        let mut previous: Option<Node> = None;
        for token in tokens {
            if let Some(previous) = previous {
                let gap = &self.source[previous.end_byte()..token.start_byte()];
                if gap.contains(&b'\n') && STATEMENT_END_KINDS.contains(&previous.kind()) {
                    output.push_str("; ");
                } else if !gap.is_empty() {
                    output.push(' ');
                }
            }
            output.push_str(node_text(token, self.source));
            previous = Some(token);
        }
        output
    }
}

/// Visible tokens under `node`. Comments and the grammar's newline
/// terminators are skipped; the gap check in `render_tokens` sees them.
fn collect_tokens<'a>(node: Node<'a>, source: &[u8], tokens: &mut Vec<Node<'a>>) {
    if node.is_extra() {
        return;
    }
    if node.child_count() == 0 || ATOMIC_KINDS.contains(&node.kind()) {
        if !node_text(node, source).trim_matches(|c: char| c.is_whitespace() || c == '\0').is_empty() {
            tokens.push(node);
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, source, tokens);
    }
}

impl ToSource for SourceNode<'_> {
    fn to_source(&self) -> String {
        match self.node.kind() {
            "identifier"
            | "field_identifier"
            | "package_identifier"
            | "type_identifier"
            | "int_literal"
            | "float_literal"
            | "imaginary_literal"
            | "rune_literal"
            | "interpreted_string_literal"
            | "raw_string_literal"
            | "true"
            | "false"
            | "nil"
            | "iota" => self.text().to_string(),

            "selector_expression" => match (self.field("operand"), self.field("field")) {
                (Some(operand), Some(field)) => {
                    format!("{}.{}", operand.to_source(), field.text())
                }
                _ => self.render_tokens(),
            },

            "call_expression" => match self.field("function") {
                Some(function) => {
                    let type_args = self
                        .field("type_arguments")
                        .map(|args| args.render_tokens())
                        .unwrap_or_default();
                    format!(
                        "{}{}{}",
                        function.to_source(),
                        type_args,
                        self.render_arguments()
                    )
                }
                None => self.render_tokens(),
            },

            "index_expression" => match (self.field("operand"), self.field("index")) {
                (Some(operand), Some(index)) => {
                    format!("{}[{}]", operand.to_source(), index.to_source())
                }
                _ => self.render_tokens(),
            },

            "unary_expression" => match (self.field("operator"), self.field("operand")) {
                (Some(operator), Some(operand)) => {
                    format!("{}{}", operator.text(), operand.to_source())
                }
                _ => self.render_tokens(),
            },

            "binary_expression" => match (
                self.field("left"),
                self.field("operator"),
                self.field("right"),
            ) {
                (Some(left), Some(operator), Some(right)) => format!(
                    "{} {} {}",
                    left.to_source(),
                    operator.text(),
                    right.to_source()
                ),
                _ => self.render_tokens(),
            },

            "parenthesized_expression" => match self.first_named_child() {
                Some(inner) => format!("({})", inner.to_source()),
                None => self.render_tokens(),
            },

            "variadic_argument" => match self.first_named_child() {
                Some(inner) => format!("{}...", inner.to_source()),
                None => self.render_tokens(),
            },

            _ => self.render_tokens(),
        }
    }
}

/// Render `node` as canonical single-line source
pub fn render(node: Node, source: &[u8]) -> String {
    SourceNode::new(node, source).to_source()
}

/// Collapse every whitespace run to a single space, for display only
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
