//! Argument analysis for a matched call.
//!
//! Splits a call into its message template and the field candidates that
//! follow it. Typing and naming are syntactic heuristics driven by the rule
//! tables below; nothing here can fail, the fallback is always `unknown`.
//!
//! Format verbs pair with arguments strictly by position: the Nth argument
//! after the message takes the Nth verb of the template. Verb and argument
//! type are not checked against each other, and a surplus on either side is
//! simply left unpaired.

use std::sync::OnceLock;

use regex::Regex;
use tree_sitter::Node;

use crate::ast::{is_string_literal, node_text, render, CallExpr};
use crate::catalog::{FieldCandidate, TypeTag};

/// Message template plus the analyzed trailing arguments of one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallAnalysis {
    pub message_template: String,
    pub arguments: Vec<FieldCandidate>,
}

/// How a type rule recognises an expression
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Syntax node kind
    Kind(&'static str),
    /// Identifier spelled exactly so
    Name(&'static str),
    NamePrefix(&'static str),
    NameSuffix(&'static str),
}

/// Ordered type inference rules; the first match wins
const TYPE_RULES: &[(Matcher, TypeTag)] = &[
    (Matcher::Kind("int_literal"), TypeTag::Int),
    (Matcher::Kind("float_literal"), TypeTag::Float),
    (Matcher::Kind("interpreted_string_literal"), TypeTag::String),
    (Matcher::Kind("raw_string_literal"), TypeTag::String),
    (Matcher::Kind("rune_literal"), TypeTag::Rune),
    (Matcher::Kind("true"), TypeTag::Bool),
    (Matcher::Kind("false"), TypeTag::Bool),
    (Matcher::Kind("nil"), TypeTag::Nil),
    (Matcher::Kind("call_expression"), TypeTag::FuncResult),
    (Matcher::Name("true"), TypeTag::Bool),
    (Matcher::Name("false"), TypeTag::Bool),
    (Matcher::Name("nil"), TypeTag::Nil),
    (Matcher::NamePrefix("is"), TypeTag::Bool),
    (Matcher::NamePrefix("has"), TypeTag::Bool),
    (Matcher::Name("err"), TypeTag::Error),
    (Matcher::NameSuffix("Error"), TypeTag::Error),
];

/// Prefixes stripped from snake-cased keys
const KEY_PREFIXES: &[&str] = &["p_", "m_"];

/// Canonical keys for common semantic names
const KEY_OVERRIDES: &[(&str, &str)] = &[
    ("err", "error"),
    ("error", "error"),
    ("msg", "message"),
    ("message", "message"),
    ("id", "id"),
    ("name", "name"),
    ("status", "status"),
    ("state", "status"),
];

/// Analyze a call: the first argument is the message, the rest become
/// field candidates.
pub fn analyze_call(call: &CallExpr, source: &[u8]) -> CallAnalysis {
    let Some((first, rest)) = call.arguments.split_first() else {
        return CallAnalysis {
            message_template: String::new(),
            arguments: Vec::new(),
        };
    };

    let (message_template, verbs) = if is_string_literal(*first) {
        let literal = node_text(*first, source).to_string();
        let verbs = extract_format_verbs(&literal);
        (literal, verbs)
    } else {
        (render(*first, source), Vec::new())
    };

    let arguments = rest
        .iter()
        .enumerate()
        .map(|(index, arg)| {
            let leaf_name = leaf_name(*arg, source);
            FieldCandidate {
                index,
                expression: render(*arg, source),
                suggested_key: suggest_key(&leaf_name, index),
                leaf_name,
                type_tag: infer_type(*arg, source),
                format_verb: verbs.get(index).cloned(),
            }
        })
        .collect();

    CallAnalysis {
        message_template,
        arguments,
    }
}

/// Conversion specifiers of a format string, left to right. `%%` is an
/// escaped percent sign and never a verb.
pub fn extract_format_verbs(template: &str) -> Vec<String> {
    static VERB: OnceLock<Regex> = OnceLock::new();
    let verb = VERB.get_or_init(|| {
        Regex::new(r"%%|%[-+# 0]*\d*(?:\.\d*)?[vTtbcdoqxXUeEfFgGsp]")
            .expect("format verb pattern is valid")
    });

    let cleaned = template.trim_matches(|c| c == '"' || c == '\'' || c == '`');
    verb.find_iter(cleaned)
        .map(|m| m.as_str())
        .filter(|token| *token != "%%")
        .map(str::to_string)
        .collect()
}

/// Heuristic type of an argument expression
pub fn infer_type(node: Node, source: &[u8]) -> TypeTag {
    let kind = node.kind();
    let name = (kind == "identifier").then(|| node_text(node, source));

    TYPE_RULES
        .iter()
        .find(|(matcher, _)| match (*matcher, name) {
            (Matcher::Kind(expected), _) => kind == expected,
            (Matcher::Name(expected), Some(name)) => name == expected,
            (Matcher::NamePrefix(prefix), Some(name)) => name.starts_with(prefix),
            (Matcher::NameSuffix(suffix), Some(name)) => name.ends_with(suffix),
            _ => false,
        })
        .map(|(_, tag)| *tag)
        .unwrap_or(TypeTag::Unknown)
}

/// Trailing member-access segment of an expression: `user.Name` → `Name`,
/// `user.GetName()` → `GetName`, `ids[i]` → `ids`.
pub fn leaf_name(node: Node, source: &[u8]) -> String {
    let inner = match node.kind() {
        "selector_expression" => {
            return node
                .child_by_field_name("field")
                .map(|field| node_text(field, source).to_string())
                .unwrap_or_else(|| render(node, source));
        }
        "identifier" => return node_text(node, source).to_string(),
        "call_expression" => node.child_by_field_name("function"),
        "index_expression" | "slice_expression" | "unary_expression" => {
            node.child_by_field_name("operand")
        }
        "parenthesized_expression" | "variadic_argument" => {
            let mut cursor = node.walk();
            let child = node.named_children(&mut cursor).find(|c| !c.is_extra());
            child
        }
        _ => None,
    };

    match inner {
        Some(inner) => leaf_name(inner, source),
        None => render(node, source),
    }
}

/// Suggest a structured-logging key for an argument's leaf name
pub fn suggest_key(leaf_name: &str, index: usize) -> String {
    let mut key = to_snake_case(leaf_name);
    for prefix in KEY_PREFIXES {
        if let Some(stripped) = key.strip_prefix(prefix) {
            key = stripped.to_string();
        }
    }

    if let Some((_, canonical)) = KEY_OVERRIDES.iter().find(|(name, _)| *name == key) {
        return canonical.to_string();
    }

    let key: String = key
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    if key.is_empty() {
        format!("arg{index}")
    } else {
        key
    }
}

/// `userName` → `user_name`; every uppercase letter after the first
/// character gets a separator, so `userID` → `user_i_d`.
pub fn to_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            result.push('_');
        }
        result.push(c);
    }
    result.to_lowercase()
}
