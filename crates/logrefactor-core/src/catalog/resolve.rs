/*!
# Field Resolver

Decides the final field list for a catalog entry at rewrite time:

1. a non-empty StructuredFieldOverride that parses as a JSON field list is
   used verbatim;
2. otherwise a non-empty override is read with the `key=expr` grammar;
3. otherwise, with auto-mapping on, the analyzed argument candidates are used;
4. otherwise there are no fields.

An override always replaces auto-derived fields, it is never merged.
*/

use std::sync::OnceLock;

use regex::Regex;

use super::{CallSiteRecord, FieldMapping, TypeTag};
use crate::error::{RefactorError, Result};

/// Resolve the fields to render for `record`
pub fn resolve_fields(record: &CallSiteRecord, auto_map: bool) -> Result<Vec<FieldMapping>> {
    let overrides = record.field_override.trim();
    if !overrides.is_empty() {
        return parse_override(overrides)
            .map_err(|message| RefactorError::generation(&record.id, message));
    }

    if auto_map {
        return Ok(record.arguments.iter().map(FieldMapping::from).collect());
    }

    Ok(Vec::new())
}

/// Parse a StructuredFieldOverride cell: a JSON array of
/// `{key, expression, type}` objects, or the `key=expr; key2=expr2` grammar.
pub fn parse_override(text: &str) -> std::result::Result<Vec<FieldMapping>, String> {
    if let Ok(fields) = serde_json::from_str::<Vec<FieldMapping>>(text) {
        return Ok(fields);
    }
    parse_simple_fields(text)
}

/// Render fields as an override cell that parses back to the same list
pub fn serialize_fields(fields: &[FieldMapping]) -> String {
    serde_json::to_string(fields).unwrap_or_default()
}

fn parse_simple_fields(text: &str) -> std::result::Result<Vec<FieldMapping>, String> {
    let mut segments: Vec<&str> = text.split(';').collect();
    if segments.len() == 1 {
        segments = text.split(',').collect();
    }

    let mut fields = Vec::new();
    for segment in segments.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
        let (key, expression) = match segment.split_once('=').or_else(|| segment.split_once(':')) {
            Some((key, expression)) => (key.trim(), expression.trim()),
            None => (segment, segment),
        };

        if !is_field_key(key) {
            return Err(format!("unparsable override segment `{segment}`"));
        }
        if expression.is_empty() {
            return Err(format!("override segment `{segment}` has no expression"));
        }

        fields.push(FieldMapping::new(key, expression, TypeTag::Unknown.as_str()));
    }

    Ok(fields)
}

/// Keys are plain names: letters, digits, `_`, `.` and `-`
fn is_field_key(key: &str) -> bool {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("field key pattern is valid"))
        .is_match(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{parse_argument_details, Level};
    use pretty_assertions::assert_eq;

    fn record(details: &str, overrides: &str) -> CallSiteRecord {
        CallSiteRecord {
            id: "LOG-0007".to_string(),
            file_path: "main.go".into(),
            line: 3,
            column: 2,
            package: "main".to_string(),
            original_callee: "log.Printf".to_string(),
            level: Level::Info,
            message_template: "\"x\"".to_string(),
            arguments: parse_argument_details(details),
            new_callee: String::new(),
            new_message: "changed".to_string(),
            field_override: overrides.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn json_override_is_used_verbatim() {
        let entry = record(
            "error(error)=err[%v]",
            r#"[{"key":"user","expression":"u.ID","type":"string"},{"key":"attempt","expression":"n"}]"#,
        );
        assert_eq!(
            resolve_fields(&entry, true).unwrap(),
            vec![
                FieldMapping::new("user", "u.ID", "string"),
                FieldMapping::new("attempt", "n", "unknown"),
            ]
        );
    }

    #[test]
    fn simple_grammar_prefers_semicolons() {
        let fields = parse_override("user=u.ID; total: sum(a, b)").unwrap();
        assert_eq!(
            fields,
            vec![
                FieldMapping::new("user", "u.ID", "unknown"),
                FieldMapping::new("total", "sum(a, b)", "unknown"),
            ]
        );

        let fields = parse_override("user=u.ID, attempt").unwrap();
        assert_eq!(fields[1], FieldMapping::new("attempt", "attempt", "unknown"));
    }

    #[test]
    fn broken_json_is_a_generation_error() {
        let entry = record("", r#"[{"key": "user""#);
        let err = resolve_fields(&entry, true).unwrap_err();
        assert!(matches!(err, RefactorError::Generation { ref id, .. } if id == "LOG-0007"));
    }

    #[test]
    fn auto_mapping_follows_candidates() {
        let entry = record("error(error)=err[%v]; user_id(unknown)=req.UserID[%s]", "");
        let fields = resolve_fields(&entry, true).unwrap();
        assert_eq!(
            fields,
            vec![
                FieldMapping::new("error", "err", "error"),
                FieldMapping::new("user_id", "req.UserID", "unknown"),
            ]
        );
        assert!(resolve_fields(&entry, false).unwrap().is_empty());
    }

    #[test]
    fn serialized_fields_parse_back_in_order() {
        let fields = vec![
            FieldMapping::new("b", "second()", "func_result"),
            FieldMapping::new("a", "first", "int"),
        ];
        assert_eq!(parse_override(&serialize_fields(&fields)).unwrap(), fields);
    }
}
