//! Operator-supplied call templates.
//!
//! Templates are Handlebars, rendered in strict mode with escaping turned off.
//! The data model exposes `Logger`, `Level`, `Message` and `Fields`, where each
//! field has `Key`, `Expression` and `Type`. The common Go template spellings
//! `{{.Logger}}`, `{{range .Fields}}...{{end}}` and `{{.}}` are accepted and
//! rewritten before compilation.
//!
//! A template that does not compile is a configuration error. A template that
//! references a variable missing for one entry fails that entry only.

use std::sync::OnceLock;

use handlebars::Handlebars;
use regex::Regex;
use serde::Serialize;

use super::styles::{CallRenderer, LogCall, RenderError};
use crate::error::{RefactorError, Result};

const TEMPLATE_NAME: &str = "call";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TemplateData<'a> {
    logger: &'a str,
    level: &'static str,
    message: String,
    fields: Vec<TemplateField<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TemplateField<'a> {
    key: &'a str,
    expression: &'a str,
    #[serde(rename = "Type")]
    type_name: &'a str,
}

/// Custom style backed by a compiled Handlebars template
pub struct TemplateStyle {
    registry: Handlebars<'static>,
}

impl TemplateStyle {
    pub fn new(template: &str) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, normalize_template(template))
            .map_err(|e| RefactorError::Config(format!("template does not compile: {e}")))?;
        Ok(Self { registry })
    }
}

impl CallRenderer for TemplateStyle {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn description(&self) -> &'static str {
        "operator template over Logger, Level, Message and Fields"
    }

    fn render(&self, call: &LogCall) -> std::result::Result<String, RenderError> {
        let data = TemplateData {
            logger: call.logger,
            level: call.level_title(),
            message: call.quoted_message(),
            fields: call
                .fields
                .iter()
                .map(|field| TemplateField {
                    key: &field.key,
                    expression: &field.expression,
                    type_name: &field.type_name,
                })
                .collect(),
        };

        self.registry
            .render(TEMPLATE_NAME, &data)
            .map_err(RenderError::from)
    }
}

/// Rewrite Go template spellings into Handlebars
pub fn normalize_template(template: &str) -> String {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    let rules = RULES.get_or_init(|| {
        [
            (r"\{\{-?\s*range\s+\.([A-Za-z_][\w.]*)\s*-?\}\}", "{{#each ${1}}}"),
            (r"\{\{-?\s*end\s*-?\}\}", "{{/each}}"),
            (r"\{\{-?\s*\.\s*-?\}\}", "{{this}}"),
            (r"\{\{-?\s*\.([A-Za-z_][\w.]*)\s*-?\}\}", "{{${1}}}"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("template rewrite pattern is valid"), replacement)
        })
        .collect()
    });

    rules.iter().fold(template.to_string(), |text, (pattern, replacement)| {
        pattern.replace_all(&text, *replacement).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldMapping, Level};
    use pretty_assertions::assert_eq;

    fn call<'a>(fields: &'a [FieldMapping]) -> LogCall<'a> {
        LogCall {
            logger: "logger",
            level: Level::Warn,
            message: "disk \"full\"",
            fields,
        }
    }

    #[test]
    fn go_spellings_are_rewritten() {
        assert_eq!(
            normalize_template("{{.Logger}}.{{ .Level }}({{range .Fields}}{{.Key}}{{end}})"),
            "{{Logger}}.{{Level}}({{#each Fields}}{{Key}}{{/each}})"
        );
    }

    #[test]
    fn renders_fields_without_html_escaping() {
        let style = TemplateStyle::new(
            r#"{{Logger}}.{{Level}}("{{Message}}"{{#each Fields}}, "{{Key}}", {{Expression}}{{/each}})"#,
        )
        .unwrap();
        let fields = vec![FieldMapping::new("path", "a[\"b\"] && c", "string")];
        assert_eq!(
            style.render(&call(&fields)).unwrap(),
            r#"logger.Warn("disk \"full\"", "path", a["b"] && c)"#
        );
    }

    #[test]
    fn missing_variable_fails_the_entry() {
        let style = TemplateStyle::new("{{Logger}}.Log({{Fields.[0].Key}})").unwrap();
        let fields = vec![FieldMapping::new("id", "id", "unknown")];
        assert_eq!(style.render(&call(&fields)).unwrap(), "logger.Log(id)");
        assert!(matches!(style.render(&call(&[])), Err(RenderError::Template(_))));
    }

    #[test]
    fn broken_template_is_a_config_error() {
        let err = TemplateStyle::new("{{#each Fields}}{{Key}}").err().unwrap();
        assert!(matches!(err, RefactorError::Config(_)));
    }
}
