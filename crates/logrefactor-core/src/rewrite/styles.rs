/*!
# Output Styles

Each style turns the same resolved call (logger variable, level, message,
fields) into one target call shape. Built-in styles are pure string
functions; the custom style lives in [`super::template`] behind the same
[`CallRenderer`] trait, so nothing here depends on a template engine.
*/

use thiserror::Error;

use crate::catalog::{CallSiteRecord, FieldMapping, Level, TypeTag};
use crate::config::{OutputStyle, TemplateConfig};
use crate::error::{RefactorError, Result};

use super::template::TemplateStyle;

/// Why a call could not be rendered
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template rendering failed: {0}")]
    Template(#[from] handlebars::RenderError),
}

/// A resolved call, ready to render
#[derive(Debug, Clone, Copy)]
pub struct LogCall<'a> {
    pub logger: &'a str,
    pub level: Level,
    /// Message text without surrounding quotes
    pub message: &'a str,
    pub fields: &'a [FieldMapping],
}

impl LogCall<'_> {
    /// Level method name in lower case, `warn` for warnings
    pub fn level_lower(&self) -> String {
        self.level.effective().as_str().to_lowercase()
    }

    /// Level method name in Title case, `Warn` for warnings
    pub fn level_title(&self) -> &'static str {
        self.level.effective().as_str()
    }

    /// Message as the body of a Go interpreted string literal
    pub fn quoted_message(&self) -> String {
        escape_quotes(self.message)
    }
}

/// Core trait for output styles
pub trait CallRenderer: Send + Sync {
    /// Style tag, as written in the configuration
    fn name(&self) -> &'static str;

    /// What the generated call looks like
    fn description(&self) -> &'static str;

    /// Render the replacement call expression
    fn render(&self, call: &LogCall) -> std::result::Result<String, RenderError>;
}

/// Key-argument style: `log.info("msg", slog.String("k", v))`
pub struct SlogStyle;

impl CallRenderer for SlogStyle {
    fn name(&self) -> &'static str {
        "slog"
    }

    fn description(&self) -> &'static str {
        "lower-case level method with slog attribute constructors"
    }

    fn render(&self, call: &LogCall) -> std::result::Result<String, RenderError> {
        let mut parts = vec![format!(
            "{}.{}(\"{}\"",
            call.logger,
            call.level_lower(),
            call.quoted_message()
        )];
        parts.extend(call.fields.iter().map(|field| {
            format!(
                "slog.{}(\"{}\", {})",
                slog_constructor(field.tag()),
                escape_quotes(&field.key),
                field.expression
            )
        }));
        Ok(parts.join(", ") + ")")
    }
}

/// Title-case key-argument style: `log.Info("msg", zap.String("k", v))`
pub struct ZapStyle;

impl CallRenderer for ZapStyle {
    fn name(&self) -> &'static str {
        "zap"
    }

    fn description(&self) -> &'static str {
        "Title-case level method with zap field constructors"
    }

    fn render(&self, call: &LogCall) -> std::result::Result<String, RenderError> {
        let mut parts = vec![format!(
            "{}.{}(\"{}\"",
            call.logger,
            call.level_title(),
            call.quoted_message()
        )];
        parts.extend(call.fields.iter().map(|field| {
            let key = escape_quotes(&field.key);
            match field.tag() {
                TypeTag::Error if field.key == "error" => format!("zap.Error({})", field.expression),
                TypeTag::Error => format!("zap.NamedError(\"{key}\", {})", field.expression),
                tag => format!("zap.{}(\"{key}\", {})", zap_constructor(tag), field.expression),
            }
        }));
        Ok(parts.join(", ") + ")")
    }
}

/// Chained-builder style: `log.info().Str("k", v).Msg("msg")`
pub struct ZerologStyle;

impl CallRenderer for ZerologStyle {
    fn name(&self) -> &'static str {
        "zerolog"
    }

    fn description(&self) -> &'static str {
        "level event with chained typed fields, terminated by Msg"
    }

    fn render(&self, call: &LogCall) -> std::result::Result<String, RenderError> {
        let mut parts = vec![format!("{}.{}()", call.logger, call.level_lower())];
        parts.extend(call.fields.iter().map(|field| {
            let key = escape_quotes(&field.key);
            match field.tag() {
                TypeTag::Error if field.key == "error" => format!("Err({})", field.expression),
                TypeTag::Error => format!("AnErr(\"{key}\", {})", field.expression),
                tag => format!("{}(\"{key}\", {})", zerolog_method(tag), field.expression),
            }
        }));
        parts.push(format!("Msg(\"{}\")", call.quoted_message()));
        Ok(parts.join("."))
    }
}

/// Fields-map style: `log.WithFields(log.Fields{"k": v}).Info("msg")`
pub struct LogrusStyle;

impl CallRenderer for LogrusStyle {
    fn name(&self) -> &'static str {
        "logrus"
    }

    fn description(&self) -> &'static str {
        "WithFields map followed by a Title-case level method"
    }

    fn render(&self, call: &LogCall) -> std::result::Result<String, RenderError> {
        let level = call.level_title();
        let message = call.quoted_message();
        if call.fields.is_empty() {
            return Ok(format!("{}.{level}(\"{message}\")", call.logger));
        }

        let pairs = call
            .fields
            .iter()
            .map(|field| format!("\"{}\": {}", escape_quotes(&field.key), field.expression))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "{logger}.WithFields({logger}.Fields{{{pairs}}}).{level}(\"{message}\")",
            logger = call.logger
        ))
    }
}

fn slog_constructor(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::String => "String",
        TypeTag::Int => "Int",
        TypeTag::Float => "Float64",
        TypeTag::Bool => "Bool",
        _ => "Any",
    }
}

fn zap_constructor(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::String => "String",
        TypeTag::Int => "Int",
        TypeTag::Float => "Float64",
        TypeTag::Bool => "Bool",
        TypeTag::Error => "Error",
        _ => "Any",
    }
}

fn zerolog_method(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::String => "Str",
        TypeTag::Int => "Int",
        TypeTag::Float => "Float64",
        TypeTag::Bool => "Bool",
        TypeTag::Error => "Err",
        _ => "Interface",
    }
}

/// Escape every `"` that is not already escaped
pub fn escape_quotes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut backslashes = 0usize;
    for c in text.chars() {
        if c == '"' && backslashes % 2 == 0 {
            escaped.push('\\');
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        escaped.push(c);
    }
    escaped
}

/// Renders catalog entries in the configured style
pub struct CallGenerator {
    style: OutputStyle,
    logger_var: String,
    renderer: Box<dyn CallRenderer>,
}

impl std::fmt::Debug for CallGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CallGenerator")
            .field("style", &self.style)
            .field("logger_var", &self.logger_var)
            .finish()
    }
}

impl CallGenerator {
    /// Build the renderer for `config`. Bad style tags and custom templates
    /// that do not compile are configuration errors.
    pub fn from_config(config: &TemplateConfig) -> Result<Self> {
        let style = config.validate()?;
        let renderer: Box<dyn CallRenderer> = match style {
            OutputStyle::Slog => Box::new(SlogStyle),
            OutputStyle::Zap => Box::new(ZapStyle),
            OutputStyle::Zerolog => Box::new(ZerologStyle),
            OutputStyle::Logrus => Box::new(LogrusStyle),
            OutputStyle::Custom => Box::new(TemplateStyle::new(&config.template)?),
        };

        Ok(Self {
            style,
            logger_var: config.logger_var.trim().to_string(),
            renderer,
        })
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    pub fn renderer(&self) -> &dyn CallRenderer {
        self.renderer.as_ref()
    }

    /// Render a call from explicit parts
    pub fn render(&self, level: Level, message: &str, fields: &[FieldMapping]) -> std::result::Result<String, RenderError> {
        self.renderer.render(&LogCall {
            logger: &self.logger_var,
            level,
            message,
            fields,
        })
    }

    /// Resolve fields for a catalog entry and render its replacement.
    ///
    /// Failures are `Generation` errors tagged with the entry identifier.
    pub fn generate(&self, record: &CallSiteRecord, auto_map: bool) -> Result<String> {
        let fields = crate::catalog::resolve_fields(record, auto_map)?;
        let message = record.target_message();
        self.render(record.target_level(), &message, &fields)
            .map_err(|e| RefactorError::generation(&record.id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields() -> Vec<FieldMapping> {
        vec![
            FieldMapping::new("user", "u.Name", "string"),
            FieldMapping::new("count", "n", "int"),
            FieldMapping::new("error", "err", "error"),
            FieldMapping::new("cause", "inner", "error"),
            FieldMapping::new("payload", "body", "unknown"),
        ]
    }

    fn call<'a>(level: Level, fields: &'a [FieldMapping]) -> LogCall<'a> {
        LogCall {
            logger: "logger",
            level,
            message: "request failed",
            fields,
        }
    }

    #[test]
    fn slog_lowercases_level_and_wraps_fields() {
        let fields = fields();
        assert_eq!(
            SlogStyle.render(&call(Level::Warn, &fields)).unwrap(),
            r#"logger.warn("request failed", slog.String("user", u.Name), slog.Int("count", n), slog.Any("error", err), slog.Any("cause", inner), slog.Any("payload", body))"#
        );
    }

    #[test]
    fn zap_uses_title_case_and_error_constructors() {
        let fields = fields();
        assert_eq!(
            ZapStyle.render(&call(Level::Error, &fields)).unwrap(),
            r#"logger.Error("request failed", zap.String("user", u.Name), zap.Int("count", n), zap.Error(err), zap.NamedError("cause", inner), zap.Any("payload", body))"#
        );
    }

    #[test]
    fn zerolog_chains_fields_before_msg() {
        let fields = fields();
        assert_eq!(
            ZerologStyle.render(&call(Level::Info, &fields)).unwrap(),
            r#"logger.info().Str("user", u.Name).Int("count", n).Err(err).AnErr("cause", inner).Interface("payload", body).Msg("request failed")"#
        );
    }

    #[test]
    fn logrus_with_and_without_fields() {
        let fields = fields();
        assert_eq!(
            LogrusStyle.render(&call(Level::Debug, &fields[..2])).unwrap(),
            r#"logger.WithFields(logger.Fields{"user": u.Name, "count": n}).Debug("request failed")"#
        );
        assert_eq!(
            LogrusStyle.render(&call(Level::Unknown, &[])).unwrap(),
            r#"logger.Info("request failed")"#
        );
    }

    #[test]
    fn unescaped_quotes_are_escaped() {
        assert_eq!(escape_quotes(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_quotes(r#"already \"ok\""#), r#"already \"ok\""#);
        assert_eq!(escape_quotes(r#"tab\t"#), r#"tab\t"#);
    }

    #[test]
    fn generator_applies_new_message_and_auto_fields() {
        let generator = CallGenerator::from_config(&TemplateConfig::new(OutputStyle::Slog, "logger")).unwrap();
        let record = CallSiteRecord {
            id: "LOG-0001".to_string(),
            file_path: "main.go".into(),
            line: 10,
            column: 2,
            package: "main".to_string(),
            original_callee: "log.Printf".to_string(),
            level: Level::Info,
            message_template: "\"error: %v\"".to_string(),
            arguments: crate::catalog::parse_argument_details("error(error)=err[%v]"),
            new_callee: String::new(),
            new_message: "Failed to process request".to_string(),
            field_override: String::new(),
            notes: String::new(),
        };
        assert_eq!(
            generator.generate(&record, true).unwrap(),
            r#"logger.info("Failed to process request", slog.Any("error", err))"#
        );
    }

    #[test]
    fn unknown_style_is_a_config_error() {
        let config = TemplateConfig {
            style: "glog".to_string(),
            ..TemplateConfig::default()
        };
        assert!(matches!(CallGenerator::from_config(&config), Err(RefactorError::Config(_))));
    }

    #[test]
    fn template_failures_carry_the_entry_id() {
        let generator =
            CallGenerator::from_config(&TemplateConfig::custom("log", "{{Logger}}({{Fields.[0].Key}})")).unwrap();
        let record = CallSiteRecord {
            id: "LOG-0042".to_string(),
            file_path: "main.go".into(),
            line: 1,
            column: 1,
            package: "main".to_string(),
            original_callee: "log.Print".to_string(),
            level: Level::Info,
            message_template: "\"plain\"".to_string(),
            arguments: Vec::new(),
            new_callee: String::new(),
            new_message: "changed".to_string(),
            field_override: String::new(),
            notes: String::new(),
        };

        let err = generator.generate(&record, true).unwrap_err();
        assert!(matches!(err, RefactorError::Generation { ref id, .. } if id == "LOG-0042"));
        assert!(err.to_string().contains("template rendering failed"));
    }
}
