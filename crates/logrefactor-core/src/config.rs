//! Rendering configuration for the transformer.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RefactorError, Result};

/// Target call shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// `log.info("msg", slog.String("k", v))`
    Slog,
    /// `log.Info("msg", zap.String("k", v))`
    Zap,
    /// `log.info().Str("k", v).Msg("msg")`
    Zerolog,
    /// `log.WithFields(log.Fields{"k": v}).Info("msg")`
    Logrus,
    /// Operator-supplied template
    Custom,
}

impl OutputStyle {
    pub const ALL: [OutputStyle; 5] = [
        OutputStyle::Slog,
        OutputStyle::Zap,
        OutputStyle::Zerolog,
        OutputStyle::Logrus,
        OutputStyle::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStyle::Slog => "slog",
            OutputStyle::Zap => "zap",
            OutputStyle::Zerolog => "zerolog",
            OutputStyle::Logrus => "logrus",
            OutputStyle::Custom => "custom",
        }
    }
}

impl FromStr for OutputStyle {
    type Err = RefactorError;

    fn from_str(s: &str) -> Result<Self> {
        OutputStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s.trim())
            .ok_or_else(|| {
                RefactorError::Config(format!(
                    "unknown style `{s}` (expected one of slog, zap, zerolog, logrus, custom)"
                ))
            })
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template configuration file contents
///
/// ```json
/// { "style": "zap", "loggerVar": "logger" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    pub style: String,
    #[serde(default = "default_logger_var")]
    pub logger_var: String,
    /// Only read when `style` is `custom`
    #[serde(default)]
    pub template: String,
}

fn default_logger_var() -> String {
    "log".to_string()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            style: OutputStyle::Slog.as_str().to_string(),
            logger_var: default_logger_var(),
            template: String::new(),
        }
    }
}

impl TemplateConfig {
    pub fn new(style: OutputStyle, logger_var: impl Into<String>) -> Self {
        Self {
            style: style.as_str().to_string(),
            logger_var: logger_var.into(),
            template: String::new(),
        }
    }

    pub fn custom(logger_var: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::new(OutputStyle::Custom, logger_var)
        }
    }

    /// Load from a JSON file; no path means the default slog configuration
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let data = std::fs::read_to_string(path).map_err(|e| {
            RefactorError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|e| {
            RefactorError::Config(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the style tag and the template requirement
    pub fn validate(&self) -> Result<OutputStyle> {
        let style: OutputStyle = self.style.parse()?;
        if self.logger_var.trim().is_empty() {
            return Err(RefactorError::Config("loggerVar must not be empty".to_string()));
        }
        if style == OutputStyle::Custom && self.template.trim().is_empty() {
            return Err(RefactorError::Config(
                "style `custom` requires a non-empty template".to_string(),
            ));
        }
        Ok(style)
    }
}
