//! # Logrefactor Core
//!
//! Migration pipeline that turns format-string log statements in a Go source
//! tree into structured, field-based log calls:
//! - Call-site scanning and argument analysis over tree-sitter syntax trees
//! - An editable CSV catalog of every discovered call site
//! - Pluggable call generation (slog, zap, zerolog, logrus, custom templates)
//! - Position-exact source patching with dry-run previews
//!
//! The CLI in `logrefactor-cli` is a thin wrapper around [`collect`] and
//! [`transform`].

#![warn(clippy::all)]

pub mod ast;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod error;
pub mod parser;
pub mod rewrite;

// Re-export commonly used types
pub use catalog::{CallSiteRecord, FieldCandidate, FieldMapping, Level, TypeTag};
pub use collector::{collect, scan, Collector};
pub use config::{OutputStyle, TemplateConfig};
pub use error::{RefactorError, Result};
pub use parser::{create_parser, GoParser, ParsedSource, Parser};
pub use rewrite::{transform, CallGenerator, TransformSummary, Transformer};

/// Crate version, reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default callee pattern used by `collect` when none is given
pub const DEFAULT_PATTERN: &str = r"log\.|logrus\.|logger\.";

/// Initialize tracing for logrefactor components.
///
/// Diagnostics go to stderr so that previews printed on stdout stay clean.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("logrefactor_core=info,logrefactor=info")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
