//! CLI errors and syntax error reports.

use std::path::PathBuf;

use esparse::ParseError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Failures that stop the CLI before or between parses. These map to exit
/// code 2.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Failed to read {}", path.display())]
    #[diagnostic(code(esparse::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}", path.display())]
    #[diagnostic(code(esparse::config), help("expected a JSON object of parser options"))]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write output")]
    #[diagnostic(code(esparse::output))]
    Output(#[source] std::io::Error),
}

/// A parse failure rendered as a code frame.
#[derive(Debug, Error, Diagnostic)]
#[error("{name}: {description}")]
#[diagnostic(code(esparse::syntax))]
pub struct SyntaxReport {
    name: &'static str,
    description: String,
    #[source_code]
    source_code: NamedSource<String>,
    #[label("{kind}")]
    span: SourceSpan,
    kind: String,
}

impl SyntaxReport {
    pub fn new(path: &str, source: &str, err: &ParseError) -> Self {
        let start = err.span.start as usize;
        let len = err.span.end.saturating_sub(err.span.start) as usize;
        Self {
            name: err.name(),
            description: err.description(),
            source_code: NamedSource::new(path, source.to_string()),
            span: (start, len).into(),
            kind: format!("{:?}", err.kind()),
        }
    }
}
