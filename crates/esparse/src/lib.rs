//! esparse: ECMAScript parser with early errors
//!
//! Parses scripts and modules into a typed AST and reports every early
//! error the language defines as a fatal [`ParseError`] with an exact span
//! and line/column location. [`to_estree`] turns the AST into ESTree JSON.
//!
//! # Design
//!
//! 1. **Lexing on demand**
//!    - The parser pulls tokens one at a time and tells the lexer when a
//!      `/` starts a regular expression or a `}` resumes a template
//!    - Lookahead is scan-then-rewind through lexer checkpoints
//!
//! 2. **Cover grammar**
//!    - Arrow parameters and destructuring targets are parsed as
//!      expressions and converted to patterns afterwards
//!
//! 3. **Context flags**
//!    - `[Yield]`, `[Await]`, `[In]`, `[Return]` and friends live in one
//!      [`Context`] bit set saved and restored around each boundary
//!
//! 4. **Retroactive strict mode**
//!    - Strict-only violations are recorded until a function's directive
//!      prologue ends, then replayed if `"use strict"` appeared
//!
//! # Example
//!
//! ```
//! use esparse::{parse_script, to_estree, ParserOptions};
//!
//! let options = ParserOptions::default();
//! let source = "const x = 1 + 2;";
//! let program = parse_script(source, &options).unwrap();
//! let json = to_estree(&program, source, &options);
//! assert_eq!(json["body"][0]["type"], "VariableDeclaration");
//! ```

mod ast;
mod context;
mod error;
mod estree;
mod lexer;
mod options;
mod parser;
mod regexp;
mod scope;
mod span;
mod token;

// Re-exports
pub use ast::*;
pub use context::Context;
pub use error::{ErrorCode, ErrorKind, ParseError};
pub use estree::to_estree;
pub use lexer::{Lexer, LexerCheckpoint};
pub use options::{Extensions, ParserOptions, SourceType, DEFAULT_MAX_DEPTH};
pub use parser::Parser;
pub use regexp::validate as validate_regex;
pub use span::{LineIndex, Position, SourceLocation, Span};
pub use token::{Token, TokenFlags, TokenKind};

use tracing::debug;

/// Parse `source` with `options`, starting from `context`.
///
/// Errors come back with their line/column location filled in.
pub fn parse_source(
    source: &str,
    options: &ParserOptions,
    context: Context,
) -> Result<Program, ParseError> {
    let result = Parser::new(source, options, context).and_then(Parser::parse);
    result.map_err(|err| {
        let err = err.locate(&LineIndex::new(source));
        debug!(code = ?err.code, at = err.span.start, "parse failed");
        err
    })
}

/// Parse `source` as a script. `module` and a module `source_type` in
/// `options` are ignored.
pub fn parse_script(source: &str, options: &ParserOptions) -> Result<Program, ParseError> {
    let source_type = match options.source_type {
        SourceType::Module => SourceType::Script,
        other => other,
    };
    let options = ParserOptions {
        module: false,
        source_type,
        ..options.clone()
    };
    parse_source(source, &options, Context::empty())
}

/// Parse `source` as a module.
pub fn parse_module(source: &str, options: &ParserOptions) -> Result<Program, ParseError> {
    let options = ParserOptions {
        module: true,
        source_type: SourceType::Module,
        ..options.clone()
    };
    parse_source(source, &options, Context::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_located() {
        let err = parse_script("let x;\nlet x;", &ParserOptions::default()).unwrap_err();
        assert_eq!(err.loc.start, Position { line: 2, column: 4 });
        assert_eq!(err.to_string(), "[2:4]: Identifier 'x' has already been declared");
    }

    #[test]
    fn test_goal_selection() {
        let module = ParserOptions::module();
        assert_eq!(
            parse_script("var a;", &module).unwrap().source_type,
            SourceType::Script
        );
        assert_eq!(
            parse_module("var a;", &ParserOptions::default())
                .unwrap()
                .source_type,
            SourceType::Module
        );
        assert!(parse_script("with (a) {}", &module).is_ok());
        assert!(parse_module("with (a) {}", &ParserOptions::default()).is_err());
    }

    #[test]
    fn test_initial_context() {
        let options = ParserOptions::default();
        assert!(parse_source("with (a) {}", &options, Context::empty()).is_ok());
        assert!(parse_source("with (a) {}", &options, Context::STRICT).is_err());
    }
}
