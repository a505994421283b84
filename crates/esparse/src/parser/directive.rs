//! Directive prologues and retroactive strict mode.
//!
//! A `"use strict"` directive makes the whole enclosing function strict,
//! including its name and parameters, which were parsed before the directive
//! was seen. Errors that only apply to strict code are therefore recorded in
//! the function's [`StrictFrame`] while its prologue is open and replayed
//! when the directive shows up.

use tracing::trace;

use super::Parser;
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorCode, Result};
use crate::span::Span;
use crate::token::{TokenFlags, TokenKind};

/// Strict-only violations of one function, collected until its directive
/// prologue ends.
#[derive(Debug, Clone, Default)]
pub(crate) struct StrictFrame {
    /// The parameter list has no defaults, rest or patterns.
    pub simple_params: bool,
    /// Violations that become errors if the function turns out strict.
    pub pending: Vec<(ErrorCode, Span)>,
    /// The prologue is still open.
    pub open: bool,
}

impl StrictFrame {
    pub(crate) fn new(simple_params: bool) -> Self {
        Self {
            simple_params,
            pending: Vec::new(),
            open: true,
        }
    }

    /// Stop collecting: nothing after the prologue can change strictness.
    pub(crate) fn close(&mut self) {
        self.open = false;
        self.pending.clear();
    }
}

impl<'a> Parser<'a> {
    /// Parse a statement list that starts with a directive prologue: a
    /// program (up to end of input) or a function body (up to `}`, which is
    /// left for the caller).
    pub(crate) fn parse_body(&mut self, top_level: bool) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Eof if top_level => break,
                TokenKind::RBrace if !top_level => break,
                TokenKind::Eof => return Err(self.unexpected()),
                _ => {}
            }
            if self.frame.open {
                if let TokenKind::String(_) = self.peek() {
                    body.push(self.parse_directive_candidate(top_level)?);
                    continue;
                }
                self.frame.close();
            }
            body.push(self.parse_statement_list_item(top_level)?);
        }
        self.frame.close();
        Ok(body)
    }

    /// Parse a statement starting with a string literal. It is a directive
    /// if the whole statement is that literal.
    fn parse_directive_candidate(&mut self, top_level: bool) -> Result<Stmt> {
        let token = self.current.clone();
        let mut stmt = self.parse_statement_list_item(top_level)?;

        let StmtKind::Expr { expr, directive } = &mut stmt.kind else {
            self.frame.close();
            return Ok(stmt);
        };
        if !matches!(expr.kind, ExprKind::String(_)) || expr.span != token.span {
            self.frame.close();
            return Ok(stmt);
        }

        let span = token.span;
        let raw = &self.source[span.start as usize + 1..span.end as usize - 1];
        *directive = Some(raw.to_string());

        // A `\0` escape counts as octal-like inside a directive prologue.
        if token.has_octal() || token.flags.contains(TokenFlags::ZERO_ESCAPE) {
            self.strict_violation(ErrorCode::StrictOctalEscape, span)?;
        }
        if raw == "use strict" {
            self.apply_use_strict(span)?;
        }
        Ok(stmt)
    }

    fn apply_use_strict(&mut self, span: Span) -> Result<()> {
        if !self.frame.simple_params {
            return Err(self.error(ErrorCode::IllegalUseStrict, span));
        }
        if self.ctx.is_strict() {
            return Ok(());
        }
        trace!(at = span.start, "strict mode enabled by directive");
        self.ctx |= Context::STRICT;
        if let Some((code, span)) = self.frame.pending.first() {
            return Err(self.error(code.clone(), *span));
        }
        // The token after the directive was scanned while still sloppy.
        let current = self.current.clone();
        self.check_html_comment(&current)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::context::Context;
    use crate::error::{ErrorCode, Result};
    use crate::options::ParserOptions;
    use crate::parser::Parser;

    fn parse(source: &str) -> Result<Program> {
        let options = ParserOptions::default();
        Parser::new(source, &options, Context::empty())?.parse()
    }

    fn directives(program: &Program) -> Vec<Option<&str>> {
        program
            .body
            .iter()
            .map(|stmt| match &stmt.kind {
                StmtKind::Expr { directive, .. } => directive.as_deref(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_directive_prologue() {
        let program = parse("'use strict'; \"other\"; 'x' + 1; 'late';").unwrap();
        assert_eq!(
            directives(&program),
            vec![Some("use strict"), Some("other"), None, None]
        );
    }

    #[test]
    fn test_parenthesized_string_ends_prologue() {
        let program = parse("('use strict'); with (a) {}").unwrap();
        assert_eq!(directives(&program)[0], None);
    }

    #[test]
    fn test_escaped_use_strict_is_not_strict() {
        let program = parse("'use\\x20strict'; with (a) {}").unwrap();
        assert_eq!(directives(&program)[0], Some("use\\x20strict"));
    }

    #[test]
    fn test_retroactive_function_name() {
        let err = parse("function eval() { 'use strict'; }").unwrap_err();
        assert_eq!(err.code, ErrorCode::StrictEvalArguments);
        assert_eq!(err.span.start, 9);
    }

    #[test]
    fn test_retroactive_parameters() {
        let err = parse("function f(a, a) { 'use strict'; }").unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateParameter);
        assert!(parse("function f(a, a) { 'use asm'; }").is_ok());
    }

    #[test]
    fn test_octal_before_use_strict() {
        let err = parse("function f() { '\\01'; 'use strict'; }").unwrap_err();
        assert_eq!(err.code, ErrorCode::StrictOctalEscape);
        let err = parse("function f() { '\\0'; 'use strict'; }").unwrap_err();
        assert_eq!(err.code, ErrorCode::StrictOctalEscape);
        let err = parse("'use strict'; function f() { \"\\0\"; }").unwrap_err();
        assert_eq!(err.code, ErrorCode::StrictOctalEscape);
        assert!(parse("'use strict'; x = '\\0';").is_ok());
    }

    #[test]
    fn test_use_strict_with_non_simple_params() {
        let err = parse("function f(a = 1) { 'use strict'; }").unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalUseStrict);
        let err = parse("'use strict'; function f({a}) { 'use strict'; }").unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalUseStrict);
    }

    #[test]
    fn test_strictness_does_not_leak_out_of_function() {
        assert!(parse("function f() { 'use strict'; } with (a) {}").is_ok());
        assert!(parse("function f() { 'use strict'; }\n<!-- comment").is_ok());
    }
}
