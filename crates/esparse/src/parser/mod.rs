//! Recursive descent parser for ECMAScript scripts and modules.
//!
//! Expressions are parsed with precedence climbing. Arrow parameters and
//! destructuring assignment targets are first parsed as expressions (the
//! cover grammar) and converted to patterns once `=>` or `=` shows what they
//! were; [`CoverErrors`] remembers the constructs that are only legal on one
//! side of that decision.
//!
//! Early errors are raised while parsing. Strictness that is only known
//! after the fact (a `"use strict"` directive in a function body) is handled
//! by recording strict-only violations in the current [`StrictFrame`] and
//! replaying them when the directive is found.

mod class;
mod directive;
mod expression;
mod function;
mod module;
mod pattern;
mod statement;

use tracing::debug;

use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorCode, ParseError, Result};
use crate::lexer::Lexer;
use crate::options::{ParserOptions, SourceType};
use crate::scope::{Label, ModuleRecord, PrivateNameStack, ScopeStack};
use crate::span::Span;
use crate::token::{describe, is_reserved_word, is_strict_reserved, Token, TokenFlags, TokenKind};

pub(crate) use directive::StrictFrame;
pub(crate) use pattern::CoverErrors;

/// Minimum stack space to keep available before recursing.
pub(crate) const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing.
pub(crate) const STACK_PER_RECURSION: usize = 1024 * 1024;

/// The parser.
pub struct Parser<'a> {
    /// The lexer.
    pub(crate) lexer: Lexer<'a>,
    /// Current token.
    pub(crate) current: Token,
    /// End of the last consumed token; node spans end here.
    pub(crate) prev_end: u32,
    /// Source code (for raw text and directive matching).
    pub(crate) source: &'a str,
    pub(crate) options: &'a ParserOptions,
    pub(crate) ctx: Context,
    pub(crate) scopes: ScopeStack,
    /// Labels of the enclosing statements in the current function body.
    pub(crate) labels: Vec<Label>,
    pub(crate) private_names: PrivateNameStack,
    pub(crate) module_record: ModuleRecord,
    /// Strict-only violations of the current function, kept until its
    /// directive prologue is over.
    pub(crate) frame: StrictFrame,
    depth: usize,
    /// Start of the assignment expression whose first token may begin an
    /// arrow function head.
    pub(crate) potential_arrow_at: Option<u32>,
    /// First `yield` expression since the current parameter list started.
    pub(crate) yield_pos: Option<u32>,
    /// First `await` expression since the current parameter list started.
    pub(crate) await_pos: Option<u32>,
    /// First `await` used as an identifier, which async arrow heads reject.
    pub(crate) await_ident_pos: Option<u32>,
    /// The next assignment expression is the head of `for await (...)`.
    pub(crate) for_await_head: bool,
    /// `potential_arrow_at` was set at the start of a `for await` head, where
    /// `async of` is not an arrow.
    pub(crate) potential_arrow_in_for_await: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser. `context` seeds the initial flags; options add the
    /// module goal, implied strictness and global return on top of it.
    pub fn new(source: &'a str, options: &'a ParserOptions, context: Context) -> Result<Self> {
        let module = options.is_module() || context.is_module();
        let mut ctx = context;
        if module {
            ctx |= Context::MODULE | Context::STRICT | Context::AWAIT;
        }
        if options.implied_strict {
            ctx |= Context::STRICT;
        }
        if options.allows_global_return() {
            ctx |= Context::RETURN;
        }

        let mut lexer = Lexer::new(source, module);
        let current = lexer.next_token()?;
        let duplicate_block_functions = options.webcompat && !options.lexical;

        let parser = Self {
            lexer,
            current,
            prev_end: 0,
            source,
            options,
            ctx,
            scopes: ScopeStack::new(module, duplicate_block_functions),
            labels: Vec::new(),
            private_names: PrivateNameStack::default(),
            module_record: ModuleRecord::default(),
            frame: StrictFrame::new(true),
            depth: 0,
            potential_arrow_at: None,
            yield_pos: None,
            await_pos: None,
            await_ident_pos: None,
            for_await_head: false,
            potential_arrow_in_for_await: false,
        };
        parser.check_html_comment(&parser.current)?;
        Ok(parser)
    }

    /// Parse the entire source into a [`Program`].
    pub fn parse(mut self) -> Result<Program> {
        let source_type = if self.ctx.is_module() {
            SourceType::Module
        } else {
            self.options.effective_source_type()
        };
        debug!(
            source_type = source_type.as_str(),
            strict = self.ctx.is_strict(),
            len = self.source.len(),
            "parsing program"
        );

        let body = self.parse_body(true)?;

        if let Some((name, span)) = self.module_record.first_unresolved() {
            return Err(self.error(ErrorCode::UndeclaredExport(name.clone()), *span));
        }

        Ok(Program {
            source_type,
            body,
            span: Span::new(0, self.source.len() as u32),
        })
    }

    // =========================================================================
    // Token Handling
    // =========================================================================

    /// Get the current token kind.
    pub(crate) fn peek(&self) -> &TokenKind {
        &self.current.kind
    }

    /// Advance to the next token and return the previous.
    pub(crate) fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        self.check_html_comment(&next)?;
        self.prev_end = self.current.span.end;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Scan the token after the current one without consuming anything.
    pub(crate) fn peek_next(&mut self) -> Result<Token> {
        self.lexer.lookahead()
    }

    /// Scan the two tokens after the current one.
    pub(crate) fn peek_next_two(&mut self) -> Result<(Token, Token)> {
        let checkpoint = self.lexer.checkpoint();
        let result = self
            .lexer
            .next_token()
            .and_then(|first| Ok((first, self.lexer.next_token()?)));
        self.lexer.rewind(checkpoint);
        result
    }

    /// Check if the current token matches the given kind.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    /// Consume a token if it matches, otherwise return an error.
    pub(crate) fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.error(
                ErrorCode::Expected {
                    expected: describe(kind),
                    found: describe(self.peek()),
                },
                self.current.span,
            ))
        }
    }

    /// Consume a token if it matches, returning true if consumed.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> Result<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// The current token is the unescaped contextual word `word`.
    pub(crate) fn is_contextual(&self, word: &str) -> bool {
        !self.current.is_escaped()
            && match self.peek() {
                TokenKind::Identifier(name) => name == word,
                kind => kind.is_contextual() && crate::token::keyword_to_str(kind) == word,
            }
    }

    pub(crate) fn eat_contextual(&mut self, word: &str) -> Result<bool> {
        if self.is_contextual(word) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect_contextual(&mut self, word: &str) -> Result<()> {
        if self.eat_contextual(word)? {
            Ok(())
        } else {
            Err(self.error(
                ErrorCode::Expected {
                    expected: format!("'{word}'"),
                    found: describe(self.peek()),
                },
                self.current.span,
            ))
        }
    }

    /// Whether automatic semicolon insertion applies before the current token.
    pub(crate) fn can_insert_semicolon(&self) -> bool {
        matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof)
            || self.current.had_newline_before()
    }

    /// Consume a semicolon (with ASI support).
    pub(crate) fn expect_semicolon(&mut self) -> Result<()> {
        if self.eat(&TokenKind::Semicolon)? || self.can_insert_semicolon() {
            return Ok(());
        }
        Err(self.error(ErrorCode::MissingSemicolon, self.current.span))
    }

    /// Span from `start` to the end of the last consumed token.
    #[inline]
    pub(crate) fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    #[inline]
    pub(crate) fn start(&self) -> u32 {
        self.current.span.start
    }

    // =========================================================================
    // Errors
    // =========================================================================

    pub(crate) fn error(&self, code: ErrorCode, span: Span) -> ParseError {
        ParseError::new(code, span)
    }

    /// Error for a token the grammar does not allow here.
    pub(crate) fn unexpected(&self) -> ParseError {
        self.unexpected_token(&self.current)
    }

    pub(crate) fn unexpected_token(&self, token: &Token) -> ParseError {
        let code = match &token.kind {
            TokenKind::Eof => ErrorCode::UnexpectedToken("end of input".to_string()),
            kind => ErrorCode::UnexpectedToken(describe(kind)),
        };
        self.error(code, token.span)
    }

    /// HTML-like comments are scanned in every script, but only sloppy code
    /// may contain them.
    pub(crate) fn check_html_comment(&self, token: &Token) -> Result<()> {
        if self.ctx.is_strict() && token.flags.contains(TokenFlags::HTML_COMMENT_BEFORE) {
            return Err(self.error(ErrorCode::HtmlCommentInStrict, token.span));
        }
        Ok(())
    }

    /// Record an error that only applies to strict code: fail now if the
    /// code is strict, otherwise keep it until the prologue is over.
    pub(crate) fn strict_violation(&mut self, code: ErrorCode, span: Span) -> Result<()> {
        if self.ctx.is_strict() {
            return Err(self.error(code, span));
        }
        if self.frame.open {
            self.frame.pending.push((code, span));
        }
        Ok(())
    }

    // =========================================================================
    // Context
    // =========================================================================

    /// Run `f` with `add` set and `remove` cleared, restoring the previous
    /// flags afterwards whether `f` succeeds or fails.
    pub(crate) fn with_context<T>(
        &mut self,
        add: Context,
        remove: Context,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = self.ctx;
        self.ctx = (saved - remove) | add;
        let result = f(self);
        self.ctx = saved;
        result
    }

    /// Run `f` with exactly the flags in `ctx`.
    pub(crate) fn in_context<T>(
        &mut self,
        ctx: Context,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_context(ctx, Context::all(), f)
    }

    /// Run `f` one nesting level deeper, growing the stack if needed.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.options.max_depth {
            return Err(self.error(ErrorCode::MaxRecursionDepth, self.current.span));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || f(self));
        self.depth -= 1;
        result
    }

    /// Left-associative chains (`a + b + c`, `a.b.c`) deepen the tree without
    /// recursing. Each link counts as one level against `max_depth`.
    pub(crate) fn check_chain_depth(&self, links: usize) -> Result<()> {
        if self.depth + links >= self.options.max_depth {
            return Err(self.error(ErrorCode::MaxRecursionDepth, self.current.span));
        }
        Ok(())
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Parse an `IdentifierReference`, `BindingIdentifier` or
    /// `LabelIdentifier`. Reserved words are parsed and then rejected so the
    /// error names them.
    pub(crate) fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current.clone();
        let name = match &token.kind {
            TokenKind::Identifier(name) => name.clone(),
            kind if kind.is_contextual() || kind.is_reserved() => {
                crate::token::keyword_to_str(kind).to_string()
            }
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        self.check_identifier(&name, token.span, token.is_escaped())?;
        Ok(Ident::new(name, token.span))
    }

    /// Parse an `IdentifierName` (any word, reserved or not), as used after
    /// `.` and in property keys.
    pub(crate) fn parse_ident_name(&mut self) -> Result<Ident> {
        let span = self.current.span;
        let name = match self.peek().identifier_name() {
            Some(name) => name.to_string(),
            None => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(Ident::new(name, span))
    }

    /// Whether the current token can be parsed by [`Parser::parse_ident`]
    /// without being rejected for its kind alone.
    pub(crate) fn at_identifier(&self) -> bool {
        self.peek().is_identifier_like()
    }

    /// Early errors for an identifier used as a reference or binding.
    pub(crate) fn check_identifier(&mut self, name: &str, span: Span, escaped: bool) -> Result<()> {
        match name {
            "yield" => {
                if self.ctx.has_yield() {
                    return Err(self.error(ErrorCode::YieldIdentifier, span));
                }
            }
            "await" => {
                if self.ctx.has_await()
                    || self.ctx.is_module()
                    || self.ctx.contains(Context::STATIC_BLOCK)
                {
                    return Err(self.error(ErrorCode::AwaitIdentifier, span));
                }
                if self.await_ident_pos.is_none() {
                    self.await_ident_pos = Some(span.start);
                }
            }
            "arguments" => {
                if self
                    .ctx
                    .intersects(Context::CLASS_FIELD_INIT | Context::STATIC_BLOCK)
                {
                    return Err(self.error(ErrorCode::ArgumentsInClassInit, span));
                }
            }
            _ => {}
        }
        if is_reserved_word(name) {
            let code = if escaped {
                ErrorCode::EscapedKeyword
            } else {
                ErrorCode::ReservedWord(name.to_string())
            };
            return Err(self.error(code, span));
        }
        if self.ctx.is_strict() && is_strict_reserved(name) {
            return Err(self.error(ErrorCode::StrictReservedWord(name.to_string()), span));
        }
        Ok(())
    }

    /// The strict-only error for binding `name`, if any.
    pub(crate) fn strict_binding_error(name: &str) -> Option<ErrorCode> {
        match name {
            "eval" | "arguments" => Some(ErrorCode::StrictEvalArguments),
            _ if is_strict_reserved(name) => Some(ErrorCode::StrictReservedWord(name.to_string())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        let options = ParserOptions::default();
        Parser::new(source, &options, Context::empty())?.parse()
    }

    #[test]
    fn test_empty_program() {
        let program = parse("").unwrap();
        assert!(program.body.is_empty());
        assert_eq!(program.span, Span::new(0, 0));
        assert_eq!(program.source_type, SourceType::Script);
    }

    #[test]
    fn test_program_span_covers_trailing_trivia() {
        let program = parse("a;  // done\n").unwrap();
        assert_eq!(program.span, Span::new(0, 12));
        assert_eq!(program.body[0].span, Span::new(0, 2));
    }

    #[test]
    fn test_strict_context_from_caller() {
        let options = ParserOptions::default();
        let err = Parser::new("with (a) {}", &options, Context::STRICT)
            .unwrap()
            .parse()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StrictWith);
    }

    #[test]
    fn test_module_context_from_caller() {
        let options = ParserOptions::default();
        let program = Parser::new("export const a = 1;", &options, Context::MODULE)
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(program.source_type, SourceType::Module);
    }

    #[test]
    fn test_max_depth() {
        let options = ParserOptions {
            max_depth: 20,
            ..ParserOptions::default()
        };
        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        let err = Parser::new(&source, &options, Context::empty())
            .unwrap()
            .parse()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxRecursionDepth);
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse("a b").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingSemicolon);
        assert_eq!(err.span, Span::new(2, 3));
    }

    #[test]
    fn test_escaped_keyword_reference() {
        let err = parse("var a = \\u0069f;").unwrap_err();
        assert_eq!(err.code, ErrorCode::EscapedKeyword);
    }
}
