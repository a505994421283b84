//! Cover grammar resolution and binding patterns.
//!
//! Object and array literals, parenthesized lists and `async(...)` calls are
//! parsed as expressions first. When `=` or `=>` follows, they are converted
//! here into [`Pattern`]s and checked for the targets only a pattern
//! rejects. Binding patterns in declarations and parameter lists are parsed
//! directly.

use rustc_hash::FxHashSet as HashSet;

use super::Parser;
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorCode, Result};
use crate::scope::BindingKind;
use crate::span::Span;
use crate::token::TokenKind;

/// Facts about an expression that only matter once it is known whether it
/// is an expression or a pattern.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CoverErrors {
    /// `{a = 1}`: legal only as a pattern.
    pub shorthand_assign: Option<Span>,
    /// A second `__proto__: v`: legal only as a pattern.
    pub double_proto: Option<Span>,
    /// A comma after a spread element: legal only as an expression.
    pub trailing_comma: Option<Span>,
    /// A parenthesized expression that is not a simple assignment target.
    pub parenthesized_assign: Option<Span>,
    /// Any parenthesized expression, which no binding pattern may contain.
    pub parenthesized_bind: Option<Span>,
}

impl CoverErrors {
    pub(crate) fn has_expression_errors(&self) -> bool {
        self.shorthand_assign.is_some() || self.double_proto.is_some()
    }
}

/// One element of a parenthesized list that may turn out to be an arrow
/// parameter list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParenItem {
    Expr(Expr),
    /// `...target`, only valid as the last arrow parameter.
    Rest(Pattern),
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Cover Grammar Checks
    // =========================================================================

    /// Fail if the record holds something a pattern may not contain.
    pub(crate) fn check_pattern_errors(&self, refs: &CoverErrors, is_assign: bool) -> Result<()> {
        if let Some(span) = refs.trailing_comma {
            return Err(self.error(ErrorCode::RestTrailingComma, span));
        }
        let parenthesized = if is_assign {
            refs.parenthesized_assign
        } else {
            refs.parenthesized_bind
        };
        match parenthesized {
            Some(span) => Err(self.error(ErrorCode::ParenthesizedPattern, span)),
            None => Ok(()),
        }
    }

    /// Fail if the record holds something an expression may not contain.
    pub(crate) fn check_expression_errors(&self, refs: &CoverErrors) -> Result<()> {
        if let Some(span) = refs.shorthand_assign {
            return Err(self.error(ErrorCode::ShorthandInitializer, span));
        }
        if let Some(span) = refs.double_proto {
            return Err(self.error(ErrorCode::DuplicateProto, span));
        }
        Ok(())
    }

    // =========================================================================
    // Expression to Pattern
    // =========================================================================

    /// Convert the left side of `=` into an assignment pattern.
    pub(crate) fn to_assign_target(
        &mut self,
        expr: Expr,
        refs: Option<&CoverErrors>,
    ) -> Result<Pattern> {
        let pattern = self.to_assignable(expr, false, refs)?;
        self.check_assign_pattern(&pattern)?;
        Ok(pattern)
    }

    /// Convert the left side of a compound or logical assignment, which must
    /// be an identifier or member expression.
    pub(crate) fn to_simple_target(&mut self, expr: Expr) -> Result<Pattern> {
        let inner = unwrap_parens(expr);
        let span = inner.span;
        match inner.kind {
            ExprKind::Ident(name) => {
                self.check_assign_ident(&name, span)?;
                Ok(Pattern::new(PatternKind::Ident(name), span))
            }
            kind @ ExprKind::Member { .. } => Ok(Pattern::new(
                PatternKind::Member(Box::new(Expr::new(kind, span))),
                span,
            )),
            _ => Err(self.error(ErrorCode::InvalidAssignmentTarget, span)),
        }
    }

    /// `++` and `--` operands must be identifiers or member expressions.
    pub(crate) fn check_update_target(&self, expr: &Expr, position: &'static str) -> Result<()> {
        let inner = expr.unparenthesized();
        match &inner.kind {
            ExprKind::Ident(name) => self.check_assign_ident(name, inner.span),
            ExprKind::Member { .. } => Ok(()),
            _ => Err(self.error(ErrorCode::InvalidUpdateTarget(position), expr.span)),
        }
    }

    fn check_assign_ident(&self, name: &str, span: Span) -> Result<()> {
        if self.ctx.is_strict() && matches!(name, "eval" | "arguments") {
            return Err(self.error(ErrorCode::StrictEvalArguments, span));
        }
        Ok(())
    }

    fn check_assign_pattern(&self, pattern: &Pattern) -> Result<()> {
        match &pattern.kind {
            PatternKind::Ident(name) => self.check_assign_ident(name, pattern.span),
            PatternKind::Member(_) => Ok(()),
            PatternKind::Array(elements) => elements
                .iter()
                .flatten()
                .try_for_each(|element| self.check_assign_pattern(element)),
            PatternKind::Object(props) => props.iter().try_for_each(|prop| match prop {
                PatternProp::Property { value, .. } => self.check_assign_pattern(value),
                PatternProp::Rest(rest) => self.check_assign_pattern(rest),
            }),
            PatternKind::Assign { left, .. } => self.check_assign_pattern(left),
            PatternKind::Rest(arg) => self.check_assign_pattern(arg),
        }
    }

    fn to_assignable(
        &mut self,
        expr: Expr,
        is_binding: bool,
        refs: Option<&CoverErrors>,
    ) -> Result<Pattern> {
        let span = expr.span;
        let invalid = if is_binding {
            ErrorCode::InvalidBindingPattern
        } else {
            ErrorCode::InvalidAssignmentTarget
        };
        let kind = match expr.kind {
            ExprKind::Ident(name) => {
                if name == "await" && self.ctx.has_await() {
                    return Err(self.error(ErrorCode::AwaitIdentifier, span));
                }
                PatternKind::Ident(name)
            }
            ExprKind::Object(members) => {
                if let Some(refs) = refs {
                    self.check_pattern_errors(refs, true)?;
                }
                let count = members.len();
                let mut props = Vec::with_capacity(count);
                for (index, member) in members.into_iter().enumerate() {
                    match member {
                        ObjectMember::Property(prop) => {
                            if prop.kind != PropertyKind::Init || prop.method {
                                return Err(self.error(
                                    ErrorCode::InvalidDestructuringTarget,
                                    prop.key.span(),
                                ));
                            }
                            let value = self.to_assignable(prop.value, is_binding, None)?;
                            props.push(PatternProp::Property {
                                key: prop.key,
                                value,
                                shorthand: prop.shorthand,
                                span: prop.span,
                            });
                        }
                        ObjectMember::Spread { arg, span } => {
                            if index + 1 != count {
                                return Err(self.error(ErrorCode::RestNotLast, span));
                            }
                            let arg = self.to_assignable(arg, is_binding, None)?;
                            if !matches!(arg.kind, PatternKind::Ident(_) | PatternKind::Member(_)) {
                                return Err(self.error(ErrorCode::InvalidRestTarget, arg.span));
                            }
                            props.push(PatternProp::Rest(Pattern::new(
                                PatternKind::Rest(Box::new(arg)),
                                span,
                            )));
                        }
                    }
                }
                PatternKind::Object(props)
            }
            ExprKind::Array(elements) => {
                if let Some(refs) = refs {
                    self.check_pattern_errors(refs, true)?;
                }
                let count = elements.len();
                let mut patterns = Vec::with_capacity(count);
                for (index, element) in elements.into_iter().enumerate() {
                    let Some(element) = element else {
                        patterns.push(None);
                        continue;
                    };
                    if let ExprKind::Spread(arg) = element.kind {
                        if index + 1 != count {
                            return Err(self.error(ErrorCode::RestNotLast, element.span));
                        }
                        let arg = self.to_assignable(*arg, is_binding, None)?;
                        if matches!(arg.kind, PatternKind::Assign { .. }) {
                            return Err(self.error(ErrorCode::RestInitializer, arg.span));
                        }
                        patterns.push(Some(Pattern::new(
                            PatternKind::Rest(Box::new(arg)),
                            element.span,
                        )));
                    } else {
                        patterns.push(Some(self.to_assignable(element, is_binding, None)?));
                    }
                }
                PatternKind::Array(patterns)
            }
            ExprKind::Assign { op, target, value } => {
                if op != AssignOp::Assign {
                    return Err(self.error(ErrorCode::InvalidDestructuringTarget, span));
                }
                PatternKind::Assign {
                    left: target,
                    right: value,
                }
            }
            ExprKind::Paren(inner) => {
                if is_binding {
                    return Err(self.error(ErrorCode::ParenthesizedPattern, span));
                }
                match inner.unparenthesized().kind {
                    ExprKind::Ident(_) | ExprKind::Member { .. } => {
                        return self.to_assignable(*inner, false, refs);
                    }
                    ExprKind::Object(_) | ExprKind::Array(_) | ExprKind::Assign { .. } => {
                        return Err(self.error(ErrorCode::ParenthesizedPattern, span));
                    }
                    _ => return Err(self.error(invalid, span)),
                }
            }
            kind @ ExprKind::Member { .. } => {
                if is_binding {
                    return Err(self.error(invalid, span));
                }
                PatternKind::Member(Box::new(Expr::new(kind, span)))
            }
            _ => return Err(self.error(invalid, span)),
        };
        Ok(Pattern::new(kind, span))
    }

    /// Convert a parenthesized list or `async(...)` arguments into arrow
    /// parameters.
    pub(crate) fn to_params(&mut self, items: Vec<ParenItem>) -> Result<Vec<Pattern>> {
        let count = items.len();
        let mut params = Vec::with_capacity(count);
        for (index, item) in items.into_iter().enumerate() {
            let param = match item {
                ParenItem::Rest(rest) => rest,
                ParenItem::Expr(Expr {
                    kind: ExprKind::Spread(arg),
                    span,
                }) => {
                    if index + 1 != count {
                        return Err(self.error(ErrorCode::RestNotLast, span));
                    }
                    let arg = self.to_assignable(*arg, true, None)?;
                    if matches!(arg.kind, PatternKind::Assign { .. }) {
                        return Err(self.error(ErrorCode::RestInitializer, arg.span));
                    }
                    Pattern::new(PatternKind::Rest(Box::new(arg)), span)
                }
                ParenItem::Expr(expr) => self.to_assignable(expr, true, None)?,
            };
            params.push(param);
        }
        Ok(params)
    }

    // =========================================================================
    // Declaring Bindings
    // =========================================================================

    /// Check every name bound by `pattern` and declare it with `kind`.
    pub(crate) fn declare_pattern(&mut self, pattern: &Pattern, kind: BindingKind) -> Result<()> {
        match &pattern.kind {
            PatternKind::Ident(name) => self.declare_binding(name, pattern.span, kind),
            PatternKind::Member(_) => {
                Err(self.error(ErrorCode::InvalidBindingPattern, pattern.span))
            }
            PatternKind::Array(elements) => elements
                .iter()
                .flatten()
                .try_for_each(|element| self.declare_pattern(element, kind)),
            PatternKind::Object(props) => props.iter().try_for_each(|prop| match prop {
                PatternProp::Property { value, .. } => self.declare_pattern(value, kind),
                PatternProp::Rest(rest) => self.declare_pattern(rest, kind),
            }),
            PatternKind::Assign { left, .. } => self.declare_pattern(left, kind),
            PatternKind::Rest(arg) => self.declare_pattern(arg, kind),
        }
    }

    /// Binding-only checks for one name, then record it in the scope.
    pub(crate) fn declare_binding(&mut self, name: &str, span: Span, kind: BindingKind) -> Result<()> {
        if kind == BindingKind::Lexical && name == "let" {
            return Err(self.error(ErrorCode::LetInLexicalBinding, span));
        }
        if let Some(code) = Self::strict_binding_error(name) {
            self.strict_violation(code, span)?;
        }
        self.declare_name(name, span, kind)
    }

    /// Record `name` in the current scope without binding checks.
    pub(crate) fn declare_name(&mut self, name: &str, span: Span, kind: BindingKind) -> Result<()> {
        match self.scopes.declare(name, kind) {
            Ok(top_level) => {
                if top_level && self.ctx.is_module() {
                    self.module_record.resolve(name);
                }
                Ok(())
            }
            Err(code) => Err(self.error(code, span)),
        }
    }

    /// Reject duplicate parameter names. Sloppy functions with simple
    /// parameter lists may repeat names until a `"use strict"` shows up.
    pub(crate) fn check_params(&mut self, params: &[Pattern], allow_duplicates: bool) -> Result<()> {
        let mut names = Vec::new();
        for param in params {
            param.bound_names(&mut names);
        }
        let mut seen = HashSet::default();
        let mut duplicate = None;
        for (name, span) in names {
            if !seen.insert(name) && duplicate.is_none() {
                duplicate = Some(span);
            }
        }
        match duplicate {
            Some(span) if allow_duplicates => {
                self.strict_violation(ErrorCode::DuplicateParameter, span)
            }
            Some(span) => Err(self.error(ErrorCode::DuplicateParameter, span)),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Binding Patterns
    // =========================================================================

    /// Parse a `BindingIdentifier` or `BindingPattern`.
    pub(crate) fn parse_binding_target(&mut self) -> Result<Pattern> {
        self.nested(|p| match p.peek() {
            TokenKind::LBracket => p.parse_array_binding(),
            TokenKind::LBrace => p.parse_object_binding(),
            _ => {
                let id = p.parse_ident()?;
                Ok(Pattern::new(PatternKind::Ident(id.name), id.span))
            }
        })
    }

    /// Parse a binding target with an optional default value.
    pub(crate) fn parse_binding_element(&mut self) -> Result<Pattern> {
        let start = self.start();
        let target = self.parse_binding_target()?;
        self.parse_binding_default(start, target)
    }

    fn parse_binding_default(&mut self, start: u32, target: Pattern) -> Result<Pattern> {
        if !self.eat(&TokenKind::Eq)? {
            return Ok(target);
        }
        let right = self.with_context(Context::empty(), Context::DISALLOW_IN, |p| {
            p.parse_assign_expr(None)
        })?;
        Ok(Pattern::new(
            PatternKind::Assign {
                left: Box::new(target),
                right: Box::new(right),
            },
            self.span_from(start),
        ))
    }

    /// Parse `...target`. The closing token `close` must follow directly and
    /// is left for the caller.
    pub(crate) fn parse_binding_rest(&mut self, close: &TokenKind) -> Result<Pattern> {
        let start = self.start();
        self.expect(&TokenKind::Spread)?;
        let target = self.parse_binding_target()?;
        match self.peek() {
            TokenKind::Eq => return Err(self.error(ErrorCode::RestInitializer, self.current.span)),
            TokenKind::Comma => {
                let comma = self.current.span;
                let next = self.peek_next()?;
                let code = if std::mem::discriminant(&next.kind) == std::mem::discriminant(close) {
                    ErrorCode::RestTrailingComma
                } else {
                    ErrorCode::RestNotLast
                };
                return Err(self.error(code, comma));
            }
            _ => {}
        }
        Ok(Pattern::new(
            PatternKind::Rest(Box::new(target)),
            self.span_from(start),
        ))
    }

    fn parse_array_binding(&mut self) -> Result<Pattern> {
        let start = self.start();
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            match self.peek() {
                TokenKind::Comma => {
                    self.advance()?;
                    elements.push(None);
                    continue;
                }
                TokenKind::Spread => {
                    elements.push(Some(self.parse_binding_rest(&TokenKind::RBracket)?));
                    break;
                }
                _ => elements.push(Some(self.parse_binding_element()?)),
            }
            if !self.check(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Pattern::new(
            PatternKind::Array(elements),
            self.span_from(start),
        ))
    }

    fn parse_object_binding(&mut self) -> Result<Pattern> {
        let start = self.start();
        self.expect(&TokenKind::LBrace)?;
        let mut props = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Spread) {
                let rest_start = self.start();
                self.advance()?;
                let id = self.parse_ident()?;
                if self.check(&TokenKind::Comma) {
                    return Err(self.error(ErrorCode::RestTrailingComma, self.current.span));
                }
                props.push(PatternProp::Rest(Pattern::new(
                    PatternKind::Rest(Box::new(Pattern::new(PatternKind::Ident(id.name), id.span))),
                    self.span_from(rest_start),
                )));
                break;
            }
            props.push(self.parse_binding_property()?);
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Pattern::new(
            PatternKind::Object(props),
            self.span_from(start),
        ))
    }

    fn parse_binding_property(&mut self) -> Result<PatternProp> {
        let start = self.start();
        let key_token = self.current.clone();
        let key = self.parse_property_key(false)?;

        if self.eat(&TokenKind::Colon)? {
            let value = self.parse_binding_element()?;
            return Ok(PatternProp::Property {
                key,
                value,
                shorthand: false,
                span: self.span_from(start),
            });
        }

        // Shorthand `{ a }` or `{ a = 1 }`: the key is also the binding.
        let PropertyKey::Ident(id) = &key else {
            return Err(self.unexpected());
        };
        self.check_identifier(&id.name, id.span, key_token.is_escaped())?;
        let target = Pattern::new(PatternKind::Ident(id.name.clone()), id.span);
        let value = self.parse_binding_default(start, target)?;
        Ok(PatternProp::Property {
            key,
            value,
            shorthand: true,
            span: self.span_from(start),
        })
    }
}

/// Strip any number of parentheses.
fn unwrap_parens(mut expr: Expr) -> Expr {
    while let ExprKind::Paren(inner) = expr.kind {
        expr = *inner;
    }
    expr
}
