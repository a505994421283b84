//! Expression parsing.
//!
//! The levels follow the grammar: assignment, conditional, binary operators
//! by precedence climbing, unary, call/member subscripts and primary
//! expressions. Callers that may still reinterpret the result as a pattern
//! pass a [`CoverErrors`] record down; everyone else passes `None` and the
//! record is checked as soon as the expression is known to be one.

use super::class::ClassKind;
use super::function::FunctionKind;
use super::pattern::ParenItem;
use super::{CoverErrors, Parser};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorCode, Result};
use crate::regexp;
use crate::span::Span;
use crate::token::{describe, TokenKind};

/// `&&`'s precedence, which also bounds the right operand of `??`.
const AND_PRECEDENCE: u8 = 3;

/// A binary operator as the AST splits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Result of parsing one subscript.
enum Step {
    /// A member access, call or tagged template; keep going.
    More { expr: Expr, optional: bool },
    /// Nothing more to attach.
    Done(Expr),
    /// `async (...) => body`
    Arrow(Expr),
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Expressions
    // =========================================================================

    /// Parse an expression, including comma sequences.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_sequence(None)
    }

    /// Parse an expression that may still turn out to be a `for-in` or
    /// `for-of` target.
    pub(crate) fn parse_expr_cover(&mut self, refs: &mut CoverErrors) -> Result<Expr> {
        self.parse_sequence(Some(refs))
    }

    fn parse_sequence(&mut self, mut refs: Option<&mut CoverErrors>) -> Result<Expr> {
        let start = self.start();
        let first = self.parse_assign_expr(refs.as_deref_mut())?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat(&TokenKind::Comma)? {
            exprs.push(self.parse_assign_expr(refs.as_deref_mut())?);
        }
        Ok(Expr::new(ExprKind::Sequence(exprs), self.span_from(start)))
    }

    /// Run `f` with the `in` operator allowed again, as inside any brackets.
    pub(crate) fn allow_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.with_context(Context::empty(), Context::DISALLOW_IN, f)
    }

    /// Parse an `AssignmentExpression`.
    pub(crate) fn parse_assign_expr(&mut self, refs: Option<&mut CoverErrors>) -> Result<Expr> {
        self.nested(|p| p.parse_assign_expr_inner(refs))
    }

    fn parse_assign_expr_inner(&mut self, refs: Option<&mut CoverErrors>) -> Result<Expr> {
        let for_await_head = std::mem::take(&mut self.for_await_head);
        if self.ctx.has_yield() && self.check(&TokenKind::Yield) {
            return self.parse_yield();
        }

        let mut own = CoverErrors::default();
        let owned = refs.is_none();
        let refs = match refs {
            Some(refs) => refs,
            None => &mut own,
        };
        let old_paren_assign = refs.parenthesized_assign.take();
        let old_trailing_comma = refs.trailing_comma.take();
        let old_double_proto = refs.double_proto;

        let start = self.start();
        if self.check(&TokenKind::LParen) || self.at_identifier() {
            self.potential_arrow_at = Some(start);
            self.potential_arrow_in_for_await = for_await_head;
        }

        let left = self.parse_conditional(refs)?;

        let Some(op) = assign_op(self.peek()) else {
            if owned {
                self.check_expression_errors(refs)?;
            }
            if old_paren_assign.is_some() {
                refs.parenthesized_assign = old_paren_assign;
            }
            if old_trailing_comma.is_some() {
                refs.trailing_comma = old_trailing_comma;
            }
            return Ok(left);
        };

        let left_start = left.span.start;
        let target = if op == AssignOp::Assign {
            self.to_assign_target(left, Some(refs))?
        } else {
            self.to_simple_target(left)?
        };
        if !owned {
            refs.parenthesized_assign = None;
            refs.trailing_comma = None;
            refs.double_proto = None;
        }
        // A shorthand default inside the target was used correctly.
        if refs.shorthand_assign.is_some_and(|span| span.start >= left_start) {
            refs.shorthand_assign = None;
        }

        self.advance()?;
        let value = self.parse_assign_expr(None)?;
        if old_double_proto.is_some() {
            refs.double_proto = old_double_proto;
        }
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            self.span_from(start),
        ))
    }

    fn parse_yield(&mut self) -> Result<Expr> {
        let start = self.start();
        if self.ctx.contains(Context::IN_PARAMETERS) {
            return Err(self.error(ErrorCode::YieldInParameter, self.current.span));
        }
        self.yield_pos.get_or_insert(start);
        self.advance()?;

        let has_arg = !self.check(&TokenKind::Semicolon)
            && !self.can_insert_semicolon()
            && (self.check(&TokenKind::Star) || self.peek().can_start_expr());
        let (arg, delegate) = if has_arg {
            let delegate = self.eat(&TokenKind::Star)?;
            (Some(Box::new(self.parse_assign_expr(None)?)), delegate)
        } else {
            (None, false)
        };
        Ok(Expr::new(
            ExprKind::Yield { arg, delegate },
            self.span_from(start),
        ))
    }

    fn parse_conditional(&mut self, refs: &mut CoverErrors) -> Result<Expr> {
        let start = self.start();
        let test = self.parse_binary(refs)?;
        if refs.has_expression_errors()
            || matches!(test.kind, ExprKind::Arrow(_))
            || !self.check(&TokenKind::Question)
        {
            return Ok(test);
        }
        self.advance()?;
        let consequent = self.allow_in(|p| p.parse_assign_expr(None))?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assign_expr(None)?;
        Ok(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            self.span_from(start),
        ))
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn parse_binary(&mut self, refs: &mut CoverErrors) -> Result<Expr> {
        let start = self.start();
        let expr = self.parse_unary(Some(refs), false, false)?;
        if refs.has_expression_errors() || matches!(expr.kind, ExprKind::Arrow(_)) {
            return Ok(expr);
        }
        self.parse_binary_rhs(expr, start, 0)
    }

    /// Precedence climbing over the binary and logical operators.
    fn parse_binary_rhs(&mut self, mut left: Expr, start: u32, min_prec: u8) -> Result<Expr> {
        let mut links = 0;
        loop {
            let Some((op, prec)) = self.binary_operator() else {
                return Ok(left);
            };
            if prec <= min_prec {
                return Ok(left);
            }
            links += 1;
            self.check_chain_depth(links)?;
            let coalesce = op == Operator::Logical(LogicalOp::NullishCoalesce);
            let logical = matches!(op, Operator::Logical(LogicalOp::And | LogicalOp::Or));
            let right_prec = if coalesce { AND_PRECEDENCE } else { prec };
            self.advance()?;

            let right_start = self.start();
            let right = self.parse_unary(None, false, false)?;
            // Links on the left spine count toward the depth of the right
            // operand's own chain.
            self.depth += links;
            let right = self.parse_binary_rhs(right, right_start, right_prec);
            self.depth -= links;
            let right = right?;
            if matches!(right.kind, ExprKind::PrivateName(_)) {
                return Err(self.error(
                    ErrorCode::UnexpectedToken(format!("private name '#{}'", private_name(&right))),
                    right.span,
                ));
            }

            let span = self.span_from(start);
            let (left_box, right_box) = (Box::new(left), Box::new(right));
            left = match op {
                Operator::Binary(op) => Expr::new(
                    ExprKind::Binary {
                        op,
                        left: left_box,
                        right: right_box,
                    },
                    span,
                ),
                Operator::Logical(op) => Expr::new(
                    ExprKind::Logical {
                        op,
                        left: left_box,
                        right: right_box,
                    },
                    span,
                ),
            };

            let mixed = (logical && self.check(&TokenKind::QuestionQuestion))
                || (coalesce && matches!(self.peek(), TokenKind::AmpAmp | TokenKind::PipePipe));
            if mixed {
                return Err(self.error(ErrorCode::MixedCoalesce, self.current.span));
            }
        }
    }

    /// The binary operator at the current token with its precedence. `in` is
    /// not an operator while parsing a `for` head; `**` is handled with the
    /// unary operators.
    fn binary_operator(&self) -> Option<(Operator, u8)> {
        let kind = self.peek();
        let op = match kind {
            TokenKind::PipePipe => Operator::Logical(LogicalOp::Or),
            TokenKind::AmpAmp => Operator::Logical(LogicalOp::And),
            TokenKind::QuestionQuestion => Operator::Logical(LogicalOp::NullishCoalesce),
            TokenKind::Pipe => Operator::Binary(BinaryOp::BitOr),
            TokenKind::Caret => Operator::Binary(BinaryOp::BitXor),
            TokenKind::Amp => Operator::Binary(BinaryOp::BitAnd),
            TokenKind::EqEq => Operator::Binary(BinaryOp::Eq),
            TokenKind::BangEq => Operator::Binary(BinaryOp::NotEq),
            TokenKind::EqEqEq => Operator::Binary(BinaryOp::StrictEq),
            TokenKind::BangEqEq => Operator::Binary(BinaryOp::StrictNotEq),
            TokenKind::Lt => Operator::Binary(BinaryOp::Lt),
            TokenKind::LtEq => Operator::Binary(BinaryOp::LtEq),
            TokenKind::Gt => Operator::Binary(BinaryOp::Gt),
            TokenKind::GtEq => Operator::Binary(BinaryOp::GtEq),
            TokenKind::In if self.ctx.has_in() => Operator::Binary(BinaryOp::In),
            TokenKind::Instanceof => Operator::Binary(BinaryOp::Instanceof),
            TokenKind::LtLt => Operator::Binary(BinaryOp::Shl),
            TokenKind::GtGt => Operator::Binary(BinaryOp::Shr),
            TokenKind::GtGtGt => Operator::Binary(BinaryOp::UShr),
            TokenKind::Plus => Operator::Binary(BinaryOp::Add),
            TokenKind::Minus => Operator::Binary(BinaryOp::Sub),
            TokenKind::Star => Operator::Binary(BinaryOp::Mul),
            TokenKind::Slash => Operator::Binary(BinaryOp::Div),
            TokenKind::Percent => Operator::Binary(BinaryOp::Mod),
            _ => return None,
        };
        kind.binary_precedence().map(|prec| (op, prec))
    }

    /// Parse a unary expression. `saw_unary` is set for the operand of a
    /// unary operator, which may not be the base of `**`; `inc_dec` for the
    /// operand of a prefix `++`/`--`.
    fn parse_unary(
        &mut self,
        mut refs: Option<&mut CoverErrors>,
        mut saw_unary: bool,
        inc_dec: bool,
    ) -> Result<Expr> {
        let start = self.start();
        let expr = if self.ctx.has_await() && self.check(&TokenKind::Await) {
            saw_unary = true;
            self.parse_await()?
        } else if let Some(op) = update_op(self.peek()) {
            self.advance()?;
            let arg = self.nested(|p| p.parse_unary(None, true, true))?;
            self.check_update_target(&arg, "prefix")?;
            Expr::new(
                ExprKind::Update {
                    op,
                    prefix: true,
                    arg: Box::new(arg),
                },
                self.span_from(start),
            )
        } else if let Some(op) = unary_op(self.peek()) {
            self.advance()?;
            let arg = self.nested(|p| p.parse_unary(None, true, false))?;
            let span = self.span_from(start);
            if op == UnaryOp::Delete {
                if self.ctx.is_strict() && matches!(arg.unparenthesized().kind, ExprKind::Ident(_)) {
                    return Err(self.error(ErrorCode::StrictDelete, span));
                }
                if is_private_access(&arg) {
                    return Err(self.error(ErrorCode::DeletePrivateField, span));
                }
            }
            saw_unary = true;
            Expr::new(
                ExprKind::Unary {
                    op,
                    arg: Box::new(arg),
                },
                span,
            )
        } else if let (TokenKind::PrivateName(name), false) = (self.peek(), saw_unary) {
            // `#x in obj`
            let name = name.clone();
            let span = self.current.span;
            if !self.ctx.has_in() || self.private_names.is_empty() {
                return Err(self.unexpected());
            }
            self.advance()?;
            if !self.check(&TokenKind::In) {
                return Err(self.unexpected());
            }
            self.private_names
                .reference(&name, span)
                .map_err(|code| self.error(code, span))?;
            Expr::new(ExprKind::PrivateName(name), span)
        } else {
            let expr = self.parse_lhs(refs.as_deref_mut())?;
            if refs.is_some_and(|refs| refs.has_expression_errors()) {
                return Ok(expr);
            }
            if matches!(self.peek(), TokenKind::PlusPlus | TokenKind::MinusMinus)
                && !self.current.had_newline_before()
            {
                self.check_update_target(&expr, "postfix")?;
                let op = match self.advance()?.kind {
                    TokenKind::PlusPlus => UpdateOp::Increment,
                    _ => UpdateOp::Decrement,
                };
                Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: false,
                        arg: Box::new(expr),
                    },
                    self.span_from(start),
                )
            } else {
                expr
            }
        };

        if inc_dec || !self.check(&TokenKind::StarStar) {
            return Ok(expr);
        }
        if saw_unary {
            return Err(self.error(ErrorCode::UnexpectedUnaryExponent, self.current.span));
        }
        self.advance()?;
        let right = self.nested(|p| p.parse_unary(None, false, false))?;
        Ok(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Pow,
                left: Box::new(expr),
                right: Box::new(right),
            },
            self.span_from(start),
        ))
    }

    fn parse_await(&mut self) -> Result<Expr> {
        let start = self.start();
        if self.ctx.contains(Context::IN_PARAMETERS) {
            return Err(self.error(ErrorCode::AwaitInParameter, self.current.span));
        }
        self.await_pos.get_or_insert(start);
        self.advance()?;
        let arg = self.nested(|p| p.parse_unary(None, true, false))?;
        Ok(Expr::new(
            ExprKind::Await(Box::new(arg)),
            self.span_from(start),
        ))
    }

    // =========================================================================
    // Calls and Member Access
    // =========================================================================

    /// Parse a primary expression followed by its subscripts.
    pub(crate) fn parse_lhs(&mut self, mut refs: Option<&mut CoverErrors>) -> Result<Expr> {
        let start = self.start();
        let atom = self.parse_atom(refs.as_deref_mut(), false)?;
        if matches!(atom.kind, ExprKind::Arrow(_)) {
            return Ok(atom);
        }
        let result = self.parse_subscripts(atom, start, false)?;
        if let (Some(refs), ExprKind::Member { .. }) = (refs, &result.kind) {
            // Parentheses and spreads inside a member expression do not
            // affect its use as a target.
            let from = result.span.start;
            let inside = |span: Option<Span>| span.filter(|span| span.start < from);
            refs.parenthesized_assign = inside(refs.parenthesized_assign);
            refs.parenthesized_bind = inside(refs.parenthesized_bind);
            refs.trailing_comma = inside(refs.trailing_comma);
        }
        Ok(result)
    }

    /// Attach member accesses, calls and tagged templates to `base`.
    /// `no_calls` is set for the callee of `new`.
    pub(crate) fn parse_subscripts(&mut self, mut base: Expr, start: u32, no_calls: bool) -> Result<Expr> {
        let maybe_async_arrow = matches!(&base.kind, ExprKind::Ident(name) if name == "async")
            && base.span.len() == 5
            && self.prev_end == base.span.end
            && !self.can_insert_semicolon()
            && self.potential_arrow_at == Some(base.span.start);
        let mut chained = false;
        let mut links = 0;
        loop {
            match self.parse_subscript(base, start, no_calls, maybe_async_arrow, chained)? {
                Step::More { expr, optional } => {
                    links += 1;
                    self.check_chain_depth(links)?;
                    chained |= optional;
                    base = expr;
                }
                Step::Done(expr) if chained => {
                    let span = expr.span;
                    return Ok(Expr::new(ExprKind::Chain(Box::new(expr)), span));
                }
                Step::Done(expr) | Step::Arrow(expr) => return Ok(expr),
            }
        }
    }

    fn parse_subscript(
        &mut self,
        base: Expr,
        start: u32,
        no_calls: bool,
        maybe_async_arrow: bool,
        chained: bool,
    ) -> Result<Step> {
        let maybe_async_arrow = maybe_async_arrow && matches!(base.kind, ExprKind::Ident(_));
        let optional = self.check(&TokenKind::QuestionDot);
        if optional {
            if no_calls {
                return Err(self.error(ErrorCode::OptionalChainNew, self.current.span));
            }
            self.advance()?;
        }

        let computed = self.eat(&TokenKind::LBracket)?;
        let member = computed
            || (optional && !matches!(self.peek(), TokenKind::LParen) && !self.at_template())
            || self.eat(&TokenKind::Dot)?;
        if member {
            let property = if computed {
                let expr = self.allow_in(|p| p.parse_expr())?;
                self.expect(&TokenKind::RBracket)?;
                MemberProp::Computed(Box::new(expr))
            } else if let TokenKind::PrivateName(name) = self.peek() {
                if matches!(base.kind, ExprKind::Super) {
                    return Err(self.unexpected());
                }
                let id = Ident::new(name.clone(), self.current.span);
                self.advance()?;
                self.private_names
                    .reference(&id.name, id.span)
                    .map_err(|code| self.error(code, id.span))?;
                MemberProp::Private(id)
            } else {
                MemberProp::Ident(self.parse_ident_name()?)
            };
            let expr = Expr::new(
                ExprKind::Member {
                    object: Box::new(base),
                    property,
                    optional,
                },
                self.span_from(start),
            );
            return Ok(Step::More { expr, optional });
        }

        if !no_calls && self.check(&TokenKind::LParen) {
            self.advance()?;
            let old_yield = self.yield_pos.take();
            let old_await = self.await_pos.take();
            let old_await_ident = self.await_ident_pos.take();
            let mut refs = CoverErrors::default();
            let args = self.allow_in(|p| p.parse_arguments(&mut refs))?;

            if maybe_async_arrow && !optional && self.check(&TokenKind::Arrow) {
                if self.current.had_newline_before() {
                    return Err(self.error(ErrorCode::NewlineBeforeArrow, self.current.span));
                }
                self.advance()?;
                self.check_pattern_errors(&refs, false)?;
                self.check_arrow_param_expressions()?;
                if let Some(pos) = self.await_ident_pos {
                    return Err(self.error(ErrorCode::AwaitIdentifier, Span::new(pos, pos + 5)));
                }
                self.yield_pos = old_yield;
                self.await_pos = old_await;
                self.await_ident_pos = old_await_ident;
                let items = args.into_iter().map(ParenItem::Expr).collect();
                return Ok(Step::Arrow(self.parse_arrow(start, items, true)?));
            }

            self.check_expression_errors(&refs)?;
            self.yield_pos = old_yield.or(self.yield_pos);
            self.await_pos = old_await.or(self.await_pos);
            self.await_ident_pos = old_await_ident.or(self.await_ident_pos);
            let expr = Expr::new(
                ExprKind::Call {
                    callee: Box::new(base),
                    args,
                    optional,
                },
                self.span_from(start),
            );
            return Ok(Step::More { expr, optional });
        }

        if self.at_template() {
            if optional || chained {
                return Err(self.error(ErrorCode::OptionalChainTemplate, self.current.span));
            }
            let quasi = self.parse_template(true)?;
            let expr = Expr::new(
                ExprKind::TaggedTemplate {
                    tag: Box::new(base),
                    quasi: Box::new(quasi),
                },
                self.span_from(start),
            );
            return Ok(Step::More {
                expr,
                optional: false,
            });
        }

        Ok(Step::Done(base))
    }

    /// Parse call arguments after `(`, through the closing `)`.
    pub(crate) fn parse_arguments(&mut self, refs: &mut CoverErrors) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.eat(&TokenKind::RParen)? {
            if !args.is_empty() {
                self.expect(&TokenKind::Comma)?;
                if self.eat(&TokenKind::RParen)? {
                    break;
                }
            }
            if self.check(&TokenKind::Spread) {
                let start = self.start();
                self.advance()?;
                let arg = self.parse_assign_expr(Some(&mut *refs))?;
                if self.check(&TokenKind::Comma) && refs.trailing_comma.is_none() {
                    refs.trailing_comma = Some(self.current.span);
                }
                args.push(Expr::new(
                    ExprKind::Spread(Box::new(arg)),
                    self.span_from(start),
                ));
            } else {
                args.push(self.parse_assign_expr(Some(&mut *refs))?);
            }
        }
        Ok(args)
    }

    /// A `yield` or `await` expression in what turned out to be an arrow
    /// parameter list.
    pub(crate) fn check_arrow_param_expressions(&self) -> Result<()> {
        match (self.yield_pos, self.await_pos) {
            (Some(y), a) if a.map_or(true, |a| y < a) => {
                Err(self.error(ErrorCode::YieldInParameter, Span::new(y, y + 5)))
            }
            (_, Some(a)) => Err(self.error(ErrorCode::AwaitInParameter, Span::new(a, a + 5))),
            _ => Ok(()),
        }
    }

    fn at_template(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_)
        )
    }

    // =========================================================================
    // Primary Expressions
    // =========================================================================

    fn parse_atom(&mut self, refs: Option<&mut CoverErrors>, for_new: bool) -> Result<Expr> {
        let start = self.start();
        let can_be_arrow = self.potential_arrow_at == Some(start);
        match self.peek() {
            TokenKind::Slash | TokenKind::SlashEq => self.parse_regex(),
            TokenKind::Super => self.parse_super(),
            TokenKind::This => {
                let token = self.advance()?;
                Ok(Expr::new(ExprKind::This, token.span))
            }
            TokenKind::Null => {
                let token = self.advance()?;
                Ok(Expr::new(ExprKind::Null, token.span))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance()?;
                let value = matches!(token.kind, TokenKind::True);
                Ok(Expr::new(ExprKind::Bool(value), token.span))
            }
            TokenKind::String(_) | TokenKind::Number(_) | TokenKind::BigInt(_) => {
                self.parse_literal()
            }
            TokenKind::LParen => {
                let expr = self.parse_paren_and_distinguish(can_be_arrow)?;
                if let (Some(refs), false) = (refs, matches!(expr.kind, ExprKind::Arrow(_))) {
                    if refs.parenthesized_assign.is_none() && !is_simple_target(&expr) {
                        refs.parenthesized_assign = Some(expr.span);
                    }
                    if refs.parenthesized_bind.is_none() {
                        refs.parenthesized_bind = Some(expr.span);
                    }
                }
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(refs),
            TokenKind::LBrace => self.parse_object_literal(refs),
            TokenKind::Function => {
                let function = self.parse_function(start, false, FunctionKind::Expression)?;
                Ok(Expr::new(
                    ExprKind::Function(Box::new(function)),
                    self.span_from(start),
                ))
            }
            TokenKind::Class | TokenKind::At => {
                let decorators = self.parse_decorators()?;
                if !self.check(&TokenKind::Class) {
                    return Err(self.error(ErrorCode::DecoratorPosition, self.span_from(start)));
                }
                let class = self.parse_class(start, decorators, ClassKind::Expression)?;
                Ok(Expr::new(
                    ExprKind::Class(Box::new(class)),
                    self.span_from(start),
                ))
            }
            TokenKind::New => self.parse_new(),
            TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                let template = self.parse_template(false)?;
                let span = template.span;
                Ok(Expr::new(ExprKind::Template(Box::new(template)), span))
            }
            TokenKind::Import => self.parse_import_expr(for_new),
            kind if kind.is_identifier_like() => self.parse_ident_atom(can_be_arrow),
            // Escaped or reserved words: let `parse_ident` name the problem.
            kind if kind.is_reserved() => {
                let id = self.parse_ident()?;
                Ok(Expr::new(ExprKind::Ident(id.name), id.span))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// An identifier reference, or the start of an arrow function or async
    /// function expression.
    fn parse_ident_atom(&mut self, can_be_arrow: bool) -> Result<Expr> {
        let start = self.start();
        let escaped = self.current.is_escaped();
        let id = self.parse_ident()?;
        let plain_async = id.name == "async" && !escaped;

        if plain_async && !self.can_insert_semicolon() && self.check(&TokenKind::Function) {
            let function = self.parse_function(start, true, FunctionKind::Expression)?;
            return Ok(Expr::new(
                ExprKind::Function(Box::new(function)),
                self.span_from(start),
            ));
        }

        if can_be_arrow {
            if self.check(&TokenKind::Arrow) {
                if self.current.had_newline_before() {
                    return Err(self.error(ErrorCode::NewlineBeforeArrow, self.current.span));
                }
                self.advance()?;
                let param = Expr::new(ExprKind::Ident(id.name), id.span);
                return self.parse_arrow(start, vec![ParenItem::Expr(param)], false);
            }
            if plain_async
                && !self.can_insert_semicolon()
                && self.at_identifier()
                && !(self.potential_arrow_in_for_await && self.is_contextual("of"))
            {
                let param = self.parse_ident()?;
                if !self.check(&TokenKind::Arrow) || self.can_insert_semicolon() {
                    return Err(self.unexpected());
                }
                self.advance()?;
                let param = Expr::new(ExprKind::Ident(param.name), param.span);
                return self.parse_arrow(start, vec![ParenItem::Expr(param)], true);
            }
        }

        Ok(Expr::new(ExprKind::Ident(id.name), id.span))
    }

    fn parse_super(&mut self) -> Result<Expr> {
        let token = self.advance()?;
        if self.check(&TokenKind::LParen) {
            if !self.ctx.contains(Context::SUPER_CALL) {
                return Err(self.error(ErrorCode::InvalidSuperCall, token.span));
            }
        } else if !self.ctx.contains(Context::SUPER_PROPERTY) {
            return Err(self.error(ErrorCode::InvalidSuperProperty, token.span));
        }
        if !matches!(
            self.peek(),
            TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
        ) {
            return Err(self.unexpected());
        }
        Ok(Expr::new(ExprKind::Super, token.span))
    }

    /// String, numeric and BigInt literals.
    pub(crate) fn parse_literal(&mut self) -> Result<Expr> {
        let token = self.advance()?;
        let octal = token.has_octal();
        let span = token.span;
        let kind = match token.kind {
            TokenKind::String(value) => {
                if octal && self.ctx.is_strict() {
                    return Err(self.error(ErrorCode::StrictOctalEscape, span));
                }
                ExprKind::String(value)
            }
            TokenKind::Number(value) => {
                if octal && self.ctx.is_strict() {
                    return Err(self.error(ErrorCode::StrictOctalLiteral, span));
                }
                ExprKind::Number(value)
            }
            TokenKind::BigInt(digits) => ExprKind::BigInt(digits),
            kind => return Err(self.error(ErrorCode::UnexpectedToken(describe(&kind)), span)),
        };
        Ok(Expr::new(kind, span))
    }

    /// A string literal expression, as used by module specifiers.
    pub(crate) fn parse_string_literal(&mut self) -> Result<Expr> {
        if !matches!(self.peek(), TokenKind::String(_)) {
            return Err(self.unexpected());
        }
        self.parse_literal()
    }

    fn parse_regex(&mut self) -> Result<Expr> {
        let slash = self.current.clone();
        self.current = self.lexer.rescan_regex(&slash)?;
        let token = self.advance()?;
        let span = token.span;
        let TokenKind::Regex { pattern, flags } = token.kind else {
            return Err(self.error(ErrorCode::UnterminatedRegExp, span));
        };
        if self.options.validate_regex {
            regexp::validate(&pattern, &flags).map_err(|code| self.error(code, span))?;
        }
        Ok(Expr::new(ExprKind::Regex { pattern, flags }, span))
    }

    /// Parse `( ... )`, which is either a parenthesized expression or the
    /// parameter list of an arrow function.
    fn parse_paren_and_distinguish(&mut self, can_be_arrow: bool) -> Result<Expr> {
        let start = self.start();
        self.advance()?;
        let inner_start = self.start();

        let old_yield = self.yield_pos.take();
        let old_await = self.await_pos.take();
        let mut refs = CoverErrors::default();
        let mut items = Vec::new();
        let mut trailing_comma = false;
        let mut rest = None;
        self.allow_in(|p| {
            while !p.check(&TokenKind::RParen) {
                if !items.is_empty() {
                    p.expect(&TokenKind::Comma)?;
                    if p.check(&TokenKind::RParen) {
                        trailing_comma = true;
                        break;
                    }
                }
                if p.check(&TokenKind::Spread) {
                    rest = Some(p.current.span);
                    items.push(ParenItem::Rest(p.parse_binding_rest(&TokenKind::RParen)?));
                    break;
                }
                items.push(ParenItem::Expr(p.parse_assign_expr(Some(&mut refs))?));
            }
            Ok(())
        })?;
        let inner_end = self.prev_end;
        let close = self.expect(&TokenKind::RParen)?;

        if can_be_arrow && self.check(&TokenKind::Arrow) {
            if self.current.had_newline_before() {
                return Err(self.error(ErrorCode::NewlineBeforeArrow, self.current.span));
            }
            self.advance()?;
            self.check_pattern_errors(&refs, false)?;
            self.check_arrow_param_expressions()?;
            self.yield_pos = old_yield;
            self.await_pos = old_await;
            return self.parse_arrow(start, items, false);
        }

        if items.is_empty() || trailing_comma {
            return Err(self.unexpected_token(&close));
        }
        if let Some(span) = rest {
            return Err(self.error(ErrorCode::UnexpectedToken("'...'".to_string()), span));
        }
        self.check_expression_errors(&refs)?;
        self.yield_pos = old_yield.or(self.yield_pos);
        self.await_pos = old_await.or(self.await_pos);

        let mut exprs: Vec<Expr> = items
            .into_iter()
            .filter_map(|item| match item {
                ParenItem::Expr(expr) => Some(expr),
                ParenItem::Rest(_) => None,
            })
            .collect();
        let inner = if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::new(ExprKind::Sequence(exprs), Span::new(inner_start, inner_end))
        };
        Ok(Expr::new(
            ExprKind::Paren(Box::new(inner)),
            self.span_from(start),
        ))
    }

    fn parse_array_literal(&mut self, mut refs: Option<&mut CoverErrors>) -> Result<Expr> {
        let start = self.start();
        self.advance()?;
        let mut elements = Vec::new();
        self.allow_in(|p| {
            let mut first = true;
            while !p.eat(&TokenKind::RBracket)? {
                if !first {
                    p.expect(&TokenKind::Comma)?;
                    if p.eat(&TokenKind::RBracket)? {
                        break;
                    }
                }
                first = false;
                match p.peek() {
                    TokenKind::Comma => elements.push(None),
                    TokenKind::Spread => {
                        let spread_start = p.start();
                        p.advance()?;
                        let arg = p.parse_assign_expr(refs.as_deref_mut())?;
                        if p.check(&TokenKind::Comma) {
                            if let Some(refs) = refs.as_deref_mut() {
                                refs.trailing_comma.get_or_insert(p.current.span);
                            }
                        }
                        elements.push(Some(Expr::new(
                            ExprKind::Spread(Box::new(arg)),
                            p.span_from(spread_start),
                        )));
                    }
                    _ => elements.push(Some(p.parse_assign_expr(refs.as_deref_mut())?)),
                }
            }
            Ok(())
        })?;
        Ok(Expr::new(
            ExprKind::Array(elements),
            self.span_from(start),
        ))
    }

    fn parse_object_literal(&mut self, mut refs: Option<&mut CoverErrors>) -> Result<Expr> {
        let start = self.start();
        self.advance()?;
        let mut members = Vec::new();
        let mut has_proto = false;
        self.allow_in(|p| {
            while !p.eat(&TokenKind::RBrace)? {
                if !members.is_empty() {
                    p.expect(&TokenKind::Comma)?;
                    if p.eat(&TokenKind::RBrace)? {
                        break;
                    }
                }
                let member = p.parse_object_member(refs.as_deref_mut())?;
                if let ObjectMember::Property(prop) = &member {
                    if is_proto_init(prop) {
                        if has_proto {
                            let span = prop.key.span();
                            match refs.as_deref_mut() {
                                Some(refs) => {
                                    refs.double_proto.get_or_insert(span);
                                }
                                None => return Err(p.error(ErrorCode::DuplicateProto, span)),
                            }
                        }
                        has_proto = true;
                    }
                }
                members.push(member);
            }
            Ok(())
        })?;
        Ok(Expr::new(
            ExprKind::Object(members),
            self.span_from(start),
        ))
    }

    fn parse_object_member(&mut self, mut refs: Option<&mut CoverErrors>) -> Result<ObjectMember> {
        let start = self.start();
        if self.eat(&TokenKind::Spread)? {
            let arg = self.parse_assign_expr(refs.as_deref_mut())?;
            let span = self.span_from(start);
            if self.check(&TokenKind::Comma) {
                if let Some(refs) = refs {
                    refs.trailing_comma.get_or_insert(self.current.span);
                }
            }
            return Ok(ObjectMember::Spread { arg, span });
        }

        let mut is_generator = self.eat(&TokenKind::Star)?;
        let key_token = self.current.clone();
        let mut key = self.parse_property_key(false)?;
        let mut is_async = false;
        if !is_generator
            && is_plain_word(&key, key_token.is_escaped(), "async")
            && !self.current.had_newline_before()
            && self.at_property_key_start()
        {
            is_async = true;
            is_generator = self.eat(&TokenKind::Star)?;
            key = self.parse_property_key(false)?;
        }

        if (is_generator || is_async) && self.check(&TokenKind::Colon) {
            return Err(self.unexpected());
        }

        if self.eat(&TokenKind::Colon)? {
            let value = self.parse_assign_expr(refs)?;
            return Ok(ObjectMember::Property(Property {
                key,
                value,
                kind: PropertyKind::Init,
                method: false,
                shorthand: false,
                span: self.span_from(start),
            }));
        }

        if self.check(&TokenKind::LParen) {
            let function = self.parse_method(is_async, is_generator, Context::SUPER_PROPERTY)?;
            let span = function.span;
                let value = Expr::new(ExprKind::Function(Box::new(function)), span);
            return Ok(ObjectMember::Property(Property {
                key,
                value,
                kind: PropertyKind::Init,
                method: true,
                shorthand: false,
                span: self.span_from(start),
            }));
        }

        let accessor = if is_plain_word(&key, key_token.is_escaped(), "get") {
            Some(PropertyKind::Get)
        } else if is_plain_word(&key, key_token.is_escaped(), "set") {
            Some(PropertyKind::Set)
        } else {
            None
        };
        if let Some(kind) = accessor {
            if !matches!(
                self.peek(),
                TokenKind::Comma | TokenKind::RBrace | TokenKind::Eq
            ) {
                if is_generator || is_async {
                    return Err(self.unexpected());
                }
                let key = self.parse_property_key(false)?;
                let function = self.parse_method(false, false, Context::SUPER_PROPERTY)?;
                self.check_accessor_params(kind == PropertyKind::Get, &function)?;
                let span = function.span;
                let value = Expr::new(ExprKind::Function(Box::new(function)), span);
                return Ok(ObjectMember::Property(Property {
                    key,
                    value,
                    kind,
                    method: false,
                    shorthand: false,
                    span: self.span_from(start),
                }));
            }
        }

        // Shorthand: `{ a }` or, only valid in a pattern, `{ a = 1 }`.
        let PropertyKey::Ident(id) = &key else {
            return Err(self.unexpected());
        };
        if is_generator || is_async {
            return Err(self.unexpected());
        }
        self.check_identifier(&id.name, id.span, key_token.is_escaped())?;
        let value = if self.check(&TokenKind::Eq) {
            let Some(refs) = refs else {
                return Err(self.error(ErrorCode::ShorthandInitializer, self.current.span));
            };
            refs.shorthand_assign.get_or_insert(self.current.span);
            self.advance()?;
            let default = self.parse_assign_expr(None)?;
            Expr::new(
                ExprKind::Assign {
                    op: AssignOp::Assign,
                    target: Box::new(Pattern::new(PatternKind::Ident(id.name.clone()), id.span)),
                    value: Box::new(default),
                },
                self.span_from(start),
            )
        } else {
            Expr::new(ExprKind::Ident(id.name.clone()), id.span)
        };
        Ok(ObjectMember::Property(Property {
            key,
            value,
            kind: PropertyKind::Init,
            method: false,
            shorthand: true,
            span: self.span_from(start),
        }))
    }

    /// Whether the current token can start a property name (or is `*`),
    /// which makes a preceding `async`, `get` or `set` a modifier.
    pub(crate) fn at_property_key_start(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::BigInt(_)
                | TokenKind::LBracket
                | TokenKind::Star
                | TokenKind::PrivateName(_)
        ) || self.peek().identifier_name().is_some()
    }

    /// Parse a property name: identifier name, string, number, computed
    /// `[expr]` or, in class bodies, a private name.
    pub(crate) fn parse_property_key(&mut self, allow_private: bool) -> Result<PropertyKey> {
        match self.peek() {
            TokenKind::LBracket => {
                self.advance()?;
                let expr = self.allow_in(|p| p.parse_assign_expr(None))?;
                self.expect(&TokenKind::RBracket)?;
                Ok(PropertyKey::Computed(Box::new(expr)))
            }
            TokenKind::String(_) | TokenKind::Number(_) | TokenKind::BigInt(_) => {
                Ok(PropertyKey::Literal(Box::new(self.parse_literal()?)))
            }
            TokenKind::PrivateName(name) if allow_private => {
                let id = Ident::new(name.clone(), self.current.span);
                self.advance()?;
                Ok(PropertyKey::Private(id))
            }
            _ => Ok(PropertyKey::Ident(self.parse_ident_name()?)),
        }
    }

    // =========================================================================
    // Templates
    // =========================================================================

    /// Parse a template literal. Invalid escapes are only errors when the
    /// template is not tagged.
    pub(crate) fn parse_template(&mut self, tagged: bool) -> Result<Template> {
        let start = self.start();
        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        loop {
            let token = self.advance()?;
            let span = token.span;
            let (chunk, tail) = match token.kind {
                TokenKind::TemplateNoSub(chunk) | TokenKind::TemplateTail(chunk) => (chunk, true),
                TokenKind::TemplateHead(chunk) | TokenKind::TemplateMiddle(chunk) => (chunk, false),
                kind => return Err(self.error(ErrorCode::UnexpectedToken(describe(&kind)), span)),
            };
            if !tagged {
                if let Some(escape) = chunk.invalid_escape {
                    return Err(self.error(ErrorCode::InvalidTemplateEscape, escape));
                }
            }
            // Between the opening delimiter (` or }) and the closing one (` or ${).
            let delimiter = if tail { 1 } else { 2 };
            quasis.push(TemplateElement {
                cooked: chunk.cooked,
                raw: chunk.raw,
                tail,
                span: Span::new(span.start + 1, span.end - delimiter),
            });
            if tail {
                break;
            }

            exprs.push(self.allow_in(|p| p.parse_expr())?);
            if !self.check(&TokenKind::RBrace) {
                return Err(self.error(
                    ErrorCode::Expected {
                        expected: "'}'".to_string(),
                        found: describe(self.peek()),
                    },
                    self.current.span,
                ));
            }
            let rbrace = self.current.clone();
            self.current = self.lexer.rescan_template_continuation(&rbrace)?;
        }
        Ok(Template {
            quasis,
            exprs,
            span: self.span_from(start),
        })
    }

    // =========================================================================
    // new and import
    // =========================================================================

    fn parse_new(&mut self) -> Result<Expr> {
        let start = self.start();
        let new = self.advance()?;

        if self.eat(&TokenKind::Dot)? {
            let escaped = self.current.is_escaped();
            let property = self.parse_ident_name()?;
            if property.name != "target" {
                return Err(self.error(
                    ErrorCode::UnexpectedToken(format!("identifier '{}'", property.name)),
                    property.span,
                ));
            }
            if escaped {
                return Err(self.error(ErrorCode::EscapedKeyword, property.span));
            }
            let span = self.span_from(start);
            if !self.ctx.contains(Context::NEW_TARGET) {
                return Err(self.error(ErrorCode::InvalidNewTarget, span));
            }
            return Ok(Expr::new(
                ExprKind::MetaProperty {
                    meta: Ident::new("new", new.span),
                    property,
                },
                span,
            ));
        }

        let callee_start = self.start();
        let atom = self.nested(|p| p.parse_atom(None, true))?;
        let callee = self.parse_subscripts(atom, callee_start, true)?;
        let args = if self.eat(&TokenKind::LParen)? {
            let mut refs = CoverErrors::default();
            let args = self.allow_in(|p| p.parse_arguments(&mut refs))?;
            self.check_expression_errors(&refs)?;
            args
        } else {
            Vec::new()
        };
        Ok(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            self.span_from(start),
        ))
    }

    /// `import(source)`, `import(source, options)` or `import.meta`.
    pub(crate) fn parse_import_expr(&mut self, for_new: bool) -> Result<Expr> {
        let start = self.start();
        let import = self.advance()?;
        match self.peek() {
            TokenKind::LParen if !for_new => {
                self.advance()?;
                let (source, options) = self.allow_in(|p| {
                    let source = p.parse_assign_expr(None)?;
                    let mut options = None;
                    if p.eat(&TokenKind::Comma)? && !p.check(&TokenKind::RParen) {
                        options = Some(Box::new(p.parse_assign_expr(None)?));
                        p.eat(&TokenKind::Comma)?;
                    }
                    p.expect(&TokenKind::RParen)?;
                    Ok((source, options))
                })?;
                Ok(Expr::new(
                    ExprKind::Import {
                        source: Box::new(source),
                        options,
                    },
                    self.span_from(start),
                ))
            }
            TokenKind::Dot => {
                self.advance()?;
                let escaped = self.current.is_escaped();
                let property = self.parse_ident_name()?;
                if property.name != "meta" {
                    return Err(self.error(
                        ErrorCode::UnexpectedToken(format!("identifier '{}'", property.name)),
                        property.span,
                    ));
                }
                if escaped {
                    return Err(self.error(ErrorCode::EscapedKeyword, property.span));
                }
                let span = self.span_from(start);
                if !self.ctx.is_module() {
                    return Err(self.error(ErrorCode::ImportMetaOutsideModule, span));
                }
                Ok(Expr::new(
                    ExprKind::MetaProperty {
                        meta: Ident::new("import", import.span),
                        property,
                    },
                    span,
                ))
            }
            _ => Err(self.unexpected()),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::AddAssign,
        TokenKind::MinusEq => AssignOp::SubAssign,
        TokenKind::StarEq => AssignOp::MulAssign,
        TokenKind::SlashEq => AssignOp::DivAssign,
        TokenKind::PercentEq => AssignOp::ModAssign,
        TokenKind::StarStarEq => AssignOp::PowAssign,
        TokenKind::LtLtEq => AssignOp::ShlAssign,
        TokenKind::GtGtEq => AssignOp::ShrAssign,
        TokenKind::GtGtGtEq => AssignOp::UShrAssign,
        TokenKind::PipeEq => AssignOp::BitOrAssign,
        TokenKind::CaretEq => AssignOp::BitXorAssign,
        TokenKind::AmpEq => AssignOp::BitAndAssign,
        TokenKind::AmpAmpEq => AssignOp::AndAssign,
        TokenKind::PipePipeEq => AssignOp::OrAssign,
        TokenKind::QuestionQuestionEq => AssignOp::NullishAssign,
        _ => return None,
    })
}

fn unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    Some(match kind {
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Typeof => UnaryOp::Typeof,
        TokenKind::Void => UnaryOp::Void,
        TokenKind::Delete => UnaryOp::Delete,
        _ => return None,
    })
}

fn update_op(kind: &TokenKind) -> Option<UpdateOp> {
    match kind {
        TokenKind::PlusPlus => Some(UpdateOp::Increment),
        TokenKind::MinusMinus => Some(UpdateOp::Decrement),
        _ => None,
    }
}

fn private_name(expr: &Expr) -> &str {
    match &expr.kind {
        ExprKind::PrivateName(name) => name,
        _ => "",
    }
}

/// An identifier or member expression, possibly parenthesized.
fn is_simple_target(expr: &Expr) -> bool {
    matches!(
        expr.unparenthesized().kind,
        ExprKind::Ident(_) | ExprKind::Member { .. }
    )
}

/// `a.#x`, `a?.#x` or a parenthesized form of either.
fn is_private_access(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Member { property, .. } => property.is_private(),
        ExprKind::Chain(inner) | ExprKind::Paren(inner) => is_private_access(inner),
        _ => false,
    }
}

/// `__proto__: value` counts toward the duplicate check; shorthand,
/// methods and computed keys do not.
fn is_proto_init(prop: &Property) -> bool {
    prop.kind == PropertyKind::Init
        && !prop.method
        && !prop.shorthand
        && prop.key.static_name() == Some("__proto__")
}

/// The key is the unescaped identifier `word`.
pub(crate) fn is_plain_word(key: &PropertyKey, escaped: bool, word: &str) -> bool {
    !escaped && matches!(key, PropertyKey::Ident(id) if id.name == word)
}
