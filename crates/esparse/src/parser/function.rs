//! Functions, methods and arrow functions.
//!
//! Every function gets a fresh [`StrictFrame`], label set and `yield`/`await`
//! bookkeeping; the enclosing function's are restored when it ends.

use tracing::trace;

use super::pattern::ParenItem;
use super::{Parser, StrictFrame};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorCode, Result};
use crate::scope::{BindingKind, Label, ScopeFlags};
use crate::span::Span;
use crate::token::TokenKind;

/// Where a `function` keyword was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FunctionKind {
    /// A declaration in a statement list; the name is bound in the
    /// enclosing scope.
    Declaration,
    /// The body of a sloppy-mode `if`, which binds nothing.
    HangingDeclaration,
    /// `export default function`, where the name is optional.
    DefaultExport,
    /// A function expression, whose name is only visible inside it.
    Expression,
}

/// Per-function parser state that must not leak into nested functions.
pub(crate) struct FunctionState {
    frame: StrictFrame,
    labels: Vec<Label>,
    yield_pos: Option<u32>,
    await_pos: Option<u32>,
    await_ident_pos: Option<u32>,
}

impl<'a> Parser<'a> {
    pub(crate) fn enter_function_state(&mut self) -> FunctionState {
        FunctionState {
            frame: std::mem::replace(&mut self.frame, StrictFrame::new(true)),
            labels: std::mem::take(&mut self.labels),
            yield_pos: self.yield_pos.take(),
            await_pos: self.await_pos.take(),
            await_ident_pos: self.await_ident_pos.take(),
        }
    }

    pub(crate) fn exit_function_state(&mut self, state: FunctionState) {
        self.frame = state.frame;
        self.labels = state.labels;
        self.yield_pos = state.yield_pos;
        self.await_pos = state.await_pos;
        self.await_ident_pos = state.await_ident_pos;
    }

    /// How a function declaration binds its name here.
    fn function_binding_kind(&self, is_async: bool, is_generator: bool) -> BindingKind {
        if self.ctx.is_strict() || is_async || is_generator {
            if self.scopes.treat_functions_as_var() {
                BindingKind::Var
            } else {
                BindingKind::Lexical
            }
        } else {
            BindingKind::Function
        }
    }

    /// Parse a function declaration or expression. The current token is
    /// `function`; `start` is where the function began (at `async`, if any).
    pub(crate) fn parse_function(
        &mut self,
        start: u32,
        is_async: bool,
        kind: FunctionKind,
    ) -> Result<Function> {
        self.expect(&TokenKind::Function)?;
        let is_generator = self.eat(&TokenKind::Star)?;
        let inner = self.ctx.for_function(is_async, is_generator);

        // Declaration names belong to the enclosing scope and context.
        let mut id = None;
        if kind != FunctionKind::Expression
            && !(kind == FunctionKind::DefaultExport && self.check(&TokenKind::LParen))
        {
            let name = self.parse_ident()?;
            if kind != FunctionKind::HangingDeclaration {
                let binding = self.function_binding_kind(is_async, is_generator);
                self.declare_binding(&name.name, name.span, binding)?;
            }
            id = Some(name);
        }
        trace!(
            name = id.as_ref().map(|id| id.name.as_str()),
            is_async,
            is_generator,
            "parsing function"
        );

        let state = self.enter_function_state();
        self.scopes.enter(ScopeFlags::FUNCTION);
        let result = self.in_context(inner, |p| {
            if kind == FunctionKind::Expression && !p.check(&TokenKind::LParen) {
                id = Some(p.parse_ident()?);
            }
            // The name is checked again once the body's strictness is known.
            if let Some(id) = &id {
                if let Some(code) = Self::strict_binding_error(&id.name) {
                    p.strict_violation(code, id.span)?;
                }
            }
            p.parse_params_and_body(true)
        });
        self.scopes.exit();
        self.exit_function_state(state);
        let (params, body, body_start) = result?;

        self.expect(&TokenKind::RBrace)?;
        Ok(Function {
            id,
            params,
            body,
            body_span: self.span_from(body_start),
            is_async,
            is_generator,
            span: self.span_from(start),
        })
    }

    /// Parse the parameters and body of an object or class method. The
    /// current token is `(`; `extra` adds `super` permissions.
    pub(crate) fn parse_method(
        &mut self,
        is_async: bool,
        is_generator: bool,
        extra: Context,
    ) -> Result<Function> {
        let start = self.start();
        let inner = self.ctx.for_function(is_async, is_generator) | extra;

        let state = self.enter_function_state();
        self.scopes.enter(ScopeFlags::FUNCTION);
        let result = self.in_context(inner, |p| p.parse_params_and_body(false));
        self.scopes.exit();
        self.exit_function_state(state);
        let (params, body, body_start) = result?;

        self.expect(&TokenKind::RBrace)?;
        Ok(Function {
            id: None,
            params,
            body,
            body_span: self.span_from(body_start),
            is_async,
            is_generator,
            span: self.span_from(start),
        })
    }

    /// Parse `(params) { body` in the function's own context, stopping
    /// before the closing `}` so it is scanned with the outer strictness.
    fn parse_params_and_body(
        &mut self,
        allow_duplicates: bool,
    ) -> Result<(Vec<Pattern>, Vec<Stmt>, u32)> {
        self.expect(&TokenKind::LParen)?;
        let params = self.with_context(Context::IN_PARAMETERS, Context::empty(), |p| {
            p.parse_formal_params()
        })?;

        let simple = params.iter().all(Pattern::is_ident);
        self.frame.simple_params = simple;
        self.check_params(&params, allow_duplicates && simple)?;
        for param in &params {
            self.declare_pattern(param, BindingKind::Var)?;
        }

        let body_start = self.start();
        self.expect(&TokenKind::LBrace)?;
        let body = self.parse_body(false)?;
        Ok((params, body, body_start))
    }

    /// Parse a formal parameter list after `(`, through the closing `)`.
    fn parse_formal_params(&mut self) -> Result<Vec<Pattern>> {
        let mut params = Vec::new();
        while !self.eat(&TokenKind::RParen)? {
            if self.check(&TokenKind::Spread) {
                params.push(self.parse_binding_rest(&TokenKind::RParen)?);
                self.expect(&TokenKind::RParen)?;
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        Ok(params)
    }

    /// Getters take no parameters; setters take exactly one, which may not
    /// be a rest element.
    pub(crate) fn check_accessor_params(&self, is_getter: bool, function: &Function) -> Result<()> {
        let span = function.span;
        if is_getter {
            if !function.params.is_empty() {
                return Err(self.error(ErrorCode::GetterArity, span));
            }
            return Ok(());
        }
        match function.params.as_slice() {
            [param] if matches!(param.kind, PatternKind::Rest(_)) => {
                Err(self.error(ErrorCode::SetterRest, param.span))
            }
            [_] => Ok(()),
            _ => Err(self.error(ErrorCode::SetterArity, span)),
        }
    }

    // =========================================================================
    // Arrow Functions
    // =========================================================================

    /// Finish an arrow function whose parameters were parsed as `items` and
    /// whose `=>` has been consumed.
    pub(crate) fn parse_arrow(
        &mut self,
        start: u32,
        items: Vec<ParenItem>,
        is_async: bool,
    ) -> Result<Expr> {
        let outer = self.ctx;
        let inner = outer.for_arrow(is_async) | (outer & Context::DISALLOW_IN);

        let state = self.enter_function_state();
        self.scopes.enter(ScopeFlags::FUNCTION | ScopeFlags::ARROW);
        let result = self.in_context(inner, |p| {
            let params = p.to_params(items)?;
            p.frame.simple_params = params.iter().all(Pattern::is_ident);
            p.check_params(&params, false)?;
            for param in &params {
                p.declare_pattern(param, BindingKind::Var)?;
            }

            if !p.check(&TokenKind::LBrace) {
                p.frame.close();
                let expr = p.parse_assign_expr(None)?;
                return Ok((params, ArrowBody::Expr(Box::new(expr)), None));
            }
            let body_start = p.start();
            p.with_context(Context::empty(), Context::DISALLOW_IN, |p| {
                p.advance()?;
                let body = p.parse_body(false)?;
                Ok((params, ArrowBody::Block { body, span: Span::empty(0) }, Some(body_start)))
            })
        });
        self.scopes.exit();
        self.exit_function_state(state);
        let (params, mut body, body_start) = result?;

        if let (Some(body_start), ArrowBody::Block { span, .. }) = (body_start, &mut body) {
            self.expect(&TokenKind::RBrace)?;
            *span = self.span_from(body_start);
        }
        let span = self.span_from(start);
        Ok(Expr::new(
            ExprKind::Arrow(Box::new(ArrowFunction {
                params,
                body,
                is_async,
                span,
            })),
            span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::context::Context;
    use crate::error::{ErrorCode, Result};
    use crate::options::ParserOptions;
    use crate::parser::Parser;
    use crate::span::Span;

    fn parse_with(source: &str, options: &ParserOptions) -> Result<Program> {
        Parser::new(source, options, Context::empty())?.parse()
    }

    fn parse(source: &str) -> Result<Program> {
        parse_with(source, &ParserOptions::default())
    }

    fn first_function(program: &Program) -> &Function {
        match &program.body[0].kind {
            StmtKind::Function(function) => function,
            other => panic!("expected function declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_function_declaration() {
        let program = parse("async function* f(a, [b], {c} = {}, ...d) { yield await a; }").unwrap();
        let function = first_function(&program);
        assert_eq!(function.id.as_ref().map(|id| id.name.as_str()), Some("f"));
        assert!(function.is_async && function.is_generator);
        assert_eq!(function.params.len(), 4);
        assert!(matches!(function.params[3].kind, PatternKind::Rest(_)));
        assert_eq!(function.span, Span::new(0, 60));
        assert_eq!(function.body_span, Span::new(42, 60));
    }

    #[test]
    fn test_generator_and_async_names() {
        assert_eq!(parse("(function* yield() {});").unwrap_err().code, ErrorCode::YieldIdentifier);
        assert_eq!(
            parse("(async function await() {});").unwrap_err().code,
            ErrorCode::AwaitIdentifier
        );
        assert!(parse("function* g() { (function yield() {}); }").is_ok());
        assert_eq!(
            parse("function* g() { function yield() {} }").unwrap_err().code,
            ErrorCode::YieldIdentifier
        );
    }

    #[test]
    fn test_parameter_expressions() {
        assert_eq!(
            parse("function* g(a = yield) {}").unwrap_err().code,
            ErrorCode::YieldInParameter
        );
        assert_eq!(
            parse("async function f(a = await 1) {}").unwrap_err().code,
            ErrorCode::AwaitInParameter
        );
        assert_eq!(
            parse("async function f(await) {}").unwrap_err().code,
            ErrorCode::AwaitIdentifier
        );
    }

    #[test]
    fn test_duplicate_parameters() {
        assert!(parse("function f(a, a) {}").is_ok());
        assert_eq!(
            parse("function f(a, [a]) {}").unwrap_err().code,
            ErrorCode::DuplicateParameter
        );
        assert_eq!(
            parse("'use strict'; function f(a, a) {}").unwrap_err().code,
            ErrorCode::DuplicateParameter
        );
        assert_eq!(
            parse("({ m(a, a) {} });").unwrap_err().code,
            ErrorCode::DuplicateParameter
        );
        assert_eq!(parse("(a, a) => 1;").unwrap_err().code, ErrorCode::DuplicateParameter);
    }

    #[test]
    fn test_parameter_conflicts_with_lexical_body() {
        assert_eq!(
            parse("function f(a) { let a; }").unwrap_err().code,
            ErrorCode::Redeclaration("a".into())
        );
        assert!(parse("function f(a) { var a; }").is_ok());
    }

    #[test]
    fn test_strict_function_names() {
        assert_eq!(
            parse("'use strict'; function eval() {}").unwrap_err().code,
            ErrorCode::StrictEvalArguments
        );
        assert_eq!(
            parse("(function arguments() { 'use strict'; });").unwrap_err().code,
            ErrorCode::StrictEvalArguments
        );
        assert_eq!(
            parse("function f(eval) { 'use strict'; }").unwrap_err().code,
            ErrorCode::StrictEvalArguments
        );
        assert!(parse("function eval() {}").is_ok());
    }

    #[test]
    fn test_labels_do_not_cross_functions() {
        assert_eq!(
            parse("a: { function f() { break a; } }").unwrap_err().code,
            ErrorCode::UndefinedLabel("a".into())
        );
    }

    #[test]
    fn test_accessor_arity_in_classes() {
        assert_eq!(parse("class A { get a(b) {} }").unwrap_err().code, ErrorCode::GetterArity);
        assert_eq!(parse("class A { set a(b, c) {} }").unwrap_err().code, ErrorCode::SetterArity);
        assert!(parse("class A { set a([b] = []) {} }").is_ok());
    }

    #[test]
    fn test_arrow_bodies() {
        let program = parse("x => { return x; };").unwrap();
        let StmtKind::Expr { expr, .. } = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Arrow(arrow) = &expr.kind else {
            panic!("expected arrow");
        };
        assert!(matches!(&arrow.body, ArrowBody::Block { span, .. } if *span == Span::new(5, 18)));
        assert_eq!(arrow.span, Span::new(0, 18));

        assert!(parse("() => { 'use strict'; with (a) {} };").is_err());
        assert_eq!(
            parse("(a = 1) => { 'use strict'; };").unwrap_err().code,
            ErrorCode::IllegalUseStrict
        );
        assert_eq!(
            parse("eval => { 'use strict'; };").unwrap_err().code,
            ErrorCode::StrictEvalArguments
        );
    }

    #[test]
    fn test_arrow_in_generator_treats_yield_as_identifier() {
        assert!(parse("function* g() { () => { var yield; }; }").is_ok());
        assert!(parse("function* g() { x => x * 2; }").is_ok());
        assert_eq!(
            parse("function* g() { (yield) => 1; }").unwrap_err().code,
            ErrorCode::YieldInParameter
        );
    }

    #[test]
    fn test_new_target_in_arrow() {
        assert!(parse("function f() { () => new.target; }").is_ok());
        assert_eq!(
            parse("() => new.target;").unwrap_err().code,
            ErrorCode::InvalidNewTarget
        );
    }

    #[test]
    fn test_module_top_level_await() {
        let module = ParserOptions::module();
        assert!(parse_with("await x;", &module).is_ok());
        assert_eq!(
            parse_with("function f() { await x; }", &module).unwrap_err().code,
            ErrorCode::AwaitIdentifier
        );
    }
}
