//! Statement parsing.

use super::class::ClassKind;
use super::function::FunctionKind;
use super::{CoverErrors, Parser};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorCode, Result};
use crate::options::Extensions;
use crate::scope::{BindingKind, Label, LabelKind, ScopeFlags};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Where a statement appears, which decides the declarations it may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// An item of a block, function body or program.
    ListItem { top_level: bool },
    /// The consequent or alternate of `if`.
    If,
    /// The body of a labelled statement in a statement list.
    Label,
    /// Any other single-statement position: loop bodies, `with`, labels
    /// nested in those.
    Nested,
}

impl Position {
    fn is_list_item(self) -> bool {
        matches!(self, Position::ListItem { .. })
    }
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse a `StatementListItem`: a statement or a declaration.
    /// `import` and `export` are only allowed when `top_level` is set.
    pub(crate) fn parse_statement_list_item(&mut self, top_level: bool) -> Result<Stmt> {
        self.nested(|p| p.parse_statement_inner(Position::ListItem { top_level }))
    }

    fn parse_statement(&mut self, position: Position) -> Result<Stmt> {
        self.nested(|p| p.parse_statement_inner(position))
    }

    fn parse_statement_inner(&mut self, position: Position) -> Result<Stmt> {
        let start = self.start();
        // Owned so the arms below may look ahead.
        let kind = self.peek().clone();
        match kind {
            TokenKind::LBrace => {
                let block = self.parse_block(true)?;
                Ok(Stmt::new(StmtKind::Block(block.body), block.span))
            }
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Stmt::new(StmtKind::Empty, self.span_from(start)))
            }
            TokenKind::Var => self.parse_var_statement(VarKind::Var, position),
            TokenKind::Const => self.parse_var_statement(VarKind::Const, position),
            TokenKind::Let if self.at_let_declaration()? => {
                if position.is_list_item() {
                    self.parse_var_statement(VarKind::Let, position)
                } else if self.ctx.is_strict() || self.peek_next()?.kind == TokenKind::LBracket {
                    Err(self.error(ErrorCode::LexicalInStatementPosition, self.current.span))
                } else {
                    self.parse_expression_statement(position)
                }
            }
            TokenKind::Function => self.parse_function_statement(start, false, position),
            TokenKind::Class | TokenKind::At => {
                if !position.is_list_item() {
                    return Err(self.error(ErrorCode::LexicalInStatementPosition, self.current.span));
                }
                let decorators = self.parse_decorators()?;
                if !self.check(&TokenKind::Class) {
                    return Err(self.error(ErrorCode::DecoratorPosition, self.current.span));
                }
                let class = self.parse_class(start, decorators, ClassKind::Declaration)?;
                Ok(Stmt::new(StmtKind::Class(Box::new(class)), self.span_from(start)))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Break | TokenKind::Continue => self.parse_break_continue(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::With => self.parse_with(),
            TokenKind::Debugger => {
                self.advance()?;
                self.expect_semicolon()?;
                Ok(Stmt::new(StmtKind::Debugger, self.span_from(start)))
            }
            TokenKind::Import if !self.at_import_expression()? => {
                self.check_module_item(position, ErrorCode::ImportOutsideModule)?;
                self.parse_import()
            }
            TokenKind::Export => {
                self.check_module_item(position, ErrorCode::ExportOutsideModule)?;
                self.parse_export()
            }
            TokenKind::Eof => Err(self.unexpected()),
            _ => {
                if self.at_async_function()? {
                    return self.parse_function_statement(start, true, position);
                }
                if let Some(kind) = self.at_using_declaration(false)? {
                    return self.parse_var_statement(kind, position);
                }
                self.parse_expression_statement(position)
            }
        }
    }

    /// `import(` and `import.meta` start expression statements.
    fn at_import_expression(&mut self) -> Result<bool> {
        let next = self.peek_next()?;
        Ok(matches!(next.kind, TokenKind::LParen | TokenKind::Dot))
    }

    fn check_module_item(&self, position: Position, outside_module: ErrorCode) -> Result<()> {
        if !self.ctx.is_module() {
            return Err(self.error(outside_module, self.current.span));
        }
        if position != (Position::ListItem { top_level: true }) {
            return Err(self.error(ErrorCode::ImportExportNotTopLevel, self.current.span));
        }
        Ok(())
    }

    /// `{ ... }`. Function bodies share their scope with the parameters, so
    /// callers that already opened one pass `new_scope = false`.
    pub(crate) fn parse_block(&mut self, new_scope: bool) -> Result<Block> {
        let start = self.start();
        self.expect(&TokenKind::LBrace)?;
        if new_scope {
            self.scopes.enter(ScopeFlags::empty());
        }
        let body = self.parse_block_items();
        if new_scope {
            self.scopes.exit();
        }
        let body = body?;
        self.expect(&TokenKind::RBrace)?;
        Ok(Block {
            body,
            span: self.span_from(start),
        })
    }

    fn parse_block_items(&mut self) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            body.push(self.parse_statement_list_item(false)?);
        }
        Ok(body)
    }

    fn parse_expression_statement(&mut self, position: Position) -> Result<Stmt> {
        let start = self.start();
        let first = self.current.clone();
        let expr = self.allow_in(|p| p.parse_expr())?;

        if let ExprKind::Ident(name) = &expr.kind {
            if expr.span == first.span && self.check(&TokenKind::Colon) {
                let label = Ident::new(name.clone(), expr.span);
                return self.parse_labeled(start, label, position);
            }
        }

        self.expect_semicolon()?;
        Ok(Stmt::new(
            StmtKind::Expr {
                expr,
                directive: None,
            },
            self.span_from(start),
        ))
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// `let` starts a declaration when a binding can follow it, even on the
    /// next line.
    fn at_let_declaration(&mut self) -> Result<bool> {
        if !self.is_contextual("let") {
            return Ok(false);
        }
        let next = self.peek_next()?;
        Ok(match next.kind {
            TokenKind::LBracket | TokenKind::LBrace => true,
            TokenKind::In | TokenKind::Instanceof => false,
            ref kind => kind.is_identifier_like() || kind.is_reserved(),
        })
    }

    /// `async function` with no line break after `async`.
    fn at_async_function(&mut self) -> Result<bool> {
        if !self.is_contextual("async") {
            return Ok(false);
        }
        let next = self.peek_next()?;
        Ok(next.kind == TokenKind::Function && !next.had_newline_before())
    }

    /// `using x` or `await using x`, with no line breaks in between. In a
    /// `for` head, `using of` is left to the expression parser.
    fn at_using_declaration(&mut self, in_for: bool) -> Result<Option<VarKind>> {
        if !self.options.has_extension(Extensions::USING) {
            return Ok(None);
        }
        let binding_follows = |token: &Token| {
            !token.had_newline_before()
                && token.kind.is_identifier_like()
                && !(in_for && token.kind == TokenKind::Of)
        };
        if self.is_contextual("using") {
            let next = self.peek_next()?;
            return Ok(binding_follows(&next).then_some(VarKind::Using));
        }
        if self.ctx.has_await() && self.is_contextual("await") {
            let (first, second) = self.peek_next_two()?;
            let using = !first.had_newline_before()
                && !first.is_escaped()
                && matches!(&first.kind, TokenKind::Identifier(name) if name == "using");
            return Ok((using && binding_follows(&second)).then_some(VarKind::AwaitUsing));
        }
        Ok(None)
    }

    fn parse_var_statement(&mut self, kind: VarKind, position: Position) -> Result<Stmt> {
        let start = self.start();
        if kind != VarKind::Var && !position.is_list_item() {
            return Err(self.error(ErrorCode::LexicalInStatementPosition, self.current.span));
        }
        if matches!(kind, VarKind::Using | VarKind::AwaitUsing)
            && self.scopes.is_top_level()
            && !self.ctx.is_module()
        {
            return Err(self.error(ErrorCode::UsingPosition(kind.as_str()), self.current.span));
        }
        self.eat_declaration_keyword(kind)?;
        let mut decl = self.allow_in(|p| p.parse_var_declarations(kind, start, false))?;
        self.expect_semicolon()?;
        decl.span = self.span_from(start);
        let span = decl.span;
        Ok(Stmt::new(StmtKind::Var(decl), span))
    }

    fn eat_declaration_keyword(&mut self, kind: VarKind) -> Result<()> {
        self.advance()?;
        if kind == VarKind::AwaitUsing {
            self.advance()?;
        }
        Ok(())
    }

    /// Parse the declarator list after `var`, `let`, `const` or `using`.
    /// In a `for` head the declarators may lack initializers when `in` or
    /// `of` follows; the loop checks those itself.
    fn parse_var_declarations(&mut self, kind: VarKind, start: u32, in_for: bool) -> Result<VarDecl> {
        let binding = if kind.is_lexical() {
            BindingKind::Lexical
        } else {
            BindingKind::Var
        };
        let mut decls = Vec::new();
        loop {
            let decl_start = self.start();
            let id = if matches!(kind, VarKind::Using | VarKind::AwaitUsing) {
                let id = self.parse_ident()?;
                Pattern::new(PatternKind::Ident(id.name), id.span)
            } else {
                self.parse_binding_target()?
            };
            self.declare_pattern(&id, binding)?;

            let init = if self.eat(&TokenKind::Eq)? {
                Some(self.parse_assign_expr(None)?)
            } else {
                let loop_head = in_for && (self.check(&TokenKind::In) || self.is_contextual("of"));
                if !loop_head {
                    if matches!(kind, VarKind::Const | VarKind::Using | VarKind::AwaitUsing) {
                        return Err(self.error(
                            ErrorCode::MissingInitializer(kind.as_str()),
                            self.current.span,
                        ));
                    }
                    if !id.is_ident() {
                        return Err(self.error(
                            ErrorCode::MissingInitializer("destructuring"),
                            self.current.span,
                        ));
                    }
                }
                None
            };
            decls.push(VarDeclarator {
                id,
                init,
                span: self.span_from(decl_start),
            });
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(VarDecl {
            kind,
            decls,
            span: self.span_from(start),
        })
    }

    /// A function declaration in statement position. Outside statement
    /// lists only sloppy code may have one: as the body of `if` (Annex B,
    /// with `webcompat`) or of a label.
    fn parse_function_statement(
        &mut self,
        start: u32,
        is_async: bool,
        position: Position,
    ) -> Result<Stmt> {
        let kind = match position {
            Position::ListItem { .. } => FunctionKind::Declaration,
            Position::If | Position::Label
                if !self.ctx.is_strict()
                    && !is_async
                    && self.peek_next()?.kind != TokenKind::Star
                    && (position == Position::Label || self.options.webcompat) =>
            {
                if position == Position::If {
                    FunctionKind::HangingDeclaration
                } else {
                    FunctionKind::Declaration
                }
            }
            _ => {
                let code = if self.ctx.is_strict() {
                    ErrorCode::StrictFunction
                } else {
                    ErrorCode::FunctionInStatementPosition
                };
                return Err(self.error(code, self.current.span));
            }
        };
        if is_async {
            self.advance()?;
        }
        let function = self.parse_function(start, is_async, kind)?;
        Ok(Stmt::new(
            StmtKind::Function(Box::new(function)),
            self.span_from(start),
        ))
    }

    // =========================================================================
    // Control Flow
    // =========================================================================

    fn parse_paren_expr(&mut self) -> Result<Expr> {
        self.expect(&TokenKind::LParen)?;
        let expr = self.allow_in(|p| p.parse_expr())?;
        self.expect(&TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;
        let test = self.parse_paren_expr()?;
        let consequent = Box::new(self.parse_statement(Position::If)?);
        let alternate = if self.eat(&TokenKind::Else)? {
            Some(Box::new(self.parse_statement(Position::If)?))
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                test,
                consequent,
                alternate,
            },
            self.span_from(start),
        ))
    }

    /// The body of a loop: `break` and `continue` become legal.
    fn parse_loop_body(&mut self) -> Result<Box<Stmt>> {
        let body = self.with_context(Context::IN_ITERATION, Context::empty(), |p| {
            p.parse_statement(Position::Nested)
        })?;
        Ok(Box::new(body))
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;
        let test = self.parse_paren_expr()?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::new(StmtKind::While { test, body }, self.span_from(start)))
    }

    fn parse_do_while(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;
        let body = self.parse_loop_body()?;
        self.expect(&TokenKind::While)?;
        let test = self.parse_paren_expr()?;
        // A semicolon is inserted after `do ... while (x)` even on one line.
        self.eat(&TokenKind::Semicolon)?;
        Ok(Stmt::new(StmtKind::DoWhile { body, test }, self.span_from(start)))
    }

    /// `for (...)`, `for (... in ...)`, `for (... of ...)` and
    /// `for await (... of ...)`. The head gets its own scope.
    fn parse_for(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;
        let await_span = if self.ctx.has_await() && self.is_contextual("await") {
            Some(self.advance()?.span)
        } else {
            None
        };
        self.expect(&TokenKind::LParen)?;

        self.scopes.enter(ScopeFlags::empty());
        let result = self.parse_for_head(start, await_span);
        self.scopes.exit();
        result
    }

    fn parse_for_head(&mut self, start: u32, await_span: Option<Span>) -> Result<Stmt> {
        let is_await = await_span.is_some();
        let without_of = |p: &Self| match await_span {
            Some(span) => Err(p.error(ErrorCode::ForAwaitWithoutOf, span)),
            None => Ok(()),
        };

        if self.check(&TokenKind::Semicolon) {
            without_of(self)?;
            return self.parse_for_rest(start, None);
        }

        if self.is_contextual("let") {
            let (first, second) = self.peek_next_two()?;
            let of_follows = first.kind == TokenKind::Of
                && !matches!(
                    second.kind,
                    TokenKind::Eq
                        | TokenKind::Semicolon
                        | TokenKind::Comma
                        | TokenKind::In
                        | TokenKind::Of
                );
            if of_follows {
                return Err(self.error(ErrorCode::ForOfInvalidLeft("let"), self.current.span));
            }
        }

        let kind = if self.check(&TokenKind::Var) {
            Some(VarKind::Var)
        } else if self.check(&TokenKind::Const) {
            Some(VarKind::Const)
        } else if self.at_let_declaration()? {
            Some(VarKind::Let)
        } else {
            self.at_using_declaration(true)?
        };
        if let Some(kind) = kind {
            let decl_start = self.start();
            self.eat_declaration_keyword(kind)?;
            let decl = self.with_context(Context::DISALLOW_IN, Context::empty(), |p| {
                p.parse_var_declarations(kind, decl_start, true)
            })?;
            if self.check(&TokenKind::In) || self.is_contextual("of") {
                if self.check(&TokenKind::In) {
                    without_of(self)?;
                }
                self.check_for_declaration(&decl)?;
                return self.parse_for_in_of(start, ForHead::Var(decl), is_await);
            }
            without_of(self)?;
            return self.parse_for_rest(start, Some(ForInit::Var(decl)));
        }

        let init_start = self.current.clone();
        let starts_with_let = self.is_contextual("let");
        if self.is_contextual("async") && !is_await {
            let (first, second) = self.peek_next_two()?;
            if first.kind == TokenKind::Of && second.kind != TokenKind::Arrow {
                return Err(self.error(ErrorCode::ForOfInvalidLeft("async"), init_start.span));
            }
        }

        let mut refs = CoverErrors::default();
        self.for_await_head = is_await;
        let init = self.with_context(Context::DISALLOW_IN, Context::empty(), |p| {
            p.parse_expr_cover(&mut refs)
        });
        self.for_await_head = false;
        let init = init?;

        if self.check(&TokenKind::In) || self.is_contextual("of") {
            let is_of = !self.check(&TokenKind::In);
            if is_of && starts_with_let {
                return Err(self.error(ErrorCode::ForOfInvalidLeft("let"), init_start.span));
            }
            if !is_of {
                without_of(self)?;
            }
            let span = init.span;
            // Only a `var` declaration may carry an initializer here.
            if let ExprKind::Assign { value, .. } = &init.kind {
                let word = if is_of { "of" } else { "in" };
                return Err(self.error(ErrorCode::ForInOfInitializer(word), value.span));
            }
            let target = self
                .to_assign_target(init, Some(&refs))
                .map_err(|err| match err.code {
                    ErrorCode::InvalidAssignmentTarget => self.error(ErrorCode::InvalidForTarget, span),
                    _ => err,
                })?;
            return self.parse_for_in_of(start, ForHead::Pattern(target), is_await);
        }

        self.check_expression_errors(&refs)?;
        without_of(self)?;
        self.parse_for_rest(start, Some(ForInit::Expr(init)))
    }

    /// Early errors for the declaration on the left of `in` or `of`.
    fn check_for_declaration(&self, decl: &VarDecl) -> Result<()> {
        let word = if self.check(&TokenKind::In) { "in" } else { "of" };
        if decl.decls.len() != 1 {
            return Err(self.error(ErrorCode::ForInOfMultipleBindings(word), decl.span));
        }
        if word == "in" && matches!(decl.kind, VarKind::Using | VarKind::AwaitUsing) {
            return Err(self.error(ErrorCode::UsingPosition(decl.kind.as_str()), decl.span));
        }
        let declarator = &decl.decls[0];
        if let Some(init) = &declarator.init {
            // Annex B: `for (var x = 0 in y)` in sloppy code.
            let legacy = word == "in"
                && decl.kind == VarKind::Var
                && declarator.id.is_ident()
                && !self.ctx.is_strict();
            if !legacy {
                return Err(self.error(ErrorCode::ForInOfInitializer(word), init.span));
            }
        }
        Ok(())
    }

    fn parse_for_in_of(&mut self, start: u32, left: ForHead, is_await: bool) -> Result<Stmt> {
        let is_in = self.check(&TokenKind::In);
        self.advance()?;
        let right = if is_in {
            self.allow_in(|p| p.parse_expr())?
        } else {
            self.allow_in(|p| p.parse_assign_expr(None))?
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        let kind = if is_in {
            StmtKind::ForIn { left, right, body }
        } else {
            StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            }
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    /// The rest of `for (init; test; update) body`, starting at the first
    /// `;`.
    fn parse_for_rest(&mut self, start: u32, init: Option<ForInit>) -> Result<Stmt> {
        self.expect(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.allow_in(|p| p.parse_expr())?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.allow_in(|p| p.parse_expr())?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::new(
            StmtKind::For {
                init,
                test,
                update,
                body,
            },
            self.span_from(start),
        ))
    }

    fn parse_break_continue(&mut self) -> Result<Stmt> {
        let start = self.start();
        let keyword = self.advance()?;
        let is_break = keyword.kind == TokenKind::Break;

        let label = if !self.can_insert_semicolon() && self.at_identifier() {
            let label = self.parse_ident()?;
            let Some(found) = self.labels.iter().rev().find(|l| l.name == label.name) else {
                return Err(self.error(ErrorCode::UndefinedLabel(label.name), label.span));
            };
            if !is_break && found.kind != LabelKind::Loop {
                return Err(self.error(ErrorCode::IllegalContinue, label.span));
            }
            Some(label)
        } else {
            if is_break && !self.ctx.intersects(Context::IN_ITERATION | Context::IN_SWITCH) {
                return Err(self.error(ErrorCode::IllegalBreak, keyword.span));
            }
            if !is_break && !self.ctx.contains(Context::IN_ITERATION) {
                return Err(self.error(ErrorCode::IllegalContinue, keyword.span));
            }
            None
        };
        self.expect_semicolon()?;

        let kind = if is_break {
            StmtKind::Break { label }
        } else {
            StmtKind::Continue { label }
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        let start = self.start();
        let keyword = self.advance()?;
        if !self.ctx.has_return() {
            return Err(self.error(ErrorCode::IllegalReturn, keyword.span));
        }
        let arg = if self.check(&TokenKind::Semicolon) || self.can_insert_semicolon() {
            None
        } else {
            Some(self.allow_in(|p| p.parse_expr())?)
        };
        self.expect_semicolon()?;
        Ok(Stmt::new(StmtKind::Return { arg }, self.span_from(start)))
    }

    fn parse_throw(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;
        if self.current.had_newline_before() {
            return Err(self.error(ErrorCode::NewlineAfterThrow, self.current.span));
        }
        let arg = self.allow_in(|p| p.parse_expr())?;
        self.expect_semicolon()?;
        Ok(Stmt::new(StmtKind::Throw { arg }, self.span_from(start)))
    }

    fn parse_try(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;
        let block = self.parse_block(true)?;

        let handler = if self.check(&TokenKind::Catch) {
            Some(self.parse_catch()?)
        } else {
            None
        };
        let finalizer = if self.eat(&TokenKind::Finally)? {
            Some(self.parse_block(true)?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error(ErrorCode::MissingCatchOrFinally, self.current.span));
        }
        Ok(Stmt::new(
            StmtKind::Try {
                block,
                handler,
                finalizer,
            },
            self.span_from(start),
        ))
    }

    /// `catch (param) { ... }`. The parameter and the body share one scope,
    /// so `let e` in the body conflicts with the parameter `e`.
    fn parse_catch(&mut self) -> Result<CatchClause> {
        let start = self.start();
        self.advance()?;
        if !self.eat(&TokenKind::LParen)? {
            let body = self.parse_block(true)?;
            return Ok(CatchClause {
                param: None,
                body,
                span: self.span_from(start),
            });
        }

        let param = self.parse_binding_target()?;
        let simple = param.is_ident();
        self.scopes.enter(if simple {
            ScopeFlags::SIMPLE_CATCH
        } else {
            ScopeFlags::empty()
        });
        let result = self.parse_catch_rest(&param, simple);
        self.scopes.exit();
        let body = result?;
        Ok(CatchClause {
            param: Some(param),
            body,
            span: self.span_from(start),
        })
    }

    fn parse_catch_rest(&mut self, param: &Pattern, simple: bool) -> Result<Block> {
        let kind = if simple {
            BindingKind::SimpleCatch
        } else {
            BindingKind::Lexical
        };
        self.declare_pattern(param, kind)?;
        self.expect(&TokenKind::RParen)?;
        self.parse_block(false)
    }

    fn parse_switch(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;
        let discriminant = self.parse_paren_expr()?;
        self.expect(&TokenKind::LBrace)?;

        self.scopes.enter(ScopeFlags::empty());
        let cases = self.with_context(Context::IN_SWITCH, Context::empty(), |p| p.parse_cases());
        self.scopes.exit();
        let cases = cases?;

        self.expect(&TokenKind::RBrace)?;
        Ok(Stmt::new(
            StmtKind::Switch {
                discriminant,
                cases,
            },
            self.span_from(start),
        ))
    }

    fn parse_cases(&mut self) -> Result<Vec<SwitchCase>> {
        let mut cases = Vec::new();
        let mut has_default = false;
        while !self.check(&TokenKind::RBrace) {
            let start = self.start();
            let test = match self.peek() {
                TokenKind::Case => {
                    self.advance()?;
                    Some(self.allow_in(|p| p.parse_expr())?)
                }
                TokenKind::Default => {
                    if has_default {
                        return Err(self.error(ErrorCode::MultipleDefaults, self.current.span));
                    }
                    has_default = true;
                    self.advance()?;
                    None
                }
                _ => return Err(self.unexpected()),
            };
            self.expect(&TokenKind::Colon)?;

            let mut consequent = Vec::new();
            while !matches!(
                self.peek(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace
            ) {
                consequent.push(self.parse_statement_list_item(false)?);
            }
            cases.push(SwitchCase {
                test,
                consequent,
                span: self.span_from(start),
            });
        }
        Ok(cases)
    }

    fn parse_with(&mut self) -> Result<Stmt> {
        let start = self.start();
        if self.ctx.is_strict() {
            return Err(self.error(ErrorCode::StrictWith, self.current.span));
        }
        self.advance()?;
        let object = self.parse_paren_expr()?;
        let body = Box::new(self.parse_statement(Position::Nested)?);
        Ok(Stmt::new(StmtKind::With { object, body }, self.span_from(start)))
    }

    /// `label: body`. The label has already been parsed as an expression.
    fn parse_labeled(&mut self, start: u32, label: Ident, position: Position) -> Result<Stmt> {
        self.advance()?;
        if self.labels.iter().any(|l| l.name == label.name) {
            return Err(self.error(ErrorCode::DuplicateLabel(label.name), label.span));
        }

        let kind = if matches!(
            self.peek(),
            TokenKind::For | TokenKind::While | TokenKind::Do
        ) {
            LabelKind::Loop
        } else {
            LabelKind::Other
        };
        let body_start = self.start();
        // `a: b: while (x)` makes both labels loop labels.
        for existing in self.labels.iter_mut().rev() {
            if existing.statement_start != start {
                break;
            }
            existing.statement_start = body_start;
            existing.kind = kind;
        }
        self.labels.push(Label {
            name: label.name.clone(),
            kind,
            statement_start: body_start,
        });

        let body_position = match position {
            Position::ListItem { .. } | Position::Label => Position::Label,
            Position::If | Position::Nested => Position::Nested,
        };
        let body = self.parse_statement(body_position);
        self.labels.pop();
        let body = Box::new(body?);

        Ok(Stmt::new(StmtKind::Labeled { label, body }, self.span_from(start)))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::context::Context;
    use crate::error::{ErrorCode, Result};
    use crate::options::{Extensions, ParserOptions};
    use crate::parser::Parser;

    fn parse_with(source: &str, options: &ParserOptions) -> Result<Program> {
        Parser::new(source, options, Context::empty())?.parse()
    }

    fn parse(source: &str) -> Result<Program> {
        parse_with(source, &ParserOptions::default())
    }

    fn parse_err(source: &str) -> ErrorCode {
        match parse(source) {
            Ok(program) => panic!("expected an error for {source:?}, got {program:?}"),
            Err(err) => err.code,
        }
    }

    fn webcompat() -> ParserOptions {
        ParserOptions {
            webcompat: true,
            ..ParserOptions::default()
        }
    }

    #[test]
    fn test_variable_declarations() {
        let program = parse("var a = 1, b; let [c] = d; const {e} = f;").unwrap();
        let kinds: Vec<_> = program
            .body
            .iter()
            .map(|stmt| match &stmt.kind {
                StmtKind::Var(decl) => (decl.kind, decl.decls.len()),
                other => panic!("expected declaration, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![(VarKind::Var, 2), (VarKind::Let, 1), (VarKind::Const, 1)]
        );
        assert_eq!(program.body[0].span.end, 13);
    }

    #[test]
    fn test_missing_initializers() {
        assert_eq!(parse_err("const a;"), ErrorCode::MissingInitializer("const"));
        assert_eq!(
            parse_err("let [a];"),
            ErrorCode::MissingInitializer("destructuring")
        );
        assert!(parse("let a; var b;").is_ok());
    }

    #[test]
    fn test_let_as_identifier() {
        assert!(parse("let = 1; let(); let.x;").is_ok());
        assert!(parse("var let = 1;").is_ok());
        assert_eq!(parse_err("let let = 1;"), ErrorCode::LetInLexicalBinding);
        assert!(matches!(
            parse_err("'use strict'; var let;"),
            ErrorCode::StrictReservedWord(_)
        ));
        // A line break does not end `let` before a binding.
        let program = parse("let\nx = 1").unwrap();
        assert!(matches!(program.body[0].kind, StmtKind::Var(_)));
    }

    #[test]
    fn test_redeclaration() {
        assert_eq!(
            parse_err("let x; let x;"),
            ErrorCode::Redeclaration("x".to_string())
        );
        assert!(parse("let x; { let x; }").is_ok());
        assert!(parse("var x; var x;").is_ok());
        assert_eq!(
            parse_err("let x; var x;"),
            ErrorCode::Redeclaration("x".to_string())
        );
        assert_eq!(
            parse_err("{ var x; } let x;"),
            ErrorCode::Redeclaration("x".to_string())
        );
        assert!(parse("function f() {} var f;").is_ok());
        assert_eq!(
            parse_err("{ function f() {} let f; }"),
            ErrorCode::Redeclaration("f".to_string())
        );
    }

    #[test]
    fn test_block_function_duplicates() {
        assert_eq!(
            parse_err("{ function f() {} function f() {} }"),
            ErrorCode::Redeclaration("f".to_string())
        );
        assert!(parse_with("{ function f() {} function f() {} }", &webcompat()).is_ok());
        let lexical = ParserOptions {
            lexical: true,
            ..webcompat()
        };
        assert!(parse_with("{ function f() {} function f() {} }", &lexical).is_err());
    }

    #[test]
    fn test_lexical_declaration_positions() {
        assert_eq!(parse_err("if (a) let [x] = y;"), ErrorCode::LexicalInStatementPosition);
        assert_eq!(parse_err("while (a) const x = 1;"), ErrorCode::LexicalInStatementPosition);
        assert_eq!(parse_err("if (a) class C {}"), ErrorCode::LexicalInStatementPosition);
        // Sloppy `let` followed by a name on the same line is an expression
        // statement, which then needs a semicolon.
        assert_eq!(parse_err("if (a) let x;"), ErrorCode::MissingSemicolon);
    }

    #[test]
    fn test_function_declaration_positions() {
        assert_eq!(
            parse_err("while (a) function f() {}"),
            ErrorCode::FunctionInStatementPosition
        );
        assert_eq!(
            parse_err("if (a) function f() {}"),
            ErrorCode::FunctionInStatementPosition
        );
        assert!(parse_with("if (a) function f() {} else function g() {}", &webcompat()).is_ok());
        assert_eq!(
            parse_with("'use strict'; if (a) function f() {}", &webcompat())
                .unwrap_err()
                .code,
            ErrorCode::StrictFunction
        );
        assert!(parse_with("if (a) function* g() {}", &webcompat()).is_err());
        assert!(parse("a: function f() {}").is_ok());
        assert_eq!(parse_err("'use strict'; a: function f() {}"), ErrorCode::StrictFunction);
        assert_eq!(
            parse_err("while (x) a: function f() {}"),
            ErrorCode::FunctionInStatementPosition
        );
        assert_eq!(
            parse_err("if (a) async function f() {}"),
            ErrorCode::FunctionInStatementPosition
        );
    }

    #[test]
    fn test_async_function_declaration() {
        let program = parse("async function f() {}").unwrap();
        match &program.body[0].kind {
            StmtKind::Function(function) => assert!(function.is_async),
            other => panic!("expected function, got {other:?}"),
        }
        // A line break after `async` makes it an identifier.
        let program = parse("async\nfunction f() {}").unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_for_statements() {
        assert!(parse("for (;;) {}").is_ok());
        assert!(parse("for (var i = 0, j; i < 1; i++) {}").is_ok());
        assert!(parse("for (let [a, b] of c) {}").is_ok());
        assert!(parse("for (const k in o) {}").is_ok());
        assert!(parse("for (a.b in c) {}").is_ok());
        assert!(parse("for ([a, b] of c) {}").is_ok());
        assert!(parse("for (let in o) {}").is_ok());
        assert!(parse("for (x of a, b) ;").is_err());
        assert!(parse("for ((a in b);;) {}").is_ok());
        assert!(parse("for (async of => {};;) {}").is_ok());
    }

    #[test]
    fn test_for_head_errors() {
        assert_eq!(
            parse_err("for (let a, b of c) {}"),
            ErrorCode::ForInOfMultipleBindings("of")
        );
        assert_eq!(
            parse_err("for (let a = 1 in b) {}"),
            ErrorCode::ForInOfInitializer("in")
        );
        assert_eq!(
            parse_err("for (var a = 1 of b) {}"),
            ErrorCode::ForInOfInitializer("of")
        );
        assert!(parse("for (var a = 1 in b) {}").is_ok());
        assert_eq!(
            parse_err("'use strict'; for (var a = 1 in b) {}"),
            ErrorCode::ForInOfInitializer("in")
        );
        assert_eq!(parse_err("for (let of x) {}"), ErrorCode::ForOfInvalidLeft("let"));
        assert_eq!(parse_err("for (let.x of y) {}"), ErrorCode::ForOfInvalidLeft("let"));
        assert_eq!(parse_err("for (async of x) {}"), ErrorCode::ForOfInvalidLeft("async"));
        assert_eq!(parse_err("for (a() in b) {}"), ErrorCode::InvalidForTarget);
        assert_eq!(parse_err("for ({a = 1};;) {}"), ErrorCode::ShorthandInitializer);
        assert_eq!(parse_err("for (x = 0 in y);"), ErrorCode::ForInOfInitializer("in"));
        assert_eq!(parse_err("for ([a] = 0 in y);"), ErrorCode::ForInOfInitializer("in"));
        assert_eq!(parse_err("for (x = 0 of y);"), ErrorCode::ForInOfInitializer("of"));
        assert_eq!(parse_err("for ((x = 0) in y);"), ErrorCode::ParenthesizedPattern);
        assert!(parse("for ((x) in y);").is_ok());
        assert!(parse("for ([a = 0] of y);").is_ok());
        assert!(parse("for (x = 0;;) break;").is_ok());
    }

    #[test]
    fn test_for_await() {
        assert!(parse("async function f() { for await (x of y) {} }").is_ok());
        assert!(parse("async function f() { for await (async of y) {} }").is_ok());
        assert_eq!(
            parse_err("async function f() { for await (x in y) {} }"),
            ErrorCode::ForAwaitWithoutOf
        );
        assert_eq!(
            parse_err("async function f() { for await (;;) {} }"),
            ErrorCode::ForAwaitWithoutOf
        );
        assert_eq!(
            parse_err("async function f() { for await (const a in b); }"),
            ErrorCode::ForAwaitWithoutOf
        );
        assert_eq!(
            parse_err("async function f() { for await (var a in b); }"),
            ErrorCode::ForAwaitWithoutOf
        );
        assert!(parse("async function f() { for await (const a of b); }").is_ok());
        assert!(parse("function f() { for await (x of y) {} }").is_err());
        let program = parse_with("for await (const x of y) {}", &ParserOptions::module()).unwrap();
        assert!(matches!(
            program.body[0].kind,
            StmtKind::ForOf { is_await: true, .. }
        ));
    }

    #[test]
    fn test_for_head_scope() {
        assert!(parse("for (let i;;) { let i; }").is_ok());
        assert_eq!(
            parse_err("for (let i of x) { var i; }"),
            ErrorCode::Redeclaration("i".to_string())
        );
    }

    #[test]
    fn test_break_and_continue() {
        assert_eq!(parse_err("break;"), ErrorCode::IllegalBreak);
        assert_eq!(parse_err("continue;"), ErrorCode::IllegalContinue);
        assert!(parse("while (a) { break; }").is_ok());
        assert!(parse("switch (a) { case 1: break; }").is_ok());
        assert_eq!(
            parse_err("switch (a) { case 1: continue; }"),
            ErrorCode::IllegalContinue
        );
        assert!(parse("a: { break a; }").is_ok());
        assert_eq!(parse_err("a: { continue a; }"), ErrorCode::IllegalContinue);
        assert!(parse("a: b: while (x) { continue a; }").is_ok());
        assert_eq!(
            parse_err("while (x) { break b; }"),
            ErrorCode::UndefinedLabel("b".to_string())
        );
        assert_eq!(
            parse_err("while (x) { (function () { break; }); }"),
            ErrorCode::IllegalBreak
        );
        // A line break ends the statement before a label.
        assert!(parse("a: while (x) { break\na; }").is_ok());
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            parse_err("a: a: ;"),
            ErrorCode::DuplicateLabel("a".to_string())
        );
        assert!(parse("a: ; a: ;").is_ok());
        assert!(parse("async: ; let: ; yield: ;").is_ok());
        assert!(parse("function* g() { yield: ; }").is_err());
        assert!(parse("'use strict'; yield: ;").is_err());
        assert_eq!(parse_err("(a): 1"), ErrorCode::MissingSemicolon);
    }

    #[test]
    fn test_return() {
        assert_eq!(parse_err("return;"), ErrorCode::IllegalReturn);
        assert!(parse("function f() { return\n1; }").is_ok());
        let options = ParserOptions {
            global_return: true,
            ..ParserOptions::default()
        };
        assert!(parse_with("return 1;", &options).is_ok());
    }

    #[test]
    fn test_throw_and_try() {
        assert_eq!(parse_err("throw\nerr;"), ErrorCode::NewlineAfterThrow);
        assert!(parse("try {} catch {} finally {}").is_ok());
        assert!(parse("try {} catch ({message}) {}").is_ok());
        assert_eq!(parse_err("try {}"), ErrorCode::MissingCatchOrFinally);
    }

    #[test]
    fn test_catch_parameter_scope() {
        assert!(parse("try {} catch (e) { var e; }").is_ok());
        assert_eq!(
            parse_err("try {} catch (e) { let e; }"),
            ErrorCode::Redeclaration("e".to_string())
        );
        assert_eq!(
            parse_err("try {} catch ([e]) { var e; }"),
            ErrorCode::Redeclaration("e".to_string())
        );
        assert!(parse("try {} catch (e) { { let e; } }").is_ok());
        assert_eq!(
            parse_err("'use strict'; try {} catch (eval) {}"),
            ErrorCode::StrictEvalArguments
        );
    }

    #[test]
    fn test_switch() {
        let program = parse("switch (a) { case 1: b; c; default: d; case 2: }").unwrap();
        match &program.body[0].kind {
            StmtKind::Switch { cases, .. } => {
                assert_eq!(cases.len(), 3);
                assert_eq!(cases[0].consequent.len(), 2);
                assert!(cases[1].test.is_none());
            }
            other => panic!("expected switch, got {other:?}"),
        }
        assert_eq!(
            parse_err("switch (a) { default: default: }"),
            ErrorCode::MultipleDefaults
        );
        assert_eq!(
            parse_err("switch (a) { case 1: let x; case 2: let x; }"),
            ErrorCode::Redeclaration("x".to_string())
        );
    }

    #[test]
    fn test_with_and_do_while() {
        assert!(parse("with (a) b;").is_ok());
        assert_eq!(parse_err("'use strict'; with (a) b;"), ErrorCode::StrictWith);
        assert!(parse("do x; while (a) y;").is_ok());
        assert!(parse("do ; while (a)").is_ok());
    }

    #[test]
    fn test_expression_statement_lookahead() {
        // `{` starts a block, so this is a block followed by `= y`.
        assert!(parse("{x} = y").is_err());
        assert!(parse("({x} = y)").is_ok());
        assert!(parse("a\n++b").is_ok());
    }

    #[test]
    fn test_import_export_outside_module() {
        assert_eq!(parse_err("import a from 'a';"), ErrorCode::ImportOutsideModule);
        assert_eq!(parse_err("export {};"), ErrorCode::ExportOutsideModule);
        assert!(parse("import('a');").is_ok());
    }

    #[test]
    fn test_using_declarations() {
        let options = ParserOptions {
            extensions: Extensions::USING,
            ..ParserOptions::default()
        };
        let program = parse_with("{ using a = b; }", &options).unwrap();
        match &program.body[0].kind {
            StmtKind::Block(body) => match &body[0].kind {
                StmtKind::Var(decl) => assert_eq!(decl.kind, VarKind::Using),
                other => panic!("expected declaration, got {other:?}"),
            },
            other => panic!("expected block, got {other:?}"),
        }
        assert_eq!(
            parse_with("using a = b;", &options).unwrap_err().code,
            ErrorCode::UsingPosition("using")
        );
        assert_eq!(
            parse_with("{ using a; }", &options).unwrap_err().code,
            ErrorCode::MissingInitializer("using")
        );
        assert!(parse_with("async function f() { await using a = b; }", &options).is_ok());
        assert!(parse_with("function f() { for (using x of y) {} }", &options).is_ok());
        // Without the extension `using` is an identifier.
        assert!(parse("using\na = b;").is_ok());
        assert!(parse_with("{ using[0] = 1; }", &options).is_ok());
    }
}
