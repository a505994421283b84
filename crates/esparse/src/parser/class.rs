//! Classes and decorators.
//!
//! All parts of a class are strict mode code. Private names are collected
//! per class body and resolved when the body closes, so a method may use a
//! field declared after it.

use tracing::trace;

use super::{CoverErrors, Parser};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorCode, Result};
use crate::options::Extensions;
use crate::scope::{BindingKind, PrivateNameKind, ScopeFlags};
use crate::token::TokenKind;

/// Where a `class` keyword was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClassKind {
    Declaration,
    /// `export default class`, where the name is optional.
    DefaultExport,
    Expression,
}

impl<'a> Parser<'a> {
    /// Parse a class. The current token is `class`; `start` is where any
    /// decorators began.
    pub(crate) fn parse_class(
        &mut self,
        start: u32,
        decorators: Vec<Decorator>,
        kind: ClassKind,
    ) -> Result<Class> {
        self.expect(&TokenKind::Class)?;
        let (id, super_class, body, body_start) =
            self.with_context(Context::STRICT, Context::DISALLOW_IN, |p| {
                let id = if p.at_identifier() && !p.check(&TokenKind::Extends) {
                    let id = p.parse_ident()?;
                    if kind != ClassKind::Expression {
                        p.declare_binding(&id.name, id.span, BindingKind::Lexical)?;
                    }
                    Some(id)
                } else if kind == ClassKind::Declaration {
                    return Err(p.unexpected());
                } else {
                    None
                };
                trace!(name = id.as_ref().map(|id| id.name.as_str()), "parsing class");

                let super_class = if p.eat(&TokenKind::Extends)? {
                    Some(Box::new(p.parse_lhs(None)?))
                } else {
                    None
                };

                let body_start = p.start();
                p.expect(&TokenKind::LBrace)?;
                p.private_names.enter();
                let body = p.parse_class_body(super_class.is_some());
                let resolved = p.private_names.exit();
                let body = body?;
                resolved.map_err(|(code, span)| p.error(code, span))?;
                Ok((id, super_class, body, body_start))
            })?;
        self.expect(&TokenKind::RBrace)?;

        Ok(Class {
            id,
            super_class,
            body,
            body_span: self.span_from(body_start),
            decorators,
            span: self.span_from(start),
        })
    }

    fn parse_class_body(&mut self, derived: bool) -> Result<Vec<ClassMember>> {
        let mut members = Vec::new();
        let mut has_constructor = false;
        while !self.check(&TokenKind::RBrace) {
            if self.eat(&TokenKind::Semicolon)? {
                continue;
            }
            let member = self.parse_class_member(derived)?;
            if let ClassMemberKind::Method {
                kind: MethodKind::Constructor,
                key,
                ..
            } = &member.kind
            {
                if has_constructor {
                    return Err(self.error(ErrorCode::DuplicateConstructor, key.span()));
                }
                has_constructor = true;
            }
            members.push(member);
        }
        Ok(members)
    }

    /// A class element name can start here (a `*` does not count).
    fn at_class_element_name_start(&self) -> bool {
        !self.check(&TokenKind::Star) && self.at_property_key_start()
    }

    fn parse_class_member(&mut self, derived: bool) -> Result<ClassMember> {
        let start = self.start();
        let decorators = self.parse_decorators()?;

        // A modifier word not followed by a name is the name itself.
        let mut word_key = None;
        let mut is_static = false;
        if self.is_contextual("static") {
            let token = self.advance()?;
            if self.check(&TokenKind::LBrace) {
                if !decorators.is_empty() {
                    return Err(self.error(ErrorCode::DecoratorPosition, self.span_from(start)));
                }
                return self.parse_static_block(start);
            }
            if self.at_property_key_start() {
                is_static = true;
            } else {
                word_key = Some(Ident::new("static", token.span));
            }
        }

        let mut accessor = false;
        if word_key.is_none()
            && self.options.has_extension(Extensions::DECORATORS)
            && self.is_contextual("accessor")
        {
            let token = self.advance()?;
            if self.at_class_element_name_start() && !self.current.had_newline_before() {
                accessor = true;
            } else {
                word_key = Some(Ident::new("accessor", token.span));
            }
        }

        let mut is_async = false;
        if word_key.is_none() && !accessor && self.is_contextual("async") {
            let token = self.advance()?;
            if self.at_property_key_start() && !self.can_insert_semicolon() {
                is_async = true;
            } else {
                word_key = Some(Ident::new("async", token.span));
            }
        }

        let is_generator = word_key.is_none() && !accessor && self.eat(&TokenKind::Star)?;

        let mut method_kind = MethodKind::Method;
        if word_key.is_none() && !accessor && !is_async && !is_generator {
            let accessor_kind = if self.is_contextual("get") {
                Some((MethodKind::Get, "get"))
            } else if self.is_contextual("set") {
                Some((MethodKind::Set, "set"))
            } else {
                None
            };
            if let Some((kind, word)) = accessor_kind {
                let token = self.advance()?;
                if self.at_class_element_name_start() {
                    method_kind = kind;
                } else {
                    word_key = Some(Ident::new(word, token.span));
                }
            }
        }

        let key = match word_key {
            Some(id) => PropertyKey::Ident(id),
            None => {
                if matches!(self.peek(), TokenKind::PrivateName(name) if name == "constructor") {
                    return Err(self.error(ErrorCode::PrivateConstructor, self.current.span));
                }
                self.parse_property_key(true)?
            }
        };

        let is_method = self.check(&TokenKind::LParen)
            || method_kind != MethodKind::Method
            || is_generator
            || is_async;
        let kind = if is_method {
            if accessor {
                return Err(self.unexpected());
            }
            self.parse_class_method(key, method_kind, is_static, is_async, is_generator, derived, decorators)?
        } else {
            self.parse_class_field(key, is_static, accessor, decorators)?
        };
        Ok(ClassMember {
            kind,
            span: self.span_from(start),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_class_method(
        &mut self,
        key: PropertyKey,
        method_kind: MethodKind,
        is_static: bool,
        is_async: bool,
        is_generator: bool,
        derived: bool,
        decorators: Vec<Decorator>,
    ) -> Result<ClassMemberKind> {
        let is_constructor = !is_static && key.static_name() == Some("constructor");
        if is_constructor && (method_kind != MethodKind::Method || is_async || is_generator) {
            return Err(self.error(ErrorCode::SpecialConstructor, key.span()));
        }
        if is_static && key.static_name() == Some("prototype") {
            return Err(self.error(ErrorCode::StaticPrototype, key.span()));
        }

        let extra = Context::SUPER_PROPERTY.union_if(Context::SUPER_CALL, is_constructor && derived);
        let value = self.parse_method(is_async, is_generator, extra)?;
        if method_kind != MethodKind::Method {
            self.check_accessor_params(method_kind == MethodKind::Get, &value)?;
        }

        if let PropertyKey::Private(id) = &key {
            let private_kind = match method_kind {
                MethodKind::Get => PrivateNameKind::Getter,
                MethodKind::Set => PrivateNameKind::Setter,
                _ => PrivateNameKind::Method,
            };
            self.private_names
                .declare(&id.name, private_kind, is_static)
                .map_err(|code| self.error(code, id.span))?;
        }

        Ok(ClassMemberKind::Method {
            key,
            value,
            kind: if is_constructor {
                MethodKind::Constructor
            } else {
                method_kind
            },
            is_static,
            decorators,
        })
    }

    fn parse_class_field(
        &mut self,
        key: PropertyKey,
        is_static: bool,
        accessor: bool,
        decorators: Vec<Decorator>,
    ) -> Result<ClassMemberKind> {
        match key.static_name() {
            Some("constructor") => {
                return Err(self.error(ErrorCode::ConstructorField, key.span()));
            }
            Some("prototype") if is_static => {
                return Err(self.error(ErrorCode::StaticPrototype, key.span()));
            }
            _ => {}
        }
        if let PropertyKey::Private(id) = &key {
            self.private_names
                .declare(&id.name, PrivateNameKind::Field, is_static)
                .map_err(|code| self.error(code, id.span))?;
        }

        let value = if self.eat(&TokenKind::Eq)? {
            let ctx = (self.ctx & Context::INHERITED_BY_FUNCTIONS)
                | Context::CLASS_FIELD_INIT
                | Context::SUPER_PROPERTY
                | Context::NEW_TARGET;
            Some(self.in_context(ctx, |p| p.parse_assign_expr(None))?)
        } else {
            None
        };
        self.expect_semicolon()?;

        Ok(ClassMemberKind::Property {
            key,
            value,
            is_static,
            accessor,
            decorators,
        })
    }

    /// `static { ... }`. The current token is `{`.
    fn parse_static_block(&mut self, start: u32) -> Result<ClassMember> {
        let ctx = (self.ctx & Context::INHERITED_BY_FUNCTIONS)
            | Context::STATIC_BLOCK
            | Context::SUPER_PROPERTY
            | Context::NEW_TARGET;

        let state = self.enter_function_state();
        self.frame.close();
        self.scopes.enter(ScopeFlags::CLASS_STATIC_BLOCK);
        let result = self.in_context(ctx, |p| {
            p.advance()?;
            let mut body = Vec::new();
            while !p.check(&TokenKind::RBrace) {
                body.push(p.parse_statement_list_item(false)?);
            }
            Ok(body)
        });
        self.scopes.exit();
        self.exit_function_state(state);
        let body = result?;

        self.expect(&TokenKind::RBrace)?;
        Ok(ClassMember {
            kind: ClassMemberKind::StaticBlock(body),
            span: self.span_from(start),
        })
    }

    // =========================================================================
    // Decorators
    // =========================================================================

    /// Parse any `@decorator`s at the current position.
    pub(crate) fn parse_decorators(&mut self) -> Result<Vec<Decorator>> {
        let mut decorators = Vec::new();
        while self.check(&TokenKind::At) {
            if !self.options.has_extension(Extensions::DECORATORS) {
                return Err(self.unexpected());
            }
            decorators.push(self.parse_decorator()?);
        }
        Ok(decorators)
    }

    /// `@(expr)`, `@a.b.c` or `@a.b(args)`.
    fn parse_decorator(&mut self) -> Result<Decorator> {
        let start = self.start();
        self.advance()?;
        let expr_start = self.start();

        if self.eat(&TokenKind::LParen)? {
            let inner = self.allow_in(|p| p.parse_expr())?;
            self.expect(&TokenKind::RParen)?;
            let expr = Expr::new(ExprKind::Paren(Box::new(inner)), self.span_from(expr_start));
            return Ok(Decorator {
                expr,
                span: self.span_from(start),
            });
        }

        let id = self.parse_ident()?;
        let mut expr = Expr::new(ExprKind::Ident(id.name), id.span);
        while self.eat(&TokenKind::Dot)? {
            let property = if let TokenKind::PrivateName(name) = self.peek() {
                let id = Ident::new(name.clone(), self.current.span);
                self.advance()?;
                self.private_names
                    .reference(&id.name, id.span)
                    .map_err(|code| self.error(code, id.span))?;
                MemberProp::Private(id)
            } else {
                MemberProp::Ident(self.parse_ident_name()?)
            };
            expr = Expr::new(
                ExprKind::Member {
                    object: Box::new(expr),
                    property,
                    optional: false,
                },
                self.span_from(expr_start),
            );
        }
        if self.eat(&TokenKind::LParen)? {
            let mut refs = CoverErrors::default();
            let args = self.allow_in(|p| p.parse_arguments(&mut refs))?;
            self.check_expression_errors(&refs)?;
            expr = Expr::new(
                ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                    optional: false,
                },
                self.span_from(expr_start),
            );
        }
        Ok(Decorator {
            expr,
            span: self.span_from(start),
        })
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
        parse(source).unwrap_err().code
    }

    fn class_members(program: &Program) -> &[ClassMember] {
        match &program.body[0].kind {
            StmtKind::Class(class) => &class.body,
            other => panic!("expected class declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_class_members() {
        let program = parse(
            "class A extends B {
                constructor() { super(); }
                static m() {}
                get x() { return 1; }
                set x(v) {}
                async *gen() {}
                field = 1;
                static #count = 0;
                static { this.#count++; }
            }",
        )
        .unwrap();
        let members = class_members(&program);
        assert_eq!(members.len(), 8);
        assert!(matches!(
            members[0].kind,
            ClassMemberKind::Method { kind: MethodKind::Constructor, .. }
        ));
        assert!(matches!(
            members[1].kind,
            ClassMemberKind::Method { is_static: true, .. }
        ));
        assert!(matches!(members[2].kind, ClassMemberKind::Method { kind: MethodKind::Get, .. }));
        assert!(matches!(members[7].kind, ClassMemberKind::StaticBlock(_)));
    }

    #[test]
    fn test_modifier_words_as_names() {
        let program = parse("class A { static; get; set = 1; async() {} static static() {} }").unwrap();
        let names: Vec<_> = class_members(&program)
            .iter()
            .map(|member| match &member.kind {
                ClassMemberKind::Method { key, .. } | ClassMemberKind::Property { key, .. } => {
                    key.static_name().map(str::to_string)
                }
                ClassMemberKind::StaticBlock(_) => None,
            })
            .collect();
        assert_eq!(
            names,
            vec![
                Some("static".to_string()),
                Some("get".to_string()),
                Some("set".to_string()),
                Some("async".to_string()),
                Some("static".to_string()),
            ]
        );
    }

    #[test]
    fn test_constructor_rules() {
        assert_eq!(
            parse_err("class A { constructor() {} constructor() {} }"),
            ErrorCode::DuplicateConstructor
        );
        assert_eq!(parse_err("class A { get constructor() {} }"), ErrorCode::SpecialConstructor);
        assert_eq!(parse_err("class A { *constructor() {} }"), ErrorCode::SpecialConstructor);
        assert_eq!(parse_err("class A { constructor = 1; }"), ErrorCode::ConstructorField);
        assert_eq!(parse_err("class A { #constructor; }"), ErrorCode::PrivateConstructor);
        assert!(parse("class A { static constructor() {} ['constructor']() {} }").is_ok());
    }

    #[test]
    fn test_static_prototype() {
        assert_eq!(parse_err("class A { static prototype() {} }"), ErrorCode::StaticPrototype);
        assert_eq!(parse_err("class A { static prototype = 1; }"), ErrorCode::StaticPrototype);
        assert!(parse("class A { prototype() {} }").is_ok());
    }

    #[test]
    fn test_super_call_needs_derived_constructor() {
        assert_eq!(
            parse_err("class A { constructor() { super(); } }"),
            ErrorCode::InvalidSuperCall
        );
        assert_eq!(
            parse_err("class A extends B { m() { super(); } }"),
            ErrorCode::InvalidSuperCall
        );
        assert!(parse("class A extends B { constructor() { () => super(); } }").is_ok());
        assert!(parse("class A { m() { super.m(); } }").is_ok());
    }

    #[test]
    fn test_private_names() {
        assert!(parse("class A { #x; m() { return this.#x + (#x in this); } }").is_ok());
        assert!(parse("class A { m() { this.#x; } #x = 1; }").is_ok());
        assert!(parse("class A { get #x() {} set #x(v) {} }").is_ok());
        assert!(parse("class A { #x; m() { class B { n() { this.#x; } } } }").is_ok());
        assert_eq!(
            parse_err("class A { #x; #x; }"),
            ErrorCode::DuplicatePrivateName("x".into())
        );
        assert_eq!(
            parse_err("class A { get #x() {} static set #x(v) {} }"),
            ErrorCode::DuplicatePrivateName("x".into())
        );
        assert_eq!(
            parse_err("class A { m() { this.#y; } }"),
            ErrorCode::UndeclaredPrivateName("y".into())
        );
        assert!(matches!(
            parse_err("class A { #x; m() { return 1 + #x in this; } }"),
            ErrorCode::UnexpectedToken(_)
        ));
        assert_eq!(
            parse_err("this.#x;"),
            ErrorCode::UndeclaredPrivateName("x".into())
        );
        assert_eq!(
            parse_err("class A { #x; m() { delete this.#x; } }"),
            ErrorCode::DeletePrivateField
        );
    }

    #[test]
    fn test_class_body_is_strict() {
        assert_eq!(parse_err("class A { m() { with (a) {} } }"), ErrorCode::StrictWith);
        assert_eq!(
            parse_err("class let {}"),
            ErrorCode::StrictReservedWord("let".into())
        );
        assert!(parse("class A {} with (a) {}").is_ok());
    }

    #[test]
    fn test_class_initializers() {
        assert_eq!(
            parse_err("class A { x = arguments; }"),
            ErrorCode::ArgumentsInClassInit
        );
        assert_eq!(
            parse_err("class A { x = () => arguments; }"),
            ErrorCode::ArgumentsInClassInit
        );
        assert!(parse("class A { x = function () { return arguments; }; }").is_ok());
        assert_eq!(
            parse_err("class A { static { await; } }"),
            ErrorCode::AwaitIdentifier
        );
        assert_eq!(
            parse_err("class A { static { return; } }"),
            ErrorCode::IllegalReturn
        );
        assert!(parse("class A { static { var a; let b; } }").is_ok());
    }

    #[test]
    fn test_class_declaration_binds_lexically() {
        assert_eq!(
            parse_err("class A {} var A;"),
            ErrorCode::Redeclaration("A".into())
        );
        assert_eq!(parse_err("class {}"), ErrorCode::UnexpectedToken("'{'".into()));
        assert!(parse("(class {});").is_ok());
    }

    #[test]
    fn test_decorators_need_extension() {
        assert!(matches!(parse_err("@dec class A {}"), ErrorCode::UnexpectedToken(_)));

        let options = ParserOptions {
            extensions: Extensions::DECORATORS,
            ..ParserOptions::default()
        };
        let program = parse_with(
            "@dec @ns.dec(1) @(expr) class A { @field accessor x = 1; @method m() {} }",
            &options,
        )
        .unwrap();
        let StmtKind::Class(class) = &program.body[0].kind else {
            panic!("expected class");
        };
        assert_eq!(class.decorators.len(), 3);
        assert!(matches!(
            &class.body[0].kind,
            ClassMemberKind::Property { accessor: true, decorators, .. } if decorators.len() == 1
        ));
        assert!(parse_with("class A { accessor() {} accessor; }", &options).is_ok());
    }
}
