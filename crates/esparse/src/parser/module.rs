//! Import and export declarations.
//!
//! Exported names are recorded in the [`ModuleRecord`](crate::scope::ModuleRecord)
//! as they are seen. `export { a }` may come before `a` is declared, so local
//! names that are not declared yet are kept until the end of the module.

use rustc_hash::FxHashSet as HashSet;

use super::class::ClassKind;
use super::function::FunctionKind;
use super::Parser;
use crate::ast::*;
use crate::error::{ErrorCode, Result};
use crate::scope::BindingKind;
use crate::span::Span;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    // =========================================================================
    // Imports
    // =========================================================================

    /// `import ... from "source"` or `import "source"`. The current token is
    /// `import`.
    pub(crate) fn parse_import(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;

        let mut specifiers = Vec::new();
        if !matches!(self.peek(), TokenKind::String(_)) {
            if self.at_identifier() {
                let local = self.parse_import_binding()?;
                specifiers.push(ImportSpecifier::Default {
                    span: local.span,
                    local,
                });
                if self.eat(&TokenKind::Comma)? {
                    self.parse_import_clause_rest(&mut specifiers)?;
                }
            } else {
                self.parse_import_clause_rest(&mut specifiers)?;
            }
            self.expect_contextual("from")?;
        }

        let source = self.parse_module_source()?;
        let attributes = self.parse_import_attributes()?;
        self.expect_semicolon()?;
        Ok(Stmt::new(
            StmtKind::Import(Box::new(ImportDecl {
                specifiers,
                source,
                attributes,
            })),
            self.span_from(start),
        ))
    }

    /// `* as ns` or `{ a, b as c }` after an optional default binding.
    fn parse_import_clause_rest(&mut self, specifiers: &mut Vec<ImportSpecifier>) -> Result<()> {
        let start = self.start();
        if self.eat(&TokenKind::Star)? {
            self.expect_contextual("as")?;
            let local = self.parse_import_binding()?;
            specifiers.push(ImportSpecifier::Namespace {
                local,
                span: self.span_from(start),
            });
            return Ok(());
        }

        self.expect(&TokenKind::LBrace)?;
        while !self.eat(&TokenKind::RBrace)? {
            specifiers.push(self.parse_import_specifier()?);
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        Ok(())
    }

    fn parse_import_specifier(&mut self) -> Result<ImportSpecifier> {
        let start = self.start();
        let escaped = self.current.is_escaped();
        let imported = self.parse_module_export_name()?;

        let local = if self.eat_contextual("as")? {
            self.parse_import_binding()?
        } else {
            // `import { x }` binds `x`, which must then be a valid binding.
            let ModuleExportName::Ident(id) = &imported else {
                return Err(self.error(
                    ErrorCode::Expected {
                        expected: "'as'".to_string(),
                        found: crate::token::describe(self.peek()),
                    },
                    self.current.span,
                ));
            };
            let id = id.clone();
            self.check_identifier(&id.name, id.span, escaped)?;
            self.declare_binding(&id.name, id.span, BindingKind::Lexical)?;
            id
        };
        Ok(ImportSpecifier::Named {
            imported,
            local,
            span: self.span_from(start),
        })
    }

    /// An imported binding, which is lexical and immutable.
    fn parse_import_binding(&mut self) -> Result<Ident> {
        let id = self.parse_ident()?;
        self.declare_binding(&id.name, id.span, BindingKind::Lexical)?;
        Ok(id)
    }

    /// `IdentifierName` or string literal, as used in specifiers.
    fn parse_module_export_name(&mut self) -> Result<ModuleExportName> {
        if matches!(self.peek(), TokenKind::String(_)) {
            return Ok(ModuleExportName::String(self.parse_string_literal()?));
        }
        Ok(ModuleExportName::Ident(self.parse_ident_name()?))
    }

    fn parse_module_source(&mut self) -> Result<Expr> {
        if !matches!(self.peek(), TokenKind::String(_)) {
            return Err(self.unexpected());
        }
        self.parse_string_literal()
    }

    /// `with { type: "json" }`; keys must be unique.
    fn parse_import_attributes(&mut self) -> Result<Vec<ImportAttribute>> {
        let mut attributes = Vec::new();
        if !self.eat(&TokenKind::With)? {
            return Ok(attributes);
        }
        self.expect(&TokenKind::LBrace)?;
        let mut seen = HashSet::default();
        while !self.eat(&TokenKind::RBrace)? {
            let start = self.start();
            let key = self.parse_module_export_name()?;
            if !seen.insert(key.name().to_string()) {
                return Err(self.error(
                    ErrorCode::DuplicateImportAttribute(key.name().to_string()),
                    key.span(),
                ));
            }
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_module_source()?;
            attributes.push(ImportAttribute {
                key,
                value,
                span: self.span_from(start),
            });
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        Ok(attributes)
    }

    // =========================================================================
    // Exports
    // =========================================================================

    /// Any `export` declaration. The current token is `export`.
    pub(crate) fn parse_export(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.advance()?;

        let export = match self.peek() {
            TokenKind::Star => self.parse_export_all()?,
            TokenKind::Default => self.parse_export_default(start)?,
            TokenKind::LBrace => self.parse_export_named()?,
            _ => self.parse_export_declaration()?,
        };
        Ok(Stmt::new(
            StmtKind::Export(Box::new(export)),
            self.span_from(start),
        ))
    }

    fn add_export(&mut self, name: &str, span: Span) -> Result<()> {
        self.module_record
            .add_export(name)
            .map_err(|code| self.error(code, span))
    }

    /// `export * from "m"` and `export * as ns from "m"`.
    fn parse_export_all(&mut self) -> Result<ExportDecl> {
        self.advance()?;
        let exported = if self.eat_contextual("as")? {
            let name = self.parse_module_export_name()?;
            self.add_export(name.name(), name.span())?;
            Some(name)
        } else {
            None
        };
        self.expect_contextual("from")?;
        let source = self.parse_module_source()?;
        let attributes = self.parse_import_attributes()?;
        self.expect_semicolon()?;
        Ok(ExportDecl::All {
            exported,
            source,
            attributes,
        })
    }

    /// `export default` followed by a hoistable declaration, a class or an
    /// assignment expression.
    fn parse_export_default(&mut self, start: u32) -> Result<ExportDecl> {
        let default_span = self.advance()?.span;
        let decl_start = self.start();

        let is_async_function = self.is_contextual("async") && {
            let next = self.peek_next()?;
            next.kind == TokenKind::Function && !next.had_newline_before()
        };
        let default = if self.check(&TokenKind::Function) || is_async_function {
            if is_async_function {
                self.advance()?;
            }
            let function =
                self.parse_function(decl_start, is_async_function, FunctionKind::DefaultExport)?;
            ExportDefault::Function(Box::new(function))
        } else if self.check(&TokenKind::Class) || self.check(&TokenKind::At) {
            let decorators = self.parse_decorators()?;
            if !self.check(&TokenKind::Class) {
                return Err(self.error(ErrorCode::DecoratorPosition, self.current.span));
            }
            let class = self.parse_class(decl_start, decorators, ClassKind::DefaultExport)?;
            ExportDefault::Class(Box::new(class))
        } else {
            let expr = self.allow_in(|p| p.parse_assign_expr(None))?;
            self.expect_semicolon()?;
            ExportDefault::Expr(expr)
        };

        self.add_export("default", Span::new(start, default_span.end))?;
        Ok(ExportDecl::Default(default))
    }

    /// `export { a, b as c }`, optionally re-exported `from "m"`.
    fn parse_export_named(&mut self) -> Result<ExportDecl> {
        self.advance()?;
        let mut specifiers = Vec::new();
        while !self.eat(&TokenKind::RBrace)? {
            let start = self.start();
            let escaped = self.current.is_escaped();
            let local = self.parse_module_export_name()?;
            let exported = if self.eat_contextual("as")? {
                self.parse_module_export_name()?
            } else {
                local.clone()
            };
            self.add_export(exported.name(), exported.span())?;
            specifiers.push((
                ExportSpecifier {
                    local,
                    exported,
                    span: self.span_from(start),
                },
                escaped,
            ));
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        let (source, attributes) = if self.eat_contextual("from")? {
            let source = self.parse_module_source()?;
            (Some(source), self.parse_import_attributes()?)
        } else {
            // Without `from` each local name is a reference in this module.
            for (specifier, escaped) in &specifiers {
                self.check_local_export(&specifier.local, *escaped)?;
            }
            (None, Vec::new())
        };
        self.expect_semicolon()?;

        Ok(ExportDecl::Named {
            declaration: None,
            specifiers: specifiers.into_iter().map(|(specifier, _)| specifier).collect(),
            source,
            attributes,
        })
    }

    fn check_local_export(&mut self, local: &ModuleExportName, escaped: bool) -> Result<()> {
        let ModuleExportName::Ident(id) = local else {
            return Err(self.error(ErrorCode::InvalidExportLocal, local.span()));
        };
        self.check_identifier(&id.name, id.span, escaped)?;
        if !self.scopes.declared_at_top_level(&id.name) {
            self.module_record.expect_local(&id.name, id.span);
        }
        Ok(())
    }

    /// `export var|let|const|function|async function|class ...`.
    fn parse_export_declaration(&mut self) -> Result<ExportDecl> {
        let declaration_start = match self.peek() {
            TokenKind::Var | TokenKind::Const | TokenKind::Function | TokenKind::Class => true,
            TokenKind::Let | TokenKind::At => true,
            _ => {
                self.is_contextual("async") && {
                    let next = self.peek_next()?;
                    next.kind == TokenKind::Function && !next.had_newline_before()
                }
            }
        };
        if !declaration_start {
            return Err(self.unexpected());
        }

        let declaration = self.parse_statement_list_item(true)?;
        let mut names = Vec::new();
        match &declaration.kind {
            StmtKind::Var(decl) => {
                for declarator in &decl.decls {
                    declarator.id.bound_names(&mut names);
                }
            }
            StmtKind::Function(function) => {
                if let Some(id) = &function.id {
                    names.push((id.name.as_str(), id.span));
                }
            }
            StmtKind::Class(class) => {
                if let Some(id) = &class.id {
                    names.push((id.name.as_str(), id.span));
                }
            }
            _ => return Err(self.unexpected()),
        }
        let names: Vec<(String, Span)> = names
            .into_iter()
            .map(|(name, span)| (name.to_string(), span))
            .collect();
        for (name, span) in &names {
            self.add_export(name, *span)?;
        }

        Ok(ExportDecl::Named {
            declaration: Some(declaration),
            specifiers: Vec::new(),
            source: None,
            attributes: Vec::new(),
        })
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
        let options = ParserOptions::module();
        Parser::new(source, &options, Context::empty())?.parse()
    }

    fn parse_err(source: &str) -> ErrorCode {
        match parse(source) {
            Ok(program) => panic!("expected an error for {source:?}, got {program:?}"),
            Err(err) => err.code,
        }
    }

    fn import_decl(program: &Program) -> &ImportDecl {
        match &program.body[0].kind {
            StmtKind::Import(decl) => decl,
            other => panic!("expected import, got {other:?}"),
        }
    }

    fn export_decl(program: &Program, index: usize) -> &ExportDecl {
        match &program.body[index].kind {
            StmtKind::Export(decl) => decl,
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn test_import_forms() {
        let program = parse("import a, * as ns from 'm';").unwrap();
        let decl = import_decl(&program);
        assert!(matches!(decl.specifiers[0], ImportSpecifier::Default { .. }));
        assert!(matches!(decl.specifiers[1], ImportSpecifier::Namespace { .. }));

        let program = parse("import { a, b as c, 'd e' as f, default as g } from 'm';").unwrap();
        assert_eq!(import_decl(&program).specifiers.len(), 4);

        let program = parse("import 'side-effect';").unwrap();
        assert!(import_decl(&program).specifiers.is_empty());

        assert!(parse("import {} from 'm';").is_ok());
        assert!(parse("import a, { b } from 'm';").is_ok());
    }

    #[test]
    fn test_import_binding_errors() {
        assert!(matches!(
            parse_err("import { if } from 'm';"),
            ErrorCode::ReservedWord(_)
        ));
        assert!(matches!(
            parse_err("import { 'a' } from 'm';"),
            ErrorCode::Expected { .. }
        ));
        assert_eq!(
            parse_err("import a from 'm'; let a;"),
            ErrorCode::Redeclaration("a".to_string())
        );
        assert_eq!(parse_err("import eval from 'm';"), ErrorCode::StrictEvalArguments);
        assert_eq!(parse_err("{ import a from 'm'; }"), ErrorCode::ImportExportNotTopLevel);
    }

    #[test]
    fn test_import_attributes() {
        let program = parse("import data from './a.json' with { type: 'json' };").unwrap();
        let decl = import_decl(&program);
        assert_eq!(decl.attributes.len(), 1);
        assert_eq!(decl.attributes[0].key.name(), "type");

        assert_eq!(
            parse_err("import a from 'm' with { type: 'json', 'type': 'css' };"),
            ErrorCode::DuplicateImportAttribute("type".to_string())
        );
        assert!(parse("export * from 'm' with { type: 'json' };").is_ok());
    }

    #[test]
    fn test_export_declarations() {
        let program = parse(
            "export var a = 1; export let [b, c] = d; export function f() {} \
             export async function g() {} export class C {}",
        )
        .unwrap();
        assert_eq!(program.body.len(), 5);
        match export_decl(&program, 1) {
            ExportDecl::Named {
                declaration: Some(stmt),
                ..
            } => assert!(matches!(stmt.kind, StmtKind::Var(_))),
            other => panic!("expected declaration export, got {other:?}"),
        }
        assert_eq!(
            parse_err("export var a; export let a2 = 1; export { a };"),
            ErrorCode::DuplicateExport("a".to_string())
        );
        assert!(matches!(parse_err("export if (a) {}"), ErrorCode::UnexpectedToken(_)));
    }

    #[test]
    fn test_export_default() {
        let program = parse("export default function () {}").unwrap();
        match export_decl(&program, 0) {
            ExportDecl::Default(ExportDefault::Function(function)) => assert!(function.id.is_none()),
            other => panic!("expected default function, got {other:?}"),
        }
        assert!(parse("export default class {}").is_ok());
        assert!(parse("export default async function named() {}").is_ok());
        assert!(parse("export default 1 + 2;").is_ok());
        assert!(parse("export default (a, b);").is_ok());
        assert_eq!(
            parse_err("export default 1; export default 2;"),
            ErrorCode::DuplicateExport("default".to_string())
        );
        assert_eq!(
            parse_err("export default function f() {} let f;"),
            ErrorCode::Redeclaration("f".to_string())
        );
    }

    #[test]
    fn test_export_named() {
        let program = parse("let a, b; export { a, b as c, a as 'd e' };").unwrap();
        match export_decl(&program, 1) {
            ExportDecl::Named { specifiers, .. } => {
                let exported: Vec<_> = specifiers.iter().map(|s| s.exported.name()).collect();
                assert_eq!(exported, vec!["a", "c", "d e"]);
            }
            other => panic!("expected named export, got {other:?}"),
        }
        assert!(parse("export { x as default, 'y' as z } from 'm';").is_ok());
        assert_eq!(
            parse_err("export { 'x' };"),
            ErrorCode::InvalidExportLocal
        );
        assert!(matches!(
            parse_err("export { if } ;"),
            ErrorCode::ReservedWord(_)
        ));
        assert!(parse("export { if } from 'm';").is_ok());
    }

    #[test]
    fn test_export_star() {
        assert!(parse("export * from 'm'; export * from 'n';").is_ok());
        assert_eq!(
            parse_err("export * as a from 'm'; export * as a from 'n';"),
            ErrorCode::DuplicateExport("a".to_string())
        );
    }

    #[test]
    fn test_exported_locals_must_exist() {
        assert!(parse("export { a }; var a;").is_ok());
        assert!(parse("export { f }; function f() {}").is_ok());
        assert!(parse("{ var a; } export { a };").is_ok());
        assert_eq!(
            parse_err("export { missing };"),
            ErrorCode::UndeclaredExport("missing".to_string())
        );
        assert_eq!(
            parse_err("{ let a; } export { a };"),
            ErrorCode::UndeclaredExport("a".to_string())
        );
    }

    #[test]
    fn test_module_goal_rules() {
        assert!(matches!(parse_err("with (a) {}"), ErrorCode::StrictWith));
        assert_eq!(parse_err("var await;"), ErrorCode::AwaitIdentifier);
        assert!(parse("import.meta.url; await 1;").is_ok());
        assert_eq!(parse_err("a <!-- b"), ErrorCode::HtmlCommentInModule);
    }
}
