//! ESTree JSON output.
//!
//! Walks the typed AST and emits the node shapes of the ESTree
//! specification as [`serde_json::Value`]s. Position metadata is added per
//! [`ParserOptions`]: `ranges` adds `start`, `end` and `range`, `loc` adds
//! line/column locations and `raw` adds the source text of literals.

use serde_json::{json, Map, Value};

use crate::ast::*;
use crate::options::ParserOptions;
use crate::parser::{RED_ZONE, STACK_PER_RECURSION};
use crate::span::{LineIndex, Span};

/// Convert a parsed program to ESTree JSON.
pub fn to_estree(program: &Program, source: &str, options: &ParserOptions) -> Value {
    let builder = Builder {
        source,
        ranges: options.ranges,
        raw: options.raw,
        lines: options.loc.then(|| LineIndex::new(source)),
    };
    builder.program(program)
}

struct Builder<'a> {
    source: &'a str,
    ranges: bool,
    raw: bool,
    lines: Option<LineIndex<'a>>,
}

impl<'a> Builder<'a> {
    /// A node of type `kind` with the requested position fields followed by
    /// `fields`, which must be a JSON object.
    fn node(&self, kind: &str, span: Span, fields: Value) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(kind.to_string()));
        if self.ranges {
            map.insert("start".to_string(), json!(span.start));
            map.insert("end".to_string(), json!(span.end));
        }
        if let Some(lines) = &self.lines {
            let loc = lines.location(span);
            map.insert(
                "loc".to_string(),
                json!({
                    "start": { "line": loc.start.line, "column": loc.start.column },
                    "end": { "line": loc.end.line, "column": loc.end.column },
                }),
            );
        }
        if self.ranges {
            map.insert("range".to_string(), json!([span.start, span.end]));
        }
        if let Value::Object(fields) = fields {
            map.extend(fields);
        }
        Value::Object(map)
    }

    fn program(&self, program: &Program) -> Value {
        self.node(
            "Program",
            program.span,
            json!({
                "sourceType": program.source_type.as_str(),
                "body": self.stmts(&program.body),
            }),
        )
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn stmts(&self, stmts: &[Stmt]) -> Vec<Value> {
        stmts.iter().map(|stmt| self.stmt(stmt)).collect()
    }

    fn block(&self, body: &[Stmt], span: Span) -> Value {
        self.node("BlockStatement", span, json!({ "body": self.stmts(body) }))
    }

    fn stmt(&self, stmt: &Stmt) -> Value {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.stmt_node(stmt))
    }

    fn stmt_node(&self, stmt: &Stmt) -> Value {
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Expr { expr, directive } => {
                let mut fields = json!({ "expression": self.expr(expr) });
                if let Some(directive) = directive {
                    fields["directive"] = json!(directive);
                }
                self.node("ExpressionStatement", span, fields)
            }
            StmtKind::Var(decl) => self.var_decl(decl, span),
            StmtKind::Function(function) => self.function("FunctionDeclaration", function),
            StmtKind::Class(class) => self.class("ClassDeclaration", class),
            StmtKind::Block(body) => self.block(body, span),
            StmtKind::Empty => self.node("EmptyStatement", span, json!({})),
            StmtKind::Debugger => self.node("DebuggerStatement", span, json!({})),
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => self.node(
                "IfStatement",
                span,
                json!({
                    "test": self.expr(test),
                    "consequent": self.stmt(consequent),
                    "alternate": alternate.as_ref().map(|alt| self.stmt(alt)),
                }),
            ),
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                let cases: Vec<Value> = cases
                    .iter()
                    .map(|case| {
                        self.node(
                            "SwitchCase",
                            case.span,
                            json!({
                                "test": case.test.as_ref().map(|test| self.expr(test)),
                                "consequent": self.stmts(&case.consequent),
                            }),
                        )
                    })
                    .collect();
                self.node(
                    "SwitchStatement",
                    span,
                    json!({ "discriminant": self.expr(discriminant), "cases": cases }),
                )
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                let init = init.as_ref().map(|init| match init {
                    ForInit::Var(decl) => self.var_decl(decl, decl.span),
                    ForInit::Expr(expr) => self.expr(expr),
                });
                self.node(
                    "ForStatement",
                    span,
                    json!({
                        "init": init,
                        "test": test.as_ref().map(|test| self.expr(test)),
                        "update": update.as_ref().map(|update| self.expr(update)),
                        "body": self.stmt(body),
                    }),
                )
            }
            StmtKind::ForIn { left, right, body } => self.node(
                "ForInStatement",
                span,
                json!({
                    "left": self.for_head(left),
                    "right": self.expr(right),
                    "body": self.stmt(body),
                }),
            ),
            StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            } => self.node(
                "ForOfStatement",
                span,
                json!({
                    "await": is_await,
                    "left": self.for_head(left),
                    "right": self.expr(right),
                    "body": self.stmt(body),
                }),
            ),
            StmtKind::While { test, body } => self.node(
                "WhileStatement",
                span,
                json!({ "test": self.expr(test), "body": self.stmt(body) }),
            ),
            StmtKind::DoWhile { body, test } => self.node(
                "DoWhileStatement",
                span,
                json!({ "body": self.stmt(body), "test": self.expr(test) }),
            ),
            StmtKind::Break { label } => self.node(
                "BreakStatement",
                span,
                json!({ "label": label.as_ref().map(|label| self.ident(label)) }),
            ),
            StmtKind::Continue { label } => self.node(
                "ContinueStatement",
                span,
                json!({ "label": label.as_ref().map(|label| self.ident(label)) }),
            ),
            StmtKind::Return { arg } => self.node(
                "ReturnStatement",
                span,
                json!({ "argument": arg.as_ref().map(|arg| self.expr(arg)) }),
            ),
            StmtKind::Throw { arg } => {
                self.node("ThrowStatement", span, json!({ "argument": self.expr(arg) }))
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                let handler = handler.as_ref().map(|handler| {
                    self.node(
                        "CatchClause",
                        handler.span,
                        json!({
                            "param": handler.param.as_ref().map(|param| self.pattern(param)),
                            "body": self.block(&handler.body.body, handler.body.span),
                        }),
                    )
                });
                self.node(
                    "TryStatement",
                    span,
                    json!({
                        "block": self.block(&block.body, block.span),
                        "handler": handler,
                        "finalizer": finalizer.as_ref().map(|block| self.block(&block.body, block.span)),
                    }),
                )
            }
            StmtKind::Labeled { label, body } => self.node(
                "LabeledStatement",
                span,
                json!({ "label": self.ident(label), "body": self.stmt(body) }),
            ),
            StmtKind::With { object, body } => self.node(
                "WithStatement",
                span,
                json!({ "object": self.expr(object), "body": self.stmt(body) }),
            ),
            StmtKind::Import(decl) => self.import(decl, span),
            StmtKind::Export(decl) => self.export(decl, span),
        }
    }

    fn var_decl(&self, decl: &VarDecl, span: Span) -> Value {
        let declarations: Vec<Value> = decl
            .decls
            .iter()
            .map(|declarator| {
                self.node(
                    "VariableDeclarator",
                    declarator.span,
                    json!({
                        "id": self.pattern(&declarator.id),
                        "init": declarator.init.as_ref().map(|init| self.expr(init)),
                    }),
                )
            })
            .collect();
        self.node(
            "VariableDeclaration",
            span,
            json!({ "declarations": declarations, "kind": decl.kind.as_str() }),
        )
    }

    fn for_head(&self, head: &ForHead) -> Value {
        match head {
            ForHead::Var(decl) => self.var_decl(decl, decl.span),
            ForHead::Pattern(pattern) => self.pattern(pattern),
        }
    }

    // =========================================================================
    // Modules
    // =========================================================================

    fn import(&self, decl: &ImportDecl, span: Span) -> Value {
        let specifiers: Vec<Value> = decl
            .specifiers
            .iter()
            .map(|specifier| match specifier {
                ImportSpecifier::Default { local, span } => self.node(
                    "ImportDefaultSpecifier",
                    *span,
                    json!({ "local": self.ident(local) }),
                ),
                ImportSpecifier::Namespace { local, span } => self.node(
                    "ImportNamespaceSpecifier",
                    *span,
                    json!({ "local": self.ident(local) }),
                ),
                ImportSpecifier::Named {
                    imported,
                    local,
                    span,
                } => self.node(
                    "ImportSpecifier",
                    *span,
                    json!({
                        "imported": self.module_export_name(imported),
                        "local": self.ident(local),
                    }),
                ),
            })
            .collect();
        self.node(
            "ImportDeclaration",
            span,
            json!({
                "specifiers": specifiers,
                "source": self.expr(&decl.source),
                "attributes": self.attributes(&decl.attributes),
            }),
        )
    }

    fn export(&self, decl: &ExportDecl, span: Span) -> Value {
        match decl {
            ExportDecl::Named {
                declaration,
                specifiers,
                source,
                attributes,
            } => {
                let specifiers: Vec<Value> = specifiers
                    .iter()
                    .map(|specifier| {
                        self.node(
                            "ExportSpecifier",
                            specifier.span,
                            json!({
                                "local": self.module_export_name(&specifier.local),
                                "exported": self.module_export_name(&specifier.exported),
                            }),
                        )
                    })
                    .collect();
                self.node(
                    "ExportNamedDeclaration",
                    span,
                    json!({
                        "declaration": declaration.as_ref().map(|stmt| self.stmt(stmt)),
                        "specifiers": specifiers,
                        "source": source.as_ref().map(|source| self.expr(source)),
                        "attributes": self.attributes(attributes),
                    }),
                )
            }
            ExportDecl::Default(default) => {
                let declaration = match default {
                    ExportDefault::Function(function) => {
                        self.function("FunctionDeclaration", function)
                    }
                    ExportDefault::Class(class) => self.class("ClassDeclaration", class),
                    ExportDefault::Expr(expr) => self.expr(expr),
                };
                self.node(
                    "ExportDefaultDeclaration",
                    span,
                    json!({ "declaration": declaration }),
                )
            }
            ExportDecl::All {
                exported,
                source,
                attributes,
            } => self.node(
                "ExportAllDeclaration",
                span,
                json!({
                    "exported": exported.as_ref().map(|name| self.module_export_name(name)),
                    "source": self.expr(source),
                    "attributes": self.attributes(attributes),
                }),
            ),
        }
    }

    fn module_export_name(&self, name: &ModuleExportName) -> Value {
        match name {
            ModuleExportName::Ident(id) => self.ident(id),
            ModuleExportName::String(expr) => self.expr(expr),
        }
    }

    fn attributes(&self, attributes: &[ImportAttribute]) -> Vec<Value> {
        attributes
            .iter()
            .map(|attribute| {
                self.node(
                    "ImportAttribute",
                    attribute.span,
                    json!({
                        "key": self.module_export_name(&attribute.key),
                        "value": self.expr(&attribute.value),
                    }),
                )
            })
            .collect()
    }

    // =========================================================================
    // Functions and Classes
    // =========================================================================

    fn function(&self, kind: &str, function: &Function) -> Value {
        self.node(
            kind,
            function.span,
            json!({
                "id": function.id.as_ref().map(|id| self.ident(id)),
                "expression": false,
                "generator": function.is_generator,
                "async": function.is_async,
                "params": self.patterns(&function.params),
                "body": self.block(&function.body, function.body_span),
            }),
        )
    }

    fn arrow(&self, arrow: &ArrowFunction) -> Value {
        let (body, expression) = match &arrow.body {
            ArrowBody::Expr(expr) => (self.expr(expr), true),
            ArrowBody::Block { body, span } => (self.block(body, *span), false),
        };
        self.node(
            "ArrowFunctionExpression",
            arrow.span,
            json!({
                "id": null,
                "expression": expression,
                "generator": false,
                "async": arrow.is_async,
                "params": self.patterns(&arrow.params),
                "body": body,
            }),
        )
    }

    fn class(&self, kind: &str, class: &Class) -> Value {
        let members: Vec<Value> = class.body.iter().map(|member| self.class_member(member)).collect();
        let mut fields = json!({
            "id": class.id.as_ref().map(|id| self.ident(id)),
            "superClass": class.super_class.as_ref().map(|expr| self.expr(expr)),
            "body": self.node("ClassBody", class.body_span, json!({ "body": members })),
        });
        if !class.decorators.is_empty() {
            fields["decorators"] = json!(self.decorators(&class.decorators));
        }
        self.node(kind, class.span, fields)
    }

    fn class_member(&self, member: &ClassMember) -> Value {
        let span = member.span;
        match &member.kind {
            ClassMemberKind::Method {
                key,
                value,
                kind,
                is_static,
                decorators,
            } => {
                let mut fields = json!({
                    "key": self.property_key(key),
                    "computed": key.is_computed(),
                    "value": self.function("FunctionExpression", value),
                    "kind": kind.as_str(),
                    "static": is_static,
                });
                if !decorators.is_empty() {
                    fields["decorators"] = json!(self.decorators(decorators));
                }
                self.node("MethodDefinition", span, fields)
            }
            ClassMemberKind::Property {
                key,
                value,
                is_static,
                accessor,
                decorators,
            } => {
                let kind = if *accessor {
                    "AccessorProperty"
                } else {
                    "PropertyDefinition"
                };
                let mut fields = json!({
                    "key": self.property_key(key),
                    "computed": key.is_computed(),
                    "value": value.as_ref().map(|value| self.expr(value)),
                    "static": is_static,
                });
                if !decorators.is_empty() {
                    fields["decorators"] = json!(self.decorators(decorators));
                }
                self.node(kind, span, fields)
            }
            ClassMemberKind::StaticBlock(body) => {
                self.node("StaticBlock", span, json!({ "body": self.stmts(body) }))
            }
        }
    }

    fn decorators(&self, decorators: &[Decorator]) -> Vec<Value> {
        decorators
            .iter()
            .map(|decorator| {
                self.node(
                    "Decorator",
                    decorator.span,
                    json!({ "expression": self.expr(&decorator.expr) }),
                )
            })
            .collect()
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn exprs(&self, exprs: &[Expr]) -> Vec<Value> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    fn ident(&self, id: &Ident) -> Value {
        self.node("Identifier", id.span, json!({ "name": id.name }))
    }

    fn literal(&self, span: Span, value: Value, mut fields: Value) -> Value {
        fields["value"] = value;
        if self.raw {
            fields["raw"] = json!(span.source_text(self.source));
        }
        self.node("Literal", span, fields)
    }

    fn expr(&self, expr: &Expr) -> Value {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.expr_node(expr))
    }

    fn expr_node(&self, expr: &Expr) -> Value {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Null => self.literal(span, Value::Null, json!({})),
            ExprKind::Bool(value) => self.literal(span, json!(value), json!({})),
            ExprKind::Number(value) => self.literal(span, number(*value), json!({})),
            ExprKind::String(value) => self.literal(span, json!(value), json!({})),
            ExprKind::BigInt(digits) => {
                self.literal(span, Value::Null, json!({ "bigint": digits }))
            }
            ExprKind::Regex { pattern, flags } => self.literal(
                span,
                Value::Null,
                json!({ "regex": { "pattern": pattern, "flags": flags } }),
            ),
            ExprKind::Template(template) => self.template(template),
            ExprKind::TaggedTemplate { tag, quasi } => self.node(
                "TaggedTemplateExpression",
                span,
                json!({ "tag": self.expr(tag), "quasi": self.template(quasi) }),
            ),
            ExprKind::Ident(name) => self.node("Identifier", span, json!({ "name": name })),
            ExprKind::PrivateName(name) => {
                self.node("PrivateIdentifier", span, json!({ "name": name }))
            }
            ExprKind::This => self.node("ThisExpression", span, json!({})),
            ExprKind::Super => self.node("Super", span, json!({})),
            ExprKind::Array(elements) => {
                let elements: Vec<Value> = elements
                    .iter()
                    .map(|element| element.as_ref().map_or(Value::Null, |e| self.expr(e)))
                    .collect();
                self.node("ArrayExpression", span, json!({ "elements": elements }))
            }
            ExprKind::Object(members) => {
                let properties: Vec<Value> =
                    members.iter().map(|member| self.object_member(member)).collect();
                self.node("ObjectExpression", span, json!({ "properties": properties }))
            }
            ExprKind::Function(function) => self.function("FunctionExpression", function),
            ExprKind::Arrow(arrow) => self.arrow(arrow),
            ExprKind::Class(class) => self.class("ClassExpression", class),
            ExprKind::Unary { op, arg } => self.node(
                "UnaryExpression",
                span,
                json!({ "operator": op.as_str(), "prefix": true, "argument": self.expr(arg) }),
            ),
            ExprKind::Binary { op, left, right } => self.node(
                "BinaryExpression",
                span,
                json!({
                    "left": self.expr(left),
                    "operator": op.as_str(),
                    "right": self.expr(right),
                }),
            ),
            ExprKind::Logical { op, left, right } => self.node(
                "LogicalExpression",
                span,
                json!({
                    "left": self.expr(left),
                    "operator": op.as_str(),
                    "right": self.expr(right),
                }),
            ),
            ExprKind::Assign { op, target, value } => self.node(
                "AssignmentExpression",
                span,
                json!({
                    "operator": op.as_str(),
                    "left": self.pattern(target),
                    "right": self.expr(value),
                }),
            ),
            ExprKind::Update { op, prefix, arg } => self.node(
                "UpdateExpression",
                span,
                json!({ "operator": op.as_str(), "prefix": prefix, "argument": self.expr(arg) }),
            ),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => self.node(
                "ConditionalExpression",
                span,
                json!({
                    "test": self.expr(test),
                    "consequent": self.expr(consequent),
                    "alternate": self.expr(alternate),
                }),
            ),
            ExprKind::Sequence(exprs) => self.node(
                "SequenceExpression",
                span,
                json!({ "expressions": self.exprs(exprs) }),
            ),
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let (property, computed) = match property {
                    MemberProp::Ident(id) => (self.ident(id), false),
                    MemberProp::Private(id) => (
                        self.node("PrivateIdentifier", id.span, json!({ "name": id.name })),
                        false,
                    ),
                    MemberProp::Computed(expr) => (self.expr(expr), true),
                };
                self.node(
                    "MemberExpression",
                    span,
                    json!({
                        "object": self.expr(object),
                        "property": property,
                        "computed": computed,
                        "optional": optional,
                    }),
                )
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => self.node(
                "CallExpression",
                span,
                json!({
                    "callee": self.expr(callee),
                    "arguments": self.exprs(args),
                    "optional": optional,
                }),
            ),
            ExprKind::New { callee, args } => self.node(
                "NewExpression",
                span,
                json!({ "callee": self.expr(callee), "arguments": self.exprs(args) }),
            ),
            ExprKind::Chain(inner) => {
                self.node("ChainExpression", span, json!({ "expression": self.expr(inner) }))
            }
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Spread(arg) => {
                self.node("SpreadElement", span, json!({ "argument": self.expr(arg) }))
            }
            ExprKind::Yield { arg, delegate } => self.node(
                "YieldExpression",
                span,
                json!({
                    "delegate": delegate,
                    "argument": arg.as_ref().map(|arg| self.expr(arg)),
                }),
            ),
            ExprKind::Await(arg) => {
                self.node("AwaitExpression", span, json!({ "argument": self.expr(arg) }))
            }
            ExprKind::Import { source, options } => self.node(
                "ImportExpression",
                span,
                json!({
                    "source": self.expr(source),
                    "options": options.as_ref().map(|options| self.expr(options)),
                }),
            ),
            ExprKind::MetaProperty { meta, property } => self.node(
                "MetaProperty",
                span,
                json!({ "meta": self.ident(meta), "property": self.ident(property) }),
            ),
        }
    }

    fn template(&self, template: &Template) -> Value {
        let quasis: Vec<Value> = template
            .quasis
            .iter()
            .map(|quasi| {
                self.node(
                    "TemplateElement",
                    quasi.span,
                    json!({
                        "value": { "raw": quasi.raw, "cooked": quasi.cooked },
                        "tail": quasi.tail,
                    }),
                )
            })
            .collect();
        self.node(
            "TemplateLiteral",
            template.span,
            json!({ "quasis": quasis, "expressions": self.exprs(&template.exprs) }),
        )
    }

    fn object_member(&self, member: &ObjectMember) -> Value {
        match member {
            ObjectMember::Property(property) => self.node(
                "Property",
                property.span,
                json!({
                    "key": self.property_key(&property.key),
                    "value": self.expr(&property.value),
                    "kind": property.kind.as_str(),
                    "method": property.method,
                    "shorthand": property.shorthand,
                    "computed": property.key.is_computed(),
                }),
            ),
            ObjectMember::Spread { arg, span } => {
                self.node("SpreadElement", *span, json!({ "argument": self.expr(arg) }))
            }
        }
    }

    fn property_key(&self, key: &PropertyKey) -> Value {
        match key {
            PropertyKey::Ident(id) => self.ident(id),
            PropertyKey::Private(id) => {
                self.node("PrivateIdentifier", id.span, json!({ "name": id.name }))
            }
            PropertyKey::Literal(expr) | PropertyKey::Computed(expr) => self.expr(expr),
        }
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    fn patterns(&self, patterns: &[Pattern]) -> Vec<Value> {
        patterns.iter().map(|pattern| self.pattern(pattern)).collect()
    }

    fn pattern(&self, pattern: &Pattern) -> Value {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.pattern_node(pattern))
    }

    fn pattern_node(&self, pattern: &Pattern) -> Value {
        let span = pattern.span;
        match &pattern.kind {
            PatternKind::Ident(name) => self.node("Identifier", span, json!({ "name": name })),
            PatternKind::Member(expr) => self.expr(expr),
            PatternKind::Array(elements) => {
                let elements: Vec<Value> = elements
                    .iter()
                    .map(|element| element.as_ref().map_or(Value::Null, |p| self.pattern(p)))
                    .collect();
                self.node("ArrayPattern", span, json!({ "elements": elements }))
            }
            PatternKind::Object(props) => {
                let properties: Vec<Value> = props
                    .iter()
                    .map(|prop| match prop {
                        PatternProp::Property {
                            key,
                            value,
                            shorthand,
                            span,
                        } => self.node(
                            "Property",
                            *span,
                            json!({
                                "key": self.property_key(key),
                                "value": self.pattern(value),
                                "kind": "init",
                                "method": false,
                                "shorthand": shorthand,
                                "computed": key.is_computed(),
                            }),
                        ),
                        PatternProp::Rest(rest) => self.pattern(rest),
                    })
                    .collect();
                self.node("ObjectPattern", span, json!({ "properties": properties }))
            }
            PatternKind::Assign { left, right } => self.node(
                "AssignmentPattern",
                span,
                json!({ "left": self.pattern(left), "right": self.expr(right) }),
            ),
            PatternKind::Rest(arg) => {
                self.node("RestElement", span, json!({ "argument": self.pattern(arg) }))
            }
        }
    }
}

/// Integral values print without a fraction; non-finite values have no JSON
/// form and become `null`.
fn number(value: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE {
        json!(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}
