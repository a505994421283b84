//! AST node types for ECMAScript.
//!
//! The tree is a closed set of sum types: every statement is a [`Stmt`],
//! every expression an [`Expr`] and every assignment or binding target a
//! [`Pattern`]. Parenthesized expressions are kept as [`ExprKind::Paren`]
//! because the cover grammar needs to see them; the ESTree builder drops
//! them again. Literal raw text is not stored: it is the source text under
//! the node's span.

use crate::options::SourceType;
use crate::span::Span;

/// The root of a parsed script or module.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub source_type: SourceType,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// An identifier in a position where ESTree wants its own node (binding
/// names, labels, property keys, specifiers).
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// =============================================================================
// Expressions
// =============================================================================

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Strip any number of wrapping parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    pub fn is_paren(&self) -> bool {
        matches!(self.kind, ExprKind::Paren(_))
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // === Literals ===
    Null,
    Bool(bool),
    Number(f64),
    /// BigInt literal digits, without the `n` suffix or separators.
    BigInt(String),
    /// String literal (cooked value).
    String(String),
    Regex { pattern: String, flags: String },
    /// Template literal: `` `a${b}c` ``
    Template(Box<Template>),
    /// Tagged template: ``tag`a${b}` ``
    TaggedTemplate { tag: Box<Expr>, quasi: Box<Template> },

    // === Identifiers ===
    /// Identifier reference
    Ident(String),
    /// `#x`, only as the left operand of `in`
    PrivateName(String),
    This,
    /// `super`, only as the object of a member expression or a call callee
    Super,

    // === Compound Expressions ===
    /// Array literal. `None` is a hole, spread elements are [`ExprKind::Spread`].
    Array(Vec<Option<Expr>>),
    /// Object literal: `{a: 1, ...b}`
    Object(Vec<ObjectMember>),
    Function(Box<Function>),
    Arrow(Box<ArrowFunction>),
    Class(Box<Class>),

    // === Operations ===
    Unary { op: UnaryOp, arg: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    /// `&&`, `||` and `??`
    Logical { op: LogicalOp, left: Box<Expr>, right: Box<Expr> },
    Assign { op: AssignOp, target: Box<Pattern>, value: Box<Expr> },
    Update { op: UpdateOp, prefix: bool, arg: Box<Expr> },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Sequence(Vec<Expr>),

    // === Member Access and Calls ===
    Member {
        object: Box<Expr>,
        property: MemberProp,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },
    New { callee: Box<Expr>, args: Vec<Expr> },
    /// Marks the extent of an optional chain: `a?.b.c`
    Chain(Box<Expr>),
    Paren(Box<Expr>),

    // === Special ===
    /// `...x` in array literals and argument lists
    Spread(Box<Expr>),
    Yield { arg: Option<Box<Expr>>, delegate: bool },
    Await(Box<Expr>),
    /// `import(source)` or `import(source, options)`
    Import {
        source: Box<Expr>,
        options: Option<Box<Expr>>,
    },
    /// `new.target` or `import.meta`
    MetaProperty { meta: Ident, property: Ident },
}

/// The property part of a member expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    Ident(Ident),
    Private(Ident),
    Computed(Box<Expr>),
}

impl MemberProp {
    pub fn is_private(&self) -> bool {
        matches!(self, MemberProp::Private(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub quasis: Vec<TemplateElement>,
    pub exprs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateElement {
    /// `None` for an invalid escape in a tagged template.
    pub cooked: Option<String>,
    pub raw: String,
    pub tail: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    Property(Property),
    Spread { arg: Expr, span: Span },
}

/// An object literal property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    /// For a shorthand with initializer (`{a = 1}`, only valid once the
    /// object becomes a pattern) this is an `Assign` expression.
    pub value: Expr,
    pub kind: PropertyKind,
    pub method: bool,
    pub shorthand: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Ident(Ident),
    /// Class element names only.
    Private(Ident),
    /// String, numeric or BigInt literal.
    Literal(Box<Expr>),
    Computed(Box<Expr>),
}

impl PropertyKey {
    pub fn is_computed(&self) -> bool {
        matches!(self, PropertyKey::Computed(_))
    }

    /// The key's name when it is statically known: identifiers and string
    /// literals. Numeric keys are not needed by any early error.
    pub fn static_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Ident(id) => Some(&id.name),
            PropertyKey::Literal(expr) => match &expr.kind {
                ExprKind::String(s) => Some(s),
                _ => None,
            },
            PropertyKey::Private(_) | PropertyKey::Computed(_) => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            PropertyKey::Ident(id) | PropertyKey::Private(id) => id.span,
            PropertyKey::Literal(expr) | PropertyKey::Computed(expr) => expr.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Init => "init",
            PropertyKind::Get => "get",
            PropertyKind::Set => "set",
        }
    }
}

// =============================================================================
// Patterns
// =============================================================================

/// An assignment target or binding pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

impl Pattern {
    pub fn new(kind: PatternKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_ident(&self) -> bool {
        matches!(self.kind, PatternKind::Ident(_))
    }

    /// Collect every bound identifier, in source order.
    pub fn bound_names<'p>(&'p self, out: &mut Vec<(&'p str, Span)>) {
        match &self.kind {
            PatternKind::Ident(name) => out.push((name, self.span)),
            PatternKind::Member(_) => {}
            PatternKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    element.bound_names(out);
                }
            }
            PatternKind::Object(props) => {
                for prop in props {
                    match prop {
                        PatternProp::Property { value, .. } => value.bound_names(out),
                        PatternProp::Rest(rest) => rest.bound_names(out),
                    }
                }
            }
            PatternKind::Assign { left, .. } => left.bound_names(out),
            PatternKind::Rest(arg) => arg.bound_names(out),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    Ident(String),
    /// Member expression target; never appears in bindings.
    Member(Box<Expr>),
    /// `[a, , b = 1, ...c]`. A rest element is always last.
    Array(Vec<Option<Pattern>>),
    /// `{a, b: c, ...d}`
    Object(Vec<PatternProp>),
    /// `a = 1` as a default value
    Assign { left: Box<Pattern>, right: Box<Expr> },
    /// `...a`
    Rest(Box<Pattern>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternProp {
    Property {
        key: PropertyKey,
        value: Pattern,
        shorthand: bool,
        span: Span,
    },
    /// A [`PatternKind::Rest`] pattern.
    Rest(Pattern),
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression statement. `directive` holds the raw string contents for
    /// members of a directive prologue.
    Expr { expr: Expr, directive: Option<String> },

    // === Declarations ===
    Var(VarDecl),
    Function(Box<Function>),
    Class(Box<Class>),

    // === Control Flow ===
    Block(Vec<Stmt>),
    Empty,
    Debugger,
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        left: ForHead,
        right: Expr,
        body: Box<Stmt>,
    },
    ForOf {
        left: ForHead,
        right: Expr,
        body: Box<Stmt>,
        is_await: bool,
    },
    While { test: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, test: Expr },
    Break { label: Option<Ident> },
    Continue { label: Option<Ident> },
    Return { arg: Option<Expr> },
    Throw { arg: Expr },
    Try {
        block: Block,
        handler: Option<CatchClause>,
        finalizer: Option<Block>,
    },
    Labeled { label: Ident, body: Box<Stmt> },
    With { object: Expr, body: Box<Stmt> },

    // === Modules ===
    Import(Box<ImportDecl>),
    Export(Box<ExportDecl>),
}

/// A braced statement list that ESTree represents as its own node.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
    Using,
    AwaitUsing,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
            VarKind::Using => "using",
            VarKind::AwaitUsing => "await using",
        }
    }

    pub fn is_lexical(self) -> bool {
        !matches!(self, VarKind::Var)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub decls: Vec<VarDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub id: Pattern,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Var(VarDecl),
    Expr(Expr),
}

/// Left side of `for-in` and `for-of`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForHead {
    Var(VarDecl),
    Pattern(Pattern),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default`
    pub test: Option<Expr>,
    pub consequent: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Block,
    pub span: Span,
}

// =============================================================================
// Functions and Classes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<Ident>,
    pub params: Vec<Pattern>,
    pub body: Vec<Stmt>,
    pub body_span: Span,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub params: Vec<Pattern>,
    pub body: ArrowBody,
    pub is_async: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block { body: Vec<Stmt>, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: Option<Ident>,
    pub super_class: Option<Box<Expr>>,
    pub body: Vec<ClassMember>,
    pub body_span: Span,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub kind: ClassMemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMemberKind {
    Method {
        key: PropertyKey,
        value: Function,
        kind: MethodKind,
        is_static: bool,
        decorators: Vec<Decorator>,
    },
    Property {
        key: PropertyKey,
        value: Option<Expr>,
        is_static: bool,
        /// `accessor x = 1` (decorators proposal)
        accessor: bool,
        decorators: Vec<Decorator>,
    },
    StaticBlock(Vec<Stmt>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
    Constructor,
}

impl MethodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MethodKind::Method => "method",
            MethodKind::Get => "get",
            MethodKind::Set => "set",
            MethodKind::Constructor => "constructor",
        }
    }
}

// =============================================================================
// Modules
// =============================================================================

/// An identifier or string literal naming an import or export.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleExportName {
    Ident(Ident),
    /// A string literal expression.
    String(Expr),
}

impl ModuleExportName {
    pub fn name(&self) -> &str {
        match self {
            ModuleExportName::Ident(id) => &id.name,
            ModuleExportName::String(expr) => match &expr.kind {
                ExprKind::String(s) => s,
                _ => "",
            },
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ModuleExportName::Ident(id) => id.span,
            ModuleExportName::String(expr) => expr.span,
        }
    }
}

/// `type: "json"` in `with { type: "json" }`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportAttribute {
    pub key: ModuleExportName,
    /// A string literal expression.
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    /// A string literal expression.
    pub source: Expr,
    pub attributes: Vec<ImportAttribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    Default { local: Ident, span: Span },
    Namespace { local: Ident, span: Span },
    Named {
        imported: ModuleExportName,
        local: Ident,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    /// `export var x`, `export { a as b }`, `export { a } from "m"`
    Named {
        declaration: Option<Stmt>,
        specifiers: Vec<ExportSpecifier>,
        source: Option<Expr>,
        attributes: Vec<ImportAttribute>,
    },
    Default(ExportDefault),
    /// `export * from "m"`, `export * as ns from "m"`
    All {
        exported: Option<ModuleExportName>,
        source: Expr,
        attributes: Vec<ImportAttribute>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportDefault {
    Function(Box<Function>),
    Class(Box<Class>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: ModuleExportName,
    pub exported: ModuleExportName,
    pub span: Span,
}

// =============================================================================
// Operators
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,  // -
    Plus,   // +
    Not,    // !
    BitNot, // ~
    Typeof, // typeof
    Void,   // void
    Delete, // delete
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Mod, // %
    Pow, // **

    // Comparison
    Eq,          // ==
    NotEq,       // !=
    StrictEq,    // ===
    StrictNotEq, // !==
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=

    // Bitwise
    BitOr,  // |
    BitXor, // ^
    BitAnd, // &
    Shl,    // <<
    Shr,    // >>
    UShr,   // >>>

    // Other
    In,         // in
    Instanceof, // instanceof
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,             // &&
    Or,              // ||
    NullishCoalesce, // ??
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::NullishCoalesce => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,        // =
    AddAssign,     // +=
    SubAssign,     // -=
    MulAssign,     // *=
    DivAssign,     // /=
    ModAssign,     // %=
    PowAssign,     // **=
    ShlAssign,     // <<=
    ShrAssign,     // >>=
    UShrAssign,    // >>>=
    BitOrAssign,   // |=
    BitXorAssign,  // ^=
    BitAndAssign,  // &=
    AndAssign,     // &&=
    OrAssign,      // ||=
    NullishAssign, // ??=
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
            AssignOp::PowAssign => "**=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::UShrAssign => ">>>=",
            AssignOp::BitOrAssign => "|=",
            AssignOp::BitXorAssign => "^=",
            AssignOp::BitAndAssign => "&=",
            AssignOp::AndAssign => "&&=",
            AssignOp::OrAssign => "||=",
            AssignOp::NullishAssign => "??=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment, // ++
    Decrement, // --
}

impl UpdateOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: u32) -> Pattern {
        Pattern::new(
            PatternKind::Ident(name.into()),
            Span::new(start, start + name.len() as u32),
        )
    }

    #[test]
    fn test_bound_names_walks_nested_patterns() {
        // [a, {b: c, ...d}, e = 1]
        let object = Pattern::new(
            PatternKind::Object(vec![
                PatternProp::Property {
                    key: PropertyKey::Ident(Ident::new("b", Span::new(5, 6))),
                    value: ident("c", 8),
                    shorthand: false,
                    span: Span::new(5, 9),
                },
                PatternProp::Rest(Pattern::new(
                    PatternKind::Rest(Box::new(ident("d", 14))),
                    Span::new(11, 15),
                )),
            ]),
            Span::new(4, 16),
        );
        let defaulted = Pattern::new(
            PatternKind::Assign {
                left: Box::new(ident("e", 18)),
                right: Box::new(Expr::new(ExprKind::Number(1.0), Span::new(22, 23))),
            },
            Span::new(18, 23),
        );
        let pattern = Pattern::new(
            PatternKind::Array(vec![Some(ident("a", 1)), Some(object), Some(defaulted)]),
            Span::new(0, 24),
        );

        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        let names: Vec<&str> = names.into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "c", "d", "e"]);
    }

    #[test]
    fn test_unparenthesized() {
        let inner = Expr::new(ExprKind::Ident("x".into()), Span::new(2, 3));
        let wrapped = Expr::new(
            ExprKind::Paren(Box::new(Expr::new(
                ExprKind::Paren(Box::new(inner.clone())),
                Span::new(1, 4),
            ))),
            Span::new(0, 5),
        );
        assert_eq!(wrapped.unparenthesized(), &inner);
        assert!(wrapped.is_paren());
    }

    #[test]
    fn test_static_property_names() {
        let key = PropertyKey::Literal(Box::new(Expr::new(
            ExprKind::String("__proto__".into()),
            Span::new(0, 11),
        )));
        assert_eq!(key.static_name(), Some("__proto__"));
        let computed = PropertyKey::Computed(Box::new(Expr::new(
            ExprKind::Ident("x".into()),
            Span::new(1, 2),
        )));
        assert_eq!(computed.static_name(), None);
        assert!(computed.is_computed());
    }
}
