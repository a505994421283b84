//! Token types for ECMAScript.
//!
//! Reserved words get their own variants; the contextual keywords the
//! grammar branches on (`async`, `await`, `yield`, `let`, `static`, `get`,
//! `set`, `of`, `from`, `as`) do too, and every other identifier is carried
//! as `Identifier(name)`. An identifier written with a unicode escape is
//! always `Identifier`, even if it spells a keyword.

use bitflags::bitflags;

use crate::span::Span;

bitflags! {
    /// Facts about a token that the grammar needs but that are not part of
    /// its kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TokenFlags: u8 {
        /// A line terminator appeared between the previous token and this one.
        const NEWLINE_BEFORE = 1 << 0;
        /// The identifier contained a unicode escape sequence.
        const ESCAPED = 1 << 1;
        /// Legacy octal literal (`017`) or legacy octal escape (`"\01"`).
        const LEGACY_OCTAL = 1 << 2;
        /// `08`, `09` literals and `\8`, `\9` escapes.
        const NON_OCTAL_DECIMAL = 1 << 3;
        /// An Annex B HTML-like comment was skipped before this token.
        const HTML_COMMENT_BEFORE = 1 << 4;
        /// A string contained the `\0` escape. Legal in strict code, but not
        /// inside a directive that turns strict mode on retroactively.
        const ZERO_ESCAPE = 1 << 5;
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub flags: TokenFlags,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub const fn new(kind: TokenKind, span: Span, flags: TokenFlags) -> Self {
        Self { kind, span, flags }
    }

    #[inline]
    pub fn had_newline_before(&self) -> bool {
        self.flags.contains(TokenFlags::NEWLINE_BEFORE)
    }

    #[inline]
    pub fn is_escaped(&self) -> bool {
        self.flags.contains(TokenFlags::ESCAPED)
    }

    /// Legacy octal or non-octal-decimal content, illegal in strict code.
    #[inline]
    pub fn has_octal(&self) -> bool {
        self.flags
            .intersects(TokenFlags::LEGACY_OCTAL | TokenFlags::NON_OCTAL_DECIMAL)
    }
}

/// One piece of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateChunk {
    /// Cooked value; `None` when the chunk has an invalid escape, which is
    /// only legal in tagged templates.
    pub cooked: Option<String>,
    /// Raw source text between the delimiters, with CRLF normalized to LF.
    pub raw: String,
    /// Position of the first invalid escape, reported for untagged templates.
    pub invalid_escape: Option<Span>,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Literals ===
    /// Identifier: `foo`, `_bar`, `$baz`, `a`
    Identifier(String),
    /// Private name: `#foo`
    PrivateName(String),
    /// String literal (cooked value): `"hello"`, `'world'`
    String(String),
    /// Number literal: `42`, `3.14`, `0xff`
    Number(f64),
    /// BigInt literal digits without the `n` suffix: `42n`
    BigInt(String),
    /// Regular expression: `/pattern/flags`
    Regex { pattern: String, flags: String },
    /// `` `text` ``
    TemplateNoSub(TemplateChunk),
    /// `` `text${ ``
    TemplateHead(TemplateChunk),
    /// `` }text${ ``
    TemplateMiddle(TemplateChunk),
    /// `` }text` ``
    TemplateTail(TemplateChunk),

    // === Keywords ===
    // Declarations
    Var,
    Let,
    Const,
    Function,
    Class,

    // Control flow
    If,
    Else,
    Switch,
    Case,
    Default,
    For,
    While,
    Do,
    Break,
    Continue,
    Return,

    // Exception handling
    Try,
    Catch,
    Finally,
    Throw,

    // Operators as keywords
    New,
    Delete,
    Typeof,
    Void,
    In,
    Instanceof,

    // Values
    This,
    Super,
    Null,
    True,
    False,

    // Modules
    Import,
    Export,
    From,
    As,

    // Async
    Async,
    Await,

    // Generators
    Yield,

    // Class modifiers
    Static,
    Get,
    Set,
    Extends,

    // Other
    With,
    Debugger,
    Enum,
    Of,

    // === Punctuation ===
    // Brackets
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    // Delimiters
    Semicolon,  // ;
    Comma,      // ,
    Colon,      // :
    Dot,        // .
    Question,   // ?
    At,         // @ (decorators)

    // Arrows and spreads
    Arrow,      // =>
    Spread,     // ...

    // Optional chaining
    QuestionDot, // ?.

    // === Operators ===
    // Assignment
    Eq,         // =
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PercentEq,  // %=
    StarStarEq, // **=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=
    LtLtEq,     // <<=
    GtGtEq,     // >>=
    GtGtGtEq,   // >>>=
    AmpAmpEq,   // &&=
    PipePipeEq, // ||=
    QuestionQuestionEq, // ??=

    // Comparison
    EqEq,       // ==
    EqEqEq,     // ===
    BangEq,     // !=
    BangEqEq,   // !==
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=

    // Arithmetic
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    StarStar,   // **
    PlusPlus,   // ++
    MinusMinus, // --

    // Bitwise
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    LtLt,       // <<
    GtGt,       // >>
    GtGtGt,     // >>>

    // Logical
    AmpAmp,     // &&
    PipePipe,   // ||
    Bang,       // !
    QuestionQuestion, // ??

    // === Special ===
    /// End of file
    Eof,
}

impl TokenKind {
    /// Check if this token can start an expression.
    pub fn can_start_expr(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::PrivateName(_)
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::BigInt(_)
                | TokenKind::Regex { .. }
                | TokenKind::TemplateNoSub(_)
                | TokenKind::TemplateHead(_)
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::New
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Async
                | TokenKind::Await
                | TokenKind::Yield
                | TokenKind::Let
                | TokenKind::Static
                | TokenKind::Get
                | TokenKind::Set
                | TokenKind::Of
                | TokenKind::From
                | TokenKind::As
                | TokenKind::Typeof
                | TokenKind::Void
                | TokenKind::Delete
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::Slash
                | TokenKind::SlashEq
                | TokenKind::At
                | TokenKind::Import
        )
    }

    /// Check if this is a reserved word (never usable as an identifier).
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            TokenKind::Var
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::Throw
                | TokenKind::New
                | TokenKind::Delete
                | TokenKind::Typeof
                | TokenKind::Void
                | TokenKind::In
                | TokenKind::Instanceof
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Import
                | TokenKind::Export
                | TokenKind::Extends
                | TokenKind::With
                | TokenKind::Debugger
                | TokenKind::Enum
        )
    }

    /// Check if this is a contextual keyword that may serve as an identifier.
    pub fn is_contextual(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Static
                | TokenKind::Async
                | TokenKind::Await
                | TokenKind::Yield
                | TokenKind::Get
                | TokenKind::Set
                | TokenKind::Of
                | TokenKind::From
                | TokenKind::As
        )
    }

    /// Identifiers and contextual keywords: anything that might be an
    /// `IdentifierReference` or `BindingIdentifier` depending on context.
    #[inline]
    pub fn is_identifier_like(&self) -> bool {
        matches!(self, TokenKind::Identifier(_)) || self.is_contextual()
    }

    /// The `IdentifierName` spelled by this token, if any. Reserved words are
    /// identifier names, which is what property keys and member names need.
    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) => Some(name),
            _ => {
                let s = keyword_to_str(self);
                (!s.is_empty()).then_some(s)
            }
        }
    }

    /// Get the precedence of a binary operator (higher = binds tighter).
    /// Returns None if not a binary operator.
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            // `??` shares a level with `||`; mixing them is rejected by the parser
            TokenKind::QuestionQuestion | TokenKind::PipePipe => Some(1),
            TokenKind::AmpAmp => Some(3),
            TokenKind::Pipe => Some(4),
            TokenKind::Caret => Some(5),
            TokenKind::Amp => Some(6),
            TokenKind::EqEq | TokenKind::EqEqEq | TokenKind::BangEq | TokenKind::BangEqEq => Some(7),
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq
            | TokenKind::In | TokenKind::Instanceof => Some(8),
            TokenKind::LtLt | TokenKind::GtGt | TokenKind::GtGtGt => Some(9),
            TokenKind::Plus | TokenKind::Minus => Some(10),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(11),
            TokenKind::StarStar => Some(12), // Right associative
            _ => None,
        }
    }
}

/// Look up a keyword from an identifier string.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "var" => Some(TokenKind::Var),
        "let" => Some(TokenKind::Let),
        "const" => Some(TokenKind::Const),
        "function" => Some(TokenKind::Function),
        "class" => Some(TokenKind::Class),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "switch" => Some(TokenKind::Switch),
        "case" => Some(TokenKind::Case),
        "default" => Some(TokenKind::Default),
        "for" => Some(TokenKind::For),
        "while" => Some(TokenKind::While),
        "do" => Some(TokenKind::Do),
        "break" => Some(TokenKind::Break),
        "continue" => Some(TokenKind::Continue),
        "return" => Some(TokenKind::Return),
        "try" => Some(TokenKind::Try),
        "catch" => Some(TokenKind::Catch),
        "finally" => Some(TokenKind::Finally),
        "throw" => Some(TokenKind::Throw),
        "new" => Some(TokenKind::New),
        "delete" => Some(TokenKind::Delete),
        "typeof" => Some(TokenKind::Typeof),
        "void" => Some(TokenKind::Void),
        "in" => Some(TokenKind::In),
        "instanceof" => Some(TokenKind::Instanceof),
        "this" => Some(TokenKind::This),
        "super" => Some(TokenKind::Super),
        "null" => Some(TokenKind::Null),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "import" => Some(TokenKind::Import),
        "export" => Some(TokenKind::Export),
        "from" => Some(TokenKind::From),
        "as" => Some(TokenKind::As),
        "async" => Some(TokenKind::Async),
        "await" => Some(TokenKind::Await),
        "yield" => Some(TokenKind::Yield),
        "static" => Some(TokenKind::Static),
        "get" => Some(TokenKind::Get),
        "set" => Some(TokenKind::Set),
        "extends" => Some(TokenKind::Extends),
        "with" => Some(TokenKind::With),
        "debugger" => Some(TokenKind::Debugger),
        "enum" => Some(TokenKind::Enum),
        "of" => Some(TokenKind::Of),
        _ => None,
    }
}

/// Spelling of a keyword token, or `""` for non-keywords.
pub fn keyword_to_str(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Var => "var",
        TokenKind::Let => "let",
        TokenKind::Const => "const",
        TokenKind::Function => "function",
        TokenKind::Class => "class",
        TokenKind::If => "if",
        TokenKind::Else => "else",
        TokenKind::Switch => "switch",
        TokenKind::Case => "case",
        TokenKind::Default => "default",
        TokenKind::For => "for",
        TokenKind::While => "while",
        TokenKind::Do => "do",
        TokenKind::Break => "break",
        TokenKind::Continue => "continue",
        TokenKind::Return => "return",
        TokenKind::Try => "try",
        TokenKind::Catch => "catch",
        TokenKind::Finally => "finally",
        TokenKind::Throw => "throw",
        TokenKind::New => "new",
        TokenKind::Delete => "delete",
        TokenKind::Typeof => "typeof",
        TokenKind::Void => "void",
        TokenKind::In => "in",
        TokenKind::Instanceof => "instanceof",
        TokenKind::This => "this",
        TokenKind::Super => "super",
        TokenKind::Null => "null",
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::Import => "import",
        TokenKind::Export => "export",
        TokenKind::From => "from",
        TokenKind::As => "as",
        TokenKind::Async => "async",
        TokenKind::Await => "await",
        TokenKind::Yield => "yield",
        TokenKind::Static => "static",
        TokenKind::Get => "get",
        TokenKind::Set => "set",
        TokenKind::Extends => "extends",
        TokenKind::With => "with",
        TokenKind::Debugger => "debugger",
        TokenKind::Enum => "enum",
        TokenKind::Of => "of",
        _ => "",
    }
}

/// Words reserved only in strict mode code.
pub fn is_strict_reserved(name: &str) -> bool {
    matches!(
        name,
        "implements" | "interface" | "let" | "package" | "private" | "protected" | "public"
            | "static" | "yield"
    )
}

/// Words that are reserved in every context.
pub fn is_reserved_word(name: &str) -> bool {
    keyword_from_str(name).is_some_and(|kind| kind.is_reserved())
}

/// Human readable description of a token for diagnostics.
pub fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(name) => format!("identifier '{name}'"),
        TokenKind::PrivateName(name) => format!("'#{name}'"),
        TokenKind::String(_) => "string literal".to_string(),
        TokenKind::Number(_) | TokenKind::BigInt(_) => "numeric literal".to_string(),
        TokenKind::Regex { .. } => "regular expression".to_string(),
        TokenKind::TemplateNoSub(_)
        | TokenKind::TemplateHead(_)
        | TokenKind::TemplateMiddle(_)
        | TokenKind::TemplateTail(_) => "template literal".to_string(),
        TokenKind::Eof => "end of input".to_string(),
        other => {
            let word = keyword_to_str(other);
            if word.is_empty() {
                format!("'{}'", punctuator_to_str(other))
            } else {
                format!("'{word}'")
            }
        }
    }
}

fn punctuator_to_str(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::Semicolon => ";",
        TokenKind::Comma => ",",
        TokenKind::Colon => ":",
        TokenKind::Dot => ".",
        TokenKind::Question => "?",
        TokenKind::At => "@",
        TokenKind::Arrow => "=>",
        TokenKind::Spread => "...",
        TokenKind::QuestionDot => "?.",
        TokenKind::Eq => "=",
        TokenKind::PlusEq => "+=",
        TokenKind::MinusEq => "-=",
        TokenKind::StarEq => "*=",
        TokenKind::SlashEq => "/=",
        TokenKind::PercentEq => "%=",
        TokenKind::StarStarEq => "**=",
        TokenKind::AmpEq => "&=",
        TokenKind::PipeEq => "|=",
        TokenKind::CaretEq => "^=",
        TokenKind::LtLtEq => "<<=",
        TokenKind::GtGtEq => ">>=",
        TokenKind::GtGtGtEq => ">>>=",
        TokenKind::AmpAmpEq => "&&=",
        TokenKind::PipePipeEq => "||=",
        TokenKind::QuestionQuestionEq => "??=",
        TokenKind::EqEq => "==",
        TokenKind::EqEqEq => "===",
        TokenKind::BangEq => "!=",
        TokenKind::BangEqEq => "!==",
        TokenKind::Lt => "<",
        TokenKind::LtEq => "<=",
        TokenKind::Gt => ">",
        TokenKind::GtEq => ">=",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Percent => "%",
        TokenKind::StarStar => "**",
        TokenKind::PlusPlus => "++",
        TokenKind::MinusMinus => "--",
        TokenKind::Amp => "&",
        TokenKind::Pipe => "|",
        TokenKind::Caret => "^",
        TokenKind::Tilde => "~",
        TokenKind::LtLt => "<<",
        TokenKind::GtGt => ">>",
        TokenKind::GtGtGt => ">>>",
        TokenKind::AmpAmp => "&&",
        TokenKind::PipePipe => "||",
        TokenKind::Bang => "!",
        TokenKind::QuestionQuestion => "??",
        _ => "?",
    }
}
