//! Parse errors.
//!
//! Every failure is a [`ParseError`]: an [`ErrorCode`] naming what went wrong,
//! the byte span it refers to, and the line/column location computed once the
//! error escapes the parser. All errors are fatal.

use thiserror::Error;

use crate::span::{LineIndex, SourceLocation, Span};

/// The broad category of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed literal, escape, comment or character.
    Lexical,
    /// The grammar could not match the current token.
    UnexpectedToken,
    /// A construct that is only legal in sloppy mode.
    StrictMode,
    /// `super`, `new.target`, `await`, `yield`, labels or bindings used
    /// outside their legal context.
    EarlyReference,
    /// An invalid assignment or binding target found after cover grammar
    /// resolution.
    PatternValidation,
    /// The input nests deeper than the parser allows.
    Resource,
}

/// What went wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // === Lexical ===
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Unterminated template literal")]
    UnterminatedTemplate,
    #[error("Unterminated regular expression")]
    UnterminatedRegExp,
    #[error("Unterminated comment")]
    UnterminatedComment,
    #[error("Invalid escape sequence")]
    InvalidEscape,
    #[error("Invalid Unicode escape sequence")]
    InvalidUnicodeEscape,
    #[error("Invalid or unexpected character '{0}'")]
    InvalidCharacter(char),
    #[error("Invalid number")]
    InvalidNumber,
    #[error("Numeric separators are not allowed here")]
    InvalidNumericSeparator,
    #[error("Invalid BigInt literal")]
    InvalidBigInt,
    #[error("Identifier starts immediately after numeric literal")]
    IdentifierAfterNumber,
    #[error("HTML comments are not allowed in modules")]
    HtmlCommentInModule,
    #[error("Invalid regular expression: {0}")]
    InvalidRegExp(String),
    #[error("Invalid regular expression flags")]
    InvalidRegExpFlags,
    #[error("Invalid escape sequence in template")]
    InvalidTemplateEscape,

    // === Unexpected token ===
    #[error("Unexpected token {0}")]
    UnexpectedToken(String),
    #[error("Expected {expected} but found {found}")]
    Expected { expected: String, found: String },
    #[error("Missing semicolon")]
    MissingSemicolon,
    #[error("Unary operator used immediately before exponentiation expression; parentheses must be used")]
    UnexpectedUnaryExponent,
    #[error("Cannot mix '??' with '||' or '&&' without parentheses")]
    MixedCoalesce,
    #[error("Invalid tagged template on optional chain")]
    OptionalChainTemplate,
    #[error("Invalid optional chain from new expression")]
    OptionalChainNew,
    #[error("Keywords cannot contain escape characters")]
    EscapedKeyword,
    #[error("Unexpected reserved word '{0}'")]
    ReservedWord(String),
    #[error("Illegal newline after throw")]
    NewlineAfterThrow,
    #[error("No line break is allowed before '=>'")]
    NewlineBeforeArrow,
    #[error("Missing initializer in {0} declaration")]
    MissingInitializer(&'static str),
    #[error("Invalid left-hand side in for-{0} loop: must have a single binding")]
    ForInOfMultipleBindings(&'static str),
    #[error("for-{0} loop variable declaration may not have an initializer")]
    ForInOfInitializer(&'static str),
    #[error("The left-hand side of a for-of loop may not be '{0}'")]
    ForOfInvalidLeft(&'static str),
    #[error("for await is only valid with of")]
    ForAwaitWithoutOf,
    #[error("More than one default clause in switch statement")]
    MultipleDefaults,
    #[error("Missing catch or finally after try")]
    MissingCatchOrFinally,
    #[error("Cannot use import statement outside a module")]
    ImportOutsideModule,
    #[error("Unexpected token 'export' outside a module")]
    ExportOutsideModule,
    #[error("'import' and 'export' may only appear at the top level")]
    ImportExportNotTopLevel,
    #[error("Cannot use 'import.meta' outside a module")]
    ImportMetaOutsideModule,
    #[error("Illegal return statement")]
    IllegalReturn,
    #[error("'let' is disallowed as a lexically bound name")]
    LetInLexicalBinding,
    #[error("Lexical declaration cannot appear in a single-statement context")]
    LexicalInStatementPosition,
    #[error("Function declarations are not allowed in this position")]
    FunctionInStatementPosition,
    #[error("Class constructor may not be an accessor, generator or async method")]
    SpecialConstructor,
    #[error("A class may only have one constructor")]
    DuplicateConstructor,
    #[error("Classes may not have a static property named 'prototype'")]
    StaticPrototype,
    #[error("Classes may not have a field named 'constructor'")]
    ConstructorField,
    #[error("Classes may not have a private field named '#constructor'")]
    PrivateConstructor,
    #[error("Getter must not have any formal parameters")]
    GetterArity,
    #[error("Setter must have exactly one formal parameter")]
    SetterArity,
    #[error("Setter function argument must not be a rest parameter")]
    SetterRest,
    #[error("Invalid shorthand property initializer")]
    ShorthandInitializer,
    #[error("Duplicate __proto__ fields are not allowed in object literals")]
    DuplicateProto,
    #[error("Decorators are not valid here")]
    DecoratorPosition,
    #[error("'{0}' declarations may not be used here")]
    UsingPosition(&'static str),

    // === Strict mode ===
    #[error("Octal literals are not allowed in strict mode")]
    StrictOctalLiteral,
    #[error("Octal escape sequences are not allowed in strict mode")]
    StrictOctalEscape,
    #[error("Strict mode code may not include a with statement")]
    StrictWith,
    #[error("Delete of an unqualified identifier in strict mode")]
    StrictDelete,
    #[error("Unexpected eval or arguments in strict mode")]
    StrictEvalArguments,
    #[error("Unexpected strict mode reserved word '{0}'")]
    StrictReservedWord(String),
    #[error("In strict mode code, functions can only be declared at top level or inside a block")]
    StrictFunction,
    #[error("Duplicate parameter name not allowed in this context")]
    DuplicateParameter,
    #[error("HTML comments are not allowed in strict mode")]
    HtmlCommentInStrict,
    #[error("Illegal 'use strict' directive in function with non-simple parameter list")]
    IllegalUseStrict,

    // === Early reference ===
    #[error("'super' keyword unexpected here")]
    InvalidSuperProperty,
    #[error("'super' call is only valid in derived class constructors")]
    InvalidSuperCall,
    #[error("new.target expression is not allowed here")]
    InvalidNewTarget,
    #[error("Yield expression not allowed in formal parameter")]
    YieldInParameter,
    #[error("Await expression not allowed in formal parameter")]
    AwaitInParameter,
    #[error("Cannot use 'await' as an identifier here")]
    AwaitIdentifier,
    #[error("Cannot use 'yield' as an identifier here")]
    YieldIdentifier,
    #[error("Identifier '{0}' has already been declared")]
    Redeclaration(String),
    #[error("Illegal break statement")]
    IllegalBreak,
    #[error("Illegal continue statement: no surrounding iteration statement")]
    IllegalContinue,
    #[error("Undefined label '{0}'")]
    UndefinedLabel(String),
    #[error("Label '{0}' has already been declared")]
    DuplicateLabel(String),
    #[error("Duplicate export of '{0}'")]
    DuplicateExport(String),
    #[error("Export '{0}' is not defined in module")]
    UndeclaredExport(String),
    #[error("Private field '#{0}' has already been declared")]
    DuplicatePrivateName(String),
    #[error("Private field '#{0}' must be declared in an enclosing class")]
    UndeclaredPrivateName(String),
    #[error("'arguments' is not allowed in class field initializer or static initialization block")]
    ArgumentsInClassInit,
    #[error("Private fields can not be deleted")]
    DeletePrivateField,
    #[error("Duplicate import attribute '{0}'")]
    DuplicateImportAttribute(String),
    #[error("A string literal cannot be used as an exported binding without 'from'")]
    InvalidExportLocal,

    // === Pattern validation ===
    #[error("Invalid left-hand side in assignment")]
    InvalidAssignmentTarget,
    #[error("Invalid destructuring assignment target")]
    InvalidDestructuringTarget,
    #[error("Invalid left-hand side expression in {0} operation")]
    InvalidUpdateTarget(&'static str),
    #[error("Invalid left-hand side in for-loop")]
    InvalidForTarget,
    #[error("Rest element must be last element")]
    RestNotLast,
    #[error("Rest element may not have a trailing comma")]
    RestTrailingComma,
    #[error("Rest element may not have a default initializer")]
    RestInitializer,
    #[error("'...' must be followed by an assignable reference in assignment contexts")]
    InvalidRestTarget,
    #[error("Invalid parenthesized pattern")]
    ParenthesizedPattern,
    #[error("Invalid binding pattern")]
    InvalidBindingPattern,
    #[error("Invalid parameter list")]
    InvalidParameter,

    // === Resource ===
    #[error("Maximum nesting depth exceeded")]
    MaxRecursionDepth,
}

impl ErrorCode {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use ErrorCode::*;
        match self {
            UnterminatedString | UnterminatedTemplate | UnterminatedRegExp
            | UnterminatedComment | InvalidEscape | InvalidUnicodeEscape
            | InvalidCharacter(_) | InvalidNumber | InvalidNumericSeparator | InvalidBigInt
            | IdentifierAfterNumber | HtmlCommentInModule | InvalidRegExp(_)
            | InvalidRegExpFlags | InvalidTemplateEscape => ErrorKind::Lexical,

            StrictOctalLiteral | StrictOctalEscape | StrictWith | StrictDelete
            | StrictEvalArguments | StrictReservedWord(_) | StrictFunction
            | DuplicateParameter | HtmlCommentInStrict | IllegalUseStrict => ErrorKind::StrictMode,

            InvalidSuperProperty | InvalidSuperCall | InvalidNewTarget | YieldInParameter
            | AwaitInParameter | AwaitIdentifier | YieldIdentifier | Redeclaration(_)
            | IllegalBreak | IllegalContinue | UndefinedLabel(_) | DuplicateLabel(_)
            | DuplicateExport(_) | UndeclaredExport(_) | DuplicatePrivateName(_)
            | UndeclaredPrivateName(_) | ArgumentsInClassInit | DeletePrivateField
            | DuplicateImportAttribute(_) | InvalidExportLocal => {
                ErrorKind::EarlyReference
            }

            InvalidAssignmentTarget | InvalidDestructuringTarget | InvalidUpdateTarget(_)
            | InvalidForTarget | RestNotLast | RestTrailingComma | RestInitializer
            | InvalidRestTarget | ParenthesizedPattern | InvalidBindingPattern
            | InvalidParameter => ErrorKind::PatternValidation,

            MaxRecursionDepth => ErrorKind::Resource,

            _ => ErrorKind::UnexpectedToken,
        }
    }
}

/// A fatal parse error with its position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{}:{}]: {}", .loc.start.line, .loc.start.column, .code)]
pub struct ParseError {
    pub code: ErrorCode,
    pub span: Span,
    /// Line/column location. Filled in by [`ParseError::locate`] before the
    /// error leaves the crate.
    pub loc: SourceLocation,
}

impl ParseError {
    pub fn new(code: ErrorCode, span: Span) -> Self {
        Self {
            code,
            span,
            loc: SourceLocation::default(),
        }
    }

    /// Compute `loc` from the error's span.
    #[must_use]
    pub fn locate(mut self, index: &LineIndex<'_>) -> Self {
        self.loc = index.location(self.span);
        self
    }

    /// Always `"SyntaxError"`, the name of the exception a JavaScript engine
    /// would throw.
    pub fn name(&self) -> &'static str {
        "SyntaxError"
    }

    /// The message without the location prefix.
    pub fn description(&self) -> String {
        self.code.to_string()
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }
}

/// Result type used throughout the parser.
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location() {
        let source = "let x;\nlet x;";
        let index = LineIndex::new(source);
        let err = ParseError::new(ErrorCode::Redeclaration("x".into()), Span::new(11, 12))
            .locate(&index);
        assert_eq!(err.to_string(), "[2:4]: Identifier 'x' has already been declared");
        assert_eq!(err.name(), "SyntaxError");
        assert_eq!(err.description(), "Identifier 'x' has already been declared");
        assert_eq!(err.kind(), ErrorKind::EarlyReference);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ErrorCode::UnterminatedString.kind(), ErrorKind::Lexical);
        assert_eq!(ErrorCode::StrictWith.kind(), ErrorKind::StrictMode);
        assert_eq!(ErrorCode::RestNotLast.kind(), ErrorKind::PatternValidation);
        assert_eq!(ErrorCode::MaxRecursionDepth.kind(), ErrorKind::Resource);
        assert_eq!(
            ErrorCode::UnexpectedToken("')'".into()).kind(),
            ErrorKind::UnexpectedToken
        );
    }
}
