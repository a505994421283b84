//! Parser configuration.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Default limit on expression/statement nesting.
pub const DEFAULT_MAX_DEPTH: usize = 1500;

/// The goal symbol a source is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
    Module,
    /// A script whose top level is a function body: `return` is allowed.
    Commonjs,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Script => "script",
            SourceType::Module => "module",
            SourceType::Commonjs => "commonjs",
        }
    }
}

bitflags! {
    /// Staged grammar extensions. `next` turns all of them on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Extensions: u8 {
        /// `@decorator` on classes and class elements, `accessor` fields.
        const DECORATORS = 1 << 0;
        /// `using` and `await using` declarations.
        const USING = 1 << 1;
    }
}

/// Parser options. Formatting options (`ranges`, `loc`, `raw`) only affect
/// the ESTree output, never acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserOptions {
    /// Parse with the module goal.
    pub module: bool,
    /// Enable every staged extension.
    pub next: bool,
    /// Enable Annex B relaxations in sloppy mode.
    pub webcompat: bool,
    /// Keep block-scoped redeclaration checks even where Annex B would
    /// tolerate duplicates.
    pub lexical: bool,
    /// Emit `start`, `end` and `range` on every node.
    pub ranges: bool,
    /// Emit `loc` on every node.
    pub loc: bool,
    /// Emit `raw` on literals.
    pub raw: bool,
    /// Start the parse in strict mode.
    pub implied_strict: bool,
    pub source_type: SourceType,
    /// Validate regular expression literal bodies.
    pub validate_regex: bool,
    /// Allow `return` at the top level.
    pub global_return: bool,
    /// Maximum nesting depth before failing with `MaxRecursionDepth`.
    pub max_depth: usize,
    /// Individually enabled staged extensions.
    pub extensions: Extensions,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            module: false,
            next: false,
            webcompat: false,
            lexical: false,
            ranges: false,
            loc: false,
            raw: false,
            implied_strict: false,
            source_type: SourceType::Script,
            validate_regex: true,
            global_return: false,
            max_depth: DEFAULT_MAX_DEPTH,
            extensions: Extensions::empty(),
        }
    }
}

impl ParserOptions {
    /// Options for the module goal.
    pub fn module() -> Self {
        Self {
            module: true,
            source_type: SourceType::Module,
            ..Self::default()
        }
    }

    pub fn is_module(&self) -> bool {
        self.module || self.source_type == SourceType::Module
    }

    /// The source type reported on `Program`.
    pub fn effective_source_type(&self) -> SourceType {
        if self.is_module() {
            SourceType::Module
        } else {
            self.source_type
        }
    }

    pub fn allows_global_return(&self) -> bool {
        self.global_return || self.source_type == SourceType::Commonjs
    }

    /// Extensions in effect after applying `next`.
    pub fn enabled_extensions(&self) -> Extensions {
        if self.next {
            Extensions::all()
        } else {
            self.extensions
        }
    }

    pub fn has_extension(&self, ext: Extensions) -> bool {
        self.enabled_extensions().contains(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ParserOptions::default();
        assert!(opts.validate_regex);
        assert_eq!(opts.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!opts.is_module());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let opts: ParserOptions = serde_json::from_str(
            r#"{"sourceType":"commonjs","impliedStrict":true,"validateRegex":false}"#,
        )
        .unwrap();
        assert_eq!(opts.source_type, SourceType::Commonjs);
        assert!(opts.implied_strict);
        assert!(!opts.validate_regex);
        assert!(opts.allows_global_return());
        assert!(!opts.webcompat);
    }

    #[test]
    fn test_next_enables_everything() {
        let opts = ParserOptions {
            next: true,
            ..ParserOptions::default()
        };
        assert!(opts.has_extension(Extensions::DECORATORS));
        assert!(opts.has_extension(Extensions::USING));
        assert!(!ParserOptions::default().has_extension(Extensions::USING));
    }
}
