//! Grammar context flags.
//!
//! ECMAScript productions are parameterized (`[Yield]`, `[Await]`, `[In]`,
//! `[Return]`) and guarded by static semantics that depend on the enclosing
//! function, class and statement. The parser keeps one `Context` value and
//! adjusts it around each boundary with [`Parser::with_context`].
//!
//! [`Parser::with_context`]: crate::parser::Parser

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Context: u32 {
        /// Strict mode code.
        const STRICT = 1 << 0;
        /// Module goal.
        const MODULE = 1 << 1;
        /// `yield` is an operator (generator body).
        const YIELD = 1 << 2;
        /// `await` is an operator (async body or module top level).
        const AWAIT = 1 << 3;
        /// `return` is allowed.
        const RETURN = 1 << 4;
        const IN_ITERATION = 1 << 5;
        const IN_SWITCH = 1 << 6;
        /// `super.x` and `super[x]` are allowed.
        const SUPER_PROPERTY = 1 << 7;
        /// `super()` is allowed (derived class constructor).
        const SUPER_CALL = 1 << 8;
        /// `new.target` is allowed.
        const NEW_TARGET = 1 << 9;
        /// Parsing formal parameters.
        const IN_PARAMETERS = 1 << 10;
        /// `in` is not a binary operator (for-statement head).
        const DISALLOW_IN = 1 << 11;
        /// Class field initializer: `arguments` is forbidden.
        const CLASS_FIELD_INIT = 1 << 12;
        /// Class static block: `await` and `arguments` are forbidden.
        const STATIC_BLOCK = 1 << 13;
        /// Inside the body of a function (as opposed to script or module top level).
        const IN_FUNCTION_BODY = 1 << 14;
    }
}

impl Context {
    /// Flags that survive entering any function.
    pub(crate) const INHERITED_BY_FUNCTIONS: Context = Context::STRICT.union(Context::MODULE);

    /// Flags an arrow function inherits from its surroundings in addition to
    /// [`Context::INHERITED_BY_FUNCTIONS`].
    pub(crate) const INHERITED_BY_ARROWS: Context = Context::SUPER_PROPERTY
        .union(Context::SUPER_CALL)
        .union(Context::NEW_TARGET)
        .union(Context::CLASS_FIELD_INIT)
        .union(Context::STATIC_BLOCK);

    #[inline]
    pub fn is_strict(self) -> bool {
        self.contains(Self::STRICT)
    }

    #[inline]
    pub fn is_module(self) -> bool {
        self.contains(Self::MODULE)
    }

    #[inline]
    pub fn has_yield(self) -> bool {
        self.contains(Self::YIELD)
    }

    #[inline]
    pub fn has_await(self) -> bool {
        self.contains(Self::AWAIT)
    }

    #[inline]
    pub fn has_return(self) -> bool {
        self.contains(Self::RETURN)
    }

    #[inline]
    pub fn has_in(self) -> bool {
        !self.contains(Self::DISALLOW_IN)
    }

    #[inline]
    pub(crate) fn union_if(self, other: Self, include: bool) -> Self {
        if include {
            self.union(other)
        } else {
            self
        }
    }

    /// Context for the parameters and body of a non-arrow function.
    pub(crate) fn for_function(self, is_async: bool, is_generator: bool) -> Self {
        (self & Self::INHERITED_BY_FUNCTIONS)
            .union(Self::RETURN | Self::NEW_TARGET | Self::IN_FUNCTION_BODY)
            .union_if(Self::AWAIT, is_async)
            .union_if(Self::YIELD, is_generator)
    }

    /// Context for the body of an arrow function.
    pub(crate) fn for_arrow(self, is_async: bool) -> Self {
        (self & (Self::INHERITED_BY_FUNCTIONS | Self::INHERITED_BY_ARROWS))
            .union(Self::RETURN | Self::IN_FUNCTION_BODY)
            .union_if(Self::AWAIT, is_async)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_context_drops_loop_flags() {
        let outer = Context::STRICT | Context::IN_ITERATION | Context::YIELD | Context::DISALLOW_IN;
        let inner = outer.for_function(true, false);
        assert!(inner.is_strict());
        assert!(inner.has_await());
        assert!(!inner.has_yield());
        assert!(inner.has_in());
        assert!(!inner.contains(Context::IN_ITERATION));
        assert!(inner.contains(Context::NEW_TARGET));
    }

    #[test]
    fn test_arrow_inherits_super_and_new_target() {
        let outer = Context::SUPER_PROPERTY | Context::NEW_TARGET | Context::YIELD;
        let inner = outer.for_arrow(false);
        assert!(inner.contains(Context::SUPER_PROPERTY));
        assert!(inner.contains(Context::NEW_TARGET));
        assert!(!inner.has_yield());
        assert!(inner.has_return());
    }
}
