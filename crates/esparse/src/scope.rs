//! Binding records for redeclaration checks.
//!
//! The parser keeps a stack of [`Scope`]s while it descends. Each scope
//! records the names declared in it, split by how they were declared, which
//! is all the early errors need: there is no reference resolution here.
//! Labels, private names and module exports have their own small records.

use bitflags::bitflags;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::error::ErrorCode;
use crate::span::Span;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ScopeFlags: u8 {
        /// Script or module top level.
        const TOP = 1 << 0;
        /// Function body (arrows included).
        const FUNCTION = 1 << 1;
        const ARROW = 1 << 2;
        /// `catch (e)` with a plain identifier parameter.
        const SIMPLE_CATCH = 1 << 3;
        const CLASS_STATIC_BLOCK = 1 << 4;

        /// Scopes that `var` declarations hoist to.
        const VAR = Self::TOP.bits() | Self::FUNCTION.bits() | Self::CLASS_STATIC_BLOCK.bits();
    }
}

/// How a name is being declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `var`, parameters
    Var,
    /// `let`, `const`, `class`, `using`, imports, strict or generator/async
    /// block functions
    Lexical,
    /// Plain function declarations
    Function,
    /// The parameter of `catch (e)`
    SimpleCatch,
}

/// Names declared in one scope.
#[derive(Debug, Default)]
pub struct Scope {
    pub flags: ScopeFlags,
    var: HashSet<String>,
    lexical: HashSet<String>,
    functions: HashSet<String>,
    /// The simple catch parameter, which `var` may redeclare.
    catch_param: Option<String>,
}

impl Scope {
    fn new(flags: ScopeFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    fn declares(&self, name: &str) -> bool {
        self.var.contains(name) || self.lexical.contains(name) || self.functions.contains(name)
    }
}

/// The chain of scopes from the program down to the current position.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    module: bool,
    /// Annex B: sloppy block-level function declarations may be repeated.
    duplicate_block_functions: bool,
}

impl ScopeStack {
    pub fn new(module: bool, duplicate_block_functions: bool) -> Self {
        Self {
            scopes: vec![Scope::new(ScopeFlags::TOP)],
            module,
            duplicate_block_functions,
        }
    }

    pub fn enter(&mut self, flags: ScopeFlags) {
        self.scopes.push(Scope::new(flags));
    }

    pub fn exit(&mut self) {
        // The program scope is never popped.
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn current(&self) -> &Scope {
        // `new` always pushes the program scope and `exit` keeps it.
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn is_top_level(&self) -> bool {
        self.current().flags.contains(ScopeFlags::TOP)
    }

    /// Function declarations behave like `var` at function level and at
    /// script top level; in modules and blocks they are lexical.
    fn treat_functions_as_var_in(&self, scope: &Scope) -> bool {
        scope.flags.contains(ScopeFlags::FUNCTION)
            || (!self.module && scope.flags.contains(ScopeFlags::TOP))
    }

    pub fn treat_functions_as_var(&self) -> bool {
        self.treat_functions_as_var_in(self.current())
    }

    /// Declare a name, failing on a conflicting earlier declaration. Returns
    /// whether the name landed in the top-level scope.
    pub fn declare(&mut self, name: &str, kind: BindingKind) -> Result<bool, ErrorCode> {
        let redeclared = match kind {
            BindingKind::Lexical => {
                let scope = self.current();
                let redeclared = scope.declares(name);
                self.current_mut().lexical.insert(name.to_string());
                redeclared
            }
            BindingKind::SimpleCatch => {
                let scope = self.current_mut();
                scope.lexical.insert(name.to_string());
                scope.catch_param = Some(name.to_string());
                false
            }
            BindingKind::Function => {
                let scope = self.current();
                let redeclared = if self.treat_functions_as_var_in(scope) {
                    scope.lexical.contains(name)
                } else {
                    scope.lexical.contains(name)
                        || scope.var.contains(name)
                        || (!self.duplicate_block_functions && scope.functions.contains(name))
                };
                self.current_mut().functions.insert(name.to_string());
                redeclared
            }
            BindingKind::Var => {
                let mut redeclared = false;
                let mut top = false;
                for i in (0..self.scopes.len()).rev() {
                    let scope = &self.scopes[i];
                    let catch_param = scope.flags.contains(ScopeFlags::SIMPLE_CATCH)
                        && scope.catch_param.as_deref() == Some(name);
                    if (scope.lexical.contains(name) && !catch_param)
                        || (!self.treat_functions_as_var_in(scope)
                            && scope.functions.contains(name))
                    {
                        redeclared = true;
                        break;
                    }
                    let scope = &mut self.scopes[i];
                    scope.var.insert(name.to_string());
                    if scope.flags.intersects(ScopeFlags::VAR) {
                        top = scope.flags.contains(ScopeFlags::TOP);
                        break;
                    }
                }
                if redeclared {
                    return Err(ErrorCode::Redeclaration(name.to_string()));
                }
                return Ok(top);
            }
        };
        if redeclared {
            return Err(ErrorCode::Redeclaration(name.to_string()));
        }
        Ok(self.is_top_level())
    }

    /// Whether the program scope already declares `name`.
    pub fn declared_at_top_level(&self, name: &str) -> bool {
        self.scopes[0].declares(name)
    }
}

// =============================================================================
// Labels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Loop,
    Other,
}

/// A label in scope for `break` and `continue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub kind: LabelKind,
    /// Start of the labelled statement. Consecutive labels (`a: b: for`)
    /// share it, so they all become loop labels.
    pub statement_start: u32,
}

// =============================================================================
// Private names
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivateNameKind {
    Field,
    Method,
    Getter,
    Setter,
    /// A getter and a setter with the same staticness.
    Accessor,
}

#[derive(Debug, Default)]
struct PrivateNameScope {
    declared: HashMap<String, (PrivateNameKind, bool)>,
    used: Vec<(String, Span)>,
}

/// Private names declared by the enclosing class bodies.
#[derive(Debug, Default)]
pub struct PrivateNameStack {
    scopes: Vec<PrivateNameScope>,
}

impl PrivateNameStack {
    pub fn enter(&mut self) {
        self.scopes.push(PrivateNameScope::default());
    }

    /// Leave a class body. References it cannot resolve move to the
    /// enclosing class; at the outermost class they are errors.
    pub fn exit(&mut self) -> Result<(), (ErrorCode, Span)> {
        let Some(scope) = self.scopes.pop() else {
            return Ok(());
        };
        for (name, span) in scope.used {
            if scope.declared.contains_key(&name) {
                continue;
            }
            match self.scopes.last_mut() {
                Some(parent) => parent.used.push((name, span)),
                None => return Err((ErrorCode::UndeclaredPrivateName(name), span)),
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn declare(
        &mut self,
        name: &str,
        kind: PrivateNameKind,
        is_static: bool,
    ) -> Result<(), ErrorCode> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(ErrorCode::UndeclaredPrivateName(name.to_string()));
        };
        match scope.declared.get_mut(name) {
            None => {
                scope.declared.insert(name.to_string(), (kind, is_static));
                Ok(())
            }
            Some((existing, existing_static)) => {
                let pairs = matches!(
                    (*existing, kind),
                    (PrivateNameKind::Getter, PrivateNameKind::Setter)
                        | (PrivateNameKind::Setter, PrivateNameKind::Getter)
                );
                if pairs && *existing_static == is_static {
                    *existing = PrivateNameKind::Accessor;
                    Ok(())
                } else {
                    Err(ErrorCode::DuplicatePrivateName(name.to_string()))
                }
            }
        }
    }

    /// Record a reference to `#name`; resolved when the class body ends.
    pub fn reference(&mut self, name: &str, span: Span) -> Result<(), ErrorCode> {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.used.push((name.to_string(), span));
                Ok(())
            }
            None => Err(ErrorCode::UndeclaredPrivateName(name.to_string())),
        }
    }
}

// =============================================================================
// Module exports
// =============================================================================

/// Exported names and local names exported before their declaration.
#[derive(Debug, Default)]
pub struct ModuleRecord {
    exported: HashSet<String>,
    unresolved: Vec<(String, Span)>,
}

impl ModuleRecord {
    pub fn add_export(&mut self, name: &str) -> Result<(), ErrorCode> {
        if self.exported.insert(name.to_string()) {
            Ok(())
        } else {
            Err(ErrorCode::DuplicateExport(name.to_string()))
        }
    }

    /// `export { name }` before `name` has been declared.
    pub fn expect_local(&mut self, name: &str, span: Span) {
        self.unresolved.push((name.to_string(), span));
    }

    /// A top-level declaration of `name` was seen.
    pub fn resolve(&mut self, name: &str) {
        if !self.unresolved.is_empty() {
            self.unresolved.retain(|(pending, _)| pending != name);
        }
    }

    pub fn first_unresolved(&self) -> Option<&(String, Span)> {
        self.unresolved.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redeclared(result: Result<bool, ErrorCode>) -> bool {
        matches!(result, Err(ErrorCode::Redeclaration(_)))
    }

    #[test]
    fn test_lexical_conflicts() {
        let mut scopes = ScopeStack::new(false, false);
        assert!(scopes.declare("x", BindingKind::Lexical).is_ok());
        assert!(redeclared(scopes.declare("x", BindingKind::Lexical)));
        assert!(redeclared(scopes.declare("x", BindingKind::Var)));

        scopes.enter(ScopeFlags::empty());
        assert!(scopes.declare("x", BindingKind::Lexical).is_ok());
    }

    #[test]
    fn test_var_hoists_through_blocks() {
        let mut scopes = ScopeStack::new(false, false);
        scopes.enter(ScopeFlags::empty());
        assert_eq!(scopes.declare("v", BindingKind::Var), Ok(true));
        scopes.exit();
        assert!(redeclared(scopes.declare("v", BindingKind::Lexical)));
    }

    #[test]
    fn test_var_stops_at_function() {
        let mut scopes = ScopeStack::new(false, false);
        scopes.enter(ScopeFlags::FUNCTION);
        assert_eq!(scopes.declare("v", BindingKind::Var), Ok(false));
        scopes.exit();
        assert!(scopes.declare("v", BindingKind::Lexical).is_ok());
    }

    #[test]
    fn test_simple_catch_parameter() {
        let mut scopes = ScopeStack::new(false, false);
        scopes.enter(ScopeFlags::SIMPLE_CATCH);
        scopes.declare("e", BindingKind::SimpleCatch).unwrap();
        assert!(scopes.declare("e", BindingKind::Var).is_ok());
        assert!(redeclared(scopes.declare("e", BindingKind::Lexical)));
    }

    #[test]
    fn test_block_functions() {
        let mut scopes = ScopeStack::new(false, false);
        scopes.enter(ScopeFlags::empty());
        scopes.declare("f", BindingKind::Function).unwrap();
        assert!(redeclared(scopes.declare("f", BindingKind::Function)));

        let mut annex_b = ScopeStack::new(false, true);
        annex_b.enter(ScopeFlags::empty());
        annex_b.declare("f", BindingKind::Function).unwrap();
        assert!(annex_b.declare("f", BindingKind::Function).is_ok());
    }

    #[test]
    fn test_module_top_level_functions_are_lexical() {
        let mut script = ScopeStack::new(false, false);
        script.declare("f", BindingKind::Var).unwrap();
        assert!(script.declare("f", BindingKind::Function).is_ok());

        let mut module = ScopeStack::new(true, false);
        module.declare("f", BindingKind::Var).unwrap();
        assert!(redeclared(module.declare("f", BindingKind::Function)));
    }

    #[test]
    fn test_private_names() {
        let mut names = PrivateNameStack::default();
        names.enter();
        names.declare("a", PrivateNameKind::Getter, false).unwrap();
        assert!(names.declare("a", PrivateNameKind::Setter, false).is_ok());
        assert_eq!(
            names.declare("a", PrivateNameKind::Field, false),
            Err(ErrorCode::DuplicatePrivateName("a".into()))
        );
        names.declare("b", PrivateNameKind::Getter, true).unwrap();
        assert!(names.declare("b", PrivateNameKind::Setter, false).is_err());

        names.enter();
        names.reference("a", Span::new(0, 2)).unwrap();
        names.reference("missing", Span::new(3, 11)).unwrap();
        assert!(names.exit().is_ok());
        assert_eq!(
            names.exit(),
            Err((ErrorCode::UndeclaredPrivateName("missing".into()), Span::new(3, 11)))
        );
    }

    #[test]
    fn test_module_record() {
        let mut record = ModuleRecord::default();
        record.add_export("a").unwrap();
        assert_eq!(record.add_export("a"), Err(ErrorCode::DuplicateExport("a".into())));

        record.expect_local("x", Span::new(9, 10));
        record.expect_local("y", Span::new(12, 13));
        record.resolve("x");
        assert_eq!(record.first_unresolved(), Some(&("y".to_string(), Span::new(12, 13))));
    }
}
