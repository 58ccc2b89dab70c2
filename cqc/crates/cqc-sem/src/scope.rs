//! The symbol table (spec.md §4.3): a stack of per-scope maps keyed by
//! identifier, with scope 0 the translation unit's global scope.
//!
//! Grounded on `examples/original_source/src/analyze.c`'s
//! `push_map`/`pop_map`/`symbol_maps` linked-list-of-maps, re-expressed as
//! a `Vec<HashMap<..>>` — the stack discipline is identical, only the
//! storage is a plain growable vector instead of an intrusive list.

use cqc_util::{FxHashMap, Span, Symbol, SymbolError};

use crate::types::Type;

#[derive(Clone, Debug)]
pub struct SymbolEntry {
    pub name: Symbol,
    pub ty: Type,
    pub scope_depth: u32,
    pub is_global: bool,
    pub is_forward_decl: bool,
    pub span: Span,
}

/// A stack of per-scope bindings. Scope 0 is global; function parameters
/// occupy scope 1; each nested block pushes one more scope. Function
/// bodies do not open an extra scope beyond the parameter scope
/// (spec.md §4.3: "parameters and top-level locals share a namespace").
pub struct ScopeStack {
    scopes: Vec<FxHashMap<Symbol, SymbolEntry>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// The depth of the innermost active scope; 0 is global.
    pub fn depth(&self) -> u32 {
        (self.scopes.len() - 1) as u32
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Declares `name: ty` at the current scope depth.
    ///
    /// If the name already exists at this depth, the insertion fails
    /// unless the existing entry is a function forward declaration and
    /// the new entry has an equal signature — in that case the forward
    /// entry is silently replaced (spec.md §4.3).
    pub fn insert(
        &mut self,
        name: Symbol,
        ty: Type,
        is_forward_decl: bool,
        span: Span,
    ) -> Result<(), SymbolError> {
        let depth = self.depth();
        let scope = self.scopes.last_mut().expect("scope stack is never empty");

        if let Some(existing) = scope.get(&name) {
            if existing.is_forward_decl && existing.ty.func.is_some() && ty.func.is_some() {
                if !ty.structurally_eq(&existing.ty) {
                    return Err(SymbolError::SignatureMismatch {
                        span,
                        name: name.as_str().to_string(),
                        first_span: existing.span,
                    });
                }
                // Matching signature: the forward declaration is promoted below.
            } else {
                return Err(SymbolError::Redeclared {
                    span,
                    name: name.as_str().to_string(),
                    first_span: existing.span,
                });
            }
        }

        scope.insert(
            name,
            SymbolEntry {
                name,
                ty,
                scope_depth: depth,
                is_global: depth == 0,
                is_forward_decl,
                span,
            },
        );
        Ok(())
    }

    /// Resolves `name`, scanning from the innermost scope outward.
    pub fn lookup(&self, name: Symbol) -> Option<&SymbolEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    pub fn lookup_or_err(&self, name: Symbol, span: Span) -> Result<&SymbolEntry, SymbolError> {
        self.lookup(name).ok_or_else(|| SymbolError::Undeclared {
            span,
            name: name.as_str().to_string(),
        })
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
