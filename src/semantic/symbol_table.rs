use std::collections::HashMap;

use super::symbol::{Symbol, SymbolId};

/// An ordered stack of scopes mapping identifier text to symbols (spec
/// §3.3). The front of `scopes` is the innermost scope. Symbols themselves
/// live in an append-only arena so `SymbolId`s stay valid after their
/// declaring scope is popped — spec §3.2: "A symbol is never relinked," and
/// symbols "persist for the remainder of compilation" even once their scope
/// is gone.
///
/// Constructed with one outer scope already pushed, per spec §3.3.
pub struct SymbolTable {
    arena: Vec<Symbol>,
    scopes: Vec<HashMap<String, SymbolId>>,
    is_global_scope: bool,
    current_offset: i32,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            arena: Vec::new(),
            scopes: vec![HashMap::new()],
            is_global_scope: true,
            current_offset: 0,
        }
    }

    /// Push an empty scope.
    pub fn add_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope. Panics if there is no scope to pop — this is
    /// an invariant violation (spec §7 item 3), not a recoverable condition.
    pub fn remove_scope(&mut self) {
        if self.scopes.is_empty() {
            panic!("Malformed compilation state! removeScope() called with no active scope");
        }
        self.scopes.pop();
    }

    /// Insert `symbol` into the innermost scope under `name`.
    /// Returns the new `SymbolId` on success, or `None` if `name` is already
    /// declared in this (innermost) scope — the caller is responsible for
    /// diagnosing "Multiply declared identifier" in that case.
    pub fn add_decl(&mut self, name: &str, symbol: Symbol) -> Option<SymbolId> {
        let front = self
            .scopes
            .last_mut()
            .unwrap_or_else(|| panic!("Malformed compilation state! No active scope for addDecl"));
        if front.contains_key(name) {
            return None;
        }
        let id = SymbolId(self.arena.len() as u32);
        self.arena.push(symbol);
        front.insert(name.to_string(), id);
        Some(id)
    }

    /// Search only the innermost scope.
    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        self.scopes.last().and_then(|scope| scope.get(name).copied())
    }

    /// Search every active scope, innermost first, returning the first hit.
    pub fn lookup_global(&self, name: &str) -> Option<SymbolId> {
        for scope in self.scopes.iter().rev() {
            if let Some(id) = scope.get(name) {
                return Some(*id);
            }
        }
        None
    }

    pub fn is_global_scope(&self) -> bool {
        self.is_global_scope
    }

    pub fn set_global_scope(&mut self, is_global: bool) {
        self.is_global_scope = is_global;
    }

    pub fn current_offset(&self) -> i32 {
        self.current_offset
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.current_offset = offset;
    }

    /// Append `symbol` to the arena without registering it in any scope.
    /// Used when a declaration is rejected as a duplicate but analysis must
    /// still proceed against a valid `SymbolId` (spec §4.1: a duplicate
    /// function "proceed[s] to body analysis anyway with a null symbol").
    pub fn declare_detached(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.arena.len() as u32);
        self.arena.push(symbol);
        id
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.arena[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.arena[id.0 as usize]
    }

    /// Snapshot of the innermost scope's declarations, in insertion order is
    /// not preserved (a `HashMap`), but the set of `(name, id)` pairs is
    /// exact. Used by struct-body analysis to harvest field symbols once the
    /// fields' temporary scope is about to be popped (spec §4.1: struct
    /// fields are analyzed in a fresh scope, then folded into the
    /// `struct-def` symbol's own field table).
    pub fn innermost_scope_snapshot(&self) -> HashMap<String, SymbolId> {
        self.scopes
            .last()
            .cloned()
            .unwrap_or_else(|| panic!("Malformed compilation state! No active scope to snapshot"))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
