use std::collections::HashMap;

use crate::ast::{NodeId, Type};

use super::symbol::SymbolId;

/// Maps every identifier-*use* node to the symbol name analysis resolved it
/// to (spec §3.4: "Name analysis annotates identifier nodes with their
/// symbol link"). A side table keyed by `NodeId` rather than an in-place AST
/// mutation, per spec §9's "Pass annotation of AST" design note.
#[derive(Debug, Default)]
pub struct SymbolLinks(HashMap<NodeId, SymbolId>);

impl SymbolLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&mut self, node: NodeId, symbol: SymbolId) {
        self.0.insert(node, symbol);
    }

    pub fn get(&self, node: NodeId) -> Option<SymbolId> {
        self.0.get(&node).copied()
    }
}

/// Caches the inferred type of every expression node type check visits.
/// Code generation consults this for write-statement operands only (spec
/// §3.4: "write-statement code generation reads the operand's static type to
/// choose the correct I/O syscall"), but the table records every expression
/// so verifying "every expression acquired a type" (spec §8) is a simple
/// membership check.
#[derive(Debug, Default)]
pub struct TypeTable(HashMap<NodeId, Type>);

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, node: NodeId, ty: Type) {
        self.0.insert(node, ty);
    }

    pub fn get(&self, node: NodeId) -> Option<&Type> {
        self.0.get(&node)
    }
}
