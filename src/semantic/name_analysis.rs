use crate::ast::{Node, NodeKind, Type, TypeName};
use crate::error::ErrorSink;

use super::annotations::SymbolLinks;
use super::symbol::{Symbol, SymbolId, SymbolKind};
use super::symbol_table::SymbolTable;

/// Output of a full name-analysis pass: the populated symbol table, the
/// identifier-use -> symbol side table, and whether a `main` function was
/// declared at the outer scope (spec §4.1's `noMain` flag, inverted).
pub struct NameAnalysisResult {
    pub symbols: SymbolTable,
    pub links: SymbolLinks,
    pub has_main: bool,
}

/// A name-analysis pass over a parsed program (spec §4.1). Mirrors the
/// `AstParser`/`BackEndGenerator`-style trait the rest of this pipeline uses:
/// a no-arg constructor plus a single consuming entry point.
pub trait NameAnalyser {
    fn default() -> Self
    where
        Self: Sized;

    fn analyse<E: ErrorSink>(self, program: &Node, errors: &mut E) -> NameAnalysisResult;
}

/// The only `NameAnalyser` this crate ships.
#[derive(Debug, Default)]
pub struct DefaultNameAnalyser {
    table: SymbolTable,
    links: SymbolLinks,
    has_main: bool,
}

impl NameAnalyser for DefaultNameAnalyser {
    fn default() -> Self {
        DefaultNameAnalyser {
            table: SymbolTable::new(),
            links: SymbolLinks::new(),
            has_main: false,
        }
    }

    fn analyse<E: ErrorSink>(mut self, program: &Node, errors: &mut E) -> NameAnalysisResult {
        let decls = match &program.kind {
            NodeKind::Program(decls) => decls,
            other => panic!("Malformed AST! expected Program at the root, found {:?}", other),
        };

        for decl in decls {
            self.analyse_top_level_decl(decl, errors);
        }

        if !self.has_main {
            errors.report(crate::ast::Span::synthetic(), "No main function");
        }

        NameAnalysisResult {
            symbols: self.table,
            links: self.links,
            has_main: self.has_main,
        }
    }
}

impl DefaultNameAnalyser {
    fn analyse_top_level_decl<E: ErrorSink>(&mut self, node: &Node, errors: &mut E) {
        match &node.kind {
            NodeKind::VarDecl { name, ty } => {
                self.declare_variable(name, ty, node.span, errors);
            }
            NodeKind::FnDecl {
                name,
                formals,
                ret_ty,
                body,
            } => self.analyse_fn_decl(node, name, formals, ret_ty, body, errors),
            NodeKind::StructDecl { name, fields } => {
                self.analyse_struct_decl(node, name, fields, errors)
            }
            other => panic!(
                "Malformed AST! expected a top-level declaration, found {:?}",
                other
            ),
        }
    }

    /// Shared declaration logic for variables and formals (spec §4.1: "A
    /// formal is name-analyzed identically to a variable declaration").
    /// Returns the declared symbol's id and resolved type on success.
    fn declare_variable<E: ErrorSink>(
        &mut self,
        name: &str,
        ty: &TypeName,
        span: crate::ast::Span,
        errors: &mut E,
    ) -> Option<(SymbolId, Type)> {
        if matches!(ty, TypeName::Void) {
            errors.report(span, "Non-function declared void");
            return None;
        }

        let resolved_ty = self.resolve_type_name(ty, span, errors)?;

        let kind = match &resolved_ty {
            Type::Struct(def_id) => SymbolKind::StructInstance {
                struct_def: *def_id,
            },
            _ => SymbolKind::Var,
        };
        let is_global = self.table.is_global_scope();
        let offset = if is_global { -1 } else { self.table.current_offset() };
        let symbol = Symbol {
            name: name.to_string(),
            kind,
            ty: resolved_ty.clone(),
            offset,
            is_global,
        };

        match self.table.add_decl(name, symbol) {
            Some(id) => {
                if !is_global {
                    self.table.set_offset(self.table.current_offset() - 4);
                }
                Some((id, resolved_ty))
            }
            None => {
                errors.report(span, "Multiply declared identifier");
                None
            }
        }
    }

    /// Resolves a `TypeName` (as written in source) to a semantic `Type`,
    /// diagnosing an invalid struct reference. Does not diagnose `Void` —
    /// callers decide whether void is acceptable in their position.
    fn resolve_type_name<E: ErrorSink>(
        &self,
        ty: &TypeName,
        span: crate::ast::Span,
        errors: &mut E,
    ) -> Option<Type> {
        Some(match ty {
            TypeName::Int => Type::Int,
            TypeName::Bool => Type::Bool,
            TypeName::String => Type::String,
            TypeName::Void => Type::Void,
            TypeName::Struct(name) => match self.table.lookup_global(name) {
                Some(id) if self.table.symbol(id).is_struct_def() => Type::Struct(id),
                _ => {
                    errors.report(span, "Invalid name of struct type");
                    return None;
                }
            },
        })
    }

    /// A field is declared like a variable but never assigned a frame offset
    /// (spec §4.1: struct fields have no runtime storage of their own — they
    /// exist purely for type-checking `.field` access, per the codegen
    /// no-op stance on struct field access).
    fn declare_field<E: ErrorSink>(
        &mut self,
        name: &str,
        ty: &TypeName,
        span: crate::ast::Span,
        errors: &mut E,
    ) {
        if matches!(ty, TypeName::Void) {
            errors.report(span, "Non-function declared void");
            return;
        }
        let Some(resolved_ty) = self.resolve_type_name(ty, span, errors) else {
            return;
        };
        let kind = match &resolved_ty {
            Type::Struct(def_id) => SymbolKind::StructInstance {
                struct_def: *def_id,
            },
            _ => SymbolKind::Var,
        };
        let symbol = Symbol {
            name: name.to_string(),
            kind,
            ty: resolved_ty,
            offset: -1,
            is_global: false,
        };
        if self.table.add_decl(name, symbol).is_none() {
            errors.report(span, "Multiply declared identifier");
        }
    }

    fn analyse_struct_decl<E: ErrorSink>(
        &mut self,
        node: &Node,
        name: &str,
        fields: &[Node],
        errors: &mut E,
    ) {
        self.table.add_scope();
        for field in fields {
            match &field.kind {
                NodeKind::VarDecl { name: fname, ty: fty } => {
                    self.declare_field(fname, fty, field.span, errors)
                }
                other => panic!("Malformed AST! struct field was not a VarDecl, found {:?}", other),
            }
        }
        let field_map = self.table.innermost_scope_snapshot();
        self.table.remove_scope();

        let struct_symbol = Symbol {
            name: name.to_string(),
            kind: SymbolKind::StructDef { fields: field_map },
            ty: Type::Void,
            offset: -1,
            is_global: true,
        };
        match self.table.add_decl(name, struct_symbol) {
            Some(id) => self.table.symbol_mut(id).ty = Type::StructDef(id),
            None => errors.report(node.span, "Multiply declared identifier"),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn analyse_fn_decl<E: ErrorSink>(
        &mut self,
        node: &Node,
        name: &str,
        formals: &[Node],
        ret_ty: &TypeName,
        body: &Node,
        errors: &mut E,
    ) {
        let resolved_ret = self
            .resolve_type_name(ret_ty, node.span, errors)
            .unwrap_or(Type::Error);

        let placeholder = Symbol {
            name: name.to_string(),
            kind: SymbolKind::Fn {
                param_types: Vec::new(),
                param_size: 0,
                local_size: 0,
            },
            ty: Type::Fn {
                params: Vec::new(),
                ret: Box::new(resolved_ret.clone()),
            },
            offset: -1,
            is_global: true,
        };
        let fn_id = match self.table.add_decl(name, placeholder.clone()) {
            Some(id) => id,
            None => {
                errors.report(node.span, "Multiply declared identifier");
                self.table.declare_detached(placeholder)
            }
        };

        if name == "main" {
            self.has_main = true;
        }

        self.table.set_global_scope(false);
        self.table.set_offset(0);
        self.table.add_scope();

        let mut param_types = Vec::with_capacity(formals.len());
        for formal in formals {
            match &formal.kind {
                NodeKind::FormalDecl { name: fname, ty: fty } => {
                    if let Some((_, fty)) = self.declare_variable(fname, fty, formal.span, errors) {
                        param_types.push(fty);
                    }
                }
                other => panic!("Malformed AST! formal was not a FormalDecl, found {:?}", other),
            }
        }
        let param_size = -self.table.current_offset();

        self.table.set_offset(self.table.current_offset() - 8);
        let pre_body = self.table.current_offset();

        let body_stmts = match &body.kind {
            NodeKind::Block(stmts) => stmts,
            other => panic!("Malformed AST! function body was not a Block, found {:?}", other),
        };
        for stmt in body_stmts {
            self.analyse_stmt(stmt, errors);
        }

        let local_size = -(self.table.current_offset() - pre_body);

        self.table.symbol_mut(fn_id).kind = SymbolKind::Fn {
            param_types: param_types.clone(),
            param_size,
            local_size,
        };
        self.table.symbol_mut(fn_id).ty = Type::Fn {
            params: param_types,
            ret: Box::new(resolved_ret),
        };

        self.table.set_global_scope(true);
        self.table.remove_scope();
    }

    /// Processes a control-flow body (`if`/`while`/`repeat`) in a fresh
    /// scope, per spec §4.1's scope-discipline list.
    fn analyse_scoped_body<E: ErrorSink>(&mut self, body: &Node, errors: &mut E) {
        self.table.add_scope();
        match &body.kind {
            NodeKind::Block(stmts) => {
                for stmt in stmts {
                    self.analyse_stmt(stmt, errors);
                }
            }
            other => panic!("Malformed AST! expected a Block body, found {:?}", other),
        }
        self.table.remove_scope();
    }

    /// `repeat`'s body runs in its own scope like `if`/`while`, but it also
    /// needs a hidden local slot to hold the evaluated loop count (spec
    /// addition: "the counter temporary is allocated exactly like any other
    /// local"). That slot has no source-level name, so it is recorded via
    /// `SymbolLinks` keyed by the `repeat` node itself rather than by an
    /// identifier-use node.
    fn analyse_repeat<E: ErrorSink>(&mut self, repeat_node: &Node, body: &Node, errors: &mut E) {
        self.table.add_scope();

        let offset = self.table.current_offset();
        let counter = Symbol {
            name: format!("<repeat-counter@{:?}>", repeat_node.id),
            kind: SymbolKind::Var,
            ty: Type::Int,
            offset,
            is_global: false,
        };
        let counter_name = counter.name.clone();
        let counter_id = self
            .table
            .add_decl(&counter_name, counter)
            .expect("synthetic repeat-counter name is unique per node and cannot collide");
        self.table.set_offset(offset - 4);
        self.links.link(repeat_node.id, counter_id);

        match &body.kind {
            NodeKind::Block(stmts) => {
                for stmt in stmts {
                    self.analyse_stmt(stmt, errors);
                }
            }
            other => panic!("Malformed AST! expected a Block body, found {:?}", other),
        }

        self.table.remove_scope();
    }

    fn analyse_stmt<E: ErrorSink>(&mut self, node: &Node, errors: &mut E) {
        match &node.kind {
            NodeKind::VarDecl { name, ty } => {
                self.declare_variable(name, ty, node.span, errors);
            }
            NodeKind::ExprStmt(inner) => self.analyse_expr(inner, errors),
            NodeKind::Print(e) => self.analyse_expr(e, errors),
            NodeKind::Read(e) => self.analyse_expr(e, errors),
            NodeKind::Incr(e) => self.analyse_expr(e, errors),
            NodeKind::Decr(e) => self.analyse_expr(e, errors),
            NodeKind::Return(opt) => {
                if let Some(e) = opt {
                    self.analyse_expr(e, errors);
                }
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.analyse_expr(cond, errors);
                self.analyse_scoped_body(then_branch, errors);
                if let Some(eb) = else_branch {
                    self.analyse_scoped_body(eb, errors);
                }
            }
            NodeKind::While { cond, body } => {
                self.analyse_expr(cond, errors);
                self.analyse_scoped_body(body, errors);
            }
            NodeKind::Repeat { count, body } => {
                self.analyse_expr(count, errors);
                self.analyse_repeat(node, body, errors);
            }
            other => panic!("Malformed AST! expected a statement, found {:?}", other),
        }
    }

    fn analyse_expr<E: ErrorSink>(&mut self, node: &Node, errors: &mut E) {
        match &node.kind {
            NodeKind::Id(name) => match self.table.lookup_global(name) {
                Some(id) => self.links.link(node.id, id),
                None => errors.report(node.span, "Undeclared identifier"),
            },
            NodeKind::Literal(_) => {}
            NodeKind::Unary { expr, .. } => self.analyse_expr(expr, errors),
            NodeKind::Binary { lhs, rhs, .. } => {
                self.analyse_expr(lhs, errors);
                self.analyse_expr(rhs, errors);
            }
            NodeKind::Assign { target, value } => {
                self.analyse_expr(target, errors);
                self.analyse_expr(value, errors);
            }
            NodeKind::Call { callee, args } => {
                self.analyse_expr(callee, errors);
                for arg in args {
                    self.analyse_expr(arg, errors);
                }
            }
            NodeKind::FieldAccess { base, .. } => self.analyse_expr(base, errors),
            other => panic!("Malformed AST! expected an expression, found {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeIdGen, Span};
    use crate::error::CollectingErrorSink;

    fn id(ids: &mut NodeIdGen, kind: NodeKind) -> Node {
        Node {
            id: ids.next(),
            span: Span::new(1, 1),
            kind,
        }
    }

    fn fn_decl(ids: &mut NodeIdGen, name: &str, formals: Vec<Node>, body: Vec<Node>) -> Node {
        let block = id(ids, NodeKind::Block(body));
        id(
            ids,
            NodeKind::FnDecl {
                name: name.to_string(),
                formals,
                ret_ty: TypeName::Void,
                body: Box::new(block),
            },
        )
    }

    fn program(ids: &mut NodeIdGen, decls: Vec<Node>) -> Node {
        id(ids, NodeKind::Program(decls))
    }

    #[test]
    fn undeclared_identifier_is_diagnosed_and_unlinked() {
        let mut ids = NodeIdGen::new();
        let x_use = id(&mut ids, NodeKind::Id("x".to_string()));
        let x_use_id = x_use.id;
        let assign = id(
            &mut ids,
            NodeKind::ExprStmt(Box::new(id(
                &mut ids,
                NodeKind::Assign {
                    target: Box::new(x_use),
                    value: Box::new(id(&mut ids, NodeKind::Literal(crate::ast::Literal::Int(1)))),
                },
            ))),
        );
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), vec![assign]);
        let prog = program(&mut ids, vec![main_fn]);

        let mut errors = CollectingErrorSink::new();
        let result = DefaultNameAnalyser::default().analyse(&prog, &mut errors);

        assert!(result.has_main);
        assert_eq!(errors.fatal_count(), 1);
        assert_eq!(errors.diagnostics()[0].message, "Undeclared identifier");
        assert_eq!(result.links.get(x_use_id), None);
    }

    #[test]
    fn missing_main_is_diagnosed_once_at_the_end() {
        let mut ids = NodeIdGen::new();
        let g = fn_decl(&mut ids, "g", Vec::new(), Vec::new());
        let prog = program(&mut ids, vec![g]);

        let mut errors = CollectingErrorSink::new();
        let result = DefaultNameAnalyser::default().analyse(&prog, &mut errors);

        assert!(!result.has_main);
        assert_eq!(errors.fatal_count(), 1);
        assert_eq!(errors.diagnostics()[0].message, "No main function");
        assert_eq!(errors.diagnostics()[0].span, Span::synthetic());
    }

    #[test]
    fn duplicate_function_still_analyzes_its_body_against_a_detached_symbol() {
        let mut ids = NodeIdGen::new();
        let first = fn_decl(&mut ids, "f", Vec::new(), Vec::new());
        let bad_use = id(&mut ids, NodeKind::ExprStmt(Box::new(id(&mut ids, NodeKind::Id("y".to_string())))));
        let second = fn_decl(&mut ids, "f", Vec::new(), vec![bad_use]);
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), Vec::new());
        let prog = program(&mut ids, vec![first, second, main_fn]);

        let mut errors = CollectingErrorSink::new();
        DefaultNameAnalyser::default().analyse(&prog, &mut errors);

        let messages: Vec<&str> = errors.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"Multiply declared identifier"));
        assert!(messages.contains(&"Undeclared identifier"));
    }

    #[test]
    fn formals_and_locals_accumulate_distinct_frame_offsets() {
        let mut ids = NodeIdGen::new();
        let a = id(
            &mut ids,
            NodeKind::FormalDecl {
                name: "a".to_string(),
                ty: TypeName::Int,
            },
        );
        let b = id(
            &mut ids,
            NodeKind::FormalDecl {
                name: "b".to_string(),
                ty: TypeName::Int,
            },
        );
        let local = id(
            &mut ids,
            NodeKind::VarDecl {
                name: "c".to_string(),
                ty: TypeName::Int,
            },
        );
        let f = fn_decl(&mut ids, "f", vec![a, b], vec![local]);
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), Vec::new());
        let prog = program(&mut ids, vec![f, main_fn]);

        let mut errors = CollectingErrorSink::new();
        let result = DefaultNameAnalyser::default().analyse(&prog, &mut errors);
        assert_eq!(errors.fatal_count(), 0);

        let f_id = result.symbols.lookup_global("f").unwrap();
        let f_symbol = result.symbols.symbol(f_id);
        assert_eq!(f_symbol.param_size(), 8);
        assert_eq!(f_symbol.local_size(), 4);
    }

    #[test]
    fn repeat_reserves_a_hidden_counter_slot_linked_to_its_own_node() {
        let mut ids = NodeIdGen::new();
        let count = id(&mut ids, NodeKind::Literal(crate::ast::Literal::Int(3)));
        let repeat_body = id(&mut ids, NodeKind::Block(Vec::new()));
        let repeat = id(
            &mut ids,
            NodeKind::Repeat {
                count: Box::new(count),
                body: Box::new(repeat_body),
            },
        );
        let repeat_node_id = repeat.id;
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), vec![repeat]);
        let prog = program(&mut ids, vec![main_fn]);

        let mut errors = CollectingErrorSink::new();
        let result = DefaultNameAnalyser::default().analyse(&prog, &mut errors);
        assert_eq!(errors.fatal_count(), 0);

        let counter_id = result.links.get(repeat_node_id).expect("repeat must link a counter symbol");
        let counter = result.symbols.symbol(counter_id);
        assert!(counter.is_var());
        assert_eq!(counter.offset, -8);

        let main_id = result.symbols.lookup_global("main").unwrap();
        assert_eq!(result.symbols.symbol(main_id).local_size(), 4);
    }
}
