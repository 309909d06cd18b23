use crate::ast::{BinaryOp, Literal, Node, NodeKind, Type, UnaryOp};
use crate::error::ErrorSink;

use super::annotations::{SymbolLinks, TypeTable};
use super::symbol::SymbolKind;
use super::symbol_table::SymbolTable;

/// Output of a full type-check pass: the populated type side table.
pub struct TypeCheckResult {
    pub types: TypeTable,
}

/// A type-check pass over a name-analyzed program (spec §4.2). Consumes the
/// `SymbolTable`/`SymbolLinks` name analysis produced; the `SymbolTable` is
/// read-only from here on (no further declarations or offsets are assigned).
pub trait TypeChecker {
    fn default() -> Self
    where
        Self: Sized;

    fn check<E: ErrorSink>(
        self,
        program: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) -> TypeCheckResult;
}

/// The only `TypeChecker` this crate ships.
#[derive(Debug, Default)]
pub struct DefaultTypeChecker {
    types: TypeTable,
    /// Return type of the function currently being walked; `None` at the top
    /// level, where `return` cannot appear.
    enclosing_return_ty: Option<Type>,
}

impl TypeChecker for DefaultTypeChecker {
    fn default() -> Self {
        DefaultTypeChecker {
            types: TypeTable::new(),
            enclosing_return_ty: None,
        }
    }

    fn check<E: ErrorSink>(
        mut self,
        program: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) -> TypeCheckResult {
        let decls = match &program.kind {
            NodeKind::Program(decls) => decls,
            other => panic!("Malformed AST! expected Program at the root, found {:?}", other),
        };
        for decl in decls {
            self.check_top_level_decl(decl, symbols, links, errors);
        }
        TypeCheckResult { types: self.types }
    }
}

impl DefaultTypeChecker {
    fn check_top_level_decl<E: ErrorSink>(
        &mut self,
        node: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) {
        match &node.kind {
            NodeKind::VarDecl { .. } => {}
            NodeKind::StructDecl { .. } => {}
            NodeKind::FnDecl {
                ret_ty, body, ..
            } => {
                let ret_ty = self.type_name_to_type(ret_ty, symbols);
                let previous = self.enclosing_return_ty.replace(ret_ty);
                match &body.kind {
                    NodeKind::Block(stmts) => {
                        for stmt in stmts {
                            self.check_stmt(stmt, symbols, links, errors);
                        }
                    }
                    other => panic!("Malformed AST! function body was not a Block, found {:?}", other),
                }
                self.enclosing_return_ty = previous;
            }
            other => panic!(
                "Malformed AST! expected a top-level declaration, found {:?}",
                other
            ),
        }
    }

    fn type_name_to_type(&self, ty: &crate::ast::TypeName, symbols: &SymbolTable) -> Type {
        use crate::ast::TypeName;
        match ty {
            TypeName::Int => Type::Int,
            TypeName::Bool => Type::Bool,
            TypeName::Void => Type::Void,
            TypeName::String => Type::String,
            TypeName::Struct(name) => match symbols.lookup_global(name) {
                Some(id) if symbols.symbol(id).is_struct_def() => Type::Struct(id),
                _ => Type::Error,
            },
        }
    }

    fn check_stmt<E: ErrorSink>(
        &mut self,
        node: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) {
        match &node.kind {
            NodeKind::VarDecl { .. } => {}
            NodeKind::ExprStmt(inner) => {
                self.check_expr(inner, symbols, links, errors);
            }
            NodeKind::Print(e) => {
                let ty = self.check_expr(e, symbols, links, errors);
                if !ty.is_error()
                    && (ty.is_fn() || ty.is_struct_def() || ty.is_struct() || ty.is_void())
                {
                    errors.report(e.span, "Invalid type for cout operand");
                }
            }
            NodeKind::Read(e) => {
                let ty = self.check_expr(e, symbols, links, errors);
                if !ty.is_error() && (ty.is_fn() || ty.is_struct_def() || ty.is_struct()) {
                    errors.report(e.span, "Invalid type for cin operand");
                }
            }
            NodeKind::Incr(e) | NodeKind::Decr(e) => {
                let ty = self.check_expr(e, symbols, links, errors);
                if !ty.is_error() && !ty.is_int() {
                    errors.report(e.span, "Invalid type for increment/decrement");
                }
            }
            NodeKind::Return(opt) => {
                let expected = self
                    .enclosing_return_ty
                    .clone()
                    .unwrap_or_else(|| panic!("Malformed compilation state! return outside a function"));
                match opt {
                    Some(e) => {
                        let ty = self.check_expr(e, symbols, links, errors);
                        if !ty.is_error() && !expected.is_error() && ty != expected {
                            errors.report(e.span, "Type mismatch in return statement");
                        }
                    }
                    None => {
                        if !expected.is_error() && !expected.is_void() {
                            errors.report(node.span, "Missing return value");
                        }
                    }
                }
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let ty = self.check_expr(cond, symbols, links, errors);
                if !ty.is_error() && !ty.is_bool() {
                    errors.report(cond.span, "If condition must be bool");
                }
                self.check_block(then_branch, symbols, links, errors);
                if let Some(eb) = else_branch {
                    self.check_block(eb, symbols, links, errors);
                }
            }
            NodeKind::While { cond, body } => {
                let ty = self.check_expr(cond, symbols, links, errors);
                if !ty.is_error() && !ty.is_bool() {
                    errors.report(cond.span, "While condition must be bool");
                }
                self.check_block(body, symbols, links, errors);
            }
            NodeKind::Repeat { count, body } => {
                let ty = self.check_expr(count, symbols, links, errors);
                if !ty.is_error() && !ty.is_int() {
                    errors.report(count.span, "Repeat count must be int");
                }
                self.check_block(body, symbols, links, errors);
            }
            other => panic!("Malformed AST! expected a statement, found {:?}", other),
        }
    }

    fn check_block<E: ErrorSink>(
        &mut self,
        block: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) {
        match &block.kind {
            NodeKind::Block(stmts) => {
                for stmt in stmts {
                    self.check_stmt(stmt, symbols, links, errors);
                }
            }
            other => panic!("Malformed AST! expected a Block body, found {:?}", other),
        }
    }

    /// Checks an expression, records its type in the side table, and returns
    /// that type (spec §4.2: "every expression acquires a type").
    fn check_expr<E: ErrorSink>(
        &mut self,
        node: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) -> Type {
        let ty = self.infer_expr(node, symbols, links, errors);
        self.types.set(node.id, ty.clone());
        ty
    }

    fn infer_expr<E: ErrorSink>(
        &mut self,
        node: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) -> Type {
        match &node.kind {
            NodeKind::Literal(lit) => match lit {
                Literal::Int(_) => Type::Int,
                Literal::Bool(_) => Type::Bool,
                Literal::Str(_) => Type::String,
            },
            NodeKind::Id(_) => match links.get(node.id) {
                Some(id) => symbols.symbol(id).ty.clone(),
                // Name analysis already diagnosed this as undeclared.
                None => Type::Error,
            },
            NodeKind::Unary { op, expr } => {
                let ty = self.check_expr(expr, symbols, links, errors);
                if ty.is_error() {
                    return Type::Error;
                }
                match op {
                    UnaryOp::Not => {
                        if ty.is_bool() {
                            Type::Bool
                        } else {
                            errors.report(node.span, "Operand of ! must be bool");
                            Type::Error
                        }
                    }
                    UnaryOp::Negate => {
                        if ty.is_int() {
                            Type::Int
                        } else {
                            errors.report(node.span, "Operand of unary - must be int");
                            Type::Error
                        }
                    }
                }
            }
            NodeKind::Binary { op, lhs, rhs } => {
                self.check_binary(node, *op, lhs, rhs, symbols, links, errors)
            }
            NodeKind::Assign { target, value } => {
                let target_ty = self.check_expr(target, symbols, links, errors);
                let value_ty = self.check_expr(value, symbols, links, errors);
                if target_ty.is_error() || value_ty.is_error() {
                    return Type::Error;
                }
                if target_ty.is_fn() || target_ty.is_struct_def() || target_ty.is_struct() {
                    errors.report(node.span, "Invalid type for assignment target");
                    return Type::Error;
                }
                if target_ty != value_ty {
                    errors.report(node.span, "Type mismatch");
                    return Type::Error;
                }
                target_ty
            }
            NodeKind::Call { callee, args } => {
                self.check_call(node, callee, args, symbols, links, errors)
            }
            NodeKind::FieldAccess { base, field } => {
                self.check_field_access(node, base, field, symbols, links, errors)
            }
            other => panic!("Malformed AST! expected an expression, found {:?}", other),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_binary<E: ErrorSink>(
        &mut self,
        node: &Node,
        op: BinaryOp,
        lhs: &Node,
        rhs: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) -> Type {
        let lhs_ty = self.check_expr(lhs, symbols, links, errors);
        let rhs_ty = self.check_expr(rhs, symbols, links, errors);
        if lhs_ty.is_error() || rhs_ty.is_error() {
            return Type::Error;
        }

        if op.is_arithmetic() {
            return if lhs_ty.is_int() && rhs_ty.is_int() {
                Type::Int
            } else {
                errors.report(node.span, "Operands must be int");
                Type::Error
            };
        }
        if op.is_logical() {
            return if lhs_ty.is_bool() && rhs_ty.is_bool() {
                Type::Bool
            } else {
                errors.report(node.span, "Operands must be bool");
                Type::Error
            };
        }
        if op.is_relational() {
            return if lhs_ty.is_int() && rhs_ty.is_int() {
                Type::Bool
            } else {
                errors.report(node.span, "Operands must be int");
                Type::Error
            };
        }
        if op.is_equality() {
            let comparable = |t: &Type| !t.is_void() && !t.is_fn() && !t.is_struct_def() && !t.is_struct();
            return if comparable(&lhs_ty) && comparable(&rhs_ty) && lhs_ty == rhs_ty {
                Type::Bool
            } else {
                errors.report(node.span, "Operands of == or != must share a comparable type");
                Type::Error
            };
        }
        unreachable!("BinaryOp is exhaustively arithmetic, logical, relational, or equality");
    }

    fn check_call<E: ErrorSink>(
        &mut self,
        node: &Node,
        callee: &Node,
        args: &[Node],
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) -> Type {
        let callee_id = match &callee.kind {
            NodeKind::Id(_) => links.get(callee.id),
            other => panic!("Malformed AST! call callee was not an Id, found {:?}", other),
        };

        let arg_tys: Vec<Type> = args
            .iter()
            .map(|a| self.check_expr(a, symbols, links, errors))
            .collect();

        let Some(callee_id) = callee_id else {
            // Undeclared callee: already diagnosed by name analysis.
            return Type::Error;
        };

        let callee_symbol = symbols.symbol(callee_id);
        let SymbolKind::Fn { .. } = &callee_symbol.kind else {
            errors.report(callee.span, "Called object is not a function");
            return Type::Error;
        };
        let param_types = callee_symbol.param_types().to_vec();
        let ret_ty = match &callee_symbol.ty {
            Type::Fn { ret, .. } => (**ret).clone(),
            _ => unreachable!("Fn symbol must carry a Fn type"),
        };

        if arg_tys.len() != param_types.len() {
            errors.report(node.span, "Wrong number of arguments");
            return Type::Error;
        }
        let mut mismatched = false;
        for (arg_ty, param_ty) in arg_tys.iter().zip(param_types.iter()) {
            if arg_ty.is_error() {
                continue;
            }
            if arg_ty != param_ty {
                mismatched = true;
            }
        }
        if mismatched {
            errors.report(node.span, "Argument type mismatch");
            return Type::Error;
        }
        ret_ty
    }

    fn check_field_access<E: ErrorSink>(
        &mut self,
        node: &Node,
        base: &Node,
        field: &str,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        errors: &mut E,
    ) -> Type {
        let base_ty = self.check_expr(base, symbols, links, errors);
        if base_ty.is_error() {
            return Type::Error;
        }
        let Type::Struct(def_id) = base_ty else {
            errors.report(node.span, "Field access on a non-struct type");
            return Type::Error;
        };
        let SymbolKind::StructDef { fields } = &symbols.symbol(def_id).kind else {
            unreachable!("Type::Struct must reference a StructDef symbol");
        };
        match fields.get(field) {
            Some(field_id) => symbols.symbol(*field_id).ty.clone(),
            None => {
                errors.report(node.span, "Invalid struct field name");
                Type::Error
            }
        }
    }
}
