use crate::ast::{BinaryOp, Literal, Node, NodeKind, UnaryOp};
use crate::semantic::{SymbolLinks, SymbolTable, TypeTable};

use super::asm::{AsmWriter, Location, Reg};

/// Code generation for a fully name-analyzed and type-checked program (spec
/// §4.3). Mirrors this stack's `BackEndGenerator` trait shape: a no-arg
/// constructor plus a single consuming entry point.
pub trait BackEndGenerator {
    fn default() -> Self
    where
        Self: Sized;

    fn generate(self, program: &Node, symbols: &SymbolTable, links: &SymbolLinks, types: &TypeTable) -> String;
}

/// The only `BackEndGenerator` this crate ships. Holds exactly the mutable
/// state spec §4.3's "State machine" paragraph calls for: a monotonic label
/// counter and the writer. "In global scope" is read straight off the
/// symbol table rather than duplicated here; the per-function exit label is
/// threaded as a parameter through statement generation, not stored on
/// `self`.
pub struct DefaultGenerator {
    writer: AsmWriter,
    label_counter: u32,
}

impl BackEndGenerator for DefaultGenerator {
    fn default() -> Self {
        DefaultGenerator {
            writer: AsmWriter::new(),
            label_counter: 0,
        }
    }

    fn generate(mut self, program: &Node, symbols: &SymbolTable, links: &SymbolLinks, types: &TypeTable) -> String {
        let decls = match &program.kind {
            NodeKind::Program(decls) => decls,
            other => panic!("Malformed AST! expected Program at the root, found {:?}", other),
        };

        for decl in decls {
            match &decl.kind {
                NodeKind::VarDecl { name, .. } => self.generate_global(name),
                NodeKind::StructDecl { .. } => {}
                NodeKind::FnDecl { name, body, .. } => {
                    self.generate_function(name, body, symbols, links, types)
                }
                other => panic!(
                    "Malformed AST! expected a top-level declaration, found {:?}",
                    other
                ),
            }
        }

        self.writer.finalize()
    }
}

impl DefaultGenerator {
    fn fresh_label(&mut self) -> String {
        let label = format!(".L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn push(&mut self, reg: Reg) {
        self.writer.emit(format!("sw {}, 0({})", reg, Reg::Sp));
        self.writer.emit(format!("subu {}, {}, 4", Reg::Sp, Reg::Sp));
    }

    fn pop(&mut self, reg: Reg) {
        self.writer.emit(format!("lw {}, 4({})", reg, Reg::Sp));
        self.writer.emit(format!("addu {}, {}, 4", Reg::Sp, Reg::Sp));
    }

    fn generate_global(&mut self, name: &str) {
        self.writer.section_data();
        self.writer.align2();
        self.writer.space(&format!("_{}", name), 4);
        self.writer.section_text();
    }

    fn location_of(&self, symbol_id: crate::semantic::SymbolId, symbols: &SymbolTable) -> Location {
        let symbol = symbols.symbol(symbol_id);
        if symbol.is_global {
            Location::Global(format!("_{}", symbol.name))
        } else {
            Location::Frame(symbol.offset)
        }
    }

    fn generate_function(
        &mut self,
        name: &str,
        body: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        types: &TypeTable,
    ) {
        let fn_id = symbols
            .lookup_global(name)
            .unwrap_or_else(|| panic!("Malformed compilation state! function {} has no symbol", name));
        let fn_symbol = symbols.symbol(fn_id);
        let param_size = fn_symbol.param_size();
        let local_size = fn_symbol.local_size();
        let is_main = name == "main";

        self.writer.section_text();
        if is_main {
            self.writer.globl("main");
            self.writer.label("main");
            self.writer.label("__start");
        } else {
            self.writer.label(&format!("_{}", name));
        }

        self.push(Reg::Ra);
        self.push(Reg::Fp);
        self.writer.emit(format!("subu {}, {}, {}", Reg::Sp, Reg::Sp, local_size));
        self.writer.emit(format!(
            "addu {}, {}, {}",
            Reg::Fp,
            Reg::Sp,
            local_size + 8 + param_size
        ));

        let exit_label = format!("_{}_Exit", name);
        let body_stmts = match &body.kind {
            NodeKind::Block(stmts) => stmts,
            other => panic!("Malformed AST! function body was not a Block, found {:?}", other),
        };
        for stmt in body_stmts {
            self.generate_stmt(stmt, symbols, links, types, &exit_label);
        }

        self.writer.label(&exit_label);
        self.writer.emit(format!("lw {}, -{}({})", Reg::Ra, param_size, Reg::Fp));
        self.writer.emit(format!("subu {}, {}, {}", Reg::T0, Reg::Fp, param_size));
        self.writer
            .emit(format!("lw {}, {}({})", Reg::Fp, -4 - param_size, Reg::Fp));
        self.writer.emit(format!("move {}, {}", Reg::Sp, Reg::T0));
        if is_main {
            self.writer.emit(format!("li {}, 10", Reg::V0));
            self.writer.emit("syscall");
        } else {
            self.writer.emit(format!("jr {}", Reg::Ra));
        }
    }

    fn generate_block(
        &mut self,
        block: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        types: &TypeTable,
        exit_label: &str,
    ) {
        match &block.kind {
            NodeKind::Block(stmts) => {
                for stmt in stmts {
                    self.generate_stmt(stmt, symbols, links, types, exit_label);
                }
            }
            other => panic!("Malformed AST! expected a Block body, found {:?}", other),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_stmt(
        &mut self,
        node: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        types: &TypeTable,
        exit_label: &str,
    ) {
        match &node.kind {
            // A bare declaration has no runtime effect: frame space for
            // locals is already reserved up front by the function prologue.
            NodeKind::VarDecl { .. } => {}
            NodeKind::ExprStmt(inner) => {
                self.generate_expr(inner, symbols, links);
                self.pop(Reg::T0);
            }
            NodeKind::Print(e) => self.generate_print(e, symbols, links, types),
            NodeKind::Read(e) => self.generate_read(e, symbols, links),
            NodeKind::Incr(e) => self.generate_step(e, symbols, links, 1),
            NodeKind::Decr(e) => self.generate_step(e, symbols, links, -1),
            NodeKind::Return(opt) => {
                if let Some(e) = opt {
                    self.generate_expr(e, symbols, links);
                    self.pop(Reg::V0);
                }
                self.writer.emit(format!("b {}", exit_label));
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.generate_if(
                cond,
                then_branch,
                else_branch.as_deref(),
                symbols,
                links,
                types,
                exit_label,
            ),
            NodeKind::While { cond, body } => self.generate_while(cond, body, symbols, links, types, exit_label),
            NodeKind::Repeat { count, body } => {
                self.generate_repeat(node, count, body, symbols, links, types, exit_label)
            }
            other => panic!("Malformed AST! expected a statement, found {:?}", other),
        }
    }

    /// Chooses the `cout` syscall code from the operand's type-check-time
    /// type (spec §4.3's I/O rule), rather than re-deriving it from AST shape
    /// at codegen time.
    fn generate_print(&mut self, e: &Node, symbols: &SymbolTable, links: &SymbolLinks, types: &TypeTable) {
        let ty = types
            .get(e.id)
            .unwrap_or_else(|| panic!("Malformed compilation state! cout operand has no recorded type"));
        let is_string = ty.is_string();
        self.generate_expr(e, symbols, links);
        self.pop(Reg::A0);
        let syscall_code = if is_string { 4 } else { 1 };
        self.writer.emit(format!("li {}, {}", Reg::V0, syscall_code));
        self.writer.emit("syscall");
    }

    fn generate_read(&mut self, e: &Node, symbols: &SymbolTable, links: &SymbolLinks) {
        self.writer.emit(format!("li {}, 5", Reg::V0));
        self.writer.emit("syscall");
        match self.lvalue_location(e, symbols, links) {
            Some(loc) => self.writer.emit(format!("sw {}, {}", Reg::V0, loc)),
            None => self
                .writer
                .comment("cin target is a struct field: codegen no-op, value discarded"),
        }
    }

    fn generate_step(&mut self, e: &Node, symbols: &SymbolTable, links: &SymbolLinks, delta: i32) {
        self.generate_expr(e, symbols, links);
        self.pop(Reg::T0);
        self.writer.emit(format!("addi {}, {}, {}", Reg::T0, Reg::T0, delta));
        match self.lvalue_location(e, symbols, links) {
            Some(loc) => self.writer.emit(format!("sw {}, {}", Reg::T0, loc)),
            None => self
                .writer
                .comment("increment/decrement target is a struct field: codegen no-op"),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_if(
        &mut self,
        cond: &Node,
        then_branch: &Node,
        else_branch: Option<&Node>,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        types: &TypeTable,
        exit_label: &str,
    ) {
        self.generate_expr(cond, symbols, links);
        self.pop(Reg::T0);
        let done_label = self.fresh_label();
        match else_branch {
            None => {
                self.writer.emit(format!("beq {}, 0, {}", Reg::T0, done_label));
                self.generate_block(then_branch, symbols, links, types, exit_label);
                self.writer.label(&done_label);
            }
            Some(else_branch) => {
                let else_label = self.fresh_label();
                self.writer.emit(format!("beq {}, 0, {}", Reg::T0, else_label));
                self.generate_block(then_branch, symbols, links, types, exit_label);
                self.writer.emit(format!("b {}", done_label));
                self.writer.label(&else_label);
                self.generate_block(else_branch, symbols, links, types, exit_label);
                self.writer.label(&done_label);
            }
        }
    }

    fn generate_while(
        &mut self,
        cond: &Node,
        body: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        types: &TypeTable,
        exit_label: &str,
    ) {
        let loop_label = self.fresh_label();
        let done_label = self.fresh_label();
        self.writer.label(&loop_label);
        self.generate_expr(cond, symbols, links);
        self.pop(Reg::T0);
        self.writer.emit(format!("beq {}, 0, {}", Reg::T0, done_label));
        self.generate_block(body, symbols, links, types, exit_label);
        self.writer.emit(format!("b {}", loop_label));
        self.writer.label(&done_label);
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_repeat(
        &mut self,
        repeat_node: &Node,
        count: &Node,
        body: &Node,
        symbols: &SymbolTable,
        links: &SymbolLinks,
        types: &TypeTable,
        exit_label: &str,
    ) {
        let counter_id = links
            .get(repeat_node.id)
            .unwrap_or_else(|| panic!("Malformed compilation state! repeat has no counter slot"));
        let counter_loc = self.location_of(counter_id, symbols);

        self.generate_expr(count, symbols, links);
        self.pop(Reg::T0);
        self.writer.emit(format!("sw {}, {}", Reg::T0, counter_loc));

        let loop_label = self.fresh_label();
        let done_label = self.fresh_label();
        self.writer.label(&loop_label);
        self.writer.emit(format!("lw {}, {}", Reg::T0, counter_loc));
        self.writer.emit(format!("blez {}, {}", Reg::T0, done_label));
        self.generate_block(body, symbols, links, types, exit_label);
        self.writer.emit(format!("lw {}, {}", Reg::T0, counter_loc));
        self.writer.emit(format!("addi {}, {}, -1", Reg::T0, Reg::T0));
        self.writer.emit(format!("sw {}, {}", Reg::T0, counter_loc));
        self.writer.emit(format!("b {}", loop_label));
        self.writer.label(&done_label);
    }

    /// Resolves the memory location an expression writes through, if any.
    /// `None` for a struct-field target — spec addition "struct field code
    /// generation stance": dot-access codegen is a documented no-op.
    fn lvalue_location(&self, node: &Node, symbols: &SymbolTable, links: &SymbolLinks) -> Option<Location> {
        match &node.kind {
            NodeKind::Id(_) => {
                let id = links
                    .get(node.id)
                    .unwrap_or_else(|| panic!("Malformed compilation state! unresolved identifier reached codegen"));
                Some(self.location_of(id, symbols))
            }
            NodeKind::FieldAccess { .. } => None,
            other => panic!("Malformed AST! expected an lvalue, found {:?}", other),
        }
    }

    fn generate_expr(&mut self, node: &Node, symbols: &SymbolTable, links: &SymbolLinks) {
        match &node.kind {
            NodeKind::Literal(lit) => self.generate_literal(lit),
            NodeKind::Id(_) => {
                let id = links
                    .get(node.id)
                    .unwrap_or_else(|| panic!("Malformed compilation state! unresolved identifier reached codegen"));
                let loc = self.location_of(id, symbols);
                self.writer.emit(format!("lw {}, {}", Reg::T0, loc));
                self.push(Reg::T0);
            }
            NodeKind::Unary { op, expr } => self.generate_unary(*op, expr, symbols, links),
            NodeKind::Binary { op, lhs, rhs } => self.generate_binary(*op, lhs, rhs, symbols, links),
            NodeKind::Assign { target, value } => self.generate_assign(target, value, symbols, links),
            NodeKind::Call { callee, args } => self.generate_call(callee, args, symbols, links),
            NodeKind::FieldAccess { .. } => {
                // Dot-access reads emit no instructions (struct field code
                // generation stance), but every caller that evaluates an
                // expression for its value unconditionally pops one word
                // afterward, so a placeholder must still be pushed to keep
                // $sp balanced.
                self.writer
                    .comment("struct field access: codegen no-op (not supported)");
                self.writer.emit(format!("li {}, 0", Reg::T0));
                self.push(Reg::T0);
            }
            other => panic!("Malformed AST! expected an expression, found {:?}", other),
        }
    }

    fn generate_literal(&mut self, lit: &Literal) {
        match lit {
            Literal::Int(n) => {
                self.writer.emit(format!("li {}, {}", Reg::T0, n));
                self.push(Reg::T0);
            }
            Literal::Bool(b) => {
                self.writer.emit(format!("li {}, {}", Reg::T0, if *b { 1 } else { 0 }));
                self.push(Reg::T0);
            }
            Literal::Str(s) => {
                let label = self.fresh_label();
                self.writer.section_data();
                self.writer.asciiz(&label, s);
                self.writer.section_text();
                self.writer.emit(format!("la {}, {}", Reg::T0, label));
                self.push(Reg::T0);
            }
        }
    }

    fn generate_unary(&mut self, op: UnaryOp, expr: &Node, symbols: &SymbolTable, links: &SymbolLinks) {
        self.generate_expr(expr, symbols, links);
        self.pop(Reg::T0);
        match op {
            UnaryOp::Not => {
                self.writer.emit(format!("xor {}, {}, 1", Reg::T0, Reg::T0));
            }
            UnaryOp::Negate => {
                self.writer.emit(format!("li {}, 0", Reg::T1));
                self.writer.emit(format!("sub {}, {}, {}", Reg::T0, Reg::T1, Reg::T0));
            }
        }
        self.push(Reg::T0);
    }

    fn generate_binary(&mut self, op: BinaryOp, lhs: &Node, rhs: &Node, symbols: &SymbolTable, links: &SymbolLinks) {
        if op == BinaryOp::And {
            return self.generate_and(lhs, rhs, symbols, links);
        }
        if op == BinaryOp::Or {
            return self.generate_or(lhs, rhs, symbols, links);
        }

        self.generate_expr(lhs, symbols, links);
        self.generate_expr(rhs, symbols, links);
        self.pop(Reg::T1);
        self.pop(Reg::T0);

        if op.is_arithmetic() {
            let instr = match op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "sub",
                BinaryOp::Mul => "mul",
                BinaryOp::Div => "div",
                _ => unreachable!(),
            };
            self.writer.emit(format!("{} {}, {}, {}", instr, Reg::T0, Reg::T0, Reg::T1));
            self.push(Reg::T0);
            return;
        }

        // Relational and equality operators all compile to the same
        // branch-around-li scheme (spec §4.3): branch on the *complement*
        // condition to a false label, fall through to the true case.
        let complement = match op {
            BinaryOp::Less => "bge",
            BinaryOp::LessEqual => "bgt",
            BinaryOp::Greater => "ble",
            BinaryOp::GreaterEqual => "blt",
            BinaryOp::Equal => "bne",
            BinaryOp::NotEqual => "beq",
            _ => unreachable!("non-arithmetic, non-logical BinaryOp must be relational or equality"),
        };
        let false_label = self.fresh_label();
        let done_label = self.fresh_label();
        self.writer
            .emit(format!("{} {}, {}, {}", complement, Reg::T0, Reg::T1, false_label));
        self.writer.emit(format!("li {}, 1", Reg::T0));
        self.writer.emit(format!("b {}", done_label));
        self.writer.label(&false_label);
        self.writer.emit(format!("li {}, 0", Reg::T0));
        self.writer.label(&done_label);
        self.push(Reg::T0);
    }

    fn generate_and(&mut self, lhs: &Node, rhs: &Node, symbols: &SymbolTable, links: &SymbolLinks) {
        self.generate_expr(lhs, symbols, links);
        self.pop(Reg::T0);
        let rhs_label = self.fresh_label();
        let done_label = self.fresh_label();
        self.writer.emit(format!("beq {}, 1, {}", Reg::T0, rhs_label));
        self.push(Reg::T0);
        self.writer.emit(format!("b {}", done_label));
        self.writer.label(&rhs_label);
        self.generate_expr(rhs, symbols, links);
        self.writer.label(&done_label);
    }

    fn generate_or(&mut self, lhs: &Node, rhs: &Node, symbols: &SymbolTable, links: &SymbolLinks) {
        self.generate_expr(lhs, symbols, links);
        self.pop(Reg::T0);
        let rhs_label = self.fresh_label();
        let done_label = self.fresh_label();
        self.writer.emit(format!("beq {}, 0, {}", Reg::T0, rhs_label));
        self.push(Reg::T0);
        self.writer.emit(format!("b {}", done_label));
        self.writer.label(&rhs_label);
        self.generate_expr(rhs, symbols, links);
        self.writer.label(&done_label);
    }

    fn generate_assign(&mut self, target: &Node, value: &Node, symbols: &SymbolTable, links: &SymbolLinks) {
        self.generate_expr(value, symbols, links);
        self.pop(Reg::T0);
        if let Some(loc) = self.lvalue_location(target, symbols, links) {
            self.writer.emit(format!("sw {}, {}", Reg::T0, loc));
        } else {
            self.writer
                .comment("assignment target is a struct field: codegen no-op (value discarded)");
        }
        self.push(Reg::T0);
    }

    fn generate_call(&mut self, callee: &Node, args: &[Node], symbols: &SymbolTable, links: &SymbolLinks) {
        let name = match &callee.kind {
            NodeKind::Id(name) => name.clone(),
            other => panic!("Malformed AST! call callee was not an Id, found {:?}", other),
        };
        for arg in args {
            self.generate_expr(arg, symbols, links);
        }
        let target = if name == "main" {
            "main".to_string()
        } else {
            format!("_{}", name)
        };
        self.writer.emit(format!("jal {}", target));
        self.push(Reg::V0);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, NodeIdGen, Span, TypeName};
    use crate::error::CollectingErrorSink;
    use crate::semantic::{DefaultNameAnalyser, DefaultTypeChecker, NameAnalyser, TypeChecker};

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

    /// Runs name analysis + type check (asserting both clean) and returns the
    /// generated assembly, so codegen tests exercise the real pipeline rather
    /// than hand-built symbol tables.
    fn generate(prog: &Node) -> String {
        let mut errors = CollectingErrorSink::new();
        let name_result = DefaultNameAnalyser::default().analyse(prog, &mut errors);
        let type_result =
            DefaultTypeChecker::default().check(prog, &name_result.symbols, &name_result.links, &mut errors);
        assert_eq!(errors.fatal_count(), 0, "fixture must analyze cleanly");
        DefaultGenerator::default().generate(prog, &name_result.symbols, &name_result.links, &type_result.types)
    }

    #[test]
    fn zero_param_epilogue_reads_ra_at_negative_param_size_offset() {
        let mut ids = NodeIdGen::new();
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), Vec::new());
        let prog = id(&mut ids, NodeKind::Program(vec![main_fn]));

        let asm = generate(&prog);
        // paramSize is 0 for a zero-formal function, so the formula degenerates
        // to reading RA from 0(FP) (spec §9's frame layout quirk), which this
        // implementation achieves by applying the same parameterized formula
        // uniformly rather than special-casing it.
        assert!(asm.contains("lw $ra, -0($fp)"));
    }

    #[test]
    fn multi_param_epilogue_reads_ra_at_negative_param_size_offset() {
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
        let f = fn_decl(&mut ids, "f", vec![a, b], Vec::new());
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), Vec::new());
        let prog = id(&mut ids, NodeKind::Program(vec![f, main_fn]));

        let asm = generate(&prog);
        assert!(asm.contains("lw $ra, -8($fp)"));
    }

    #[test]
    fn main_exits_via_syscall_ten_not_jr_ra() {
        let mut ids = NodeIdGen::new();
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), Vec::new());
        let prog = id(&mut ids, NodeKind::Program(vec![main_fn]));

        let asm = generate(&prog);
        assert!(asm.contains("li $v0, 10"));
        assert!(!asm.contains("jr $ra"));
    }

    #[test]
    fn non_main_function_exits_via_jr_ra() {
        let mut ids = NodeIdGen::new();
        let f = fn_decl(&mut ids, "f", Vec::new(), Vec::new());
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), vec![id(
            &mut ids,
            NodeKind::ExprStmt(Box::new(id(
                &mut ids,
                NodeKind::Call {
                    callee: Box::new(id(&mut ids, NodeKind::Id("f".to_string()))),
                    args: Vec::new(),
                },
            ))),
        )]);
        let prog = id(&mut ids, NodeKind::Program(vec![f, main_fn]));

        let asm = generate(&prog);
        assert!(asm.contains("jr $ra"));
        assert!(asm.contains("jal _f"));
    }

    #[test]
    fn hello_world_emits_data_block_and_string_syscall() {
        let mut ids = NodeIdGen::new();
        let print_stmt = id(
            &mut ids,
            NodeKind::Print(Box::new(id(&mut ids, NodeKind::Literal(Literal::Str("Hi".to_string()))))),
        );
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), vec![print_stmt]);
        let prog = id(&mut ids, NodeKind::Program(vec![main_fn]));

        let asm = generate(&prog);
        assert!(asm.contains(".data"));
        assert!(asm.contains(r#".asciiz "Hi""#));
        assert!(asm.contains("la $t0"));
        assert!(asm.contains("li $v0, 4"));
        assert!(asm.contains("syscall"));
        assert!(asm.contains("li $v0, 10"));
    }

    /// `cout` of a string-*returning function call* must still pick syscall
    /// 4, not just a literal string or a bare identifier — the previous
    /// ad hoc AST-shape sniff missed this case and always fell back to
    /// syscall 1 (print-int).
    #[test]
    fn cout_of_string_returning_call_uses_print_string_syscall() {
        let mut ids = NodeIdGen::new();
        let greet_block = id(&mut ids, NodeKind::Block(vec![id(
            &mut ids,
            NodeKind::Return(Some(Box::new(id(&mut ids, NodeKind::Literal(Literal::Str("Hi".to_string())))))),
        )]));
        let greet = id(
            &mut ids,
            NodeKind::FnDecl {
                name: "greet".to_string(),
                formals: Vec::new(),
                ret_ty: TypeName::String,
                body: Box::new(greet_block),
            },
        );
        let call = id(
            &mut ids,
            NodeKind::Call {
                callee: Box::new(id(&mut ids, NodeKind::Id("greet".to_string()))),
                args: Vec::new(),
            },
        );
        let print_stmt = id(&mut ids, NodeKind::Print(Box::new(call)));
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), vec![print_stmt]);
        let prog = id(&mut ids, NodeKind::Program(vec![greet, main_fn]));

        let asm = generate(&prog);
        assert!(asm.contains("li $v0, 4"), "expected the print-string syscall: {asm}");
    }

    #[test]
    fn relational_comparison_uses_complement_branch_scheme() {
        use crate::ast::BinaryOp;
        let mut ids = NodeIdGen::new();
        let cmp = id(
            &mut ids,
            NodeKind::Binary {
                op: BinaryOp::Less,
                lhs: Box::new(id(&mut ids, NodeKind::Literal(Literal::Int(1)))),
                rhs: Box::new(id(&mut ids, NodeKind::Literal(Literal::Int(2)))),
            },
        );
        let print_stmt = id(&mut ids, NodeKind::Print(Box::new(cmp)));
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), vec![print_stmt]);
        let prog = id(&mut ids, NodeKind::Program(vec![main_fn]));

        let asm = generate(&prog);
        assert!(asm.contains("bge $t0, $t1"));
        assert!(asm.contains("li $t0, 1"));
        assert!(asm.contains("li $t0, 0"));
    }

    /// A bare `p.x;` statement evaluates `p.x` for its value, then
    /// unconditionally pops it (see `ExprStmt`'s codegen arm). Dot-access
    /// itself emits no real computation, but it must still push a
    /// placeholder word so that pop stays balanced against something.
    #[test]
    fn struct_field_access_pushes_a_placeholder_to_stay_stack_balanced() {
        let mut ids = NodeIdGen::new();
        let point_struct = point_struct_decl(&mut ids);
        let p_decl = id(
            &mut ids,
            NodeKind::VarDecl {
                name: "p".to_string(),
                ty: TypeName::Struct("Point".to_string()),
            },
        );
        let read_field = id(
            &mut ids,
            NodeKind::ExprStmt(Box::new(id(
                &mut ids,
                NodeKind::FieldAccess {
                    base: Box::new(id(&mut ids, NodeKind::Id("p".to_string()))),
                    field: "x".to_string(),
                },
            ))),
        );
        let main_fn = fn_decl(&mut ids, "main", Vec::new(), vec![p_decl, read_field]);
        let prog = id(&mut ids, NodeKind::Program(vec![point_struct, main_fn]));

        let asm = generate(&prog);
        assert!(asm.contains("struct field access: codegen no-op"));
        assert!(asm.contains("li $t0, 0"));
        assert!(asm.contains("sw $t0, 0($sp)"), "placeholder must be pushed: {asm}");
    }

    fn point_struct_decl(ids: &mut NodeIdGen) -> Node {
        let x_field = id(
            ids,
            NodeKind::VarDecl {
                name: "x".to_string(),
                ty: TypeName::Int,
            },
        );
        id(
            ids,
            NodeKind::StructDecl {
                name: "Point".to_string(),
                fields: vec![x_field],
            },
        )
    }
}
