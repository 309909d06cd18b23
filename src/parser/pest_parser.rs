use pest::iterators::Pair;
use pest::Parser as _;
use pest_derive::Parser;

use crate::ast::{BinaryOp, Literal, Node, NodeIdGen, NodeKind, Span, TypeName, UnaryOp};

use super::AstParser;

/// Grammar for the language `cflatc`'s core compiles: declarations,
/// structs, functions, the usual statement forms, and a standard
/// precedence-climbing expression grammar. Defined in `grammar.pest`
/// alongside this module, following this stack's "one `.pest` file per
/// concrete parser" convention.
#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
struct Grammar;

/// A concrete `AstParser` built on `pest`. Translates parse tree `Pair`s
/// into the `ast::Node` shape the rest of the pipeline is specified
/// against, assigning a fresh `NodeId` to every node as it is built.
pub struct PestAstParser {
    ids: NodeIdGen,
}

impl AstParser for PestAstParser {
    fn default() -> Self {
        PestAstParser { ids: NodeIdGen::new() }
    }

    fn parse(mut self, source: &str) -> Node {
        let mut pairs = Grammar::parse(Rule::program, source)
            .unwrap_or_else(|error| panic!("Syntax error: {}", error));
        let program_pair = pairs
            .next()
            .expect("grammar always produces exactly one `program` pair");
        self.parse_program(program_pair)
    }
}

fn span_of(pair: &Pair<Rule>) -> Span {
    let (line, col) = pair.as_span().start_pos().line_col();
    Span::new(line, col)
}

impl PestAstParser {
    fn node(&mut self, span: Span, kind: NodeKind) -> Node {
        Node {
            id: self.ids.next(),
            span,
            kind,
        }
    }

    fn parse_program(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut decls = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::struct_decl => decls.push(self.parse_struct_decl(inner)),
                Rule::fn_decl => decls.push(self.parse_fn_decl(inner)),
                Rule::var_decl => decls.push(self.parse_var_decl(inner)),
                Rule::EOI => {}
                other => panic!("Unexpected top-level rule {:?}", other),
            }
        }
        self.node(span, NodeKind::Program(decls))
    }

    fn parse_type_name(&self, pair: Pair<Rule>) -> TypeName {
        match pair.as_rule() {
            Rule::primitive_type => match pair.as_str() {
                "int" => TypeName::Int,
                "bool" => TypeName::Bool,
                "void" => TypeName::Void,
                "string" => TypeName::String,
                other => panic!("Unexpected primitive type spelling {:?}", other),
            },
            Rule::struct_type => {
                let name = pair
                    .into_inner()
                    .next()
                    .expect("struct_type always carries an identifier")
                    .as_str()
                    .to_string();
                TypeName::Struct(name)
            }
            other => panic!("Unexpected type rule {:?}", other),
        }
    }

    fn parse_struct_decl(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let name = inner.next().expect("struct_decl always names itself").as_str().to_string();
        let fields = inner.map(|field| self.parse_var_decl(field)).collect();
        self.node(span, NodeKind::StructDecl { name, fields })
    }

    fn parse_var_decl(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let ty = self.parse_type_name(inner.next().expect("var_decl always has a type"));
        let name = inner.next().expect("var_decl always has a name").as_str().to_string();
        self.node(span, NodeKind::VarDecl { name, ty })
    }

    fn parse_formal(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let ty = self.parse_type_name(inner.next().expect("formal always has a type"));
        let name = inner.next().expect("formal always has a name").as_str().to_string();
        self.node(span, NodeKind::FormalDecl { name, ty })
    }

    fn parse_fn_decl(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let ret_ty = self.parse_type_name(inner.next().expect("fn_decl always has a return type"));
        let name = inner.next().expect("fn_decl always has a name").as_str().to_string();

        let next = inner.next().expect("fn_decl always has formals-or-block next");
        let (formals, block_pair) = if next.as_rule() == Rule::formals {
            let formals = next.into_inner().map(|f| self.parse_formal(f)).collect();
            let block_pair = inner.next().expect("fn_decl has a body after formals");
            (formals, block_pair)
        } else {
            (Vec::new(), next)
        };

        let body = self.parse_block(block_pair);
        self.node(
            span,
            NodeKind::FnDecl {
                name,
                formals,
                ret_ty,
                body: Box::new(body),
            },
        )
    }

    fn parse_block(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let stmts = pair.into_inner().map(|s| self.parse_stmt(s)).collect();
        self.node(span, NodeKind::Block(stmts))
    }

    fn parse_stmt(&mut self, pair: Pair<Rule>) -> Node {
        match pair.as_rule() {
            Rule::var_decl => self.parse_var_decl(pair),
            Rule::if_stmt => self.parse_if_stmt(pair),
            Rule::while_stmt => self.parse_while_stmt(pair),
            Rule::repeat_stmt => self.parse_repeat_stmt(pair),
            Rule::return_stmt => self.parse_return_stmt(pair),
            Rule::print_stmt => self.parse_print_stmt(pair),
            Rule::read_stmt => self.parse_read_stmt(pair),
            Rule::incr_stmt => self.parse_incr_stmt(pair),
            Rule::decr_stmt => self.parse_decr_stmt(pair),
            Rule::block => self.parse_block(pair),
            Rule::expr_stmt => self.parse_expr_stmt(pair),
            other => panic!("Unexpected statement rule {:?}", other),
        }
    }

    fn parse_if_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let cond = self.parse_expr(inner.next().expect("if_stmt always has a condition"));
        let then_branch = self.parse_block(inner.next().expect("if_stmt always has a then-block"));
        let else_branch = inner.next().map(|p| Box::new(self.parse_block(p)));
        self.node(
            span,
            NodeKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch,
            },
        )
    }

    fn parse_while_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let cond = self.parse_expr(inner.next().expect("while_stmt always has a condition"));
        let body = self.parse_block(inner.next().expect("while_stmt always has a body"));
        self.node(
            span,
            NodeKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
        )
    }

    fn parse_repeat_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let count = self.parse_expr(inner.next().expect("repeat_stmt always has a count"));
        let body = self.parse_block(inner.next().expect("repeat_stmt always has a body"));
        self.node(
            span,
            NodeKind::Repeat {
                count: Box::new(count),
                body: Box::new(body),
            },
        )
    }

    fn parse_return_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let value = pair.into_inner().next().map(|p| Box::new(self.parse_expr(p)));
        self.node(span, NodeKind::Return(value))
    }

    fn parse_print_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let e = self.parse_expr(pair.into_inner().next().expect("cout always has an operand"));
        self.node(span, NodeKind::Print(Box::new(e)))
    }

    fn parse_read_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let e = self.parse_expr(pair.into_inner().next().expect("cin always has an operand"));
        self.node(span, NodeKind::Read(Box::new(e)))
    }

    fn parse_incr_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let e = self.parse_expr(pair.into_inner().next().expect("x++ always has a target"));
        self.node(span, NodeKind::Incr(Box::new(e)))
    }

    fn parse_decr_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let e = self.parse_expr(pair.into_inner().next().expect("x-- always has a target"));
        self.node(span, NodeKind::Decr(Box::new(e)))
    }

    fn parse_expr_stmt(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let e = self.parse_expr(pair.into_inner().next().expect("expr_stmt always wraps an expr"));
        self.node(span, NodeKind::ExprStmt(Box::new(e)))
    }

    /// Dispatches every expression-grammar rule, including the precedence
    /// chain (`logic_or` down through `unary`) and the terminal literal /
    /// identifier rules. Mirrors this stack's convention of one big
    /// rule-to-node dispatcher rather than a function per terminal.
    fn parse_expr(&mut self, pair: Pair<Rule>) -> Node {
        match pair.as_rule() {
            Rule::expr => self.parse_expr(pair.into_inner().next().expect("expr always wraps one child")),
            Rule::assignment => self.parse_assignment(pair),
            Rule::logic_or => self.parse_left_fold(pair, BinaryOp::Or),
            Rule::logic_and => self.parse_left_fold(pair, BinaryOp::And),
            Rule::equality => self.parse_op_chain(pair, equality_op),
            Rule::relational => self.parse_op_chain(pair, relational_op),
            Rule::additive => self.parse_op_chain(pair, additive_op),
            Rule::multiplicative => self.parse_op_chain(pair, multiplicative_op),
            Rule::unary => self.parse_unary(pair),
            Rule::postfix => self.parse_postfix(pair),
            Rule::int_literal => {
                let span = span_of(&pair);
                let value: i64 = pair
                    .as_str()
                    .parse()
                    .unwrap_or_else(|_| panic!("invalid integer literal {:?}", pair.as_str()));
                self.node(span, NodeKind::Literal(Literal::Int(value)))
            }
            Rule::bool_literal => {
                let span = span_of(&pair);
                self.node(span, NodeKind::Literal(Literal::Bool(pair.as_str() == "true")))
            }
            Rule::string_literal => {
                let span = span_of(&pair);
                let text = pair
                    .into_inner()
                    .next()
                    .expect("string_literal always has string_inner")
                    .as_str()
                    .to_string();
                self.node(span, NodeKind::Literal(Literal::Str(text)))
            }
            Rule::identifier => {
                let span = span_of(&pair);
                self.node(span, NodeKind::Id(pair.as_str().to_string()))
            }
            other => panic!("Unexpected expression rule {:?}", other),
        }
    }

    fn parse_assignment(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let target = self.parse_expr(inner.next().expect("assignment always has a left side"));
        match inner.next() {
            Some(value_pair) => {
                let value = self.parse_expr(value_pair);
                self.node(
                    span,
                    NodeKind::Assign {
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                )
            }
            None => target,
        }
    }

    /// `logic_or`/`logic_and` only ever chain a single implicit operator, so
    /// every operand pair folds left with the same `op`.
    fn parse_left_fold(&mut self, pair: Pair<Rule>, op: BinaryOp) -> Node {
        let span = span_of(&pair);
        let mut operands = pair.into_inner();
        let mut result = self.parse_expr(operands.next().expect("binary chain always has a first operand"));
        for next in operands {
            let rhs = self.parse_expr(next);
            result = self.node(
                span,
                NodeKind::Binary {
                    op,
                    lhs: Box::new(result),
                    rhs: Box::new(rhs),
                },
            );
        }
        result
    }

    /// `equality`/`relational`/`additive`/`multiplicative` interleave
    /// operand and explicit operator-token pairs; `op_of` maps the
    /// operator's literal text to a `BinaryOp`.
    fn parse_op_chain(&mut self, pair: Pair<Rule>, op_of: fn(&str) -> BinaryOp) -> Node {
        let span = span_of(&pair);
        let mut parts = pair.into_inner();
        let mut result = self.parse_expr(parts.next().expect("binary chain always has a first operand"));
        while let Some(op_pair) = parts.next() {
            let op = op_of(op_pair.as_str());
            let rhs_pair = parts.next().expect("a binary operator is always followed by an operand");
            let rhs = self.parse_expr(rhs_pair);
            result = self.node(
                span,
                NodeKind::Binary {
                    op,
                    lhs: Box::new(result),
                    rhs: Box::new(rhs),
                },
            );
        }
        result
    }

    fn parse_unary(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let first = inner.next().expect("unary always has at least one child");
        if first.as_rule() == Rule::unary_op {
            let op = match first.as_str() {
                "!" => UnaryOp::Not,
                "-" => UnaryOp::Negate,
                other => panic!("Unexpected unary operator {:?}", other),
            };
            let operand = self.parse_expr(inner.next().expect("unary_op is always followed by an operand"));
            self.node(
                span,
                NodeKind::Unary {
                    op,
                    expr: Box::new(operand),
                },
            )
        } else {
            self.parse_expr(first)
        }
    }

    fn parse_postfix(&mut self, pair: Pair<Rule>) -> Node {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let mut result = self.parse_expr(inner.next().expect("postfix always has a primary"));
        for tail in inner {
            match tail.as_rule() {
                Rule::field_access => {
                    let field = tail
                        .into_inner()
                        .next()
                        .expect("field_access always names a field")
                        .as_str()
                        .to_string();
                    result = self.node(
                        span,
                        NodeKind::FieldAccess {
                            base: Box::new(result),
                            field,
                        },
                    );
                }
                Rule::call_args => {
                    let args = match tail.into_inner().next() {
                        Some(args_pair) => args_pair.into_inner().map(|a| self.parse_expr(a)).collect(),
                        None => Vec::new(),
                    };
                    result = self.node(
                        span,
                        NodeKind::Call {
                            callee: Box::new(result),
                            args,
                        },
                    );
                }
                other => panic!("Unexpected postfix tail rule {:?}", other),
            }
        }
        result
    }
}

fn equality_op(text: &str) -> BinaryOp {
    match text {
        "==" => BinaryOp::Equal,
        "!=" => BinaryOp::NotEqual,
        other => panic!("Unexpected equality operator {:?}", other),
    }
}

fn relational_op(text: &str) -> BinaryOp {
    match text {
        "<" => BinaryOp::Less,
        "<=" => BinaryOp::LessEqual,
        ">" => BinaryOp::Greater,
        ">=" => BinaryOp::GreaterEqual,
        other => panic!("Unexpected relational operator {:?}", other),
    }
}

fn additive_op(text: &str) -> BinaryOp {
    match text {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        other => panic!("Unexpected additive operator {:?}", other),
    }
}

fn multiplicative_op(text: &str) -> BinaryOp {
    match text {
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        other => panic!("Unexpected multiplicative operator {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_level_decls(source: &str) -> Vec<Node> {
        let program = PestAstParser::default().parse(source);
        match program.kind {
            NodeKind::Program(decls) => decls,
            other => panic!("expected Program, got {:?}", other),
        }
    }

    #[test]
    fn parses_empty_main() {
        let decls = top_level_decls("void main() {}");
        assert_eq!(decls.len(), 1);
        match &decls[0].kind {
            NodeKind::FnDecl { name, formals, ret_ty, body } => {
                assert_eq!(name, "main");
                assert!(formals.is_empty());
                assert_eq!(*ret_ty, TypeName::Void);
                match &body.kind {
                    NodeKind::Block(stmts) => assert!(stmts.is_empty()),
                    other => panic!("expected Block, got {:?}", other),
                }
            }
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn parses_formals_and_struct_decls() {
        let decls = top_level_decls("struct Point { int x; int y; }\nint sum(struct Point p) { return 0; }");
        assert_eq!(decls.len(), 2);
        match &decls[0].kind {
            NodeKind::StructDecl { name, fields } => {
                assert_eq!(name, "Point");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected StructDecl, got {:?}", other),
        }
        match &decls[1].kind {
            NodeKind::FnDecl { formals, .. } => {
                assert_eq!(formals.len(), 1);
                match &formals[0].kind {
                    NodeKind::FormalDecl { name, ty } => {
                        assert_eq!(name, "p");
                        assert_eq!(*ty, TypeName::Struct("Point".to_string()));
                    }
                    other => panic!("expected FormalDecl, got {:?}", other),
                }
            }
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    /// Exercises precedence and associativity together: `*`/`/` bind tighter
    /// than `+`/`-`, and the chain folds left-to-right.
    #[test]
    fn arithmetic_expression_respects_precedence() {
        let decls = top_level_decls("int main() { int x; x = 2 * 3 + 4; return 0; }");
        let body = match &decls[0].kind {
            NodeKind::FnDecl { body, .. } => body,
            other => panic!("expected FnDecl, got {:?}", other),
        };
        let stmts = match &body.kind {
            NodeKind::Block(stmts) => stmts,
            other => panic!("expected Block, got {:?}", other),
        };
        let assign_expr = match &stmts[1].kind {
            NodeKind::ExprStmt(e) => e,
            other => panic!("expected ExprStmt, got {:?}", other),
        };
        let (target, value) = match &assign_expr.kind {
            NodeKind::Assign { target, value } => (target, value),
            other => panic!("expected Assign, got {:?}", other),
        };
        assert_eq!(target.identifier_name(), Some("x"));
        // `2 * 3 + 4` parses as `(2 * 3) + 4`: the outermost node is `+`.
        match &value.kind {
            NodeKind::Binary { op: BinaryOp::Add, lhs, rhs } => {
                assert!(matches!(lhs.kind, NodeKind::Binary { op: BinaryOp::Mul, .. }));
                assert!(matches!(rhs.kind, NodeKind::Literal(Literal::Int(4))));
            }
            other => panic!("expected a top-level Add node, got {:?}", other),
        }
    }

    #[test]
    fn postfix_chains_field_access_and_call() {
        let decls = top_level_decls("int main() { return f(1, 2).x; }");
        let body = match &decls[0].kind {
            NodeKind::FnDecl { body, .. } => body,
            other => panic!("expected FnDecl, got {:?}", other),
        };
        let ret_expr = match &body.kind {
            NodeKind::Block(stmts) => match &stmts[0].kind {
                NodeKind::Return(Some(e)) => e,
                other => panic!("expected Return(Some), got {:?}", other),
            },
            other => panic!("expected Block, got {:?}", other),
        };
        match &ret_expr.kind {
            NodeKind::FieldAccess { base, field } => {
                assert_eq!(field, "x");
                match &base.kind {
                    NodeKind::Call { callee, args } => {
                        assert_eq!(callee.identifier_name(), Some("f"));
                        assert_eq!(args.len(), 2);
                    }
                    other => panic!("expected Call, got {:?}", other),
                }
            }
            other => panic!("expected FieldAccess, got {:?}", other),
        }
    }

    #[test]
    fn cout_and_cin_parse_to_print_and_read() {
        let decls = top_level_decls("void main() { int x; cin >> x; cout << x; }");
        let body = match &decls[0].kind {
            NodeKind::FnDecl { body, .. } => body,
            other => panic!("expected FnDecl, got {:?}", other),
        };
        match &body.kind {
            NodeKind::Block(stmts) => {
                assert!(matches!(stmts[1].kind, NodeKind::Read(_)));
                assert!(matches!(stmts[2].kind, NodeKind::Print(_)));
            }
            other => panic!("expected Block, got {:?}", other),
        }
    }

    #[test]
    #[should_panic(expected = "Syntax error")]
    fn malformed_source_panics() {
        PestAstParser::default().parse("int main( {");
    }
}
