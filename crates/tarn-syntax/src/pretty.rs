//! Pretty printer for the Tarn AST.
//!
//! Grammar-producible nodes print back to parseable surface syntax.
//! Internal nodes (integer literals, `new`, `distinct`, conditionals,
//! lets) print in a readable call-like notation for diagnostics.

use crate::ast::*;

/// Pretty print a program to a string.
pub fn pretty_print(program: &Program) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_program(program);
    printer.output
}

/// Pretty print an expression to a string.
pub fn pretty_print_expr(expr: &Expr) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_expr(expr, 0);
    printer.output
}

// Binding powers used for parenthesization, mirroring the parser's
// ladder: quantifier body < iff < implies < or < and < eq < not < atom.
const PREC_QUANT: u8 = 0;
const PREC_IFF: u8 = 1;
const PREC_IMPLIES: u8 = 2;
const PREC_OR: u8 = 3;
const PREC_AND: u8 = 4;
const PREC_EQ: u8 = 5;
const PREC_NOT: u8 = 6;
const PREC_ATOM: u8 = 7;

struct PrettyPrinter {
    output: String,
    indent: usize,
}

impl PrettyPrinter {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn writeln(&mut self, s: &str) {
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
    }

    fn print_program(&mut self, program: &Program) {
        for (i, decl) in program.decls.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.print_decl(decl);
        }
    }

    fn print_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Sort(d) => {
                self.write("sort ");
                self.writeln(&d.name.name);
            }
            Decl::Relation(d) => self.print_relation_decl(d),
            Decl::Constant(d) => {
                self.write(mutability(d.mutable));
                self.write(" constant ");
                self.write(&d.name.name);
                self.write(": ");
                self.writeln(&d.sort.name);
            }
            Decl::Function(d) => {
                self.write(mutability(d.mutable));
                self.write(" function ");
                self.write(&d.name.name);
                self.write("(");
                self.print_sort_list(&d.arity);
                self.write("): ");
                self.writeln(&d.sort.name);
            }
            Decl::Axiom(d) => {
                self.write("axiom ");
                self.print_opt_name(&d.name);
                self.print_expr(&d.expr, 0);
                self.newline();
            }
            Decl::Init(d) => {
                self.write("init ");
                self.print_opt_name(&d.name);
                self.print_expr(&d.expr, 0);
                self.newline();
            }
            Decl::Invariant(d) => {
                self.print_invariant_decl(d);
                self.newline();
            }
            Decl::Transition(d) => self.print_transition_decl(d),
            Decl::Theorem(d) => {
                if d.is_twostate {
                    self.write("twostate ");
                }
                self.write("theorem ");
                self.print_opt_name(&d.name);
                self.print_expr(&d.expr, 0);
                self.newline();
            }
            Decl::Automaton(d) => self.print_automaton_decl(d),
        }
    }

    fn print_relation_decl(&mut self, decl: &RelationDecl) {
        if decl.is_derived() {
            self.write("derived relation ");
        } else {
            self.write(mutability(decl.mutable));
            self.write(" relation ");
        }
        self.write(&decl.name.name);
        if !decl.arity.is_empty() {
            self.write("(");
            self.print_sort_list(&decl.arity);
            self.write(")");
        }
        if let Some(derived) = &decl.derived {
            self.write(": ");
            self.print_expr(derived, 0);
        }
        self.newline();
    }

    fn print_invariant_decl(&mut self, decl: &InvariantDecl) {
        if decl.is_safety {
            self.write("safety ");
        } else if decl.is_sketch {
            self.write("sketch invariant ");
        } else {
            self.write("invariant ");
        }
        self.print_opt_name(&decl.name);
        self.print_expr(&decl.expr, 0);
    }

    fn print_transition_decl(&mut self, decl: &TransitionDecl) {
        self.write("transition ");
        self.write(&decl.name.name);
        self.write("(");
        self.print_sorted_vars(&decl.params);
        self.write(")");

        match &decl.body {
            TransitionBody::Relation { mods, expr } => {
                self.newline();
                self.indent += 1;
                self.write_indent();
                self.write("modifies ");
                for (i, m) in mods.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(&m.name.name);
                }
                self.newline();
                self.write_indent();
                self.print_expr(expr, 0);
                self.newline();
                self.indent -= 1;
            }
            TransitionBody::Block(block) => {
                self.writeln(" {");
                self.indent += 1;
                for stmt in &block.stmts {
                    self.write_indent();
                    self.print_stmt(stmt);
                }
                self.indent -= 1;
                self.write_indent();
                self.writeln("}");
            }
        }
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assume(s) => {
                self.write("assume ");
                self.print_expr(&s.expr, 0);
                self.writeln(";");
            }
            Stmt::Assign(s) => {
                self.write(&s.target.name);
                if !s.args.is_empty() {
                    self.write("(");
                    self.print_expr_list(&s.args);
                    self.write(")");
                }
                self.write(" := ");
                self.print_expr(&s.value, 0);
                self.writeln(";");
            }
        }
    }

    fn print_automaton_decl(&mut self, decl: &AutomatonDecl) {
        self.writeln("automaton {");
        self.indent += 1;
        for component in &decl.components {
            self.write_indent();
            match component {
                AutomatonComponent::Global(g) => {
                    self.writeln("global");
                    self.print_phase_components(&g.components);
                }
                AutomatonComponent::InitPhase(i) => {
                    self.write("init phase ");
                    self.writeln(&i.phase.name);
                }
                AutomatonComponent::Phase(p) => {
                    self.write("phase ");
                    self.writeln(&p.name.name);
                    self.print_phase_components(&p.components);
                }
            }
        }
        self.indent -= 1;
        self.write_indent();
        self.writeln("}");
    }

    fn print_phase_components(&mut self, components: &[PhaseComponent]) {
        self.indent += 1;
        for component in components {
            self.write_indent();
            match component {
                PhaseComponent::Transition(t) => {
                    self.write("transition ");
                    self.write(&t.transition.name);
                    self.write(" -> ");
                    match &t.target {
                        Some(phase) => {
                            self.write("phase ");
                            self.write(&phase.name);
                        }
                        None => self.write("self"),
                    }
                    if let Some(guard) = &t.guard {
                        self.write(" assume ");
                        self.print_expr(guard, 0);
                    }
                    self.newline();
                }
                PhaseComponent::Invariant(i) => {
                    self.print_invariant_decl(i);
                    self.newline();
                }
            }
        }
        self.indent -= 1;
    }

    fn print_sort_list(&mut self, sorts: &[SortRef]) {
        for (i, sort) in sorts.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&sort.name);
        }
    }

    fn print_opt_name(&mut self, name: &Option<String>) {
        if let Some(name) = name {
            self.write("[");
            self.write(name);
            self.write("] ");
        }
    }

    fn print_sorted_vars(&mut self, vars: &[SortedVar]) {
        for (i, var) in vars.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&var.name.name);
            if let Some(sort) = &var.sort {
                self.write(": ");
                self.write(&sort.name);
            }
        }
    }

    fn print_expr_list(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_expr(expr, 0);
        }
    }

    fn print_expr(&mut self, expr: &Expr, min_prec: u8) {
        let prec = Self::expr_prec(expr);
        let parens = prec < min_prec;
        if parens {
            self.write("(");
        }
        match &expr.kind {
            ExprKind::Bool(true) => self.write("true"),
            ExprKind::Bool(false) => self.write("false"),
            ExprKind::Int(n) => self.write(&n.to_string()),
            ExprKind::Id(name) => self.write(name),
            ExprKind::Unary { op, arg } => match op {
                UnaryOp::Not => {
                    self.write("!");
                    self.print_expr(arg, PREC_NOT);
                }
                UnaryOp::New => {
                    self.write("new(");
                    self.print_expr(arg, 0);
                    self.write(")");
                }
                UnaryOp::Old => {
                    self.write("old(");
                    self.print_expr(arg, 0);
                    self.write(")");
                }
            },
            ExprKind::Binary { op, lhs, rhs } => {
                let (text, lp, rp) = match op {
                    BinOp::Implies => ("->", PREC_OR, PREC_IMPLIES),
                    BinOp::Iff => ("<->", PREC_IMPLIES, PREC_IMPLIES),
                    BinOp::Equal => ("=", PREC_NOT, PREC_NOT),
                    BinOp::NotEq => ("!=", PREC_NOT, PREC_NOT),
                    BinOp::Ge => (">=", PREC_NOT, PREC_NOT),
                    BinOp::Gt => (">", PREC_NOT, PREC_NOT),
                    BinOp::Le => ("<=", PREC_NOT, PREC_NOT),
                    BinOp::Lt => ("<", PREC_NOT, PREC_NOT),
                    BinOp::Add => ("+", PREC_NOT, PREC_NOT),
                    BinOp::Sub => ("-", PREC_NOT, PREC_NOT),
                };
                self.print_expr(lhs, lp);
                self.write(" ");
                self.write(text);
                self.write(" ");
                self.print_expr(rhs, rp);
            }
            ExprKind::Nary { op, args } => match op {
                NaryOp::And => self.print_nary(args, "&", PREC_EQ),
                NaryOp::Or => self.print_nary(args, "|", PREC_AND),
                NaryOp::Distinct => {
                    self.write("distinct(");
                    self.print_expr_list(args);
                    self.write(")");
                }
            },
            ExprKind::App { callee, args } => {
                self.write(&callee.name);
                self.write("(");
                self.print_expr_list(args);
                self.write(")");
            }
            ExprKind::Quantifier {
                quant,
                binder,
                body,
            } => {
                self.write(match quant {
                    Quant::Forall => "forall ",
                    Quant::Exists => "exists ",
                });
                self.print_sorted_vars(&binder.vars);
                self.write(" . ");
                self.print_expr(body, PREC_QUANT);
            }
            ExprKind::Ite { cond, then, els } => {
                self.write("ite(");
                self.print_expr(cond, 0);
                self.write(", ");
                self.print_expr(then, 0);
                self.write(", ");
                self.print_expr(els, 0);
                self.write(")");
            }
            ExprKind::Let { var, val, body } => {
                self.write("let ");
                self.write(&var.name.name);
                self.write(" = ");
                self.print_expr(val, PREC_EQ);
                self.write(" in ");
                self.print_expr(body, PREC_QUANT);
            }
        }
        if parens {
            self.write(")");
        }
    }

    fn print_nary(&mut self, args: &[Expr], op: &str, operand_prec: u8) {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(" ");
                self.write(op);
                self.write(" ");
            }
            self.print_expr(arg, operand_prec);
        }
    }

    fn expr_prec(expr: &Expr) -> u8 {
        match &expr.kind {
            ExprKind::Quantifier { .. } | ExprKind::Let { .. } => PREC_QUANT,
            ExprKind::Binary { op, .. } => match op {
                BinOp::Iff => PREC_IFF,
                BinOp::Implies => PREC_IMPLIES,
                _ => PREC_EQ,
            },
            ExprKind::Nary { op, .. } => match op {
                NaryOp::And => PREC_AND,
                NaryOp::Or => PREC_OR,
                // Call-like notation never needs parens.
                NaryOp::Distinct => PREC_ATOM,
            },
            ExprKind::Unary { op, .. } => match op {
                UnaryOp::Not => PREC_NOT,
                UnaryOp::New | UnaryOp::Old => PREC_ATOM,
            },
            ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Id(_)
            | ExprKind::App { .. }
            | ExprKind::Ite { .. } => PREC_ATOM,
        }
    }
}

fn mutability(mutable: bool) -> &'static str {
    if mutable {
        "mutable"
    } else {
        "immutable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_expression};

    fn roundtrip_expr(source: &str) -> String {
        pretty_print_expr(&parse_expression(source).unwrap())
    }

    #[test]
    fn test_print_simple_exprs() {
        assert_eq!(roundtrip_expr("a & b & c"), "a & b & c");
        assert_eq!(roundtrip_expr("a | b & c"), "a | b & c");
        assert_eq!(roundtrip_expr("(a | b) & c"), "(a | b) & c");
        assert_eq!(roundtrip_expr("!a -> b = c"), "!a -> b = c");
        assert_eq!(roundtrip_expr("old(r(x)) & r(x)"), "old(r(x)) & r(x)");
    }

    #[test]
    fn test_print_quantifier_scope() {
        assert_eq!(
            roundtrip_expr("forall x: T, y . p(x) & q(y)"),
            "forall x: T, y . p(x) & q(y)"
        );
        // A quantifier inside a tighter context keeps its parens.
        assert_eq!(
            roundtrip_expr("(forall x: T . p(x)) & q"),
            "(forall x: T . p(x)) & q"
        );
    }

    #[test]
    fn test_print_implies_associativity() {
        assert_eq!(roundtrip_expr("a -> b -> c"), "a -> b -> c");
        assert_eq!(roundtrip_expr("(a -> b) -> c"), "(a -> b) -> c");
    }

    #[test]
    fn test_program_reparses() {
        let source = "sort node\n\
             mutable relation lock\n\
             mutable relation holds(node)\n\
             immutable constant root: node\n\
             axiom [ax] forall x: node . x = x\n\
             init !lock\n\
             safety [mutex] forall x: node, y: node . holds(x) & holds(y) -> x = y\n\
             transition grant(n: node)\n\
                 modifies lock, holds\n\
                 old(!lock) & lock & holds(n)\n\
             transition noop() {\n\
                 assume lock;\n\
             }\n\
             twostate theorem [frame] old(lock) -> lock\n\
             automaton {\n\
                 global\n\
                     safety forall x: node . holds(x) -> lock\n\
                 init phase idle\n\
                 phase idle\n\
                     transition grant -> phase held assume !lock\n\
                 phase held\n\
                     transition noop -> self\n\
             }";
        let prog = parse(source).unwrap();
        let printed = pretty_print(&prog);
        let reparsed = parse(&printed).expect("pretty output must reparse");
        assert_eq!(prog.decls.len(), reparsed.decls.len());
        // Printing is a fixpoint after one round.
        assert_eq!(pretty_print(&reparsed), printed);
    }
}
