//! Sorts, symbols, and terms of the emitted first-order formulas.
//!
//! Symbols are reference-counted: the translator's memoization hands
//! out clones of one underlying allocation per (declaration, state key)
//! pair, so `Symbol::ptr_eq` witnesses "the same symbol" and a cheap
//! clone never produces a syntactically distinct symbol.

use std::fmt;
use std::rc::Rc;

/// A sort: one of the two built-ins, or a named uninterpreted sort.
/// Uninterpreted sorts are identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sort {
    Bool,
    Int,
    Uninterpreted(String),
}

impl Sort {
    pub fn uninterpreted(name: impl Into<String>) -> Self {
        Sort::Uninterpreted(name.into())
    }

    /// The sort's name as written in a program.
    pub fn name(&self) -> &str {
        match self {
            Sort::Bool => "bool",
            Sort::Int => "int",
            Sort::Uninterpreted(name) => name,
        }
    }

    pub fn is_uninterpreted(&self) -> bool {
        matches!(self, Sort::Uninterpreted(_))
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
struct SymbolData {
    name: String,
    args: Vec<Sort>,
    sort: Sort,
}

/// A declared constant or function symbol. Cloning is cheap and
/// preserves identity.
#[derive(Debug, Clone)]
pub struct Symbol(Rc<SymbolData>);

impl Symbol {
    /// Declare a zero-arity symbol.
    pub fn constant(name: impl Into<String>, sort: Sort) -> Self {
        Self(Rc::new(SymbolData {
            name: name.into(),
            args: Vec::new(),
            sort,
        }))
    }

    /// Declare a function symbol with the given argument sorts.
    pub fn function(name: impl Into<String>, args: Vec<Sort>, sort: Sort) -> Self {
        Self(Rc::new(SymbolData {
            name: name.into(),
            args,
            sort,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn args(&self) -> &[Sort] {
        &self.0.args
    }

    pub fn sort(&self) -> &Sort {
        &self.0.sort
    }

    pub fn arity(&self) -> usize {
        self.0.args.len()
    }

    /// Whether two symbols are the same underlying declaration, not
    /// merely equal by name and signature.
    pub fn ptr_eq(a: &Symbol, b: &Symbol) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name && self.0.args == other.0.args && self.0.sort == other.0.sort
    }
}

impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A first-order term. Structurally shared and immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Term(Rc<TermKind>);

/// The kind of term.
#[derive(Debug, PartialEq)]
pub enum TermKind {
    BoolLit(bool),
    IntLit(i64),
    /// Occurrence of a zero-arity symbol (declared constant or bound
    /// variable).
    Const(Symbol),
    /// Application of a function symbol.
    App(Symbol, Vec<Term>),
    Not(Term),
    Implies(Term, Term),
    Iff(Term, Term),
    Eq(Term, Term),
    Distinct(Vec<Term>),
    And(Vec<Term>),
    Or(Vec<Term>),
    Le(Term, Term),
    Lt(Term, Term),
    Ge(Term, Term),
    Gt(Term, Term),
    Add(Term, Term),
    Sub(Term, Term),
    Ite(Term, Term, Term),
    Forall(Vec<Symbol>, Term),
    Exists(Vec<Symbol>, Term),
}

impl Term {
    fn new(kind: TermKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn kind(&self) -> &TermKind {
        &self.0
    }

    // === Constructors ===

    pub fn bool_lit(val: bool) -> Self {
        Self::new(TermKind::BoolLit(val))
    }

    pub fn int_lit(val: i64) -> Self {
        Self::new(TermKind::IntLit(val))
    }

    /// Occurrence of a zero-arity symbol.
    pub fn constant(symbol: Symbol) -> Self {
        Self::new(TermKind::Const(symbol))
    }

    pub fn app(symbol: Symbol, args: Vec<Term>) -> Self {
        Self::new(TermKind::App(symbol, args))
    }

    pub fn not(arg: Term) -> Self {
        Self::new(TermKind::Not(arg))
    }

    pub fn implies(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Implies(lhs, rhs))
    }

    pub fn iff(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Iff(lhs, rhs))
    }

    pub fn eq(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Eq(lhs, rhs))
    }

    pub fn neq(lhs: Term, rhs: Term) -> Self {
        Self::not(Self::eq(lhs, rhs))
    }

    pub fn distinct(args: Vec<Term>) -> Self {
        Self::new(TermKind::Distinct(args))
    }

    pub fn and(args: Vec<Term>) -> Self {
        Self::new(TermKind::And(args))
    }

    pub fn or(args: Vec<Term>) -> Self {
        Self::new(TermKind::Or(args))
    }

    pub fn le(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Le(lhs, rhs))
    }

    pub fn lt(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Lt(lhs, rhs))
    }

    pub fn ge(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Ge(lhs, rhs))
    }

    pub fn gt(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Gt(lhs, rhs))
    }

    pub fn add(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Add(lhs, rhs))
    }

    pub fn sub(lhs: Term, rhs: Term) -> Self {
        Self::new(TermKind::Sub(lhs, rhs))
    }

    pub fn ite(cond: Term, then: Term, els: Term) -> Self {
        Self::new(TermKind::Ite(cond, then, els))
    }

    pub fn forall(vars: Vec<Symbol>, body: Term) -> Self {
        Self::new(TermKind::Forall(vars, body))
    }

    pub fn exists(vars: Vec<Symbol>, body: Term) -> Self {
        Self::new(TermKind::Exists(vars, body))
    }
}

impl fmt::Display for Term {
    /// S-expression rendering in the style the external engine consumes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TermKind::BoolLit(b) => write!(f, "{}", b),
            TermKind::IntLit(n) => write!(f, "{}", n),
            TermKind::Const(sym) => write!(f, "{}", sym),
            TermKind::App(sym, args) => write_sexpr(f, sym.name(), args),
            TermKind::Not(a) => write!(f, "(not {})", a),
            TermKind::Implies(a, b) => write!(f, "(=> {} {})", a, b),
            TermKind::Iff(a, b) => write!(f, "(= {} {})", a, b),
            TermKind::Eq(a, b) => write!(f, "(= {} {})", a, b),
            TermKind::Distinct(args) => write_sexpr(f, "distinct", args),
            TermKind::And(args) => write_sexpr(f, "and", args),
            TermKind::Or(args) => write_sexpr(f, "or", args),
            TermKind::Le(a, b) => write!(f, "(<= {} {})", a, b),
            TermKind::Lt(a, b) => write!(f, "(< {} {})", a, b),
            TermKind::Ge(a, b) => write!(f, "(>= {} {})", a, b),
            TermKind::Gt(a, b) => write!(f, "(> {} {})", a, b),
            TermKind::Add(a, b) => write!(f, "(+ {} {})", a, b),
            TermKind::Sub(a, b) => write!(f, "(- {} {})", a, b),
            TermKind::Ite(c, t, e) => write!(f, "(ite {} {} {})", c, t, e),
            TermKind::Forall(vars, body) => write_quantifier(f, "forall", vars, body),
            TermKind::Exists(vars, body) => write_quantifier(f, "exists", vars, body),
        }
    }
}

fn write_sexpr(f: &mut fmt::Formatter<'_>, head: &str, args: &[Term]) -> fmt::Result {
    write!(f, "({}", head)?;
    for arg in args {
        write!(f, " {}", arg)?;
    }
    write!(f, ")")
}

fn write_quantifier(
    f: &mut fmt::Formatter<'_>,
    head: &str,
    vars: &[Symbol],
    body: &Term,
) -> fmt::Result {
    write!(f, "({} (", head)?;
    for (i, var) in vars.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "({} {})", var.name(), var.sort())?;
    }
    write!(f, ") {})", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_identity_vs_equality() {
        let a = Symbol::constant("x", Sort::Bool);
        let b = a.clone();
        let c = Symbol::constant("x", Sort::Bool);
        assert!(Symbol::ptr_eq(&a, &b));
        assert!(!Symbol::ptr_eq(&a, &c));
        assert_eq!(a, c);
    }

    #[test]
    fn test_sort_names() {
        assert_eq!(Sort::Bool.name(), "bool");
        assert_eq!(Sort::Int.name(), "int");
        assert_eq!(Sort::uninterpreted("node").name(), "node");
        assert!(Sort::uninterpreted("node").is_uninterpreted());
        assert!(!Sort::Int.is_uninterpreted());
    }

    #[test]
    fn test_display() {
        let node = Sort::uninterpreted("node");
        let x = Symbol::constant("x", node.clone());
        let r = Symbol::function("r", vec![node.clone()], Sort::Bool);
        let t = Term::forall(
            vec![x.clone()],
            Term::app(r, vec![Term::constant(x)]),
        );
        assert_eq!(t.to_string(), "(forall ((x node)) (r x))");
    }

    #[test]
    fn test_neq_is_negated_eq() {
        let a = Term::int_lit(1);
        let b = Term::int_lit(2);
        let t = Term::neq(a, b);
        assert!(matches!(t.kind(), TermKind::Not(_)));
    }
}
