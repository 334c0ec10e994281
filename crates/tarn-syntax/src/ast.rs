//! Abstract syntax tree for the Tarn specification language.
//!
//! The tree is shape-immutable after parsing. The only post-parse
//! mutation is the resolver filling in omitted bound-variable sorts.

use crate::token::Span;

/// A parsed program: an ordered sequence of top-level declarations.
#[derive(Debug, Clone)]
pub struct Program {
    /// Declarations in source order.
    pub decls: Vec<Decl>,
}

impl Program {
    pub fn new(decls: Vec<Decl>) -> Self {
        Self { decls }
    }

    pub fn sorts(&self) -> impl Iterator<Item = &SortDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Sort(s) => Some(s),
            _ => None,
        })
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Relation(r) => Some(r),
            _ => None,
        })
    }

    /// Relations defined by a formula rather than stored state.
    pub fn derived_relations(&self) -> impl Iterator<Item = &RelationDecl> {
        self.relations().filter(|r| r.is_derived())
    }

    pub fn constants(&self) -> impl Iterator<Item = &ConstantDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Constant(c) => Some(c),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn axioms(&self) -> impl Iterator<Item = &AxiomDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Axiom(a) => Some(a),
            _ => None,
        })
    }

    pub fn inits(&self) -> impl Iterator<Item = &InitDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Init(i) => Some(i),
            _ => None,
        })
    }

    pub fn invariants(&self) -> impl Iterator<Item = &InvariantDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Invariant(i) => Some(i),
            _ => None,
        })
    }

    pub fn transitions(&self) -> impl Iterator<Item = &TransitionDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Transition(t) => Some(t),
            _ => None,
        })
    }

    pub fn theorems(&self) -> impl Iterator<Item = &TheoremDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Theorem(t) => Some(t),
            _ => None,
        })
    }

    pub fn automata(&self) -> impl Iterator<Item = &AutomatonDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Automaton(a) => Some(a),
            _ => None,
        })
    }
}

/// An identifier with its source span.
#[derive(Debug, Clone)]
pub struct Ident {
    /// The identifier name.
    pub name: String,
    /// Source span.
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A reference to a sort by name. `bool` and `int` name the built-in
/// sorts; every other name must match a `sort` declaration.
#[derive(Debug, Clone)]
pub struct SortRef {
    pub name: String,
    pub span: Span,
}

impl SortRef {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A bound variable with an optional sort annotation. A `None` sort is
/// a placeholder the resolver must fill before translation.
#[derive(Debug, Clone)]
pub struct SortedVar {
    pub name: Ident,
    pub sort: Option<SortRef>,
}

/// An ordered list of variables introduced together by a quantifier,
/// let-expression, or parameter list.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    pub vars: Vec<SortedVar>,
}

impl Binder {
    pub fn new(vars: Vec<SortedVar>) -> Self {
        Self { vars }
    }
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum Decl {
    Sort(SortDecl),
    Relation(RelationDecl),
    Constant(ConstantDecl),
    Function(FunctionDecl),
    Axiom(AxiomDecl),
    Init(InitDecl),
    Invariant(InvariantDecl),
    Transition(TransitionDecl),
    Theorem(TheoremDecl),
    Automaton(AutomatonDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Sort(d) => d.span,
            Decl::Relation(d) => d.span,
            Decl::Constant(d) => d.span,
            Decl::Function(d) => d.span,
            Decl::Axiom(d) => d.span,
            Decl::Init(d) => d.span,
            Decl::Invariant(d) => d.span,
            Decl::Transition(d) => d.span,
            Decl::Theorem(d) => d.span,
            Decl::Automaton(d) => d.span,
        }
    }
}

/// `sort NAME`
#[derive(Debug, Clone)]
pub struct SortDecl {
    pub name: Ident,
    pub span: Span,
}

/// `mutable|immutable relation NAME(arity)` or
/// `derived relation NAME(arity): expr`.
///
/// The result sort of a relation is implicitly boolean. A derived
/// relation is defined by its formula, is never framed, and is parsed
/// as mutable like any other stored relation.
#[derive(Debug, Clone)]
pub struct RelationDecl {
    pub name: Ident,
    pub arity: Vec<SortRef>,
    pub mutable: bool,
    /// Defining formula, present only for derived relations.
    pub derived: Option<Expr>,
    pub span: Span,
}

impl RelationDecl {
    pub fn is_derived(&self) -> bool {
        self.derived.is_some()
    }
}

/// `mutable|immutable constant NAME: sort`
#[derive(Debug, Clone)]
pub struct ConstantDecl {
    pub name: Ident,
    pub sort: SortRef,
    pub mutable: bool,
    pub span: Span,
}

/// `mutable|immutable function NAME(arity): sort`
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Ident,
    pub arity: Vec<SortRef>,
    pub sort: SortRef,
    pub mutable: bool,
    pub span: Span,
}

/// `axiom [NAME] expr`
#[derive(Debug, Clone)]
pub struct AxiomDecl {
    pub name: Option<String>,
    pub expr: Expr,
    pub span: Span,
}

/// `init [NAME] expr`
#[derive(Debug, Clone)]
pub struct InitDecl {
    pub name: Option<String>,
    pub expr: Expr,
    pub span: Span,
}

/// `safety|invariant|sketch invariant [NAME] expr`
///
/// Safety properties and sketch invariants are ordinary invariants
/// apart from these flags.
#[derive(Debug, Clone)]
pub struct InvariantDecl {
    pub name: Option<String>,
    pub expr: Expr,
    pub is_safety: bool,
    pub is_sketch: bool,
    pub span: Span,
}

/// The modified components named by a transition's `modifies` clause.
#[derive(Debug, Clone)]
pub struct ModifiesClause {
    pub name: Ident,
}

/// The body of a transition declaration.
#[derive(Debug, Clone)]
pub enum TransitionBody {
    /// `modifies a, b expr` — explicit modifies-set plus a two-state
    /// guard formula.
    Relation {
        mods: Vec<ModifiesClause>,
        expr: Expr,
    },
    /// `{ stmts }` — the modifies-set is derived from assignment
    /// targets.
    Block(Block),
}

/// `transition NAME(params) body`
#[derive(Debug, Clone)]
pub struct TransitionDecl {
    pub name: Ident,
    pub params: Vec<SortedVar>,
    pub body: TransitionBody,
    pub span: Span,
}

impl TransitionDecl {
    /// Number of consecutive state keys this definition consumes when
    /// inlined at a call site.
    pub fn num_states(&self) -> usize {
        2
    }

    /// The names of the state components this transition modifies: the
    /// explicit `modifies` list, or for block bodies the assignment
    /// targets in order of first assignment.
    pub fn modifies(&self) -> Vec<&str> {
        match &self.body {
            TransitionBody::Relation { mods, .. } => {
                mods.iter().map(|m| m.name.name.as_str()).collect()
            }
            TransitionBody::Block(block) => {
                let mut names: Vec<&str> = Vec::new();
                for stmt in &block.stmts {
                    if let Stmt::Assign(a) = stmt {
                        if !names.contains(&a.target.name.as_str()) {
                            names.push(a.target.name.as_str());
                        }
                    }
                }
                names
            }
        }
    }
}

/// `onestate|twostate theorem [NAME] expr`
#[derive(Debug, Clone)]
pub struct TheoremDecl {
    pub name: Option<String>,
    pub expr: Expr,
    pub is_twostate: bool,
    pub span: Span,
}

/// `automaton { ... }`
///
/// Phase automata are parsed and stored faithfully; their semantics are
/// the business of an external checker.
#[derive(Debug, Clone)]
pub struct AutomatonDecl {
    pub components: Vec<AutomatonComponent>,
    pub span: Span,
}

/// One section inside an `automaton` block.
#[derive(Debug, Clone)]
pub enum AutomatonComponent {
    /// `global phase_components` — phase-independent components.
    Global(GlobalPhaseDecl),
    /// `init phase NAME` — the designated initial phase.
    InitPhase(InitPhaseDecl),
    /// `phase NAME phase_components`
    Phase(PhaseDecl),
}

/// `global phase_components`
#[derive(Debug, Clone)]
pub struct GlobalPhaseDecl {
    pub components: Vec<PhaseComponent>,
    pub span: Span,
}

/// `init phase NAME`
#[derive(Debug, Clone)]
pub struct InitPhaseDecl {
    pub phase: Ident,
    pub span: Span,
}

/// `phase NAME phase_components`
#[derive(Debug, Clone)]
pub struct PhaseDecl {
    pub name: Ident,
    pub components: Vec<PhaseComponent>,
    pub span: Span,
}

/// A component of a phase: a phase-transition or a phase-local
/// invariant.
#[derive(Debug, Clone)]
pub enum PhaseComponent {
    Transition(PhaseTransitionDecl),
    Invariant(InvariantDecl),
}

/// `transition NAME -> (self | phase NAME) [assume expr]`
#[derive(Debug, Clone)]
pub struct PhaseTransitionDecl {
    pub transition: Ident,
    /// Target phase; `None` means `self`.
    pub target: Option<Ident>,
    /// Optional guard restricting when this phase change applies.
    pub guard: Option<Expr>,
    pub span: Span,
}

/// An expression.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// A boolean literal with a dummy span, for driver-built formulas.
    pub fn bool_lit(val: bool) -> Self {
        Self::new(ExprKind::Bool(val), Span::dummy())
    }

    /// An integer literal with a dummy span, for driver-built formulas.
    pub fn int_lit(val: i64) -> Self {
        Self::new(ExprKind::Int(val), Span::dummy())
    }
}

/// The kind of expression.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal. The surface grammar has no numeric tokens;
    /// these nodes are built by drivers and internal rewrites.
    Int(i64),
    /// Identifier reference: a bound variable or a zero-arity state
    /// component.
    Id(String),
    /// Unary operation.
    Unary { op: UnaryOp, arg: Box<Expr> },
    /// Binary operation.
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Flattened n-ary operation. `a & b & c` is one `And` node with
    /// three operands; the parser performs the flattening.
    Nary { op: NaryOp, args: Vec<Expr> },
    /// Application of a relation, function, or stateful definition.
    App { callee: Ident, args: Vec<Expr> },
    /// `forall|exists vars . body`
    Quantifier {
        quant: Quant,
        binder: Binder,
        body: Box<Expr>,
    },
    /// Conditional expression (no surface syntax).
    Ite {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
    },
    /// Let binding (no surface syntax).
    Let {
        var: SortedVar,
        val: Box<Expr>,
        body: Box<Expr>,
    },
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!e`
    Not,
    /// State-offset marker: evaluate the operand one state later.
    New,
    /// `old(e)` — accepted by the grammar; an external rewrite must
    /// eliminate it before translation.
    Old,
}

/// Binary operator. The comparison and arithmetic operators have no
/// surface syntax and appear only in driver-built formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Implies,
    Iff,
    Equal,
    NotEq,
    Ge,
    Gt,
    Le,
    Lt,
    Add,
    Sub,
}

/// N-ary operator. `Distinct` has no surface syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaryOp {
    And,
    Or,
    Distinct,
}

/// Quantifier kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quant {
    Forall,
    Exists,
}

/// A statement inside a transition block.
#[derive(Debug, Clone)]
pub enum Stmt {
    Assume(AssumeStmt),
    Assign(AssignStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assume(s) => s.span,
            Stmt::Assign(s) => s.span,
        }
    }
}

/// `assume expr;`
#[derive(Debug, Clone)]
pub struct AssumeStmt {
    pub expr: Expr,
    pub span: Span,
}

/// `target := expr;` or `target(args) := expr;`
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub target: Ident,
    pub args: Vec<Expr>,
    pub value: Expr,
    pub span: Span,
}

/// `{ stmts }`
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Ident {
        Ident::new(name, Span::dummy())
    }

    #[test]
    fn test_block_modifies_first_assignment_order() {
        let assign = |target: &str| {
            Stmt::Assign(AssignStmt {
                target: ident(target),
                args: vec![],
                value: Expr::bool_lit(true),
                span: Span::dummy(),
            })
        };
        let t = TransitionDecl {
            name: ident("t"),
            params: vec![],
            body: TransitionBody::Block(Block {
                stmts: vec![assign("b"), assign("a"), assign("b")],
                span: Span::dummy(),
            }),
            span: Span::dummy(),
        };
        assert_eq!(t.modifies(), vec!["b", "a"]);
    }

    #[test]
    fn test_explicit_modifies() {
        let t = TransitionDecl {
            name: ident("t"),
            params: vec![],
            body: TransitionBody::Relation {
                mods: vec![
                    ModifiesClause { name: ident("x") },
                    ModifiesClause { name: ident("y") },
                ],
                expr: Expr::bool_lit(true),
            },
            span: Span::dummy(),
        };
        assert_eq!(t.modifies(), vec!["x", "y"]);
        assert_eq!(t.num_states(), 2);
    }
}
