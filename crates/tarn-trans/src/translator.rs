//! Translation of resolved expressions into first-order formulas over
//! an ordered tuple of state keys, including automatic frame-condition
//! synthesis for transitions.
//!
//! A [`Translator`] is one translation session: it owns the symbol
//! side-table memoizing one solver symbol per (state component, state
//! key) pair, and the counter that keeps quantifier-bound names fresh.
//! Sessions are single-threaded; concurrent use requires one session
//! per worker.
//!
//! Every error here is a contract violation: the input was not
//! resolved, or the key tuple does not fit the translation being
//! requested. These indicate bugs in the caller, not user input.

use std::collections::HashMap;
use tarn_fol::{Sort, Symbol, Term};
use tarn_resolve::{NameRef, Scope, StateRef};
use tarn_syntax::{
    BinOp, Binder, Block, ConstantDecl, Expr, ExprKind, FunctionDecl, NaryOp, Program, Quant,
    RelationDecl, SortedVar, Stmt, TransitionBody, TransitionDecl, UnaryOp,
};
use thiserror::Error;
use tracing::debug;

/// Translation-contract violation.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("no state key at position {index} for mutable state component {name}")]
    MissingKey { name: String, index: usize },

    #[error("new-state reference needs a state key at position {index}, but only {available} keys were supplied")]
    MissingNewKey { index: usize, available: usize },

    #[error("inlining {name} needs {needed} state keys from position {index}, but only {available} keys were supplied")]
    NotEnoughKeys {
        name: String,
        needed: usize,
        index: usize,
        available: usize,
    },

    #[error("bound variable {name} reached translation without a resolved sort")]
    UnresolvedSort { name: String },

    #[error("old() reached translation without being rewritten away")]
    UntranslatableOld,

    #[error("unknown identifier reached translation: {name}")]
    Unresolved { name: String },

    #[error("{name} cannot be used in this position")]
    InvalidReference { name: String },

    #[error("unknown sort reached translation: {name}")]
    UnknownSort { name: String },
}

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StateKind {
    Relation,
    Constant,
    Function,
}

impl StateKind {
    fn of(decl: StateRef<'_>) -> Self {
        match decl {
            StateRef::Relation(_) => StateKind::Relation,
            StateRef::Constant(_) => StateKind::Constant,
            StateRef::Function(_) => StateKind::Function,
        }
    }
}

/// Side-table memoizing solver symbols per state component and state
/// key (`None` is the immutable cache). For a fixed (component, key)
/// pair the cached symbol is always the same underlying object.
#[derive(Default)]
struct SymbolCache {
    symbols: HashMap<(StateKind, String, Option<String>), Symbol>,
}

/// One translation session over a resolved program and a fixed state
/// key tuple.
pub struct Translator<'a> {
    scope: Scope<'a, Term>,
    keys: Vec<String>,
    /// Suffix counter keeping bound-variable names collision-free
    /// across nested and repeated translations.
    counter: usize,
    cache: SymbolCache,
}

impl<'a> Translator<'a> {
    /// Create a translator for a resolved program. `keys` name the
    /// state instances of a multi-state formula, in order; index 0 is
    /// the current state.
    pub fn new<K: Into<String>>(program: &'a Program, keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            scope: Scope::for_program(program),
            keys: keys.into_iter().map(Into::into).collect(),
            counter: 0,
            cache: SymbolCache::default(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Create fresh solver symbols for the variables of a binder. Each
    /// name is suffixed with a session-scoped counter, so the same
    /// source name never produces two colliding symbols.
    pub fn bind(&mut self, vars: &[SortedVar]) -> TranslateResult<Vec<Symbol>> {
        let mut symbols = Vec::with_capacity(vars.len());
        for var in vars {
            let sort_ref = var.sort.as_ref().ok_or_else(|| TranslateError::UnresolvedSort {
                name: var.name.name.clone(),
            })?;
            let sort = self.sort_to_fol(&sort_ref.name)?;
            let name = format!("{}_{}", var.name.name, self.counter);
            self.counter += 1;
            symbols.push(Symbol::constant(name, sort));
        }
        Ok(symbols)
    }

    /// Translate an expression at the given position in the key tuple.
    pub fn translate_expr(&mut self, expr: &Expr, index: usize) -> TranslateResult<Term> {
        match &expr.kind {
            ExprKind::Bool(b) => Ok(Term::bool_lit(*b)),
            ExprKind::Int(n) => Ok(Term::int_lit(*n)),
            ExprKind::Unary { op, arg } => match op {
                UnaryOp::Not => Ok(Term::not(self.translate_expr(arg, index)?)),
                UnaryOp::New => {
                    if index + 1 >= self.keys.len() {
                        return Err(TranslateError::MissingNewKey {
                            index: index + 1,
                            available: self.keys.len(),
                        });
                    }
                    self.translate_expr(arg, index + 1)
                }
                UnaryOp::Old => Err(TranslateError::UntranslatableOld),
            },
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.translate_expr(lhs, index)?;
                let rhs = self.translate_expr(rhs, index)?;
                Ok(match op {
                    BinOp::Implies => Term::implies(lhs, rhs),
                    BinOp::Iff => Term::iff(lhs, rhs),
                    BinOp::Equal => Term::eq(lhs, rhs),
                    BinOp::NotEq => Term::neq(lhs, rhs),
                    BinOp::Ge => Term::ge(lhs, rhs),
                    BinOp::Gt => Term::gt(lhs, rhs),
                    BinOp::Le => Term::le(lhs, rhs),
                    BinOp::Lt => Term::lt(lhs, rhs),
                    BinOp::Add => Term::add(lhs, rhs),
                    BinOp::Sub => Term::sub(lhs, rhs),
                })
            }
            ExprKind::Nary { op, args } => {
                let args = args
                    .iter()
                    .map(|a| self.translate_expr(a, index))
                    .collect::<TranslateResult<Vec<_>>>()?;
                Ok(match op {
                    NaryOp::And => Term::and(args),
                    NaryOp::Or => Term::or(args),
                    NaryOp::Distinct => Term::distinct(args),
                })
            }
            ExprKind::Id(name) => match self.resolve(name)? {
                Resolved::Var(term) => Ok(term),
                Resolved::Relation(d) => {
                    let symbol = self.state_symbol(StateRef::Relation(d), index)?;
                    Ok(Term::constant(symbol))
                }
                Resolved::Constant(d) => {
                    let symbol = self.state_symbol(StateRef::Constant(d), index)?;
                    Ok(Term::constant(symbol))
                }
                Resolved::Function(_) => Err(TranslateError::InvalidReference {
                    name: name.clone(),
                }),
                Resolved::Definition(d) => {
                    self.check_definition_keys(d, index)?;
                    let saved = self.scope.enter_fresh_stack();
                    let result = self.translate_definition_body(d, index);
                    self.scope.exit_fresh_stack(saved);
                    result
                }
            },
            ExprKind::App { callee, args } => match self.resolve(&callee.name)? {
                Resolved::Var(_) | Resolved::Constant(_) => Err(TranslateError::InvalidReference {
                    name: callee.name.clone(),
                }),
                Resolved::Relation(d) => {
                    let symbol = self.state_symbol(StateRef::Relation(d), index)?;
                    let args = self.translate_args(args, index)?;
                    // A zero-arity relation written `r()` is the same
                    // occurrence as plain `r`.
                    if args.is_empty() {
                        Ok(Term::constant(symbol))
                    } else {
                        Ok(Term::app(symbol, args))
                    }
                }
                Resolved::Function(d) => {
                    let symbol = self.state_symbol(StateRef::Function(d), index)?;
                    let args = self.translate_args(args, index)?;
                    Ok(Term::app(symbol, args))
                }
                Resolved::Definition(d) => {
                    self.check_definition_keys(d, index)?;
                    // Arguments are translated in the caller's scope and
                    // at the caller's index, then bound over a fresh
                    // stack so the definition's formals neither leak nor
                    // capture.
                    let translated_args = self.translate_args(args, index)?;
                    let bindings = d
                        .params
                        .iter()
                        .map(|p| p.name.name.clone())
                        .zip(translated_args)
                        .collect();
                    let saved = self.scope.enter_fresh_stack();
                    self.scope.push_binder(bindings);
                    let result = self.translate_definition_body(d, index);
                    self.scope.pop_binder();
                    self.scope.exit_fresh_stack(saved);
                    result
                }
            },
            ExprKind::Quantifier {
                quant,
                binder,
                body,
            } => {
                let symbols = self.bind(&binder.vars)?;
                let term = self.with_binder(binder, &symbols, |t| t.translate_expr(body, index))?;
                Ok(match quant {
                    Quant::Forall => Term::forall(symbols, term),
                    Quant::Exists => Term::exists(symbols, term),
                })
            }
            ExprKind::Ite { cond, then, els } => Ok(Term::ite(
                self.translate_expr(cond, index)?,
                self.translate_expr(then, index)?,
                self.translate_expr(els, index)?,
            )),
            ExprKind::Let { var, val, body } => {
                let val = self.translate_expr(val, index)?;
                self.scope
                    .push_binder(vec![(var.name.name.clone(), val)]);
                let result = self.translate_expr(body, index);
                self.scope.pop_binder();
                result
            }
        }
    }

    /// Frame axioms for a transition at `index`: one "unchanged"
    /// constraint per mutable, non-derived state component whose name
    /// is absent from the modifies-set.
    pub fn frame(&mut self, mods: &[&str], index: usize) -> TranslateResult<Vec<Term>> {
        let decls: Vec<StateRef<'a>> = self.scope.state_decls().collect();
        let mut axioms = Vec::new();
        for decl in decls {
            if !decl.mutable() || decl.is_derived() || mods.contains(&decl.name()) {
                continue;
            }

            let new_symbol = self.state_symbol(decl, index + 1)?;
            let old_symbol = self.state_symbol(decl, index)?;

            let arity = match decl {
                StateRef::Relation(r) => r.arity.as_slice(),
                StateRef::Constant(_) => &[],
                StateRef::Function(f) => f.arity.as_slice(),
            };

            let axiom = if arity.is_empty() {
                Term::eq(Term::constant(new_symbol), Term::constant(old_symbol))
            } else {
                let mut vars = Vec::with_capacity(arity.len());
                for (i, sort) in arity.iter().enumerate() {
                    vars.push(Symbol::constant(
                        format!("x{}", i),
                        self.sort_to_fol(&sort.name)?,
                    ));
                }
                let args: Vec<Term> = vars.iter().cloned().map(Term::constant).collect();
                Term::forall(
                    vars,
                    Term::eq(
                        Term::app(new_symbol, args.clone()),
                        Term::app(old_symbol, args),
                    ),
                )
            };
            axioms.push(axiom);
        }
        Ok(axioms)
    }

    /// A transition's body formula: the translated guard or statement
    /// block conjoined with the synthesized frame axioms.
    pub fn translate_transition_body(
        &mut self,
        transition: &TransitionDecl,
        index: usize,
    ) -> TranslateResult<Term> {
        let body = match &transition.body {
            TransitionBody::Relation { expr, .. } => self.translate_expr(expr, index)?,
            TransitionBody::Block(block) => self.translate_block(block, index)?,
        };
        let mods = transition.modifies();
        let frame = self.frame(&mods, index)?;
        debug!(
            transition = %transition.name.name,
            frame_axioms = frame.len(),
            "translated transition body"
        );
        let mut conjuncts = vec![body];
        conjuncts.extend(frame);
        Ok(Term::and(conjuncts))
    }

    /// Translate a whole transition. A non-empty parameter list wraps
    /// the body conjunction in an existential over fresh parameter
    /// symbols; an empty one returns the conjunction directly.
    pub fn translate_transition(
        &mut self,
        transition: &TransitionDecl,
        index: usize,
    ) -> TranslateResult<Term> {
        let symbols = self.bind(&transition.params)?;
        let bindings = transition
            .params
            .iter()
            .map(|p| p.name.name.clone())
            .zip(symbols.iter().cloned().map(Term::constant))
            .collect();
        self.scope.push_binder(bindings);
        let body = self.translate_transition_body(transition, index);
        self.scope.pop_binder();
        let body = body?;
        if symbols.is_empty() {
            Ok(body)
        } else {
            Ok(Term::exists(symbols, body))
        }
    }

    // === Internals ===

    fn translate_args(&mut self, args: &[Expr], index: usize) -> TranslateResult<Vec<Term>> {
        args.iter()
            .map(|a| self.translate_expr(a, index))
            .collect()
    }

    /// Translate a statement block: assumptions constrain the current
    /// state, assignments equate the next-state symbol applied to the
    /// current-state argument tuple with the current-state value.
    fn translate_block(&mut self, block: &Block, index: usize) -> TranslateResult<Term> {
        let mut conjuncts = Vec::with_capacity(block.stmts.len());
        for stmt in &block.stmts {
            match stmt {
                Stmt::Assume(s) => conjuncts.push(self.translate_expr(&s.expr, index)?),
                Stmt::Assign(a) => {
                    let decl = self.state_ref(&a.target.name).ok_or_else(|| {
                        TranslateError::Unresolved {
                            name: a.target.name.clone(),
                        }
                    })?;
                    let post = self.state_symbol(decl, index + 1)?;
                    let value = self.translate_expr(&a.value, index)?;
                    let lhs = if a.args.is_empty() {
                        Term::constant(post)
                    } else {
                        let args = self.translate_args(&a.args, index)?;
                        Term::app(post, args)
                    };
                    conjuncts.push(Term::eq(lhs, value));
                }
            }
        }
        Ok(Term::and(conjuncts))
    }

    fn translate_definition_body(
        &mut self,
        definition: &TransitionDecl,
        index: usize,
    ) -> TranslateResult<Term> {
        match &definition.body {
            TransitionBody::Relation { expr, .. } => self.translate_expr(expr, index),
            TransitionBody::Block(block) => self.translate_block(block, index),
        }
    }

    fn check_definition_keys(
        &self,
        definition: &TransitionDecl,
        index: usize,
    ) -> TranslateResult<()> {
        let needed = definition.num_states();
        if index + needed > self.keys.len() {
            return Err(TranslateError::NotEnoughKeys {
                name: definition.name.name.clone(),
                needed,
                index,
                available: self.keys.len(),
            });
        }
        Ok(())
    }

    fn with_binder<R>(
        &mut self,
        binder: &Binder,
        symbols: &[Symbol],
        f: impl FnOnce(&mut Self) -> TranslateResult<R>,
    ) -> TranslateResult<R> {
        let bindings = binder
            .vars
            .iter()
            .map(|v| v.name.name.clone())
            .zip(symbols.iter().cloned().map(Term::constant))
            .collect();
        self.scope.push_binder(bindings);
        let result = f(self);
        self.scope.pop_binder();
        result
    }

    fn resolve(&self, name: &str) -> TranslateResult<Resolved<'a>> {
        match self.scope.get(name) {
            Some(NameRef::Var(term)) => Ok(Resolved::Var(term.clone())),
            Some(NameRef::Relation(d)) => Ok(Resolved::Relation(d)),
            Some(NameRef::Constant(d)) => Ok(Resolved::Constant(d)),
            Some(NameRef::Function(d)) => Ok(Resolved::Function(d)),
            Some(NameRef::Definition(d)) => Ok(Resolved::Definition(d)),
            None => Err(TranslateError::Unresolved {
                name: name.to_string(),
            }),
        }
    }

    fn state_ref(&self, name: &str) -> Option<StateRef<'a>> {
        if let Some(d) = self.scope.get_relation(name) {
            return Some(StateRef::Relation(d));
        }
        if let Some(d) = self.scope.get_constant(name) {
            return Some(StateRef::Constant(d));
        }
        if let Some(d) = self.scope.get_function(name) {
            return Some(StateRef::Function(d));
        }
        None
    }

    /// The memoized solver symbol for a state component. Mutable
    /// components get one symbol per state key, named `{key}_{name}`;
    /// immutable components get a single symbol regardless of index.
    fn state_symbol(&mut self, decl: StateRef<'a>, index: usize) -> TranslateResult<Symbol> {
        let name = decl.name();
        let key: Option<String> = if decl.mutable() {
            match self.keys.get(index) {
                Some(k) => Some(k.clone()),
                None => {
                    return Err(TranslateError::MissingKey {
                        name: name.to_string(),
                        index,
                    });
                }
            }
        } else {
            None
        };

        let cache_key = (StateKind::of(decl), name.to_string(), key.clone());
        if let Some(symbol) = self.cache.symbols.get(&cache_key) {
            return Ok(symbol.clone());
        }

        let symbol_name = match &key {
            Some(k) => format!("{}_{}", k, name),
            None => name.to_string(),
        };
        let symbol = match decl {
            StateRef::Relation(r) => {
                let args = self.fol_sorts(&r.arity)?;
                if args.is_empty() {
                    Symbol::constant(symbol_name, Sort::Bool)
                } else {
                    Symbol::function(symbol_name, args, Sort::Bool)
                }
            }
            StateRef::Constant(c) => {
                Symbol::constant(symbol_name, self.sort_to_fol(&c.sort.name)?)
            }
            StateRef::Function(f) => {
                let args = self.fol_sorts(&f.arity)?;
                Symbol::function(symbol_name, args, self.sort_to_fol(&f.sort.name)?)
            }
        };
        self.cache.symbols.insert(cache_key, symbol.clone());
        Ok(symbol)
    }

    fn fol_sorts(&self, sorts: &[tarn_syntax::SortRef]) -> TranslateResult<Vec<Sort>> {
        sorts.iter().map(|s| self.sort_to_fol(&s.name)).collect()
    }

    fn sort_to_fol(&self, name: &str) -> TranslateResult<Sort> {
        match name {
            "bool" => Ok(Sort::Bool),
            "int" => Ok(Sort::Int),
            _ => {
                if self.scope.get_sort(name).is_some() {
                    Ok(Sort::uninterpreted(name))
                } else {
                    Err(TranslateError::UnknownSort {
                        name: name.to_string(),
                    })
                }
            }
        }
    }
}

enum Resolved<'a> {
    Var(Term),
    Relation(&'a RelationDecl),
    Constant(&'a ConstantDecl),
    Function(&'a FunctionDecl),
    Definition(&'a TransitionDecl),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_fol::TermKind;
    use tarn_resolve::resolve;
    use tarn_syntax::parse;

    fn resolved(source: &str) -> Program {
        let mut program = parse(source).unwrap();
        resolve(&mut program).unwrap();
        program
    }

    fn axiom_expr(program: &Program) -> &Expr {
        &program.axioms().next().unwrap().expr
    }

    const LOCK_PROGRAM: &str = "sort node\n\
         mutable relation lock\n\
         mutable relation holds(node)\n\
         immutable relation le(node, node)\n\
         immutable constant root: node\n";

    #[test]
    fn test_same_key_yields_identical_symbols() {
        let program = resolved(&format!("{}axiom holds(root)", LOCK_PROGRAM));
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let expr = axiom_expr(&program);

        let t1 = translator.translate_expr(expr, 0).unwrap();
        let t2 = translator.translate_expr(expr, 0).unwrap();
        let (s1, s2) = match (t1.kind(), t2.kind()) {
            (TermKind::App(s1, _), TermKind::App(s2, _)) => (s1.clone(), s2.clone()),
            k => panic!("expected applications, got {:?}", k),
        };
        assert!(Symbol::ptr_eq(&s1, &s2));
        assert_eq!(s1.name(), "s0_holds");
    }

    #[test]
    fn test_different_keys_yield_distinct_symbols() {
        let program = resolved(&format!("{}axiom holds(root)", LOCK_PROGRAM));
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let expr = axiom_expr(&program);

        let t1 = translator.translate_expr(expr, 0).unwrap();
        let t2 = translator.translate_expr(expr, 1).unwrap();
        let (s1, s2) = match (t1.kind(), t2.kind()) {
            (TermKind::App(s1, _), TermKind::App(s2, _)) => (s1.clone(), s2.clone()),
            k => panic!("expected applications, got {:?}", k),
        };
        assert!(!Symbol::ptr_eq(&s1, &s2));
        assert_eq!(s1.name(), "s0_holds");
        assert_eq!(s2.name(), "s1_holds");
    }

    #[test]
    fn test_immutable_symbols_ignore_index() {
        let program = resolved(&format!("{}axiom le(root, root)", LOCK_PROGRAM));
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let expr = axiom_expr(&program);

        let t1 = translator.translate_expr(expr, 0).unwrap();
        let t2 = translator.translate_expr(expr, 1).unwrap();
        let (s1, s2) = match (t1.kind(), t2.kind()) {
            (TermKind::App(s1, _), TermKind::App(s2, _)) => (s1.clone(), s2.clone()),
            k => panic!("expected applications, got {:?}", k),
        };
        assert!(Symbol::ptr_eq(&s1, &s2));
        assert_eq!(s1.name(), "le");
    }

    #[test]
    fn test_mutable_reference_without_key_fails() {
        let program = resolved(&format!("{}axiom lock", LOCK_PROGRAM));
        let mut translator = Translator::new(&program, Vec::<String>::new());
        let err = translator.translate_expr(axiom_expr(&program), 0).unwrap_err();
        assert!(matches!(err, TranslateError::MissingKey { .. }));
    }

    #[test]
    fn test_old_is_a_contract_violation() {
        let program = resolved(&format!("{}axiom old(lock)", LOCK_PROGRAM));
        let mut translator = Translator::new(&program, ["s0"]);
        let err = translator.translate_expr(axiom_expr(&program), 0).unwrap_err();
        assert!(matches!(err, TranslateError::UntranslatableOld));
    }

    #[test]
    fn test_quantifier_names_are_fresh_per_translation() {
        let program = resolved(&format!(
            "{}axiom forall x: node . holds(x)",
            LOCK_PROGRAM
        ));
        let mut translator = Translator::new(&program, ["s0"]);
        let expr = axiom_expr(&program);

        let t1 = translator.translate_expr(expr, 0).unwrap();
        let t2 = translator.translate_expr(expr, 0).unwrap();
        let name_of = |t: &Term| match t.kind() {
            TermKind::Forall(vars, _) => vars[0].name().to_string(),
            k => panic!("expected forall, got {:?}", k),
        };
        assert_eq!(name_of(&t1), "x_0");
        assert_eq!(name_of(&t2), "x_1");
    }

    #[test]
    fn test_nested_shadowing_stays_collision_free() {
        let program = resolved(&format!(
            "{}axiom forall x: node . exists x: node . holds(x)",
            LOCK_PROGRAM
        ));
        let mut translator = Translator::new(&program, ["s0"]);
        let term = translator.translate_expr(axiom_expr(&program), 0).unwrap();
        assert_eq!(
            term.to_string(),
            "(forall ((x_0 node)) (exists ((x_1 node)) (s0_holds x_1)))"
        );
    }

    #[test]
    fn test_flattened_connectives_translate_to_single_nary() {
        let program = resolved(&format!("{}axiom lock & lock & lock", LOCK_PROGRAM));
        let mut translator = Translator::new(&program, ["s0"]);
        let term = translator.translate_expr(axiom_expr(&program), 0).unwrap();
        match term.kind() {
            TermKind::And(args) => assert_eq!(args.len(), 3),
            k => panic!("expected one conjunction, got {:?}", k),
        }
    }

    #[test]
    fn test_frame_skips_modified_and_immutable_and_derived() {
        let program = resolved(
            "sort node\n\
             mutable relation x\n\
             mutable relation y\n\
             immutable relation frozen\n\
             derived relation busy: y\n\
             transition t()\n\
                 modifies x\n\
                 x",
        );
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let frame = translator.frame(&["x"], 0).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].to_string(), "(= s1_y s0_y)");
    }

    #[test]
    fn test_frame_quantifies_over_arity() {
        let program = resolved(
            "sort node\n\
             mutable relation holds(node)\n\
             transition t()\n\
                 modifies holds\n\
                 true",
        );
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let frame = translator.frame(&[], 0).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(
            frame[0].to_string(),
            "(forall ((x0 node)) (= (s1_holds x0) (s0_holds x0)))"
        );
    }

    #[test]
    fn test_parameterless_transition_has_no_existential() {
        let program = resolved(
            "mutable relation lock\n\
             transition flip()\n\
                 modifies lock\n\
                 lock",
        );
        let transition = program.transitions().next().unwrap();
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let term = translator.translate_transition(transition, 0).unwrap();
        match term.kind() {
            TermKind::And(args) => assert_eq!(args.len(), 1),
            k => panic!("expected bare conjunction, got {:?}", k),
        }
    }

    #[test]
    fn test_parameterized_transition_wraps_in_existential() {
        let program = resolved(&format!(
            "{}transition grab(n: node)\n\
                 modifies holds\n\
                 holds(n)",
            LOCK_PROGRAM
        ));
        let transition = program.transitions().next().unwrap();
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let term = translator.translate_transition(transition, 0).unwrap();
        match term.kind() {
            TermKind::Exists(vars, body) => {
                assert_eq!(vars.len(), 1);
                assert_eq!(vars[0].name(), "n_0");
                assert!(matches!(body.kind(), TermKind::And(_)));
            }
            k => panic!("expected existential wrapper, got {:?}", k),
        }
    }

    #[test]
    fn test_transition_body_conjoins_guard_and_frame() {
        let program = resolved(
            "mutable relation lock\n\
             mutable relation other\n\
             transition flip()\n\
                 modifies lock\n\
                 old(!lock) & lock",
        );
        let transition = program.transitions().next().unwrap();
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let term = translator.translate_transition_body(transition, 0).unwrap();
        assert_eq!(
            term.to_string(),
            "(and (and (not s0_lock) s1_lock) (= s1_other s0_other))"
        );
    }

    #[test]
    fn test_block_translation() {
        let program = resolved(
            "sort node\n\
             mutable relation lock\n\
             mutable relation holds(node)\n\
             transition release(n: node) {\n\
                 assume holds(n);\n\
                 lock := false;\n\
                 holds(n) := false;\n\
             }",
        );
        let transition = program.transitions().next().unwrap();
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let term = translator.translate_transition(transition, 0).unwrap();
        let TermKind::Exists(_, body) = term.kind() else {
            panic!("expected existential");
        };
        // assume + two assignments; everything is modified, so no frame
        // axioms.
        assert_eq!(
            body.to_string(),
            "(and (and (s0_holds n_0) (= s1_lock false) (= (s1_holds n_0) false)))"
        );
    }

    #[test]
    fn test_definition_inlining_uses_caller_index_for_args() {
        let program = resolved(&format!(
            "{}transition grab(n: node)\n\
                 modifies holds\n\
                 holds(n)\n\
             twostate theorem [call] grab(root)",
            LOCK_PROGRAM
        ));
        let theorem = program.theorems().next().unwrap();
        let mut translator = Translator::new(&program, ["s0", "s1"]);
        let term = translator.translate_expr(&theorem.expr, 0).unwrap();
        // The guard `holds(n)` was rewritten to the new state; `n` is
        // bound to the caller-translated argument `root`.
        assert_eq!(term.to_string(), "(s1_holds root)");
    }

    #[test]
    fn test_definition_inlining_needs_enough_keys() {
        let program = resolved(&format!(
            "{}transition grab(n: node)\n\
                 modifies holds\n\
                 holds(n)\n\
             twostate theorem [call] grab(root)",
            LOCK_PROGRAM
        ));
        let theorem = program.theorems().next().unwrap();
        let mut translator = Translator::new(&program, ["only"]);
        let err = translator.translate_expr(&theorem.expr, 0).unwrap_err();
        assert!(matches!(err, TranslateError::NotEnoughKeys { .. }));
    }

    #[test]
    fn test_new_without_key_fails() {
        let program = resolved(
            "mutable relation lock\n\
             transition flip()\n\
                 modifies lock\n\
                 lock",
        );
        let transition = program.transitions().next().unwrap();
        let mut translator = Translator::new(&program, ["s0"]);
        let err = translator.translate_transition(transition, 0).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::MissingNewKey { .. } | TranslateError::MissingKey { .. }
        ));
    }

    #[test]
    fn test_let_and_ite_translate_inline() {
        use tarn_syntax::{Ident, SortRef, Span};
        let program = resolved(LOCK_PROGRAM);
        let mut translator = Translator::new(&program, ["s0"]);

        let root = Expr::new(ExprKind::Id("root".to_string()), Span::dummy());
        let let_expr = Expr::new(
            ExprKind::Let {
                var: SortedVar {
                    name: Ident::new("v", Span::dummy()),
                    sort: Some(SortRef::new("node", Span::dummy())),
                },
                val: Box::new(root),
                body: Box::new(Expr::new(
                    ExprKind::App {
                        callee: Ident::new("holds", Span::dummy()),
                        args: vec![Expr::new(ExprKind::Id("v".to_string()), Span::dummy())],
                    },
                    Span::dummy(),
                )),
            },
            Span::dummy(),
        );
        let term = translator.translate_expr(&let_expr, 0).unwrap();
        assert_eq!(term.to_string(), "(s0_holds root)");

        let ite = Expr::new(
            ExprKind::Ite {
                cond: Box::new(Expr::bool_lit(true)),
                then: Box::new(Expr::int_lit(1)),
                els: Box::new(Expr::int_lit(2)),
            },
            Span::dummy(),
        );
        let term = translator.translate_expr(&ite, 0).unwrap();
        assert_eq!(term.to_string(), "(ite true 1 2)");
    }

    #[test]
    fn test_unresolved_binder_sort_is_contract_violation() {
        use tarn_syntax::{Ident, Span};
        let program = resolved(LOCK_PROGRAM);
        let mut translator = Translator::new(&program, ["s0"]);
        let expr = Expr::new(
            ExprKind::Quantifier {
                quant: Quant::Forall,
                binder: Binder::new(vec![SortedVar {
                    name: Ident::new("x", Span::dummy()),
                    sort: None,
                }]),
                body: Box::new(Expr::bool_lit(true)),
            },
            Span::dummy(),
        );
        let err = translator.translate_expr(&expr, 0).unwrap_err();
        assert!(matches!(err, TranslateError::UnresolvedSort { .. }));
    }
}
