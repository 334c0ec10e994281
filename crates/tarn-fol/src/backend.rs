//! Lowering emitted formulas to the z3 solver.
//!
//! The front end is solver-agnostic: translation produces [`Term`]s.
//! This module makes those terms consumable by the actual engine.

use crate::term::{Sort, Symbol, Term, TermKind};
use std::collections::HashMap;
use thiserror::Error;
use z3::ast::{Ast, Bool, Dynamic, Int};

/// Lowering error: the term was not well-sorted for the position it
/// appeared in. Indicates a bug in the caller, not in user input.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("expected a {expected}-sorted term, got: {term}")]
    SortMismatch { expected: &'static str, term: String },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Lowers terms into one z3 context, declaring sorts and symbols on
/// first use.
pub struct Lowering<'ctx> {
    ctx: &'ctx z3::Context,
    sorts: HashMap<String, z3::Sort<'ctx>>,
    decls: HashMap<String, z3::FuncDecl<'ctx>>,
    /// Bound variables, innermost last.
    bound: Vec<(Symbol, Dynamic<'ctx>)>,
}

impl<'ctx> Lowering<'ctx> {
    pub fn new(ctx: &'ctx z3::Context) -> Self {
        Self {
            ctx,
            sorts: HashMap::new(),
            decls: HashMap::new(),
            bound: Vec::new(),
        }
    }

    fn z3_sort(&mut self, sort: &Sort) -> z3::Sort<'ctx> {
        match sort {
            Sort::Bool => z3::Sort::bool(self.ctx),
            Sort::Int => z3::Sort::int(self.ctx),
            Sort::Uninterpreted(name) => {
                if !self.sorts.contains_key(name) {
                    let z3sort =
                        z3::Sort::uninterpreted(self.ctx, z3::Symbol::String(name.clone()));
                    self.sorts.insert(name.clone(), z3sort);
                }
                self.sorts[name].clone()
            }
        }
    }

    fn ensure_decl(&mut self, symbol: &Symbol) {
        if self.decls.contains_key(symbol.name()) {
            return;
        }
        let domain: Vec<z3::Sort> = symbol.args().iter().map(|s| self.z3_sort(s)).collect();
        let range = self.z3_sort(symbol.sort());
        let domain_refs: Vec<&z3::Sort> = domain.iter().collect();
        let decl = z3::FuncDecl::new(self.ctx, symbol.name(), &domain_refs, &range);
        self.decls.insert(symbol.name().to_string(), decl);
    }

    /// Lower a term expected to be boolean.
    pub fn lower_bool(&mut self, term: &Term) -> BackendResult<Bool<'ctx>> {
        self.lower(term)?
            .as_bool()
            .ok_or_else(|| BackendError::SortMismatch {
                expected: "bool",
                term: term.to_string(),
            })
    }

    /// Lower a term expected to be an integer.
    pub fn lower_int(&mut self, term: &Term) -> BackendResult<Int<'ctx>> {
        self.lower(term)?
            .as_int()
            .ok_or_else(|| BackendError::SortMismatch {
                expected: "int",
                term: term.to_string(),
            })
    }

    /// Lower a term to a z3 AST.
    pub fn lower(&mut self, term: &Term) -> BackendResult<Dynamic<'ctx>> {
        match term.kind() {
            TermKind::BoolLit(b) => Ok(Dynamic::from_ast(&Bool::from_bool(self.ctx, *b))),
            TermKind::IntLit(n) => Ok(Dynamic::from_ast(&Int::from_i64(self.ctx, *n))),
            TermKind::Const(symbol) => {
                // Innermost binding wins under shadowing.
                for (bound_sym, ast) in self.bound.iter().rev() {
                    if Symbol::ptr_eq(bound_sym, symbol) {
                        return Ok(ast.clone());
                    }
                }
                self.ensure_decl(symbol);
                Ok(self.decls[symbol.name()].apply(&[]))
            }
            TermKind::App(symbol, args) => {
                let lowered: Vec<Dynamic> = args
                    .iter()
                    .map(|a| self.lower(a))
                    .collect::<BackendResult<_>>()?;
                self.ensure_decl(symbol);
                let arg_refs: Vec<&dyn Ast> = lowered.iter().map(|d| d as &dyn Ast).collect();
                Ok(self.decls[symbol.name()].apply(&arg_refs))
            }
            TermKind::Not(a) => {
                let a = self.lower_bool(a)?;
                Ok(Dynamic::from_ast(&a.not()))
            }
            TermKind::Implies(a, b) => {
                let a = self.lower_bool(a)?;
                let b = self.lower_bool(b)?;
                Ok(Dynamic::from_ast(&a.implies(&b)))
            }
            TermKind::Iff(a, b) => {
                let a = self.lower_bool(a)?;
                let b = self.lower_bool(b)?;
                Ok(Dynamic::from_ast(&a.iff(&b)))
            }
            TermKind::Eq(a, b) => {
                let a = self.lower(a)?;
                let b = self.lower(b)?;
                Ok(Dynamic::from_ast(&a._eq(&b)))
            }
            TermKind::Distinct(args) => {
                let lowered: Vec<Dynamic> = args
                    .iter()
                    .map(|a| self.lower(a))
                    .collect::<BackendResult<_>>()?;
                let mut clauses = Vec::new();
                for i in 0..lowered.len() {
                    for j in i + 1..lowered.len() {
                        clauses.push(lowered[i]._eq(&lowered[j]).not());
                    }
                }
                let clause_refs: Vec<&Bool> = clauses.iter().collect();
                Ok(Dynamic::from_ast(&Bool::and(self.ctx, &clause_refs)))
            }
            TermKind::And(args) => {
                let lowered: Vec<Bool> = args
                    .iter()
                    .map(|a| self.lower_bool(a))
                    .collect::<BackendResult<_>>()?;
                let refs: Vec<&Bool> = lowered.iter().collect();
                Ok(Dynamic::from_ast(&Bool::and(self.ctx, &refs)))
            }
            TermKind::Or(args) => {
                let lowered: Vec<Bool> = args
                    .iter()
                    .map(|a| self.lower_bool(a))
                    .collect::<BackendResult<_>>()?;
                let refs: Vec<&Bool> = lowered.iter().collect();
                Ok(Dynamic::from_ast(&Bool::or(self.ctx, &refs)))
            }
            TermKind::Le(a, b) => {
                let (a, b) = (self.lower_int(a)?, self.lower_int(b)?);
                Ok(Dynamic::from_ast(&a.le(&b)))
            }
            TermKind::Lt(a, b) => {
                let (a, b) = (self.lower_int(a)?, self.lower_int(b)?);
                Ok(Dynamic::from_ast(&a.lt(&b)))
            }
            TermKind::Ge(a, b) => {
                let (a, b) = (self.lower_int(a)?, self.lower_int(b)?);
                Ok(Dynamic::from_ast(&a.ge(&b)))
            }
            TermKind::Gt(a, b) => {
                let (a, b) = (self.lower_int(a)?, self.lower_int(b)?);
                Ok(Dynamic::from_ast(&a.gt(&b)))
            }
            TermKind::Add(a, b) => {
                let (a, b) = (self.lower_int(a)?, self.lower_int(b)?);
                Ok(Dynamic::from_ast(&(a + b)))
            }
            TermKind::Sub(a, b) => {
                let (a, b) = (self.lower_int(a)?, self.lower_int(b)?);
                Ok(Dynamic::from_ast(&(a - b)))
            }
            TermKind::Ite(c, t, e) => {
                let c = self.lower_bool(c)?;
                let t = self.lower(t)?;
                let e = self.lower(e)?;
                Ok(c.ite(&t, &e))
            }
            TermKind::Forall(vars, body) => {
                let b = self.lower_quantifier_body(vars, body)?;
                let refs: Vec<&dyn Ast> = b.consts.iter().map(|c| c as &dyn Ast).collect();
                Ok(Dynamic::from_ast(&z3::ast::forall_const(
                    self.ctx,
                    &refs,
                    &[],
                    &b.body,
                )))
            }
            TermKind::Exists(vars, body) => {
                let b = self.lower_quantifier_body(vars, body)?;
                let refs: Vec<&dyn Ast> = b.consts.iter().map(|c| c as &dyn Ast).collect();
                Ok(Dynamic::from_ast(&z3::ast::exists_const(
                    self.ctx,
                    &refs,
                    &[],
                    &b.body,
                )))
            }
        }
    }

    fn lower_quantifier_body(
        &mut self,
        vars: &[Symbol],
        body: &Term,
    ) -> BackendResult<LoweredQuantifier<'ctx>> {
        let depth = self.bound.len();
        let mut consts = Vec::new();
        for var in vars {
            let sort = self.z3_sort(var.sort());
            let decl = z3::FuncDecl::new(self.ctx, var.name(), &[], &sort);
            let ast = decl.apply(&[]);
            self.bound.push((var.clone(), ast.clone()));
            consts.push(ast);
        }
        let body = self.lower_bool(body);
        self.bound.truncate(depth);
        Ok(LoweredQuantifier {
            consts,
            body: body?,
        })
    }
}

struct LoweredQuantifier<'ctx> {
    consts: Vec<Dynamic<'ctx>>,
    body: Bool<'ctx>,
}

/// Assert the given formulas in a fresh solver and check satisfiability.
pub fn check(terms: &[Term]) -> BackendResult<z3::SatResult> {
    let cfg = z3::Config::new();
    let ctx = z3::Context::new(&cfg);
    let solver = z3::Solver::new(&ctx);
    let mut lowering = Lowering::new(&ctx);
    for term in terms {
        let formula = lowering.lower_bool(term)?;
        solver.assert(&formula);
    }
    Ok(solver.check())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propositional_unsat() {
        let p = Symbol::constant("p", Sort::Bool);
        let assertion = Term::and(vec![
            Term::constant(p.clone()),
            Term::not(Term::constant(p)),
        ]);
        assert_eq!(check(&[assertion]).unwrap(), z3::SatResult::Unsat);
    }

    #[test]
    fn test_quantified_unsat_over_uninterpreted_sort() {
        let node = Sort::uninterpreted("node");
        let r = Symbol::function("r", vec![node.clone()], Sort::Bool);
        let x = Symbol::constant("x", node.clone());
        let c = Symbol::constant("c", node);

        // forall x: node . r(x), together with !r(c), is unsatisfiable.
        let all = Term::forall(
            vec![x.clone()],
            Term::app(r.clone(), vec![Term::constant(x)]),
        );
        let counter = Term::not(Term::app(r, vec![Term::constant(c)]));
        assert_eq!(check(&[all, counter]).unwrap(), z3::SatResult::Unsat);
    }

    #[test]
    fn test_arithmetic_sat() {
        let n = Symbol::constant("n", Sort::Int);
        let assertion = Term::gt(
            Term::add(Term::constant(n.clone()), Term::int_lit(1)),
            Term::constant(n),
        );
        assert_eq!(check(&[assertion]).unwrap(), z3::SatResult::Sat);
    }
}
