//! Formula introspection: quantifier alternation discovery.
//!
//! Reports, for a given formula, every point where a universal
//! quantifier's scope contains a nested existential quantifier, as a
//! pair of (outer universal sort, inner existential sort). Every
//! universally bound sort in scope is paired with every sort bound by
//! each existential below it; the walk is polarity-blind.

use crate::term::{Sort, Term, TermKind};

/// Enumerate the universal-to-existential alternation pairs of a term.
pub fn quantifier_alternations(term: &Term) -> Vec<(Sort, Sort)> {
    let mut edges = Vec::new();
    let mut universals = Vec::new();
    walk(term, &mut universals, &mut edges);
    edges
}

fn walk(term: &Term, universals: &mut Vec<Sort>, edges: &mut Vec<(Sort, Sort)>) {
    match term.kind() {
        TermKind::Forall(vars, body) => {
            let depth = universals.len();
            universals.extend(vars.iter().map(|v| v.sort().clone()));
            walk(body, universals, edges);
            universals.truncate(depth);
        }
        TermKind::Exists(vars, body) => {
            for outer in universals.iter() {
                for var in vars {
                    edges.push((outer.clone(), var.sort().clone()));
                }
            }
            walk(body, universals, edges);
        }
        TermKind::BoolLit(_) | TermKind::IntLit(_) | TermKind::Const(_) => {}
        TermKind::App(_, args) | TermKind::Distinct(args) | TermKind::And(args)
        | TermKind::Or(args) => {
            for arg in args {
                walk(arg, universals, edges);
            }
        }
        TermKind::Not(a) => walk(a, universals, edges),
        TermKind::Implies(a, b)
        | TermKind::Iff(a, b)
        | TermKind::Eq(a, b)
        | TermKind::Le(a, b)
        | TermKind::Lt(a, b)
        | TermKind::Ge(a, b)
        | TermKind::Gt(a, b)
        | TermKind::Add(a, b)
        | TermKind::Sub(a, b) => {
            walk(a, universals, edges);
            walk(b, universals, edges);
        }
        TermKind::Ite(c, t, e) => {
            walk(c, universals, edges);
            walk(t, universals, edges);
            walk(e, universals, edges);
        }
    }
}
