//! The resolver pass: duplicate detection, name resolution, sort
//! existence checks, bound-variable sort inference, and the rewrite of
//! `old(...)` into the internal new-state marking.
//!
//! Transition guards and twostate theorems are written with the *next*
//! state as the default vocabulary and `old(e)` reaching back to the
//! current one. The translator only understands the opposite
//! orientation, so this pass wraps every mutable state reference that
//! is not under `old` in a new-state marker and strips the `old`
//! wrappers themselves. An `old` that survives resolution (nested
//! `old`, or `old` in a one-state context) is reported by the
//! translator as a contract violation.

use crate::error::{ResolveError, ResolveResult};
use std::collections::{HashMap, HashSet};
use tarn_syntax::{
    AutomatonComponent, Binder, Decl, Expr, ExprKind, PhaseComponent, Program, SortRef, SortedVar,
    Span, Stmt, TransitionBody, UnaryOp,
};
use tracing::debug;

const BOOL: &str = "bool";
const INT: &str = "int";

fn is_builtin_sort(name: &str) -> bool {
    name == BOOL || name == INT
}

/// Owned signatures of the program's global namespaces, collected up
/// front so declaration bodies can be resolved in any order.
struct Signatures {
    sorts: HashSet<String>,
    items: HashMap<String, SigKind>,
}

#[derive(Debug, Clone)]
enum SigKind {
    Relation {
        arity: Vec<String>,
        mutable: bool,
        derived: bool,
    },
    Constant {
        sort: String,
        mutable: bool,
    },
    Function {
        arity: Vec<String>,
        sort: String,
        mutable: bool,
    },
    Definition {
        params: Vec<Option<String>>,
    },
}

impl Signatures {
    fn collect(program: &Program) -> ResolveResult<Self> {
        let mut sorts = HashSet::new();
        for decl in program.sorts() {
            let name = &decl.name.name;
            if is_builtin_sort(name) || !sorts.insert(name.clone()) {
                return Err(ResolveError::Duplicate {
                    name: name.clone(),
                    span: decl.name.span,
                });
            }
        }

        let mut items: HashMap<String, SigKind> = HashMap::new();
        let mut insert = |name: &tarn_syntax::Ident, kind: SigKind| -> ResolveResult<()> {
            if items.contains_key(&name.name) {
                return Err(ResolveError::Duplicate {
                    name: name.name.clone(),
                    span: name.span,
                });
            }
            items.insert(name.name.clone(), kind);
            Ok(())
        };

        for decl in &program.decls {
            match decl {
                Decl::Relation(d) => {
                    check_sorts(&sorts, &d.arity)?;
                    insert(
                        &d.name,
                        SigKind::Relation {
                            arity: d.arity.iter().map(|s| s.name.clone()).collect(),
                            mutable: d.mutable,
                            derived: d.is_derived(),
                        },
                    )?;
                }
                Decl::Constant(d) => {
                    check_sorts(&sorts, std::slice::from_ref(&d.sort))?;
                    insert(
                        &d.name,
                        SigKind::Constant {
                            sort: d.sort.name.clone(),
                            mutable: d.mutable,
                        },
                    )?;
                }
                Decl::Function(d) => {
                    check_sorts(&sorts, &d.arity)?;
                    check_sorts(&sorts, std::slice::from_ref(&d.sort))?;
                    insert(
                        &d.name,
                        SigKind::Function {
                            arity: d.arity.iter().map(|s| s.name.clone()).collect(),
                            sort: d.sort.name.clone(),
                            mutable: d.mutable,
                        },
                    )?;
                }
                Decl::Transition(d) => {
                    for param in &d.params {
                        if let Some(sort) = &param.sort {
                            check_sorts(&sorts, std::slice::from_ref(sort))?;
                        }
                    }
                    insert(
                        &d.name,
                        SigKind::Definition {
                            params: d
                                .params
                                .iter()
                                .map(|p| p.sort.as_ref().map(|s| s.name.clone()))
                                .collect(),
                        },
                    )?;
                }
                _ => {}
            }
        }

        Ok(Self { sorts, items })
    }

    fn sort_exists(&self, name: &str) -> bool {
        is_builtin_sort(name) || self.sorts.contains(name)
    }

    fn is_mutable_state(&self, name: &str) -> bool {
        matches!(
            self.items.get(name),
            Some(SigKind::Relation { mutable: true, .. })
                | Some(SigKind::Constant { mutable: true, .. })
                | Some(SigKind::Function { mutable: true, .. })
        )
    }

    fn is_state(&self, name: &str) -> bool {
        matches!(
            self.items.get(name),
            Some(SigKind::Relation { .. })
                | Some(SigKind::Constant { .. })
                | Some(SigKind::Function { .. })
        )
    }
}

fn check_sorts(sorts: &HashSet<String>, refs: &[SortRef]) -> ResolveResult<()> {
    for sort in refs {
        if !is_builtin_sort(&sort.name) && !sorts.contains(&sort.name) {
            return Err(ResolveError::UndeclaredSort {
                name: sort.name.clone(),
                span: sort.span,
            });
        }
    }
    Ok(())
}

/// A bound variable during resolution; the sort is a sort name, filled
/// in by inference.
struct LocalVar {
    name: String,
    sort: Option<String>,
}

/// Resolve a program in place: validates names and sorts, fills in
/// omitted bound-variable sorts, and rewrites `old` in two-state
/// contexts. Must run before translation.
pub fn resolve(program: &mut Program) -> ResolveResult<()> {
    let sigs = Signatures::collect(program)?;
    let mut resolver = Resolver {
        sigs,
        locals: Vec::new(),
    };
    for decl in &mut program.decls {
        resolver.resolve_decl(decl)?;
    }
    debug!(decls = program.decls.len(), "resolved program");
    Ok(())
}

struct Resolver {
    sigs: Signatures,
    /// Local variable frames, innermost last.
    locals: Vec<Vec<LocalVar>>,
}

impl Resolver {
    fn resolve_decl(&mut self, decl: &mut Decl) -> ResolveResult<()> {
        match decl {
            Decl::Sort(_) | Decl::Constant(_) | Decl::Function(_) => Ok(()),
            Decl::Relation(d) => match &mut d.derived {
                Some(expr) => self.resolve_expr(expr, Some(BOOL)),
                None => Ok(()),
            },
            Decl::Axiom(d) => self.resolve_expr(&mut d.expr, Some(BOOL)),
            Decl::Init(d) => self.resolve_expr(&mut d.expr, Some(BOOL)),
            Decl::Invariant(d) => self.resolve_expr(&mut d.expr, Some(BOOL)),
            Decl::Theorem(d) => {
                if d.is_twostate {
                    let expr = std::mem::replace(&mut d.expr, Expr::bool_lit(true));
                    d.expr = self.old_to_new(expr, &mut Vec::new());
                }
                self.resolve_expr(&mut d.expr, Some(BOOL))
            }
            Decl::Transition(d) => {
                let frame = self.frame_from_vars(&d.params)?;
                self.locals.push(frame);
                let result = match &mut d.body {
                    TransitionBody::Relation { mods, expr } => {
                        let mut result = Ok(());
                        for m in mods {
                            if !self.sigs.is_state(&m.name.name) {
                                result = Err(ResolveError::Unresolved {
                                    name: m.name.name.clone(),
                                    span: m.name.span,
                                });
                                break;
                            }
                        }
                        if result.is_ok() {
                            let mut shadowed: Vec<String> =
                                d.params.iter().map(|p| p.name.name.clone()).collect();
                            let body = std::mem::replace(expr, Expr::bool_lit(true));
                            *expr = self.old_to_new(body, &mut shadowed);
                            result = self.resolve_expr(expr, Some(BOOL));
                        }
                        result
                    }
                    TransitionBody::Block(block) => {
                        let mut result = Ok(());
                        for stmt in &mut block.stmts {
                            result = match stmt {
                                Stmt::Assume(s) => self.resolve_expr(&mut s.expr, Some(BOOL)),
                                Stmt::Assign(a) => self.resolve_assign(a),
                            };
                            if result.is_err() {
                                break;
                            }
                        }
                        result
                    }
                };
                let frame = self.locals.pop().expect("transition frame");
                result?;
                write_back(&mut d.params, frame)
            }
            Decl::Automaton(d) => {
                for component in &mut d.components {
                    let phase_components = match component {
                        AutomatonComponent::Global(g) => &mut g.components,
                        AutomatonComponent::Phase(p) => &mut p.components,
                        AutomatonComponent::InitPhase(_) => continue,
                    };
                    for pc in phase_components {
                        match pc {
                            PhaseComponent::Transition(pt) => {
                                if !matches!(
                                    self.sigs.items.get(&pt.transition.name),
                                    Some(SigKind::Definition { .. })
                                ) {
                                    return Err(ResolveError::Unresolved {
                                        name: pt.transition.name.clone(),
                                        span: pt.transition.span,
                                    });
                                }
                                if let Some(guard) = &mut pt.guard {
                                    self.resolve_expr(guard, Some(BOOL))?;
                                }
                            }
                            PhaseComponent::Invariant(i) => {
                                self.resolve_expr(&mut i.expr, Some(BOOL))?;
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn resolve_assign(&mut self, assign: &mut tarn_syntax::AssignStmt) -> ResolveResult<()> {
        let name = assign.target.name.clone();
        let span = assign.target.span;
        let (arg_sorts, value_sort) = match self.sigs.items.get(&name) {
            Some(SigKind::Relation {
                arity,
                mutable: true,
                derived: false,
            }) => (arity.clone(), BOOL.to_string()),
            Some(SigKind::Constant {
                sort,
                mutable: true,
            }) => (Vec::new(), sort.clone()),
            Some(SigKind::Function {
                arity,
                sort,
                mutable: true,
            }) => (arity.clone(), sort.clone()),
            _ => return Err(ResolveError::NotAssignable { name, span }),
        };
        if assign.args.len() != arg_sorts.len() {
            return Err(ResolveError::ArityMismatch {
                name,
                expected: arg_sorts.len(),
                found: assign.args.len(),
                span,
            });
        }
        for (arg, sort) in assign.args.iter_mut().zip(&arg_sorts) {
            self.resolve_expr(arg, Some(sort))?;
        }
        self.resolve_expr(&mut assign.value, Some(&value_sort))
    }

    // === The old-to-new rewrite ===

    /// Rewrite a two-state expression from "next state by default,
    /// `old` for current" into the internal "current state by default,
    /// new-state markers" form. `shadowed` holds the names bound by
    /// enclosing binders, which refer to values rather than state.
    fn old_to_new(&self, expr: Expr, shadowed: &mut Vec<String>) -> Expr {
        let Expr { kind, span } = expr;
        let kind = match kind {
            ExprKind::Unary {
                op: UnaryOp::Old,
                arg,
            } => {
                // The operand already speaks about the current state.
                return *arg;
            }
            ExprKind::Id(name) => {
                if !shadowed.contains(&name) && self.sigs.is_mutable_state(&name) {
                    ExprKind::Unary {
                        op: UnaryOp::New,
                        arg: Box::new(Expr::new(ExprKind::Id(name), span)),
                    }
                } else {
                    ExprKind::Id(name)
                }
            }
            ExprKind::App { callee, args } => {
                if !shadowed.contains(&callee.name) && self.sigs.is_mutable_state(&callee.name) {
                    // The marker shifts the whole application, argument
                    // vocabulary included.
                    ExprKind::Unary {
                        op: UnaryOp::New,
                        arg: Box::new(Expr::new(ExprKind::App { callee, args }, span)),
                    }
                } else {
                    ExprKind::App {
                        callee,
                        args: args
                            .into_iter()
                            .map(|a| self.old_to_new(a, shadowed))
                            .collect(),
                    }
                }
            }
            ExprKind::Unary { op, arg } => ExprKind::Unary {
                op,
                arg: Box::new(self.old_to_new(*arg, shadowed)),
            },
            ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
                op,
                lhs: Box::new(self.old_to_new(*lhs, shadowed)),
                rhs: Box::new(self.old_to_new(*rhs, shadowed)),
            },
            ExprKind::Nary { op, args } => ExprKind::Nary {
                op,
                args: args
                    .into_iter()
                    .map(|a| self.old_to_new(a, shadowed))
                    .collect(),
            },
            ExprKind::Quantifier {
                quant,
                binder,
                body,
            } => {
                let depth = shadowed.len();
                shadowed.extend(binder.vars.iter().map(|v| v.name.name.clone()));
                let body = Box::new(self.old_to_new(*body, shadowed));
                shadowed.truncate(depth);
                ExprKind::Quantifier {
                    quant,
                    binder,
                    body,
                }
            }
            ExprKind::Ite { cond, then, els } => ExprKind::Ite {
                cond: Box::new(self.old_to_new(*cond, shadowed)),
                then: Box::new(self.old_to_new(*then, shadowed)),
                els: Box::new(self.old_to_new(*els, shadowed)),
            },
            ExprKind::Let { var, val, body } => {
                let val = Box::new(self.old_to_new(*val, shadowed));
                let depth = shadowed.len();
                shadowed.push(var.name.name.clone());
                let body = Box::new(self.old_to_new(*body, shadowed));
                shadowed.truncate(depth);
                ExprKind::Let { var, val, body }
            }
            k @ (ExprKind::Bool(_) | ExprKind::Int(_)) => k,
        };
        Expr::new(kind, span)
    }

    // === Expression resolution with sort inference ===

    fn resolve_expr(&mut self, expr: &mut Expr, expected: Option<&str>) -> ResolveResult<()> {
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::Bool(_) | ExprKind::Int(_) => Ok(()),
            ExprKind::Id(name) => {
                let name = name.clone();
                self.resolve_id(&name, expected, span)
            }
            ExprKind::Unary { op, arg } => match op {
                UnaryOp::Not => self.resolve_expr(arg, Some(BOOL)),
                // State offsets do not change the sort.
                UnaryOp::New | UnaryOp::Old => self.resolve_expr(arg, expected),
            },
            ExprKind::Binary { op, lhs, rhs } => {
                use tarn_syntax::BinOp::*;
                match op {
                    Implies | Iff => {
                        self.resolve_expr(lhs, Some(BOOL))?;
                        self.resolve_expr(rhs, Some(BOOL))
                    }
                    Equal | NotEq => {
                        let rhint = self.sort_of(rhs);
                        self.resolve_expr(lhs, rhint.as_deref())?;
                        let lhint = self.sort_of(lhs);
                        self.resolve_expr(rhs, lhint.as_deref())
                    }
                    Ge | Gt | Le | Lt | Add | Sub => {
                        self.resolve_expr(lhs, Some(INT))?;
                        self.resolve_expr(rhs, Some(INT))
                    }
                }
            }
            ExprKind::Nary { op, args } => match op {
                tarn_syntax::NaryOp::And | tarn_syntax::NaryOp::Or => {
                    for arg in args {
                        self.resolve_expr(arg, Some(BOOL))?;
                    }
                    Ok(())
                }
                tarn_syntax::NaryOp::Distinct => {
                    let hint = args.iter().find_map(|a| self.sort_of(a));
                    for arg in args {
                        self.resolve_expr(arg, hint.as_deref())?;
                    }
                    Ok(())
                }
            },
            ExprKind::App { callee, args } => {
                let name = callee.name.clone();
                let callee_span = callee.span;
                if self.lookup_local(&name).is_some() {
                    return Err(ResolveError::NotApplicable {
                        name,
                        span: callee_span,
                    });
                }
                let arg_sorts: Vec<Option<String>> = match self.sigs.items.get(&name) {
                    Some(SigKind::Relation { arity, .. })
                    | Some(SigKind::Function { arity, .. }) => {
                        arity.iter().cloned().map(Some).collect()
                    }
                    Some(SigKind::Definition { params }) => params.clone(),
                    Some(SigKind::Constant { .. }) => {
                        return Err(ResolveError::NotApplicable {
                            name,
                            span: callee_span,
                        });
                    }
                    None => {
                        return Err(ResolveError::Unresolved {
                            name,
                            span: callee_span,
                        });
                    }
                };
                if args.len() != arg_sorts.len() {
                    return Err(ResolveError::ArityMismatch {
                        name,
                        expected: arg_sorts.len(),
                        found: args.len(),
                        span: callee_span,
                    });
                }
                for (arg, sort) in args.iter_mut().zip(arg_sorts) {
                    self.resolve_expr(arg, sort.as_deref())?;
                }
                Ok(())
            }
            ExprKind::Quantifier { binder, body, .. } => {
                let frame = self.frame_from_binder(binder)?;
                self.locals.push(frame);
                let result = self.resolve_expr(body, Some(BOOL));
                let frame = self.locals.pop().expect("quantifier frame");
                result?;
                write_back(&mut binder.vars, frame)
            }
            ExprKind::Ite { cond, then, els } => {
                self.resolve_expr(cond, Some(BOOL))?;
                let ehint = self.sort_of(els);
                self.resolve_expr(then, expected.map(str::to_string).or(ehint).as_deref())?;
                let thint = self.sort_of(then);
                self.resolve_expr(els, expected.map(str::to_string).or(thint).as_deref())
            }
            ExprKind::Let { var, val, body } => {
                if let Some(sort) = &var.sort {
                    if !self.sigs.sort_exists(&sort.name) {
                        return Err(ResolveError::UndeclaredSort {
                            name: sort.name.clone(),
                            span: sort.span,
                        });
                    }
                }
                let hint = var.sort.as_ref().map(|s| s.name.clone());
                self.resolve_expr(val, hint.as_deref())?;
                let inferred = hint.or_else(|| self.sort_of(val));
                self.locals.push(vec![LocalVar {
                    name: var.name.name.clone(),
                    sort: inferred,
                }]);
                let result = self.resolve_expr(body, expected);
                let frame = self.locals.pop().expect("let frame");
                result?;
                write_back(std::slice::from_mut(var), frame)
            }
        }
    }

    fn resolve_id(&mut self, name: &str, expected: Option<&str>, span: Span) -> ResolveResult<()> {
        for frame in self.locals.iter_mut().rev() {
            for var in frame.iter_mut().rev() {
                if var.name == name {
                    if var.sort.is_none() {
                        if let Some(exp) = expected {
                            var.sort = Some(exp.to_string());
                        }
                    }
                    return Ok(());
                }
            }
        }
        match self.sigs.items.get(name) {
            Some(SigKind::Relation { arity, .. }) if arity.is_empty() => Ok(()),
            Some(SigKind::Relation { .. }) | Some(SigKind::Function { .. }) => {
                Err(ResolveError::NeedsArguments {
                    name: name.to_string(),
                    span,
                })
            }
            Some(SigKind::Constant { .. }) => Ok(()),
            Some(SigKind::Definition { params }) if params.is_empty() => Ok(()),
            Some(SigKind::Definition { .. }) => Err(ResolveError::NeedsArguments {
                name: name.to_string(),
                span,
            }),
            None => Err(ResolveError::Unresolved {
                name: name.to_string(),
                span,
            }),
        }
    }

    fn lookup_local(&self, name: &str) -> Option<&LocalVar> {
        for frame in self.locals.iter().rev() {
            for var in frame.iter().rev() {
                if var.name == name {
                    return Some(var);
                }
            }
        }
        None
    }

    /// Best-effort syntactic sort of an expression, used as an
    /// inference hint. Returns a sort name.
    fn sort_of(&self, expr: &Expr) -> Option<String> {
        match &expr.kind {
            ExprKind::Bool(_) => Some(BOOL.to_string()),
            ExprKind::Int(_) => Some(INT.to_string()),
            ExprKind::Id(name) => {
                if let Some(var) = self.lookup_local(name) {
                    return var.sort.clone();
                }
                match self.sigs.items.get(name) {
                    Some(SigKind::Relation { arity, .. }) if arity.is_empty() => {
                        Some(BOOL.to_string())
                    }
                    Some(SigKind::Constant { sort, .. }) => Some(sort.clone()),
                    Some(SigKind::Definition { .. }) => Some(BOOL.to_string()),
                    _ => None,
                }
            }
            ExprKind::App { callee, .. } => match self.sigs.items.get(&callee.name) {
                Some(SigKind::Relation { .. }) | Some(SigKind::Definition { .. }) => {
                    Some(BOOL.to_string())
                }
                Some(SigKind::Function { sort, .. }) => Some(sort.clone()),
                _ => None,
            },
            ExprKind::Unary { op, arg } => match op {
                UnaryOp::Not => Some(BOOL.to_string()),
                UnaryOp::New | UnaryOp::Old => self.sort_of(arg),
            },
            ExprKind::Binary { op, .. } => {
                use tarn_syntax::BinOp::*;
                match op {
                    Add | Sub => Some(INT.to_string()),
                    _ => Some(BOOL.to_string()),
                }
            }
            ExprKind::Nary { .. } | ExprKind::Quantifier { .. } => Some(BOOL.to_string()),
            ExprKind::Ite { then, els, .. } => self.sort_of(then).or_else(|| self.sort_of(els)),
            ExprKind::Let { body, .. } => self.sort_of(body),
        }
    }

    fn frame_from_binder(&self, binder: &Binder) -> ResolveResult<Vec<LocalVar>> {
        self.frame_from_vars(&binder.vars)
    }

    fn frame_from_vars(&self, vars: &[SortedVar]) -> ResolveResult<Vec<LocalVar>> {
        vars.iter()
            .map(|var| {
                if let Some(sort) = &var.sort {
                    if !self.sigs.sort_exists(&sort.name) {
                        return Err(ResolveError::UndeclaredSort {
                            name: sort.name.clone(),
                            span: sort.span,
                        });
                    }
                }
                Ok(LocalVar {
                    name: var.name.name.clone(),
                    sort: var.sort.as_ref().map(|s| s.name.clone()),
                })
            })
            .collect()
    }
}

/// Write inferred sorts back into the binder. Every variable must have
/// a concrete sort by now.
fn write_back(vars: &mut [SortedVar], frame: Vec<LocalVar>) -> ResolveResult<()> {
    for (var, local) in vars.iter_mut().zip(frame) {
        if var.sort.is_none() {
            match local.sort {
                Some(sort) => {
                    var.sort = Some(SortRef::new(sort, var.name.span));
                }
                None => {
                    return Err(ResolveError::UnresolvedSort {
                        name: var.name.name.clone(),
                        span: var.name.span,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_syntax::parse;

    fn resolved(source: &str) -> Program {
        let mut program = parse(source).unwrap();
        resolve(&mut program).unwrap();
        program
    }

    fn resolve_err(source: &str) -> ResolveError {
        let mut program = parse(source).unwrap();
        resolve(&mut program).unwrap_err()
    }

    #[test]
    fn test_fills_annotated_binders() {
        let program = resolved(
            "sort node\n\
             mutable relation r(node)\n\
             axiom forall x: node . r(x)",
        );
        let axiom = program.axioms().next().unwrap();
        match &axiom.expr.kind {
            ExprKind::Quantifier { binder, .. } => {
                assert_eq!(binder.vars[0].sort.as_ref().unwrap().name, "node");
            }
            _ => panic!("expected quantifier"),
        }
    }

    #[test]
    fn test_infers_sort_from_application() {
        let program = resolved(
            "sort node\n\
             mutable relation r(node)\n\
             axiom forall x . r(x)",
        );
        let axiom = program.axioms().next().unwrap();
        match &axiom.expr.kind {
            ExprKind::Quantifier { binder, .. } => {
                assert_eq!(binder.vars[0].sort.as_ref().unwrap().name, "node");
            }
            _ => panic!("expected quantifier"),
        }
    }

    #[test]
    fn test_infers_sort_from_equality() {
        let program = resolved(
            "sort node\n\
             immutable constant root: node\n\
             axiom forall x . x = root",
        );
        let axiom = program.axioms().next().unwrap();
        match &axiom.expr.kind {
            ExprKind::Quantifier { binder, .. } => {
                assert_eq!(binder.vars[0].sort.as_ref().unwrap().name, "node");
            }
            _ => panic!("expected quantifier"),
        }
    }

    #[test]
    fn test_uninferable_sort_is_an_error() {
        let err = resolve_err("axiom forall x . x = x");
        assert!(matches!(err, ResolveError::UnresolvedSort { .. }));
    }

    #[test]
    fn test_duplicate_declaration() {
        let err = resolve_err("sort node\nsort node");
        assert!(matches!(err, ResolveError::Duplicate { .. }));
        let err = resolve_err("mutable relation r\nmutable constant r: bool");
        assert!(matches!(err, ResolveError::Duplicate { .. }));
    }

    #[test]
    fn test_undeclared_sort() {
        let err = resolve_err("mutable relation r(node)");
        assert!(matches!(err, ResolveError::UndeclaredSort { .. }));
    }

    #[test]
    fn test_unknown_identifier() {
        let err = resolve_err("axiom missing");
        assert!(matches!(err, ResolveError::Unresolved { .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = resolve_err(
            "sort node\n\
             mutable relation r(node)\n\
             axiom forall x: node . r(x, x)",
        );
        assert!(matches!(err, ResolveError::ArityMismatch { .. }));
    }

    #[test]
    fn test_function_needs_arguments() {
        let err = resolve_err(
            "sort node\n\
             immutable function f(node): node\n\
             axiom forall x: node . f = x",
        );
        assert!(matches!(err, ResolveError::NeedsArguments { .. }));
    }

    #[test]
    fn test_old_rewrite_in_transition_guard() {
        let program = resolved(
            "mutable relation lock\n\
             transition acquire()\n\
                 modifies lock\n\
                 old(!lock) & lock",
        );
        let transition = program.transitions().next().unwrap();
        let TransitionBody::Relation { expr, .. } = &transition.body else {
            panic!("expected relation body");
        };
        let ExprKind::Nary { args, .. } = &expr.kind else {
            panic!("expected conjunction, got {:?}", expr.kind);
        };
        // old(!lock): the pre-state operand, with the wrapper stripped.
        match &args[0].kind {
            ExprKind::Unary {
                op: UnaryOp::Not,
                arg,
            } => assert!(matches!(arg.kind, ExprKind::Id(_))),
            k => panic!("expected pre-state negation, got {:?}", k),
        }
        // plain `lock`: post-state, marked with New.
        assert!(matches!(
            args[1].kind,
            ExprKind::Unary {
                op: UnaryOp::New,
                ..
            }
        ));
    }

    #[test]
    fn test_old_rewrite_leaves_immutable_alone() {
        let program = resolved(
            "sort node\n\
             mutable relation holds(node)\n\
             immutable relation le(node, node)\n\
             transition t(n: node)\n\
                 modifies holds\n\
                 le(n, n) & holds(n)",
        );
        let transition = program.transitions().next().unwrap();
        let TransitionBody::Relation { expr, .. } = &transition.body else {
            panic!("expected relation body");
        };
        let ExprKind::Nary { args, .. } = &expr.kind else {
            panic!("expected conjunction");
        };
        assert!(matches!(args[0].kind, ExprKind::App { .. }));
        assert!(matches!(
            args[1].kind,
            ExprKind::Unary {
                op: UnaryOp::New,
                ..
            }
        ));
    }

    #[test]
    fn test_transition_param_sort_inference() {
        let program = resolved(
            "sort node\n\
             mutable relation holds(node)\n\
             transition grab(n)\n\
                 modifies holds\n\
                 holds(n)",
        );
        let transition = program.transitions().next().unwrap();
        assert_eq!(transition.params[0].sort.as_ref().unwrap().name, "node");
    }

    #[test]
    fn test_assignment_target_checks() {
        let err = resolve_err(
            "immutable relation frozen\n\
             transition t() {\n\
                 frozen := true;\n\
             }",
        );
        assert!(matches!(err, ResolveError::NotAssignable { .. }));

        let err = resolve_err(
            "derived relation busy: true\n\
             transition t() {\n\
                 busy := true;\n\
             }",
        );
        assert!(matches!(err, ResolveError::NotAssignable { .. }));
    }

    #[test]
    fn test_block_statements_resolve() {
        let program = resolved(
            "sort node\n\
             mutable relation holds(node)\n\
             mutable relation lock\n\
             transition release(n: node) {\n\
                 assume holds(n);\n\
                 lock := false;\n\
                 holds(n) := false;\n\
             }",
        );
        assert_eq!(
            program.transitions().next().unwrap().modifies(),
            vec!["lock", "holds"]
        );
    }

    #[test]
    fn test_automaton_guard_resolution() {
        let err = resolve_err(
            "mutable relation lock\n\
             automaton {\n\
                 phase p\n\
                     transition missing -> self\n\
             }",
        );
        assert!(matches!(err, ResolveError::Unresolved { .. }));
    }

    #[test]
    fn test_modifies_unknown_component() {
        let err = resolve_err(
            "mutable relation lock\n\
             transition t()\n\
                 modifies nothing\n\
                 lock",
        );
        assert!(matches!(err, ResolveError::Unresolved { .. }));
    }
}
