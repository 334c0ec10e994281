//! Quantifier-alternation graph over sorts, consumed by external
//! decidability-fragment analysis.
//!
//! Each translated formula contributes one edge per universal-to-
//! existential alternation reported by the formula layer's
//! introspection; every function declaration contributes an edge from
//! each argument sort to its result sort. Only uninterpreted sorts
//! appear in the graph.

use crate::translator::{TranslateResult, Translator};
use std::collections::BTreeSet;
use tarn_fol::quantifier_alternations;
use tarn_syntax::{Expr, Program};
use tracing::debug;

/// A directed graph whose nodes are sort names. Node and edge sets are
/// ordered, so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QaGraph {
    nodes: BTreeSet<String>,
    edges: BTreeSet<(String, String)>,
}

impl QaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: impl Into<String>) {
        self.nodes.insert(node.into());
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let (from, to) = (from.into(), to.into());
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());
        self.edges.insert((from, to));
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.edges
            .contains(&(from.to_string(), to.to_string()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// The builder's translator uses one synthetic state key so formulas
// over current-state components translate cleanly; the key never
// escapes (only sort names do).
const QA_KEY: &str = "qa";

/// Union of the alternation edges of the given formulas.
pub fn quantifier_alternation_graph<'e>(
    program: &Program,
    exprs: impl IntoIterator<Item = &'e Expr>,
) -> TranslateResult<QaGraph> {
    let mut graph = QaGraph::new();
    for expr in exprs {
        let mut translator = Translator::new(program, [QA_KEY]);
        let term = translator.translate_expr(expr, 0)?;
        for (from, to) in quantifier_alternations(&term) {
            if from.is_uninterpreted() && to.is_uninterpreted() {
                graph.add_edge(from.name(), to.name());
            }
        }
    }
    Ok(graph)
}

/// The alternation graph of a program's axioms and derived-relation
/// definitions plus any additional formulas, extended with an edge from
/// each function argument sort to its result sort.
pub fn decls_quantifier_alternation_graph<'e>(
    program: &'e Program,
    additional: impl IntoIterator<Item = &'e Expr>,
) -> TranslateResult<QaGraph> {
    let exprs: Vec<&Expr> = program
        .axioms()
        .map(|a| &a.expr)
        .chain(program.derived_relations().filter_map(|r| r.derived.as_ref()))
        .chain(additional)
        .collect();
    let mut graph = quantifier_alternation_graph(program, exprs)?;

    for function in program.functions() {
        for arg in &function.arity {
            graph.add_edge(arg.name.clone(), function.sort.name.clone());
        }
    }
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built quantifier-alternation graph"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_resolve::resolve;
    use tarn_syntax::parse;

    fn resolved(source: &str) -> Program {
        let mut program = parse(source).unwrap();
        resolve(&mut program).unwrap();
        program
    }

    #[test]
    fn test_single_alternation_edge() {
        let program = resolved(
            "sort a\n\
             sort b\n\
             immutable relation r(a, b)\n\
             axiom forall x: a . exists y: b . r(x, y)",
        );
        let graph = decls_quantifier_alternation_graph(&program, []).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_edge("a", "b"));
    }

    #[test]
    fn test_function_signature_edges() {
        let program = resolved(
            "sort a\n\
             sort b\n\
             immutable function f(a): b",
        );
        let graph = decls_quantifier_alternation_graph(&program, []).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_edge("a", "b"));
    }

    #[test]
    fn test_no_edge_without_alternation() {
        let program = resolved(
            "sort a\n\
             immutable relation r(a)\n\
             axiom forall x: a . r(x)",
        );
        let graph = decls_quantifier_alternation_graph(&program, []).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_additional_formulas_contribute() {
        let program = resolved(
            "sort a\n\
             sort b\n\
             immutable relation r(a, b)",
        );
        // Resolve the standalone formula in the context of the program
        // by round-tripping it through an invariant declaration.
        let mut with_inv = parse(
            "sort a\n\
             sort b\n\
             immutable relation r(a, b)\n\
             invariant forall x: a . exists y: b . r(x, y)",
        )
        .unwrap();
        resolve(&mut with_inv).unwrap();
        let inv = with_inv.invariants().next().unwrap().expr.clone();

        let graph = quantifier_alternation_graph(&program, [&inv]).unwrap();
        assert!(graph.contains_edge("a", "b"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_derived_definitions_contribute() {
        let program = resolved(
            "sort a\n\
             sort b\n\
             mutable relation r(a, b)\n\
             derived relation total: forall x: a . exists y: b . r(x, y)",
        );
        let graph = decls_quantifier_alternation_graph(&program, []).unwrap();
        assert!(graph.contains_edge("a", "b"));
    }

    #[test]
    fn test_graph_union_deduplicates() {
        let program = resolved(
            "sort a\n\
             sort b\n\
             immutable relation r(a, b)\n\
             immutable function f(a): b\n\
             axiom forall x: a . exists y: b . r(x, y)\n\
             axiom [second] forall x: a . exists y: b . !r(x, y)",
        );
        let graph = decls_quantifier_alternation_graph(&program, []).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
    }
}
