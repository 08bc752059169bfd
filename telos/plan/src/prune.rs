//! Candidate-predecessor pruning: static invariants and the
//! constraint-graph object budget.
use crate::invariants::InvariantSet;
use itertools::Itertools;
use telos_ir::{AbstractState, Term};
use telos_utils::WeightGraph;

/// A state is invalid when two of its atoms match a lifted mutex pattern
/// (or one atom repeats a term across a never-equal position pair).
/// Invalid states never enter the state graph.
pub fn state_invalid(state: &AbstractState, inv: &InvariantSet) -> bool {
    inv.state_violates(state)
}

/// Whether the state demands more distinct objects than the problem has.
///
/// Builds the inequality graph over the state's terms: explicit
/// constraints, implicit inequalities from never-equal predicate
/// positions, and pairwise edges between distinct constants. The greedy
/// maximum-clique lower bound on that graph is the least number of
/// objects any concrete instance needs; when it exceeds the budget the
/// state denotes nothing realisable.
///
/// The clique bound dominates naive variable counting: `on(?x, ?y) &
/// on(?y, ?z)` survives a budget of 2 because `?x` and `?z` may
/// coincide.
pub fn exceeds_object_budget(
    state: &AbstractState,
    inv: &InvariantSet,
    budget: usize,
) -> bool {
    let mut graph: WeightGraph<Term> = WeightGraph::default();

    for atom in &state.atoms {
        for &t in &atom.args {
            graph.ensure_node(t);
        }
    }
    for c in &state.constraints {
        graph.ensure_node(c.0);
        graph.ensure_node(c.1);
    }

    // Explicit inequalities.
    for c in &state.constraints {
        graph.add_edge(&c.0, &c.1);
    }
    // Implicit inequalities from positions that never hold equal terms.
    for atom in state.atoms.iter().filter(|a| !a.negated) {
        if let Some(pairs) = inv.distinct_positions.get(&atom.pred) {
            for &(i, j) in pairs {
                let (a, b) = (atom.args[i], atom.args[j]);
                if a != b {
                    graph.add_edge(&a, &b);
                }
            }
        }
    }
    // Ground constants are implicitly pairwise distinct.
    let constants: Vec<Term> = graph
        .nodes()
        .filter(|t| t.is_const())
        .copied()
        .sorted()
        .collect();
    graph.add_all_edges(constants.iter());

    graph.greedy_clique_bound() > budget
}
