//! Rewriting DFA edge labels into mutually exclusive atomic partitions.
//!
//! After refinement every edge carries a single partition symbol and the
//! automaton remains deterministic: partitions are pairwise incompatible
//! and jointly exhaustive over the used support.
mod bdd;
mod minterm;

pub use bdd::BddRefiner;
pub use minterm::MintermRefiner;

use linked_hash_map::LinkedHashMap;
use std::collections::BTreeSet;
use strum_macros::{Display, EnumString};
use telos_ir::{Atom, Dfa, GroundingMap, Guard};
use telos_utils::{Error, Id, TelosResult};

/// Which refinement backend to use. `Auto` picks the minterm method for
/// small supports and the BDD-assisted one past [BDD_THRESHOLD] symbols.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RefinerKind {
    Minterm,
    Bdd,
    Auto,
}

/// Support size beyond which `Auto` switches to the BDD backend.
pub const BDD_THRESHOLD: usize = 15;

/// One atomic partition: a truth assignment over the support, named by a
/// fresh symbol `p0, p1, ...`.
#[derive(Clone, Debug)]
pub struct Partition {
    pub symbol: Id,
    /// Assignment over the support, in symbol order.
    pub assignment: LinkedHashMap<Id, bool>,
    /// Canonical expression string, for reporting.
    pub expr: String,
}

impl Partition {
    /// The conjunction this partition denotes.
    pub fn guard(&self) -> Guard {
        self.assignment
            .iter()
            .map(|(&sym, &val)| {
                let atom = Guard::Atom(sym);
                if val { atom } else { Guard::not(atom) }
            })
            .reduce(Guard::and)
            .unwrap_or(Guard::True)
    }

    /// The goal conditions this partition stands for: its DNF expansion
    /// with every literal decoded through the grounding map. A partition is
    /// a single assignment, so this is one conjunction of (possibly
    /// negated) ground atoms.
    pub fn goals(&self, gmap: &GroundingMap) -> TelosResult<Vec<Vec<Atom>>> {
        self.guard()
            .dnf()
            .into_iter()
            .map(|conj| {
                conj.into_iter()
                    .map(|(sym, val)| gmap.decode_atom(sym, !val))
                    .collect::<TelosResult<Vec<_>>>()
            })
            .collect()
    }
}

/// A refined transition: endpoints plus a partition symbol.
#[derive(Clone, Debug)]
pub struct RefinedEdge {
    pub from: Id,
    pub to: Id,
    pub partition: Id,
    /// The raw label the partition came from, for reporting.
    pub source_label: String,
}

/// The refined automaton.
#[derive(Debug)]
pub struct RefinedDfa {
    pub init: Id,
    pub accepting: Vec<Id>,
    pub partitions: LinkedHashMap<Id, Partition>,
    pub edges: Vec<RefinedEdge>,
    /// Original label text to the partitions that satisfy it.
    pub label_partitions: LinkedHashMap<String, Vec<Id>>,
}

/// A refinement backend. Both implementations honor the same contract;
/// they differ only in how they cope with large supports.
pub trait Refine {
    fn name(&self) -> &'static str;
    fn refine(&self, dfa: &Dfa) -> TelosResult<RefinedDfa>;
}

/// Select a backend for the given configuration and DFA support size.
pub fn refiner_for(kind: RefinerKind, support: usize) -> Box<dyn Refine> {
    match kind {
        RefinerKind::Minterm => Box::new(MintermRefiner),
        RefinerKind::Bdd => Box::new(BddRefiner),
        RefinerKind::Auto => {
            if support <= BDD_THRESHOLD {
                Box::new(MintermRefiner)
            } else {
                Box::new(BddRefiner)
            }
        }
    }
}

/// Hard cap on minterm enumeration. The refiners reject supports past this
/// size instead of silently grinding through 2^n assignments.
const MAX_SUPPORT: usize = 24;

/// Shared enumeration core: given per-edge guards (already simplified by
/// the caller if it wants to), enumerate every assignment over `support`,
/// retain those satisfying at least one guard, and rebuild the edge set
/// with one edge per (original edge, satisfying partition).
pub(crate) fn enumerate_partitions(
    dfa: &Dfa,
    guards: &[Guard],
    support: &BTreeSet<Id>,
) -> TelosResult<RefinedDfa> {
    assert_eq!(dfa.edges.len(), guards.len());
    // Fixed symbol order, by spelling, so partition numbering does not
    // depend on interning history.
    let mut symbols: Vec<Id> = support.iter().copied().collect();
    symbols.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    if symbols.len() > MAX_SUPPORT {
        return Err(Error::misc(format!(
            "label support of {} symbols is too large to partition",
            symbols.len()
        )));
    }

    let time = std::time::Instant::now();
    let mut partitions: LinkedHashMap<Id, Partition> = LinkedHashMap::new();
    // Partition index for each retained assignment, addressed by the
    // assignment's bit pattern.
    let mut retained: Vec<(u64, Id)> = Vec::new();

    for bits in 0u64..(1u64 << symbols.len()) {
        let lookup = |id: Id| -> bool {
            symbols
                .iter()
                .position(|&s| s == id)
                .is_some_and(|i| bits & (1 << i) != 0)
        };
        if !guards.iter().any(|g| g.eval(&lookup)) {
            continue;
        }
        let symbol = Id::new(format!("p{}", partitions.len()));
        let assignment: LinkedHashMap<Id, bool> = symbols
            .iter()
            .enumerate()
            .map(|(i, &s)| (s, bits & (1 << i) != 0))
            .collect();
        let expr = render_assignment(&assignment);
        partitions.insert(
            symbol,
            Partition {
                symbol,
                assignment,
                expr,
            },
        );
        retained.push((bits, symbol));
    }

    let mut edges: Vec<RefinedEdge> = Vec::new();
    let mut label_partitions: LinkedHashMap<String, Vec<Id>> =
        LinkedHashMap::new();
    for (edge, guard) in dfa.edges.iter().zip(guards) {
        let mut satisfying: Vec<Id> = Vec::new();
        for &(bits, symbol) in &retained {
            let lookup = |id: Id| -> bool {
                symbols
                    .iter()
                    .position(|&s| s == id)
                    .is_some_and(|i| bits & (1 << i) != 0)
            };
            if guard.eval(&lookup) {
                satisfying.push(symbol);
                edges.push(RefinedEdge {
                    from: edge.from,
                    to: edge.to,
                    partition: symbol,
                    source_label: edge.label.clone(),
                });
            }
        }
        label_partitions
            .entry(edge.label.clone())
            .or_insert_with(Vec::new)
            .extend(satisfying);
    }
    for (_, parts) in label_partitions.iter_mut() {
        parts.dedup();
    }

    log::info!(
        "Refined {} labels into {} partitions over {} symbols in {}ms",
        label_partitions.len(),
        partitions.len(),
        symbols.len(),
        time.elapsed().as_millis()
    );

    Ok(RefinedDfa {
        init: dfa.init,
        accepting: dfa.accepting.clone(),
        partitions,
        edges,
        label_partitions,
    })
}

fn render_assignment(assignment: &LinkedHashMap<Id, bool>) -> String {
    use itertools::Itertools;
    if assignment.is_empty() {
        return "true".to_string();
    }
    assignment
        .iter()
        .map(|(sym, &val)| {
            if val {
                sym.to_string()
            } else {
                format!("~{sym}")
            }
        })
        .join(" & ")
}

#[cfg(test)]
mod tests {
    use super::{Refine, RefinedDfa, RefinerKind, refiner_for};
    use telos_frontend::ast::DfaDef;
    use telos_ir::{Dfa, GroundingMap};
    use telos_utils::Id;

    fn refine(dot: &str, kind: RefinerKind) -> RefinedDfa {
        let dfa = Dfa::from_ast(DfaDef::construct_from_str(dot).unwrap());
        let refiner = refiner_for(kind, dfa.support().len());
        refiner.refine(&dfa).unwrap()
    }

    const TWO_GOAL_DOT: &str = r#"digraph MONA_DFA {
        node [shape = doublecircle]; 4;
        init -> 1;
        1 -> 1 [label="~on_a_b & ~on_b_c"];
        1 -> 2 [label="on_b_c & ~on_a_b"];
        1 -> 3 [label="on_a_b & ~on_b_c"];
        1 -> 4 [label="on_a_b & on_b_c"];
        2 -> 2 [label="~on_a_b"];
        2 -> 4 [label="on_a_b"];
        3 -> 3 [label="~on_b_c"];
        3 -> 4 [label="on_b_c"];
        4 -> 4 [label="true"];
    }"#;

    #[test]
    fn minterm_partitions_are_exhaustive_and_disjoint() {
        let refined = refine(TWO_GOAL_DOT, RefinerKind::Minterm);
        // Two symbols, every assignment satisfies some label: 4 partitions.
        assert_eq!(refined.partitions.len(), 4);
        // All assignments distinct.
        let mut seen = std::collections::HashSet::new();
        for p in refined.partitions.values() {
            let bits: Vec<bool> = p.assignment.values().copied().collect();
            assert!(seen.insert(bits), "duplicate partition assignment");
        }
    }

    #[test]
    fn every_edge_carries_one_partition() {
        let refined = refine(TWO_GOAL_DOT, RefinerKind::Minterm);
        for edge in &refined.edges {
            assert!(refined.partitions.contains_key(&edge.partition));
        }
        // The true-labelled self-loop is associated with every partition.
        let loop_partitions: Vec<_> = refined
            .edges
            .iter()
            .filter(|e| e.from == Id::new("4"))
            .collect();
        assert_eq!(loop_partitions.len(), refined.partitions.len());
    }

    #[test]
    fn partition_satisfies_its_source_label() {
        let refined = refine(TWO_GOAL_DOT, RefinerKind::Minterm);
        // `on_a_b & on_b_c` has exactly one satisfying partition.
        let parts = &refined.label_partitions["on_a_b & on_b_c"];
        assert_eq!(parts.len(), 1);
        let p = &refined.partitions[&parts[0]];
        assert!(p.assignment.values().all(|&v| v));
    }

    #[test]
    fn bdd_backend_agrees_with_minterm() {
        let a = refine(TWO_GOAL_DOT, RefinerKind::Minterm);
        let b = refine(TWO_GOAL_DOT, RefinerKind::Bdd);
        assert_eq!(a.partitions.len(), b.partitions.len());
        assert_eq!(a.edges.len(), b.edges.len());
    }

    #[test]
    fn partition_goal_decoding() {
        let mut gmap = GroundingMap::new();
        gmap.intern(Id::new("on"), [Id::new("a"), Id::new("b")]).unwrap();
        gmap.intern(Id::new("on"), [Id::new("b"), Id::new("c")]).unwrap();

        let refined = refine(TWO_GOAL_DOT, RefinerKind::Minterm);
        let parts = &refined.label_partitions["on_a_b & on_b_c"];
        let goals = refined.partitions[&parts[0]].goals(&gmap).unwrap();
        assert_eq!(goals.len(), 1);
        let conj = &goals[0];
        assert_eq!(conj.len(), 2);
        assert!(conj.iter().all(|a| !a.negated));
    }

    #[test]
    fn unknown_symbol_surfaces_on_decode() {
        let gmap = GroundingMap::new();
        let refined = refine(TWO_GOAL_DOT, RefinerKind::Minterm);
        let p = refined.partitions.values().next().unwrap();
        assert!(p.goals(&gmap).is_err());
    }
}
