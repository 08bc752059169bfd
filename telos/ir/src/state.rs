//! Abstract states: atom sets with inequality constraints.
use crate::{Atom, Term};
use std::collections::{BTreeSet, HashMap, HashSet};

/// An inequality constraint between two terms. The pair is stored in term
/// order, so `Neq(a, b)` and `Neq(b, a)` compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Neq(pub Term, pub Term);

impl Neq {
    pub fn new(a: Term, b: Term) -> Neq {
        if a <= b { Neq(a, b) } else { Neq(b, a) }
    }

    /// `t != t` can never hold.
    pub fn unsatisfiable(&self) -> bool {
        self.0 == self.1
    }

    /// Two distinct constants are unequal by themselves; the constraint
    /// carries no information.
    pub fn trivial(&self) -> bool {
        matches!((self.0, self.1), (Term::Const(a), Term::Const(b)) if a != b)
    }

    pub fn mentions(&self, t: Term) -> bool {
        self.0 == t || self.1 == t
    }
}

impl std::fmt::Display for Neq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} != {}", self.0, self.1)
    }
}

/// An abstract state: a set of (possibly-variable) predicate atoms, a set
/// of inequality constraints, the distance from the goal-root, and the
/// largest variable index in use (which governs fresh-variable allocation).
///
/// A state denotes every concrete state obtained by substituting its
/// variables with objects consistent with the constraints. States are
/// immutable once installed into a state graph.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AbstractState {
    pub atoms: Vec<Atom>,
    pub constraints: Vec<Neq>,
    pub depth: u32,
    pub max_var: u32,
}

impl AbstractState {
    /// Build a state: atoms and constraints are sorted and deduplicated,
    /// trivially-true constant constraints dropped. `var_floor` keeps the
    /// variable counter monotone along regression edges even when the
    /// highest-numbered variable was consumed by the step.
    pub fn new(
        atoms: Vec<Atom>,
        constraints: Vec<Neq>,
        depth: u32,
        var_floor: u32,
    ) -> AbstractState {
        let mut atoms = atoms;
        atoms.sort();
        atoms.dedup();
        let mut constraints: Vec<Neq> =
            constraints.into_iter().filter(|c| !c.trivial()).collect();
        constraints.sort();
        constraints.dedup();

        let content_max = atoms
            .iter()
            .flat_map(|a| a.vars())
            .chain(constraints.iter().flat_map(|c| {
                [c.0, c.1].into_iter().filter_map(|t| t.as_var())
            }))
            .max()
            .unwrap_or(0);

        AbstractState {
            atoms,
            constraints,
            depth,
            max_var: content_max.max(var_floor),
        }
    }

    /// All variable indices used anywhere in the state.
    pub fn vars(&self) -> BTreeSet<u32> {
        let mut out: BTreeSet<u32> =
            self.atoms.iter().flat_map(|a| a.vars()).collect();
        for c in &self.constraints {
            for t in [c.0, c.1] {
                if let Term::Var(v) = t {
                    out.insert(v);
                }
            }
        }
        out
    }

    /// True when an atom and its complement are both present.
    pub fn contradictory(&self) -> bool {
        let positives: HashSet<&Atom> =
            self.atoms.iter().filter(|a| !a.negated).collect();
        self.atoms
            .iter()
            .filter(|a| a.negated)
            .any(|a| positives.contains(&a.positive()))
    }

    /// Whether two terms are known to denote distinct objects in this
    /// state: distinct constants, or an explicit inequality.
    pub fn distinct(&self, a: Term, b: Term) -> bool {
        if let (Term::Const(x), Term::Const(y)) = (a, b) {
            return x != y;
        }
        self.constraints.contains(&Neq::new(a, b))
    }

    /// α-rename to smallest-consecutive variable indices. Atoms are sorted
    /// by (name, polarity, constants-with-variable-placeholders) with the
    /// current arguments as tie-break; variables are then renumbered by
    /// first occurrence in that order. Returns the renamed state and the
    /// old-to-new index map. Idempotent: renaming a canonical state is the
    /// identity.
    pub fn canonicalize(&self) -> (AbstractState, HashMap<u32, u32>) {
        let mut order: Vec<&Atom> = self.atoms.iter().collect();
        order.sort_by(|a, b| {
            a.placeholder_key()
                .cmp(&b.placeholder_key())
                .then_with(|| a.args.cmp(&b.args))
        });

        let mut rename: HashMap<u32, u32> = HashMap::new();
        let mut next = 0u32;
        for atom in &order {
            for v in atom.vars() {
                rename.entry(v).or_insert_with(|| {
                    let idx = next;
                    next += 1;
                    idx
                });
            }
        }
        // Variables appearing only in constraints come last, by old index.
        let mut constraint_vars: Vec<u32> = self
            .constraints
            .iter()
            .flat_map(|c| [c.0, c.1].into_iter().filter_map(|t| t.as_var()))
            .filter(|v| !rename.contains_key(v))
            .collect();
        constraint_vars.sort_unstable();
        constraint_vars.dedup();
        for v in constraint_vars {
            rename.insert(v, next);
            next += 1;
        }

        let atoms = self
            .atoms
            .iter()
            .map(|a| a.map_vars(|v| Term::Var(rename[&v])))
            .collect();
        let constraints = self
            .constraints
            .iter()
            .map(|c| {
                Neq::new(rename_term(c.0, &rename), rename_term(c.1, &rename))
            })
            .collect();
        let state = AbstractState::new(atoms, constraints, self.depth, 0);
        (state, rename)
    }

    /// The canonical serialized form used for identity and caching.
    pub fn canonical_key(&self) -> String {
        self.canonicalize().0.serialize()
    }

    /// Serialize in a stable textual form (assumes the desired variable
    /// numbering is already in place).
    pub fn serialize(&self) -> String {
        use itertools::Itertools;
        let atoms = self.atoms.iter().map(|a| a.to_string()).join("|");
        if self.constraints.is_empty() {
            atoms
        } else {
            let cons =
                self.constraints.iter().map(|c| c.to_string()).join(",");
            format!("{atoms} # {cons}")
        }
    }
}

fn rename_term(t: Term, rename: &HashMap<u32, u32>) -> Term {
    match t {
        Term::Var(v) => Term::Var(rename[&v]),
        c => c,
    }
}

impl std::fmt::Display for AbstractState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use itertools::Itertools;
        write!(
            f,
            "{}",
            self.atoms.iter().map(|a| a.to_string()).join(" & ")
        )?;
        for c in &self.constraints {
            write!(f, " & ({})", c)?;
        }
        write!(f, " @{}", self.depth)
    }
}
