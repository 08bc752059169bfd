//! Schema-level goal normalisation.
//!
//! Goals that differ only in which objects they mention collapse onto one
//! abstract exploration: `on(a, b)` and `on(c, d)` both normalise to
//! `on(?arg0, ?arg1)` and share a cache entry. Constants outside the
//! problem's declared object set (numbers, quoted strings, foreign
//! symbols) are part of the goal's structure and stay put.
use linked_hash_map::LinkedHashMap;
use std::collections::HashMap;
use telos_ir::{Atom, Term};
use telos_utils::Id;

/// The object/variable correspondence produced by normalisation, used to
/// instantiate the shared exploration back onto the concrete goal.
#[derive(Clone, Debug, Default)]
pub struct VariableMapping {
    pub obj_to_var: LinkedHashMap<Id, u32>,
    pub var_to_obj: HashMap<u32, Id>,
}

impl VariableMapping {
    /// Substitute mapped variables back to their objects. Variables the
    /// search introduced later stay variables.
    pub fn instantiate(&self, atom: &Atom) -> Atom {
        atom.map_vars(|v| match self.var_to_obj.get(&v) {
            Some(&obj) => Term::Const(obj),
            None => Term::Var(v),
        })
    }

    pub fn instantiate_term(&self, term: Term) -> Term {
        match term {
            Term::Var(v) => match self.var_to_obj.get(&v) {
                Some(&obj) => Term::Const(obj),
                None => term,
            },
            c => c,
        }
    }
}

/// Normalise a goal conjunction: sort atoms canonically, then replace
/// every declared-object constant with a positional variable in
/// first-occurrence order. Returns the normalised atoms and the mapping.
pub fn normalize_goal<F>(
    goal: &[Atom],
    is_object: F,
) -> (Vec<Atom>, VariableMapping)
where
    F: Fn(Id) -> bool,
{
    let mut atoms: Vec<Atom> = goal.to_vec();
    atoms.sort();
    atoms.dedup();

    let mut mapping = VariableMapping::default();
    let mut next = 0u32;
    let normalized = atoms
        .iter()
        .map(|atom| {
            let args = atom
                .args
                .iter()
                .map(|&t| match t {
                    Term::Const(c) if is_object(c) => {
                        let var =
                            *mapping.obj_to_var.entry(c).or_insert_with(|| {
                                let v = next;
                                next += 1;
                                v
                            });
                        Term::Var(var)
                    }
                    other => other,
                })
                .collect();
            Atom {
                pred: atom.pred,
                args,
                negated: atom.negated,
            }
        })
        .collect();
    mapping.var_to_obj = mapping
        .obj_to_var
        .iter()
        .map(|(&obj, &var)| (var, obj))
        .collect();
    (normalized, mapping)
}

/// The serialized cache key of a normalised goal. Positional variables
/// render as `?argN` so keys are self-describing in logs.
pub fn cache_key(atoms: &[Atom]) -> String {
    use itertools::Itertools;
    atoms
        .iter()
        .map(|atom| {
            let mut out = String::new();
            if atom.negated {
                out.push('~');
            }
            out.push_str(atom.pred.as_str());
            if !atom.args.is_empty() {
                out.push('(');
                for (i, arg) in atom.args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    match arg {
                        Term::Var(v) => {
                            out.push_str(&format!("?arg{v}"));
                        }
                        Term::Const(c) => out.push_str(c.as_str()),
                    }
                }
                out.push(')');
            }
            out
        })
        .join("|")
}
