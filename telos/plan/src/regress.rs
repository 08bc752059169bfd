//! The goal-regression step.
//!
//! Given a state, an action schema branch, and a target atom of the state,
//! compute every weakest predecessor under which firing the action
//! achieves the target. Failure (no unifier, type clash, violated
//! constraint, mutex or budget violation) is silent: pruning is a branch
//! here, not an error.
use crate::invariants::InvariantSet;
use crate::prune::{exceeds_object_budget, state_invalid};
use std::collections::HashSet;
use telos_ir::{
    AbstractState, ActionSchema, Atom, Neq, SchemaAtom, SchemaTerm, Term,
};
use telos_utils::Id;

/// One successful regression: the completed parameter binding, the state
/// atoms the step achieves, and the predecessor state.
#[derive(Debug)]
pub(crate) struct RegressionStep {
    pub binding: Vec<Term>,
    pub targets: Vec<Atom>,
    pub state: AbstractState,
}

/// Enumerate the regressions of `state` through `schema`'s branch
/// `branch_idx` that achieve `target`. Deterministic: candidate bindings
/// come out in effect-atom order.
#[allow(clippy::too_many_arguments)]
pub(crate) fn regress_target<F>(
    state: &AbstractState,
    schema: &ActionSchema,
    branch_idx: usize,
    target: &Atom,
    inv: &InvariantSet,
    object_type: &F,
    budget: usize,
) -> Vec<RegressionStep>
where
    F: Fn(Id) -> Option<Id>,
{
    let branch = &schema.branches[branch_idx];
    // A positive target is produced by an add effect; a negated target by
    // a delete effect.
    let producers: &[SchemaAtom] = if target.negated {
        &branch.dels
    } else {
        &branch.adds
    };

    let mut out = Vec::new();
    let mut seen_bindings: HashSet<Vec<Term>> = HashSet::new();
    let positive_target = target.positive();

    for producer in producers {
        let mut partial: Vec<Option<Term>> = vec![None; schema.params.len()];
        if !unify(producer, &positive_target, &mut partial) {
            continue;
        }
        if !types_admit(schema, &partial, object_type) {
            continue;
        }

        // Complete the binding: parameters not tied to the target get
        // fresh variables, numbered in declaration order above the
        // state's counter.
        let mut next_var = state.max_var;
        let binding: Vec<Term> = partial
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    next_var += 1;
                    Term::Var(next_var)
                })
            })
            .collect();
        if !seen_bindings.insert(binding.clone()) {
            continue;
        }

        if let Some(step) = build_predecessor(
            state, schema, branch_idx, binding, next_var, inv, budget,
        ) {
            out.push(step);
        }
    }
    out
}

/// Unify an effect atom against a (positive) target atom, extending the
/// partial parameter binding. Effect constants must match target
/// constants exactly; binding a target variable against an effect
/// constant is out of scope for this practical regression.
fn unify(
    effect: &SchemaAtom,
    target: &Atom,
    binding: &mut Vec<Option<Term>>,
) -> bool {
    if effect.pred != target.pred || effect.args.len() != target.args.len() {
        return false;
    }
    for (st, &t) in effect.args.iter().zip(target.args.iter()) {
        match st {
            SchemaTerm::Param(i) => match binding[*i] {
                Some(bound) if bound != t => return false,
                Some(_) => {}
                None => binding[*i] = Some(t),
            },
            SchemaTerm::Const(c) => {
                if t != Term::Const(*c) {
                    return false;
                }
            }
        }
    }
    true
}

/// Reject bindings that pin a parameter to a constant of a known
/// incompatible type. Variables carry no type and always pass.
fn types_admit<F>(
    schema: &ActionSchema,
    binding: &[Option<Term>],
    object_type: &F,
) -> bool
where
    F: Fn(Id) -> Option<Id>,
{
    schema.params.iter().zip(binding).all(|(param, slot)| {
        match slot {
            Some(Term::Const(c)) => match object_type(*c) {
                Some(ty) => {
                    ty == param.ty || param.ty == "object" || ty == "object"
                }
                // Constants outside the object set (e.g. quoted values)
                // are not type-checked.
                None => true,
            },
            _ => true,
        }
    })
}

/// The classical regression formula, plus the consistency, mutex, and
/// object-budget checks.
fn build_predecessor(
    state: &AbstractState,
    schema: &ActionSchema,
    branch_idx: usize,
    binding: Vec<Term>,
    var_ceiling: u32,
    inv: &InvariantSet,
    budget: usize,
) -> Option<RegressionStep> {
    let branch = &schema.branches[branch_idx];
    let adds: Vec<Atom> =
        branch.adds.iter().map(|a| a.instantiate(&binding)).collect();
    let dels: Vec<Atom> =
        branch.dels.iter().map(|a| a.instantiate(&binding)).collect();

    // Equality preconditions must already be satisfied by the binding; a
    // disagreeing pair (or one contradicting a state inequality) kills
    // the step.
    for (a, b) in &schema.eq {
        if a.apply(&binding) != b.apply(&binding) {
            return None;
        }
    }
    let mut constraints: Vec<Neq> = Vec::new();
    for (a, b) in &schema.neq {
        let neq = Neq::new(a.apply(&binding), b.apply(&binding));
        if neq.unsatisfiable() {
            return None;
        }
        constraints.push(neq);
    }

    // The action fires between the predecessor and `state`: anything it
    // deletes (and does not re-add) cannot be required after, and
    // anything it adds cannot be required absent.
    for q in &state.atoms {
        if q.negated {
            if adds.contains(&q.positive()) {
                return None;
            }
        } else if dels.contains(q) && !adds.contains(q) {
            return None;
        }
    }

    // Inherited goal atoms minus the ones this branch pays for.
    let mut atoms: Vec<Atom> = Vec::new();
    let mut targets: Vec<Atom> = Vec::new();
    for q in &state.atoms {
        let achieved = if q.negated {
            dels.contains(&q.positive())
        } else {
            adds.contains(q)
        };
        if achieved {
            targets.push(q.clone());
        } else {
            atoms.push(q.clone());
        }
    }
    debug_assert!(!targets.is_empty());

    // Preconditions hold before the action; deleted atoms must hold too,
    // an action can only delete what is there.
    atoms.extend(schema.precond.iter().map(|p| p.instantiate(&binding)));
    atoms.extend(dels.iter().cloned());
    constraints.extend(state.constraints.iter().copied());

    // Constraints about variables that no longer occur in any atom are
    // vacuous for the predecessor.
    let live: HashSet<u32> = atoms.iter().flat_map(|a| a.vars()).collect();
    constraints.retain(|c| {
        [c.0, c.1]
            .into_iter()
            .all(|t| t.as_var().is_none_or(|v| live.contains(&v)))
    });

    let pred = AbstractState::new(
        atoms,
        constraints,
        state.depth + 1,
        var_ceiling.max(state.max_var),
    );
    if pred.contradictory()
        || state_invalid(&pred, inv)
        || exceeds_object_budget(&pred, inv, budget)
    {
        return None;
    }

    Some(RegressionStep {
        binding,
        targets,
        state: pred,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::regress_target;
    use crate::invariants::tests::invariants;
    use telos_ir::{AbstractState, Atom, Domain, Neq, Term};
    use telos_frontend::ast::DomainDef;
    use telos_utils::Id;

    pub(crate) const BLOCKSWORLD: &str = r#"
(define (domain blocksworld)
  (:types block)
  (:predicates
    (on ?x - block ?y - block)
    (ontable ?x - block)
    (clear ?x - block)
    (holding ?x - block)
    (handempty))
  (:action pick-up
    :parameters (?b1 - block ?b2 - block)
    :precondition (and (handempty) (clear ?b1) (on ?b1 ?b2) (not (= ?b1 ?b2)))
    :effect (and (holding ?b1) (clear ?b2)
                 (not (handempty)) (not (clear ?b1)) (not (on ?b1 ?b2))))
  (:action pick-up-from-table
    :parameters (?b - block)
    :precondition (and (handempty) (clear ?b) (ontable ?b))
    :effect (and (holding ?b) (not (handempty)) (not (ontable ?b))))
  (:action put-on-block
    :parameters (?b1 - block ?b2 - block)
    :precondition (and (holding ?b1) (clear ?b2))
    :effect (and (on ?b1 ?b2) (handempty) (clear ?b1)
                 (not (holding ?b1)) (not (clear ?b2))))
  (:action put-down
    :parameters (?b - block)
    :precondition (holding ?b)
    :effect (and (ontable ?b) (clear ?b) (handempty)
                 (not (holding ?b))))
)
"#;

    pub(crate) fn blocksworld() -> Domain {
        Domain::from_ast(DomainDef::construct_from_str(BLOCKSWORLD).unwrap())
            .unwrap()
    }

    fn obj_type(_: Id) -> Option<Id> {
        Some(Id::new("block"))
    }

    fn c(s: &str) -> Term {
        Term::Const(Id::new(s))
    }

    fn atom(name: &str, args: &[Term]) -> Atom {
        Atom::new(Id::new(name), args.iter().copied())
    }

    #[test]
    fn regress_on_through_put_on_block() {
        // Goal on(a, b); put-on-block(a, b) yields holding(a) & clear(b).
        let domain = blocksworld();
        let inv = invariants();
        let state = AbstractState::new(
            vec![atom("on", &[c("a"), c("b")])],
            vec![],
            0,
            0,
        );
        let schema = domain.action("put-on-block".into()).unwrap();
        let steps =
            regress_target(&state, schema, 0, &state.atoms[0], &inv, &obj_type, 3);
        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert_eq!(step.binding, vec![c("a"), c("b")]);
        assert_eq!(step.targets, vec![atom("on", &[c("a"), c("b")])]);
        assert_eq!(
            step.state.atoms,
            vec![
                atom("clear", &[c("b")]),
                atom("holding", &[c("a")]),
            ]
        );
        assert_eq!(step.state.depth, 1);
    }

    #[test]
    fn regress_holding_allocates_a_fresh_variable() {
        // Goal holding(a); pick-up(a, ?1) leaves the source block open.
        let domain = blocksworld();
        let inv = invariants();
        let state = AbstractState::new(
            vec![atom("holding", &[c("a")])],
            vec![],
            0,
            0,
        );
        let schema = domain.action("pick-up".into()).unwrap();
        let steps =
            regress_target(&state, schema, 0, &state.atoms[0], &inv, &obj_type, 3);
        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert_eq!(step.binding, vec![c("a"), Term::Var(1)]);
        assert_eq!(
            step.state.atoms,
            vec![
                atom("clear", &[c("a")]),
                atom("handempty", &[]),
                atom("on", &[c("a"), Term::Var(1)]),
            ]
        );
        // The schema inequality survives into the predecessor.
        assert_eq!(
            step.state.constraints,
            vec![Neq::new(c("a"), Term::Var(1))]
        );
        assert_eq!(step.state.max_var, 1);
    }

    #[test]
    fn conjunction_goal_keeps_unpaid_atoms() {
        // Goal holding(a) & clear(b): regressing the holding(a) conjunct
        // through pick-up carries clear(b) into the predecessor.
        let domain = blocksworld();
        let inv = invariants();
        let state = AbstractState::new(
            vec![
                atom("holding", &[c("a")]),
                atom("clear", &[c("b")]),
            ],
            vec![],
            0,
            0,
        );
        let holding = atom("holding", &[c("a")]);
        let schema = domain.action("pick-up".into()).unwrap();
        let steps =
            regress_target(&state, schema, 0, &holding, &inv, &obj_type, 3);
        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert!(step.state.atoms.contains(&atom("clear", &[c("b")])));
        assert!(step.state.atoms.contains(&atom("on", &[c("a"), Term::Var(1)])));
        assert_eq!(step.targets, vec![holding]);
    }

    #[test]
    fn negated_goal_regresses_through_deletes() {
        // Goal ~on(a, b): pick-up(a, b) deletes it.
        let domain = blocksworld();
        let inv = invariants();
        let state = AbstractState::new(
            vec![Atom::negated(Id::new("on"), [c("a"), c("b")])],
            vec![],
            0,
            0,
        );
        let schema = domain.action("pick-up".into()).unwrap();
        let steps =
            regress_target(&state, schema, 0, &state.atoms[0], &inv, &obj_type, 3);
        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert_eq!(step.binding, vec![c("a"), c("b")]);
        assert_eq!(
            step.state.atoms,
            vec![
                atom("clear", &[c("a")]),
                atom("handempty", &[]),
                atom("on", &[c("a"), c("b")]),
            ]
        );
    }

    #[test]
    fn mutex_violating_predecessor_is_dropped() {
        // Goal holding(a) & clear(b): achieving clear(b) through
        // put-on-block(b, ?) would require holding(b) alongside
        // holding(a), which the hand invariant forbids.
        let domain = blocksworld();
        let inv = invariants();
        let state = AbstractState::new(
            vec![
                atom("holding", &[c("a")]),
                atom("clear", &[c("b")]),
            ],
            vec![],
            0,
            0,
        );
        let clear_b = atom("clear", &[c("b")]);
        let schema = domain.action("put-on-block".into()).unwrap();
        let steps =
            regress_target(&state, schema, 0, &clear_b, &inv, &obj_type, 3);
        assert!(steps.is_empty());
    }

    #[test]
    fn self_defeating_action_is_dropped() {
        // Goal handempty & holding(a) is already mutex on its face, but
        // even without invariants a branch that deletes a required atom
        // without re-adding it must fail: goal clear(b) & handempty via
        // pick-up(?, b) deletes handempty.
        let domain = blocksworld();
        let inv = invariants();
        let state = AbstractState::new(
            vec![
                atom("clear", &[c("b")]),
                atom("handempty", &[]),
            ],
            vec![],
            0,
            0,
        );
        let clear_b = atom("clear", &[c("b")]);
        let schema = domain.action("pick-up".into()).unwrap();
        let steps =
            regress_target(&state, schema, 0, &clear_b, &inv, &obj_type, 3);
        assert!(steps.is_empty());
    }

    #[test]
    fn object_budget_prunes_wide_predecessors() {
        // Goal holding(a) under a single-object budget: pick-up needs a
        // second, distinct block underneath.
        let domain = blocksworld();
        let inv = invariants();
        let state = AbstractState::new(
            vec![atom("holding", &[c("a")])],
            vec![],
            0,
            0,
        );
        let schema = domain.action("pick-up".into()).unwrap();
        let steps =
            regress_target(&state, schema, 0, &state.atoms[0], &inv, &obj_type, 1);
        assert!(steps.is_empty());
        // pick-up-from-table still works with one block.
        let schema = domain.action("pick-up-from-table".into()).unwrap();
        let steps =
            regress_target(&state, schema, 0, &state.atoms[0], &inv, &obj_type, 1);
        assert_eq!(steps.len(), 1);
    }
}
