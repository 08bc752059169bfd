//! The BDD-assisted refinement backend.
//!
//! Labels are first run through a reduced ordered BDD, which collapses
//! redundant structure and drops don't-care symbols. Enumeration then
//! happens over the (often much smaller) support of the simplified
//! labels. The refinement contract is identical to the minterm backend.
use super::{Refine, RefinedDfa, enumerate_partitions};
use boolean_expression::Expr;
use std::collections::BTreeSet;
use telos_ir::{Dfa, Guard};
use telos_utils::{Id, TelosResult};

pub struct BddRefiner;

impl Refine for BddRefiner {
    fn name(&self) -> &'static str {
        "bdd"
    }

    fn refine(&self, dfa: &Dfa) -> TelosResult<RefinedDfa> {
        let guards: Vec<Guard> = dfa
            .edges
            .iter()
            .map(|e| from_expr(to_expr(&e.guard).simplify_via_bdd()))
            .collect();
        let mut support = BTreeSet::new();
        for g in &guards {
            g.support(&mut support);
        }
        enumerate_partitions(dfa, &guards, &support)
    }
}

fn to_expr(guard: &Guard) -> Expr<Id> {
    match guard {
        Guard::True => Expr::Const(true),
        Guard::False => Expr::Const(false),
        Guard::Atom(id) => Expr::Terminal(*id),
        Guard::Not(e) => Expr::not(to_expr(e)),
        Guard::And(l, r) => Expr::and(to_expr(l), to_expr(r)),
        Guard::Or(l, r) => Expr::or(to_expr(l), to_expr(r)),
    }
}

fn from_expr(expr: Expr<Id>) -> Guard {
    match expr {
        Expr::Terminal(id) => Guard::Atom(id),
        Expr::Const(true) => Guard::True,
        Expr::Const(false) => Guard::False,
        Expr::Not(e) => Guard::not(from_expr(*e)),
        Expr::And(l, r) => Guard::and(from_expr(*l), from_expr(*r)),
        Expr::Or(l, r) => Guard::or(from_expr(*l), from_expr(*r)),
    }
}
