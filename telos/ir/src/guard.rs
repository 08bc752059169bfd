//! Desugared boolean expressions over propositional symbols.
//!
//! Implications and equivalences from edge labels are eliminated at
//! lowering, leaving the closed set of forms the refiner evaluates.
use std::collections::BTreeSet;
use telos_frontend::ast::GuardExpr;
use telos_utils::Id;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Guard {
    True,
    False,
    /// A propositional symbol.
    Atom(Id),
    Not(Box<Guard>),
    And(Box<Guard>, Box<Guard>),
    Or(Box<Guard>, Box<Guard>),
}

impl Guard {
    pub fn and(l: Guard, r: Guard) -> Guard {
        Guard::And(Box::new(l), Box::new(r))
    }

    pub fn or(l: Guard, r: Guard) -> Guard {
        Guard::Or(Box::new(l), Box::new(r))
    }

    pub fn not(g: Guard) -> Guard {
        Guard::Not(Box::new(g))
    }

    /// Desugar a frontend label expression: `a -> b` becomes `~a | b`,
    /// `a <-> b` becomes `(a & b) | (~a & ~b)`.
    pub fn from_ast(expr: &GuardExpr) -> Guard {
        match expr {
            GuardExpr::Atom(id) => Guard::Atom(*id),
            GuardExpr::True => Guard::True,
            GuardExpr::False => Guard::False,
            GuardExpr::Not(e) => Guard::not(Guard::from_ast(e)),
            GuardExpr::And(l, r) => {
                Guard::and(Guard::from_ast(l), Guard::from_ast(r))
            }
            GuardExpr::Or(l, r) => {
                Guard::or(Guard::from_ast(l), Guard::from_ast(r))
            }
            GuardExpr::Implies(l, r) => Guard::or(
                Guard::not(Guard::from_ast(l)),
                Guard::from_ast(r),
            ),
            GuardExpr::Iff(l, r) => {
                let (l, r) = (Guard::from_ast(l), Guard::from_ast(r));
                Guard::or(
                    Guard::and(l.clone(), r.clone()),
                    Guard::and(Guard::not(l), Guard::not(r)),
                )
            }
        }
    }

    /// Collect the propositional symbols appearing in this expression.
    pub fn support(&self, acc: &mut BTreeSet<Id>) {
        match self {
            Guard::True | Guard::False => {}
            Guard::Atom(id) => {
                acc.insert(*id);
            }
            Guard::Not(e) => e.support(acc),
            Guard::And(l, r) | Guard::Or(l, r) => {
                l.support(acc);
                r.support(acc);
            }
        }
    }

    /// Evaluate under a truth assignment. Symbols outside the assignment's
    /// domain evaluate to false.
    pub fn eval<F>(&self, lookup: &F) -> bool
    where
        F: Fn(Id) -> bool,
    {
        match self {
            Guard::True => true,
            Guard::False => false,
            Guard::Atom(id) => lookup(*id),
            Guard::Not(e) => !e.eval(lookup),
            Guard::And(l, r) => l.eval(lookup) && r.eval(lookup),
            Guard::Or(l, r) => l.eval(lookup) || r.eval(lookup),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Guard::True)
    }

    /// Disjunctive normal form: a list of conjunctions of
    /// `(symbol, polarity)` literals. Negations are pushed to the leaves,
    /// then conjunction distributes over disjunction. Conjunctions
    /// containing a literal and its complement are dropped; duplicate
    /// literals collapse.
    pub fn dnf(&self) -> Vec<Vec<(Id, bool)>> {
        fn go(g: &Guard, neg: bool) -> Vec<Vec<(Id, bool)>> {
            match (g, neg) {
                (Guard::True, false) | (Guard::False, true) => vec![vec![]],
                (Guard::True, true) | (Guard::False, false) => vec![],
                (Guard::Atom(id), _) => vec![vec![(*id, !neg)]],
                (Guard::Not(e), _) => go(e, !neg),
                (Guard::And(l, r), false) | (Guard::Or(l, r), true) => {
                    let (ld, rd) = (go(l, neg), go(r, neg));
                    let mut out = Vec::new();
                    for lc in &ld {
                        for rc in &rd {
                            let mut conj = lc.clone();
                            conj.extend(rc.iter().copied());
                            out.push(conj);
                        }
                    }
                    out
                }
                (Guard::Or(l, r), false) | (Guard::And(l, r), true) => {
                    let mut out = go(l, neg);
                    out.extend(go(r, neg));
                    out
                }
            }
        }

        go(self, false)
            .into_iter()
            .filter_map(|mut conj| {
                conj.sort_by(|(a, pa), (b, pb)| {
                    a.as_str().cmp(b.as_str()).then(pa.cmp(pb))
                });
                conj.dedup();
                let contradictory = conj
                    .windows(2)
                    .any(|w| w[0].0 == w[1].0 && w[0].1 != w[1].1);
                (!contradictory).then_some(conj)
            })
            .collect()
    }
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::True => write!(f, "true"),
            Guard::False => write!(f, "false"),
            Guard::Atom(id) => write!(f, "{}", id),
            Guard::Not(e) => write!(f, "~{}", parenthesized(e)),
            Guard::And(l, r) => {
                write!(f, "{} & {}", parenthesized(l), parenthesized(r))
            }
            Guard::Or(l, r) => {
                write!(f, "{} | {}", parenthesized(l), parenthesized(r))
            }
        }
    }
}

fn parenthesized(g: &Guard) -> String {
    match g {
        Guard::And(..) | Guard::Or(..) => format!("({})", g),
        _ => format!("{}", g),
    }
}
