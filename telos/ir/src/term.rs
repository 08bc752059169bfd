//! Terms and predicate atoms.
use smallvec::SmallVec;
use std::cmp::Ordering;
use telos_utils::Id;

/// A term: an object constant or a variable identified by its index.
///
/// Variable indices are allocated monotonically during regression; the
/// display form is `?n`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Term {
    Const(Id),
    Var(u32),
}

impl Term {
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Term::Const(_))
    }

    pub fn as_var(&self) -> Option<u32> {
        match self {
            Term::Var(v) => Some(*v),
            Term::Const(_) => None,
        }
    }
}

// Constants order before variables; constants compare by spelling so that
// canonical forms do not depend on interning order.
impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Term::Const(a), Term::Const(b)) => a.as_str().cmp(b.as_str()),
            (Term::Const(_), Term::Var(_)) => Ordering::Less,
            (Term::Var(_), Term::Const(_)) => Ordering::Greater,
            (Term::Var(a), Term::Var(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Const(id) => write!(f, "{}", id),
            Term::Var(v) => write!(f, "?{}", v),
        }
    }
}

impl From<Id> for Term {
    fn from(id: Id) -> Self {
        Term::Const(id)
    }
}

/// A predicate applied to an ordered tuple of terms, with a polarity flag.
/// Equality is by name, polarity, and position-wise term equality.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Atom {
    pub pred: Id,
    pub args: SmallVec<[Term; 4]>,
    pub negated: bool,
}

impl Atom {
    pub fn new<I>(pred: Id, args: I) -> Self
    where
        I: IntoIterator<Item = Term>,
    {
        Atom {
            pred,
            args: args.into_iter().collect(),
            negated: false,
        }
    }

    pub fn negated<I>(pred: Id, args: I) -> Self
    where
        I: IntoIterator<Item = Term>,
    {
        Atom {
            pred,
            args: args.into_iter().collect(),
            negated: true,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// The same atom with flipped polarity.
    pub fn complement(&self) -> Atom {
        Atom {
            pred: self.pred,
            args: self.args.clone(),
            negated: !self.negated,
        }
    }

    /// The positive version of this atom.
    pub fn positive(&self) -> Atom {
        Atom {
            pred: self.pred,
            args: self.args.clone(),
            negated: false,
        }
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_const)
    }

    /// Iterator over the variable indices appearing in the arguments.
    pub fn vars(&self) -> impl Iterator<Item = u32> + '_ {
        self.args.iter().filter_map(Term::as_var)
    }

    /// Rewrite every variable through `f`, leaving constants alone.
    pub fn map_vars<F>(&self, f: F) -> Atom
    where
        F: Fn(u32) -> Term,
    {
        Atom {
            pred: self.pred,
            args: self
                .args
                .iter()
                .map(|t| match t {
                    Term::Var(v) => f(*v),
                    c => *c,
                })
                .collect(),
            negated: self.negated,
        }
    }

    /// Ordering key with variables collapsed to a placeholder: used as the
    /// primary sort key during canonicalisation so that the order does not
    /// depend on variable numbering.
    pub(crate) fn placeholder_key(&self) -> (&'static str, bool, Vec<Option<&'static str>>) {
        (
            self.pred.as_str(),
            self.negated,
            self.args
                .iter()
                .map(|t| match t {
                    Term::Const(c) => Some(c.as_str()),
                    Term::Var(_) => None,
                })
                .collect(),
        )
    }
}

impl Ord for Atom {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pred
            .as_str()
            .cmp(other.pred.as_str())
            .then_with(|| self.negated.cmp(&other.negated))
            .then_with(|| self.args.cmp(&other.args))
    }
}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "~")?;
        }
        write!(f, "{}", self.pred)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A predicate atom whose terms are all constants, without polarity. The
/// domain of the grounding map.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GroundAtom {
    pub pred: Id,
    pub args: Vec<Id>,
}

impl GroundAtom {
    pub fn new<I>(pred: Id, args: I) -> Self
    where
        I: IntoIterator<Item = Id>,
    {
        GroundAtom {
            pred,
            args: args.into_iter().collect(),
        }
    }

    pub fn to_atom(&self, negated: bool) -> Atom {
        Atom {
            pred: self.pred,
            args: self.args.iter().map(|&c| Term::Const(c)).collect(),
            negated,
        }
    }
}

impl std::fmt::Display for GroundAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_atom(false))
    }
}

#[cfg(test)]
mod tests {
    use super::{Atom, Term};
    use telos_utils::Id;

    fn c(s: &str) -> Term {
        Term::Const(Id::new(s))
    }

    #[test]
    fn term_ordering_is_lexicographic() {
        assert!(c("a") < c("b"));
        assert!(c("zz") < Term::Var(0));
        assert!(Term::Var(1) < Term::Var(2));
    }

    #[test]
    fn atom_equality_is_positional() {
        let on_ab = Atom::new(Id::new("on"), [c("a"), c("b")]);
        let on_ba = Atom::new(Id::new("on"), [c("b"), c("a")]);
        assert_ne!(on_ab, on_ba);
        assert_ne!(on_ab, on_ab.complement());
        assert_eq!(on_ab, on_ab.complement().positive());
    }

    #[test]
    fn display_forms() {
        let holding = Atom::new(Id::new("holding"), [c("a")]);
        assert_eq!(holding.to_string(), "holding(a)");
        let not_on = Atom::negated(Id::new("on"), [c("a"), Term::Var(1)]);
        assert_eq!(not_on.to_string(), "~on(a, ?1)");
        let handempty = Atom::new(Id::new("handempty"), []);
        assert_eq!(handempty.to_string(), "handempty");
    }
}
