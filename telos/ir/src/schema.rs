//! Action schemas and the lowered domain.
use crate::{Atom, Term};
use linked_hash_map::LinkedHashMap;
use smallvec::SmallVec;
use telos_utils::{GetName, Id};

/// A typed schema parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Id,
    pub ty: Id,
}

/// A term inside a schema: a parameter by position, or a constant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SchemaTerm {
    Param(usize),
    Const(Id),
}

impl SchemaTerm {
    /// Resolve under a full binding of the schema's parameters.
    pub fn apply(&self, binding: &[Term]) -> Term {
        match self {
            SchemaTerm::Param(i) => binding[*i],
            SchemaTerm::Const(c) => Term::Const(*c),
        }
    }
}

/// A predicate over schema terms, with polarity.
#[derive(Clone, Debug)]
pub struct SchemaAtom {
    pub pred: Id,
    pub args: SmallVec<[SchemaTerm; 4]>,
    pub negated: bool,
}

impl SchemaAtom {
    /// Instantiate under a full parameter binding.
    pub fn instantiate(&self, binding: &[Term]) -> Atom {
        Atom {
            pred: self.pred,
            args: self.args.iter().map(|t| t.apply(binding)).collect(),
            negated: self.negated,
        }
    }
}

/// One conjunctive effect branch. Deleted atoms are stored positively.
#[derive(Clone, Debug)]
pub struct EffectBranch {
    pub adds: Vec<SchemaAtom>,
    pub dels: Vec<SchemaAtom>,
}

/// An action schema: typed parameters, a precondition conjunction with
/// optional (in)equality constraints, and one or more effect branches.
/// Multiple branches model non-deterministic outcomes; all branches share
/// the precondition.
#[derive(Clone, Debug)]
pub struct ActionSchema {
    pub name: Id,
    pub params: Vec<Param>,
    pub precond: Vec<SchemaAtom>,
    /// `(not (= x y))` constraints from the precondition.
    pub neq: Vec<(SchemaTerm, SchemaTerm)>,
    /// `(= x y)` constraints from the precondition.
    pub eq: Vec<(SchemaTerm, SchemaTerm)>,
    pub branches: Vec<EffectBranch>,
}

impl GetName for ActionSchema {
    fn name(&self) -> Id {
        self.name
    }
}

/// A declared predicate: name and parameter types. Arity is the length of
/// the type list.
#[derive(Clone, Debug)]
pub struct PredicateDecl {
    pub name: Id,
    pub param_types: Vec<Id>,
}

impl PredicateDecl {
    pub fn arity(&self) -> usize {
        self.param_types.len()
    }
}

/// The lowered planning domain. Actions are sorted by name so that
/// regression enumerates them in a fixed order.
#[derive(Debug, Default)]
pub struct Domain {
    pub name: Id,
    pub types: Vec<Id>,
    pub predicates: LinkedHashMap<Id, PredicateDecl>,
    pub actions: Vec<ActionSchema>,
}

impl Domain {
    pub fn predicate(&self, name: Id) -> Option<&PredicateDecl> {
        self.predicates.get(&name)
    }

    pub fn action(&self, name: Id) -> Option<&ActionSchema> {
        self.actions.iter().find(|a| a.name == name)
    }
}
