//! Intermediate representation for the telos compiler: terms, atoms, the
//! grounding map, guard expressions, action schemas, abstract states, and
//! the state graph produced by the backward planner.
mod context;
mod dfa;
mod from_ast;
mod graph;
mod grounding;
mod guard;
mod schema;
mod state;
mod term;

pub use context::Context;
pub use dfa::{Dfa, DfaEdge};
pub use graph::{RegressionEdge, StateGraph};
pub use grounding::GroundingMap;
pub use guard::Guard;
pub use schema::{
    ActionSchema, Domain, EffectBranch, Param, PredicateDecl, SchemaAtom,
    SchemaTerm,
};
pub use state::{AbstractState, Neq};
pub use term::{Atom, GroundAtom, Term};
