//! The telos planning core: DFA partition refinement, domain-invariant
//! extraction, and the lifted backward-search planner with schema-level
//! caching.
mod invariants;
mod normalize;
mod prune;
pub mod refine;
mod regress;
mod search;

pub use invariants::{
    CommandSasRunner, InvariantExtractor, InvariantSet, MutexPattern,
    SasRunner,
};
pub use normalize::{VariableMapping, cache_key, normalize_goal};
pub use prune::{exceeds_object_budget, state_invalid};
pub use refine::{
    Partition, Refine, RefinedDfa, RefinedEdge, RefinerKind, refiner_for,
};
pub use search::{Planner, SearchConfig, SearchStats, SolveOutcome};
