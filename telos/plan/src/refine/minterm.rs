//! The minterm refinement backend.
//!
//! Enumerates truth assignments over the support actually used by edge
//! labels (typically far smaller than the alphabet) and keeps those that
//! satisfy at least one label.
use super::{Refine, RefinedDfa, enumerate_partitions};
use telos_ir::{Dfa, Guard};
use telos_utils::TelosResult;

pub struct MintermRefiner;

impl Refine for MintermRefiner {
    fn name(&self) -> &'static str {
        "minterm"
    }

    fn refine(&self, dfa: &Dfa) -> TelosResult<RefinedDfa> {
        let support = dfa.support();
        let guards: Vec<Guard> =
            dfa.edges.iter().map(|e| e.guard.clone()).collect();
        enumerate_partitions(dfa, &guards, &support)
    }
}
