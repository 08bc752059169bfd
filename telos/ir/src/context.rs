//! The compilation context: everything a single compilation owns.
use crate::{Domain, GroundingMap};
use std::collections::HashMap;
use telos_utils::Id;

/// Explicit per-compilation state: the lowered domain, the grounding map
/// populated during LTLf flattening, and the problem's object set with
/// declared types. There are no globals; the context is threaded through
/// the pipeline and dropped when the compilation ends.
pub struct Context {
    pub domain: Domain,
    pub gmap: GroundingMap,
    /// Declared objects, sorted by spelling.
    pub objects: Vec<Id>,
    object_types: HashMap<Id, Id>,
}

impl Context {
    /// Build a context. Objects without an explicit type are assigned the
    /// domain's first declared type, or `object` for untyped domains.
    pub fn new(domain: Domain, objects: Vec<Id>) -> Context {
        let default_ty = domain
            .types
            .first()
            .copied()
            .unwrap_or_else(|| Id::new("object"));
        let mut objects = objects;
        objects.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        objects.dedup();
        let object_types =
            objects.iter().map(|&o| (o, default_ty)).collect();
        Context {
            domain,
            gmap: GroundingMap::new(),
            objects,
            object_types,
        }
    }

    pub fn is_object(&self, id: Id) -> bool {
        self.object_types.contains_key(&id)
    }

    pub fn object_type(&self, id: Id) -> Option<Id> {
        self.object_types.get(&id).copied()
    }

    /// The number of distinct constants available: the object budget for
    /// state-feasibility pruning.
    pub fn object_budget(&self) -> usize {
        self.objects.len()
    }
}
