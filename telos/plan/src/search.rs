//! Breadth-first backward search with schema-level caching.
//!
//! The search explores the goal in its variable-normalised form, so the
//! cached graph is shared by every goal with the same structure; the
//! caller instantiates results back through the returned mapping.
//!
//! Installed states keep the working variable numbering produced by
//! regression (monotone fresh indices). Canonical α-renamed forms are
//! computed only for the visited map; when a rediscovered state gains an
//! extra edge, the edge's binding is translated into the stored state's
//! numbering through the two canonical renamings.
use crate::invariants::InvariantSet;
use crate::normalize::{VariableMapping, cache_key, normalize_goal};
use crate::regress::regress_target;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};
use telos_ir::{
    AbstractState, Atom, Context, RegressionEdge, StateGraph, Term,
};

/// Search budgets. `max_depth` of `None` is unbounded.
#[derive(Clone, Copy, Debug)]
pub struct SearchConfig {
    pub max_states: usize,
    pub max_depth: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_states: 200_000,
            max_depth: None,
            timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// Statistics for one solve call.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStats {
    pub states: usize,
    pub edges: usize,
    /// States actually popped and expanded (0 on a cache hit).
    pub expanded: usize,
    pub truncated: bool,
}

/// The result of solving one goal condition.
pub struct SolveOutcome {
    pub graph: Rc<StateGraph>,
    /// Instantiates the normalised exploration back onto the goal.
    pub mapping: VariableMapping,
    pub stats: SearchStats,
    pub cache_hit: bool,
}

/// The backward-search planner for one compilation. Owns the schema-level
/// goal cache; caches survive across all DFA transitions.
pub struct Planner<'a> {
    ctx: &'a Context,
    inv: &'a InvariantSet,
    config: SearchConfig,
    cache: HashMap<String, Rc<StateGraph>>,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl<'a> Planner<'a> {
    pub fn new(
        ctx: &'a Context,
        inv: &'a InvariantSet,
        config: SearchConfig,
    ) -> Planner<'a> {
        Planner {
            ctx,
            inv,
            config,
            cache: HashMap::new(),
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    /// Solve a goal conjunction. Goals sharing a schema-normalised key
    /// share one exploration; a multi-atom goal proactively seeds the
    /// cache with its constituent single atoms as well.
    pub fn solve(&mut self, goal: &[Atom]) -> SolveOutcome {
        let outcome = self.solve_no_seed(goal);
        if goal.len() > 1 {
            for atom in goal {
                let single = [atom.clone()];
                self.solve_no_seed(&single);
            }
        }
        outcome
    }

    fn solve_no_seed(&mut self, goal: &[Atom]) -> SolveOutcome {
        let (normalized, mapping) =
            normalize_goal(goal, |id| self.ctx.is_object(id));
        let key = cache_key(&normalized);

        if let Some(graph) = self.cache.get(&key) {
            self.cache_hits += 1;
            log::debug!("goal cache hit for `{key}'");
            let graph = Rc::clone(graph);
            let stats = SearchStats {
                states: graph.len(),
                edges: graph.edges.len(),
                expanded: 0,
                truncated: graph.truncated,
            };
            return SolveOutcome {
                graph,
                mapping,
                stats,
                cache_hit: true,
            };
        }

        self.cache_misses += 1;
        let time = Instant::now();
        let (graph, expanded) = self.search(normalized);
        log::debug!(
            "explored `{key}': {} states, {} edges{} in {}ms",
            graph.len(),
            graph.edges.len(),
            if graph.truncated { " (truncated)" } else { "" },
            time.elapsed().as_millis()
        );
        let graph = Rc::new(graph);
        self.cache.insert(key, Rc::clone(&graph));
        let stats = SearchStats {
            states: graph.len(),
            edges: graph.edges.len(),
            expanded,
            truncated: graph.truncated,
        };
        SolveOutcome {
            graph,
            mapping,
            stats,
            cache_hit: false,
        }
    }

    /// Level-order exploration from the goal-root. Returns the graph and
    /// the number of expanded states.
    fn search(&self, root_atoms: Vec<Atom>) -> (StateGraph, usize) {
        let root = AbstractState::new(root_atoms, Vec::new(), 0, 0);
        let budget = self.ctx.object_budget();
        let object_type = |id| self.ctx.object_type(id);

        let mut graph = StateGraph::new(root.clone());
        // Canonical key -> (node index, canonical-to-stored renaming).
        let mut visited: HashMap<String, (usize, HashMap<u32, u32>)> =
            HashMap::new();
        {
            let (canon, rename) = root.canonicalize();
            visited.insert(
                canon.serialize(),
                (0, rename.iter().map(|(&s, &c)| (c, s)).collect()),
            );
        }

        let mut worklist: VecDeque<usize> = VecDeque::from([0]);
        let mut expanded = 0usize;
        let deadline = self.config.timeout.map(|t| Instant::now() + t);

        'outer: while let Some(idx) = worklist.pop_front() {
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    graph.truncated = true;
                    break;
                }
            }
            if let Some(md) = self.config.max_depth {
                if graph.nodes[idx].depth >= md {
                    graph.truncated = true;
                    continue;
                }
            }
            expanded += 1;
            let state = graph.nodes[idx].clone();
            let mut seen_edges: HashSet<String> = HashSet::new();

            // Fixed enumeration order: schema name, branch index, target
            // atom in canonical state order, then binding order.
            for schema in &self.ctx.domain.actions {
                for branch_idx in 0..schema.branches.len() {
                    for target in &state.atoms {
                        for step in regress_target(
                            &state,
                            schema,
                            branch_idx,
                            target,
                            self.inv,
                            &object_type,
                            budget,
                        ) {
                            let (canon, rename) = step.state.canonicalize();
                            let key = canon.serialize();
                            let hit = visited.get(&key).map(|(j, m)| (*j, m.clone()));
                            let (dst, binding) = match hit {
                                Some((j, canon_to_stored)) => {
                                    let binding = remap_binding(
                                        &step.binding,
                                        &rename,
                                        &canon_to_stored,
                                        graph.nodes[j].max_var,
                                    );
                                    (j, binding)
                                }
                                None => {
                                    if graph.len() >= self.config.max_states {
                                        graph.truncated = true;
                                        break 'outer;
                                    }
                                    let j = graph.add_node(step.state.clone());
                                    visited.insert(
                                        key,
                                        (
                                            j,
                                            rename
                                                .iter()
                                                .map(|(&s, &c)| (c, s))
                                                .collect(),
                                        ),
                                    );
                                    worklist.push_back(j);
                                    (j, step.binding.clone())
                                }
                            };

                            let signature = edge_signature(
                                schema.name.as_str(),
                                branch_idx,
                                dst,
                                &binding,
                                &step.targets,
                            );
                            if seen_edges.insert(signature) {
                                graph.add_edge(RegressionEdge {
                                    src: idx,
                                    dst,
                                    action: schema.name,
                                    branch: branch_idx,
                                    binding,
                                    targets: step.targets.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }
        (graph, expanded)
    }
}

/// Translate a binding expressed in a candidate state's numbering into the
/// stored α-equivalent state's numbering. Variables absent from the
/// candidate state (parameters appearing only in add effects) get fresh
/// indices above the stored state's counter.
fn remap_binding(
    binding: &[Term],
    candidate_rename: &HashMap<u32, u32>,
    canon_to_stored: &HashMap<u32, u32>,
    stored_max_var: u32,
) -> Vec<Term> {
    let mut extra: HashMap<u32, u32> = HashMap::new();
    let mut next = stored_max_var;
    binding
        .iter()
        .map(|t| match t {
            Term::Var(v) => {
                let stored = candidate_rename
                    .get(v)
                    .and_then(|c| canon_to_stored.get(c))
                    .copied();
                match stored {
                    Some(s) => Term::Var(s),
                    None => {
                        let idx = *extra.entry(*v).or_insert_with(|| {
                            next += 1;
                            next
                        });
                        Term::Var(idx)
                    }
                }
            }
            c => *c,
        })
        .collect()
}

fn edge_signature(
    action: &str,
    branch: usize,
    dst: usize,
    binding: &[Term],
    targets: &[Atom],
) -> String {
    use itertools::Itertools;
    format!(
        "{action}#{branch}#{dst}#{}#{}",
        binding.iter().map(|t| t.to_string()).join(","),
        targets.iter().map(|a| a.to_string()).join(",")
    )
}
