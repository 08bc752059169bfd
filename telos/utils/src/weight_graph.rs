use itertools::Itertools;
use petgraph::matrix_graph::{MatrixGraph, NodeIndex, UnMatrix, Zero};
use std::{collections::HashMap, hash::Hash};

/// Edge weight used for the graph nodes
pub struct BoolIdx(bool);

impl From<bool> for BoolIdx {
    fn from(b: bool) -> Self {
        BoolIdx(b)
    }
}

impl Zero for BoolIdx {
    fn zero() -> Self {
        BoolIdx(false)
    }

    fn is_zero(&self) -> bool {
        !self.0
    }
}

/// Weight graph provides a wrapper over a Graph that allows adding edges
/// using the NodeWeight type `T` (petgraph only allows adding edges using
/// `NodeIndex`). Edges carry no information.
///
/// Used as the inequality graph of an abstract state: vertices are terms,
/// an edge states that two terms must denote distinct objects. The greedy
/// maximum-clique bound then gives the least number of distinct objects any
/// concrete instance of the state requires.
pub struct WeightGraph<T> {
    /// Mapping from T to a unique identifier.
    pub index_map: HashMap<T, NodeIndex>,
    /// Graph representing using identifier.
    pub graph: UnMatrix<(), BoolIdx>,
}

impl<T: Eq + Hash + Clone + Ord> Default for WeightGraph<T> {
    fn default() -> Self {
        WeightGraph {
            index_map: HashMap::new(),
            graph: MatrixGraph::new_undirected(),
        }
    }
}

impl<T, C> From<C> for WeightGraph<T>
where
    T: Eq + Hash + Ord,
    C: Iterator<Item = T>,
{
    fn from(nodes: C) -> Self {
        let mut graph = MatrixGraph::new_undirected();
        let index_map: HashMap<_, _> =
            nodes.map(|node| (node, graph.add_node(()))).collect();
        WeightGraph { index_map, graph }
    }
}

impl<'a, T> WeightGraph<T>
where
    T: 'a + Eq + Hash + Clone + Ord,
{
    /// Add an edge between `a` and `b`.
    #[inline(always)]
    pub fn add_edge(&mut self, a: &T, b: &T) {
        self.graph.update_edge(
            self.index_map[a],
            self.index_map[b],
            true.into(),
        );
    }

    /// Add edges between all given items.
    pub fn add_all_edges<C>(&mut self, items: C)
    where
        C: Iterator<Item = &'a T> + Clone,
    {
        items.tuple_combinations().for_each(|(src, dst)| {
            self.add_edge(src, dst);
        });
    }

    /// Add a new node to the graph if it is not already present.
    pub fn ensure_node(&mut self, node: T) {
        if !self.index_map.contains_key(&node) {
            let idx = self.graph.add_node(());
            self.index_map.insert(node, idx);
        }
    }

    /// Returns an iterator over references to nodes in the Graph.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.index_map.keys()
    }

    /// A lower bound for the size of the maximum clique, computed greedily:
    /// seed a clique at every vertex in decreasing-degree order and extend
    /// it with every later vertex adjacent to all current members. Valid
    /// lower bound, not exact.
    pub fn greedy_clique_bound(&self) -> usize {
        // Deterministic vertex order: degree descending, weight ascending.
        let order: Vec<NodeIndex> = self
            .index_map
            .iter()
            .sorted_by(|&(ref wa, &a), &(ref wb, &b)| {
                let da = self.graph.neighbors(a).count();
                let db = self.graph.neighbors(b).count();
                db.cmp(&da).then_with(|| wa.cmp(wb))
            })
            .map(|(_, &idx)| idx)
            .collect();

        let mut best = if order.is_empty() { 0 } else { 1 };
        for (seed_pos, &seed) in order.iter().enumerate() {
            let mut clique = vec![seed];
            for &cand in order.iter().skip(seed_pos + 1) {
                if clique.iter().all(|&m| self.graph.has_edge(m, cand)) {
                    clique.push(cand);
                }
            }
            best = best.max(clique.len());
        }
        best
    }
}
