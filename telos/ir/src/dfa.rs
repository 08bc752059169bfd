//! The automaton over the propositional alphabet.
use crate::Guard;
use std::collections::BTreeSet;
use telos_frontend::ast::DfaDef;
use telos_utils::Id;

#[derive(Debug)]
pub struct DfaEdge {
    pub from: Id,
    pub to: Id,
    pub guard: Guard,
    /// The raw label text, kept for reporting.
    pub label: String,
}

#[derive(Debug)]
pub struct Dfa {
    pub states: Vec<Id>,
    pub init: Id,
    pub accepting: Vec<Id>,
    pub edges: Vec<DfaEdge>,
}

impl Dfa {
    /// Lower the frontend AST: labels are desugared into [Guard]s.
    pub fn from_ast(def: DfaDef) -> Dfa {
        let edges = def
            .edges
            .into_iter()
            .map(|e| DfaEdge {
                from: e.from,
                to: e.to,
                guard: Guard::from_ast(&e.guard),
                label: e.label,
            })
            .collect();
        Dfa {
            states: def.states,
            init: def.init,
            accepting: def.accepting,
            edges,
        }
    }

    /// Every propositional symbol occurring in any edge label.
    pub fn support(&self) -> BTreeSet<Id> {
        let mut out = BTreeSet::new();
        for edge in &self.edges {
            edge.guard.support(&mut out);
        }
        out
    }

    /// Compact rendering for the execution log: states, initial and
    /// accepting sets, and the labelled transitions, with no layout noise.
    pub fn summary(&self) -> String {
        use itertools::Itertools;
        let mut lines = Vec::new();
        lines.push(format!(
            "States: {}",
            self.states.iter().map(|s| s.to_string()).join(", ")
        ));
        lines.push(format!("Initial: {}", self.init));
        lines.push(format!(
            "Accepting: {}",
            self.accepting.iter().map(|s| s.to_string()).join(", ")
        ));
        if !self.edges.is_empty() {
            lines.push("Transitions:".to_string());
            for e in &self.edges {
                lines.push(format!(
                    "  {} -> {} when [{}]",
                    e.from, e.to, e.label
                ));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::Dfa;
    use telos_frontend::ast::DfaDef;

    const DOT: &str = r#"digraph MONA_DFA {
        node [shape = doublecircle]; 2;
        init -> 1;
        1 -> 1 [label="~on_a_b"];
        1 -> 2 [label="on_a_b"];
        2 -> 2 [label="true"];
    }"#;

    #[test]
    fn support_and_summary() {
        let dfa = Dfa::from_ast(DfaDef::construct_from_str(DOT).unwrap());
        let support = dfa.support();
        assert_eq!(support.len(), 1);
        assert!(support.contains(&"on_a_b".into()));

        let summary = dfa.summary();
        assert!(summary.contains("Initial: 1"));
        assert!(summary.contains("Accepting: 2"));
        assert!(summary.contains("1 -> 2 when [on_a_b]"));
    }
}
