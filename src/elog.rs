//! The execution log: a structured record of one compilation, written as
//! JSON on success and on failure up to the failure point.
use serde::Serialize;
use telos_ir::GroundingMap;
use telos_plan::{RefinedDfa, SearchStats};
use telos_utils::{Error, OutputFile, TelosResult};

#[derive(Serialize, Debug, Default)]
pub struct ExecutionLog {
    pub instruction: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propositional_formula: Option<String>,
    pub grounding: Vec<GroundingRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dfa: Option<String>,
    pub partitions: Vec<PartitionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invariants: Option<InvariantRecord>,
    pub searches: Vec<SearchRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheRecord>,
}

#[derive(Serialize, Debug)]
pub struct InvariantRecord {
    pub singletons: Vec<String>,
    pub mutex_patterns: usize,
}

#[derive(Serialize, Debug)]
pub struct GroundingRecord {
    pub symbol: String,
    pub atom: String,
}

#[derive(Serialize, Debug)]
pub struct PartitionRecord {
    pub symbol: String,
    pub expression: String,
}

/// Per-disjunct search statistics.
#[derive(Serialize, Debug)]
pub struct SearchRecord {
    pub from: String,
    pub to: String,
    pub partition: String,
    pub disjunct: usize,
    pub states: usize,
    pub edges: usize,
    pub expanded: usize,
    pub cache_hit: bool,
    pub truncated: bool,
}

#[derive(Serialize, Debug)]
pub struct CacheRecord {
    pub hits: usize,
    pub misses: usize,
}

impl ExecutionLog {
    pub fn new(instruction: &str) -> ExecutionLog {
        ExecutionLog {
            instruction: instruction.to_string(),
            status: "pending".to_string(),
            ..Default::default()
        }
    }

    pub fn set_formula(&mut self, formula: &str, gmap: &GroundingMap) {
        self.propositional_formula = Some(formula.to_string());
        self.grounding = gmap
            .iter()
            .map(|(sym, atom)| GroundingRecord {
                symbol: sym.to_string(),
                atom: atom.to_string(),
            })
            .collect();
    }

    pub fn set_dfa(&mut self, summary: String) {
        self.dfa = Some(summary);
    }

    pub fn set_partitions(&mut self, refined: &RefinedDfa) {
        self.partitions = refined
            .partitions
            .values()
            .map(|p| PartitionRecord {
                symbol: p.symbol.to_string(),
                expression: p.expr.clone(),
            })
            .collect();
    }

    pub fn set_invariants(&mut self, inv: &telos_plan::InvariantSet) {
        let mut singletons: Vec<String> =
            inv.singletons.iter().map(|s| s.to_string()).collect();
        singletons.sort();
        self.invariants = Some(InvariantRecord {
            singletons,
            mutex_patterns: inv.patterns.len(),
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_search(
        &mut self,
        from: &str,
        to: &str,
        partition: &str,
        disjunct: usize,
        stats: &SearchStats,
        cache_hit: bool,
    ) {
        self.searches.push(SearchRecord {
            from: from.to_string(),
            to: to.to_string(),
            partition: partition.to_string(),
            disjunct,
            states: stats.states,
            edges: stats.edges,
            expanded: stats.expanded,
            cache_hit,
            truncated: stats.truncated,
        });
    }

    pub fn set_cache(&mut self, hits: usize, misses: usize) {
        self.cache = Some(CacheRecord { hits, misses });
    }

    pub fn finish_success(&mut self) {
        self.status = "success".to_string();
    }

    pub fn finish_failure(&mut self, error: &Error) {
        self.status = "failed".to_string();
        self.error = Some(format!("{error:?}"));
    }

    /// Whether at least one sub-exploration hit its budget.
    pub fn any_truncated(&self) -> bool {
        self.searches.iter().any(|s| s.truncated)
    }

    pub fn write(&self, out: &mut OutputFile) -> TelosResult<()> {
        let mut w = out.get_write();
        serde_json::to_writer_pretty(&mut w, self)?;
        use std::io::Write as _;
        writeln!(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionLog;
    use telos_utils::Error;

    #[test]
    fn log_serializes_to_json() {
        let mut log = ExecutionLog::new("F(on(a, b))");
        log.finish_success();
        let text = serde_json::to_string(&log).unwrap();
        assert!(text.contains("\"status\":\"success\""));
        assert!(text.contains("F(on(a, b))"));
    }

    #[test]
    fn failure_records_the_error() {
        let mut log = ExecutionLog::new("F(on(a, b))");
        log.finish_failure(&Error::invariant_extraction("tool missing"));
        let text = serde_json::to_string(&log).unwrap();
        assert!(text.contains("\"status\":\"failed\""));
        assert!(text.contains("tool missing"));
    }
}
