//! The compilation pipeline: domain in, plan library out.
use crate::elog::ExecutionLog;
use crate::ltlf::{DfaTranslator, flatten};
use std::path::Path;
use telos_backend::{PlanLibrary, SolvedTransition};
use telos_frontend::ast::{DfaDef, DomainDef};
use telos_ir::{Atom, Context, Dfa, Domain, GroundingMap};
use telos_plan::{
    InvariantExtractor, Planner, RefinerKind, SasRunner, SearchConfig,
    refiner_for,
};
use telos_utils::{Id, TelosResult};

/// Everything that configures one compilation.
#[derive(Clone, Copy, Debug)]
pub struct CompileOpts {
    pub search: SearchConfig,
    pub refiner: RefinerKind,
}

impl Default for CompileOpts {
    fn default() -> Self {
        CompileOpts {
            search: SearchConfig::default(),
            refiner: RefinerKind::Auto,
        }
    }
}

/// The pipeline with its external collaborators plugged in. Tests swap
/// the translators for canned output.
pub struct Pipeline<'a> {
    pub dfa_translator: &'a dyn DfaTranslator,
    pub sas_runner: &'a dyn SasRunner,
    pub opts: CompileOpts,
}

impl Pipeline<'_> {
    /// Run a full compilation, recording progress into the execution log
    /// as each stage completes.
    pub fn compile(
        &self,
        instruction: &str,
        domain_path: &Path,
        objects: Vec<Id>,
        init: Option<&[Atom]>,
        elog: &mut ExecutionLog,
    ) -> TelosResult<PlanLibrary> {
        // Stage 1: domain and instruction.
        let domain_ast =
            DomainDef::construct(&Some(domain_path.to_path_buf()))?;
        let domain = Domain::from_ast(domain_ast)?;
        let mut gmap = GroundingMap::new();
        let formula = flatten(instruction, &domain, &mut gmap)?;
        elog.set_formula(&formula, &gmap);

        // Objects default to the constants the instruction mentions.
        let objects = if objects.is_empty() {
            let mut derived: Vec<Id> =
                gmap.iter().flat_map(|(_, atom)| atom.args.clone()).collect();
            derived.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            derived.dedup();
            derived
        } else {
            objects
        };
        let mut ctx = Context::new(domain, objects);
        ctx.gmap = gmap;

        // Stage 2: the automaton.
        let dot = self.dfa_translator.to_dfa(&formula)?;
        let dfa = Dfa::from_ast(DfaDef::construct_from_str(&dot)?);
        // Every symbol the automaton mentions must decode; a miss means
        // the front end and the translator disagree.
        for symbol in dfa.support() {
            ctx.gmap.decode(symbol)?;
        }
        elog.set_dfa(dfa.summary());

        let refiner = refiner_for(self.opts.refiner, dfa.support().len());
        log::info!("Using `{}' refiner", refiner.name());
        let refined = refiner.refine(&dfa)?;
        elog.set_partitions(&refined);

        // Stage 3: invariants, then one backward search per transition
        // disjunct. Self-loops demand no progression and are skipped.
        let extractor = InvariantExtractor::new(self.sas_runner);
        let invariants = extractor.extract(&ctx, domain_path, init)?;
        elog.set_invariants(&invariants);

        let mut planner =
            Planner::new(&ctx, &invariants, self.opts.search);
        let mut solved: Vec<SolvedTransition> = Vec::new();
        for edge in refined.edges.iter().filter(|e| e.from != e.to) {
            let partition = &refined.partitions[&edge.partition];
            for (disjunct, goal) in
                partition.goals(&ctx.gmap)?.into_iter().enumerate()
            {
                if goal.is_empty() {
                    continue;
                }
                let outcome = planner.solve(&goal);
                if outcome.stats.truncated {
                    log::warn!(
                        "exploration for {} -> {} ({}) truncated at {} states",
                        edge.from,
                        edge.to,
                        edge.partition,
                        outcome.stats.states
                    );
                }
                elog.add_search(
                    edge.from.as_str(),
                    edge.to.as_str(),
                    edge.partition.as_str(),
                    disjunct,
                    &outcome.stats,
                    outcome.cache_hit,
                );
                solved.push(SolvedTransition {
                    from: edge.from,
                    to: edge.to,
                    partition: edge.partition,
                    outcome,
                });
            }
        }
        elog.set_cache(planner.cache_hits, planner.cache_misses);

        Ok(PlanLibrary::build(&ctx, &invariants, &solved))
    }
}
