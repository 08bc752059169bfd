//! End-to-end compilation against canned external-tool output.
use std::path::{Path, PathBuf};
use telos::driver::{CompileOpts, Pipeline};
use telos::elog::ExecutionLog;
use telos::ltlf::DfaTranslator;
use telos_backend::render;
use telos_plan::{RefinerKind, SasRunner, SearchConfig};
use telos_utils::{Id, TelosResult};

const BLOCKSWORLD: &str = r#"
(define (domain blocksworld)
  (:types block)
  (:predicates
    (on ?x - block ?y - block)
    (ontable ?x - block)
    (clear ?x - block)
    (holding ?x - block)
    (handempty))
  (:action pick-up
    :parameters (?b1 - block ?b2 - block)
    :precondition (and (handempty) (clear ?b1) (on ?b1 ?b2) (not (= ?b1 ?b2)))
    :effect (and (holding ?b1) (clear ?b2)
                 (not (handempty)) (not (clear ?b1)) (not (on ?b1 ?b2))))
  (:action pick-up-from-table
    :parameters (?b - block)
    :precondition (and (handempty) (clear ?b) (ontable ?b))
    :effect (and (holding ?b) (not (handempty)) (not (ontable ?b))))
  (:action put-on-block
    :parameters (?b1 - block ?b2 - block)
    :precondition (and (holding ?b1) (clear ?b2))
    :effect (and (on ?b1 ?b2) (handempty) (clear ?b1)
                 (not (holding ?b1)) (not (clear ?b2))))
  (:action put-down
    :parameters (?b - block)
    :precondition (holding ?b)
    :effect (and (ontable ?b) (clear ?b) (handempty)
                 (not (holding ?b))))
)
"#;

const SINGLE_GOAL_DOT: &str = r#"digraph MONA_DFA {
 rankdir = LR;
 center = true;
 size = "7.5,10.5";
 edge [fontname = Courier];
 node [height = .5, width = .5];
 node [shape = doublecircle]; 2;
 node [shape = circle]; 1;
 init [shape = plaintext, label = ""];
 init -> 1;
 1 -> 1 [label="~on_a_b"];
 1 -> 2 [label="on_a_b"];
 2 -> 2 [label="true"];
}"#;

const SYMMETRIC_DOT: &str = r#"digraph MONA_DFA {
 node [shape = doublecircle]; 4;
 init -> 1;
 1 -> 1 [label="~on_a_b & ~on_c_d"];
 1 -> 2 [label="on_a_b & ~on_c_d"];
 1 -> 3 [label="on_c_d & ~on_a_b"];
 1 -> 4 [label="on_a_b & on_c_d"];
 2 -> 4 [label="on_c_d"];
 2 -> 2 [label="~on_c_d"];
 3 -> 4 [label="on_a_b"];
 3 -> 3 [label="~on_a_b"];
 4 -> 4 [label="true"];
}"#;

const BLOCKS_SAS: &str = "\
begin_variable
var0
-1
4
Atom on(a, b)
Atom ontable(a)
Atom holding(a)
<none of those>
end_variable
begin_variable
var1
-1
4
Atom on(b, a)
Atom ontable(b)
Atom holding(b)
<none of those>
end_variable
begin_variable
var2
-1
2
Atom handempty()
NegatedAtom handempty()
end_variable
begin_mutex_group
3
0 2
1 2
2 0
end_mutex_group
";

struct CannedDfa(&'static str);

impl DfaTranslator for CannedDfa {
    fn to_dfa(&self, _formula: &str) -> TelosResult<String> {
        Ok(self.0.to_string())
    }
}

struct CannedSas;

impl SasRunner for CannedSas {
    fn translate(
        &self,
        _domain_path: &Path,
        _problem_text: &str,
    ) -> TelosResult<String> {
        Ok(BLOCKS_SAS.to_string())
    }
}

struct BrokenSas;

impl SasRunner for BrokenSas {
    fn translate(
        &self,
        _domain_path: &Path,
        _problem_text: &str,
    ) -> TelosResult<String> {
        Err(telos_utils::Error::invariant_extraction(
            "translator not installed",
        ))
    }
}

fn domain_file(tag: &str) -> PathBuf {
    let path = std::env::temp_dir()
        .join(format!("telos-test-{}-{tag}.pddl", std::process::id()));
    std::fs::write(&path, BLOCKSWORLD).unwrap();
    path
}

fn opts() -> CompileOpts {
    CompileOpts {
        search: SearchConfig {
            max_states: 60,
            max_depth: Some(2),
            timeout: None,
        },
        refiner: RefinerKind::Minterm,
    }
}

#[test]
fn compile_single_goal() {
    let dfa = CannedDfa(SINGLE_GOAL_DOT);
    let pipeline = Pipeline {
        dfa_translator: &dfa,
        sas_runner: &CannedSas,
        opts: opts(),
    };
    let domain = domain_file("single");
    let mut elog = ExecutionLog::new("F(on(a, b))");
    let lib = pipeline
        .compile(
            "F(on(a, b))",
            &domain,
            vec![Id::new("a"), Id::new("b"), Id::new("c")],
            None,
            &mut elog,
        )
        .unwrap();

    let text = render(&lib);
    assert!(text.contains("object(a)."));
    assert!(
        text.contains(
            "+!on(a, b) : clear(b), holding(a) <- !put_on_block(a, b)"
        ),
        "missing root rule:\n{text}"
    );

    // Execution-log bookkeeping.
    assert_eq!(elog.propositional_formula.as_deref(), Some("F(on_a_b)"));
    assert!(elog.dfa.as_deref().unwrap().contains("Initial: 1"));
    assert_eq!(elog.partitions.len(), 2);
    assert!(!elog.searches.is_empty());
    let invariants = elog.invariants.as_ref().unwrap();
    assert!(invariants.singletons.contains(&"holding".to_string()));
    assert!(invariants.mutex_patterns > 0);

    std::fs::remove_file(domain).ok();
}

#[test]
fn symmetric_transitions_hit_the_cache() {
    let dfa = CannedDfa(SYMMETRIC_DOT);
    let pipeline = Pipeline {
        dfa_translator: &dfa,
        sas_runner: &CannedSas,
        opts: opts(),
    };
    let domain = domain_file("symmetric");
    let mut elog = ExecutionLog::new("F(on(a, b)) & F(on(c, d))");
    let lib = pipeline
        .compile(
            "F(on(a, b)) & F(on(c, d))",
            &domain,
            vec![],
            None,
            &mut elog,
        )
        .unwrap();

    // Objects were derived from the instruction.
    let text = render(&lib);
    for obj in ["a", "b", "c", "d"] {
        assert!(text.contains(&format!("object({obj}).")));
    }
    // The symmetric single-atom goals share one exploration.
    let cache = elog.cache.as_ref().unwrap();
    assert!(cache.hits > 0, "expected cache hits, log: {elog:?}");
    // Both symmetric rules are present, differing in constants only.
    assert!(text.contains("!put_on_block(a, b)"));
    assert!(text.contains("!put_on_block(c, d)"));

    std::fs::remove_file(domain).ok();
}

#[test]
fn missing_translator_aborts_compilation() {
    let dfa = CannedDfa(SINGLE_GOAL_DOT);
    let pipeline = Pipeline {
        dfa_translator: &dfa,
        sas_runner: &BrokenSas,
        opts: opts(),
    };
    let domain = domain_file("broken");
    let mut elog = ExecutionLog::new("F(on(a, b))");
    let err = pipeline
        .compile(
            "F(on(a, b))",
            &domain,
            vec![Id::new("a"), Id::new("b")],
            None,
            &mut elog,
        )
        .unwrap_err();
    assert!(format!("{err:?}").contains("Invariant extraction failed"));

    std::fs::remove_file(domain).ok();
}

#[test]
fn unknown_dfa_symbol_is_rejected() {
    // The automaton mentions a symbol the instruction never grounded.
    const ROGUE_DOT: &str = r#"digraph MONA_DFA {
        node [shape = doublecircle]; 2;
        init -> 1;
        1 -> 2 [label="clear_z"];
    }"#;
    let dfa = CannedDfa(ROGUE_DOT);
    let pipeline = Pipeline {
        dfa_translator: &dfa,
        sas_runner: &CannedSas,
        opts: opts(),
    };
    let domain = domain_file("rogue");
    let mut elog = ExecutionLog::new("F(on(a, b))");
    let err = pipeline
        .compile(
            "F(on(a, b))",
            &domain,
            vec![Id::new("a"), Id::new("b")],
            None,
            &mut elog,
        )
        .unwrap_err();
    assert!(format!("{err:?}").contains("grounding map"));

    std::fs::remove_file(domain).ok();
}

#[test]
fn emission_is_stable_under_edge_reordering() {
    // The same automaton with its edge statements permuted.
    const REORDERED_DOT: &str = r#"digraph MONA_DFA {
 node [shape = doublecircle]; 2;
 init -> 1;
 2 -> 2 [label="true"];
 1 -> 2 [label="on_a_b"];
 1 -> 1 [label="~on_a_b"];
}"#;
    let compile_with = |dot: &'static str| -> String {
        let dfa = CannedDfa(dot);
        let pipeline = Pipeline {
            dfa_translator: &dfa,
            sas_runner: &CannedSas,
            opts: opts(),
        };
        let domain = domain_file("reorder");
        let mut elog = ExecutionLog::new("F(on(a, b))");
        let lib = pipeline
            .compile(
                "F(on(a, b))",
                &domain,
                vec![Id::new("a"), Id::new("b"), Id::new("c")],
                None,
                &mut elog,
            )
            .unwrap();
        render(&lib)
    };
    assert_eq!(
        compile_with(SINGLE_GOAL_DOT),
        compile_with(REORDERED_DOT)
    );
}

#[test]
fn determinism_across_runs() {
    let run = || -> String {
        let dfa = CannedDfa(SINGLE_GOAL_DOT);
        let pipeline = Pipeline {
            dfa_translator: &dfa,
            sas_runner: &CannedSas,
            opts: opts(),
        };
        let domain = domain_file("determinism");
        let mut elog = ExecutionLog::new("F(on(a, b))");
        let lib = pipeline
            .compile(
                "F(on(a, b))",
                &domain,
                vec![Id::new("a"), Id::new("b"), Id::new("c")],
                None,
                &mut elog,
            )
            .unwrap();
        render(&lib)
    };
    assert_eq!(run(), run());
}
