//! One-shot derivation of lifted mutex patterns and singleton predicates
//! from the action schema, through an external SAS+ translator.
//!
//! The translator's finite-domain output partitions ground atoms into
//! variables whose values are pairwise exclusive, plus explicit mutex
//! groups. Every unordered atom pair inside either kind of group yields a
//! lifted pattern. The extractor is sound but not complete: absence of a
//! pattern says nothing about reachability.
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use telos_ir::{AbstractState, Atom, Context, Term};
use telos_utils::{Error, Id, TelosResult};

/// A lifted mutex constraint between two predicate templates.
///
/// Two atoms match the pattern when their predicate names and arities
/// match (in either order), every `shared` position pair holds equal
/// terms, and every `different` position pair holds terms known to be
/// distinct. A state containing a matching pair is provably unreachable.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct MutexPattern {
    pub pred1: Id,
    pub arity1: usize,
    pub pred2: Id,
    pub arity2: usize,
    pub shared: Vec<(usize, usize)>,
    pub different: Vec<(usize, usize)>,
}

impl MutexPattern {
    /// Normalised constructor: the lexicographically smaller predicate
    /// name goes first so that equal patterns collapse in a set.
    fn new(
        pred1: Id,
        arity1: usize,
        pred2: Id,
        arity2: usize,
        mut shared: Vec<(usize, usize)>,
        mut different: Vec<(usize, usize)>,
    ) -> MutexPattern {
        let flip = pred2.as_str() < pred1.as_str();
        if flip {
            shared = shared.iter().map(|&(a, b)| (b, a)).collect();
            different = different.iter().map(|&(a, b)| (b, a)).collect();
        }
        shared.sort_unstable();
        different.sort_unstable();
        if flip {
            MutexPattern {
                pred1: pred2,
                arity1: arity2,
                pred2: pred1,
                arity2: arity1,
                shared,
                different,
            }
        } else {
            MutexPattern {
                pred1,
                arity1,
                pred2,
                arity2,
                shared,
                different,
            }
        }
    }

    /// Whether two (possibly lifted) positive atoms match this pattern,
    /// given an oracle for "known to be distinct".
    pub fn matches<F>(&self, a: &Atom, b: &Atom, distinct: &F) -> bool
    where
        F: Fn(Term, Term) -> bool,
    {
        self.matches_oriented(a, b, distinct)
            || self.matches_oriented(b, a, distinct)
    }

    fn matches_oriented<F>(&self, a: &Atom, b: &Atom, distinct: &F) -> bool
    where
        F: Fn(Term, Term) -> bool,
    {
        if a.pred != self.pred1
            || b.pred != self.pred2
            || a.arity() != self.arity1
            || b.arity() != self.arity2
        {
            return false;
        }
        self.shared
            .iter()
            .all(|&(i, j)| a.args[i] == b.args[j])
            && self
                .different
                .iter()
                .all(|&(i, j)| distinct(a.args[i], b.args[j]))
    }
}

impl std::fmt::Display for MutexPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} <> {}/{} shared={:?} different={:?}",
            self.pred1, self.arity1, self.pred2, self.arity2, self.shared,
            self.different
        )
    }
}

/// The invariants of one domain: singleton predicates, lifted mutex
/// patterns, and argument-position pairs that can never hold equal terms.
#[derive(Debug, Default)]
pub struct InvariantSet {
    /// Predicates with at most one positive ground instance in any
    /// reachable state.
    pub singletons: HashSet<Id>,
    /// Sorted for deterministic iteration.
    pub patterns: Vec<MutexPattern>,
    /// Per predicate: argument positions that never hold equal terms in
    /// any reachable atom (e.g. `on(x, x)` never appears).
    pub distinct_positions: HashMap<Id, Vec<(usize, usize)>>,
}

impl InvariantSet {
    /// Whether any two positive atoms of the state match a mutex pattern,
    /// or a single atom repeats a term across a position pair known to be
    /// distinct. Such a state is unreachable and must never enter the
    /// state graph.
    pub fn state_violates(&self, state: &AbstractState) -> bool {
        let distinct = |a, b| state.distinct(a, b);
        let positives: Vec<&Atom> =
            state.atoms.iter().filter(|a| !a.negated).collect();
        for atom in &positives {
            if let Some(pairs) = self.distinct_positions.get(&atom.pred) {
                for &(i, j) in pairs {
                    if atom.args[i] == atom.args[j] {
                        return true;
                    }
                }
            }
        }
        positives.iter().tuple_combinations().any(|(a, b)| {
            self.patterns.iter().any(|p| p.matches(a, b, &distinct))
        })
    }
}

/// Abstraction over the external SAS+ translator invocation, so that the
/// pipeline can run against canned output in tests.
pub trait SasRunner {
    /// Translate a (domain, problem) pair into SAS+ text.
    fn translate(
        &self,
        domain_path: &std::path::Path,
        problem_text: &str,
    ) -> TelosResult<String>;
}

/// Production runner: invokes the translator command synchronously.
pub struct CommandSasRunner {
    pub program: PathBuf,
    pub timeout: Duration,
}

impl SasRunner for CommandSasRunner {
    fn translate(
        &self,
        domain_path: &std::path::Path,
        problem_text: &str,
    ) -> TelosResult<String> {
        let work_dir = std::env::temp_dir().join(format!(
            "telos-sas-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&work_dir)?;
        let problem_path = work_dir.join("probe-problem.pddl");
        std::fs::write(&problem_path, problem_text)?;
        let sas_path = work_dir.join("output.sas");

        let mut child = Command::new(&self.program)
            .arg("--translate")
            .arg(domain_path)
            .arg(&problem_path)
            .arg("--sas-file")
            .arg(&sas_path)
            .current_dir(&work_dir)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::invariant_extraction(format!(
                    "failed to run `{}': {e}",
                    self.program.display()
                ))
            })?;
        // Drain the pipes concurrently so a chatty translator cannot fill
        // the pipe buffer and stall against our poll loop.
        let drain = |stream: Option<Box<dyn std::io::Read + Send>>| {
            std::thread::spawn(move || {
                use std::io::Read as _;
                let mut text = String::new();
                if let Some(mut stream) = stream {
                    let _ = stream.read_to_string(&mut text);
                }
                text
            })
        };
        let stdout = drain(
            child
                .stdout
                .take()
                .map(|s| Box::new(s) as Box<dyn std::io::Read + Send>),
        );
        let stderr = drain(
            child
                .stderr
                .take()
                .map(|s| Box::new(s) as Box<dyn std::io::Read + Send>),
        );

        let deadline = std::time::Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if std::time::Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Error::invariant_extraction(format!(
                            "translator timed out after {:?}",
                            self.timeout
                        )));
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    return Err(Error::invariant_extraction(format!(
                        "failed waiting for translator: {e}"
                    )));
                }
            }
        };
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        if !status.success() {
            return Err(Error::invariant_extraction(format!(
                "translator exited with {status}: {stderr}"
            )));
        }
        // Prefer the requested file; fall back to stdout for translators
        // that only stream.
        match std::fs::read_to_string(&sas_path) {
            Ok(content) => Ok(content),
            Err(_) => {
                if stdout.contains("begin_variable") {
                    Ok(stdout)
                } else {
                    Err(Error::invariant_extraction(
                        "translator produced no SAS output",
                    ))
                }
            }
        }
    }
}

/// Runs the translator once per compilation and derives the invariant set.
pub struct InvariantExtractor<'a> {
    runner: &'a dyn SasRunner,
}

impl<'a> InvariantExtractor<'a> {
    pub fn new(runner: &'a dyn SasRunner) -> Self {
        InvariantExtractor { runner }
    }

    /// Derive invariants for the context's domain. `init` supplies the
    /// probe problem's initial facts; when absent a safe over-assertion
    /// (every nullary predicate plus every unary predicate per object) is
    /// generated instead.
    pub fn extract(
        &self,
        ctx: &Context,
        domain_path: &std::path::Path,
        init: Option<&[Atom]>,
    ) -> TelosResult<InvariantSet> {
        let time = std::time::Instant::now();
        let problem = probe_problem(ctx, init);
        let sas = self.runner.translate(domain_path, &problem)?;
        let doc = parse_sas(&sas)
            .map_err(|e| Error::invariant_extraction(e.to_string()))?;
        let set = derive_invariants(&doc);
        log::info!(
            "Extracted {} mutex patterns, {} singletons in {}ms",
            set.patterns.len(),
            set.singletons.len(),
            time.elapsed().as_millis()
        );
        Ok(set)
    }
}

/// Synthesize the minimal well-typed probe problem handed to the
/// translator. Over-asserting the initial state can only suppress mutex
/// groups, never invent them, so the default stays sound.
pub fn probe_problem(ctx: &Context, init: Option<&[Atom]>) -> String {
    use std::fmt::Write as _;
    let mut out = String::new();
    writeln!(out, "(define (problem invariant-probe)").unwrap();
    writeln!(out, "  (:domain {})", ctx.domain.name).unwrap();
    let objects = ctx
        .objects
        .iter()
        .map(|o| {
            let ty = ctx.object_type(*o).unwrap_or_else(|| Id::new("object"));
            format!("{o} - {ty}")
        })
        .join(" ");
    writeln!(out, "  (:objects {objects})").unwrap();
    writeln!(out, "  (:init").unwrap();
    match init {
        Some(atoms) => {
            for atom in atoms.iter().filter(|a| !a.negated) {
                writeln!(out, "    ({})", render_sexp(atom)).unwrap();
            }
        }
        None => {
            for decl in ctx.domain.predicates.values() {
                match decl.arity() {
                    0 => writeln!(out, "    ({})", decl.name).unwrap(),
                    1 => {
                        for &obj in &ctx.objects {
                            writeln!(out, "    ({} {obj})", decl.name)
                                .unwrap();
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    writeln!(out, "  )").unwrap();
    // An arbitrary satisfiable-looking goal; the translator only needs one
    // to ground the task.
    let goal = ctx
        .domain
        .predicates
        .values()
        .find(|d| d.arity() >= 1 && ctx.objects.len() >= d.arity())
        .map(|d| {
            let args = ctx.objects.iter().take(d.arity()).join(" ");
            format!("({} {})", d.name, args)
        })
        .or_else(|| {
            ctx.domain
                .predicates
                .values()
                .find(|d| d.arity() == 0)
                .map(|d| format!("({})", d.name))
        })
        .unwrap_or_else(|| "(and)".to_string());
    writeln!(out, "  (:goal (and {goal}))").unwrap();
    writeln!(out, ")").unwrap();
    out
}

fn render_sexp(atom: &Atom) -> String {
    if atom.args.is_empty() {
        atom.pred.to_string()
    } else {
        format!("{} {}", atom.pred, atom.args.iter().join(" "))
    }
}

// ==================== SAS+ parsing ====================

/// Narrow parse errors for the translator output; folded into
/// [Error::invariant_extraction] at the extractor boundary.
#[derive(thiserror::Error, Debug)]
pub(crate) enum SasParseError {
    #[error("unterminated `{0}' section")]
    Unterminated(&'static str),
    #[error("malformed atom line: `{0}'")]
    MalformedAtom(String),
    #[error("malformed mutex entry: `{0}'")]
    MalformedMutexEntry(String),
    #[error("mutex entry refers to unknown variable {0}")]
    UnknownVariable(usize),
}

#[derive(Debug, Default)]
pub(crate) struct SasDoc {
    /// Per finite-domain variable: its values in declaration order.
    /// `NegatedAtom` and `<none of those>` values are kept as `None` so
    /// that mutex-group indices stay aligned.
    pub variables: Vec<Vec<Option<(Id, Vec<Id>)>>>,
    /// Mutex groups as (variable, value) pairs.
    pub groups: Vec<Vec<(usize, usize)>>,
}

/// Tolerant SAS+ reader: trailing whitespace and blank lines are ignored;
/// only variable and mutex-group sections are interpreted.
pub(crate) fn parse_sas(content: &str) -> Result<SasDoc, SasParseError> {
    let mut doc = SasDoc::default();
    let mut lines = content.lines().map(str::trim);

    while let Some(line) = lines.next() {
        match line {
            "begin_variable" => {
                let mut values = Vec::new();
                loop {
                    let Some(line) = lines.next() else {
                        return Err(SasParseError::Unterminated(
                            "begin_variable",
                        ));
                    };
                    if line == "end_variable" {
                        break;
                    }
                    values.push(line);
                }
                // The leading name / axiom-layer / range lines never start
                // with an atom marker and fall through as `None` padding;
                // only the value lines matter, and atom values keep their
                // positional index.
                let mut atoms: Vec<Option<(Id, Vec<Id>)>> = Vec::new();
                let mut in_values = false;
                for line in values {
                    if let Some(rest) = line.strip_prefix("Atom ") {
                        in_values = true;
                        atoms.push(Some(parse_sas_atom(rest)?));
                    } else if line.starts_with("NegatedAtom ")
                        || line.starts_with('<')
                    {
                        in_values = true;
                        atoms.push(None);
                    } else if in_values {
                        // Value lines are contiguous; anything after them
                        // is unexpected but tolerated.
                        atoms.push(None);
                    }
                }
                doc.variables.push(atoms);
            }
            "begin_mutex_group" => {
                let mut entries: Vec<(usize, usize)> = Vec::new();
                let mut first = true;
                loop {
                    let Some(line) = lines.next() else {
                        return Err(SasParseError::Unterminated(
                            "begin_mutex_group",
                        ));
                    };
                    if line == "end_mutex_group" {
                        break;
                    }
                    if line.is_empty() {
                        continue;
                    }
                    // The first line of the section is the entry count.
                    if first && !line.contains(' ') {
                        first = false;
                        continue;
                    }
                    first = false;
                    let mut parts = line.split_whitespace();
                    let (Some(var), Some(val), None) =
                        (parts.next(), parts.next(), parts.next())
                    else {
                        return Err(SasParseError::MalformedMutexEntry(
                            line.to_string(),
                        ));
                    };
                    let var: usize = var.parse().map_err(|_| {
                        SasParseError::MalformedMutexEntry(line.to_string())
                    })?;
                    let val: usize = val.parse().map_err(|_| {
                        SasParseError::MalformedMutexEntry(line.to_string())
                    })?;
                    if var >= doc.variables.len() {
                        return Err(SasParseError::UnknownVariable(var));
                    }
                    entries.push((var, val));
                }
                doc.groups.push(entries);
            }
            _ => {}
        }
    }
    Ok(doc)
}

/// Parse `pred(arg1, arg2)` / `pred()` from an `Atom ...` line.
fn parse_sas_atom(text: &str) -> Result<(Id, Vec<Id>), SasParseError> {
    let text = text.trim();
    let Some(open) = text.find('(') else {
        return Err(SasParseError::MalformedAtom(text.to_string()));
    };
    let Some(close) = text.rfind(')') else {
        return Err(SasParseError::MalformedAtom(text.to_string()));
    };
    let pred = text[..open].trim();
    if pred.is_empty() || close < open {
        return Err(SasParseError::MalformedAtom(text.to_string()));
    }
    let inner = text[open + 1..close].trim();
    let args = if inner.is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(|a| Id::new(a.trim())).collect()
    };
    Ok((Id::new(pred), args))
}

// ==================== Invariant derivation ====================

pub(crate) fn derive_invariants(doc: &SasDoc) -> InvariantSet {
    let mut patterns: HashSet<MutexPattern> = HashSet::new();

    // Intra-variable mutex: the values of one finite-domain variable are
    // pairwise exclusive.
    for atoms in &doc.variables {
        for ((n1, a1), (n2, a2)) in atoms.iter().flatten().tuple_combinations()
        {
            if let Some(p) = lift_pattern(*n1, a1, *n2, a2) {
                patterns.insert(p);
            }
        }
    }

    // Cross-variable mutex groups.
    let mut singletons: HashSet<Id> = HashSet::new();
    for group in &doc.groups {
        let atoms: Vec<&(Id, Vec<Id>)> = group
            .iter()
            .filter_map(|&(var, val)| {
                doc.variables[var].get(val).and_then(|v| v.as_ref())
            })
            .collect();
        for (a, b) in atoms.iter().tuple_combinations() {
            if let Some(p) = lift_pattern(a.0, &a.1, b.0, &b.1) {
                patterns.insert(p);
            }
        }
        // A predicate appearing more than once in a single mutex group can
        // hold at most one instance.
        let mut counts: HashMap<Id, usize> = HashMap::new();
        for (name, _) in &atoms {
            *counts.entry(*name).or_default() += 1;
        }
        singletons
            .extend(counts.iter().filter(|&(_, &c)| c > 1).map(|(&n, _)| n));
    }

    // Position pairs never instantiated with equal constants across the
    // reachable atom universe.
    let mut seen: HashMap<Id, Vec<&Vec<Id>>> = HashMap::new();
    for atoms in &doc.variables {
        for (name, args) in atoms.iter().flatten() {
            seen.entry(*name).or_default().push(args);
        }
    }
    let mut distinct_positions: HashMap<Id, Vec<(usize, usize)>> =
        HashMap::new();
    for (&name, occurrences) in &seen {
        let arity = occurrences[0].len();
        if arity < 2 || occurrences.iter().any(|a| a.len() != arity) {
            continue;
        }
        let pairs: Vec<(usize, usize)> = (0..arity)
            .tuple_combinations()
            .filter(|&(i, j)| {
                occurrences.iter().all(|args| args[i] != args[j])
            })
            .collect();
        if !pairs.is_empty() {
            distinct_positions.insert(name, pairs);
        }
    }

    let mut patterns: Vec<MutexPattern> = patterns.into_iter().collect();
    patterns.sort_by(|a, b| {
        (a.pred1.as_str(), a.arity1, a.pred2.as_str(), a.arity2)
            .cmp(&(b.pred1.as_str(), b.arity1, b.pred2.as_str(), b.arity2))
            .then_with(|| a.shared.cmp(&b.shared))
            .then_with(|| a.different.cmp(&b.different))
    });

    InvariantSet {
        singletons,
        patterns,
        distinct_positions,
    }
}

/// Lift a ground mutex pair into a pattern over positions: positions with
/// equal constants become `shared`, positions with unequal constants (same
/// arity only) become `different`. Same-predicate pairs with no differing
/// position would only match an atom against itself and are discarded.
fn lift_pattern(
    n1: Id,
    a1: &[Id],
    n2: Id,
    a2: &[Id],
) -> Option<MutexPattern> {
    let mut shared = Vec::new();
    let mut different = Vec::new();
    if a1.len() == a2.len() {
        for pos in 0..a1.len() {
            if a1[pos] == a2[pos] {
                shared.push((pos, pos));
            } else {
                different.push((pos, pos));
            }
        }
    } else {
        // Cross-arity: only positions with matching constants are
        // meaningful; there is no position correspondence to call
        // "different".
        for (i, x) in a1.iter().enumerate() {
            for (j, y) in a2.iter().enumerate() {
                if x == y {
                    shared.push((i, j));
                }
            }
        }
    }
    if n1 == n2 && different.is_empty() {
        return None;
    }
    Some(MutexPattern::new(
        n1,
        a1.len(),
        n2,
        a2.len(),
        shared,
        different,
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{InvariantSet, MutexPattern, parse_sas};
    use crate::invariants::derive_invariants;
    use telos_ir::{AbstractState, Atom, Term};
    use telos_utils::Id;

    /// Canned translator output for a two-block world. Variable 0 and 1
    /// track each block's position; the mutex group is the hand invariant.
    pub(crate) const BLOCKS_SAS: &str = "\
begin_version
3
end_version
begin_metric
0
end_metric
3
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

    fn c(s: &str) -> Term {
        Term::Const(Id::new(s))
    }

    pub(crate) fn invariants() -> InvariantSet {
        derive_invariants(&parse_sas(BLOCKS_SAS).unwrap())
    }

    #[test]
    fn parse_sections() {
        let doc = parse_sas(BLOCKS_SAS).unwrap();
        assert_eq!(doc.variables.len(), 3);
        // Three atom values plus the `<none of those>` placeholder.
        assert_eq!(doc.variables[0].len(), 4);
        assert_eq!(doc.variables[0].iter().flatten().count(), 3);
        assert_eq!(doc.groups.len(), 1);
        assert_eq!(doc.groups[0].len(), 3);
    }

    #[test]
    fn singleton_from_mutex_group() {
        let inv = invariants();
        assert!(inv.singletons.contains(&Id::new("holding")));
        assert!(!inv.singletons.contains(&Id::new("handempty")));
    }

    #[test]
    fn holding_vs_handempty_is_mutex() {
        let inv = invariants();
        let state = AbstractState::new(
            vec![
                Atom::new(Id::new("holding"), [c("a")]),
                Atom::new(Id::new("handempty"), []),
            ],
            vec![],
            0,
            0,
        );
        assert!(inv.state_violates(&state));
    }

    #[test]
    fn two_holdings_of_distinct_blocks_are_mutex() {
        let inv = invariants();
        let state = AbstractState::new(
            vec![
                Atom::new(Id::new("holding"), [c("a")]),
                Atom::new(Id::new("holding"), [c("b")]),
            ],
            vec![],
            0,
            0,
        );
        assert!(inv.state_violates(&state));

        // Two holdings of possibly-equal variables are not provably
        // distinct, so the pattern does not fire.
        let state = AbstractState::new(
            vec![
                Atom::new(Id::new("holding"), [Term::Var(1)]),
                Atom::new(Id::new("holding"), [Term::Var(2)]),
            ],
            vec![],
            0,
            0,
        );
        assert!(!inv.state_violates(&state));
    }

    #[test]
    fn holding_vs_own_position_is_mutex() {
        let inv = invariants();
        // holding(a) and ontable(a) share a block: unreachable together.
        let state = AbstractState::new(
            vec![
                Atom::new(Id::new("holding"), [c("a")]),
                Atom::new(Id::new("ontable"), [c("a")]),
            ],
            vec![],
            0,
            0,
        );
        assert!(inv.state_violates(&state));
        // Different blocks are fine.
        let state = AbstractState::new(
            vec![
                Atom::new(Id::new("holding"), [c("a")]),
                Atom::new(Id::new("ontable"), [c("b")]),
            ],
            vec![],
            0,
            0,
        );
        assert!(!inv.state_violates(&state));
    }

    #[test]
    fn on_never_repeats_its_argument() {
        let inv = invariants();
        let pairs = inv.distinct_positions.get(&Id::new("on")).unwrap();
        assert_eq!(pairs, &vec![(0, 1)]);
        let state = AbstractState::new(
            vec![Atom::new(Id::new("on"), [Term::Var(1), Term::Var(1)])],
            vec![],
            0,
            0,
        );
        assert!(inv.state_violates(&state));
    }

    #[test]
    fn trivial_same_predicate_pairs_are_discarded() {
        let inv = invariants();
        // No pattern may have a predicate pair with no constraints at all.
        for p in &inv.patterns {
            assert!(
                !(p.pred1 == p.pred2 && p.different.is_empty()),
                "trivial pattern {p} survived"
            );
        }
    }

    #[test]
    fn pattern_matching_orientation() {
        let p = MutexPattern::new(
            Id::new("handempty"),
            0,
            Id::new("holding"),
            1,
            vec![],
            vec![],
        );
        let hold = Atom::new(Id::new("holding"), [c("a")]);
        let empty = Atom::new(Id::new("handempty"), []);
        let never = |_, _| false;
        assert!(p.matches(&hold, &empty, &never));
        assert!(p.matches(&empty, &hold, &never));
    }

    #[test]
    fn malformed_sas_is_rejected() {
        assert!(parse_sas("begin_variable\nvar0\n").is_err());
        assert!(
            parse_sas("begin_variable\nAtom nope\nend_variable\n").is_err()
        );
    }
}
