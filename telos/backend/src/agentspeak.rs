//! Serialisation of the plan library into the agent language.
//!
//! The emitted file carries the known-object and known-predicate
//! declarations followed by the plan rules. Variables keep their `?`
//! prefix, subgoals and action calls are `!`-prefixed, context elements
//! are comma-separated, and `-` in names becomes `_` since the agent
//! language reserves the minus sign.
use crate::rules::{BodyItem, PlanLibrary, PlanRule};
use crate::traits::Backend;
use itertools::Itertools;
use telos_ir::{Atom, Term};
use telos_utils::{Error, OutputFile, TelosResult};

pub struct AgentSpeakBackend;

impl Backend for AgentSpeakBackend {
    fn name(&self) -> &'static str {
        "agentspeak"
    }

    fn validate(lib: &PlanLibrary) -> TelosResult<()> {
        for rule in &lib.rules {
            if rule.trigger.is_empty() {
                return Err(Error::internal("plan rule without a trigger"));
            }
            if !matches!(rule.body.first(), Some(BodyItem::Action { .. })) {
                return Err(Error::internal(
                    "plan rule body must start with its action call",
                ));
            }
        }
        Ok(())
    }

    fn emit(lib: &PlanLibrary, write: &mut OutputFile) -> TelosResult<()> {
        use std::io::Write as _;
        let out = render(lib);
        write.get_write().write_all(out.as_bytes())?;
        Ok(())
    }
}

/// Render the complete plan-library file.
pub fn render(lib: &PlanLibrary) -> String {
    use std::fmt::Write as _;
    let mut out = String::new();
    writeln!(out, "// Plan library for domain `{}'", lib.domain_name)
        .unwrap();
    writeln!(out).unwrap();

    writeln!(out, "// known objects").unwrap();
    for obj in &lib.objects {
        writeln!(out, "object({}).", sanitize(obj.as_str())).unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "// known predicates").unwrap();
    for (name, arity) in &lib.predicates {
        writeln!(out, "predicate({}/{}).", sanitize(name.as_str()), arity)
            .unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "// plan rules").unwrap();
    for rule in &lib.rules {
        writeln!(out, "{}", render_rule(rule)).unwrap();
    }
    out
}

fn render_rule(rule: &PlanRule) -> String {
    let trigger = render_trigger(&rule.trigger);
    let mut context: Vec<String> =
        rule.context_atoms.iter().map(render_atom).collect();
    context.extend(
        rule.context_neqs
            .iter()
            .map(|c| format!("{} != {}", render_term(c.0), render_term(c.1))),
    );
    let context = if context.is_empty() {
        "true".to_string()
    } else {
        context.join(", ")
    };
    let body = rule
        .body
        .iter()
        .map(|item| match item {
            BodyItem::Action { name, args } => {
                format!("!{}", render_call(name.as_str(), args))
            }
            BodyItem::Subgoal(atom) => format!("!{}", render_atom(atom)),
        })
        .join("; ");
    format!("+!{trigger} : {context} <- {body}.")
}

fn render_trigger(atoms: &[Atom]) -> String {
    match atoms {
        [single] => render_atom(single),
        many => {
            format!("and({})", many.iter().map(render_atom).join(", "))
        }
    }
}

fn render_atom(atom: &Atom) -> String {
    let call = render_call(atom.pred.as_str(), &atom.args);
    if atom.negated { format!("~{call}") } else { call }
}

fn render_call(name: &str, args: &[Term]) -> String {
    if args.is_empty() {
        sanitize(name)
    } else {
        format!(
            "{}({})",
            sanitize(name),
            args.iter().map(|&t| render_term(t)).join(", ")
        )
    }
}

fn render_term(term: Term) -> String {
    match term {
        Term::Const(c) => sanitize(c.as_str()),
        Term::Var(v) => format!("?{v}"),
    }
}

fn sanitize(name: &str) -> String {
    name.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::render;
    use crate::rules::tests::{blocks_ctx, blocks_invariants};
    use crate::rules::{PlanLibrary, SolvedTransition};
    use crate::{AgentSpeakBackend, Backend};
    use telos_ir::Atom;
    use telos_plan::{Planner, SearchConfig};
    use telos_utils::Id;

    fn library(goal_args: (&str, &str)) -> PlanLibrary {
        let ctx = blocks_ctx(&["a", "b", "c"]);
        let inv = blocks_invariants();
        let config = SearchConfig {
            max_states: 40,
            max_depth: Some(2),
            timeout: None,
        };
        let mut planner = Planner::new(&ctx, &inv, config);
        let goal = [Atom::new(
            Id::new("on"),
            [
                telos_ir::Term::Const(Id::new(goal_args.0)),
                telos_ir::Term::Const(Id::new(goal_args.1)),
            ],
        )];
        let outcome = planner.solve(&goal);
        let solved = SolvedTransition {
            from: Id::new("1"),
            to: Id::new("2"),
            partition: Id::new("p0"),
            outcome,
        };
        PlanLibrary::build(&ctx, &inv, &[solved])
    }

    #[test]
    fn emits_declarations_and_rules() {
        let lib = library(("a", "b"));
        let text = render(&lib);
        assert!(text.contains("object(a)."));
        assert!(text.contains("predicate(on/2)."));
        assert!(text.contains("predicate(handempty/0)."));
        assert!(
            text.contains(
                "+!on(a, b) : clear(b), holding(a) <- !put_on_block(a, b)"
            ),
            "missing root rule in:\n{text}"
        );
    }

    #[test]
    fn hyphenated_names_are_sanitized() {
        let lib = library(("a", "b"));
        let text = render(&lib);
        // The domain action is `pick-up`; no raw hyphen survives in calls.
        assert!(text.contains("!pick_up("));
        assert!(!text.contains("!pick-up("));
    }

    #[test]
    fn type_annotations_never_leak_into_calls() {
        let lib = library(("a", "b"));
        let text = render(&lib);
        assert!(!text.contains("- block"));
        assert!(!text.contains("?b1"));
    }

    #[test]
    fn validation_accepts_built_library() {
        let lib = library(("a", "b"));
        assert!(AgentSpeakBackend::validate(&lib).is_ok());
    }

    #[test]
    fn inequality_renders_in_context() {
        let lib = library(("a", "b"));
        let text = render(&lib);
        // Deeper pick-up rules constrain the fresh source block.
        assert!(text.contains(" != "), "no inequality found in:\n{text}");
    }
}
