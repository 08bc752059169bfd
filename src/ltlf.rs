//! The LTLf front-end boundary.
//!
//! The instruction arrives with typed predicates (`F(on(a, b))`); the
//! external translator speaks propositions. Flattening registers every
//! predicate atom in the grounding map and rewrites the formula over the
//! propositional symbols, leaving temporal operators and connectives
//! untouched.
use itertools::Itertools;
use std::path::PathBuf;
use std::process::Command;
use telos_ir::{Atom, Domain, GroundingMap, Term};
use telos_utils::{Error, Id, TelosResult};

/// Temporal operators passed through verbatim.
const TEMPORAL: &[&str] = &["F", "G", "X", "U", "R", "WX"];

/// Rewrite the instruction over propositional symbols, interning every
/// predicate application in the grounding map. Undeclared predicates and
/// arity mismatches surface here, before the external tool ever runs.
pub fn flatten(
    instruction: &str,
    domain: &Domain,
    gmap: &mut GroundingMap,
) -> TelosResult<String> {
    let chars: Vec<char> = instruction.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !c.is_ascii_alphabetic() {
            out.push(c);
            i += 1;
            continue;
        }

        let (ident, after) = scan_ident(&chars, i);
        if TEMPORAL.contains(&ident.as_str())
            || ident == "true"
            || ident == "false"
        {
            out.push_str(&ident);
            i = after;
            continue;
        }

        // A declared predicate either applies to arguments or stands
        // alone as a proposition.
        let mut j = after;
        while j < chars.len() && chars[j] == ' ' {
            j += 1;
        }
        let pred = Id::new(&ident);
        let args = if j < chars.len() && chars[j] == '(' {
            let Some(close) =
                (j + 1..chars.len()).find(|&k| chars[k] == ')')
            else {
                return Err(Error::misc(format!(
                    "unbalanced parentheses after `{ident}' in instruction"
                )));
            };
            let inner: String = chars[j + 1..close].iter().collect();
            let args: Vec<Id> = inner
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Id::new)
                .collect();
            i = close + 1;
            args
        } else {
            i = after;
            Vec::new()
        };

        let decl = domain
            .predicate(pred)
            .ok_or_else(|| Error::undefined(pred, "predicate"))?;
        if decl.arity() != args.len() {
            return Err(Error::misc(format!(
                "predicate `{pred}' has arity {} but the instruction \
                 applies it to ({})",
                decl.arity(),
                args.iter().join(", ")
            )));
        }
        let symbol = gmap.intern(pred, args)?;
        out.push_str(symbol.as_str());
    }
    Ok(out)
}

fn scan_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() {
        let c = chars[end];
        if c.is_ascii_alphanumeric() || c == '_' {
            end += 1;
        } else if c == '-'
            && end + 1 < chars.len()
            && chars[end + 1].is_ascii_alphanumeric()
        {
            // A hyphen inside a constant-like name, not the `->` arrow.
            end += 1;
        } else {
            break;
        }
    }
    (chars[start..end].iter().collect(), end)
}

/// Parse a comma-separated fact list such as `ontable(a), clear(a),
/// handempty` into ground atoms, for the invariant probe's initial state.
pub fn parse_facts(text: &str) -> TelosResult<Vec<Atom>> {
    let mut facts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::misc(format!("unbalanced `)' in facts: {text}"))
                })?;
                current.push(c);
            }
            ',' if depth == 0 => {
                let fact = current.trim();
                if !fact.is_empty() {
                    facts.push(parse_fact(fact)?);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(Error::misc(format!(
            "unbalanced `(' in facts: {text}"
        )));
    }
    let fact = current.trim();
    if !fact.is_empty() {
        facts.push(parse_fact(fact)?);
    }
    Ok(facts)
}

fn parse_fact(text: &str) -> TelosResult<Atom> {
    match text.split_once('(') {
        None => Ok(Atom::new(Id::new(text.trim()), [])),
        Some((name, rest)) => {
            let inner = rest.trim_end().strip_suffix(')').ok_or_else(|| {
                Error::misc(format!("malformed fact `{text}'"))
            })?;
            let args = inner
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Term::Const(Id::new(s)));
            Ok(Atom::new(Id::new(name.trim()), args))
        }
    }
}

/// The external LTLf-to-DFA translator boundary.
pub trait DfaTranslator {
    /// Produce DOT text for the propositional formula.
    fn to_dfa(&self, formula: &str) -> TelosResult<String>;
}

/// Production translator: invokes the MONA-based command with the formula
/// and reads the DOT from stdout.
pub struct CommandDfaTranslator {
    pub program: PathBuf,
}

impl DfaTranslator for CommandDfaTranslator {
    fn to_dfa(&self, formula: &str) -> TelosResult<String> {
        let output = Command::new(&self.program)
            .arg(formula)
            .output()
            .map_err(|e| {
                Error::misc(format!(
                    "failed to run LTLf translator `{}': {e}",
                    self.program.display()
                ))
            })?;
        if !output.status.success() {
            return Err(Error::misc(format!(
                "LTLf translator exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
