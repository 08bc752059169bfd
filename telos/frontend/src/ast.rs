//! Abstract Syntax Tree for telos inputs.
use crate::{dfa_parser, parser};
use atty::Stream;
use telos_utils::{Error, Id, TelosResult};
use std::path::PathBuf;

/// A parsed planning domain file.
#[derive(Debug)]
pub struct DomainDef {
    /// Name of the domain.
    pub name: Id,
    /// Declared object types. May be empty for untyped domains.
    pub types: Vec<Id>,
    /// Declared predicates with their typed parameters.
    pub predicates: Vec<PredicateSig>,
    /// Action declarations.
    pub actions: Vec<ActionDef>,
}

impl DomainDef {
    /// Construct a domain from a file or the input stream.
    /// If no file is provided, the input stream must not be a TTY.
    pub fn construct(file: &Option<PathBuf>) -> TelosResult<Self> {
        match file {
            Some(file) => parser::DomainParser::parse_file(file),
            None => {
                if atty::isnt(Stream::Stdin) {
                    parser::DomainParser::parse(std::io::stdin())
                } else {
                    Err(Error::invalid_file(
                        "No file provided and terminal not a TTY".to_string(),
                    ))
                }
            }
        }
    }

    /// Construct a domain from a string.
    pub fn construct_from_str(inp: &str) -> TelosResult<Self> {
        parser::DomainParser::parse(inp.as_bytes())
    }
}

/// Declaration of a predicate: name plus typed parameters.
#[derive(Debug)]
pub struct PredicateSig {
    pub name: Id,
    pub params: Vec<ParamDef>,
}

/// A typed parameter `?x - block`. Untyped parameters get the type `object`.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: Id,
    pub ty: Id,
}

/// A predicate applied to terms, with a polarity flag. Terms are variables
/// (leading `?`) or constants.
#[derive(Debug, Clone)]
pub struct LiteralDef {
    pub name: Id,
    pub args: Vec<TermDef>,
    pub negated: bool,
}

/// A term in the domain AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermDef {
    /// `?x`, without the question mark.
    Variable(Id),
    /// An object constant.
    Constant(Id),
}

/// An action declaration.
#[derive(Debug)]
pub struct ActionDef {
    pub name: Id,
    pub params: Vec<ParamDef>,
    /// Conjunction of literals that must hold before the action fires.
    pub precondition: Vec<LiteralDef>,
    /// `(not (= ?x ?y))` constraints from the precondition.
    pub inequalities: Vec<(TermDef, TermDef)>,
    /// `(= ?x ?y)` constraints from the precondition.
    pub equalities: Vec<(TermDef, TermDef)>,
    /// Effect branches. A deterministic action has exactly one; a `oneof`
    /// effect contributes one branch per disjunct.
    pub effects: Vec<EffectDef>,
}

/// One conjunctive effect branch: added and deleted literals.
#[derive(Debug, Default)]
pub struct EffectDef {
    pub adds: Vec<LiteralDef>,
    pub dels: Vec<LiteralDef>,
}

// ===================================
// AST for the automaton input
// ===================================

/// A parsed DOT-format automaton.
#[derive(Debug)]
pub struct DfaDef {
    /// All state names, in first-appearance order.
    pub states: Vec<Id>,
    /// Target of the unique `init ->` edge.
    pub init: Id,
    /// States drawn with a double circle.
    pub accepting: Vec<Id>,
    /// Labelled transitions. Multiplicity of edges sharing endpoints but
    /// differing in label is preserved.
    pub edges: Vec<DfaEdgeDef>,
}

impl DfaDef {
    /// Parse an automaton from DOT text.
    pub fn construct_from_str(inp: &str) -> TelosResult<Self> {
        dfa_parser::DfaParser::parse_str(inp)
    }
}

#[derive(Debug)]
pub struct DfaEdgeDef {
    pub from: Id,
    pub to: Id,
    /// The raw label text, kept for reporting.
    pub label: String,
    pub guard: GuardExpr,
}

/// The AST for edge-label boolean expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardExpr {
    And(Box<GuardExpr>, Box<GuardExpr>),
    Or(Box<GuardExpr>, Box<GuardExpr>),
    Implies(Box<GuardExpr>, Box<GuardExpr>),
    Iff(Box<GuardExpr>, Box<GuardExpr>),
    Not(Box<GuardExpr>),
    /// A propositional symbol.
    Atom(Id),
    True,
    False,
}
