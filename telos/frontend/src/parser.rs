#![allow(clippy::upper_case_acronyms)]

//! Parser for planning-domain files.
use crate::ast::{
    ActionDef, DomainDef, EffectDef, LiteralDef, ParamDef, PredicateSig,
    TermDef,
};
use pest_consume::{Error, Parser, match_nodes};
use std::fs;
use std::io::Read;
use std::path::Path;
use telos_utils::{self, Id, TelosResult};

type ParseResult<T> = Result<T, Error<Rule>>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

// include the grammar file so that Cargo knows to rebuild this file on
// grammar changes
const _GRAMMAR: &str = include_str!("pddl.pest");

/// An item inside a precondition or effect conjunction.
enum Item {
    Lit(LiteralDef),
    Eq(TermDef, TermDef),
    Neq(TermDef, TermDef),
}

#[derive(Parser)]
#[grammar = "pddl.pest"]
pub struct DomainParser;

impl DomainParser {
    /// Parse a domain file into its AST representation.
    pub fn parse_file(path: &Path) -> TelosResult<DomainDef> {
        let time = std::time::Instant::now();
        let content = &fs::read(path).map_err(|err| {
            telos_utils::Error::invalid_file(format!(
                "Failed to read {}: {err}",
                path.to_string_lossy(),
            ))
        })?;
        let string_content = std::str::from_utf8(content)?;
        let out = Self::parse_source(string_content).map_err(|e| {
            e.with_post_msg(Some(format!(
                "while parsing `{}'",
                path.to_string_lossy()
            )))
        })?;
        log::info!(
            "Parsed `{}` in {}ms",
            path.to_string_lossy(),
            time.elapsed().as_millis()
        );
        Ok(out)
    }

    pub fn parse<R: Read>(mut r: R) -> TelosResult<DomainDef> {
        let mut buf = String::new();
        r.read_to_string(&mut buf).map_err(|err| {
            telos_utils::Error::invalid_file(format!(
                "Failed to read domain input: {err}",
            ))
        })?;
        Self::parse_source(&buf)
    }

    fn parse_source(content: &str) -> TelosResult<DomainDef> {
        let inputs = DomainParser::parse_with_userdata(
            Rule::file,
            content,
            (),
        )
        .map_err(|e| telos_utils::Error::domain_parse(e.to_string()))?;
        let input = inputs
            .single()
            .map_err(|e| telos_utils::Error::domain_parse(e.to_string()))?;
        DomainParser::file(input)
            .map_err(|e| telos_utils::Error::domain_parse(e.to_string()))
    }
}

#[pest_consume::parser]
impl DomainParser {
    fn EOI(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    // ================ Literals =====================
    fn identifier(input: Node) -> ParseResult<Id> {
        Ok(Id::new(input.as_str()))
    }

    fn variable(input: Node) -> ParseResult<Id> {
        // Strip the leading `?`; the variable namespace is implicit.
        Ok(Id::new(&input.as_str()[1..]))
    }

    fn term(input: Node) -> ParseResult<TermDef> {
        Ok(match_nodes!(input.into_children();
            [variable(v)] => TermDef::Variable(v),
            [identifier(c)] => TermDef::Constant(c),
        ))
    }

    fn requirement(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn requirements(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    // ================ Declarations =====================
    fn types_decl(input: Node) -> ParseResult<Vec<Id>> {
        Ok(match_nodes!(input.into_children();
            [identifier(ids)..] => ids.collect(),
        ))
    }

    fn param_group(input: Node) -> ParseResult<Vec<ParamDef>> {
        let mut vars: Vec<Id> = Vec::new();
        let mut ty: Option<Id> = None;
        for child in input.into_children() {
            match child.as_rule() {
                Rule::variable => vars.push(Self::variable(child)?),
                Rule::identifier => ty = Some(Self::identifier(child)?),
                _ => unreachable!("unexpected rule in param_group"),
            }
        }
        let ty = ty.unwrap_or_else(|| Id::new("object"));
        Ok(vars.into_iter().map(|name| ParamDef { name, ty }).collect())
    }

    fn predicate_sig(input: Node) -> ParseResult<PredicateSig> {
        Ok(match_nodes!(input.into_children();
            [identifier(name), param_group(groups)..] => PredicateSig {
                name,
                params: groups.flatten().collect(),
            },
        ))
    }

    fn predicates_decl(input: Node) -> ParseResult<Vec<PredicateSig>> {
        Ok(match_nodes!(input.into_children();
            [predicate_sig(sigs)..] => sigs.collect(),
        ))
    }

    // ================ Formulas =====================
    fn atom(input: Node) -> ParseResult<LiteralDef> {
        Ok(match_nodes!(input.into_children();
            [identifier(name), term(args)..] => LiteralDef {
                name,
                args: args.collect(),
                negated: false,
            },
        ))
    }

    fn neg_atom(input: Node) -> ParseResult<LiteralDef> {
        let lit = match_nodes!(input.into_children();
            [atom(lit)] => lit,
        );
        Ok(LiteralDef {
            negated: true,
            ..lit
        })
    }

    fn eq_constraint(input: Node) -> ParseResult<(TermDef, TermDef)> {
        Ok(match_nodes!(input.into_children();
            [term(a), term(b)] => (a, b),
        ))
    }

    fn neq_constraint(input: Node) -> ParseResult<(TermDef, TermDef)> {
        Ok(match_nodes!(input.into_children();
            [eq_constraint(pair)] => pair,
        ))
    }

    fn literal(input: Node) -> ParseResult<Item> {
        Ok(match_nodes!(input.into_children();
            [neq_constraint(pair)] => Item::Neq(pair.0, pair.1),
            [eq_constraint(pair)] => Item::Eq(pair.0, pair.1),
            [neg_atom(lit)] => Item::Lit(lit),
            [atom(lit)] => Item::Lit(lit),
        ))
    }

    fn and_clause(input: Node) -> ParseResult<Vec<Item>> {
        Ok(match_nodes!(input.into_children();
            [literal(items)..] => items.collect(),
        ))
    }

    fn precondition(input: Node) -> ParseResult<Vec<Item>> {
        Ok(match_nodes!(input.into_children();
            [and_clause(items)] => items,
            [literal(item)] => vec![item],
        ))
    }

    fn eff_clause(input: Node) -> ParseResult<EffectDef> {
        let items = match_nodes!(input.clone().into_children();
            [and_clause(items)] => items,
            [literal(item)] => vec![item],
        );
        let mut eff = EffectDef::default();
        for item in items {
            match item {
                Item::Lit(mut lit) => {
                    if lit.negated {
                        lit.negated = false;
                        eff.dels.push(lit);
                    } else {
                        eff.adds.push(lit);
                    }
                }
                Item::Eq(..) | Item::Neq(..) => {
                    return Err(input
                        .error("equality constraints cannot appear in effects"));
                }
            }
        }
        Ok(eff)
    }

    fn oneof_effect(input: Node) -> ParseResult<Vec<EffectDef>> {
        Ok(match_nodes!(input.into_children();
            [eff_clause(branches)..] => branches.collect(),
        ))
    }

    fn effect(input: Node) -> ParseResult<Vec<EffectDef>> {
        Ok(match_nodes!(input.into_children();
            [oneof_effect(branches)] => branches,
            [eff_clause(branch)] => vec![branch],
        ))
    }

    fn action_decl(input: Node) -> ParseResult<ActionDef> {
        Ok(match_nodes!(input.into_children();
            [identifier(name), param_group(groups).., precondition(pre), effect(effects)] => {
                let mut precondition = Vec::new();
                let mut inequalities = Vec::new();
                let mut equalities = Vec::new();
                for item in pre {
                    match item {
                        Item::Lit(lit) => precondition.push(lit),
                        Item::Neq(a, b) => inequalities.push((a, b)),
                        Item::Eq(a, b) => equalities.push((a, b)),
                    }
                }
                ActionDef {
                    name,
                    params: groups.flatten().collect(),
                    precondition,
                    inequalities,
                    equalities,
                    effects,
                }
            },
        ))
    }

    fn domain(input: Node) -> ParseResult<DomainDef> {
        Ok(match_nodes!(input.into_children();
            [identifier(name), requirements(_), types_decl(types), predicates_decl(predicates), action_decl(actions)..] =>
                DomainDef { name, types, predicates, actions: actions.collect() },
            [identifier(name), types_decl(types), predicates_decl(predicates), action_decl(actions)..] =>
                DomainDef { name, types, predicates, actions: actions.collect() },
            [identifier(name), requirements(_), predicates_decl(predicates), action_decl(actions)..] =>
                DomainDef { name, types: Vec::new(), predicates, actions: actions.collect() },
            [identifier(name), predicates_decl(predicates), action_decl(actions)..] =>
                DomainDef { name, types: Vec::new(), predicates, actions: actions.collect() },
        ))
    }

    fn file(input: Node) -> ParseResult<DomainDef> {
        Ok(match_nodes!(input.into_children();
            [domain(d), EOI(_)] => d,
        ))
    }
}
