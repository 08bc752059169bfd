#![allow(clippy::upper_case_acronyms)]

//! Parser for the DOT-format automaton emitted by the LTLf translator.
//!
//! The translator's output carries Graphviz layout directives (`rankdir`,
//! `size`, font settings) around the actual automaton. Everything but node
//! shapes, the `init ->` pseudo-edge, and labelled transitions is ignored.
use crate::ast::{DfaDef, DfaEdgeDef};
use crate::guard_parser;
use pest_consume::{Error, Parser, match_nodes};
use telos_utils::{self, Id, TelosResult};

type ParseResult<T> = Result<T, Error<Rule>>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

// include the grammar file so that Cargo knows to rebuild this file on
// grammar changes
const _GRAMMAR: &str = include_str!("dot.pest");

/// One parsed statement, reduced to what the automaton needs.
enum DotStmt {
    /// A layout directive with no bearing on the automaton.
    Skip,
    /// `node [shape = ...]`: changes the shape of subsequent node
    /// declarations. Doublecircle marks accepting states.
    NodeShape { doublecircle: bool },
    /// A node declaration.
    Node { id: Id },
    /// A (possibly labelled) edge.
    Edge {
        from: Id,
        to: Id,
        label: Option<String>,
    },
}

#[derive(Parser)]
#[grammar = "dot.pest"]
pub struct DfaParser;

impl DfaParser {
    /// Parse an automaton from DOT text.
    pub fn parse_str(content: &str) -> TelosResult<DfaDef> {
        let time = std::time::Instant::now();
        let inputs =
            DfaParser::parse_with_userdata(Rule::file, content, ())
                .map_err(|e| telos_utils::Error::dfa_parse(e.to_string()))?;
        let input = inputs
            .single()
            .map_err(|e| telos_utils::Error::dfa_parse(e.to_string()))?;
        let stmts = DfaParser::file(input)
            .map_err(|e| telos_utils::Error::dfa_parse(e.to_string()))?;
        let out = Self::assemble(stmts)?;
        log::info!(
            "Parsed automaton ({} states, {} edges) in {}ms",
            out.states.len(),
            out.edges.len(),
            time.elapsed().as_millis()
        );
        Ok(out)
    }

    /// Fold the statement list into a [DfaDef], tracking the current node
    /// shape for accepting-state detection.
    fn assemble(stmts: Vec<DotStmt>) -> TelosResult<DfaDef> {
        let init_id = Id::new("init");
        let mut states: Vec<Id> = Vec::new();
        let mut accepting: Vec<Id> = Vec::new();
        let mut init: Option<Id> = None;
        let mut edges: Vec<DfaEdgeDef> = Vec::new();
        let mut accepting_shape = false;

        let note_state = |states: &mut Vec<Id>, id: Id| {
            if id != init_id && !states.contains(&id) {
                states.push(id);
            }
        };

        for stmt in stmts {
            match stmt {
                DotStmt::Skip => {}
                DotStmt::NodeShape { doublecircle } => {
                    accepting_shape = doublecircle;
                }
                DotStmt::Node { id } => {
                    if id == init_id {
                        continue;
                    }
                    note_state(&mut states, id);
                    if accepting_shape && !accepting.contains(&id) {
                        accepting.push(id);
                    }
                }
                DotStmt::Edge { from, to, label } => {
                    if from == init_id {
                        if init.replace(to).is_some() {
                            return Err(telos_utils::Error::dfa_parse(
                                "more than one `init ->' edge",
                            ));
                        }
                        note_state(&mut states, to);
                        continue;
                    }
                    note_state(&mut states, from);
                    note_state(&mut states, to);
                    let label = label.unwrap_or_else(|| "true".to_string());
                    let guard = guard_parser::parse_guard(&label)?;
                    edges.push(DfaEdgeDef {
                        from,
                        to,
                        label,
                        guard,
                    });
                }
            }
        }

        let init = init.ok_or_else(|| {
            telos_utils::Error::dfa_parse("no `init ->' edge found")
        })?;
        Ok(DfaDef {
            states,
            init,
            accepting,
            edges,
        })
    }
}

#[pest_consume::parser]
impl DfaParser {
    fn EOI(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn ident(input: Node) -> ParseResult<Id> {
        Ok(Id::new(input.as_str()))
    }

    fn str_inner(input: Node) -> ParseResult<String> {
        Ok(input.as_str().to_string())
    }

    fn string(input: Node) -> ParseResult<String> {
        Ok(match_nodes!(input.into_children();
            [str_inner(s)] => s,
        ))
    }

    fn kw(input: Node) -> ParseResult<String> {
        Ok(input.as_str().to_string())
    }

    fn value(input: Node) -> ParseResult<String> {
        Ok(match_nodes!(input.into_children();
            [string(s)] => s,
            [ident(id)] => id.to_string(),
        ))
    }

    fn attr(input: Node) -> ParseResult<(Id, String)> {
        Ok(match_nodes!(input.into_children();
            [ident(key), value(v)] => (key, v),
        ))
    }

    fn attr_list(input: Node) -> ParseResult<Vec<(Id, String)>> {
        Ok(match_nodes!(input.into_children();
            [attr(attrs)..] => attrs.collect(),
        ))
    }

    fn kw_attr_stmt(input: Node) -> ParseResult<DotStmt> {
        Ok(match_nodes!(input.into_children();
            [kw(kw), attr_list(attrs)] => {
                if kw == "node" {
                    match attrs.iter().find(|(k, _)| *k == "shape") {
                        Some((_, shape)) => DotStmt::NodeShape {
                            doublecircle: shape == "doublecircle",
                        },
                        None => DotStmt::Skip,
                    }
                } else {
                    DotStmt::Skip
                }
            },
        ))
    }

    fn graph_attr_stmt(_input: Node) -> ParseResult<DotStmt> {
        Ok(DotStmt::Skip)
    }

    fn edge_stmt(input: Node) -> ParseResult<DotStmt> {
        Ok(match_nodes!(input.into_children();
            [ident(from), ident(to)] => DotStmt::Edge { from, to, label: None },
            [ident(from), ident(to), attr_list(attrs)] => {
                let label = attrs
                    .into_iter()
                    .find(|(k, _)| *k == "label")
                    .map(|(_, v)| v);
                DotStmt::Edge { from, to, label }
            },
        ))
    }

    fn node_stmt(input: Node) -> ParseResult<DotStmt> {
        Ok(match_nodes!(input.into_children();
            [ident(id)] => DotStmt::Node { id },
            [ident(id), attr_list(_)] => DotStmt::Node { id },
        ))
    }

    fn stmt(input: Node) -> ParseResult<DotStmt> {
        Ok(match_nodes!(input.into_children();
            [edge_stmt(s)] => s,
            [kw_attr_stmt(s)] => s,
            [graph_attr_stmt(s)] => s,
            [node_stmt(s)] => s,
        ))
    }

    fn file(input: Node) -> ParseResult<Vec<DotStmt>> {
        Ok(match_nodes!(input.into_children();
            [ident(_), stmt(stmts).., EOI(_)] => stmts.collect(),
            [stmt(stmts).., EOI(_)] => stmts.collect(),
        ))
    }
}
