//! Parser for edge-label boolean expressions.
use crate::ast::GuardExpr;
use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use telos_utils::{Error, Id, TelosResult};

// include the grammar file so that Cargo knows to rebuild this file on
// grammar changes
const _GRAMMAR: &str = include_str!("guard.pest");

// Define the precedence of binary operations. We use `lazy_static` so that
// this is only ever constructed once.
lazy_static::lazy_static! {
    static ref PRATT: PrattParser<Rule> =
    PrattParser::new()
        .op(Op::infix(Rule::guard_iff, Assoc::Left))
        .op(Op::infix(Rule::guard_implies, Assoc::Right))
        .op(Op::infix(Rule::guard_or, Assoc::Left))
        .op(Op::infix(Rule::guard_and, Assoc::Left));
}

#[derive(pest_derive::Parser)]
#[grammar = "guard.pest"]
struct GuardParser;

/// Parse a label expression such as `on_a_b & ~clear_c` into a [GuardExpr].
pub fn parse_guard(label: &str) -> TelosResult<GuardExpr> {
    let mut pairs = GuardParser::parse(Rule::label, label)
        .map_err(|e| Error::dfa_parse(format!("bad label `{label}': {e}")))?;
    let label_pair = pairs.next().unwrap();
    let expr = label_pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .unwrap();
    expr_helper(expr.into_inner())
}

fn expr_helper(pairs: Pairs<Rule>) -> TelosResult<GuardExpr> {
    PRATT
        .map_primary(|primary| match primary.as_rule() {
            Rule::term => term_helper(primary),
            x => unreachable!("Unexpected rule {:?} for expr", x),
        })
        .map_infix(|lhs, op, rhs| {
            let (lhs, rhs) = (Box::new(lhs?), Box::new(rhs?));
            Ok(match op.as_rule() {
                Rule::guard_iff => GuardExpr::Iff(lhs, rhs),
                Rule::guard_implies => GuardExpr::Implies(lhs, rhs),
                Rule::guard_or => GuardExpr::Or(lhs, rhs),
                Rule::guard_and => GuardExpr::And(lhs, rhs),
                _ => unreachable!(),
            })
        })
        .parse(pairs)
}

fn term_helper(pair: Pair<Rule>) -> TelosResult<GuardExpr> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::not_term => {
            let sub = inner.into_inner().next().unwrap();
            Ok(GuardExpr::Not(Box::new(term_helper(sub)?)))
        }
        Rule::paren => {
            let expr = inner.into_inner().next().unwrap();
            expr_helper(expr.into_inner())
        }
        Rule::const_lit => Ok(match inner.as_str() {
            "true" => GuardExpr::True,
            _ => GuardExpr::False,
        }),
        Rule::symbol => Ok(GuardExpr::Atom(Id::new(inner.as_str()))),
        x => unreachable!("Unexpected rule {:?} for term", x),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_guard;
    use crate::ast::GuardExpr;

    #[test]
    fn parse_single_symbol() {
        assert_eq!(
            parse_guard("on_a_b").unwrap(),
            GuardExpr::Atom("on_a_b".into())
        );
    }

    #[test]
    fn parse_precedence() {
        // `a | b & c` parses as `a | (b & c)`.
        let g = parse_guard("a | b & c").unwrap();
        match g {
            GuardExpr::Or(lhs, rhs) => {
                assert_eq!(*lhs, GuardExpr::Atom("a".into()));
                assert!(matches!(*rhs, GuardExpr::And(..)));
            }
            other => panic!("expected Or at the top, got {other:?}"),
        }
    }

    #[test]
    fn parse_negation_and_parens() {
        let g = parse_guard("~(on_a_b & clear_c)").unwrap();
        assert!(matches!(g, GuardExpr::Not(..)));
        let g = parse_guard("!on_a_b & clear_c").unwrap();
        assert!(matches!(g, GuardExpr::And(..)));
    }

    #[test]
    fn parse_doubled_spellings() {
        assert_eq!(
            parse_guard("a && b").unwrap(),
            parse_guard("a & b").unwrap()
        );
        assert_eq!(
            parse_guard("a || b").unwrap(),
            parse_guard("a | b").unwrap()
        );
        assert_eq!(
            parse_guard("a => b").unwrap(),
            parse_guard("a -> b").unwrap()
        );
        assert_eq!(
            parse_guard("a <=> b").unwrap(),
            parse_guard("a <-> b").unwrap()
        );
    }

    #[test]
    fn parse_true_false() {
        assert_eq!(parse_guard("true").unwrap(), GuardExpr::True);
        assert_eq!(parse_guard("false").unwrap(), GuardExpr::False);
        // `true_x` is a symbol, not the constant.
        assert_eq!(
            parse_guard("true_x").unwrap(),
            GuardExpr::Atom("true_x".into())
        );
    }

    #[test]
    fn reject_trailing_tokens() {
        assert!(parse_guard("a b").is_err());
        assert!(parse_guard("&").is_err());
    }
}
