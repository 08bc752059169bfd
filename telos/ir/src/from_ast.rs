//! Lowering from the frontend AST into the IR.
use crate::schema::{
    ActionSchema, Domain, EffectBranch, Param, PredicateDecl, SchemaAtom,
    SchemaTerm,
};
use linked_hash_map::LinkedHashMap;
use telos_frontend::ast::{ActionDef, DomainDef, LiteralDef, TermDef};
use telos_utils::{Error, Id, TelosResult};

impl Domain {
    /// Lower a parsed domain, checking declarations as we go: duplicate
    /// names, undefined predicates and types, arity mismatches, and
    /// parameters used but never declared all surface here.
    pub fn from_ast(def: DomainDef) -> TelosResult<Domain> {
        let mut predicates: LinkedHashMap<Id, PredicateDecl> =
            LinkedHashMap::new();
        for sig in def.predicates {
            let decl = PredicateDecl {
                name: sig.name,
                param_types: sig.params.iter().map(|p| p.ty).collect(),
            };
            if predicates.insert(sig.name, decl).is_some() {
                return Err(Error::already_bound(sig.name, "predicate"));
            }
        }

        let mut actions: Vec<ActionSchema> = Vec::new();
        for action in def.actions {
            if actions.iter().any(|a| a.name == action.name) {
                return Err(Error::already_bound(action.name, "action"));
            }
            actions.push(lower_action(action, &def.types, &predicates)?);
        }
        // Fixed enumeration order for the planner.
        actions.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));

        log::info!(
            "Lowered domain `{}': {} predicates, {} actions",
            def.name,
            predicates.len(),
            actions.len()
        );
        Ok(Domain {
            name: def.name,
            types: def.types,
            predicates,
            actions,
        })
    }
}

fn lower_action(
    action: ActionDef,
    types: &[Id],
    predicates: &LinkedHashMap<Id, PredicateDecl>,
) -> TelosResult<ActionSchema> {
    let mut params: Vec<Param> = Vec::new();
    for p in &action.params {
        if params.iter().any(|q| q.name == p.name) {
            return Err(Error::already_bound(p.name, "action parameter")
                .with_post_msg(Some(format!("in action `{}'", action.name))));
        }
        if !types.is_empty() && p.ty != "object" && !types.contains(&p.ty) {
            return Err(Error::undefined(p.ty, "type").with_post_msg(Some(
                format!("in parameters of action `{}'", action.name),
            )));
        }
        params.push(Param {
            name: p.name,
            ty: p.ty,
        });
    }

    let resolve = |lit: &LiteralDef| -> TelosResult<SchemaAtom> {
        let decl = predicates.get(&lit.name).ok_or_else(|| {
            Error::undefined(lit.name, "predicate").with_post_msg(Some(
                format!("in action `{}'", action.name),
            ))
        })?;
        if decl.arity() != lit.args.len() {
            return Err(Error::domain_parse(format!(
                "predicate `{}' has arity {} but is applied to {} terms \
                 in action `{}'",
                lit.name,
                decl.arity(),
                lit.args.len(),
                action.name
            )));
        }
        let args = lit
            .args
            .iter()
            .map(|t| resolve_term(t, &params, action.name))
            .collect::<TelosResult<_>>()?;
        Ok(SchemaAtom {
            pred: lit.name,
            args,
            negated: lit.negated,
        })
    };

    let precond = action
        .precondition
        .iter()
        .map(resolve)
        .collect::<TelosResult<Vec<_>>>()?;

    let resolve_pair = |(a, b): &(TermDef, TermDef)| -> TelosResult<(SchemaTerm, SchemaTerm)> {
        Ok((
            resolve_term(a, &params, action.name)?,
            resolve_term(b, &params, action.name)?,
        ))
    };
    let neq = action
        .inequalities
        .iter()
        .map(resolve_pair)
        .collect::<TelosResult<Vec<_>>>()?;
    let eq = action
        .equalities
        .iter()
        .map(resolve_pair)
        .collect::<TelosResult<Vec<_>>>()?;

    let mut branches = Vec::new();
    for eff in &action.effects {
        branches.push(EffectBranch {
            adds: eff
                .adds
                .iter()
                .map(resolve)
                .collect::<TelosResult<Vec<_>>>()?,
            dels: eff
                .dels
                .iter()
                .map(resolve)
                .collect::<TelosResult<Vec<_>>>()?,
        });
    }
    if branches.is_empty() {
        return Err(Error::domain_parse(format!(
            "action `{}' has no effect",
            action.name
        )));
    }

    Ok(ActionSchema {
        name: action.name,
        params,
        precond,
        neq,
        eq,
        branches,
    })
}

fn resolve_term(
    term: &TermDef,
    params: &[Param],
    action: Id,
) -> TelosResult<SchemaTerm> {
    match term {
        TermDef::Constant(c) => Ok(SchemaTerm::Const(*c)),
        TermDef::Variable(v) => params
            .iter()
            .position(|p| p.name == *v)
            .map(SchemaTerm::Param)
            .ok_or_else(|| {
                Error::undefined(*v, "parameter").with_post_msg(Some(
                    format!("in action `{action}'"),
                ))
            }),
    }
}
