//! Clause binder renaming.
//!
//! Generated case clauses frequently bind a tagged-tuple payload under a
//! synthetic name while the body references the name the front end
//! actually emitted, leaving an undefined variable in the output. When the
//! divergence is unambiguous - the binder is unused and the body
//! references exactly one name that is declared nowhere in scope - the
//! binder is renamed to that name.
//!
//! Two or more undeclared names means the rename target is not unique:
//! skip. Zero candidates normally means skip too, with one documented
//! special case: an unused binder in a result-tagged clause is renamed to
//! the tag's preferred name from the closed table in [`super::tags`]
//! (`ok -> result`, `error -> reason`), so the later underscore pass emits
//! `_reason` instead of leaking a synthetic binder name into output. The
//! special case introduces no reference and requires the preferred name to
//! be neither declared nor used in scope, so it can neither capture nor
//! shadow.
//!
//! The scope accumulator threads exactly the lexically visible declares
//! down to each clause - parameters, earlier statements of enclosing
//! blocks, enclosing clause binders - so the shadow check sees precisely
//! the names a rename could capture. Keeping the accumulator lexical (and
//! nothing more) is also what makes the pass idempotent: a rename in a
//! sibling branch never changes this clause's candidate set.

use rustc_hash::FxHashSet;
use tracing::trace;

use ibis_ir::{Clause, Expr, ExprKind, Name, Pattern};

use crate::passes::tags;
use crate::pipeline::PassContext;
use crate::scope::{is_underscored, stmt_declares, used_in_clause};
use crate::transform::transform_children;

/// Run the pass over one compilation unit.
pub fn run(expr: Expr, cx: &PassContext<'_>) -> Expr {
    let env = FxHashSet::default();
    rename_in(expr, &env, cx)
}

fn rename_in(expr: Expr, env: &FxHashSet<Name>, cx: &PassContext<'_>) -> Expr {
    match expr.kind {
        ExprKind::FunctionDef {
            name,
            clauses,
            visibility,
        } => {
            let clauses = clauses
                .into_iter()
                .map(|clause| rename_clause_body(clause, env, cx))
                .collect();
            Expr {
                kind: ExprKind::FunctionDef {
                    name,
                    clauses,
                    visibility,
                },
                meta: expr.meta,
                span: expr.span,
            }
        }
        ExprKind::Case { scrutinee, clauses } => {
            let scrutinee = Box::new(rename_in(*scrutinee, env, cx));
            let clauses = clauses
                .into_iter()
                .map(|clause| {
                    let clause = rename_clause_body(clause, env, cx);
                    try_rename(clause, env, cx)
                })
                .collect();
            Expr {
                kind: ExprKind::Case { scrutinee, clauses },
                meta: expr.meta,
                span: expr.span,
            }
        }
        ExprKind::Receive { clauses } => {
            let clauses = clauses
                .into_iter()
                .map(|clause| {
                    let clause = rename_clause_body(clause, env, cx);
                    try_rename(clause, env, cx)
                })
                .collect();
            Expr {
                kind: ExprKind::Receive { clauses },
                meta: expr.meta,
                span: expr.span,
            }
        }
        ExprKind::Fn { clauses } => {
            let clauses = clauses
                .into_iter()
                .map(|clause| rename_clause_body(clause, env, cx))
                .collect();
            Expr {
                kind: ExprKind::Fn { clauses },
                meta: expr.meta,
                span: expr.span,
            }
        }
        ExprKind::Try {
            body,
            rescue_clauses,
            catch_clauses,
            after,
        } => {
            let body = Box::new(rename_in(*body, env, cx));
            let rescue_clauses = rescue_clauses
                .into_iter()
                .map(|clause| rename_clause_body(clause, env, cx))
                .collect();
            let catch_clauses = catch_clauses
                .into_iter()
                .map(|clause| rename_clause_body(clause, env, cx))
                .collect();
            let after = after.map(|a| Box::new(rename_in(*a, env, cx)));
            Expr {
                kind: ExprKind::Try {
                    body,
                    rescue_clauses,
                    catch_clauses,
                    after,
                },
                meta: expr.meta,
                span: expr.span,
            }
        }
        ExprKind::Block(stmts) => {
            // Thread declares statement by statement.
            let mut current = env.clone();
            let stmts = stmts
                .into_iter()
                .map(|stmt| {
                    let stmt = rename_in(stmt, &current, cx);
                    current.extend(stmt_declares(&stmt));
                    stmt
                })
                .collect();
            Expr {
                kind: ExprKind::Block(stmts),
                meta: expr.meta,
                span: expr.span,
            }
        }
        ExprKind::Comprehension {
            generators,
            filters,
            body,
        } => {
            let mut current = env.clone();
            let generators = generators
                .into_iter()
                .map(|(pattern, source)| {
                    let source = rename_in(source, &current, cx);
                    current.extend(pattern.binders());
                    (pattern, source)
                })
                .collect();
            let filters = filters
                .into_iter()
                .map(|filter| rename_in(filter, &current, cx))
                .collect();
            let body = Box::new(rename_in(*body, &current, cx));
            Expr {
                kind: ExprKind::Comprehension {
                    generators,
                    filters,
                    body,
                },
                meta: expr.meta,
                span: expr.span,
            }
        }
        // Everything else: engine recursion into immediate children with
        // the current accumulator.
        _ => transform_children(expr, &|child| rename_in(child, env, cx)),
    }
}

/// Recurse into a clause's guard and body with the clause's binders added
/// to the accumulator.
fn rename_clause_body(clause: Clause, env: &FxHashSet<Name>, cx: &PassContext<'_>) -> Clause {
    let mut clause_env = env.clone();
    for pattern in &clause.patterns {
        clause_env.extend(pattern.binders());
    }
    Clause {
        patterns: clause.patterns,
        guard: clause.guard.map(|g| rename_in(g, &clause_env, cx)),
        body: rename_in(clause.body, &clause_env, cx),
    }
}

/// The rename decision for one clause. `env` holds the enclosing declares,
/// without this clause's own binders.
fn try_rename(clause: Clause, env: &FxHashSet<Name>, cx: &PassContext<'_>) -> Clause {
    // Shape guard: single pattern, two-element tuple, literal atom tag,
    // plain var binder, no guard. Anything else is not this pass's shape.
    if clause.guard.is_some() {
        return clause;
    }
    let [pattern] = clause.patterns.as_slice() else {
        return clause;
    };
    let Pattern::Tuple(elems) = pattern else {
        return clause;
    };
    let [Pattern::Atom(tag), Pattern::Var(binder)] = elems.as_slice() else {
        return clause;
    };
    let (tag, binder) = (*tag, *binder);

    if is_underscored(binder, cx.interner) {
        // Already deliberately dead; resurrecting it is someone's bug to
        // report, not ours to guess at.
        return clause;
    }

    let usage = used_in_clause(&clause, cx.interner);
    if usage.is_opaque() || usage.uses(binder) {
        return clause;
    }

    let candidates: Vec<Name> = usage
        .names()
        .iter()
        .copied()
        .filter(|name| {
            *name != binder && !env.contains(name) && !is_underscored(*name, cx.interner)
        })
        .collect();

    let replacement = match candidates.as_slice() {
        [single] => Some(*single),
        [] => preferred_replacement(tag, binder, env, &usage, cx),
        // Not unique: skip.
        _ => None,
    };

    match replacement {
        Some(new_binder) => {
            trace!(?binder, ?new_binder, "renamed clause binder");
            Clause {
                patterns: vec![Pattern::Tuple(vec![
                    Pattern::Atom(tag),
                    Pattern::Var(new_binder),
                ])],
                guard: clause.guard,
                body: clause.body,
            }
        }
        None => clause,
    }
}

/// The documented zero-candidate special case: rename an unused binder in
/// a result-tagged clause to the tag's preferred name, provided that name
/// is neither declared nor used in scope.
fn preferred_replacement(
    tag: Name,
    binder: Name,
    env: &FxHashSet<Name>,
    usage: &crate::scope::Usage,
    cx: &PassContext<'_>,
) -> Option<Name> {
    let preferred = tags::preferred_binder(tag, cx.interner)?;
    let preferred = cx.interner.intern(preferred);
    if preferred == binder || env.contains(&preferred) || usage.uses(preferred) {
        return None;
    }
    Some(preferred)
}

#[cfg(test)]
mod tests;
