//! Tagged-tuple result normalization.
//!
//! Two shapes, both keyed off the closed result-tag table in
//! [`super::tags`]:
//!
//! 1. **Known-case folding.** A case over a literal result tuple with a
//!    single unguarded clause matching the same tag,
//!
//!    ```text
//!    case {:ok, expr} do
//!      {:ok, x} -> body
//!    end
//!    ```
//!
//!    folds to `x = expr; body`. Only var and wildcard payload patterns
//!    qualify - a structured payload pattern could fail differently as a
//!    bind than as a case, so it is skipped.
//!
//! 2. **Tail wrapping.** A function definition flagged `ResultShape` must
//!    return tagged results from every branch. Tail positions holding a
//!    self-evaluating value shape (literal, variable, composite literal)
//!    are wrapped as `{:ok, value}`. Tails that are already result-shaped
//!    - a result-tagged two-tuple or a bare result atom - are left alone,
//!    and so is anything whose result shape cannot be seen locally
//!    (calls, closures, raw splices): wrapping those on a guess is how
//!    working code breaks.

use ibis_ir::{Clause, Expr, ExprKind, MetaKey, MetaValue, Pattern};

use crate::passes::tags;
use crate::pipeline::PassContext;
use crate::transform::transform;

/// Run the pass over one compilation unit.
pub fn run(expr: Expr, cx: &PassContext<'_>) -> Expr {
    transform(expr, &|e| apply(e, cx))
}

fn apply(expr: Expr, cx: &PassContext<'_>) -> Expr {
    match &expr.kind {
        ExprKind::Case { .. } => fold_known_case(expr, cx),
        ExprKind::FunctionDef { .. } if expr.meta.flag(MetaKey::ResultShape) => {
            wrap_function(expr, cx)
        }
        _ => expr,
    }
}

/// Shape 1: fold `case {tag, e} do {tag, p} -> body end`.
fn fold_known_case(expr: Expr, cx: &PassContext<'_>) -> Expr {
    if !matches_known_case(&expr, cx) {
        return expr;
    }

    // Shapes verified above; extract by clone, then rebuild.
    let folded = {
        let ExprKind::Case { scrutinee, clauses } = &expr.kind else {
            return expr;
        };
        let ExprKind::Tuple(elems) = &scrutinee.kind else {
            return expr;
        };
        let (Some(clause), Some(value)) = (clauses.first(), elems.get(1)) else {
            return expr;
        };
        let Some(Pattern::Tuple(pelems)) = clause.patterns.first() else {
            return expr;
        };
        let Some(payload) = pelems.get(1) else {
            return expr;
        };

        let bind = Expr::new(
            ExprKind::Bind {
                pattern: payload.clone(),
                value: Box::new(value.clone()),
            },
            expr.span,
        );
        ExprKind::Block(vec![bind, clause.body.clone()])
    };

    Expr {
        kind: folded,
        meta: expr.meta,
        span: expr.span,
    }
}

/// The full trigger condition for shape 1, checked before any
/// destructuring so arity mismatches degrade to skips.
fn matches_known_case(expr: &Expr, cx: &PassContext<'_>) -> bool {
    let ExprKind::Case { scrutinee, clauses } = &expr.kind else {
        return false;
    };
    let Some(scrutinee_tag) = scrutinee.result_tag() else {
        return false;
    };
    if !tags::is_result_tag(scrutinee_tag, cx.interner) {
        return false;
    }
    let [clause] = clauses.as_slice() else {
        return false;
    };
    if clause.guard.is_some() {
        return false;
    }
    let [Pattern::Tuple(pelems)] = clause.patterns.as_slice() else {
        return false;
    };
    let [Pattern::Atom(pattern_tag), payload] = pelems.as_slice() else {
        return false;
    };
    *pattern_tag == scrutinee_tag && matches!(payload, Pattern::Var(_) | Pattern::Wildcard)
}

/// Shape 2: wrap value-shaped tails of a `ResultShape` function.
fn wrap_function(expr: Expr, cx: &PassContext<'_>) -> Expr {
    let Expr { kind, meta, span } = expr;
    let ExprKind::FunctionDef {
        name,
        clauses,
        visibility,
    } = kind
    else {
        return Expr { kind, meta, span };
    };
    let clauses = clauses
        .into_iter()
        .map(|clause| Clause {
            patterns: clause.patterns,
            guard: clause.guard,
            body: wrap_tails(clause.body, cx),
        })
        .collect();
    Expr {
        kind: ExprKind::FunctionDef {
            name,
            clauses,
            visibility,
        },
        meta,
        span,
    }
}

/// Rewrite the tail positions of a body, recursing through branching
/// shapes so every terminal branch is considered.
fn wrap_tails(expr: Expr, cx: &PassContext<'_>) -> Expr {
    let Expr { kind, meta, span } = expr;
    let kind = match kind {
        ExprKind::Block(mut stmts) => {
            if let Some(last) = stmts.pop() {
                stmts.push(wrap_tails(last, cx));
            }
            ExprKind::Block(stmts)
        }
        ExprKind::If {
            cond,
            then_body,
            else_body: Some(else_body),
        } => ExprKind::If {
            cond,
            then_body: Box::new(wrap_tails(*then_body, cx)),
            else_body: Some(Box::new(wrap_tails(*else_body, cx))),
        },
        // An else-less `if` yields nil on the false branch; wrapping one
        // arm would leave the other bare. Skip.
        ExprKind::If {
            cond,
            then_body,
            else_body: None,
        } => ExprKind::If {
            cond,
            then_body,
            else_body: None,
        },
        ExprKind::Case { scrutinee, clauses } => ExprKind::Case {
            scrutinee,
            clauses: wrap_clause_bodies(clauses, cx),
        },
        ExprKind::Receive { clauses } => ExprKind::Receive {
            clauses: wrap_clause_bodies(clauses, cx),
        },
        ExprKind::Try {
            body,
            rescue_clauses,
            catch_clauses,
            after,
        } => ExprKind::Try {
            body: Box::new(wrap_tails(*body, cx)),
            rescue_clauses: wrap_clause_bodies(rescue_clauses, cx),
            catch_clauses: wrap_clause_bodies(catch_clauses, cx),
            after,
        },
        other => {
            return wrap_value(
                Expr {
                    kind: other,
                    meta,
                    span,
                },
                cx,
            )
        }
    };
    Expr { kind, meta, span }
}

fn wrap_clause_bodies(clauses: Vec<Clause>, cx: &PassContext<'_>) -> Vec<Clause> {
    clauses
        .into_iter()
        .map(|clause| Clause {
            patterns: clause.patterns,
            guard: clause.guard,
            body: wrap_tails(clause.body, cx),
        })
        .collect()
}

/// Wrap one terminal value as `{:ok, value}` if its shape is
/// self-evaluating and not already result-shaped.
fn wrap_value(expr: Expr, cx: &PassContext<'_>) -> Expr {
    // Already a result-tagged two-tuple?
    if let Some(tag) = expr.result_tag() {
        if tags::is_result_tag(tag, cx.interner) {
            return expr;
        }
    }
    let wrappable = match &expr.kind {
        // A bare result atom is a result already.
        ExprKind::Atom(tag) => !tags::is_result_tag(*tag, cx.interner),
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Nil
        | ExprKind::Var(_)
        | ExprKind::Tuple(_)
        | ExprKind::List(_)
        | ExprKind::MapLit(_)
        | ExprKind::KeywordList(_) => true,
        // Calls, closures, raw splices, bindings: result shape unknown.
        _ => false,
    };
    if !wrappable {
        return expr;
    }

    let span = expr.span;
    let ok = cx.interner.intern(tags::SUCCESS_TAG);
    Expr::new(ExprKind::Tuple(vec![Expr::atom(ok), expr]), span)
        .with_meta(MetaKey::Synthetic, MetaValue::Flag(true))
}
