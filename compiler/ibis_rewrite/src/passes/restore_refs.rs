//! Stale underscored-reference repair.
//!
//! An earlier, inconsistent rewrite (or a front end template) can leave a
//! body referencing `_name` while the only binding in sight is the plain
//! parameter `name`. The reference would be undefined in the output. When
//! `_name` is declared nowhere in the clause and `name` is one of its
//! parameters, the reference is normalized back to `name`.
//!
//! Both conditions are checked against the analyzer's declared sets; if
//! `_name` is a real binder anywhere in the clause, the reference is
//! assumed to target it and left alone.

use rustc_hash::FxHashSet;

use ibis_ir::{Clause, Expr, ExprKind, Name};

use crate::pipeline::PassContext;
use crate::scope::{all_binders, is_underscored, strip_underscore};
use crate::transform::transform;

/// Run the pass over one compilation unit.
pub fn run(expr: Expr, cx: &PassContext<'_>) -> Expr {
    transform(expr, &|e| apply(e, cx))
}

fn apply(expr: Expr, cx: &PassContext<'_>) -> Expr {
    let Expr { kind, meta, span } = expr;
    let kind = match kind {
        ExprKind::FunctionDef {
            name,
            clauses,
            visibility,
        } => ExprKind::FunctionDef {
            name,
            clauses: clauses
                .into_iter()
                .map(|clause| restore_clause(clause, cx))
                .collect(),
            visibility,
        },
        other => other,
    };
    Expr { kind, meta, span }
}

fn restore_clause(clause: Clause, cx: &PassContext<'_>) -> Clause {
    let mut params = FxHashSet::default();
    for pattern in &clause.patterns {
        pattern.collect_binders(&mut params);
    }
    if params.is_empty() {
        return clause;
    }

    // Binders declared inside the guard or body, at any depth. Used two
    // ways: a `_name` that is itself declared is a real binding and left
    // alone, and a `name` redeclared inside the body makes the repair
    // target ambiguous (parameter or inner binding?), so that is skipped
    // too.
    let mut inner = FxHashSet::default();
    if let Some(guard) = &clause.guard {
        inner.extend(all_binders(guard));
    }
    inner.extend(all_binders(&clause.body));

    let fix = |e: Expr| fix_ref(e, &params, &inner, cx);
    Clause {
        patterns: clause.patterns,
        guard: clause.guard.map(|g| transform(g, &fix)),
        body: transform(clause.body, &fix),
    }
}

fn fix_ref(
    expr: Expr,
    params: &FxHashSet<Name>,
    inner: &FxHashSet<Name>,
    cx: &PassContext<'_>,
) -> Expr {
    let ExprKind::Var(name) = expr.kind else {
        return expr;
    };
    if !is_underscored(name, cx.interner) || params.contains(&name) || inner.contains(&name) {
        return expr;
    }
    match strip_underscore(name, cx.interner) {
        Some(stripped) if params.contains(&stripped) && !inner.contains(&stripped) => Expr {
            kind: ExprKind::Var(stripped),
            meta: expr.meta,
            span: expr.span,
        },
        _ => expr,
    }
}
