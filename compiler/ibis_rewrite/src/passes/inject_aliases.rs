//! Module-alias injection.
//!
//! A module body peppered with fully-qualified calls like
//! `MyApp.Accounts.fetch(...)` reads better with an `alias MyApp.Accounts`
//! directive and short calls. For every qualified path referenced at least
//! `RewriteConfig::alias_threshold` times, the pass prepends a directive
//! and shortens the calls - unless the short name is already taken by an
//! existing directive, another candidate path, or a single-segment remote
//! reference, in which case that path is skipped (a collision would
//! silently retarget calls).
//!
//! Nested modules are handled independently: the bottom-up traversal
//! rewrites inner modules first, and counting never crosses a module
//! boundary.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use ibis_ir::{Expr, ExprKind, MetaKey, MetaValue, ModPath, Name};

use crate::pipeline::PassContext;
use crate::transform::{for_each, transform, transform_children};

/// Run the pass over one compilation unit.
pub fn run(expr: Expr, cx: &PassContext<'_>) -> Expr {
    transform(expr, &|e| apply(e, cx))
}

fn apply(expr: Expr, cx: &PassContext<'_>) -> Expr {
    let Expr { kind, meta, span } = expr;
    let ExprKind::Module { name, body } = kind else {
        return Expr { kind, meta, span };
    };

    let chosen = choose_aliases(&body, cx);
    if !chosen.is_empty() {
        trace!(count = chosen.len(), "injecting module aliases");
    }
    if chosen.is_empty() {
        return Expr {
            kind: ExprKind::Module { name, body },
            meta,
            span,
        };
    }

    // Shorten the calls for each chosen path.
    let map: FxHashMap<&[Name], Name> = chosen
        .iter()
        .filter_map(|path| path.last().map(|last| (path.segments(), last)))
        .collect();
    let body: Vec<Expr> = body.into_iter().map(|item| shorten(item, &map)).collect();

    // Prepend the directives after any existing leading directives, in a
    // deterministic (textual) order.
    let insert_at = body
        .iter()
        .take_while(|item| matches!(item.kind, ExprKind::AliasDirective { .. }))
        .count();
    let mut new_body = Vec::with_capacity(body.len() + chosen.len());
    new_body.extend(body.iter().take(insert_at).cloned());
    for path in &chosen {
        new_body.push(
            Expr::synthesized(ExprKind::AliasDirective {
                path: path.clone(),
                as_name: None,
            })
            .with_meta(MetaKey::Synthetic, MetaValue::Flag(true)),
        );
    }
    new_body.extend(body.into_iter().skip(insert_at));

    Expr {
        kind: ExprKind::Module {
            name,
            body: new_body,
        },
        meta,
        span,
    }
}

/// Count qualified remote references and pick the paths to alias.
fn choose_aliases(body: &[Expr], cx: &PassContext<'_>) -> Vec<ModPath> {
    // Short names already spoken for by existing directives.
    let mut taken: FxHashSet<Name> = FxHashSet::default();
    let mut already_aliased: FxHashSet<Vec<Name>> = FxHashSet::default();
    for item in body {
        if let ExprKind::AliasDirective { path, as_name } = &item.kind {
            if let Some(short) = (*as_name).or_else(|| path.last()) {
                taken.insert(short);
            }
            already_aliased.insert(path.segments().to_vec());
        }
    }

    // Reference counts per qualified path, plus single-segment remotes
    // (their names are collision sources). Counting stays inside this
    // module: nested modules were already rewritten by the bottom-up
    // traversal and manage their own directives.
    let mut counts: FxHashMap<Vec<Name>, usize> = FxHashMap::default();
    let mut single_segment: FxHashSet<Name> = FxHashSet::default();
    for item in body {
        if matches!(item.kind, ExprKind::Module { .. }) {
            continue;
        }
        for_each(item, &mut |e| {
            if let ExprKind::Remote { module, .. } = &e.kind {
                if module.len() >= 2 {
                    *counts.entry(module.segments().to_vec()).or_insert(0) += 1;
                } else if let Some(only) = module.last() {
                    single_segment.insert(only);
                }
            }
        });
    }

    let threshold = cx.config.alias_threshold.max(1);
    let mut candidates: Vec<Vec<Name>> = counts
        .into_iter()
        .filter(|(path, count)| *count >= threshold && !already_aliased.contains(path))
        .map(|(path, _count)| path)
        .collect();

    // Short-name collisions: an existing directive, a single-segment
    // remote, or another candidate sharing the final segment. Collisions
    // among candidates disqualify all parties - choosing one would
    // silently retarget the others' calls.
    let mut last_counts: FxHashMap<Name, usize> = FxHashMap::default();
    for path in &candidates {
        if let Some(last) = path.last().copied() {
            *last_counts.entry(last).or_insert(0) += 1;
        }
    }
    candidates.retain(|path| {
        path.last().is_some_and(|last| {
            !taken.contains(last)
                && !single_segment.contains(last)
                && last_counts.get(last).copied() == Some(1)
        })
    });

    candidates.sort_by_key(|path| {
        path.iter()
            .map(|seg| cx.interner.lookup_static(*seg))
            .collect::<Vec<_>>()
    });
    candidates.into_iter().map(ModPath).collect()
}

/// Rewrite qualified remotes to their short forms, staying out of nested
/// modules (they own their directives).
fn shorten(expr: Expr, map: &FxHashMap<&[Name], Name>) -> Expr {
    if matches!(expr.kind, ExprKind::Module { .. }) {
        return expr;
    }
    let expr = transform_children(expr, &|child| shorten(child, map));
    let Expr { kind, meta, span } = expr;
    let kind = match kind {
        ExprKind::Remote { module, fun, args } => match map.get(module.segments()) {
            Some(short) => ExprKind::Remote {
                module: ModPath::single(*short),
                fun,
                args,
            },
            None => ExprKind::Remote { module, fun, args },
        },
        other => other,
    };
    Expr { kind, meta, span }
}
