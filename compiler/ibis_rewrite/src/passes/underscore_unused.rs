//! Dead-binding underscoring.
//!
//! A binder that is declared but never referenced produces an
//! unused-variable warning in the generated output. This pass prefixes
//! such binders with an underscore - the target language's "intentionally
//! unused" convention - without dropping the binding itself, so value
//! expressions keep evaluating.
//!
//! Liveness comes from the scope analyzer and nowhere else; the underscore
//! naming convention is only consulted to avoid double-prefixing. Opaque
//! scopes (raw splices) are skipped wholesale, as is any binding carrying
//! `KeepBinding` metadata, and any rename that would collide with an
//! existing `_name` binder or reference.

use rustc_hash::FxHashSet;

use ibis_ir::{Clause, Expr, ExprKind, MetaKey, Name, Pattern, StringInterner};

use crate::pipeline::PassContext;
use crate::scope::{is_underscored, underscore, used_in_clause, used_in_scope, used_in_seq, Usage};
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
            clauses: underscore_clauses(clauses, cx.interner),
            visibility,
        },
        ExprKind::Case { scrutinee, clauses } => ExprKind::Case {
            scrutinee,
            clauses: underscore_clauses(clauses, cx.interner),
        },
        ExprKind::Receive { clauses } => ExprKind::Receive {
            clauses: underscore_clauses(clauses, cx.interner),
        },
        ExprKind::Fn { clauses } => ExprKind::Fn {
            clauses: underscore_clauses(clauses, cx.interner),
        },
        ExprKind::Try {
            body,
            rescue_clauses,
            catch_clauses,
            after,
        } => ExprKind::Try {
            body,
            rescue_clauses: underscore_clauses(rescue_clauses, cx.interner),
            catch_clauses: underscore_clauses(catch_clauses, cx.interner),
            after,
        },
        ExprKind::Block(stmts) => ExprKind::Block(underscore_block(stmts, cx.interner)),
        ExprKind::Comprehension {
            generators,
            filters,
            body,
        } => underscore_comprehension(generators, filters, body, cx.interner),
        other => other,
    };
    Expr { kind, meta, span }
}

/// Underscore the unused binders of each clause's patterns.
fn underscore_clauses(clauses: Vec<Clause>, interner: &StringInterner) -> Vec<Clause> {
    clauses
        .into_iter()
        .map(|clause| {
            let usage = used_in_clause(&clause, interner);
            if usage.is_opaque() {
                return clause;
            }
            let mut binders = FxHashSet::default();
            for pattern in &clause.patterns {
                pattern.collect_binders(&mut binders);
            }
            let mut patterns = clause.patterns;
            for binder in &binders {
                if let Some(renamed) = dead_binder_rename(*binder, &binders, &usage, interner) {
                    patterns = patterns
                        .into_iter()
                        .map(|p| p.rename_binder(*binder, renamed))
                        .collect();
                }
            }
            Clause {
                patterns,
                guard: clause.guard,
                body: clause.body,
            }
        })
        .collect()
}

/// Underscore binders of block-level bindings that the rest of the block
/// never references.
fn underscore_block(stmts: Vec<Expr>, interner: &StringInterner) -> Vec<Expr> {
    let original = stmts;
    let mut out = Vec::with_capacity(original.len());
    for (i, stmt) in original.iter().enumerate() {
        let Expr { kind, meta, span } = stmt;
        let ExprKind::Bind { pattern, value } = kind else {
            out.push(stmt.clone());
            continue;
        };
        if meta.flag(MetaKey::KeepBinding) {
            out.push(stmt.clone());
            continue;
        }
        // A block binder's scope is the remainder of the block.
        let usage = used_in_seq(&original[i + 1..], interner);
        if usage.is_opaque() {
            out.push(stmt.clone());
            continue;
        }
        let binders = pattern.binders();
        let mut new_pattern = pattern.clone();
        let mut changed = false;
        for binder in &binders {
            if let Some(renamed) = dead_binder_rename(*binder, &binders, &usage, interner) {
                new_pattern = new_pattern.rename_binder(*binder, renamed);
                changed = true;
            }
        }
        if changed {
            out.push(Expr {
                kind: ExprKind::Bind {
                    pattern: new_pattern,
                    value: value.clone(),
                },
                meta: meta.clone(),
                span: *span,
            });
        } else {
            out.push(stmt.clone());
        }
    }
    out
}

/// Underscore unused comprehension generator binders.
///
/// A generator binder is live if anything downstream of its generator
/// references it: later generator sources, any filter, the body, or a
/// pattern-embedded use (pin, bitstring size) in any generator. The
/// downstream usage is a per-part union without cross-part scope
/// subtraction - an over-approximation that can only keep binders alive.
fn underscore_comprehension(
    generators: Vec<(Pattern, Expr)>,
    filters: Vec<Expr>,
    body: Box<Expr>,
    interner: &StringInterner,
) -> ExprKind {
    let all_patterns: Vec<Pattern> = generators.iter().map(|(p, _)| p.clone()).collect();
    let pattern_usage = used_in_clause(
        &Clause::new(all_patterns, Expr::synthesized(ExprKind::Nil)),
        interner,
    );

    let new_generators = generators
        .iter()
        .enumerate()
        .map(|(i, (pattern, source))| {
            let mut usage = pattern_usage.clone();
            for (_p, later_source) in &generators[i + 1..] {
                usage.absorb(used_in_scope(later_source, interner));
            }
            for filter in &filters {
                usage.absorb(used_in_scope(filter, interner));
            }
            usage.absorb(used_in_scope(&body, interner));

            if usage.is_opaque() {
                return (pattern.clone(), source.clone());
            }
            let binders = pattern.binders();
            let mut new_pattern = pattern.clone();
            for binder in &binders {
                if let Some(renamed) = dead_binder_rename(*binder, &binders, &usage, interner) {
                    new_pattern = new_pattern.rename_binder(*binder, renamed);
                }
            }
            (new_pattern, source.clone())
        })
        .collect();

    ExprKind::Comprehension {
        generators: new_generators,
        filters,
        body,
    }
}

/// Decide the underscored replacement for one binder, or `None` to leave
/// it alone. Skips binders that are already prefixed, still referenced,
/// or whose `_name` form would collide with a sibling binder or a real
/// reference.
fn dead_binder_rename(
    binder: Name,
    siblings: &FxHashSet<Name>,
    usage: &Usage,
    interner: &StringInterner,
) -> Option<Name> {
    if is_underscored(binder, interner) || usage.uses(binder) {
        return None;
    }
    let renamed = underscore(binder, interner);
    if siblings.contains(&renamed) || usage.uses(renamed) {
        return None;
    }
    Some(renamed)
}
