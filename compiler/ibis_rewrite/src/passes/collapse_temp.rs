//! Dead trailing-temporary collapse.
//!
//! Generated code frequently ends a block with
//!
//! ```text
//! result = compute(...)
//! result
//! ```
//!
//! When the temporary is referenced nowhere else in the block, the pair
//! collapses to the bare value expression. The binding's evaluation order
//! is unchanged - the value simply becomes the block result directly.
//!
//! Skipped entirely in debug builds (temporaries help when debugging
//! emitted code), for bindings carrying `KeepBinding` metadata, and
//! whenever the analyzer reports the name used - or the block opaque -
//! anywhere else in the block.

use ibis_ir::{Expr, ExprKind, MetaKey, Pattern};

use crate::pipeline::PassContext;
use crate::scope::used_in_seq;
use crate::transform::transform;

/// Run the pass over one compilation unit.
pub fn run(expr: Expr, cx: &PassContext<'_>) -> Expr {
    if cx.config.debug {
        return expr;
    }
    transform(expr, &|e| apply(e, cx))
}

fn apply(expr: Expr, cx: &PassContext<'_>) -> Expr {
    let Expr { kind, meta, span } = expr;
    let ExprKind::Block(mut stmts) = kind else {
        return Expr { kind, meta, span };
    };

    // Collapsing can expose another collapsible pair (`a = f(); x = a; x`),
    // so run to a fixpoint within the block.
    while should_collapse(&stmts, cx) {
        let trailing = stmts.pop();
        match stmts.pop() {
            Some(Expr {
                kind: ExprKind::Bind { value, .. },
                ..
            }) => stmts.push(*value),
            // Shape guard said otherwise; put things back untouched.
            other => {
                stmts.extend(other);
                stmts.extend(trailing);
                break;
            }
        }
    }

    Expr {
        kind: ExprKind::Block(stmts),
        meta,
        span,
    }
}

/// The trigger: `[..., x = value, x]` where `x` is a plain var binder, the
/// binding carries no keep marker, and `x` is referenced nowhere else in
/// the block. The analyzer's verdict over the leading statements covers
/// the bind's own value and every earlier statement; an opaque block
/// reports everything used and is skipped.
fn should_collapse(stmts: &[Expr], cx: &PassContext<'_>) -> bool {
    let [.., prev, last] = stmts else {
        return false;
    };
    let (ExprKind::Bind { pattern, .. }, ExprKind::Var(trailing)) = (&prev.kind, &last.kind)
    else {
        return false;
    };
    matches!(pattern, Pattern::Var(bound) if bound == trailing)
        && !prev.meta.flag(MetaKey::KeepBinding)
        && !used_in_seq(&stmts[..stmts.len() - 1], cx.interner).uses(*trailing)
}
