//! The rewrite pass pipeline.
//!
//! An ordered list of `Expr -> Expr` pass functions applied left to right,
//! once per compilation unit. Passes share no mutable state beyond the
//! node metadata bags riding in the tree itself; everything else (the
//! interner, compiler flags) is threaded explicitly through `PassContext`.
//!
//! # Ordering contract
//!
//! Ordering is a fixed, documented list - there is no dynamic reordering
//! or dependency inference. The constraints encoded in
//! [`default_pipeline`]:
//!
//! 1. `normalize_result` runs first: it synthesizes bindings and
//!    normalizes result shapes that later passes inspect.
//! 2. `rename_binders` runs before `underscore_unused`: renaming before
//!    deciding liveness.
//! 3. `restore_refs` runs before `underscore_unused`: it can reintroduce
//!    uses of a parameter, which must be visible to the liveness decision.
//! 4. `collapse_temp` runs before `underscore_unused`: collapsing removes
//!    a binding outright, which is strictly better than underscoring it.
//! 5. `inject_aliases` runs last: module-directive surgery, independent
//!    of variable hygiene.
//!
//! Every pass is idempotent, so a pass may be registered at more than one
//! position as a safety net without changing the result.

use tracing::debug;

use ibis_ir::{Expr, StringInterner};

use crate::passes;

/// Compiler flags that influence pass behavior, threaded explicitly into
/// the pipeline invocation - never read from ambient/global state.
#[derive(Clone, Debug)]
pub struct RewriteConfig {
    /// Debug builds keep generated temporaries for readability; the
    /// collapse pass is skipped.
    pub debug: bool,
    /// Minimum number of qualified references before a module alias is
    /// injected.
    pub alias_threshold: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        RewriteConfig {
            debug: false,
            alias_threshold: 2,
        }
    }
}

/// Everything a pass may consult besides the tree itself.
pub struct PassContext<'a> {
    pub interner: &'a StringInterner,
    pub config: &'a RewriteConfig,
}

/// A single rewrite pass: a named, pure `Expr -> Expr` function.
#[derive(Clone, Copy)]
pub struct Pass {
    pub name: &'static str,
    pub run: fn(Expr, &PassContext<'_>) -> Expr,
}

impl std::fmt::Debug for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pass({})", self.name)
    }
}

/// The default pass list. See the module docs for the ordering contract.
pub fn default_pipeline() -> Vec<Pass> {
    vec![
        Pass {
            name: "normalize_result",
            run: passes::normalize_result::run,
        },
        Pass {
            name: "rename_binders",
            run: passes::rename_binders::run,
        },
        Pass {
            name: "restore_refs",
            run: passes::restore_refs::run,
        },
        Pass {
            name: "collapse_temp",
            run: passes::collapse_temp::run,
        },
        Pass {
            name: "underscore_unused",
            run: passes::underscore_unused::run,
        },
        Pass {
            name: "inject_aliases",
            run: passes::inject_aliases::run,
        },
    ]
}

/// Run a pass list over one compilation unit.
pub fn run_pipeline(mut expr: Expr, pipeline: &[Pass], cx: &PassContext<'_>) -> Expr {
    for pass in pipeline {
        debug!(pass = pass.name, "running rewrite pass");
        expr = (pass.run)(expr, cx);
    }

    #[cfg(debug_assertions)]
    crate::validate(&expr);

    expr
}

/// Run the default pipeline over one compilation unit.
pub fn rewrite(expr: Expr, cx: &PassContext<'_>) -> Expr {
    run_pipeline(expr, &default_pipeline(), cx)
}

#[cfg(test)]
mod tests;
