//! Hygiene rewriting for the Ibis compiler.
//!
//! This crate takes the typed tree produced by the front end and rewrites
//! it, pass by pass, into idiomatic, hygienic target output. It is built
//! from three pieces:
//!
//! 1. **Tree transformer** (`transform`): one generic bottom-up recursion
//!    strategy. Every pass is a pure match over node variants handed to the
//!    transformer; no pass hand-rolls its own walk.
//! 2. **Scope & usage analyzer** (`scope`): the single source of truth for
//!    "declared vs referenced", covering closures, comprehensions,
//!    exception handlers, pins, bitstring sizes, and string interpolation.
//! 3. **Pass pipeline** (`pipeline` + `passes`): a fixed, documented list
//!    of `Expr -> Expr` rewrites, each conservative (ambiguity means skip)
//!    and idempotent.
//!
//! # Pipeline Position
//!
//! ```text
//! Source -> Front end (parse, resolve) -> **Rewrite** -> Printer
//! ```
//!
//! Failures are structural no-ops: a pass that cannot prove its rewrite is
//! safe returns its input unchanged. There is no error channel.

pub mod passes;
mod pipeline;
mod scope;
mod transform;
mod validate;

pub use pipeline::{default_pipeline, rewrite, run_pipeline, Pass, PassContext, RewriteConfig};
pub use scope::{
    all_binders, is_underscored, stmt_declares, strip_underscore, underscore, used_in_clause,
    used_in_scope, used_in_seq, Usage,
};
pub use transform::{for_each, transform, transform_children};
pub use validate::validate;
