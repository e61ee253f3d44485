//! The rewrite passes.
//!
//! Every pass follows the same shape: a structural predicate matches a
//! specific tree form, the scope analyzer supplies the use-set for the
//! scope in question, a narrow deterministic rule decides whether the
//! rewrite is unambiguous, and anything ambiguous is skipped - silently,
//! indistinguishable from "pass doesn't apply here". Shape guards come
//! before destructuring, so malformed arities degrade to skips instead of
//! panics.
//!
//! Passes are registered in [`crate::default_pipeline`]; see its module
//! docs for the ordering contract.

pub mod collapse_temp;
pub mod inject_aliases;
pub mod normalize_result;
pub mod rename_binders;
pub mod restore_refs;
pub mod tags;
pub mod underscore_unused;
