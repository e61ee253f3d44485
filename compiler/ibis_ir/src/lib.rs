//! Ibis IR - Intermediate Representation Types
//!
//! This crate contains the core data structures of the Ibis rewrite layer:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Expression nodes (`Expr`/`ExprKind`) and clauses
//! - Patterns (the binding-form sub-language)
//! - Per-node metadata (`Meta`)
//!
//! The tree is an owned strict hierarchy: children are held by value
//! (`Box`/`Vec`), never shared. A rewrite that wants to reuse a subtree
//! clones it. This is deliberate: rewrite passes rebuild subtrees on every
//! application, so copy-on-write values are the unit of work.
//!
//! # Design Philosophy
//!
//! - **Intern identifiers**: variable names, atoms, function names, and
//!   module path segments are all `Name(u32)`.
//! - **Closed variant sets**: `ExprKind` and `Pattern` enumerate every shape
//!   the printer recognizes. Passes never invent new shapes.
//! - **Typed metadata**: cross-pass signals ride in an enum-keyed `Meta`
//!   bag, not an open `Any` map.

mod expr;
mod interner;
mod meta;
mod name;
mod ops;
mod pattern;
mod span;

pub use expr::{Clause, Expr, ExprKind, ModPath, Visibility};
pub use interner::{SharedInterner, StringInterner, StringLookup};
pub use meta::{Meta, MetaKey, MetaValue};
pub use name::Name;
pub use ops::{BinaryOp, UnaryOp};
pub use pattern::{BitSegment, BitType, MapKey, Pattern};
pub use span::Span;
