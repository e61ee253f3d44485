//! Pattern Types
//!
//! The binding-form sub-language. Patterns appear in case/receive/try
//! clauses, closure and function parameters, binding left-hand sides, and
//! comprehension generators.
//!
//! Binding-vs-reference is positional: a `Var` in pattern position is a
//! binder; a `Pin` is a reference to an existing binding (match-not-bind);
//! a bitstring segment's size expression is an ordinary expression and
//! therefore a use site.

use rustc_hash::FxHashSet;

use crate::{Expr, ModPath, Name};

/// Pattern node.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Pattern {
    /// Binder: `x`
    Var(Name),

    /// Wildcard: `_`
    Wildcard,

    /// Tuple: `{a, b, c}`
    Tuple(Vec<Pattern>),

    /// Fixed-length list: `[a, b, c]`
    List(Vec<Pattern>),

    /// Head/tail: `[head | tail]`
    Cons {
        head: Box<Pattern>,
        tail: Box<Pattern>,
    },

    /// Map destructuring: `%{key => pattern}`
    Map(Vec<(MapKey, Pattern)>),

    /// Tagged/struct destructuring: `%Mod.Struct{field: pattern}`
    Struct {
        path: ModPath,
        fields: Vec<(Name, Pattern)>,
    },

    /// Literal matches
    Atom(Name),
    Int(i64),
    /// Float literal match (stored as bits for Eq/Hash).
    Float(u64),
    Str(Name),
    Bool(bool),
    Nil,

    /// Name bound to a sub-pattern: `whole = {a, b}`
    Alias { name: Name, inner: Box<Pattern> },

    /// Match-not-bind: `^x`. A reference, never a binder.
    Pin(Name),

    /// Bit-level segments: `<<len::8, payload::size(len)>>`
    BitString(Vec<BitSegment>),
}

/// Map-pattern key. Keys are literals or pinned references; a bare variable
/// key is not a valid pattern key in the target language.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum MapKey {
    Atom(Name),
    Str(Name),
    Int(i64),
    /// Pinned key: `%{^k => v}`. A use site for `k`.
    Pin(Name),
}

/// One segment of a bitstring pattern.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct BitSegment {
    /// Sub-pattern for the segment value (usually a `Var` or literal).
    pub pattern: Pattern,
    /// Size expression (`::size(n)`); a use site for names it mentions.
    pub size: Option<Box<Expr>>,
    /// Segment type specifier.
    pub ty: Option<BitType>,
}

/// Bitstring segment type specifiers.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BitType {
    Integer,
    Binary,
    Float,
    Utf8,
}

impl Pattern {
    /// Collect every binder this pattern introduces into `out`.
    ///
    /// Pins, literals, wildcards, and map keys never bind. An alias binds
    /// its name and whatever its inner pattern binds.
    pub fn collect_binders(&self, out: &mut FxHashSet<Name>) {
        match self {
            Pattern::Var(name) => {
                out.insert(*name);
            }
            Pattern::Wildcard
            | Pattern::Atom(_)
            | Pattern::Int(_)
            | Pattern::Float(_)
            | Pattern::Str(_)
            | Pattern::Bool(_)
            | Pattern::Nil
            | Pattern::Pin(_) => {}
            Pattern::Tuple(elems) | Pattern::List(elems) => {
                for elem in elems {
                    elem.collect_binders(out);
                }
            }
            Pattern::Cons { head, tail } => {
                head.collect_binders(out);
                tail.collect_binders(out);
            }
            Pattern::Map(entries) => {
                for (_key, value) in entries {
                    value.collect_binders(out);
                }
            }
            Pattern::Struct { fields, .. } => {
                for (_field, sub) in fields {
                    sub.collect_binders(out);
                }
            }
            Pattern::Alias { name, inner } => {
                out.insert(*name);
                inner.collect_binders(out);
            }
            Pattern::BitString(segments) => {
                for segment in segments {
                    segment.pattern.collect_binders(out);
                }
            }
        }
    }

    /// The set of binders this pattern introduces.
    pub fn binders(&self) -> FxHashSet<Name> {
        let mut out = FxHashSet::default();
        self.collect_binders(&mut out);
        out
    }

    /// Check if this pattern binds `name`.
    pub fn binds(&self, name: Name) -> bool {
        self.binders().contains(&name)
    }

    /// Rename every binder occurrence of `from` to `to`, rebuilding the
    /// pattern. Pins, literals, map keys, and size expressions are reference
    /// positions and are left untouched.
    #[must_use]
    pub fn rename_binder(&self, from: Name, to: Name) -> Pattern {
        match self {
            Pattern::Var(name) if *name == from => Pattern::Var(to),
            Pattern::Var(_)
            | Pattern::Wildcard
            | Pattern::Atom(_)
            | Pattern::Int(_)
            | Pattern::Float(_)
            | Pattern::Str(_)
            | Pattern::Bool(_)
            | Pattern::Nil
            | Pattern::Pin(_) => self.clone(),
            Pattern::Tuple(elems) => Pattern::Tuple(
                elems.iter().map(|e| e.rename_binder(from, to)).collect(),
            ),
            Pattern::List(elems) => Pattern::List(
                elems.iter().map(|e| e.rename_binder(from, to)).collect(),
            ),
            Pattern::Cons { head, tail } => Pattern::Cons {
                head: Box::new(head.rename_binder(from, to)),
                tail: Box::new(tail.rename_binder(from, to)),
            },
            Pattern::Map(entries) => Pattern::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.rename_binder(from, to)))
                    .collect(),
            ),
            Pattern::Struct { path, fields } => Pattern::Struct {
                path: path.clone(),
                fields: fields
                    .iter()
                    .map(|(f, p)| (*f, p.rename_binder(from, to)))
                    .collect(),
            },
            Pattern::Alias { name, inner } => Pattern::Alias {
                name: if *name == from { to } else { *name },
                inner: Box::new(inner.rename_binder(from, to)),
            },
            Pattern::BitString(segments) => Pattern::BitString(
                segments
                    .iter()
                    .map(|seg| BitSegment {
                        pattern: seg.pattern.rename_binder(from, to),
                        size: seg.size.clone(),
                        ty: seg.ty,
                    })
                    .collect(),
            ),
        }
    }
}
