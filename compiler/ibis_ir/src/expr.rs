//! Expression Types
//!
//! Core expression nodes of the rewrite-layer IR. The tree is owned:
//! children are `Box`/`Vec` values, never shared. Every node carries its
//! variant payload, a typed metadata bag, and a source span (`Span::DUMMY`
//! for synthesized nodes).

use std::fmt;

use crate::{BinaryOp, Meta, MetaKey, MetaValue, Name, Pattern, Span, UnaryOp};

/// A dot-separated module path: `MyApp.Accounts.User`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ModPath(pub Vec<Name>);

impl ModPath {
    /// Single-segment path.
    pub fn single(name: Name) -> Self {
        ModPath(vec![name])
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Final segment, the short module name.
    pub fn last(&self) -> Option<Name> {
        self.0.last().copied()
    }

    /// Segment slice.
    pub fn segments(&self) -> &[Name] {
        &self.0
    }
}

impl fmt::Debug for ModPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModPath(")?;
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{seg:?}")?;
        }
        write!(f, ")")
    }
}

/// Definition visibility.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Visibility {
    Public,
    Private,
}

/// One clause: ordered parameter patterns, optional guard, body.
///
/// The unit iterated by function definitions, case/receive expressions,
/// closures, and try handlers.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Clause {
    pub patterns: Vec<Pattern>,
    pub guard: Option<Expr>,
    pub body: Expr,
}

impl Clause {
    /// Clause without a guard.
    pub fn new(patterns: Vec<Pattern>, body: Expr) -> Self {
        Clause {
            patterns,
            guard: None,
            body,
        }
    }

    /// Clause with a guard.
    pub fn guarded(patterns: Vec<Pattern>, guard: Expr, body: Expr) -> Self {
        Clause {
            patterns,
            guard: Some(guard),
            body,
        }
    }
}

/// Expression node.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub meta: Meta,
    pub span: Span,
}

/// Expression variants: the closed shape set the printer recognizes.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    /// Compilation-unit container: `defmodule Name do ... end`.
    /// Body items are directives, definitions, and raw splices.
    Module { name: Name, body: Vec<Expr> },

    /// Module-alias directive: `alias Mod.Sub` / `alias Mod.Sub, as: X`.
    AliasDirective {
        path: ModPath,
        as_name: Option<Name>,
    },

    /// Function definition; multi-clause definitions are first-class.
    FunctionDef {
        name: Name,
        clauses: Vec<Clause>,
        visibility: Visibility,
    },

    /// Ordered statement sequence; evaluates to its last statement.
    Block(Vec<Expr>),

    /// Conditional branch: `if cond do ... else ... end`.
    If {
        cond: Box<Expr>,
        then_body: Box<Expr>,
        else_body: Option<Box<Expr>>,
    },

    /// Case dispatch: `case scrutinee do clauses end`.
    Case {
        scrutinee: Box<Expr>,
        clauses: Vec<Clause>,
    },

    /// Message receive: `receive do clauses end`.
    Receive { clauses: Vec<Clause> },

    /// Exception handling: `try do ... rescue ... catch ... after ... end`.
    Try {
        body: Box<Expr>,
        rescue_clauses: Vec<Clause>,
        catch_clauses: Vec<Clause>,
        after: Option<Box<Expr>>,
    },

    /// Binding/assignment: `pattern = value`.
    Bind { pattern: Pattern, value: Box<Expr> },

    /// Binary operation: left op right.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: op operand.
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Local call: `fun(args)`.
    Call { fun: Name, args: Vec<Expr> },

    /// Remote/qualified call: `Mod.Sub.fun(args)`.
    Remote {
        module: ModPath,
        fun: Name,
        args: Vec<Expr>,
    },

    /// Field/key access: `expr.field`.
    Access { expr: Box<Expr>, field: Name },

    /// Atom literal: `:name`.
    Atom(Name),

    /// Integer literal.
    Int(i64),

    /// Float literal (stored as bits for Eq/Hash).
    Float(u64),

    /// String literal. Raw text; may contain `#{...}` interpolation
    /// placeholders, which the usage analyzer scans textually.
    Str(Name),

    /// Boolean literal.
    Bool(bool),

    /// Nil literal.
    Nil,

    /// Tuple literal: `{a, b}`.
    Tuple(Vec<Expr>),

    /// List literal: `[a, b, c]`.
    List(Vec<Expr>),

    /// Map literal with expression keys: `%{k => v}`.
    MapLit(Vec<(Expr, Expr)>),

    /// Keyword-association list: `[key: value]`.
    KeywordList(Vec<(Name, Expr)>),

    /// Comprehension: ordered `pattern <- source` generators, then
    /// filters, then body.
    Comprehension {
        generators: Vec<(Pattern, Expr)>,
        filters: Vec<Expr>,
        body: Box<Expr>,
    },

    /// Closure: `fn clauses end`.
    Fn { clauses: Vec<Clause> },

    /// Variable reference occurrence.
    Var(Name),

    /// Opaque pre-rendered target text. Escape hatch; the analyzer treats
    /// any scope containing one as opaque.
    Raw(Name),
}

impl Expr {
    /// Create a node with empty metadata.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            meta: Meta::new(),
            span,
        }
    }

    /// Create a synthesized node (dummy span).
    pub fn synthesized(kind: ExprKind) -> Self {
        Expr::new(kind, Span::DUMMY)
    }

    /// Attach a metadata entry, builder-style.
    #[must_use]
    pub fn with_meta(mut self, key: MetaKey, value: MetaValue) -> Self {
        self.meta.set(key, value);
        self
    }

    // Constructors for the shapes passes synthesize and tests build.

    /// Variable reference.
    pub fn var(name: Name) -> Self {
        Expr::synthesized(ExprKind::Var(name))
    }

    /// Atom literal.
    pub fn atom(name: Name) -> Self {
        Expr::synthesized(ExprKind::Atom(name))
    }

    /// Integer literal.
    pub fn int(value: i64) -> Self {
        Expr::synthesized(ExprKind::Int(value))
    }

    /// Float literal.
    pub fn float(value: f64) -> Self {
        Expr::synthesized(ExprKind::Float(value.to_bits()))
    }

    /// String literal.
    pub fn str_lit(text: Name) -> Self {
        Expr::synthesized(ExprKind::Str(text))
    }

    /// Statement block.
    pub fn block(stmts: Vec<Expr>) -> Self {
        Expr::synthesized(ExprKind::Block(stmts))
    }

    /// Binding: `pattern = value`.
    pub fn bind(pattern: Pattern, value: Expr) -> Self {
        Expr::synthesized(ExprKind::Bind {
            pattern,
            value: Box::new(value),
        })
    }

    /// Two-element tagged tuple: `{:tag, value}`.
    pub fn tagged(tag: Name, value: Expr) -> Self {
        Expr::synthesized(ExprKind::Tuple(vec![Expr::atom(tag), value]))
    }

    /// If this node is a two-element tuple whose first element is an atom,
    /// return the tag.
    pub fn result_tag(&self) -> Option<Name> {
        if let ExprKind::Tuple(elems) = &self.kind {
            if let [first, _value] = elems.as_slice() {
                if let ExprKind::Atom(tag) = first.kind {
                    return Some(tag);
                }
            }
        }
        None
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.meta.is_empty() {
            write!(f, "{:?} @ {:?}", self.kind, self.span)
        } else {
            write!(f, "{:?} @ {:?} {:?}", self.kind, self.span, self.meta)
        }
    }
}
