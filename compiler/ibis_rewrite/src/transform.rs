//! Generic tree traversal and rewriting.
//!
//! One recursion strategy for every pass. `transform` rebuilds the tree
//! bottom-up: children first, then the rewrite function on the
//! reconstructed node. `transform_children` is the single-level variant for
//! passes that thread their own state per branch (e.g. a scope accumulator).
//! `for_each` is the read-only walk for counting and validation.
//!
//! The rewrite function must be total and side-effect-free; shapes it does
//! not recognize fall through unchanged. The engine itself never raises on
//! structurally well-formed input - leaf and opaque shapes (`Var`,
//! literals, `Raw`, `AliasDirective`) simply have no children to recurse
//! into, and still get the rewrite function applied.

use ibis_ir::{BitSegment, Clause, Expr, ExprKind, Pattern};

/// Rewrite a tree bottom-up.
///
/// Recurses into every structurally known child (clause guards and bodies,
/// comprehension generators and filters, map keys and values, bitstring
/// size expressions), reconstructs the node with the rewritten children,
/// then applies `f` to the reconstruction.
pub fn transform<F>(expr: Expr, f: &F) -> Expr
where
    F: Fn(Expr) -> Expr,
{
    let rebuilt = transform_children(expr, &|child| transform(child, f));
    f(rebuilt)
}

/// Apply `f` to each immediate declared child of `expr`, without recursing
/// further and without applying `f` to `expr` itself.
///
/// This is the engine's single level of recursion, exposed for passes that
/// need control over traversal order - typically per-branch processing of
/// clause bodies with a threaded scope accumulator.
pub fn transform_children<F>(expr: Expr, f: &F) -> Expr
where
    F: Fn(Expr) -> Expr,
{
    let Expr { kind, meta, span } = expr;
    let kind = match kind {
        // No children
        ExprKind::AliasDirective { .. }
        | ExprKind::Atom(_)
        | ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Nil
        | ExprKind::Var(_)
        | ExprKind::Raw(_) => kind,

        ExprKind::Module { name, body } => ExprKind::Module {
            name,
            body: body.into_iter().map(f).collect(),
        },
        ExprKind::FunctionDef {
            name,
            clauses,
            visibility,
        } => ExprKind::FunctionDef {
            name,
            clauses: map_clauses(clauses, f),
            visibility,
        },
        ExprKind::Block(stmts) => ExprKind::Block(stmts.into_iter().map(f).collect()),
        ExprKind::If {
            cond,
            then_body,
            else_body,
        } => ExprKind::If {
            cond: map_box(cond, f),
            then_body: map_box(then_body, f),
            else_body: else_body.map(|e| map_box(e, f)),
        },
        ExprKind::Case { scrutinee, clauses } => ExprKind::Case {
            scrutinee: map_box(scrutinee, f),
            clauses: map_clauses(clauses, f),
        },
        ExprKind::Receive { clauses } => ExprKind::Receive {
            clauses: map_clauses(clauses, f),
        },
        ExprKind::Try {
            body,
            rescue_clauses,
            catch_clauses,
            after,
        } => ExprKind::Try {
            body: map_box(body, f),
            rescue_clauses: map_clauses(rescue_clauses, f),
            catch_clauses: map_clauses(catch_clauses, f),
            after: after.map(|e| map_box(e, f)),
        },
        ExprKind::Bind { pattern, value } => ExprKind::Bind {
            pattern: map_pattern_exprs(pattern, f),
            value: map_box(value, f),
        },
        ExprKind::Binary { op, left, right } => ExprKind::Binary {
            op,
            left: map_box(left, f),
            right: map_box(right, f),
        },
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op,
            operand: map_box(operand, f),
        },
        ExprKind::Call { fun, args } => ExprKind::Call {
            fun,
            args: args.into_iter().map(f).collect(),
        },
        ExprKind::Remote { module, fun, args } => ExprKind::Remote {
            module,
            fun,
            args: args.into_iter().map(f).collect(),
        },
        ExprKind::Access { expr, field } => ExprKind::Access {
            expr: map_box(expr, f),
            field,
        },
        ExprKind::Tuple(elems) => ExprKind::Tuple(elems.into_iter().map(f).collect()),
        ExprKind::List(elems) => ExprKind::List(elems.into_iter().map(f).collect()),
        ExprKind::MapLit(entries) => {
            ExprKind::MapLit(entries.into_iter().map(|(k, v)| (f(k), f(v))).collect())
        }
        ExprKind::KeywordList(entries) => {
            ExprKind::KeywordList(entries.into_iter().map(|(k, v)| (k, f(v))).collect())
        }
        ExprKind::Comprehension {
            generators,
            filters,
            body,
        } => ExprKind::Comprehension {
            generators: generators
                .into_iter()
                .map(|(pat, source)| (map_pattern_exprs(pat, f), f(source)))
                .collect(),
            filters: filters.into_iter().map(f).collect(),
            body: map_box(body, f),
        },
        ExprKind::Fn { clauses } => ExprKind::Fn {
            clauses: map_clauses(clauses, f),
        },
    };
    Expr { kind, meta, span }
}

/// Visit every expression node in preorder, including clause guards and
/// bodies and the size expressions embedded in patterns.
pub fn for_each(expr: &Expr, f: &mut impl FnMut(&Expr)) {
    f(expr);
    match &expr.kind {
        ExprKind::AliasDirective { .. }
        | ExprKind::Atom(_)
        | ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Nil
        | ExprKind::Var(_)
        | ExprKind::Raw(_) => {}

        ExprKind::Module { body, .. } | ExprKind::Block(body) => {
            for item in body {
                for_each(item, f);
            }
        }
        ExprKind::FunctionDef { clauses, .. }
        | ExprKind::Receive { clauses }
        | ExprKind::Fn { clauses } => {
            for clause in clauses {
                for_each_clause(clause, f);
            }
        }
        ExprKind::If {
            cond,
            then_body,
            else_body,
        } => {
            for_each(cond, f);
            for_each(then_body, f);
            if let Some(else_body) = else_body {
                for_each(else_body, f);
            }
        }
        ExprKind::Case { scrutinee, clauses } => {
            for_each(scrutinee, f);
            for clause in clauses {
                for_each_clause(clause, f);
            }
        }
        ExprKind::Try {
            body,
            rescue_clauses,
            catch_clauses,
            after,
        } => {
            for_each(body, f);
            for clause in rescue_clauses.iter().chain(catch_clauses) {
                for_each_clause(clause, f);
            }
            if let Some(after) = after {
                for_each(after, f);
            }
        }
        ExprKind::Bind { pattern, value } => {
            for_each_pattern_exprs(pattern, f);
            for_each(value, f);
        }
        ExprKind::Binary { left, right, .. } => {
            for_each(left, f);
            for_each(right, f);
        }
        ExprKind::Unary { operand, .. } => for_each(operand, f),
        ExprKind::Call { args, .. } | ExprKind::Remote { args, .. } => {
            for arg in args {
                for_each(arg, f);
            }
        }
        ExprKind::Access { expr, .. } => for_each(expr, f),
        ExprKind::Tuple(elems) | ExprKind::List(elems) => {
            for elem in elems {
                for_each(elem, f);
            }
        }
        ExprKind::MapLit(entries) => {
            for (key, value) in entries {
                for_each(key, f);
                for_each(value, f);
            }
        }
        ExprKind::KeywordList(entries) => {
            for (_key, value) in entries {
                for_each(value, f);
            }
        }
        ExprKind::Comprehension {
            generators,
            filters,
            body,
        } => {
            for (pattern, source) in generators {
                for_each_pattern_exprs(pattern, f);
                for_each(source, f);
            }
            for filter in filters {
                for_each(filter, f);
            }
            for_each(body, f);
        }
    }
}

fn for_each_clause(clause: &Clause, f: &mut impl FnMut(&Expr)) {
    for pattern in &clause.patterns {
        for_each_pattern_exprs(pattern, f);
    }
    if let Some(guard) = &clause.guard {
        for_each(guard, f);
    }
    for_each(&clause.body, f);
}

fn for_each_pattern_exprs(pattern: &Pattern, f: &mut impl FnMut(&Expr)) {
    match pattern {
        Pattern::Var(_)
        | Pattern::Wildcard
        | Pattern::Atom(_)
        | Pattern::Int(_)
        | Pattern::Float(_)
        | Pattern::Str(_)
        | Pattern::Bool(_)
        | Pattern::Nil
        | Pattern::Pin(_) => {}
        Pattern::Tuple(elems) | Pattern::List(elems) => {
            for elem in elems {
                for_each_pattern_exprs(elem, f);
            }
        }
        Pattern::Cons { head, tail } => {
            for_each_pattern_exprs(head, f);
            for_each_pattern_exprs(tail, f);
        }
        Pattern::Map(entries) => {
            for (_key, value) in entries {
                for_each_pattern_exprs(value, f);
            }
        }
        Pattern::Struct { fields, .. } => {
            for (_field, sub) in fields {
                for_each_pattern_exprs(sub, f);
            }
        }
        Pattern::Alias { inner, .. } => for_each_pattern_exprs(inner, f),
        Pattern::BitString(segments) => {
            for segment in segments {
                for_each_pattern_exprs(&segment.pattern, f);
                if let Some(size) = &segment.size {
                    for_each(size, f);
                }
            }
        }
    }
}

fn map_box<F>(expr: Box<Expr>, f: &F) -> Box<Expr>
where
    F: Fn(Expr) -> Expr,
{
    Box::new(f(*expr))
}

fn map_clauses<F>(clauses: Vec<Clause>, f: &F) -> Vec<Clause>
where
    F: Fn(Expr) -> Expr,
{
    clauses
        .into_iter()
        .map(|clause| Clause {
            patterns: clause
                .patterns
                .into_iter()
                .map(|p| map_pattern_exprs(p, f))
                .collect(),
            guard: clause.guard.map(f),
            body: f(clause.body),
        })
        .collect()
}

/// Apply `f` to the expressions embedded in a pattern (bitstring sizes),
/// recursing through nested sub-patterns.
fn map_pattern_exprs<F>(pattern: Pattern, f: &F) -> Pattern
where
    F: Fn(Expr) -> Expr,
{
    match pattern {
        Pattern::Var(_)
        | Pattern::Wildcard
        | Pattern::Atom(_)
        | Pattern::Int(_)
        | Pattern::Float(_)
        | Pattern::Str(_)
        | Pattern::Bool(_)
        | Pattern::Nil
        | Pattern::Pin(_) => pattern,
        Pattern::Tuple(elems) => Pattern::Tuple(
            elems
                .into_iter()
                .map(|e| map_pattern_exprs(e, f))
                .collect(),
        ),
        Pattern::List(elems) => Pattern::List(
            elems
                .into_iter()
                .map(|e| map_pattern_exprs(e, f))
                .collect(),
        ),
        Pattern::Cons { head, tail } => Pattern::Cons {
            head: Box::new(map_pattern_exprs(*head, f)),
            tail: Box::new(map_pattern_exprs(*tail, f)),
        },
        Pattern::Map(entries) => Pattern::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, map_pattern_exprs(v, f)))
                .collect(),
        ),
        Pattern::Struct { path, fields } => Pattern::Struct {
            path,
            fields: fields
                .into_iter()
                .map(|(name, sub)| (name, map_pattern_exprs(sub, f)))
                .collect(),
        },
        Pattern::Alias { name, inner } => Pattern::Alias {
            name,
            inner: Box::new(map_pattern_exprs(*inner, f)),
        },
        Pattern::BitString(segments) => Pattern::BitString(
            segments
                .into_iter()
                .map(|segment| BitSegment {
                    pattern: map_pattern_exprs(segment.pattern, f),
                    size: segment.size.map(|s| Box::new(f(*s))),
                    ty: segment.ty,
                })
                .collect(),
        ),
    }
}
