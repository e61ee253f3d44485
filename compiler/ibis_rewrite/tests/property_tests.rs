//! Property-based tests for the rewrite pipeline.
//!
//! These generate random trees and verify the contracts every pass is
//! held to:
//! 1. Idempotence: pass(pass(t)) == pass(t), for each pass and for the
//!    full default pipeline
//! 2. Structural preservation: the set of top-level definition names
//!    never changes
//! 3. Usage soundness: a binder only gets underscored when the analyzer,
//!    asked independently, reports it unused
//!
//! This complements the unit tests, which pin exact outputs on known
//! shapes, by exercising shape combinations no one thought to write down.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::OnceLock;

use proptest::prelude::*;

use ibis_ir::{
    Clause, Expr, ExprKind, Name, Pattern, StringInterner, Visibility,
};
use ibis_rewrite::passes;
use ibis_rewrite::{
    default_pipeline, is_underscored, run_pipeline, used_in_clause, PassContext, RewriteConfig,
};

/// Shared interner for generated names. Strategies hand out `Name`s, so
/// the backing interner must outlive every generated tree.
static INTERNER: OnceLock<StringInterner> = OnceLock::new();

fn interner() -> &'static StringInterner {
    INTERNER.get_or_init(StringInterner::new)
}

/// A small closed pool keeps collisions (shadowing, rebinding, sibling
/// clauses sharing binders) frequent enough to matter.
const NAME_POOL: &[&str] = &[
    "acc", "conn", "item", "opts", "payload", "reason", "result", "socket",
];

const TAG_POOL: &[&str] = &["ok", "error", "reply", "noreply"];

fn pool_name(index: usize) -> Name {
    interner().intern(NAME_POOL[index % NAME_POOL.len()])
}

fn tag_name(index: usize) -> Name {
    interner().intern(TAG_POOL[index % TAG_POOL.len()])
}

fn pattern_strategy() -> impl Strategy<Value = Pattern> {
    prop_oneof![
        (0..NAME_POOL.len()).prop_map(|i| Pattern::Var(pool_name(i))),
        Just(Pattern::Wildcard),
        (0..TAG_POOL.len(), 0..NAME_POOL.len())
            .prop_map(|(t, v)| Pattern::Tuple(vec![
                Pattern::Atom(tag_name(t)),
                Pattern::Var(pool_name(v)),
            ])),
        (0..NAME_POOL.len()).prop_map(|i| Pattern::Pin(pool_name(i))),
    ]
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        any::<i16>().prop_map(|n| Expr::int(i64::from(n))),
        (0..NAME_POOL.len()).prop_map(|i| Expr::var(pool_name(i))),
        (0..TAG_POOL.len()).prop_map(|t| Expr::atom(tag_name(t))),
        Just(Expr::synthesized(ExprKind::Nil)),
        Just(Expr::str_lit(interner().intern("count: #{acc}"))),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Expr::block),
            prop::collection::vec(inner.clone(), 0..3)
                .prop_map(|elems| Expr::synthesized(ExprKind::Tuple(elems))),
            (pattern_strategy(), inner.clone()).prop_map(|(p, v)| Expr::bind(p, v)),
            (inner.clone(), prop::collection::vec(clause_strategy(inner.clone()), 1..3))
                .prop_map(|(scrutinee, clauses)| {
                    Expr::synthesized(ExprKind::Case {
                        scrutinee: Box::new(scrutinee),
                        clauses,
                    })
                }),
            prop::collection::vec(clause_strategy(inner.clone()), 1..3)
                .prop_map(|clauses| Expr::synthesized(ExprKind::Fn { clauses })),
            (0..NAME_POOL.len(), prop::collection::vec(inner, 0..3)).prop_map(|(f, args)| {
                Expr::synthesized(ExprKind::Call {
                    fun: pool_name(f),
                    args,
                })
            }),
        ]
    })
}

fn clause_strategy(body: impl Strategy<Value = Expr>) -> impl Strategy<Value = Clause> {
    (prop::collection::vec(pattern_strategy(), 1..3), body)
        .prop_map(|(patterns, body)| Clause::new(patterns, body))
}

fn module_strategy() -> impl Strategy<Value = Expr> {
    prop::collection::vec(
        ((0..NAME_POOL.len()), expr_strategy()).prop_map(|(n, body)| {
            Expr::synthesized(ExprKind::FunctionDef {
                name: pool_name(n),
                clauses: vec![Clause::new(vec![Pattern::Var(pool_name(n + 1))], body)],
                visibility: Visibility::Public,
            })
        }),
        1..4,
    )
    .prop_map(|defs| {
        Expr::synthesized(ExprKind::Module {
            name: interner().intern("Generated"),
            body: defs,
        })
    })
}

fn top_level_names(expr: &Expr) -> Vec<Name> {
    let ExprKind::Module { body, .. } = &expr.kind else {
        return Vec::new();
    };
    body.iter()
        .filter_map(|item| match &item.kind {
            ExprKind::FunctionDef { name, .. } => Some(*name),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn every_pass_is_idempotent(tree in module_strategy()) {
        let config = RewriteConfig::default();
        let cx = PassContext { interner: interner(), config: &config };

        for pass in default_pipeline() {
            let once = (pass.run)(tree.clone(), &cx);
            let twice = (pass.run)(once.clone(), &cx);
            prop_assert_eq!(&twice, &once, "pass {} is not idempotent", pass.name);
        }
    }

    #[test]
    fn the_full_pipeline_is_idempotent(tree in module_strategy()) {
        let config = RewriteConfig::default();
        let cx = PassContext { interner: interner(), config: &config };

        let once = run_pipeline(tree, &default_pipeline(), &cx);
        let twice = run_pipeline(once.clone(), &default_pipeline(), &cx);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn top_level_definitions_are_preserved(tree in module_strategy()) {
        let config = RewriteConfig::default();
        let cx = PassContext { interner: interner(), config: &config };

        let before = top_level_names(&tree);
        let after = top_level_names(&run_pipeline(tree, &default_pipeline(), &cx));
        prop_assert_eq!(before, after);
    }

    #[test]
    fn underscoring_is_sound(body in expr_strategy(), t in 0..TAG_POOL.len(), b in 0..NAME_POOL.len()) {
        let config = RewriteConfig::default();
        let cx = PassContext { interner: interner(), config: &config };

        let binder = pool_name(b);
        let clause = Clause::new(
            vec![Pattern::Tuple(vec![
                Pattern::Atom(tag_name(t)),
                Pattern::Var(binder),
            ])],
            body,
        );
        let case = Expr::synthesized(ExprKind::Case {
            scrutinee: Box::new(Expr::int(0)),
            clauses: vec![clause.clone()],
        });

        let out = passes::underscore_unused::run(case, &cx);
        let ExprKind::Case { clauses, .. } = &out.kind else {
            panic!("case vanished");
        };
        let Some(Pattern::Tuple(elems)) = clauses[0].patterns.first() else {
            panic!("pattern shape changed");
        };
        if let Some(Pattern::Var(out_binder)) = elems.get(1) {
            if *out_binder != binder {
                // The pass underscored it: the independent analyzer must
                // agree the binder was unused.
                let usage = used_in_clause(&clause, interner());
                prop_assert!(is_underscored(*out_binder, interner()));
                prop_assert!(!usage.uses(binder));
                prop_assert!(!usage.is_opaque());
            }
        }
    }
}
