use pretty_assertions::assert_eq;

use ibis_ir::{
    Clause, Expr, ExprKind, MetaKey, MetaValue, Pattern, StringInterner, Visibility,
};

use super::*;

fn call(interner: &StringInterner, fun: &str, args: Vec<Expr>) -> Expr {
    Expr::synthesized(ExprKind::Call {
        fun: interner.intern(fun),
        args,
    })
}

fn module_of(interner: &StringInterner, body: Vec<Expr>) -> Expr {
    Expr::synthesized(ExprKind::Module {
        name: interner.intern("Worker"),
        body,
    })
}

#[test]
fn default_pipeline_order_is_fixed() {
    let names: Vec<&str> = default_pipeline().iter().map(|p| p.name).collect();
    assert_eq!(
        names,
        vec![
            "normalize_result",
            "rename_binders",
            "restore_refs",
            "collapse_temp",
            "underscore_unused",
            "inject_aliases",
        ]
    );
}

#[test]
fn passes_run_left_to_right() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    fn push_one(expr: Expr, _cx: &PassContext<'_>) -> Expr {
        let Expr { kind, meta, span } = expr;
        let ExprKind::Block(mut stmts) = kind else {
            return Expr { kind, meta, span };
        };
        let next = i64::try_from(stmts.len()).unwrap_or(0);
        stmts.push(Expr::int(next));
        Expr {
            kind: ExprKind::Block(stmts),
            meta,
            span,
        }
    }

    let pipeline = [
        Pass {
            name: "first",
            run: push_one,
        },
        Pass {
            name: "second",
            run: push_one,
        },
    ];

    let out = run_pipeline(Expr::block(vec![Expr::int(0)]), &pipeline, &cx);
    assert_eq!(
        out,
        Expr::block(vec![Expr::int(0), Expr::int(1), Expr::int(2)])
    );
}

/// Scenario walk: a handler whose generated body carries every hygiene
/// defect at once comes out clean after one pipeline run.
#[test]
fn rewrite_cleans_a_generated_handler() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let ok = interner.intern("ok");
    let x = interner.intern("x");
    let result = interner.intern("result");
    let resp = interner.intern("resp");
    let conn = interner.intern("conn");
    let opts = interner.intern("opts");

    // def handle(conn, opts) do
    //   case fetch(conn) do
    //     {:ok, x} -> resp = render(result); resp
    //   end
    // end
    let tree = module_of(
        &interner,
        vec![Expr::synthesized(ExprKind::FunctionDef {
            name: interner.intern("handle"),
            clauses: vec![Clause::new(
                vec![Pattern::Var(conn), Pattern::Var(opts)],
                Expr::synthesized(ExprKind::Case {
                    scrutinee: Box::new(call(&interner, "fetch", vec![Expr::var(conn)])),
                    clauses: vec![Clause::new(
                        vec![Pattern::Tuple(vec![
                            Pattern::Atom(ok),
                            Pattern::Var(x),
                        ])],
                        Expr::block(vec![
                            Expr::bind(
                                Pattern::Var(resp),
                                call(&interner, "render", vec![Expr::var(result)]),
                            ),
                            Expr::var(resp),
                        ]),
                    )],
                }),
            )],
            visibility: Visibility::Public,
        })],
    );

    let out = rewrite(tree, &cx);

    let expected = module_of(
        &interner,
        vec![Expr::synthesized(ExprKind::FunctionDef {
            name: interner.intern("handle"),
            clauses: vec![Clause::new(
                // opts was never referenced.
                vec![
                    Pattern::Var(conn),
                    Pattern::Var(interner.intern("_opts")),
                ],
                Expr::synthesized(ExprKind::Case {
                    scrutinee: Box::new(call(&interner, "fetch", vec![Expr::var(conn)])),
                    clauses: vec![Clause::new(
                        // The binder picked up the body's one undeclared
                        // name, and the dead temporary collapsed away.
                        vec![Pattern::Tuple(vec![
                            Pattern::Atom(ok),
                            Pattern::Var(result),
                        ])],
                        Expr::block(vec![call(
                            &interner,
                            "render",
                            vec![Expr::var(result)],
                        )]),
                    )],
                }),
            )],
            visibility: Visibility::Public,
        })],
    );
    assert_eq!(out, expected);
}

#[test]
fn full_pipeline_is_idempotent() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let ok = interner.intern("ok");
    let tree = module_of(
        &interner,
        vec![
            Expr::synthesized(ExprKind::FunctionDef {
                name: interner.intern("fetch"),
                clauses: vec![Clause::new(
                    vec![Pattern::Var(interner.intern("id"))],
                    Expr::tagged(ok, Expr::var(interner.intern("id"))),
                )],
                visibility: Visibility::Public,
            })
            .with_meta(MetaKey::ResultShape, MetaValue::Flag(true)),
            Expr::synthesized(ExprKind::FunctionDef {
                name: interner.intern("handle"),
                clauses: vec![Clause::new(
                    vec![Pattern::Var(interner.intern("msg"))],
                    Expr::synthesized(ExprKind::Case {
                        scrutinee: Box::new(Expr::var(interner.intern("msg"))),
                        clauses: vec![Clause::new(
                            vec![Pattern::Tuple(vec![
                                Pattern::Atom(interner.intern("error")),
                                Pattern::Var(interner.intern("e")),
                            ])],
                            call(
                                &interner,
                                "log",
                                vec![Expr::str_lit(interner.intern("boom"))],
                            ),
                        )],
                    }),
                )],
                visibility: Visibility::Public,
            }),
        ],
    );

    let once = rewrite(tree, &cx);
    let twice = rewrite(once.clone(), &cx);
    assert_eq!(twice, once);
}

#[test]
fn debug_config_preserves_temporaries() {
    let interner = StringInterner::new();
    let config = RewriteConfig {
        debug: true,
        ..RewriteConfig::default()
    };
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };
    let resp = interner.intern("resp");

    let block = Expr::block(vec![
        Expr::bind(Pattern::Var(resp), call(&interner, "render", vec![])),
        Expr::var(resp),
    ]);

    let out = run_pipeline(block.clone(), &default_pipeline(), &cx);
    assert_eq!(out, block);
}
