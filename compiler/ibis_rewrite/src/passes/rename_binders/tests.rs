use pretty_assertions::assert_eq;

use ibis_ir::{Clause, Expr, ExprKind, Name, Pattern, StringInterner, Visibility};

use crate::pipeline::{PassContext, RewriteConfig};

use super::*;

fn result_clause(interner: &StringInterner, tag: &str, binder: &str, body: Expr) -> Clause {
    Clause::new(
        vec![Pattern::Tuple(vec![
            Pattern::Atom(interner.intern(tag)),
            Pattern::Var(interner.intern(binder)),
        ])],
        body,
    )
}

fn case_of(clauses: Vec<Clause>) -> Expr {
    Expr::synthesized(ExprKind::Case {
        scrutinee: Box::new(Expr::int(0)),
        clauses,
    })
}

fn clause_binder(expr: &Expr) -> Option<Name> {
    let ExprKind::Case { clauses, .. } = &expr.kind else {
        return None;
    };
    let Pattern::Tuple(elems) = clauses.first()?.patterns.first()? else {
        return None;
    };
    match elems.get(1)? {
        Pattern::Var(name) => Some(*name),
        _ => None,
    }
}

#[test]
fn renames_to_the_single_undeclared_name() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    // {:ok, x} -> send(result), with result declared nowhere.
    let case = case_of(vec![result_clause(
        &interner,
        "ok",
        "x",
        Expr::synthesized(ExprKind::Call {
            fun: interner.intern("send"),
            args: vec![Expr::var(interner.intern("result"))],
        }),
    )]);

    let out = run(case, &cx);
    assert_eq!(clause_binder(&out), Some(interner.intern("result")));
}

#[test]
fn renaming_is_idempotent() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let case = case_of(vec![result_clause(
        &interner,
        "ok",
        "x",
        Expr::var(interner.intern("payload")),
    )]);

    let once = run(case, &cx);
    let twice = run(once.clone(), &cx);
    assert_eq!(twice, once);
}

#[test]
fn two_candidates_is_ambiguous() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let case = case_of(vec![result_clause(
        &interner,
        "ok",
        "x",
        Expr::synthesized(ExprKind::Tuple(vec![
            Expr::var(interner.intern("left")),
            Expr::var(interner.intern("right")),
        ])),
    )]);

    let out = run(case.clone(), &cx);
    assert_eq!(out, case);
}

#[test]
fn referenced_binder_is_left_alone() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let case = case_of(vec![result_clause(
        &interner,
        "ok",
        "x",
        Expr::synthesized(ExprKind::Tuple(vec![
            Expr::var(interner.intern("x")),
            Expr::var(interner.intern("other")),
        ])),
    )]);

    let out = run(case.clone(), &cx);
    assert_eq!(out, case);
}

#[test]
fn guarded_clauses_are_skipped() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let case = case_of(vec![Clause::guarded(
        vec![Pattern::Tuple(vec![
            Pattern::Atom(interner.intern("ok")),
            Pattern::Var(interner.intern("x")),
        ])],
        Expr::synthesized(ExprKind::Bool(true)),
        Expr::var(interner.intern("result")),
    )]);

    let out = run(case.clone(), &cx);
    assert_eq!(out, case);
}

#[test]
fn candidate_declared_in_enclosing_block_is_not_a_target() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };
    let result = interner.intern("result");

    // result = fetch(); case ... do {:ok, x} -> send(result) end
    // The reference resolves to the earlier binding; renaming the binder
    // to `result` would shadow it and capture the reference.
    let block = Expr::block(vec![
        Expr::bind(Pattern::Var(result), Expr::int(1)),
        case_of(vec![result_clause(
            &interner,
            "ok",
            "x",
            Expr::synthesized(ExprKind::Call {
                fun: interner.intern("send"),
                args: vec![Expr::var(result)],
            }),
        )]),
    ]);

    let out = run(block.clone(), &cx);
    assert_eq!(out, block);
}

#[test]
fn zero_candidates_falls_back_to_the_tag_table() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    // {:error, e} -> log("failed"): binder unused, no candidates, table
    // prefers `reason` for :error.
    let case = case_of(vec![result_clause(
        &interner,
        "error",
        "e",
        Expr::synthesized(ExprKind::Call {
            fun: interner.intern("log"),
            args: vec![Expr::str_lit(interner.intern("failed"))],
        }),
    )]);

    let out = run(case, &cx);
    assert_eq!(clause_binder(&out), Some(interner.intern("reason")));
}

#[test]
fn tag_table_fallback_respects_scope() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };
    let reason = interner.intern("reason");

    // `reason` is a function parameter: renaming would shadow it.
    let def = Expr::synthesized(ExprKind::FunctionDef {
        name: interner.intern("handle"),
        clauses: vec![Clause::new(
            vec![Pattern::Var(reason)],
            case_of(vec![result_clause(
                &interner,
                "error",
                "e",
                Expr::synthesized(ExprKind::Call {
                    fun: interner.intern("log"),
                    args: vec![Expr::str_lit(interner.intern("failed"))],
                }),
            )]),
        )],
        visibility: Visibility::Public,
    });

    let out = run(def.clone(), &cx);
    assert_eq!(out, def);
}

#[test]
fn unknown_tags_have_no_table_fallback() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let case = case_of(vec![result_clause(
        &interner,
        "reply",
        "e",
        Expr::int(1),
    )]);

    let out = run(case.clone(), &cx);
    assert_eq!(out, case);
}

#[test]
fn underscored_binders_are_not_resurrected() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let case = case_of(vec![result_clause(
        &interner,
        "ok",
        "_x",
        Expr::var(interner.intern("result")),
    )]);

    let out = run(case.clone(), &cx);
    assert_eq!(out, case);
}

#[test]
fn opaque_bodies_are_skipped() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    let case = case_of(vec![result_clause(
        &interner,
        "ok",
        "x",
        Expr::block(vec![
            Expr::synthesized(ExprKind::Raw(interner.intern("IO.puts(result)"))),
            Expr::var(interner.intern("result")),
        ]),
    )]);

    let out = run(case.clone(), &cx);
    assert_eq!(out, case);
}

#[test]
fn candidates_inside_nested_closures_count() {
    let interner = StringInterner::new();
    let config = RewriteConfig::default();
    let cx = PassContext {
        interner: &interner,
        config: &config,
    };

    // {:ok, x} -> fn -> emit(result) end
    let case = case_of(vec![result_clause(
        &interner,
        "ok",
        "x",
        Expr::synthesized(ExprKind::Fn {
            clauses: vec![Clause::new(
                vec![],
                Expr::synthesized(ExprKind::Call {
                    fun: interner.intern("emit"),
                    args: vec![Expr::var(interner.intern("result"))],
                }),
            )],
        }),
    )]);

    let out = run(case, &cx);
    assert_eq!(clause_binder(&out), Some(interner.intern("result")));
}
