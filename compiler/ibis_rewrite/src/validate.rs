//! Post-pipeline structural validation.
//!
//! Debug-build check that the output tree uses only shapes the printer
//! recognizes. A violation here is a bug in a pass, not a runtime
//! condition - `run_pipeline` invokes this under `debug_assertions` only.

use ibis_ir::{Expr, ExprKind};

use crate::transform::for_each;

/// Assert printer-shape invariants over a finished tree.
///
/// # Panics
/// Panics when a pass produced a shape the printer does not recognize.
pub fn validate(expr: &Expr) {
    for_each(expr, &mut |e| match &e.kind {
        ExprKind::AliasDirective { path, .. } => {
            assert!(!path.is_empty(), "alias directive with empty path");
        }
        ExprKind::Remote { module, .. } => {
            assert!(!module.is_empty(), "remote call with empty module path");
        }
        ExprKind::FunctionDef { clauses, .. } => {
            assert!(!clauses.is_empty(), "function definition with no clauses");
        }
        ExprKind::Case { clauses, .. } => {
            assert!(!clauses.is_empty(), "case expression with no clauses");
        }
        ExprKind::Block(stmts) => {
            assert!(!stmts.is_empty(), "empty block");
        }
        _ => {}
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_ir::{Clause, ModPath, Name, Pattern};

    #[test]
    fn accepts_well_formed_tree() {
        let case = Expr::synthesized(ExprKind::Case {
            scrutinee: Box::new(Expr::var(Name::from_raw(1))),
            clauses: vec![Clause::new(vec![Pattern::Wildcard], Expr::int(1))],
        });
        validate(&case);
    }

    #[test]
    #[should_panic(expected = "empty path")]
    fn rejects_empty_alias_path() {
        let directive = Expr::synthesized(ExprKind::AliasDirective {
            path: ModPath(Vec::new()),
            as_name: None,
        });
        validate(&directive);
    }

    #[test]
    #[should_panic(expected = "no clauses")]
    fn rejects_clauseless_case() {
        let case = Expr::synthesized(ExprKind::Case {
            scrutinee: Box::new(Expr::int(1)),
            clauses: Vec::new(),
        });
        validate(&case);
    }
}
