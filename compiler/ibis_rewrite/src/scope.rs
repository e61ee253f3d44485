//! Scope & usage analysis.
//!
//! The single source of truth for "declared vs referenced". Every pass
//! that decides liveness or rename targets consults this module; none of
//! them second-guess it with a local walk. A blind spot found here is
//! fixed here, never patched around in a pass - a local patch would
//! reintroduce exactly the inconsistency this module exists to prevent.
//!
//! # What counts as a use
//!
//! A use is a free variable-read occurrence: a `Var` node, a pinned name
//! in a pattern (`^x` reads an existing binding), a name mentioned by a
//! bitstring size expression, or a name referenced from a `#{...}`
//! interpolation placeholder inside a string literal (scanned textually -
//! the front end does not split interpolated strings into structural
//! nodes). Closures are use sites for their free variables even though
//! their own parameters are declares.
//!
//! # What counts as a declare
//!
//! Pattern binders: function/closure parameters, binding left-hand sides
//! (including nested destructuring), clause patterns of
//! case/receive/try, and comprehension generators. A name that appears
//! only as a binder is not a use.
//!
//! # Scoping
//!
//! Blocks scope sequentially: a read before a rebind in the same block is
//! free; after it, local. Clause, closure, and comprehension boundaries
//! are lexical. Bindings made inside if/case/try branches do not escape
//! to the enclosing block (target-language semantics).
//!
//! # Opacity
//!
//! `Raw` splices are pre-rendered target text that may reference
//! anything, so a scope containing one reports every name as used
//! (`Usage::uses` returns true unconditionally). Liveness passes
//! therefore skip opaque scopes.

use rustc_hash::FxHashSet;

use ibis_ir::{Clause, Expr, ExprKind, MapKey, Name, Pattern, StringInterner};

use crate::transform::for_each;

/// Reserved words of the target language. These can never name a variable,
/// so the interpolation scanner drops them instead of reporting phantom
/// uses.
const RESERVED_WORDS: &[&str] = &[
    "after", "and", "case", "catch", "cond", "do", "else", "end", "false", "fn", "for", "if",
    "in", "nil", "not", "or", "receive", "rescue", "true", "try", "when",
];

fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// The analyzer's verdict for one lexical scope.
#[derive(Clone, Debug, Default)]
pub struct Usage {
    names: FxHashSet<Name>,
    opaque: bool,
}

impl Usage {
    /// Is `name` (potentially) used in the analyzed scope?
    ///
    /// Opaque scopes answer true for every name.
    pub fn uses(&self, name: Name) -> bool {
        self.opaque || self.names.contains(&name)
    }

    /// The free names collected. Meaningless for rewrite-target selection
    /// when the scope is opaque; check `is_opaque` first.
    pub fn names(&self) -> &FxHashSet<Name> {
        &self.names
    }

    /// Does the scope contain opaque pre-rendered text?
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Union another verdict into this one.
    pub(crate) fn absorb(&mut self, other: Usage) {
        self.names.extend(other.names);
        self.opaque |= other.opaque;
    }
}

/// Free uses of one body.
pub fn used_in_scope(body: &Expr, interner: &StringInterner) -> Usage {
    let mut collector = UseCollector::new(interner);
    collector.expr(body);
    collector.finish()
}

/// Free uses of a statement sequence, scoped like a block.
pub fn used_in_seq(stmts: &[Expr], interner: &StringInterner) -> Usage {
    let mut collector = UseCollector::new(interner);
    collector.push_scope();
    for stmt in stmts {
        collector.expr(stmt);
    }
    collector.pop_scope();
    collector.finish()
}

/// Free uses of a clause: its pattern-embedded uses (pins, sizes), guard,
/// and body - *without* subtracting the clause's own binders, so that a
/// binder's membership in the result answers "does this clause reference
/// its own binder".
pub fn used_in_clause(clause: &Clause, interner: &StringInterner) -> Usage {
    let mut collector = UseCollector::new(interner);
    for pattern in &clause.patterns {
        collector.pattern_uses(pattern);
    }
    if let Some(guard) = &clause.guard {
        collector.expr(guard);
    }
    collector.expr(&clause.body);
    collector.finish()
}

/// Binders a statement introduces into its enclosing block scope.
///
/// Mirrors the collector's scoping exactly: a bind declares into the
/// current scope wherever it appears in a same-scope position (operands,
/// call arguments, tuple/map elements, a case scrutinee, an if
/// condition), while anything behind a scope boundary (blocks, branches,
/// clauses, closures, comprehensions, try sections) stays local and does
/// not leak.
pub fn stmt_declares(stmt: &Expr) -> FxHashSet<Name> {
    let mut out = FxHashSet::default();
    collect_same_scope_binds(stmt, &mut out);
    out
}

fn collect_same_scope_binds(expr: &Expr, out: &mut FxHashSet<Name>) {
    match &expr.kind {
        ExprKind::Bind { pattern, value } => {
            collect_same_scope_binds(value, out);
            pattern.collect_binders(out);
        }
        ExprKind::Binary { left, right, .. } => {
            collect_same_scope_binds(left, out);
            collect_same_scope_binds(right, out);
        }
        ExprKind::Unary { operand, .. } => collect_same_scope_binds(operand, out),
        ExprKind::Call { args, .. } | ExprKind::Remote { args, .. } => {
            for arg in args {
                collect_same_scope_binds(arg, out);
            }
        }
        ExprKind::Access { expr, .. } => collect_same_scope_binds(expr, out),
        ExprKind::Tuple(elems) | ExprKind::List(elems) => {
            for elem in elems {
                collect_same_scope_binds(elem, out);
            }
        }
        ExprKind::MapLit(entries) => {
            for (key, value) in entries {
                collect_same_scope_binds(key, out);
                collect_same_scope_binds(value, out);
            }
        }
        ExprKind::KeywordList(entries) => {
            for (_key, value) in entries {
                collect_same_scope_binds(value, out);
            }
        }
        // Scrutinees and conditions evaluate in the current scope; the
        // branches behind them do not.
        ExprKind::Case { scrutinee, .. } => collect_same_scope_binds(scrutinee, out),
        ExprKind::If { cond, .. } => collect_same_scope_binds(cond, out),
        // Scope boundaries and leaves.
        ExprKind::Module { .. }
        | ExprKind::AliasDirective { .. }
        | ExprKind::FunctionDef { .. }
        | ExprKind::Block(_)
        | ExprKind::Receive { .. }
        | ExprKind::Try { .. }
        | ExprKind::Comprehension { .. }
        | ExprKind::Fn { .. }
        | ExprKind::Atom(_)
        | ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Nil
        | ExprKind::Var(_)
        | ExprKind::Raw(_) => {}
    }
}

/// Every binder declared anywhere in a subtree, at any depth: parameters,
/// clause patterns, binding left-hand sides, comprehension generators.
///
/// An over-approximation of "is this name declared somewhere in here",
/// used by passes that must prove a name is *not* declared.
pub fn all_binders(expr: &Expr) -> FxHashSet<Name> {
    let mut out = FxHashSet::default();
    for_each(expr, &mut |e| match &e.kind {
        ExprKind::Bind { pattern, .. } => pattern.collect_binders(&mut out),
        ExprKind::FunctionDef { clauses, .. }
        | ExprKind::Receive { clauses }
        | ExprKind::Fn { clauses }
        | ExprKind::Case { clauses, .. } => {
            for clause in clauses {
                for pattern in &clause.patterns {
                    pattern.collect_binders(&mut out);
                }
            }
        }
        ExprKind::Try {
            rescue_clauses,
            catch_clauses,
            ..
        } => {
            for clause in rescue_clauses.iter().chain(catch_clauses) {
                for pattern in &clause.patterns {
                    pattern.collect_binders(&mut out);
                }
            }
        }
        ExprKind::Comprehension { generators, .. } => {
            for (pattern, _source) in generators {
                pattern.collect_binders(&mut out);
            }
        }
        _ => {}
    });
    out
}

// Naming-convention signals. The underscore prefix means "intentionally
// unused" in the target language; passes treat it as one input signal,
// never as the liveness verdict itself.

/// Does the name start with an underscore?
pub fn is_underscored(name: Name, interner: &StringInterner) -> bool {
    interner.lookup(name).starts_with('_')
}

/// Prefix a name with an underscore.
pub fn underscore(name: Name, interner: &StringInterner) -> Name {
    let text = interner.lookup_static(name);
    interner.intern_owned(format!("_{text}"))
}

/// Strip a single leading underscore, if the remainder is non-empty.
pub fn strip_underscore(name: Name, interner: &StringInterner) -> Option<Name> {
    let text = interner.lookup_static(name);
    let stripped = text.strip_prefix('_')?;
    if stripped.is_empty() {
        return None;
    }
    Some(interner.intern(stripped))
}

// Collector

struct UseCollector<'a> {
    interner: &'a StringInterner,
    /// Innermost-last stack of locally declared names.
    scopes: Vec<FxHashSet<Name>>,
    names: FxHashSet<Name>,
    opaque: bool,
}

impl<'a> UseCollector<'a> {
    fn new(interner: &'a StringInterner) -> Self {
        UseCollector {
            interner,
            scopes: vec![FxHashSet::default()],
            names: FxHashSet::default(),
            opaque: false,
        }
    }

    fn finish(self) -> Usage {
        Usage {
            names: self.names,
            opaque: self.opaque,
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashSet::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn is_local(&self, name: Name) -> bool {
        self.scopes.iter().any(|scope| scope.contains(&name))
    }

    fn mark_use(&mut self, name: Name) {
        if !self.is_local(name) {
            self.names.insert(name);
        }
    }

    fn declare(&mut self, name: Name) {
        if let Some(top) = self.scopes.last_mut() {
            top.insert(name);
        }
    }

    fn declare_pattern(&mut self, pattern: &Pattern) {
        for name in pattern.binders() {
            self.declare(name);
        }
    }

    /// A clause opens its own lexical scope: pattern-embedded uses first,
    /// then binders, then guard and body with the binders in scope.
    fn clause(&mut self, clause: &Clause) {
        self.push_scope();
        for pattern in &clause.patterns {
            self.pattern_uses(pattern);
            self.declare_pattern(pattern);
        }
        if let Some(guard) = &clause.guard {
            self.expr(guard);
        }
        self.expr(&clause.body);
        self.pop_scope();
    }

    /// Reference occurrences embedded inside a pattern: pins (including
    /// pinned map keys) and bitstring size expressions.
    fn pattern_uses(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Var(_)
            | Pattern::Wildcard
            | Pattern::Atom(_)
            | Pattern::Int(_)
            | Pattern::Float(_)
            | Pattern::Str(_)
            | Pattern::Bool(_)
            | Pattern::Nil => {}
            Pattern::Pin(name) => self.mark_use(*name),
            Pattern::Tuple(elems) | Pattern::List(elems) => {
                for elem in elems {
                    self.pattern_uses(elem);
                }
            }
            Pattern::Cons { head, tail } => {
                self.pattern_uses(head);
                self.pattern_uses(tail);
            }
            Pattern::Map(entries) => {
                for (key, value) in entries {
                    if let MapKey::Pin(name) = key {
                        self.mark_use(*name);
                    }
                    self.pattern_uses(value);
                }
            }
            Pattern::Struct { fields, .. } => {
                for (_field, sub) in fields {
                    self.pattern_uses(sub);
                }
            }
            Pattern::Alias { inner, .. } => self.pattern_uses(inner),
            Pattern::BitString(segments) => {
                for segment in segments {
                    self.pattern_uses(&segment.pattern);
                    if let Some(size) = &segment.size {
                        self.expr(size);
                    }
                }
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Var(name) => self.mark_use(*name),
            ExprKind::Str(text) => self.scan_str(*text),
            ExprKind::Raw(_) => self.opaque = true,
            ExprKind::Atom(_)
            | ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Nil
            | ExprKind::AliasDirective { .. } => {}

            ExprKind::Module { body, .. } => {
                self.push_scope();
                for item in body {
                    self.expr(item);
                }
                self.pop_scope();
            }
            ExprKind::FunctionDef { clauses, .. }
            | ExprKind::Receive { clauses }
            | ExprKind::Fn { clauses } => {
                // A closure is a use site for its free variables; its own
                // parameters are declares inside the clause scope.
                for clause in clauses {
                    self.clause(clause);
                }
            }
            ExprKind::Block(stmts) => {
                self.push_scope();
                for stmt in stmts {
                    self.expr(stmt);
                }
                self.pop_scope();
            }
            ExprKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.expr(cond);
                self.push_scope();
                self.expr(then_body);
                self.pop_scope();
                if let Some(else_body) = else_body {
                    self.push_scope();
                    self.expr(else_body);
                    self.pop_scope();
                }
            }
            ExprKind::Case { scrutinee, clauses } => {
                self.expr(scrutinee);
                for clause in clauses {
                    self.clause(clause);
                }
            }
            ExprKind::Try {
                body,
                rescue_clauses,
                catch_clauses,
                after,
            } => {
                self.push_scope();
                self.expr(body);
                self.pop_scope();
                for clause in rescue_clauses.iter().chain(catch_clauses) {
                    self.clause(clause);
                }
                if let Some(after) = after {
                    self.push_scope();
                    self.expr(after);
                    self.pop_scope();
                }
            }
            ExprKind::Bind { pattern, value } => {
                // Value first: `x = x + 1` reads the previous binding.
                self.expr(value);
                self.pattern_uses(pattern);
                self.declare_pattern(pattern);
            }
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Call { args, .. } | ExprKind::Remote { args, .. } => {
                for arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::Access { expr, .. } => self.expr(expr),
            ExprKind::Tuple(elems) | ExprKind::List(elems) => {
                for elem in elems {
                    self.expr(elem);
                }
            }
            ExprKind::MapLit(entries) => {
                for (key, value) in entries {
                    self.expr(key);
                    self.expr(value);
                }
            }
            ExprKind::KeywordList(entries) => {
                for (_key, value) in entries {
                    self.expr(value);
                }
            }
            ExprKind::Comprehension {
                generators,
                filters,
                body,
            } => {
                self.push_scope();
                for (pattern, source) in generators {
                    // Source sees earlier generators' binders, not its own.
                    self.expr(source);
                    self.pattern_uses(pattern);
                    self.declare_pattern(pattern);
                }
                for filter in filters {
                    self.expr(filter);
                }
                self.expr(body);
                self.pop_scope();
            }
        }
    }

    /// Scan a string literal's text for `#{...}` interpolation
    /// placeholders and record the variable names they reference.
    fn scan_str(&mut self, text: Name) {
        let content = self.interner.lookup_static(text);
        if !content.contains("#{") {
            return;
        }
        let mut found = FxHashSet::default();
        scan_interpolations(content, self.interner, &mut found);
        for name in found {
            self.mark_use(name);
        }
    }
}

// Interpolation scanning

/// Extract variable references from every `#{...}` placeholder in `text`.
fn scan_interpolations(text: &str, interner: &StringInterner, out: &mut FxHashSet<Name>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'#' && bytes[i + 1] == b'{' {
            let start = i + 2;
            let mut depth = 1usize;
            let mut j = start;
            while j < bytes.len() && depth > 0 {
                match bytes[j] {
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    _ => {}
                }
                j += 1;
            }
            // Unterminated placeholder: scan to end of text.
            let end = if depth == 0 { j - 1 } else { bytes.len() };
            scan_placeholder(&text[start..end], interner, out);
            i = j;
        } else {
            i += 1;
        }
    }
}

/// Tokenize one placeholder body and keep the identifiers that read like
/// variable references: lowercase/underscore start, not preceded by `.`
/// `:` `&` `@` `?` (field access, atoms, captures, attributes, char
/// literals), not followed by `(` (calls) or a keyword-list `:`, and not
/// a reserved word.
fn scan_placeholder(content: &str, interner: &StringInterner, out: &mut FxHashSet<Name>) {
    let bytes = content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = &content[start..i];
            if looks_like_var_read(bytes, start, i) && !is_reserved_word(word) {
                out.insert(interner.intern(word));
            }
        } else {
            i += 1;
        }
    }
}

fn looks_like_var_read(bytes: &[u8], start: usize, end: usize) -> bool {
    if !(bytes[start].is_ascii_lowercase() || bytes[start] == b'_') {
        return false;
    }
    if let Some(prev) = prev_non_space(bytes, start) {
        if matches!(prev, b'.' | b':' | b'&' | b'@' | b'?') {
            return false;
        }
    }
    if let Some(next_idx) = next_non_space_idx(bytes, end) {
        if bytes[next_idx] == b'(' {
            return false;
        }
        // `key: value` association key, but not a `::` type specifier.
        if bytes[next_idx] == b':' && bytes.get(next_idx + 1) != Some(&b':') {
            return false;
        }
    }
    true
}

fn prev_non_space(bytes: &[u8], mut idx: usize) -> Option<u8> {
    while idx > 0 {
        idx -= 1;
        if !bytes[idx].is_ascii_whitespace() {
            return Some(bytes[idx]);
        }
    }
    None
}

fn next_non_space_idx(bytes: &[u8], mut idx: usize) -> Option<usize> {
    while idx < bytes.len() {
        if !bytes[idx].is_ascii_whitespace() {
            return Some(idx);
        }
        idx += 1;
    }
    None
}
