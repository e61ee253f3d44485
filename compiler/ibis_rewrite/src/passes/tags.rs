//! The closed result-tag table.
//!
//! The target language's convention wraps fallible results in two-element
//! tagged tuples. Passes that reason about result shapes consult this
//! table and nothing else - in particular, no substring matching on
//! identifier text. A tag missing from the table is simply not a result
//! tag, and the passes skip.

use ibis_ir::{Name, StringInterner};

/// Success tag for synthesized result wrapping.
pub const SUCCESS_TAG: &str = "ok";

/// Tags recognized as result discriminators.
const RESULT_TAGS: &[&str] = &["ok", "error"];

/// Is this atom a result-tuple discriminator?
pub fn is_result_tag(tag: Name, interner: &StringInterner) -> bool {
    RESULT_TAGS.contains(&interner.lookup(tag))
}

/// Preferred binder name for a result tag's payload, used when a clause
/// binder is being normalized and the body gives no candidate of its own.
/// Exhaustive over `RESULT_TAGS`.
pub fn preferred_binder(tag: Name, interner: &StringInterner) -> Option<&'static str> {
    match interner.lookup(tag) {
        "ok" => Some("result"),
        "error" => Some("reason"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_tags_are_closed() {
        let interner = StringInterner::new();
        assert!(is_result_tag(interner.intern("ok"), &interner));
        assert!(is_result_tag(interner.intern("error"), &interner));
        assert!(!is_result_tag(interner.intern("reply"), &interner));
        assert!(!is_result_tag(interner.intern("okay"), &interner));
    }

    #[test]
    fn every_result_tag_has_a_preferred_binder() {
        let interner = StringInterner::new();
        for tag in RESULT_TAGS {
            let name = interner.intern(tag);
            assert!(preferred_binder(name, &interner).is_some());
        }
        assert_eq!(preferred_binder(interner.intern("reply"), &interner), None);
    }
}
