//! Shared shape of article master-data records.

use atelier_core::{Document, RuleSet, Stamped, required};

/// Message recorded against `code` when another live record already uses it.
pub const CODE_EXISTS: &str = "code already exists";

/// A coded, named article record managed through the validated-write flow.
///
/// The `code` rule is not part of [`ArticleRecord::rules`]: it depends on a
/// uniqueness lookup and is evaluated by the manager.
pub trait ArticleRecord: Document + Stamped {
    fn code(&self) -> &str;
    fn name(&self) -> &str;

    /// Build the candidate that rules run against, filling defaults.
    ///
    /// Pure; must not depend on any stored state.
    fn candidate(input: Self) -> Self {
        input
    }

    /// Store-independent field rules.
    fn rules() -> RuleSet<Self>;

    /// Normalize an accepted candidate before it is stamped and written.
    fn finalize(&mut self) {}
}

/// Rules every article record shares (`name` required).
pub fn base_rules<T: ArticleRecord>() -> RuleSet<T> {
    RuleSet::new().rule("name", |r: &T| required("name", r.name()))
}
