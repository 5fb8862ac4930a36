//! URL filter pipeline
//!
//! An ordered, named collection of predicates over a URL. A URL passes the
//! pipeline only if every rule accepts it; evaluation runs in registration
//! order and stops at the first rejection.

pub mod recursion;
pub mod rules;

pub use recursion::{recurrence_count, RECURSION_REPETITION_THRESHOLD};

use url::Url;

/// A single filter predicate; `true` means the URL is acceptable
pub type RulePredicate = Box<dyn Fn(&Url) -> bool + Send + Sync>;

/// Ordered pipeline of named filter rules
///
/// The pipeline exclusively owns its rules. Rule names are unique within a
/// pipeline; registering a duplicate name is a no-op.
#[derive(Default)]
pub struct UrlFilter {
    rules: Vec<(String, RulePredicate)>,
}

impl UrlFilter {
    /// Creates an empty pipeline, which accepts every URL
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule under the given name.
    ///
    /// No-op if a rule with this name is already registered.
    pub fn add_rule(&mut self, name: impl Into<String>, rule: RulePredicate) {
        let name = name.into();
        if self.rules.iter().any(|(n, _)| *n == name) {
            tracing::debug!(rule = %name, "duplicate filter rule ignored");
            return;
        }
        self.rules.push((name, rule));
    }

    /// Removes the rule with the given name, if present
    pub fn remove_rule(&mut self, name: &str) {
        self.rules.retain(|(n, _)| n != name);
    }

    /// Evaluates the URL against every rule, in registration order.
    ///
    /// Returns `true` only if all rules accept; an empty pipeline accepts
    /// every URL.
    pub fn is_allowed(&self, url: &Url) -> bool {
        self.rejecting_rule(url).is_none()
    }

    /// Returns the name of the first rule that rejects the URL, or `None`
    /// if the URL passes the whole pipeline.
    pub fn rejecting_rule(&self, url: &Url) -> Option<&str> {
        self.rules
            .iter()
            .find(|(_, rule)| !rule(url))
            .map(|(name, _)| name.as_str())
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the pipeline has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_empty_pipeline_accepts_everything() {
        let filter = UrlFilter::new();
        assert!(filter.is_allowed(&url("http://example.com/")));
        assert!(filter.is_allowed(&url("javascript:void(0)")));
        assert!(filter.is_allowed(&url("http://example.com/a.png#frag")));
    }

    #[test]
    fn test_single_rejecting_rule_flips_result() {
        let mut filter = UrlFilter::new();
        assert!(filter.is_allowed(&url("http://example.com/pic.png")));

        filter.add_rule("reject-extension-png", rules::reject_extension("png"));
        assert!(!filter.is_allowed(&url("http://example.com/pic.png")));
        assert!(filter.is_allowed(&url("http://example.com/page")));
    }

    #[test]
    fn test_rejection_is_deterministic() {
        let mut filter = UrlFilter::new();
        filter.add_rule("reject-fragment", rules::reject_fragment());

        let target = url("http://example.com/page#section");
        for _ in 0..10 {
            assert_eq!(filter.rejecting_rule(&target), Some("reject-fragment"));
        }
    }

    #[test]
    fn test_first_rejection_wins_in_registration_order() {
        let mut filter = UrlFilter::new();
        filter.add_rule("reject-extension-png", rules::reject_extension("png"));
        filter.add_rule("reject-fragment", rules::reject_fragment());

        // Both rules reject this URL; registration order decides the name
        let target = url("http://example.com/pic.png#frag");
        assert_eq!(filter.rejecting_rule(&target), Some("reject-extension-png"));
    }

    #[test]
    fn test_duplicate_name_is_noop() {
        let mut filter = UrlFilter::new();
        filter.add_rule("rule", rules::reject_extension("png"));
        // Second registration under the same name must not replace the first
        filter.add_rule("rule", Box::new(|_| false));

        assert_eq!(filter.len(), 1);
        assert!(filter.is_allowed(&url("http://example.com/page")));
    }

    #[test]
    fn test_remove_rule() {
        let mut filter = UrlFilter::new();
        filter.add_rule("reject-fragment", rules::reject_fragment());
        assert!(!filter.is_allowed(&url("http://example.com/#x")));

        filter.remove_rule("reject-fragment");
        assert!(filter.is_empty());
        assert!(filter.is_allowed(&url("http://example.com/#x")));
    }
}
