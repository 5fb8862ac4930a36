//! Standard filter rule library
//!
//! Each constructor returns a boxed predicate for registration into a
//! [`UrlFilter`](crate::filter::UrlFilter). Rules are pure except for
//! captured references to collaborators (the visited set).

use crate::filter::{recurrence_count, RulePredicate, RECURSION_REPETITION_THRESHOLD};
use crate::store::VisitedSet;
use std::sync::Arc;

/// Rejects URLs whose path ends with `.extension` (case-sensitive)
pub fn reject_extension(extension: &str) -> RulePredicate {
    let suffix = format!(".{}", extension);
    Box::new(move |url| !url.path().ends_with(&suffix))
}

/// Rejects URLs carrying a non-empty fragment
pub fn reject_fragment() -> RulePredicate {
    Box::new(|url| url.fragment().map_or(true, str::is_empty))
}

/// Rejects URLs whose scheme equals the given one, case-insensitively
pub fn reject_scheme(scheme: &str) -> RulePredicate {
    let scheme = scheme.to_ascii_lowercase();
    Box::new(move |url| !url.scheme().eq_ignore_ascii_case(&scheme))
}

/// Rejects URLs whose trailing pattern recurs more than the threshold,
/// heuristically catching infinitely-recursive crawl traps
pub fn reject_recursive() -> RulePredicate {
    Box::new(|url| recurrence_count(url.as_str()) <= RECURSION_REPETITION_THRESHOLD)
}

/// Rejects URLs already present in the visited set.
///
/// A set lookup failure logs and passes the URL through; duplicate work is
/// preferred over dropping it.
pub fn reject_visited(set: Arc<dyn VisitedSet>) -> RulePredicate {
    Box::new(move |url| match set.contains(url.as_str()) {
        Ok(seen) => !seen,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "visited-set lookup failed");
            true
        }
    })
}

/// Accepts only URLs whose canonical string contains the given substring
pub fn require_substring(needle: &str) -> RulePredicate {
    let needle = needle.to_string();
    Box::new(move |url| url.as_str().contains(&needle))
}

/// Rejects URLs carrying a non-empty query string
pub fn reject_query() -> RulePredicate {
    Box::new(|url| url.query().map_or(true, str::is_empty))
}
