//! Page extractor
//!
//! A pure pass over raw page text that produces the outbound links and the
//! email addresses found in it. Link discovery is a forward scan for
//! `href="..."` attributes rather than a full HTML parse; pages in the wild
//! are malformed often enough that the scan is both faster and more
//! forgiving.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use url::Url;

static BASE_HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)base href="([^"]*)""#).unwrap());

// Permissive on purpose: catches addresses embedded in text without
// validating deliverability
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,4}\b").unwrap());

/// An email address captured verbatim from page text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Wraps a raw captured address; no normalization is applied
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The address text as it appeared on the page
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything harvested from one page
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Resolved outbound links, in document order
    pub links: Vec<Url>,

    /// Email addresses, in document order, duplicates preserved
    pub emails: Vec<EmailAddress>,
}

/// Extracts links and email addresses from raw page text.
///
/// `page_url` is the address the text was fetched from; it anchors relative
/// link resolution.
pub fn extract(html: &str, page_url: &Url) -> Extraction {
    Extraction {
        links: extract_links(html, page_url),
        emails: extract_emails(html),
    }
}

/// Scans for every `href="..."` attribute and resolves each value to an
/// absolute URL.
fn extract_links(html: &str, page_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    // An optional base href declaration anchors relative values that don't
    // start with a slash
    let base_match = BASE_HREF_RE.captures(html).map(|caps| caps.get(1).unwrap());
    let base_href = base_match.map(|m| m.as_str());
    let base_value_start = base_match.map(|m| m.start());

    let mut start = 0;
    while let Some((value, next)) = next_href_value(html, start) {
        let value_start = next - value.len();
        start = next;

        // The base declaration's own href is an anchor, not a link
        if Some(value_start) == base_value_start {
            continue;
        }

        let Some(resolved) = resolve_link(value, page_url, base_href) else {
            continue;
        };

        match Url::parse(&resolved) {
            Ok(link) => {
                tracing::debug!(link = %link, page = %page_url, "found link");
                links.push(link);
            }
            Err(e) => {
                tracing::debug!(link = %resolved, page = %page_url, error = %e, "matched an invalid link");
            }
        }
    }

    links
}

/// Finds the next `href="..."` (attribute name matched case-insensitively)
/// at or after `start`.
///
/// Returns the attribute value and the offset to continue scanning from.
/// A value with no closing quote runs to the end of the text.
fn next_href_value(html: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = html.as_bytes();
    let mut i = start;

    while i + 6 <= bytes.len() {
        if bytes[i..i + 4].eq_ignore_ascii_case(b"href") && &bytes[i + 4..i + 6] == b"=\"" {
            let value_start = i + 6;
            let value_end = bytes[value_start..]
                .iter()
                .position(|&b| b == b'"')
                .map_or(bytes.len(), |off| value_start + off);
            // Slice boundaries sit on ASCII bytes, so they are char
            // boundaries even in non-ASCII documents
            return Some((&html[value_start..value_end], value_end));
        }
        i += 1;
    }

    None
}

/// Applies the skip rules and resolves a raw href value against the page
/// URL and optional base href. Returns `None` for values that must not be
/// emitted.
fn resolve_link(raw: &str, page_url: &Url, base_href: Option<&str>) -> Option<String> {
    if raw.is_empty()
        || raw.starts_with("mailto:")
        || raw.starts_with("javascript:")
        || raw.starts_with('#')
    {
        return None;
    }

    let mut link = raw.to_string();

    // Scheme-relative: inherit the page's scheme
    if link.starts_with("//") {
        link = format!("{}:{}", page_url.scheme(), link);
    }

    if is_relative(&link) {
        link = match base_href {
            // A base href anchors relative values that aren't host-rooted
            Some(base) if !link.starts_with('/') => format!("{}{}", base, link),
            _ => make_absolute(page_url, &link),
        };
    }

    Some(link)
}

fn is_relative(link: &str) -> bool {
    !link.starts_with("http")
}

/// Expands a relative link against the origin page URL.
///
/// A leading slash resolves against the host root. Otherwise the origin's
/// path contributes all of its segments except the last, unless it already
/// ends in a slash, in which case every segment is kept.
fn make_absolute(origin: &Url, relative: &str) -> String {
    let mut absolute = format!(
        "{}://{}/",
        origin.scheme(),
        origin.host_str().unwrap_or("")
    );

    if let Some(rooted) = relative.strip_prefix('/') {
        absolute.push_str(rooted);
    } else {
        let path = origin.path();
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if !path.ends_with('/') {
            segments.pop();
        }
        for segment in segments {
            absolute.push_str(segment);
            absolute.push('/');
        }
        absolute.push_str(relative);
    }

    absolute.replace("/./", "/")
}

/// Scans for email addresses; every match is emitted verbatim, duplicates
/// included. Deduplication belongs to the caller.
fn extract_emails(html: &str) -> Vec<EmailAddress> {
    EMAIL_RE
        .find_iter(html)
        .map(|m| {
            tracing::debug!(email = m.as_str(), "found email");
            EmailAddress::new(m.as_str())
        })
        .collect()
}
