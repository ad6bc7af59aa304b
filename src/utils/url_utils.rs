//! URL normalization and link resolution utilities.
//!
//! The normalized form produced here is the identity of a page for the whole
//! crawl: two URLs that normalize to the same string are the same page.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// Normalize a URL for deduplication
///
/// Strips the fragment and any trailing slashes from the path, except when
/// the path is the root. The function is idempotent.
///
/// Returns `None` when the input does not parse as an absolute URL.
///
/// # Examples
/// ```
/// use ghostcrawl::utils::normalize_url;
///
/// assert_eq!(normalize_url("https://x.com/a/#top").as_deref(), Some("https://x.com/a"));
/// assert_eq!(normalize_url("https://x.com/").as_deref(), Some("https://x.com/"));
/// ```
#[must_use]
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    url.set_fragment(None);
    normalize_parsed(&mut url);
    Some(url.to_string())
}

fn normalize_parsed(url: &mut Url) {
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        let trimmed = trimmed.to_string();
        url.set_path(&trimmed);
    }
}

/// Resolve an href found on `base` into a normalized absolute URL
///
/// `javascript:`, `mailto:` and pure-fragment links are discarded, as is
/// anything that fails to resolve.
#[must_use]
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.get(..11).unwrap_or(href).to_ascii_lowercase();
    if lowered.starts_with("javascript:") || lowered.starts_with("mailto:") {
        return None;
    }

    let mut joined = base.join(href).ok()?;
    joined.set_fragment(None);
    normalize_parsed(&mut joined);
    Some(joined.to_string())
}

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Last two dot-separated labels of a host
///
/// Deliberately naive: `shop.example.co.uk` yields `co.uk`.
#[must_use]
pub fn registrable_suffix(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() > 2 {
        labels[labels.len() - 2..].join(".")
    } else {
        host.to_string()
    }
}

/// Read newline-separated URLs from a file
///
/// Blank lines and `#` comments are skipped.
pub fn load_url_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("URL file not found: {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Deduplicate URLs preserving first-seen order
#[must_use]
pub fn dedup_preserving_order<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_variants_normalize_identically() {
        let a = normalize_url("https://x.com/page#one");
        let b = normalize_url("https://x.com/page#two");
        let c = normalize_url("https://x.com/page");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn trailing_slash_stripped_except_root() {
        assert_eq!(normalize_url("https://x.com/").as_deref(), Some("https://x.com/"));
        assert_eq!(normalize_url("https://x.com").as_deref(), Some("https://x.com/"));
        assert_eq!(normalize_url("https://x.com/a/").as_deref(), Some("https://x.com/a"));
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "https://x.com/a//",
            "https://x.com/a/?q=1#frag",
            "http://x.com/",
            "https://x.com/deep/path/",
        ] {
            let once = normalize_url(raw).unwrap();
            let twice = normalize_url(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }

    #[test]
    fn resolve_discards_non_navigational_links() {
        let base = Url::parse("https://x.com/docs/intro").unwrap();
        assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base, "JavaScript:alert(1)"), None);
        assert_eq!(resolve_link(&base, "mailto:a@x.com"), None);
        assert_eq!(resolve_link(&base, "#section"), None);
        assert_eq!(resolve_link(&base, "   "), None);
    }

    #[test]
    fn resolve_relative_links_against_base() {
        let base = Url::parse("https://x.com/docs/intro").unwrap();
        assert_eq!(
            resolve_link(&base, "setup/").as_deref(),
            Some("https://x.com/docs/setup")
        );
        assert_eq!(
            resolve_link(&base, "/about#team").as_deref(),
            Some("https://x.com/about")
        );
        assert_eq!(
            resolve_link(&base, "https://other.test/x").as_deref(),
            Some("https://other.test/x")
        );
    }

    #[test]
    fn registrable_suffix_is_last_two_labels() {
        assert_eq!(registrable_suffix("shop.example.com"), "example.com");
        assert_eq!(registrable_suffix("example.com"), "example.com");
        assert_eq!(registrable_suffix("localhost"), "localhost");
        assert_eq!(registrable_suffix("shop.example.co.uk"), "co.uk");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let urls = vec![
            "https://a.test".to_string(),
            "https://b.test".to_string(),
            "https://a.test".to_string(),
        ];
        assert_eq!(
            dedup_preserving_order(urls),
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
    }
}
