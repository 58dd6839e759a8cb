//! Utility functions and helpers.

pub mod http;
pub mod rate_limit;
pub mod retry;

use url::Url;
use url::form_urlencoded;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Percent-encode a query value (`+` for spaces).
pub fn encode_query(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Fill `{term}`, `{location}`, `{page}` (1-based) and `{start}` in a search URL.
pub fn fill_search_url(template: &str, term: &str, location: &str, page: u32, page_size: u32) -> String {
    template
        .replace("{term}", &encode_query(term))
        .replace("{location}", &encode_query(location))
        .replace("{page}", &(page + 1).to_string())
        .replace("{start}", &(page * page_size).to_string())
}

/// Lowercase ASCII slug for file names; runs of other characters become `_`.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "all".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://weworkremotely.com/remote-jobs/search").unwrap();
        assert_eq!(
            resolve_url(&base, "/remote-jobs/acme-rust-dev"),
            "https://weworkremotely.com/remote-jobs/acme-rust-dev"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_fill_search_url() {
        let url = fill_search_url(
            "https://www.indeed.com/jobs?q={term}&l={location}&start={start}&p={page}",
            "rust engineer",
            "New York, NY",
            2,
            10,
        );
        assert_eq!(
            url,
            "https://www.indeed.com/jobs?q=rust+engineer&l=New+York%2C+NY&start=20&p=3"
        );
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Software Engineer"), "software_engineer");
        assert_eq!(slug("  New York, NY "), "new_york_ny");
        assert_eq!(slug("---"), "all");
    }
}
