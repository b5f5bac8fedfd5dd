// src/crawl/normalize.rs
// =============================================================================
// URL canonicalization helpers.
//
// Every URL the crawler stores goes through `normalize_url` first, so two
// spellings of the same page ("/about", "/about/", "/about#team") collapse
// into one key and the discovered set can dedupe by plain string equality.
//
// Rust concepts:
// - Option<T>: Malformed hrefs return None instead of an error
// - Url::join: Resolves a relative href the same way a browser does
// =============================================================================

use url::Url;

use crate::error::CrawlError;

// Canonicalizes an href relative to the page it was found on
//
// Parameters:
//   href: raw href value (relative, protocol-relative or absolute)
//   base: URL of the page containing the link
//
// Returns: Some(canonical_url) or None if either input is malformed
//
// Examples:
//   base = "https://example.com/blog/"
//   href = "post#comments"         -> Some("https://example.com/blog/post")
//   href = "//example.com/about/"  -> Some("https://example.com/about")
//   href = "/"                     -> Some("https://example.com/")
pub fn normalize_url(href: &str, base: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let mut url = base.join(href.trim()).ok()?;

    url.set_fragment(None);

    if !url.cannot_be_a_base() {
        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            // Trimming every trailing slash keeps the function idempotent
            // for paths like "/docs//"
            let trimmed = path.trim_end_matches('/');
            let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
            url.set_path(&trimmed);
        }
    }

    Some(url.to_string())
}

// Turns user input into the absolute seed URL of a job
//
// "example.com" has no scheme, so "https://" is prepended before parsing.
// The result must be http(s) and carry a host.
pub fn resolve_seed(raw: &str) -> Result<Url, CrawlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CrawlError::InvalidSeed("empty URL".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| CrawlError::InvalidSeed(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CrawlError::InvalidSeed(format!(
            "'{}': unsupported scheme {}",
            raw,
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(CrawlError::InvalidSeed(format!("'{}': URL has no host", raw))),
    }

    // Run the seed through the same canonical form as discovered links
    let normalized = normalize_url(url.as_str(), url.as_str())
        .ok_or_else(|| CrawlError::InvalidSeed(raw.to_string()))?;
    Url::parse(&normalized).map_err(|e| CrawlError::InvalidSeed(format!("'{}': {}", raw, e)))
}

// Checks whether a URL belongs to the crawl's site
//
// Hostname equality only: ports and schemes are not compared, and
// subdomains count as different sites.
pub fn is_same_domain(url: &str, base_domain: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.host_str() == Some(base_domain),
        Err(_) => false,
    }
}

// Path shown in Log events ("Crawling /about")
pub fn display_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_link() {
        let result = normalize_url("/docs", "https://example.com/page");
        assert_eq!(result, Some("https://example.com/docs".to_string()));
    }

    #[test]
    fn test_resolve_protocol_relative_link() {
        let result = normalize_url("//example.com/about/", "https://example.com/");
        assert_eq!(result, Some("https://example.com/about".to_string()));
    }

    #[test]
    fn test_strips_fragment_and_trailing_slash() {
        let result = normalize_url("/team/#people", "https://example.com");
        assert_eq!(result, Some("https://example.com/team".to_string()));
    }

    #[test]
    fn test_keeps_root_slash() {
        let result = normalize_url("https://example.com/", "https://example.com");
        assert_eq!(result, Some("https://example.com/".to_string()));
    }

    #[test]
    fn test_keeps_query_string() {
        let result = normalize_url("/search/?q=rust#top", "https://example.com");
        assert_eq!(result, Some("https://example.com/search?q=rust".to_string()));
    }

    #[test]
    fn test_malformed_input_is_none() {
        assert_eq!(normalize_url("/about", "not a base"), None);
        assert_eq!(normalize_url("http://[::1", "https://example.com"), None);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "https://example.com",
            "https://example.com/about/",
            "https://example.com/docs//",
            "https://example.com/a/b/?x=1#frag",
            "http://127.0.0.1:8080/path/",
        ];
        for input in inputs {
            let once = normalize_url(input, input).unwrap();
            let twice = normalize_url(&once, input).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_seed_gets_scheme() {
        let seed = resolve_seed("example.com").unwrap();
        assert_eq!(seed.as_str(), "https://example.com/");
        assert_eq!(seed.host_str(), Some("example.com"));
    }

    #[test]
    fn test_seed_rejects_garbage() {
        assert!(resolve_seed("not a url and no scheme???").is_err());
        assert!(resolve_seed("").is_err());
        assert!(resolve_seed("ftp://example.com").is_err());
    }

    #[test]
    fn test_same_domain_is_hostname_equality() {
        assert!(is_same_domain("https://example.com/x", "example.com"));
        assert!(is_same_domain("http://example.com:8080/x", "example.com"));
        assert!(!is_same_domain("https://blog.example.com/x", "example.com"));
        assert!(!is_same_domain("mailto:x@example.com", "example.com"));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path("https://example.com/"), "/");
        assert_eq!(display_path("https://example.com/about"), "/about");
    }
}
