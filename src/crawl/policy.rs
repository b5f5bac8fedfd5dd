// src/crawl/policy.rs
// =============================================================================
// Decides which URLs the crawler is allowed to fetch.
//
// A URL is skipped when ANY of these hold:
// - it points at a binary/media file (pdf, images, archives, css, js, ...)
// - it uses a non-page scheme (mailto:, tel:, javascript:)
// - its path starts with a robots.txt Disallow prefix
// =============================================================================

use url::Url;

// File extensions that never lead to an HTML page
const SKIP_EXTENSIONS: &[&str] = &[
    // documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".webp",
    // archives and installers
    ".zip", ".exe", ".dmg",
    // audio / video
    ".mp4", ".mp3", ".avi", ".mov",
    // stylesheets and scripts
    ".css", ".js",
];

const SKIP_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:"];

// Returns true if the crawler must not fetch this URL
//
// Parameters:
//   url: absolute (normalized) URL
//   disallowed_paths: path prefixes collected from robots.txt
pub fn should_skip(url: &str, disallowed_paths: &[String]) -> bool {
    has_skipped_extension(url) || has_skipped_scheme(url) || is_disallowed(url, disallowed_paths)
}

// Extension check on the lowercased URL
//
// The hostname is left out of the match so a site like "vue.js.org" can
// still be crawled; path and query are searched. An extension only counts
// when it ends a segment: "/app.js" and "/app.js?v=2" are skipped,
// "/index.jsp" and "/feed.json" are not.
fn has_skipped_extension(url: &str) -> bool {
    let haystack = match Url::parse(url) {
        Ok(parsed) => {
            let mut rest = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                rest.push('?');
                rest.push_str(query);
            }
            rest.to_lowercase()
        }
        Err(_) => url.to_lowercase(),
    };

    SKIP_EXTENSIONS.iter().any(|ext| {
        haystack.match_indices(*ext).any(|(start, _)| {
            let next = haystack[start + ext.len()..].chars().next();
            !next.is_some_and(|c| c.is_ascii_alphanumeric())
        })
    })
}

fn has_skipped_scheme(url: &str) -> bool {
    let lower = url.to_lowercase();
    SKIP_SCHEMES.iter().any(|scheme| lower.contains(scheme))
}

// Prefix match of the URL path against robots.txt rules
pub fn is_disallowed(url: &str, disallowed_paths: &[String]) -> bool {
    if disallowed_paths.is_empty() {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => {
            let path = parsed.path();
            disallowed_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
        }
        Err(_) => false,
    }
}
