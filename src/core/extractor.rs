//! Link recognition over free-form message text.
//!
//! Recognizes two families of links:
//! - Instagram reels and posts (`/reel/<id>`, `/p/<id>`), including the
//!   `instagr.am` short domain
//! - Twitter / X status links (`/<user>/status/<numeric id>`)
//!
//! The scheme is optional in the input; every result is normalized to
//! `https://`.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use crate::domain::{HostCategory, SourceLink};

// A link must start the text or follow a character that cannot be part of
// a URL, so `my-instagram.com` or `evil.example/x.com` never match. The link
// itself is capture group 1.
const INSTAGRAM_PATTERN: &str =
    r"(?:^|[^\w.\-/@])((?:https?://)?(?:www\.)?(?:instagram\.com|instagr\.am)/(?:reel|p)/[A-Za-z0-9_-]+)";

const TWITTER_PATTERN: &str =
    r"(?:^|[^\w.\-/@])((?:https?://)?(?:www\.)?(?:twitter\.com|x\.com)/\w+/status/\d+)";

/// Precompiled link matchers
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    matchers: Vec<(HostCategory, Regex)>,
}

impl LinkExtractor {
    /// Compile the matchers
    pub fn new() -> Result<Self> {
        let matchers = [
            (HostCategory::Instagram, INSTAGRAM_PATTERN),
            (HostCategory::Twitter, TWITTER_PATTERN),
        ]
        .into_iter()
        .map(|(category, pattern)| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("Failed to compile {} link pattern", category))
                .map(|re| (category, re))
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self { matchers })
    }

    /// Find all supported links in `text`.
    ///
    /// Identical normalized URLs collapse to one entry. The order follows
    /// the matcher families, then position in the text.
    pub fn extract(&self, text: &str) -> Vec<SourceLink> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for (category, matcher) in &self.matchers {
            for found in matcher.captures_iter(text).filter_map(|c| c.get(1)) {
                let link = SourceLink::new(found.as_str(), *category);
                if seen.insert(link.url().to_string()) {
                    links.push(link);
                }
            }
        }

        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(text: &str) -> Vec<String> {
        let extractor = LinkExtractor::new().unwrap();
        extractor
            .extract(text)
            .into_iter()
            .map(|l| l.url().to_string())
            .collect()
    }

    #[test]
    fn test_no_links() {
        assert!(urls("no links here").is_empty());
        assert!(urls("").is_empty());
    }

    #[test]
    fn test_instagram_reel() {
        assert_eq!(
            urls("check https://instagram.com/reel/ABC123 out"),
            vec!["https://instagram.com/reel/ABC123"]
        );
    }

    #[test]
    fn test_instagram_post_with_www_and_no_scheme() {
        assert_eq!(
            urls("www.instagram.com/p/Xy_-9z"),
            vec!["https://www.instagram.com/p/Xy_-9z"]
        );
    }

    #[test]
    fn test_case_insensitive_hosts() {
        let found = urls("HTTPS://WWW.INSTAGRAM.COM/REEL/abc and https://X.com/Someone/STATUS/42");
        assert_eq!(found.len(), 2);
        assert!(found.contains(&"https://WWW.INSTAGRAM.COM/REEL/abc".to_string()));
        assert!(found.contains(&"https://X.com/Someone/STATUS/42".to_string()));
    }

    #[test]
    fn test_twitter_and_x_status() {
        let found = urls("https://twitter.com/jack/status/20 and x.com/elon/status/123456");
        assert_eq!(
            found,
            vec![
                "https://twitter.com/jack/status/20",
                "https://x.com/elon/status/123456"
            ]
        );
    }

    #[test]
    fn test_status_requires_numeric_id() {
        assert!(urls("https://x.com/user/status/abc").is_empty());
    }

    #[test]
    fn test_domain_suffix_does_not_match() {
        assert!(urls("https://dropbox.com/user/status/123").is_empty());
    }

    #[test]
    fn test_hyphenated_lookalike_hosts_do_not_match() {
        assert!(urls("https://my-instagram.com/reel/Z").is_empty());
        assert!(urls("my-instagram.com/reel/Z").is_empty());
        assert!(urls("https://a-x.com/u/status/1").is_empty());
    }

    #[test]
    fn test_supported_host_inside_other_url_does_not_match() {
        assert!(urls("https://evil.example/x.com/u/status/3").is_empty());
        assert!(urls("https://cdn.example/instagram.com/reel/Q").is_empty());
        assert!(urls("me@x.com/u/status/4").is_empty());
    }

    #[test]
    fn test_links_after_punctuation_match() {
        assert_eq!(
            urls("(https://x.com/u/status/5) \"instagram.com/p/R\""),
            vec!["https://instagram.com/p/R", "https://x.com/u/status/5"]
        );
        assert_eq!(
            urls("https://x.com/u/status/6 https://x.com/u/status/7"),
            vec!["https://x.com/u/status/6", "https://x.com/u/status/7"]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let found = urls(
            "https://instagram.com/reel/A instagram.com/reel/A http://instagram.com/reel/A",
        );
        assert_eq!(found, vec!["https://instagram.com/reel/A"]);
    }

    #[test]
    fn test_categories() {
        let extractor = LinkExtractor::new().unwrap();
        let links = extractor.extract("instagr.am/p/q1 twitter.com/a/status/1");
        assert_eq!(links[0].category(), HostCategory::Instagram);
        assert_eq!(links[1].category(), HostCategory::Twitter);
    }
}
