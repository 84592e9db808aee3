//! Links recognized in chat messages.

use serde::{Deserialize, Serialize};

/// Host family a link was recognized under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostCategory {
    /// instagram.com / instagr.am reels and posts
    Instagram,

    /// twitter.com / x.com status links
    Twitter,
}

impl std::fmt::Display for HostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostCategory::Instagram => write!(f, "instagram"),
            HostCategory::Twitter => write!(f, "twitter"),
        }
    }
}

/// A supported video-post link, normalized to an absolute `https://` URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLink {
    url: String,
    category: HostCategory,
}

impl SourceLink {
    /// Create a link from a raw match, prefixing `https://` when no scheme
    /// is present and rewriting `http://` to `https://`
    pub fn new(raw: &str, category: HostCategory) -> Self {
        let lower = raw.to_ascii_lowercase();
        let rest = if lower.starts_with("https://") {
            &raw[8..]
        } else if lower.starts_with("http://") {
            &raw[7..]
        } else {
            raw
        };

        Self {
            url: format!("https://{}", rest),
            category,
        }
    }

    /// The normalized URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Host family this link was matched under
    pub fn category(&self) -> HostCategory {
        self.category
    }
}

impl std::fmt::Display for SourceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}
