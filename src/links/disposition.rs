//! Hyperlink disposition.
//!
//! Every hyperlink pulled from a detail page gets exactly one disposition,
//! decided by a single ordered classification so the rules are testable
//! apart from any fetching.

use regex::Regex;

use crate::config::DispositionConfig;

/// What to do with one raw hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDisposition {
    /// A "Server N" mirror page whose content must be scraped once more;
    /// never shown to the user directly.
    Server { url: String },
    /// A user-facing action button, expanded only on demand.
    Interactive { label: String, url: String },
    /// A candidate download link, resolved and categorized inline.
    Direct { url: String },
}

/// Ordered link classification rules.
pub struct LinkClassifier {
    server_pattern: Regex,
    secondary_domains: Vec<String>,
    text_markers: Vec<String>,
    quality_markers: Vec<String>,
}

impl LinkClassifier {
    /// Build a classifier from config. An invalid server pattern falls back
    /// to the built-in default.
    pub fn new(config: &DispositionConfig) -> Self {
        let server_pattern = Regex::new(&config.server_pattern)
            .unwrap_or_else(|_| Regex::new(r"(?i)server\s*\d+").expect("default server pattern compiles"));

        Self {
            server_pattern,
            secondary_domains: lowercase_all(&config.secondary_domains),
            text_markers: lowercase_all(&config.text_markers),
            quality_markers: lowercase_all(&config.quality_markers),
        }
    }

    /// Classify one hyperlink by its visible text and absolute URL.
    pub fn classify(&self, text: &str, url: &str) -> LinkDisposition {
        let text = text.trim();
        if self.server_pattern.is_match(text) {
            return LinkDisposition::Server {
                url: url.to_string(),
            };
        }

        let text_lower = text.to_lowercase();
        let url_lower = url.to_lowercase();
        let interactive = self
            .secondary_domains
            .iter()
            .any(|domain| url_lower.contains(domain.as_str()))
            || self
                .text_markers
                .iter()
                .any(|marker| text_lower.contains(marker.as_str()))
            || self
                .quality_markers
                .iter()
                .any(|marker| text_lower.contains(marker.as_str()));

        if interactive {
            let label = if text.is_empty() {
                url.to_string()
            } else {
                text.to_string()
            };
            return LinkDisposition::Interactive {
                label,
                url: url.to_string(),
            };
        }

        LinkDisposition::Direct {
            url: url.to_string(),
        }
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}
