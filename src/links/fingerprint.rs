//! Dedup identity keys for hosting-provider URLs.
//!
//! Providers embed the same resource at structurally different paths
//! (query-string ids, path segments), so string equality under-deduplicates
//! and a bare hash cannot merge equivalent spellings. Known providers get a
//! structured `{provider}_{id}` key from their id rule; everything else
//! falls back to a hash of the normalized URL.

use regex::Regex;
use sha2::{Digest, Sha256};

use super::normalize::normalize_url;
use crate::config::EngineConfig;

struct ProviderRule {
    provider: String,
    pattern: Regex,
    display_base: Option<String>,
}

/// Derives stable identity keys and display forms for URLs.
pub struct Fingerprinter {
    rules: Vec<ProviderRule>,
    tracking_markers: Vec<String>,
}

impl Fingerprinter {
    /// Compile the provider rules from config; rules with invalid patterns
    /// are skipped.
    pub fn new(config: &EngineConfig) -> Self {
        let rules = config
            .provider_rules
            .iter()
            .filter_map(|rule| {
                let pattern = Regex::new(&rule.pattern).ok()?;
                Some(ProviderRule {
                    provider: rule.provider.clone(),
                    pattern,
                    display_base: rule.display_base.clone(),
                })
            })
            .collect();

        Self {
            rules,
            tracking_markers: config.tracking_markers.clone(),
        }
    }

    /// Canonicalize a URL with the configured tracking markers.
    pub fn normalize(&self, url: &str) -> String {
        normalize_url(url, &self.tracking_markers)
    }

    /// Identity key for deduplication: `{provider}_{id}` when an id rule
    /// matches the normalized URL, else a sha256 digest of it.
    pub fn fingerprint(&self, url: &str) -> String {
        let normalized = self.normalize(url);
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(&normalized) {
                if let Some(id) = caps.get(1) {
                    return format!("{}_{}", rule.provider, id.as_str());
                }
            }
        }
        hex::encode(Sha256::digest(normalized.as_bytes()))
    }

    /// Canonical short form for display. Long URLs of known providers are
    /// reconstructed as `{display_base}/{id}`; everything else passes
    /// through.
    pub fn display_url(&self, url: &str) -> String {
        if url.len() <= 60 {
            return url.to_string();
        }
        for rule in &self.rules {
            let Some(base) = rule.display_base.as_deref() else {
                continue;
            };
            if let Some(caps) = rule.pattern.captures(url) {
                if let Some(id) = caps.get(1) {
                    return format!("{}/{}", base, id.as_str());
                }
            }
        }
        url.to_string()
    }
}
