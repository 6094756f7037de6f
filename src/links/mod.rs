//! Link identity, classification, and pooling.

mod disposition;
mod fingerprint;
mod hosts;
mod normalize;
mod text_urls;

pub use disposition::{LinkClassifier, LinkDisposition};
pub use fingerprint::Fingerprinter;
pub use hosts::{HostClassifier, OTHER_CATEGORY};
pub use normalize::{normalize_url, resolve_href};
pub use text_urls::find_bare_urls;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

/// Download links bucketed by host category. Within a bucket, insertion
/// order is discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorizedLinks {
    buckets: BTreeMap<String, Vec<String>>,
}

impl CategorizedLinks {
    /// Append a URL to a category bucket.
    pub fn push(&mut self, category: &str, url: String) {
        self.buckets.entry(category.to_string()).or_default().push(url);
    }

    /// URLs in a category, empty if absent.
    pub fn get(&self, category: &str) -> &[String] {
        self.buckets.get(category).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|v| v.is_empty())
    }

    /// Total number of links across all buckets.
    pub fn total(&self) -> usize {
        self.buckets.values().map(|v| v.len()).sum()
    }

    /// Iterate buckets in category name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets
            .iter()
            .map(|(name, urls)| (name.as_str(), urls.as_slice()))
    }

    /// Non-empty buckets in display order: the preferred ordering first,
    /// then `other`, then remaining categories.
    pub fn ordered<'a>(&'a self, display_order: &[String]) -> Vec<(&'a str, &'a [String])> {
        let mut out: Vec<(&str, &[String])> = Vec::new();
        let mut taken: HashSet<&str> = HashSet::new();

        for name in display_order {
            if let Some((key, urls)) = self.buckets.get_key_value(name) {
                if !urls.is_empty() {
                    out.push((key.as_str(), urls.as_slice()));
                    taken.insert(key.as_str());
                }
            }
        }
        if let Some(urls) = self.buckets.get(OTHER_CATEGORY) {
            if !urls.is_empty() {
                out.push((OTHER_CATEGORY, urls.as_slice()));
                taken.insert(OTHER_CATEGORY);
            }
        }
        for (name, urls) in &self.buckets {
            if !urls.is_empty() && !taken.contains(name.as_str()) {
                out.push((name.as_str(), urls.as_slice()));
            }
        }
        out
    }
}

/// User-facing action links keyed by label. The first occurrence of a
/// label wins; insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractiveLinks {
    entries: Vec<(String, String)>,
}

impl InteractiveLinks {
    /// Insert a labeled link; returns false when the label already exists.
    pub fn insert(&mut self, label: &str, url: &str) -> bool {
        if self.contains(label) {
            return false;
        }
        self.entries.push((label.to_string(), url.to_string()));
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(l, _)| l.as_str() == label)
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l.as_str() == label)
            .map(|(_, url)| url.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, u)| (l.as_str(), u.as_str()))
    }
}

/// Fingerprint-keyed pool of discovered links, insertion ordered.
///
/// The pool is the single dedup point for a detail scrape: direct links
/// and server-expanded links merge here, so no two entries ever share a
/// fingerprint.
#[derive(Debug, Default)]
pub struct LinkPool {
    seen: HashSet<String>,
    entries: Vec<(String, String)>,
}

impl LinkPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a URL under its fingerprint; returns false when the
    /// fingerprint is already pooled.
    pub fn insert(&mut self, fingerprint: String, url: String) -> bool {
        if !self.seen.insert(fingerprint.clone()) {
            return false;
        }
        self.entries.push((fingerprint, url));
        true
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.seen.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, url)| url.as_str())
    }

    /// Bucket every pooled URL by host category; unmatched URLs land under
    /// [`OTHER_CATEGORY`].
    pub fn categorize(&self, classifier: &HostClassifier) -> CategorizedLinks {
        let mut links = CategorizedLinks::default();
        for (_, url) in &self.entries {
            links.push(classifier.classify(url), url.clone());
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn pool_deduplicates_by_fingerprint() {
        let mut pool = LinkPool::new();
        assert!(pool.insert("gofile_A".to_string(), "https://gofile.io/d/A".to_string()));
        assert!(!pool.insert("gofile_A".to_string(), "https://gofile.io/d/A?x=1".to_string()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn categorize_buckets_unmatched_as_other() {
        let classifier = HostClassifier::new(&EngineConfig::default().host_categories);
        let mut pool = LinkPool::new();
        pool.insert("a".to_string(), "https://gofile.io/d/A".to_string());
        pool.insert("b".to_string(), "https://mystery.example/x".to_string());

        let links = pool.categorize(&classifier);
        assert_eq!(links.get("gofile"), ["https://gofile.io/d/A"]);
        assert_eq!(links.get(OTHER_CATEGORY), ["https://mystery.example/x"]);
    }

    #[test]
    fn interactive_first_label_wins() {
        let mut links = InteractiveLinks::default();
        assert!(links.insert("Watch Online", "https://a.example/1"));
        assert!(!links.insert("Watch Online", "https://a.example/2"));
        assert_eq!(links.get("Watch Online"), Some("https://a.example/1"));
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn ordered_puts_preferred_first_and_other_before_stragglers() {
        let mut links = CategorizedLinks::default();
        links.push("zeta", "https://z.example/1".to_string());
        links.push(OTHER_CATEGORY, "https://o.example/1".to_string());
        links.push("gofile", "https://gofile.io/d/A".to_string());

        let order = vec!["gofile".to_string(), "streamtape".to_string()];
        let ordered = links.ordered(&order);
        let names: Vec<&str> = ordered.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["gofile", OTHER_CATEGORY, "zeta"]);
    }
}
