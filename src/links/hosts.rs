//! Hosting-provider categorization by domain fragment.

use crate::config::HostCategoryConfig;

/// Sentinel category for URLs matching no known host.
pub const OTHER_CATEGORY: &str = "other";

/// Maps URLs to host categories via case-insensitive substring matching.
/// Table order is match order.
pub struct HostClassifier {
    categories: Vec<(String, Vec<String>)>,
}

impl HostClassifier {
    /// Build a classifier from the configured category table.
    pub fn new(table: &[HostCategoryConfig]) -> Self {
        let categories = table
            .iter()
            .map(|category| {
                (
                    category.name.clone(),
                    category
                        .fragments
                        .iter()
                        .map(|f| f.to_lowercase())
                        .collect(),
                )
            })
            .collect();
        Self { categories }
    }

    /// The first category with a fragment occurring in the URL, if any.
    pub fn matched_category(&self, url: &str) -> Option<&str> {
        let lower = url.to_lowercase();
        self.categories
            .iter()
            .find(|(_, fragments)| fragments.iter().any(|f| lower.contains(f.as_str())))
            .map(|(name, _)| name.as_str())
    }

    /// Category for the URL, or [`OTHER_CATEGORY`].
    pub fn classify(&self, url: &str) -> &str {
        self.matched_category(url).unwrap_or(OTHER_CATEGORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn classifier() -> HostClassifier {
        HostClassifier::new(&EngineConfig::default().host_categories)
    }

    #[test]
    fn classifies_known_hosts() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("https://gofile.io/d/AbC123?utm_source=x"),
            "gofile"
        );
        assert_eq!(
            classifier.classify("https://STREAMTAPE.TO/v/xYz789"),
            "streamtape"
        );
        assert_eq!(
            classifier.classify("https://www.1024tera.com/sharing/link"),
            "terabox"
        );
    }

    #[test]
    fn unknown_host_is_other() {
        let classifier = classifier();
        assert_eq!(classifier.classify("https://mystery.example/x"), OTHER_CATEGORY);
        assert_eq!(classifier.matched_category("https://mystery.example/x"), None);
    }

    #[test]
    fn specific_fragments_win_over_general() {
        let table = vec![
            HostCategoryConfig {
                name: "gdflix".to_string(),
                fragments: vec!["gdflix.".to_string()],
            },
            HostCategoryConfig {
                name: "gdrive".to_string(),
                fragments: vec!["drive.google.com".to_string()],
            },
        ];
        let classifier = HostClassifier::new(&table);
        assert_eq!(
            classifier.classify("https://new7.gdflix.net/file/AbC"),
            "gdflix"
        );
    }
}
