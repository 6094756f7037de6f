//! Engine configuration tables.
//!
//! Everything provider- or site-specific is data, not code: host category
//! fragments, provider id extraction rules, tracking-parameter markers,
//! link disposition markers, and per-site profiles. Classification logic
//! consumes these tables so that adding a hosting provider or a source
//! site never touches a match arm.

use serde::{Deserialize, Serialize};

/// Engine-wide configuration shared by every site scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Query parameters whose name or value contains one of these markers
    /// are stripped during URL normalization.
    pub tracking_markers: Vec<String>,
    /// Provider id extraction rules, tried in order before the hash
    /// fallback.
    pub provider_rules: Vec<ProviderRuleConfig>,
    /// Host categories in match order. More specific fragments must precede
    /// general ones sharing a parent domain.
    pub host_categories: Vec<HostCategoryConfig>,
    /// Preferred category ordering for display. Categories not listed here
    /// sort after these; `other` always sorts last.
    pub category_display_order: Vec<String>,
    pub disposition: DispositionConfig,
    pub fetch: FetchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracking_markers: default_tracking_markers(),
            provider_rules: default_provider_rules(),
            host_categories: default_host_categories(),
            category_display_order: default_display_order(),
            disposition: DispositionConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON, filling omitted fields with
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A provider id extraction rule.
///
/// `pattern` must contain one capture group matching the provider's
/// internal file/object id. `display_base`, when present, reconstructs a
/// canonical short URL for display as `{display_base}/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRuleConfig {
    pub provider: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_base: Option<String>,
}

/// A host category with its known domain fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostCategoryConfig {
    pub name: String,
    pub fragments: Vec<String>,
}

/// Markers deciding how a detail-page hyperlink is dispositioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispositionConfig {
    /// Link text matching this pattern marks a mirror page needing a
    /// second scrape.
    pub server_pattern: String,
    /// Domains whose links become user-facing actions that are expanded on
    /// demand rather than inline.
    pub secondary_domains: Vec<String>,
    /// Substrings of link text marking a user-facing action.
    pub text_markers: Vec<String>,
    /// Quality/pack/codec markers in link text marking a user-facing
    /// action.
    pub quality_markers: Vec<String>,
}

impl Default for DispositionConfig {
    fn default() -> Self {
        Self {
            server_pattern: r"(?i)server\s*\d+".to_string(),
            secondary_domains: vec!["howblogs.".to_string()],
            text_markers: vec!["drive".to_string(), "watch online".to_string()],
            quality_markers: vec![
                "480p".to_string(),
                "720p".to_string(),
                "1080p".to_string(),
                "2160p".to_string(),
                "4k".to_string(),
                "hevc".to_string(),
                "x264".to_string(),
                "x265".to_string(),
                "10bit".to_string(),
                "pack".to_string(),
                "episode".to_string(),
            ],
        }
    }
}

/// HTTP fetch policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total attempts per URL, including the first.
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds, doubled after each failed
    /// attempt.
    pub backoff_base_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Politeness delay after each successful request, in milliseconds.
    pub request_delay_ms: u64,
    /// User agent override. None selects a rotating browser identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1000,
            timeout_secs: 30,
            request_delay_ms: 0,
            user_agent: None,
        }
    }
}

/// Per-site scraping profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Short site identifier, e.g. "sky".
    pub id: String,
    /// Site root, scheme included, no trailing slash.
    pub base_url: String,
    /// Search path template; `{query}` is replaced with the percent-encoded
    /// query.
    pub search_path: String,
    pub listing: ListingRules,
    /// Regex patterns removed from extracted titles (site name suffixes,
    /// "Full Movie Download" boilerplate).
    pub title_strip: Vec<String>,
    /// Poster selectors tried in order before the URL-marker scan.
    pub poster_selectors: Vec<String>,
    /// URL substrings identifying a poster image in the marker scan.
    pub poster_url_markers: Vec<String>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            id: String::new(),
            base_url: String::new(),
            search_path: "/?s={query}".to_string(),
            listing: ListingRules::default(),
            title_strip: Vec::new(),
            poster_selectors: vec!["img.wp-post-image".to_string()],
            poster_url_markers: vec!["poster".to_string(), "thumb".to_string()],
        }
    }
}

impl SiteProfile {
    /// Build the absolute search URL for a query.
    pub fn search_url(&self, query: &str) -> String {
        let encoded = urlencoding::encode(query);
        let path = self.search_path.replace("{query}", &encoded);
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Heuristic thresholds and conventions for listing pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingRules {
    /// Minimum link text length for a plausible title.
    pub min_title_len: usize,
    /// Path suffixes marking a detail page.
    pub detail_suffixes: Vec<String>,
    /// Path fragments marking a detail page.
    pub detail_fragments: Vec<String>,
}

impl Default for ListingRules {
    fn default() -> Self {
        Self {
            min_title_len: 10,
            detail_suffixes: vec![".html".to_string()],
            detail_fragments: vec!["/movie/".to_string(), "/series/".to_string()],
        }
    }
}

fn default_tracking_markers() -> Vec<String> {
    ["utm_", "ref=", "source=", "campaign=", "views:", "view="]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_provider_rules() -> Vec<ProviderRuleConfig> {
    let rules: &[(&str, &str, &str)] = &[
        ("gofile", r"gofile\.io/d/([A-Za-z0-9]+)", "https://gofile.io/d"),
        (
            "streamtape",
            r"streamtape\.[^/]+/[ve]/([A-Za-z0-9]+)",
            "https://streamtape.to/v",
        ),
        (
            "vikingfile",
            r"vikingfile\.com/f/([A-Za-z0-9]+)",
            "https://vikingfile.com/f",
        ),
        (
            "hubdrive",
            r"hubdrive\.[^/]+/file/([0-9]+)",
            "https://hubdrive.space/file",
        ),
        (
            "hubcloud",
            r"hubcloud\.[^/]+/drive/([A-Za-z0-9]+)",
            "https://hubcloud.fit/drive",
        ),
        (
            "gdflix",
            r"gdflix\.[^/]+/file/([A-Za-z0-9]+)",
            "https://gdflix.dev/file",
        ),
        (
            "filepress",
            r"filepress\.[^/]+/file/([a-f0-9]+)",
            "https://filepress.today/file",
        ),
        ("gdtot", r"gdtot\.[^/]+/file/([0-9]+)", "https://gdtot.lol/file"),
        (
            "pixeldrain",
            r"pixeldrain\.com/u/([A-Za-z0-9]+)",
            "https://pixeldrain.com/u",
        ),
    ];
    rules
        .iter()
        .map(|(provider, pattern, display_base)| ProviderRuleConfig {
            provider: provider.to_string(),
            pattern: pattern.to_string(),
            display_base: Some(display_base.to_string()),
        })
        .collect()
}

fn default_host_categories() -> Vec<HostCategoryConfig> {
    let table: &[(&str, &[&str])] = &[
        ("gofile", &["gofile.io"]),
        ("streamtape", &["streamtape.to", "streamtape.com"]),
        ("terabox", &["terabox.com", "1024tera.com"]),
        ("gdrive", &["drive.google.com"]),
        ("mediafire", &["mediafire.com"]),
        ("mega", &["mega.nz"]),
        ("pixeldrain", &["pixeldrain.com"]),
        ("vikingfile", &["vikingfile.com"]),
        ("gdflix", &["gdflix.dev", "gdflix."]),
        ("hubdrive", &["hubdrive."]),
        ("hubcloud", &["hubcloud."]),
        ("filepress", &["filepress."]),
        ("appdrive", &["appdrive."]),
        ("gdtot", &["gdtot."]),
        ("uptomega", &["uptomega."]),
        ("indishare", &["indishare."]),
    ];
    table
        .iter()
        .map(|(name, fragments)| HostCategoryConfig {
            name: name.to_string(),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
        })
        .collect()
}

fn default_display_order() -> Vec<String> {
    [
        "gofile",
        "streamtape",
        "hubdrive",
        "hubcloud",
        "gdflix",
        "gdtot",
        "filepress",
        "vikingfile",
        "uptomega",
        "indishare",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_tables() {
        let config = EngineConfig::default();
        assert!(!config.tracking_markers.is_empty());
        assert!(!config.provider_rules.is_empty());
        assert!(config.host_categories.iter().any(|c| c.name == "gofile"));
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{"fetch": {"max_attempts": 5}}"#).unwrap();
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(!config.host_categories.is_empty());
    }

    #[test]
    fn search_url_encodes_query() {
        let profile = SiteProfile {
            base_url: "https://films.example".to_string(),
            search_path: "/search.php?search={query}&cat=All".to_string(),
            ..Default::default()
        };
        assert_eq!(
            profile.search_url("iron man"),
            "https://films.example/search.php?search=iron%20man&cat=All"
        );
    }

    #[test]
    fn search_url_trims_base_slash() {
        let profile = SiteProfile {
            base_url: "https://films.example/".to_string(),
            ..Default::default()
        };
        assert_eq!(profile.search_url("dune"), "https://films.example/?s=dune");
    }
}
