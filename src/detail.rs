//! Detail-page parsing, link classification, and server-link expansion.
//!
//! A detail page yields a title, an optional poster, and raw hyperlinks.
//! Each hyperlink gets one disposition: "Server N" mirror pages are
//! collected and expanded with exactly one extra fetch each, user-facing
//! action links are kept as labeled buttons, and everything else is
//! resolved through redirects into the fingerprint-keyed pool.

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SiteProfile;
use crate::fetch::Fetch;
use crate::links::{
    find_bare_urls, resolve_href, CategorizedLinks, Fingerprinter, HostClassifier,
    InteractiveLinks, LinkClassifier, LinkDisposition, LinkPool,
};

/// Title sentinel when a page yields none.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Everything mined from one detail page.
///
/// Always a valid shape: a failed fetch produces [`MovieDetails::unavailable`]
/// rather than an error or an absent value.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetails {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub direct_links: CategorizedLinks,
    pub interactive_links: InteractiveLinks,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
}

impl MovieDetails {
    /// The empty shape for a page that could not be fetched.
    pub fn unavailable(url: &str) -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            poster: None,
            direct_links: CategorizedLinks::default(),
            interactive_links: InteractiveLinks::default(),
            source_url: url.to_string(),
            fetched_at: Utc::now(),
        }
    }

    pub fn has_links(&self) -> bool {
        !self.direct_links.is_empty() || !self.interactive_links.is_empty()
    }
}

/// One raw hyperlink from a detail page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawLink {
    pub text: String,
    pub href: String,
}

/// The synchronously parsed parts of a detail page.
#[derive(Debug)]
pub(crate) struct ParsedDetail {
    pub title: String,
    pub poster: Option<String>,
    pub links: Vec<RawLink>,
}

/// Parse title, poster, and raw hyperlinks out of a detail page.
///
/// Hyperlinks are kept when their href starts with `http` or a
/// site-relative `/`; exact-href duplicates are skipped.
pub(crate) fn parse_detail(
    html: &str,
    page_url: &str,
    profile: &SiteProfile,
    title_strip: &[Regex],
) -> ParsedDetail {
    let document = Html::parse_document(html);

    ParsedDetail {
        title: extract_title(&document, title_strip),
        poster: extract_poster(&document, page_url, profile),
        links: extract_links(&document),
    }
}

fn extract_title(document: &Html, title_strip: &[Regex]) -> String {
    let mut title = String::new();
    for selector_str in ["title", "h1", "h2"] {
        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(element) = document.select(&selector).next() {
            title = element.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                break;
            }
        }
    }

    for pattern in title_strip {
        title = pattern.replace_all(&title, "").to_string();
    }
    let title = title.trim();
    if title.is_empty() {
        UNKNOWN_TITLE.to_string()
    } else {
        title.to_string()
    }
}

fn extract_poster(document: &Html, page_url: &str, profile: &SiteProfile) -> Option<String> {
    for selector_str in &profile.poster_selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(src) = document
            .select(&selector)
            .next()
            .and_then(|img| img.value().attr("src"))
        {
            return resolve_href(page_url, src);
        }
    }

    let img_selector = Selector::parse("img[src]").ok()?;
    for img in document.select(&img_selector) {
        let src = img.value().attr("src")?;
        let lower = src.to_lowercase();
        if profile
            .poster_url_markers
            .iter()
            .any(|marker| lower.contains(marker.as_str()))
        {
            return resolve_href(page_url, src);
        }
    }
    None
}

fn extract_links(document: &Html) -> Vec<RawLink> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let href = match anchor.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };
        if !(href.starts_with("http") || href.starts_with('/')) {
            continue;
        }
        if !seen.insert(href.to_string()) {
            continue;
        }
        links.push(RawLink {
            text: anchor.text().collect::<String>().trim().to_string(),
            href: href.to_string(),
        });
    }
    links
}

/// Classify raw links into the pool, the interactive map, and the list of
/// server pages awaiting expansion.
///
/// Direct candidates are resolved through redirects, normalized, and
/// fingerprinted. An immediate direct link enters the pool only when its
/// final URL lands on a known host; unmatched ones are dropped here, and
/// only server-expanded links later fall back to the `other` bucket.
pub(crate) async fn classify_links<F: Fetch + ?Sized>(
    fetcher: &F,
    classifier: &LinkClassifier,
    fingerprinter: &Fingerprinter,
    hosts: &HostClassifier,
    page_url: &str,
    links: Vec<RawLink>,
) -> (LinkPool, InteractiveLinks, Vec<String>) {
    let mut pool = LinkPool::new();
    let mut interactive = InteractiveLinks::default();
    let mut server_urls: Vec<String> = Vec::new();

    for link in links {
        let Some(url) = resolve_href(page_url, &link.href) else {
            continue;
        };

        match classifier.classify(&link.text, &url) {
            LinkDisposition::Server { url } => {
                if !server_urls.contains(&url) {
                    server_urls.push(url);
                }
            }
            LinkDisposition::Interactive { label, url } => {
                interactive.insert(&label, &url);
            }
            LinkDisposition::Direct { url } => {
                let final_url = match fetcher.resolve_final_url(&url).await {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        debug!("Redirect resolution failed for {}: {}", url, err);
                        url
                    }
                };
                let normalized = fingerprinter.normalize(&final_url);
                if hosts.matched_category(&normalized).is_some() {
                    let fingerprint = fingerprinter.fingerprint(&normalized);
                    pool.insert(fingerprint, normalized);
                }
            }
        }
    }

    (pool, interactive, server_urls)
}

/// Fetch each server page once and merge every URL it carries into the
/// pool, keyed by fingerprint.
pub(crate) async fn expand_server_links<F: Fetch + ?Sized>(
    fetcher: &F,
    fingerprinter: &Fingerprinter,
    pool: &mut LinkPool,
    server_urls: &[String],
) {
    for server_url in server_urls {
        let html = match fetcher.fetch_text(server_url).await {
            Ok(html) => html,
            Err(err) => {
                warn!("Server page fetch failed for {}: {}", server_url, err);
                continue;
            }
        };

        let found = harvest_page_urls(&html);
        debug!("Server page {} yielded {} candidate urls", server_url, found.len());
        for url in found {
            let normalized = fingerprinter.normalize(&url);
            let fingerprint = fingerprinter.fingerprint(&normalized);
            pool.insert(fingerprint, normalized);
        }
    }
}

/// Every `http(s)` URL on a page: anchor hrefs plus bare text matches,
/// deduplicated in discovery order.
pub(crate) fn harvest_page_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut urls: Vec<String> = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for anchor in document.select(&selector) {
            if let Some(href) = anchor.value().attr("href") {
                let href = href.trim();
                if href.starts_with("http") && !urls.iter().any(|u| u.as_str() == href) {
                    urls.push(href.to_string());
                }
            }
        }
    }

    let text = document.root_element().text().collect::<String>();
    for url in find_bare_urls(&text) {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    urls
}
