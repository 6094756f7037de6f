//! Per-site scraping operations.
//!
//! [`SiteScraper`] binds a site profile, the engine tables, and a fetcher
//! into the three public operations: listing search, detail fetch, and
//! standalone link-page expansion. None of them returns an error; each
//! degrades to its documented empty shape, because the source markup is
//! untrusted and partial failure is the steady state here.

use chrono::Utc;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::{EngineConfig, SiteProfile};
use crate::detail::{self, MovieDetails};
use crate::fetch::Fetch;
use crate::links::{
    CategorizedLinks, Fingerprinter, HostClassifier, LinkClassifier, LinkPool,
};
use crate::listing::{parse_listing, ListingItem};

/// Scraper for one source site.
pub struct SiteScraper<F> {
    profile: SiteProfile,
    fetcher: F,
    fingerprinter: Fingerprinter,
    hosts: HostClassifier,
    classifier: LinkClassifier,
    title_strip: Vec<Regex>,
    display_order: Vec<String>,
}

impl<F: Fetch> SiteScraper<F> {
    /// Build a scraper from a site profile and the shared engine config.
    /// Invalid title-strip patterns are skipped.
    pub fn new(profile: SiteProfile, config: &EngineConfig, fetcher: F) -> Self {
        let title_strip = profile
            .title_strip
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            fingerprinter: Fingerprinter::new(config),
            hosts: HostClassifier::new(&config.host_categories),
            classifier: LinkClassifier::new(&config.disposition),
            display_order: config.category_display_order.clone(),
            title_strip,
            profile,
            fetcher,
        }
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Preferred category ordering for presenting a link map.
    pub fn display_order(&self) -> &[String] {
        &self.display_order
    }

    /// Canonical short display form for a link.
    pub fn display_url(&self, url: &str) -> String {
        self.fingerprinter.display_url(url)
    }

    /// Search the site for a query. Total failure yields an empty listing.
    pub async fn search(&self, query: &str) -> Vec<ListingItem> {
        let url = self.profile.search_url(query);
        debug!("Searching {} via {}", self.profile.id, url);

        let html = match self.fetcher.fetch_text(&url).await {
            Ok(html) => html,
            Err(err) => {
                warn!("Search fetch failed for {}: {}", url, err);
                return Vec::new();
            }
        };

        let items = parse_listing(&html, &self.profile.base_url, query, &self.profile.listing);
        debug!("Search on {} found {} items", self.profile.id, items.len());
        items
    }

    /// Fetch a detail page and mine it into [`MovieDetails`].
    ///
    /// Server links are expanded with one extra fetch each and merged into
    /// the same fingerprint-deduplicated pool before categorization. Total
    /// fetch failure yields the "Unknown" empty shape, never an error.
    pub async fn movie_details(&self, url: &str) -> MovieDetails {
        let html = match self.fetcher.fetch_text(url).await {
            Ok(html) => html,
            Err(err) => {
                warn!("Detail fetch failed for {}: {}", url, err);
                return MovieDetails::unavailable(url);
            }
        };

        let parsed = detail::parse_detail(&html, url, &self.profile, &self.title_strip);
        let (mut pool, interactive_links, server_urls) = detail::classify_links(
            &self.fetcher,
            &self.classifier,
            &self.fingerprinter,
            &self.hosts,
            url,
            parsed.links,
        )
        .await;

        if !server_urls.is_empty() {
            debug!("Expanding {} server links for {}", server_urls.len(), url);
            detail::expand_server_links(&self.fetcher, &self.fingerprinter, &mut pool, &server_urls)
                .await;
        }

        MovieDetails {
            title: parsed.title,
            poster: parsed.poster,
            direct_links: pool.categorize(&self.hosts),
            interactive_links,
            source_url: url.to_string(),
            fetched_at: Utc::now(),
        }
    }

    /// Expand one secondary link page into a categorized map, for
    /// interactive links that point at another page of mirrors. Total
    /// failure yields an empty map.
    pub async fn expand_links(&self, url: &str) -> CategorizedLinks {
        let html = match self.fetcher.fetch_text(url).await {
            Ok(html) => html,
            Err(err) => {
                warn!("Link page fetch failed for {}: {}", url, err);
                return CategorizedLinks::default();
            }
        };

        let mut pool = LinkPool::new();
        for found in detail::harvest_page_urls(&html) {
            let normalized = self.fingerprinter.normalize(&found);
            let fingerprint = self.fingerprinter.fingerprint(&normalized);
            pool.insert(fingerprint, normalized);
        }
        pool.categorize(&self.hosts)
    }
}

/// Search several sites in order, tagging each item with its site id.
pub async fn search_many<F: Fetch>(
    scrapers: &[SiteScraper<F>],
    query: &str,
) -> Vec<(String, ListingItem)> {
    let mut all = Vec::new();
    for scraper in scrapers {
        let items = scraper.search(query).await;
        all.extend(
            items
                .into_iter()
                .map(|item| (scraper.id().to_string(), item)),
        );
    }
    all
}
