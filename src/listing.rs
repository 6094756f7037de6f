//! Search-results parsing.
//!
//! Listing markup varies per site and per redesign, so extraction is an
//! ordered list of strategies evaluated until one yields items: structural
//! article blocks, then a generic anchor scan, then heading-embedded
//! links. Each strategy is pure over the parsed document.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::debug;

use crate::config::ListingRules;
use crate::links::resolve_href;

/// One discovered listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingItem {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

struct StrategyContext<'a> {
    base_url: &'a str,
    query_lower: String,
    rules: &'a ListingRules,
}

type Strategy = for<'a> fn(&Html, &StrategyContext<'a>) -> Vec<ListingItem>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("article-blocks", article_blocks),
    ("anchor-scan", anchor_scan),
    ("heading-links", heading_links),
];

/// Parse a search-results page into listing items.
///
/// Strategies run in order and the first non-empty result wins. Relative
/// hrefs are resolved against `base_url`; the output is deduplicated by
/// URL with the first occurrence winning.
pub fn parse_listing(html: &str, base_url: &str, query: &str, rules: &ListingRules) -> Vec<ListingItem> {
    let document = Html::parse_document(html);
    let ctx = StrategyContext {
        base_url,
        query_lower: query.to_lowercase(),
        rules,
    };

    for (name, strategy) in STRATEGIES {
        let items = strategy(&document, &ctx);
        if !items.is_empty() {
            debug!("Listing strategy {} found {} items", name, items.len());
            return dedup_by_url(items);
        }
        debug!("Listing strategy {} found nothing", name);
    }

    Vec::new()
}

/// Article-like blocks: first plausible anchor as title+url, first image
/// as poster.
fn article_blocks(document: &Html, ctx: &StrategyContext) -> Vec<ListingItem> {
    let article_selector = match Selector::parse("article") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let anchor_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let img_selector = match Selector::parse("img[src]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut items = Vec::new();
    for article in document.select(&article_selector) {
        let Some((title, url)) = article
            .select(&anchor_selector)
            .find_map(|anchor| plausible_title_link(anchor, ctx))
        else {
            continue;
        };

        let poster = article
            .select(&img_selector)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| resolve_href(ctx.base_url, src));

        items.push(ListingItem { title, url, poster });
    }
    items
}

/// Generic anchor scan: any link whose href follows a detail-page
/// convention or whose text contains the query term.
fn anchor_scan(document: &Html, ctx: &StrategyContext) -> Vec<ListingItem> {
    let anchor_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut items = Vec::new();
    for anchor in document.select(&anchor_selector) {
        let href = match anchor.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        let text = element_text(anchor);
        if text.chars().count() <= ctx.rules.min_title_len {
            continue;
        }
        let plausible = is_detail_href(href, ctx.rules)
            || (!ctx.query_lower.is_empty() && text.to_lowercase().contains(&ctx.query_lower));
        if !plausible {
            continue;
        }
        if let Some(url) = resolve_href(ctx.base_url, href) {
            items.push(ListingItem {
                title: text,
                url,
                poster: None,
            });
        }
    }
    items
}

/// Anchors nested inside headings.
fn heading_links(document: &Html, ctx: &StrategyContext) -> Vec<ListingItem> {
    let heading_selector = match Selector::parse("h2 a[href], h3 a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut items = Vec::new();
    for anchor in document.select(&heading_selector) {
        if let Some((title, url)) = plausible_title_link(anchor, ctx) {
            items.push(ListingItem {
                title,
                url,
                poster: None,
            });
        }
    }
    items
}

/// A title/url pair when the anchor text is long enough to be a title.
fn plausible_title_link(anchor: ElementRef, ctx: &StrategyContext) -> Option<(String, String)> {
    let href = anchor.value().attr("href")?;
    let text = element_text(anchor);
    if text.chars().count() <= ctx.rules.min_title_len {
        return None;
    }
    let url = resolve_href(ctx.base_url, href)?;
    Some((text, url))
}

fn is_detail_href(href: &str, rules: &ListingRules) -> bool {
    rules.detail_suffixes.iter().any(|s| href.ends_with(s.as_str()))
        || rules.detail_fragments.iter().any(|f| href.contains(f.as_str()))
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn dedup_by_url(items: Vec<ListingItem>) -> Vec<ListingItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.url.clone()))
        .collect()
}
