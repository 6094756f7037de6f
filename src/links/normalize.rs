//! URL canonicalization and href resolution.

use url::Url;

/// Canonicalize a URL: scheme, host, and path are kept, query parameters
/// carrying a tracking marker are removed, and a trailing slash is dropped
/// from the path.
///
/// A marker matches when it occurs anywhere in the `name=value` form of a
/// parameter, which lets markers like `ref=` and `views:` target names and
/// values with one table.
pub fn normalize_url(raw: &str, tracking_markers: &[String]) -> String {
    let raw = raw.trim();
    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.trim_end_matches('/').to_string(),
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, value)| {
            let pair = format!("{}={}", name, value);
            !tracking_markers.iter().any(|marker| pair.contains(marker.as_str()))
        })
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (name, value) in &kept {
            pairs.append_pair(name, value);
        }
    }

    let trimmed = url.path().trim_end_matches('/').to_string();
    if trimmed != url.path() {
        if trimmed.is_empty() {
            url.set_path("/");
        } else {
            url.set_path(&trimmed);
        }
    }

    let mut out = url.to_string();
    if out.ends_with('/') && url.query().is_none() && url.fragment().is_none() {
        out.pop();
    }
    out
}

/// Resolve an href against a base page URL.
///
/// Returns None for empty, fragment-only, and non-navigational hrefs.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if let Ok(base) = Url::parse(base) {
        if let Ok(joined) = base.join(href) {
            return Some(joined.to_string());
        }
    }
    None
}
