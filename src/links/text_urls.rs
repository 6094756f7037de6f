//! Bare URL extraction from page text.

use regex::Regex;

/// Find `http(s)://` URLs appearing as bare text, cleaned of trailing
/// punctuation, deduplicated in order of first occurrence.
pub fn find_bare_urls(text: &str) -> Vec<String> {
    let pattern = Regex::new(r#"(?i)\bhttps?://[^\s<>"'\[\]{}|\\^`\x00-\x1f\x7f]+"#)
        .expect("URL pattern compiles");

    let mut found = Vec::new();
    for url_match in pattern.find_iter(text) {
        let cleaned = clean_url(url_match.as_str());
        if !found.contains(&cleaned) {
            found.push(cleaned);
        }
    }
    found
}

/// Remove trailing punctuation that is not part of the URL, keeping
/// balanced parens/brackets.
fn clean_url(url: &str) -> String {
    let mut url = url.to_string();
    loop {
        let should_pop = match url.chars().last() {
            Some(')') => url.matches('(').count() < url.matches(')').count(),
            Some(']') => url.matches('[').count() < url.matches(']').count(),
            Some('.') | Some(',') | Some(';') | Some(':') => true,
            _ => false,
        };
        if should_pop {
            url.pop();
        } else {
            break;
        }
    }
    url
}
