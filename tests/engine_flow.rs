//! End-to-end engine tests over canned pages: search, detail extraction,
//! server-link expansion, and the fetcher retry policy against a local
//! socket.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use reelscrape::config::FetchConfig;
use reelscrape::{
    search_many, EngineConfig, Fetch, FetchError, HttpFetcher, SiteProfile, SiteScraper,
    OTHER_CATEGORY,
};

/// Serves canned pages and redirect mappings; counts fetches per URL.
#[derive(Default)]
struct MockFetcher {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    fetch_counts: Mutex<HashMap<String, u32>>,
}

impl MockFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    fn fetch_count(&self, url: &str) -> u32 {
        self.fetch_counts
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        *self
            .fetch_counts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::RetriesExhausted {
                attempts: 3,
                url: url.to_string(),
            })
    }

    async fn resolve_final_url(&self, url: &str) -> Result<String, FetchError> {
        Ok(self
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string()))
    }
}

/// Clonable handle over a shared mock, so tests can inspect fetch counts
/// after the scraper takes ownership of its fetcher.
#[derive(Clone)]
struct SharedFetcher(Arc<MockFetcher>);

#[async_trait]
impl Fetch for SharedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.0.fetch_text(url).await
    }

    async fn resolve_final_url(&self, url: &str) -> Result<String, FetchError> {
        self.0.resolve_final_url(url).await
    }
}

fn profile() -> SiteProfile {
    SiteProfile {
        id: "sky".to_string(),
        base_url: "https://films.example".to_string(),
        search_path: "/?s={query}".to_string(),
        title_strip: vec![
            r" - FilmPortal.*$".to_string(),
            r"Full Movie Download".to_string(),
        ],
        ..Default::default()
    }
}

const DETAIL_URL: &str = "https://films.example/movie/voyage.html";

const DETAIL_PAGE: &str = r#"<html>
<head><title>The Long Voyage (2024) Full Movie Download - FilmPortal</title></head>
<body>
  <img class="wp-post-image" src="/img/voyage.jpg">
  <div class="links">
    <a href="https://mirrors.example/server-1">Server 1</a>
    <a href="https://howblogs.xyz/p/42">G-Drive [Instant]</a>
    <a href="https://player.example/watch">Watch Online HD</a>
    <a href="https://player.example/watch-mirror">Watch Online HD</a>
    <a href="https://go.example/out/1">Get File Mirror A</a>
    <a href="https://go.example/out/2">Get File Mirror B</a>
    <a href="https://unknown-host.example/file/9">Plain Mirror Link</a>
  </div>
</body>
</html>"#;

const SERVER_PAGE: &str = r#"<html><body>
  <a href="https://pixeldrain.com/u/XYZ1?view=grid">Mirror One</a>
  <p>Copy this: https://pixeldrain.com/u/XYZ1</p>
  <p>Backup mirror https://freehost.example/dl/777</p>
</body></html>"#;

fn detail_scraper() -> SiteScraper<MockFetcher> {
    let fetcher = MockFetcher::new()
        .page(DETAIL_URL, DETAIL_PAGE)
        .page("https://mirrors.example/server-1", SERVER_PAGE)
        .redirect(
            "https://go.example/out/1",
            "https://gofile.io/d/AbC123?utm_source=x",
        )
        .redirect("https://go.example/out/2", "https://gofile.io/d/AbC123");
    SiteScraper::new(profile(), &EngineConfig::default(), fetcher)
}

#[tokio::test]
async fn detail_flow_extracts_title_poster_and_links() {
    let details = detail_scraper().movie_details(DETAIL_URL).await;

    assert_eq!(details.title, "The Long Voyage (2024)");
    assert_eq!(
        details.poster.as_deref(),
        Some("https://films.example/img/voyage.jpg")
    );
    assert_eq!(details.source_url, DETAIL_URL);
    assert!(details.has_links());
}

#[tokio::test]
async fn redirected_duplicates_collapse_to_one_entry() {
    let details = detail_scraper().movie_details(DETAIL_URL).await;

    // Both mirrors redirect to the same gofile object; tracking params
    // differ but the fingerprint does not.
    assert_eq!(
        details.direct_links.get("gofile"),
        ["https://gofile.io/d/AbC123"]
    );
}

#[tokio::test]
async fn server_expansion_merges_into_the_pool() {
    let details = detail_scraper().movie_details(DETAIL_URL).await;

    // The server page carries three URLs; two collide by fingerprint.
    assert_eq!(
        details.direct_links.get("pixeldrain"),
        ["https://pixeldrain.com/u/XYZ1"]
    );
    assert_eq!(
        details.direct_links.get(OTHER_CATEGORY),
        ["https://freehost.example/dl/777"]
    );
}

#[tokio::test]
async fn unmatched_immediate_direct_links_are_dropped() {
    let details = detail_scraper().movie_details(DETAIL_URL).await;

    // The unknown-host direct link is dropped outright, while the unknown
    // host found during server expansion lands in `other`.
    let other = details.direct_links.get(OTHER_CATEGORY);
    assert!(!other.iter().any(|u| u.contains("unknown-host.example")));
    assert_eq!(other, ["https://freehost.example/dl/777"]);
}

#[tokio::test]
async fn interactive_labels_keep_first_occurrence() {
    let details = detail_scraper().movie_details(DETAIL_URL).await;

    assert_eq!(details.interactive_links.len(), 2);
    assert_eq!(
        details.interactive_links.get("G-Drive [Instant]"),
        Some("https://howblogs.xyz/p/42")
    );
    assert_eq!(
        details.interactive_links.get("Watch Online HD"),
        Some("https://player.example/watch")
    );
}

#[tokio::test]
async fn each_server_link_is_fetched_exactly_once() {
    let mock = Arc::new(
        MockFetcher::new()
            .page(DETAIL_URL, DETAIL_PAGE)
            .page("https://mirrors.example/server-1", SERVER_PAGE),
    );
    let scraper = SiteScraper::new(
        profile(),
        &EngineConfig::default(),
        SharedFetcher(mock.clone()),
    );

    let _ = scraper.movie_details(DETAIL_URL).await;

    assert_eq!(mock.fetch_count(DETAIL_URL), 1);
    assert_eq!(mock.fetch_count("https://mirrors.example/server-1"), 1);
}

#[tokio::test]
async fn search_parses_listing_results() {
    let listing = r#"
        <article>
          <a href="/movie/the-long-voyage.html">The Long Voyage (2024)</a>
          <img src="/posters/voyage.jpg">
        </article>
        <article>
          <a href="/movie/the-long-voyage.html">The Long Voyage (2024) Duplicate</a>
        </article>
    "#;
    let fetcher =
        MockFetcher::new().page("https://films.example/?s=long%20voyage", listing);
    let scraper = SiteScraper::new(profile(), &EngineConfig::default(), fetcher);

    let items = scraper.search("long voyage").await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "The Long Voyage (2024)");
    assert_eq!(
        items[0].url,
        "https://films.example/movie/the-long-voyage.html"
    );
}

#[tokio::test]
async fn search_many_tags_items_with_their_site() {
    let sky_listing = r#"<article><a href="/movie/a.html">Voyage From Site Sky</a></article>"#;
    let kat_listing = r#"<article><a href="/movie/b.html">Voyage From Site Kat</a></article>"#;

    let sky = SiteScraper::new(
        profile(),
        &EngineConfig::default(),
        MockFetcher::new().page("https://films.example/?s=voyage", sky_listing),
    );
    let kat_profile = SiteProfile {
        id: "kat".to_string(),
        base_url: "https://catalog.example".to_string(),
        ..Default::default()
    };
    let kat = SiteScraper::new(
        kat_profile,
        &EngineConfig::default(),
        MockFetcher::new().page("https://catalog.example/?s=voyage", kat_listing),
    );

    let merged = search_many(&[sky, kat], "voyage").await;
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].0, "sky");
    assert_eq!(merged[1].0, "kat");
    assert_eq!(merged[1].1.url, "https://catalog.example/movie/b.html");
}

#[tokio::test]
async fn expand_links_categorizes_a_secondary_page() {
    let page = r#"
        <a href="https://gofile.io/d/Zz9">Mirror</a>
        <p>https://nowhere.example/x</p>
    "#;
    let fetcher = MockFetcher::new().page("https://howblogs.xyz/p/42", page);
    let scraper = SiteScraper::new(profile(), &EngineConfig::default(), fetcher);

    let links = scraper.expand_links("https://howblogs.xyz/p/42").await;
    assert_eq!(links.get("gofile"), ["https://gofile.io/d/Zz9"]);
    assert_eq!(links.get(OTHER_CATEGORY), ["https://nowhere.example/x"]);
    assert_eq!(links.total(), 2);
}

/// Minimal HTTP server answering every request with the given status line.
async fn spawn_status_server(status_line: &'static str) -> (std::net::SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                status_line
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (addr, hits)
}

fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        max_attempts: 3,
        backoff_base_ms: 20,
        timeout_secs: 5,
        request_delay_ms: 0,
        user_agent: Some("reelscrape-tests/0.2".to_string()),
    }
}

#[tokio::test]
async fn always_503_makes_exactly_three_attempts_with_growing_waits() {
    let (addr, hits) = spawn_status_server("503 Service Unavailable").await;
    let fetcher = HttpFetcher::new(test_fetch_config());

    let started = Instant::now();
    let result = fetcher.fetch_text(&format!("http://{}/page", addr)).await;
    let elapsed = started.elapsed();

    assert!(matches!(
        result,
        Err(FetchError::RetriesExhausted { attempts: 3, .. })
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    // Backoff waits of 20ms then 40ms sit between the three attempts.
    assert!(elapsed >= Duration::from_millis(60), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn non_retryable_status_fails_after_one_attempt() {
    let (addr, hits) = spawn_status_server("404 Not Found").await;
    let fetcher = HttpFetcher::new(test_fetch_config());

    let result = fetcher.fetch_text(&format!("http://{}/missing", addr)).await;

    assert!(matches!(
        result,
        Err(FetchError::Status { status: 404, .. })
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resolve_final_url_follows_redirects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut buf = [0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = if request.starts_with("GET /final") {
                "HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string()
            } else {
                "HTTP/1.1 302 Found\r\nlocation: /final\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                    .to_string()
            };
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    let fetcher = HttpFetcher::new(test_fetch_config());
    let resolved = fetcher
        .resolve_final_url(&format!("http://{}/start", addr))
        .await
        .unwrap();
    assert!(resolved.ends_with("/final"), "resolved {}", resolved);
}
