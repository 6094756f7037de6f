//! Scraping engine for movie listing sites.
//!
//! Searches a site for titles, parses its listing pages, and mines the
//! selected detail page for download links: discovering every candidate
//! hyperlink, expanding "Server N" mirror pages one level deep,
//! deduplicating by provider fingerprint, and bucketing the survivors by
//! hosting provider.
//!
//! The engine is a pure call boundary: queries and URLs in, structured
//! results out. Source markup is untrusted and shifts constantly, so no
//! error escapes the public operations; each degrades to its documented
//! empty shape instead. The chat transport, pagination UI, and session
//! expiry all live outside this crate ([`session::SessionStore`] is the
//! collaborator offered for the latter).

pub mod config;
pub mod detail;
pub mod fetch;
pub mod links;
pub mod listing;
pub mod session;
pub mod site;

pub use config::{EngineConfig, SiteProfile};
pub use detail::MovieDetails;
pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use links::{CategorizedLinks, InteractiveLinks, LinkDisposition, OTHER_CATEGORY};
pub use listing::ListingItem;
pub use session::SessionStore;
pub use site::{search_many, SiteScraper};
