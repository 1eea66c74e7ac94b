//! # pagefeed
//!
//! Turn any web page into a normalized feed of items using caller-supplied
//! CSS selectors — no per-site scraping logic.
//!
//! ## Features
//!
//! - Collects candidate item links from a source page with a selector
//! - Fetches linked pages concurrently, preserving item order and
//!   isolating per-link failures
//! - Three interchangeable extraction strategies: per-link pages, a
//!   single source page with parallel field sequences, or direct element
//!   queries
//! - Normalizes dates written in many human languages, partial dates,
//!   and relative phrases ("1 day ago") into absolute timestamps
//! - Rewrites relative links and images to absolute form so extracted
//!   HTML survives outside its page
//! - Filters assembled items against title/description blacklists and
//!   strips unwanted sub-content
//!
//! ## Architecture
//!
//! A scrape run is a pipeline:
//! 1. **Collect**: run the link selector against the source page
//! 2. **Extract**: apply one [`ExtractStrategy`] — the per-link strategy
//!    fans out one concurrent fetch per link
//! 3. **Assemble**: results land in link order; failed slots are dropped
//! 4. **Filter**: blacklists and strip rules clean the final item list
//!
//! The output [`Feed`] is handed to whatever RSS/Atom serializer the
//! application uses; feed XML is out of scope here.
//!
//! ## Usage
//!
//! ```ignore
//! let scraper = FeedScraper::new("https://news.example.com/latest", "Example News")?
//!     .with_max_items(20);
//! let strategy = ExtractStrategy::PerLink {
//!     link_selector: ".titletext > a".to_string(),
//! };
//! let opts = ExtractOptions {
//!     title: Some(".article-title".to_string()),
//!     author: Some(".author-name".to_string()),
//!     date: Some(".published".to_string()),
//!     date_layout: Some("%e %B %Y".to_string()),
//!     description: Some(".article-fulltext".to_string()),
//!     ..Default::default()
//! };
//! let feed = scraper.scrape(&strategy, &opts).await.filtered(&filters);
//! ```

pub mod error;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod resolve;
pub mod timeparse;

#[cfg(test)]
mod testutil;

pub use error::ScrapeError;
pub use extract::ExtractStrategy;
pub use feed::{extract_ordered, FeedScraper, DEFAULT_MAX_ITEMS};
pub use fetch::{DocumentSource, PageDocument};
pub use filter::filter_items;
pub use models::{Enclosure, ExtractOptions, Feed, FeedItem, Filters, PageResult, UNKNOWN_LENGTH};
pub use timeparse::{normalize, parse_relative};
