//! Feed orchestration: link collection, concurrent extraction, assembly.
//!
//! [`FeedScraper`] is the entry point. It is configured once per run with
//! a source URL, a feed title, and an item cap, then driven by one of the
//! three [`ExtractStrategy`] policies. The per-link policy fans out one
//! fetch per collected link and assembles results in link order; the
//! other two work entirely from the already-fetched source page.
//!
//! Failure model: only an unparseable source URL is fatal. Everything
//! after construction favors partial success — a failed link drops one
//! item, a failed source page produces an empty feed, and a feed is
//! always returned.

use crate::error::ScrapeError;
use crate::extract::{self, ExtractStrategy};
use crate::fetch::{compile_selector, DocumentSource, PageDocument};
use crate::models::{Enclosure, ExtractOptions, Feed, FeedItem};
use crate::resolve;
use crate::timeparse;
use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::{info, warn};
use url::Url;

/// Default cap on the number of items in a feed.
pub const DEFAULT_MAX_ITEMS: usize = 10;

/// How many link fetches run at once in the per-link strategy.
const CONCURRENT_FETCHES: usize = 12;

/// Fan out one worker per link and assemble results in link order.
///
/// Workers run concurrently on an order-preserving buffered stream: each
/// link owns the slot at its own index, and collecting the stream is the
/// join barrier — the call returns only when every worker has finished.
/// Output order equals input link order no matter which worker completes
/// first. Failed slots (`None`) are filtered out before returning.
pub async fn extract_ordered<F, Fut>(links: &[String], worker: F) -> Vec<FeedItem>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Option<FeedItem>>,
{
    let total = links.len();
    let slots: Vec<Option<FeedItem>> = stream::iter(links.to_vec())
        .map(worker)
        .buffered(CONCURRENT_FETCHES)
        .collect()
        .await;
    let items: Vec<FeedItem> = slots.into_iter().flatten().collect();
    if items.len() < total {
        info!(
            total,
            dropped = total - items.len(),
            "Some links produced no item"
        );
    }
    items
}

/// Builds a normalized feed from one source page and its links.
pub struct FeedScraper {
    title: String,
    source_url: Url,
    base_url: String,
    max_items: usize,
    source: DocumentSource,
}

impl FeedScraper {
    /// Create a scraper for `source_url`.
    ///
    /// Fails when the URL does not parse or has no host — the feed has no
    /// identity without one, so this is the single fatal configuration
    /// error in the pipeline.
    pub fn new(source_url: &str, title: &str) -> Result<Self, ScrapeError> {
        let parsed = Url::parse(source_url).map_err(|source| ScrapeError::InvalidUrl {
            url: source_url.to_string(),
            source,
        })?;
        let host = parsed.host_str().ok_or(ScrapeError::InvalidUrl {
            url: source_url.to_string(),
            source: url::ParseError::EmptyHost,
        })?;
        let base_url = format!("{}://{}", parsed.scheme(), host);
        Ok(FeedScraper {
            title: title.to_string(),
            source_url: parsed,
            base_url,
            max_items: DEFAULT_MAX_ITEMS,
            source: DocumentSource::new()?,
        })
    }

    /// Cap the number of feed items.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Replace the document source, e.g. to change the fetch timeout.
    pub fn with_source(mut self, source: DocumentSource) -> Self {
        self.source = source;
        self
    }

    /// Resolve `path` against the feed's source URL (best-effort, see
    /// [`resolve::absolute`]).
    pub fn absolute_url(&self, path: &str) -> String {
        resolve::absolute(&self.source_url, path)
    }

    /// Collect candidate item URLs from `doc` in selector-match order.
    ///
    /// Each match's `href` is resolved to absolute form; the list is
    /// truncated to the configured maximum. Duplicates are preserved.
    pub fn collect_links(&self, doc: &PageDocument, selector: &str) -> Vec<String> {
        let mut links: Vec<String> = doc
            .all_attr(selector, "href")
            .iter()
            .map(|href| self.absolute_url(href))
            .collect();
        links.truncate(self.max_items);
        info!(count = links.len(), selector, "Collected candidate links");
        links
    }

    /// Run one extraction strategy and assemble the feed.
    ///
    /// Always produces a feed; per-fetch failures shrink the item list
    /// rather than failing the run.
    pub async fn scrape(&self, strategy: &ExtractStrategy, opts: &ExtractOptions) -> Feed {
        let items = match strategy {
            ExtractStrategy::PerLink { link_selector } => {
                self.items_from_links(link_selector, opts).await
            }
            ExtractStrategy::SourcePage { link_selector } => {
                self.items_from_source_page(link_selector, opts).await
            }
            ExtractStrategy::Query { item_selector } => {
                self.items_from_query(item_selector, opts).await
            }
        };
        info!(count = items.len(), feed = %self.title, "Assembled feed");
        Feed {
            title: self.title.clone(),
            link: self.base_url.clone(),
            items,
        }
    }

    async fn fetch_source(&self) -> Option<PageDocument> {
        match self.source.fetch(self.source_url.as_str()).await {
            Ok(doc) => Some(doc),
            Err(error) => {
                warn!(url = %self.source_url, %error, "Source page fetch failed; feed will be empty");
                None
            }
        }
    }

    async fn items_from_links(&self, link_selector: &str, opts: &ExtractOptions) -> Vec<FeedItem> {
        let Some(source_doc) = self.fetch_source().await else {
            return Vec::new();
        };
        let links = self.collect_links(&source_doc, link_selector);
        extract_ordered(&links, |link| async move {
            match self.source.fetch(&link).await {
                Ok(mut doc) => {
                    resolve::make_links_absolute(&mut doc.html, &self.source_url);
                    Some(extract::item_from_document(&doc, opts))
                }
                Err(error) => {
                    warn!(%link, %error, "Link fetch failed; dropping item");
                    None
                }
            }
        })
        .await
    }

    async fn items_from_source_page(
        &self,
        link_selector: &str,
        opts: &ExtractOptions,
    ) -> Vec<FeedItem> {
        let Some(source_doc) = self.fetch_source().await else {
            return Vec::new();
        };
        let links = self.collect_links(&source_doc, link_selector);
        if links.is_empty() {
            return Vec::new();
        }
        let page = extract::page_result_from_document(&source_doc, opts);
        let count = links.len();
        let layout = opts.date_layout.as_deref().unwrap_or("");
        links
            .iter()
            .map(|link| FeedItem::new(link))
            .enumerate()
            .map(|(i, mut item)| {
                // Per-index correspondence holds only when a field matched
                // at least as many elements as there are links; a short
                // sequence is skipped for every item.
                if page.titles.len() >= count && !page.titles[i].is_empty() {
                    item.title = page.titles[i].clone();
                }
                if page.authors.len() >= count && !page.authors[i].is_empty() {
                    item.author = Some(page.authors[i].clone());
                }
                if page.descriptions.len() >= count && !page.descriptions[i].trim().is_empty() {
                    item.description = Some(page.descriptions[i].clone());
                }
                if page.dates.len() >= count && !page.dates[i].is_empty() {
                    item.created = timeparse::normalize(layout, &page.dates[i]);
                }
                if page.images.len() >= count && !page.images[i].is_empty() {
                    item.enclosure =
                        Some(Enclosure::for_url(&self.absolute_url(&page.images[i])));
                }
                item
            })
            .collect()
    }

    async fn items_from_query(&self, item_selector: &str, opts: &ExtractOptions) -> Vec<FeedItem> {
        let Some(source_doc) = self.fetch_source().await else {
            return Vec::new();
        };
        let Some(selector) = compile_selector(item_selector) else {
            return Vec::new();
        };
        let mut items = Vec::new();
        for element in source_doc.html.select(&selector) {
            if items.len() >= self.max_items {
                break;
            }
            if let Some(mut item) = extract::item_from_element(element, opts) {
                item.link = self.absolute_url(&item.link);
                item.id = item.link.clone();
                items.push(item);
            }
        }
        items
    }
}
