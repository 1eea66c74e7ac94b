//! Data models for feed items and scrape configuration.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`FeedItem`]: one normalized entry in the assembled feed
//! - [`Feed`]: the ordered collection of items handed to a feed serializer
//! - [`Enclosure`]: an attached media reference (image, audio, video)
//! - [`ExtractOptions`]: the per-run bundle of field selectors
//! - [`PageResult`]: parallel field sequences from a single source page
//! - [`Filters`]: blacklists and strip rules applied after assembly
//!
//! All selector fields are optional; a field with no selector is never
//! populated. Options and filters are plain values passed explicitly to
//! each call — nothing here is held as ambient state between runs.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Sentinel for an enclosure whose byte length is unknown.
pub const UNKNOWN_LENGTH: i64 = -1;

/// A media attachment referenced by a feed item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enclosure {
    /// Absolute URL of the media resource.
    pub url: String,
    /// MIME type guessed from the URL's file extension; empty if unknown.
    pub mime_type: String,
    /// Size in bytes, or [`UNKNOWN_LENGTH`] when the size is not known.
    pub length: i64,
}

impl Enclosure {
    /// Build an enclosure for a media URL, guessing the MIME type from
    /// the path extension.
    pub fn for_url(url: &str) -> Self {
        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        let mime_type = mime_guess::from_path(&path)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_default();
        Enclosure {
            url: url.to_string(),
            mime_type,
            length: UNKNOWN_LENGTH,
        }
    }
}

/// One normalized entry in the assembled feed.
///
/// `link` is always an absolute URL once an item leaves the pipeline;
/// optional fields are `None` when their selector was absent or matched
/// nothing usable.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    /// Stable identifier, usually the item's canonical URL.
    pub id: String,
    /// The item title; empty when no title selector was configured.
    pub title: String,
    /// Absolute URL of the item.
    pub link: String,
    /// Author name, when an author selector matched.
    pub author: Option<String>,
    /// Description as an HTML fragment, when a description selector matched.
    pub description: Option<String>,
    /// Publication time; `None` means the source gave no usable date.
    pub created: Option<DateTime<Local>>,
    /// Attached media, when an image selector matched.
    pub enclosure: Option<Enclosure>,
}

impl FeedItem {
    /// Create an item whose `id` and `link` are both `url`, with every
    /// optional field unset.
    pub fn new(url: &str) -> Self {
        FeedItem {
            id: url.to_string(),
            title: String::new(),
            link: url.to_string(),
            author: None,
            description: None,
            created: None,
            enclosure: None,
        }
    }
}

/// The assembled feed: an ordered, null-free item list plus the feed
/// identity, ready for an external RSS/Atom serializer.
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    /// Feed title supplied by the caller.
    pub title: String,
    /// The feed's home link (scheme and host of the source URL).
    pub link: String,
    /// Items in link order.
    pub items: Vec<FeedItem>,
}

impl Feed {
    /// Apply [`Filters`] to the item list, dropping blacklisted items and
    /// stripping matched sub-content from the survivors.
    pub fn filtered(mut self, filters: &Filters) -> Self {
        self.items = crate::filter::filter_items(self.items, filters);
        self
    }
}

/// Per-field CSS selectors controlling what gets extracted.
///
/// Each field is optional; `None` means "do not attempt to populate this
/// field". The bundle is immutable for the duration of a scrape run.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Selector for the author name element.
    pub author: Option<String>,
    /// Selector for the date element.
    pub date: Option<String>,
    /// chrono strftime layout for parsing the date text, e.g. `"%e %B %Y"`.
    pub date_layout: Option<String>,
    /// Selector for the description element; its inner HTML is kept.
    pub description: Option<String>,
    /// Selector for the image element; its `src` attribute is used.
    pub image: Option<String>,
    /// Selector for the title element.
    pub title: Option<String>,
    /// Selector for the link element inside a query match; its `href`
    /// gates the whole item.
    pub url: Option<String>,
}

/// Parallel field sequences produced by querying one source page for all
/// elements matching each configured selector.
///
/// Sequences correspond to links by index. A sequence shorter than the
/// link count cannot guarantee per-index correspondence, so that field is
/// skipped for every item in the run.
#[derive(Debug, Default)]
pub struct PageResult {
    pub authors: Vec<String>,
    pub dates: Vec<String>,
    pub descriptions: Vec<String>,
    pub images: Vec<String>,
    pub titles: Vec<String>,
}

/// Blacklists and strip rules for cleaning assembled items.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Drop items whose description contains any of these words
    /// (case-insensitive).
    pub descriptions: Vec<String>,
    /// Remove elements matching any of these selectors from descriptions.
    pub selectors: Vec<String>,
    /// Remove `p`/`div` blocks whose text contains any of these fragments.
    pub text: Vec<String>,
    /// Drop items whose title contains any of these words
    /// (case-insensitive).
    pub titles: Vec<String>,
}
