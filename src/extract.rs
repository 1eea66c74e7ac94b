//! Extraction policies for turning documents into feed items.
//!
//! Three interchangeable strategies share one [`ExtractOptions`] bundle:
//!
//! | Strategy | Fetches | Item source |
//! |----------|---------|-------------|
//! | [`ExtractStrategy::PerLink`] | one page per link | each linked page |
//! | [`ExtractStrategy::SourcePage`] | source page only | parallel field sequences |
//! | [`ExtractStrategy::Query`] | source page only | each matched element |
//!
//! A strategy is selected once per run; the policies never mix. The
//! field-extraction helpers here are pure functions over already-fetched
//! documents — all fetching and ordering lives in [`crate::feed`].

use crate::fetch::{compile_selector, element_text, PageDocument};
use crate::models::{Enclosure, ExtractOptions, FeedItem, PageResult};
use crate::timeparse;
use scraper::ElementRef;

/// Which policy turns documents into feed items for a run.
#[derive(Debug, Clone)]
pub enum ExtractStrategy {
    /// Collect links from the source page, fetch each linked page, and
    /// extract one item per page.
    PerLink {
        /// Selector matching the anchor elements to follow.
        link_selector: String,
    },
    /// Collect links from the source page and build items from parallel
    /// field sequences queried on that same page — no secondary fetches.
    SourcePage {
        /// Selector matching the anchor elements that define item order.
        link_selector: String,
    },
    /// Iterate elements matched on the source page directly; each match
    /// with a resolvable URL becomes one item.
    Query {
        /// Selector matching one container element per candidate item.
        item_selector: String,
    },
}

/// Build an item from a fetched page, per-link style.
///
/// The item's `id` and `link` are the page's own URL. Optional fields are
/// populated only when their selector is configured and matches something
/// non-empty; a date that fails the layout parse falls back to the
/// relative-phrase parse inside [`timeparse::normalize`].
pub fn item_from_document(doc: &PageDocument, opts: &ExtractOptions) -> FeedItem {
    let mut item = FeedItem::new(doc.url.as_str());
    if let Some(selector) = &opts.title {
        if let Some(title) = doc.first_text(selector) {
            item.title = title;
        }
    }
    if let Some(selector) = &opts.author {
        item.author = doc.first_text(selector);
    }
    if let Some(selector) = &opts.image {
        if let Some(src) = doc.first_attr(selector, "src") {
            item.enclosure = Some(Enclosure::for_url(&src));
        }
    }
    if let Some(selector) = &opts.date {
        if let Some(text) = doc.first_text(selector) {
            item.created = timeparse::normalize(opts.date_layout.as_deref().unwrap_or(""), &text);
        }
    }
    if let Some(selector) = &opts.description {
        item.description = doc.first_inner_html(selector);
    }
    item
}

/// Query one source page for every element matching each configured field
/// selector, producing parallel sequences consumed by index.
pub fn page_result_from_document(doc: &PageDocument, opts: &ExtractOptions) -> PageResult {
    PageResult {
        authors: opts
            .author
            .as_deref()
            .map(|s| doc.all_text(s))
            .unwrap_or_default(),
        dates: opts
            .date
            .as_deref()
            .map(|s| doc.all_text(s))
            .unwrap_or_default(),
        descriptions: opts
            .description
            .as_deref()
            .map(|s| doc.all_inner_html(s))
            .unwrap_or_default(),
        images: opts
            .image
            .as_deref()
            .map(|s| doc.all_attr(s, "src"))
            .unwrap_or_default(),
        titles: opts
            .title
            .as_deref()
            .map(|s| doc.all_text(s))
            .unwrap_or_default(),
    }
}

/// Build an item from one matched element on the source page.
///
/// The URL sub-selector is the presence gate: an element without a
/// resolvable `href` produces no item at all. The returned link is still
/// relative to the source page; the orchestrator resolves it once at the
/// end.
pub fn item_from_element(element: ElementRef<'_>, opts: &ExtractOptions) -> Option<FeedItem> {
    let url_selector = opts.url.as_deref()?;
    let href = element_first_attr(element, url_selector, "href")?;
    let mut item = FeedItem::new(&href);
    if let Some(selector) = &opts.title {
        if let Some(title) = element_first_text(element, selector) {
            item.title = title;
        }
    }
    if let Some(selector) = &opts.author {
        item.author = element_first_text(element, selector);
    }
    if let Some(selector) = &opts.image {
        if let Some(src) = element_first_attr(element, selector, "src") {
            item.enclosure = Some(Enclosure::for_url(&src));
        }
    }
    if let Some(selector) = &opts.date {
        if let Some(text) = element_first_text(element, selector) {
            item.created = timeparse::normalize(opts.date_layout.as_deref().unwrap_or(""), &text);
        }
    }
    if let Some(selector) = &opts.description {
        item.description = element_first_inner_html(element, selector);
    }
    Some(item)
}

fn element_first_text(element: ElementRef<'_>, selector: &str) -> Option<String> {
    let compiled = compile_selector(selector)?;
    let found = element.select(&compiled).next()?;
    let text = element_text(&found);
    (!text.is_empty()).then_some(text)
}

fn element_first_attr(element: ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    let compiled = compile_selector(selector)?;
    element.select(&compiled).find_map(|found| {
        let value = found.value().attr(attr)?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn element_first_inner_html(element: ElementRef<'_>, selector: &str) -> Option<String> {
    let compiled = compile_selector(selector)?;
    let found = element.select(&compiled).next()?;
    let html = found.inner_html();
    (!html.trim().is_empty()).then_some(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    const ARTICLE: &str = r#"<html><body>
        <h1 class="headline">Breaking News</h1>
        <span class="byline">Jane Doe</span>
        <span class="when">17 December 2021</span>
        <img class="lead" src="https://example.com/lead.jpg">
        <div class="body"><p>First paragraph.</p></div>
    </body></html>"#;

    fn article_doc() -> PageDocument {
        PageDocument::parse(ARTICLE, Url::parse("https://example.com/story/1").unwrap())
    }

    fn full_options() -> ExtractOptions {
        ExtractOptions {
            author: Some(".byline".to_string()),
            date: Some(".when".to_string()),
            date_layout: Some("%e %B %Y".to_string()),
            description: Some(".body".to_string()),
            image: Some(".lead".to_string()),
            title: Some(".headline".to_string()),
            url: None,
        }
    }

    #[test]
    fn test_item_from_document_populates_all_fields() {
        let item = item_from_document(&article_doc(), &full_options());
        assert_eq!(item.id, "https://example.com/story/1");
        assert_eq!(item.link, "https://example.com/story/1");
        assert_eq!(item.title, "Breaking News");
        assert_eq!(item.author.as_deref(), Some("Jane Doe"));
        assert_eq!(
            item.description.as_deref(),
            Some("<p>First paragraph.</p>")
        );
        let enclosure = item.enclosure.unwrap();
        assert_eq!(enclosure.url, "https://example.com/lead.jpg");
        assert_eq!(enclosure.mime_type, "image/jpeg");
        let created = item.created.unwrap();
        assert_eq!(created.format("%Y-%m-%d").to_string(), "2021-12-17");
    }

    #[test]
    fn test_item_from_document_skips_unconfigured_fields() {
        let opts = ExtractOptions {
            title: Some(".headline".to_string()),
            ..Default::default()
        };
        let item = item_from_document(&article_doc(), &opts);
        assert_eq!(item.title, "Breaking News");
        assert!(item.author.is_none());
        assert!(item.description.is_none());
        assert!(item.created.is_none());
        assert!(item.enclosure.is_none());
    }

    #[test]
    fn test_item_from_document_unmatched_selectors_stay_empty() {
        let opts = ExtractOptions {
            title: Some(".no-such-thing".to_string()),
            author: Some(".nobody".to_string()),
            ..Default::default()
        };
        let item = item_from_document(&article_doc(), &opts);
        assert_eq!(item.title, "");
        assert!(item.author.is_none());
    }

    #[test]
    fn test_page_result_sequences_line_up() {
        let listing = r#"<html><body>
            <div class="card"><span class="t">One</span><img src="a.png"></div>
            <div class="card"><span class="t">Two</span><img></div>
        </body></html>"#;
        let doc = PageDocument::parse(listing, Url::parse("https://example.com/").unwrap());
        let opts = ExtractOptions {
            title: Some(".t".to_string()),
            image: Some(".card img".to_string()),
            ..Default::default()
        };
        let page = page_result_from_document(&doc, &opts);
        assert_eq!(page.titles, vec!["One", "Two"]);
        assert_eq!(page.images, vec!["a.png", ""]);
        assert!(page.authors.is_empty());
        assert!(page.dates.is_empty());
    }

    #[test]
    fn test_item_from_element_requires_url() {
        let listing = r#"<html><body>
            <div class="card"><a class="l" href="/story/1">One</a><p class="d">Desc</p></div>
            <div class="card"><p class="d">No link here</p></div>
        </body></html>"#;
        let doc = PageDocument::parse(listing, Url::parse("https://example.com/").unwrap());
        let selector = scraper::Selector::parse(".card").unwrap();
        let opts = ExtractOptions {
            title: Some(".l".to_string()),
            description: Some(".d".to_string()),
            url: Some(".l".to_string()),
            ..Default::default()
        };
        let items: Vec<_> = doc
            .html
            .select(&selector)
            .filter_map(|el| item_from_element(el, &opts))
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "/story/1");
        assert_eq!(items[0].title, "One");
        assert_eq!(items[0].description.as_deref(), Some("Desc"));
    }

    #[test]
    fn test_item_from_element_without_url_selector_is_none() {
        let doc = article_doc();
        let selector = scraper::Selector::parse("body").unwrap();
        let element = doc.html.select(&selector).next().unwrap();
        assert!(item_from_element(element, &full_options()).is_none());
    }
}
