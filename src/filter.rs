//! Post-assembly item cleaning.
//!
//! Filtering runs after the item set is assembled: items whose title or
//! description contains a blacklisted word are dropped; the survivors get
//! their descriptions re-parsed and scrubbed of scripts, configured
//! selectors, and text blocks. Filtering never fails a run — a bad
//! removal selector is skipped and an untouched description is returned
//! as-is.

use crate::fetch::compile_selector;
use crate::models::{FeedItem, Filters};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("static selector"));

static TEXT_BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, div").expect("static selector"));

/// Case-insensitive containment against a word blacklist.
fn contains_any(text: &str, words: &[String]) -> bool {
    if words.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    words
        .iter()
        .any(|word| !word.is_empty() && lower.contains(&word.to_lowercase()))
}

/// Strip scripts, configured selectors, and matching text blocks from a
/// description fragment, returning the re-serialized result.
///
/// When nothing matches, the original string is returned untouched.
fn scrub_description(description: &str, filters: &Filters) -> String {
    let mut fragment = Html::parse_fragment(description);

    let mut doomed = Vec::new();
    for element in fragment.select(&SCRIPT) {
        doomed.push(element.id());
    }
    for raw in &filters.selectors {
        let Some(selector) = compile_selector(raw) else {
            continue;
        };
        for element in fragment.select(&selector) {
            doomed.push(element.id());
        }
    }
    if !filters.text.is_empty() {
        for element in fragment.select(&TEXT_BLOCKS) {
            let text: String = element.text().collect();
            if filters
                .text
                .iter()
                .any(|fragment_text| !fragment_text.is_empty() && text.contains(fragment_text))
            {
                doomed.push(element.id());
            }
        }
    }

    if doomed.is_empty() {
        return description.to_string();
    }
    debug!(removed = doomed.len(), "Stripping description content");
    for id in doomed {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }
    fragment.root_element().inner_html()
}

/// Drop blacklisted items and scrub the descriptions of the survivors.
///
/// Output order equals input order.
pub fn filter_items(items: Vec<FeedItem>, filters: &Filters) -> Vec<FeedItem> {
    items
        .into_iter()
        .filter(|item| {
            let title_hit = contains_any(&item.title, &filters.titles);
            let description_hit = item
                .description
                .as_deref()
                .is_some_and(|d| contains_any(d, &filters.descriptions));
            if title_hit || description_hit {
                debug!(link = %item.link, "Dropping blacklisted item");
            }
            !(title_hit || description_hit)
        })
        .map(|mut item| {
            if let Some(description) = item.description.take() {
                item.description = Some(scrub_description(&description, filters));
            }
            item
        })
        .collect()
}
