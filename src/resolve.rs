//! URL resolution against a feed's source URL.
//!
//! Extracted description HTML is shown outside its originating page, where
//! relative links would be broken. [`make_links_absolute`] rewrites anchors
//! and images in a fetched document before any field is extracted, so every
//! URL that reaches a feed item is already absolute.

use once_cell::sync::Lazy;
use scraper::{Html, Node, Selector};
use tracing::trace;
use url::Url;

static ANCHOR_OR_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a, img").expect("static selector"));

/// Resolve `path` against `base`.
///
/// An already-absolute URL is returned as-is. A relative reference
/// (path-relative, authority-relative, fragment-only, query-only) is
/// resolved with standard reference-resolution rules. A string that cannot
/// be parsed as a URL at all is returned unchanged — resolution is
/// best-effort and never fails the caller.
pub fn absolute(base: &Url, path: &str) -> String {
    match Url::parse(path) {
        Ok(abs) => abs.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => base
            .join(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| path.to_string()),
        Err(_) => path.to_string(),
    }
}

/// Rewrite every anchor `href` and image `src` in `html` to absolute form.
///
/// Attributes that are absent, empty, or already absolute are left
/// untouched.
pub fn make_links_absolute(html: &mut Html, base: &Url) {
    let mut rewrites = Vec::new();
    for element in html.select(&ANCHOR_OR_IMAGE) {
        for attr_name in ["href", "src"] {
            let Some(value) = element.value().attr(attr_name) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if let Err(url::ParseError::RelativeUrlWithoutBase) = Url::parse(value) {
                if let Ok(resolved) = base.join(value) {
                    rewrites.push((element.id(), attr_name, resolved.to_string()));
                }
            }
        }
    }
    trace!(count = rewrites.len(), "Rewriting relative links");
    for (id, attr_name, resolved) in rewrites {
        if let Some(mut node) = html.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                for (name, value) in element.attrs.iter_mut() {
                    if name.local.as_ref() == attr_name {
                        *value = resolved.as_str().into();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/a/").unwrap()
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(absolute(&base(), "b.html"), "https://example.com/a/b.html");
    }

    #[test]
    fn test_root_relative_path() {
        assert_eq!(absolute(&base(), "/c.html"), "https://example.com/c.html");
    }

    #[test]
    fn test_absolute_url_unchanged() {
        assert_eq!(absolute(&base(), "https://other.com/x"), "https://other.com/x");
    }

    #[test]
    fn test_protocol_relative_authority() {
        assert_eq!(absolute(&base(), "//other.com/x"), "https://other.com/x");
    }

    #[test]
    fn test_fragment_and_query_only() {
        assert_eq!(absolute(&base(), "#sec"), "https://example.com/a/#sec");
        assert_eq!(absolute(&base(), "?page=2"), "https://example.com/a/?page=2");
    }

    #[test]
    fn test_unparseable_path_unchanged() {
        // "https://" parses far enough to fail with an empty host, which is
        // not a resolvable relative reference.
        assert_eq!(absolute(&base(), "https://"), "https://");
    }

    #[test]
    fn test_make_links_absolute_rewrites_relative_only() {
        let mut html = Html::parse_document(
            r#"<html><body>
                <a href="/story/1">one</a>
                <a href="next.html">two</a>
                <a href="https://other.com/x">three</a>
                <a>no href</a>
                <img src="pic.png">
                <img src="https://cdn.example.com/abs.png">
            </body></html>"#,
        );
        make_links_absolute(&mut html, &base());

        let anchors = Selector::parse("a").unwrap();
        let hrefs: Vec<_> = html
            .select(&anchors)
            .filter_map(|el| el.value().attr("href"))
            .collect();
        assert_eq!(
            hrefs,
            vec![
                "https://example.com/story/1",
                "https://example.com/a/next.html",
                "https://other.com/x",
            ]
        );

        let images = Selector::parse("img").unwrap();
        let srcs: Vec<_> = html
            .select(&images)
            .filter_map(|el| el.value().attr("src"))
            .collect();
        assert_eq!(
            srcs,
            vec![
                "https://example.com/a/pic.png",
                "https://cdn.example.com/abs.png",
            ]
        );
    }
}
