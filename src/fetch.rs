//! Fetching remote pages and querying the parsed result.
//!
//! [`DocumentSource`] owns the HTTP client for a scrape run: one client,
//! built once, with a request timeout and the crate's user agent. A fetch
//! succeeds only on a 2xx response — a transport failure or any other
//! status drops the page, and the caller decides whether that loses one
//! item or the whole run.
//!
//! [`PageDocument`] pairs the parsed HTML with the URL it came from, so
//! relative references found inside it can be resolved later.

use crate::error::ScrapeError;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Compile a caller-supplied selector, logging and discarding bad input.
///
/// Selectors come from per-site configuration; a typo there should skip
/// the field it configures, not abort the run.
pub(crate) fn compile_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(compiled) => Some(compiled),
        Err(error) => {
            warn!(selector, %error, "Invalid selector; skipping");
            None
        }
    }
}

pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Fetches URLs over HTTP and parses them into queryable documents.
pub struct DocumentSource {
    client: reqwest::Client,
}

impl DocumentSource {
    /// Build a source with the default request timeout.
    pub fn new() -> Result<Self, ScrapeError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a source with a caller-chosen per-request timeout. A timed-out
    /// fetch fails like any other transport error.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(DocumentSource { client })
    }

    /// Wrap an existing client, keeping whatever policy it was built with.
    pub fn from_client(client: reqwest::Client) -> Self {
        DocumentSource { client }
    }

    /// Fetch `url` and parse the body into a [`PageDocument`].
    ///
    /// Fails with [`ScrapeError::Transport`] on connection failure and
    /// [`ScrapeError::Status`] on any non-2xx response.
    pub async fn fetch(&self, url: &str) -> Result<PageDocument, ScrapeError> {
        let parsed = Url::parse(url).map_err(|source| ScrapeError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status,
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "Fetched document");
        Ok(PageDocument::parse(&body, parsed))
    }
}

/// A parsed HTML document together with its origin URL.
#[derive(Debug)]
pub struct PageDocument {
    /// The parsed DOM.
    pub html: Html,
    /// The URL the document was fetched from.
    pub url: Url,
}

impl PageDocument {
    /// Parse an HTML body fetched from `url`.
    pub fn parse(body: &str, url: Url) -> Self {
        PageDocument {
            html: Html::parse_document(body),
            url,
        }
    }

    /// Trimmed text of the first element matching `selector`, if any is
    /// non-empty.
    pub fn first_text(&self, selector: &str) -> Option<String> {
        let compiled = compile_selector(selector)?;
        let element = self.html.select(&compiled).next()?;
        let text = element_text(&element);
        (!text.is_empty()).then_some(text)
    }

    /// Inner HTML of the first element matching `selector`, if non-empty
    /// after trimming.
    pub fn first_inner_html(&self, selector: &str) -> Option<String> {
        let compiled = compile_selector(selector)?;
        let element = self.html.select(&compiled).next()?;
        let html = element.inner_html();
        (!html.trim().is_empty()).then_some(html)
    }

    /// Trimmed `attr` value of the first element matching `selector`, if
    /// present and non-empty.
    pub fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        let compiled = compile_selector(selector)?;
        self.html.select(&compiled).find_map(|element| {
            let value = element.value().attr(attr)?.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    }

    /// Trimmed text of every element matching `selector`, in match order.
    /// Empty matches are kept as empty strings so positions line up with
    /// sibling sequences.
    pub fn all_text(&self, selector: &str) -> Vec<String> {
        let Some(compiled) = compile_selector(selector) else {
            return Vec::new();
        };
        self.html
            .select(&compiled)
            .map(|element| element_text(&element))
            .collect()
    }

    /// Inner HTML of every element matching `selector`, in match order.
    pub fn all_inner_html(&self, selector: &str) -> Vec<String> {
        let Some(compiled) = compile_selector(selector) else {
            return Vec::new();
        };
        self.html
            .select(&compiled)
            .map(|element| element.inner_html())
            .collect()
    }

    /// `attr` value of every element matching `selector`, in match order,
    /// with an empty-string placeholder where the attribute is missing.
    pub fn all_attr(&self, selector: &str, attr: &str) -> Vec<String> {
        let Some(compiled) = compile_selector(selector) else {
            return Vec::new();
        };
        self.html
            .select(&compiled)
            .map(|element| element.value().attr(attr).unwrap_or_default().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve_pages;

    fn doc(body: &str) -> PageDocument {
        PageDocument::parse(body, Url::parse("https://example.com/list").unwrap())
    }

    #[test]
    fn test_first_text_trims() {
        let page = doc("<p class='t'>  hello world \n</p>");
        assert_eq!(page.first_text(".t"), Some("hello world".to_string()));
    }

    #[test]
    fn test_first_text_empty_match_is_none() {
        let page = doc("<p class='t'>   </p>");
        assert_eq!(page.first_text(".t"), None);
        assert_eq!(page.first_text(".missing"), None);
    }

    #[test]
    fn test_invalid_selector_is_none() {
        let page = doc("<p>x</p>");
        assert_eq!(page.first_text("p[["), None);
        assert!(page.all_text("p[[").is_empty());
    }

    #[test]
    fn test_all_attr_keeps_placeholders() {
        let page = doc(r#"<img src="a.png"><img><img src="b.png">"#);
        assert_eq!(page.all_attr("img", "src"), vec!["a.png", "", "b.png"]);
    }

    #[test]
    fn test_first_inner_html() {
        let page = doc("<div class='d'><b>bold</b> text</div>");
        assert_eq!(
            page.first_inner_html(".d"),
            Some("<b>bold</b> text".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_success_records_origin_url() {
        let base = serve_pages(vec![("/page", 200, "<h1 class='t'>Title</h1>")]).await;
        let source = DocumentSource::new().unwrap();
        let page = source.fetch(&format!("{base}/page")).await.unwrap();
        assert_eq!(page.url.path(), "/page");
        assert_eq!(page.first_text(".t"), Some("Title".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let base = serve_pages(vec![("/ok", 200, "<p>ok</p>")]).await;
        let err = DocumentSource::new()
            .unwrap()
            .fetch(&format!("{base}/gone"))
            .await
            .unwrap_err();
        match &err {
            ScrapeError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_error() {
        let err = DocumentSource::new()
            .unwrap()
            .fetch("not a url")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl { .. }));
    }
}
