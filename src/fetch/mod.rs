//! Content fetching for selected search results.
//!
//! Two fetchers exist: transcripts for video sources and cleaned page text
//! for web sources. Batches are processed one item at a time in input order,
//! and a failing item never hides the items that succeeded.

mod scrape;
mod text;
mod transcript;

pub use scrape::{html_to_text, HttpPageLoader, PageLoader, PageScraper};
pub use text::{normalize_whitespace, remove_punctuation};
pub use transcript::TranscriptFetcher;

use crate::error::{FinnError, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

/// Extracted text for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    /// URL the text came from.
    pub source: String,
    pub text: String,
}

impl ContentItem {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A source that could not be fetched.
#[derive(Debug)]
pub struct FetchFailure {
    pub source: String,
    pub error: FinnError,
}

/// Outcome of fetching a batch of sources.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Successfully fetched items, in input order.
    pub items: Vec<ContentItem>,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    /// Fail when nothing could be fetched; otherwise keep the partial batch.
    pub fn require_content(mut self) -> Result<Self> {
        if !self.items.is_empty() {
            return Ok(self);
        }
        if self.failures.is_empty() {
            return Err(FinnError::InvalidInput("no sources to fetch".to_string()));
        }
        Err(self.failures.remove(0).error)
    }
}

/// Trait for per-source content fetchers.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch and extract text for one source.
    async fn fetch(&self, source: &str) -> Result<ContentItem>;
}

/// Fetch every source sequentially, isolating per-item failures.
pub async fn fetch_all(fetcher: &dyn ContentFetcher, sources: &[String]) -> FetchReport {
    let mut report = FetchReport::default();

    for (i, source) in sources.iter().enumerate() {
        info!("Fetching {}/{}: {}", i + 1, sources.len(), source);
        match fetcher.fetch(source).await {
            Ok(item) => report.items.push(item),
            Err(error) => {
                warn!("Failed to fetch {}: {}", source, error);
                report.failures.push(FetchFailure {
                    source: source.clone(),
                    error,
                });
            }
        }
    }

    report
}

/// Split user input into source URLs, separated by whitespace.
pub fn parse_sources(input: &str) -> Result<Vec<String>> {
    let sources: Vec<String> = input.split_whitespace().map(str::to_string).collect();

    if sources.is_empty() {
        return Err(FinnError::InvalidInput("enter at least one URL".to_string()));
    }

    for source in &sources {
        let parsed = url::Url::parse(source)
            .map_err(|e| FinnError::InvalidInput(format!("'{}' is not a valid URL: {}", source, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FinnError::InvalidInput(format!(
                "'{}' must be an http or https URL",
                source
            )));
        }
    }

    Ok(sources)
}

/// Join fetched items into one content message, one headed block per source.
pub fn format_items(items: &[ContentItem]) -> String {
    items
        .iter()
        .map(|item| format!("Source: {}\n{}", item.source, item.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyFetcher;

    #[async_trait]
    impl ContentFetcher for FlakyFetcher {
        async fn fetch(&self, source: &str) -> Result<ContentItem> {
            if source.contains("broken") {
                Err(FinnError::Scrape(format!("cannot load {}", source)))
            } else {
                Ok(ContentItem::new(source, format!("text of {}", source)))
            }
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fetch_all_isolates_failures() {
        let sources = urls(&["https://a.com", "https://broken.com", "https://c.com"]);
        let report = fetch_all(&FlakyFetcher, &sources).await;

        assert_eq!(
            report.items,
            vec![
                ContentItem::new("https://a.com", "text of https://a.com"),
                ContentItem::new("https://c.com", "text of https://c.com"),
            ]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "https://broken.com");
        assert!(report.require_content().is_ok());
    }

    #[tokio::test]
    async fn test_all_failed_surfaces_error() {
        let report = fetch_all(&FlakyFetcher, &urls(&["https://broken.com"])).await;
        let err = report.require_content().unwrap_err();
        assert!(matches!(err, FinnError::Scrape(_)));
    }

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            parse_sources("https://a.com  https://b.com/x?y=1\n").unwrap(),
            urls(&["https://a.com", "https://b.com/x?y=1"])
        );
        assert!(matches!(parse_sources("   "), Err(FinnError::InvalidInput(_))));
        assert!(parse_sources("not-a-url").is_err());
        assert!(parse_sources("ftp://files.example.com/a").is_err());
    }

    #[test]
    fn test_format_items() {
        let items = vec![
            ContentItem::new("https://a.com", "alpha"),
            ContentItem::new("https://b.com", "beta"),
        ];
        assert_eq!(
            format_items(&items),
            "Source: https://a.com\nalpha\n\n---\n\nSource: https://b.com\nbeta"
        );
    }
}
