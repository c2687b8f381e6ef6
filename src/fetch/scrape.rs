//! Web page scraping: load, split, concatenate, clean.

use super::{normalize_whitespace, remove_punctuation, ContentFetcher, ContentItem};
use crate::chunking::TextSplitter;
use crate::config::ScrapeSettings;
use crate::error::{FinnError, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, instrument};

/// Elements whose text never reaches the reader.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "svg"];

/// Trait for loading the visible text of a page.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String>;
}

/// Loads pages over HTTP and extracts their text.
pub struct HttpPageLoader {
    client: reqwest::Client,
}

impl HttpPageLoader {
    pub fn new(settings: &ScrapeSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    #[instrument(skip(self))]
    async fn load(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FinnError::Scrape(format!("{}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(FinnError::external(url, status.as_u16(), preview));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| FinnError::Scrape(format!("{}: {}", url, e)))?;
        debug!("Loaded {} bytes of HTML", html.len());

        Ok(html_to_text(&html))
    }
}

/// Extract readable text from an HTML document, one block per line.
pub fn html_to_text(html: &str) -> String {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();
    let spaces = SPACES.get_or_init(|| Regex::new(r"[ \t\u{a0}]+").expect("Invalid regex"));
    let blank_lines = BLANK_LINES.get_or_init(|| Regex::new(r"\n{3,}").expect("Invalid regex"));

    let document = Html::parse_document(html);
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });

        if !hidden {
            raw.push_str(text);
        }
    }

    let collapsed = spaces.replace_all(&raw, " ");
    let lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    blank_lines
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

/// Content fetcher for web pages.
pub struct PageScraper {
    loader: Arc<dyn PageLoader>,
    splitter: Arc<dyn TextSplitter>,
}

impl PageScraper {
    pub fn new(loader: Arc<dyn PageLoader>, splitter: Arc<dyn TextSplitter>) -> Self {
        Self { loader, splitter }
    }
}

#[async_trait]
impl ContentFetcher for PageScraper {
    #[instrument(skip(self))]
    async fn fetch(&self, source: &str) -> Result<ContentItem> {
        let text = self.loader.load(source).await?;
        let chunks = self.splitter.split(&text);
        debug!("Split page into {} chunks", chunks.len());

        // Chunks come back trimmed
        let joined = normalize_whitespace(&chunks.join(" "));
        let cleaned = remove_punctuation(&joined);

        if cleaned.trim().is_empty() {
            return Err(FinnError::Scrape(format!("{}: page has no readable text", source)));
        }

        Ok(ContentItem::new(source, cleaned))
    }
}
