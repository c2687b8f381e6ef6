//! Query dispatch to the search aggregator.
//!
//! Each workflow mode maps to one aggregator engine. A query is validated
//! when it is built, so a `SearchQuery` that exists is always dispatchable.

pub mod finance;
mod serpapi;

pub use finance::{extract_time, price_chart, FinanceQuote, PricePoint};
pub use serpapi::{build_params, parse_response, SerpApiClient};

use crate::error::{FinnError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One result record: field name to value, as returned by the aggregator.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The five workflow modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Youtube,
    Web,
    News,
    Hotels,
    Finance,
}

impl SearchMode {
    pub const ALL: [SearchMode; 5] = [
        SearchMode::Youtube,
        SearchMode::Web,
        SearchMode::News,
        SearchMode::Hotels,
        SearchMode::Finance,
    ];

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            SearchMode::Youtube => "YouTube search",
            SearchMode::Web => "Generic search",
            SearchMode::News => "Topic search",
            SearchMode::Hotels => "Hotel search",
            SearchMode::Finance => "Finance search",
        }
    }

    /// Response key holding the result collection.
    pub fn result_key(&self) -> &'static str {
        match self {
            SearchMode::Youtube => "video_results",
            SearchMode::Web => "organic_results",
            SearchMode::News => "news_results",
            SearchMode::Hotels => "properties",
            SearchMode::Finance => "graph",
        }
    }

    /// Number of results requested and displayed. Finance graphs are not truncated.
    pub fn top_k(&self) -> Option<usize> {
        match self {
            SearchMode::Youtube => Some(10),
            SearchMode::Web => Some(5),
            SearchMode::News => Some(7),
            SearchMode::Hotels => Some(7),
            SearchMode::Finance => None,
        }
    }

    /// Whether the selected items are videos to transcribe rather than pages to scrape.
    pub fn fetches_transcripts(&self) -> bool {
        matches!(self, SearchMode::Youtube)
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "youtube" | "yt" | "video" => Ok(SearchMode::Youtube),
            "web" | "generic" | "google" => Ok(SearchMode::Web),
            "news" | "topic" => Ok(SearchMode::News),
            "hotels" | "hotel" => Ok(SearchMode::Hotels),
            "finance" | "stock" => Ok(SearchMode::Finance),
            _ => Err(format!(
                "Unknown search mode: {}. Use youtube, web, news, hotels, or finance.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Youtube => write!(f, "youtube"),
            SearchMode::Web => write!(f, "web"),
            SearchMode::News => write!(f, "news"),
            SearchMode::Hotels => write!(f, "hotels"),
            SearchMode::Finance => write!(f, "finance"),
        }
    }
}

/// News topics offered in topic search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsTopic {
    Business,
    Technology,
    Sports,
}

impl NewsTopic {
    pub const ALL: [NewsTopic; 3] = [NewsTopic::Business, NewsTopic::Technology, NewsTopic::Sports];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsTopic::Business => "Business",
            NewsTopic::Technology => "Technology",
            NewsTopic::Sports => "Sports",
        }
    }
}

impl std::str::FromStr for NewsTopic {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "business" => Ok(NewsTopic::Business),
            "technology" | "tech" => Ok(NewsTopic::Technology),
            "sports" | "sport" => Ok(NewsTopic::Sports),
            _ => Err(format!("Unknown topic: {}. Use business, technology, or sports.", s)),
        }
    }
}

/// A validated, mode-tagged search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SearchQuery {
    Youtube {
        query: String,
    },
    Web {
        query: String,
    },
    News {
        topic: NewsTopic,
    },
    Hotels {
        place: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
        adults: u32,
    },
    Finance {
        symbol: String,
    },
}

impl SearchQuery {
    pub fn youtube(query: &str) -> Result<Self> {
        Ok(SearchQuery::Youtube {
            query: non_empty("search term", query)?,
        })
    }

    pub fn web(query: &str) -> Result<Self> {
        Ok(SearchQuery::Web {
            query: non_empty("search query", query)?,
        })
    }

    pub fn news(topic: NewsTopic) -> Self {
        SearchQuery::News { topic }
    }

    /// Build a hotel query from raw user input.
    pub fn hotels(place: &str, check_in: &str, check_out: &str, adults: &str) -> Result<Self> {
        let place = non_empty("place", place)?;
        let check_in = parse_date("check-in date", check_in)?;
        let check_out = parse_date("check-out date", check_out)?;

        if check_out <= check_in {
            return Err(FinnError::InvalidInput(format!(
                "check-out date {} must be after check-in date {}",
                check_out, check_in
            )));
        }

        let adults: u32 = non_empty("number of guests", adults)?
            .parse()
            .map_err(|_| FinnError::InvalidInput(format!("number of guests must be a whole number, got '{}'", adults.trim())))?;
        if adults == 0 {
            return Err(FinnError::InvalidInput("number of guests must be at least 1".to_string()));
        }

        Ok(SearchQuery::Hotels {
            place,
            check_in,
            check_out,
            adults,
        })
    }

    /// Build a finance query from a `TICKER:EXCHANGE` symbol.
    pub fn finance(symbol: &str) -> Result<Self> {
        static SYMBOL: OnceLock<Regex> = OnceLock::new();
        let pattern = SYMBOL.get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9.\-]+:[A-Za-z0-9.\-]+$").expect("valid symbol pattern")
        });

        let symbol = non_empty("symbol", symbol)?;
        if !pattern.is_match(&symbol) {
            return Err(FinnError::InvalidInput(format!(
                "'{}' is not a symbol with exchange, e.g. AMZN:NASDAQ",
                symbol
            )));
        }

        Ok(SearchQuery::Finance {
            symbol: symbol.to_uppercase(),
        })
    }

    pub fn mode(&self) -> SearchMode {
        match self {
            SearchQuery::Youtube { .. } => SearchMode::Youtube,
            SearchQuery::Web { .. } => SearchMode::Web,
            SearchQuery::News { .. } => SearchMode::News,
            SearchQuery::Hotels { .. } => SearchMode::Hotels,
            SearchQuery::Finance { .. } => SearchMode::Finance,
        }
    }

    /// Short human-readable description of the query.
    pub fn describe(&self) -> String {
        match self {
            SearchQuery::Youtube { query } | SearchQuery::Web { query } => query.clone(),
            SearchQuery::News { topic } => topic.as_str().to_string(),
            SearchQuery::Hotels {
                place,
                check_in,
                check_out,
                adults,
            } => format!("{} ({} to {}, {} guests)", place, check_in, check_out, adults),
            SearchQuery::Finance { symbol } => symbol.clone(),
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FinnError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = non_empty(field, value)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|_| FinnError::InvalidInput(format!("{} must look like 2024-06-25, got '{}'", field, value)))
}

/// Results of one search, in aggregator order.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub mode: SearchMode,
    pub records: Vec<Record>,
    /// Present for finance searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<FinanceQuote>,
}

impl SearchResults {
    /// The first `top_k` records for the mode.
    pub fn shortlist(&self) -> &[Record] {
        let limit = self.mode.top_k().unwrap_or(self.records.len());
        &self.records[..limit.min(self.records.len())]
    }

    /// Extract the `link` of every shortlisted record.
    pub fn links(&self) -> Vec<String> {
        self.shortlist()
            .iter()
            .filter_map(|r| r.get("link").and_then(|v| v.as_str()).map(str::to_string))
            .collect()
    }
}

/// Trait for search aggregator clients.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a query and return its result collection.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults>;
}
