//! SerpApi aggregator client.

use super::{FinanceQuote, Record, SearchMode, SearchProvider, SearchQuery, SearchResults};
use crate::config::SearchSettings;
use crate::error::{FinnError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SERVICE: &str = "SerpApi";

/// Client for the SerpApi `search.json` endpoint.
pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    settings: SearchSettings,
}

impl SerpApiClient {
    /// Create a client with the given key and search settings.
    pub fn new(api_key: &str, settings: &SearchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            settings: settings.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/search.json", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    #[instrument(skip(self), fields(mode = %query.mode()))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let params = build_params(query, &self.settings);
        debug!("Search parameters: {:?}", params);

        let resp = self
            .client
            .get(self.endpoint())
            .query(&params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FinnError::external(SERVICE, status.as_u16(), body));
        }

        let body: Value = resp.json().await?;
        let results = parse_response(query.mode(), body)?;
        info!("Search returned {} records", results.records.len());
        Ok(results)
    }
}

/// Build the aggregator parameters for a query (without the API key).
pub fn build_params(query: &SearchQuery, settings: &SearchSettings) -> Vec<(&'static str, String)> {
    let num = |mode: SearchMode| mode.top_k().unwrap_or_default().to_string();

    match query {
        SearchQuery::Youtube { query } => vec![
            ("engine", "youtube".to_string()),
            ("search_query", query.clone()),
            ("num", num(SearchMode::Youtube)),
        ],
        SearchQuery::Web { query } => vec![
            ("engine", "google".to_string()),
            ("q", query.clone()),
            ("hl", settings.hl.clone()),
            ("gl", settings.gl.clone()),
            ("num", num(SearchMode::Web)),
        ],
        SearchQuery::News { topic } => vec![
            ("engine", "google".to_string()),
            ("q", topic.as_str().to_string()),
            ("tbm", "nws".to_string()),
            ("hl", settings.hl.clone()),
            ("gl", settings.gl.clone()),
            ("num", num(SearchMode::News)),
        ],
        SearchQuery::Hotels {
            place,
            check_in,
            check_out,
            adults,
        } => vec![
            ("engine", "google_hotels".to_string()),
            ("q", place.clone()),
            ("check_in_date", check_in.format("%Y-%m-%d").to_string()),
            ("check_out_date", check_out.format("%Y-%m-%d").to_string()),
            ("adults", adults.to_string()),
            ("currency", settings.currency.clone()),
            ("gl", settings.gl.clone()),
            ("hl", settings.hl.clone()),
            ("num", num(SearchMode::Hotels)),
        ],
        SearchQuery::Finance { symbol } => vec![
            ("engine", "google_finance".to_string()),
            ("q", symbol.clone()),
        ],
    }
}

/// Extract the mode's result collection from a response body.
pub fn parse_response(mode: SearchMode, body: Value) -> Result<SearchResults> {
    if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
        return Err(FinnError::external(SERVICE, 200, message));
    }

    let key = mode.result_key();
    let records: Vec<Record> = body
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| FinnError::MissingResult(key.to_string()))?
        .iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();

    let quote = match mode {
        SearchMode::Finance => Some(FinanceQuote::from_response(&body)?),
        _ => None,
    };

    Ok(SearchResults {
        mode,
        records,
        quote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> SerpApiClient {
        let settings = SearchSettings {
            base_url,
            ..SearchSettings::default()
        };
        SerpApiClient::new("test-key", &settings).unwrap()
    }

    #[test]
    fn test_params_per_mode() {
        let settings = SearchSettings::default();

        let yt = build_params(&SearchQuery::youtube("rust async").unwrap(), &settings);
        assert_eq!(param(&yt, "engine"), Some("youtube"));
        assert_eq!(param(&yt, "search_query"), Some("rust async"));
        assert_eq!(param(&yt, "num"), Some("10"));

        let web = build_params(&SearchQuery::web("what is a hedge fund").unwrap(), &settings);
        assert_eq!(param(&web, "q"), Some("what is a hedge fund"));
        assert_eq!(param(&web, "hl"), Some("en"));
        assert_eq!(param(&web, "gl"), Some("us"));
        assert_eq!(param(&web, "num"), Some("5"));

        let news = build_params(&SearchQuery::news(crate::search::NewsTopic::Sports), &settings);
        assert_eq!(param(&news, "tbm"), Some("nws"));
        assert_eq!(param(&news, "num"), Some("7"));

        let hotels = build_params(
            &SearchQuery::hotels("Bali Resorts", "2024-06-25", "2024-07-06", "2").unwrap(),
            &settings,
        );
        assert_eq!(param(&hotels, "engine"), Some("google_hotels"));
        assert_eq!(param(&hotels, "check_in_date"), Some("2024-06-25"));
        assert_eq!(param(&hotels, "adults"), Some("2"));
        assert_eq!(param(&hotels, "currency"), Some("USD"));
    }

    #[test]
    fn test_finance_uses_user_symbol() {
        let params = build_params(&SearchQuery::finance("GOOGL:NASDAQ").unwrap(), &SearchSettings::default());
        assert_eq!(param(&params, "engine"), Some("google_finance"));
        assert_eq!(param(&params, "q"), Some("GOOGL:NASDAQ"));
    }

    #[test]
    fn test_parse_missing_key() {
        let err = parse_response(SearchMode::Web, json!({ "search_metadata": {} })).unwrap_err();
        assert!(matches!(err, FinnError::MissingResult(key) if key == "organic_results"));
    }

    #[test]
    fn test_parse_error_body() {
        let err = parse_response(SearchMode::News, json!({ "error": "Invalid API key." })).unwrap_err();
        assert!(matches!(err, FinnError::ExternalService { .. }));
        assert!(err.to_string().contains("Invalid API key."));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let app = Router::new().route(
            "/search.json",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("api_key").map(String::as_str), Some("test-key"));
                assert_eq!(params.get("q").map(String::as_str), Some("what is a hedge fund"));
                let results: Vec<Value> = (1..=5)
                    .map(|i| {
                        json!({
                            "position": i,
                            "title": format!("Result {}", i),
                            "link": format!("https://example.com/{}", i),
                            "snippet": "A hedge fund is..."
                        })
                    })
                    .collect();
                Json(json!({ "organic_results": results }))
            }),
        );

        let client = client_for(spawn_server(app).await);
        let results = client
            .search(&SearchQuery::web("what is a hedge fund").unwrap())
            .await
            .unwrap();

        assert_eq!(results.mode, SearchMode::Web);
        assert_eq!(results.records.len(), 5);
        assert_eq!(results.records[2]["title"], "Result 3");
    }

    #[tokio::test]
    async fn test_search_surfaces_http_errors() {
        let app = Router::new().route(
            "/search.json",
            get(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );

        let client = client_for(spawn_server(app).await);
        let err = client
            .search(&SearchQuery::youtube("anything").unwrap())
            .await
            .unwrap_err();

        match err {
            FinnError::ExternalService { status, message, .. } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
