//! HTTP API server for integration with other systems.
//!
//! Exposes each workflow step as a JSON endpoint.

use super::open_session;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::FinnError;
use crate::fetch::{format_items, parse_sources, ContentItem};
use crate::search::{FinanceQuote, SearchMode, SearchQuery};
use crate::session::{hotel_content, Session};
use crate::table::project_results;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    session: Session,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let session = open_session(settings, None)?;
    let app = router(Arc::new(AppState { session }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Finn API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Search", "POST /search");
    Output::kv("Fetch", "POST /fetch");
    Output::kv("Summarize", "POST /summarize");
    Output::kv("Video", "POST /video");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/fetch", post(fetch))
        .route("/summarize", post(summarize))
        .route("/video", post(video))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct SearchResponse {
    mode: SearchMode,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote: Option<FinanceQuote>,
}

#[derive(Deserialize)]
struct FetchRequest {
    mode: SearchMode,
    urls: Vec<String>,
}

#[derive(Serialize)]
struct FetchResponse {
    items: Vec<ContentItem>,
    failures: Vec<FailureInfo>,
}

#[derive(Serialize)]
struct FailureInfo {
    source: String,
    error: String,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    mode: SearchMode,
    prompt: String,
    /// Sources to fetch when no content is given.
    #[serde(default)]
    urls: Vec<String>,
    /// Ready-made content, e.g. hotel records.
    #[serde(default)]
    content: Option<String>,
    /// Hotel search to summarize.
    #[serde(default)]
    query: Option<SearchQuery>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Serialize)]
struct SummarizeResponse {
    answer: String,
    total_tokens: u32,
    sources: Vec<String>,
}

#[derive(Deserialize)]
struct VideoRequest {
    text: String,
}

#[derive(Serialize)]
struct VideoResponse {
    result_url: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A library error rendered as an HTTP response.
struct ApiError(FinnError);

impl From<FinnError> for ApiError {
    fn from(e: FinnError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FinnError::InvalidInput(_) | FinnError::InvalidTransition { .. } | FinnError::TimeParse(_) => {
                StatusCode::BAD_REQUEST
            }
            FinnError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            FinnError::ExternalService { .. } | FinnError::MissingResult(_) | FinnError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            FinnError::VideoTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let query = revalidate(query)?;
    let results = state.session.search(&query).await?;
    let table = project_results(&results);

    Ok(Json(SearchResponse {
        mode: results.mode,
        links: results.links(),
        headers: table.headers,
        rows: table.rows,
        quote: results.quote,
    }))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FetchRequest>,
) -> ApiResult<FetchResponse> {
    let sources = parse_sources(&req.urls.join(" "))?;
    let report = state.session.fetch(req.mode, &sources).await?;

    Ok(Json(FetchResponse {
        items: report.items,
        failures: report
            .failures
            .into_iter()
            .map(|f| FailureInfo {
                source: f.source,
                error: f.error.to_string(),
            })
            .collect(),
    }))
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> ApiResult<SummarizeResponse> {
    let (content, sources) = match (req.content, req.query) {
        (Some(content), _) => (content, Vec::new()),
        (None, Some(query)) => {
            let query = revalidate(query)?;
            if query.mode() != SearchMode::Hotels {
                return Err(FinnError::InvalidInput(
                    "Only hotel searches can be summarized directly".to_string(),
                )
                .into());
            }
            let results = state.session.search(&query).await?;
            (hotel_content(&results)?, Vec::new())
        }
        (None, None) => {
            let sources = parse_sources(&req.urls.join(" "))?;
            let report = state.session.fetch(req.mode, &sources).await?;
            let fetched = report.items.iter().map(|i| i.source.clone()).collect();
            (format_items(&report.items), fetched)
        }
    };

    let answer = state
        .session
        .ask(req.mode, req.model.as_deref(), &req.prompt, &content)
        .await?;

    Ok(Json(SummarizeResponse {
        answer: answer.text,
        total_tokens: answer.total_tokens,
        sources,
    }))
}

async fn video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VideoRequest>,
) -> ApiResult<VideoResponse> {
    let result_url = state.session.render_video(&req.text).await?;
    Ok(Json(VideoResponse { result_url }))
}

/// Queries arriving as JSON skip the constructors, so run them through again.
fn revalidate(query: SearchQuery) -> crate::error::Result<SearchQuery> {
    match query {
        SearchQuery::Youtube { query } => SearchQuery::youtube(&query),
        SearchQuery::Web { query } => SearchQuery::web(&query),
        SearchQuery::News { topic } => Ok(SearchQuery::news(topic)),
        SearchQuery::Hotels {
            place,
            check_in,
            check_out,
            adults,
        } => SearchQuery::hotels(
            &place,
            &check_in.to_string(),
            &check_out.to_string(),
            &adults.to_string(),
        ),
        SearchQuery::Finance { symbol } => SearchQuery::finance(&symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::RecursiveSplitter;
    use crate::error::Result;
    use crate::fetch::{ContentFetcher, PageLoader, PageScraper};
    use crate::llm::{CompletionClient, CompletionRequest, GeneratedAnswer};
    use crate::search::{parse_response, SearchProvider, SearchResults};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct CannedSearch;

    #[async_trait]
    impl SearchProvider for CannedSearch {
        async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
            let organic: Vec<Value> = (1..=6)
                .map(|i| json!({ "position": i, "title": format!("T{}", i), "link": format!("https://example.com/{}", i), "snippet": "s" }))
                .collect();
            parse_response(query.mode(), json!({ "organic_results": organic }))
        }
    }

    struct EchoPage;

    #[async_trait]
    impl PageLoader for EchoPage {
        async fn load(&self, url: &str) -> Result<String> {
            Ok(format!("Text from {}", url))
        }
    }

    struct NoTranscripts;

    #[async_trait]
    impl ContentFetcher for NoTranscripts {
        async fn fetch(&self, source: &str) -> Result<ContentItem> {
            Err(FinnError::AudioDownload(source.to_string()))
        }
    }

    struct CountingCompletion;

    #[async_trait]
    impl CompletionClient for CountingCompletion {
        async fn complete(&self, request: &CompletionRequest) -> Result<GeneratedAnswer> {
            Ok(GeneratedAnswer {
                text: format!("{} chars", request.messages[1].content.len()),
                total_tokens: 7,
            })
        }
    }

    async fn spawn_api() -> String {
        let session = Session::with_components(
            Settings::default(),
            Arc::new(CannedSearch),
            Arc::new(NoTranscripts),
            Arc::new(PageScraper::new(Arc::new(EchoPage), Arc::new(RecursiveSplitter::default()))),
            Arc::new(CountingCompletion),
            None,
        );
        let app = router(Arc::new(AppState { session }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_api().await;
        let body: Value = reqwest::get(format!("{}/health", base)).await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_search_returns_table() {
        let base = spawn_api().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/search", base))
            .json(&json!({ "mode": "web", "query": "what is a hedge fund" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["headers"], json!(["Position", "Title", "Link", "Snippet"]));
        assert_eq!(body["rows"].as_array().unwrap().len(), 5);
        assert_eq!(body["links"][0], "https://example.com/1");
    }

    #[tokio::test]
    async fn test_blank_query_is_bad_request() {
        let base = spawn_api().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/search", base))
            .json(&json!({ "mode": "web", "query": "   " }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_summarize_fetches_urls() {
        let base = spawn_api().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/summarize", base))
            .json(&json!({
                "mode": "web",
                "prompt": "Summarize",
                "urls": ["https://example.com/1"]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["sources"], json!(["https://example.com/1"]));
        assert_eq!(body["total_tokens"], 7);
    }

    #[tokio::test]
    async fn test_video_without_credentials() {
        let base = spawn_api().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/video", base))
            .json(&json!({ "text": "hello" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);
    }
}
