//! A configured session: the clients one workflow run needs.
//!
//! Each step of the workflow is a method here, so the CLI, the HTTP API and
//! the tests all drive the same code.

use crate::audio::YtDlpDownloader;
use crate::chunking::{ChunkingConfig, RecursiveSplitter};
use crate::config::{Secrets, Settings};
use crate::error::{FinnError, Result};
use crate::fetch::{
    fetch_all, ContentFetcher, FetchReport, HttpPageLoader, PageScraper, TranscriptFetcher,
};
use crate::llm::{build_prompt, CompletionClient, CompletionRequest, GeneratedAnswer, OpenAiCompletion};
use crate::openai::create_client;
use crate::search::{SearchMode, SearchProvider, SearchQuery, SearchResults, SerpApiClient};
use crate::transcription::WhisperTranscriber;
use crate::video::{DidClient, VideoSynthesizer};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Owns every external client used by one workflow run.
pub struct Session {
    settings: Settings,
    search: Arc<dyn SearchProvider>,
    transcripts: Arc<dyn ContentFetcher>,
    pages: Arc<dyn ContentFetcher>,
    completion: Arc<dyn CompletionClient>,
    video: Option<Arc<dyn VideoSynthesizer>>,
}

impl Session {
    /// Build a session with the real service clients.
    ///
    /// Search and completion keys are required. The talking-head client is
    /// only built when its credentials are present.
    pub fn new(settings: Settings, secrets: &Secrets) -> Result<Self> {
        let search = Arc::new(SerpApiClient::new(
            secrets.search_api_key(&settings)?,
            &settings.search,
        )?);

        let openai = create_client(
            secrets.openai_api_key(&settings)?,
            settings.completion.api_base.as_deref(),
            settings.completion_timeout(),
        )?;

        let transcripts = Arc::new(TranscriptFetcher::new(
            Arc::new(YtDlpDownloader::new()),
            Arc::new(
                WhisperTranscriber::new(openai.clone(), &settings.transcription.model)
                    .with_segment_seconds(settings.transcription.segment_seconds),
            ),
            settings.temp_dir(),
        ));

        let pages = Arc::new(PageScraper::new(
            Arc::new(HttpPageLoader::new(&settings.scrape)?),
            Arc::new(RecursiveSplitter::new(ChunkingConfig::from(&settings.scrape))),
        ));

        let completion = Arc::new(OpenAiCompletion::new(openai));

        let video: Option<Arc<dyn VideoSynthesizer>> = if secrets.video_credentials.is_some() {
            let credentials = secrets.video_credentials(&settings)?;
            Some(Arc::new(DidClient::new(&credentials, &settings.video)?))
        } else {
            None
        };

        Ok(Self {
            settings,
            search,
            transcripts,
            pages,
            completion,
            video,
        })
    }

    /// Build a session from explicit components.
    pub fn with_components(
        settings: Settings,
        search: Arc<dyn SearchProvider>,
        transcripts: Arc<dyn ContentFetcher>,
        pages: Arc<dyn ContentFetcher>,
        completion: Arc<dyn CompletionClient>,
        video: Option<Arc<dyn VideoSynthesizer>>,
    ) -> Self {
        Self {
            settings,
            search,
            transcripts,
            pages,
            completion,
            video,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether answers can be rendered as video.
    pub fn can_render_video(&self) -> bool {
        self.video.is_some()
    }

    /// Run a search.
    #[instrument(skip(self), fields(mode = %query.mode()))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let results = self.search.search(query).await?;
        info!("Search returned {} records", results.records.len());
        Ok(results)
    }

    /// Fetch content for the selected sources.
    ///
    /// Video modes transcribe, the rest scrape. Fails only when every source
    /// failed.
    #[instrument(skip(self, sources), fields(count = sources.len()))]
    pub async fn fetch(&self, mode: SearchMode, sources: &[String]) -> Result<FetchReport> {
        let fetcher = match mode {
            SearchMode::Youtube => &self.transcripts,
            SearchMode::Web | SearchMode::News => &self.pages,
            SearchMode::Hotels | SearchMode::Finance => {
                return Err(FinnError::InvalidInput(format!(
                    "{} results are not fetched",
                    mode
                )))
            }
        };

        let report = fetch_all(fetcher.as_ref(), sources).await.require_content()?;
        for failure in &report.failures {
            warn!("Skipped {}: {}", failure.source, failure.error);
        }
        Ok(report)
    }

    /// Ask the model about some content.
    ///
    /// `model` falls back to the configured default.
    #[instrument(skip(self, instruction, content))]
    pub async fn ask(
        &self,
        mode: SearchMode,
        model: Option<&str>,
        instruction: &str,
        content: &str,
    ) -> Result<GeneratedAnswer> {
        if instruction.trim().is_empty() {
            return Err(FinnError::InvalidInput("The prompt cannot be empty".to_string()));
        }
        if content.trim().is_empty() {
            return Err(FinnError::InvalidInput("There is no content to ask about".to_string()));
        }

        let request = CompletionRequest {
            model: model.unwrap_or(&self.settings.completion.model).to_string(),
            messages: build_prompt(mode, instruction, content),
            temperature: self.settings.completion.temperature,
            stream: self.settings.completion.stream,
        };

        self.completion.complete(&request).await
    }

    /// Render an answer as a talking-head video and return its URL.
    pub async fn render_video(&self, script: &str) -> Result<String> {
        let video = self.video.as_ref().ok_or_else(|| {
            FinnError::Config(format!(
                "{} is not set, video answers are unavailable",
                self.settings.video.credentials_env
            ))
        })?;
        video.synthesize(script).await
    }
}

/// Prompt content for hotel results: the shortlisted properties as JSON.
pub fn hotel_content(results: &SearchResults) -> Result<String> {
    Ok(serde_json::to_string_pretty(results.shortlist())?)
}
