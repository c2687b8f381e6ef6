//! Configuration settings for Finn.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub completion: CompletionSettings,
    pub transcription: TranscriptionSettings,
    pub scrape: ScrapeSettings,
    pub video: VideoSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary audio downloads.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/finn".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Search aggregator (SerpApi) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Base URL of the aggregator.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Interface language.
    pub hl: String,
    /// Country of the search.
    pub gl: String,
    /// Currency for hotel prices.
    pub currency: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com".to_string(),
            api_key_env: "SERPAPI_KEY".to_string(),
            hl: "en".to_string(),
            gl: "us".to_string(),
            currency: "USD".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Chat-completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Models offered in the interactive model picker.
    pub models: Vec<String>,
    /// Model used when none is chosen.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Stream the completion instead of waiting for the full response.
    pub stream: bool,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Alternative API base (OpenAI-compatible endpoints).
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            models: vec![
                "gpt-3.5-turbo-0125".to_string(),
                "gpt-4o-2024-05-13".to_string(),
            ],
            model: "gpt-3.5-turbo-0125".to_string(),
            temperature: 0.0,
            stream: false,
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_base: None,
            timeout_seconds: 300,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Segment length for audio over the upload limit, in seconds.
    pub segment_seconds: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            segment_seconds: 600,
        }
    }
}

/// Web page scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// Maximum characters per text chunk.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
    /// User agent sent with page requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 200,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) finn/0.1".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Talking-head video (D-ID) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Base URL of the talks API.
    pub base_url: String,
    /// Environment variable holding `username:password`.
    pub credentials_env: String,
    /// Still image the presenter is rendered from.
    pub source_image_url: String,
    /// Text-to-speech voice.
    pub voice_id: String,
    /// First delay between status polls, in milliseconds.
    pub poll_initial_delay_ms: u64,
    /// Upper bound for the delay between polls, in milliseconds.
    pub poll_max_delay_ms: u64,
    /// Backoff multiplier applied after each poll.
    pub poll_multiplier: f64,
    /// Overall deadline for a talk to finish, in seconds.
    pub poll_timeout_seconds: u64,
    /// Timeout for each request to the talks API, in seconds.
    pub request_timeout_seconds: u64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.d-id.com".to_string(),
            credentials_env: "DID_API_KEY".to_string(),
            source_image_url: String::new(),
            voice_id: "en-US-JennyNeural".to_string(),
            poll_initial_delay_ms: 1000,
            poll_max_delay_ms: 10_000,
            poll_multiplier: 2.0,
            poll_timeout_seconds: 300,
            request_timeout_seconds: 30,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FinnError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("finn")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion.timeout_seconds)
    }
}
