//! API credentials read from the environment.
//!
//! Secrets are never written to the config file. Each session reads them
//! once and hands them to the clients that need them.

use super::Settings;
use crate::error::{FinnError, Result};

/// Username/password pair for the talking-head service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCredentials {
    pub username: String,
    pub password: String,
}

impl VideoCredentials {
    /// Parse a `username:password` pair. The password may itself contain colons.
    pub fn parse(raw: &str) -> Result<Self> {
        let (username, password) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| FinnError::Config("Video credentials must look like 'username:password'".to_string()))?;

        if username.is_empty() || password.is_empty() {
            return Err(FinnError::Config(
                "Video credentials must have a non-empty username and password".to_string(),
            ));
        }

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Value of the `Authorization` header, sent as the service issues it.
    pub fn authorization(&self) -> String {
        format!("Basic {}:{}", self.username, self.password)
    }
}

/// All credentials a session may need.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub search_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub video_credentials: Option<String>,
}

impl Secrets {
    /// Read credentials from the environment variables named in the settings.
    pub fn from_env(settings: &Settings) -> Self {
        Self {
            search_api_key: read_env(&settings.search.api_key_env),
            openai_api_key: read_env(&settings.completion.api_key_env),
            video_credentials: read_env(&settings.video.credentials_env),
        }
    }

    pub fn search_api_key(&self, settings: &Settings) -> Result<&str> {
        self.search_api_key
            .as_deref()
            .ok_or_else(|| missing(&settings.search.api_key_env))
    }

    pub fn openai_api_key(&self, settings: &Settings) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| missing(&settings.completion.api_key_env))
    }

    pub fn video_credentials(&self, settings: &Settings) -> Result<VideoCredentials> {
        let raw = self
            .video_credentials
            .as_deref()
            .ok_or_else(|| missing(&settings.video.credentials_env))?;
        VideoCredentials::parse(raw)
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn missing(name: &str) -> FinnError {
    FinnError::Config(format!("{} not set. Set it with: export {}='...'", name, name))
}
