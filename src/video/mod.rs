//! Answer presentation: plain text or a talking-head video.

mod did;

pub use did::{DidClient, TalkState};

use crate::config::VideoSettings;
use crate::error::{FinnError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// How a generated answer is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    #[default]
    Text,
    TalkingHead,
}

impl FromStr for Presentation {
    type Err = FinnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Presentation::Text),
            "video" | "talking-head" | "talking_head" => Ok(Presentation::TalkingHead),
            other => Err(FinnError::InvalidInput(format!(
                "Unknown presentation '{}'. Use 'text' or 'video'.",
                other
            ))),
        }
    }
}

/// Backoff schedule for polling a rendering job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub timeout: Duration,
}

impl PollPolicy {
    /// Delay to wait after `current`, capped at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let grown = current.mul_f64(self.multiplier.max(1.0));
        grown.min(self.max_delay)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&VideoSettings::default())
    }
}

impl From<&VideoSettings> for PollPolicy {
    fn from(settings: &VideoSettings) -> Self {
        Self {
            initial_delay: Duration::from_millis(settings.poll_initial_delay_ms),
            max_delay: Duration::from_millis(settings.poll_max_delay_ms),
            multiplier: settings.poll_multiplier,
            timeout: Duration::from_secs(settings.poll_timeout_seconds),
        }
    }
}

/// Trait for services that turn a script into a presenter video.
#[async_trait]
pub trait VideoSynthesizer: Send + Sync {
    /// Render `script` and return the URL of the finished video.
    async fn synthesize(&self, script: &str) -> Result<String>;
}
