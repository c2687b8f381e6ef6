//! D-ID talks API client.

use super::{PollPolicy, VideoSynthesizer};
use crate::config::{VideoCredentials, VideoSettings};
use crate::error::{FinnError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SERVICE: &str = "D-ID";

#[derive(Debug, Serialize)]
struct TalkRequest<'a> {
    script: Script<'a>,
    config: TalkConfig,
    source_url: &'a str,
}

#[derive(Debug, Serialize)]
struct Script<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    subtitles: bool,
    provider: VoiceProvider<'a>,
    ssml: bool,
    input: &'a str,
}

#[derive(Debug, Serialize)]
struct VoiceProvider<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    voice_id: &'a str,
}

#[derive(Debug, Serialize)]
struct TalkConfig {
    fluent: bool,
    pad_audio: f32,
    driver_expressions: DriverExpressions,
}

#[derive(Debug, Serialize)]
struct DriverExpressions {
    expressions: Vec<Expression>,
}

#[derive(Debug, Serialize)]
struct Expression {
    start_frame: u32,
    expression: &'static str,
    intensity: f32,
}

/// Status of a talk as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TalkState {
    #[serde(default)]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub result_url: Option<String>,
}

/// Client for the talks endpoint.
pub struct DidClient {
    client: reqwest::Client,
    base_url: String,
    authorization: String,
    source_image_url: String,
    voice_id: String,
    policy: PollPolicy,
}

impl DidClient {
    pub fn new(credentials: &VideoCredentials, settings: &VideoSettings) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.request_timeout_seconds))
                .build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            authorization: credentials.authorization(),
            source_image_url: settings.source_image_url.clone(),
            voice_id: settings.voice_id.clone(),
            policy: PollPolicy::from(settings),
        })
    }

    /// Override the presenter image.
    pub fn with_source_image(mut self, url: impl Into<String>) -> Self {
        self.source_image_url = url.into();
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submit a talk and return its id.
    #[instrument(skip(self, script), fields(chars = script.len()))]
    pub async fn create_talk(&self, script: &str) -> Result<String> {
        if script.trim().is_empty() {
            return Err(FinnError::InvalidInput("Cannot render an empty script".to_string()));
        }
        if self.source_image_url.trim().is_empty() {
            return Err(FinnError::Config(
                "video.source_image_url is not set".to_string(),
            ));
        }

        let body = TalkRequest {
            script: Script {
                kind: "text",
                subtitles: false,
                provider: VoiceProvider {
                    kind: "microsoft",
                    voice_id: &self.voice_id,
                },
                ssml: false,
                input: script,
            },
            config: TalkConfig {
                fluent: false,
                pad_audio: 0.0,
                driver_expressions: DriverExpressions {
                    expressions: vec![Expression {
                        start_frame: 0,
                        expression: "happy",
                        intensity: 0.75,
                    }],
                },
            },
            source_url: &self.source_image_url,
        };

        let resp = self
            .client
            .post(format!("{}/talks", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FinnError::external(SERVICE, status.as_u16(), body));
        }

        let created: serde_json::Value = resp.json().await?;
        let id = created
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FinnError::MissingResult("id".to_string()))?;

        info!("Talk {} submitted", id);
        Ok(id.to_string())
    }

    /// Fetch the current state of a talk.
    pub async fn talk_status(&self, id: &str) -> Result<TalkState> {
        let resp = self
            .client
            .get(format!("{}/talks/{}", self.base_url, id))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FinnError::external(SERVICE, status.as_u16(), body));
        }

        Ok(resp.json().await?)
    }

    /// Poll until the talk is done, failed, or past the deadline.
    #[instrument(skip(self))]
    pub async fn wait_for_talk(&self, id: &str) -> Result<String> {
        self.within_deadline(self.poll(id)).await
    }

    async fn within_deadline<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        let deadline = self.policy.timeout;
        match tokio::time::timeout(deadline, work).await {
            Ok(result) => result,
            Err(_) => Err(FinnError::VideoTimeout(deadline)),
        }
    }

    async fn poll(&self, id: &str) -> Result<String> {
        let mut delay = self.policy.initial_delay;

        loop {
            let state = self.talk_status(id).await?;
            match state.status.as_str() {
                "done" => {
                    return state
                        .result_url
                        .filter(|url| !url.is_empty())
                        .ok_or_else(|| FinnError::MissingResult("result_url".to_string()));
                }
                "error" | "rejected" => {
                    return Err(FinnError::external(
                        SERVICE,
                        200,
                        format!("talk {} ended with status '{}'", id, state.status),
                    ));
                }
                other => {
                    debug!(status = other, ?delay, "Talk still rendering");
                    tokio::time::sleep(delay).await;
                    delay = self.policy.next_delay(delay);
                }
            }
        }
    }
}

#[async_trait]
impl VideoSynthesizer for DidClient {
    async fn synthesize(&self, script: &str) -> Result<String> {
        self.within_deadline(async {
            let id = self.create_talk(script).await?;
            self.poll(&id).await
        })
        .await
    }
}
