//! OpenAI Whisper transcription implementation.

use super::Transcriber;
use crate::audio::split_audio;
use crate::error::{FinnError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Largest file the transcription endpoint accepts.
const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
    segment_seconds: u32,
}

impl WhisperTranscriber {
    /// Create a transcriber using an existing client.
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            segment_seconds: 600,
        }
    }

    /// Length of the pieces that oversized audio is cut into.
    pub fn with_segment_seconds(mut self, seconds: u32) -> Self {
        self.segment_seconds = seconds;
        self
    }

    async fn transcribe_file(&self, audio_path: &Path) -> Result<String> {
        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| FinnError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| FinnError::Transcription(format!("Whisper API error: {}", e)))?;

        Ok(response.text.trim().to_string())
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let size = tokio::fs::metadata(audio_path).await?.len();

        let text = if size <= MAX_UPLOAD_BYTES {
            debug!("Transcribing audio file");
            self.transcribe_file(audio_path).await?
        } else {
            let workdir = tempfile::tempdir()?;
            let segments = split_audio(audio_path, workdir.path(), self.segment_seconds).await?;
            info!("Audio is {} bytes, transcribing {} segments", size, segments.len());

            let mut parts = Vec::with_capacity(segments.len());
            for segment in &segments {
                parts.push(self.transcribe_file(segment).await?);
            }
            parts.join(" ")
        };

        debug!("Transcribed {} characters", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::create_client;
    use axum::{routing::post, Json, Router};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_small_file_goes_up_in_one_request() {
        let app = Router::new().route(
            "/v1/audio/transcriptions",
            post(|| async { Json(json!({ "text": "  A hedge fund pools capital.  " })) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("clip.mp3");
        std::fs::write(&audio, b"not really audio").unwrap();

        let client = create_client("sk-test", Some(&format!("http://{}/v1", addr)), Duration::from_secs(5)).unwrap();
        let text = WhisperTranscriber::new(client, "whisper-1")
            .transcribe(&audio)
            .await
            .unwrap();
        assert_eq!(text, "A hedge fund pools capital.");
    }
}
