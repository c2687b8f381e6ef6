//! Video transcripts: download audio, then transcribe.

use super::{ContentFetcher, ContentItem};
use crate::audio::AudioDownloader;
use crate::error::Result;
use crate::transcription::Transcriber;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// Content fetcher for video URLs.
///
/// Each download lands in its own temporary directory, removed once the
/// transcript is back.
pub struct TranscriptFetcher {
    downloader: Arc<dyn AudioDownloader>,
    transcriber: Arc<dyn Transcriber>,
    temp_root: PathBuf,
}

impl TranscriptFetcher {
    pub fn new(
        downloader: Arc<dyn AudioDownloader>,
        transcriber: Arc<dyn Transcriber>,
        temp_root: PathBuf,
    ) -> Self {
        Self {
            downloader,
            transcriber,
            temp_root,
        }
    }
}

#[async_trait]
impl ContentFetcher for TranscriptFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, source: &str) -> Result<ContentItem> {
        std::fs::create_dir_all(&self.temp_root)?;
        let workdir = tempfile::Builder::new()
            .prefix("audio-")
            .tempdir_in(&self.temp_root)?;

        let audio_path = self.downloader.download(source, workdir.path()).await?;
        let transcript = self.transcriber.transcribe(&audio_path).await?;
        info!("Transcribed {} characters from {}", transcript.len(), source);

        Ok(ContentItem::new(source, transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinnError;
    use crate::fetch::fetch_all;
    use std::path::Path;
    use std::sync::Mutex;

    struct FakeDownloader;

    #[async_trait]
    impl AudioDownloader for FakeDownloader {
        async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
            if url.contains("private") {
                return Err(FinnError::AudioDownload("video unavailable".to_string()));
            }
            let id = url.rsplit('=').next().unwrap_or("audio");
            let path = output_dir.join(format!("{}.mp3", id));
            std::fs::write(&path, id.as_bytes())?;
            Ok(path)
        }
    }

    #[derive(Default)]
    struct FakeTranscriber {
        seen: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, audio_path: &Path) -> Result<String> {
            self.seen.lock().unwrap().push(audio_path.to_path_buf());
            let bytes = std::fs::read(audio_path)?;
            Ok(format!("transcript of {}", String::from_utf8_lossy(&bytes)))
        }
    }

    #[tokio::test]
    async fn test_transcripts_in_order_with_cleanup() {
        let temp_root = tempfile::tempdir().unwrap();
        let transcriber = Arc::new(FakeTranscriber::default());
        let fetcher = TranscriptFetcher::new(
            Arc::new(FakeDownloader),
            transcriber.clone(),
            temp_root.path().to_path_buf(),
        );

        let sources = vec![
            "https://www.youtube.com/watch?v=first".to_string(),
            "https://www.youtube.com/watch?v=private".to_string(),
            "https://www.youtube.com/watch?v=third".to_string(),
        ];
        let report = fetch_all(&fetcher, &sources).await;

        let texts: Vec<&str> = report.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["transcript of first", "transcript of third"]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, FinnError::AudioDownload(_)));

        for path in transcriber.seen.lock().unwrap().iter() {
            assert!(!path.exists(), "audio file should be removed: {:?}", path);
        }
    }
}
