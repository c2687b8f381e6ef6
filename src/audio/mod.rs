//! Audio download for video sources.

mod downloader;

pub use downloader::{download_audio, split_audio, YtDlpDownloader};

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Trait for fetching the audio track of a video URL.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Download the audio of `url` into `output_dir` and return the file path.
    async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf>;
}

/// Derive a file-name-safe identifier for a media URL.
///
/// YouTube URLs yield their 11-character video ID; anything else gets a
/// random identifier.
pub fn media_id(url: &str) -> String {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    let regex = VIDEO_ID.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)
            ([a-zA-Z0-9_-]{11})
        ",
        )
        .expect("Invalid regex")
    });

    regex
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
}
