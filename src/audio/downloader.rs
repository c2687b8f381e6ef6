//! Audio download via yt-dlp.
//!
//! yt-dlp extracts the audio track and ffmpeg normalizes anything that is
//! not already MP3.

use super::{media_id, AudioDownloader};
use crate::error::{FinnError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Downloader backed by the `yt-dlp` command-line tool.
#[derive(Debug, Clone, Default)]
pub struct YtDlpDownloader;

impl YtDlpDownloader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        download_audio(url, output_dir).await
    }
}

/// Downloads the audio of a video URL and saves it as MP3.
#[instrument(skip(output_dir))]
pub async fn download_audio(url: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let id = media_id(url);
    let target_path = output_dir.join(format!("{}.mp3", id));

    info!("Downloading audio from {}", url);

    let template = output_dir.join(format!("{}.%(ext)s", id));

    let result = Command::new("yt-dlp")
        .arg("--extract-audio")
        .arg("--audio-format").arg("mp3")
        .arg("--format").arg("bestaudio/best")
        .arg("--output").arg(&template)
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FinnError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(FinnError::AudioDownload(format!("yt-dlp execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FinnError::AudioDownload(format!("yt-dlp failed for {url}: {}", stderr.trim())));
    }

    let downloaded = find_audio_file(output_dir, &id)?;

    if downloaded != target_path {
        normalize_to_mp3(&downloaded, &target_path).await?;
        let _ = std::fs::remove_file(&downloaded);
    }

    Ok(target_path)
}

/// Locates a downloaded audio file by media ID.
fn find_audio_file(dir: &Path, id: &str) -> Result<PathBuf> {
    for ext in &["mp3", "m4a", "opus", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| FinnError::AudioDownload(format!("Cannot read directory: {e}")))?;

    entries
        .flatten()
        .find(|entry| entry.file_name().to_string_lossy().starts_with(id))
        .map(|entry| entry.path())
        .ok_or_else(|| FinnError::AudioDownload("Audio file not found after download".into()))
}

/// Converts an audio file to MP3 using ffmpeg.
async fn normalize_to_mp3(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to MP3", source);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("5")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(FinnError::AudioDownload(format!("ffmpeg conversion failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FinnError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(FinnError::AudioDownload(format!("ffmpeg error: {e}"))),
    }
}

/// Splits an audio file into consecutive segments of at most `segment_seconds`.
///
/// Audio no longer than one segment comes back unchanged.
#[instrument(skip(output_dir))]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    segment_seconds: u32,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let total = probe_duration(source).await?;
    let spans = segment_spans(total, segment_seconds as f64);
    if spans.len() <= 1 {
        return Ok(vec![source.to_path_buf()]);
    }

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut segments = Vec::with_capacity(spans.len());
    for (idx, (start, length)) in spans.into_iter().enumerate() {
        let path = output_dir.join(format!("{}_{:04}.mp3", stem, idx));
        extract_segment(source, &path, start, length).await?;
        segments.push(path);
    }

    info!("Split {:.1}s of audio into {} segments", total, segments.len());
    Ok(segments)
}

/// Start offset and length of each segment covering `total` seconds.
fn segment_spans(total: f64, segment: f64) -> Vec<(f64, f64)> {
    if total <= segment || segment <= 0.0 {
        return vec![(0.0, total)];
    }

    let mut spans = Vec::new();
    let mut offset = 0.0;
    while offset < total {
        spans.push((offset, segment.min(total - offset)));
        offset += segment;
    }
    spans
}

async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let copied = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if matches!(copied, Ok(status) if status.success()) && dest.exists() {
        return Ok(());
    }

    warn!("Stream copy failed for segment at {:.1}s, re-encoding", start);

    let result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("5")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(FinnError::AudioDownload(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FinnError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(FinnError::AudioDownload(format!("ffmpeg error: {e}"))),
    }
}

/// Reads the duration in seconds of an audio file with ffprobe.
async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FinnError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => return Err(FinnError::AudioDownload(format!("ffprobe failed: {e}"))),
    };

    if !output.status.success() {
        return Err(FinnError::AudioDownload("ffprobe returned error".into()));
    }

    parse_duration(&output.stdout)
}

fn parse_duration(ffprobe_json: &[u8]) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_slice(ffprobe_json)
        .map_err(|_| FinnError::AudioDownload("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| FinnError::AudioDownload("Could not determine audio duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_audio_file_prefers_known_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.m4a"), b"x").unwrap();
        std::fs::write(dir.path().join("abc.part.tmp"), b"x").unwrap();

        let found = find_audio_file(dir.path(), "abc").unwrap();
        assert_eq!(found, dir.path().join("abc.m4a"));
    }

    #[test]
    fn test_find_audio_file_scans_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("xyz.flac"), b"x").unwrap();

        assert_eq!(find_audio_file(dir.path(), "xyz").unwrap(), dir.path().join("xyz.flac"));
        assert!(matches!(
            find_audio_file(dir.path(), "missing"),
            Err(FinnError::AudioDownload(_))
        ));
    }

    #[test]
    fn test_segment_spans_cover_the_whole_file() {
        assert_eq!(segment_spans(90.0, 600.0), vec![(0.0, 90.0)]);
        assert_eq!(
            segment_spans(1500.0, 600.0),
            vec![(0.0, 600.0), (600.0, 600.0), (1200.0, 300.0)]
        );
        assert_eq!(segment_spans(1200.0, 600.0), vec![(0.0, 600.0), (600.0, 600.0)]);
    }

    #[test]
    fn test_parse_ffprobe_duration() {
        let json = br#"{"format": {"filename": "a.mp3", "duration": "1834.512000"}}"#;
        assert_eq!(parse_duration(json).unwrap(), 1834.512);
        assert!(matches!(parse_duration(b"{}"), Err(FinnError::AudioDownload(_))));
    }
}
