//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{FinnError, Result};
use crate::search::SearchMode;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Searching needs the aggregator key.
    Search,
    /// Fetching content for a mode; videos also need yt-dlp, ffmpeg and ffprobe.
    Fetch(SearchMode),
    /// Asking the model needs the OpenAI key.
    Ask,
    /// Talking-head videos need the video credentials.
    Video,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Search => {
            check_env(&settings.search.api_key_env, "your SerpApi key")?;
        }
        Operation::Fetch(mode) => {
            if mode.fetches_transcripts() {
                check_env(&settings.completion.api_key_env, "sk-...")?;
                check_tool("yt-dlp")?;
                check_tool("ffmpeg")?;
                check_tool("ffprobe")?;
            }
        }
        Operation::Ask => {
            check_env(&settings.completion.api_key_env, "sk-...")?;
        }
        Operation::Video => {
            check_env(&settings.video.credentials_env, "username:password")?;
        }
    }
    Ok(())
}

/// Check that an environment variable holds a value.
fn check_env(name: &str, example: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(()),
        Ok(_) => Err(FinnError::Config(format!(
            "{} is empty. Set it with: export {}='{}'",
            name, name, example
        ))),
        Err(_) => Err(FinnError::Config(format!(
            "{} not set. Set it with: export {}='{}'",
            name, name, example
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg tools use -version (single dash), yt-dlp uses --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(FinnError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FinnError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(FinnError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
