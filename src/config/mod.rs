//! Configuration module for Finn.
//!
//! Handles loading application settings and reading API credentials.

mod secrets;
mod settings;

pub use secrets::{Secrets, VideoCredentials};
pub use settings::{
    CompletionSettings, GeneralSettings, ScrapeSettings, SearchSettings, Settings,
    TranscriptionSettings, VideoSettings,
};
