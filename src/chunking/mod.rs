//! Text chunking for scraped page content.
//!
//! Long page text is split into bounded, optionally overlapping chunks
//! before it is reassembled and cleaned.

mod recursive;

pub use recursive::RecursiveSplitter;

use crate::config::ScrapeSettings;

/// Configuration for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters repeated between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 200,
        }
    }
}

impl From<&ScrapeSettings> for ChunkingConfig {
    fn from(settings: &ScrapeSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap.min(settings.chunk_size),
        }
    }
}

/// Trait for text splitters.
pub trait TextSplitter: Send + Sync {
    /// Split text into chunks, in document order.
    fn split(&self, text: &str) -> Vec<String>;
}
