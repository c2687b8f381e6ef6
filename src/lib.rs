//! Finn - Search & Summarize
//!
//! A CLI tool that searches the web through SerpApi, fetches the pages or
//! videos you pick, and asks an OpenAI chat model about their content.
//!
//! # Overview
//!
//! Finn allows you to:
//! - Search YouTube, Google, Google News topics, Google Hotels and Google Finance
//! - Scrape web pages or transcribe YouTube videos from the results
//! - Summarize or question the fetched content with a chat model
//! - Hear the answer read out by a talking-head video
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and credentials
//! - `search` - Query dispatch to the search aggregator
//! - `table` - Result projection and export
//! - `fetch` - Page scraping and transcript fetching
//! - `audio` - Audio download for videos
//! - `transcription` - Speech-to-text transcription
//! - `chunking` - Text splitting for scraped pages
//! - `llm` - Prompt construction and chat completion
//! - `video` - Talking-head presentation
//! - `workflow` - Interactive stage machine
//! - `session` - Clients for one workflow run
//!
//! # Example
//!
//! ```rust,no_run
//! use finn::config::{Secrets, Settings};
//! use finn::search::{SearchMode, SearchQuery};
//! use finn::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let secrets = Secrets::from_env(&settings);
//!     let session = Session::new(settings, &secrets)?;
//!
//!     let results = session.search(&SearchQuery::web("what is a hedge fund")?).await?;
//!     let report = session.fetch(SearchMode::Web, &results.links()[..1]).await?;
//!     let content = finn::fetch::format_items(&report.items);
//!
//!     let answer = session
//!         .ask(SearchMode::Web, None, "What is a hedge fund?", &content)
//!         .await?;
//!     println!("{} ({} tokens)", answer.text, answer.total_tokens);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod openai;
pub mod search;
pub mod session;
pub mod table;
pub mod transcription;
pub mod video;
pub mod workflow;

pub use error::{FinnError, Result};
