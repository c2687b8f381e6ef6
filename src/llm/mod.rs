//! Summarization and Q&A over fetched content.
//!
//! Every request is stateless: one instruction message and one content
//! message, no conversation history.

mod completion;

pub use completion::OpenAiCompletion;

use crate::error::Result;
use crate::search::SearchMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
}

/// A single prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// Build the (instruction, content) message pair for a mode.
///
/// Video summaries carry the instruction as a system message; every other
/// mode sends both as user messages.
pub fn build_prompt(mode: SearchMode, instruction: &str, content: &str) -> Vec<PromptMessage> {
    let instruction = match mode {
        SearchMode::Youtube => PromptMessage::system(instruction),
        _ => PromptMessage::user(instruction),
    };
    vec![instruction, PromptMessage::user(content)]
}

/// Suggested instruction shown when asking the user for a prompt.
pub fn prompt_hint(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Youtube => "e.g. Summarize the following youtube transcripts.",
        SearchMode::Web | SearchMode::News => {
            "Enter your prompt or question related to the website content."
        }
        SearchMode::Hotels => "e.g. Which of these has the best rating for the price?",
        SearchMode::Finance => "",
    }
}

/// A chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
    pub temperature: f32,
    pub stream: bool,
}

/// Generated text and the total tokens the call consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub text: String,
    pub total_tokens: u32,
}

/// Trait for chat-completion endpoints.
///
/// A failed call is an error, never an empty answer.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<GeneratedAnswer>;
}
