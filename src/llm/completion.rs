//! OpenAI chat-completion client.

use super::{CompletionClient, CompletionRequest, GeneratedAnswer, PromptMessage, PromptRole};
use crate::error::{FinnError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionStreamOptions,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, instrument};

/// Chat-completion client backed by the OpenAI API.
pub struct OpenAiCompletion {
    client: Client<OpenAIConfig>,
}

impl OpenAiCompletion {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    async fn complete_streaming(
        &self,
        request: async_openai::types::CreateChatCompletionRequest,
    ) -> Result<GeneratedAnswer> {
        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| FinnError::Completion(e.to_string()))?;

        let mut text = String::new();
        let mut total_tokens = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FinnError::Completion(e.to_string()))?;
            for choice in chunk.choices {
                if let Some(delta) = choice.delta.content {
                    text.push_str(&delta);
                }
            }
            if let Some(usage) = chunk.usage {
                total_tokens = usage.total_tokens;
            }
        }

        Ok(GeneratedAnswer { text, total_tokens })
    }
}

fn to_request_message(message: &PromptMessage) -> Result<ChatCompletionRequestMessage> {
    let built = match message.role {
        PromptRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        PromptRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
    };
    built.map_err(|e| FinnError::Completion(format!("Failed to build message: {}", e)))
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    #[instrument(skip(self, request), fields(model = %request.model, stream = request.stream))]
    async fn complete(&self, request: &CompletionRequest) -> Result<GeneratedAnswer> {
        let messages = request
            .messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .stream(request.stream);
        if request.stream {
            // Usage arrives in a final chunk only when asked for
            args.stream_options(ChatCompletionStreamOptions {
                include_usage: true,
            });
        }
        let api_request = args
            .build()
            .map_err(|e| FinnError::Completion(format!("Failed to build request: {}", e)))?;

        if request.stream {
            return self.complete_streaming(api_request).await;
        }

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| FinnError::Completion(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let total_tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0);

        if text.is_empty() {
            debug!("Model returned an empty answer");
        }
        info!("Completion used {} tokens", total_tokens);

        Ok(GeneratedAnswer { text, total_tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::create_client;
    use axum::{
        http::{header, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::time::Duration;

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-3.5-turbo-0125".to_string(),
            messages: vec![
                PromptMessage::user("what is a hedge fund"),
                PromptMessage::user("page text"),
            ],
            temperature: 0.0,
            stream: false,
        }
    }

    #[tokio::test]
    async fn test_completion_returns_text_and_tokens() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "gpt-3.5-turbo-0125");
                assert_eq!(body["messages"].as_array().unwrap().len(), 2);
                assert_eq!(body["messages"][1]["content"], "page text");
                Json(json!({
                    "id": "chatcmpl-1",
                    "object": "chat.completion",
                    "created": 1700000000,
                    "model": "gpt-3.5-turbo-0125",
                    "choices": [{
                        "index": 0,
                        "message": { "role": "assistant", "content": "It is a pooled investment vehicle..." },
                        "finish_reason": "stop"
                    }],
                    "usage": { "prompt_tokens": 30, "completion_tokens": 12, "total_tokens": 42 }
                }))
            }),
        );

        let base = spawn_server(app).await;
        let client = OpenAiCompletion::new(
            create_client("sk-test", Some(&base), Duration::from_secs(5)).unwrap(),
        );

        let answer = client.complete(&request()).await.unwrap();
        assert_eq!(
            answer,
            GeneratedAnswer {
                text: "It is a pooled investment vehicle...".to_string(),
                total_tokens: 42,
            }
        );
    }

    #[tokio::test]
    async fn test_streamed_completion_reports_usage() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["stream"], true);
                assert_eq!(body["stream_options"]["include_usage"], true);

                let chunk = |choices: Value, usage: Value| {
                    json!({
                        "id": "chatcmpl-2",
                        "object": "chat.completion.chunk",
                        "created": 1700000000,
                        "model": "gpt-3.5-turbo-0125",
                        "choices": choices,
                        "usage": usage
                    })
                };
                let events = [
                    chunk(json!([{ "index": 0, "delta": { "role": "assistant", "content": "A pooled " } }]), Value::Null),
                    chunk(json!([{ "index": 0, "delta": { "content": "fund." }, "finish_reason": "stop" }]), Value::Null),
                    chunk(json!([]), json!({ "prompt_tokens": 20, "completion_tokens": 4, "total_tokens": 24 })),
                ];
                let mut body: String = events.iter().map(|e| format!("data: {}\n\n", e)).collect();
                body.push_str("data: [DONE]\n\n");

                ([(header::CONTENT_TYPE, "text/event-stream")], body)
            }),
        );

        let base = spawn_server(app).await;
        let client = OpenAiCompletion::new(
            create_client("sk-test", Some(&base), Duration::from_secs(5)).unwrap(),
        );

        let answer = client
            .complete(&CompletionRequest {
                stream: true,
                ..request()
            })
            .await
            .unwrap();
        assert_eq!(answer.text, "A pooled fund.");
        assert_eq!(answer.total_tokens, 24);
    }

    #[tokio::test]
    async fn test_completion_failure_is_an_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": {
                            "message": "model not found",
                            "type": "invalid_request_error",
                            "param": null,
                            "code": null
                        }
                    })),
                )
            }),
        );

        let base = spawn_server(app).await;
        let client = OpenAiCompletion::new(
            create_client("sk-test", Some(&base), Duration::from_secs(5)).unwrap(),
        );

        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, FinnError::Completion(ref msg) if msg.contains("model not found")));
    }
}
