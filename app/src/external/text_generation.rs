//! OpenAI-compatible chat completion client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// One single-turn prompt
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Raw text of the first choice
    async fn complete(&self, request: CompletionRequest) -> AppResult<String>;
}

#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatCompletionClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> AppResult<String> {
        if self.api_key.is_empty() {
            return Err(AppError::ExternalServiceUnavailable(
                "Text generation API key is not configured".to_string(),
            ));
        }

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceUnavailable(format!("Text generation request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalServiceUnavailable(format!(
                "Text generation API returned {}",
                status
            )));
        }

        let data: ChatResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceUnavailable(format!("Failed to parse completion: {}", e))
        })?;

        first_content(data).ok_or_else(|| {
            AppError::ExternalServiceUnavailable("No content in completion response".to_string())
        })
    }
}

fn first_content(data: ChatResponse) -> Option<String> {
    data.choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|content| !content.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_content() {
        let data: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#)
                .unwrap();
        assert_eq!(first_content(data).as_deref(), Some("hello"));
    }

    #[test]
    fn test_empty_choices() {
        let data: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_content(data).is_none());
        let data: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert!(first_content(data).is_none());
    }

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 500,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 500);
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let client = ChatCompletionClient::new(Client::new(), "http://localhost:9", "", "m");
        let result = client
            .complete(CompletionRequest {
                prompt: "hi".into(),
                max_tokens: 10,
                temperature: 0.5,
            })
            .await;
        assert!(matches!(result, Err(AppError::ExternalServiceUnavailable(_))));
    }
}
