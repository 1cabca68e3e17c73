// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Client for OpenAI-compatible chat completion APIs (vision + JSON mode)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::{Result, SecondLookError};

/// One chat completion call, independent of the wire format
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// Image URLs (usually base64 data URLs) attached to the user message
    pub images: Vec<String>,
    pub temperature: f32,
    /// Ask for a JSON object response
    pub json_mode: bool,
}

/// Anything that can answer a chat completion
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Return the assistant message content, or an empty string if there was none
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// Chat completion API client
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    id: String,
}

impl OpenAiClient {
    /// Create a new client for the configured engine
    pub fn new(engine: &EngineConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(engine.timeout_secs))
            .build()?;

        // Normalize URL
        let base_url = engine
            .url
            .trim_end_matches('/')
            .trim_end_matches("/chat/completions")
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
            model: engine.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check that the API is reachable and the key is accepted
    pub async fn health_check(&self) -> Result<()> {
        self.list_models().await.map(|_| ())
    }

    /// List model ids visible to this key
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}

fn build_body<'a>(model: &'a str, request: &'a ChatRequest) -> CompletionRequest<'a> {
    let user = if request.images.is_empty() {
        MessageContent::Text(&request.user)
    } else {
        let mut parts = vec![ContentPart::Text { text: &request.user }];
        parts.extend(
            request
                .images
                .iter()
                .map(|url| ContentPart::ImageUrl { image_url: ImageUrl { url: url.as_str() } }),
        );
        MessageContent::Parts(parts)
    };

    CompletionRequest {
        model,
        messages: vec![
            Message { role: "system", content: MessageContent::Text(&request.system) },
            Message { role: "user", content: user },
        ],
        temperature: request.temperature,
        response_format: request.json_mode.then_some(ResponseFormat { kind: "json_object" }),
    }
}

/// Turn a non-success response into an error carrying the API's own message
async fn upstream_error(response: reqwest::Response) -> SecondLookError {
    let status = response.status();
    let message = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("Model API returned status {}", status),
    };
    warn!("Model API error ({}): {}", status, message);
    SecondLookError::Upstream(message)
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_body(&self.model, request);

        debug!(
            "Sending chat completion: model={}, images={}, json_mode={}",
            self.model,
            request.images.len(),
            request.json_mode
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let result: CompletionResponse = response.json().await?;
        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;

    fn request(images: Vec<String>, json_mode: bool) -> ChatRequest {
        ChatRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            images,
            temperature: 0.5,
            json_mode,
        }
    }

    #[test]
    fn test_vision_body_shape() {
        let req = request(vec!["data:image/jpeg;base64,AAAA".to_string()], true);
        let body = serde_json::to_value(build_body("gpt-4o-mini", &req)).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "system");
        assert_eq!(body["messages"][1]["content"][0]["type"], "text");
        assert_eq!(body["messages"][1]["content"][1]["type"], "image_url");
        assert_eq!(body["messages"][1]["content"][1]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_text_body_shape() {
        let req = request(Vec::new(), false);
        let body = serde_json::to_value(build_body("gpt-4o-mini", &req)).unwrap();

        assert_eq!(body["messages"][1]["content"], "user");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_base_url_normalized() {
        let mut config = AppConfig::default();
        config.ai_engine.url = "https://api.openai.com/v1/chat/completions/".to_string();
        let client = OpenAiClient::new(&config.ai_engine, "sk-test".to_string()).unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_completion_response_without_content() {
        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
