//! OpenAI-compatible chat completion client.

use crate::config::OpenAiConfig;
use crate::domain::errors::{CredentialError, ModelCallError};
use crate::domain::ports::{LanguageModel, ModelPrompt};
use crate::infrastructure::http_client_factory::HttpClientFactory;
use crate::infrastructure::persistence::credential_store::precheck_key;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

pub struct OpenAiChatClient {
    client: Client,
    api_base: String,
    model: String,
    temperature: f64,
    timeout_secs: u64,
    validation_timeout: Duration,
    api_key: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(config: &OpenAiConfig, api_key: Option<String>, user_agent: &str) -> Self {
        Self {
            client: HttpClientFactory::create_client(
                Duration::from_secs(config.timeout_secs),
                user_agent,
            ),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
            validation_timeout: Duration::from_secs(config.validation_timeout_secs),
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Format precheck, then a lightweight authenticated call to `/models`.
    pub async fn validate_key(&self, key: &str) -> Result<(), CredentialError> {
        let key = precheck_key(key)?;

        let url = format!("{}/models", self.api_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(key)
            .timeout(self.validation_timeout)
            .send()
            .await
            .map_err(|e| CredentialError::Rejected {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            info!("OpenAiChatClient: API key accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!("OpenAiChatClient: API key rejected with HTTP {}", status);
        Err(CredentialError::Rejected {
            message: provider_error_message(&body),
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> ModelCallError {
        if e.is_timeout() {
            ModelCallError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            ModelCallError::Transport {
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    fn ensure_ready(&self) -> Result<(), CredentialError> {
        match &self.api_key {
            Some(_) => Ok(()),
            None => Err(CredentialError::Missing),
        }
    }

    async fn complete(&self, prompt: &ModelPrompt) -> Result<String, ModelCallError> {
        let api_key = self.api_key.as_deref().ok_or(ModelCallError::MissingKey)?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
        };

        debug!("OpenAiChatClient: POST chat/completions model={}", self.model);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        if !status.is_success() {
            return Err(ModelCallError::Status {
                status: status.as_u16(),
                body: provider_error_message(&body),
            });
        }

        parse_chat_content(&body)
    }
}

/// `choices[0].message.content` of a chat completion body.
pub fn parse_chat_content(body: &str) -> Result<String, ModelCallError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ModelCallError::MalformedResponse {
            reason: e.to_string(),
        })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ModelCallError::MalformedResponse {
            reason: "no message content in first choice".to_string(),
        })
}

/// `error.message` from a provider error body, or the raw body.
pub fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
