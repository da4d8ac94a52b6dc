//! HTTP completion client speaking either chat dialect.
//!
//! Both supported deployments expose a plain JSON chat endpoint; they differ
//! only in path and response shape. The Ollama-native dialect answers with
//! `message.content`, the OpenAI-compatible one (LM Studio and friends) with
//! `choices[0].message.content`. The request payload (a role-tagged message
//! list plus model identifier, streaming off) is the same for both.

use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    types::{LlmDialect, Res},
};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the HTTP implementation.

impl LlmClient {
    /// Build the HTTP completion client from the application config.
    pub fn http(config: &Config) -> Res<Self> {
        Ok(Self::new(Arc::new(HttpLlmClient::new(config)?)))
    }
}

// Specific implementations.

/// HTTP completion client.
pub struct HttpLlmClient {
    client: Client,
    config: Config,
}

impl HttpLlmClient {
    /// Create a new client with the configured (long) completion timeout.
    pub fn new(config: &Config) -> Res<Self> {
        let client = Client::builder().timeout(Duration::from_secs(config.llm_timeout_secs)).build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn chat_url(&self) -> String {
        match self.config.llm_dialect {
            LlmDialect::Ollama => format!("{}/api/chat", self.config.llm_endpoint),
            LlmDialect::OpenAi => format!("{}/v1/chat/completions", self.config.llm_endpoint),
        }
    }
}

#[async_trait]
impl GenericLlmClient for HttpLlmClient {
    #[instrument(name = "HttpLlmClient::complete", skip_all)]
    async fn complete(&self, prompt: &str) -> Res<String> {
        let request = ChatRequest {
            model: &self.config.llm_model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            stream: false,
        };

        let url = self.chat_url();
        debug!("Requesting completion from {url}");

        let response = self.client.post(&url).json(&request).send().await.map_err(|err| {
            if err.is_timeout() {
                anyhow!("Completion request timed out after {} seconds", self.config.llm_timeout_secs)
            } else {
                anyhow!(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Completion endpoint returned {status}"));
        }

        decode_completion(self.config.llm_dialect, &response.bytes().await?)
    }
}

// Wire types.

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

/// Decode a completion response body according to the configured dialect.
fn decode_completion(dialect: LlmDialect, body: &[u8]) -> Res<String> {
    match dialect {
        LlmDialect::Ollama => {
            let parsed: OllamaChatResponse = serde_json::from_slice(body)?;
            parsed
                .message
                .and_then(|m| m.content)
                .ok_or_else(|| anyhow!("Completion response had no message content"))
        }
        LlmDialect::OpenAi => {
            let parsed: OpenAiChatResponse = serde_json::from_slice(body)?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| anyhow!("Completion response had no choices"))
        }
    }
}
