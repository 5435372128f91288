//! Chat-completion client: turns the assembled messages into an answer.
//!
//! Providers:
//! - `openai`: `POST {url}/chat/completions`, reads `choices[0].message.content`.
//! - `ollama`: `POST {url}/api/chat` with `stream: false`, reads `message.content`.
//! - `disabled`: every call fails.
//!
//! A well-formed response without content yields [`NO_ANSWER`].

use anyhow::{bail, Result};

use portfolio_rag_core::prompt::{ChatMessage, NO_ANSWER};

use crate::config::CompletionConfig;
use crate::http;

const OPENAI_URL: &str = "https://api.openai.com/v1";
const OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Disabled,
    OpenAI,
    Ollama,
}

pub struct CompletionClient {
    provider: Provider,
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    max_retries: u32,
    system_prompt: String,
}

impl CompletionClient {
    /// Build a client from config. `openai` reads `OPENAI_API_KEY`.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = match config.provider.as_str() {
            "openai" => match std::env::var("OPENAI_API_KEY") {
                Ok(key) => Some(key),
                Err(_) => bail!("OPENAI_API_KEY environment variable not set"),
            },
            _ => None,
        };
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &CompletionConfig, api_key: Option<String>) -> Result<Self> {
        let (provider, default_url) = match config.provider.as_str() {
            "disabled" => (Provider::Disabled, ""),
            "openai" => (Provider::OpenAI, OPENAI_URL),
            "ollama" => (Provider::Ollama, OLLAMA_URL),
            other => bail!("Unknown completion provider: {}", other),
        };

        Ok(Self {
            provider,
            client: http::client(config.timeout_secs)?,
            url: config.url.clone().unwrap_or_else(|| default_url.to_string()),
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
            system_prompt: config.system_prompt.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.provider != Provider::Disabled
    }

    /// Instruction placed ahead of the context block.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Send `messages` and return the model's reply text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        match self.provider {
            Provider::Disabled => bail!("Completion provider is disabled"),
            Provider::OpenAI => {
                let body = serde_json::json!({
                    "model": self.model,
                    "messages": messages,
                });
                let json = http::post_json_with_retry(
                    &self.client,
                    &http::join_url(&self.url, "chat/completions"),
                    self.api_key.as_deref(),
                    &body,
                    self.max_retries,
                    "OpenAI",
                )
                .await?;
                Ok(parse_openai_answer(&json))
            }
            Provider::Ollama => {
                let body = serde_json::json!({
                    "model": self.model,
                    "messages": messages,
                    "stream": false,
                });
                let json = http::post_json_with_retry(
                    &self.client,
                    &http::join_url(&self.url, "api/chat"),
                    None,
                    &body,
                    self.max_retries,
                    "Ollama",
                )
                .await?;
                Ok(parse_ollama_answer(&json))
            }
        }
    }
}

fn parse_openai_answer(json: &serde_json::Value) -> String {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .unwrap_or(NO_ANSWER)
        .to_string()
}

fn parse_ollama_answer(json: &serde_json::Value) -> String {
    json.pointer("/message/content")
        .and_then(|c| c.as_str())
        .unwrap_or(NO_ANSWER)
        .to_string()
}
