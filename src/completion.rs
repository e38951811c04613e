//! Groq chat-completion client
//!
//! The assistant treats the LLM as "submit text, receive text or
//! failure". The wire format is the OpenAI-compatible one Groq serves.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::AppConfig;
use crate::error::AssistantError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// System prompt for terminology questions
pub const TERMINOLOGY_SYSTEM_PROMPT: &str = r#"You are a financial terminology expert focused specifically on fund management, investment, and financial definitions.

IMPORTANT RULES:
1. Only provide definitions and explanations for financial and fund-related terms
2. Keep responses concise but comprehensive (2-3 sentences max)
3. If asked about non-financial topics, politely redirect to fund terminology
4. Always mention if a term is commonly used in specific contexts (e.g., "commonly used in private equity")
5. Include practical examples when helpful

Focus areas include: ESG, performance metrics (Alpha, Sharpe Ratio, etc.), asset classes (Private Equity, REITs, etc.), risk management terms, and fund operations."#;

/// One prompt for the text-generation service
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_query: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Terminology answer: low temperature, short reply
    pub fn terminology(query: &str) -> Self {
        Self {
            system_prompt: TERMINOLOGY_SYSTEM_PROMPT.to_string(),
            user_query: query.to_string(),
            temperature: 0.3,
            max_tokens: 300,
        }
    }

    /// Two-sentence analyst insight used by the dashboard widgets
    pub fn insight(system_prompt: &str, user_query: String) -> Self {
        Self {
            system_prompt: system_prompt.to_string(),
            user_query,
            temperature: 0.3,
            max_tokens: 150,
        }
    }
}

/// External text-generation collaborator
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &CompletionRequest) -> crate::Result<String>;
}

/// Reusable Groq client (connection-pooled)
pub struct GroqClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            api_url,
            model,
        })
    }

    /// `None` when no API key is configured
    pub fn from_config(config: &AppConfig) -> crate::Result<Option<Self>> {
        let Some(api_key) = config.groq_api_key.clone() else {
            return Ok(None);
        };

        Self::new(
            api_key,
            config.groq_api_url.clone(),
            config.groq_model.clone(),
            config.completion_timeout,
        )
        .map(Some)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_query,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// Shared collaborator for the reconciler and widgets, `None` when unconfigured
pub fn generator_from_config(config: &AppConfig) -> crate::Result<Option<Arc<dyn TextGenerator>>> {
    Ok(GroqClient::from_config(config)?.map(|c| Arc::new(c) as Arc<dyn TextGenerator>))
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn generate(&self, request: &CompletionRequest) -> crate::Result<String> {
        let body = self.build_request(request);

        info!(model = %self.model, "Calling Groq chat completion");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Groq request failed: {}", e);
                AssistantError::Completion(format!("Groq request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Groq error response ({}): {}", status, error_text);
            return Err(AssistantError::Completion(format!(
                "Groq returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Groq response: {}", e);
            AssistantError::InvalidResponse(format!("Groq parse error: {}", e))
        })?;

        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            AssistantError::InvalidResponse("Groq response contained no choices".to_string())
        })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
