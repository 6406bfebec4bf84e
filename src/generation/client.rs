//! OpenAI-compatible chat completions client for listing generation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::GenerationConfig;
use crate::listing::{CsvRow, ListingOutput, RawListing};

use super::prompt::{system_prompt, user_prompt};
use super::{GeneratedListing, GenerationError, ListingGenerator};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

/// Listing generator backed by an OpenAI-compatible HTTP endpoint
#[derive(Debug, Clone)]
pub struct LlmListingGenerator {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmListingGenerator {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("listing-bulk-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    async fn send(&self, row: &CsvRow) -> Result<ChatResponse, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::NotConfigured("GENERATION_API_KEY is not set"))?;

        let system = system_prompt();
        let user = user_prompt(row);
        let request = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                ChatMessage { role: "system", content: &system },
                ChatMessage { role: "user", content: &user },
            ],
            response_format: ResponseFormat { kind: "json_object" },
        };

        let res = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<ChatResponse>()
                .await
                .map_err(|e| GenerationError::InvalidResponse(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(GenerationError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(GenerationError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl ListingGenerator for LlmListingGenerator {
    async fn generate(&self, row: &CsvRow) -> Result<GeneratedListing, GenerationError> {
        let response = self.send(row).await?;
        let tokens_used = response.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0);

        let content = response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GenerationError::InvalidResponse("empty completion".to_string()))?;

        let raw: RawListing = serde_json::from_str(extract_json(&content)).map_err(|e| {
            error!(error = %e, "Generation engine returned unparseable listing JSON");
            GenerationError::InvalidResponse(e.to_string())
        })?;

        let listing = ListingOutput::from_raw(raw)?;
        debug!(product = %row.product_name, tokens_used, "Listing generated");

        Ok(GeneratedListing { listing, tokens_used })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Transport(e.to_string())
    }
}

/// Strip a markdown code fence if the model wrapped its JSON in one
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn extract_json_handles_fenced_and_bare_payloads() {
        assert_eq!(extract_json("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("```\n{}\n```"), "{}");
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let mut config = AppConfig::development().generation;
        config.api_key = None;
        let generator = LlmListingGenerator::new(&config).expect("client builds");

        let row = CsvRow {
            product_name: "Mug".into(),
            niche: None,
            audience: None,
            keywords: vec!["coffee".into()],
            tone: None,
        };
        let err = generator.generate(&row).await.unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured(_)));
    }
}
