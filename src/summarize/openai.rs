use super::{ModelResponse, Summarizer};
use crate::config::SummarizerConfig;
use crate::error::{DigestError, SummarizeError};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
}

/// Summarizer backed by an OpenAI-style `/responses` endpoint
pub struct OpenAiSummarizer {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiSummarizer {
    /// Build from configuration, reading the API key from the configured variable
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, DigestError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SummarizeError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    /// Build from configuration with an explicit API key
    pub fn with_api_key(config: &SummarizerConfig, api_key: String) -> Result<Self, DigestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SummarizeError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/responses", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Summarizer for OpenAiSummarizer {
    fn submit(&self, prompt: &str, instructions: &str) -> Result<ModelResponse, DigestError> {
        let body = RequestBody {
            model: &self.model,
            instructions,
            input: prompt,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| SummarizeError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SummarizeError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| SummarizeError::InvalidResponse(e.to_string()))?;
        Ok(ModelResponse::from_json(json)?)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
