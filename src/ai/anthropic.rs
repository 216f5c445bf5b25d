use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

use super::models::{AIError, AIProvider, MessagesRequest, MessagesResponse, RequestMessage};
use crate::config::Config;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl AnthropicSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.anthropic_base_url.clone(),
            model: config.anthropic_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct AnthropicProvider {
    api_key: String,
    client: Client,
    settings: AnthropicSettings,
}

impl AnthropicProvider {
    pub fn new(api_key: String, settings: AnthropicSettings) -> Self {
        Self {
            api_key,
            client: Client::new(),
            settings,
        }
    }

    fn build_request(&self, prompt: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.settings.model.clone(),
            messages: vec![RequestMessage::user(prompt)],
            max_tokens: self.settings.max_tokens,
            // High enough for variety, low enough to stay on topic.
            temperature: self.settings.temperature.clamp(0.3, 0.9),
        }
    }
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    async fn generate_response(&self, prompt: &str) -> Result<String, AIError> {
        debug!("Requesting chat message from {}", self.settings.model);
        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));

        let response = self.client.post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| AIError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await
                .unwrap_or_else(|e| format!("Failed to get error text: {}", e));
            warn!("Anthropic API error {}: {}", status, body);
            return Err(AIError::APIError { status: status.as_u16(), body });
        }

        let response: MessagesResponse = response.json()
            .await
            .map_err(|e| AIError::InvalidResponse(e.to_string()))?;

        response.first_text()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| AIError::InvalidResponse("No text content in response".to_string()))
    }
}
