use std::sync::Arc;
use std::time::Duration;

use super::anthropic::{AnthropicProvider, AnthropicSettings};
use super::models::{AIError, AIProvider};
use crate::config::Config;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Optional remote provider with a client-side deadline on every call.
#[derive(Clone)]
pub struct AIClient {
    provider: Option<Arc<dyn AIProvider>>,
    timeout: Duration,
}

impl AIClient {
    pub fn new(provider: Option<Arc<dyn AIProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn with_provider(provider: Arc<dyn AIProvider>) -> Self {
        Self::new(Some(provider), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn disabled() -> Self {
        Self::new(None, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn from_config(config: &Config) -> Self {
        let provider = config.anthropic_secret.clone()
            .filter(|_| config.is_anthropic_configured())
            .map(|key| Arc::new(AnthropicProvider::new(key, AnthropicSettings::from_config(config))) as Arc<dyn AIProvider>);
        Self::new(provider, config.request_timeout())
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate_response(&self, prompt: &str) -> Result<String, AIError> {
        let provider = self.provider.as_ref().ok_or(AIError::NotConfigured)?;
        match tokio::time::timeout(self.timeout, provider.generate_response(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(AIError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Hanging;

    #[async_trait]
    impl AIProvider for Hanging {
        async fn generate_response(&self, _prompt: &str) -> Result<String, AIError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    struct Echo;

    #[async_trait]
    impl AIProvider for Echo {
        async fn generate_response(&self, prompt: &str) -> Result<String, AIError> {
            Ok(prompt.to_uppercase())
        }
    }

    #[tokio::test]
    async fn disabled_client_reports_not_configured() {
        let client = AIClient::disabled();
        assert!(!client.is_enabled());
        assert!(matches!(client.generate_response("hi").await, Err(AIError::NotConfigured)));
    }

    #[tokio::test]
    async fn forwards_to_provider() {
        let client = AIClient::with_provider(Arc::new(Echo));
        assert_eq!(client.generate_response("hi").await.unwrap(), "HI");
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_provider_times_out() {
        let client = AIClient::new(Some(Arc::new(Hanging)), Duration::from_secs(3));
        match client.generate_response("hi").await {
            Err(AIError::Timeout(after)) => assert_eq!(after, Duration::from_secs(3)),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn config_without_key_is_disabled() {
        assert!(!AIClient::from_config(&Config::default()).is_enabled());
        let config = Config {
            anthropic_secret: Some("sk-live".to_string()),
            ..Config::default()
        };
        assert!(AIClient::from_config(&config).is_enabled());
    }
}
