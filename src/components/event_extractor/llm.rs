use crate::config::{Config, LlmProvider};
use crate::error::{llm_error, BotResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Sampling temperature for extraction prompts
const TEMPERATURE: f32 = 0.2;

/// A text-in, text-out language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a single prompt and return the raw completion text
    async fn complete(&self, prompt: &str) -> BotResult<String>;
}

/// Create the language model selected in the configuration
pub fn build_language_model(config: &Config) -> BotResult<Arc<dyn LanguageModel>> {
    info!(
        "Using {} language model {}",
        config.llm_provider, config.llm_model
    );

    match config.llm_provider {
        LlmProvider::Ollama => Ok(Arc::new(OllamaModel::new(
            &config.llm_base_url,
            &config.llm_model,
        ))),
        #[cfg(feature = "gemini")]
        LlmProvider::Gemini => {
            let api_key = config
                .gemini_api_key
                .as_deref()
                .ok_or_else(|| crate::error::env_error("GEMINI_API_KEY"))?;
            Ok(Arc::new(GeminiModel::new(api_key, &config.llm_model)))
        }
        #[cfg(not(feature = "gemini"))]
        LlmProvider::Gemini => Err(crate::error::config_error(
            "Gemini support is not compiled in, enable the `gemini` feature",
        )),
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Language model served by a local Ollama instance
#[derive(Debug, Clone)]
pub struct OllamaModel {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaModel {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn complete(&self, prompt: &str) -> BotResult<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| llm_error(&format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(llm_error(&format!(
                "Ollama request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| llm_error(&format!("Failed to parse Ollama response: {}", e)))?;

        debug!("Ollama returned {} characters", body.response.len());
        Ok(body.response)
    }
}

#[cfg(feature = "gemini")]
pub use gemini::GeminiModel;

#[cfg(feature = "gemini")]
mod gemini {
    use super::{LanguageModel, TEMPERATURE};
    use crate::error::{llm_error, BotResult};
    use async_trait::async_trait;
    use rig::completion::{Chat, Message};
    use rig::providers::gemini::Client as GeminiClient;
    use tracing::debug;

    const PREAMBLE: &str = "You help a calendar assistant understand scheduling requests. Follow the instructions in each prompt exactly and answer only with what is asked for.";

    /// Google Gemini accessed through rig
    pub struct GeminiModel {
        client: GeminiClient,
        model: String,
    }

    impl GeminiModel {
        pub fn new(api_key: &str, model: &str) -> Self {
            Self {
                client: GeminiClient::new(api_key),
                model: model.to_string(),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for GeminiModel {
        async fn complete(&self, prompt: &str) -> BotResult<String> {
            let agent = self
                .client
                .agent(&self.model)
                .preamble(PREAMBLE)
                .temperature(TEMPERATURE as f64)
                .build();

            let response = agent
                .chat(prompt.to_string(), Vec::<Message>::new())
                .await
                .map_err(|e| llm_error(&format!("Rig API request failed: {}", e)))?;

            debug!("Gemini returned {} characters", response.len());
            Ok(response)
        }
    }
}
