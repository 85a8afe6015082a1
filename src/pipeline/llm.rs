//! Generation API boundary: one system instruction + one user message in,
//! one text response out.
//!
//! Chat and summaries only ever need that single request/response shape, so
//! the session talks to a [`Generator`] rather than to a concrete client.
//! Two implementations ship with the crate:
//!
//! * [`ProviderGenerator`]: any edgequake-llm provider (OpenAI, Anthropic,
//!   Gemini, Ollama, …).
//! * [`crate::pipeline::groq::GroqClient`]: Groq's OpenAI-compatible API,
//!   used when only an API key is configured.
//!
//! Calls are made once. A failure comes back as a [`ServiceError`] for the
//! caller to surface; nothing here retries.

use crate::config::SessionConfig;
use crate::error::{PdfChatError, ServiceError};
use crate::pipeline::groq::GroqClient;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

/// A hosted text-generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send `system` + `user` and return the model's reply.
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: &GenerationOptions,
    ) -> Result<String, ServiceError>;
}

/// [`Generator`] backed by an edgequake-llm provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, timeout_secs: u64) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl Generator for ProviderGenerator {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: &GenerationOptions,
    ) -> Result<String, ServiceError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let completion = build_options(options);

        let response = tokio::time::timeout(
            self.timeout,
            self.provider.chat(&messages, Some(&completion)),
        )
        .await
        .map_err(|_| ServiceError::Timeout {
            service: "llm-provider".to_string(),
            secs: self.timeout.as_secs(),
        })?
        .map_err(|e| ServiceError::Generation {
            detail: e.to_string(),
        })?;

        debug!(
            "Generation: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the per-call options.
fn build_options(options: &GenerationOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(options.temperature),
        max_tokens: Some(options.max_tokens),
        ..Default::default()
    }
}

/// Resolve the generation backend, from most-specific to least-specific.
///
/// 1. **Pre-built generator** (`config.generator`): used as-is.
/// 2. **Pre-built provider** (`config.provider`): wrapped in [`ProviderGenerator`].
/// 3. **Named provider** (`config.provider_name`): created through
///    [`ProviderFactory::create_llm_provider`], which reads that provider's
///    API key from the environment.
/// 4. **API key** (`config.api_key`): [`GroqClient`] against
///    `config.groq_base_url`.
/// 5. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
///
/// Returns `Ok(None)` when nothing is configured; chat and summary actions
/// then fail with [`PdfChatError::MissingCredential`].
pub fn resolve_generator(
    config: &SessionConfig,
) -> Result<Option<Arc<dyn Generator>>, PdfChatError> {
    if let Some(ref generator) = config.generator {
        return Ok(Some(Arc::clone(generator)));
    }

    if let Some(ref provider) = config.provider {
        return Ok(Some(Arc::new(ProviderGenerator::new(
            Arc::clone(provider),
            config.api_timeout_secs,
        ))));
    }

    if let Some(ref name) = config.provider_name {
        let provider = create_provider(name, config.model_or_default())?;
        return Ok(Some(Arc::new(ProviderGenerator::new(
            provider,
            config.api_timeout_secs,
        ))));
    }

    if let Some(ref key) = config.api_key {
        info!("Using Groq model {}", config.model_or_default());
        let client = GroqClient::new(
            &config.groq_base_url,
            key,
            config.model_or_default(),
            config.api_timeout_secs,
        )?;
        return Ok(Some(Arc::new(client)));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            let provider = create_provider(&prov, &model)?;
            return Ok(Some(Arc::new(ProviderGenerator::new(
                provider,
                config.api_timeout_secs,
            ))));
        }
    }

    Ok(None)
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PdfChatError> {
    info!("Using provider {} with model {}", name, model);
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        PdfChatError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Generator for Echo {
        async fn generate(
            &self,
            _system: &str,
            user: &str,
            _options: &GenerationOptions,
        ) -> Result<String, ServiceError> {
            Ok(user.to_string())
        }
    }

    #[test]
    fn build_options_forwards_values() {
        let opts = build_options(&GenerationOptions {
            temperature: 0.3,
            max_tokens: 1500,
        });
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(1500));
    }

    #[test]
    fn prebuilt_generator_wins() {
        let config = SessionConfig::builder()
            .api_key("gsk_test")
            .generator(Arc::new(Echo))
            .build()
            .unwrap();
        let g = resolve_generator(&config).unwrap().expect("generator");
        let out = tokio_test::block_on(g.generate(
            "sys",
            "ping",
            &GenerationOptions {
                temperature: 0.0,
                max_tokens: 1,
            },
        ));
        assert_eq!(out.unwrap(), "ping");
    }

    #[test]
    fn api_key_resolves_to_groq() {
        let config = SessionConfig::builder().api_key("gsk_test").build().unwrap();
        assert!(resolve_generator(&config).unwrap().is_some());
    }

    #[test]
    fn nothing_configured_resolves_to_none() {
        if std::env::var("EDGEQUAKE_LLM_PROVIDER").is_ok() {
            println!("SKIP — EDGEQUAKE_LLM_PROVIDER is set");
            return;
        }
        let config = SessionConfig::default();
        assert!(resolve_generator(&config).unwrap().is_none());
    }
}
