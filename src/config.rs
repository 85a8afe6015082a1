//! Configuration types for a PDF chat session.
//!
//! All session behaviour is controlled through [`SessionConfig`], built via
//! its [`SessionConfigBuilder`]. The CLI maps its flags onto the builder;
//! library users set only what they care about and rely on the defaults.

use crate::error::PdfChatError;
use crate::pipeline::llm::Generator;
use crate::pipeline::translate::Translator;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Model used when neither the caller nor the environment picks one.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq's OpenAI-compatible API root.
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Google Translate's public single-shot endpoint.
pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Default character budget for chat context excerpts.
pub const DEFAULT_CONTEXT_BUDGET: usize = 7000;

/// Configuration for a [`crate::session::Session`].
///
/// # Example
/// ```rust
/// use edgequake_pdfchat::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .api_key("gsk_...")
///     .context_budget(5000)
///     .build()
///     .unwrap();
/// assert_eq!(config.context_budget, 5000);
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// API credential for the default hosted LLM (Groq). Required for chat
    /// and summaries unless a provider or generator is configured instead.
    pub api_key: Option<String>,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// edgequake-llm provider name (e.g. "openai", "anthropic", "ollama").
    /// Takes precedence over `api_key`.
    pub provider_name: Option<String>,

    /// Pre-constructed edgequake-llm provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed generation backend. Takes precedence over everything else.
    pub generator: Option<Arc<dyn Generator>>,

    /// Pre-constructed translation backend. If None, Google Translate is used.
    pub translator: Option<Arc<dyn Translator>>,

    /// Base URL of the OpenAI-compatible chat-completions API used with `api_key`.
    pub groq_base_url: String,

    /// Translation endpoint used by the default translator.
    pub translate_url: String,

    /// Sampling temperature for chat answers. Default: 0.3.
    pub chat_temperature: f32,

    /// Sampling temperature for summaries. Default: 0.5.
    pub summary_temperature: f32,

    /// Maximum tokens per generated response. Default: 1500.
    pub max_tokens: usize,

    /// Character budget for the chat context excerpt. Default: 7000.
    pub context_budget: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-call timeout for the generation and translation APIs. Default: 60.
    pub api_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            provider_name: None,
            provider: None,
            generator: None,
            translator: None,
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
            chat_temperature: 0.3,
            summary_temperature: 0.5,
            max_tokens: 1500,
            context_budget: DEFAULT_CONTEXT_BUDGET,
            password: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("generator", &self.generator.as_ref().map(|_| "<dyn Generator>"))
            .field("translator", &self.translator.as_ref().map(|_| "<dyn Translator>"))
            .field("groq_base_url", &self.groq_base_url)
            .field("chat_temperature", &self.chat_temperature)
            .field("summary_temperature", &self.summary_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("context_budget", &self.context_budget)
            .finish()
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.config.translator = Some(translator);
        self
    }

    pub fn groq_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.groq_base_url = url.into();
        self
    }

    pub fn translate_url(mut self, url: impl Into<String>) -> Self {
        self.config.translate_url = url.into();
        self
    }

    pub fn chat_temperature(mut self, t: f32) -> Self {
        self.config.chat_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn summary_temperature(mut self, t: f32) -> Self {
        self.config.summary_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn context_budget(mut self, chars: usize) -> Self {
        self.config.context_budget = chars;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, PdfChatError> {
        let c = &self.config;
        if c.context_budget == 0 {
            return Err(PdfChatError::InvalidConfig(
                "Context budget must be ≥ 1 character".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(PdfChatError::InvalidConfig("Max tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(PdfChatError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The three ways a user can work with loaded documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Chat,
    Summary,
    Translate,
}

impl Mode {
    /// Chat and summaries call the generation API and need a credential;
    /// translation uses a keyless public endpoint.
    pub fn requires_credential(self) -> bool {
        matches!(self, Mode::Chat | Mode::Summary)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Chat => write!(f, "chat"),
            Mode::Summary => write!(f, "summary"),
            Mode::Translate => write!(f, "translate"),
        }
    }
}

/// Supported translation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Tamil,
    Hindi,
    Spanish,
    French,
    German,
    Chinese,
    Arabic,
    Russian,
    Portuguese,
    Japanese,
    Korean,
    Italian,
}

impl Language {
    /// Every supported language, in menu order.
    pub const ALL: [Language; 13] = [
        Language::English,
        Language::Tamil,
        Language::Hindi,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Chinese,
        Language::Arabic,
        Language::Russian,
        Language::Portuguese,
        Language::Japanese,
        Language::Korean,
        Language::Italian,
    ];

    /// ISO 639-1 code sent to the translation API.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Tamil => "ta",
            Language::Hindi => "hi",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Chinese => "zh",
            Language::Arabic => "ar",
            Language::Russian => "ru",
            Language::Portuguese => "pt",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Italian => "it",
        }
    }

    /// Human-readable name, e.g. "French (fr)".
    pub fn display_name(self) -> String {
        let name = match self {
            Language::English => "English",
            Language::Tamil => "Tamil",
            Language::Hindi => "Hindi",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Chinese => "Chinese",
            Language::Arabic => "Arabic",
            Language::Russian => "Russian",
            Language::Portuguese => "Portuguese",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Italian => "Italian",
        };
        format!("{} ({})", name, self.code())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for Language {
    type Err = PdfChatError;

    /// Accepts an ISO code ("fr") or an English name ("french"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.code() == needle
                    || lang
                        .display_name()
                        .to_lowercase()
                        .split(' ')
                        .next()
                        .is_some_and(|name| name == needle)
            })
            .ok_or_else(|| {
                let codes: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
                PdfChatError::InvalidConfig(format!(
                    "Unsupported language '{}'. Choose one of: {}",
                    s,
                    codes.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = SessionConfig::default();
        assert_eq!(c.model_or_default(), "llama-3.3-70b-versatile");
        assert_eq!(c.chat_temperature, 0.3);
        assert_eq!(c.summary_temperature, 0.5);
        assert_eq!(c.max_tokens, 1500);
        assert_eq!(c.context_budget, 7000);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let c = SessionConfig::builder().api_key("   ").build().unwrap();
        assert!(c.api_key.is_none());
    }

    #[test]
    fn zero_budget_is_rejected() {
        let err = SessionConfig::builder().context_budget(0).build().unwrap_err();
        assert!(matches!(err, PdfChatError::InvalidConfig(_)));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = SessionConfig::builder().chat_temperature(5.0).build().unwrap();
        assert_eq!(c.chat_temperature, 2.0);
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = SessionConfig::builder().api_key("gsk_secret").build().unwrap();
        let dbg = format!("{:?}", c);
        assert!(!dbg.contains("gsk_secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn language_table_has_thirteen_unique_codes() {
        let mut codes: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 13);
    }

    #[test]
    fn language_parses_code_and_name() {
        assert_eq!("ta".parse::<Language>().unwrap(), Language::Tamil);
        assert_eq!("Japanese".parse::<Language>().unwrap(), Language::Japanese);
        assert_eq!(" FR ".parse::<Language>().unwrap(), Language::French);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn language_display_name_includes_code() {
        assert_eq!(Language::German.display_name(), "German (de)");
    }

    #[test]
    fn only_generation_modes_need_a_credential() {
        assert!(Mode::Chat.requires_credential());
        assert!(Mode::Summary.requires_credential());
        assert!(!Mode::Translate.requires_credential());
    }
}
