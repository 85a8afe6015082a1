//! Groq chat-completions client (OpenAI-compatible wire format).
//!
//! This is the default generation backend when the caller configures only an
//! API key. Any OpenAI-compatible server works by pointing
//! `SessionConfig::groq_base_url` at it.

use crate::error::{PdfChatError, ServiceError};
use crate::pipeline::llm::{GenerationOptions, Generator};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SERVICE: &str = "groq";

/// Generation client for `POST {base_url}/chat/completions`.
pub struct GroqClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GroqClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, PdfChatError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PdfChatError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl Generator for GroqClient {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: &GenerationOptions,
    ) -> Result<String, ServiceError> {
        let start = Instant::now();
        let request = build_request(&self.model, system, user, options);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !(200..300).contains(&status) {
            warn!("Groq returned HTTP {}", status);
            return Err(classify_status(status, retry_after, &body));
        }

        let content = parse_completion(&body)?;
        debug!(
            "Groq {}: {} chars in {:?}",
            self.model,
            content.chars().count(),
            start.elapsed()
        );
        Ok(content)
    }
}

impl GroqClient {
    fn transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout {
                service: SERVICE.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            ServiceError::Generation {
                detail: e.to_string(),
            }
        }
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn build_request<'a>(
    model: &'a str,
    system: &'a str,
    user: &'a str,
    options: &GenerationOptions,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            WireMessage {
                role: "system",
                content: system,
            },
            WireMessage {
                role: "user",
                content: user,
            },
        ],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    }
}

/// First choice's message content.
fn parse_completion(body: &str) -> Result<String, ServiceError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Generation {
            detail: format!("unexpected response: {e}"),
        })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ServiceError::Generation {
            detail: "response contained no message".to_string(),
        })
}

/// Map a non-2xx status to a [`ServiceError`], preferring the API's own message.
fn classify_status(status: u16, retry_after_secs: Option<u64>, body: &str) -> ServiceError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}: {}", body.trim()));

    match status {
        401 | 403 => ServiceError::Auth {
            service: SERVICE.to_string(),
            detail,
        },
        429 => ServiceError::RateLimited {
            service: SERVICE.to_string(),
            retry_after_secs,
        },
        _ => ServiceError::Generation { detail },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_has_system_then_user() {
        let opts = GenerationOptions {
            temperature: 0.3,
            max_tokens: 1500,
        };
        let req = build_request("llama-3.3-70b-versatile", "ctx", "question?", &opts);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "ctx");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "question?");
        assert_eq!(json["max_tokens"], 1500);
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"42"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "42");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ServiceError::Generation { .. }));
        assert!(parse_completion("not json").is_err());
    }

    #[test]
    fn status_401_is_auth_error_with_api_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        let err = classify_status(401, None, body);
        assert_eq!(
            err,
            ServiceError::Auth {
                service: "groq".into(),
                detail: "Invalid API Key".into()
            }
        );
    }

    #[test]
    fn status_429_keeps_retry_after() {
        let err = classify_status(429, Some(12), "");
        assert_eq!(
            err,
            ServiceError::RateLimited {
                service: "groq".into(),
                retry_after_secs: Some(12)
            }
        );
    }

    #[test]
    fn other_status_falls_back_to_raw_body() {
        let err = classify_status(500, None, "upstream down\n");
        assert_eq!(
            err,
            ServiceError::Generation {
                detail: "HTTP 500: upstream down".into()
            }
        );
    }

    #[test]
    fn endpoint_joins_base_url() {
        let c = GroqClient::new("https://api.groq.com/openai/v1/", "k", "m", 5).unwrap();
        assert_eq!(c.endpoint, "https://api.groq.com/openai/v1/chat/completions");
    }
}
