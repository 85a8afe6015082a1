//! Translation API boundary and per-page translation.
//!
//! Pages are translated one at a time and each page gets its own outcome:
//! a blank page short-circuits to [`TranslationOutcome::Empty`] without an
//! API call, and a failed call becomes [`TranslationOutcome::Failed`] for that
//! page only. A document therefore always yields one [`PageTranslation`] per
//! page, whatever happens to its neighbours.
//!
//! [`translate_pages`] exposes the same work as a `Stream` so callers can
//! show pages as they arrive; [`translate_document`] collects it.

use crate::config::Language;
use crate::document::Document;
use crate::error::{PdfChatError, ServiceError};
use crate::output::{PageTranslation, TranslationOutcome};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Largest text the public Google endpoint accepts in one request.
pub const MAX_REQUEST_CHARS: usize = 5000;

const SERVICE: &str = "google-translate";

/// A hosted translation backend. Source language is auto-detected.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError>;
}

/// A stream of per-page translations, in page order.
pub type TranslationStream<'a> = Pin<Box<dyn Stream<Item = PageTranslation> + Send + 'a>>;

/// Translate one page, isolating its failure.
pub async fn translate_page(
    translator: &dyn Translator,
    page_num: usize,
    text: &str,
    target: Language,
) -> PageTranslation {
    if text.trim().is_empty() {
        return PageTranslation {
            page_num,
            outcome: TranslationOutcome::Empty,
        };
    }

    let outcome = match translator.translate(text, target).await {
        Ok(translated) => TranslationOutcome::Translated(translated),
        Err(e) => {
            warn!("Page {}: translation failed: {}", page_num, e);
            TranslationOutcome::Failed(e)
        }
    };
    PageTranslation { page_num, outcome }
}

/// Translate every page of `doc` sequentially, yielding each as it completes.
pub fn translate_pages<'a>(
    translator: &'a dyn Translator,
    doc: &'a Document,
    target: Language,
) -> TranslationStream<'a> {
    let s = stream::iter(doc.pages())
        .then(move |(page_num, text)| translate_page(translator, page_num, text, target));
    Box::pin(s)
}

/// Translate every page of `doc`; one result per page, in page order.
pub async fn translate_document(
    translator: &dyn Translator,
    doc: &Document,
    target: Language,
) -> Vec<PageTranslation> {
    translate_pages(translator, doc, target).collect().await
}

// ── Google Translate ─────────────────────────────────────────────────────

/// Client for Google's public `translate_a/single` endpoint (no key needed).
pub struct GoogleTranslator {
    http: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

impl GoogleTranslator {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, PdfChatError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PdfChatError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            timeout_secs,
        })
    }

    async fn translate_chunk(&self, chunk: &str, target: Language) -> Result<String, ServiceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target.code()),
                ("dt", "t"),
            ])
            .form(&[("q", chunk)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        match status.as_u16() {
            200..=299 => parse_translation(&body),
            429 => Err(ServiceError::RateLimited {
                service: SERVICE.to_string(),
                retry_after_secs: None,
            }),
            _ => Err(ServiceError::Translation {
                detail: format!("HTTP {}", status),
            }),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout {
                service: SERVICE.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            ServiceError::Translation {
                detail: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError> {
        let chunks = split_for_request(text, MAX_REQUEST_CHARS);
        debug!(
            "Translating {} chars to {} in {} request(s)",
            text.chars().count(),
            target.code(),
            chunks.len()
        );

        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            parts.push(self.translate_chunk(chunk, target).await?);
        }
        Ok(parts.join("\n"))
    }
}

/// Concatenate the translated segments of a `translate_a/single` response.
///
/// The body is a nested JSON array whose first element lists
/// `[translated, original, …]` segments.
fn parse_translation(body: &str) -> Result<String, ServiceError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ServiceError::Translation {
            detail: format!("unexpected response: {e}"),
        })?;

    let segments = value
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| ServiceError::Translation {
            detail: "response contained no translation".to_string(),
        })?;

    Ok(segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|s| s.as_str()))
        .collect())
}

/// Split `text` into pieces of at most `max` characters, breaking after the
/// last newline that fits. A single line longer than `max` is cut mid-line.
/// The newline at each break is dropped.
fn split_for_request(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max {
        let window_end = rest
            .char_indices()
            .nth(max)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];
        match window.rfind('\n') {
            Some(nl) if nl > 0 => {
                chunks.push(&rest[..nl]);
                rest = &rest[nl + 1..];
            }
            _ => {
                chunks.push(window);
                rest = &rest[window_end..];
            }
        }
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Uppercases text; fails on any page containing "FAIL".
    struct Shouty {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for Shouty {
        async fn translate(&self, text: &str, target: Language) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("FAIL") {
                return Err(ServiceError::Translation {
                    detail: "HTTP 500".into(),
                });
            }
            Ok(format!("{}:{}", target.code(), text.to_uppercase()))
        }
    }

    fn shouty() -> Shouty {
        Shouty {
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn blank_page_is_not_sent() {
        let t = shouty();
        let r = tokio_test::block_on(translate_page(&t, 4, "  \n\t ", Language::French));
        assert_eq!(r.outcome, TranslationOutcome::Empty);
        assert_eq!(r.text(), "[Empty]");
        assert_eq!(t.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_page_does_not_abort_document() {
        let t = shouty();
        let doc = Document::new(
            "a.pdf",
            vec!["one".into(), "FAIL here".into(), "".into(), "four".into()],
        );
        let results = tokio_test::block_on(translate_document(&t, &doc, Language::German));

        let texts: Vec<String> = results.iter().map(PageTranslation::text).collect();
        assert_eq!(
            texts,
            vec![
                "de:ONE".to_string(),
                "[Error: Translation failed: HTTP 500]".to_string(),
                "[Empty]".to_string(),
                "de:FOUR".to_string(),
            ]
        );
        let nums: Vec<usize> = results.iter().map(|r| r.page_num).collect();
        assert_eq!(nums, vec![1, 2, 3, 4]);
        assert_eq!(t.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stream_yields_pages_in_order() {
        let t = shouty();
        let doc = Document::new("a.pdf", vec!["a".into(), "b".into()]);
        let mut s = translate_pages(&t, &doc, Language::Spanish);
        assert_eq!(s.next().await.map(|p| p.page_num), Some(1));
        assert_eq!(s.next().await.map(|p| p.text()), Some("es:B".to_string()));
        assert!(s.next().await.is_none());
    }

    #[test]
    fn parses_segmented_response() {
        let body = r#"[[["Bonjour. ","Hello. ",null,null,10],["Au revoir","Goodbye",null,null,10]],null,"en"]"#;
        assert_eq!(parse_translation(body).unwrap(), "Bonjour. Au revoir");
    }

    #[test]
    fn malformed_response_is_translation_error() {
        assert!(matches!(
            parse_translation("<html>"),
            Err(ServiceError::Translation { .. })
        ));
        assert!(parse_translation("{}").is_err());
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_for_request("hello\nworld", 5000), vec!["hello\nworld"]);
    }

    #[test]
    fn long_text_breaks_on_newlines() {
        let text = format!("{}\n{}\n{}", "a".repeat(6), "b".repeat(6), "c".repeat(3));
        let chunks = split_for_request(&text, 10);
        assert_eq!(chunks, vec!["aaaaaa", "bbbbbb", "ccc"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn overlong_line_is_cut() {
        let text = "x".repeat(25);
        let chunks = split_for_request(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), text);
    }
}
