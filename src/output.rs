//! Records produced by a session: transcript entries, summaries, translations.
//!
//! Every record is `Serialize` so the CLI's `--json` mode can dump it as-is.

use crate::error::ServiceError;
use indexmap::IndexMap;
use serde::Serialize;

/// Literal shown for a page whose extracted text is blank.
pub const EMPTY_PAGE_PLACEHOLDER: &str = "[Empty]";

/// Who wrote a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used in exports.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You:",
            Role::Assistant => "Bot:",
        }
    }
}

/// One message of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The result of one chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatAnswer {
    /// Answer text as stored in the transcript (with the page footnote).
    pub answer: String,
    /// Pages that contributed to the context, in sampling order.
    pub pages: Vec<usize>,
}

/// Summary of one document. A failed generation call is kept inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub document: String,
    pub page_count: usize,
    pub outcome: Result<String, ServiceError>,
}

impl DocumentSummary {
    /// Display text: the summary, or `Error: …` when the call failed.
    pub fn text(&self) -> String {
        match &self.outcome {
            Ok(summary) => summary.clone(),
            Err(e) => format!("Error: {e}"),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// What happened to one page during translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TranslationOutcome {
    Translated(String),
    /// Blank page; no API call was made.
    Empty,
    Failed(ServiceError),
}

/// Translation of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageTranslation {
    pub page_num: usize,
    pub outcome: TranslationOutcome,
}

impl PageTranslation {
    /// Display text: the translation, [`EMPTY_PAGE_PLACEHOLDER`], or `[Error: …]`.
    pub fn text(&self) -> String {
        match &self.outcome {
            TranslationOutcome::Translated(t) => t.clone(),
            TranslationOutcome::Empty => EMPTY_PAGE_PLACEHOLDER.to_string(),
            TranslationOutcome::Failed(e) => format!("[Error: {e}]"),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TranslationOutcome::Failed(_))
    }
}

/// Translations keyed by document name, in upload order.
pub type TranslationMap = IndexMap<String, Vec<PageTranslation>>;

/// Summaries keyed by document name, in upload order.
pub type SummaryMap = IndexMap<String, DocumentSummary>;

/// Outcome of loading a batch of PDFs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Newly loaded documents.
    pub added: Vec<String>,
    /// Names already in the store; left untouched.
    pub skipped: Vec<String>,
    /// Pages across the newly loaded documents.
    pub pages_added: usize,
}

/// Snapshot of what the session holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub documents: usize,
    pub total_pages: usize,
    pub messages: usize,
    pub summaries: usize,
    pub translated_documents: usize,
}
