//! Error types for the edgequake-pdfchat library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PdfChatError`]: returned as `Err` from [`crate::session::Session`]
//!   operations: the action could not run at all (unreadable PDF, no
//!   credential, nothing loaded) or its single external call failed.
//!
//! * [`ServiceError`]: one external call (generation or translation) failed.
//!   It is stored inline in per-unit results ([`crate::output::DocumentSummary`],
//!   [`crate::output::PageTranslation`]) so one bad document or page never
//!   aborts its siblings.
//!
//! Nothing in this crate retries. Every failure is reported once, where it
//! happens.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum PdfChatError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' could not be read: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs libpdfium. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n\
  • Place libpdfium next to the working directory.\n\
  • Install it system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Session state errors ──────────────────────────────────────────────
    /// Chat and summary actions need an API credential (or a configured provider).
    #[error("No API key configured.\nSet GROQ_API_KEY (or pass --api-key) to chat with or summarise your PDFs.")]
    MissingCredential,

    /// The action needs at least one loaded document.
    #[error("No PDF documents are loaded")]
    NoDocuments,

    /// The chat query was empty or whitespace.
    #[error("Query is empty")]
    EmptyQuery,

    // ── External service errors ───────────────────────────────────────────
    /// A named provider could not be initialised (missing key, unknown name).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The single external call behind this action failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The export document could not be produced.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Could not create or write an export file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed call to an external generation or translation API.
///
/// Cloneable and serialisable so it can live inside result records and be
/// exported as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ServiceError {
    /// The generation API returned an error or an unusable response.
    #[error("Generation failed: {detail}")]
    Generation { detail: String },

    /// The translation API returned an error or an unusable response.
    #[error("Translation failed: {detail}")]
    Translation { detail: String },

    /// HTTP 401/403: the credential was rejected.
    #[error("Authentication error from '{service}': {detail}")]
    Auth { service: String, detail: String },

    /// HTTP 429.
    #[error("Rate limit exceeded for '{service}'")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    /// The call did not complete within the configured timeout.
    #[error("Call to '{service}' timed out after {secs}s")]
    Timeout { service: String, secs: u64 },
}
