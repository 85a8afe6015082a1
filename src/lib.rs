//! # edgequake-pdfchat
//!
//! Chat with, summarise and translate PDF documents through hosted LLM and
//! translation APIs.
//!
//! ## Why this crate?
//!
//! Sending a whole PDF to an LLM is wasteful and often impossible. This crate
//! extracts text per page once, then decides *which* text each request sees:
//! a question naming a page ("what is on page 4?") gets exactly that page,
//! anything else gets an evenly spread sample of every document bounded by a
//! character budget, and summaries get their own denser sample. Translation
//! goes page by page so one failing page never costs the rest.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (path or URL)
//!  │
//!  ├─ 1. Input     resolve local file or download, check %PDF magic
//!  ├─ 2. Extract   per-page text via pdfium (spawn_blocking)
//!  ├─ 3. Store     DocumentStore, upload order, pages immutable
//!  │
//!  ├─ Chat       page reference? → that page : stride sample under budget
//!  │               → Generator (Groq / edgequake-llm) → answer + page footnote
//!  ├─ Summary    stride sample per document → Generator, failures inline
//!  └─ Translate  every page → Translator (Google), blank/failed pages inline
//!                  → export as PDF (chat, summaries) or TXT (translations)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfchat::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::builder()
//!         .api_key(std::env::var("GROQ_API_KEY")?)
//!         .build()?;
//!     let mut session = Session::new(config)?;
//!     session.load_pdfs(&["report.pdf"]).await?;
//!
//!     let reply = session.ask("What does page 3 say about revenue?").await?;
//!     println!("{}", reply.answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfchat` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfchat = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Language, Mode, SessionConfig, SessionConfigBuilder};
pub use context::{detect_page_reference, ContextRequest, ContextResult};
pub use document::{Document, DocumentStore};
pub use error::{PdfChatError, ServiceError};
pub use export::ExportKind;
pub use output::{
    ChatAnswer, DocumentSummary, LoadReport, PageTranslation, Role, SessionStats, SummaryMap,
    TranscriptEntry, TranslationMap, TranslationOutcome,
};
pub use pipeline::input::PdfSource;
pub use pipeline::llm::{GenerationOptions, Generator};
pub use pipeline::translate::Translator;
pub use session::Session;
