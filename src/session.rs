//! The session: every loaded document and every result, owned in one place.
//!
//! ## Why an explicit session object?
//!
//! Documents, the chat transcript, summaries and translations all live and
//! die together (loading adds, [`Session::clear`] wipes). Keeping them in one
//! struct that is passed by `&mut` makes each action's effect on state
//! visible in its signature, and lets tests drive a whole session with stub
//! backends.
//!
//! ## Action preconditions
//!
//! | Action | Needs a credential | Needs documents |
//! |--------|--------------------|-----------------|
//! | [`Session::ask`] | yes | yes |
//! | [`Session::summarize_all`] | yes | yes |
//! | [`Session::translate_all`] | no | yes |
//!
//! A missing credential is checked before anything else is touched, so a
//! rejected action leaves the session unchanged.

use crate::config::{Language, Mode, SessionConfig};
use crate::context::{self, ContextResult};
use crate::document::{Document, DocumentStore};
use crate::error::PdfChatError;
use crate::export::{self, ExportKind};
use crate::output::{
    ChatAnswer, DocumentSummary, LoadReport, SessionStats, SummaryMap, TranscriptEntry,
    TranslationMap,
};
use crate::pipeline::llm::{self, GenerationOptions, Generator};
use crate::pipeline::translate::{self, GoogleTranslator, Translator};
use crate::pipeline::{extract, input};
use crate::prompts;
use chrono::Local;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A PDF chat session.
pub struct Session {
    config: SessionConfig,
    generator: Option<Arc<dyn Generator>>,
    translator: Arc<dyn Translator>,
    documents: DocumentStore,
    transcript: Vec<TranscriptEntry>,
    summaries: SummaryMap,
    translations: TranslationMap,
    translation_language: Option<Language>,
}

impl Session {
    /// Create a session, resolving backends from `config`.
    ///
    /// A session without a generation backend is valid: translation still
    /// works, and chat/summary actions fail with
    /// [`PdfChatError::MissingCredential`].
    pub fn new(config: SessionConfig) -> Result<Self, PdfChatError> {
        let generator = llm::resolve_generator(&config)?;
        let translator: Arc<dyn Translator> = match config.translator {
            Some(ref t) => Arc::clone(t),
            None => Arc::new(GoogleTranslator::new(
                &config.translate_url,
                config.api_timeout_secs,
            )?),
        };
        if generator.is_none() {
            debug!("No generation backend configured; chat and summaries are disabled");
        }
        Ok(Self::with_backends(config, generator, translator))
    }

    /// Create a session with explicit backends.
    pub fn with_backends(
        config: SessionConfig,
        generator: Option<Arc<dyn Generator>>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            config,
            generator,
            translator,
            documents: DocumentStore::new(),
            transcript: Vec::new(),
            summaries: SummaryMap::new(),
            translations: TranslationMap::new(),
            translation_language: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether `mode` can run with the configured backends.
    pub fn can_run(&self, mode: Mode) -> bool {
        !mode.requires_credential() || self.generator.is_some()
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn summaries(&self) -> &SummaryMap {
        &self.summaries
    }

    pub fn translations(&self) -> &TranslationMap {
        &self.translations
    }

    /// Target language of the current translation mapping, if any.
    pub fn translation_language(&self) -> Option<Language> {
        self.translation_language
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            documents: self.documents.len(),
            total_pages: self.documents.total_pages(),
            messages: self.transcript.len(),
            summaries: self.summaries.len(),
            translated_documents: self.translations.len(),
        }
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Load local paths or URLs.
    ///
    /// The batch is all-or-nothing: every new file is extracted before any is
    /// added, so one unreadable PDF leaves the session unchanged. Names that
    /// are already loaded (or repeated within the batch) are skipped without
    /// being fetched.
    pub async fn load_pdfs<S: AsRef<str>>(
        &mut self,
        inputs: &[S],
    ) -> Result<LoadReport, PdfChatError> {
        let mut sources = Vec::with_capacity(inputs.len());
        for input in inputs {
            let source =
                input::resolve_input(input.as_ref(), self.config.download_timeout_secs).await?;
            sources.push(source);
        }
        self.load_sources(sources).await
    }

    /// Load PDFs that are already in memory.
    pub async fn load_sources(
        &mut self,
        sources: Vec<input::PdfSource>,
    ) -> Result<LoadReport, PdfChatError> {
        let start = Instant::now();
        let mut seen: HashSet<String> = HashSet::new();
        let mut skipped = Vec::new();
        let mut docs = Vec::with_capacity(sources.len());

        for source in sources {
            if self.documents.contains(&source.name) || !seen.insert(source.name.clone()) {
                skipped.push(source.name);
                continue;
            }
            let doc = extract::extract_document(source, self.config.password.as_deref()).await?;
            docs.push(doc);
        }

        let mut report = self.add_documents(docs);
        skipped.append(&mut report.skipped);
        report.skipped = skipped;
        info!(
            "Loaded {} document(s), {} page(s), {} skipped in {:?}",
            report.added.len(),
            report.pages_added,
            report.skipped.len(),
            start.elapsed()
        );
        Ok(report)
    }

    /// Add already-extracted documents. Names already loaded are skipped.
    pub fn add_documents(&mut self, docs: Vec<Document>) -> LoadReport {
        let mut report = LoadReport::default();
        for doc in docs {
            let name = doc.name().to_string();
            let pages = doc.page_count();
            if self.documents.insert(doc) {
                debug!("Added '{}' ({} pages)", name, pages);
                report.added.push(name);
                report.pages_added += pages;
            } else {
                warn!("'{}' is already loaded; skipping", name);
                report.skipped.push(name);
            }
        }
        report
    }

    // ── Chat ─────────────────────────────────────────────────────────────

    /// The excerpt a chat turn for `query` would send.
    pub fn context_for(&self, query: &str) -> ContextResult {
        context::select_context(query, &self.documents, self.config.context_budget)
    }

    /// Answer `query` from the loaded documents.
    ///
    /// The question is appended to the transcript before the call. On success
    /// the answer (with a referenced-pages footnote when pages contributed)
    /// is appended too; on failure the error is returned and the question
    /// stays in the transcript.
    pub async fn ask(&mut self, query: &str) -> Result<ChatAnswer, PdfChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PdfChatError::EmptyQuery);
        }
        let generator = self
            .generator
            .clone()
            .ok_or(PdfChatError::MissingCredential)?;
        if self.documents.is_empty() {
            return Err(PdfChatError::NoDocuments);
        }

        self.transcript.push(TranscriptEntry::user(query));

        let ctx = self.context_for(query);
        debug!(
            "Chat context: {} chars from pages {:?}",
            ctx.text.chars().count(),
            ctx.pages
        );

        let options = GenerationOptions {
            temperature: self.config.chat_temperature,
            max_tokens: self.config.max_tokens,
        };
        let reply = generator
            .generate(&prompts::chat_system_prompt(&ctx.text), query, &options)
            .await
            .map_err(|e| {
                warn!("Chat call failed: {}", e);
                PdfChatError::Service(e)
            })?;

        let mut answer = reply;
        if !ctx.pages.is_empty() {
            answer.push_str(&prompts::referenced_pages_footnote(&ctx.pages));
        }
        self.transcript.push(TranscriptEntry::assistant(answer.clone()));

        Ok(ChatAnswer {
            answer,
            pages: ctx.pages,
        })
    }

    // ── Summaries ────────────────────────────────────────────────────────

    /// Summarise every loaded document, one call each.
    ///
    /// A failed call is recorded for that document only. Existing summaries
    /// are replaced document by document.
    pub async fn summarize_all(&mut self) -> Result<&SummaryMap, PdfChatError> {
        let generator = self
            .generator
            .clone()
            .ok_or(PdfChatError::MissingCredential)?;
        if self.documents.is_empty() {
            return Err(PdfChatError::NoDocuments);
        }

        let options = GenerationOptions {
            temperature: self.config.summary_temperature,
            max_tokens: self.config.max_tokens,
        };

        for doc in self.documents.iter() {
            let summary = summarize_document(generator.as_ref(), doc, &options).await;
            self.summaries.insert(doc.name().to_string(), summary);
        }

        let failed = self.summaries.values().filter(|s| !s.is_ok()).count();
        info!(
            "Summarised {} document(s), {} failed",
            self.summaries.len(),
            failed
        );
        Ok(&self.summaries)
    }

    // ── Translation ──────────────────────────────────────────────────────

    /// Translate every page of every document into `target`.
    ///
    /// Replaces the previous translation mapping wholesale. Per-page failures
    /// are kept inline.
    pub async fn translate_all(&mut self, target: Language) -> Result<&TranslationMap, PdfChatError> {
        if self.documents.is_empty() {
            return Err(PdfChatError::NoDocuments);
        }

        let start = Instant::now();
        let mut fresh = TranslationMap::new();
        for doc in self.documents.iter() {
            let pages = translate::translate_document(self.translator.as_ref(), doc, target).await;
            let failed = pages.iter().filter(|p| p.is_failed()).count();
            if failed > 0 {
                warn!("'{}': {} page(s) failed to translate", doc.name(), failed);
            }
            fresh.insert(doc.name().to_string(), pages);
        }

        info!(
            "Translated {} document(s) to {} in {:?}",
            fresh.len(),
            target.code(),
            start.elapsed()
        );
        self.translations = fresh;
        self.translation_language = Some(target);
        Ok(&self.translations)
    }

    // ── Housekeeping ─────────────────────────────────────────────────────

    /// Drop all documents and results.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.transcript.clear();
        self.summaries.clear();
        self.translations.clear();
        self.translation_language = None;
        info!("Session cleared");
    }

    // ── Export ───────────────────────────────────────────────────────────

    /// Render `kind` to bytes.
    pub fn export(&self, kind: ExportKind) -> Result<Vec<u8>, PdfChatError> {
        let now = Local::now();
        match kind {
            ExportKind::Chat => export::chat_transcript_pdf(&self.transcript, now),
            ExportKind::Summaries => export::summaries_pdf(&self.summaries, now),
            ExportKind::Translations => {
                Ok(export::translations_txt(&self.translations, now).into_bytes())
            }
        }
    }

    /// Render `kind` and write it atomically to `path`.
    pub fn export_to_file(&self, kind: ExportKind, path: &Path) -> Result<(), PdfChatError> {
        let bytes = self.export(kind)?;
        export::write_atomic(path, &bytes)
    }
}

async fn summarize_document(
    generator: &dyn Generator,
    doc: &Document,
    options: &GenerationOptions,
) -> DocumentSummary {
    let sample = context::sample_for_summary(doc);
    let system = prompts::summary_system_prompt(doc.page_count());

    let outcome = generator.generate(&system, &sample, options).await;
    if let Err(ref e) = outcome {
        warn!("Summary of '{}' failed: {}", doc.name(), e);
    }
    DocumentSummary {
        document: doc.name().to_string(),
        page_count: doc.page_count(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use async_trait::async_trait;

    struct NoTranslate;

    #[async_trait]
    impl Translator for NoTranslate {
        async fn translate(&self, text: &str, _target: Language) -> Result<String, ServiceError> {
            Ok(text.to_string())
        }
    }

    fn keyless() -> Session {
        Session::with_backends(SessionConfig::default(), None, Arc::new(NoTranslate))
    }

    #[test]
    fn duplicate_names_are_skipped() {
        let mut s = keyless();
        let r1 = s.add_documents(vec![Document::new("a.pdf", vec!["x".into()])]);
        assert_eq!(r1.added, vec!["a.pdf"]);
        let r2 = s.add_documents(vec![
            Document::new("a.pdf", vec!["other".into(), "pages".into()]),
            Document::new("b.pdf", vec!["y".into()]),
        ]);
        assert_eq!(r2.added, vec!["b.pdf"]);
        assert_eq!(r2.skipped, vec!["a.pdf"]);
        assert_eq!(s.documents().get("a.pdf").unwrap().page_count(), 1);
    }

    #[test]
    fn keyless_session_refuses_generation_modes() {
        let mut s = keyless();
        s.add_documents(vec![Document::new("a.pdf", vec!["x".into()])]);
        assert!(!s.can_run(Mode::Chat));
        assert!(s.can_run(Mode::Translate));

        let err = tokio_test::block_on(s.ask("hello")).unwrap_err();
        assert!(matches!(err, PdfChatError::MissingCredential));
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn blank_query_is_rejected_first() {
        let mut s = keyless();
        let err = tokio_test::block_on(s.ask("   ")).unwrap_err();
        assert!(matches!(err, PdfChatError::EmptyQuery));
    }

    #[test]
    fn translate_without_documents_is_an_error() {
        let mut s = keyless();
        let err = tokio_test::block_on(s.translate_all(Language::French)).unwrap_err();
        assert!(matches!(err, PdfChatError::NoDocuments));
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = keyless();
        s.add_documents(vec![Document::new("a.pdf", vec!["x".into()])]);
        tokio_test::block_on(s.translate_all(Language::Hindi)).unwrap();
        assert_eq!(s.translation_language(), Some(Language::Hindi));

        s.clear();
        let stats = s.stats();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.total_pages, 0);
        assert_eq!(stats.translated_documents, 0);
        assert!(s.translation_language().is_none());
    }
}
