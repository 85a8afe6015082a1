//! Export formatters: chat transcript and summaries as PDF, translations as
//! UTF-8 text.
//!
//! Formatters are pure: they take session records plus a timestamp and
//! return bytes. [`write_atomic`] puts those bytes on disk.
//!
//! ## Why atomic writes?
//!
//! An interrupted export must not leave a truncated file under the name the
//! user asked for. Bytes go to a temp file in the destination directory,
//! which is then renamed over the target.

pub mod pdf;
pub mod text;

pub use text::translations_txt;

use crate::error::PdfChatError;
use crate::output::{SummaryMap, TranscriptEntry};
use chrono::{DateTime, Local};
use pdf::PdfBuilder;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Title printed at the top of every export.
pub const EXPORT_TITLE: &str = "PDF Summarizer & Translator Chatbot";

/// The three kinds of export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Chat,
    Summaries,
    Translations,
}

impl ExportKind {
    fn prefix(self) -> &'static str {
        match self {
            ExportKind::Chat => "Chat",
            ExportKind::Summaries => "Summaries",
            ExportKind::Translations => "Translations",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Chat | ExportKind::Summaries => "pdf",
            ExportKind::Translations => "txt",
        }
    }

    /// e.g. `Chat_20240309_140507.pdf`.
    pub fn default_file_name(self, at: DateTime<Local>) -> String {
        format!(
            "{}_{}.{}",
            self.prefix(),
            at.format("%Y%m%d_%H%M%S"),
            self.extension()
        )
    }
}

pub(crate) fn generated_line(at: DateTime<Local>) -> String {
    format!("Generated: {}", at.format("%Y-%m-%d %H:%M:%S"))
}

fn header(builder: &mut PdfBuilder, generated: DateTime<Local>) {
    builder.title(EXPORT_TITLE);
    builder.paragraph(&generated_line(generated));
    builder.spacer(14);
}

/// The chat transcript as a PDF: each entry under a `You:` / `Bot:` label.
pub fn chat_transcript_pdf(
    entries: &[TranscriptEntry],
    generated: DateTime<Local>,
) -> Result<Vec<u8>, PdfChatError> {
    let mut b = PdfBuilder::new();
    header(&mut b, generated);
    b.heading("Chat Transcript");
    for entry in entries {
        b.label(entry.role.label());
        b.paragraph(&entry.content);
        b.spacer(6);
    }
    b.finish()
}

/// Per-document summaries as a PDF, each document on its own page(s).
pub fn summaries_pdf(
    summaries: &SummaryMap,
    generated: DateTime<Local>,
) -> Result<Vec<u8>, PdfChatError> {
    let mut b = PdfBuilder::new();
    header(&mut b, generated);
    b.heading("PDF Summaries");
    for (name, summary) in summaries {
        b.heading(name);
        b.paragraph(&summary.text());
        b.page_break();
    }
    b.finish()
}

/// Write `bytes` to `path` via a temp file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PdfChatError> {
    let write_err = |source: std::io::Error| PdfChatError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::output::DocumentSummary;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn default_file_names_carry_timestamp() {
        let t = fixed_time();
        assert_eq!(ExportKind::Chat.default_file_name(t), "Chat_20240309_140507.pdf");
        assert_eq!(
            ExportKind::Summaries.default_file_name(t),
            "Summaries_20240309_140507.pdf"
        );
        assert_eq!(
            ExportKind::Translations.default_file_name(t),
            "Translations_20240309_140507.txt"
        );
    }

    #[test]
    fn generated_line_format() {
        assert_eq!(generated_line(fixed_time()), "Generated: 2024-03-09 14:05:07");
    }

    #[test]
    fn transcript_pdf_is_loadable() {
        let entries = vec![
            TranscriptEntry::user("What is on page 2?"),
            TranscriptEntry::assistant("A table.\n\n*Referenced pages: 2*"),
        ];
        let bytes = chat_transcript_pdf(&entries, fixed_time()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn summaries_pdf_breaks_page_per_document() {
        let mut map = SummaryMap::new();
        for (name, outcome) in [
            ("a.pdf", Ok("First.".to_string())),
            ("b.pdf", Ok("Second.".to_string())),
            (
                "c.pdf",
                Err(ServiceError::Generation {
                    detail: "503".into(),
                }),
            ),
        ] {
            map.insert(
                name.to_string(),
                DocumentSummary {
                    document: name.to_string(),
                    page_count: 1,
                    outcome,
                },
            );
        }
        let bytes = summaries_pdf(&map, fixed_time()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn write_atomic_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }
}
