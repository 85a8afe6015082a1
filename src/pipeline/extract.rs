//! PDF text extraction: raw PDF bytes → page-indexed text via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking thread pool
//! so Tokio worker threads never stall on a large document.
//!
//! ## Library lookup
//!
//! pdfium is bound at runtime, first match wins:
//!
//! 1. `PDFIUM_LIB_PATH`: a library file, or a directory containing one
//! 2. the current working directory
//! 3. the system library search path

use crate::document::Document;
use crate::error::PdfChatError;
use crate::pipeline::input::PdfSource;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Extract the text of every page of `source` into a [`Document`].
///
/// Failure here is fatal for the document: a corrupt or locked PDF is
/// reported as an error, never as a partially filled document.
pub async fn extract_document(
    source: PdfSource,
    password: Option<&str>,
) -> Result<Document, PdfChatError> {
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_blocking(&source, pwd.as_deref()))
        .await
        .map_err(|e| PdfChatError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of text extraction.
fn extract_blocking(source: &PdfSource, password: Option<&str>) -> Result<Document, PdfChatError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(&source.bytes, password)
        .map_err(|e| classify_load_error(&source.name, password.is_some(), &e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF '{}' loaded: {} pages", source.name, total_pages);

    let mut texts = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| PdfChatError::CorruptPdf {
                name: source.name.clone(),
                detail: format!("page {}: {:?}", idx + 1, e),
            })?
            .all();
        debug!("Extracted page {} → {} chars", idx + 1, text.chars().count());
        texts.push(text);
    }

    Ok(Document::new(source.name.clone(), texts))
}

fn classify_load_error(name: &str, had_password: bool, err: &PdfiumError) -> PdfChatError {
    let detail = format!("{:?}", err);
    if detail.to_lowercase().contains("password") {
        if had_password {
            PdfChatError::WrongPassword {
                name: name.to_string(),
            }
        } else {
            PdfChatError::PasswordRequired {
                name: name.to_string(),
            }
        }
    } else {
        PdfChatError::CorruptPdf {
            name: name.to_string(),
            detail,
        }
    }
}

/// Bind to a pdfium shared library.
fn bind_pdfium() -> Result<Pdfium, PdfChatError> {
    let from_env = std::env::var("PDFIUM_LIB_PATH").ok().filter(|p| !p.is_empty());

    let bindings = match from_env {
        Some(path) if Path::new(&path).is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path))
        }
        Some(path) => Pdfium::bind_to_library(&path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PdfChatError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
