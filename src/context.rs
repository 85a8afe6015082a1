//! Context selection: decide which document text the LLM gets to see.
//!
//! Hosted LLMs take a bounded prompt, so neither chat nor summaries can ship
//! whole documents. This module turns the [`DocumentStore`] into a bounded
//! excerpt using three pure functions:
//!
//! 1. [`detect_page_reference`]: spot "page 7" / "7th page" / "on page 7"
//!    in a user query.
//! 2. [`select_context`]: for chat. A page reference returns that page in
//!    full; anything else stride-samples every document under a character
//!    budget.
//! 3. [`sample_for_summary`]: for summaries. A denser, unlabelled stride
//!    sample of one document, capped at [`SUMMARY_MAX_CHARS`].
//!
//! ## Stride sampling
//!
//! ```text
//! 25 pages, divisor 10  →  stride = max(1, 25 / 10) = 2
//! sampled: 1, 3, 5, …, 25
//! ```
//!
//! Every length in this module counts Unicode scalar values, not bytes.
//! None of these functions mutate the store.

use crate::document::{Document, DocumentStore};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Returned as the excerpt when a targeted page exists in no document.
pub const PAGE_NOT_FOUND: &str = "Page not found in the uploaded PDF.";

/// A chat query samples roughly ten pages per document.
pub const QUERY_SAMPLE_DIVISOR: usize = 10;

/// Characters kept from each page sampled for a chat query.
pub const QUERY_PAGE_CHARS: usize = 700;

/// A summary samples roughly twenty pages per document.
pub const SUMMARY_SAMPLE_DIVISOR: usize = 20;

/// Characters kept from each page sampled for a summary.
pub const SUMMARY_PAGE_CHARS: usize = 400;

/// Hard cap on the summary sample.
pub const SUMMARY_MAX_CHARS: usize = 7000;

const EXCERPT_SEPARATOR: &str = "\n\n";

// Earlier patterns win, wherever they match in the query.
static PAGE_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)page\s*(?:no|number|#)?\s*(\d+)").unwrap(),
        Regex::new(r"(?i)(\d+)\s*(?:st|nd|rd|th)?\s*page").unwrap(),
        Regex::new(r"(?i)on\s*page\s*(\d+)").unwrap(),
    ]
});

static DECIMAL_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d$").unwrap());

/// What the chat context should be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContextRequest {
    /// The user asked about one specific 1-based page.
    Page(usize),
    /// Free-text question: sample across all documents.
    General,
}

impl ContextRequest {
    /// Classify a chat query. A detected "page 0" is not a usable page
    /// number and falls back to a general request.
    pub fn from_query(query: &str) -> Self {
        match detect_page_reference(query) {
            Some(page) if page > 0 => ContextRequest::Page(page),
            _ => ContextRequest::General,
        }
    }
}

/// A bounded excerpt plus the pages it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextResult {
    pub text: String,
    /// Page numbers in the order they were sampled.
    pub pages: Vec<usize>,
}

/// Find an explicit page number in a free-text query.
///
/// Tries, in order, "page [no|number|#] N", "N[st|nd|rd|th] page" and
/// "on page N", case-insensitively, and returns the number captured by the
/// first pattern that matches. Any Unicode decimal digits count ("page ٣"
/// is page 3). Numbers too large for `usize` saturate to `usize::MAX`, which
/// no document has.
pub fn detect_page_reference(query: &str) -> Option<usize> {
    PAGE_PATTERNS
        .iter()
        .find_map(|re| re.captures(query))
        .and_then(|caps| caps.get(1))
        .map(|m| parse_page_number(m.as_str()))
}

fn parse_page_number(digits: &str) -> usize {
    digits
        .chars()
        .filter_map(decimal_value)
        .fold(0usize, |acc, d| acc.saturating_mul(10).saturating_add(d as usize))
}

fn is_decimal_digit(c: char) -> bool {
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut [0u8; 4]))
}

// Decimal digits are assigned in contiguous runs of ten starting at zero, so
// a digit's value is its offset from the start of its run, modulo ten.
fn decimal_value(c: char) -> Option<u32> {
    if let Some(d) = c.to_digit(10) {
        return Some(d);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some((c as u32 - start) % 10)
}

/// Build the chat context for `query`.
///
/// * Page reference → the full text of that page from the first document
///   (in upload order) that has it, labelled `[name - Page N]`, pages `[N]`.
///   No document has it → [`PAGE_NOT_FOUND`] and no pages.
/// * Otherwise → [`sample_documents`] under `budget`.
pub fn select_context(query: &str, store: &DocumentStore, budget: usize) -> ContextResult {
    match ContextRequest::from_query(query) {
        ContextRequest::Page(page) => page_context(store, page),
        ContextRequest::General => sample_documents(store, budget),
    }
}

/// Full text of one page from the first document that has it.
pub fn page_context(store: &DocumentStore, page: usize) -> ContextResult {
    store
        .iter()
        .find_map(|doc| {
            doc.page(page).map(|text| ContextResult {
                text: format!("[{} - Page {}]\n{}", doc.name(), page, text),
                pages: vec![page],
            })
        })
        .unwrap_or_else(|| ContextResult {
            text: PAGE_NOT_FOUND.to_string(),
            pages: Vec::new(),
        })
}

/// Stride-sample every document into one labelled excerpt.
///
/// For each document, pages `1, 1+k, 1+2k, …` with
/// `k = max(1, pages / QUERY_SAMPLE_DIVISOR)` contribute their first
/// [`QUERY_PAGE_CHARS`] characters as `[name - Page N] text`. Entries are
/// joined by blank lines. An entry is only appended while the joined text
/// stays strictly under `budget`; the first entry that would not fit ends
/// sampling for *that document* and the next document is tried.
///
/// The budget covers labels and separators as well as page text, so the
/// excerpt the LLM sees is itself under `budget`. Long document names
/// therefore admit fewer pages than a page-text-only count would: ten
/// 650-char pages from a 61-char name yield pages 1 to 9, not all ten.
pub fn sample_documents(store: &DocumentStore, budget: usize) -> ContextResult {
    let mut parts: Vec<String> = Vec::new();
    let mut pages = Vec::new();
    let mut used = 0usize;

    for doc in store.iter() {
        for page_num in stride_pages(doc, QUERY_SAMPLE_DIVISOR) {
            let Some(text) = doc.page(page_num) else {
                continue;
            };
            let entry = format!(
                "[{} - Page {}] {}",
                doc.name(),
                page_num,
                truncate_chars(text, QUERY_PAGE_CHARS)
            );
            let separator = if parts.is_empty() {
                0
            } else {
                EXCERPT_SEPARATOR.len()
            };
            let cost = separator + entry.chars().count();
            if used + cost >= budget {
                break;
            }
            used += cost;
            parts.push(entry);
            pages.push(page_num);
        }
    }

    ContextResult {
        text: parts.join(EXCERPT_SEPARATOR),
        pages,
    }
}

/// Plain-text sample of one document for summarisation.
///
/// Pages are stride-sampled with `k = max(1, pages / SUMMARY_SAMPLE_DIVISOR)`,
/// each contributing its first [`SUMMARY_PAGE_CHARS`] characters followed by
/// a newline. The concatenation is cut at [`SUMMARY_MAX_CHARS`] characters,
/// wherever that falls.
pub fn sample_for_summary(doc: &Document) -> String {
    let mut sampled = String::new();
    for page_num in stride_pages(doc, SUMMARY_SAMPLE_DIVISOR) {
        if let Some(text) = doc.page(page_num) {
            sampled.push_str(truncate_chars(text, SUMMARY_PAGE_CHARS));
            sampled.push('\n');
        }
    }
    truncate_chars(&sampled, SUMMARY_MAX_CHARS).to_string()
}

fn stride_pages(doc: &Document, divisor: usize) -> impl Iterator<Item = usize> {
    let stride = (doc.page_count() / divisor).max(1);
    (1..=doc.page_count()).step_by(stride)
}

/// Prefix of `s` holding at most `max` characters.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
