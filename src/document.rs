//! The in-memory document store.
//!
//! A [`Document`] is the page-indexed text of one uploaded PDF: page numbers
//! are 1-based and contiguous, each mapping to the (possibly empty) text
//! pdfium extracted for that page. Documents are immutable once built.
//!
//! [`DocumentStore`] keeps documents in upload order, keyed by file name.
//! Insertion order matters: a targeted page query answers from the *first*
//! document that has the page.

use indexmap::IndexMap;
use serde::Serialize;

/// Page-indexed text of one PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    name: String,
    pages: Vec<String>,
}

impl Document {
    /// Build a document from page texts in page order (page 1 first).
    pub fn new(name: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    /// File name the document was uploaded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of a 1-based page, or `None` when the page does not exist.
    pub fn page(&self, page_num: usize) -> Option<&str> {
        page_num
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx))
            .map(String::as_str)
    }

    /// Iterate `(page_num, text)` in page order.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pages
            .iter()
            .enumerate()
            .map(|(idx, text)| (idx + 1, text.as_str()))
    }
}

/// Documents loaded in the current session, in upload order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentStore {
    docs: IndexMap<String, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Returns `false` (and leaves the store untouched) when a
    /// document with the same name is already loaded.
    pub fn insert(&mut self, doc: Document) -> bool {
        if self.docs.contains_key(doc.name()) {
            return false;
        }
        self.docs.insert(doc.name().to_string(), doc);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.docs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Document> {
        self.docs.get(name)
    }

    /// Documents in upload order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Sum of page counts across all documents.
    pub fn total_pages(&self) -> usize {
        self.docs.values().map(Document::page_count).sum()
    }

    pub fn clear(&mut self) {
        self.docs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, n: usize) -> Document {
        Document::new(name, (1..=n).map(|i| format!("text {i}")).collect())
    }

    #[test]
    fn pages_are_one_based() {
        let d = doc("a.pdf", 3);
        assert_eq!(d.page(1), Some("text 1"));
        assert_eq!(d.page(3), Some("text 3"));
        assert_eq!(d.page(0), None);
        assert_eq!(d.page(4), None);
        let nums: Vec<usize> = d.pages().map(|(n, _)| n).collect();
        assert_eq!(nums, vec![1, 2, 3]);
    }

    #[test]
    fn store_keeps_insertion_order() {
        let mut store = DocumentStore::new();
        store.insert(doc("z.pdf", 1));
        store.insert(doc("a.pdf", 2));
        let names: Vec<&str> = store.iter().map(Document::name).collect();
        assert_eq!(names, vec!["z.pdf", "a.pdf"]);
        assert_eq!(store.total_pages(), 3);
    }

    #[test]
    fn duplicate_name_is_not_replaced() {
        let mut store = DocumentStore::new();
        assert!(store.insert(doc("a.pdf", 2)));
        assert!(!store.insert(doc("a.pdf", 5)));
        assert_eq!(store.get("a.pdf").map(Document::page_count), Some(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = DocumentStore::new();
        store.insert(doc("a.pdf", 2));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.total_pages(), 0);
    }
}
