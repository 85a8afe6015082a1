//! Flowing-text PDF writer on top of `lopdf`.
//!
//! Exports only need headings and wrapped paragraphs on US Letter pages, so
//! this lays text out line by line with the standard Helvetica faces (no font
//! embedding). Text is encoded as WinAnsi; characters outside that set are
//! written as `?`.

use crate::error::PdfChatError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Label,
    Body,
}

impl Style {
    fn font(self) -> &'static str {
        match self {
            Style::Body => "F1",
            Style::Title | Style::Heading | Style::Label => "F2",
        }
    }

    fn size(self) -> i64 {
        match self {
            Style::Title => 20,
            Style::Heading => 15,
            Style::Label => 13,
            Style::Body => 12,
        }
    }

    fn leading(self) -> i64 {
        match self {
            Style::Title => 28,
            Style::Heading => 22,
            Style::Label => 18,
            Style::Body => 16,
        }
    }

    /// Characters that fit on one line of the text column.
    fn line_capacity(self) -> usize {
        let width = (PAGE_WIDTH - 2 * MARGIN) as f32;
        (width / (self.size() as f32 * AVG_GLYPH_WIDTH)) as usize
    }
}

/// Accumulates lines into pages, then serialises them with [`PdfBuilder::finish`].
pub struct PdfBuilder {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// Baseline of the last line written on the current page.
    y: i64,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Centred document title.
    pub fn title(&mut self, text: &str) {
        for line in wrap_text(text, Style::Title.line_capacity()) {
            let width = line.chars().count() as f32 * Style::Title.size() as f32 * AVG_GLYPH_WIDTH;
            let x = ((PAGE_WIDTH as f32 - width) / 2.0).max(MARGIN as f32) as i64;
            self.line_at(Style::Title, x, &line);
        }
        self.spacer(8);
    }

    pub fn heading(&mut self, text: &str) {
        self.spacer(6);
        self.block(Style::Heading, text);
        self.spacer(4);
    }

    pub fn label(&mut self, text: &str) {
        self.block(Style::Label, text);
    }

    /// Body text; embedded newlines start new lines, long lines wrap.
    pub fn paragraph(&mut self, text: &str) {
        self.block(Style::Body, text);
        self.spacer(6);
    }

    /// Vertical gap of `points`; never carries over to a new page.
    pub fn spacer(&mut self, points: i64) {
        self.y = (self.y - points).max(MARGIN);
    }

    /// End the current page. A no-op on an empty page.
    pub fn page_break(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn block(&mut self, style: Style, text: &str) {
        for line in wrap_text(text, style.line_capacity()) {
            self.line_at(style, MARGIN, &line);
        }
    }

    fn line_at(&mut self, style: Style, x: i64, text: &str) {
        if self.y - style.leading() < MARGIN {
            self.page_break();
        }
        self.y -= style.leading();
        if text.is_empty() {
            return;
        }

        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![style.font().into(), Object::Integer(style.size())],
            ),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(self.y)]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Serialise every page into a PDF file image.
    pub fn finish(mut self) -> Result<Vec<u8>, PdfChatError> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let bytes = Content { operations }
                .encode()
                .map_err(|e| PdfChatError::ExportFailed(format!("content stream: {e}")))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(PAGE_WIDTH),
                    Object::Integer(PAGE_HEIGHT),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| PdfChatError::ExportFailed(format!("serialise PDF: {e}")))?;
        Ok(out)
    }
}

/// Greedy word wrap. Blank input lines are kept as empty lines; a word longer
/// than `width` is split across lines.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.lines() {
        let mut line = String::new();
        let mut len = 0usize;

        for word in raw.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if len > 0 {
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if len == 0 { word.len() } else { len + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.extend(word.iter());
            len += word.len();
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Encode `text` for a WinAnsiEncoding font.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(b' '),
            ' '..='~' => Some(c as u8),
            '\u{A0}'..='\u{FF}' => Some(c as u32 as u8),
            '\u{20AC}' => Some(0x80),
            '\u{2026}' => Some(0x85),
            '\u{2018}' => Some(0x91),
            '\u{2019}' => Some(0x92),
            '\u{201C}' => Some(0x93),
            '\u{201D}' => Some(0x94),
            '\u{2022}' => Some(0x95),
            '\u{2013}' => Some(0x96),
            '\u{2014}' => Some(0x97),
            c if c.is_control() => None,
            _ => Some(b'?'),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown_text(ops: &[Operation]) -> Vec<Vec<u8>> {
        ops.iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn wrap_respects_width_and_blank_lines() {
        let lines = wrap_text("the quick brown fox\n\njumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "", "jumps"]);
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let lines = wrap_text("abcdefghijkl xy", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl xy"]);
    }

    #[test]
    fn win_ansi_keeps_latin1_and_replaces_the_rest() {
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("a\u{2019}b"), vec![b'a', 0x92, b'b']);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn lines_are_emitted_as_text_operations() {
        let mut b = PdfBuilder::new();
        b.heading("Chat Transcript");
        b.paragraph("hello");
        let shown = shown_text(&b.current);
        assert_eq!(shown, vec![b"Chat Transcript".to_vec(), b"hello".to_vec()]);
    }

    #[test]
    fn long_text_flows_onto_new_pages() {
        let mut b = PdfBuilder::new();
        b.paragraph(&"line\n".repeat(200));
        let bytes = b.finish().unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 5);
    }

    #[test]
    fn page_break_starts_a_page_but_never_a_blank_one() {
        let mut b = PdfBuilder::new();
        b.paragraph("one");
        b.page_break();
        b.page_break();
        b.paragraph("two");
        b.page_break();
        let doc = lopdf::Document::load_mem(&b.finish().unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn empty_builder_still_produces_one_page() {
        let bytes = PdfBuilder::new().finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
