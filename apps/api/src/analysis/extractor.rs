//! Text Extractor: turns an uploaded PDF or DOCX into ordered lines plus layout hints.
//!
//! Extraction drops visual layout (fonts, colours, positions) and keeps word order,
//! line breaks, page breaks and heading hints. Downstream stages only see
//! `ExtractedText`.
//!
//! - PDF: `pdf-extract` over the in-memory bytes; pages are split on form feeds.
//! - DOCX: `word/document.xml` is streamed with `quick-xml`; paragraphs and tables
//!   are walked in document order and heading styles become heading candidates.

use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::bytes::Regex as BytesRegex;
use tracing::debug;

use crate::analysis::models::{
    ContentType, ExtractedLine, ExtractedText, LayoutHints, LineRole, RawDocument,
};
use crate::analysis::sections::canonical_section;
use crate::errors::AnalysisError;

const BULLET_GLYPHS: &[char] = &['•', '-', '*', '▪', '◦', '●', '➢', '–', '·', '○', '■', '►'];
const MAX_HEADING_WORDS: usize = 5;
const MAX_HEADING_CHARS: usize = 40;
/// Upper bound on the decompressed size of `word/document.xml`.
const MAX_DOCX_XML_BYTES: u64 = 20 * 1024 * 1024;

static PDF_PAGE_OBJECT: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"/Type\s*/Page\b").unwrap());

/// Extracts text from a raw document according to its declared content type.
pub fn extract(document: &RawDocument) -> Result<ExtractedText, AnalysisError> {
    let content_type = document.content_type();
    if document.is_empty() {
        return Err(AnalysisError::unreadable(content_type, "document is empty"));
    }

    let text = match content_type {
        ContentType::Pdf => extract_pdf(document.bytes())?,
        ContentType::Docx => extract_docx(document.bytes())?,
    };

    debug!(
        "Extracted {} lines over {} page(s) from {} ({} bytes)",
        text.lines.len(),
        text.layout.page_count,
        content_type,
        document.len()
    );
    Ok(text)
}

// ────────────────────────────────────────────────────────────────────────────
// PDF
// ────────────────────────────────────────────────────────────────────────────

fn extract_pdf(bytes: &[u8]) -> Result<ExtractedText, AnalysisError> {
    if !bytes.starts_with(b"%PDF-") {
        return Err(AnalysisError::unreadable(
            ContentType::Pdf,
            "missing %PDF- header",
        ));
    }
    if contains_bytes(bytes, b"/Encrypt") {
        return Err(AnalysisError::unreadable(
            ContentType::Pdf,
            "document is encrypted",
        ));
    }

    // pdf-extract panics on some malformed content streams (e.g. a missing font resource).
    let raw = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| AnalysisError::unreadable(ContentType::Pdf, "failed to parse"))?
        .map_err(|e| AnalysisError::unreadable(ContentType::Pdf, format!("failed to parse: {e}")))?;

    let page_objects = PDF_PAGE_OBJECT.find_iter(bytes).count() as u32;
    let mut text = text_from_plain(&raw, ContentType::Pdf);
    // pdf-extract does not always emit form feeds, so trust the page tree when larger.
    text.layout.page_count = text.layout.page_count.max(page_objects).max(1);
    Ok(text)
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Builds `ExtractedText` from plain text where form feeds (`\x0C`) separate pages.
pub fn text_from_plain(raw: &str, content_type: ContentType) -> ExtractedText {
    let mut builder = TextBuilder::default();
    let pages: Vec<&str> = raw.trim_end_matches(['\x0C', '\n', '\r', ' ']).split('\x0C').collect();

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            builder.page_break();
        }
        for line in page.lines() {
            builder.push_plain(line);
        }
    }
    builder.finish(content_type)
}

// ────────────────────────────────────────────────────────────────────────────
// Line assembly
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct TextBuilder {
    lines: Vec<ExtractedLine>,
    layout: LayoutHints,
    page: u32,
}

impl TextBuilder {
    fn current_page(&self) -> u32 {
        self.page + 1
    }

    fn page_break(&mut self) {
        self.page += 1;
        self.layout.page_breaks.push(self.lines.len());
    }

    /// Pushes a line whose role must be inferred from its text alone.
    fn push_plain(&mut self, line: &str) {
        let (role, text) = classify_line(line);
        self.push(text, role);
    }

    fn push(&mut self, text: &str, role: LineRole) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.lines.push(ExtractedLine {
            text: text.to_string(),
            role,
            page: self.current_page(),
        });
    }

    fn finish(mut self, content_type: ContentType) -> ExtractedText {
        self.layout.page_count = self.current_page();
        ExtractedText {
            content_type,
            lines: self.lines,
            layout: self.layout,
        }
    }
}

/// Infers the structural role of a plain-text line and strips any bullet glyph.
pub fn classify_line(line: &str) -> (LineRole, &str) {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix(BULLET_GLYPHS) {
        let rest = rest.trim_start();
        if !rest.is_empty() {
            return (LineRole::Bullet, rest);
        }
    }
    if looks_like_heading(trimmed) {
        return (LineRole::Heading, trimmed);
    }
    (LineRole::Body, trimmed)
}

fn looks_like_heading(text: &str) -> bool {
    if text.is_empty()
        || text.chars().count() > MAX_HEADING_CHARS
        || text.split_whitespace().count() > MAX_HEADING_WORDS
    {
        return false;
    }
    if text.ends_with(['.', ',', ';']) {
        return false;
    }
    let has_letters = text.chars().any(|c| c.is_alphabetic());
    let all_caps = has_letters && !text.chars().any(|c| c.is_lowercase());
    all_caps || text.ends_with(':') || canonical_section(text).is_some()
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

fn extract_docx(bytes: &[u8]) -> Result<ExtractedText, AnalysisError> {
    let unreadable = |reason: String| AnalysisError::unreadable(ContentType::Docx, reason);

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| unreadable(format!("not a valid DOCX archive: {e}")))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| unreadable("archive has no word/document.xml".to_string()))?;
    if entry.size() > MAX_DOCX_XML_BYTES {
        return Err(unreadable("word/document.xml is too large".to_string()));
    }

    let xml = read_capped(entry, MAX_DOCX_XML_BYTES).map_err(unreadable)?;
    parse_document_xml(&xml).map_err(unreadable)
}

/// Reads at most `limit` bytes of UTF-8. The declared size in the archive is not trusted.
fn read_capped(reader: impl Read, limit: u64) -> Result<String, String> {
    let mut buf = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut buf)
        .map_err(|e| format!("failed to read word/document.xml: {e}"))?;
    if buf.len() as u64 > limit {
        return Err("word/document.xml is too large".to_string());
    }
    String::from_utf8(buf).map_err(|e| format!("word/document.xml is not UTF-8: {e}"))
}

/// Per-table statistics used to tell data tables from page-layout tables.
#[derive(Default)]
struct TableState {
    rows: usize,
    prose_rows: usize,
    cells_in_row: usize,
    prose_cells_in_row: usize,
    cell_chars: usize,
    cell_paragraphs: usize,
}

#[derive(Default)]
struct ParagraphState {
    text: String,
    style: Option<String>,
    numbered: bool,
}

#[derive(Default)]
struct DocxWalker {
    builder: TextBuilder,
    paragraph: Option<ParagraphState>,
    tables: Vec<TableState>,
    in_text: bool,
}

impl DocxWalker {
    fn start(&mut self, e: &BytesStart<'_>) -> Result<(), String> {
        match e.local_name().as_ref() {
            b"p" => self.paragraph = Some(ParagraphState::default()),
            b"t" => self.in_text = true,
            b"tbl" => self.tables.push(TableState::default()),
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    table.cells_in_row = 0;
                    table.prose_cells_in_row = 0;
                }
            }
            b"tc" => {
                if let Some(table) = self.tables.last_mut() {
                    table.cell_chars = 0;
                    table.cell_paragraphs = 0;
                }
            }
            _ => self.property(e)?,
        }
        Ok(())
    }

    /// Handles elements that usually appear self-closing.
    fn property(&mut self, e: &BytesStart<'_>) -> Result<(), String> {
        let Some(paragraph) = self.paragraph.as_mut() else {
            return Ok(());
        };
        match e.local_name().as_ref() {
            b"pStyle" => paragraph.style = attribute(e, b"val")?,
            b"numPr" => paragraph.numbered = true,
            b"tab" => paragraph.text.push(' '),
            b"br" | b"cr" => {
                if attribute(e, b"type")?.as_deref() == Some("page") {
                    // Flush what precedes the break so it stays on the earlier page.
                    let pending = std::mem::take(&mut paragraph.text);
                    let style = paragraph.style.clone();
                    let numbered = paragraph.numbered;
                    self.emit_paragraph(&pending, style.as_deref(), numbered);
                    self.builder.page_break();
                } else {
                    paragraph.text.push('\n');
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, local_name: &[u8]) {
        match local_name {
            b"t" => self.in_text = false,
            b"p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.emit_paragraph(
                        &paragraph.text,
                        paragraph.style.as_deref(),
                        paragraph.numbered,
                    );
                }
            }
            b"tc" => {
                if let Some(table) = self.tables.last_mut() {
                    table.cells_in_row += 1;
                    if table.cell_chars >= 80 || table.cell_paragraphs >= 3 {
                        table.prose_cells_in_row += 1;
                    }
                }
            }
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    table.rows += 1;
                    if table.cells_in_row >= 2 && table.prose_cells_in_row >= 2 {
                        table.prose_rows += 1;
                    }
                }
            }
            b"tbl" => {
                if let Some(table) = self.tables.pop() {
                    self.builder.layout.table_count += 1;
                    if table.prose_rows > 0 && table.prose_rows * 2 >= table.rows {
                        self.builder.layout.layout_tables += 1;
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_text {
            return;
        }
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.text.push_str(text);
        }
    }

    fn emit_paragraph(&mut self, text: &str, style: Option<&str>, numbered: bool) {
        if text.trim().is_empty() {
            return;
        }
        if let Some(table) = self.tables.last_mut() {
            table.cell_chars += text.trim().chars().count();
            table.cell_paragraphs += 1;
        }

        let styled_role = style.and_then(style_role);
        if styled_role == Some(LineRole::Heading) {
            self.builder.layout.heading_styles_used = true;
        }

        for line in text.split('\n') {
            match styled_role {
                Some(role) => self.builder.push(line, role),
                None if numbered => {
                    let (_, stripped) = classify_line(line);
                    self.builder.push(stripped, LineRole::Bullet);
                }
                None => self.builder.push_plain(line),
            }
        }
    }
}

fn style_role(style: &str) -> Option<LineRole> {
    let style = style.to_ascii_lowercase();
    if style == "title" || style.starts_with("heading") {
        Some(LineRole::Heading)
    } else if style.contains("list") || style.contains("bullet") {
        Some(LineRole::Bullet)
    } else {
        None
    }
}

fn attribute(e: &BytesStart<'_>, local_name: &[u8]) -> Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| format!("malformed attribute: {err}"))?;
        if attr.key.local_name().as_ref() == local_name {
            let value = attr
                .unescape_value()
                .map_err(|err| format!("malformed attribute value: {err}"))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Walks a WordprocessingML body in document order.
pub fn parse_document_xml(xml: &str) -> Result<ExtractedText, String> {
    let mut reader = Reader::from_str(xml);
    let mut walker = DocxWalker::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => walker.start(&e)?,
            Ok(Event::Empty(e)) => walker.property(&e)?,
            Ok(Event::End(e)) => walker.end(e.local_name().as_ref()),
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| format!("malformed text at {}: {e}", reader.buffer_position()))?;
                walker.text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed XML at {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }

    if !walker.tables.is_empty() {
        return Err("unterminated table in document body".to_string());
    }
    Ok(walker.builder.finish(ContentType::Docx))
}
