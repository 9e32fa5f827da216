//! PDF document generation.
//!
//! Generates valid PDF 1.4 files using raw PDF format construction, one page
//! object at a time. Uses the built-in Helvetica fonts with WinAnsi encoding,
//! so no external font files are required. Characters outside Latin-1 are
//! rendered as `?`.

use std::io::Write;

use tracing::debug;

use crate::error::{ExportError, Result};
use crate::model::{Document, Section, Table};

/// A4 in points.
const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 50.0;
const USABLE_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f64 = 20.0;
const HEADING_SIZE: f64 = 14.0;
const BODY_SIZE: f64 = 10.0;
const LEADING: f64 = 1.35;

const TITLE_SPACING: f64 = 18.0;
const SECTION_SPACING: f64 = 12.0;
const HEADING_GAP: f64 = 4.0;

/// Joins the cells of one table line.
pub const COLUMN_SEPARATOR: &str = " | ";

// Fixed object numbers. Page content and page objects are numbered from
// FIRST_PAGE_OBJ upwards as they are written.
const CATALOG_OBJ: usize = 1;
const PAGES_OBJ: usize = 2;
const BOLD_FONT_OBJ: usize = 3;
const REGULAR_FONT_OBJ: usize = 4;
const INFO_OBJ: usize = 5;
const FIRST_PAGE_OBJ: usize = 6;

/// Document rendering switches.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Written to the `/Producer` entry of the info dictionary.
    pub producer: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            producer: "Tally".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Bold,
    Regular,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Bold => "/F1",
            Font::Regular => "/F2",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
            Font::Regular => &HELVETICA_WIDTHS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

/// Render a document into `sink`.
///
/// Pages are written to the sink as they fill up. The returned stream must be
/// finished with [`DocumentStream::finish`] to obtain a complete file.
pub fn render_document<W: Write>(doc: &Document, sink: W) -> Result<DocumentStream<W>> {
    render_document_with(doc, sink, &PdfOptions::default())
}

pub fn render_document_with<W: Write>(
    doc: &Document,
    sink: W,
    options: &PdfOptions,
) -> Result<DocumentStream<W>> {
    let mut stream = DocumentStream::new(sink, &doc.title, &options.producer)?;

    stream.title_block(&doc.title)?;
    for (idx, section) in doc.sections.iter().enumerate() {
        stream
            .section(section)
            .map_err(|e| match e {
                ExportError::Io(io) => ExportError::render(format!("section {}", idx + 1), io),
                other => other,
            })?;
    }

    Ok(stream)
}

/// Render a document straight into a byte buffer.
pub fn render_document_bytes(doc: &Document) -> Result<Vec<u8>> {
    render_document_bytes_with(doc, &PdfOptions::default())
}

pub fn render_document_bytes_with(doc: &Document, options: &PdfOptions) -> Result<Vec<u8>> {
    let bytes = render_document_with(doc, Vec::new(), options)?.finish()?;
    debug!(
        sections = doc.sections.len(),
        bytes = bytes.len(),
        "rendered document"
    );
    Ok(bytes)
}

/// An in-progress PDF written to `W`.
///
/// [`finish`](Self::finish) consumes the stream, so nothing can be written
/// once the trailer is out.
pub struct DocumentStream<W: Write> {
    sink: W,
    written: usize,
    offsets: Vec<Option<usize>>,
    page_ids: Vec<usize>,
    next_obj: usize,
    title: String,
    producer: String,
    content: Vec<u8>,
    page_open: bool,
    cursor_y: f64,
}

impl<W: Write> DocumentStream<W> {
    fn new(sink: W, title: &str, producer: &str) -> Result<Self> {
        let mut stream = Self {
            sink,
            written: 0,
            offsets: vec![None; FIRST_PAGE_OBJ],
            page_ids: Vec::new(),
            next_obj: FIRST_PAGE_OBJ,
            title: title.to_string(),
            producer: producer.to_string(),
            content: Vec::new(),
            page_open: false,
            cursor_y: PAGE_HEIGHT - MARGIN,
        };

        // Binary comment marks the file as 8-bit for transfer tools.
        stream.write_raw(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n")?;
        stream.write_object(
            BOLD_FONT_OBJ,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        )?;
        stream.write_object(
            REGULAR_FONT_OBJ,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        )?;
        Ok(stream)
    }

    /// Number of pages written so far, including the one being filled.
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + usize::from(self.page_open)
    }

    /// Write the page tree, catalog, info dictionary, xref table and trailer,
    /// then flush and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        if !self.page_open && self.page_ids.is_empty() {
            self.open_page();
        }
        if self.page_open {
            self.close_page()?;
        }

        let kids: Vec<String> = self.page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        let pages = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            self.page_ids.len()
        );
        self.write_object(PAGES_OBJ, pages.as_bytes())?;
        self.write_object(
            CATALOG_OBJ,
            format!("<< /Type /Catalog /Pages {PAGES_OBJ} 0 R >>").as_bytes(),
        )?;

        let mut info = b"<< /Title ".to_vec();
        info.extend(pdf_string(&self.title));
        info.extend(b" /Producer ");
        info.extend(pdf_string(&self.producer));
        info.extend(b" >>");
        self.write_object(INFO_OBJ, &info)?;

        // Cross-reference table
        let xref_offset = self.written;
        let size = self.offsets.len();
        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for (id, offset) in self.offsets.iter().enumerate().skip(1) {
            let offset = offset.ok_or_else(|| {
                ExportError::render("cross-reference table", format!("object {id} was never written"))
            })?;
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {size} /Root {CATALOG_OBJ} 0 R /Info {INFO_OBJ} 0 R >>\n"
        ));
        xref.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));
        self.write_raw(xref.as_bytes())?;

        self.sink.flush()?;
        Ok(self.sink)
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    fn title_block(&mut self, title: &str) -> Result<()> {
        for line in wrap(title, Font::Bold, TITLE_SIZE, USABLE_WIDTH) {
            self.text_line(&line, Font::Bold, TITLE_SIZE, Align::Center, false)?;
        }
        self.space(TITLE_SPACING);
        Ok(())
    }

    fn section(&mut self, section: &Section) -> Result<()> {
        self.space(SECTION_SPACING);

        if let Some(heading) = &section.heading {
            let lines = wrap(heading, Font::Bold, HEADING_SIZE, USABLE_WIDTH);

            // Keep the heading on the same page as the first line of its table.
            let mut reserve = lines.len() as f64 * HEADING_SIZE * LEADING + HEADING_GAP;
            let has_lines = section
                .table
                .as_ref()
                .is_some_and(|t| !t.headers.is_empty() || !t.rows.is_empty());
            if has_lines {
                reserve += BODY_SIZE * LEADING;
            }
            self.ensure_space(reserve)?;

            for line in lines {
                self.text_line(&line, Font::Bold, HEADING_SIZE, Align::Left, true)?;
            }
            self.space(HEADING_GAP);
        }

        if let Some(table) = &section.table {
            self.table(table)?;
        }

        self.space(SECTION_SPACING);
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<()> {
        if !table.headers.is_empty() {
            let header_line = table.headers.join(COLUMN_SEPARATOR);
            for line in wrap(&header_line, Font::Bold, BODY_SIZE, USABLE_WIDTH) {
                self.text_line(&line, Font::Bold, BODY_SIZE, Align::Left, false)?;
            }
            self.rule()?;
        }

        for row in &table.rows {
            let cells: Vec<String> = row
                .cells(&table.headers)
                .into_iter()
                .map(|cell| cell.to_text())
                .collect();
            let row_line = cells.join(COLUMN_SEPARATOR);
            for line in wrap(&row_line, Font::Regular, BODY_SIZE, USABLE_WIDTH) {
                self.text_line(&line, Font::Regular, BODY_SIZE, Align::Left, false)?;
            }
        }
        Ok(())
    }

    fn space(&mut self, points: f64) {
        if self.page_open {
            self.cursor_y -= points;
        }
    }

    /// Start a new page when fewer than `height` points remain.
    fn ensure_space(&mut self, height: f64) -> Result<()> {
        if self.page_open && self.cursor_y - height >= MARGIN {
            return Ok(());
        }
        if self.page_open {
            self.close_page()?;
        }
        self.open_page();
        Ok(())
    }

    fn text_line(
        &mut self,
        text: &str,
        font: Font,
        size: f64,
        align: Align,
        underline: bool,
    ) -> Result<()> {
        let line_height = size * LEADING;
        self.ensure_space(line_height)?;

        let baseline = self.cursor_y - size;
        let width = text_width(text, font, size);
        let x = match align {
            Align::Left => MARGIN,
            Align::Center => (PAGE_WIDTH - width).max(2.0 * MARGIN) / 2.0,
        };

        self.content.extend(b"BT\n");
        self.content
            .extend(format!("{} {size:.0} Tf\n", font.resource()).as_bytes());
        self.content.extend(format!("{x:.2} {baseline:.2} Td\n").as_bytes());
        self.content.extend(pdf_string(text));
        self.content.extend(b" Tj\nET\n");

        if underline && width > 0.0 {
            let y = baseline - 2.0;
            self.content.extend(
                format!("0 G\n0.8 w\n{x:.2} {y:.2} m {:.2} {y:.2} l S\n", x + width).as_bytes(),
            );
        }

        self.cursor_y -= line_height;
        Ok(())
    }

    /// Thin horizontal rule across the usable width.
    fn rule(&mut self) -> Result<()> {
        self.ensure_space(6.0)?;
        let y = self.cursor_y - 2.0;
        self.content.extend(
            format!(
                "0.6 G\n0.5 w\n{MARGIN:.2} {y:.2} m {:.2} {y:.2} l S\n",
                MARGIN + USABLE_WIDTH
            )
            .as_bytes(),
        );
        self.cursor_y -= 6.0;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Object output
    // -----------------------------------------------------------------------

    fn open_page(&mut self) {
        self.content.clear();
        self.page_open = true;
        self.cursor_y = PAGE_HEIGHT - MARGIN;
    }

    fn close_page(&mut self) -> Result<()> {
        let content_id = self.allocate();
        let page_id = self.allocate();

        let mut stream = format!("<< /Length {} >>\nstream\n", self.content.len()).into_bytes();
        stream.extend(&self.content);
        stream.extend(b"\nendstream");
        self.write_object(content_id, &stream)?;

        let page = format!(
            "<< /Type /Page /Parent {PAGES_OBJ} 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Contents {content_id} 0 R /Resources << /Font << /F1 {BOLD_FONT_OBJ} 0 R /F2 {REGULAR_FONT_OBJ} 0 R >> >> >>"
        );
        self.write_object(page_id, page.as_bytes())?;

        self.page_ids.push(page_id);
        self.content.clear();
        self.page_open = false;
        Ok(())
    }

    fn allocate(&mut self) -> usize {
        let id = self.next_obj;
        self.next_obj += 1;
        self.offsets.push(None);
        id
    }

    fn write_object(&mut self, id: usize, body: &[u8]) -> Result<()> {
        self.offsets[id] = Some(self.written);
        self.write_raw(format!("{id} 0 obj\n").as_bytes())?;
        self.write_raw(body)?;
        self.write_raw(b"\nendobj\n")
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }
}

/// Encode text as a PDF string literal in WinAnsi (Latin-1 subset).
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\t' | '\n' | '\r' => out.push(b' '),
            ' '..='~' | '\u{A0}'..='\u{FF}' => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

fn char_width(c: char, font: Font) -> u16 {
    match c {
        ' '..='~' => font.widths()[c as usize - 32],
        '\t' | '\n' | '\r' => font.widths()[0],
        // `?` for everything WinAnsi cannot show.
        c if (c as u32) < 0xA0 || (c as u32) > 0xFF => font.widths()['?' as usize - 32],
        _ => 556,
    }
}

fn text_width(text: &str, font: Font, size: f64) -> f64 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, font))).sum();
    f64::from(units) * size / 1000.0
}

/// Greedy word wrap. Words wider than a full line are broken by character.
fn wrap(text: &str, font: Font, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split([' ', '\n', '\r', '\t']) {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        for c in word.chars() {
            current.push(c);
            if text_width(&current, font, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    lines.push(current);
    lines
}

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for ASCII 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Row};

    fn render(doc: &Document) -> Vec<u8> {
        render_document_bytes(doc).unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn sample_table() -> Table {
        Table::new(
            &["Item", "Qty", "Note"],
            vec![
                Row::new().with("Item", "Widget").with("Qty", 3),
                Row::new().with("Item", "Gadget").with("Qty", 1.5).with("Note", CellValue::Null),
            ],
        )
    }

    #[test]
    fn test_render_document_basic() {
        let doc = Document::new("Test Report")
            .with_section(Section::heading_with_table("Orders", sample_table()));
        let bytes = render(&doc);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&bytes, b"(Test Report) Tj"));
        assert!(contains(&bytes, b"(Orders) Tj"));
        assert!(contains(&bytes, b"(Item | Qty | Note) Tj"));
        assert!(contains(&bytes, b"(Widget | 3 | ) Tj"));
        assert!(contains(&bytes, b"(Gadget | 1.5 | ) Tj"));
        assert!(!contains(&bytes, b"null"));
    }

    #[test]
    fn test_render_document_empty_sections_contains_title() {
        let bytes = render(&Document::new("Empty Doc"));
        assert!(bytes.starts_with(b"%PDF"));
        assert!(contains(&bytes, b"(Empty Doc) Tj"));
        assert!(contains(&bytes, b"/Count 1"));
    }

    #[test]
    fn test_heading_only_section_has_no_table() {
        let doc = Document::new("Summary").with_section(Section::heading("Totals"));
        let bytes = render(&doc);
        assert!(contains(&bytes, b"(Totals) Tj"));
        // The heading underline is the only stroked line; no table rule.
        assert_eq!(count(&bytes, b" l S\n"), 1);
        assert!(!contains(&bytes, b"0.6 G"));
    }

    #[test]
    fn test_empty_section_is_tolerated() {
        let doc = Document::new("Spacing").with_section(Section::default());
        let bytes = render(&doc);
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(count(&bytes, b" Tj\n"), 1);
    }

    #[test]
    fn test_table_without_headers_renders_raw_values() {
        let table = Table {
            headers: Vec::new(),
            rows: vec![Row::new().with("a", "x").with("b", true)],
        };
        let bytes = render(&Document::new("Raw").with_section(Section::table(table)));
        assert!(contains(&bytes, b"(x | true) Tj"));
        assert!(!contains(&bytes, b"0.6 G"));
    }

    #[test]
    fn test_title_is_centered() {
        let bytes = render(&Document::new("T"));
        let width = text_width("T", Font::Bold, TITLE_SIZE);
        let expected = format!("{:.2} ", (PAGE_WIDTH - width) / 2.0);
        assert!(contains(&bytes, expected.as_bytes()));
    }

    #[test]
    fn test_long_table_spans_pages() {
        let rows = (0..200).map(|i| Row::new().with("n", i)).collect();
        let doc = Document::new("Long")
            .with_section(Section::table(Table::new(&["n"], rows)));
        let bytes = render(&doc);
        assert!(!contains(&bytes, b"/Count 1 "));
        assert!(contains(&bytes, b"(199) Tj"));

        let stream = render_document(&doc, Vec::new()).unwrap();
        assert!(stream.page_count() > 1);
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let doc = Document::new("Offsets")
            .with_section(Section::heading_with_table("Orders", sample_table()));
        let bytes = render(&doc);

        let marker = bytes
            .windows(10)
            .rposition(|w| w == b"startxref\n")
            .unwrap();
        let tail = std::str::from_utf8(&bytes[marker + 10..]).unwrap();
        let startxref: usize = tail.lines().next().unwrap().parse().unwrap();
        assert!(bytes[startxref..].starts_with(b"xref\n"));

        // Everything from the xref table on is plain ASCII.
        let xref = std::str::from_utf8(&bytes[startxref..]).unwrap();
        let entries: Vec<&str> = xref
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .collect();
        assert!(!entries.is_empty());
        for (idx, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let header = format!("{} 0 obj\n", idx + 1);
            assert!(bytes[offset..].starts_with(header.as_bytes()), "object {}", idx + 1);
        }
    }

    #[test]
    fn test_output_is_deterministic() {
        let doc = Document::new("Same").with_section(Section::table(sample_table()));
        assert_eq!(render(&doc), render(&doc));
    }

    #[test]
    fn test_producer_option() {
        let options = PdfOptions {
            producer: "Back Office".into(),
        };
        let bytes = render_document_bytes_with(&Document::new("P"), &options).unwrap();
        assert!(contains(&bytes, b"/Producer (Back Office)"));
    }

    #[test]
    fn test_special_characters_escaped() {
        let doc = Document::new("Price (sale)").with_section(Section::heading("a\\b"));
        let bytes = render(&doc);
        assert!(contains(&bytes, b"(Price \\(sale\\)) Tj"));
        assert!(contains(&bytes, b"(a\\\\b) Tj"));
    }

    #[test]
    fn test_pdf_string_encoding() {
        assert_eq!(pdf_string("hello"), b"(hello)".to_vec());
        assert_eq!(pdf_string("caf\u{e9}"), b"(caf\xE9)".to_vec());
        assert_eq!(pdf_string("\u{4e2d}"), b"(?)".to_vec());
        assert_eq!(pdf_string("a\nb"), b"(a b)".to_vec());
    }

    #[test]
    fn test_wrap_long_text() {
        let text = "word ".repeat(200);
        let lines = wrap(text.trim_end(), Font::Regular, BODY_SIZE, USABLE_WIDTH);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Font::Regular, BODY_SIZE) <= USABLE_WIDTH);
        }
    }

    #[test]
    fn test_wrap_breaks_unspaced_text() {
        let text = "x".repeat(500);
        let lines = wrap(&text, Font::Regular, BODY_SIZE, USABLE_WIDTH);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn test_wrap_short_and_empty() {
        assert_eq!(wrap("short", Font::Regular, BODY_SIZE, USABLE_WIDTH), vec!["short"]);
        assert_eq!(wrap("", Font::Regular, BODY_SIZE, USABLE_WIDTH), vec![""]);
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_is_reported() {
        let result = render_document(&Document::new("X"), FailingSink);
        assert!(matches!(result, Err(ExportError::Io(_))));
    }

    /// Accepts `limit` bytes, then fails every write.
    struct ShortSink {
        limit: usize,
        written: usize,
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(std::io::Error::other("disk full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_names_the_section() {
        let rows = (0..200).map(|i| Row::new().with("n", i)).collect();
        let doc = Document::new("Short")
            .with_section(Section::heading_with_table("Stock", Table::new(&["n"], rows)));
        let sink = ShortSink {
            limit: 512,
            written: 0,
        };

        let err = render_document(&doc, sink).err().unwrap();
        assert!(
            matches!(err, ExportError::RenderFailure { ref context, .. } if context == "section 1"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_heading_moves_with_first_table_line() {
        let mut stream = DocumentStream::new(Vec::new(), "Keep", "Tally").unwrap();
        stream.open_page();
        // Room for the heading alone, not for the heading plus a table line.
        stream.cursor_y = MARGIN + SECTION_SPACING + HEADING_SIZE * LEADING + 2.0;

        let section = Section::heading_with_table("Orders", sample_table());
        stream.section(&section).unwrap();

        assert_eq!(stream.page_count(), 2);
        assert!(!contains(&stream.sink, b"(Orders) Tj"));
        assert!(contains(&stream.content, b"(Orders) Tj"));
        assert!(contains(&stream.content, b"(Item | Qty | Note) Tj"));
    }

    #[test]
    fn test_heading_stays_when_it_fits_with_table() {
        let mut stream = DocumentStream::new(Vec::new(), "Keep", "Tally").unwrap();
        stream.open_page();

        stream
            .section(&Section::heading_with_table("Orders", sample_table()))
            .unwrap();

        assert_eq!(stream.page_count(), 1);
        assert!(contains(&stream.content, b"(Orders) Tj"));
    }
}
