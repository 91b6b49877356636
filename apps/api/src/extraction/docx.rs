use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts the text of every body paragraph in document order, one line per paragraph.
///
/// Only top-level body paragraphs count: paragraphs inside tables or nested in a
/// text box are skipped.
pub(super) fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Docx(format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    body_paragraphs(&xml)
}

fn body_paragraphs(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut walker = BodyWalker::default();

    loop {
        match reader
            .read_event()
            .map_err(|e| ExtractionError::Docx(e.to_string()))?
        {
            Event::Start(e) => walker.open(e.name().as_ref()),
            Event::End(e) => walker.close(e.name().as_ref()),
            Event::Empty(e) => walker.empty(e.name().as_ref()),
            Event::Text(t) if walker.in_body_text() => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractionError::Docx(e.to_string()))?;
                walker.paragraph.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(walker.output)
}

/// Tracks where the reader is in the WordprocessingML tree.
#[derive(Default)]
struct BodyWalker {
    output: String,
    paragraph: String,
    paragraph_depth: usize,
    table_depth: usize,
    run_depth: usize,
    in_text: bool,
}

impl BodyWalker {
    fn at_body_paragraph(&self) -> bool {
        self.paragraph_depth == 1 && self.table_depth == 0
    }

    fn in_body_text(&self) -> bool {
        self.in_text && self.at_body_paragraph()
    }

    fn open(&mut self, name: &[u8]) {
        match name {
            b"w:tbl" => self.table_depth += 1,
            b"w:p" => {
                self.paragraph_depth += 1;
                if self.at_body_paragraph() {
                    self.paragraph.clear();
                }
            }
            b"w:r" => self.run_depth += 1,
            b"w:t" => self.in_text = true,
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            b"w:p" => {
                if self.at_body_paragraph() {
                    self.output.push_str(&self.paragraph);
                    self.output.push('\n');
                    self.paragraph.clear();
                }
                self.paragraph_depth = self.paragraph_depth.saturating_sub(1);
            }
            b"w:r" => self.run_depth = self.run_depth.saturating_sub(1),
            b"w:t" => self.in_text = false,
            _ => {}
        }
    }

    fn empty(&mut self, name: &[u8]) {
        match name {
            // <w:p/> is still a paragraph.
            b"w:p" if self.paragraph_depth == 0 && self.table_depth == 0 => {
                self.output.push('\n')
            }
            // <w:tab/> also appears in paragraph properties, so only runs count.
            b"w:tab" if self.run_depth > 0 && self.at_body_paragraph() => {
                self.paragraph.push('\t')
            }
            b"w:br" | b"w:cr" if self.run_depth > 0 && self.at_body_paragraph() => {
                self.paragraph.push('\n')
            }
            _ => {}
        }
    }
}
