// Pulls paragraph text out of a .docx file so the parser can work on plain
// lines. A .docx is a zip archive; the body lives in `word/document.xml` as a
// sequence of `<w:p>` paragraphs made of `<w:t>` text runs.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Not a valid .docx archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to read word/document.xml: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document XML: {0}")]
    Xml(String),
}

impl From<quick_xml::Error> for DocumentError {
    fn from(e: quick_xml::Error) -> Self {
        DocumentError::Xml(e.to_string())
    }
}

/// Returns the trimmed, non-empty body paragraphs of a .docx file in reading order.
///
/// Only paragraphs sitting directly in `<w:body>` count; tables and text boxes
/// are skipped, as are blank paragraphs.
pub fn extract_paragraphs(docx: &[u8]) -> Result<Vec<String>, DocumentError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;

    paragraphs_from_xml(&xml)
}

/// True when the open elements below the paragraph are a run, optionally
/// wrapped in a hyperlink: the only places paragraph text lives.
fn inside_run(below_paragraph: &[Vec<u8>]) -> bool {
    match below_paragraph {
        [run] => run.as_slice() == b"r",
        [link, run] => link.as_slice() == b"hyperlink" && run.as_slice() == b"r",
        _ => false,
    }
}

/// Walks `document.xml` and collects the text of every body-level `w:p`.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();

    // Local names of the currently open elements.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    // Open body paragraph: its text so far and the stack depth just below it.
    let mut current: Option<(String, usize)> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                let parent_is_body = stack.last().is_some_and(|n| n.as_slice() == b"body");

                if current.is_none() && parent_is_body && name.as_slice() == b"p" {
                    current = Some((String::new(), stack.len() + 1));
                } else if let Some((_, depth)) = &current {
                    if name.as_slice() == b"t" {
                        in_text = inside_run(&stack[*depth..]);
                    }
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                if let Some((text, depth)) = current.as_mut() {
                    if inside_run(&stack[*depth..]) {
                        match e.local_name().as_ref() {
                            b"tab" | b"ptab" => text.push('\t'),
                            b"br" | b"cr" => text.push('\n'),
                            b"noBreakHyphen" => text.push('-'),
                            _ => {}
                        }
                    }
                }
            }
            Event::Text(e) if in_text => {
                if let Some((text, _)) = current.as_mut() {
                    let unescaped = e.unescape().map_err(|e| DocumentError::Xml(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(e) if in_text => {
                if let Some((text, _)) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                stack.pop();
                in_text = false;

                let closes_paragraph = matches!(&current, Some((_, depth)) if stack.len() < *depth);
                if closes_paragraph {
                    if let Some((text, _)) = current.take() {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            paragraphs.push(trimmed.to_string());
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Wraps body XML in a minimal .docx archive.
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::FileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            writer.start_file(DOCUMENT_PART, options).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    /// Builds a .docx where each line is its own paragraph.
    pub(crate) fn docx_with_lines(lines: &[&str]) -> Vec<u8> {
        let body: String = lines
            .iter()
            .map(|l| format!("<w:p><w:r><w:t xml:space=\"preserve\">{l}</w:t></w:r></w:p>"))
            .collect();
        docx_with_body(&body)
    }

    #[test]
    fn extracts_paragraphs_in_order() {
        let docx = docx_with_lines(&["SiteAlpha", "Main Task One", "Check valves"]);
        let paragraphs = extract_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["SiteAlpha", "Main Task One", "Check valves"]);
    }

    #[test]
    fn trims_and_drops_blank_paragraphs() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t xml:space=\"preserve\">   padded  </w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t xml:space=\"preserve\">    </w:t></w:r></w:p>\
             <w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr></w:p>\
             <w:p><w:r><w:t>next</w:t></w:r></w:p>",
        );
        let paragraphs = extract_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["padded", "next"]);
    }

    #[test]
    fn joins_runs_and_unescapes_entities() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>Main </w:t></w:r><w:r><w:t>pump &amp; valves</w:t></w:r></w:p>\
             <w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p>",
        );
        let paragraphs = extract_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["Main pump & valves", "a\tb"]);
    }

    #[test]
    fn skips_table_cell_paragraphs() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>Depot</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell one</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>cell two</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>Main after table</w:t></w:r></w:p>",
        );
        let paragraphs = extract_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["Depot", "Main after table"]);
    }

    #[test]
    fn reads_hyperlink_runs_but_not_text_boxes() {
        let docx = docx_with_body(
            "<w:p><w:hyperlink><w:r><w:t>linked</w:t></w:r></w:hyperlink>\
             <w:r><w:t xml:space=\"preserve\"> text</w:t></w:r>\
             <w:r><w:pict><w:txbxContent><w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></w:pict></w:r></w:p>",
        );
        let paragraphs = extract_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["linked text"]);
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = extract_paragraphs(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, DocumentError::Archive(_)));
    }

    #[test]
    fn rejects_archive_without_document_part() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("other.txt", zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(b"hello").unwrap();
            writer.finish().unwrap();
        }

        let err = extract_paragraphs(&buf.into_inner()).unwrap_err();
        assert!(matches!(err, DocumentError::Archive(_)));
    }
}
