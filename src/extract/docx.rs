use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::data::FileKind;
use crate::render::TITLE_PREFIX;

use super::ExtractError;

const MIN_DOCX_BYTES: usize = 100;
const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Default)]
struct Paragraph {
    text: String,
    style: Option<String>,
}

impl Paragraph {
    fn is_generated_title(&self) -> bool {
        let is_heading = self
            .style
            .as_deref()
            .map(|style| style.starts_with("Heading"))
            .unwrap_or(false);
        let text = self.text.trim();
        is_heading && text.starts_with(TITLE_PREFIX) && text.ends_with(')')
    }
}

#[derive(Debug, Default)]
struct DocumentBody {
    paragraphs: Vec<Paragraph>,
    table_rows: Vec<String>,
}

pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.len() < MIN_DOCX_BYTES {
        return Err(ExtractError::failed(
            FileKind::Docx,
            "DOCX file appears to be too small or corrupted",
        ));
    }
    let xml = read_document_part(bytes)?;
    let body = parse_document(&xml)?;

    let mut parts = Vec::new();
    for paragraph in &body.paragraphs {
        let text = paragraph.text.trim();
        if text.is_empty() || paragraph.is_generated_title() {
            continue;
        }
        parts.push(text.to_string());
    }
    parts.extend(body.table_rows.iter().cloned());

    let joined = parts.join("\n");
    if joined.trim().is_empty() {
        return Err(ExtractError::failed(
            FileKind::Docx,
            "No text content found in DOCX file. The file may contain only images or be empty.",
        ));
    }
    let cleaned = clean_lines(&joined);
    if cleaned.is_empty() {
        return Err(ExtractError::failed(
            FileKind::Docx,
            "No text content found in DOCX file after processing.",
        ));
    }
    Ok(cleaned)
}

fn read_document_part(bytes: &[u8]) -> Result<Vec<u8>, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| ExtractError::failed(FileKind::Docx, format!("invalid archive: {}", err)))?;
    let mut part = archive.by_name(DOCUMENT_PART).map_err(|err| {
        ExtractError::failed(FileKind::Docx, format!("{} not found: {}", DOCUMENT_PART, err))
    })?;
    let mut xml = Vec::new();
    part.read_to_end(&mut xml).map_err(|err| {
        ExtractError::failed(FileKind::Docx, format!("failed to read {}: {}", DOCUMENT_PART, err))
    })?;
    Ok(xml)
}

fn parse_document(xml: &[u8]) -> Result<DocumentBody, ExtractError> {
    let mut reader = Reader::from_reader(Cursor::new(xml));
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut body = DocumentBody::default();

    let mut paragraph = Paragraph::default();
    let mut in_run = false;
    let mut in_text = false;
    let mut table_depth = 0usize;
    let mut cell_paragraphs: Vec<String> = Vec::new();
    let mut row_cells: Vec<String> = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| ExtractError::failed(FileKind::Docx, format!("malformed xml: {}", err)))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => paragraph = Paragraph::default(),
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                b"w:tbl" => table_depth += 1,
                b"w:tr" if table_depth == 1 => row_cells.clear(),
                b"w:tc" if table_depth == 1 => cell_paragraphs.clear(),
                b"w:pStyle" => paragraph.style = style_value(&e)?,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:pStyle" => paragraph.style = style_value(&e)?,
                b"w:tab" if in_run => paragraph.text.push('\t'),
                b"w:br" | b"w:cr" if in_run => paragraph.text.push('\n'),
                _ => {}
            },
            Event::Text(e) => {
                if in_text {
                    let text = e.unescape().map_err(|err| {
                        ExtractError::failed(FileKind::Docx, format!("malformed text: {}", err))
                    })?;
                    paragraph.text.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => in_run = false,
                b"w:p" => {
                    let finished = std::mem::take(&mut paragraph);
                    if table_depth == 0 {
                        body.paragraphs.push(finished);
                    } else {
                        cell_paragraphs.push(finished.text);
                    }
                }
                b"w:tc" if table_depth == 1 => {
                    let cell = cell_paragraphs.join("\n");
                    let cell = cell.trim();
                    if !cell.is_empty() {
                        row_cells.push(cell.to_string());
                    }
                }
                b"w:tr" if table_depth == 1 => {
                    if !row_cells.is_empty() {
                        body.table_rows.push(row_cells.join(" | "));
                    }
                }
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(body)
}

fn style_value(element: &BytesStart<'_>) -> Result<Option<String>, ExtractError> {
    let attr = element
        .try_get_attribute("w:val")
        .map_err(|err| ExtractError::failed(FileKind::Docx, format!("malformed style: {}", err)))?;
    match attr {
        Some(attr) => {
            let value = attr.unescape_value().map_err(|err| {
                ExtractError::failed(FileKind::Docx, format!("malformed style: {}", err))
            })?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

/// Collapses space/tab runs, trims each line and drops the empty ones.
fn clean_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.split([' ', '\t'])
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
