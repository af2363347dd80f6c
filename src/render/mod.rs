//! DOCX and PDF generation for translated text.
//!
//! Both emitters share the same plan: pick the script, the sizes that go with
//! it, the title and the body paragraphs. They differ in how fonts are named
//! (family names for DOCX, registered faces for PDF).

use thiserror::Error;

use crate::script::{self, Script};

mod docx;
mod pdf;

pub use docx::render_docx;
pub use pdf::render_pdf;

pub const DEFAULT_TITLE: &str = "Translated Text";
/// Generated titles start with this; the DOCX extractor skips them.
pub const TITLE_PREFIX: &str = "Translated Text (";

pub const ENHANCED_BODY_SIZE: f32 = 15.0;
pub const DEFAULT_BODY_SIZE: f32 = 12.0;
pub const LINE_SPACING: f32 = 1.5;
pub const PARAGRAPH_SPACING: f32 = 12.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{format} generation failed: {message}")]
    Generation {
        format: &'static str,
        message: String,
    },
}

impl RenderError {
    pub(crate) fn docx(message: impl std::fmt::Display) -> Self {
        RenderError::Generation {
            format: "DOCX",
            message: message.to_string(),
        }
    }

    pub(crate) fn pdf(message: impl std::fmt::Display) -> Self {
        RenderError::Generation {
            format: "PDF",
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub script: Option<Script>,
    pub body_size: f32,
}

impl DocumentPlan {
    pub fn new(text: &str, title: &str, target_language: &str) -> Self {
        let script = script::resolve_script(text, target_language);
        let body_size = if script.is_some() {
            ENHANCED_BODY_SIZE
        } else {
            DEFAULT_BODY_SIZE
        };
        Self {
            title: document_title(title, target_language),
            paragraphs: split_paragraphs(text),
            script,
            body_size,
        }
    }

    /// One of the four Indic scripts: larger type and script fonts.
    pub fn enhanced(&self) -> bool {
        self.script.is_some()
    }
}

pub fn document_title(title: &str, target_language: &str) -> String {
    let language = target_language.trim();
    if !language.is_empty() {
        return format!("{}{})", TITLE_PREFIX, title_case(language));
    }
    let title = strip_controls(title);
    let title = title.trim();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Splits on line breaks (vertical tab and form feed included) and drops
/// blank lines. Other control characters are removed since XML cannot carry
/// them.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split(['\n', '\u{b}', '\u{c}'])
        .map(strip_controls)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn strip_controls(value: &str) -> String {
    value
        .chars()
        .filter(|&ch| !is_xml_forbidden(ch))
        .collect()
}

/// Characters outside the XML 1.0 `Char` production.
fn is_xml_forbidden(ch: char) -> bool {
    matches!(ch, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

/// Upper-cases the first letter of every word and lower-cases the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_uses_target_language_when_present() {
        assert_eq!(document_title("Ignored", "telugu"), "Translated Text (Telugu)");
        assert_eq!(document_title("", "old church-slavonic"), "Translated Text (Old Church-Slavonic)");
        assert_eq!(document_title("My Notes", ""), "My Notes");
        assert_eq!(document_title("  ", "  "), DEFAULT_TITLE);
    }

    #[test]
    fn blank_lines_are_dropped() {
        assert_eq!(
            split_paragraphs("  first \r\n\n\n second\n   \n"),
            vec!["first".to_string(), "second".to_string()]
        );
        assert!(split_paragraphs(" \n \n").is_empty());
    }

    #[test]
    fn control_characters_never_reach_the_plan() {
        assert_eq!(
            split_paragraphs("Line one\u{b}still one\u{1}\x0cpage\u{0} two\ttab"),
            vec![
                "Line one".to_string(),
                "still one".to_string(),
                "page two\ttab".to_string()
            ]
        );
        assert_eq!(document_title("Re\u{7}port\u{1b}", ""), "Report");
        assert_eq!(document_title("\u{2}\u{3}", ""), DEFAULT_TITLE);
    }

    #[test]
    fn indic_plan_is_enhanced() {
        let plan = DocumentPlan::new("hello", "", "hindi");
        assert_eq!(plan.script, Some(Script::Devanagari));
        assert!(plan.enhanced());
        assert_eq!(plan.body_size, ENHANCED_BODY_SIZE);

        let plan = DocumentPlan::new("hello\nworld", "Doc", "english");
        assert!(!plan.enhanced());
        assert_eq!(plan.body_size, DEFAULT_BODY_SIZE);
        assert_eq!(plan.paragraphs.len(), 2);
        assert_eq!(plan.title, "Translated Text (English)");
    }
}
