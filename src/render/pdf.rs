use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rgb,
};
use std::io::BufWriter;
use tracing::{info, warn};

use crate::fonts::{BASE_FONT_BOLD, FontMetrics, FontRegistry, measure_text_width};

use super::{DocumentPlan, LINE_SPACING, PARAGRAPH_SPACING, RenderError};

// A4 in points
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 72.0;

const TITLE_SIZE: f32 = 18.0;
const TITLE_LEADING: f32 = 21.6;
const TITLE_SPACE_AFTER: f32 = 24.0;
const TITLE_SPACER: f32 = 12.0;

const TITLE_COLOR: (u8, u8, u8) = (0x1f, 0x29, 0x37);
const BODY_COLOR: (u8, u8, u8) = (0x11, 0x18, 0x27);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Title,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    text: String,
    size: f32,
    role: Role,
    /// Baseline, in points from the bottom of the page.
    y: f32,
}

struct Layout {
    pages: Vec<Vec<PlacedLine>>,
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor: MARGIN,
        }
    }

    fn place(&mut self, text: String, size: f32, leading: f32, role: Role) {
        let page_has_lines = self.pages.last().map(|page| !page.is_empty()).unwrap_or(false);
        if page_has_lines && self.cursor + leading > PAGE_HEIGHT - MARGIN {
            self.pages.push(Vec::new());
            self.cursor = MARGIN;
        }
        let y = PAGE_HEIGHT - (self.cursor + size);
        if let Some(page) = self.pages.last_mut() {
            page.push(PlacedLine { text, size, role, y });
        }
        self.cursor += leading;
    }

    fn skip(&mut self, amount: f32) {
        self.cursor = (self.cursor + amount).min(PAGE_HEIGHT - MARGIN);
    }
}

struct Measure<'a> {
    title: Option<&'a FontMetrics>,
    body: Option<&'a FontMetrics>,
}

/// Printable rendering of `text`, using the registered font that covers its
/// script.
pub fn render_pdf(
    text: &str,
    title: &str,
    target_language: &str,
    fonts: &FontRegistry,
) -> Result<Vec<u8>, RenderError> {
    let plan = DocumentPlan::new(text, title, target_language);
    let body_font = fonts.font_for_text(text, target_language).font_id;
    let title_font = title_font_for(&plan, &body_font, fonts);
    let body_size = plan.body_size;

    let measure = Measure {
        title: fonts.get(&title_font),
        body: fonts.get(&body_font),
    };
    let pages = layout(&plan, body_size, &measure);

    let (doc, page, layer) = PdfDocument::new(
        plan.title.as_str(),
        Mm(pt_to_mm(PAGE_WIDTH)),
        Mm(pt_to_mm(PAGE_HEIGHT)),
        "Layer 1",
    );
    let title_ref = embed_font(&doc, fonts, &title_font)?;
    let body_ref = if body_font == title_font {
        title_ref.clone()
    } else {
        embed_font(&doc, fonts, &body_font)?
    };

    let mut layers = vec![doc.get_page(page).get_layer(layer)];
    for idx in 1..pages.len() {
        let (page, layer) = doc.add_page(
            Mm(pt_to_mm(PAGE_WIDTH)),
            Mm(pt_to_mm(PAGE_HEIGHT)),
            format!("Layer {}", idx + 1),
        );
        layers.push(doc.get_page(page).get_layer(layer));
    }
    for (lines, layer) in pages.iter().zip(layers.iter()) {
        draw_lines(layer, lines, &title_ref, &body_ref);
    }

    let page_count = pages.len();
    let mut buffer = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buffer);
        doc.save(&mut writer).map_err(RenderError::pdf)?;
    }
    info!(
        "generated PDF: {} paragraphs, {} pages, {} bytes, font {}",
        plan.paragraphs.len(),
        page_count,
        buffer.len(),
        body_font
    );
    Ok(buffer)
}

/// Indic documents title with the body face; everything else uses the
/// registry's bold heading face.
fn title_font_for(plan: &DocumentPlan, body_font: &str, fonts: &FontRegistry) -> String {
    if plan.enhanced() {
        body_font.to_string()
    } else {
        fonts.heading_font()
    }
}

fn layout(plan: &DocumentPlan, body_size: f32, measure: &Measure<'_>) -> Vec<Vec<PlacedLine>> {
    let width = PAGE_WIDTH - 2.0 * MARGIN;
    let body_leading = (body_size * LINE_SPACING).floor();
    let mut layout = Layout::new();

    for line in wrap_text(&plan.title, width, TITLE_SIZE, measure.title) {
        layout.place(line, TITLE_SIZE, TITLE_LEADING, Role::Title);
    }
    layout.skip(TITLE_SPACE_AFTER + TITLE_SPACER);

    for paragraph in &plan.paragraphs {
        let collapsed = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        for line in wrap_text(&collapsed, width, body_size, measure.body) {
            layout.place(line, body_size, body_leading, Role::Body);
        }
        layout.skip(PARAGRAPH_SPACING);
    }
    layout.pages
}

/// Greedy word wrap. Words wider than the line are broken by character.
fn wrap_text(text: &str, width: f32, size: f32, font: Option<&FontMetrics>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if measure_text_width(&candidate, size, font) <= width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure_text_width(word, size, font) <= width {
            current = word.to_string();
            continue;
        }
        for ch in word.chars() {
            let mut next = current.clone();
            next.push(ch);
            if !current.is_empty() && measure_text_width(&next, size, font) > width {
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            } else {
                current = next;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn embed_font(
    doc: &PdfDocumentReference,
    fonts: &FontRegistry,
    name: &str,
) -> Result<IndirectFontRef, RenderError> {
    if let Some(metrics) = fonts.get(name) {
        match doc.add_external_font(metrics.data()) {
            Ok(font) => return Ok(font),
            Err(err) => warn!("failed to embed font '{}', using builtin: {}", name, err),
        }
    }
    let builtin = if name == BASE_FONT_BOLD {
        BuiltinFont::HelveticaBold
    } else {
        BuiltinFont::Helvetica
    };
    doc.add_builtin_font(builtin).map_err(RenderError::pdf)
}

fn draw_lines(
    layer: &PdfLayerReference,
    lines: &[PlacedLine],
    title_font: &IndirectFontRef,
    body_font: &IndirectFontRef,
) {
    for line in lines {
        let (font, color) = match line.role {
            Role::Title => (title_font, TITLE_COLOR),
            Role::Body => (body_font, BODY_COLOR),
        };
        layer.set_fill_color(rgb(color));
        layer.use_text(
            line.text.as_str(),
            line.size,
            Mm(pt_to_mm(MARGIN)),
            Mm(pt_to_mm(line.y)),
            font,
        );
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn pt_to_mm(pt: f32) -> f32 {
    pt / 72.0 * 25.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DEFAULT_BODY_SIZE, ENHANCED_BODY_SIZE};
    use lopdf::content::Content;
    use lopdf::{Document, Object};

    /// `(font, size)` of every `Tf` operator on every page.
    fn font_selections(pdf: &[u8]) -> Vec<(String, f32)> {
        let doc = Document::load_mem(pdf).expect("parse pdf");
        let mut out = Vec::new();
        for page_id in doc.get_pages().into_values() {
            let raw = doc.get_page_content(page_id).expect("page content");
            let content = Content::decode(&raw).expect("decode content");
            for op in content.operations.iter().filter(|op| op.operator == "Tf") {
                let font = match op.operands.first() {
                    Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
                    other => panic!("unexpected font operand {:?}", other),
                };
                let size = match op.operands.get(1) {
                    Some(Object::Integer(value)) => *value as f32,
                    Some(Object::Real(value)) => *value as f32,
                    other => panic!("unexpected size operand {:?}", other),
                };
                out.push((font, size));
            }
        }
        out
    }

    fn sizes(pdf: &[u8]) -> Vec<f32> {
        font_selections(pdf).into_iter().map(|(_, size)| size).collect()
    }

    const NO_FONTS: Measure<'static> = Measure {
        title: None,
        body: None,
    };

    #[test]
    fn renders_pdf_with_builtin_fonts() {
        let registry = FontRegistry::new();
        let bytes = render_pdf("Hello world\n\nSecond paragraph", "", "english", &registry).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn indic_text_without_fonts_uses_enhanced_sizes() {
        let registry = FontRegistry::new();
        let bytes = render_pdf("తెలుగు వచనం", "", "telugu", &registry).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(sizes(&bytes), vec![TITLE_SIZE, ENHANCED_BODY_SIZE]);
        let selections = font_selections(&bytes);
        // title shares the body face
        assert_eq!(selections[0].0, selections[1].0);
    }

    #[test]
    fn latin_text_uses_default_sizes_and_heading_face() {
        let registry = FontRegistry::new();
        let bytes = render_pdf("Plain English body", "Notes", "", &registry).unwrap();
        assert_eq!(sizes(&bytes), vec![TITLE_SIZE, DEFAULT_BODY_SIZE]);
        let selections = font_selections(&bytes);
        assert_ne!(selections[0].0, selections[1].0);
    }

    #[test]
    fn title_font_follows_script_not_registry() {
        let registry = FontRegistry::new();
        let hindi = DocumentPlan::new("नमस्ते", "", "hindi");
        assert_eq!(title_font_for(&hindi, "Helvetica", &registry), "Helvetica");
        let english = DocumentPlan::new("hello", "", "english");
        assert_eq!(title_font_for(&english, "Helvetica", &registry), BASE_FONT_BOLD);
    }

    #[test]
    fn wrapped_lines_fit_the_text_width() {
        let width = PAGE_WIDTH - 2.0 * MARGIN;
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let lines = wrap_text(&text, width, 12.0, None);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(measure_text_width(line, 12.0, None) <= width);
            assert_eq!(line.trim(), line.as_str());
        }
        assert_eq!(
            lines.join(" "),
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        );
    }

    #[test]
    fn overlong_words_are_split() {
        let word = "x".repeat(500);
        let lines = wrap_text(&word, 100.0, 12.0, None);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn title_comes_first_and_long_text_paginates() {
        let text = "A paragraph of body text.\n".repeat(120);
        let plan = DocumentPlan::new(&text, "Notes", "");
        let pages = layout(&plan, DEFAULT_BODY_SIZE, &NO_FONTS);
        assert!(pages.len() > 1);
        assert_eq!(pages[0][0].role, Role::Title);
        assert_eq!(pages[0][0].text, "Notes");
        for page in &pages {
            for line in page {
                assert!(line.y >= MARGIN - 1.0);
                assert!(line.y <= PAGE_HEIGHT - MARGIN);
            }
        }
        let body_lines = pages.iter().flatten().filter(|l| l.role == Role::Body).count();
        assert_eq!(body_lines, 120);
    }

    #[test]
    fn blank_text_yields_title_only() {
        let plan = DocumentPlan::new("  \n ", "", "hindi");
        let pages = layout(&plan, ENHANCED_BODY_SIZE, &NO_FONTS);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 1);
        assert_eq!(pages[0][0].text, "Translated Text (Hindi)");
    }
}
