use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use ttf_parser::{Face, name_id};

/// Raw face bytes for embedding plus the horizontal advances of every mapped
/// character, read once when the font is loaded.
#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    family: Option<String>,
    units_per_em: f32,
    advances: Arc<HashMap<char, u16>>,
    /// Used for characters the face does not map.
    fallback_advance: u16,
}

impl FontMetrics {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let face = Face::parse(&data, 0).map_err(|err| anyhow!("invalid font data: {}", err))?;
        let units_per_em = face.units_per_em().max(1);
        let advances = advance_table(&face);
        let fallback_advance = advances.get(&' ').copied().unwrap_or(units_per_em / 2);
        let family = family_name(&face);
        Ok(Self {
            data: Arc::new(data),
            family,
            units_per_em: units_per_em as f32,
            advances: Arc::new(advances),
            fallback_advance,
        })
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Width of `text` set at `font_size`, in the same unit as the size.
    pub fn width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .filter(|&ch| ch != '\n')
            .map(|ch| {
                self.advances
                    .get(&ch)
                    .copied()
                    .unwrap_or(self.fallback_advance) as u32
            })
            .sum();
        units as f32 * font_size / self.units_per_em
    }

    #[cfg(test)]
    pub(crate) fn unparsed(family: &str) -> Self {
        Self {
            data: Arc::new(Vec::new()),
            family: Some(family.to_string()),
            units_per_em: 1000.0,
            advances: Arc::new(HashMap::new()),
            fallback_advance: 250,
        }
    }
}

impl std::fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMetrics")
            .field("family", &self.family)
            .field("bytes", &self.data.len())
            .field("mapped_chars", &self.advances.len())
            .finish()
    }
}

pub fn load_font_metrics(path: &Path) -> Result<FontMetrics> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read font: {}", path.display()))?;
    FontMetrics::from_bytes(data).with_context(|| format!("failed to parse font: {}", path.display()))
}

/// Width of `text` in points. Builtin PDF fonts have no metrics here, so
/// their width is estimated per character class.
pub fn measure_text_width(text: &str, font_size: f32, font: Option<&FontMetrics>) -> f32 {
    match font {
        Some(font) => font.width(text, font_size),
        None => text.chars().map(estimated_em_width).sum::<f32>() * font_size,
    }
}

fn estimated_em_width(ch: char) -> f32 {
    match ch {
        '\n' => 0.0,
        c if c.is_whitespace() => 0.28,
        c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.67,
        c if c.is_ascii_alphabetic() => 0.56,
        c if c.is_ascii() => 0.4,
        _ => 1.0,
    }
}

fn advance_table(face: &Face<'_>) -> HashMap<char, u16> {
    let mut advances = HashMap::new();
    let Some(cmap) = face.tables().cmap else {
        return advances;
    };
    for subtable in cmap.subtables {
        if !subtable.is_unicode() {
            continue;
        }
        subtable.codepoints(|code| {
            let Some(ch) = char::from_u32(code) else {
                return;
            };
            if advances.contains_key(&ch) {
                return;
            }
            if let Some(advance) = subtable
                .glyph_index(code)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
            {
                advances.insert(ch, advance);
            }
        });
    }
    advances
}

/// Typographic family when the face names one, plain family otherwise.
fn family_name(face: &Face<'_>) -> Option<String> {
    let lookup = |id: u16| {
        face.names()
            .into_iter()
            .filter(|name| name.name_id == id)
            .find_map(|name| name.to_string())
    };
    lookup(name_id::TYPOGRAPHIC_FAMILY).or_else(|| lookup(name_id::FAMILY))
}
