//! Font registry and per-script font resolution.
//!
//! The registry is filled once at startup (script fonts from the local cache
//! or a remote mirror, plus one system font as a universal fallback) and is
//! read-only afterwards. Resolution walks an ordered candidate list and always
//! ends at the builtin base font, so it cannot fail.

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::script::{self, Script};

mod download;
mod metrics;
mod system;

pub use download::{FontSetup, MIN_FONT_BYTES, download_script_fonts, font_urls};
pub use metrics::{FontMetrics, load_font_metrics, measure_text_width};
pub use system::{SYSTEM_FONT_CANDIDATES, register_system_font};

/// Builtin PDF base font. Always available, no Indic glyph coverage.
pub const BASE_FONT: &str = "Helvetica";
pub const BASE_FONT_BOLD: &str = "Helvetica-Bold";
/// Wide-coverage system font name tried before the generic fallback.
pub const WIDE_UNICODE_FONT: &str = "ArialUnicode";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontChoice {
    pub font_id: String,
    /// A script or wide-coverage face was found rather than the base font.
    pub enhanced: bool,
}

/// Registered name of the regular face for `script` (`NotoSansTelugu`).
pub fn script_font_name(script: Script) -> &'static str {
    match script {
        Script::Telugu => "NotoSansTelugu",
        Script::Malayalam => "NotoSansMalayalam",
        Script::Tamil => "NotoSansTamil",
        Script::Devanagari => "NotoSansDevanagari",
    }
}

pub fn script_bold_font_name(script: Script) -> String {
    format!("{}-Bold", script_font_name(script))
}

/// Family name that word processors resolve for `script`.
pub fn script_font_family(script: Script) -> &'static str {
    match script {
        Script::Telugu => "Noto Sans Telugu",
        Script::Malayalam => "Noto Sans Malayalam",
        Script::Tamil => "Noto Sans Tamil",
        Script::Devanagari => "Noto Sans Devanagari",
    }
}

#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: HashMap<String, FontMetrics>,
    unicode_fallback: Option<String>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downloads missing script fonts (when allowed), registers every font
    /// that could be obtained and then picks a system fallback font.
    pub async fn bootstrap(setup: &FontSetup) -> Self {
        let mut registry = FontRegistry::new();
        for script in script::SCRIPTS {
            let (regular, bold) = download_script_fonts(setup, script).await;
            if let Some(path) = regular {
                registry.register_file(script_font_name(script), &path);
            }
            if let Some(path) = bold {
                registry.register_file(&script_bold_font_name(script), &path);
            }
        }
        match register_system_font(&mut registry, SYSTEM_FONT_CANDIDATES) {
            Some(name) => info!("registered system unicode font as '{}'", name),
            None => warn!(
                "no system unicode font found; documents fall back to {} for unsupported scripts",
                BASE_FONT
            ),
        }
        info!("font registry ready: {:?}", registry.names());
        registry
    }

    /// First registration of a name wins. Returns whether the font was added.
    pub fn register(&mut self, name: &str, font: FontMetrics) -> bool {
        if self.fonts.contains_key(name) {
            debug!("font '{}' already registered", name);
            return false;
        }
        self.fonts.insert(name.to_string(), font);
        true
    }

    /// Loads and registers a font file, logging instead of failing.
    pub fn register_file(&mut self, name: &str, path: &Path) -> bool {
        match self.try_register_file(name, path) {
            Ok(added) => {
                if added {
                    info!("registered font '{}' from {}", name, path.display());
                }
                added
            }
            Err(err) => {
                warn!("failed to register font '{}': {:#}", name, err);
                false
            }
        }
    }

    fn try_register_file(&mut self, name: &str, path: &Path) -> Result<bool> {
        let font = load_font_metrics(path)?;
        Ok(self.register(name, font))
    }

    pub fn get(&self, name: &str) -> Option<&FontMetrics> {
        self.fonts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fonts.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.fonts.keys().map(|name| name.as_str()).collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn set_unicode_fallback(&mut self, name: &str) {
        if self.unicode_fallback.is_none() && self.contains(name) {
            self.unicode_fallback = Some(name.to_string());
        }
    }

    /// Registered system font used when no script font applies.
    pub fn unicode_fallback(&self) -> Option<&str> {
        self.unicode_fallback.as_deref()
    }

    fn is_available(&self, name: &str) -> bool {
        name == BASE_FONT || name == BASE_FONT_BOLD || self.contains(name)
    }

    /// Font for body text: target language first, then the script the text
    /// is written in, then the generic fallbacks.
    pub fn font_for_text(&self, text: &str, target_language: &str) -> FontChoice {
        let script = script::resolve_script(text, target_language);
        let choice = self
            .candidates(script)
            .into_iter()
            .find(|candidate| self.is_available(&candidate.font_id))
            .unwrap_or_else(|| FontChoice {
                font_id: BASE_FONT.to_string(),
                enhanced: false,
            });
        match script {
            Some(script) => info!("using {} for {} text", choice.font_id, script),
            None => debug!("using {} for text without indic script", choice.font_id),
        }
        choice
    }

    /// Bold counterpart for headings in documents without an Indic script.
    pub fn heading_font(&self) -> String {
        match self.unicode_fallback() {
            Some(name) => {
                let bold = format!("{}-Bold", name);
                if self.contains(&bold) {
                    bold
                } else {
                    name.to_string()
                }
            }
            None => BASE_FONT_BOLD.to_string(),
        }
    }

    fn candidates(&self, script: Option<Script>) -> Vec<FontChoice> {
        let mut candidates = Vec::new();
        if let Some(script) = script {
            for name in [
                script_bold_font_name(script),
                script_font_name(script).to_string(),
                WIDE_UNICODE_FONT.to_string(),
            ] {
                candidates.push(FontChoice {
                    font_id: name,
                    enhanced: true,
                });
            }
        }
        if let Some(fallback) = self.unicode_fallback() {
            candidates.push(FontChoice {
                font_id: fallback.to_string(),
                enhanced: false,
            });
        }
        candidates.push(FontChoice {
            font_id: BASE_FONT.to_string(),
            enhanced: false,
        });
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[&str]) -> FontRegistry {
        let mut registry = FontRegistry::new();
        for name in names {
            registry.register(name, FontMetrics::unparsed(name));
        }
        registry
    }

    fn choice(font_id: &str, enhanced: bool) -> FontChoice {
        FontChoice {
            font_id: font_id.to_string(),
            enhanced,
        }
    }

    #[test]
    fn empty_registry_always_yields_base_font() {
        let registry = FontRegistry::new();
        for (text, lang) in [("", ""), ("తెలుగు", ""), ("hello", "hindi"), ("", "klingon")] {
            let chosen = registry.font_for_text(text, lang);
            assert_eq!(chosen, choice(BASE_FONT, false));
            assert!(!chosen.font_id.is_empty());
        }
    }

    #[test]
    fn bold_script_font_is_preferred() {
        let registry = registry_with(&["NotoSansTelugu", "NotoSansTelugu-Bold", "ArialUnicode"]);
        assert_eq!(
            registry.font_for_text("", "telugu"),
            choice("NotoSansTelugu-Bold", true)
        );
    }

    #[test]
    fn falls_through_regular_then_wide_unicode() {
        let registry = registry_with(&["NotoSansTamil", "ArialUnicode"]);
        assert_eq!(
            registry.font_for_text("தமிழ்", ""),
            choice("NotoSansTamil", true)
        );
        assert_eq!(
            registry.font_for_text("मराठी", "marathi"),
            choice("ArialUnicode", true)
        );
    }

    #[test]
    fn system_fallback_used_without_script() {
        let mut registry = registry_with(&["UnicodeFont"]);
        registry.set_unicode_fallback("UnicodeFont");
        assert_eq!(
            registry.font_for_text("plain english", "english"),
            choice("UnicodeFont", false)
        );
        // scripts without a dedicated font also land on the fallback
        assert_eq!(
            registry.font_for_text("മലയാളം", ""),
            choice("UnicodeFont", false)
        );
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = FontRegistry::new();
        assert!(registry.register("NotoSans", FontMetrics::unparsed("first")));
        assert!(!registry.register("NotoSans", FontMetrics::unparsed("second")));
        assert_eq!(registry.get("NotoSans").and_then(|f| f.family()), Some("first"));
    }

    #[test]
    fn fallback_must_be_registered() {
        let mut registry = FontRegistry::new();
        registry.set_unicode_fallback("Mangal");
        assert_eq!(registry.unicode_fallback(), None);
        assert_eq!(registry.heading_font(), BASE_FONT_BOLD);
    }

    #[test]
    fn missing_font_file_is_not_fatal() {
        let mut registry = FontRegistry::new();
        assert!(!registry.register_file("Ghost", Path::new("/nonexistent/ghost.ttf")));
        assert!(registry.names().is_empty());
    }
}
