use tracing::warn;

pub const UNKNOWN_LANGUAGE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
    pub display: &'static str,
}

const fn lang(name: &'static str, code: &'static str, display: &'static str) -> Language {
    Language {
        name,
        code,
        display,
    }
}

pub const LANGUAGES: [Language; 13] = [
    lang("hindi", "hi", "Hindi"),
    lang("english", "en", "English"),
    lang("urdu", "ur", "Urdu"),
    lang("assamese", "as", "Assamese"),
    lang("bengali", "bn", "Bengali"),
    lang("gujarati", "gu", "Gujarati"),
    lang("kannada", "kn", "Kannada"),
    lang("malayalam", "ml", "Malayalam"),
    lang("marathi", "mr", "Marathi"),
    lang("odia", "or", "Odia"),
    lang("punjabi", "pa", "Punjabi"),
    lang("tamil", "ta", "Tamil"),
    lang("telugu", "te", "Telugu"),
];

pub fn find_by_name(name: &str) -> Option<&'static Language> {
    let name = normalize(name);
    LANGUAGES.iter().find(|lang| lang.name == name)
}

pub fn find_by_code(code: &str) -> Option<&'static Language> {
    let code = normalize(code);
    LANGUAGES.iter().find(|lang| lang.code == code)
}

pub fn code_for_name(name: &str) -> Option<&'static str> {
    find_by_name(name).map(|lang| lang.code)
}

pub fn display_name(code: &str) -> Option<&'static str> {
    find_by_code(code).map(|lang| lang.display)
}

/// ISO 639-1 code of the detected language when there is one, otherwise the
/// ISO 639-3 code reported by the classifier.
pub fn detect_code(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let info = whatlang::detect(text)?;
    let code3 = info.lang().code();
    let code = isolang::Language::from_639_3(code3)
        .and_then(|lang| lang.to_639_1())
        .unwrap_or(code3);
    Some(code.to_string())
}

/// Human readable name of the detected language, `"Unknown"` when detection
/// is impossible.
pub fn detect_language(text: &str) -> String {
    if text.trim().is_empty() {
        return UNKNOWN_LANGUAGE.to_string();
    }
    match detect_code(text) {
        Some(code) => display_name(&code)
            .map(|name| name.to_string())
            .unwrap_or_else(|| code.to_uppercase()),
        None => {
            warn!("language detection failed for {} chars", text.chars().count());
            UNKNOWN_LANGUAGE.to_string()
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
