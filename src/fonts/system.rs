use std::path::Path;
use tracing::debug;

use super::FontRegistry;

/// Known system font locations and the name each is registered under.
/// macOS first, then Linux, then Windows.
pub const SYSTEM_FONT_CANDIDATES: &[(&str, &str)] = &[
    ("/System/Library/Fonts/Supplemental/Arial Unicode.ttf", "ArialUnicode"),
    ("/Library/Fonts/Arial Unicode.ttf", "ArialUnicode"),
    ("/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf", "UnicodeFont"),
    ("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf", "UnicodeFont"),
    ("/usr/share/fonts/truetype/dejavu/DejaVuSans-Regular.ttf", "UnicodeFont"),
    ("/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf", "NotoSans"),
    ("C:/Windows/Fonts/arialuni.ttf", "ArialUnicode"),
    ("C:/Windows/Fonts/mangal.ttf", "Mangal"),
    ("C:/Windows/Fonts/nirmala.ttf", "Nirmala"),
];

/// Registers the first candidate that exists and parses, and marks it as the
/// registry's unicode fallback.
pub fn register_system_font(
    registry: &mut FontRegistry,
    candidates: &[(&str, &str)],
) -> Option<String> {
    for (path, name) in candidates {
        let path = Path::new(path);
        if !path.exists() {
            continue;
        }
        let is_collection = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("ttc"))
            .unwrap_or(false);
        if is_collection {
            debug!("skipping font collection {}", path.display());
            continue;
        }
        if registry.register_file(name, path) || registry.contains(name) {
            registry.set_unicode_fallback(name);
            return Some(name.to_string());
        }
    }
    None
}
