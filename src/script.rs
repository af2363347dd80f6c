use std::fmt;
use std::ops::RangeInclusive;

/// Indian scripts that get dedicated fonts and enhanced document styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Telugu,
    Malayalam,
    Tamil,
    Devanagari,
}

/// Detection order. Ties go to the earliest entry.
pub const SCRIPTS: [Script; 4] = [
    Script::Telugu,
    Script::Malayalam,
    Script::Tamil,
    Script::Devanagari,
];

const LANGUAGE_SCRIPTS: &[(&str, Script)] = &[
    ("telugu", Script::Telugu),
    ("malayalam", Script::Malayalam),
    ("tamil", Script::Tamil),
    ("hindi", Script::Devanagari),
    ("devanagari", Script::Devanagari),
    ("marathi", Script::Devanagari),
    ("nepali", Script::Devanagari),
    ("sanskrit", Script::Devanagari),
];

impl Script {
    pub fn as_str(&self) -> &'static str {
        match self {
            Script::Telugu => "telugu",
            Script::Malayalam => "malayalam",
            Script::Tamil => "tamil",
            Script::Devanagari => "devanagari",
        }
    }

    pub fn code_points(&self) -> RangeInclusive<u32> {
        match self {
            Script::Telugu => 0x0C00..=0x0C7F,
            Script::Malayalam => 0x0D00..=0x0D7F,
            Script::Tamil => 0x0B80..=0x0BFF,
            Script::Devanagari => 0x0900..=0x097F,
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        self.code_points().contains(&(ch as u32))
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the script with the most characters in `text`, or `None` when no
/// character falls into any of the known ranges.
pub fn detect_script(text: &str) -> Option<Script> {
    let mut counts = [0usize; SCRIPTS.len()];
    for ch in text.chars() {
        for (idx, script) in SCRIPTS.iter().enumerate() {
            if script.contains(ch) {
                counts[idx] += 1;
            }
        }
    }

    let mut best: Option<(Script, usize)> = None;
    for (script, count) in SCRIPTS.iter().zip(counts) {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((*script, count)),
        }
    }
    best.map(|(script, _)| script)
}

pub fn script_from_language(language: &str) -> Option<Script> {
    let lang = language.trim().to_lowercase();
    LANGUAGE_SCRIPTS
        .iter()
        .find(|(name, _)| *name == lang)
        .map(|(_, script)| *script)
}

/// Explicit language wins over what the text looks like.
pub fn resolve_script(text: &str, target_language: &str) -> Option<Script> {
    if !target_language.trim().is_empty() {
        if let Some(script) = script_from_language(target_language) {
            return Some(script);
        }
    }
    detect_script(text)
}
