use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_ADDR: &str = "DOC_TRANSLATOR_ADDR";
pub const ENV_FONT_DIR: &str = "DOC_TRANSLATOR_FONT_DIR";

#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: String,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub font_dir: PathBuf,
    pub download_fonts: bool,
    pub font_download_timeout: Duration,
    pub translate_timeout: Duration,
    pub retry_backoff: Duration,
    pub google_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            allowed_origins: Vec::new(),
            max_upload_bytes: 25 * 1024 * 1024,
            font_dir: PathBuf::from("fonts"),
            download_fonts: true,
            font_download_timeout: Duration::from_secs(60),
            translate_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(1),
            google_api_key: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    fonts: Option<FontSettings>,
    translation: Option<TranslationSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    allowed_origins: Option<Vec<String>>,
    max_upload_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    dir: Option<String>,
    download: Option<bool>,
    download_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationSettings {
    timeout_secs: Option<u64>,
    retry_backoff_ms: Option<u64>,
}

/// Built-in defaults, then `./settings.toml`, `./settings.local.toml` and
/// `extra_path`, each overriding the previous; environment variables last.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    // a missing .env is fine
    let _ = dotenvy::dotenv();
    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

impl Settings {
    pub fn has_google_key(&self) -> bool {
        self.google_api_key.is_some()
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.addr = addr.trim().to_string();
                }
            }
            if let Some(origins) = server.allowed_origins {
                self.allowed_origins = origins
                    .into_iter()
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect();
            }
            if let Some(limit) = server.max_upload_bytes {
                if limit > 0 {
                    self.max_upload_bytes = limit;
                }
            }
        }
        if let Some(fonts) = incoming.fonts {
            if let Some(dir) = fonts.dir {
                if !dir.trim().is_empty() {
                    self.font_dir = PathBuf::from(dir.trim());
                }
            }
            if let Some(download) = fonts.download {
                self.download_fonts = download;
            }
            if let Some(secs) = fonts.download_timeout_secs {
                if secs > 0 {
                    self.font_download_timeout = Duration::from_secs(secs);
                }
            }
        }
        if let Some(translation) = incoming.translation {
            if let Some(secs) = translation.timeout_secs {
                if secs > 0 {
                    self.translate_timeout = Duration::from_secs(secs);
                }
            }
            if let Some(ms) = translation.retry_backoff_ms {
                self.retry_backoff = Duration::from_millis(ms);
            }
        }
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(key) = non_empty(ENV_GOOGLE_API_KEY) {
            self.google_api_key = Some(key);
        }
        if let Some(addr) = non_empty(ENV_ADDR) {
            self.addr = addr.trim().to_string();
        }
        if let Some(dir) = non_empty(ENV_FONT_DIR) {
            self.font_dir = PathBuf::from(dir.trim());
        }
    }
}
