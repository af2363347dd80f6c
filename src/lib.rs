use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod data;
pub mod extract;
pub mod fonts;
pub mod languages;
pub mod logging;
pub mod providers;
pub mod render;
pub mod script;
pub mod server;
pub mod settings;
#[cfg(test)]
mod test_util;
pub mod translator;

pub use fonts::{FontRegistry, FontSetup};
pub use providers::{GoogleTranslate, ProviderError, TranslationProvider};
pub use server::{ServerState, router, run_server};
pub use settings::Settings;
pub use translator::{TranslateError, TranslationResult, Translator};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings_path: Option<String>,
    pub addr: Option<String>,
    /// Fill the font cache and exit instead of serving.
    pub download_fonts_only: bool,
    pub skip_font_download: bool,
}

pub fn font_setup(settings: &Settings, skip_download: bool) -> FontSetup {
    FontSetup {
        font_dir: settings.font_dir.clone(),
        download: settings.download_fonts && !skip_download,
        timeout: settings.font_download_timeout,
    }
}

pub async fn run(config: Config) -> Result<()> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(addr) = config.addr.filter(|addr| !addr.trim().is_empty()) {
        settings.addr = addr.trim().to_string();
    }

    if config.download_fonts_only {
        return download_fonts(&settings).await;
    }

    let setup = font_setup(&settings, config.skip_font_download);
    let fonts = Arc::new(FontRegistry::bootstrap(&setup).await);
    let provider = GoogleTranslate::new(settings.translate_timeout)?;
    let translator = Translator::new(provider).with_backoff(settings.retry_backoff);
    info!(
        "starting server (google key configured: {})",
        settings.has_google_key()
    );
    run_server(ServerState::new(settings, fonts, translator)).await
}

async fn download_fonts(settings: &Settings) -> Result<()> {
    let setup = font_setup(settings, false);
    let mut missing = Vec::new();
    for script in script::SCRIPTS {
        let (regular, bold) = fonts::download_script_fonts(&setup, script).await;
        if regular.is_none() {
            missing.push(fonts::script_font_name(script).to_string());
        }
        if bold.is_none() {
            missing.push(fonts::script_bold_font_name(script));
        }
    }
    if missing.is_empty() {
        info!("all script fonts cached in {}", setup.font_dir.display());
        return Ok(());
    }
    Err(anyhow!(
        "font cache incomplete in {}: missing {}",
        setup.font_dir.display(),
        missing.join(", ")
    ))
}
