use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::script::Script;

use super::script_font_name;

/// Smaller payloads are mirror error pages, not font binaries.
pub const MIN_FONT_BYTES: usize = 10_000;

const MIRRORS: &[&str] = &[
    "https://raw.githubusercontent.com/google/fonts/main/ofl",
    "https://cdn.jsdelivr.net/gh/google/fonts@main/ofl",
];
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";

#[derive(Debug, Clone)]
pub struct FontSetup {
    pub font_dir: PathBuf,
    pub download: bool,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weight {
    Regular,
    Bold,
}

impl Weight {
    fn suffix(&self) -> &'static str {
        match self {
            Weight::Regular => "Regular",
            Weight::Bold => "Bold",
        }
    }
}

fn font_file_name(script: Script, weight: Weight) -> String {
    format!("{}-{}.ttf", script_font_name(script), weight.suffix())
}

/// Mirror URLs for one face, in the order they are tried.
pub fn font_urls(script: Script, bold: bool) -> Vec<String> {
    let weight = if bold { Weight::Bold } else { Weight::Regular };
    let base = script_font_name(script);
    let dir = base.to_lowercase();
    MIRRORS
        .iter()
        .map(|mirror| format!("{}/{}/{}", mirror, dir, font_file_name(script, weight)))
        .collect()
}

fn accept_payload(status: StatusCode, len: usize) -> bool {
    status.is_success() && len > MIN_FONT_BYTES
}

/// Paths of the regular and bold faces for `script`, downloading the ones
/// missing from the cache when downloads are enabled.
pub async fn download_script_fonts(
    setup: &FontSetup,
    script: Script,
) -> (Option<PathBuf>, Option<PathBuf>) {
    if let Err(err) = std::fs::create_dir_all(&setup.font_dir) {
        warn!(
            "failed to create font directory {}: {}",
            setup.font_dir.display(),
            err
        );
    }
    let client = if setup.download {
        match http_client(setup.timeout) {
            Ok(client) => Some(client),
            Err(err) => {
                warn!("font downloads disabled: {:#}", err);
                None
            }
        }
    } else {
        None
    };

    let regular = ensure_font(setup, client.as_ref(), script, Weight::Regular).await;
    let bold = ensure_font(setup, client.as_ref(), script, Weight::Bold).await;
    (regular, bold)
}

async fn ensure_font(
    setup: &FontSetup,
    client: Option<&reqwest::Client>,
    script: Script,
    weight: Weight,
) -> Option<PathBuf> {
    let path = setup.font_dir.join(font_file_name(script, weight));
    if path.exists() {
        return Some(path);
    }
    let client = client?;
    for url in font_urls(script, weight == Weight::Bold) {
        info!("downloading {} from {}", font_file_name(script, weight), url);
        match fetch_font(client, &url).await {
            Ok(bytes) => match persist_font(&path, &bytes) {
                Ok(()) => {
                    info!(
                        "downloaded {} ({} bytes)",
                        font_file_name(script, weight),
                        bytes.len()
                    );
                    return Some(path);
                }
                Err(err) => {
                    warn!("{:#}", err);
                    return None;
                }
            },
            Err(err) => warn!("failed to download from {}: {:#}", url, err),
        }
    }
    None
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .with_context(|| "failed to build font download client")
}

async fn fetch_font(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request failed: {}", url))?;
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("failed to read body: {}", url))?;
    if !accept_payload(status, bytes.len()) {
        return Err(anyhow!(
            "HTTP {} or file too small ({} bytes)",
            status.as_u16(),
            bytes.len()
        ));
    }
    Ok(bytes.to_vec())
}

/// Writes through a temp file in the same directory so a failed download
/// never leaves a truncated font behind.
fn persist_font(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("font path has no parent: {}", path.display()))?;
    let mut file = tempfile::Builder::new()
        .prefix("font-")
        .suffix(".part")
        .tempfile_in(dir)
        .with_context(|| format!("failed to create temp font in {}", dir.display()))?;
    file.write_all(bytes)
        .with_context(|| "failed to write font data")?;
    file.persist(path)
        .with_context(|| format!("failed to persist font: {}", path.display()))?;
    Ok(())
}
