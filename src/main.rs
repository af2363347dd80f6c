use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "doc-translator-rust",
    version,
    about = "Document translation API with Indic script aware DOCX/PDF export"
)]
struct Cli {
    /// Address to listen on (overrides settings and DOC_TRANSLATOR_ADDR)
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Download the Indic script fonts into the font directory and exit
    #[arg(long = "download-fonts", conflicts_with = "skip_font_download")]
    download_fonts: bool,

    /// Only register fonts already cached or installed on the system
    #[arg(long = "skip-font-download")]
    skip_font_download: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    doc_translator_rust::logging::init(cli.verbose)?;
    let config = doc_translator_rust::Config {
        settings_path: cli.read_settings,
        addr: cli.addr,
        download_fonts_only: cli.download_fonts,
        skip_font_download: cli.skip_font_download,
    };
    doc_translator_rust::run(config).await
}
