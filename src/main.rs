// Main entry point: translate a chapter directory of page images

use manga_retype::{
    core::config::{Config, TranslatorMode},
    orchestration::{BatchRunner, PageProcessor},
    services::{build_translator, TesseractOcr},
    PageStatus,
};

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "manga-retype",
    about = "Erase and retypeset translated text on scanned comic pages"
)]
struct Cli {
    /// Directory of page images to process
    input: PathBuf,

    /// Directory for the rewritten pages
    output: PathBuf,

    /// OCR language code (e.g. jpn, kor, eng)
    #[arg(short = 'l', long)]
    lang: Option<String>,

    /// Translation source language (ISO 639-1, or `auto`)
    #[arg(long)]
    source: Option<String>,

    /// Translation target language (ISO 639-1)
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Translator backend: `remote` or `command`
    #[arg(long)]
    translator: Option<String>,

    /// Bridge command for the `command` translator
    #[arg(long)]
    translate_cmd: Option<String>,

    /// Lettering font file (bundled face when omitted)
    #[arg(short = 'f', long)]
    font: Option<PathBuf>,

    /// Maximum pages processed concurrently
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::new().context("failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli)?;

    // Initialize logging
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::new(format!(
        "manga_retype={}",
        config.log_level.to_string().to_lowercase()
    ));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "ocr lang {} | translate {} -> {} ({:?}) | {} concurrent page(s)",
        config.ocr.language,
        config.translation.source_lang,
        config.translation.target_lang,
        config.translation.mode,
        config.batch.max_concurrent_pages
    );

    let config = Arc::new(config);
    let ocr = Arc::new(TesseractOcr::new(&config.ocr));
    let translator = build_translator(&config.translation);
    let processor = Arc::new(PageProcessor::new(Arc::clone(&config), ocr, translator));
    let runner = BatchRunner::new(&config, processor);

    // Ctrl-C stops launching new pages; in-flight pages finish and are
    // written out
    let cancel = runner.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("cancellation requested, finishing in-flight pages");
            cancel.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });

    let report = runner.process_dir(&cli.input, &cli.output).await?;

    for page in &report.pages {
        match page.status {
            PageStatus::Success => {
                info!("{}: ok ({} region(s))", page.filename, page.regions)
            }
            PageStatus::Skipped => info!("{}: skipped", page.filename),
            PageStatus::Failed => info!(
                "{}: FAILED ({})",
                page.filename,
                page.reason.as_deref().unwrap_or("unknown")
            ),
        }
    }

    if report.failed > 0 {
        anyhow::bail!("{} of {} page(s) failed", report.failed, report.total);
    }
    Ok(())
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(lang) = &cli.lang {
        config.ocr.language = lang.clone();
    }
    if let Some(source) = &cli.source {
        config.translation.source_lang = source.clone();
    }
    if let Some(target) = &cli.target {
        config.translation.target_lang = target.clone();
    }
    if let Some(mode) = &cli.translator {
        config.translation.mode = TranslatorMode::parse(mode)?;
    }
    if let Some(cmd) = &cli.translate_cmd {
        config.translation.bridge_command = Some(cmd.clone());
    }
    if let Some(font) = &cli.font {
        config.layout.font_path = Some(font.display().to_string());
    }
    if let Some(jobs) = &cli.jobs {
        anyhow::ensure!(*jobs > 0, "--jobs must be > 0");
        config.batch.max_concurrent_pages = *jobs;
    }
    if config.translation.mode == TranslatorMode::Command
        && config.translation.bridge_command.is_none()
    {
        anyhow::bail!("--translate-cmd is required with --translator command");
    }
    Ok(())
}
