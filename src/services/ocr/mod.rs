// OCR capability: consumed as a black box behind a trait
//
// Production implementation bridges to a Tesseract binary via subprocess:
// plain text with `--psm 6` (one uniform block) for region crops, and TSV
// output for page-wide word boxes. Empty or low-confidence results are
// valid outcomes, never errors.

use crate::core::config::OcrConfig;
use crate::core::errors::{OcrError, OcrResult};
use crate::core::types::Word;
use async_trait::async_trait;
use image::{GrayImage, RgbaImage};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize a single preprocessed region crop as one text block.
    /// An empty string is a valid result (region has no readable text).
    async fn recognize_region(&self, crop: &GrayImage, lang: &str) -> OcrResult<String>;

    /// Word-level recognition over a full page, with confidence scores
    /// and block/paragraph identifiers, in OCR emission order.
    async fn recognize_page(&self, page: &RgbaImage, lang: &str) -> OcrResult<Vec<Word>>;
}

/// Tesseract subprocess bridge
pub struct TesseractOcr {
    command: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn run(&self, image_path: &Path, lang: &str, extra: &[&str]) -> OcrResult<String> {
        let mut cmd = Command::new(&self.command);
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", lang])
            .args(extra)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| OcrError::TimedOut {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| OcrError::SpawnFailed {
                command: self.command.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize_region(&self, crop: &GrayImage, lang: &str) -> OcrResult<String> {
        let staged = tempfile::Builder::new()
            .prefix("retype-region-")
            .suffix(".png")
            .tempfile()?;
        crop.save(staged.path())?;

        // --psm 6 assumes a single uniform block of text
        let text = self.run(staged.path(), lang, &["--psm", "6"]).await?;
        Ok(text.trim().to_string())
    }

    async fn recognize_page(&self, page: &RgbaImage, lang: &str) -> OcrResult<Vec<Word>> {
        let staged = tempfile::Builder::new()
            .prefix("retype-page-")
            .suffix(".png")
            .tempfile()?;
        page.save(staged.path())?;

        let tsv = self.run(staged.path(), lang, &["tsv"]).await?;
        let words = parse_tsv_words(&tsv);
        debug!("page OCR produced {} word(s)", words.len());
        Ok(words)
    }
}

/// Parse Tesseract TSV output, keeping word rows (level 5) only.
///
/// Columns: level page block par line word left top width height conf text
fn parse_tsv_words(tsv: &str) -> Vec<Word> {
    let mut words = Vec::new();
    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        if cols[0] != "5" {
            continue;
        }

        let parsed = (
            cols[2].parse::<u32>(),
            cols[3].parse::<u32>(),
            cols[6].parse::<u32>(),
            cols[7].parse::<u32>(),
            cols[8].parse::<u32>(),
            cols[9].parse::<u32>(),
            cols[10].parse::<f32>(),
        );
        let (Ok(block), Ok(par), Ok(x), Ok(y), Ok(w), Ok(h), Ok(conf)) = parsed else {
            continue;
        };

        words.push(Word {
            text: cols[11].trim().to_string(),
            x,
            y,
            width: w,
            height: h,
            confidence: conf,
            block_id: block,
            paragraph_id: par,
        });
    }
    words
}
