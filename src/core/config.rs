use crate::core::errors::ConfigError;
use std::env;
use tracing::Level;

/// Detection configuration
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Minimum contour area (px^2) for a candidate balloon
    pub min_balloon_area: u32,
}

/// OCR configuration
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract language code (e.g. "jpn", "kor", "eng")
    pub language: String,
    /// Executable used for recognition
    pub command: String,
    pub timeout_secs: u64,
    /// Words at or below this confidence are dropped by the aggregator
    pub confidence_cutoff: f32,
}

/// How translated text is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorMode {
    /// Remote web API over HTTP
    Remote,
    /// Local model behind a bridge command (stdin -> stdout)
    Command,
}

impl TranslatorMode {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "remote" => Ok(TranslatorMode::Remote),
            "command" => Ok(TranslatorMode::Command),
            other => Err(ConfigError::UnknownTranslatorMode(other.to_string())),
        }
    }
}

/// Translation configuration
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub mode: TranslatorMode,
    /// Source language for the translator (ISO 639-1, e.g. "ja")
    pub source_lang: String,
    /// Target language for the translator
    pub target_lang: String,
    /// Endpoint for `remote` mode
    pub endpoint: String,
    /// Bridge command for `command` mode
    pub bridge_command: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Layout configuration
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Optional font file; the bundled face is used when absent or unreadable
    pub font_path: Option<String>,
}

/// Batch processing configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of pages processed concurrently
    pub max_concurrent_pages: usize,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: Level,
    pub detection: DetectionConfig,
    pub ocr: OcrConfig,
    pub translation: TranslationConfig,
    pub layout: LayoutConfig,
    pub batch: BatchConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Result<Self, ConfigError> {
        let log_level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "trace" => Some(Level::TRACE),
                "debug" => Some(Level::DEBUG),
                "info" => Some(Level::INFO),
                "warn" | "warning" => Some(Level::WARN),
                "error" => Some(Level::ERROR),
                _ => None,
            })
            .unwrap_or(Level::INFO);

        let translator_mode = match env::var("TRANSLATOR_MODE") {
            Ok(s) => TranslatorMode::parse(&s)?,
            Err(_) => TranslatorMode::Remote,
        };

        Ok(Self {
            log_level,
            detection: DetectionConfig {
                min_balloon_area: env::var("MIN_BALLOON_AREA")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
            },
            ocr: OcrConfig {
                language: env::var("OCR_LANGUAGE").unwrap_or_else(|_| "eng".to_string()),
                command: env::var("OCR_COMMAND").unwrap_or_else(|_| "tesseract".to_string()),
                timeout_secs: env::var("OCR_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                confidence_cutoff: env::var("OCR_CONFIDENCE_CUTOFF")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30.0),
            },
            translation: TranslationConfig {
                mode: translator_mode,
                source_lang: env::var("TRANSLATE_SOURCE_LANG").unwrap_or_else(|_| "auto".to_string()),
                target_lang: env::var("TRANSLATE_TARGET_LANG").unwrap_or_else(|_| "en".to_string()),
                endpoint: env::var("TRANSLATE_ENDPOINT").unwrap_or_else(|_| {
                    "https://translate.googleapis.com/translate_a/single".to_string()
                }),
                bridge_command: env::var("TRANSLATE_BRIDGE_COMMAND").ok(),
                timeout_secs: env::var("TRANSLATE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(20),
                max_retries: env::var("TRANSLATE_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
            },
            layout: LayoutConfig {
                font_path: env::var("FONT_PATH").ok().filter(|s| !s.is_empty()),
            },
            batch: BatchConfig {
                max_concurrent_pages: env::var("MAX_CONCURRENT_PAGES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(num_cpus::get),
            },
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.detection.min_balloon_area == 0 {
            return Err(ConfigError::InvalidMinArea(self.detection.min_balloon_area));
        }

        if !(0.0..=100.0).contains(&self.ocr.confidence_cutoff) {
            return Err(ConfigError::InvalidConfidenceCutoff(
                self.ocr.confidence_cutoff,
            ));
        }

        if self.batch.max_concurrent_pages == 0 {
            return Err(ConfigError::InvalidConcurrency(
                self.batch.max_concurrent_pages,
            ));
        }

        if self.ocr.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(self.ocr.timeout_secs));
        }
        if self.translation.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(self.translation.timeout_secs));
        }

        if self.translation.max_retries == 0 {
            return Err(ConfigError::InvalidRetries(self.translation.max_retries));
        }

        if self.translation.mode == TranslatorMode::Command
            && self.translation.bridge_command.is_none()
        {
            return Err(ConfigError::MissingTranslatorCommand);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translator_mode_parses_known_values() {
        assert_eq!(TranslatorMode::parse("remote").unwrap(), TranslatorMode::Remote);
        assert_eq!(TranslatorMode::parse("Command").unwrap(), TranslatorMode::Command);
        assert!(TranslatorMode::parse("magic").is_err());
    }
}
