// Custom error types for better error handling and debugging
//
// Using thiserror for ergonomic error definitions with:
// - Context preservation
// - Type-safe error matching
// - Source error chaining
//
// Soft failures (translation, inpainting) never surface here as page
// errors; they are folded into RegionOutcome by the phase drivers.

use thiserror::Error;

/// Balloon detection errors
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("region {x},{y} {width}x{height} exceeds page bounds {page_width}x{page_height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        page_width: u32,
        page_height: u32,
    },

    #[error("page too small to segment: {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
}

/// Background reconstruction errors (soft: callers degrade, never abort)
#[derive(Debug, Error)]
pub enum InpaintError {
    #[error("empty inpaint region {width}x{height}")]
    EmptyRegion { width: u32, height: u32 },

    #[error("inpaint mask does not match region: mask {mask_width}x{mask_height}, region {width}x{height}")]
    MaskMismatch {
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },
}

/// OCR capability errors
///
/// An empty recognition result is NOT an error; it is a valid outcome that
/// the pipeline maps to `RegionOutcome::Empty`.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to invoke OCR command `{command}`: {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("OCR command exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },

    #[error("OCR timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("failed to stage region image for OCR: {0}")]
    StagingFailed(#[from] std::io::Error),

    #[error("failed to encode region image: {0}")]
    EncodeFailed(#[from] image::ImageError),
}

/// Translation capability errors (soft: the pipeline falls back to the
/// source text and continues)
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("translation endpoint returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    InvalidResponse(String),

    #[error("translation timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("all {attempts} attempts failed; last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("failed to invoke translator command `{command}`: {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("translator command exited with {status}: {stderr}")]
    BridgeFailed { status: String, stderr: String },
}

/// Text layout errors
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("target region too small to hold any text: {width}x{height}")]
    RegionTooSmall { width: u32, height: u32 },
}

/// Page-level pipeline errors
///
/// Per-region soft failures never reach this type; a page fails only on
/// hard conditions (unreadable input, detector bug, unwritable output).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("page {page_index}: unreadable image: {source}")]
    UnreadableImage {
        page_index: usize,
        source: image::ImageError,
    },

    #[error("page {page_index}: {source}")]
    DetectionFailed {
        page_index: usize,
        #[source]
        source: DetectionError,
    },

    #[error("page {page_index}: failed to write output {path}: {source}")]
    WriteFailed {
        page_index: usize,
        path: String,
        source: image::ImageError,
    },

    #[error("failed to access directory {path}: {source}")]
    DirUnavailable {
        path: String,
        source: std::io::Error,
    },

    #[error("task join failed: {0}")]
    TaskJoinFailed(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("minimum balloon area must be > 0, got {0}")]
    InvalidMinArea(u32),

    #[error("OCR confidence cutoff must be in [0, 100], got {0}")]
    InvalidConfidenceCutoff(f32),

    #[error("page concurrency must be > 0, got {0}")]
    InvalidConcurrency(usize),

    #[error("retry count must be > 0, got {0}")]
    InvalidRetries(u32),

    #[error("timeout must be > 0 seconds, got {0}")]
    InvalidTimeout(u64),

    #[error("translator command required when translator mode is `command`")]
    MissingTranslatorCommand,

    #[error("unknown translator mode `{0}` (expected `remote` or `command`)")]
    UnknownTranslatorMode(String),
}

// Convenience type aliases for Results
pub type DetectionResult<T> = Result<T, DetectionError>;
pub type OcrResult<T> = Result<T, OcrError>;
pub type TranslateResult<T> = Result<T, TranslateError>;
pub type PipelineResult<T> = Result<T, PipelineError>;

// Helper trait for adding page context to errors
pub trait ErrorContext<T> {
    fn with_page_context(self, page_index: usize) -> Result<T, PipelineError>;
}

impl<T> ErrorContext<T> for DetectionResult<T> {
    fn with_page_context(self, page_index: usize) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::DetectionFailed {
            page_index,
            source: e,
        })
    }
}
