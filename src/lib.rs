// Library exports for the comic page erase-and-retypeset engine

// Core modules
pub mod core;
pub mod orchestration;
pub mod phases;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions
pub use self::core::{
    config::{Config, TranslatorMode},
    errors::{
        ConfigError, DetectionError, InpaintError, LayoutError, OcrError, PipelineError,
        TranslateError,
    },
    mask::RegionMask,
    types::{
        BatchReport, PageReport, PageStatus, ProgressFn, Region, RegionKind, RegionOutcome,
        TextBlock, TranslationResult, Word,
    },
};

pub use self::orchestration::{BatchRunner, PageProcessor, ProcessedPage};

pub use self::services::{
    build_translator, BackgroundInpainter, BalloonDetector, FontProvider, OcrEngine,
    TesseractOcr, TextBlockAggregator, TextLayoutEngine, Translate,
};
