pub mod blocks;
pub mod detection;
pub mod fonts;
pub mod inpaint;
pub mod layout;
pub mod ocr;
pub mod translation;

// Re-export commonly used services
pub use self::blocks::TextBlockAggregator;
pub use self::detection::BalloonDetector;
pub use self::fonts::{FontHandle, FontProvider};
pub use self::inpaint::BackgroundInpainter;
pub use self::layout::TextLayoutEngine;
pub use self::ocr::{OcrEngine, TesseractOcr};
pub use self::translation::{build_translator, CommandTranslator, HttpTranslator, Translate};
