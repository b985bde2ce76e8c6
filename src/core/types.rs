// Core data model for the erase-and-retypeset pipeline

use serde::Serialize;
use std::sync::Arc;

/// What kind of text container a region came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionKind {
    /// Bright, geometrically regular speech/thought container
    Balloon,
    /// Text drawn directly over artwork, aggregated from page OCR
    LooseText,
}

/// Integer rectangle in page coordinates
///
/// Invariant: fully contained within page bounds. The detector and the
/// aggregator are responsible for producing in-bounds rectangles; the
/// region state machine re-checks and raises rather than clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub kind: RegionKind,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32, kind: RegionKind) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind,
        }
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn contains_point(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn in_bounds(&self, page_width: u32, page_height: u32) -> bool {
        self.x + self.width <= page_width && self.y + self.height <= page_height
    }

    /// Grow the rectangle by the given padding, clamped to page bounds
    pub fn padded(&self, pad_x: u32, pad_y: u32, page_width: u32, page_height: u32) -> Region {
        let x = self.x.saturating_sub(pad_x);
        let y = self.y.saturating_sub(pad_y);
        let right = (self.x + self.width + pad_x).min(page_width);
        let bottom = (self.y + self.height + pad_y).min(page_height);
        Region {
            x,
            y,
            width: right - x,
            height: bottom - y,
            kind: self.kind,
        }
    }
}

/// Word-level OCR primitive, consumed only by the block aggregator
#[derive(Debug, Clone)]
pub struct Word {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
    pub block_id: u32,
    pub paragraph_id: u32,
}

impl Word {
    /// Center point of the word's bounding box
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// A group of words sharing (block_id, paragraph_id), with their union box
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TextBlock {
    pub fn to_region(&self, kind: RegionKind) -> Region {
        Region::new(self.x, self.y, self.width, self.height, kind)
    }
}

/// Terminal state of the per-region state machine
///
/// Logged once per region. When a region hits both soft failures,
/// InpaintDegraded wins (the more visible degradation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionOutcome {
    /// No recognizable text; region left untouched
    Empty,
    /// Erased and redrawn with the translated text
    Drawn,
    /// Drawn, but with the source text after translation failed
    TranslateFallback,
    /// Drawn, but over the unreconstructed background after inpainting failed
    InpaintDegraded,
}

/// Result of translating one region's text
///
/// Failure is represented by `succeeded = false` with the source text
/// substituted; it is never propagated as a hard error.
#[derive(Debug, Clone)]
pub struct TranslationResult {
    pub text: String,
    pub succeeded: bool,
}

/// Per-page outcome for batch reporting
#[derive(Debug, Clone, Serialize)]
pub enum PageStatus {
    Success,
    Skipped,
    Failed,
}

/// Individual page result, reported in original page order
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub index: usize,
    pub filename: String,
    pub status: PageStatus,
    pub regions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Whole-run summary
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub pages: Vec<PageReport>,
}

/// Progress notification: (completed regions, total known regions),
/// emitted after each region finishes its state machine
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;
