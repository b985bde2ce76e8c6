// Per-region state machine
//
// Detected -> Extracted | Empty -> Translated | FallbackOriginal
//          -> Erased -> Drawn
//
// A region with no recognizable text terminates without mutating the
// page. Translation and inpainting failures are soft: the region still
// reaches Drawn with a downgraded outcome. An out-of-bounds rectangle is
// a detector bug and raises instead of clipping.

use crate::core::errors::DetectionError;
use crate::core::types::{Region, RegionOutcome};
use crate::services::inpaint::BackgroundInpainter;
use crate::services::layout::TextLayoutEngine;
use crate::services::ocr::OcrEngine;
use crate::services::translation::{translate_with_fallback, Translate};
use crate::utils::image_ops::{adaptive_mean_threshold, crop_rgba};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::contrast::equalize_histogram;
use tracing::{info, warn};

/// Fill color for redrawn text
const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Adaptive threshold window and offset for region OCR preprocessing
const OCR_BLOCK_SIZE: u32 = 11;
const OCR_OFFSET: i32 = 2;

/// Capabilities shared by both phase drivers
pub struct RegionContext<'a> {
    pub ocr: &'a dyn OcrEngine,
    pub translator: &'a dyn Translate,
    pub inpainter: &'a BackgroundInpainter,
    pub layout: &'a TextLayoutEngine,
    pub ocr_lang: &'a str,
}

/// Sharpen a region crop for recognition: grayscale, histogram
/// equalization, adaptive mean threshold
fn preprocess_for_ocr(page: &RgbaImage, region: &Region) -> GrayImage {
    let crop = crop_rgba(page, region.x, region.y, region.width, region.height);
    let gray = image::imageops::grayscale(&crop);
    let equalized = equalize_histogram(&gray);
    adaptive_mean_threshold(&equalized, OCR_BLOCK_SIZE, OCR_OFFSET)
}

/// Drive one region through the state machine, mutating the page in
/// place on the erase and draw steps.
///
/// Balloon regions enter at `Detected` and extract their text here; the
/// loose-text phase enters at `Extracted` with the text its aggregator
/// already collected.
pub async fn run_region(
    page: &mut RgbaImage,
    region: &Region,
    ctx: &RegionContext<'_>,
    outline: bool,
    extracted: Option<&str>,
) -> Result<RegionOutcome, DetectionError> {
    let (page_width, page_height) = page.dimensions();
    if !region.in_bounds(page_width, page_height) {
        return Err(DetectionError::RegionOutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            page_width,
            page_height,
        });
    }

    // Detected -> Extracted | Empty
    let text = match extracted {
        Some(text) => text.to_string(),
        None => {
            let crop = preprocess_for_ocr(page, region);
            match ctx.ocr.recognize_region(&crop, ctx.ocr_lang).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("region OCR failed ({e}), skipping region");
                    return Ok(RegionOutcome::Empty);
                }
            }
        }
    };
    if text.trim().is_empty() {
        return Ok(RegionOutcome::Empty);
    }

    // Extracted -> Translated | FallbackOriginal
    let translation = translate_with_fallback(ctx.translator, &text).await;

    // -> Erased (soft failure leaves the region unmodified; text is still
    // drawn over it, degraded but visible)
    let mut degraded = false;
    if let Err(e) = ctx.inpainter.erase_region(page, region) {
        warn!("inpaint failed ({e}), drawing over the original background");
        degraded = true;
    }

    // Erased -> Drawn
    if let Err(e) = ctx
        .layout
        .draw_fitted(page, region, &translation.text, TEXT_COLOR, outline)
    {
        warn!("layout failed ({e}), region left erased without text");
    }

    let outcome = if degraded {
        RegionOutcome::InpaintDegraded
    } else if !translation.succeeded {
        RegionOutcome::TranslateFallback
    } else {
        RegionOutcome::Drawn
    };

    info!(
        "region {},{} {}x{} ({:?}) -> {:?}",
        region.x, region.y, region.width, region.height, region.kind, outcome
    );
    Ok(outcome)
}
