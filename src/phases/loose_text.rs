// Phase 2: loose text over artwork
//
// Aggregates page-wide OCR into text blocks, excluding words the balloon
// phase already rewrote, then runs the same state machine with outline
// styling. Must run after phase 1 of the same page: its exclusion logic
// reads the mask phase 1 wrote.

use crate::core::errors::DetectionResult;
use crate::core::mask::RegionMask;
use crate::core::types::{ProgressFn, RegionKind, RegionOutcome};
use crate::phases::region::{run_region, RegionContext};
use crate::services::blocks::TextBlockAggregator;
use image::RgbaImage;
use tracing::{debug, warn};

/// Padding applied to a block's union box before erase and draw
const BLOCK_PAD_X: u32 = 10;
const BLOCK_PAD_Y: u32 = 5;

pub struct LooseTextPhase<'a> {
    aggregator: &'a TextBlockAggregator,
}

impl<'a> LooseTextPhase<'a> {
    pub fn new(aggregator: &'a TextBlockAggregator) -> Self {
        Self { aggregator }
    }

    /// Takes ownership of the phase-1 output pair; `done_offset` carries
    /// the number of regions phase 1 already reported to the progress
    /// callback.
    pub async fn run(
        &self,
        mut page: RgbaImage,
        mask: &RegionMask,
        ctx: &RegionContext<'_>,
        progress: Option<&ProgressFn>,
        done_offset: usize,
    ) -> DetectionResult<(RgbaImage, Vec<RegionOutcome>)> {
        let (width, height) = page.dimensions();

        let blocks = match self
            .aggregator
            .aggregate(&page, ctx.ocr_lang, mask, ctx.ocr)
            .await
        {
            Ok(blocks) => blocks,
            Err(e) => {
                // Page OCR failure degrades to "no loose text" rather than
                // losing the balloon work already on the page
                warn!("page OCR failed ({e}), skipping loose-text phase");
                return Ok((page, Vec::new()));
            }
        };
        debug!("loose-text phase: {} block(s)", blocks.len());

        let total = done_offset + blocks.len();
        let mut outcomes = Vec::with_capacity(blocks.len());

        for (index, block) in blocks.iter().enumerate() {
            let region = block
                .to_region(RegionKind::LooseText)
                .padded(BLOCK_PAD_X, BLOCK_PAD_Y, width, height);

            let outcome = run_region(&mut page, &region, ctx, true, Some(&block.text)).await?;
            outcomes.push(outcome);

            if let Some(cb) = progress {
                cb(done_offset + index + 1, total);
            }
        }

        Ok((page, outcomes))
    }
}
