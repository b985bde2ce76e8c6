// Phase 1: balloon regions
//
// Detects balloons, runs the per-region state machine without outline
// styling, and commits every rewritten rectangle to the occupancy mask so
// the loose-text phase cannot process the same words again.

use crate::core::errors::DetectionResult;
use crate::core::mask::RegionMask;
use crate::core::types::{ProgressFn, RegionOutcome};
use crate::phases::region::{run_region, RegionContext};
use crate::services::detection::BalloonDetector;
use image::RgbaImage;
use tracing::debug;

pub struct BalloonPhase<'a> {
    detector: &'a BalloonDetector,
}

impl<'a> BalloonPhase<'a> {
    pub fn new(detector: &'a BalloonDetector) -> Self {
        Self { detector }
    }

    /// Consume the page raster and hand it on together with the mask the
    /// loose-text phase depends on.
    pub async fn run(
        &self,
        mut page: RgbaImage,
        ctx: &RegionContext<'_>,
        progress: Option<&ProgressFn>,
    ) -> DetectionResult<(RgbaImage, RegionMask, Vec<RegionOutcome>)> {
        let (width, height) = page.dimensions();
        let mut mask = RegionMask::new(width, height);

        let balloons = self.detector.detect(&page)?;
        debug!("balloon phase: {} region(s)", balloons.len());

        let total = balloons.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, region) in balloons.iter().enumerate() {
            let outcome = run_region(&mut page, region, ctx, false, None).await?;
            if outcome != RegionOutcome::Empty {
                mask.mark_rect(region);
            }
            outcomes.push(outcome);

            if let Some(cb) = progress {
                cb(index + 1, total);
            }
        }

        Ok((page, mask, outcomes))
    }
}
