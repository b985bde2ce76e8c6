// Per-page orchestrator: balloon phase, then loose-text phase
//
// Owns the page raster exclusively for the duration of one page. The
// raster and occupancy mask are moved out of phase 1 and into phase 2,
// making the ordering dependency a data dependency. Regions within a page
// are strictly sequential; pages are parallelized by the batch runner.

use crate::core::config::Config;
use crate::core::errors::{ErrorContext, PipelineError};
use crate::core::types::{ProgressFn, RegionOutcome};
use crate::phases::balloon::BalloonPhase;
use crate::phases::loose_text::LooseTextPhase;
use crate::phases::region::RegionContext;
use crate::services::blocks::TextBlockAggregator;
use crate::services::detection::BalloonDetector;
use crate::services::fonts::FontProvider;
use crate::services::inpaint::BackgroundInpainter;
use crate::services::layout::TextLayoutEngine;
use crate::services::ocr::OcrEngine;
use crate::services::translation::Translate;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Output of one page run
pub struct ProcessedPage {
    pub image: RgbaImage,
    pub outcomes: Vec<RegionOutcome>,
}

impl ProcessedPage {
    pub fn regions(&self) -> usize {
        self.outcomes.len()
    }
}

pub struct PageProcessor {
    config: Arc<Config>,
    detector: BalloonDetector,
    aggregator: TextBlockAggregator,
    inpainter: BackgroundInpainter,
    layout: TextLayoutEngine,
    ocr: Arc<dyn OcrEngine>,
    translator: Arc<dyn Translate>,
}

impl PageProcessor {
    pub fn new(
        config: Arc<Config>,
        ocr: Arc<dyn OcrEngine>,
        translator: Arc<dyn Translate>,
    ) -> Self {
        let provider = FontProvider::new(config.layout.font_path.as_deref().map(Path::new));

        Self {
            detector: BalloonDetector::new(&config.detection),
            aggregator: TextBlockAggregator::new(&config.ocr),
            inpainter: BackgroundInpainter::new(),
            layout: TextLayoutEngine::new(provider),
            ocr,
            translator,
            config,
        }
    }

    /// Run the two-phase pipeline over one page raster.
    ///
    /// Pure with respect to its inputs aside from the injected OCR and
    /// translation capabilities. The optional progress callback fires
    /// after each region completes its state machine.
    #[instrument(skip(self, page, progress))]
    pub async fn process_page(
        &self,
        page: RgbaImage,
        page_index: usize,
        progress: Option<ProgressFn>,
    ) -> Result<ProcessedPage, PipelineError> {
        let ctx = RegionContext {
            ocr: self.ocr.as_ref(),
            translator: self.translator.as_ref(),
            inpainter: &self.inpainter,
            layout: &self.layout,
            ocr_lang: &self.config.ocr.language,
        };

        // Phase 1: balloons. The raster and the mask it produced move on
        // into phase 2.
        let balloon_phase = BalloonPhase::new(&self.detector);
        let (page, mask, balloon_outcomes) = balloon_phase
            .run(page, &ctx, progress.as_ref())
            .await
            .with_page_context(page_index)?;

        // Phase 2: loose text, excluded by phase 1's mask writes
        let loose_phase = LooseTextPhase::new(&self.aggregator);
        let (page, loose_outcomes) = loose_phase
            .run(page, &mask, &ctx, progress.as_ref(), balloon_outcomes.len())
            .await
            .with_page_context(page_index)?;

        debug!(
            "page {}: {} balloon region(s), {} loose block(s)",
            page_index,
            balloon_outcomes.len(),
            loose_outcomes.len()
        );

        let mut outcomes = balloon_outcomes;
        outcomes.extend(loose_outcomes);

        Ok(ProcessedPage {
            image: page,
            outcomes,
        })
    }
}
