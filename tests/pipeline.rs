// End-to-end pipeline tests with mock OCR and translation capabilities

use async_trait::async_trait;
use image::{GrayImage, Rgba, RgbaImage};
use manga_retype::core::config::{
    BatchConfig, Config, DetectionConfig, LayoutConfig, OcrConfig, TranslationConfig,
    TranslatorMode,
};
use manga_retype::core::errors::{OcrResult, TranslateResult};
use manga_retype::{
    BatchRunner, OcrEngine, PageProcessor, PageStatus, RegionOutcome, Translate, TranslateError,
    Word,
};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

const DARK: Rgba<u8> = Rgba([40, 40, 40, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn test_config() -> Config {
    Config {
        log_level: tracing::Level::INFO,
        detection: DetectionConfig {
            min_balloon_area: 3000,
        },
        ocr: OcrConfig {
            language: "eng".to_string(),
            command: "tesseract".to_string(),
            timeout_secs: 30,
            confidence_cutoff: 30.0,
        },
        translation: TranslationConfig {
            mode: TranslatorMode::Remote,
            source_lang: "auto".to_string(),
            target_lang: "en".to_string(),
            endpoint: "http://localhost:9".to_string(),
            bridge_command: None,
            timeout_secs: 5,
            max_retries: 1,
        },
        layout: LayoutConfig { font_path: None },
        batch: BatchConfig {
            max_concurrent_pages: 2,
        },
    }
}

/// OCR stub: fixed region text, fixed page word list
struct MockOcr {
    region_text: String,
    words: Vec<Word>,
}

impl MockOcr {
    fn new(region_text: &str, words: Vec<Word>) -> Self {
        Self {
            region_text: region_text.to_string(),
            words,
        }
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn recognize_region(&self, _crop: &GrayImage, _lang: &str) -> OcrResult<String> {
        Ok(self.region_text.clone())
    }

    async fn recognize_page(&self, _page: &RgbaImage, _lang: &str) -> OcrResult<Vec<Word>> {
        Ok(self.words.clone())
    }
}

/// Translator stub that records its inputs
struct MockTranslator {
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl MockTranslator {
    fn ok() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Translate for MockTranslator {
    async fn translate(&self, text: &str) -> TranslateResult<String> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail {
            Err(TranslateError::InvalidResponse("mock outage".to_string()))
        } else {
            Ok(format!("[{text}]"))
        }
    }
}

fn page_with_balloon() -> RgbaImage {
    let mut page = RgbaImage::from_pixel(400, 400, DARK);
    for y in 80..280 {
        for x in 60..260 {
            page.put_pixel(x, y, WHITE);
        }
    }
    page
}

fn word(text: &str, x: u32, y: u32, w: u32, h: u32, block: u32) -> Word {
    Word {
        text: text.to_string(),
        x,
        y,
        width: w,
        height: h,
        confidence: 90.0,
        block_id: block,
        paragraph_id: 1,
    }
}

fn processor(ocr: MockOcr, translator: MockTranslator) -> PageProcessor {
    PageProcessor::new(
        Arc::new(test_config()),
        Arc::new(ocr),
        Arc::new(translator),
    )
}

#[tokio::test]
async fn balloon_is_erased_translated_and_redrawn() {
    let processor = processor(MockOcr::new("ORIGINAL LINE", vec![]), MockTranslator::ok());

    let done = processor
        .process_page(page_with_balloon(), 0, None)
        .await
        .unwrap();

    assert_eq!(done.outcomes, vec![RegionOutcome::Drawn]);

    // Translated text was drawn in black inside the balloon
    let dark_inside = (80..280)
        .flat_map(|y| (60..260).map(move |x| (x, y)))
        .filter(|&(x, y)| done.image.get_pixel(x, y)[0] < 64)
        .count();
    assert!(dark_inside > 0, "no glyph ink inside the balloon");
}

#[tokio::test]
async fn empty_ocr_leaves_the_balloon_untouched() {
    let processor = processor(MockOcr::new("", vec![]), MockTranslator::ok());
    let original = page_with_balloon();

    let done = processor
        .process_page(original.clone(), 0, None)
        .await
        .unwrap();

    assert_eq!(done.outcomes, vec![RegionOutcome::Empty]);
    assert_eq!(done.image, original, "page mutated despite empty OCR");
}

#[tokio::test]
async fn translation_outage_falls_back_to_source_text() {
    let processor = processor(MockOcr::new("KEEP ME", vec![]), MockTranslator::failing());

    let done = processor
        .process_page(page_with_balloon(), 0, None)
        .await
        .unwrap();

    // The page still completes; the region is drawn with the source text
    assert_eq!(done.outcomes, vec![RegionOutcome::TranslateFallback]);
    let dark_inside = (80..280)
        .flat_map(|y| (60..260).map(move |x| (x, y)))
        .filter(|&(x, y)| done.image.get_pixel(x, y)[0] < 64)
        .count();
    assert!(dark_inside > 0);
}

#[tokio::test]
async fn loose_text_phase_skips_words_inside_processed_balloons() {
    // One word centered inside the balloon, one on the artwork below it
    let words = vec![
        word("INSIDE", 140, 170, 60, 20, 1),
        word("OUTSIDE", 120, 330, 80, 22, 2),
    ];
    let translator = MockTranslator::ok();
    let processor = processor(MockOcr::new("BALLOON TEXT", words), translator);

    let done = processor
        .process_page(page_with_balloon(), 0, None)
        .await
        .unwrap();

    // One balloon region plus exactly one loose block; the masked word
    // never reaches the loose-text phase
    assert_eq!(done.outcomes.len(), 2);
    assert_eq!(done.outcomes[0], RegionOutcome::Drawn);
    // The artwork under the loose block is uniformly dark, so there is
    // nothing to sample for reconstruction: degraded, still drawn
    assert_eq!(done.outcomes[1], RegionOutcome::InpaintDegraded);

    // Outlined stroke is stamped in white around the loose text
    let light_near_block = (315..360)
        .flat_map(|y| (100..230).map(move |x| (x, y)))
        .filter(|&(x, y)| done.image.get_pixel(x, y)[0] > 240)
        .count();
    assert!(light_near_block > 0, "no outline stroke over the artwork");
}

#[tokio::test]
async fn translator_receives_aggregated_block_text_not_region_ocr() {
    // Keep a second handle on the translator to inspect calls afterwards
    let translator = Arc::new(MockTranslator::ok());
    let processor = PageProcessor::new(
        Arc::new(test_config()),
        Arc::new(MockOcr::new(
            "BALLOON TEXT",
            vec![
                word("LOOSE", 100, 320, 60, 20, 7),
                word("WORDS", 170, 320, 70, 20, 7),
            ],
        )),
        Arc::clone(&translator) as Arc<dyn Translate>,
    );

    processor
        .process_page(page_with_balloon(), 0, None)
        .await
        .unwrap();

    let calls = translator.calls.lock().unwrap();
    assert!(calls.contains(&"BALLOON TEXT".to_string()));
    assert!(calls.contains(&"LOOSE WORDS".to_string()));
}

#[tokio::test]
async fn progress_fires_after_every_region() {
    let words = vec![word("OUTSIDE", 120, 330, 80, 22, 2)];
    let processor = processor(MockOcr::new("BALLOON TEXT", words), MockTranslator::ok());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    let progress: manga_retype::ProgressFn = Arc::new(move |done, total| {
        seen_cb.lock().unwrap().push((done, total));
    });

    processor
        .process_page(page_with_balloon(), 0, Some(progress))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![(1, 1), (2, 2)]);
}

#[tokio::test]
async fn batch_isolates_unreadable_pages_and_keeps_order() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    page_with_balloon()
        .save(input.path().join("01.png"))
        .unwrap();
    std::fs::write(input.path().join("02.png"), b"not an image").unwrap();
    page_with_balloon()
        .save(input.path().join("03.png"))
        .unwrap();

    let config = Arc::new(test_config());
    let processor = Arc::new(PageProcessor::new(
        Arc::clone(&config),
        Arc::new(MockOcr::new("PAGE TEXT", vec![])),
        Arc::new(MockTranslator::ok()),
    ));
    let runner = BatchRunner::new(&config, processor);

    let report = runner
        .process_dir(input.path(), output.path())
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.successful, 2);
    assert_eq!(report.failed, 1);

    // Original page order regardless of completion order
    let names: Vec<&str> = report.pages.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(names, vec!["01.png", "02.png", "03.png"]);
    assert!(matches!(report.pages[0].status, PageStatus::Success));
    assert!(matches!(report.pages[1].status, PageStatus::Failed));
    assert!(report.pages[1].reason.is_some());
    assert!(matches!(report.pages[2].status, PageStatus::Success));

    assert!(output.path().join("01.png").exists());
    assert!(!output.path().join("02.png").exists());
    assert!(output.path().join("03.png").exists());
}

#[tokio::test]
async fn cancellation_skips_unstarted_pages() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    for name in ["01.png", "02.png", "03.png", "04.png"] {
        page_with_balloon().save(input.path().join(name)).unwrap();
    }

    let config = Arc::new(test_config());
    let processor = Arc::new(PageProcessor::new(
        Arc::clone(&config),
        Arc::new(MockOcr::new("PAGE TEXT", vec![])),
        Arc::new(MockTranslator::ok()),
    ));
    let runner = BatchRunner::new(&config, processor);

    // Cancel before launching: every page is reported, none processed
    runner.cancel_flag().store(true, Ordering::Relaxed);
    let report = runner
        .process_dir(input.path(), output.path())
        .await
        .unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.successful, 0);
    assert!(report
        .pages
        .iter()
        .all(|p| matches!(p.status, PageStatus::Skipped)));
}
