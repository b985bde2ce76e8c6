// Batch runner: a chapter directory through a bounded page pool
//
// Pages share no state, so they run concurrently up to the configured
// limit; results are indexed by input position so the report always comes
// back in original page order. Cancellation stops launching new pages and
// lets in-flight pages finish, avoiding partially written output files.

use crate::core::config::Config;
use crate::core::errors::{PipelineError, PipelineResult};
use crate::core::types::{BatchReport, PageReport, PageStatus};
use crate::orchestration::page_processor::PageProcessor;
use futures::future::join_all;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

const PAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "bmp"];

pub struct BatchRunner {
    processor: Arc<PageProcessor>,
    page_semaphore: Arc<Semaphore>,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    pub fn new(config: &Config, processor: Arc<PageProcessor>) -> Self {
        Self {
            processor,
            page_semaphore: Arc::new(Semaphore::new(config.batch.max_concurrent_pages)),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for stopping the run: no new pages are launched once set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Process every page image under `input`, writing results under
    /// `output` with the same filenames. Per-page failures never abort
    /// the batch.
    pub async fn process_dir(&self, input: &Path, output: &Path) -> PipelineResult<BatchReport> {
        let pages = list_page_images(input)?;
        info!("processing {} page(s) from {}", pages.len(), input.display());

        std::fs::create_dir_all(output).map_err(|e| PipelineError::DirUnavailable {
            path: output.display().to_string(),
            source: e,
        })?;

        let tasks = pages.into_iter().enumerate().map(|(index, path)| {
            let processor = Arc::clone(&self.processor);
            let semaphore = Arc::clone(&self.page_semaphore);
            let cancel = Arc::clone(&self.cancel);
            let out_path = output.join(path.file_name().unwrap_or_default());

            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("page semaphore closed");
                let report = run_page(&processor, &cancel, index, &path, &out_path).await;
                (index, report)
            })
        });

        let mut reports: Vec<(usize, PageReport)> = Vec::new();
        for joined in join_all(tasks).await {
            let (index, report) =
                joined.map_err(|e| PipelineError::TaskJoinFailed(e.to_string()))?;
            reports.push((index, report));
        }

        // Reassemble in original page order, not completion order
        reports.sort_by_key(|(index, _)| *index);
        let pages: Vec<PageReport> = reports.into_iter().map(|(_, r)| r).collect();

        let successful = pages
            .iter()
            .filter(|p| matches!(p.status, PageStatus::Success))
            .count();
        let failed = pages
            .iter()
            .filter(|p| matches!(p.status, PageStatus::Failed))
            .count();

        info!(
            "batch complete: {}/{} page(s) succeeded, {} failed",
            successful,
            pages.len(),
            failed
        );

        Ok(BatchReport {
            total: pages.len(),
            successful,
            failed,
            pages,
        })
    }
}

/// Process a single page file end to end. Every failure is folded into
/// the report; nothing here aborts the batch.
async fn run_page(
    processor: &PageProcessor,
    cancel: &AtomicBool,
    index: usize,
    path: &Path,
    out_path: &Path,
) -> PageReport {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if cancel.load(Ordering::Relaxed) {
        return PageReport {
            index,
            filename,
            status: PageStatus::Skipped,
            regions: 0,
            reason: Some("run cancelled".to_string()),
        };
    }

    let image = match decode_page(index, path).await {
        Ok(img) => img,
        Err(e) => {
            warn!("{e}");
            return PageReport {
                index,
                filename,
                status: PageStatus::Failed,
                regions: 0,
                reason: Some(e.to_string()),
            };
        }
    };

    let processed = match processor.process_page(image, index, None).await {
        Ok(done) => done,
        Err(e) => {
            warn!("page {index} failed: {e}");
            return PageReport {
                index,
                filename,
                status: PageStatus::Failed,
                regions: 0,
                reason: Some(e.to_string()),
            };
        }
    };

    let regions = processed.regions();
    if let Err(e) = encode_page(index, processed.image, out_path).await {
        warn!("{e}");
        return PageReport {
            index,
            filename,
            status: PageStatus::Failed,
            regions,
            reason: Some(e.to_string()),
        };
    }

    info!("page {index} done ({regions} region(s)) -> {}", out_path.display());
    PageReport {
        index,
        filename,
        status: PageStatus::Success,
        regions,
        reason: None,
    }
}

/// Decode a page off the async runtime; decoding is CPU-intensive for
/// large pages
async fn decode_page(index: usize, path: &Path) -> PipelineResult<RgbaImage> {
    let owned = path.to_path_buf();
    let decoded = tokio::task::spawn_blocking(move || image::open(&owned))
        .await
        .map_err(|e| PipelineError::TaskJoinFailed(e.to_string()))?;

    decoded
        .map(|img| img.to_rgba8())
        .map_err(|e| PipelineError::UnreadableImage {
            page_index: index,
            source: e,
        })
}

/// Encode and persist a finished page off the async runtime
async fn encode_page(index: usize, image: RgbaImage, out_path: &Path) -> PipelineResult<()> {
    let owned = out_path.to_path_buf();
    let written = tokio::task::spawn_blocking(move || image.save(&owned))
        .await
        .map_err(|e| PipelineError::TaskJoinFailed(e.to_string()))?;

    written.map_err(|e| PipelineError::WriteFailed {
        page_index: index,
        path: out_path.display().to_string(),
        source: e,
    })
}

/// Page images under `dir` in lexical filename order
fn list_page_images(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::DirUnavailable {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut pages: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| PAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    pages.sort();
    Ok(pages)
}
