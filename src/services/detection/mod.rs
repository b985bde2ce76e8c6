// Balloon detection: segment bright, geometrically regular regions
//
// Contour-based segmentation of speech balloons. Solidity (contour area
// over bounding-box area) separates a compact rounded balloon from a loose
// cluster of white speckles, which covers its bounding box sparsely.

use crate::core::config::DetectionConfig;
use crate::core::errors::{DetectionError, DetectionResult};
use crate::core::types::{Region, RegionKind};
use crate::utils::image_ops::{bounding_rect, contour_area, dilate_ellipse, threshold_binary};
use image::RgbaImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

/// Binarization cutoff that retains only the near-white paper of balloons.
/// The inpainter uses the same cutoff to separate glyph strokes from paper.
pub const WHITE_PAPER_THRESHOLD: u8 = 210;

/// Gaussian smoothing before binarization (7x7 kernel equivalent)
const BLUR_SIGMA: f32 = 1.4;

/// Elliptical dilation merging nearby bright fragments into solid blobs
const DILATE_DIAMETER: i32 = 5;
const DILATE_ITERATIONS: u32 = 2;

/// Geometry filters for a candidate balloon
const MIN_WIDTH: u32 = 50;
const MIN_HEIGHT: u32 = 25;
const MIN_SOLIDITY: f64 = 0.45;

pub struct BalloonDetector {
    min_area: u32,
}

impl BalloonDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            min_area: config.min_balloon_area,
        }
    }

    /// Segment balloon regions, ordered by ascending vertical position.
    ///
    /// Top-to-bottom by y only; panel structure and right-to-left reading
    /// order are not modeled.
    pub fn detect(&self, page: &RgbaImage) -> DetectionResult<Vec<Region>> {
        let (width, height) = page.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidImageSize { width, height });
        }

        let gray = image::imageops::grayscale(page);
        let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
        let binary = threshold_binary(&blurred, WHITE_PAPER_THRESHOLD);
        let dilated = dilate_ellipse(&binary, DILATE_DIAMETER, DILATE_ITERATIONS);

        let contours = find_contours::<u32>(&dilated);

        let mut regions = Vec::new();
        for contour in &contours {
            // External contours only; holes belong to their parent blob
            if contour.border_type != BorderType::Outer {
                continue;
            }

            let (x, y, w, h) = bounding_rect(&contour.points);
            let area = contour_area(&contour.points);

            if area < f64::from(self.min_area) || w <= MIN_WIDTH || h <= MIN_HEIGHT {
                continue;
            }

            let solidity = area / f64::from(w * h);
            if solidity <= MIN_SOLIDITY {
                debug!(
                    "rejecting scattered blob at {},{} {}x{} (solidity {:.2})",
                    x, y, w, h, solidity
                );
                continue;
            }

            let region = Region::new(x, y, w, h, RegionKind::Balloon);
            if !region.in_bounds(width, height) {
                return Err(DetectionError::RegionOutOfBounds {
                    x,
                    y,
                    width: w,
                    height: h,
                    page_width: width,
                    page_height: height,
                });
            }
            regions.push(region);
        }

        regions.sort_by_key(|r| r.y);

        debug!(
            "detected {} balloon(s) out of {} contour(s)",
            regions.len(),
            contours.len()
        );
        Ok(regions)
    }
}
