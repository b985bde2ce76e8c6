// Background reconstruction under erased glyphs
//
// Builds a foreground mask of glyph strokes inside a region, then fills
// the masked pixels from surrounding texture with a fast-marching style
// sweep: mask pixels are visited in increasing distance from the known
// boundary, each reconstructed as the distance-weighted average of known
// neighbors inside a small radius.

use crate::core::errors::InpaintError;
use crate::core::types::Region;
use crate::services::detection::WHITE_PAPER_THRESHOLD;
use crate::utils::image_ops::{crop_rgba, dilate_rect, paste_rgba, threshold_binary_inv};
use image::{GrayImage, RgbaImage};
use std::collections::VecDeque;
use tracing::debug;

/// Neighborhood radius for texture sampling
const INPAINT_RADIUS: i32 = 3;

/// Square dilation applied to the glyph mask so anti-aliased stroke edges
/// are fully covered
const MASK_DILATE_SIZE: i32 = 3;

pub struct BackgroundInpainter;

impl BackgroundInpainter {
    pub fn new() -> Self {
        Self
    }

    /// Erase the glyphs inside `region`, reconstructing the paper or art
    /// behind them in place.
    ///
    /// Failures are soft for callers: on error the page raster is left
    /// untouched and the caller downgrades the region outcome instead of
    /// aborting the page.
    pub fn erase_region(&self, page: &mut RgbaImage, region: &Region) -> Result<(), InpaintError> {
        if region.width == 0 || region.height == 0 {
            return Err(InpaintError::EmptyRegion {
                width: region.width,
                height: region.height,
            });
        }

        let mut crop = crop_rgba(page, region.x, region.y, region.width, region.height);
        let gray = image::imageops::grayscale(&crop);

        // Everything darker than balloon paper is treated as glyph stroke
        let mask = threshold_binary_inv(&gray, WHITE_PAPER_THRESHOLD);
        let mask = dilate_rect(&mask, MASK_DILATE_SIZE, 1);

        let masked = mask.pixels().filter(|p| p[0] != 0).count();
        if masked == 0 {
            // Nothing to erase; the region is already clean paper
            return Ok(());
        }
        if masked == (region.width * region.height) as usize {
            // No known pixels to sample from; reconstruction is impossible
            return Err(InpaintError::MaskMismatch {
                mask_width: mask.width(),
                mask_height: mask.height(),
                width: region.width,
                height: region.height,
            });
        }

        inpaint_march(&mut crop, &mask);
        paste_rgba(page, &crop, region.x, region.y);

        debug!(
            "inpainted {} px in region {},{} {}x{}",
            masked, region.x, region.y, region.width, region.height
        );
        Ok(())
    }
}

impl Default for BackgroundInpainter {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill masked pixels from the known boundary inward.
///
/// A multi-source BFS orders unknown pixels by distance from known
/// territory; each is averaged over known pixels within INPAINT_RADIUS
/// with 1/(1+d^2) weights, then becomes known itself. Deterministic and
/// always terminates: every masked pixel is visited exactly once.
fn inpaint_march(crop: &mut RgbaImage, mask: &GrayImage) {
    let (width, height) = crop.dimensions();
    let w = width as i32;
    let h = height as i32;

    let idx = |x: i32, y: i32| (y * w + x) as usize;
    let mut unknown: Vec<bool> = mask.pixels().map(|p| p[0] != 0).collect();

    // Seed the queue with unknown pixels bordering known territory
    let mut queue = VecDeque::new();
    let mut queued = vec![false; unknown.len()];
    for y in 0..h {
        for x in 0..w {
            if !unknown[idx(x, y)] {
                continue;
            }
            let boundary = neighbors4(x, y, w, h)
                .into_iter()
                .any(|(nx, ny)| !unknown[idx(nx, ny)]);
            if boundary {
                queue.push_back((x, y));
                queued[idx(x, y)] = true;
            }
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        let mut acc = [0.0f64; 3];
        let mut weight_sum = 0.0f64;

        for dy in -INPAINT_RADIUS..=INPAINT_RADIUS {
            for dx in -INPAINT_RADIUS..=INPAINT_RADIUS {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                if unknown[idx(nx, ny)] {
                    continue;
                }
                let dist_sq = f64::from(dx * dx + dy * dy);
                if dist_sq > f64::from(INPAINT_RADIUS * INPAINT_RADIUS) {
                    continue;
                }
                let weight = 1.0 / (1.0 + dist_sq);
                let p = crop.get_pixel(nx as u32, ny as u32);
                acc[0] += weight * f64::from(p[0]);
                acc[1] += weight * f64::from(p[1]);
                acc[2] += weight * f64::from(p[2]);
                weight_sum += weight;
            }
        }

        if weight_sum > 0.0 {
            let px = crop.get_pixel_mut(x as u32, y as u32);
            px[0] = (acc[0] / weight_sum).round() as u8;
            px[1] = (acc[1] / weight_sum).round() as u8;
            px[2] = (acc[2] / weight_sum).round() as u8;
            px[3] = 255;
        }
        unknown[idx(x, y)] = false;

        for (nx, ny) in neighbors4(x, y, w, h) {
            let i = idx(nx, ny);
            if unknown[i] && !queued[i] {
                queue.push_back((nx, ny));
                queued[i] = true;
            }
        }
    }
}

fn neighbors4(x: i32, y: i32, w: i32, h: i32) -> Vec<(i32, i32)> {
    let mut out = Vec::with_capacity(4);
    for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        let nx = x + dx;
        let ny = y + dy;
        if nx >= 0 && ny >= 0 && nx < w && ny < h {
            out.push((nx, ny));
        }
    }
    out
}
