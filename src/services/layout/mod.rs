// Font-fit text layout: wrap, shrink, center, draw
//
// Fits translated text into a target region by greedy word wrapping at a
// candidate font size, shrinking the size until the wrapped block fits the
// region height or the minimum size floor is reached. Drawing centers the
// block vertically and each line horizontally; loose text gets an outline
// stroke so it stays legible over artwork.

use crate::core::errors::LayoutError;
use crate::core::types::Region;
use crate::services::fonts::{FontHandle, FontProvider};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tracing::debug;

/// Initial candidate size as a fraction of region height
const INITIAL_SIZE_RATIO: f32 = 0.4;

/// Horizontal and vertical slack kept between text and region edge
const EDGE_MARGIN: f32 = 4.0;

/// Fixed gap added below every wrapped line
const LINE_GAP: f32 = 4.0;

/// Candidate size decrement per fitting iteration
const SIZE_STEP: f32 = 2.0;

/// Hard floor: fitting accepts overflow rather than shrinking below this
const MIN_FONT_SIZE: f32 = 8.0;

/// Stroke offsets stamped around each line when outlining
const OUTLINE_OFFSETS: [(i32, i32); 8] = [
    (-2, -2),
    (-2, 2),
    (2, -2),
    (2, 2),
    (0, 2),
    (0, -2),
    (2, 0),
    (-2, 0),
];

/// A fitted block: the resolved handle and the wrapped lines
pub struct FittedText {
    pub handle: FontHandle,
    pub size: f32,
    pub lines: Vec<String>,
}

pub struct TextLayoutEngine {
    provider: FontProvider,
}

impl TextLayoutEngine {
    pub fn new(provider: FontProvider) -> Self {
        Self { provider }
    }

    /// Greedily wrap words into lines at the given handle's size.
    ///
    /// A word is tentatively appended to the current line; when the
    /// tentative line overflows the width limit the current line is
    /// closed and the word starts the next one. A single over-wide word
    /// still occupies its own line (no mid-word breaking).
    fn wrap_words(handle: &FontHandle, text: &str, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            let tentative = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            let (width, _) = handle.measure(&tentative);
            if width < max_width || current.is_empty() {
                current = tentative;
            } else {
                lines.push(current);
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// Total height of a wrapped block: per-line extent plus the fixed gap
    fn block_height(handle: &FontHandle, lines: &[String]) -> f32 {
        lines
            .iter()
            .map(|line| handle.measure(line).1 + LINE_GAP)
            .sum()
    }

    /// Iterative font-fit. Deterministic for identical inputs; terminates
    /// because the candidate size decreases monotonically to the floor.
    pub fn fit(&self, text: &str, region: &Region) -> FittedText {
        let max_width = region.width as f32 - EDGE_MARGIN;
        let max_height = region.height as f32 - EDGE_MARGIN;

        let mut size = (region.height as f32 * INITIAL_SIZE_RATIO).max(MIN_FONT_SIZE);
        loop {
            let handle = self.provider.resolve(size);
            let lines = Self::wrap_words(&handle, text, max_width);

            if Self::block_height(&handle, &lines) <= max_height
                || size - SIZE_STEP < MIN_FONT_SIZE
            {
                return FittedText {
                    handle,
                    size,
                    lines,
                };
            }
            size -= SIZE_STEP;
        }
    }

    /// Fit `text` into `region` and draw it onto the page raster.
    ///
    /// Side effect only: the page is mutated in place. With `outline` the
    /// line is first stamped in a contrasting stroke color at the eight
    /// surrounding offsets, then filled on top.
    pub fn draw_fitted(
        &self,
        page: &mut RgbaImage,
        region: &Region,
        text: &str,
        color: Rgba<u8>,
        outline: bool,
    ) -> Result<(), LayoutError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        if region.width <= EDGE_MARGIN as u32 || region.height <= EDGE_MARGIN as u32 {
            return Err(LayoutError::RegionTooSmall {
                width: region.width,
                height: region.height,
            });
        }

        let fitted = self.fit(text, region);
        let total_height = Self::block_height(&fitted.handle, &fitted.lines);
        debug!(
            "fitted {} line(s) at {:.0}px into {}x{}",
            fitted.lines.len(),
            fitted.size,
            region.width,
            region.height
        );

        let stroke = stroke_color(color);
        let mut cursor_y = region.y as f32 + (region.height as f32 - total_height) / 2.0;

        for line in &fitted.lines {
            let (line_width, line_height) = fitted.handle.measure(line);
            let x = region.x as i32 + ((region.width as f32 - line_width) / 2.0) as i32;
            let y = cursor_y as i32;

            if outline {
                for (ox, oy) in OUTLINE_OFFSETS {
                    draw_text_mut(
                        page,
                        stroke,
                        x + ox,
                        y + oy,
                        fitted.handle.scale(),
                        fitted.handle.font(),
                        line,
                    );
                }
            }
            draw_text_mut(
                page,
                color,
                x,
                y,
                fitted.handle.scale(),
                fitted.handle.font(),
                line,
            );

            cursor_y += line_height + LINE_GAP;
        }

        Ok(())
    }
}

/// Contrasting stroke color for the given fill
fn stroke_color(fill: Rgba<u8>) -> Rgba<u8> {
    let brightness = u32::from(fill[0]) + u32::from(fill[1]) + u32::from(fill[2]);
    if brightness < 382 {
        Rgba([255, 255, 255, 255])
    } else {
        Rgba([0, 0, 0, 255])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RegionKind;

    fn engine() -> TextLayoutEngine {
        TextLayoutEngine::new(FontProvider::new(None))
    }

    #[test]
    fn narrow_region_forces_wrap_and_shrink() {
        let engine = engine();
        let region = Region::new(0, 0, 60, 100, RegionKind::Balloon);

        let fitted = engine.fit("AAAA BBBB CCCC", &region);
        assert!(fitted.lines.len() >= 2, "lines: {:?}", fitted.lines);
        assert!(fitted.size < region.height as f32 * INITIAL_SIZE_RATIO);
    }

    #[test]
    fn fitting_is_deterministic() {
        let engine = engine();
        let region = Region::new(10, 10, 120, 80, RegionKind::Balloon);

        let a = engine.fit("SOME TRANSLATED LINE OF DIALOGUE", &region);
        let b = engine.fit("SOME TRANSLATED LINE OF DIALOGUE", &region);
        assert_eq!(a.lines, b.lines);
        assert_eq!(a.size, b.size);
    }

    #[test]
    fn fitting_never_goes_below_the_floor() {
        let engine = engine();
        // Tiny region with a lot of text: the loop must stop at the floor
        let region = Region::new(0, 0, 30, 16, RegionKind::LooseText);
        let text = "MANY MANY MANY MANY MANY MANY MANY WORDS";

        let fitted = engine.fit(text, &region);
        assert!(fitted.size >= MIN_FONT_SIZE);
        assert!(!fitted.lines.is_empty());
    }

    #[test]
    fn generous_region_keeps_text_on_one_line() {
        let engine = engine();
        let region = Region::new(0, 0, 600, 120, RegionKind::Balloon);

        let fitted = engine.fit("HI", &region);
        assert_eq!(fitted.lines.len(), 1);
        assert_eq!(fitted.lines[0], "HI");
    }

    #[test]
    fn wrapped_lines_preserve_word_order() {
        let engine = engine();
        let region = Region::new(0, 0, 80, 200, RegionKind::Balloon);

        let fitted = engine.fit("ONE TWO THREE FOUR", &region);
        let rejoined = fitted.lines.join(" ");
        assert_eq!(rejoined, "ONE TWO THREE FOUR");
    }

    #[test]
    fn drawing_mutates_only_inside_the_padded_region() {
        let engine = engine();
        let mut page = RgbaImage::from_pixel(200, 200, Rgba([255, 255, 255, 255]));
        let region = Region::new(50, 50, 100, 60, RegionKind::Balloon);

        engine
            .draw_fitted(&mut page, &region, "HELLO", Rgba([0, 0, 0, 255]), false)
            .unwrap();

        let mut dark = 0;
        for (x, y, p) in page.enumerate_pixels() {
            if p[0] < 128 {
                dark += 1;
                assert!(
                    x >= region.x && x < region.x + region.width,
                    "ink at {x},{y} outside region"
                );
                assert!(y >= region.y && y < region.y + region.height);
            }
        }
        assert!(dark > 0, "no glyph pixels drawn");
    }

    #[test]
    fn outline_stamps_contrasting_stroke() {
        let engine = engine();
        let mid = Rgba([128, 128, 128, 255]);
        let mut page = RgbaImage::from_pixel(200, 120, mid);
        let region = Region::new(20, 20, 160, 80, RegionKind::LooseText);

        engine
            .draw_fitted(&mut page, &region, "OVER ART", Rgba([0, 0, 0, 255]), true)
            .unwrap();

        let has_white = page.pixels().any(|p| p[0] > 240);
        let has_black = page.pixels().any(|p| p[0] < 16);
        assert!(has_white, "stroke pixels missing");
        assert!(has_black, "fill pixels missing");
    }

    #[test]
    fn empty_text_is_a_noop() {
        let engine = engine();
        let mut page = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let before = page.clone();
        let region = Region::new(10, 10, 80, 80, RegionKind::Balloon);

        engine
            .draw_fitted(&mut page, &region, "   ", Rgba([0, 0, 0, 255]), false)
            .unwrap();
        assert_eq!(page, before);
    }
}
