// Loose-text aggregation: group page-wide OCR words into text blocks
//
// Words already covered by the balloon phase are excluded via the
// occupancy mask (center-point query), the remainder grouped by their
// OCR (block, paragraph) identifiers into concatenated blocks with a
// union bounding box.

use crate::core::config::OcrConfig;
use crate::core::errors::OcrResult;
use crate::core::mask::RegionMask;
use crate::core::types::{TextBlock, Word};
use crate::services::ocr::OcrEngine;
use image::RgbaImage;
use std::collections::HashMap;
use tracing::debug;

/// Noise filter on the grouped union box
const MIN_BLOCK_WIDTH: u32 = 20;
const MIN_BLOCK_HEIGHT: u32 = 10;

pub struct TextBlockAggregator {
    confidence_cutoff: f32,
}

impl TextBlockAggregator {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            confidence_cutoff: config.confidence_cutoff,
        }
    }

    /// Run page-wide word OCR and group the surviving words into blocks,
    /// excluding anything the balloon phase already rewrote.
    pub async fn aggregate(
        &self,
        page: &RgbaImage,
        lang: &str,
        mask: &RegionMask,
        ocr: &dyn OcrEngine,
    ) -> OcrResult<Vec<TextBlock>> {
        let words = ocr.recognize_page(page, lang).await?;
        Ok(self.group_words(words, mask))
    }

    /// Pure grouping step, separated for testability.
    pub fn group_words(&self, words: Vec<Word>, mask: &RegionMask) -> Vec<TextBlock> {
        struct Group {
            pieces: Vec<String>,
            min_x: u32,
            min_y: u32,
            max_x: u32,
            max_y: u32,
        }

        let mut order: Vec<(u32, u32)> = Vec::new();
        let mut groups: HashMap<(u32, u32), Group> = HashMap::new();
        let mut excluded = 0usize;

        for word in words {
            if word.confidence <= self.confidence_cutoff || word.text.trim().is_empty() {
                continue;
            }

            // Already translated as part of a balloon: must not be
            // processed twice
            let (cx, cy) = word.center();
            if mask.is_marked(cx, cy) {
                excluded += 1;
                continue;
            }

            let key = (word.block_id, word.paragraph_id);
            let group = groups.entry(key).or_insert_with(|| {
                order.push(key);
                Group {
                    pieces: Vec::new(),
                    min_x: u32::MAX,
                    min_y: u32::MAX,
                    max_x: 0,
                    max_y: 0,
                }
            });

            group.pieces.push(word.text.trim().to_string());
            group.min_x = group.min_x.min(word.x);
            group.min_y = group.min_y.min(word.y);
            group.max_x = group.max_x.max(word.x + word.width);
            group.max_y = group.max_y.max(word.y + word.height);
        }

        let mut blocks = Vec::new();
        for key in order {
            let group = &groups[&key];
            let width = group.max_x - group.min_x;
            let height = group.max_y - group.min_y;
            if width < MIN_BLOCK_WIDTH || height < MIN_BLOCK_HEIGHT {
                continue;
            }
            blocks.push(TextBlock {
                text: group.pieces.join(" "),
                x: group.min_x,
                y: group.min_y,
                width,
                height,
            });
        }

        debug!(
            "aggregated {} block(s), {} word(s) excluded by mask",
            blocks.len(),
            excluded
        );
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Region, RegionKind};

    fn aggregator() -> TextBlockAggregator {
        TextBlockAggregator {
            confidence_cutoff: 30.0,
        }
    }

    fn word(text: &str, x: u32, y: u32, w: u32, h: u32, conf: f32, block: u32, par: u32) -> Word {
        Word {
            text: text.to_string(),
            x,
            y,
            width: w,
            height: h,
            confidence: conf,
            block_id: block,
            paragraph_id: par,
        }
    }

    #[test]
    fn words_group_by_block_and_paragraph_with_union_box() {
        let mask = RegionMask::new(800, 600);
        let words = vec![
            word("SUDDEN", 100, 100, 60, 20, 90.0, 1, 1),
            word("NOISE", 170, 100, 50, 20, 85.0, 1, 1),
            word("ELSEWHERE", 400, 300, 90, 22, 80.0, 2, 1),
        ];

        let blocks = aggregator().group_words(words, &mask);
        assert_eq!(blocks.len(), 2);

        assert_eq!(blocks[0].text, "SUDDEN NOISE");
        assert_eq!((blocks[0].x, blocks[0].y), (100, 100));
        assert_eq!((blocks[0].width, blocks[0].height), (120, 20));

        assert_eq!(blocks[1].text, "ELSEWHERE");
    }

    #[test]
    fn masked_words_never_reach_the_output() {
        let mut mask = RegionMask::new(800, 600);
        mask.mark_rect(&Region::new(100, 100, 200, 100, RegionKind::Balloon));

        let words = vec![
            // Center (299, 125): the rectangle's last marked column
            word("INSIDE", 269, 115, 60, 20, 95.0, 1, 1),
            // Center (300, 125): one pixel past the boundary
            word("OUTSIDE", 270, 115, 60, 20, 95.0, 2, 1),
        ];

        let blocks = aggregator().group_words(words, &mask);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "OUTSIDE");
    }

    #[test]
    fn low_confidence_and_empty_words_are_dropped() {
        let mask = RegionMask::new(800, 600);
        let words = vec![
            word("GOOD", 10, 10, 60, 20, 31.0, 1, 1),
            word("NOISE", 80, 10, 60, 20, 30.0, 1, 1),
            word("   ", 150, 10, 60, 20, 99.0, 1, 1),
        ];

        let blocks = aggregator().group_words(words, &mask);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "GOOD");
    }

    #[test]
    fn tiny_union_boxes_are_discarded_as_noise() {
        let mask = RegionMask::new(800, 600);
        let words = vec![
            word("ok", 10, 10, 19, 9, 90.0, 1, 1),
            word("WIDE ENOUGH", 100, 100, 80, 24, 90.0, 2, 1),
        ];

        let blocks = aggregator().group_words(words, &mask);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "WIDE ENOUGH");
    }

    #[test]
    fn word_order_within_a_group_follows_emission_order() {
        let mask = RegionMask::new(800, 600);
        // Emission order differs from left-to-right order
        let words = vec![
            word("SECOND", 200, 10, 60, 20, 90.0, 1, 1),
            word("FIRST", 100, 10, 60, 20, 90.0, 1, 1),
        ];

        let blocks = aggregator().group_words(words, &mask);
        assert_eq!(blocks[0].text, "SECOND FIRST");
    }
}
