// Font resolution with a guaranteed-usable fallback
//
// Resolves the lettering face once at startup: an explicit font path when
// given and readable, otherwise the bundled default face. Sized handles
// are then resolved per candidate size during the layout fitting loop.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use std::path::Path;
use tracing::{debug, warn};

/// Bundled default face so resolution never fails, even with no font
/// database on the system
static DEFAULT_FONT_BYTES: &[u8] = include_bytes!("../../fonts/DejaVuSans.ttf");

/// An immutable resolved font at a fixed pixel size
#[derive(Clone)]
pub struct FontHandle {
    font: FontArc,
    scale: PxScale,
}

impl FontHandle {
    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn scale(&self) -> PxScale {
        self.scale
    }

    /// Measured (width, height) of a single line at this size.
    ///
    /// Width sums horizontal advances with kerning; height is the face's
    /// ascent-to-descent extent, so every line of a block measures the
    /// same height regardless of which glyphs it contains.
    pub fn measure(&self, text: &str) -> (f32, f32) {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0f32;
        let mut prev = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        let height = scaled.ascent() - scaled.descent();
        (width, height)
    }
}

pub struct FontProvider {
    face: FontArc,
}

impl FontProvider {
    /// Load the lettering face, falling back to the bundled default when
    /// the path is absent or unreadable.
    pub fn new(font_path: Option<&Path>) -> Self {
        let face = font_path.and_then(|path| match std::fs::read(path) {
            Ok(bytes) => match FontArc::try_from_vec(bytes) {
                Ok(face) => {
                    debug!("lettering font loaded from {}", path.display());
                    Some(face)
                }
                Err(e) => {
                    warn!("font {} unparseable ({e}), using bundled face", path.display());
                    None
                }
            },
            Err(e) => {
                warn!("font {} unreadable ({e}), using bundled face", path.display());
                None
            }
        });

        let face = face.unwrap_or_else(|| {
            FontArc::try_from_slice(DEFAULT_FONT_BYTES).expect("bundled font face parses")
        });

        Self { face }
    }

    /// Resolve a handle at the requested pixel size
    pub fn resolve(&self, size: f32) -> FontHandle {
        FontHandle {
            font: self.face.clone(),
            scale: PxScale::from(size.max(1.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_falls_back_to_bundled_face() {
        let provider = FontProvider::new(Some(Path::new("/nonexistent/font.ttf")));
        let handle = provider.resolve(16.0);
        let (w, h) = handle.measure("HELLO");
        assert!(w > 0.0);
        assert!(h > 0.0);
    }

    #[test]
    fn measurement_scales_with_size() {
        let provider = FontProvider::new(None);
        let (w_small, h_small) = provider.resolve(12.0).measure("WORD");
        let (w_large, h_large) = provider.resolve(24.0).measure("WORD");
        assert!(w_large > w_small * 1.8);
        assert!(h_large > h_small * 1.8);
    }

    #[test]
    fn longer_text_measures_wider() {
        let handle = FontProvider::new(None).resolve(18.0);
        let (w1, _) = handle.measure("AAAA");
        let (w2, _) = handle.measure("AAAA BBBB");
        assert!(w2 > w1);
    }
}
