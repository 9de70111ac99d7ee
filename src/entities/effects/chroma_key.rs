//! Chroma key (green/blue screen) effect.
//!
//! **Algorithm**, per pixel:
//!
//! 1. `diff` = Euclidean distance to the target color in RGB space,
//!    normalized by the maximum possible distance sqrt(255^2 * 3).
//! 2. `diff < tolerance` -> fully transparent.
//! 3. `diff < tolerance + 0.05` -> alpha ramps linearly from 0 to 255
//!    across the band (feathered edge, avoids hard jagged cutouts).
//! 4. Otherwise the pixel is left untouched.
//!
//! RGB channels are always preserved; only alpha changes. The engine owns
//! one reusable scratch frame, resized on demand, so steady-state keying
//! allocates nothing.

use crate::entities::frame::Frame;

/// Width of the feather band above the hard-cut threshold.
pub const FEATHER_BAND: f32 = 0.05;

/// Maximum RGB-space distance: sqrt(255^2 * 3).
const MAX_DISTANCE: f32 = 441.672_96;

/// Keyer with a reusable scratch buffer.
#[derive(Clone, Debug, Default)]
pub struct ChromaKeyEngine {
    scratch: Frame,
}

impl ChromaKeyEngine {
    pub fn new() -> Self {
        Self { scratch: Frame::new(0, 0) }
    }

    /// Key `frame` against `target`, returning a view of the scratch frame
    /// with near-matching pixels made transparent.
    ///
    /// Pure over the input; the input frame is never modified.
    pub fn apply(&mut self, frame: &Frame, target: [u8; 3], tolerance: f32) -> &Frame {
        self.scratch.copy_from(frame);

        let tr = target[0] as f32;
        let tg = target[1] as f32;
        let tb = target[2] as f32;

        for px in self.scratch.buffer_mut().chunks_exact_mut(4) {
            let dr = px[0] as f32 - tr;
            let dg = px[1] as f32 - tg;
            let db = px[2] as f32 - tb;
            let diff = (dr * dr + dg * dg + db * db).sqrt() / MAX_DISTANCE;

            if diff < tolerance {
                px[3] = 0;
            } else if diff < tolerance + FEATHER_BAND {
                let t = (diff - tolerance) / FEATHER_BAND;
                px[3] = (t * 255.0) as u8;
            }
            // Beyond the band: untouched.
        }

        &self.scratch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: [u8; 3] = [0, 255, 0];

    fn single_pixel(rgba: [u8; 4]) -> Frame {
        Frame::solid(1, 1, rgba)
    }

    fn keyed_alpha(rgba: [u8; 4], target: [u8; 3], tolerance: f32) -> u8 {
        let mut engine = ChromaKeyEngine::new();
        let out = engine.apply(&single_pixel(rgba), target, tolerance);
        out.pixel(0, 0).unwrap()[3]
    }

    /// Exact target color match must be fully transparent for any
    /// positive tolerance.
    #[test]
    fn test_exact_match_is_transparent() {
        assert_eq!(keyed_alpha([0, 255, 0, 255], GREEN, 0.1), 0);
        assert_eq!(keyed_alpha([0, 255, 0, 255], GREEN, 0.001), 0);
        assert_eq!(keyed_alpha([200, 30, 90, 255], [200, 30, 90], 0.5), 0);
    }

    /// Pixels beyond tolerance + feather keep both RGB and alpha.
    #[test]
    fn test_far_pixels_untouched() {
        let mut engine = ChromaKeyEngine::new();
        let red = single_pixel([255, 0, 0, 255]);
        let out = engine.apply(&red, GREEN, 0.1);
        assert_eq!(out.pixel(0, 0), Some([255, 0, 0, 255]));

        // Semi-transparent input alpha survives too
        assert_eq!(keyed_alpha([255, 0, 0, 77], GREEN, 0.1), 77);
    }

    /// RGB is preserved even for pixels inside the keyed band.
    #[test]
    fn test_rgb_preserved_in_band() {
        let mut engine = ChromaKeyEngine::new();
        let near_green = single_pixel([10, 250, 10, 255]);
        let out = engine.apply(&near_green, GREEN, 0.3);
        let px = out.pixel(0, 0).unwrap();
        assert_eq!(&px[..3], &[10, 250, 10]);
        assert_eq!(px[3], 0);
    }

    /// Inside the feather band alpha increases strictly with distance.
    #[test]
    fn test_feather_monotonic() {
        let tolerance = 0.1;
        // Walk away from green along the red axis; distance grows with r.
        let mut last_alpha = None;
        let mut in_band = 0;
        for r in 0..=255u8 {
            let dr = r as f32;
            let diff = (dr * dr + 0.0 + 0.0).sqrt() / 441.672_96;
            if diff > tolerance && diff < tolerance + FEATHER_BAND {
                let alpha = keyed_alpha([r, 255, 0, 255], GREEN, tolerance);
                if let Some(prev) = last_alpha {
                    assert!(alpha > prev, "alpha must strictly increase in the band");
                }
                last_alpha = Some(alpha);
                in_band += 1;
            }
        }
        assert!(in_band >= 3, "test must actually sample the feather band");
    }

    /// Applying the keyer twice to an opaque non-matching frame is a no-op.
    #[test]
    fn test_idempotent_on_opaque() {
        let mut engine = ChromaKeyEngine::new();
        let frame = Frame::solid(4, 4, [200, 20, 20, 255]);
        let once = engine.apply(&frame, GREEN, 0.1).clone();
        let twice = engine.apply(&once, GREEN, 0.1).clone();
        assert_eq!(once, twice);
        assert_eq!(once, frame);
    }

    /// Scratch resizes on demand and is reused across calls.
    #[test]
    fn test_scratch_resizes() {
        let mut engine = ChromaKeyEngine::new();
        let small = Frame::solid(2, 2, [0, 255, 0, 255]);
        let large = Frame::solid(8, 8, [0, 255, 0, 255]);
        assert_eq!(engine.apply(&small, GREEN, 0.1).resolution(), (2, 2));
        assert_eq!(engine.apply(&large, GREEN, 0.1).resolution(), (8, 8));
        assert_eq!(engine.apply(&small, GREEN, 0.1).resolution(), (2, 2));
    }
}
