//! RGBA8 pixel raster used for sources, posters and the output surface.
//!
//! **Why**: everything in the pipeline (decoded stills, video clip frames,
//! the chroma-key scratch, the composited surface) is the same 8-bit RGBA
//! layout, so one buffer type with a handful of raster ops covers all of it.
//!
//! **Used by**: sources (decoded pixels), Composition (output surface),
//! chroma-key engine (scratch), export capture.

/// Owned RGBA8 raster. 4 bytes per pixel, rows packed top-to-bottom.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    buffer: Vec<u8>,
    width: usize,
    height: usize,
}

impl Frame {
    /// Create a frame filled with transparent black.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffer: vec![0u8; width * height * 4],
            width,
            height,
        }
    }

    /// Create a frame filled with a solid color.
    pub fn solid(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let mut frame = Self::new(width, height);
        frame.fill(rgba);
        frame
    }

    /// Wrap an existing RGBA buffer. Length must be `width * height * 4`.
    pub fn from_rgba(buffer: Vec<u8>, width: usize, height: usize) -> Option<Self> {
        if buffer.len() != width * height * 4 {
            return None;
        }
        Some(Self { buffer, width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get dimensions as tuple.
    pub fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Fill the whole frame with one color.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.buffer.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Copy pixels from another frame, reusing the allocation when the
    /// dimensions already match. Used by the chroma-key scratch.
    pub fn copy_from(&mut self, other: &Frame) {
        if self.resolution() != other.resolution() {
            self.width = other.width;
            self.height = other.height;
            self.buffer.resize(other.buffer.len(), 0);
        }
        self.buffer.copy_from_slice(&other.buffer);
    }

    /// Read one pixel. Returns None outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.buffer[i], self.buffer[i + 1], self.buffer[i + 2], self.buffer[i + 3]])
    }

    /// Alpha-over one pixel onto the frame. Out-of-bounds writes are dropped.
    pub fn blend_pixel(&mut self, x: i64, y: i64, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let a = rgba[3] as f32 / 255.0;
        if a <= 0.0 {
            return;
        }
        let inv = 1.0 - a;
        for c in 0..3 {
            let below = self.buffer[i + c] as f32 / 255.0;
            let above = rgba[c] as f32 / 255.0;
            self.buffer[i + c] = ((below * inv + above * a).clamp(0.0, 1.0) * 255.0) as u8;
        }
        let below_a = self.buffer[i + 3] as f32 / 255.0;
        self.buffer[i + 3] = ((below_a * inv + a).clamp(0.0, 1.0) * 255.0) as u8;
    }

    /// Alpha-over a filled rectangle. Coordinates may extend past the frame.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: usize, h: usize, rgba: [u8; 4]) {
        for yy in 0..h as i64 {
            for xx in 0..w as i64 {
                self.blend_pixel(x + xx, y + yy, rgba);
            }
        }
    }

    /// Alpha-over `src` scaled into the destination rectangle.
    ///
    /// Nearest-neighbour resampling; `opacity` multiplies the source alpha
    /// for the whole draw. Pixels falling outside the frame are clipped.
    pub fn blit_scaled(
        &mut self,
        src: &Frame,
        dst_x: i64,
        dst_y: i64,
        dst_w: usize,
        dst_h: usize,
        opacity: f32,
    ) {
        if dst_w == 0 || dst_h == 0 || src.width == 0 || src.height == 0 {
            return;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        for yy in 0..dst_h {
            let sy = yy * src.height / dst_h;
            for xx in 0..dst_w {
                let sx = xx * src.width / dst_w;
                let si = (sy * src.width + sx) * 4;
                let a = (src.buffer[si + 3] as f32 * opacity) as u8;
                self.blend_pixel(
                    dst_x + xx as i64,
                    dst_y + yy as i64,
                    [src.buffer[si], src.buffer[si + 1], src.buffer[si + 2], a],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let frame = Frame::new(4, 3);
        assert_eq!(frame.resolution(), (4, 3));
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn test_from_rgba_rejects_bad_length() {
        assert!(Frame::from_rgba(vec![0u8; 10], 2, 2).is_none());
        assert!(Frame::from_rgba(vec![0u8; 16], 2, 2).is_some());
    }

    #[test]
    fn test_copy_from_resizes() {
        let src = Frame::solid(8, 8, [1, 2, 3, 4]);
        let mut dst = Frame::new(2, 2);
        dst.copy_from(&src);
        assert_eq!(dst.resolution(), (8, 8));
        assert_eq!(dst.pixel(7, 7), Some([1, 2, 3, 4]));
    }

    #[test]
    fn test_blend_pixel_over_opaque() {
        let mut frame = Frame::solid(1, 1, [0, 0, 0, 255]);
        frame.blend_pixel(0, 0, [255, 255, 255, 255]);
        assert_eq!(frame.pixel(0, 0), Some([255, 255, 255, 255]));

        // Half-transparent white over black lands mid-grey
        let mut frame = Frame::solid(1, 1, [0, 0, 0, 255]);
        frame.blend_pixel(0, 0, [255, 255, 255, 128]);
        let px = frame.pixel(0, 0).unwrap();
        assert!(px[0] > 120 && px[0] < 135);
    }

    #[test]
    fn test_blit_scaled_upscales() {
        // 1x1 red source into a 4x4 destination rect
        let src = Frame::solid(1, 1, [255, 0, 0, 255]);
        let mut dst = Frame::solid(4, 4, [0, 0, 0, 255]);
        dst.blit_scaled(&src, 0, 0, 4, 4, 1.0);
        assert_eq!(dst.pixel(3, 3), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_blit_scaled_clips_offscreen() {
        let src = Frame::solid(2, 2, [255, 0, 0, 255]);
        let mut dst = Frame::solid(4, 4, [0, 0, 0, 255]);
        // Mostly off the top-left corner; must not panic
        dst.blit_scaled(&src, -1, -1, 2, 2, 1.0);
        assert_eq!(dst.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(dst.pixel(1, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_blit_zero_opacity_is_noop() {
        let src = Frame::solid(2, 2, [255, 0, 0, 255]);
        let mut dst = Frame::solid(2, 2, [0, 0, 0, 255]);
        dst.blit_scaled(&src, 0, 0, 2, 2, 0.0);
        assert_eq!(dst.pixel(0, 0), Some([0, 0, 0, 255]));
    }
}
