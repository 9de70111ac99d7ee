//! Minimal 5x7 glyph rasterizer for on-canvas labels.
//!
//! Only used to stamp a file name onto placeholder rectangles, so the
//! charset is deliberately small: A-Z (lowercase folds up), digits, and
//! the characters common in file names. Anything else renders as a
//! filled block.

use crate::entities::frame::Frame;

pub const GLYPH_WIDTH: usize = 5;
pub const GLYPH_HEIGHT: usize = 7;

/// Horizontal advance between glyphs, in glyph pixels.
const ADVANCE: usize = GLYPH_WIDTH + 1;

/// Fallback for characters outside the charset.
const BLOCK: [u8; 7] = [0x1F, 0x1F, 0x1F, 0x1F, 0x1F, 0x1F, 0x1F];

/// 5x7 bitmaps, bit 4 = leftmost column.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x1B, 0x11],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        ' ' => [0x00; 7],
        _ => BLOCK,
    }
}

/// Stamp `text` onto the frame at (x, y), top-left anchored.
///
/// `px` is the pixel size of one glyph cell. Off-frame pixels are clipped
/// by the underlying blend.
pub fn draw_label(frame: &mut Frame, x: i64, y: i64, text: &str, rgba: [u8; 4], px: usize) {
    let px = px.max(1);
    for (i, c) in text.chars().enumerate() {
        let origin_x = x + (i * ADVANCE * px) as i64;
        let bitmap = glyph(c);
        for (row, bits) in bitmap.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    frame.fill_rect(
                        origin_x + (col * px) as i64,
                        y + (row * px) as i64,
                        px,
                        px,
                        rgba,
                    );
                }
            }
        }
    }
}

/// Pixel width of a rendered label.
pub fn label_width(text: &str, px: usize) -> usize {
    text.chars().count() * ADVANCE * px.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_marks_pixels() {
        let mut frame = Frame::solid(64, 16, [0, 0, 0, 255]);
        draw_label(&mut frame, 1, 1, "A.1", [255, 255, 255, 255], 1);
        let lit = frame
            .buffer()
            .chunks_exact(4)
            .filter(|px| px[0] == 255)
            .count();
        assert!(lit > 10, "expected glyph pixels, got {}", lit);
    }

    #[test]
    fn test_label_clips_at_edges() {
        let mut frame = Frame::solid(4, 4, [0, 0, 0, 255]);
        // Way larger than the frame; must not panic
        draw_label(&mut frame, -3, -3, "WWWW", [255, 255, 255, 255], 3);
    }

    #[test]
    fn test_label_width() {
        assert_eq!(label_width("abc", 1), 3 * 6);
        assert_eq!(label_width("abc", 2), 3 * 12);
        assert_eq!(label_width("", 1), 0);
    }
}
