//! Text rasterization onto frames.
//!
//! Glyphs come from the `font8x8` bitmap font. Each font pixel becomes a
//! square block of `GLYPH_CELL * scale` pixels, widened by `thickness / 2`
//! on every side. Drawing is clipped to the frame.

use font8x8::{UnicodeFonts, BASIC_FONTS};

use crate::frame::Frame;

/// Frame pixels per font pixel at scale 1.
pub const GLYPH_CELL: u32 = 3;

/// Font rows below the baseline.
const DESCENDER_ROWS: i64 = 1;

const GLYPH_SIZE: i64 = 8;

/// How a label is placed and drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    /// Bottom-left corner of the text (on the baseline), in frame pixels.
    pub origin: (i32, i32),
    pub scale: u32,
    pub color: [u8; 3],
    pub thickness: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            origin: (0, 0),
            scale: 1,
            color: [255, 255, 255],
            thickness: 1,
        }
    }
}

impl TextStyle {
    fn cell(&self) -> i64 {
        (GLYPH_CELL * self.scale.max(1)) as i64
    }

    /// Horizontal pen advance per character.
    pub fn advance(&self) -> i64 {
        GLYPH_SIZE * self.cell()
    }
}

/// Draw `text` onto `frame`.
///
/// Characters without a glyph advance the pen without drawing anything.
pub fn draw_text(frame: &mut Frame, text: &str, style: &TextStyle) {
    let cell = style.cell();
    let pad = (style.thickness / 2) as i64;
    let top = style.origin.1 as i64 - (GLYPH_SIZE - DESCENDER_ROWS) * cell;
    let mut pen_x = style.origin.0 as i64;

    for ch in text.chars() {
        if let Some(glyph) = BASIC_FONTS.get(ch) {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let x0 = pen_x + col * cell - pad;
                    let y0 = top + row as i64 * cell - pad;
                    fill_block(frame, x0, y0, cell + 2 * pad, style.color);
                }
            }
        }
        pen_x += style.advance();
    }
}

fn fill_block(frame: &mut Frame, x0: i64, y0: i64, size: i64, color: [u8; 3]) {
    let max_x = frame.width() as i64;
    let max_y = frame.height() as i64;
    let xs = x0.max(0)..(x0 + size).min(max_x);
    for y in y0.max(0)..(y0 + size).min(max_y) {
        for x in xs.clone() {
            frame.set_pixel(x as u32, y as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_pixels(frame: &Frame) -> Vec<(u32, u32)> {
        let mut lit = Vec::new();
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                if frame.pixel(x, y) != Some([0, 0, 0]) {
                    lit.push((x, y));
                }
            }
        }
        lit
    }

    #[test]
    fn draws_within_text_box() {
        let mut frame = Frame::zeroed(200, 100);
        let style = TextStyle {
            origin: (10, 50),
            ..TextStyle::default()
        };
        draw_text(&mut frame, "Hi", &style);

        let lit = lit_pixels(&frame);
        assert!(!lit.is_empty());
        let right = 10 + 2 * style.advance();
        let top = 50 - 7 * GLYPH_CELL as i64;
        for (x, y) in lit {
            assert!((x as i64) >= 10 && (x as i64) < right, "x={x}");
            assert!((y as i64) >= top && (y as i64) < 50 + GLYPH_CELL as i64, "y={y}");
        }
    }

    #[test]
    fn uses_requested_color() {
        let mut frame = Frame::zeroed(64, 32);
        let style = TextStyle {
            origin: (0, 24),
            color: [10, 20, 30],
            ..TextStyle::default()
        };
        draw_text(&mut frame, "A", &style);

        for (x, y) in lit_pixels(&frame) {
            assert_eq!(frame.pixel(x, y), Some([10, 20, 30]));
        }
    }

    #[test]
    fn thickness_widens_strokes() {
        let style = TextStyle {
            origin: (8, 40),
            ..TextStyle::default()
        };
        let mut thin = Frame::zeroed(64, 64);
        draw_text(&mut thin, "I", &style);
        let mut thick = Frame::zeroed(64, 64);
        draw_text(
            &mut thick,
            "I",
            &TextStyle {
                thickness: 2,
                ..style
            },
        );

        assert!(lit_pixels(&thick).len() > lit_pixels(&thin).len());
    }

    #[test]
    fn clips_at_frame_edges() {
        let mut frame = Frame::zeroed(16, 16);
        let style = TextStyle {
            origin: (-4, 30),
            scale: 2,
            thickness: 3,
            ..TextStyle::default()
        };
        draw_text(&mut frame, "WWWW", &style);
        assert!(!lit_pixels(&frame).is_empty());
    }

    #[test]
    fn blank_text_draws_nothing() {
        let mut frame = Frame::zeroed(32, 32);
        draw_text(&mut frame, "   ", &TextStyle::default());
        assert!(lit_pixels(&frame).is_empty());
    }
}
