//! Placeholder images for failed try-on requests.
//!
//! A failure is drawn as a warning card: a red cross, the error message
//! word-wrapped and centered beneath it, and an optional retry hint. Text
//! uses the 8x8 `font8x8` bitmap glyphs scaled up, so measured widths are
//! exact and no font files are needed at runtime.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_polygon_mut},
    point::Point,
    rect::Rect,
};

const GLYPH_SIZE: u32 = 8;

/// Fixed geometry and colors of the placeholder card.
#[derive(Debug, Clone)]
pub struct PlaceholderLayout {
    pub width: u32,
    pub height: u32,
    pub background: Rgb<u8>,
    pub cross_color: Rgb<u8>,
    /// Bounding box of the cross as `(left, top, right, bottom)`.
    pub cross_bounds: (i32, i32, i32, i32),
    pub cross_stroke: u32,
    pub text_color: Rgb<u8>,
    pub max_line_chars: usize,
    pub max_lines: usize,
    pub text_top: u32,
    pub line_height: u32,
    pub glyph_scale: u32,
    pub retry_hint: Option<String>,
    pub hint_color: Rgb<u8>,
    pub hint_gap: u32,
}

impl Default for PlaceholderLayout {
    fn default() -> Self {
        Self {
            width: 768,
            height: 1024,
            background: Rgb([0xFF, 0xF3, 0xCD]),
            cross_color: Rgb([0xDC, 0x35, 0x45]),
            cross_bounds: (350, 450, 420, 520),
            cross_stroke: 10,
            text_color: Rgb([0x85, 0x64, 0x04]),
            max_line_chars: 45,
            max_lines: 6,
            text_top: 550,
            line_height: 28,
            glyph_scale: 2,
            retry_hint: Some("Please try again in 1-2 minutes".to_string()),
            hint_color: Rgb([0x00, 0x7B, 0xFF]),
            hint_gap: 20,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorRenderer {
    layout: PlaceholderLayout,
}

impl ErrorRenderer {
    pub fn new(layout: PlaceholderLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &PlaceholderLayout {
        &self.layout
    }

    pub fn wrap(&self, message: &str) -> Vec<String> {
        wrap_words(message, self.layout.max_line_chars, self.layout.max_lines)
    }

    pub fn text_width(&self, line: &str) -> u32 {
        line.chars().count() as u32 * GLYPH_SIZE * self.layout.glyph_scale
    }

    pub fn render(&self, message: &str) -> DynamicImage {
        let layout = &self.layout;
        let mut canvas = RgbImage::from_pixel(layout.width, layout.height, layout.background);

        let (left, top, right, bottom) = layout.cross_bounds;
        let stroke = layout.cross_stroke as f32;
        draw_stroke(&mut canvas, (left, top), (right, bottom), stroke, layout.cross_color);
        draw_stroke(&mut canvas, (right, top), (left, bottom), stroke, layout.cross_color);

        let mut y = layout.text_top;
        for line in self.wrap(message) {
            self.draw_centered(&mut canvas, &line, y, layout.text_color);
            y += layout.line_height;
        }

        if let Some(hint) = &layout.retry_hint {
            self.draw_centered(&mut canvas, hint, y + layout.hint_gap, layout.hint_color);
        }

        DynamicImage::ImageRgb8(canvas)
    }

    fn draw_centered(&self, canvas: &mut RgbImage, line: &str, y: u32, color: Rgb<u8>) {
        let width = self.text_width(line);
        let x = self.layout.width.saturating_sub(width) / 2;
        draw_text(canvas, line, x, y, self.layout.glyph_scale, color);
    }
}

/// Greedy word wrap. Words longer than `max_chars` are split so no line
/// exceeds it; text beyond `max_lines` is dropped.
pub fn wrap_words(message: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    let pieces = message.split_whitespace().flat_map(|word| {
        let chars: Vec<char> = word.chars().collect();
        chars
            .chunks(max_chars)
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
    });

    for piece in pieces {
        if lines.len() >= max_lines {
            break;
        }
        let piece_len = piece.chars().count();
        if current_len == 0 {
            current = piece;
            current_len = piece_len;
        } else if current_len + 1 + piece_len > max_chars {
            lines.push(std::mem::replace(&mut current, piece));
            current_len = piece_len;
        } else {
            current.push(' ');
            current.push_str(&piece);
            current_len += 1 + piece_len;
        }
    }

    if current_len > 0 && lines.len() < max_lines {
        lines.push(current);
    }
    lines
}

fn draw_stroke(
    canvas: &mut RgbImage,
    from: (i32, i32),
    to: (i32, i32),
    width: f32,
    color: Rgb<u8>,
) {
    let (dx, dy) = ((to.0 - from.0) as f32, (to.1 - from.1) as f32);
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return;
    }
    let half = width / 2.0;
    let (nx, ny) = (-dy / length * half, dx / length * half);
    let corner = |x: i32, y: i32, sign: f32| {
        Point::new(
            (x as f32 + sign * nx).round() as i32,
            (y as f32 + sign * ny).round() as i32,
        )
    };
    let polygon = [
        corner(from.0, from.1, 1.0),
        corner(to.0, to.1, 1.0),
        corner(to.0, to.1, -1.0),
        corner(from.0, from.1, -1.0),
    ];
    draw_polygon_mut(canvas, &polygon, color);
}

fn draw_text(canvas: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let advance = GLYPH_SIZE * scale;
    for (index, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = x + index as u32 * advance;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + col * scale;
                let py = y + row as u32 * scale;
                draw_filled_rect_mut(
                    canvas,
                    Rect::at(px as i32, py as i32).of_size(scale, scale),
                    color,
                );
            }
        }
    }
}
