//! Drawing targets.
//!
//! The effects layer only talks to the [`Surface`] trait.  [`Canvas`] is the
//! software framebuffer that the window presents; tests can substitute a
//! recording surface to check draw order.

use pose_stream::Point;

use crate::color::Rgb;
use crate::font;

/// Everything the compositor needs from a render target.
///
/// Coordinates may fall outside the target; implementations clip.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (usize, usize);

    /// Paint the whole surface.
    fn fill(&mut self, color: Rgb);

    /// Solid disc.
    fn fill_circle(&mut self, center: Point, radius: i32, color: Rgb);

    /// Ring of `width` pixels drawn inward from `radius`.
    fn stroke_circle(&mut self, center: Point, radius: i32, width: i32, color: Rgb);

    /// Straight segment `width` pixels thick.
    fn draw_line(&mut self, from: Point, to: Point, width: i32, color: Rgb);

    /// Bitmap text with its top-left corner at `(x, y)`.
    fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: Rgb);
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas: packed ARGB framebuffer
// ════════════════════════════════════════════════════════════════════════════

/// Row-major 0xAARRGGBB pixel buffer, the layout minifb expects.
#[derive(Clone, Debug)]
pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            buf: vec![Rgb::BLACK.to_argb(); width * height],
        }
    }

    pub fn width(&self) -> usize  { self.width }
    pub fn height(&self) -> usize { self.height }

    /// Raw pixels for presenting.
    pub fn pixels(&self) -> &[u32] {
        &self.buf
    }

    /// Color at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| Rgb::from_argb(self.buf[i]))
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = color.to_argb();
        }
    }

    /// Axis-aligned filled rectangle, clipped.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        let (cw, ch) = (self.width as i32, self.height as i32);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(cw);
        let y1 = y.saturating_add(h).min(ch);
        let argb = color.to_argb();
        for row in y0..y1 {
            let start = row as usize * self.width;
            for col in x0..x1 {
                self.buf[start + col as usize] = argb;
            }
        }
    }

    /// Rectangle outline, one pixel wide.
    pub fn draw_border(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        if w <= 0 || h <= 0 { return; }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Visit every pixel in the clipped bounding box of a circle whose
    /// squared distance from the centre lies in `(inner_sq, outer_sq]`.
    fn circle_span(&mut self, c: Point, radius: i32, inner_sq: i64, color: Rgb) {
        if radius <= 0 { return; }
        let outer_sq = radius as i64 * radius as i64;
        let (cw, ch) = (self.width as i32, self.height as i32);
        let y0 = c.y.saturating_sub(radius).max(0);
        let y1 = c.y.saturating_add(radius).min(ch - 1);
        let x0 = c.x.saturating_sub(radius).max(0);
        let x1 = c.x.saturating_add(radius).min(cw - 1);
        let argb = color.to_argb();
        for y in y0..=y1 {
            let dy = (y - c.y) as i64;
            for x in x0..=x1 {
                let dx = (x - c.x) as i64;
                let d = dx * dx + dy * dy;
                if d <= outer_sq && d > inner_sq {
                    self.buf[y as usize * self.width + x as usize] = argb;
                }
            }
        }
    }
}

impl Surface for Canvas {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn fill(&mut self, color: Rgb) {
        self.buf.fill(color.to_argb());
    }

    fn fill_circle(&mut self, center: Point, radius: i32, color: Rgb) {
        self.circle_span(center, radius, -1, color);
    }

    fn stroke_circle(&mut self, center: Point, radius: i32, width: i32, color: Rgb) {
        let inner = (radius - width.max(1)).max(0) as i64;
        let inner_sq = if inner == 0 { -1 } else { inner * inner };
        self.circle_span(center, radius, inner_sq, color);
    }

    fn draw_line(&mut self, from: Point, to: Point, width: i32, color: Rgb) {
        let width = width.max(1);
        let half = width / 2;
        // Bresenham, stamping a width×width square at each step.
        let (mut x, mut y) = (from.x, from.y);
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.fill_rect(x - half, y - half, width, width, color);
            if x == to.x && y == to.y { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: Rgb) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            if cx >= self.width as i32 { break; }
            for (row, &bits) in font::glyph(ch).iter().enumerate() {
                for col in 0..font::GLYPH_W {
                    if bits & (1 << (font::GLYPH_W - 1 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row as i32 * scale, scale, scale, color);
                    }
                }
            }
            cx += font::ADVANCE * scale;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
