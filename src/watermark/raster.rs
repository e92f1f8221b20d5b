//! Outline text layout and windowed rasterisation.
//!
//! Text is laid out on one baseline with kerning, then only the requested
//! window of the text box is rasterised. Glyph outlines are flattened into
//! line segments and clipped to the window's columns before they reach the
//! coverage accumulator, so work and memory follow the window size rather
//! than the font size.

use super::mask::CoverageMask;
use super::position::{Dimensions, TextWindow};
use ab_glyph::{point, Font, FontArc, GlyphId, OutlineCurve, Point, PxScale, ScaleFont};
use ab_glyph_rasterizer::Rasterizer;

/// Glyphs of `text` with their pen x positions.
fn layout(font: &FontArc, text: &str, size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled_font = font.as_scaled(PxScale::from(size));
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    (glyphs, cursor_x)
}

/// Bounding box of `text`: total advance by line height, rounded up.
pub fn measure(font: &FontArc, text: &str, size: f32) -> Dimensions {
    let scaled_font = font.as_scaled(PxScale::from(size));
    let (_, width) = layout(font, text, size);
    Dimensions::new(
        width.ceil().max(0.0) as u32,
        scaled_font.height().ceil().max(0.0) as u32,
    )
}

/// Rasterise the part of `text` that falls inside `window`.
pub fn rasterize(font: &FontArc, text: &str, size: f32, window: TextWindow) -> CoverageMask {
    let mut mask = CoverageMask::for_window(window);
    if window.is_empty() {
        return mask;
    }

    let scaled_font = font.as_scaled(PxScale::from(size));
    let factor = scaled_font.scale_factor();
    let baseline_y = scaled_font.ascent();

    let (left, top) = (window.x as f32, window.y as f32);
    let (right, bottom) = (left + window.width as f32, top + window.height as f32);
    let mut raster = ClippedRasterizer::new(window.width, window.height);

    let (glyphs, _) = layout(font, text, size);
    for (glyph_id, pen_x) in glyphs {
        let Some(outline) = font.outline(glyph_id) else {
            continue;
        };

        let to_window = |p: &Point| {
            point(
                pen_x + p.x * factor.horizontal - left,
                baseline_y - p.y * factor.vertical - top,
            )
        };

        // Closed contours outside the window add nothing to it.
        let bottom_left = to_window(&outline.bounds.min);
        let top_right = to_window(&outline.bounds.max);
        if top_right.x <= 0.0
            || bottom_left.x >= right - left
            || bottom_left.y <= 0.0
            || top_right.y >= bottom - top
        {
            continue;
        }

        for curve in &outline.curves {
            match curve {
                OutlineCurve::Line(p0, p1) => raster.line(to_window(p0), to_window(p1)),
                OutlineCurve::Quad(p0, p1, p2) => {
                    raster.quad(to_window(p0), to_window(p1), to_window(p2))
                }
                OutlineCurve::Cubic(p0, p1, p2, p3) => raster.cubic(
                    to_window(p0),
                    to_window(p1),
                    to_window(p2),
                    to_window(p3),
                ),
            }
        }
    }

    raster.inner.for_each_pixel_2d(|x, y, coverage| {
        if coverage > 0.0 {
            mask.add(window.x + x as i32, window.y + y as i32, coverage.min(1.0));
        }
    });
    mask
}

/// Thicken `glyphs` by `radius` pixels on every side, reading it shifted
/// by `radius` so the result lines up with a box `2 * radius` larger.
///
/// `glyphs` must cover `window.expand(radius)` shifted by `-radius`.
pub fn dilate(glyphs: &CoverageMask, window: TextWindow, radius: u32) -> CoverageMask {
    let mut mask = CoverageMask::for_window(window);
    let r = radius as i32;

    for y in window.y..window.y + window.height as i32 {
        for x in window.x..window.x + window.width as i32 {
            let mut coverage = 0.0f32;
            for dy in -r..=r {
                for dx in -r..=r {
                    coverage = coverage.max(glyphs.get(x - r + dx, y - r + dy));
                }
            }
            if coverage > 0.0 {
                mask.add(x, y, coverage);
            }
        }
    }

    mask
}

/// Coverage accumulator that folds everything left of column 0 onto it and
/// everything right of the last column past it.
///
/// Accumulation runs left to right, so geometry left of the window still
/// counts in full and geometry right of it never reaches a window pixel.
struct ClippedRasterizer {
    inner: Rasterizer,
    width: f32,
}

impl ClippedRasterizer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Rasterizer::new(width as usize, height as usize),
            width: width as f32,
        }
    }

    fn line(&mut self, p0: Point, p1: Point) {
        let dx = p1.x - p0.x;
        let mut cuts = [0.0f32, 1.0, 1.0, 1.0];
        let mut count = 1;
        if dx != 0.0 {
            for edge in [0.0, self.width] {
                let t = (edge - p0.x) / dx;
                if t > 0.0 && t < 1.0 {
                    cuts[count] = t;
                    count += 1;
                }
            }
        }
        cuts[1..count].sort_by(|a, b| a.total_cmp(b));
        cuts[count] = 1.0;

        let at = |t: f32| {
            let x = p0.x + dx * t;
            point(x.clamp(0.0, self.width), p0.y + (p1.y - p0.y) * t)
        };
        for piece in cuts[..=count].windows(2) {
            self.inner.draw_line(at(piece[0]), at(piece[1]));
        }
    }

    fn quad(&mut self, p0: Point, p1: Point, p2: Point) {
        let deviation = second_difference(p0, p1, p2);
        let steps = segments_for(deviation);
        let mut prev = p0;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            let mt = 1.0 - t;
            let next = point(
                mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
                mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
            );
            self.line(prev, next);
            prev = next;
        }
    }

    fn cubic(&mut self, p0: Point, p1: Point, p2: Point, p3: Point) {
        let deviation = second_difference(p0, p1, p2).max(second_difference(p1, p2, p3));
        let steps = segments_for(deviation * 1.5);
        let mut prev = p0;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            let mt = 1.0 - t;
            let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
            let next = point(
                a * p0.x + b * p1.x + c * p2.x + d * p3.x,
                a * p0.y + b * p1.y + c * p2.y + d * p3.y,
            );
            self.line(prev, next);
            prev = next;
        }
    }
}

/// Length of `p0 - 2 p1 + p2`, how far a curve bends away from its chord.
fn second_difference(p0: Point, p1: Point, p2: Point) -> f32 {
    let x = p0.x - 2.0 * p1.x + p2.x;
    let y = p0.y - 2.0 * p1.y + p2.y;
    (x * x + y * y).sqrt()
}

/// Line segments needed to keep flattening error well under a pixel.
fn segments_for(deviation: f32) -> usize {
    1 + (3.0 * deviation).sqrt().floor().min(4096.0) as usize
}
