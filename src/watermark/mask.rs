//! Glyph coverage masks.
//!
//! Text is rasterised into a `CoverageMask`: one value in `0.0..=1.0` per
//! pixel of a window onto the text's bounding box. Coordinates passed in
//! and handed out are always text-box coordinates; the mask's origin says
//! where its window starts. The compositors turn coverage into alpha.

use super::position::{Dimensions, TextWindow};

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMask {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl CoverageMask {
    /// Create an empty (fully uncovered) mask starting at the text-box origin.
    pub fn new(width: u32, height: u32) -> Self {
        Self::for_window(TextWindow::new(0, 0, width, height))
    }

    /// Create an empty mask covering `window` of the text box.
    pub fn for_window(window: TextWindow) -> Self {
        Self {
            x: window.x,
            y: window.y,
            width: window.width,
            height: window.height,
            data: vec![0.0; window.width as usize * window.height as usize],
        }
    }

    pub fn window(&self) -> TextWindow {
        TextWindow::new(self.x, self.y, self.width, self.height)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (lx, ly) = (x as i64 - self.x as i64, y as i64 - self.y as i64);
        if lx < 0 || ly < 0 || lx >= self.width as i64 || ly >= self.height as i64 {
            return None;
        }
        Some(ly as usize * self.width as usize + lx as usize)
    }

    /// Coverage at `(x, y)`; zero outside the mask.
    pub fn get(&self, x: i32, y: i32) -> f32 {
        self.index(x, y).map_or(0.0, |idx| self.data[idx])
    }

    /// Accumulate coverage at `(x, y)`, saturating at 1.0. Out-of-bounds
    /// writes are dropped.
    pub fn add(&mut self, x: i32, y: i32, coverage: f32) {
        if let Some(idx) = self.index(x, y) {
            self.data[idx] = (self.data[idx] + coverage).clamp(0.0, 1.0);
        }
    }

    /// Number of pixels with non-zero coverage.
    pub fn covered_pixels(&self) -> usize {
        self.data.iter().filter(|c| **c > 0.0).count()
    }

    /// Iterate over covered pixels as `(x, y, coverage)`.
    pub fn iter_covered(&self) -> impl Iterator<Item = (i32, i32, f32)> + '_ {
        let width = self.width.max(1) as usize;
        let (ox, oy) = (self.x, self.y);
        self.data
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0.0)
            .map(move |(i, c)| (ox + (i % width) as i32, oy + (i / width) as i32, *c))
    }
}
