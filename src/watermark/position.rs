//! Placement calculation for the watermark text box.
//!
//! Given the container (image or frame) size and the measured text extent,
//! returns the top-left corner of the text's bounding box. The edge margin
//! is fixed at [`EDGE_MARGIN`]. Nothing is clamped: text larger than the
//! container yields negative coordinates, which the compositors clip.
//!
//! # Example
//!
//! ```
//! use inkstamp::watermark::position::{calculate_position, Dimensions, PlacementPosition};
//! use inkstamp::watermark::Position;
//!
//! let image = Dimensions::new(200, 100);
//! let text = Dimensions::new(40, 20);
//!
//! let pos = calculate_position(Position::TopRight, &image, &text);
//! assert_eq!(pos, PlacementPosition::new(140, 20)); // 200 - 40 - 20, 20
//! ```

use super::Position;
use crate::constants::EDGE_MARGIN;

/// Width and height in pixels, used for both the container and the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left pixel coordinates of the text's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Calculate where the text box goes inside the container.
///
/// `Center` uses floor division, so an odd leftover pixel ends up on the
/// right/bottom side. Any position name that failed to parse has already
/// become `BottomRight` by the time it reaches this function.
pub fn calculate_position(
    position: Position,
    container: &Dimensions,
    text: &Dimensions,
) -> PlacementPosition {
    let c_w = container.width as i32;
    let c_h = container.height as i32;
    let t_w = text.width as i32;
    let t_h = text.height as i32;
    let m = EDGE_MARGIN;

    match position {
        Position::TopLeft => PlacementPosition::new(m, m),
        Position::TopRight => PlacementPosition::new(c_w - t_w - m, m),
        Position::BottomLeft => PlacementPosition::new(m, c_h - t_h - m),
        Position::BottomRight => PlacementPosition::new(c_w - t_w - m, c_h - t_h - m),
        Position::Center => PlacementPosition::new(
            (c_w - t_w).div_euclid(2),
            (c_h - t_h).div_euclid(2),
        ),
    }
}

/// A rectangle inside the text box, in text-box pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextWindow {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl TextWindow {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole text box.
    pub fn full(text: &Dimensions) -> Self {
        Self::new(0, 0, text.width, text.height)
    }

    /// Grow by `by` pixels on every side.
    pub fn expand(&self, by: u32) -> Self {
        Self::new(
            self.x - by as i32,
            self.y - by as i32,
            self.width + 2 * by,
            self.height + 2 * by,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Part of the text box that lands inside the container, or `None` when
/// the text falls entirely outside it.
pub fn visible_window(
    pos: &PlacementPosition,
    container: &Dimensions,
    text: &Dimensions,
) -> Option<TextWindow> {
    let span = |offset: i32, container: u32, text: u32| -> Option<(i32, u32)> {
        let start = (-(offset as i64)).max(0);
        let end = (container as i64 - offset as i64).min(text as i64);
        (end > start).then(|| (start as i32, (end - start) as u32))
    };

    let (x, width) = span(pos.x, container.width, text.width)?;
    let (y, height) = span(pos.y, container.height, text.height)?;
    Some(TextWindow::new(x, y, width, height))
}
