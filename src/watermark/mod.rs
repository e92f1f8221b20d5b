//! Text watermark primitives and the still-image compositor.
//!
//! The pieces here are shared by both media paths:
//!
//! - [`settings`]: what to draw (text, size, opacity, position, color, font)
//! - [`position`]: where the text box goes inside a frame
//! - [`color`]: named colors for the RGBA and BGR pipelines
//! - [`font`] and [`raster`]: measuring and rasterising text
//! - [`image_compositor`]: the still-image pipeline
//!
//! # Example
//!
//! ```yaml
//! defaults:
//!   text: "© Example"
//!   font_size: 36
//!   opacity: 128
//!   position: bottom_right
//!   color: white
//!   font_family: arial
//! ```

pub mod color;
pub mod font;
pub mod image_compositor;
pub mod mask;
pub mod position;
pub mod raster;
pub mod settings;

pub use color::{resolve_bgr, resolve_rgba, BgrColor, RgbaColor};
pub use font::{BuiltinFontProvider, FontProvider, FontResource, SystemFontProvider};
pub use image_compositor::ImageCompositor;
pub use mask::CoverageMask;
pub use position::{calculate_position, visible_window, Dimensions, PlacementPosition, TextWindow};
pub use settings::{Position, WatermarkSettings};
