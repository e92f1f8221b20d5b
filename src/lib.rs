// Inkstamp watermark rendering library

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod video;
pub mod watermark;

pub use engine::{Engine, MediaKind, RenderRequest};
pub use error::WatermarkError;
pub use watermark::{Position, WatermarkSettings};
