//! Video watermarking.
//!
//! Frames are decoded to raw BGR24, watermarked one by one in stream order
//! and re-encoded. The decode/encode side is behind [`VideoBackend`] so the
//! compositor loop can run against the real `ffmpeg` pipes or an in-memory
//! stream.
//!
//! - [`probe`]: stream metadata through `ffprobe`
//! - [`ffmpeg`]: frame source and sink over `ffmpeg` raw-video pipes
//! - [`compositor`]: per-frame text overlay and blending
//! - [`memory`]: in-memory backend

pub mod compositor;
pub mod ffmpeg;
pub mod memory;
pub mod probe;

pub use compositor::{frame_font, watermark_frames, FrameTextPlan, VideoCompositor};
pub use ffmpeg::{FfmpegBackend, FfmpegFrameReader, FfmpegFrameWriter};
pub use memory::MemoryVideoBackend;
pub use probe::{probe_video, FrameRate, VideoInfo};

use crate::error::WatermarkError;
use std::path::Path;

/// One decoded frame, packed B, G, R bytes, row-major without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BgrFrame {
    /// A black frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; Self::byte_len(width, height)],
        }
    }

    /// A frame filled with one B, G, R value.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(Self::byte_len(width, height));
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&bgr);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap raw bytes; `None` if the length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != Self::byte_len(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Bytes needed for a `width` x `height` BGR24 frame.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&bgr);
    }
}

/// Pulls decoded frames in stream order.
pub trait FrameReader {
    /// Next frame, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<BgrFrame>, WatermarkError>;
}

/// Accepts frames for encoding in the order they are written.
pub trait FrameWriter {
    fn write_frame(&mut self, frame: &BgrFrame) -> Result<(), WatermarkError>;

    /// Flush and close the output. Dropping a writer without calling this
    /// releases its resources but may leave an incomplete file.
    fn finish(self: Box<Self>) -> Result<(), WatermarkError>;
}

/// Opens frame sources and sinks for paths.
pub trait VideoBackend: Send + Sync {
    fn open_source(
        &self,
        path: &Path,
    ) -> Result<(VideoInfo, Box<dyn FrameReader>), WatermarkError>;

    fn open_sink(
        &self,
        path: &Path,
        info: &VideoInfo,
    ) -> Result<Box<dyn FrameWriter>, WatermarkError>;
}
