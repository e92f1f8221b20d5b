//! Render entry points.
//!
//! A [`RenderRequest`] carries everything one render needs: the source path
//! and an owned snapshot of the settings. Nothing about a request lives in
//! shared state, so concurrent renders never observe each other's settings.
//!
//! [`Engine::render`] blocks for the whole decode/encode. Async callers use
//! [`Engine::render_async`], which moves the request onto tokio's blocking
//! pool.

use crate::config::EngineConfig;
use crate::error::WatermarkError;
use crate::video::{FfmpegBackend, VideoCompositor};
use crate::watermark::{ImageCompositor, SystemFontProvider, WatermarkSettings};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Which compositor handles a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify by file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// One render: a source file and the settings to apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub source: PathBuf,
    pub settings: WatermarkSettings,
}

impl RenderRequest {
    pub fn new(source: impl Into<PathBuf>, settings: WatermarkSettings) -> Self {
        Self {
            source: source.into(),
            settings,
        }
    }

    pub fn media_kind(&self) -> Result<MediaKind, WatermarkError> {
        MediaKind::from_path(&self.source).ok_or_else(|| {
            WatermarkError::UnsupportedMedia(format!(
                "{} is neither a supported image nor a supported video",
                self.source.display()
            ))
        })
    }
}

/// Both compositors behind one dispatching entry point.
#[derive(Debug, Clone)]
pub struct Engine {
    images: ImageCompositor,
    videos: VideoCompositor,
}

impl Engine {
    pub fn new(images: ImageCompositor, videos: VideoCompositor) -> Self {
        Self { images, videos }
    }

    /// System fonts and the ffmpeg backend, as configured.
    pub fn from_config(config: &EngineConfig) -> Self {
        let fonts = Arc::new(SystemFontProvider::new(config.fonts.search_paths.clone()));
        let backend = Arc::new(FfmpegBackend::from_config(&config.video));

        let images = ImageCompositor::new(fonts, config.output_dir.clone())
            .with_jpeg_quality(config.image.jpeg_quality);
        let videos = VideoCompositor::new(backend, config.output_dir.clone());
        Self::new(images, videos)
    }

    pub fn images(&self) -> &ImageCompositor {
        &self.images
    }

    pub fn videos(&self) -> &VideoCompositor {
        &self.videos
    }

    /// Render `request` on the current thread and return the output path.
    pub fn render(&self, request: &RenderRequest) -> Result<PathBuf, WatermarkError> {
        let kind = request.media_kind()?;
        tracing::debug!(source = %request.source.display(), kind = %kind, "Rendering");

        match kind {
            MediaKind::Image => self.images.render(&request.source, &request.settings),
            MediaKind::Video => self.videos.render(&request.source, &request.settings),
        }
    }

    /// Render on tokio's blocking pool.
    ///
    /// The request is moved into the worker, so the caller's settings can
    /// change while the render is in flight without affecting it.
    pub async fn render_async(&self, request: RenderRequest) -> Result<PathBuf, WatermarkError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.render(&request))
            .await
            .map_err(|e| WatermarkError::Worker(e.to_string()))?
    }
}
