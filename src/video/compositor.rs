//! Per-frame video watermarking.
//!
//! Text on video frames uses the embedded font at a relative draw scale of
//! `font_size / 50` with a fixed stroke thickness, so a given font size
//! renders smaller on video than on still images. Layout and rasterisation
//! happen once per video; every frame then gets the same mask at the same
//! position.

use super::{BgrFrame, FrameReader, FrameWriter, VideoBackend};
use crate::constants::{DRAW_SCALE_DIVISOR, FRAME_FONT_PX, STROKE_THICKNESS};
use crate::error::WatermarkError;
use crate::output::{ensure_output_dir, output_path_for};
use crate::watermark::color::{resolve_bgr, BgrColor};
use crate::watermark::font::FontResource;
use crate::watermark::mask::CoverageMask;
use crate::watermark::position::{calculate_position, visible_window, Dimensions, PlacementPosition};
use crate::watermark::WatermarkSettings;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The frame font for `font_size`: embedded outlines at the relative draw
/// scale, thickened by the fixed stroke.
pub fn frame_font(font_size: u32) -> FontResource {
    let draw_scale = font_size as f32 / DRAW_SCALE_DIVISOR;
    FontResource::embedded(draw_scale * FRAME_FONT_PX).with_stroke(STROKE_THICKNESS)
}

/// Text layout shared by every frame of one video.
#[derive(Debug, Clone)]
pub struct FrameTextPlan {
    mask: CoverageMask,
    extent: Dimensions,
    position: PlacementPosition,
    color: BgrColor,
    alpha: f32,
}

impl FrameTextPlan {
    /// Lay out `settings` for frames of `frame` size.
    pub fn new(settings: &WatermarkSettings, frame: Dimensions) -> Self {
        let font = frame_font(settings.font_size);
        let extent = font.measure(&settings.text);
        let position = calculate_position(settings.position, &frame, &extent);

        tracing::debug!(
            font_px = font.size(),
            text_width = extent.width,
            text_height = extent.height,
            x = position.x,
            y = position.y,
            "Placed video watermark"
        );

        let mask = match visible_window(&position, &frame, &extent) {
            Some(window) => font.rasterize_window(&settings.text, window),
            None => {
                tracing::warn!(
                    x = position.x,
                    y = position.y,
                    width = frame.width,
                    height = frame.height,
                    "Watermark falls entirely outside the frame"
                );
                CoverageMask::new(0, 0)
            }
        };

        Self {
            mask,
            extent,
            position,
            color: resolve_bgr(&settings.color),
            alpha: settings.opacity as f32 / 255.0,
        }
    }

    pub fn position(&self) -> PlacementPosition {
        self.position
    }

    pub fn text_extent(&self) -> Dimensions {
        self.extent
    }

    /// Watermark one frame.
    ///
    /// The text is drawn opaquely onto a copy of the frame, and the copy is
    /// blended back as `copy * alpha + frame * (1 - alpha)`. Pixels the text
    /// does not touch come out unchanged, so only covered pixels are visited.
    pub fn apply(&self, frame: &BgrFrame) -> BgrFrame {
        let mut out = frame.clone();
        let color = self.color.to_array();

        for (mx, my, coverage) in self.mask.iter_covered() {
            let x = self.position.x + mx;
            let y = self.position.y + my;
            if x < 0 || y < 0 || x >= frame.width() as i32 || y >= frame.height() as i32 {
                continue;
            }
            let (x, y) = (x as u32, y as u32);

            let original = frame.pixel(x, y);
            let mut blended = [0u8; 3];
            for c in 0..3 {
                let base = original[c] as f32;
                let drawn = (base + (color[c] as f32 - base) * coverage).round();
                blended[c] = (drawn * self.alpha + base * (1.0 - self.alpha))
                    .round()
                    .clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(x, y, blended);
        }

        out
    }
}

/// Pump every frame from `reader` through `plan` into `writer`, in order.
/// Returns the number of frames written.
pub fn watermark_frames(
    reader: &mut dyn FrameReader,
    writer: &mut dyn FrameWriter,
    plan: &FrameTextPlan,
) -> Result<u64, WatermarkError> {
    let mut frames = 0u64;
    while let Some(frame) = reader.read_frame()? {
        writer.write_frame(&plan.apply(&frame))?;
        frames += 1;
    }
    Ok(frames)
}

/// Renders text watermarks onto videos through a [`VideoBackend`].
#[derive(Clone)]
pub struct VideoCompositor {
    backend: Arc<dyn VideoBackend>,
    output_dir: PathBuf,
}

impl std::fmt::Debug for VideoCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoCompositor")
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl VideoCompositor {
    pub fn new(backend: Arc<dyn VideoBackend>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Watermark every frame of the video at `source` and return the output
    /// path. Output keeps the source frame rate and dimensions.
    ///
    /// The source and sink are released on every path out of this function.
    pub fn render(
        &self,
        source: &Path,
        settings: &WatermarkSettings,
    ) -> Result<PathBuf, WatermarkError> {
        settings.validate()?;
        let output = output_path_for(&self.output_dir, source)?;

        let (info, mut reader) = self.backend.open_source(source)?;
        let plan = FrameTextPlan::new(settings, info.dimensions());

        ensure_output_dir(&self.output_dir)?;
        let mut writer = self.backend.open_sink(&output, &info)?;

        let result = watermark_frames(reader.as_mut(), writer.as_mut(), &plan);
        drop(reader);

        let frames = match result {
            Ok(frames) => {
                writer.finish()?;
                frames
            }
            Err(e) => {
                drop(writer);
                tracing::warn!(
                    source = %source.display(),
                    error = %e,
                    "Video watermarking aborted"
                );
                return Err(e);
            }
        };

        tracing::info!(
            source = %source.display(),
            output = %output.display(),
            width = info.width,
            height = info.height,
            fps = %info.frame_rate,
            frames,
            "Watermarked video"
        );

        Ok(output)
    }
}
