//! Still image watermarking.
//!
//! Decode → RGBA → transparent overlay with the text drawn at the computed
//! position → source-over composite → drop alpha → encode next to the
//! other outputs as `watermarked_<basename>`.

use super::color::{resolve_rgba, RgbaColor};
use super::font::FontProvider;
use super::mask::CoverageMask;
use super::position::{calculate_position, visible_window, Dimensions, PlacementPosition};
use super::WatermarkSettings;
use crate::constants::DEFAULT_JPEG_QUALITY;
use crate::error::WatermarkError;
use crate::output::{ensure_output_dir, output_path_for};
use image::codecs::jpeg::JpegEncoder;
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat, Rgba, RgbImage, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Renders text watermarks onto still images.
#[derive(Clone)]
pub struct ImageCompositor {
    fonts: Arc<dyn FontProvider>,
    output_dir: PathBuf,
    jpeg_quality: u8,
}

impl std::fmt::Debug for ImageCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCompositor")
            .field("output_dir", &self.output_dir)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish()
    }
}

impl ImageCompositor {
    pub fn new(fonts: Arc<dyn FontProvider>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fonts,
            output_dir: output_dir.into(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Watermark the image at `source` and return the output path.
    ///
    /// Decode failures surface as [`WatermarkError::MediaDecode`] and leave
    /// no output file behind.
    pub fn render(
        &self,
        source: &Path,
        settings: &WatermarkSettings,
    ) -> Result<PathBuf, WatermarkError> {
        settings.validate()?;
        let output = output_path_for(&self.output_dir, source)?;

        let decoded = decode_image(source)?;
        let watermarked = self.apply(&decoded, settings);

        ensure_output_dir(&self.output_dir)?;
        save_image(&watermarked, &output, self.jpeg_quality)?;

        tracing::info!(
            source = %source.display(),
            output = %output.display(),
            width = watermarked.width(),
            height = watermarked.height(),
            "Watermarked image"
        );

        Ok(output)
    }

    /// Watermark an already decoded image, returning the flattened RGB result.
    pub fn apply(&self, image: &DynamicImage, settings: &WatermarkSettings) -> RgbImage {
        let mut base = image.to_rgba8();
        let dims = Dimensions::new(base.width(), base.height());

        let font = self.fonts.resolve(&settings.font_family, settings.font_size);
        let extent = font.measure(&settings.text);
        let position = calculate_position(settings.position, &dims, &extent);
        let color = resolve_rgba(&settings.color, settings.opacity);

        tracing::debug!(
            text_width = extent.width,
            text_height = extent.height,
            x = position.x,
            y = position.y,
            builtin_font = font.is_builtin(),
            "Placed image watermark"
        );

        let Some(window) = visible_window(&position, &dims, &extent) else {
            tracing::warn!(
                x = position.x,
                y = position.y,
                width = dims.width,
                height = dims.height,
                "Watermark falls entirely outside the image"
            );
            return DynamicImage::ImageRgba8(base).to_rgb8();
        };

        let mask = font.rasterize_window(&settings.text, window);
        let overlay = text_layer(dims, &mask, position, color);
        alpha_composite(&mut base, &overlay);

        DynamicImage::ImageRgba8(base).to_rgb8()
    }
}

fn decode_image(source: &Path) -> Result<DynamicImage, WatermarkError> {
    ImageReader::open(source)
        .map_err(|e| WatermarkError::decode(source, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| WatermarkError::decode(source, e.to_string()))?
        .decode()
        .map_err(|e| WatermarkError::decode(source, e.to_string()))
}

fn save_image(image: &RgbImage, output: &Path, jpeg_quality: u8) -> Result<(), WatermarkError> {
    let format = ImageFormat::from_path(output).unwrap_or(ImageFormat::Png);

    let result = if format == ImageFormat::Jpeg {
        let file = File::create(output)?;
        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), jpeg_quality);
        encoder.encode_image(image)
    } else {
        image.save_with_format(output, format)
    };

    result.map_err(|e| WatermarkError::encode(output, e.to_string()))
}

/// Build a transparent layer of `dims` with the text mask drawn at `position`.
///
/// Covered pixels take the text color with alpha `coverage * color.a`;
/// everything else stays fully transparent.
pub fn text_layer(
    dims: Dimensions,
    mask: &CoverageMask,
    position: PlacementPosition,
    color: RgbaColor,
) -> RgbaImage {
    let mut layer = RgbaImage::new(dims.width, dims.height);

    for (mx, my, coverage) in mask.iter_covered() {
        let x = position.x + mx;
        let y = position.y + my;
        if x < 0 || y < 0 || x >= dims.width as i32 || y >= dims.height as i32 {
            continue;
        }
        let alpha = (coverage * color.a as f32).round() as u8;
        layer.put_pixel(x as u32, y as u32, Rgba([color.r, color.g, color.b, alpha]));
    }

    layer
}

/// Composite `overlay` onto `base` in place with the "over" operator.
///
/// Both images must have the same dimensions.
pub fn alpha_composite(base: &mut RgbaImage, overlay: &RgbaImage) {
    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        if src[3] == 0 {
            continue;
        }
        *dst = blend_over(*dst, *src);
    }
}

/// Porter-Duff "over": `out = fg * a + bg * (1 - a)` with non-opaque
/// backgrounds weighted by their own alpha.
fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let result =
            (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
