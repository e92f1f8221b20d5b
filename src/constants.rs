// Rendering constants shared by the image and video compositors

/// Distance in pixels between the watermark and the nearest image edge.
pub const EDGE_MARGIN: i32 = 20;

/// Pixel size of the frame font at draw scale 1.0.
pub const FRAME_FONT_PX: f32 = 30.0;

/// Stroke thickness used by the frame text primitive, in pixels.
pub const STROKE_THICKNESS: u32 = 2;

/// Font size to draw scale divisor for the frame text primitive
/// (`draw_scale = font_size / 50`).
pub const DRAW_SCALE_DIVISOR: f32 = 50.0;

/// Prefix prepended to the source basename to build the output filename.
pub const OUTPUT_PREFIX: &str = "watermarked_";

/// Default JPEG quality for still image output.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Directory name created under the system temp dir when no output dir is configured.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "inkstamp";
