//! Font resolution and text measurement.
//!
//! The compositors never look for font files themselves. They ask a
//! [`FontProvider`] for a [`FontResource`] and use it to measure and
//! rasterise text. [`SystemFontProvider`] probes an ordered list of font
//! paths and falls back to the embedded font; it never fails.

use super::mask::CoverageMask;
use super::position::{Dimensions, TextWindow};
use super::raster;
use ab_glyph::FontArc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Embedded font (DejaVu Sans Mono), used whenever no font file loads.
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

static EMBEDDED_FONT: OnceLock<FontArc> = OnceLock::new();

/// The embedded font, parsed once.
pub fn embedded_font() -> FontArc {
    EMBEDDED_FONT
        .get_or_init(|| {
            FontArc::try_from_slice(EMBEDDED_FONT_DATA)
                .expect("Failed to load embedded font - this is a bug")
        })
        .clone()
}

/// A font resolved at a concrete pixel size.
#[derive(Clone)]
pub struct FontResource {
    font: FontArc,
    size: f32,
    stroke: u32,
    source: Option<PathBuf>,
}

impl fmt::Debug for FontResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontResource")
            .field("size", &self.size)
            .field("stroke", &self.stroke)
            .field("source", &self.source)
            .finish()
    }
}

impl FontResource {
    /// The embedded font at `size` pixels.
    pub fn builtin(size: u32) -> Self {
        Self::embedded(size as f32)
    }

    /// The embedded font at a fractional pixel size.
    pub fn embedded(size: f32) -> Self {
        Self {
            font: embedded_font(),
            size,
            stroke: 0,
            source: None,
        }
    }

    pub fn outline(font: FontArc, size: u32, source: impl Into<PathBuf>) -> Self {
        Self {
            font,
            size: size as f32,
            stroke: 0,
            source: Some(source.into()),
        }
    }

    /// Thicken every glyph by a stroke of `thickness` pixels.
    ///
    /// The stroke is split evenly around the outline, so the text box grows
    /// by the same amount in both directions.
    pub fn with_stroke(mut self, thickness: u32) -> Self {
        self.stroke = thickness;
        self
    }

    pub fn is_builtin(&self) -> bool {
        self.source.is_none()
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// File the outlines were loaded from; `None` for the embedded font.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn stroke_radius(&self) -> u32 {
        (self.stroke + 1) / 2
    }

    /// Measure the bounding box of `text` in pixels.
    pub fn measure(&self, text: &str) -> Dimensions {
        let glyphs = raster::measure(&self.font, text, self.size);
        if glyphs.width == 0 {
            return glyphs;
        }
        let grow = 2 * self.stroke_radius();
        Dimensions::new(glyphs.width + grow, glyphs.height + grow)
    }

    /// Rasterise `text` into a mask the size of [`measure`](Self::measure).
    pub fn rasterize(&self, text: &str) -> CoverageMask {
        self.rasterize_window(text, TextWindow::full(&self.measure(text)))
    }

    /// Rasterise only `window` of the text box.
    pub fn rasterize_window(&self, text: &str, window: TextWindow) -> CoverageMask {
        let radius = self.stroke_radius();
        if radius == 0 {
            return raster::rasterize(&self.font, text, self.size, window);
        }

        let shift = radius as i32;
        let outline_window = window.expand(radius);
        let glyphs = raster::rasterize(
            &self.font,
            text,
            self.size,
            TextWindow::new(
                outline_window.x - shift,
                outline_window.y - shift,
                outline_window.width,
                outline_window.height,
            ),
        );
        raster::dilate(&glyphs, window, radius)
    }
}

/// Capability that turns a family name and pixel size into a font.
///
/// Implementations must not fail: when nothing better is available they
/// return [`FontResource::builtin`].
pub trait FontProvider: Send + Sync {
    fn resolve(&self, family: &str, size: u32) -> FontResource;
}

/// Provider that always hands out the embedded font.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFontProvider;

impl FontProvider for BuiltinFontProvider {
    fn resolve(&self, _family: &str, size: u32) -> FontResource {
        FontResource::builtin(size)
    }
}

/// Why a font file could not be used. Only ever logged.
#[derive(Debug)]
enum FontLoadError {
    Unreadable(std::io::Error),
    Invalid,
}

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontLoadError::Unreadable(e) => write!(f, "unreadable font file: {}", e),
            FontLoadError::Invalid => write!(f, "not a valid TrueType/OpenType font"),
        }
    }
}

/// Probes font files on disk in a fixed order.
///
/// Paths whose file name contains the requested family (ignoring case) are
/// tried first, then the configured order. Parsed fonts are cached per path.
pub struct SystemFontProvider {
    search_paths: Vec<PathBuf>,
    cache: RwLock<HashMap<PathBuf, FontArc>>,
}

impl fmt::Debug for SystemFontProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemFontProvider")
            .field("search_paths", &self.search_paths)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

impl Default for SystemFontProvider {
    fn default() -> Self {
        Self::new(Self::default_search_paths())
    }
}

impl SystemFontProvider {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Common locations on Linux, macOS and Windows, bold faces first.
    pub fn default_search_paths() -> Vec<PathBuf> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Arial.ttf",
            "/Windows/Fonts/arial.ttf",
        ]
        .iter()
        .map(PathBuf::from)
        .collect()
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Search order for `family`.
    fn candidates(&self, family: &str) -> Vec<&PathBuf> {
        let family = family.trim().to_lowercase();
        let matches_family = |path: &&PathBuf| {
            !family.is_empty()
                && path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_lowercase().contains(&family))
                    .unwrap_or(false)
        };

        let (preferred, rest): (Vec<&PathBuf>, Vec<&PathBuf>) =
            self.search_paths.iter().partition(matches_family);
        preferred.into_iter().chain(rest).collect()
    }

    fn load(&self, path: &Path) -> Result<FontArc, FontLoadError> {
        if let Some(font) = self.cache.read().get(path) {
            return Ok(font.clone());
        }

        let data = std::fs::read(path).map_err(FontLoadError::Unreadable)?;
        let font = FontArc::try_from_vec(data).map_err(|_| FontLoadError::Invalid)?;
        self.cache.write().insert(path.to_path_buf(), font.clone());
        Ok(font)
    }
}

impl FontProvider for SystemFontProvider {
    fn resolve(&self, family: &str, size: u32) -> FontResource {
        for path in self.candidates(family) {
            if !path.exists() {
                continue;
            }
            match self.load(path) {
                Ok(font) => {
                    tracing::debug!(font = %path.display(), size, "Loaded font");
                    return FontResource::outline(font, size, path.clone());
                }
                Err(e) => {
                    tracing::warn!(font = %path.display(), error = %e, "Skipping font");
                }
            }
        }

        tracing::debug!(family, size, "No usable font file, using embedded font");
        FontResource::builtin(size)
    }
}
