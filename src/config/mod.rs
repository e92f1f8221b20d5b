//! Engine configuration.
//!
//! Loaded from YAML. `${VAR}` references are replaced with environment
//! variables before parsing, and a reference to an unset variable is an
//! error. Every field has a default, so an empty document is a valid
//! configuration.
//!
//! ```yaml
//! output_dir: /var/lib/inkstamp/out
//! fonts:
//!   search_paths:
//!     - /usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf
//! video:
//!   ffmpeg_path: ${FFMPEG}
//!   codec: mpeg4
//!   codec_tag: mp4v
//! image:
//!   jpeg_quality: 95
//! logging:
//!   level: info
//!   format: json
//! defaults:
//!   text: "Watermark"
//!   position: bottom_right
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_JPEG_QUALITY, DEFAULT_OUTPUT_DIR_NAME};
use crate::error::WatermarkError;
use crate::watermark::font::SystemFontProvider;
use crate::watermark::WatermarkSettings;

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_OUTPUT_DIR_NAME)
}

fn default_search_paths() -> Vec<PathBuf> {
    SystemFontProvider::default_search_paths()
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_codec() -> String {
    "mpeg4".to_string()
}

fn default_codec_tag() -> Option<String> {
    Some("mp4v".to_string())
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Font probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontsConfig {
    /// Font files probed in order before the embedded font
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            search_paths: default_search_paths(),
        }
    }
}

/// External video tooling and output encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    /// ffmpeg encoder name (default: mpeg4)
    #[serde(default = "default_codec")]
    pub codec: String,
    /// Four-character codec tag written into containers that carry one
    #[serde(default = "default_codec_tag")]
    pub codec_tag: Option<String>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            codec: default_codec(),
            codec_tag: default_codec_tag(),
        }
    }
}

/// Still-image encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// JPEG quality, 1-100 (default: 95)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory receiving `watermarked_<basename>` files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Settings used when a caller supplies none
    #[serde(default)]
    pub defaults: WatermarkSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            fonts: FontsConfig::default(),
            video: VideoConfig::default(),
            image: ImageConfig::default(),
            logging: LoggingConfig::default(),
            defaults: WatermarkSettings::default(),
        }
    }
}

/// Replace `${VAR_NAME}` with environment variable values.
pub(crate) fn substitute_env(yaml: &str) -> Result<String, WatermarkError> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| WatermarkError::Config(e.to_string()))?;

    let mut missing = None;
    let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    if let Some(var_name) = missing {
        return Err(WatermarkError::Config(format!(
            "Environment variable '{}' is referenced but not set",
            var_name
        )));
    }
    Ok(substituted.into_owned())
}

impl EngineConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, WatermarkError> {
        let substituted = substitute_env(yaml)?;
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&substituted).map_err(|e| WatermarkError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WatermarkError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            WatermarkError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        if let Some(tag) = &self.video.codec_tag {
            if tag.chars().count() != 4 {
                return Err(WatermarkError::Config(format!(
                    "video.codec_tag '{}' must be exactly four characters",
                    tag
                )));
            }
        }

        if self.video.codec.trim().is_empty() {
            return Err(WatermarkError::Config("video.codec cannot be empty".to_string()));
        }

        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(WatermarkError::Config(format!(
                "image.jpeg_quality must be between 1 and 100, got {}",
                self.image.jpeg_quality
            )));
        }

        self.defaults
            .validate()
            .map_err(|e| WatermarkError::Config(format!("defaults: {}", e)))
    }
}
