// Stream metadata through ffprobe

use crate::error::WatermarkError;
use crate::watermark::position::Dimensions;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// Frame rate used when the container reports none.
const FALLBACK_FRAME_RATE: FrameRate = FrameRate { num: 30, den: 1 };

/// Nominal frame rate as a rational, e.g. `30000/1001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Option<Self> {
        if num == 0 || den == 0 {
            return None;
        }
        Some(Self { num, den })
    }

    /// Parse `"30/1"`, `"30000/1001"` or a plain integer like `"25"`.
    pub fn parse(rate: &str) -> Option<Self> {
        let rate = rate.trim();
        match rate.split_once('/') {
            Some((num, den)) => Self::new(num.trim().parse().ok()?, den.trim().parse().ok()?),
            None => Self::new(rate.parse().ok()?, 1),
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        FALLBACK_FRAME_RATE
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// What the compositor needs to know about a video stream.
///
/// `width` and `height` are the displayed size: a stream tagged with a
/// quarter-turn rotation has its coded size swapped, matching the frames
/// the decoder hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
}

impl VideoInfo {
    pub fn new(width: u32, height: u32, frame_rate: FrameRate) -> Self {
        Self {
            width,
            height,
            frame_rate,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    tags: Option<StreamTags>,
    side_data_list: Option<Vec<SideData>>,
}

#[derive(Deserialize)]
struct StreamTags {
    rotate: Option<String>,
}

#[derive(Deserialize)]
struct SideData {
    rotation: Option<serde_json::Value>,
}

impl StreamInfo {
    /// Display rotation in degrees. The display matrix wins over the
    /// legacy `rotate` tag.
    fn rotation(&self) -> i64 {
        let from_matrix = self
            .side_data_list
            .iter()
            .flatten()
            .filter_map(|side| side.rotation.as_ref())
            .find_map(|value| match value {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            });
        let from_tag = || {
            self.tags
                .as_ref()
                .and_then(|tags| tags.rotate.as_deref())
                .and_then(|rotate| rotate.trim().parse::<f64>().ok())
        };

        from_matrix
            .or_else(from_tag)
            .map(|degrees| (degrees.round() as i64).rem_euclid(360))
            .unwrap_or(0)
    }
}

/// Read width, height and nominal frame rate of the first video stream.
pub fn probe_video(ffprobe: &Path, path: &Path) -> Result<VideoInfo, WatermarkError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_type,width,height,r_frame_rate,avg_frame_rate\
             :stream_tags=rotate:stream_side_data=rotation",
            "-print_format",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            WatermarkError::decode(path, format!("failed to run {}: {}", ffprobe.display(), e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WatermarkError::decode(
            path,
            format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    parse_ffprobe_json(path, &String::from_utf8_lossy(&output.stdout))
}

/// Interpret ffprobe's JSON stream listing.
pub(crate) fn parse_ffprobe_json(path: &Path, json: &str) -> Result<VideoInfo, WatermarkError> {
    let probe: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| WatermarkError::decode(path, format!("unreadable ffprobe output: {}", e)))?;

    let stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        })
        .ok_or_else(|| WatermarkError::decode(path, "no video stream"))?;

    let width = stream
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| WatermarkError::decode(path, "video stream has no width"))?;
    let height = stream
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| WatermarkError::decode(path, "video stream has no height"))?;

    // r_frame_rate is "0/0" for some streams; avg_frame_rate is next best.
    let frame_rate = stream
        .r_frame_rate
        .as_deref()
        .and_then(FrameRate::parse)
        .or_else(|| stream.avg_frame_rate.as_deref().and_then(FrameRate::parse))
        .unwrap_or_default();

    let rotation = stream.rotation();
    let (width, height) = if rotation % 180 == 90 {
        (height, width)
    } else {
        (width, height)
    };
    if rotation != 0 {
        tracing::debug!(source = %path.display(), rotation, width, height, "Rotated video stream");
    }

    Ok(VideoInfo::new(width, height, frame_rate))
}
