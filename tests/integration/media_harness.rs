// Helpers for tests that produce real media files

use image::{Rgb, RgbImage};
use inkstamp::config::EngineConfig;
use inkstamp::Engine;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Engine writing into `output_dir` with otherwise default configuration.
pub fn engine_with_output(output_dir: &Path) -> Engine {
    let config = EngineConfig {
        output_dir: output_dir.to_path_buf(),
        ..EngineConfig::default()
    };
    config.validate().expect("default config should validate");
    Engine::from_config(&config)
}

/// Write a solid-color image in the format implied by the extension.
pub fn write_solid_image(dir: &Path, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb(rgb))
        .save(&path)
        .expect("Failed to write test image");
    path
}

/// Generate an `frames`-frame test pattern video with ffmpeg.
pub fn write_test_video(path: &Path, width: u32, height: u32, fps: u32, frames: u32) {
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=size={}x{}:rate={}", width, height, fps))
        .arg("-frames:v")
        .arg(frames.to_string())
        .args(["-c:v", "mpeg4", "-pix_fmt", "yuv420p"])
        .arg(path)
        .status()
        .expect("Failed to run ffmpeg (is it installed?)");
    assert!(status.success(), "ffmpeg failed to generate {}", path.display());
}

/// Decoded frame count, width, height and r_frame_rate of the first video stream.
pub fn probe_counted(path: &Path) -> (u64, u32, u32, String) {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_frames",
            "-show_entries",
            "stream=nb_read_frames,width,height,r_frame_rate",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .expect("Failed to run ffprobe (is it installed?)");
    assert!(output.status.success(), "ffprobe failed on {}", path.display());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let stream = &json["streams"][0];
    let frames = stream["nb_read_frames"]
        .as_str()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);
    (
        frames,
        stream["width"].as_u64().unwrap() as u32,
        stream["height"].as_u64().unwrap() as u32,
        stream["r_frame_rate"].as_str().unwrap().to_string(),
    )
}
