// End-to-end video rendering through ffmpeg
// Requires ffmpeg and ffprobe on PATH

use super::media_harness::{engine_with_output, probe_counted, write_test_video};
use inkstamp::config::VideoConfig;
use inkstamp::video::{probe_video, FfmpegBackend, FrameRate, VideoBackend, VideoInfo};
use inkstamp::{RenderRequest, WatermarkError, WatermarkSettings};
use std::path::Path;

#[test]
#[ignore] // Requires ffmpeg
fn test_frame_count_dimensions_and_rate_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("clip.mp4");
    write_test_video(&source, 320, 240, 25, 30);

    let out_dir = dir.path().join("out");
    let engine = engine_with_output(&out_dir);
    let settings = WatermarkSettings::default().with_text("Preview").with_opacity(200);

    let output = engine.render(&RenderRequest::new(&source, settings)).unwrap();
    assert_eq!(output, out_dir.join("watermarked_clip.mp4"));

    let (frames, width, height, rate) = probe_counted(&output);
    assert_eq!(frames, 30);
    assert_eq!((width, height), (320, 240));
    assert_eq!(rate, "25/1");
}

#[test]
#[ignore] // Requires ffmpeg
fn test_ntsc_rate_kept_as_rational() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("ntsc.mov");
    let status = std::process::Command::new("ffmpeg")
        .args([
            "-hide_banner", "-loglevel", "error", "-y",
            "-f", "lavfi", "-i", "testsrc=size=160x120:rate=30000/1001",
            "-frames:v", "10", "-c:v", "mpeg4",
        ])
        .arg(&source)
        .status()
        .unwrap();
    assert!(status.success());

    let info = probe_video(Path::new("ffprobe"), &source).unwrap();
    assert_eq!(info.frame_rate, FrameRate::new(30000, 1001).unwrap());

    let engine = engine_with_output(dir.path());
    let output = engine
        .render(&RenderRequest::new(&source, WatermarkSettings::default()))
        .unwrap();
    let (frames, _, _, rate) = probe_counted(&output);
    assert_eq!(frames, 10);
    assert_eq!(rate, "30000/1001");
}

#[test]
#[ignore] // Requires ffmpeg
fn test_matroska_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    write_test_video(&source, 128, 96, 24, 8);

    let engine = engine_with_output(dir.path());
    let output = engine
        .render(&RenderRequest::new(&source, WatermarkSettings::default()))
        .unwrap();
    assert_eq!(probe_counted(&output).0, 8);
}

#[test]
#[ignore] // Requires ffprobe
fn test_corrupt_video_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("broken.mp4");
    std::fs::write(&source, b"definitely not an mp4 container").unwrap();
    let out_dir = dir.path().join("out");

    let engine = engine_with_output(&out_dir);
    let err = engine
        .render(&RenderRequest::new(&source, WatermarkSettings::default()))
        .unwrap_err();

    assert!(matches!(err, WatermarkError::MediaDecode { .. }));
    assert!(!out_dir.join("watermarked_broken.mp4").exists());
}

#[test]
#[ignore] // Requires ffmpeg
fn test_configured_codec_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("clip.avi");
    write_test_video(&source, 96, 64, 10, 5);

    let config = inkstamp::config::EngineConfig {
        output_dir: dir.path().join("out"),
        video: VideoConfig {
            codec: "mpeg4".to_string(),
            codec_tag: Some("XVID".to_string()),
            ..VideoConfig::default()
        },
        ..Default::default()
    };
    config.validate().unwrap();

    let output = inkstamp::Engine::from_config(&config)
        .render(&RenderRequest::new(&source, WatermarkSettings::default()))
        .unwrap();
    assert_eq!(probe_counted(&output).0, 5);
}

#[test]
#[ignore] // Requires ffmpeg
fn test_rotated_source_renders_upright() {
    let dir = tempfile::tempdir().unwrap();
    let coded = dir.path().join("coded.mp4");
    write_test_video(&coded, 160, 96, 25, 6);

    let source = dir.path().join("portrait.mp4");
    let status = std::process::Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
        .arg(&coded)
        .args(["-c", "copy", "-metadata:s:v:0", "rotate=90"])
        .arg(&source)
        .status()
        .unwrap();
    assert!(status.success());

    let info = probe_video(Path::new("ffprobe"), &source).unwrap();
    assert_eq!((info.width, info.height), (96, 160));

    let engine = engine_with_output(&dir.path().join("out"));
    let output = engine
        .render(&RenderRequest::new(&source, WatermarkSettings::default()))
        .unwrap();

    let (frames, width, height, _) = probe_counted(&output);
    assert_eq!(frames, 6);
    assert_eq!((width, height), (96, 160));
}

#[test]
#[ignore] // Requires ffmpeg
fn test_sink_without_frames_writes_openable_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("watermarked_empty.mp4");
    let info = VideoInfo::new(64, 48, FrameRate::new(25, 1).unwrap());

    let writer = FfmpegBackend::default().open_sink(&output, &info).unwrap();
    writer.finish().unwrap();

    let (frames, width, height, _) = probe_counted(&output);
    assert_eq!(frames, 0);
    assert_eq!((width, height), (64, 48));
    assert!(!dir.path().join(".seed-watermarked_empty.mp4").exists());
}
