// Video compositor unit tests over the in-memory backend

use inkstamp::video::{
    frame_font, BgrFrame, FrameRate, FrameTextPlan, MemoryVideoBackend, VideoCompositor,
    VideoInfo,
};
use inkstamp::watermark::position::Dimensions;
use inkstamp::watermark::{Position, WatermarkSettings};
use rstest::rstest;
use std::path::Path;
use std::sync::Arc;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 90;

/// Each frame carries its index in every pixel so order can be checked.
fn numbered_frames(count: usize) -> Vec<BgrFrame> {
    (0..count)
        .map(|i| BgrFrame::filled(WIDTH, HEIGHT, [i as u8, (i * 2) as u8, (i * 3) as u8]))
        .collect()
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(12)]
fn test_output_has_same_frames_in_same_order(#[case] count: usize) {
    let dir = tempfile::tempdir().unwrap();
    let info = VideoInfo::new(WIDTH, HEIGHT, FrameRate::new(30000, 1001).unwrap());
    let backend = Arc::new(MemoryVideoBackend::new());
    backend.insert_source("/uploads/movie.avi", info, numbered_frames(count));

    let compositor = VideoCompositor::new(backend.clone(), dir.path());
    let output = compositor
        .render(Path::new("/uploads/movie.avi"), &WatermarkSettings::default())
        .unwrap();

    assert_eq!(output, dir.path().join("watermarked_movie.avi"));
    let (out_info, frames) = backend.written(&output).unwrap();
    assert_eq!(out_info, info);
    assert_eq!(frames.len(), count);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.pixel(0, 0), [i as u8, (i * 2) as u8, (i * 3) as u8]);
    }
    assert_eq!(backend.open_handles(), 0);
}

#[test]
fn test_placement_computed_once_for_every_frame() {
    let settings = WatermarkSettings::default()
        .with_text("OK")
        .with_font_size(100)
        .with_opacity(255)
        .with_position(Position::BottomRight)
        .with_color("green");
    let plan = FrameTextPlan::new(&settings, Dimensions::new(WIDTH, HEIGHT));

    // scale 2.0 doubles the frame font
    let extent = plan.text_extent();
    assert_eq!(extent, frame_font(100).measure("OK"));
    assert!(extent.height > frame_font(50).measure("OK").height);
    assert_eq!(plan.position().x, WIDTH as i32 - extent.width as i32 - 20);
    assert_eq!(plan.position().y, HEIGHT as i32 - extent.height as i32 - 20);

    let first = plan.apply(&BgrFrame::filled(WIDTH, HEIGHT, [1, 1, 1]));
    let second = plan.apply(&BgrFrame::filled(WIDTH, HEIGHT, [1, 1, 1]));
    assert_eq!(first, second);
}

#[test]
fn test_video_text_is_smaller_than_image_text_for_same_size() {
    use inkstamp::watermark::font::FontResource;

    let settings = WatermarkSettings::default().with_text("Sample").with_font_size(36);
    let image_extent = FontResource::builtin(settings.font_size).measure(&settings.text);
    let video_extent =
        FrameTextPlan::new(&settings, Dimensions::new(1920, 1080)).text_extent();

    assert!(video_extent.height < image_extent.height);
}
