// End-to-end image rendering through the engine

use super::media_harness::{engine_with_output, write_solid_image};
use image::ImageFormat;
use inkstamp::{RenderRequest, WatermarkError, WatermarkSettings};
use rstest::rstest;

#[rstest]
#[case("photo.jpg", ImageFormat::Jpeg)]
#[case("photo.JPEG", ImageFormat::Jpeg)]
#[case("scan.png", ImageFormat::Png)]
#[case("icon.bmp", ImageFormat::Bmp)]
#[case("page.tif", ImageFormat::Tiff)]
fn test_supported_formats_round_trip(#[case] name: &str, #[case] format: ImageFormat) {
    let dir = tempfile::tempdir().unwrap();
    let source = write_solid_image(dir.path(), name, 320, 240, [40, 80, 120]);
    let out_dir = dir.path().join("out");
    let engine = engine_with_output(&out_dir);

    let output = engine
        .render(&RenderRequest::new(&source, WatermarkSettings::default()))
        .unwrap();

    assert_eq!(output, out_dir.join(format!("watermarked_{name}")));
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), format);

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
}

#[test]
fn test_opaque_text_leaves_background_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_solid_image(dir.path(), "bg.png", 300, 200, [10, 200, 30]);
    let engine = engine_with_output(dir.path());

    let settings = WatermarkSettings::default()
        .with_text("Proof")
        .with_font_size(24)
        .with_opacity(255)
        .with_color("black");
    let output = engine.render(&RenderRequest::new(&source, settings)).unwrap();

    let result = image::open(&output).unwrap().to_rgb8();
    // Corners are outside any bottom-right text box.
    assert_eq!(result.get_pixel(0, 0).0, [10, 200, 30]);
    assert_eq!(result.get_pixel(299, 0).0, [10, 200, 30]);
    assert_eq!(result.get_pixel(0, 199).0, [10, 200, 30]);
    assert_eq!(result.get_pixel(299, 199).0, [10, 200, 30]);

    let changed = result.pixels().filter(|p| p.0 != [10, 200, 30]).count();
    assert!(changed > 0);
}

#[test]
fn test_unreadable_image_is_decode_error_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("garbage.png");
    std::fs::write(&source, b"this is not an image").unwrap();
    let out_dir = dir.path().join("out");
    let engine = engine_with_output(&out_dir);

    let err = engine
        .render(&RenderRequest::new(&source, WatermarkSettings::default()))
        .unwrap_err();

    assert!(matches!(err, WatermarkError::MediaDecode { .. }));
    assert!(!out_dir.join("watermarked_garbage.png").exists());
}

#[tokio::test]
async fn test_concurrent_renders_do_not_share_settings() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_output(&dir.path().join("out"));

    let mut handles = Vec::new();
    for (i, color) in ["red", "blue", "yellow", "cyan"].iter().enumerate() {
        let source = write_solid_image(dir.path(), &format!("img{i}.png"), 200, 120, [0, 0, 0]);
        let settings = WatermarkSettings::default()
            .with_text("X")
            .with_font_size(40)
            .with_opacity(255)
            .with_color(*color);
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.render_async(RenderRequest::new(source, settings)).await
        }));
    }

    let expected = [[255, 0, 0], [0, 0, 255], [255, 255, 0], [0, 255, 255]];
    for (handle, color) in handles.into_iter().zip(expected) {
        let output = handle.await.unwrap().unwrap();
        let result = image::open(&output).unwrap().to_rgb8();
        assert!(result.pixels().any(|p| p.0 == color));
        for other in expected.iter().filter(|c| **c != color) {
            assert!(!result.pixels().any(|p| p.0 == *other));
        }
    }
}
