// Image compositor unit tests

use image::{Rgb, RgbImage};
use inkstamp::watermark::font::{FontResource, SystemFontProvider};
use inkstamp::watermark::{
    calculate_position, Dimensions, FontProvider, ImageCompositor, Position, WatermarkSettings,
};
use std::path::{Path, PathBuf};
use inkstamp::WatermarkError;
use parking_lot::Mutex;
use std::sync::Arc;

/// Records what the compositor asked for and always hands out the embedded font.
#[derive(Default)]
struct RecordingFontProvider {
    requests: Mutex<Vec<(String, u32)>>,
}

impl FontProvider for RecordingFontProvider {
    fn resolve(&self, family: &str, size: u32) -> FontResource {
        self.requests.lock().push((family.to_string(), size));
        FontResource::builtin(size)
    }
}

fn hi_settings() -> WatermarkSettings {
    WatermarkSettings::default()
        .with_text("Hi")
        .with_font_size(32)
        .with_opacity(255)
        .with_position(Position::Center)
        .with_color("red")
}

#[test]
fn test_centered_red_text_on_white_image() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("blank.png");
    RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]))
        .save(&source)
        .unwrap();

    let fonts = Arc::new(RecordingFontProvider::default());
    let compositor = ImageCompositor::new(fonts.clone(), dir.path().join("out"));
    let output = compositor.render(&source, &hi_settings()).unwrap();

    assert_eq!(output.file_name().unwrap(), "watermarked_blank.png");
    assert_eq!(
        fonts.requests.lock().as_slice(),
        &[("arial".to_string(), 32)]
    );

    let result = image::open(&output).unwrap().to_rgb8();
    assert_eq!(result.dimensions(), (100, 100));

    let extent = FontResource::builtin(32).measure("Hi");
    let pos = calculate_position(Position::Center, &Dimensions::new(100, 100), &extent);
    let x_range = pos.x as u32..pos.x as u32 + extent.width;
    let y_range = pos.y as u32..pos.y as u32 + extent.height;

    let mut red = 0;
    for (x, y, pixel) in result.enumerate_pixels() {
        let inside = x_range.contains(&x) && y_range.contains(&y);
        if !inside {
            assert_eq!(pixel, &Rgb([255, 255, 255]), "pixel ({x}, {y}) outside text");
        } else if pixel == &Rgb([255, 0, 0]) {
            red += 1;
        }
    }
    assert!(red > 40, "expected visible red text, got {red} pixels");
}

#[test]
fn test_corrupt_source_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("broken.jpg");
    std::fs::write(&source, b"\xFF\xD8 not really a jpeg").unwrap();
    let out_dir = dir.path().join("out");

    let compositor = ImageCompositor::new(Arc::new(RecordingFontProvider::default()), &out_dir);
    let err = compositor.render(&source, &hi_settings()).unwrap_err();

    assert!(matches!(err, WatermarkError::MediaDecode { .. }));
    assert!(!out_dir.join("watermarked_broken.jpg").exists());
}

#[test]
fn test_text_larger_than_image_is_clipped() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("tiny.bmp");
    RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])).save(&source).unwrap();

    let compositor = ImageCompositor::new(Arc::new(RecordingFontProvider::default()), dir.path());
    let settings = WatermarkSettings::default().with_font_size(120);
    let output = compositor.render(&source, &settings).unwrap();

    let result = image::open(&output).unwrap();
    assert_eq!((result.width(), result.height()), (10, 10));
}

fn fixture_font() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts/DejaVuSans-Bold.ttf")
}

#[test]
fn test_font_file_is_loaded_and_measured() {
    let provider = SystemFontProvider::new(vec![fixture_font()]);
    let font = provider.resolve("dejavusans", 32);

    assert!(!font.is_builtin());
    assert_eq!(font.source(), Some(fixture_font().as_path()));
    let extent = font.measure("Hi");
    assert_eq!(font.rasterize("Hi").dimensions(), extent);
    assert_ne!(extent, FontResource::builtin(32).measure("Hi"));
}

#[test]
fn test_font_file_text_stays_inside_its_box() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("blank.png");
    RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]))
        .save(&source)
        .unwrap();

    let fonts = Arc::new(SystemFontProvider::new(vec![fixture_font()]));
    let compositor = ImageCompositor::new(fonts.clone(), dir.path().join("out"));
    let output = compositor.render(&source, &hi_settings()).unwrap();
    let result = image::open(&output).unwrap().to_rgb8();

    let extent = fonts.resolve("arial", 32).measure("Hi");
    let pos = calculate_position(Position::Center, &Dimensions::new(100, 100), &extent);
    let x_range = pos.x as u32..pos.x as u32 + extent.width;
    let y_range = pos.y as u32..pos.y as u32 + extent.height;

    let mut red = 0;
    for (x, y, pixel) in result.enumerate_pixels() {
        if !(x_range.contains(&x) && y_range.contains(&y)) {
            assert_eq!(pixel, &Rgb([255, 255, 255]), "pixel ({x}, {y}) outside text");
        } else if pixel == &Rgb([255, 0, 0]) {
            red += 1;
        }
    }
    assert!(red > 100, "expected visible red text, got {red} pixels");
}
