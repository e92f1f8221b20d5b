// Color table unit tests

use inkstamp::watermark::{resolve_bgr, resolve_rgba};
use rstest::rstest;

#[rstest]
#[case("red")]
#[case("RED")]
#[case("Red")]
#[case("rEd")]
fn test_lookup_ignores_case(#[case] name: &str) {
    assert_eq!(resolve_rgba(name, 200).to_array(), [255, 0, 0, 200]);
    assert_eq!(resolve_bgr(name).to_array(), [0, 0, 255]);
}

#[rstest]
#[case("")]
#[case("purple")]
#[case("#ff0000")]
#[case(" red")]
fn test_unknown_names_resolve_to_white(#[case] name: &str) {
    assert_eq!(resolve_rgba(name, 77).to_array(), [255, 255, 255, 77]);
    assert_eq!(resolve_bgr(name).to_array(), [255, 255, 255]);
}

const NAMES: [&str; 8] = [
    "white", "black", "red", "green", "blue", "yellow", "cyan", "magenta",
];

#[test]
fn test_tables_agree_up_to_channel_order() {
    for name in NAMES {
        let rgba = resolve_rgba(name, 255);
        let bgr = resolve_bgr(name);
        assert_eq!((rgba.r, rgba.g, rgba.b), (bgr.r, bgr.g, bgr.b), "{name}");
    }
}

#[test]
fn test_blue_differs_between_tables_in_raw_order() {
    let rgba = resolve_rgba("blue", 255).to_array();
    let bgr = resolve_bgr("blue").to_array();
    assert_eq!(&rgba[..3], &[0, 0, 255]);
    assert_eq!(bgr, [255, 0, 0]);
}

#[test]
fn test_only_white_resolves_to_white() {
    for name in NAMES.iter().filter(|name| **name != "white") {
        assert_ne!(resolve_rgba(name, 255).to_array(), [255, 255, 255, 255], "{name}");
    }
    assert_eq!(resolve_rgba("orange", 255).to_array(), [255, 255, 255, 255]);
}
