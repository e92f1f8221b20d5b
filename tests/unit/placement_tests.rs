// Placement unit tests

use inkstamp::watermark::position::{calculate_position, Dimensions, PlacementPosition};
use inkstamp::watermark::Position;
use rstest::rstest;

#[rstest]
#[case(Position::TopLeft, 20, 20)]
#[case(Position::TopRight, 140, 20)]
#[case(Position::BottomLeft, 20, 60)]
#[case(Position::BottomRight, 140, 60)]
#[case(Position::Center, 80, 40)]
fn test_placement_on_200x100_with_40x20_text(
    #[case] position: Position,
    #[case] x: i32,
    #[case] y: i32,
) {
    let placed = calculate_position(
        position,
        &Dimensions::new(200, 100),
        &Dimensions::new(40, 20),
    );
    assert_eq!(placed, PlacementPosition::new(x, y));
}

#[rstest]
#[case("")]
#[case("middle")]
#[case("Top_Left")]
#[case(" top_left")]
#[case("center\n")]
#[case("bottom-right")]
fn test_unrecognized_position_matches_bottom_right(#[case] name: &str) {
    let container = Dimensions::new(640, 480);
    let text = Dimensions::new(120, 30);
    assert_eq!(
        calculate_position(Position::from_name(name), &container, &text),
        calculate_position(Position::BottomRight, &container, &text)
    );
}

#[test]
fn test_placement_is_pure() {
    let container = Dimensions::new(1920, 1080);
    let text = Dimensions::new(333, 47);
    let first = calculate_position(Position::Center, &container, &text);
    let second = calculate_position(Position::Center, &container, &text);
    assert_eq!(first, second);
}

#[test]
fn test_center_floors_odd_remainders() {
    let placed = calculate_position(
        Position::Center,
        &Dimensions::new(101, 51),
        &Dimensions::new(40, 20),
    );
    assert_eq!(placed, PlacementPosition::new(30, 15));
}

#[test]
fn test_oversized_text_goes_negative_without_clamping() {
    let container = Dimensions::new(50, 30);
    let text = Dimensions::new(200, 60);

    assert_eq!(
        calculate_position(Position::BottomRight, &container, &text),
        PlacementPosition::new(-170, -50)
    );
    assert_eq!(
        calculate_position(Position::Center, &container, &text),
        PlacementPosition::new(-75, -15)
    );
}
