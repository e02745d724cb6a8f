use approx::assert_relative_eq;

use ndview_core::source::Bounds;
use ndview_core::view::{Point, ViewCoords};

fn bounded(width: i64, height: i64) -> ViewCoords {
    ViewCoords::new(Some(Bounds::new(0, 0, width, height)), None, false)
}

// ---------------------------------------------------------------------------
// Resolution level
// ---------------------------------------------------------------------------

#[test]
fn test_resolution_index_is_ceil_log2() {
    let mut v = bounded(1000, 1000);
    v.set_display_size(100, 100);
    assert_eq!(v.resolution_index(), 4);
    assert_relative_eq!(v.downsample_factor(), 16.0);

    v.set_source_size(100.0, 100.0);
    assert_eq!(v.resolution_index(), 0);

    v.set_source_size(50.0, 50.0);
    assert_eq!(v.resolution_index(), 0, "magnified views stay at full resolution");
}

#[test]
fn test_resolution_index_monotonic_in_source_width() {
    let mut v = ViewCoords::new(None, None, false);
    v.set_display_size(256, 256);
    let mut previous = 0;
    for width in (1..200).map(|i| i as f64 * 37.0) {
        v.set_source_size(width, width);
        let index = v.resolution_index();
        assert!(index >= previous, "index dropped at width {width}");
        previous = index;
    }
}

#[test]
fn test_zero_display_width_is_level_zero() {
    let v = bounded(4096, 4096);
    assert_eq!(v.display_size(), (0, 0));
    assert_eq!(v.resolution_index(), 0);
}

#[test]
fn test_sizes_at_resolution_level() {
    let mut v = bounded(1000, 1000);
    v.set_display_size(100, 100);
    v.set_source_size(400.0, 300.0);
    v.set_view_offset(40.0, 21.0);
    // 400 / 100 = 4 -> level 2, downsample 4.
    assert_eq!(v.resolution_index(), 2);
    assert_eq!(v.source_size_at_res_level(), (100, 75));
    assert_eq!(v.view_offset_at_res_level(), (10, 5));
}

// ---------------------------------------------------------------------------
// Initial source size
// ---------------------------------------------------------------------------

#[test]
fn test_default_source_size_until_bounds_known() {
    let mut v = ViewCoords::new(None, None, false);
    assert_eq!(v.source_size(), Point::new(700.0, 700.0));
    v.set_bounds(Some(Bounds::new(0, 0, 320, 240)));
    assert_eq!(v.source_size(), Point::new(320.0, 240.0));
    // Later bounds changes do not reset the view.
    v.set_bounds(Some(Bounds::new(0, 0, 640, 480)));
    assert_eq!(v.source_size(), Point::new(320.0, 240.0));
}

#[test]
fn test_explicit_initial_source_size_wins() {
    let v = ViewCoords::new(
        Some(Bounds::new(0, 0, 320, 240)),
        Some(Point::new(64.0, 64.0)),
        false,
    );
    assert_eq!(v.source_size(), Point::new(64.0, 64.0));
}

// ---------------------------------------------------------------------------
// Pan
// ---------------------------------------------------------------------------

#[test]
fn test_pan_converts_display_to_full_resolution() {
    let mut v = bounded(1000, 1000);
    v.set_display_size(100, 100);
    v.set_source_size(200.0, 200.0);
    // Level 1: 100 level pixels on 100 display pixels, downsample 2.
    v.pan(10.0, 5.0);
    assert_relative_eq!(v.view_offset().x, 20.0);
    assert_relative_eq!(v.view_offset().y, 10.0);
}

#[test]
fn test_pan_clamps_to_bounds() {
    let mut v = bounded(1000, 1000);
    v.set_display_size(100, 100);
    v.set_source_size(200.0, 200.0);
    v.pan(-50.0, -50.0);
    assert_eq!(v.view_offset(), Point::new(0.0, 0.0));
    v.pan(10_000.0, 10_000.0);
    assert_eq!(v.view_offset(), Point::new(800.0, 800.0));
}

#[test]
fn test_unbounded_pan_never_clamps() {
    let mut v = ViewCoords::new(None, Some(Point::new(200.0, 200.0)), false);
    v.set_display_size(100, 100);
    v.pan(-500.0, -500.0);
    assert!(v.view_offset().x < -900.0);
    v.pan(100_000.0, 0.0);
    assert!(v.view_offset().x > 100_000.0);
}

#[test]
fn test_pan_before_first_resize_is_ignored() {
    let mut v = ViewCoords::new(None, None, false);
    v.pan(10.0, 0.0);
    v.pan(0.0, 0.0);
    assert_eq!(v.view_offset(), Point::new(0.0, 0.0));

    v.resize(100, 100);
    v.pan(10.0, 0.0);
    let offset = v.view_offset();
    assert!(offset.x.is_finite() && offset.y.is_finite());
    assert!(offset.x > 0.0);
    assert_relative_eq!(offset.y, 0.0);
}

#[test]
fn test_clamped_offset_stays_on_image() {
    let mut v = bounded(1000, 1000);
    v.set_source_size(200.0, 200.0);
    v.set_view_offset_clamped(5000.0, -10.0);
    assert_eq!(v.view_offset(), Point::new(800.0, 0.0));
    v.set_view_offset_clamped(f64::NAN, 3.0);
    assert_eq!(v.view_offset(), Point::new(800.0, 0.0));
}

#[test]
fn test_negative_offset_rounds_down_at_res_level() {
    let mut v = ViewCoords::new(None, Some(Point::new(200.0, 200.0)), false);
    v.set_display_size(100, 100);
    v.set_view_offset(-3.0, -4.0);
    // Downsample 2: -1.5 and -2.0.
    assert_eq!(v.view_offset_at_res_level(), (-2, -2));
}

// ---------------------------------------------------------------------------
// Zoom
// ---------------------------------------------------------------------------

#[test]
fn test_zoom_keeps_point_under_cursor_fixed() {
    let mut v = bounded(10_000, 10_000);
    v.set_display_size(500, 500);
    v.set_source_size(2000.0, 2000.0);
    v.set_view_offset(3000.0, 3000.0);
    let cursor = Point::new(125.0, 400.0);

    let before_mag = v.magnification();
    let before = Point::new(
        v.view_offset().x + cursor.x / before_mag,
        v.view_offset().y + cursor.y / before_mag,
    );
    assert!(v.zoom(0.5, Some(cursor)));
    let after_mag = v.magnification();
    let after = Point::new(
        v.view_offset().x + cursor.x / after_mag,
        v.view_offset().y + cursor.y / after_mag,
    );
    assert_relative_eq!(before.x, after.x, epsilon = 1e-9);
    assert_relative_eq!(before.y, after.y, epsilon = 1e-9);
    assert_relative_eq!(v.source_size().x, 1000.0);
}

#[test]
fn test_zoom_without_point_uses_view_center() {
    let mut v = bounded(1000, 1000);
    v.set_display_size(100, 100);
    assert!(v.zoom(0.5, None));
    assert_eq!(v.view_offset(), Point::new(250.0, 250.0));
}

#[test]
fn test_zoom_rejected_below_minimum_size() {
    let mut v = bounded(1000, 1000);
    v.set_display_size(100, 100);
    v.set_source_size(8.0, 8.0);
    let before = v.clone();
    assert!(!v.zoom(0.5, None));
    assert_eq!(v, before);
}

#[test]
fn test_zoom_out_never_exceeds_bounds() {
    let mut v = bounded(1000, 500);
    v.set_display_size(200, 100);
    assert!(v.zoom(4.0, None));
    assert!(v.source_size().x <= 1000.0 + 1e-9);
    assert!(v.source_size().y <= 500.0 + 1e-9);
    assert_eq!(v.view_offset(), Point::new(0.0, 0.0));
}

#[test]
fn test_unbounded_zoom_out_grows_freely() {
    let mut v = ViewCoords::new(None, Some(Point::new(100.0, 100.0)), false);
    v.set_display_size(100, 100);
    assert!(v.zoom(8.0, None));
    assert_relative_eq!(v.source_size().x, 800.0);
    assert_relative_eq!(v.view_offset().x, -350.0);
}

#[test]
fn test_zoom_at_point_before_first_resize_uses_view_center() {
    let mut v = ViewCoords::new(None, None, false);
    assert!(v.zoom(0.5, Some(Point::new(10.0, 10.0))));
    assert_eq!(v.source_size(), Point::new(350.0, 350.0));
    assert_eq!(v.view_offset(), Point::new(175.0, 175.0));
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

#[test]
fn test_bounded_resize_follows_canvas_aspect() {
    let mut v = bounded(64, 64);
    v.resize(64, 32);
    assert_eq!(v.display_size(), (64, 32));
    assert_eq!(v.source_size(), Point::new(64.0, 32.0));
}

#[test]
fn test_unbounded_resize_scales_with_display() {
    let mut v = ViewCoords::new(None, None, false);
    v.resize(100, 100);
    assert_eq!(v.source_size(), Point::new(700.0, 700.0));
    v.resize(200, 100);
    assert_eq!(v.source_size(), Point::new(1400.0, 700.0));
}

#[test]
fn test_snapshot_is_independent() {
    let mut v = bounded(100, 100);
    v.set_axis_position("z", 3);
    let snapshot = v.snapshot();
    v.set_axis_position("z", 4);
    assert_eq!(snapshot.axis_position("z").as_int(), Some(3));
    assert_eq!(v.axis_position("t").as_int(), Some(0));
}
