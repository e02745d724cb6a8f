mod common;

use ndview_core::color::ChannelColor;
use ndview_core::process::{ContrastRequest, PixelProcessor, RgbByteOrder};
use ndview_core::render::Compositor;

use common::{flat8, packed};

fn processor(value: u8, color: ChannelColor, width: usize, height: usize) -> PixelProcessor {
    let mut p = PixelProcessor::new(false, RgbByteOrder::default());
    p.ingest(flat8(width, height, value), 8).unwrap();
    p.recompute(&ContrastRequest {
        contrast_min: 0,
        contrast_max: 255,
        gamma: 1.0,
        color,
        autoscale: false,
        outlier_fraction: 0.0,
    });
    p
}

#[test]
fn test_red_plus_green_is_yellow() {
    let red = processor(255, ChannelColor::RED, 4, 4);
    let green = processor(255, ChannelColor::GREEN, 4, 4);
    let out = Compositor::new().composite(&[&red, &green], 4, 4);
    assert!(out.pixels.iter().all(|&p| p == 0x00FF_FF00));
}

#[test]
fn test_first_channel_replaces() {
    let gray = processor(128, ChannelColor::WHITE, 3, 2);
    let out = Compositor::new().composite(&[&gray], 3, 2);
    assert_eq!(out.get(2, 1), Some(0x0080_8080));
}

#[test]
fn test_blending_saturates_per_plane() {
    let a = processor(200, ChannelColor::WHITE, 2, 2);
    let b = processor(200, ChannelColor::BLUE, 2, 2);
    let out = Compositor::new().composite(&[&a, &b], 2, 2);
    assert_eq!(out.get(0, 0), Some(0x00C8_C8FF));
}

#[test]
fn test_mismatched_channel_is_skipped() {
    let stale = processor(255, ChannelColor::RED, 8, 8);
    let fresh = processor(255, ChannelColor::GREEN, 4, 4);
    let out = Compositor::new().composite(&[&stale, &fresh], 4, 4);
    assert!(out.pixels.iter().all(|&p| p == 0x0000_FF00));
}

#[test]
fn test_rgb_source_union_of_planes() {
    let mut rgb = PixelProcessor::new(true, RgbByteOrder::Bgra);
    rgb.ingest(packed(2, 2, [10, 20, 30, 255]), 32).unwrap();
    rgb.recompute(&ContrastRequest {
        contrast_min: 0,
        contrast_max: 255,
        gamma: 1.0,
        color: ChannelColor::WHITE,
        autoscale: false,
        outlier_fraction: 0.0,
    });
    let out = Compositor::new().composite(&[&rgb], 2, 2);
    assert_eq!(out.get(1, 1), Some(0x001E_140A));
}

#[test]
fn test_large_composite_matches_per_pixel_blend() {
    let red = processor(255, ChannelColor::RED, 400, 300);
    let blue = processor(100, ChannelColor::BLUE, 400, 300);
    let out = Compositor::new().composite(&[&red, &blue], 400, 300);
    assert_eq!(out.pixels.len(), 120_000);
    assert!(out.pixels.iter().all(|&p| p == 0x00FF_0064));
}

#[test]
fn test_save_png_writes_rgb() {
    let green = processor(255, ChannelColor::GREEN, 5, 3);
    let out = Compositor::new().composite(&[&green], 5, 3);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    out.save_png(&path).unwrap();

    let img = image::open(&path).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (5, 3));
    assert_eq!(img.get_pixel(4, 2).0, [0, 255, 0]);
}
