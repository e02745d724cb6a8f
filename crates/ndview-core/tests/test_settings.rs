use approx::assert_relative_eq;
use ndview_core::color::ChannelColor;
use ndview_core::config::ViewerConfig;
use ndview_core::error::NdViewError;
use ndview_core::process::RgbByteOrder;
use ndview_core::viewer::{ChannelSettings, DisplaySettings, HistogramSettings};

fn two_channels() -> DisplaySettings {
    let mut settings = DisplaySettings::default();
    settings.ensure_channel("DAPI");
    settings.ensure_channel("GFP");
    settings
}

// ---------------------------------------------------------------------------
// Channel registration
// ---------------------------------------------------------------------------

#[test]
fn test_new_channels_take_palette_colors() {
    let mut settings = two_channels();
    assert!(!settings.ensure_channel("DAPI"));
    assert!(settings.ensure_channel(""));
    assert_eq!(settings.channel("DAPI").color, ChannelColor::BLUE);
    assert_eq!(settings.channel("GFP").color, ChannelColor::GREEN);
    assert_eq!(settings.channel("").color, ChannelColor::WHITE);
    assert!(settings.remove_channel("GFP"));
    assert_eq!(settings.channel("GFP"), ChannelSettings::default());
}

// ---------------------------------------------------------------------------
// Contrast
// ---------------------------------------------------------------------------

#[test]
fn test_contrast_clamped_to_bit_depth() {
    let mut settings = two_channels();
    settings.set_contrast("DAPI", 300, 9000);
    let dapi = settings.channel("DAPI");
    assert_eq!((dapi.contrast_min, dapi.contrast_max), (255, 255));

    settings.set_bit_depth("DAPI", 12);
    settings.set_contrast("DAPI", 100, 9000);
    let dapi = settings.channel("DAPI");
    assert_eq!((dapi.contrast_min, dapi.contrast_max), (100, 4095));
}

#[test]
fn test_min_never_exceeds_max() {
    let mut settings = two_channels();
    settings.set_contrast("DAPI", 10, 50);
    settings.set_contrast_min("DAPI", 80);
    assert_eq!(settings.channel("DAPI").contrast_min, 50);
    settings.set_contrast_max("DAPI", 5);
    assert_eq!(settings.channel("DAPI").contrast_max, 50);
}

#[test]
fn test_deeper_bit_depth_widens_full_range() {
    let mut settings = two_channels();
    settings.set_bit_depth("DAPI", 16);
    assert_eq!(settings.channel("DAPI").contrast_max, 65_535);

    settings.set_contrast("GFP", 0, 100);
    settings.set_bit_depth("GFP", 16);
    assert_eq!(settings.channel("GFP").contrast_max, 100);

    settings.full_range("GFP");
    assert_eq!(settings.channel("GFP").contrast_max, 65_535);
}

#[test]
fn test_sync_applies_to_every_channel() {
    let mut settings = two_channels();
    settings.histogram.sync_channels = true;
    settings.set_contrast("DAPI", 20, 40);
    settings.set_gamma("DAPI", 0.5);
    for name in ["DAPI", "GFP"] {
        let channel = settings.channel(name);
        assert_eq!((channel.contrast_min, channel.contrast_max), (20, 40));
        assert_relative_eq!(channel.gamma, 0.5);
    }
}

#[test]
fn test_gamma_snaps_to_linear() {
    let mut settings = two_channels();
    settings.set_gamma("DAPI", 1.05);
    assert_eq!(settings.channel("DAPI").gamma, 1.0);
    settings.set_gamma("DAPI", 1.5);
    assert_eq!(settings.channel("DAPI").gamma, 1.5);
    settings.set_gamma("DAPI", -2.0);
    settings.set_gamma("DAPI", f64::NAN);
    assert_eq!(settings.channel("DAPI").gamma, 1.5);
}

#[test]
fn test_contrast_request_carries_outlier_fraction() {
    let mut settings = two_channels();
    assert_eq!(settings.contrast_request("DAPI").outlier_fraction, 0.0);
    settings.histogram.ignore_outliers = true;
    settings.histogram.percent_to_ignore = 2.0;
    let request = settings.contrast_request("DAPI");
    assert_relative_eq!(request.outlier_fraction, 0.02);
    assert!(request.autoscale);
    assert_eq!(request.color, ChannelColor::BLUE);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn test_settings_survive_toml() {
    let mut settings = two_channels();
    settings.set_bit_depth("GFP", 12);
    settings.set_contrast("GFP", 150, 3000);
    settings.set_color("DAPI", ChannelColor::MAGENTA);
    settings.set_active("DAPI", false);
    settings.histogram.log_histogram = true;

    let text = settings.to_toml_string().unwrap();
    assert_eq!(DisplaySettings::from_toml_str(&text).unwrap(), settings);
}

#[test]
fn test_loaded_contrast_is_reclamped() {
    let text = r#"
        [channels.DAPI]
        bit_depth = 8
        contrast_min = 900
        contrast_max = 700
    "#;
    let settings = DisplaySettings::from_toml_str(text).unwrap();
    let dapi = settings.channel("DAPI");
    assert_eq!((dapi.contrast_min, dapi.contrast_max), (255, 255));
    assert_eq!(settings.histogram, HistogramSettings::default());
}

#[test]
fn test_settings_serialize_as_json() {
    let settings = two_channels();
    let json = serde_json::to_string(&settings).unwrap();
    let back: DisplaySettings = serde_json::from_str(&json).unwrap();
    assert_eq!(back, settings);
    assert!(json.contains("\"autoscale\":true"));
}

// ---------------------------------------------------------------------------
// ViewerConfig
// ---------------------------------------------------------------------------

#[test]
fn test_config_reads_rgb_options() {
    let config = ViewerConfig::from_toml_str(
        r#"
        rgb = true
        rgb_byte_order = "rgba"
        initial_source_size = [512.0, 256.0]

        [overlay]
        show_scale_bar = true
        pixel_size_um = 0.65
        "#,
    )
    .unwrap();
    assert!(config.rgb);
    assert_eq!(config.rgb_byte_order, RgbByteOrder::Rgba);
    let size = config.initial_source_point().unwrap();
    assert_eq!((size.x, size.y), (512.0, 256.0));
    let builder = config.overlay_builder();
    assert!(builder.show_scale_bar);
    assert_relative_eq!(builder.pixel_size_um, 0.65);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("viewer.toml");
    let config = ViewerConfig {
        min_source_size: 12.0,
        ..ViewerConfig::default()
    };
    std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
    assert_eq!(ViewerConfig::load(&path).unwrap(), config);
}

#[test]
fn test_config_rejects_bad_values() {
    assert!(matches!(
        ViewerConfig::from_toml_str("min_source_size = -1.0"),
        Err(NdViewError::Config(_))
    ));
    assert!(matches!(
        ViewerConfig::from_toml_str("initial_source_size = [0.0, 10.0]"),
        Err(NdViewError::Config(_))
    ));
    assert!(matches!(
        ViewerConfig::from_toml_str("rgb = \"yes\""),
        Err(NdViewError::Config(_))
    ));
    assert!(matches!(
        ViewerConfig::load(std::path::Path::new("/nonexistent/viewer.toml")),
        Err(NdViewError::Io(_))
    ));
}
