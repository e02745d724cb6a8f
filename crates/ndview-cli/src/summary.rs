use std::path::Path;

use console::Style;
use ndview_core::color::ChannelColor;
use ndview_core::source::{describe_axes, DataSource};
use ndview_core::view::ViewCoords;
use ndview_core::viewer::{ChannelSettings, DisplaySettings, Viewer};

use crate::dataset::Dataset;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    channel: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            channel: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

pub fn print_dataset_summary(dataset: &Dataset, viewer: &Viewer) {
    let s = Styles::new();
    print_title(&s, "Dataset");

    println!("  {:<14}{}", s.label.apply_to("Images"), s.value.apply_to(dataset.images));
    match dataset.source.bounds() {
        Some(b) => println!(
            "  {:<14}{}",
            s.label.apply_to("Extent"),
            s.value.apply_to(format!("{}x{}", b.width(), b.height()))
        ),
        None => println!("  {:<14}{}", s.label.apply_to("Extent"), s.disabled.apply_to("unbounded")),
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Color"),
        s.value.apply_to(if dataset.rgb { "RGB" } else { "grayscale" })
    );
    println!();

    let ranges = viewer.axis_ranges();
    println!("  {}", s.header.apply_to("Axes"));
    for axis in ranges.integer_axes() {
        if let Some((min, max)) = ranges.range(axis) {
            println!("    {:<12}{}", s.label.apply_to(axis), s.value.apply_to(format!("{min}..={max}")));
        }
    }
    println!();

    print_channels(&s, &viewer.display_settings(), &viewer.channel_names());
}

pub fn print_render_summary(view: &ViewCoords, settings: &DisplaySettings, channels: &[String], output: &Path) {
    let s = Styles::new();
    print_title(&s, "ndview Render");

    let (dw, dh) = view.display_size();
    let offset = view.view_offset();
    let source = view.source_size();
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(output.display()));
    println!("  {:<14}{}", s.label.apply_to("Display"), s.value.apply_to(format!("{dw}x{dh}")));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Region"),
        s.value.apply_to(format!(
            "{:.0}x{:.0} at ({:.0}, {:.0})",
            source.x, source.y, offset.x, offset.y
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Level"),
        s.value.apply_to(format!(
            "{} (magnification {:.3})",
            view.resolution_index(),
            view.magnification()
        ))
    );
    println!("  {:<14}{}", s.label.apply_to("Position"), s.value.apply_to(describe_axes(view.axes())));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Mode"),
        s.channel.apply_to(if settings.histogram.composite { "composite" } else { "single channel" })
    );
    println!();

    print_channels(&s, settings, channels);
}

fn print_channels(s: &Styles, settings: &DisplaySettings, channels: &[String]) {
    println!("  {}", s.header.apply_to("Channels"));
    for name in channels {
        let channel = settings.channel(name);
        let label = if name.is_empty() { "(unnamed)" } else { name.as_str() };
        if channel.active {
            println!(
                "    {:<12}{}  {}",
                s.channel.apply_to(label),
                s.value.apply_to(describe_contrast(&channel)),
                s.label.apply_to(describe_color(channel.color))
            );
        } else {
            println!("    {:<12}{}", s.channel.apply_to(label), s.disabled.apply_to("hidden"));
        }
    }
    if settings.histogram.autoscale {
        println!("    {}", s.label.apply_to("(autoscaled)"));
    }
    println!();
}

fn describe_contrast(channel: &ChannelSettings) -> String {
    let mut text = format!(
        "{}..={} of {} bits",
        channel.contrast_min, channel.contrast_max, channel.bit_depth
    );
    if channel.gamma != 1.0 {
        text.push_str(&format!(", gamma {:.2}", channel.gamma));
    }
    text
}

fn describe_color(color: ChannelColor) -> String {
    format!("#{:06X}", color.packed())
}
