use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use ndview_core::consts::CHANNEL_AXIS;
use ndview_core::viewer::next_position;

use super::{parse_size, settle, DatasetArgs};

#[derive(Args)]
pub struct AnimateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Integer axis to step through
    #[arg(long, default_value = "z")]
    pub axis: String,

    /// Display size
    #[arg(long, default_value = "512x512", value_parser = parse_size)]
    pub size: (u32, u32),

    /// Number of frames to write (default: one pass over the axis)
    #[arg(long)]
    pub frames: Option<usize>,

    /// Directory for the numbered PNG frames
    #[arg(short, long, default_value = "frames")]
    pub output_dir: PathBuf,
}

pub fn run(args: &AnimateArgs) -> Result<()> {
    let (viewer, _events, _dataset) = args.dataset.open_viewer()?;
    let (width, height) = args.size;
    viewer.resize(width, height);

    let ranges = viewer.axis_ranges();
    let Some((min, max)) = ranges.range(&args.axis).filter(|_| args.axis != CHANNEL_AXIS) else {
        let known: Vec<&str> = ranges.integer_axes().collect();
        bail!(
            "'{}' is not an integer axis of this dataset (available: {})",
            args.axis,
            known.join(", ")
        );
    };
    let count = args.frames.unwrap_or((max - min + 1) as usize);

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    println!("Animating {} over {}..={} ({} frames)", args.axis, min, max, count);

    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:12} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let mut position = min;
    for i in 0..count {
        pb.set_message(format!("{}={}", args.axis, position));
        viewer.set_axis_position(&args.axis, position);
        settle(&viewer)?;
        let frame = viewer.composited_frame().context("No frame was composited")?;
        let path = args.output_dir.join(format!("frame_{i:04}.png"));
        frame.buffer.save_png(&path)?;
        pb.inc(1);
        position = next_position(position, min, max);
    }

    pb.finish_with_message("Done");
    println!("\n{} frames written to {}", count, args.output_dir.display());
    viewer.close();
    Ok(())
}
