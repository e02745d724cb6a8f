use anyhow::Result;
use clap::Args;

use super::DatasetArgs;
use crate::summary;

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let (viewer, _events, dataset) = args.dataset.open_viewer()?;
    summary::print_dataset_summary(&dataset, &viewer);
    viewer.close();
    Ok(())
}
