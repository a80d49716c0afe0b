use anyhow::Result;
use clap::Args;
use livecfg::Persistable;

use super::{SourceArgs, parse_path};
use crate::output;

#[derive(Args)]
pub struct UnsetArgs {
    #[arg(help = "Path of the entry to remove; must end with a key")]
    pub path: String
}

pub fn run(sources: &SourceArgs, args: UnsetArgs) -> Result<()> {
    let path = parse_path(&args.path)?;
    let set = sources.open()?;
    let mut document = set.load()?;

    if !path.clear(&mut document)? {
        output::warn(&format!("Nothing to remove at {}", path));
        return Ok(());
    }

    set.save(&document)?;
    output::success(&format!("Removed {}", path));
    Ok(())
}
