use anyhow::Result;
use clap::Args;

use super::{SourceArgs, parse_path};

#[derive(Args)]
pub struct OwnerArgs {
    #[arg(help = "Path whose owning source to show")]
    pub path: String,

    #[arg(long, help = "Output as JSON")]
    pub json: bool
}

pub fn run(sources: &SourceArgs, args: OwnerArgs) -> Result<()> {
    let path = parse_path(&args.path)?;
    let set = sources.open()?;
    let owner = set.owner_of(&path);

    if args.json {
        let output = serde_json::json!({
            "path": path.to_string(),
            "owner": owner,
            "sources": set.locations()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", owner.unwrap_or("<none>"));
    Ok(())
}
