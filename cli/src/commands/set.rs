use anyhow::{Result, bail};
use clap::Args;
use livecfg::{Document, DocumentNode, Persistable};

use super::{SourceArgs, parse_path, parse_value};
use crate::output;

#[derive(Args)]
pub struct SetArgs {
    #[arg(help = "Path of the entry to set, e.g. /server/port")]
    pub path: String,

    #[arg(help = "New value as a TOML literal (42, true, [1, 2], { a = 1 }); anything else is a string")]
    pub value: String,

    #[arg(long, help = "Store the value as a string without interpreting it")]
    pub string: bool
}

pub fn run(sources: &SourceArgs, args: SetArgs) -> Result<()> {
    let path = parse_path(&args.path)?;
    if path.is_root() {
        bail!("Cannot replace the whole document; set a key below the root");
    }

    let set = sources.open()?;
    let mut document = if set.exists()? {
        set.load()?
    } else {
        output::info("No document persisted yet, starting from an empty one");
        Document::new()
    };

    let node = if args.string {
        DocumentNode::String(args.value.clone())
    } else {
        parse_value(&args.value)
    };
    path.insert(&mut document, node)?;
    set.save(&document)?;

    let owner = set.owner_of(&path).unwrap_or("<none>");
    output::success(&format!("Set {} in {}", path, owner));
    Ok(())
}
