use anyhow::Result;
use clap::Args;
use livecfg::{DocumentNode, Persistable};

use super::{SourceArgs, parse_path, render_node};
use crate::ux_error;

#[derive(Args)]
pub struct GetArgs {
    #[arg(help = "Path into the merged document, e.g. /server/ports[0]")]
    pub path: String,

    #[arg(long, help = "Output as JSON")]
    pub json: bool
}

pub fn run(sources: &SourceArgs, args: GetArgs) -> Result<()> {
    let path = parse_path(&args.path)?;
    let document = sources.open()?.load()?;

    let node = match path.apply_in(&document) {
        Ok(Some(node)) => node.clone(),
        Ok(None) => DocumentNode::Table(document.clone()),
        Err(e) if e.is_navigation() => {
            return Err(ux_error::path_not_found(&args.path, &e.to_string()).into());
        }
        Err(e) => return Err(e.into())
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&node)?);
    } else {
        println!("{}", render_node(&node));
    }
    Ok(())
}
