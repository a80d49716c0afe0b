use anyhow::Result;
use clap::Args;
use livecfg::{DocumentFormat, Persistable};

use super::SourceArgs;
use crate::output;

#[derive(Args)]
pub struct DumpArgs {
    #[arg(long, short = 'f', default_value = "toml", help = "Output format (toml, yaml, json)")]
    pub format: DocumentFormat
}

pub fn run(sources: &SourceArgs, args: DumpArgs) -> Result<()> {
    let settings = sources.settings()?;
    let set = sources.open()?;

    if !set.exists()? {
        output::warn(&format!("Nothing persisted at {}", set.locations().join(", ")));
        output::hint("Write a first value with `livecfg set <PATH> <VALUE>`");
        return Ok(());
    }

    let text = args.format.serialize(&set.load()?, settings.pretty)?;
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}
