pub mod dump;
pub mod get;
pub mod owner;
pub mod set;
pub mod unset;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use livecfg::{DocumentNode, Path, Settings, SourceSet, SourceSpec};

use crate::ux_error;

#[derive(Parser)]
#[command(
    name = "livecfg",
    author,
    version,
    about = "livecfg - inspect and edit managed configuration documents",
    long_about = "Reads the merged view of one or more configuration documents and writes \
                  changes back to the document that owns each path.\n\nSources are listed in \
                  ascending precedence: later sources override earlier ones."
)]
pub struct Cli {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print the value at a path of the merged document")]
    Get(get::GetArgs),

    #[command(about = "Set the value at a path and save it to its owning source")]
    Set(set::SetArgs),

    #[command(about = "Remove the entry at a path")]
    Unset(unset::UnsetArgs),

    #[command(about = "Print the whole merged document")]
    Dump(dump::DumpArgs),

    #[command(about = "Show which source a path is written to")]
    Owner(owner::OwnerArgs)
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(
        short = 's',
        long = "source",
        global = true,
        env = "LIVECFG_SOURCES",
        value_delimiter = ',',
        help = "Configuration document, repeatable, in ascending precedence"
    )]
    pub sources: Vec<String>,

    #[arg(
        short = 'r',
        long = "route",
        global = true,
        value_name = "LOCATION=PATH",
        help = "Route the subtree at PATH to the source at LOCATION"
    )]
    pub routes: Vec<String>
}

impl SourceArgs {
    /// Source descriptions with their routes attached.
    pub fn specs(&self) -> Result<Vec<SourceSpec>> {
        if self.sources.is_empty() {
            return Err(ux_error::no_sources().into());
        }

        let mut specs: Vec<SourceSpec> = self
            .sources
            .iter()
            .map(|location| SourceSpec {
                location: location.clone(),
                routes: Vec::new()
            })
            .collect();

        for raw in &self.routes {
            let (location, path) = parse_route(raw)?;
            let spec = specs
                .iter_mut()
                .find(|spec| spec.location == location)
                .ok_or_else(|| ux_error::unknown_route_source(&location))?;
            spec.routes.push(path);
        }

        Ok(specs)
    }

    pub fn open(&self) -> Result<SourceSet> {
        let sources = SourceSet::from_specs(&self.specs()?, &self.settings()?)?;
        tracing::debug!("Opened sources: {}", sources.locations().join(", "));
        Ok(sources)
    }

    pub fn settings(&self) -> Result<Settings> {
        livecfg::load_from_env().context("Failed to read LIVECFG_* settings")
    }
}

/// Split `LOCATION=PATH`.
pub fn parse_route(raw: &str) -> Result<(String, Path)> {
    let (location, path) = raw
        .rsplit_once('=')
        .ok_or_else(|| ux_error::invalid_route(raw))?;
    let path = path
        .parse::<Path>()
        .with_context(|| format!("Invalid route path in '{raw}'"))?;
    Ok((location.to_string(), path))
}

pub fn parse_path(raw: &str) -> Result<Path> {
    raw.parse::<Path>()
        .with_context(|| format!("Invalid path '{raw}'"))
}

/// Interpret `raw` as a TOML value, falling back to a plain string.
pub fn parse_value(raw: &str) -> DocumentNode {
    toml::from_str::<toml::Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| DocumentNode::String(raw.to_string()))
}

/// Render a node for terminal output; strings print unquoted.
pub fn render_node(node: &DocumentNode) -> String {
    match node {
        DocumentNode::String(s) => s.clone(),
        DocumentNode::Table(table) => toml::to_string_pretty(table)
            .unwrap_or_else(|_| node.to_string())
            .trim_end()
            .to_string(),
        other => other.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_typed() {
        assert_eq!(parse_value("42"), DocumentNode::Integer(42));
        assert_eq!(parse_value("true"), DocumentNode::Boolean(true));
        assert_eq!(parse_value("\"quoted\""), DocumentNode::String("quoted".to_string()));
        assert!(parse_value("[1, 2]").is_array());
        assert!(parse_value("{ a = 1 }").is_table());
    }

    #[test]
    fn test_parse_value_falls_back_to_string() {
        assert_eq!(parse_value("dark mode"), DocumentNode::String("dark mode".to_string()));
    }

    #[test]
    fn test_parse_route() {
        let (location, path) = parse_route("user.toml=/ui/theme").unwrap();
        assert_eq!(location, "user.toml");
        assert_eq!(path.to_string(), "/ui/theme");
    }

    #[test]
    fn test_parse_route_requires_separator() {
        assert!(parse_route("user.toml").is_err());
        assert!(parse_route("user.toml=/a[").is_err());
    }

    #[test]
    fn test_specs_attach_routes_to_sources() {
        let args = SourceArgs {
            sources: vec!["base.toml".to_string(), "user.toml".to_string()],
            routes: vec!["user.toml=/user".to_string()]
        };

        let specs = args.specs().unwrap();
        assert!(specs[0].routes.is_empty());
        assert_eq!(specs[1].routes[0].to_string(), "/user");
    }

    #[test]
    fn test_specs_reject_route_to_unknown_source() {
        let args = SourceArgs {
            sources: vec!["base.toml".to_string()],
            routes: vec!["other.toml=/user".to_string()]
        };
        assert!(args.specs().is_err());
    }

    #[test]
    fn test_render_node() {
        assert_eq!(render_node(&DocumentNode::String("x".to_string())), "x");
        assert_eq!(render_node(&DocumentNode::Integer(3)), "3");
    }
}
