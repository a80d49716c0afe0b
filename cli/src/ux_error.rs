use colored::Colorize;

#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
    pub suggested_command: Option<String>,
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why: None,
            how_to_fix: Vec::new(),
            suggested_command: None,
        }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn suggest(mut self, cmd: impl Into<String>) -> Self {
        self.suggested_command = Some(cmd.into());
        self
    }

    pub fn display(&self) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), self.what.white().bold());

        if let Some(why) = &self.why {
            eprintln!("       {}", why.dimmed());
        }

        if !self.how_to_fix.is_empty() {
            eprintln!();
            eprintln!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, fix);
            }
        }

        if let Some(cmd) = &self.suggested_command {
            eprintln!();
            eprintln!("{}", "Try this:".green().bold());
            eprintln!("  $ {}", cmd.cyan());
        }
        eprintln!();
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn no_sources() -> UxError {
    UxError::new("No configuration source given")
        .why("Every command reads from or writes to at least one document")
        .fix("Pass one or more documents with --source, lowest precedence first")
        .fix("Or set LIVECFG_SOURCES to a comma-separated list of documents")
        .suggest("livecfg --source app.toml dump")
}

pub fn invalid_route(raw: &str) -> UxError {
    UxError::new(format!("Invalid route '{}'", raw))
        .why("Routes are written as LOCATION=PATH")
        .suggest("livecfg --source base.toml --source user.toml --route user.toml=/user dump")
}

pub fn unknown_route_source(location: &str) -> UxError {
    UxError::new(format!("Route refers to unknown source '{}'", location))
        .why("A route can only name a location that is also passed with --source")
        .fix(format!("Add --source {}", location))
}

pub fn path_not_found(path: &str, reason: &str) -> UxError {
    UxError::new(format!("Nothing at '{}'", path))
        .why(reason.to_string())
        .fix("Inspect the merged document to find the right path")
        .suggest("livecfg dump")
}
