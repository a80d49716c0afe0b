use colored::Colorize;

pub fn hint(msg: &str) {
    println!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn info(msg: &str) {
    eprintln!("{} {}", "info:".blue().bold(), msg);
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_does_not_panic() {
        hint("Pass --source to name a document");
    }

    #[test]
    fn test_info_does_not_panic() {
        info("Routed /user to user.toml");
    }

    #[test]
    fn test_warn_does_not_panic() {
        warn("Nothing persisted yet");
    }

    #[test]
    fn test_success_does_not_panic() {
        success("Saved /port");
    }
}
