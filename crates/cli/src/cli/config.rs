use rd_domain::config::{redact_token, Config, ConfigSeverity};

/// Validate the config, printing any issues.  Returns `false` when at
/// least one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Render the resolved config as TOML with the token masked.
pub fn render(config: &Config) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if !shown.api_token.is_empty() {
        shown.api_token = redact_token(&shown.api_token);
    }
    Ok(toml::to_string_pretty(&shown)?)
}

pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_masks_the_token() {
        let config = Config {
            api_token: "abcdef123456".into(),
            ..Config::default()
        };
        let out = render(&config).unwrap();
        assert!(out.contains("target_ip = \"127.0.0.1\""));
        assert!(!out.contains("abcdef123456"));
        assert!(out.contains("abcd"));
    }

    #[test]
    fn validate_reports_errors() {
        let bad = Config {
            target_ip: "nope".into(),
            ..Config::default()
        };
        assert!(!validate(&bad, "test.toml"));
        assert!(validate(&Config::default(), "test.toml"));
    }
}
