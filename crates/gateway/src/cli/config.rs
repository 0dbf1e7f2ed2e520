use lb_domain::config::{Config, ConfigSeverity};

/// Validate the config and print every issue, errors first.
///
/// Returns `false` when at least one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let mut issues = config.validate();
    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }
    issues.sort_by_key(|i| i.severity != ConfigSeverity::Error);

    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    for issue in &issues {
        println!("{issue}");
    }
    println!(
        "\n{errors} error(s), {} warning(s) in {config_path}",
        issues.len() - errors
    );

    errors == 0
}

/// Print the effective config (file values plus defaults) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("serializing config: {e}"))?;
    print!("{rendered}");
    Ok(())
}
