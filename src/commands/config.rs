use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tracing::info;
use yt_console::config::{self, Config};

/// Execute the config show command
///
/// Displays the effective configuration (file, environment and defaults merged)
pub fn show(config_path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!(path = %config_path.display(), "Loading configuration for display");

    let cfg = config::load_config(config_path)?;

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&cfg)?;
    println!("{}", toml_string);
    println!(
        "  {}: {}",
        "Credential file".cyan(),
        cfg.storage.credentials_path().display()
    );

    Ok(())
}

/// Execute the config validate command
pub fn validate(config_path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!(path = %config_path.display(), "Validating configuration file");

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    print_summary(&cfg);

    Ok(())
}

fn print_summary(cfg: &Config) {
    println!("{}", "Summary:".bold());
    println!("  {}: {}", "API".cyan(), cfg.api.base_url);
    println!("  {}: {}", "Refresh endpoint".cyan(), cfg.api.refresh_url);
    println!(
        "  {}: {}",
        "Request timeout".cyan(),
        describe_timeout(cfg.api.request_timeout_secs)
    );
    println!(
        "  {}: {}",
        "Refresh timeout".cyan(),
        describe_timeout(cfg.api.refresh_timeout_secs)
    );
    println!(
        "  {}: {}",
        "Max refresh cycles".cyan(),
        cfg.api.max_refresh_cycles
    );
    println!(
        "  {}: {} ({})",
        "Logging".cyan(),
        cfg.logging.level,
        cfg.logging.format
    );
}

fn describe_timeout(secs: Option<u64>) -> String {
    match secs {
        Some(secs) => format!("{}s", secs),
        None => "transport default".to_string(),
    }
}
