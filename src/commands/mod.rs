//! Command implementations for the CLI
//!
//! - auth: login, logout, session status
//! - projects: managed channels and their authorization
//! - videos: channel videos, localizations, analytics
//! - monitor: monitored channels and trending videos
//! - config: configuration display and validation

pub mod auth;
pub mod config;
pub mod monitor;
pub mod projects;
pub mod videos;

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::path::Path;
use std::sync::Arc;
use yt_console::client::{ApiClient, Navigator};
use yt_console::config::Config;
use yt_console::credentials::{CredentialStore, FileCredentialStore};
use yt_console::error::AppError;

/// Tells the operator to log in again instead of redirecting a browser
pub struct TerminalNavigator {
    location: String,
}

impl TerminalNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_location(&self) -> String {
        self.location.clone()
    }

    fn navigate(&self, target: &str) {
        tracing::debug!(redirect = %target, "Login redirect requested");
        eprintln!(
            "{} Session expired. Run {} to sign in again.",
            "!".yellow().bold(),
            "yt-console login --email <EMAIL>".cyan()
        );
    }
}

/// Open the credential store named by the configuration
pub fn open_store(config: &Config) -> Result<Arc<FileCredentialStore>> {
    let path = config.storage.credentials_path();
    let store = FileCredentialStore::open(&path)
        .with_context(|| format!("Failed to open credential store at {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Build an API client for a command; `location` names the command for redirects
pub fn connect(config: &Config, location: &str) -> Result<ApiClient> {
    let store: Arc<dyn CredentialStore> = open_store(config)?;
    let navigator = Arc::new(TerminalNavigator::new(location));
    let client = ApiClient::from_config(&config.api, store, navigator)?;
    Ok(client)
}

pub fn load(config_path: &Path) -> Result<Config> {
    yt_console::config::load_config(config_path)
}

/// Table with the CLI's standard look
pub fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

/// Print a success line
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Map an expired session to a short message; the navigator already printed the hint
pub fn finish<T>(result: Result<T, AppError>) -> Result<T> {
    match result {
        Err(AppError::SessionExpired) => Err(anyhow::anyhow!("Not logged in")),
        other => Ok(other?),
    }
}

/// Shorten long text for table cells
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
