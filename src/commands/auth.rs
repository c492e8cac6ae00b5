use super::{connect, load, open_store, success};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io;
use std::path::Path;
use yt_console::session;

/// Execute the login command
pub async fn login(config_path: &Path, email: String, password: Option<String>) -> Result<()> {
    let cfg = load(config_path)?;
    let client = connect(&cfg, "/login")?;

    let password = resolve_password(password, || rpassword::prompt_password("Password: "))?;

    println!("{}", "Signing in...".yellow());
    let credentials = session::login(&client, &email, &password).await?;

    success("Logged in");
    if let Some(account_id) = &credentials.account_id {
        println!("  {}: {}", "Account".cyan(), account_id);
    }
    if credentials.refresh_token.is_none() {
        println!(
            "  {} No refresh token issued; you will need to log in again when the session expires",
            "ℹ".dimmed()
        );
    }
    Ok(())
}

/// Execute the logout command
pub fn logout(config_path: &Path) -> Result<()> {
    let cfg = load(config_path)?;
    let store = open_store(&cfg)?;
    session::logout(store.as_ref())?;
    success("Logged out");
    Ok(())
}

/// Execute the status command
pub fn status(config_path: &Path) -> Result<()> {
    let cfg = load(config_path)?;
    let store = open_store(&cfg)?;
    let status = session::session_status(store.as_ref());

    println!("{}", "Session:".bold());
    println!("  {}: {}", "Credentials".cyan(), store.path().display());
    println!(
        "  {}: {}",
        "Logged in".cyan(),
        if status.authenticated {
            "yes".green()
        } else {
            "no".red()
        }
    );
    println!(
        "  {}: {}",
        "Account".cyan(),
        status.account_id.as_deref().unwrap_or("-")
    );
    println!("  {}: {}", "Access token".cyan(), status.access_token);
    println!("  {}: {}", "Refresh token".cyan(), status.refresh_token);
    if status.authenticated && !status.can_refresh {
        println!(
            "  {} Session cannot be refreshed automatically",
            "ℹ".dimmed()
        );
    }
    Ok(())
}

/// Password from the flag or environment, else read from the terminal without echo
fn resolve_password<F>(password: Option<String>, prompt: F) -> Result<String>
where
    F: FnOnce() -> io::Result<String>,
{
    match password {
        Some(password) => Ok(password),
        None => prompt().context("Failed to read password"),
    }
}
