use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use yt_console::config::LoggingConfig;
use yt_console::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    // Logging settings come from the config file when it is readable
    let logging = yt_console::config::load_config(&args.config)
        .map(|cfg| cfg.logging)
        .unwrap_or_else(|_| LoggingConfig::default());
    init_tracing(&logging);

    let config_path = args.config.as_path();

    // Dispatch to appropriate command handler
    match args.get_command() {
        cli::Commands::Login { email, password } => {
            commands::auth::login(config_path, email, password).await?;
        }
        cli::Commands::Logout => {
            commands::auth::logout(config_path)?;
        }
        cli::Commands::Status => {
            commands::auth::status(config_path)?;
        }
        cli::Commands::Projects { action } => {
            commands::projects::execute(config_path, action).await?;
        }
        cli::Commands::Videos { action } => {
            commands::videos::execute(config_path, action).await?;
        }
        cli::Commands::Monitor { action } => {
            commands::monitor::execute(config_path, action).await?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(config_path)?,
            cli::ConfigCommands::Validate => commands::config::validate(config_path)?,
        },
        cli::Commands::Version => {
            println!("yt-console v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
