use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "yt-console", version, about = "YouTube channel management console")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true, env = "YT_CONSOLE_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store credentials
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (prompted for when omitted)
        #[arg(short, long, env = "YT_CONSOLE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Remove stored credentials
    Logout,

    /// Show the current session (default)
    Status,

    /// Managed channels
    Projects {
        #[command(subcommand)]
        action: ProjectCommands,
    },

    /// Channel videos, localizations and analytics
    Videos {
        #[command(subcommand)]
        action: VideoCommands,
    },

    /// Monitored channels and trending videos
    Monitor {
        #[command(subcommand)]
        action: MonitorCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommands {
    /// List managed channels
    List,

    /// Create a managed channel
    Create {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Update a managed channel
    Update {
        id: i64,

        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Delete a managed channel
    Delete { id: i64 },

    /// Print the authorization URL and wait for the grant
    Authorize {
        id: i64,

        /// Print the URL without waiting
        #[arg(long)]
        no_wait: bool,
    },

    /// Sync all channel data
    Sync { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum VideoCommands {
    /// List a channel's videos
    List {
        /// Channel (project) id
        channel: String,

        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short = 's', long, default_value = "10")]
        page_size: u32,

        /// Filter by video id
        #[arg(long)]
        video_id: Option<String>,

        /// Filter by title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List languages available for localization
    Languages,

    /// Add localized titles and descriptions to a video
    AddLang {
        video_id: String,

        /// Language codes, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        langs: Vec<String>,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Daily analytics for a video, newest first
    Analytics {
        video_id: String,

        /// Only show days on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only show days on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MonitorCommands {
    /// List monitored channels
    List,

    /// Start monitoring a channel
    Add {
        /// Channel id on the platform
        channel_id: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        remark: String,
    },

    /// Rename a monitored channel
    Rename { id: i64, name: String },

    /// Stop monitoring a channel
    Remove { id: i64 },

    /// Videos with the largest view growth
    Trending {
        /// Comma separated title keywords
        #[arg(short, long, default_value = "reelshort,dramabox")]
        title: String,

        /// Minimum view growth
        #[arg(short, long)]
        min_delta_views: Option<u64>,
    },

    /// Hide a video from trending results
    Ignore { video_id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Status if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_status() {
        let cli = Cli {
            config: PathBuf::from("config.toml"),
            command: None,
        };
        assert!(matches!(cli.get_command(), Commands::Status));
    }

    #[test]
    fn test_cli_parsing_login() {
        let args = vec!["yt-console", "login", "--email", "ops@example.com", "--password", "pw"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Login { email, password } => {
                assert_eq!(email, "ops@example.com");
                assert_eq!(password.as_deref(), Some("pw"));
            }
            _ => panic!("Expected Login command"),
        }
    }

    #[test]
    fn test_cli_parsing_video_list() {
        let args = vec!["yt-console", "videos", "list", "12", "--page", "3", "--title", "ep"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Videos {
                action:
                    VideoCommands::List {
                        channel,
                        page,
                        page_size,
                        title,
                        video_id,
                    },
            } => {
                assert_eq!(channel, "12");
                assert_eq!(page, 3);
                assert_eq!(page_size, 10);
                assert_eq!(title.as_deref(), Some("ep"));
                assert!(video_id.is_none());
            }
            _ => panic!("Expected videos list command"),
        }
    }

    #[test]
    fn test_cli_parsing_add_lang_splits_languages() {
        let args = vec![
            "yt-console", "videos", "add-lang", "abc", "--langs", "en,ja", "--title", "Hello",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Videos {
                action: VideoCommands::AddLang { langs, title, .. },
            } => {
                assert_eq!(langs, vec!["en", "ja"]);
                assert_eq!(title, "Hello");
            }
            _ => panic!("Expected add-lang command"),
        }
    }

    #[test]
    fn test_cli_parsing_trending_defaults() {
        let cli = Cli::try_parse_from(vec!["yt-console", "monitor", "trending"]).unwrap();

        match cli.get_command() {
            Commands::Monitor {
                action: MonitorCommands::Trending { title, min_delta_views },
            } => {
                assert_eq!(title, "reelshort,dramabox");
                assert!(min_delta_views.is_none());
            }
            _ => panic!("Expected trending command"),
        }
    }
}
