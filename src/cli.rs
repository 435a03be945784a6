use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "playlist-export")]
#[command(about = "Sign in to the playlist export server and download your playlists as CSV")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// JSON file layered over the builtin configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Export server base URL, e.g. http://localhost:8000
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory the CSV exports are written to
    #[arg(short, long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Cookie header value of an existing browser session
    #[arg(long, global = true)]
    pub session_cookie: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the interactive panel (default)
    Interactive,

    /// Show whether the server considers this client signed in
    Status,

    /// Open the server's login page in the system browser
    Login,

    /// End the server session
    Logout,

    /// Run one export and save both CSV files
    Export,

    /// List saved exports, or summarize one CSV file
    Inspect {
        /// File to summarize; relative names are also looked up in the download directory
        file: Option<PathBuf>,
    },
}

impl Cli {
    pub fn selected_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Interactive)
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            download_dir: self.download_dir.clone(),
            session_cookie: self.session_cookie.clone(),
        }
    }

    /// Default `env_logger` filter; `RUST_LOG` still takes precedence.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
