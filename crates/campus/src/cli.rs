use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "campus")]
#[command(version, about = "Keep the campus app configuration in sync with the server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Data directory (default: platform app directories)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config server base URL (overrides settings)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// App version sent to the config server (overrides settings)
    #[arg(long, global = true)]
    pub app_version: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the loaded university, bus and semester configuration
    Status,

    /// Check the server for newer configuration files
    Check,

    /// Download and install newer configuration files
    Update,

    /// Print a configuration file
    Show {
        /// File name, e.g. app_config.json
        file: String,
    },

    /// Delete all configuration files and reset their versions
    Reset,
}
