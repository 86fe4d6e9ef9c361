use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shihua_core::OutputFormat;

#[derive(Parser)]
#[command(name = "shihua")]
#[command(about = "诗画同源: turn photos into classical poems and keep your favorites")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Config file (defaults to ~/.config/shihua/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a poem for an image
    Generate {
        /// Image path or URI
        image: String,

        /// Also save the poem to favorites
        #[arg(long)]
        save: bool,
    },

    /// List favorite poems, newest first
    List,

    /// Show one favorite (ID or unique prefix)
    Show { id: String },

    /// Remove a favorite (ID or unique prefix)
    Remove { id: String },

    /// Show configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}
