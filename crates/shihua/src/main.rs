use anyhow::Result;
use clap::Parser;
use shihua_config::ShihuaConfig;
use shihua_favorites::FavoritesStore;
use shihua_generator::StaticCorpusGenerator;
use tracing_subscriber::EnvFilter;

mod cli;
mod config_cmds;
mod favorites_cmd;
mod generate_cmd;
mod render;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for --format json.
    // Warnings show unless RUST_LOG says otherwise.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let format = cli.format;
    let config = ShihuaConfig::load(cli.config.as_deref())?;
    tracing::debug!(
        favorites_dir = %config.storage.favorites_dir().display(),
        key = %config.storage.collection_key,
        "configuration loaded"
    );

    let output = match cli.command {
        Commands::Generate { image, save } => {
            let generator = StaticCorpusGenerator::from_config(&config.generator);
            let store = save.then(|| FavoritesStore::from_config(&config.storage));
            generate_cmd::handle_generate(&generator, store.as_ref(), &image, format).await?
        }
        Commands::List => {
            let store = FavoritesStore::from_config(&config.storage);
            let listed = favorites_cmd::handle_list(&store, format).await?;
            if let Some(warning) = listed.warning {
                eprintln!("{warning}");
            }
            listed.stdout
        }
        Commands::Show { id } => {
            let store = FavoritesStore::from_config(&config.storage);
            favorites_cmd::handle_show(&store, &id, format).await?
        }
        Commands::Remove { id } => {
            let store = FavoritesStore::from_config(&config.storage);
            favorites_cmd::handle_remove(&store, &id, format).await?
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => config_cmds::handle_config_show(&config, format)?,
            ConfigCommands::Path => config_cmds::handle_config_path(cli.config.as_deref())?,
        },
    };

    print!("{output}");
    Ok(())
}
