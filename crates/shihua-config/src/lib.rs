//! Configuration loading and validation (`~/.config/shihua/config.toml`).

pub mod config;
pub mod paths;

pub use config::{GeneratorConfig, ShihuaConfig, StorageConfig};
pub use paths::APP_NAME;
