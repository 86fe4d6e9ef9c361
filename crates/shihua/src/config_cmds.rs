use std::path::Path;

use anyhow::{Result, bail};
use shihua_config::{ShihuaConfig, paths};
use shihua_core::OutputFormat;

pub(crate) fn handle_config_show(config: &ShihuaConfig, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)? + "\n"),
        OutputFormat::Text => {
            let mut out = config.to_toml_string()?;
            out.push_str(&format!(
                "\n# favorites directory: {}\n",
                config.storage.favorites_dir().display()
            ));
            Ok(out)
        }
    }
}

pub(crate) fn handle_config_path(explicit: Option<&Path>) -> Result<String> {
    if let Some(path) = explicit {
        return Ok(format!("{}\n", path.display()));
    }
    match paths::default_config_path() {
        Some(path) => Ok(format!("{}\n", path.display())),
        None => bail!("Cannot determine config directory"),
    }
}
