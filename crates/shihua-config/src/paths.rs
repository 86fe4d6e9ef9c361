use std::path::PathBuf;

/// XDG app name used for config and state directories.
pub const APP_NAME: &str = "shihua";

const CONFIG_FILE_NAME: &str = "config.toml";
const FAVORITES_DIR_NAME: &str = "favorites";

fn project_config_dir(app_name: &str) -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", app_name).map(|dirs| dirs.config_dir().to_path_buf())
}

fn project_state_dir(app_name: &str) -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", app_name).map(|dirs| {
        dirs.state_dir()
            .unwrap_or_else(|| dirs.data_local_dir())
            .to_path_buf()
    })
}

/// Config directory, if the platform has a home directory.
pub fn config_dir() -> Option<PathBuf> {
    project_config_dir(APP_NAME)
}

/// Default location of `config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

pub fn state_dir() -> Option<PathBuf> {
    project_state_dir(APP_NAME)
}

pub fn state_dir_fallback() -> PathBuf {
    std::env::temp_dir().join(format!("{APP_NAME}-state"))
}

/// Directory holding the favorites key-value files.
pub fn default_favorites_dir() -> PathBuf {
    state_dir()
        .unwrap_or_else(state_dir_fallback)
        .join(FAVORITES_DIR_NAME)
}
