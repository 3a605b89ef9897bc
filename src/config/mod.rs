mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./pixelstore.toml",
        "./config.toml",
        "~/.config/pixelstore/config.toml",
        "/etc/pixelstore/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand_paths(config: &mut Config) {
    let root = config.storage.root.to_string_lossy();
    if root.starts_with('~') {
        config.storage.root = PathBuf::from(shellexpand::tilde(root.as_ref()).into_owned());
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.storage.root.as_os_str().is_empty() {
        anyhow::bail!("Storage root cannot be empty");
    }

    if config.storage.static_prefix.trim_matches(['/', '\\']).is_empty() {
        tracing::warn!("storage.static_prefix is empty; images are served from the site root");
    }

    if config.storage.root.exists() && !config.storage.root.is_dir() {
        anyhow::bail!("Storage root is not a directory: {:?}", config.storage.root);
    }

    for warning in config.compression.validate() {
        tracing::warn!("{}", warning);
    }

    Ok(())
}
