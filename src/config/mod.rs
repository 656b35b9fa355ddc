mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Locations searched when no config file is given, in order.
pub const DEFAULT_PATHS: [&str; 2] = ["./ogvframes.toml", "~/.config/ogvframes/config.toml"];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let path = expand(path);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path.to_path_buf(),
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.demux.max_streams == 0 {
        anyhow::bail!("demux.max_streams cannot be 0");
    }

    if config.demux.read_chunk_size == 0 {
        anyhow::bail!("demux.read_chunk_size cannot be 0");
    }

    if config.demux.resync_limit < ogvframes_media::ogg::HEADER_LEN {
        tracing::warn!(
            "demux.resync_limit of {} bytes is smaller than a page header",
            config.demux.resync_limit
        );
    }

    Ok(())
}
