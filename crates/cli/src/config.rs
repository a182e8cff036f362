//! Settings file lookup.
//!
//! An explicit `--config FILE` must exist. Otherwise
//! `<config dir>/olsend/config.json` is read when present and defaults are
//! used when it is not.

use std::path::{Path, PathBuf};

use olsend::MailerConfig;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_DIR_NAME: &str = "olsend";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid config {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

/// Where settings are read from when no path is given.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Loads settings from `explicit`, or from the default location if it exists.
pub fn load(explicit: Option<&Path>) -> Result<MailerConfig, ConfigError> {
	if let Some(path) = explicit {
		return read(path);
	}

	match default_config_path() {
		Some(path) if path.is_file() => read(&path),
		_ => {
			debug!(target = "olsend.config", "no config file; using defaults");
			Ok(MailerConfig::default())
		}
	}
}

fn read(path: &Path) -> Result<MailerConfig, ConfigError> {
	let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
		path: path.to_path_buf(),
		source,
	})?;
	debug!(target = "olsend.config", path = %path.display(), "loaded config");
	Ok(config)
}
