use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::app::ViewMode;
use crate::popup::PopupMetrics;

const APP_DIR: &str = "task_calendar";
const SETTINGS_FILE: &str = "settings.toml";
const MIN_HIDE_DELAY_MS: u64 = 20;
const MAX_HIDE_DELAY_MS: u64 = 1_000;
const MIN_TICK_RATE_MS: u64 = 16;
const MAX_TICK_RATE_MS: u64 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read settings '{path}': {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse settings '{path}': {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub default_view: ViewMode,
	pub confirm_delete: bool,
	pub seed_demo_tasks: bool,
	pub tooltip_hide_delay_ms: u64,
	pub tick_rate_ms: u64,
	pub popup: PopupMetrics,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			default_view: ViewMode::Month,
			confirm_delete: true,
			seed_demo_tasks: true,
			tooltip_hide_delay_ms: 100,
			tick_rate_ms: 250,
			popup: PopupMetrics::default(),
		}
	}
}

impl Settings {
	/// Missing or broken settings files fall back to defaults.
	pub fn load(path: &Path) -> Self {
		match Self::load_from_path(path) {
			Ok(Some(settings)) => {
				debug!("loaded settings from {}", path.display());
				settings
			}
			Ok(None) => Self::default(),
			Err(err) => {
				warn!("{err}");
				Self::default()
			}
		}
	}

	pub fn load_from_path(path: &Path) -> Result<Option<Self>, ConfigError> {
		let raw = match fs::read_to_string(path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
			Err(source) => {
				return Err(ConfigError::Read {
					path: path.to_path_buf(),
					source,
				});
			}
		};

		let mut settings = Self::parse(&raw).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		settings.validate();
		Ok(Some(settings))
	}

	pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(raw)
	}

	pub fn validate(&mut self) {
		self.tooltip_hide_delay_ms = self
			.tooltip_hide_delay_ms
			.clamp(MIN_HIDE_DELAY_MS, MAX_HIDE_DELAY_MS);
		self.tick_rate_ms = self.tick_rate_ms.clamp(MIN_TICK_RATE_MS, MAX_TICK_RATE_MS);
		self.popup.clamp();
	}

	pub fn hide_delay(&self) -> Duration {
		Duration::from_millis(self.tooltip_hide_delay_ms)
	}

	pub fn tick_rate(&self) -> Duration {
		Duration::from_millis(self.tick_rate_ms)
	}
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_path {
		return path;
	}

	if let Some(path) = env::var_os("TASK_CALENDAR_CONFIG") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return path;
		}
	}

	config_dir().join(SETTINGS_FILE)
}

fn config_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("APPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".config").join(APP_DIR);
	}

	PathBuf::from(format!(".{APP_DIR}"))
}

pub fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os("TASK_CALENDAR_STATE_DIR") {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(format!(".{APP_DIR}"))
}
