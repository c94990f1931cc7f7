// SPDX-License-Identifier: GPL-3.0

use anyhow::{Context, Result, anyhow};
use chainctl_chains::ChainDefaults;
use chainctl_common::docker::DEFAULT_BINARY;
use serde::Deserialize;
use std::{
	env,
	fs::read_to_string,
	path::{Path, PathBuf},
};

/// Overrides the directory holding settings and chain definitions.
pub(crate) const HOME_VARIABLE: &str = "CHAINCTL_HOME";
/// Overrides the container runtime client.
pub(crate) const DOCKER_VARIABLE: &str = "CHAINCTL_DOCKER";
const SETTINGS_FILE: &str = "config.toml";

/// The directory holding settings and chain definitions: `$CHAINCTL_HOME`, or `~/.chainctl`.
pub(crate) fn root() -> Result<PathBuf> {
	if let Some(home) = env::var_os(HOME_VARIABLE).filter(|h| !h.is_empty()) {
		return Ok(PathBuf::from(home));
	}
	Ok(dirs::home_dir()
		.ok_or(anyhow!("the home directory could not be determined"))?
		.join(".chainctl"))
}

/// User settings, read from `config.toml` in the root directory.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
	/// The container runtime client.
	docker: Option<PathBuf>,
	/// The image new chains run.
	chain_image: Option<String>,
	/// The image of data containers.
	data_image: Option<String>,
	/// The command new chains are started with.
	chain_command: Option<Vec<String>>,
}

impl Settings {
	/// Loads the settings stored under `root`; a missing file yields the defaults.
	pub(crate) fn load(root: &Path) -> Result<Self> {
		let path = root.join(SETTINGS_FILE);
		if !path.exists() {
			return Ok(Self::default());
		}
		let contents = read_to_string(&path)?;
		toml::from_str(&contents).with_context(|| format!("invalid settings in {}", path.display()))
	}

	/// The container runtime client: `$CHAINCTL_DOCKER`, the configured client, or `docker`.
	pub(crate) fn docker(&self) -> PathBuf {
		env::var_os(DOCKER_VARIABLE)
			.filter(|d| !d.is_empty())
			.map(PathBuf::from)
			.or_else(|| self.docker.clone())
			.unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY))
	}

	/// The defaults applied to new chains.
	pub(crate) fn defaults(&self) -> ChainDefaults {
		let defaults = ChainDefaults::default();
		ChainDefaults {
			image: self.chain_image.clone().unwrap_or(defaults.image),
			data_image: self.data_image.clone().unwrap_or(defaults.data_image),
			command: self.chain_command.clone().unwrap_or(defaults.command),
		}
	}
}
