// SPDX-License-Identifier: GPL-3.0

use crate::Error;
use std::{fmt, fs, path::Path, str::FromStr};
use strum::{EnumMessage, IntoEnumIterator};
use strum_macros::{EnumIter, EnumMessage as EnumMessageDerive, EnumString};
use toml_edit::{DocumentMut, value};

/// The node configuration written for new chains.
pub const DEFAULT_CONFIG: &str = r#"# chainctl node configuration

moniker = "default"
seeds = ""
fast_sync = false
db_backend = "leveldb"
log_level = "info"
node_laddr = "tcp://0.0.0.0:46656"
rpc_laddr = "tcp://0.0.0.0:46657"

[chain]
genesis_file = "genesis.json"
"#;

/// The configuration keys which can be set from the command line.
#[derive(Clone, Copy, Debug, EnumIter, EnumMessageDerive, EnumString, PartialEq, Eq)]
pub enum ConfigKey {
	#[strum(serialize = "moniker", message = "The name of the node")]
	Moniker,
	#[strum(serialize = "seeds", message = "Comma separated peers to connect to")]
	Seeds,
	#[strum(
		serialize = "fast_sync",
		serialize = "fast-sync",
		message = "Whether to sync blocks from peers in bulk (true or false)"
	)]
	FastSync,
	#[strum(serialize = "db_backend", serialize = "db-backend", message = "The database backend")]
	DbBackend,
	#[strum(serialize = "log_level", serialize = "log-level", message = "The log level")]
	LogLevel,
	#[strum(
		serialize = "node_laddr",
		serialize = "p2p",
		message = "The address peers connect to"
	)]
	NodeLaddr,
	#[strum(serialize = "rpc_laddr", serialize = "rpc", message = "The address of the RPC server")]
	RpcLaddr,
}

impl ConfigKey {
	/// The key as written in the configuration file.
	pub fn key(&self) -> &'static str {
		match self {
			ConfigKey::Moniker => "moniker",
			ConfigKey::Seeds => "seeds",
			ConfigKey::FastSync => "fast_sync",
			ConfigKey::DbBackend => "db_backend",
			ConfigKey::LogLevel => "log_level",
			ConfigKey::NodeLaddr => "node_laddr",
			ConfigKey::RpcLaddr => "rpc_laddr",
		}
	}

	/// A human readable list of the supported keys, for help output.
	pub fn help() -> String {
		ConfigKey::iter()
			.map(|k| format!("{}: {}", k.key(), k.get_message().unwrap_or_default()))
			.collect::<Vec<_>>()
			.join("\n")
	}
}

/// A `key=value` assignment of a configuration key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigOption {
	pub key: ConfigKey,
	pub value: String,
}

impl FromStr for ConfigOption {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (key, value) = s.split_once('=').ok_or_else(|| {
			Error::Validation(format!("config options are given as key=value, got `{s}`"))
		})?;
		let key = key.trim();
		let value = value.trim().to_string();
		let key: ConfigKey = key.parse().map_err(|_| Error::UnknownConfigKey(key.to_string()))?;
		if key == ConfigKey::FastSync && value.parse::<bool>().is_err() {
			return Err(Error::Validation(format!(
				"fast_sync must be true or false, got `{value}`"
			)));
		}
		Ok(Self { key, value })
	}
}

impl fmt::Display for ConfigOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}={}", self.key.key(), self.value)
	}
}

/// Renders the default configuration with the given options applied, leaving the rest of the
/// document untouched.
pub fn with_options(options: &[ConfigOption]) -> Result<String, Error> {
	let mut doc = DEFAULT_CONFIG
		.parse::<DocumentMut>()
		.map_err(|e| Error::Validation(format!("invalid default configuration: {e}")))?;
	for option in options {
		doc[option.key.key()] = match option.key {
			ConfigKey::FastSync => value(option.value == "true"),
			_ => value(option.value.as_str()),
		};
	}
	Ok(doc.to_string())
}

/// Reads a configuration file, which must be valid TOML. The content is used verbatim.
pub fn read(path: &Path) -> Result<Vec<u8>, Error> {
	let artifact = |reason: String| Error::Artifact { path: path.to_path_buf(), reason };
	let content = fs::read_to_string(path).map_err(|e| artifact(e.to_string()))?;
	content.parse::<DocumentMut>().map_err(|e| artifact(e.to_string()))?;
	Ok(content.into_bytes())
}
