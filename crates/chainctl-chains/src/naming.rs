// SPDX-License-Identifier: GPL-3.0

//! Deterministic naming of everything belonging to a chain instance.

use crate::Error;
use serde::Serialize;
use std::{
	fmt,
	path::{Path, PathBuf},
};
use strum_macros::{AsRefStr, Display, EnumString};

/// The prefix of every container managed by chainctl.
pub const CONTAINER_PREFIX: &str = "chainctl";
/// The home directory inside chain containers, backed by the data container's volume.
pub const HOME: &str = "/home/chainctl/.chainctl";
/// The name of the genesis document within a chain directory.
pub const GENESIS_FILE: &str = "genesis.json";
/// The name of the node configuration within a chain directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Identifies a chain instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChainKey {
	pub name: String,
	pub instance: u32,
}

impl ChainKey {
	/// Creates a key for the given chain name and instance number.
	///
	/// # Arguments
	/// * `name` - The chain name, consisting of `[a-zA-Z0-9_.-]` and starting alphanumeric.
	/// * `instance` - The instance number, starting at 1.
	pub fn new(name: impl Into<String>, instance: u32) -> Result<Self, Error> {
		let name = name.into();
		validate_name(&name)?;
		if instance == 0 {
			return Err(Error::Validation("instance numbers start at 1".into()));
		}
		Ok(Self { name, instance })
	}

	/// The same instance number under another chain name.
	pub fn renamed(&self, name: impl Into<String>) -> Result<Self, Error> {
		Self::new(name, self.instance)
	}

	/// The name of the service container running the chain node.
	pub fn service_container(&self) -> String {
		container_name(ContainerKind::Chain, &self.name, self.instance)
	}

	/// The name of the data container holding the chain's persistent volume.
	pub fn data_container(&self) -> String {
		container_name(ContainerKind::Data, &self.name, self.instance)
	}
}

impl fmt::Display for ChainKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.instance == 1 {
			f.write_str(&self.name)
		} else {
			write!(f, "{}:{}", self.name, self.instance)
		}
	}
}

/// The kinds of containers making up a chain.
#[derive(AsRefStr, Clone, Copy, Debug, Display, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum ContainerKind {
	/// The container running the chain node.
	Chain,
	/// The container owning the persistent volume.
	Data,
}

/// Formats a container name, e.g. `chainctl_chain_mychain_1`.
pub fn container_name(kind: ContainerKind, name: &str, instance: u32) -> String {
	format!("{CONTAINER_PREFIX}_{}_{name}_{instance}", kind.as_ref())
}

/// Parses a container name created by [`container_name`].
pub fn parse_container_name(container: &str) -> Option<(ContainerKind, ChainKey)> {
	let container = container.trim_start_matches('/');
	let rest = container.strip_prefix(CONTAINER_PREFIX)?.strip_prefix('_')?;
	let (kind, rest) = rest.split_once('_')?;
	let kind: ContainerKind = kind.parse().ok()?;
	let (name, instance) = rest.rsplit_once('_')?;
	let key = ChainKey::new(name, instance.parse().ok()?).ok()?;
	Some((kind, key))
}

/// Validates a chain name.
pub fn validate_name(name: &str) -> Result<(), Error> {
	let mut chars = name.chars();
	match chars.next() {
		None => return Err(Error::Validation("a chain name is required".into())),
		Some(c) if !c.is_ascii_alphanumeric() => {
			return Err(Error::Validation(format!(
				"invalid chain name `{name}`: names must start with a letter or digit"
			)));
		},
		Some(_) => {},
	}
	if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))) {
		return Err(Error::Validation(format!("invalid chain name `{name}`: `{c}` is not allowed")));
	}
	Ok(())
}

/// The directory of a chain inside its containers.
pub fn chain_dir(chain_id: &str) -> String {
	format!("{HOME}/chains/{chain_id}")
}

/// The path of the genesis document inside chain containers.
pub fn genesis_path(chain_id: &str) -> String {
	format!("{}/{GENESIS_FILE}", chain_dir(chain_id))
}

/// The path of the node configuration inside chain containers.
pub fn config_path(chain_id: &str) -> String {
	format!("{}/{CONFIG_FILE}", chain_dir(chain_id))
}

/// The local file holding the definition of a chain instance.
pub fn definition_file(root: &Path, key: &ChainKey) -> PathBuf {
	root.join("chains").join(format!("{}_{}.toml", key.name, key.instance))
}

/// The local file holding a service definition.
pub fn service_file(root: &Path, name: &str) -> PathBuf {
	root.join("services").join(format!("{name}.toml"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn container_names_are_deterministic() -> Result<(), Error> {
		let key = ChainKey::new("mychain", 1)?;
		assert_eq!(key.service_container(), "chainctl_chain_mychain_1");
		assert_eq!(key.data_container(), "chainctl_data_mychain_1");
		assert_eq!(
			ChainKey::new("my_chain.v2", 3)?.service_container(),
			"chainctl_chain_my_chain.v2_3"
		);
		Ok(())
	}

	#[test]
	fn parse_container_name_works() -> Result<(), Error> {
		assert_eq!(
			parse_container_name("chainctl_chain_my_chain_2"),
			Some((ContainerKind::Chain, ChainKey::new("my_chain", 2)?))
		);
		assert_eq!(
			parse_container_name("/chainctl_data_x_1"),
			Some((ContainerKind::Data, ChainKey::new("x", 1)?))
		);
		assert_eq!(parse_container_name("chainctl_keys_x_1"), None);
		assert_eq!(parse_container_name("other_chain_x_1"), None);
		assert_eq!(parse_container_name("chainctl_chain_x_zero"), None);
		assert_eq!(parse_container_name("chainctl_chain_x_0"), None);
		Ok(())
	}

	#[test]
	fn validate_name_works() {
		for valid in ["a", "chain-1", "my_chain.v2", "0x"] {
			assert!(validate_name(valid).is_ok(), "{valid}");
		}
		for invalid in ["", "-chain", ".hidden", "my chain", "a/b", "ch@in"] {
			assert!(matches!(validate_name(invalid), Err(Error::Validation(_))), "{invalid}");
		}
	}

	#[test]
	fn instance_zero_is_rejected() {
		assert!(matches!(ChainKey::new("chain", 0), Err(Error::Validation(_))));
	}

	#[test]
	fn paths_are_derived_from_the_chain_id() -> Result<(), Error> {
		assert_eq!(genesis_path("c"), "/home/chainctl/.chainctl/chains/c/genesis.json");
		assert_eq!(config_path("c"), "/home/chainctl/.chainctl/chains/c/config.toml");
		let root = Path::new("/root/.chainctl");
		assert_eq!(
			definition_file(root, &ChainKey::new("c", 2)?),
			Path::new("/root/.chainctl/chains/c_2.toml")
		);
		assert_eq!(service_file(root, "c"), Path::new("/root/.chainctl/services/c.toml"));
		Ok(())
	}

	#[test]
	fn display_omits_the_first_instance() -> Result<(), Error> {
		assert_eq!(ChainKey::new("c", 1)?.to_string(), "c");
		assert_eq!(ChainKey::new("c", 2)?.to_string(), "c:2");
		Ok(())
	}
}
