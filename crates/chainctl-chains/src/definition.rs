// SPDX-License-Identifier: GPL-3.0

use crate::{
	Error,
	artifacts::ConfigOption,
	naming::{self, ChainKey},
};
use chainctl_common::ContainerSpec;
use serde::{Deserialize, Serialize};
use std::{
	collections::{BTreeMap, BTreeSet},
	path::PathBuf,
};

/// The image chain nodes run by default.
pub const DEFAULT_CHAIN_IMAGE: &str = concat!("chainctl/node:", env!("CARGO_PKG_VERSION"));
/// The image data containers are created from by default.
pub const DEFAULT_DATA_IMAGE: &str = concat!("chainctl/data:", env!("CARGO_PKG_VERSION"));
/// The command chain nodes are started with by default.
pub const DEFAULT_CHAIN_COMMAND: &[&str] = &["node", "start"];
/// The environment variable telling the node which chain directory to use.
pub const CHAIN_ID_VARIABLE: &str = "CHAIN_ID";

/// The images and command used for new chains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainDefaults {
	/// The image of service containers.
	pub image: String,
	/// The image of data containers and throwaway containers.
	pub data_image: String,
	/// The command of service containers.
	pub command: Vec<String>,
}

impl Default for ChainDefaults {
	fn default() -> Self {
		Self {
			image: DEFAULT_CHAIN_IMAGE.to_string(),
			data_image: DEFAULT_DATA_IMAGE.to_string(),
			command: DEFAULT_CHAIN_COMMAND.iter().map(|s| s.to_string()).collect(),
		}
	}
}

/// How a service container is run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
	pub image: String,
	#[serde(default)]
	pub command: Vec<String>,
	/// Whether a data container is managed alongside the service.
	#[serde(default)]
	pub auto_data: bool,
	/// Services which must be running before this one.
	#[serde(default)]
	pub dependencies: BTreeSet<String>,
}

/// How the containers of a chain are operated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operations {
	/// The container owning the chain's persistent volume.
	pub data_container_name: String,
	#[serde(default)]
	pub publish_all_ports: bool,
	#[serde(default)]
	pub volumes: Vec<String>,
	#[serde(default)]
	pub ports: Vec<String>,
	#[serde(default)]
	pub environment: BTreeMap<String, String>,
}

/// Per-invocation overrides of [`Operations`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationsOverrides {
	pub publish_all_ports: Option<bool>,
	pub volumes: Vec<String>,
	pub ports: Vec<String>,
	pub environment: BTreeMap<String, String>,
}

impl OperationsOverrides {
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}
}

impl Operations {
	/// Applies overrides: a set flag wins, non-empty lists replace, environment variables are
	/// merged key by key. The data container name is never overridden.
	pub fn merge(&mut self, overrides: &OperationsOverrides) {
		if let Some(publish_all_ports) = overrides.publish_all_ports {
			self.publish_all_ports = publish_all_ports;
		}
		if !overrides.volumes.is_empty() {
			self.volumes = overrides.volumes.clone();
		}
		if !overrides.ports.is_empty() {
			self.ports = overrides.ports.clone();
		}
		self.environment
			.extend(overrides.environment.iter().map(|(k, v)| (k.clone(), v.clone())));
	}
}

/// Where the node configuration of a new chain comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConfigSourceFields", into = "ConfigSourceFields")]
pub enum ConfigSource {
	/// The built-in configuration.
	#[default]
	Default,
	/// A configuration file, used verbatim.
	File(PathBuf),
	/// The built-in configuration with the given options applied.
	Options(Vec<ConfigOption>),
	/// A validator set replacing the genesis validators, with the built-in configuration.
	Csv(PathBuf),
}

impl ConfigSource {
	/// Combines the sources given on the command line, of which at most one may be set.
	pub fn from_parts(
		file: Option<PathBuf>,
		csv: Option<PathBuf>,
		options: Vec<ConfigOption>,
	) -> Result<Self, Error> {
		match (file, csv, options.is_empty()) {
			(None, None, true) => Ok(Self::Default),
			(Some(file), None, true) => Ok(Self::File(file)),
			(None, Some(csv), true) => Ok(Self::Csv(csv)),
			(None, None, false) => Ok(Self::Options(options)),
			_ => Err(Error::Validation(
				"a config file, a validator CSV and config options are mutually exclusive".into(),
			)),
		}
	}
}

// The persisted form of a config source.
#[derive(Default, Serialize, Deserialize)]
struct ConfigSourceFields {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	file: Option<PathBuf>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	csv: Option<PathBuf>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	options: Vec<String>,
}

impl TryFrom<ConfigSourceFields> for ConfigSource {
	type Error = Error;

	fn try_from(fields: ConfigSourceFields) -> Result<Self, Self::Error> {
		let options =
			fields.options.iter().map(|o| o.parse()).collect::<Result<Vec<ConfigOption>, _>>()?;
		Self::from_parts(fields.file, fields.csv, options)
	}
}

impl From<ConfigSource> for ConfigSourceFields {
	fn from(source: ConfigSource) -> Self {
		match source {
			ConfigSource::Default => Self::default(),
			ConfigSource::File(file) => Self { file: Some(file), ..Default::default() },
			ConfigSource::Csv(csv) => Self { csv: Some(csv), ..Default::default() },
			ConfigSource::Options(options) => Self {
				options: options.iter().map(|o| o.to_string()).collect(),
				..Default::default()
			},
		}
	}
}

/// The persisted definition of a chain instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDefinition {
	pub name: String,
	pub instance: u32,
	/// The identifier written into the genesis document, which also names the chain directory
	/// within the data volume. It is fixed when the chain is created.
	pub chain_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub genesis: Option<PathBuf>,
	/// A directory whose contents were copied into the data volume.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub seed_dir: Option<PathBuf>,
	pub service: ServiceSpec,
	pub operations: Operations,
	#[serde(default)]
	pub config: ConfigSource,
}

impl ChainDefinition {
	/// A definition for a new chain instance using the given defaults.
	pub fn new(key: &ChainKey, defaults: &ChainDefaults) -> Self {
		Self {
			name: key.name.clone(),
			instance: key.instance,
			chain_id: key.name.clone(),
			genesis: None,
			seed_dir: None,
			service: ServiceSpec {
				image: defaults.image.clone(),
				command: defaults.command.clone(),
				auto_data: true,
				dependencies: BTreeSet::new(),
			},
			operations: Operations {
				data_container_name: key.data_container(),
				..Default::default()
			},
			config: ConfigSource::Default,
		}
	}

	pub fn key(&self) -> ChainKey {
		ChainKey { name: self.name.clone(), instance: self.instance }
	}

	/// The specification of the service container.
	pub fn service_spec(&self) -> ContainerSpec {
		let mut environment = self.operations.environment.clone();
		environment.insert(CHAIN_ID_VARIABLE.to_string(), self.chain_id.clone());
		ContainerSpec {
			name: self.key().service_container(),
			image: self.service.image.clone(),
			command: self.service.command.clone(),
			volumes_from: Some(self.operations.data_container_name.clone()),
			volumes: self.operations.volumes.clone(),
			ports: self.operations.ports.clone(),
			publish_all_ports: self.operations.publish_all_ports,
			environment,
		}
	}

	/// The specification of the data container.
	pub fn data_spec(&self, image: &str) -> ContainerSpec {
		let mut spec = ContainerSpec::new(&self.operations.data_container_name, image);
		spec.volumes = vec![naming::HOME.to_string()];
		spec
	}
}

/// A chain promoted to a reusable, dependency-aware service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
	pub name: String,
	/// The chain the service runs.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chain: Option<String>,
	pub service: ServiceSpec,
	pub operations: Operations,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn option(s: &str) -> ConfigOption {
		s.parse().expect("valid option")
	}

	#[test]
	fn merge_applies_overrides() {
		let mut operations = Operations {
			data_container_name: "data".into(),
			publish_all_ports: true,
			volumes: vec!["/a".into()],
			ports: vec!["1:1".into()],
			environment: BTreeMap::from([("A".into(), "1".into()), ("B".into(), "2".into())]),
		};
		operations.merge(&OperationsOverrides {
			publish_all_ports: Some(false),
			volumes: vec![],
			ports: vec!["2:2".into()],
			environment: BTreeMap::from([("B".into(), "3".into())]),
		});
		assert_eq!(
			operations,
			Operations {
				data_container_name: "data".into(),
				publish_all_ports: false,
				volumes: vec!["/a".into()],
				ports: vec!["2:2".into()],
				environment: BTreeMap::from([("A".into(), "1".into()), ("B".into(), "3".into())]),
			}
		);
	}

	#[test]
	fn empty_overrides_change_nothing() {
		let mut operations = Operations { publish_all_ports: true, ..Default::default() };
		let expected = operations.clone();
		operations.merge(&OperationsOverrides::default());
		assert_eq!(operations, expected);
		assert!(OperationsOverrides::default().is_empty());
	}

	#[test]
	fn config_sources_are_mutually_exclusive() -> Result<(), Error> {
		assert_eq!(ConfigSource::from_parts(None, None, vec![])?, ConfigSource::Default);
		assert_eq!(
			ConfigSource::from_parts(Some("c.toml".into()), None, vec![])?,
			ConfigSource::File("c.toml".into())
		);
		assert!(matches!(
			ConfigSource::from_parts(Some("c.toml".into()), Some("v.csv".into()), vec![]),
			Err(Error::Validation(_))
		));
		assert!(matches!(
			ConfigSource::from_parts(None, Some("v.csv".into()), vec![option("moniker=a")]),
			Err(Error::Validation(_))
		));
		Ok(())
	}

	#[test]
	fn definitions_round_trip_through_toml() -> Result<(), Box<dyn std::error::Error>> {
		let key = ChainKey::new("mychain", 2)?;
		let mut definition = ChainDefinition::new(&key, &ChainDefaults::default());
		definition.config = ConfigSource::Options(vec![option("p2p=1.1.1.1:42")]);
		definition.operations.environment.insert("A".into(), "1".into());

		let serialized = toml_edit::ser::to_string_pretty(&definition)?;
		assert!(serialized.contains("\"node_laddr=1.1.1.1:42\""), "{serialized}");
		assert_eq!(toml_edit::de::from_str::<ChainDefinition>(&serialized)?, definition);
		Ok(())
	}

	#[test]
	fn conflicting_persisted_sources_are_rejected() {
		let document = "file = \"c.toml\"\ncsv = \"v.csv\"\n";
		assert!(toml_edit::de::from_str::<ConfigSource>(document).is_err());
	}

	#[test]
	fn service_spec_mounts_the_data_container() -> Result<(), Error> {
		let key = ChainKey::new("mychain", 1)?;
		let mut definition = ChainDefinition::new(&key, &ChainDefaults::default());
		definition.operations.publish_all_ports = true;
		let spec = definition.service_spec();
		assert_eq!(spec.name, "chainctl_chain_mychain_1");
		assert_eq!(spec.volumes_from.as_deref(), Some("chainctl_data_mychain_1"));
		assert_eq!(spec.environment.get(CHAIN_ID_VARIABLE).map(String::as_str), Some("mychain"));
		assert!(spec.publish_all_ports);

		let data = definition.data_spec("data:latest");
		assert_eq!(data.name, "chainctl_data_mychain_1");
		assert_eq!(data.volumes, [naming::HOME]);
		Ok(())
	}
}
