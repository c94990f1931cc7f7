// SPDX-License-Identifier: GPL-3.0

use super::{ChainController, ChainState};
use crate::{
	Error,
	errors::runtime,
	naming::{self, CONTAINER_PREFIX, ChainKey, ContainerKind},
	store::DefinitionStore,
};
use chainctl_common::{
	ContainerRef, ContainerRuntime, ListFilter, LogOptions, PortMapping, runtime::lookup,
};
use serde::Serialize;
use serde_json::Value;
use std::{collections::BTreeMap, io::Write};
use strum_macros::{Display, EnumString};

/// What is known about a chain instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
	pub key: ChainKey,
	/// A definition exists.
	pub known: bool,
	/// A service container exists.
	pub existing: bool,
	/// The service container is running.
	pub running: bool,
}

impl ChainSummary {
	/// The runtime state of the chain.
	pub fn state(&self) -> ChainState {
		match (self.existing, self.running) {
			(_, true) => ChainState::Running,
			(true, false) => ChainState::Existing,
			(false, false) => ChainState::Absent,
		}
	}
}

/// The files of a chain which can be printed.
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum ChainFile {
	/// The persisted definition.
	Definition,
	/// The genesis document on the data volume.
	Genesis,
	/// The node configuration on the data volume.
	Config,
}

impl<R: ContainerRuntime, S: DefinitionStore> ChainController<R, S> {
	/// Runs a command in the chain's environment, writing its output to `sink`.
	///
	/// A running chain executes the command in its service container. Otherwise a non-interactive
	/// command runs in a throwaway container sharing the chain's data volume.
	pub fn exec(
		&self,
		key: &ChainKey,
		command: &[String],
		interactive: bool,
		sink: &mut dyn Write,
	) -> Result<(), Error> {
		if command.is_empty() {
			return Err(Error::Validation("a command is required".into()));
		}
		let definition = self.store.load(key)?;
		let output = match self.inspect_service(key)? {
			Some(info) if info.running => self
				.runtime
				.exec(&ContainerRef::new(&info.name), command, interactive)
				.map_err(runtime("execute a command in", &info.name))?,
			_ if interactive => return Err(Error::NotRunning(key.clone())),
			_ => {
				let data = &definition.operations.data_container_name;
				if self.inspect_container(data)?.is_none() {
					return Err(Error::NotFound(key.clone()));
				}
				self.data().run_with_volume(&ContainerRef::new(data), command)?
			},
		};
		sink.write_all(&output)?;
		Ok(())
	}

	/// Writes the logs of the chain's service container to `sink`.
	pub fn logs(
		&self,
		key: &ChainKey,
		options: &LogOptions,
		sink: &mut dyn Write,
	) -> Result<(), Error> {
		let info = self.inspect_service(key)?.ok_or_else(|| Error::NotFound(key.clone()))?;
		self.runtime
			.logs(&ContainerRef::new(&info.name), options, sink)
			.map_err(runtime("read the logs of", &info.name))
	}

	/// Inspects the chain's service container.
	///
	/// # Arguments
	/// * `key` - The chain.
	/// * `field` - `name`, `id`, `image`, `running`, `ports`, a dotted path into the runtime's
	///   document (e.g. `Config.Env`), or `None`/`all` for the whole document.
	pub fn inspect(&self, key: &ChainKey, field: Option<&str>) -> Result<Value, Error> {
		let info = self.inspect_service(key)?.ok_or_else(|| Error::NotFound(key.clone()))?;
		Ok(match field {
			None | Some("all") => info.raw,
			Some("name") => Value::String(info.name),
			Some("id") => Value::String(info.id),
			Some("image") => Value::String(info.image),
			Some("running") => Value::Bool(info.running),
			Some("ports") => info.ports.iter().map(|p| Value::String(p.to_string())).collect(),
			Some(path) => lookup(&info.raw, path)
				.cloned()
				.ok_or_else(|| Error::Validation(format!("no field `{path}` in {key}")))?,
		})
	}

	/// The published ports of the chain's service container.
	pub fn ports(&self, key: &ChainKey) -> Result<Vec<PortMapping>, Error> {
		let info = self.inspect_service(key)?.ok_or_else(|| Error::NotFound(key.clone()))?;
		Ok(info.ports)
	}

	/// Every chain instance with a definition or a service container.
	pub fn list(&self) -> Result<Vec<ChainSummary>, Error> {
		let mut chains: BTreeMap<ChainKey, ChainSummary> = BTreeMap::new();
		let summary = |key: &ChainKey| ChainSummary {
			key: key.clone(),
			known: false,
			existing: false,
			running: false,
		};
		for key in self.store.list()? {
			chains.entry(key.clone()).or_insert_with(|| summary(&key)).known = true;
		}
		let filter = ListFilter { prefix: Some(format!("{CONTAINER_PREFIX}_")), running: false };
		let containers =
			self.runtime.list(&filter).map_err(runtime("list", format!("{CONTAINER_PREFIX}_*")))?;
		for container in containers {
			let Some((ContainerKind::Chain, key)) = naming::parse_container_name(&container.name)
			else {
				continue;
			};
			let entry = chains.entry(key.clone()).or_insert_with(|| summary(&key));
			entry.existing = true;
			entry.running = container.running;
		}
		Ok(chains.into_values().collect())
	}

	/// Reads a file of the chain.
	pub fn cat(&self, key: &ChainKey, file: ChainFile) -> Result<Vec<u8>, Error> {
		let definition = self.store.load(key)?;
		let path = match file {
			ChainFile::Definition => {
				return toml_edit::ser::to_string_pretty(&definition)
					.map(String::into_bytes)
					.map_err(|e| Error::Store(e.to_string()));
			},
			ChainFile::Genesis => naming::genesis_path(&definition.chain_id),
			ChainFile::Config => naming::config_path(&definition.chain_id),
		};
		let mut output = Vec::new();
		self.exec(key, &["cat".to_string(), path], false, &mut output)?;
		Ok(output)
	}
}
