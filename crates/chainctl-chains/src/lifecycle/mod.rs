// SPDX-License-Identifier: GPL-3.0

//! The lifecycle of chain instances: every transition validates its preconditions against the
//! runtime and the definition store before touching either.

use crate::{
	Error,
	artifacts,
	data::DataVolumes,
	definition::{ChainDefaults, ChainDefinition, ConfigSource, OperationsOverrides},
	errors::runtime,
	locks::ChainLocks,
	naming::ChainKey,
	store::DefinitionStore,
};
use chainctl_common::{ContainerInfo, ContainerRef, ContainerRuntime, Rollback, Status};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use strum_macros::{Display, EnumString};

mod graduate;
mod query;
mod rename;

pub use graduate::{GRADUATE_COMMAND, GRADUATE_IMAGE, KEYS_SERVICE};
pub use query::{ChainFile, ChainSummary};

/// The runtime state of a chain instance.
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChainState {
	/// No service container exists.
	Absent,
	/// The service container exists but is not running.
	Existing,
	/// The service container is running.
	Running,
}

/// A chain to be created.
#[derive(Clone, Debug, Default)]
pub struct NewChain {
	pub name: String,
	/// The instance number, starting at 1.
	pub instance: u32,
	/// A genesis document to use instead of a generated one.
	pub genesis: Option<PathBuf>,
	pub config: ConfigSource,
	/// A directory whose contents are copied into the data volume.
	pub seed_dir: Option<PathBuf>,
	/// An image to run instead of the default one.
	pub image: Option<String>,
	pub overrides: OperationsOverrides,
	/// Start the chain once created.
	pub start: bool,
	/// Replace an existing chain of the same name.
	pub overwrite: bool,
}

#[derive(Clone, Debug, Default)]
pub struct StartOptions {
	/// Succeed when the chain is already running.
	pub allow_running: bool,
	pub overrides: OperationsOverrides,
}

#[derive(Clone, Debug, Default)]
pub struct KillOptions {
	/// Remove the service container once stopped.
	pub remove: bool,
	/// Remove the data container as well, which implies `remove`.
	pub remove_data: bool,
	/// Succeed when the chain is not running.
	pub force: bool,
}

#[derive(Clone, Debug, Default)]
pub struct RemoveOptions {
	/// Stop the chain first when it is running.
	pub force: bool,
	/// Remove the data container as well.
	pub remove_data: bool,
	/// Delete the definition as well.
	pub remove_file: bool,
}

#[derive(Clone, Debug, Default)]
pub struct UpdateOptions {
	/// Pull the image before recreating the service container.
	pub pull: bool,
	/// Switch the chain to another image.
	pub image: Option<String>,
	pub overrides: OperationsOverrides,
}

/// Drives chain instances through their lifecycle.
///
/// Transitions on the same chain instance are serialized within the process. Nothing prevents
/// another process from operating on the same containers concurrently.
pub struct ChainController<R: ContainerRuntime, S: DefinitionStore> {
	runtime: R,
	store: S,
	defaults: ChainDefaults,
	locks: ChainLocks,
}

impl<R: ContainerRuntime, S: DefinitionStore> ChainController<R, S> {
	pub fn new(runtime: R, store: S, defaults: ChainDefaults) -> Self {
		Self { runtime, store, defaults, locks: ChainLocks::default() }
	}

	pub fn runtime(&self) -> &R {
		&self.runtime
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub fn defaults(&self) -> &ChainDefaults {
		&self.defaults
	}

	fn data(&self) -> DataVolumes<'_, R> {
		DataVolumes::new(&self.runtime, &self.defaults.data_image)
	}

	fn inspect_container(&self, name: &str) -> Result<Option<ContainerInfo>, Error> {
		self.runtime.inspect(name).map_err(runtime("inspect", name))
	}

	fn inspect_service(&self, key: &ChainKey) -> Result<Option<ContainerInfo>, Error> {
		self.inspect_container(&key.service_container())
	}

	// The data container of a chain, whether or not a definition exists.
	fn data_container(&self, key: &ChainKey) -> Result<Option<ContainerInfo>, Error> {
		let name = match self.store.exists(key)? {
			true => self.store.load(key)?.operations.data_container_name,
			false => key.data_container(),
		};
		self.inspect_container(&name)
	}

	/// The runtime state of a chain instance.
	pub fn state(&self, key: &ChainKey) -> Result<ChainState, Error> {
		Ok(match self.inspect_service(key)? {
			None => ChainState::Absent,
			Some(info) if info.running => ChainState::Running,
			Some(_) => ChainState::Existing,
		})
	}

	/// Creates a chain: its artifacts, data container and service container, and persists its
	/// definition. The definition is only persisted once every runtime step has succeeded, and
	/// the containers created along the way are removed again on failure.
	pub fn create(&self, chain: NewChain, status: &impl Status) -> Result<ChainDefinition, Error> {
		let key = ChainKey::new(&chain.name, chain.instance)?;
		self.locks.with(&key, || self.create_locked(&key, chain, status))
	}

	fn create_locked(
		&self,
		key: &ChainKey,
		chain: NewChain,
		status: &impl Status,
	) -> Result<ChainDefinition, Error> {
		let service = self.inspect_service(key)?;
		if !chain.overwrite && (self.store.exists(key)? || service.is_some()) {
			return Err(Error::AlreadyExists(key.clone()));
		}
		if service.as_ref().is_some_and(|s| s.running) {
			return Err(Error::StillRunning(key.clone()));
		}
		if let Some(seed) = chain.seed_dir.as_deref().filter(|seed| !seed.is_dir()) {
			return Err(Error::Artifact {
				path: seed.to_path_buf(),
				reason: "not a directory".into(),
			});
		}

		let mut definition = ChainDefinition::new(key, &self.defaults);
		if let Some(image) = chain.image {
			definition.service.image = image;
		}
		definition.genesis = chain.genesis;
		definition.seed_dir = chain.seed_dir;
		definition.config = chain.config;
		definition.operations.merge(&chain.overrides);

		status.update("Generating the chain artifacts...");
		let artifacts = artifacts::materialize(
			&definition.chain_id,
			definition.genesis.as_deref(),
			&definition.config,
		)?;

		let mut rollback = Rollback::new();
		let result =
			self.provision(&definition, &artifacts, service, chain.start, &mut rollback, status);
		let replaced = match result {
			Ok(replaced) => replaced,
			Err(e) => {
				let failed = rollback.rollback();
				if !failed.is_empty() {
					warn!("{key} was left partially created: {}", failed.join(", "));
				}
				return Err(e);
			},
		};
		rollback.commit();
		if let Some(replaced) = replaced {
			if let Err(e) = self.runtime.remove(&replaced, false) {
				warn!("failed to remove the replaced container {replaced}: {e}");
			}
		}
		info!("created chain {key}");
		Ok(definition)
	}

	// Returns the replaced service container, which has been moved aside and is left for the
	// caller to remove once the chain is in place.
	fn provision<'a>(
		&'a self,
		definition: &ChainDefinition,
		artifacts: &artifacts::Artifacts,
		replaced: Option<ContainerInfo>,
		start: bool,
		rollback: &mut Rollback<'a, Error>,
		status: &impl Status,
	) -> Result<Option<ContainerRef>, Error> {
		status.update("Preparing the data container...");
		let (data, created) = self.data().ensure(definition)?;
		if created {
			let undo = data.clone();
			rollback.note(format!("create {data}"), move || self.data().remove(&undo));
		} else {
			match self.data().read_artifacts(&data, &definition.chain_id) {
				Ok(previous) => {
					let (undo, chain_id) = (data.clone(), definition.chain_id.clone());
					rollback.note(format!("restore the artifacts in {data}"), move || {
						self.data().write_artifacts(&undo, &chain_id, &previous, None)
					});
				},
				Err(e) => debug!("no artifacts to restore in {data}: {e}"),
			}
		}
		self.data().write_artifacts(
			&data,
			&definition.chain_id,
			artifacts,
			definition.seed_dir.as_deref(),
		)?;

		let replaced = match replaced {
			Some(replaced) => {
				let aside = format!("{}_replaced", replaced.name);
				debug!("moving {} aside", replaced.name);
				let moved = self
					.runtime
					.rename(&ContainerRef::new(&replaced.name), &aside)
					.map_err(runtime("rename", &replaced.name))?;
				let (from, to) = (aside, replaced.name);
				rollback.note(format!("rename {to} to {from}"), move || {
					self.runtime
						.rename(&ContainerRef::new(&from), &to)
						.map_err(runtime("rename", from.as_str()))
						.map(|_| ())
				});
				Some(moved)
			},
			None => None,
		};
		status.update("Creating the chain container...");
		let service = self.create_service(definition)?;
		let undo = service.clone();
		rollback.note(format!("create {service}"), move || {
			self.runtime.remove(&undo, false).map_err(runtime("remove", undo.name()))
		});

		if start {
			status.update("Starting the chain...");
			self.runtime.start(&service).map_err(runtime("start", service.name()))?;
			let undo = service.clone();
			rollback.note(format!("start {service}"), move || {
				self.runtime.stop(&undo).map_err(runtime("stop", undo.name()))
			});
		}
		self.store.save(definition)?;
		Ok(replaced)
	}

	fn create_service(&self, definition: &ChainDefinition) -> Result<ContainerRef, Error> {
		let spec = definition.service_spec();
		self.runtime.create(&spec).map_err(runtime("create", &spec.name))
	}

	// Ensures the data container exists, writing the artifacts again when it had to be created.
	fn ensure_data(&self, definition: &ChainDefinition) -> Result<ContainerRef, Error> {
		let (data, created) = self.data().ensure(definition)?;
		if created {
			warn!("the data container of {} was missing and has been recreated", definition.key());
			let artifacts = artifacts::materialize(
				&definition.chain_id,
				definition.genesis.as_deref(),
				&definition.config,
			)?;
			self.data().write_artifacts(
				&data,
				&definition.chain_id,
				&artifacts,
				definition.seed_dir.as_deref(),
			)?;
		}
		Ok(data)
	}

	/// Starts a known chain, creating its containers when missing.
	///
	/// Overrides apply to this run only. An existing service container is recreated when
	/// overrides are given.
	pub fn start(
		&self,
		key: &ChainKey,
		options: &StartOptions,
		status: &impl Status,
	) -> Result<(), Error> {
		self.locks.with(key, || {
			let mut definition = self.store.load(key)?;
			definition.operations.merge(&options.overrides);
			let service = self.inspect_service(key)?;
			if service.as_ref().is_some_and(|s| s.running) {
				return match options.allow_running {
					true => Ok(()),
					false => Err(Error::AlreadyRunning(key.clone())),
				};
			}

			self.ensure_data(&definition)?;
			let container = match service {
				Some(info) if options.overrides.is_empty() => ContainerRef::new(info.name),
				existing => {
					if let Some(info) = existing {
						self.runtime
							.remove(&ContainerRef::new(&info.name), false)
							.map_err(runtime("remove", &info.name))?;
					}
					status.update("Creating the chain container...");
					self.create_service(&definition)?
				},
			};
			status.update("Starting the chain...");
			self.runtime.start(&container).map_err(runtime("start", container.name()))?;
			info!("started chain {key}");
			Ok(())
		})
	}

	// Fails with `NotFound` when nothing at all is left of the chain.
	fn require_known(
		&self,
		key: &ChainKey,
		service: &Option<ContainerInfo>,
		data: &Option<ContainerInfo>,
	) -> Result<(), Error> {
		if service.is_none() && data.is_none() && !self.store.exists(key)? {
			return Err(Error::NotFound(key.clone()));
		}
		Ok(())
	}

	/// Stops a running chain, optionally removing its containers.
	pub fn kill(&self, key: &ChainKey, options: &KillOptions) -> Result<(), Error> {
		self.locks.with(key, || {
			let service = self.inspect_service(key)?;
			let data = self.data_container(key)?;
			self.require_known(key, &service, &data)?;

			match &service {
				Some(info) if info.running => {
					self.runtime
						.stop(&ContainerRef::new(&info.name))
						.map_err(runtime("stop", &info.name))?;
				},
				_ if !options.force => return Err(Error::NotRunning(key.clone())),
				_ => debug!("{key} is not running"),
			}
			if options.remove || options.remove_data {
				if let Some(info) = &service {
					self.runtime
						.remove(&ContainerRef::new(&info.name), false)
						.map_err(runtime("remove", &info.name))?;
				}
			}
			if let Some(info) = data.filter(|_| options.remove_data) {
				self.data().remove(&ContainerRef::new(info.name))?;
			}
			info!("stopped chain {key}");
			Ok(())
		})
	}

	/// Removes the containers of a chain, optionally along with its data and definition.
	pub fn remove(&self, key: &ChainKey, options: &RemoveOptions) -> Result<(), Error> {
		self.locks.with(key, || {
			let service = self.inspect_service(key)?;
			let data = self.data_container(key)?;
			self.require_known(key, &service, &data)?;

			if let Some(info) = &service {
				let container = ContainerRef::new(&info.name);
				if info.running {
					if !options.force {
						return Err(Error::StillRunning(key.clone()));
					}
					self.runtime.stop(&container).map_err(runtime("stop", &info.name))?;
				}
				self.runtime.remove(&container, false).map_err(runtime("remove", &info.name))?;
			}
			if let Some(info) = data.filter(|_| options.remove_data) {
				self.data().remove(&ContainerRef::new(info.name))?;
			}
			if options.remove_file {
				self.store.delete(key)?;
			}
			info!("removed chain {key}");
			Ok(())
		})
	}

	/// Recreates the service container of a chain from its definition, keeping the data volume.
	/// A chain which was running is running again afterwards.
	pub fn update(
		&self,
		key: &ChainKey,
		options: &UpdateOptions,
		status: &impl Status,
	) -> Result<(), Error> {
		self.locks.with(key, || {
			let mut definition = self.store.load(key)?;
			if let Some(image) = &options.image {
				definition.service.image = image.clone();
			}
			definition.operations.merge(&options.overrides);
			let service = self.inspect_service(key)?;

			if options.pull {
				status.update(&format!("Pulling {}...", definition.service.image));
				self.runtime
					.pull(&definition.service.image)
					.map_err(runtime("pull", &definition.service.image))?;
			}
			if let Some(info) = service {
				let container = ContainerRef::new(&info.name);
				if info.running {
					self.runtime.stop(&container).map_err(runtime("stop", &info.name))?;
				}
				self.runtime.remove(&container, false).map_err(runtime("remove", &info.name))?;
				self.ensure_data(&definition)?;
				status.update("Recreating the chain container...");
				let container = self.create_service(&definition)?;
				if info.running {
					self.runtime.start(&container).map_err(runtime("start", container.name()))?;
				}
			}
			self.store.save(&definition)?;
			info!("updated chain {key}");
			Ok(())
		})
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::{
		artifacts::{config::DEFAULT_CONFIG, genesis},
		naming,
		store::FileStore,
	};
	use anyhow::Result;
	use chainctl_common::memory::MemoryRuntime;
	use std::{collections::BTreeMap, fs};
	use tempfile::TempDir;

	pub(crate) type Controller = ChainController<MemoryRuntime, FileStore>;

	pub(crate) fn controller() -> Result<(Controller, TempDir)> {
		let temp_dir = tempfile::tempdir()?;
		let controller = ChainController::new(
			MemoryRuntime::new(),
			FileStore::new(temp_dir.path()),
			ChainDefaults {
				image: "chain:test".into(),
				data_image: "data:test".into(),
				command: vec!["node".into(), "start".into()],
			},
		);
		Ok((controller, temp_dir))
	}

	pub(crate) fn new_chain(name: &str) -> NewChain {
		NewChain { name: name.into(), instance: 1, ..Default::default() }
	}

	pub(crate) fn key(name: &str) -> Result<ChainKey> {
		Ok(ChainKey::new(name, 1)?)
	}

	pub(crate) fn running(controller: &Controller, name: &str) -> Result<()> {
		controller.create(NewChain { start: true, ..new_chain(name) }, &())?;
		Ok(())
	}

	fn read_genesis(controller: &Controller, key: &ChainKey) -> Option<Vec<u8>> {
		controller.runtime().read_file(&key.data_container(), &naming::genesis_path(&key.name))
	}

	// Reads the artifacts back through a container sharing the data volume.
	fn read_artifacts(controller: &Controller, key: &ChainKey) -> Result<artifacts::Artifacts> {
		let data = ContainerRef::new(key.data_container());
		Ok(controller.data().read_artifacts(&data, &key.name)?)
	}

	#[test]
	fn create_works() -> Result<()> {
		let (controller, temp_dir) = controller()?;
		let key = key("mychain")?;

		let definition = controller.create(new_chain("mychain"), &())?;

		assert_eq!(definition.key(), key);
		assert_eq!(controller.state(&key)?, ChainState::Existing);
		assert!(temp_dir.path().join("chains/mychain_1.toml").is_file());
		assert_eq!(controller.store().load(&key)?, definition);
		let genesis = read_genesis(&controller, &key).expect("genesis written");
		assert_eq!(genesis::chain_id(&genesis), Some("mychain".into()));
		let spec = controller.runtime().spec(&key.service_container()).expect("created");
		assert_eq!(spec.image, "chain:test");
		assert_eq!(spec.volumes_from, Some(key.data_container()));
		assert_eq!(
			controller.runtime().spec(&key.data_container()).map(|s| s.image),
			Some("data:test".into())
		);
		Ok(())
	}

	#[test]
	fn create_and_start_works() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		running(&controller, "mychain")?;
		assert_eq!(controller.state(&key("mychain")?)?, ChainState::Running);
		Ok(())
	}

	#[test]
	fn create_applies_options_and_overrides() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		let config = ConfigSource::Options(vec!["moniker=satoshi".parse()?]);
		controller.create(
			NewChain {
				config,
				image: Some("chain:custom".into()),
				overrides: OperationsOverrides {
					publish_all_ports: Some(true),
					environment: BTreeMap::from([("LOG".into(), "debug".into())]),
					..Default::default()
				},
				..new_chain("mychain")
			},
			&(),
		)?;

		let spec = controller.runtime().spec(&key.service_container()).expect("created");
		assert!(spec.publish_all_ports);
		assert_eq!(spec.image, "chain:custom");
		assert_eq!(spec.environment.get("LOG").map(String::as_str), Some("debug"));
		let config = controller
			.runtime()
			.read_file(&key.data_container(), &naming::config_path("mychain"))
			.expect("config written");
		assert!(String::from_utf8(config)?.contains("moniker = \"satoshi\""));
		Ok(())
	}

	#[test]
	fn create_existing_fails() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		controller.create(new_chain("mychain"), &())?;
		let calls = controller.runtime().calls().len();

		assert!(matches!(
			controller.create(new_chain("mychain"), &()),
			Err(Error::AlreadyExists(k)) if k.name == "mychain"
		));
		assert_eq!(controller.runtime().calls().len(), calls);
		Ok(())
	}

	#[test]
	fn create_overwrite_replaces_the_chain() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		controller.create(new_chain("mychain"), &())?;
		controller.runtime().write_file(&key.data_container(), "/keep", "kept")?;

		controller.create(
			NewChain { overwrite: true, image: Some("chain:new".into()), ..new_chain("mychain") },
			&(),
		)?;

		let spec = controller.runtime().spec(&key.service_container()).expect("recreated");
		assert_eq!(spec.image, "chain:new");
		assert_eq!(
			controller.runtime().read_file(&key.data_container(), "/keep"),
			Some(b"kept".to_vec())
		);
		assert_eq!(controller.state(&key)?, ChainState::Existing);
		let containers = controller.runtime().list(&Default::default())?;
		assert_eq!(containers.len(), 2);
		Ok(())
	}

	#[test]
	fn create_overwrite_refuses_a_running_chain() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		running(&controller, "mychain")?;
		assert!(matches!(
			controller.create(NewChain { overwrite: true, ..new_chain("mychain") }, &()),
			Err(Error::StillRunning(_))
		));
		assert_eq!(controller.state(&key("mychain")?)?, ChainState::Running);
		Ok(())
	}

	#[test]
	fn failed_overwrite_is_rolled_back() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		controller.create(new_chain("mychain"), &())?;
		let before = read_artifacts(&controller, &key)?;
		controller.runtime().fail_next("create", &key.service_container());

		let result = controller.create(
			NewChain {
				overwrite: true,
				image: Some("chain:new".into()),
				config: ConfigSource::Options(vec!["moniker=satoshi".parse()?]),
				..new_chain("mychain")
			},
			&(),
		);

		assert!(matches!(result, Err(Error::Runtime { operation: "create", .. })));
		let definition = controller.store().load(&key)?;
		assert_eq!(definition.config, ConfigSource::Default);
		assert_eq!(definition.service.image, "chain:test");
		assert_eq!(read_artifacts(&controller, &key)?, before);
		assert_eq!(
			controller.runtime().spec(&key.service_container()).map(|s| s.image),
			Some("chain:test".into())
		);
		assert_eq!(controller.state(&key)?, ChainState::Existing);
		assert_eq!(controller.runtime().list(&Default::default())?.len(), 2);
		Ok(())
	}

	#[test]
	fn create_with_a_genesis_file_sets_the_chain_id() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		let source = tempfile::tempdir()?;
		let path = source.path().join("genesis.json");
		fs::write(&path, r#"{"chain_id":"otherchain","app_state":{"height":7}}"#)?;

		controller.create(NewChain { genesis: Some(path), ..new_chain("mychain") }, &())?;

		let document: serde_json::Value =
			serde_json::from_slice(&read_artifacts(&controller, &key)?.genesis)?;
		assert_eq!(document["chain_id"], "mychain");
		assert_eq!(document["app_state"]["height"], 7);
		Ok(())
	}

	#[test]
	fn create_with_validators_lists_every_key() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		let keys = [
			"1d7a91cb32f758a02ea4c9d39e2f1d58bcd26f77f2e4b2c3e4d5f6a7b8c9d0e1",
			"3E4F5A6B7C8D9E0F1A2B3C4D5E6F7A8B9C0D1E2F3A4B5C6D7E8F9A0B1C2D3E4F",
		];
		let source = tempfile::tempdir()?;
		let path = source.path().join("validators.csv");
		fs::write(&path, format!("{},10,alice\n{},20\n", keys[0], keys[1]))?;

		controller.create(NewChain { config: ConfigSource::Csv(path), ..new_chain("mychain") }, &())?;

		let genesis = String::from_utf8(read_artifacts(&controller, &key)?.genesis)?;
		for pub_key in keys {
			assert!(genesis.contains(pub_key), "{pub_key} missing from {genesis}");
		}
		assert!(!genesis.contains(genesis::DEFAULT_PUB_KEY));
		Ok(())
	}

	#[test]
	fn create_with_options_changes_only_those_lines() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		let options = ["moniker=satoshi", "p2p=1.1.1.1:42", "fast-sync=true"]
			.iter()
			.map(|o| o.parse::<artifacts::ConfigOption>())
			.collect::<Result<Vec<_>, _>>()?;

		controller.create(
			NewChain { config: ConfigSource::Options(options), ..new_chain("mychain") },
			&(),
		)?;

		let expected = DEFAULT_CONFIG
			.replace("moniker = \"default\"", "moniker = \"satoshi\"")
			.replace("node_laddr = \"tcp://0.0.0.0:46656\"", "node_laddr = \"1.1.1.1:42\"")
			.replace("fast_sync = false", "fast_sync = true");
		assert_ne!(expected, DEFAULT_CONFIG);
		assert_eq!(String::from_utf8(read_artifacts(&controller, &key)?.config)?, expected);
		Ok(())
	}

	#[test]
	fn create_rejects_invalid_input_before_touching_the_runtime() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		assert!(matches!(
			controller.create(new_chain("my chain"), &()),
			Err(Error::Validation(_))
		));
		assert!(matches!(
			controller.create(NewChain { instance: 0, ..new_chain("mychain") }, &()),
			Err(Error::Validation(_))
		));
		assert!(matches!(
			controller.create(
				NewChain { seed_dir: Some("/does/not/exist".into()), ..new_chain("mychain") },
				&()
			),
			Err(Error::Artifact { .. })
		));
		assert!(matches!(
			controller.create(
				NewChain { genesis: Some("/does/not/exist.json".into()), ..new_chain("mychain") },
				&()
			),
			Err(Error::Artifact { .. })
		));
		assert!(controller.runtime().calls().is_empty());
		assert!(controller.store().list()?.is_empty());
		Ok(())
	}

	#[test]
	fn failed_create_leaves_nothing_behind() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		controller.runtime().fail_next("start", &key.service_container());

		let result = controller.create(NewChain { start: true, ..new_chain("mychain") }, &());

		assert!(matches!(result, Err(Error::Runtime { operation: "start", .. })));
		assert!(!controller.store().exists(&key)?);
		assert!(!controller.runtime().exists(&key.service_container()));
		assert!(!controller.runtime().exists(&key.data_container()));
		assert_eq!(controller.state(&key)?, ChainState::Absent);
		// The same request succeeds once the runtime recovers.
		running(&controller, "mychain")?;
		Ok(())
	}

	#[test]
	fn create_keeps_a_seeded_volume() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		let seed = tempfile::tempdir()?;
		fs::write(seed.path().join("priv_validator.json"), "{}")?;

		controller.create(
			NewChain { seed_dir: Some(seed.path().to_path_buf()), ..new_chain("mychain") },
			&(),
		)?;

		assert_eq!(
			controller
				.runtime()
				.read_file(&key.data_container(), "/home/chainctl/.chainctl/priv_validator.json"),
			Some(b"{}".to_vec())
		);
		Ok(())
	}

	#[test]
	fn start_works() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		controller.create(new_chain("mychain"), &())?;

		controller.start(&key, &StartOptions::default(), &())?;

		assert_eq!(controller.state(&key)?, ChainState::Running);
		assert!(matches!(
			controller.start(&key, &StartOptions::default(), &()),
			Err(Error::AlreadyRunning(_))
		));
		controller.start(&key, &StartOptions { allow_running: true, ..Default::default() }, &())?;
		Ok(())
	}

	#[test]
	fn start_unknown_fails() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		assert!(matches!(
			controller.start(&key("missing")?, &StartOptions::default(), &()),
			Err(Error::NotFound(_))
		));
		Ok(())
	}

	#[test]
	fn start_recreates_missing_containers() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		controller.create(new_chain("mychain"), &())?;
		controller.remove(&key, &RemoveOptions { remove_data: true, ..Default::default() })?;
		assert_eq!(controller.state(&key)?, ChainState::Absent);

		controller.start(&key, &StartOptions::default(), &())?;

		assert_eq!(controller.state(&key)?, ChainState::Running);
		let genesis = read_genesis(&controller, &key).expect("artifacts written again");
		assert_eq!(genesis::chain_id(&genesis), Some("mychain".into()));
		Ok(())
	}

	#[test]
	fn start_with_overrides_recreates_the_container() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		controller.create(new_chain("mychain"), &())?;
		let overrides = OperationsOverrides {
			ports: vec!["46657:46657".into()],
			..Default::default()
		};

		controller.start(&key, &StartOptions { overrides, ..Default::default() }, &())?;

		let spec = controller.runtime().spec(&key.service_container()).expect("recreated");
		assert_eq!(spec.ports, ["46657:46657"]);
		// Overrides are not persisted.
		assert!(controller.store().load(&key)?.operations.ports.is_empty());
		Ok(())
	}

	#[test]
	fn kill_works() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		running(&controller, "mychain")?;

		controller.kill(&key, &KillOptions::default())?;

		assert_eq!(controller.state(&key)?, ChainState::Existing);
		assert!(matches!(
			controller.kill(&key, &KillOptions::default()),
			Err(Error::NotRunning(_))
		));
		controller.kill(&key, &KillOptions { force: true, ..Default::default() })?;
		Ok(())
	}

	#[test]
	fn kill_and_remove_keeps_the_data() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		running(&controller, "mychain")?;

		controller.kill(&key, &KillOptions { remove: true, ..Default::default() })?;

		assert_eq!(controller.state(&key)?, ChainState::Absent);
		assert!(controller.runtime().exists(&key.data_container()));
		assert!(controller.store().exists(&key)?);
		Ok(())
	}

	#[test]
	fn kill_removing_data_removes_everything_but_the_definition() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		running(&controller, "mychain")?;

		controller.kill(&key, &KillOptions { remove_data: true, ..Default::default() })?;

		assert!(!controller.runtime().exists(&key.service_container()));
		assert!(!controller.runtime().exists(&key.data_container()));
		assert!(controller.store().exists(&key)?);
		Ok(())
	}

	#[test]
	fn kill_unknown_fails() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		assert!(matches!(
			controller.kill(&key("missing")?, &KillOptions { force: true, ..Default::default() }),
			Err(Error::NotFound(_))
		));
		Ok(())
	}

	#[test]
	fn remove_running_requires_force() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		running(&controller, "mychain")?;

		assert!(matches!(
			controller.remove(&key, &RemoveOptions::default()),
			Err(Error::StillRunning(_))
		));
		assert_eq!(controller.state(&key)?, ChainState::Running);

		controller.remove(&key, &RemoveOptions { force: true, ..Default::default() })?;
		assert_eq!(controller.state(&key)?, ChainState::Absent);
		assert!(controller.runtime().exists(&key.data_container()));
		Ok(())
	}

	#[test]
	fn remove_everything_works() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		controller.create(new_chain("mychain"), &())?;

		controller.remove(
			&key,
			&RemoveOptions { remove_data: true, remove_file: true, ..Default::default() },
		)?;

		assert!(!controller.runtime().exists(&key.service_container()));
		assert!(!controller.runtime().exists(&key.data_container()));
		assert!(!controller.store().exists(&key)?);
		assert!(matches!(
			controller.remove(&key, &RemoveOptions::default()),
			Err(Error::NotFound(_))
		));
		Ok(())
	}

	#[test]
	fn update_preserves_data_and_state() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		running(&controller, "mychain")?;
		controller.runtime().write_file(&key.data_container(), "/blocks/1", "block")?;

		controller.update(
			&key,
			&UpdateOptions { pull: true, image: Some("chain:next".into()), ..Default::default() },
			&(),
		)?;

		assert_eq!(controller.state(&key)?, ChainState::Running);
		assert_eq!(controller.runtime().pulls(), ["chain:next"]);
		assert_eq!(
			controller.runtime().spec(&key.service_container()).map(|s| s.image),
			Some("chain:next".into())
		);
		assert_eq!(controller.store().load(&key)?.service.image, "chain:next");
		assert_eq!(
			controller.runtime().read_file(&key.service_container(), "/blocks/1"),
			Some(b"block".to_vec())
		);
		Ok(())
	}

	#[test]
	fn update_keeps_a_stopped_chain_stopped() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let key = key("mychain")?;
		controller.create(new_chain("mychain"), &())?;

		controller.update(&key, &UpdateOptions::default(), &())?;

		assert_eq!(controller.state(&key)?, ChainState::Existing);
		assert!(controller.runtime().pulls().is_empty());
		Ok(())
	}

	#[test]
	fn update_unknown_fails() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		assert!(matches!(
			controller.update(&key("missing")?, &UpdateOptions::default(), &()),
			Err(Error::NotFound(_))
		));
		Ok(())
	}

	#[test]
	fn chain_state_display() {
		assert_eq!(ChainState::Absent.to_string(), "absent");
		assert_eq!("running".parse::<ChainState>(), Ok(ChainState::Running));
	}
}
