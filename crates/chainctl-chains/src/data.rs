// SPDX-License-Identifier: GPL-3.0

//! Data containers, which own the persistent volume of a chain.

use crate::{
	Error,
	artifacts::Artifacts,
	definition::ChainDefinition,
	errors::runtime,
	naming::{self, CONFIG_FILE, GENESIS_FILE},
};
use chainctl_common::{ContainerRef, ContainerRuntime, ContainerSpec};
use log::debug;
use std::{fs, path::Path};

/// Manages the data containers of chains.
pub struct DataVolumes<'a, R: ContainerRuntime> {
	runtime: &'a R,
	image: &'a str,
}

impl<'a, R: ContainerRuntime> DataVolumes<'a, R> {
	/// # Arguments
	/// * `runtime` - The container runtime.
	/// * `image` - The image data containers and throwaway containers are created from.
	pub fn new(runtime: &'a R, image: &'a str) -> Self {
		Self { runtime, image }
	}

	/// Whether the data container of the chain exists.
	pub fn exists(&self, definition: &ChainDefinition) -> Result<bool, Error> {
		let name = &definition.operations.data_container_name;
		Ok(self.runtime.inspect(name).map_err(runtime("inspect", name))?.is_some())
	}

	/// Creates the data container of the chain unless it already exists. Returns the container
	/// along with whether it was created.
	pub fn ensure(&self, definition: &ChainDefinition) -> Result<(ContainerRef, bool), Error> {
		let name = &definition.operations.data_container_name;
		if self.exists(definition)? {
			return Ok((ContainerRef::new(name), false));
		}
		debug!("creating data container {name}");
		let container = self
			.runtime
			.create(&definition.data_spec(self.image))
			.map_err(runtime("create", name))?;
		Ok((container, true))
	}

	/// Writes the artifacts of a chain into its directory on the data volume.
	///
	/// The contents of `seed` are copied into the home directory first, so the artifacts win over
	/// any seeded files of the same name.
	pub fn write_artifacts(
		&self,
		data: &ContainerRef,
		chain_id: &str,
		artifacts: &Artifacts,
		seed: Option<&Path>,
	) -> Result<(), Error> {
		if let Some(seed) = seed {
			debug!("seeding {data} from {}", seed.display());
			self.runtime
				.copy_into(data, &seed.join("."), naming::HOME)
				.map_err(runtime("copy into", data.name()))?;
		}
		let staging = tempfile::tempdir()?;
		let chain_dir = staging.path().join("chains").join(chain_id);
		fs::create_dir_all(&chain_dir)?;
		fs::write(chain_dir.join(GENESIS_FILE), &artifacts.genesis)?;
		fs::write(chain_dir.join(CONFIG_FILE), &artifacts.config)?;
		self.runtime
			.copy_into(data, &staging.path().join("."), naming::HOME)
			.map_err(runtime("copy into", data.name()))
	}

	/// Reads the artifacts of a chain back from the data volume.
	pub fn read_artifacts(&self, data: &ContainerRef, chain_id: &str) -> Result<Artifacts, Error> {
		let cat = |path: String| self.run_with_volume(data, &["cat".into(), path]);
		Ok(Artifacts {
			genesis: cat(naming::genesis_path(chain_id))?,
			config: cat(naming::config_path(chain_id))?,
		})
	}

	/// Runs a command in a throwaway container with the data volume mounted, returning its output.
	pub fn run_with_volume(
		&self,
		data: &ContainerRef,
		command: &[String],
	) -> Result<Vec<u8>, Error> {
		let spec = ContainerSpec {
			command: command.to_vec(),
			volumes_from: Some(data.name().to_string()),
			..ContainerSpec::new("", self.image)
		};
		self.runtime.run(&spec).map_err(runtime("run a command with", data.name()))
	}

	/// Removes a data container along with its volume.
	pub fn remove(&self, data: &ContainerRef) -> Result<(), Error> {
		debug!("removing data container {data}");
		self.runtime.remove(data, true).map_err(runtime("remove", data.name()))
	}
}
