// SPDX-License-Identifier: GPL-3.0

use crate::{
	Error,
	definition::{ChainDefinition, ServiceDefinition},
	naming::{self, ChainKey},
};
use log::debug;
use serde::{Serialize, de::DeserializeOwned};
use std::{
	fs,
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Persistence of chain and service definitions.
pub trait DefinitionStore: Send + Sync {
	/// Loads the definition of a chain instance, failing with [`Error::NotFound`] when absent.
	fn load(&self, key: &ChainKey) -> Result<ChainDefinition, Error>;
	/// Saves the definition of a chain instance, replacing any previous one.
	fn save(&self, definition: &ChainDefinition) -> Result<(), Error>;
	/// Deletes the definition of a chain instance. Deleting an absent definition succeeds.
	fn delete(&self, key: &ChainKey) -> Result<(), Error>;
	/// Whether a definition exists for the chain instance.
	fn exists(&self, key: &ChainKey) -> Result<bool, Error>;
	/// Lists the chain instances with a definition.
	fn list(&self) -> Result<Vec<ChainKey>, Error>;
	/// Saves a service definition.
	fn save_service(&self, service: &ServiceDefinition) -> Result<(), Error>;
	/// Loads a service definition.
	fn load_service(&self, name: &str) -> Result<ServiceDefinition, Error>;
}

/// Stores definitions as TOML files below a root directory.
pub struct FileStore {
	root: PathBuf,
}

impl FileStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// The root directory.
	pub fn root(&self) -> &Path {
		&self.root
	}

	fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, Error> {
		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		toml_edit::de::from_str(&content)
			.map(Some)
			.map_err(|e| Error::Store(format!("{}: {e}", path.display())))
	}

	// Writes to a temporary file next to the destination first, so readers never observe a
	// partially written definition.
	fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
		let content = toml_edit::ser::to_string_pretty(value)
			.map_err(|e| Error::Store(format!("{}: {e}", path.display())))?;
		let dir = path
			.parent()
			.ok_or_else(|| Error::Store(format!("{} has no parent", path.display())))?;
		fs::create_dir_all(dir)?;
		let mut file = NamedTempFile::new_in(dir)?;
		file.write_all(content.as_bytes())?;
		file.persist(path).map_err(|e| Error::IO(e.error))?;
		debug!("saved {}", path.display());
		Ok(())
	}
}

impl DefinitionStore for FileStore {
	fn load(&self, key: &ChainKey) -> Result<ChainDefinition, Error> {
		Self::read(&naming::definition_file(&self.root, key))?
			.ok_or_else(|| Error::NotFound(key.clone()))
	}

	fn save(&self, definition: &ChainDefinition) -> Result<(), Error> {
		Self::write(&naming::definition_file(&self.root, &definition.key()), definition)
	}

	fn delete(&self, key: &ChainKey) -> Result<(), Error> {
		match fs::remove_file(naming::definition_file(&self.root, key)) {
			Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
			_ => Ok(()),
		}
	}

	fn exists(&self, key: &ChainKey) -> Result<bool, Error> {
		Ok(naming::definition_file(&self.root, key).is_file())
	}

	fn list(&self) -> Result<Vec<ChainKey>, Error> {
		let dir = self.root.join("chains");
		let entries = match fs::read_dir(&dir) {
			Ok(entries) => entries,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(e.into()),
		};
		let mut keys = Vec::new();
		for entry in entries {
			let path = entry?.path();
			if path.extension().is_none_or(|e| e != "toml") {
				continue;
			}
			match Self::read::<ChainDefinition>(&path) {
				Ok(Some(definition)) => keys.push(definition.key()),
				Ok(None) => {},
				Err(e) => log::warn!("skipping unreadable definition: {e}"),
			}
		}
		keys.sort();
		Ok(keys)
	}

	fn save_service(&self, service: &ServiceDefinition) -> Result<(), Error> {
		Self::write(&naming::service_file(&self.root, &service.name), service)
	}

	fn load_service(&self, name: &str) -> Result<ServiceDefinition, Error> {
		Self::read(&naming::service_file(&self.root, name))?
			.ok_or_else(|| Error::ServiceNotFound(name.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::definition::ChainDefaults;
	use anyhow::Result;

	fn definition(name: &str, instance: u32) -> Result<ChainDefinition> {
		Ok(ChainDefinition::new(&ChainKey::new(name, instance)?, &ChainDefaults::default()))
	}

	#[test]
	fn save_and_load_works() -> Result<()> {
		let temp_dir = tempfile::tempdir()?;
		let store = FileStore::new(temp_dir.path());
		let definition = definition("mychain", 1)?;

		store.save(&definition)?;

		assert!(temp_dir.path().join("chains/mychain_1.toml").is_file());
		assert!(store.exists(&definition.key())?);
		assert_eq!(store.load(&definition.key())?, definition);
		Ok(())
	}

	#[test]
	fn load_missing_fails() -> Result<()> {
		let temp_dir = tempfile::tempdir()?;
		let store = FileStore::new(temp_dir.path());
		let key = ChainKey::new("missing", 1)?;
		assert!(matches!(store.load(&key), Err(Error::NotFound(k)) if k == key));
		assert!(!store.exists(&key)?);
		Ok(())
	}

	#[test]
	fn delete_works() -> Result<()> {
		let temp_dir = tempfile::tempdir()?;
		let store = FileStore::new(temp_dir.path());
		let definition = definition("mychain", 1)?;
		store.save(&definition)?;

		store.delete(&definition.key())?;
		assert!(!store.exists(&definition.key())?);
		// Deleting again is fine.
		store.delete(&definition.key())?;
		Ok(())
	}

	#[test]
	fn list_works() -> Result<()> {
		let temp_dir = tempfile::tempdir()?;
		let store = FileStore::new(temp_dir.path());
		assert!(store.list()?.is_empty());
		for (name, instance) in [("b", 1), ("a", 2), ("a", 1)] {
			store.save(&definition(name, instance)?)?;
		}
		fs::write(temp_dir.path().join("chains/notes.txt"), "ignored")?;
		fs::write(temp_dir.path().join("chains/broken.toml"), "name = ")?;

		assert_eq!(
			store.list()?,
			[ChainKey::new("a", 1)?, ChainKey::new("a", 2)?, ChainKey::new("b", 1)?]
		);
		Ok(())
	}

	#[test]
	fn corrupt_definitions_are_reported() -> Result<()> {
		let temp_dir = tempfile::tempdir()?;
		let store = FileStore::new(temp_dir.path());
		let key = ChainKey::new("mychain", 1)?;
		fs::create_dir_all(temp_dir.path().join("chains"))?;
		fs::write(naming::definition_file(temp_dir.path(), &key), "name = 1")?;
		assert!(matches!(store.load(&key), Err(Error::Store(_))));
		Ok(())
	}

	#[test]
	fn services_work() -> Result<()> {
		let temp_dir = tempfile::tempdir()?;
		let store = FileStore::new(temp_dir.path());
		let definition = definition("mychain", 1)?;
		let service = ServiceDefinition {
			name: "mychain".into(),
			chain: Some("mychain".into()),
			service: definition.service.clone(),
			operations: definition.operations.clone(),
		};

		store.save_service(&service)?;

		assert_eq!(store.load_service("mychain")?, service);
		assert!(matches!(store.load_service("other"), Err(Error::ServiceNotFound(_))));
		Ok(())
	}
}
