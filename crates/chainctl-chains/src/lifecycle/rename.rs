// SPDX-License-Identifier: GPL-3.0

use super::ChainController;
use crate::{
	Error, definition::ChainDefinition, errors::runtime, naming::ChainKey, store::DefinitionStore,
};
use chainctl_common::{ContainerRef, ContainerRuntime, Rollback};
use log::info;

impl<R: ContainerRuntime, S: DefinitionStore> ChainController<R, S> {
	/// Renames a chain: its containers and its definition. Either every step succeeds or the
	/// completed steps are undone.
	///
	/// The chain identifier inside the genesis document is left unchanged.
	///
	/// # Arguments
	/// * `key` - The chain to rename.
	/// * `name` - The new name.
	pub fn rename(&self, key: &ChainKey, name: &str) -> Result<ChainKey, Error> {
		let renamed = key.renamed(name)?;
		if &renamed == key {
			return Ok(renamed);
		}
		self.locks.with_pair(key, &renamed, || {
			let definition = self.store.load(key)?;
			if self.store.exists(&renamed)? ||
				self.inspect_container(&renamed.service_container())?.is_some() ||
				self.inspect_container(&renamed.data_container())?.is_some()
			{
				return Err(Error::NameConflict(renamed.clone()));
			}

			let mut rollback = Rollback::new();
			match self.rename_steps(&definition, &renamed, &mut rollback) {
				Ok(()) => rollback.commit(),
				Err(e) => {
					rollback.rollback();
					return Err(e);
				},
			}
			info!("renamed chain {key} to {renamed}");
			Ok(renamed.clone())
		})
	}

	fn rename_steps<'a>(
		&'a self,
		definition: &ChainDefinition,
		renamed: &ChainKey,
		rollback: &mut Rollback<'a, Error>,
	) -> Result<(), Error> {
		let key = definition.key();
		let containers = [
			(key.service_container(), renamed.service_container()),
			(definition.operations.data_container_name.clone(), renamed.data_container()),
		];
		for (from, to) in containers {
			if self.inspect_container(&from)?.is_none() {
				continue;
			}
			self.runtime
				.rename(&ContainerRef::new(&from), &to)
				.map_err(runtime("rename", &from))?;
			rollback.note(format!("rename {from} to {to}"), move || {
				self.runtime
					.rename(&ContainerRef::new(&to), &from)
					.map_err(runtime("rename", to.as_str()))
					.map(|_| ())
			});
		}

		let mut moved = definition.clone();
		moved.name = renamed.name.clone();
		moved.operations.data_container_name = renamed.data_container();
		self.store.save(&moved)?;
		let saved = renamed.clone();
		rollback.note(format!("save {saved}"), move || self.store.delete(&saved));
		self.store.delete(&key)
	}
}

#[cfg(test)]
mod tests {
	use super::super::{
		ChainState, KillOptions, NewChain,
		tests::{controller, key, new_chain, running},
	};
	use super::*;
	use crate::{artifacts::genesis, naming};
	use anyhow::Result;

	#[test]
	fn rename_works() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let (from, to) = (key("old")?, key("new")?);
		running(&controller, "old")?;

		assert_eq!(controller.rename(&from, "new")?, to);

		assert_eq!(controller.state(&from)?, ChainState::Absent);
		assert_eq!(controller.state(&to)?, ChainState::Running);
		assert!(!controller.store().exists(&from)?);
		let definition = controller.store().load(&to)?;
		assert_eq!(definition.operations.data_container_name, to.data_container());
		// The chain keeps its identifier, and with it the location of its artifacts.
		assert_eq!(definition.chain_id, "old");
		let genesis = controller
			.runtime()
			.read_file(&to.data_container(), &naming::genesis_path("old"))
			.expect("artifacts kept");
		assert_eq!(genesis::chain_id(&genesis), Some("old".into()));
		Ok(())
	}

	#[test]
	fn renaming_back_restores_the_chain() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let from = key("old")?;
		running(&controller, "old")?;
		controller.runtime().write_file(&from.data_container(), "/seed/notes", "kept")?;

		let to = controller.rename(&from, "new")?;
		assert_eq!(controller.rename(&to, "old")?, from);

		assert_eq!(controller.state(&from)?, ChainState::Running);
		assert_eq!(controller.state(&to)?, ChainState::Absent);
		assert_eq!(
			controller.runtime().read_file(&from.data_container(), "/seed/notes"),
			Some(b"kept".to_vec())
		);
		Ok(())
	}

	#[test]
	fn renamed_chains_can_be_restarted() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		running(&controller, "old")?;
		let to = controller.rename(&key("old")?, "new")?;

		controller.kill(&to, &KillOptions::default())?;
		controller.start(&to, &Default::default(), &())?;

		assert_eq!(controller.state(&to)?, ChainState::Running);
		Ok(())
	}

	#[test]
	fn rename_to_existing_fails() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		controller.create(new_chain("a"), &())?;
		controller.create(new_chain("b"), &())?;

		assert!(matches!(
			controller.rename(&key("a")?, "b"),
			Err(Error::NameConflict(k)) if k.name == "b"
		));
		assert!(controller.store().exists(&key("a")?)?);
		assert_eq!(controller.state(&key("a")?)?, ChainState::Existing);
		Ok(())
	}

	#[test]
	fn rename_unknown_fails() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		assert!(matches!(controller.rename(&key("missing")?, "new"), Err(Error::NotFound(_))));
		Ok(())
	}

	#[test]
	fn rename_to_invalid_name_fails() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		controller.create(new_chain("a"), &())?;
		assert!(matches!(controller.rename(&key("a")?, "not valid"), Err(Error::Validation(_))));
		Ok(())
	}

	#[test]
	fn failed_rename_is_rolled_back() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		let (from, to) = (key("old")?, key("new")?);
		controller.create(NewChain { start: true, ..new_chain("old") }, &())?;
		controller.runtime().fail_next("rename", &from.data_container());

		assert!(matches!(
			controller.rename(&from, "new"),
			Err(Error::Runtime { operation: "rename", .. })
		));

		assert_eq!(controller.state(&from)?, ChainState::Running);
		assert!(controller.runtime().exists(&from.data_container()));
		assert!(!controller.runtime().exists(&to.service_container()));
		assert!(controller.store().exists(&from)?);
		assert!(!controller.store().exists(&to)?);
		Ok(())
	}

	#[test]
	fn renaming_to_the_same_name_does_nothing() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		controller.create(new_chain("a"), &())?;
		let calls = controller.runtime().calls();
		assert_eq!(controller.rename(&key("a")?, "a")?, key("a")?);
		assert_eq!(controller.runtime().calls(), calls);
		Ok(())
	}
}
