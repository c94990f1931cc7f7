// SPDX-License-Identifier: GPL-3.0

use super::{ChainArgs, require_prompt, with_progress};
use crate::{
	cli::traits::{Cli, Confirm},
	style::format_name,
};
use anyhow::Result;
use chainctl_chains::{ChainController, DefinitionStore, RemoveOptions};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::{Value, json};

#[derive(Args, Debug)]
pub(crate) struct RmArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// Stop the chain first when it is running.
	#[arg(short, long)]
	pub(crate) force: bool,
	/// Remove the data container as well, losing the genesis, the configuration and everything
	/// the node stored.
	#[arg(long)]
	pub(crate) data: bool,
	/// Delete the chain definition as well.
	#[arg(long)]
	pub(crate) file: bool,
	/// Do not ask for confirmation before removing data or definitions.
	#[arg(short = 'y', long)]
	pub(crate) yes: bool,
}

impl RmArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let key = self.chain.key()?;
		if (self.data || self.file) && !self.yes {
			require_prompt(cli, "--yes")?;
			let confirmed = cli
				.confirm(format!(
					"Remove {} of {key} permanently?",
					match (self.data, self.file) {
						(true, true) => "the data and the definition",
						(true, false) => "the data",
						_ => "the definition",
					}
				))
				.initial_value(false)
				.interact()?;
			if !confirmed {
				cli.outro_cancel(format!("Chain {key} left unchanged"))?;
				return Ok(json!({ "removed": false }));
			}
		}

		let options =
			RemoveOptions { force: self.force, remove_data: self.data, remove_file: self.file };
		with_progress(cli, &format!("Removing {key}..."), |_| controller.remove(&key, &options))?;
		cli.success(format!("Chain {} removed", format_name(&key)))?;
		Ok(json!({
			"removed": true,
			"name": key.name,
			"instance": key.instance,
			"data": self.data,
			"definition": self.file,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::{super::tests::*, *};
	use crate::{cli::MockCli, output::PromptRequiredError};
	use chainctl_chains::{ChainState, Error as ChainError};

	fn args(name: &str) -> RmArgs {
		RmArgs { chain: chain(name), force: false, data: false, file: false, yes: false }
	}

	#[test]
	fn rm_works() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		create(&controller, "mychain", false)?;
		let mut cli =
			MockCli::new().expect_success(format!("Chain {} removed", format_name("mychain")));

		args("mychain").execute(&mut cli, &controller)?;

		let key = key("mychain")?;
		assert_eq!(controller.state(&key)?, ChainState::Absent);
		assert!(controller.runtime().exists(&key.data_container()));
		assert!(controller.store().exists(&key)?);
		cli.verify()
	}

	#[test]
	fn rm_running_chain_requires_force() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		create(&controller, "mychain", true)?;

		let error = args("mychain").execute(&mut MockCli::new(), &controller).unwrap_err();
		assert!(matches!(error.downcast_ref::<ChainError>(), Some(ChainError::StillRunning(_))));

		RmArgs { force: true, ..args("mychain") }.execute(&mut MockCli::new(), &controller)?;
		assert_eq!(controller.state(&key("mychain")?)?, ChainState::Absent);
		Ok(())
	}

	#[test]
	fn rm_everything_after_confirmation() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		create(&controller, "mychain", false)?;
		let mut cli = MockCli::new()
			.expect_confirm("Remove the data and the definition of mychain permanently?", true)
			.expect_success(format!("Chain {} removed", format_name("mychain")));

		let data =
			RmArgs { data: true, file: true, ..args("mychain") }.execute(&mut cli, &controller)?;

		assert_eq!(data["removed"], true);
		let key = key("mychain")?;
		assert!(!controller.runtime().exists(&key.data_container()));
		assert!(!controller.store().exists(&key)?);
		cli.verify()
	}

	#[test]
	fn rm_cancelled_leaves_chain_unchanged() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		create(&controller, "mychain", false)?;
		let mut cli = MockCli::new()
			.expect_confirm("Remove the data of mychain permanently?", false)
			.expect_outro_cancel("Chain mychain left unchanged");

		let data = RmArgs { data: true, ..args("mychain") }.execute(&mut cli, &controller)?;

		assert_eq!(data["removed"], false);
		assert_eq!(controller.state(&key("mychain")?)?, ChainState::Existing);
		cli.verify()
	}

	#[test]
	fn rm_data_requires_yes_in_json_mode() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		create(&controller, "mychain", false)?;

		let error = RmArgs { file: true, ..args("mychain") }
			.execute(&mut MockCli::new().with_json(), &controller)
			.unwrap_err();
		assert!(error.downcast_ref::<PromptRequiredError>().is_some());

		RmArgs { file: true, yes: true, ..args("mychain") }
			.execute(&mut MockCli::new().with_json(), &controller)?;
		assert!(!controller.store().exists(&key("mychain")?)?);
		Ok(())
	}
}
