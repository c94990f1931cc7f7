// SPDX-License-Identifier: GPL-3.0

use super::{ChainArgs, OverrideArgs, chain_json, with_progress};
use crate::{cli::traits::Cli, style::format_name};
use anyhow::Result;
use chainctl_chains::{ChainController, DefinitionStore, UpdateOptions};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::Value;

#[derive(Args, Debug)]
pub(crate) struct UpdateArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// Pull the image before recreating the service container.
	#[arg(long)]
	pub(crate) pull: bool,
	/// Switch the chain to another image.
	#[arg(long)]
	pub(crate) image: Option<String>,
	/// Container settings, saved to the chain definition.
	#[command(flatten)]
	pub(crate) overrides: OverrideArgs,
}

impl UpdateArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let key = self.chain.key()?;
		cli.intro(format!("Update {key}"))?;
		let options =
			UpdateOptions { pull: self.pull, image: self.image, overrides: self.overrides.into() };
		with_progress(cli, "Updating the chain...", |progress| {
			controller.update(&key, &options, progress)
		})?;
		let data = chain_json(controller, &key)?;
		if data["state"] == "absent" {
			cli.warning(format!(
				"Chain {} has no container, the changes apply once it is started",
				format_name(&key)
			))?;
		}
		cli.outro(format!("Chain {} updated, its data is unchanged", format_name(&key)))?;
		Ok(data)
	}
}

#[cfg(test)]
mod tests {
	use super::{super::tests::*, *};
	use crate::cli::MockCli;

	fn args(name: &str) -> UpdateArgs {
		UpdateArgs {
			chain: chain(name),
			pull: false,
			image: None,
			overrides: OverrideArgs::default(),
		}
	}

	#[test]
	fn update_works() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		create(&controller, "mychain", true)?;
		let key = key("mychain")?;
		controller.runtime().write_file(&key.data_container(), "/data/blocks", "42")?;
		let mut cli = MockCli::new()
			.expect_intro("Update mychain")
			.expect_outro(format!(
				"Chain {} updated, its data is unchanged",
				format_name("mychain")
			));

		let data = UpdateArgs { pull: true, image: Some("chain:next".into()), ..args("mychain") }
			.execute(&mut cli, &controller)?;

		assert_eq!(data["state"], "running");
		assert_eq!(controller.runtime().pulls(), ["chain:next"]);
		let spec = controller.runtime().spec(&key.service_container());
		assert_eq!(spec.map(|s| s.image).as_deref(), Some("chain:next"));
		assert_eq!(
			controller.runtime().read_file(&key.service_container(), "/data/blocks").as_deref(),
			Some(b"42".as_slice())
		);
		cli.verify()
	}

	#[test]
	fn update_saves_overrides() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		create(&controller, "mychain", false)?;
		let overrides = OverrideArgs { ports: vec!["46657:46657".into()], ..Default::default() };

		let data = UpdateArgs { overrides, ..args("mychain") }
			.execute(&mut MockCli::new(), &controller)?;

		assert_eq!(data["state"], "existing");
		let definition = controller.store().load(&key("mychain")?)?;
		assert_eq!(definition.operations.ports, ["46657:46657"]);
		assert!(controller.runtime().pulls().is_empty());
		Ok(())
	}

	#[test]
	fn update_without_container_warns() -> Result<()> {
		let (controller, _temp_dir) = controller()?;
		create(&controller, "mychain", false)?;
		let key = key("mychain")?;
		controller.remove(&key, &Default::default())?;
		let mut cli = MockCli::new()
			.expect_warning(format!(
				"Chain {} has no container, the changes apply once it is started",
				format_name("mychain")
			))
			.expect_outro(format!(
				"Chain {} updated, its data is unchanged",
				format_name("mychain")
			));

		let data = UpdateArgs { image: Some("chain:next".into()), ..args("mychain") }
			.execute(&mut cli, &controller)?;

		assert_eq!(data["state"], "absent");
		assert_eq!(controller.store().load(&key)?.service.image, "chain:next");
		cli.verify()
	}
}
