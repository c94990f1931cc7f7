// SPDX-License-Identifier: GPL-3.0

use super::{ChainArgs, chain_json, with_progress};
use crate::{cli::traits::Cli, style::format_name};
use anyhow::Result;
use chainctl_chains::{ChainController, DefinitionStore};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::Value;

#[derive(Args, Debug)]
pub(crate) struct RenameArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// The new name of the chain.
	pub(crate) new_name: String,
}

impl RenameArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let key = self.chain.key()?;
		let renamed = with_progress(cli, &format!("Renaming {key}..."), |_| {
			controller.rename(&key, &self.new_name)
		})?;
		cli.success(format!("Chain {} renamed to {}", format_name(&key), format_name(&renamed)))?;
		cli.info("The chain identifier of the genesis document is unchanged.")?;
		chain_json(controller, &renamed)
	}
}
