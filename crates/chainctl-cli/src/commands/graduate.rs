// SPDX-License-Identifier: GPL-3.0

use super::ChainArgs;
use crate::{cli::traits::Cli, style::format_name};
use anyhow::Result;
use chainctl_chains::{ChainController, DefinitionStore};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::Value;

#[derive(Args, Debug)]
pub(crate) struct GraduateArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
}

impl GraduateArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let key = self.chain.key()?;
		let service = controller.graduate(&key)?;
		cli.success(format!(
			"Chain {} graduated to service {}, depending on {}",
			format_name(&key),
			format_name(&service.name),
			service.service.dependencies.iter().cloned().collect::<Vec<_>>().join(", ")
		))?;
		Ok(serde_json::to_value(&service)?)
	}
}
