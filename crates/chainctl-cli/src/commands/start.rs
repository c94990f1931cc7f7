// SPDX-License-Identifier: GPL-3.0

use super::{ChainArgs, OverrideArgs, chain_json, with_progress};
use crate::{cli::traits::Cli, style::format_name};
use anyhow::Result;
use chainctl_chains::{ChainController, DefinitionStore, StartOptions};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::Value;

#[derive(Args, Debug)]
pub(crate) struct StartArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// Succeed when the chain is already running.
	#[arg(long = "allow-running")]
	pub(crate) allow_running: bool,
	/// Container settings for this run only; the chain definition is left unchanged.
	#[command(flatten)]
	pub(crate) overrides: OverrideArgs,
}

impl StartArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let key = self.chain.key()?;
		let options =
			StartOptions { allow_running: self.allow_running, overrides: self.overrides.into() };
		with_progress(cli, &format!("Starting {key}..."), |progress| {
			controller.start(&key, &options, progress)
		})?;
		cli.success(format!("Chain {} is running", format_name(&key)))?;
		chain_json(controller, &key)
	}
}
