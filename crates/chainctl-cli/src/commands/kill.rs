// SPDX-License-Identifier: GPL-3.0

use super::{ChainArgs, chain_json, with_progress};
use crate::{cli::traits::Cli, style::format_name};
use anyhow::Result;
use chainctl_chains::{ChainController, DefinitionStore, KillOptions};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::Value;

#[derive(Args, Debug)]
pub(crate) struct KillArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// Remove the service container once stopped.
	#[arg(long)]
	pub(crate) rm: bool,
	/// Remove the data container as well. Implies `--rm`.
	#[arg(long)]
	pub(crate) data: bool,
	/// Succeed when the chain is not running.
	#[arg(short, long)]
	pub(crate) force: bool,
}

impl KillArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let key = self.chain.key()?;
		let options = KillOptions { remove: self.rm, remove_data: self.data, force: self.force };
		with_progress(cli, &format!("Stopping {key}..."), |_| controller.kill(&key, &options))?;
		let outcome = match (options.remove, options.remove_data) {
			(_, true) => "stopped, its containers and data removed",
			(true, false) => "stopped and its service container removed",
			(false, false) => "stopped",
		};
		cli.success(format!("Chain {} {outcome}", format_name(&key)))?;
		chain_json(controller, &key)
	}
}
