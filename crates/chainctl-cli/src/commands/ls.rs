// SPDX-License-Identifier: GPL-3.0

use crate::cli::traits::Cli;
use anyhow::Result;
use chainctl_chains::{ChainController, ChainState, ChainSummary, DefinitionStore};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::Value;
use std::fmt::Display;

#[derive(Args, Debug, Default)]
pub(crate) struct LsArgs {
	/// Only list running chains.
	#[arg(long)]
	pub(crate) running: bool,
	/// Only list chains with a service container.
	#[arg(long, conflicts_with = "running")]
	pub(crate) existing: bool,
}

impl LsArgs {
	fn matches(&self, chain: &ChainSummary) -> bool {
		match chain.state() {
			ChainState::Running => true,
			ChainState::Existing => !self.running,
			ChainState::Absent => !self.running && !self.existing,
		}
	}

	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let chains: Vec<ChainSummary> =
			controller.list()?.into_iter().filter(|c| self.matches(c)).collect();
		if chains.is_empty() {
			cli.info("No chains found")?;
		} else {
			cli.plain(row("NAME", "INSTANCE", "STATE", "DEFINITION"))?;
		}
		for chain in &chains {
			cli.plain(row(
				&chain.key.name,
				chain.key.instance,
				chain.state(),
				if chain.known { "yes" } else { "no" },
			))?;
		}
		Ok(serde_json::to_value(&chains)?)
	}
}

fn row(name: &str, instance: impl Display, state: impl Display, known: &str) -> String {
	format!("{name:<24} {:>8}  {:<9} {known}", instance.to_string(), state.to_string())
}
