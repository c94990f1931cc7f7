// SPDX-License-Identifier: GPL-3.0

use super::{ChainArgs, write_output};
use crate::{cli::traits::Cli, output::reject_unsupported_json};
use anyhow::Result;
use chainctl_chains::{ChainController, DefinitionStore};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::{Value, json};
use std::io::Write;

#[derive(Args, Debug)]
pub(crate) struct ExecArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// Attach the command to the terminal. Requires a running chain.
	#[arg(short, long)]
	pub(crate) interactive: bool,
	/// The command to run, e.g. `-- ls /home/chainctl/.chainctl`.
	#[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
	pub(crate) command: Vec<String>,
}

impl ExecArgs {
	/// Executes the command.
	///
	/// A stopped chain runs the command in a throwaway container sharing the chain's data.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
		out: &mut dyn Write,
	) -> Result<Value> {
		let key = self.chain.key()?;
		if cli.is_json() {
			if self.interactive {
				reject_unsupported_json("exec --interactive")?;
			}
			let mut output = Vec::new();
			controller.exec(&key, &self.command, false, &mut output)?;
			return Ok(json!({ "output": String::from_utf8_lossy(&output) }));
		}
		let mut output = Vec::new();
		controller.exec(&key, &self.command, self.interactive, &mut output)?;
		write_output(out, &output)?;
		Ok(Value::Null)
	}
}
