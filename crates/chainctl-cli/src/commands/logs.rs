// SPDX-License-Identifier: GPL-3.0

use super::{ChainArgs, write_output};
use crate::{cli::traits::Cli, output::reject_unsupported_json};
use anyhow::Result;
use chainctl_chains::{ChainController, DefinitionStore};
use chainctl_common::{ContainerRuntime, LogOptions};
use clap::Args;
use serde_json::{Value, json};
use std::io::Write;

#[derive(Args, Debug)]
pub(crate) struct LogsArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// Keep printing new output.
	#[arg(short, long)]
	pub(crate) follow: bool,
	/// Number of lines to show from the end of the logs, or `all`.
	#[arg(long, value_name = "LINES")]
	pub(crate) tail: Option<String>,
}

impl LogsArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
		out: &mut dyn Write,
	) -> Result<Value> {
		let key = self.chain.key()?;
		let options = LogOptions { follow: self.follow, tail: self.tail };
		if cli.is_json() {
			if options.follow {
				reject_unsupported_json("logs --follow")?;
			}
			let mut logs = Vec::new();
			controller.logs(&key, &options, &mut logs)?;
			let lines: Vec<String> =
				String::from_utf8_lossy(&logs).lines().map(String::from).collect();
			return Ok(json!({ "lines": lines }));
		}
		if options.follow {
			// Streams until the container stops or the command is cancelled.
			controller.logs(&key, &options, out)?;
			return Ok(Value::Null);
		}
		let mut logs = Vec::new();
		controller.logs(&key, &options, &mut logs)?;
		write_output(out, &logs)?;
		Ok(Value::Null)
	}
}
