// SPDX-License-Identifier: GPL-3.0

use super::{ChainArgs, write_output};
use crate::cli::traits::Cli;
use anyhow::Result;
use chainctl_chains::{ChainController, ChainFile, DefinitionStore};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::{Value, json};
use std::io::Write;

#[derive(Args, Debug)]
pub(crate) struct InspectArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// `name`, `id`, `image`, `running`, `ports` or a dotted path into the runtime's document,
	/// e.g. `Config.Env`. Everything when omitted.
	pub(crate) field: Option<String>,
}

impl InspectArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let key = self.chain.key()?;
		let value = controller.inspect(&key, self.field.as_deref())?;
		match &value {
			Value::String(s) => cli.plain(s)?,
			other => cli.plain(serde_json::to_string_pretty(other)?)?,
		}
		Ok(value)
	}
}

#[derive(Args, Debug)]
pub(crate) struct PortsArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
}

impl PortsArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		let key = self.chain.key()?;
		let ports = controller.ports(&key)?;
		if ports.is_empty() {
			cli.info(format!("Chain {key} publishes no ports"))?;
		}
		for port in &ports {
			cli.plain(port)?;
		}
		Ok(ports
			.iter()
			.map(|p| {
				json!({
					"container_port": p.container_port,
					"host_ip": p.host_ip,
					"host_port": p.host_port,
				})
			})
			.collect())
	}
}

#[derive(Args, Debug)]
pub(crate) struct CatArgs {
	#[command(flatten)]
	pub(crate) chain: ChainArgs,
	/// `definition`, `genesis` or `config`.
	#[arg(long, default_value = "definition")]
	pub(crate) file: ChainFile,
}

impl CatArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
		out: &mut dyn Write,
	) -> Result<Value> {
		let key = self.chain.key()?;
		let contents = controller.cat(&key, self.file)?;
		if cli.is_json() {
			return Ok(json!({
				"file": self.file.to_string(),
				"contents": String::from_utf8_lossy(&contents),
			}));
		}
		write_output(out, &contents)?;
		Ok(Value::Null)
	}
}
