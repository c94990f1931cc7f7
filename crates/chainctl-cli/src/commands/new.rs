// SPDX-License-Identifier: GPL-3.0

use super::{OverrideArgs, require_prompt, with_progress};
use crate::{
	cli::traits::{Cli, Input},
	style::format_name,
};
use anyhow::Result;
use chainctl_chains::{
	ChainController, ConfigKey, ConfigOption, ConfigSource, DefinitionStore, NewChain,
	naming::validate_name,
};
use chainctl_common::ContainerRuntime;
use clap::Args;
use serde_json::{Value, json};
use std::path::PathBuf;

const DEFAULT_NAME: &str = "mychain";

#[derive(Args, Debug)]
pub(crate) struct NewArgs {
	/// The name of the chain. Prompted for when omitted.
	pub(crate) name: Option<String>,
	/// The instance number of the chain.
	#[arg(short = 'n', long = "instance", default_value_t = 1)]
	pub(crate) instance: u32,
	/// A genesis document to start from. Its chain identifier is replaced by the chain name.
	#[arg(long)]
	pub(crate) genesis: Option<PathBuf>,
	/// A node configuration, used as is.
	#[arg(long)]
	pub(crate) config: Option<PathBuf>,
	/// A validator set replacing the validators of the genesis document, as `pub_key,power[,name]`
	/// rows.
	#[arg(long)]
	pub(crate) csv: Option<PathBuf>,
	/// Set a node configuration option, e.g. `moniker=satoshi`. May be repeated.
	#[arg(short = 'o', long = "option", value_name = "KEY=VALUE", long_help = option_help())]
	pub(crate) options: Vec<ConfigOption>,
	/// A directory whose contents are copied into the home directory of the chain.
	#[arg(long = "seed-dir")]
	pub(crate) seed_dir: Option<PathBuf>,
	/// The image to run instead of the default one.
	#[arg(long)]
	pub(crate) image: Option<String>,
	#[command(flatten)]
	pub(crate) overrides: OverrideArgs,
	/// Start the chain once created.
	#[arg(short, long)]
	pub(crate) start: bool,
	/// Replace an existing chain of the same name.
	#[arg(long)]
	pub(crate) overwrite: bool,
}

fn option_help() -> String {
	format!(
		"Set a node configuration option. May be repeated. Supported options:\n{}",
		ConfigKey::help()
	)
}

impl NewArgs {
	/// Executes the command.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
	) -> Result<Value> {
		cli.intro("Create a new chain")?;
		let name = match self.name {
			Some(name) => name,
			None => {
				require_prompt(cli, "a chain name")?;
				cli.input("What would you like to name your chain?")
					.placeholder(DEFAULT_NAME)
					.validate(|name: &String| {
						validate_name(name).map_err(|_| {
							"Use letters, digits, `_`, `.` and `-`, starting with a letter or digit."
						})
					})
					.interact()?
			},
		};
		let config = ConfigSource::from_parts(self.config, self.csv, self.options)?;
		let start = self.start;
		let chain = NewChain {
			name,
			instance: self.instance,
			genesis: self.genesis,
			config,
			seed_dir: self.seed_dir,
			image: self.image,
			overrides: self.overrides.into(),
			start,
			overwrite: self.overwrite,
		};

		let definition = with_progress(cli, "Creating the chain...", |progress| {
			controller.create(chain, progress)
		})?;
		let key = definition.key();
		cli.info(format!("Service container: {}", key.service_container()))?;
		cli.info(format!("Data container: {}", definition.operations.data_container_name))?;
		let state = controller.state(&key)?;
		cli.outro(format!(
			"Chain {} {}",
			format_name(&key),
			if start { "created and started" } else { "created" }
		))?;
		Ok(json!({ "chain": definition, "state": state }))
	}
}
