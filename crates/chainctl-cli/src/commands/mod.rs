// SPDX-License-Identifier: GPL-3.0

use crate::cli::traits::{Cli, Spinner};
use anyhow::{Result, anyhow};
use chainctl_chains::{
	ChainController, ChainKey, DefinitionStore, Error as ChainError, OperationsOverrides,
};
use chainctl_common::{ContainerRuntime, Status};
use clap::{Args, Subcommand};
use serde_json::{Value, json};
use std::io::Write;

pub(crate) mod exec;
pub(crate) mod graduate;
pub(crate) mod inspect;
pub(crate) mod kill;
pub(crate) mod logs;
pub(crate) mod ls;
pub(crate) mod new;
pub(crate) mod rename;
pub(crate) mod rm;
pub(crate) mod start;
pub(crate) mod update;

#[derive(Subcommand)]
#[command(subcommand_required = true)]
pub(crate) enum Command {
	/// Create a new chain.
	#[clap(alias = "n")]
	New(new::NewArgs),
	/// Start a chain, creating its containers when missing.
	Start(start::StartArgs),
	/// Stop a running chain.
	#[clap(alias = "stop")]
	Kill(kill::KillArgs),
	/// Remove the containers of a chain and, optionally, its data and definition.
	#[clap(alias = "remove")]
	Rm(rm::RmArgs),
	/// Rename a chain along with its containers.
	#[clap(alias = "mv")]
	Rename(rename::RenameArgs),
	/// Recreate the service container of a chain, keeping its data.
	Update(update::UpdateArgs),
	/// Turn a chain into a long-running service definition.
	Graduate(graduate::GraduateArgs),
	/// Run a command within a chain.
	Exec(exec::ExecArgs),
	/// Print the logs of a chain.
	Logs(logs::LogsArgs),
	/// Inspect the service container of a chain.
	Inspect(inspect::InspectArgs),
	/// List the published ports of a chain.
	Ports(inspect::PortsArgs),
	/// Print the definition, genesis or node configuration of a chain.
	Cat(inspect::CatArgs),
	/// List known and existing chains.
	#[clap(alias = "list")]
	Ls(ls::LsArgs),
}

impl Command {
	/// Executes the command, returning the data reported in `--json` mode.
	///
	/// # Arguments
	/// * `cli` - The cli to be used.
	/// * `controller` - The controller driving the chains.
	/// * `out` - Receives the raw output of commands printing chain output, like `exec`.
	pub(crate) fn execute<R: ContainerRuntime, S: DefinitionStore>(
		self,
		cli: &mut impl Cli,
		controller: &ChainController<R, S>,
		out: &mut dyn Write,
	) -> Result<Value> {
		match self {
			Self::New(args) => args.execute(cli, controller),
			Self::Start(args) => args.execute(cli, controller),
			Self::Kill(args) => args.execute(cli, controller),
			Self::Rm(args) => args.execute(cli, controller),
			Self::Rename(args) => args.execute(cli, controller),
			Self::Update(args) => args.execute(cli, controller),
			Self::Graduate(args) => args.execute(cli, controller),
			Self::Exec(args) => args.execute(cli, controller, out),
			Self::Logs(args) => args.execute(cli, controller, out),
			Self::Inspect(args) => args.execute(cli, controller),
			Self::Ports(args) => args.execute(cli, controller),
			Self::Cat(args) => args.execute(cli, controller, out),
			Self::Ls(args) => args.execute(cli, controller),
		}
	}
}

/// Addresses a chain instance.
#[derive(Args, Clone, Debug)]
pub(crate) struct ChainArgs {
	/// The name of the chain.
	pub(crate) name: String,
	/// The instance number of the chain.
	#[arg(short = 'n', long = "instance", default_value_t = 1)]
	pub(crate) instance: u32,
}

impl ChainArgs {
	pub(crate) fn key(&self) -> Result<ChainKey> {
		Ok(ChainKey::new(&self.name, self.instance)?)
	}
}

/// Container settings taking precedence over those of the chain definition.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct OverrideArgs {
	/// Publish every exposed port to a random host port.
	#[arg(short = 'P', long = "publish-all")]
	pub(crate) publish_all: bool,
	/// Publish a port (`host:container`). May be repeated.
	#[arg(short = 'p', long = "port", value_name = "HOST:CONTAINER")]
	pub(crate) ports: Vec<String>,
	/// Mount a volume (`host:container`). May be repeated.
	#[arg(short = 'v', long = "volume", value_name = "HOST:CONTAINER")]
	pub(crate) volumes: Vec<String>,
	/// Set an environment variable. May be repeated.
	#[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_env)]
	pub(crate) environment: Vec<(String, String)>,
}

impl From<OverrideArgs> for OperationsOverrides {
	fn from(args: OverrideArgs) -> Self {
		OperationsOverrides {
			publish_all_ports: args.publish_all.then_some(true),
			volumes: args.volumes,
			ports: args.ports,
			environment: args.environment.into_iter().collect(),
		}
	}
}

fn parse_env(s: &str) -> Result<(String, String), String> {
	match s.split_once('=') {
		Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
		_ => Err(format!("expected KEY=VALUE, got `{s}`")),
	}
}

/// Forwards the progress of a transition to a spinner.
pub(crate) struct Progress(Box<dyn Spinner + Send>);

impl Status for Progress {
	fn update(&self, status: &str) {
		self.0.set_message(status);
	}
}

/// Runs a transition behind a spinner, which is cleared on success.
pub(crate) fn with_progress<T>(
	cli: &mut impl Cli,
	message: &str,
	transition: impl FnOnce(&Progress) -> Result<T, ChainError>,
) -> Result<T> {
	let progress = Progress(cli.spinner());
	progress.0.start(message);
	match transition(&progress) {
		Ok(result) => {
			progress.0.clear();
			Ok(result)
		},
		Err(e) => {
			progress.0.error(&e.to_string());
			Err(e.into())
		},
	}
}

/// The state of a chain as reported in `--json` mode.
pub(crate) fn chain_json<R: ContainerRuntime, S: DefinitionStore>(
	controller: &ChainController<R, S>,
	key: &ChainKey,
) -> Result<Value> {
	Ok(json!({
		"name": key.name,
		"instance": key.instance,
		"state": controller.state(key)?,
	}))
}

/// Ensures interactive use, failing in `--json` mode with a hint at the flag to be used instead.
pub(crate) fn require_prompt(cli: &mut impl Cli, flag: &str) -> Result<()> {
	if cli.is_json() {
		return Err(crate::output::PromptRequiredError(format!(
			"{flag} is required when using --json"
		))
		.into());
	}
	Ok(())
}

/// Writes raw chain output, failing with a readable error when the output cannot be written.
pub(crate) fn write_output(out: &mut dyn Write, output: &[u8]) -> Result<()> {
	out.write_all(output).map_err(|e| anyhow!("failed to write output: {e}"))?;
	out.flush().map_err(|e| anyhow!("failed to write output: {e}"))
}
