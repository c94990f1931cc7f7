// SPDX-License-Identifier: GPL-3.0

mod cli;
mod commands;
mod output;
mod settings;
mod style;

use anyhow::Result;
use chainctl_chains::{ChainController, FileStore};
use chainctl_common::{CancellationToken, Docker, DockerStatus};
use clap::Parser;
use log::debug;
use output::{CliError, CliResponse, RuntimeUnavailableError};
use serde_json::Value;
use settings::Settings;

#[derive(Parser)]
#[command(author, version, about, styles=style::get_styles())]
pub struct Cli {
	/// Print a single JSON document instead of prompts and progress.
	#[arg(long, global = true)]
	json: bool,
	#[command(subcommand)]
	command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
	let cli = Cli::parse();
	let json = cli.json;
	match run(cli).await {
		Ok(data) if json => {
			CliResponse::ok(data).print_json();
			Ok(())
		},
		Ok(_) => Ok(()),
		Err(error) if json => {
			CliResponse::err(CliError::from(&error)).print_json();
			std::process::exit(1);
		},
		Err(error) => Err(error),
	}
}

async fn run(args: Cli) -> Result<Value> {
	let root = settings::root()?;
	let settings = Settings::load(&root)?;
	let binary = settings.docker();
	match DockerStatus::detect(&binary)? {
		DockerStatus::Running => debug!("using {}", binary.display()),
		DockerStatus::Installed => {
			return Err(RuntimeUnavailableError(format!(
				"the daemon behind `{}` is not responding",
				binary.display()
			))
			.into());
		},
		DockerStatus::NotInstalled => {
			return Err(RuntimeUnavailableError(format!(
				"`{}` could not be found, install docker or set CHAINCTL_DOCKER",
				binary.display()
			))
			.into());
		},
	}

	// Interrupting the process terminates the runtime commands in flight.
	let token = CancellationToken::new();
	let cancel = token.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			cancel.cancel();
		}
	});

	let controller = ChainController::new(
		Docker::new(binary).with_cancellation(token),
		FileStore::new(&root),
		settings.defaults(),
	);
	let Cli { json, command } = args;
	tokio::task::spawn_blocking(move || {
		command.execute(&mut cli::Cli { json }, &controller, &mut std::io::stdout())
	})
	.await?
}

#[test]
fn verify_cli() {
	// https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_4/index.html
	use clap::CommandFactory;
	Cli::command().debug_assert()
}
