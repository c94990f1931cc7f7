// SPDX-License-Identifier: GPL-3.0

use crate::{
	Error,
	runtime::{
		ContainerInfo, ContainerRef, ContainerRuntime, ContainerSpec, ListFilter, LogOptions,
		PortMapping,
	},
};
use duct::{Expression, Handle, cmd};
use log::debug;
use serde_json::Value;
use std::{
	ffi::OsStr,
	io::{ErrorKind, Write, copy},
	path::{Path, PathBuf},
	process::{Command, Output},
	sync::atomic::{AtomicBool, Ordering},
	thread::{scope, sleep},
	time::Duration,
};
use tokio_util::sync::CancellationToken;

/// The default binary used to talk to the container runtime.
pub const DEFAULT_BINARY: &str = "docker";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub enum DockerStatus {
	NotInstalled,
	Installed,
	Running,
}

impl DockerStatus {
	/// Detects whether the `binary` is installed and whether its daemon responds.
	pub fn detect(binary: impl AsRef<OsStr>) -> Result<Self, Error> {
		match Command::new(binary).arg("info").output() {
			Ok(output) if output.status.success() => Ok(DockerStatus::Running),
			Ok(_) => Ok(DockerStatus::Installed),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(DockerStatus::NotInstalled),
			Err(err) => Err(Error::Docker(err.to_string())),
		}
	}
}

/// A [`ContainerRuntime`] driving the `docker` command line client.
#[derive(Clone, Debug)]
pub struct Docker {
	binary: PathBuf,
	cancel: CancellationToken,
}

impl Default for Docker {
	fn default() -> Self {
		Self::new(DEFAULT_BINARY)
	}
}

impl Docker {
	/// A driver using the specified client binary.
	pub fn new(binary: impl Into<PathBuf>) -> Self {
		Self { binary: binary.into(), cancel: CancellationToken::new() }
	}

	/// Kills any in-flight client invocation once `token` is cancelled.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancel = token;
		self
	}

	/// The client binary.
	pub fn binary(&self) -> &Path {
		&self.binary
	}

	fn command(&self, args: &[String]) -> Expression {
		debug!("{} {}", self.binary.display(), args.join(" "));
		cmd(&self.binary, args).unchecked()
	}

	fn describe(&self, args: &[String]) -> String {
		format!("{} {}", self.binary.display(), args.join(" "))
	}

	/// Waits on a child, killing it when cancelled.
	fn wait(&self, handle: Handle) -> Result<Output, Error> {
		loop {
			if self.cancel.is_cancelled() {
				handle.kill()?;
				return Err(Error::Cancelled);
			}
			if let Some(output) = handle.try_wait()? {
				return Ok(output.clone());
			}
			sleep(POLL_INTERVAL);
		}
	}

	/// Runs the client, returning its stdout when it succeeds.
	fn stdout(&self, args: Vec<String>) -> Result<Vec<u8>, Error> {
		let handle = self.command(&args).stdout_capture().stderr_capture().start()?;
		let output = self.wait(handle)?;
		if !output.status.success() {
			return Err(Error::CommandFailed {
				command: self.describe(&args),
				output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}
		Ok(output.stdout)
	}

	/// Runs the client, returning stdout and stderr interleaved.
	fn combined(&self, args: Vec<String>) -> Result<Vec<u8>, Error> {
		let handle = self.command(&args).stderr_to_stdout().stdout_capture().start()?;
		let output = self.wait(handle)?;
		if !output.status.success() {
			return Err(Error::CommandFailed {
				command: self.describe(&args),
				output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
			});
		}
		Ok(output.stdout)
	}

	/// Runs the client attached to the current terminal.
	fn attached(&self, args: Vec<String>) -> Result<(), Error> {
		let handle = self.command(&args).start()?;
		let output = self.wait(handle)?;
		if !output.status.success() {
			return Err(Error::CommandFailed {
				command: self.describe(&args),
				output: format!("exited with {}", output.status),
			});
		}
		Ok(())
	}
}

fn container_args(spec: &ContainerSpec, args: &mut Vec<String>) {
	if !spec.name.is_empty() {
		args.extend(["--name".into(), spec.name.clone()]);
	}
	if let Some(volumes_from) = &spec.volumes_from {
		args.extend(["--volumes-from".into(), volumes_from.clone()]);
	}
	for volume in &spec.volumes {
		args.extend(["-v".into(), volume.clone()]);
	}
	for port in &spec.ports {
		args.extend(["-p".into(), port.clone()]);
	}
	if spec.publish_all_ports {
		args.push("-P".into());
	}
	for (key, value) in &spec.environment {
		args.extend(["-e".into(), format!("{key}={value}")]);
	}
	args.push(spec.image.clone());
	args.extend(spec.command.iter().cloned());
}

fn parse_inspect(value: Value) -> ContainerInfo {
	let text = |v: &Value| v.as_str().unwrap_or_default().to_string();
	let mut ports = Vec::new();
	if let Some(published) = value["NetworkSettings"]["Ports"].as_object() {
		for (container_port, bindings) in published {
			for binding in bindings.as_array().into_iter().flatten() {
				ports.push(PortMapping {
					container_port: container_port.clone(),
					host_ip: text(&binding["HostIp"]),
					host_port: text(&binding["HostPort"]),
				});
			}
		}
	}
	ContainerInfo {
		id: text(&value["Id"]),
		name: text(&value["Name"]).trim_start_matches('/').to_string(),
		image: text(&value["Config"]["Image"]),
		running: value["State"]["Running"].as_bool().unwrap_or_default(),
		ports,
		raw: value,
	}
}

fn parse_listed(value: Value) -> ContainerInfo {
	let text = |v: &Value| v.as_str().unwrap_or_default().to_string();
	let running = value["State"].as_str().map(|s| s == "running").unwrap_or_else(|| {
		value["Status"].as_str().map(|s| s.starts_with("Up")).unwrap_or_default()
	});
	ContainerInfo {
		id: text(&value["ID"]),
		name: text(&value["Names"]),
		image: text(&value["Image"]),
		running,
		ports: Vec::new(),
		raw: value,
	}
}

impl ContainerRuntime for Docker {
	fn create(&self, spec: &ContainerSpec) -> Result<ContainerRef, Error> {
		let mut args = vec!["create".to_string()];
		container_args(spec, &mut args);
		self.stdout(args)?;
		Ok(ContainerRef::new(&spec.name))
	}

	fn start(&self, container: &ContainerRef) -> Result<(), Error> {
		self.stdout(vec!["start".into(), container.name().into()]).map(|_| ())
	}

	fn stop(&self, container: &ContainerRef) -> Result<(), Error> {
		self.stdout(vec!["stop".into(), container.name().into()]).map(|_| ())
	}

	fn remove(&self, container: &ContainerRef, volumes: bool) -> Result<(), Error> {
		let mut args = vec!["rm".to_string()];
		if volumes {
			args.push("-v".into());
		}
		args.push(container.name().into());
		self.stdout(args).map(|_| ())
	}

	fn rename(&self, container: &ContainerRef, name: &str) -> Result<ContainerRef, Error> {
		self.stdout(vec!["rename".into(), container.name().into(), name.into()])?;
		Ok(ContainerRef::new(name))
	}

	fn exec(
		&self,
		container: &ContainerRef,
		command: &[String],
		interactive: bool,
	) -> Result<Vec<u8>, Error> {
		let mut args = vec!["exec".to_string()];
		if interactive {
			args.push("-it".into());
		}
		args.push(container.name().into());
		args.extend(command.iter().cloned());
		if interactive {
			self.attached(args)?;
			return Ok(Vec::new());
		}
		self.combined(args)
	}

	fn run(&self, spec: &ContainerSpec) -> Result<Vec<u8>, Error> {
		let mut args = vec!["run".to_string(), "--rm".to_string()];
		container_args(spec, &mut args);
		self.combined(args)
	}

	fn copy_into(
		&self,
		container: &ContainerRef,
		source: &Path,
		destination: &str,
	) -> Result<(), Error> {
		self.stdout(vec![
			"cp".into(),
			source.display().to_string(),
			format!("{}:{destination}", container.name()),
		])
		.map(|_| ())
	}

	fn inspect(&self, name: &str) -> Result<Option<ContainerInfo>, Error> {
		let args = vec!["inspect".into(), "--type".into(), "container".into(), name.into()];
		let handle = self.command(&args).stdout_capture().stderr_capture().start()?;
		let output = self.wait(handle)?;
		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			if stderr.contains("No such") {
				return Ok(None);
			}
			return Err(Error::CommandFailed {
				command: self.describe(&args),
				output: stderr.trim().to_string(),
			});
		}
		let documents: Vec<Value> = serde_json::from_slice(&output.stdout)?;
		Ok(documents.into_iter().next().map(parse_inspect))
	}

	fn list(&self, filter: &ListFilter) -> Result<Vec<ContainerInfo>, Error> {
		let mut args: Vec<String> =
			vec!["ps".into(), "--no-trunc".into(), "--format".into(), "{{json .}}".into()];
		if !filter.running {
			args.push("-a".into());
		}
		if let Some(prefix) = &filter.prefix {
			args.extend(["--filter".into(), format!("name={prefix}")]);
		}
		let stdout = self.stdout(args)?;
		let mut containers = Vec::new();
		for line in String::from_utf8_lossy(&stdout).lines().filter(|l| !l.trim().is_empty()) {
			let info = parse_listed(serde_json::from_str(line)?);
			// The runtime matches names by substring.
			if filter.prefix.as_ref().is_none_or(|p| info.name.starts_with(p.as_str())) {
				containers.push(info);
			}
		}
		Ok(containers)
	}

	fn logs(
		&self,
		container: &ContainerRef,
		options: &LogOptions,
		sink: &mut dyn Write,
	) -> Result<(), Error> {
		let mut args = vec!["logs".to_string()];
		if options.follow {
			args.push("--follow".into());
		}
		if let Some(tail) = &options.tail {
			args.extend(["--tail".into(), tail.clone()]);
		}
		args.push(container.name().into());
		debug!("{}", self.describe(&args));
		let reader = cmd(&self.binary, &args).stderr_to_stdout().reader()?;
		let done = AtomicBool::new(false);
		let result = scope(|s| {
			s.spawn(|| {
				while !done.load(Ordering::Relaxed) {
					if self.cancel.is_cancelled() {
						let _ = reader.kill();
						return;
					}
					sleep(POLL_INTERVAL);
				}
			});
			let result = copy(&mut &reader, sink);
			done.store(true, Ordering::Relaxed);
			result
		});
		if self.cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}
		result?;
		Ok(())
	}

	fn pull(&self, image: &str) -> Result<(), Error> {
		self.combined(vec!["pull".into(), image.into()]).map(|_| ())
	}
}
