// SPDX-License-Identifier: GPL-3.0

//! An in-memory [`ContainerRuntime`] for tests.

use crate::{
	Error,
	runtime::{
		ContainerInfo, ContainerRef, ContainerRuntime, ContainerSpec, ListFilter, LogOptions,
		PortMapping,
	},
};
use serde_json::json;
use std::{
	collections::BTreeMap,
	fs,
	io::Write,
	path::Path,
	sync::{Arc, Mutex, MutexGuard},
};

type Files = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

struct Container {
	id: usize,
	spec: ContainerSpec,
	running: bool,
	files: Files,
	logs: Vec<u8>,
}

#[derive(Default)]
struct State {
	containers: BTreeMap<String, Container>,
	next_id: usize,
	failures: Vec<(String, String)>,
	calls: Vec<String>,
	pulls: Vec<String>,
	interactive: Vec<Vec<String>>,
}

/// Containers and their volumes held in memory.
///
/// A container created with `volumes_from` shares the file system of the referenced container,
/// which keeps volume data alive across recreation of the dependent container. Commands executed
/// in containers understand `cat <file>`, `ls <dir>` and `echo <words>`.
#[derive(Default)]
pub struct MemoryRuntime {
	state: Mutex<State>,
}

fn failed(command: impl Into<String>, output: impl Into<String>) -> Error {
	Error::CommandFailed { command: command.into(), output: output.into() }
}

fn interpret(files: &Files, command: &[String]) -> Result<Vec<u8>, Error> {
	let files = files.lock().expect("volume lock poisoned");
	let line = command.join(" ");
	match command.split_first() {
		Some((program, args)) if program == "cat" => {
			let mut output = Vec::new();
			for path in args {
				match files.get(path.as_str()) {
					Some(content) => output.extend(content),
					None => {
						return Err(failed(line, format!("cat: {path}: No such file or directory")));
					},
				}
			}
			Ok(output)
		},
		Some((program, args)) if program == "ls" => {
			let directory = args.iter().find(|a| !a.starts_with('-'));
			let directory = directory.map(|d| d.trim_end_matches('/')).unwrap_or_default();
			let prefix = format!("{directory}/");
			let mut entries: Vec<&str> = files
				.keys()
				.filter_map(|path| path.strip_prefix(&prefix))
				.map(|rest| rest.split('/').next().unwrap_or(rest))
				.collect();
			entries.dedup();
			if entries.is_empty() {
				return Err(failed(line, format!("ls: {prefix}: No such file or directory")));
			}
			Ok(entries.iter().map(|e| format!("{e}\n")).collect::<String>().into_bytes())
		},
		Some((program, args)) if program == "echo" => {
			Ok(format!("{}\n", args.join(" ")).into_bytes())
		},
		_ => Err(failed(line, "executable file not found")),
	}
}

/// Copies a local file, or the contents of a local directory, to `destination`.
fn copy_local(
	files: &mut BTreeMap<String, Vec<u8>>,
	source: &Path,
	destination: &str,
) -> Result<(), Error> {
	if source.is_dir() {
		let destination = destination.trim_end_matches('/');
		for entry in fs::read_dir(source)? {
			let entry = entry?;
			let name = entry.file_name().to_string_lossy().to_string();
			copy_local(files, &entry.path(), &format!("{destination}/{name}"))?;
		}
		return Ok(());
	}
	files.insert(destination.to_string(), fs::read(source)?);
	Ok(())
}

impl MemoryRuntime {
	pub fn new() -> Self {
		Self::default()
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().expect("runtime lock poisoned")
	}

	/// Consumes a scheduled failure for `operation` on `target`, recording the call otherwise.
	fn call(&self, state: &mut State, operation: &str, target: &str) -> Result<(), Error> {
		if let Some(i) = state.failures.iter().position(|(o, t)| o == operation && t == target) {
			state.failures.remove(i);
			return Err(failed(format!("{operation} {target}"), "injected failure"));
		}
		state.calls.push(format!("{operation} {target}"));
		Ok(())
	}

	/// Makes the next `operation` (e.g. `create`) on `target` fail.
	pub fn fail_next(&self, operation: &str, target: &str) {
		self.state().failures.push((operation.to_string(), target.to_string()));
	}

	/// The operations performed so far, as `operation target`.
	pub fn calls(&self) -> Vec<String> {
		self.state().calls.clone()
	}

	/// The images pulled so far.
	pub fn pulls(&self) -> Vec<String> {
		self.state().pulls.clone()
	}

	/// The commands executed interactively so far.
	pub fn interactive_commands(&self) -> Vec<Vec<String>> {
		self.state().interactive.clone()
	}

	/// Whether the named container exists.
	pub fn exists(&self, name: &str) -> bool {
		self.state().containers.contains_key(name)
	}

	/// Whether the named container is running.
	pub fn is_running(&self, name: &str) -> bool {
		self.state().containers.get(name).is_some_and(|c| c.running)
	}

	/// The specification the named container was created with.
	pub fn spec(&self, name: &str) -> Option<ContainerSpec> {
		self.state().containers.get(name).map(|c| c.spec.clone())
	}

	/// Reads a file from the file system visible to the named container.
	pub fn read_file(&self, name: &str, path: &str) -> Option<Vec<u8>> {
		let state = self.state();
		let files = state.containers.get(name)?.files.clone();
		drop(state);
		files.lock().expect("volume lock poisoned").get(path).cloned()
	}

	/// Writes a file into the file system visible to the named container.
	pub fn write_file(
		&self,
		name: &str,
		path: &str,
		content: impl Into<Vec<u8>>,
	) -> Result<(), Error> {
		let state = self.state();
		let container =
			state.containers.get(name).ok_or_else(|| Error::NoSuchContainer(name.to_string()))?;
		let mut files = container.files.lock().expect("volume lock poisoned");
		files.insert(path.to_string(), content.into());
		Ok(())
	}

	/// Appends output to the logs of the named container.
	pub fn push_logs(&self, name: &str, output: &[u8]) -> Result<(), Error> {
		let mut state = self.state();
		let container =
			state.containers.get_mut(name).ok_or_else(|| Error::NoSuchContainer(name.to_string()))?;
		container.logs.extend_from_slice(output);
		Ok(())
	}

	fn info(container: &Container) -> ContainerInfo {
		let ports: Vec<PortMapping> = container
			.spec
			.ports
			.iter()
			.filter_map(|p| p.split_once(':'))
			.map(|(host, port)| PortMapping {
				container_port: format!("{port}/tcp"),
				host_ip: "0.0.0.0".into(),
				host_port: host.into(),
			})
			.collect();
		let published: serde_json::Map<_, _> = ports
			.iter()
			.map(|p| {
				(p.container_port.clone(), json!([{"HostIp": p.host_ip, "HostPort": p.host_port}]))
			})
			.collect();
		ContainerInfo {
			id: format!("{:064x}", container.id),
			name: container.spec.name.clone(),
			image: container.spec.image.clone(),
			running: container.running,
			ports,
			raw: json!({
				"Id": format!("{:064x}", container.id),
				"Name": format!("/{}", container.spec.name),
				"Config": {
					"Image": container.spec.image,
					"Cmd": container.spec.command,
					"Env": container
						.spec
						.environment
						.iter()
						.map(|(k, v)| format!("{k}={v}"))
						.collect::<Vec<_>>(),
				},
				"State": { "Running": container.running },
				"HostConfig": {
					"PublishAllPorts": container.spec.publish_all_ports,
					"VolumesFrom": container.spec.volumes_from.iter().collect::<Vec<_>>(),
				},
				"NetworkSettings": { "Ports": published },
			}),
		}
	}

	fn files_for(state: &State, spec: &ContainerSpec) -> Result<Files, Error> {
		match &spec.volumes_from {
			Some(source) => state
				.containers
				.get(source)
				.map(|c| c.files.clone())
				.ok_or_else(|| Error::NoSuchContainer(source.clone())),
			None => Ok(Files::default()),
		}
	}
}

impl ContainerRuntime for MemoryRuntime {
	fn create(&self, spec: &ContainerSpec) -> Result<ContainerRef, Error> {
		let mut state = self.state();
		self.call(&mut state, "create", &spec.name)?;
		if state.containers.contains_key(&spec.name) {
			return Err(failed(
				format!("create {}", spec.name),
				format!("Conflict. The container name \"/{}\" is already in use", spec.name),
			));
		}
		let files = Self::files_for(&state, spec)?;
		state.next_id += 1;
		let id = state.next_id;
		state.containers.insert(
			spec.name.clone(),
			Container { id, spec: spec.clone(), running: false, files, logs: Vec::new() },
		);
		Ok(ContainerRef::new(&spec.name))
	}

	fn start(&self, container: &ContainerRef) -> Result<(), Error> {
		let mut state = self.state();
		self.call(&mut state, "start", container.name())?;
		let entry = state
			.containers
			.get_mut(container.name())
			.ok_or_else(|| Error::NoSuchContainer(container.name().to_string()))?;
		entry.running = true;
		Ok(())
	}

	fn stop(&self, container: &ContainerRef) -> Result<(), Error> {
		let mut state = self.state();
		self.call(&mut state, "stop", container.name())?;
		let entry = state
			.containers
			.get_mut(container.name())
			.ok_or_else(|| Error::NoSuchContainer(container.name().to_string()))?;
		entry.running = false;
		Ok(())
	}

	fn remove(&self, container: &ContainerRef, _volumes: bool) -> Result<(), Error> {
		let mut state = self.state();
		self.call(&mut state, "remove", container.name())?;
		let running = state
			.containers
			.get(container.name())
			.map(|c| c.running)
			.ok_or_else(|| Error::NoSuchContainer(container.name().to_string()))?;
		if running {
			return Err(failed(
				format!("rm {container}"),
				"You cannot remove a running container. Stop the container before attempting removal",
			));
		}
		state.containers.remove(container.name());
		Ok(())
	}

	fn rename(&self, container: &ContainerRef, name: &str) -> Result<ContainerRef, Error> {
		let mut state = self.state();
		self.call(&mut state, "rename", container.name())?;
		if state.containers.contains_key(name) {
			return Err(failed(
				format!("rename {container} {name}"),
				format!("Conflict. The container name \"/{name}\" is already in use"),
			));
		}
		let mut entry = state
			.containers
			.remove(container.name())
			.ok_or_else(|| Error::NoSuchContainer(container.name().to_string()))?;
		entry.spec.name = name.to_string();
		// Dependents keep addressing the volumes they were created with.
		for other in state.containers.values_mut() {
			if other.spec.volumes_from.as_deref() == Some(container.name()) {
				other.spec.volumes_from = Some(name.to_string());
			}
		}
		state.containers.insert(name.to_string(), entry);
		Ok(ContainerRef::new(name))
	}

	fn exec(
		&self,
		container: &ContainerRef,
		command: &[String],
		interactive: bool,
	) -> Result<Vec<u8>, Error> {
		let mut state = self.state();
		self.call(&mut state, "exec", container.name())?;
		let entry = state
			.containers
			.get(container.name())
			.ok_or_else(|| Error::NoSuchContainer(container.name().to_string()))?;
		if !entry.running {
			return Err(failed(
				format!("exec {container}"),
				format!("Container {container} is not running"),
			));
		}
		let files = entry.files.clone();
		if interactive {
			state.interactive.push(command.to_vec());
			return Ok(Vec::new());
		}
		drop(state);
		interpret(&files, command)
	}

	fn run(&self, spec: &ContainerSpec) -> Result<Vec<u8>, Error> {
		let mut state = self.state();
		self.call(&mut state, "run", spec.volumes_from.as_deref().unwrap_or(&spec.image))?;
		let files = Self::files_for(&state, spec)?;
		drop(state);
		interpret(&files, &spec.command)
	}

	fn copy_into(
		&self,
		container: &ContainerRef,
		source: &Path,
		destination: &str,
	) -> Result<(), Error> {
		let mut state = self.state();
		self.call(&mut state, "copy", container.name())?;
		let files = state
			.containers
			.get(container.name())
			.map(|c| c.files.clone())
			.ok_or_else(|| Error::NoSuchContainer(container.name().to_string()))?;
		drop(state);
		let mut files = files.lock().expect("volume lock poisoned");
		copy_local(&mut files, source, destination)
	}

	fn inspect(&self, name: &str) -> Result<Option<ContainerInfo>, Error> {
		let state = self.state();
		Ok(state.containers.get(name).map(Self::info))
	}

	fn list(&self, filter: &ListFilter) -> Result<Vec<ContainerInfo>, Error> {
		let state = self.state();
		Ok(state
			.containers
			.values()
			.filter(|c| filter.prefix.as_ref().is_none_or(|p| c.spec.name.starts_with(p.as_str())))
			.filter(|c| !filter.running || c.running)
			.map(Self::info)
			.collect())
	}

	fn logs(
		&self,
		container: &ContainerRef,
		options: &LogOptions,
		sink: &mut dyn Write,
	) -> Result<(), Error> {
		let mut state = self.state();
		self.call(&mut state, "logs", container.name())?;
		let entry = state
			.containers
			.get(container.name())
			.ok_or_else(|| Error::NoSuchContainer(container.name().to_string()))?;
		let logs = String::from_utf8_lossy(&entry.logs).to_string();
		drop(state);
		let lines: Vec<&str> = logs.lines().collect();
		let skip = match options.tail.as_deref().map(str::parse::<usize>) {
			Some(Ok(tail)) => lines.len().saturating_sub(tail),
			_ => 0,
		};
		for line in &lines[skip..] {
			writeln!(sink, "{line}")?;
		}
		Ok(())
	}

	fn pull(&self, image: &str) -> Result<(), Error> {
		let mut state = self.state();
		self.call(&mut state, "pull", image)?;
		state.pulls.push(image.to_string());
		Ok(())
	}
}
