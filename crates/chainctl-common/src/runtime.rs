// SPDX-License-Identifier: GPL-3.0

use crate::Error;
use serde_json::Value;
use std::{collections::BTreeMap, fmt, io::Write, path::Path};

/// A reference to a container known to the runtime, addressed by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContainerRef {
	name: String,
}

impl ContainerRef {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}

	/// The name of the container.
	pub fn name(&self) -> &str {
		&self.name
	}
}

impl fmt::Display for ContainerRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}

/// Everything required to create (or run) a container.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainerSpec {
	/// The container name.
	pub name: String,
	/// The image reference.
	pub image: String,
	/// The command, overriding the image default when not empty.
	pub command: Vec<String>,
	/// Mount all volumes of the named container.
	pub volumes_from: Option<String>,
	/// Volume declarations, either anonymous (`/path`) or bind mounts (`host:container`).
	pub volumes: Vec<String>,
	/// Published ports (`host:container`).
	pub ports: Vec<String>,
	/// Publish every exposed port to a random host port.
	pub publish_all_ports: bool,
	/// Environment variables.
	pub environment: BTreeMap<String, String>,
}

impl ContainerSpec {
	pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
		Self { name: name.into(), image: image.into(), ..Default::default() }
	}
}

/// A published port as reported by the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortMapping {
	/// The container side, e.g. `46656/tcp`.
	pub container_port: String,
	pub host_ip: String,
	pub host_port: String,
}

impl fmt::Display for PortMapping {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} -> {}:{}", self.container_port, self.host_ip, self.host_port)
	}
}

/// Metadata describing a container.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerInfo {
	pub id: String,
	pub name: String,
	pub image: String,
	pub running: bool,
	pub ports: Vec<PortMapping>,
	/// The document reported by the runtime, for arbitrary field queries.
	pub raw: Value,
}

/// Selects containers when listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListFilter {
	/// Only containers whose name starts with this prefix.
	pub prefix: Option<String>,
	/// Only running containers.
	pub running: bool,
}

/// Options for reading container logs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogOptions {
	/// Keep streaming new output.
	pub follow: bool,
	/// Number of lines from the end of the logs (`None` or `all` for everything).
	pub tail: Option<String>,
}

/// The container runtime driver.
///
/// Every call blocks until the runtime has completed the operation. Implementations perform no
/// retries.
pub trait ContainerRuntime: Send + Sync {
	/// Creates a container without starting it.
	fn create(&self, spec: &ContainerSpec) -> Result<ContainerRef, Error>;
	/// Starts a created or stopped container.
	fn start(&self, container: &ContainerRef) -> Result<(), Error>;
	/// Stops a running container.
	fn stop(&self, container: &ContainerRef) -> Result<(), Error>;
	/// Removes a container, along with its anonymous volumes when `volumes` is set.
	fn remove(&self, container: &ContainerRef, volumes: bool) -> Result<(), Error>;
	/// Renames a container.
	fn rename(&self, container: &ContainerRef, name: &str) -> Result<ContainerRef, Error>;
	/// Executes a command inside a running container.
	///
	/// Interactive executions are attached to the terminal and return no output.
	fn exec(
		&self,
		container: &ContainerRef,
		command: &[String],
		interactive: bool,
	) -> Result<Vec<u8>, Error>;
	/// Runs a throwaway container to completion, returning its combined output.
	fn run(&self, spec: &ContainerSpec) -> Result<Vec<u8>, Error>;
	/// Copies a local file or directory into a container.
	///
	/// A `source` ending with `/.` copies the contents of the directory into `destination`.
	fn copy_into(
		&self,
		container: &ContainerRef,
		source: &Path,
		destination: &str,
	) -> Result<(), Error>;
	/// Inspects a container, returning `None` when it does not exist.
	fn inspect(&self, name: &str) -> Result<Option<ContainerInfo>, Error>;
	/// Lists containers matching the filter.
	fn list(&self, filter: &ListFilter) -> Result<Vec<ContainerInfo>, Error>;
	/// Writes the logs of a container into `sink`.
	fn logs(
		&self,
		container: &ContainerRef,
		options: &LogOptions,
		sink: &mut dyn Write,
	) -> Result<(), Error>;
	/// Pulls an image.
	fn pull(&self, image: &str) -> Result<(), Error>;
}

/// Looks up a dotted path (e.g. `Config.Image`) within an inspected document.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
	path.split('.').filter(|s| !s.is_empty()).try_fold(value, |value, segment| match value {
		Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
		_ => value.get(segment),
	})
}
