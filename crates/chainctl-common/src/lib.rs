// SPDX-License-Identifier: GPL-3.0

//! Shared plumbing for chainctl: the container runtime driver interface, the `docker` command
//! line driver and a handful of helpers used across the workspace.

#[cfg(any(test, feature = "test-utils"))]
pub mod command_mock;
pub mod docker;
pub mod errors;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod rollback;
pub mod runtime;
pub mod status;

pub use docker::{Docker, DockerStatus};
pub use errors::Error;
pub use rollback::Rollback;
pub use runtime::{
	ContainerInfo, ContainerRef, ContainerRuntime, ContainerSpec, ListFilter, LogOptions,
	PortMapping,
};
pub use status::Status;
/// Cancellation handle accepted by the runtime drivers.
pub use tokio_util::sync::CancellationToken;
