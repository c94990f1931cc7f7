// SPDX-License-Identifier: GPL-3.0

#![doc = include_str!("../README.md")]

/// Building genesis documents and node configurations.
pub mod artifacts;
/// Data containers owning the persistent volumes of chains.
pub mod data;
/// Chain and service definitions.
pub mod definition;
mod errors;
/// The chain lifecycle.
pub mod lifecycle;
mod locks;
/// Naming of containers and files.
pub mod naming;
/// Persistence of definitions.
pub mod store;

pub use artifacts::{ConfigKey, ConfigOption};
pub use definition::{
	ChainDefaults, ChainDefinition, ConfigSource, Operations, OperationsOverrides,
	ServiceDefinition, ServiceSpec,
};
pub use errors::Error;
pub use lifecycle::{
	ChainController, ChainFile, ChainState, ChainSummary, GRADUATE_COMMAND, GRADUATE_IMAGE,
	KEYS_SERVICE, KillOptions, NewChain, RemoveOptions, StartOptions, UpdateOptions,
};
pub use naming::ChainKey;
pub use store::{DefinitionStore, FileStore};
