// SPDX-License-Identifier: GPL-3.0

use super::ChainController;
use crate::{
	Error,
	definition::{DEFAULT_CHAIN_COMMAND, DEFAULT_CHAIN_IMAGE, ServiceDefinition, ServiceSpec},
	naming::ChainKey,
	store::DefinitionStore,
};
use chainctl_common::ContainerRuntime;
use log::info;
use std::collections::BTreeSet;

/// The image graduated chains run, regardless of the image the chain ran before.
pub const GRADUATE_IMAGE: &str = DEFAULT_CHAIN_IMAGE;
/// The command graduated chains are started with.
pub const GRADUATE_COMMAND: &[&str] = DEFAULT_CHAIN_COMMAND;
/// The key management service graduated chains depend on.
pub const KEYS_SERVICE: &str = "keys";

impl<R: ContainerRuntime, S: DefinitionStore> ChainController<R, S> {
	/// Promotes a chain to a service definition named after it. The containers of the chain are
	/// not touched.
	pub fn graduate(&self, key: &ChainKey) -> Result<ServiceDefinition, Error> {
		self.locks.with(key, || {
			let definition = self.store.load(key)?;
			let service = ServiceDefinition {
				name: definition.name.clone(),
				chain: Some(definition.chain_id.clone()),
				service: ServiceSpec {
					image: GRADUATE_IMAGE.to_string(),
					command: GRADUATE_COMMAND.iter().map(|s| s.to_string()).collect(),
					auto_data: true,
					dependencies: BTreeSet::from([KEYS_SERVICE.to_string()]),
				},
				operations: definition.operations,
			};
			self.store.save_service(&service)?;
			info!("graduated chain {key} to service {}", service.name);
			Ok(service)
		})
	}
}
