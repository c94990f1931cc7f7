// SPDX-License-Identifier: GPL-3.0

//! Building the genesis document and node configuration of a chain.

use crate::{Error, definition::ConfigSource};
use log::debug;
use std::path::Path;

pub mod config;
pub mod genesis;
pub mod validators;

pub use config::{ConfigKey, ConfigOption};
pub use validators::Validator;

/// The files making up a chain directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifacts {
	/// The genesis document.
	pub genesis: Vec<u8>,
	/// The node configuration.
	pub config: Vec<u8>,
}

/// Builds the artifacts of a chain.
///
/// The genesis document is read from `genesis`, or generated for a single validator, and its
/// chain identifier is set to `chain_id`. A validator CSV replaces the validator set, while the
/// configuration is taken from a file verbatim or rendered from the defaults.
///
/// # Arguments
/// * `chain_id` - The identifier of the chain.
/// * `genesis` - An optional genesis document.
/// * `source` - Where the node configuration comes from.
pub fn materialize(
	chain_id: &str,
	genesis: Option<&Path>,
	source: &ConfigSource,
) -> Result<Artifacts, Error> {
	let mut document = match genesis {
		Some(path) => {
			debug!("reading genesis from {}", path.display());
			genesis::read(path)?
		},
		None => genesis::default_genesis(chain_id),
	};
	genesis::set_chain_id(&mut document, chain_id);

	let config = match source {
		ConfigSource::Default => config::DEFAULT_CONFIG.as_bytes().to_vec(),
		ConfigSource::File(path) => config::read(path)?,
		ConfigSource::Options(options) => config::with_options(options)?.into_bytes(),
		ConfigSource::Csv(path) => {
			genesis::set_validators(&mut document, &validators::read(path)?);
			config::DEFAULT_CONFIG.as_bytes().to_vec()
		},
	};

	let mut genesis = serde_json::to_vec_pretty(&document)
		.map_err(|e| Error::Validation(format!("failed to encode the genesis document: {e}")))?;
	genesis.push(b'\n');
	Ok(Artifacts { genesis, config })
}
