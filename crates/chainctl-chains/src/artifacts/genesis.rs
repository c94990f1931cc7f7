// SPDX-License-Identifier: GPL-3.0

use super::validators::Validator;
use crate::Error;
use serde_json::{Value, json};
use std::{fs, path::Path};

/// The public key of the validator of single-node chains.
pub const DEFAULT_PUB_KEY: &str =
	"F6C79CF0CB9D66B677988BCB9B8EADD9A091CD465A60542A8AB85476256DBA92";
/// The address of the account of single-node chains.
pub const DEFAULT_ADDRESS: &str = "37236DF251AB70022B1DA351F08A20FB52443E37";
const DEFAULT_AMOUNT: u64 = 9_999_999_999;
const DEFAULT_POWER: u64 = 9_999_999_998;
// The key type tag of ed25519 keys.
const ED25519: u64 = 1;

/// The genesis document of a single-validator chain.
pub fn default_genesis(chain_id: &str) -> Value {
	json!({
		"chain_id": chain_id,
		"accounts": [
			{ "address": DEFAULT_ADDRESS, "amount": DEFAULT_AMOUNT, "name": "default" }
		],
		"validators": [validator(DEFAULT_PUB_KEY, DEFAULT_POWER, "default")],
	})
}

fn validator(pub_key: &str, power: u64, name: &str) -> Value {
	json!({ "pub_key": [ED25519, pub_key], "amount": power, "name": name })
}

/// Reads a genesis document, which must be a JSON object.
pub fn read(path: &Path) -> Result<Value, Error> {
	let artifact = |reason: String| Error::Artifact { path: path.to_path_buf(), reason };
	let content = fs::read(path).map_err(|e| artifact(e.to_string()))?;
	let genesis: Value = serde_json::from_slice(&content).map_err(|e| artifact(e.to_string()))?;
	if !genesis.is_object() {
		return Err(artifact("the genesis document must be a JSON object".into()));
	}
	Ok(genesis)
}

/// Sets the chain identifier. Every other field is left as it is.
pub fn set_chain_id(genesis: &mut Value, chain_id: &str) {
	if let Some(genesis) = genesis.as_object_mut() {
		genesis.insert("chain_id".into(), Value::String(chain_id.to_string()));
	}
}

/// Replaces the validator set.
pub fn set_validators(genesis: &mut Value, validators: &[Validator]) {
	if let Some(genesis) = genesis.as_object_mut() {
		let validators =
			validators.iter().map(|v| validator(&v.pub_key, v.power, &v.name)).collect();
		genesis.insert("validators".into(), Value::Array(validators));
	}
}

/// The chain identifier of a genesis document.
pub fn chain_id(genesis: &[u8]) -> Option<String> {
	let genesis: Value = serde_json::from_slice(genesis).ok()?;
	genesis.get("chain_id")?.as_str().map(str::to_string)
}
