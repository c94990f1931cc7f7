// SPDX-License-Identifier: GPL-3.0

use crate::Error;
use std::{fs, path::Path};

/// A genesis validator read from a CSV file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validator {
	/// The hex encoded public key.
	pub pub_key: String,
	/// The voting power (bonded amount).
	pub power: u64,
	pub name: String,
}

/// Parses validators from `pub_key,power[,name]` rows. Blank lines and lines starting with `#`
/// are ignored.
pub fn parse(content: &str) -> Result<Vec<Validator>, String> {
	let mut validators = Vec::new();
	for (index, line) in content.lines().enumerate() {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		let row = index + 1;
		let fields: Vec<&str> = line.split(',').map(str::trim).collect();
		let (pub_key, power, name) = match fields.as_slice() {
			[pub_key, power] => (*pub_key, *power, None),
			[pub_key, power, name] => (*pub_key, *power, Some(*name)),
			_ => return Err(format!("row {row}: expected `pub_key,power[,name]`")),
		};
		if pub_key.is_empty() ||
			pub_key.len() % 2 != 0 ||
			!pub_key.chars().all(|c| c.is_ascii_hexdigit())
		{
			return Err(format!("row {row}: `{pub_key}` is not a hex encoded public key"));
		}
		let power =
			power.parse().map_err(|_| format!("row {row}: `{power}` is not a valid power"))?;
		let name = match name {
			Some(name) if !name.is_empty() => name.to_string(),
			_ => format!("validator_{}", validators.len()),
		};
		validators.push(Validator { pub_key: pub_key.to_string(), power, name });
	}
	if validators.is_empty() {
		return Err("no validators found".into());
	}
	Ok(validators)
}

/// Reads validators from a CSV file.
pub fn read(path: &Path) -> Result<Vec<Validator>, Error> {
	let artifact = |reason: String| Error::Artifact { path: path.to_path_buf(), reason };
	let content = fs::read_to_string(path).map_err(|e| artifact(e.to_string()))?;
	parse(&content).map_err(artifact)
}
