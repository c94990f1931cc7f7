// SPDX-License-Identifier: GPL-3.0

use crate::naming::ChainKey;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
	#[error("Chain `{0}` already exists")]
	AlreadyExists(ChainKey),

	#[error("Chain `{0}` is already running")]
	AlreadyRunning(ChainKey),

	#[error("Failed to read {path}: {reason}")]
	Artifact { path: PathBuf, reason: String },

	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),

	#[error("A chain named `{0}` already exists")]
	NameConflict(ChainKey),

	#[error("Chain `{0}` not found")]
	NotFound(ChainKey),

	#[error("Chain `{0}` is not running")]
	NotRunning(ChainKey),

	#[error("Failed to {operation} `{target}`: {source}")]
	Runtime {
		operation: &'static str,
		target: String,
		#[source]
		source: chainctl_common::Error,
	},

	#[error("Service `{0}` not found")]
	ServiceNotFound(String),

	#[error("Chain `{0}` is still running, stop it first or force the removal")]
	StillRunning(ChainKey),

	#[error("Definition store error: {0}")]
	Store(String),

	#[error("Unknown config option `{0}`")]
	UnknownConfigKey(String),

	#[error("Validation error: {0}")]
	Validation(String),
}

impl Error {
	/// Whether the error was caused by invalid user input.
	pub fn is_validation(&self) -> bool {
		matches!(self, Error::Validation(_) | Error::UnknownConfigKey(_))
	}
}

/// Wraps a driver failure with the attempted operation and its target.
pub(crate) fn runtime(
	operation: &'static str,
	target: impl Into<String>,
) -> impl FnOnce(chainctl_common::Error) -> Error {
	let target = target.into();
	move |source| Error::Runtime { operation, target, source }
}
