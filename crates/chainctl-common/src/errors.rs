// SPDX-License-Identifier: GPL-3.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
	#[error("Operation cancelled")]
	Cancelled,
	#[error("`{command}` failed: {output}")]
	CommandFailed { command: String, output: String },
	#[error("Docker error: {0}")]
	Docker(String),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("No such container: {0}")]
	NoSuchContainer(String),
}
