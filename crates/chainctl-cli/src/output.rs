// SPDX-License-Identifier: GPL-3.0

use chainctl_chains::Error as ChainError;
use serde::Serialize;

/// Top-level JSON envelope returned by every command when `--json` is active.
#[derive(Debug, Serialize)]
pub(crate) struct CliResponse<T: Serialize> {
	schema_version: u32,
	success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<CliError>,
}

impl<T: Serialize> CliResponse<T> {
	/// Build a successful response.
	pub(crate) fn ok(data: T) -> Self {
		Self { schema_version: 1, success: true, data: Some(data), error: None }
	}

	/// Print this response as a single JSON line to stdout.
	pub(crate) fn print_json(&self) {
		match serde_json::to_string(self) {
			Ok(json) => println!("{json}"),
			Err(e) => eprintln!("fatal: failed to serialize JSON response: {e}"),
		}
	}
}

impl CliResponse<()> {
	/// Build an error response.
	pub(crate) fn err(error: CliError) -> Self {
		Self { schema_version: 1, success: false, data: None, error: Some(error) }
	}
}

/// Structured error included in the JSON envelope.
#[derive(Debug, Serialize)]
pub(crate) struct CliError {
	code: ErrorCode,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	details: Option<String>,
}

impl CliError {
	pub(crate) fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self { code, message: message.into(), details: None }
	}

	pub(crate) fn with_details(mut self, details: impl Into<String>) -> Self {
		self.details = Some(details.into());
		self
	}
}

impl From<&anyhow::Error> for CliError {
	fn from(error: &anyhow::Error) -> Self {
		let cli_error = CliError::new(ErrorCode::of(error), error.to_string());
		let causes: Vec<String> = error.chain().skip(1).map(|e| e.to_string()).collect();
		if causes.is_empty() { cli_error } else { cli_error.with_details(causes.join(": ")) }
	}
}

/// Machine-readable error codes.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum ErrorCode {
	Internal,
	InvalidInput,
	PromptRequired,
	UnsupportedJson,
	NotFound,
	Conflict,
	RuntimeError,
	RuntimeUnavailable,
}

impl ErrorCode {
	/// Classifies an error returned by a command.
	pub(crate) fn of(error: &anyhow::Error) -> Self {
		if error.downcast_ref::<UnsupportedJsonError>().is_some() {
			return ErrorCode::UnsupportedJson;
		}
		if error.downcast_ref::<PromptRequiredError>().is_some() {
			return ErrorCode::PromptRequired;
		}
		if error.downcast_ref::<RuntimeUnavailableError>().is_some() {
			return ErrorCode::RuntimeUnavailable;
		}
		match error.downcast_ref::<ChainError>() {
			Some(ChainError::NotFound(_) | ChainError::ServiceNotFound(_)) => ErrorCode::NotFound,
			Some(
				ChainError::AlreadyExists(_) |
				ChainError::AlreadyRunning(_) |
				ChainError::NameConflict(_) |
				ChainError::NotRunning(_) |
				ChainError::StillRunning(_),
			) => ErrorCode::Conflict,
			Some(ChainError::Artifact { .. }) => ErrorCode::InvalidInput,
			Some(e) if e.is_validation() => ErrorCode::InvalidInput,
			Some(ChainError::Runtime { .. }) => ErrorCode::RuntimeError,
			_ => ErrorCode::Internal,
		}
	}
}

/// Error returned when `--json` mode requires a flag that was not provided.
#[derive(Debug)]
pub(crate) struct PromptRequiredError(pub String);

impl std::fmt::Display for PromptRequiredError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::error::Error for PromptRequiredError {}

/// Error returned when `--json` is requested for a command that doesn't support it.
#[derive(Debug)]
pub(crate) struct UnsupportedJsonError(pub String);

impl std::fmt::Display for UnsupportedJsonError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "--json is not supported for `{}`", self.0)
	}
}

impl std::error::Error for UnsupportedJsonError {}

/// Returns an error indicating that `--json` is not supported for the given usage.
pub(crate) fn reject_unsupported_json(usage: &str) -> anyhow::Result<()> {
	Err(UnsupportedJsonError(usage.to_string()).into())
}

/// Error returned when the container runtime cannot be used.
#[derive(Debug)]
pub(crate) struct RuntimeUnavailableError(pub String);

impl std::fmt::Display for RuntimeUnavailableError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::error::Error for RuntimeUnavailableError {}
