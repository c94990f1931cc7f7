// SPDX-License-Identifier: GPL-3.0

/// Trait for observing the progress of long running chain transitions.
pub trait Status {
	/// Update the observer with the provided `status`.
	fn update(&self, status: &str);
}

impl Status for () {
	// no-op: status updates are ignored
	fn update(&self, _: &str) {}
}

/// Forwards status updates to the `log` facade, for callers without an interactive terminal.
pub struct LogStatus;

impl Status for LogStatus {
	fn update(&self, status: &str) {
		log::info!("{status}");
	}
}
