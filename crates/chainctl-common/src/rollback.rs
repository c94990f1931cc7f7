// SPDX-License-Identifier: GPL-3.0

use log::warn;
use std::fmt::Display;

type Undo<'a, E> = Box<dyn FnOnce() -> Result<(), E> + 'a>;

/// A journal of completed steps which can be undone, in reverse order, when a later step of the
/// same transition fails.
pub struct Rollback<'a, E> {
	// Descriptions are kept for logging failed undo steps.
	noted: Vec<(String, Undo<'a, E>)>,
}

impl<E> Default for Rollback<'_, E> {
	fn default() -> Self {
		Self { noted: Vec::new() }
	}
}

impl<'a, E: Display> Rollback<'a, E> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records how to undo a step which has just completed.
	pub fn note(
		&mut self,
		description: impl Into<String>,
		undo: impl FnOnce() -> Result<(), E> + 'a,
	) {
		self.noted.push((description.into(), Box::new(undo)));
	}

	/// The descriptions of the noted steps, oldest first.
	pub fn noted(&self) -> Vec<&str> {
		self.noted.iter().map(|(description, _)| description.as_str()).collect()
	}

	/// Keeps every completed step.
	pub fn commit(self) {}

	/// Undoes every noted step, newest first. Undo failures are logged and do not stop the
	/// remaining steps; the descriptions of the steps which could not be undone are returned.
	pub fn rollback(self) -> Vec<String> {
		let mut failed = Vec::new();
		for (description, undo) in self.noted.into_iter().rev() {
			if let Err(e) = undo() {
				warn!("failed to undo `{description}`: {e}");
				failed.push(description);
			}
		}
		failed
	}

	/// Passes a successful result through, or rolls back and returns the error.
	pub fn ok_or_rollback<S>(self, result: Result<S, E>) -> Result<(Self, S), E> {
		match result {
			Ok(result) => Ok((self, result)),
			Err(err) => {
				self.rollback();
				Err(err)
			},
		}
	}
}
