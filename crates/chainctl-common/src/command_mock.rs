// SPDX-License-Identifier: GPL-3.0

use std::{
	fs::{Permissions, set_permissions, write},
	io,
	os::unix::fs::PermissionsExt,
	path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Helper to create a script that exits with a given code
fn exit_script(exit_code: i32) -> String {
	format!("#!/bin/sh\nexit {}", exit_code)
}

/// Fake executables living in a temporary directory, addressed by absolute path so tests do not
/// depend on `PATH`.
pub struct CommandMock {
	temp_dir: TempDir,
}

impl Default for CommandMock {
	fn default() -> Self {
		Self { temp_dir: tempfile::tempdir().expect("a temporary directory can be created") }
	}
}

impl CommandMock {
	/// The directory holding the fake commands.
	pub fn fake_path(&self) -> &Path {
		self.temp_dir.path()
	}

	/// The absolute path of a (possibly not yet created) fake command.
	pub fn path(&self, command_name: &str) -> PathBuf {
		self.temp_dir.path().join(command_name)
	}

	/// Create a fake command that exits with the given code
	pub fn with_command(self, command_name: &str, exit_code: i32) -> Self {
		self.with_command_script(command_name, &exit_script(exit_code))
	}

	/// Create a fake command with custom script content
	pub fn with_command_script(self, command_name: &str, script: &str) -> Self {
		let fake_command_path = self.path(command_name);
		write(&fake_command_path, script).expect("the fake command can be written");
		Self::set_executable(&fake_command_path).expect("the fake command can be made executable");
		self
	}

	/// Create a fake command without execute permissions
	pub fn with_non_permissioned_command(self, command_name: &str) -> Self {
		write(self.path(command_name), exit_script(0)).expect("the fake command can be written");
		self
	}

	fn set_executable(path: &Path) -> io::Result<()> {
		set_permissions(path, Permissions::from_mode(0o755))
	}
}
