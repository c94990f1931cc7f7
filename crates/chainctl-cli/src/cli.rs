// SPDX-License-Identifier: GPL-3.0

use std::{
	fmt::Display,
	io::Result,
	sync::{Arc, Mutex},
};
#[cfg(test)]
pub(crate) use tests::MockCli;

pub(crate) mod traits {
	use std::{fmt::Display, io::Result};

	/// A command line interface.
	pub trait Cli {
		/// Returns whether the output should be in JSON format.
		fn is_json(&self) -> bool;
		/// Constructs a new [`Confirm`] prompt.
		fn confirm(&mut self, prompt: impl Display) -> impl Confirm;
		/// Prints an info message.
		fn info(&mut self, text: impl Display) -> Result<()>;
		/// Constructs a new [`Input`] prompt.
		fn input(&mut self, prompt: impl Display) -> impl Input;
		/// Prints a header of the prompt sequence.
		fn intro(&mut self, title: impl Display) -> Result<()>;
		/// Prints a footer of the prompt sequence.
		fn outro(&mut self, message: impl Display) -> Result<()>;
		/// Prints a footer of the prompt sequence with a failure style.
		fn outro_cancel(&mut self, message: impl Display) -> Result<()>;
		/// Prints a success message.
		fn success(&mut self, message: impl Display) -> Result<()>;
		/// Prints a warning message.
		fn warning(&mut self, message: impl Display) -> Result<()>;
		/// Prints a plain message.
		fn plain(&mut self, message: impl Display) -> Result<()>;
		/// Constructs a new [`Spinner`].
		fn spinner(&mut self) -> Box<dyn Spinner + Send>;
	}

	/// A spinner.
	pub trait Spinner: Send {
		/// Starts the spinner.
		fn start(&self, message: &str);
		/// Sets the message of the spinner.
		fn set_message(&self, message: &str);
		/// Stops the spinner with an error message.
		fn error(&self, message: &str);
		/// Clears the spinner.
		fn clear(&self);
	}

	/// A confirmation prompt.
	pub trait Confirm {
		/// Sets the initially selected value.
		fn initial_value(self, initial_value: bool) -> Self;
		/// Starts the prompt interaction.
		fn interact(&mut self) -> Result<bool>;
	}

	/// A text input prompt.
	pub trait Input {
		/// Starts the prompt interaction.
		fn interact(&mut self) -> Result<String>;
		/// Sets the placeholder (hint) text for the input.
		fn placeholder(self, value: &str) -> Self;
		/// Sets a validation callback for the input that is called when the user submits.
		fn validate(
			self,
			validator: impl Fn(&String) -> std::result::Result<(), &'static str> + 'static,
		) -> Self;
	}
}

/// A command line interface using cliclack.
pub(crate) struct Cli {
	pub(crate) json: bool,
}

impl traits::Cli for Cli {
	fn is_json(&self) -> bool {
		self.json
	}

	/// Constructs a new [`Confirm`] prompt.
	fn confirm(&mut self, prompt: impl Display) -> impl traits::Confirm {
		Confirm { inner: cliclack::confirm(prompt), json: self.json }
	}

	/// Prints an info message.
	fn info(&mut self, text: impl Display) -> Result<()> {
		if self.json {
			eprintln!("{}", text);
			Ok(())
		} else {
			cliclack::log::info(text)
		}
	}

	/// Constructs a new [`Input`] prompt.
	fn input(&mut self, prompt: impl Display) -> impl traits::Input {
		Input { inner: cliclack::input(prompt), json: self.json }
	}

	/// Prints a header of the prompt sequence.
	fn intro(&mut self, title: impl Display) -> Result<()> {
		if self.json {
			return Ok(());
		}
		cliclack::set_theme(crate::style::Theme);
		cliclack::intro(format!("{}: {title}", console::style(" chainctl ").black().on_green()))
	}

	/// Prints a footer of the prompt sequence.
	fn outro(&mut self, message: impl Display) -> Result<()> {
		if self.json {
			eprintln!("{}", message);
			Ok(())
		} else {
			cliclack::outro(message)
		}
	}

	/// Prints a footer of the prompt sequence with a failure style.
	fn outro_cancel(&mut self, message: impl Display) -> Result<()> {
		if self.json {
			eprintln!("{}", message);
			Ok(())
		} else {
			cliclack::outro_cancel(message)
		}
	}

	/// Prints a success message.
	fn success(&mut self, message: impl Display) -> Result<()> {
		if self.json {
			eprintln!("{}", message);
			Ok(())
		} else {
			cliclack::log::success(message)
		}
	}

	/// Prints a warning message.
	fn warning(&mut self, message: impl Display) -> Result<()> {
		if self.json {
			eprintln!("{}", message);
			Ok(())
		} else {
			cliclack::log::warning(message)
		}
	}

	fn plain(&mut self, message: impl Display) -> Result<()> {
		if self.json {
			eprintln!("{}", message);
		} else {
			println!("{message}");
		}
		Ok(())
	}

	fn spinner(&mut self) -> Box<dyn traits::Spinner + Send> {
		Box::new(Spinner { inner: Arc::new(Mutex::new(None)), json: self.json })
	}
}

/// A spinner using cliclack.
#[derive(Clone)]
struct Spinner {
	inner: Arc<Mutex<Option<cliclack::ProgressBar>>>,
	json: bool,
}

impl traits::Spinner for Spinner {
	fn start(&self, message: &str) {
		if !self.json {
			let s = cliclack::spinner();
			s.start(message);
			if let Ok(mut inner) = self.inner.lock() {
				*inner = Some(s);
			}
		} else {
			eprintln!("{}", message);
		}
	}

	fn set_message(&self, message: &str) {
		if let Ok(mut inner) = self.inner.lock() {
			if let Some(ref mut s) = *inner {
				s.set_message(message);
			} else if self.json {
				eprintln!("{}", message);
			}
		}
	}

	fn error(&self, message: &str) {
		if let Ok(mut inner) = self.inner.lock() {
			if let Some(s) = inner.take() {
				s.error(message);
			} else if self.json {
				eprintln!("{}", message);
			}
		}
	}

	fn clear(&self) {
		if let Ok(mut inner) = self.inner.lock() &&
			let Some(s) = inner.take()
		{
			s.clear();
		}
	}
}

/// A confirmation prompt using cliclack.
struct Confirm {
	inner: cliclack::Confirm,
	json: bool,
}

impl traits::Confirm for Confirm {
	/// Sets the initially selected value.
	fn initial_value(mut self, initial_value: bool) -> Self {
		self.inner = self.inner.initial_value(initial_value);
		self
	}

	/// Starts the prompt interaction.
	fn interact(&mut self) -> Result<bool> {
		if self.json {
			return Err(std::io::Error::other("Prompt required"));
		}
		self.inner.interact()
	}
}

/// A input prompt using cliclack.
struct Input {
	inner: cliclack::Input,
	json: bool,
}

impl traits::Input for Input {
	/// Starts the prompt interaction.
	fn interact(&mut self) -> Result<String> {
		if self.json {
			return Err(std::io::Error::other("Prompt required"));
		}
		self.inner.interact()
	}

	/// Sets the placeholder (hint) text for the input.
	fn placeholder(mut self, placeholder: &str) -> Self {
		self.inner = self.inner.placeholder(placeholder);
		self
	}

	/// Sets a validation callback for the input that is called when the user submits.
	fn validate(
		mut self,
		validator: impl Fn(&String) -> std::result::Result<(), &'static str> + 'static,
	) -> Self {
		self.inner = self.inner.validate(validator);
		self
	}
}
