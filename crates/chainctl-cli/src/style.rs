// SPDX-License-Identifier: GPL-3.0

use cliclack::ThemeState;
pub(crate) use console::style;
use console::Style;

pub(crate) fn get_styles() -> clap::builder::Styles {
	use clap::builder::styling::{AnsiColor, Color, Style};
	clap::builder::Styles::styled()
		.usage(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightGreen))))
		.header(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightGreen))))
		.literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightCyan))))
		.invalid(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
		.error(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
		.valid(
			Style::new()
				.bold()
				.underline()
				.fg_color(Some(Color::Ansi(AnsiColor::BrightCyan))),
		)
		.placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}

pub(crate) struct Theme;

impl cliclack::Theme for Theme {
	fn bar_color(&self, state: &ThemeState) -> Style {
		match state {
			ThemeState::Active => Style::new().bright().green(),
			ThemeState::Error(_) => Style::new().bright().red(),
			_ => Style::new().green().dim(),
		}
	}

	fn state_symbol_color(&self, _state: &ThemeState) -> Style {
		Style::new().bright().green()
	}

	fn info_symbol(&self) -> String {
		"⛓".into()
	}
}

/// Formats a chain key or container name with a bold style.
pub(crate) fn format_name(name: impl std::fmt::Display) -> String {
	format!("{}", style(name).bold())
}
