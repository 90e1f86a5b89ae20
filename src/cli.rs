// crates.io
use clap::{
	Parser, Subcommand,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use serde_json::{Map, Value};

// std
use std::{path::PathBuf, process::ExitCode};

// self
use crate::{
	config::Config,
	host::{Host, RunSummary},
	prelude::*,
	rules,
};

/// Command-line interface for the JavaScript style checker.
#[derive(Debug, Parser)]
#[command(
	version = concat!(
		env!("CARGO_PKG_VERSION"),
		"-",
		env!("VERGEN_GIT_SHA"),
		"-",
		env!("VERGEN_CARGO_TARGET_TRIPLE"),
	),
	rename_all = "kebab",
	styles = styles(),
)]
pub struct Cli {
	/// Configuration file. Defaults to `jstyle.json` in the working directory when present.
	#[arg(long, global = true, value_name = "PATH")]
	config: Option<PathBuf>,
	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Run style checks and report violations.
	Check {
		/// Optional source files. Defaults to every module file below the working directory.
		files: Vec<PathBuf>,
	},
	/// Apply all safe automatic fixes, then re-check.
	Fix {
		/// Optional source files. Defaults to every module file below the working directory.
		files: Vec<PathBuf>,
	},
	/// Print implemented rule IDs.
	Rules,
	/// Print the JSON schema of a rule's options, or of every rule.
	Schema {
		/// Rule name or ID.
		rule: Option<String>,
	},
}

impl Cli {
	pub fn run(&self) -> Result<ExitCode> {
		match &self.command {
			Command::Check { files } => {
				let Some(host) = self.host()? else {
					return Ok(ExitCode::FAILURE);
				};
				let summary = host.run_check(files)?;

				print_summary(&summary, false);

				if summary.violation_count > 0 {
					eprintln!("\nFound {} style violation(s).", summary.violation_count);

					return Ok(ExitCode::FAILURE);
				}
			},
			Command::Fix { files } => {
				let Some(host) = self.host()? else {
					return Ok(ExitCode::FAILURE);
				};
				let summary = host.run_fix(files)?;

				print_summary(&summary, true);

				if summary.violation_count > 0 {
					eprintln!(
						"\nFound {} remaining style violation(s) after fix.",
						summary.violation_count
					);

					return Ok(ExitCode::FAILURE);
				}
			},
			Command::Rules => print_rules(),
			Command::Schema { rule } => println!("{}", schema(rule.as_deref())?),
		}

		Ok(ExitCode::SUCCESS)
	}

	/// Builds the host, or prints every configuration error and returns `None`.
	fn host(&self) -> Result<Option<Host>> {
		let config = Config::load(self.config.as_deref())?;

		match config.validate() {
			Ok(active) => {
				tracing::debug!(rules = active.len(), "Loaded configuration.");

				Ok(Some(Host::new(config, active)))
			},
			Err(errors) => {
				for error in &errors {
					eprintln!("{error}");
				}

				eprintln!("\nFound {} configuration error(s).", errors.len());

				Ok(None)
			},
		}
	}
}

fn print_summary(summary: &RunSummary, fix_mode: bool) {
	for line in &summary.output_lines {
		println!("{line}");
	}

	if fix_mode {
		println!(
			"\nChecked {} file(s). Applied {} fix(es).",
			summary.file_count, summary.applied_fix_count
		);
	} else {
		println!("\nChecked {} file(s).", summary.file_count);
	}

	if summary.unfixable_count > 0 {
		println!("{} violation(s) require manual fixes.", summary.unfixable_count);
	}
}

fn print_rules() {
	for entry in rules::registry() {
		let fixable = if entry.meta.fixable { "fixable" } else { "report-only" };

		println!("{}\t{}\t{fixable}", entry.meta.id, entry.meta.name);
	}
}

fn schema(rule: Option<&str>) -> Result<String> {
	let value = match rule {
		Some(key) => {
			let entry = rules::find_rule(key).ok_or_else(|| eyre::eyre!("Unknown rule \"{key}\"."))?;

			(entry.schema)()
		},
		None => Value::Object(
			rules::registry()
				.into_iter()
				.map(|entry| (entry.meta.name.to_owned(), (entry.schema)()))
				.collect::<Map<_, _>>(),
		),
	};

	serde_json::to_string_pretty(&value).map_err(|err| eyre::eyre!("Failed to render the schema: {err}."))
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_check_subcommand() {
		let cli = Cli::parse_from(["app", "check", "--config", "ci.json", "src/a.js"]);

		assert!(matches!(&cli.command, Command::Check { files } if files.len() == 1));
		assert_eq!(cli.config, Some(PathBuf::from("ci.json")));
	}

	#[test]
	fn schemas_are_keyed_by_rule_name() {
		let all = schema(None).expect("schema renders");

		assert!(all.contains("\"bluebird-map-concurrency\""));
		assert!(schema(Some("JS-STYLE-ORDER-001")).is_ok_and(|text| text.contains("\"order\"")));
		assert!(schema(Some("missing")).is_err());
	}
}
