//! JavaScript style checker executable.

#![deny(clippy::all, missing_docs)]

use std::process::ExitCode;

use clap::Parser;
use jstyle::{Cli, host};

fn main() -> ExitCode {
	if let Err(err) = color_eyre::install() {
		eprintln!("Failed to initialize error reporter: {err}.");

		return ExitCode::FAILURE;
	}

	host::init_tracing();

	match Cli::parse().run() {
		Ok(code) => code,
		Err(err) => {
			eprintln!("{err:?}");

			ExitCode::FAILURE
		},
	}
}
