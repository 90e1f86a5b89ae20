//! Check and fix runs over files on disk.

use std::{
	fs,
	panic::{self, AssertUnwindSafe},
	path::{Component, Path, PathBuf},
	process::Command,
};

use tracing_subscriber::EnvFilter;

use crate::{
	config::{ActiveRule, Config},
	engine::{Environment, FileContext},
	fixes,
	fs::OsFileSystem,
	prelude::*,
	report::Diagnostic,
	rules::MODULE_EXTENSIONS,
	source::load_program,
};

/// Upper bound on check-and-fix passes per file.
pub const MAX_FIX_PASSES: usize = 8;
/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "JSTYLE_LOG";

const SIDECAR_SUFFIX: &str = ".ast.json";
const NODE_MODULES: &str = "node_modules";

/// Installs the stderr log subscriber, filtered by `JSTYLE_LOG` (default `warn`).
pub fn init_tracing() {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

#[derive(Debug, Default)]
pub struct RunSummary {
	pub file_count: usize,
	pub violation_count: usize,
	pub unfixable_count: usize,
	pub applied_fix_count: usize,
	pub output_lines: Vec<String>,
}
impl RunSummary {
	fn record(&mut self, path: &Path, diagnostics: &[Diagnostic]) {
		self.violation_count += diagnostics.len();
		self.unfixable_count += diagnostics.iter().filter(|diagnostic| !diagnostic.is_fixable()).count();
		self.output_lines.extend(diagnostics.iter().map(|diagnostic| diagnostic.format(path)));
	}
}

/// One configured session: the selected rules, the parser, and the shared lookup caches.
pub struct Host {
	parser: Vec<String>,
	rules: Vec<ActiveRule>,
	env: Environment,
}
impl Host {
	pub fn new(config: Config, rules: Vec<ActiveRule>) -> Self {
		Self { parser: config.parser, rules, env: Environment::new(OsFileSystem) }
	}

	pub fn run_check(&self, requested_files: &[PathBuf]) -> Result<RunSummary> {
		let files = self.resolve_files(requested_files);
		let mut summary = RunSummary { file_count: files.len(), ..Default::default() };

		for path in &files {
			let Some(text) = read_source(path) else {
				continue;
			};
			let Some(file) = self.load(path, text) else {
				continue;
			};

			summary.record(path, &self.evaluate(&file));
		}

		Ok(summary)
	}

	pub fn run_fix(&self, requested_files: &[PathBuf]) -> Result<RunSummary> {
		let files = self.resolve_files(requested_files);
		let mut summary = RunSummary { file_count: files.len(), ..Default::default() };

		for path in &files {
			let Some(original) = read_source(path) else {
				continue;
			};
			let mut text = original.clone();
			let mut remaining = None;

			for pass in 1..=MAX_FIX_PASSES {
				let Some(file) = self.load(path, text.clone()) else {
					break;
				};
				let diagnostics = self.evaluate(&file);
				let outcome = match fixes::apply_fixes(&text, &diagnostics) {
					Ok(outcome) => outcome,
					Err(err) => {
						tracing::error!(
							path = %path.display(),
							pass,
							error = %err,
							"Fixes do not apply; leaving the file as it is."
						);

						remaining = Some(diagnostics);

						break;
					},
				};

				tracing::debug!(
					path = %path.display(),
					pass,
					applied = outcome.applied(),
					conflicting = outcome.conflicting,
					"Finished fix pass."
				);

				if outcome.applied() == 0 {
					remaining = Some(diagnostics);

					break;
				}

				summary.applied_fix_count += outcome.applied();
				text = outcome.text;

				if self.parser.is_empty() {
					// A sidecar tree only describes the text it was dumped from.
					tracing::warn!(
						path = %path.display(),
						"Fixed with a sidecar syntax tree; regenerate it before the next run."
					);

					remaining = Some(
						diagnostics
							.into_iter()
							.enumerate()
							.filter(|(idx, _)| !outcome.accepted.contains(idx))
							.map(|(_, diagnostic)| diagnostic)
							.collect(),
					);

					break;
				}

				self.write(path, &text)?;
			}

			if text != original && self.parser.is_empty() {
				self.write(path, &text)?;
			}

			let remaining = match remaining {
				Some(remaining) => remaining,
				None => match self.load(path, text) {
					Some(file) => self.evaluate(&file),
					None => Vec::new(),
				},
			};

			summary.record(path, &remaining);
		}

		Ok(summary)
	}

	/// Writes fixed text and drops cached file contents, which may now be stale.
	fn write(&self, path: &Path, text: &str) -> Result<()> {
		fs::write(path, text).map_err(|err| eyre::eyre!("Failed to write {}: {err}.", path.display()))?;

		self.env.forget_contents();

		Ok(())
	}

	/// Runs every selected rule over one file, isolating rules that panic.
	pub fn evaluate(&self, file: &FileContext) -> Vec<Diagnostic> {
		let mut diagnostics = Vec::new();

		for rule in &self.rules {
			let run = panic::catch_unwind(AssertUnwindSafe(|| {
				(rule.entry.evaluate)(file, &self.env, rule.options.as_ref())
			}));

			match run {
				Ok(mut found) => diagnostics.append(&mut found),
				Err(_) => tracing::error!(
					rule = rule.entry.meta.id,
					path = %file.source.path().display(),
					"Rule panicked; dropping its diagnostics for this file."
				),
			}
		}

		diagnostics.sort_by_key(|diagnostic| (diagnostic.line, diagnostic.column));

		diagnostics
	}

	/// Requested files with a module extension, or every module file below the working
	/// directory outside `node_modules`.
	fn resolve_files(&self, requested_files: &[PathBuf]) -> Vec<PathBuf> {
		if !requested_files.is_empty() {
			return requested_files.iter().filter(|path| is_module_path(path)).cloned().collect();
		}

		let mut files = MODULE_EXTENSIONS
			.iter()
			.flat_map(|ext| self.env.fs().list_files_matching(&format!("**/*.{ext}")))
			.filter(|path| !path.components().any(|part| part == Component::Normal(NODE_MODULES.as_ref())))
			.collect::<Vec<_>>();

		files.sort();
		files.dedup();

		files
	}

	fn load(&self, path: &Path, text: String) -> Option<FileContext> {
		let loaded = self
			.syntax_tree_json(path)
			.and_then(|json| load_program(path, text, &json).map_err(|err| eyre::eyre!("{err}")));

		match loaded {
			Ok(source) => Some(FileContext::new(source)),
			Err(err) => {
				tracing::warn!(path = %path.display(), error = %err, "Skipping file without a usable syntax tree.");

				None
			},
		}
	}

	fn syntax_tree_json(&self, path: &Path) -> Result<String> {
		let Some((program, args)) = self.parser.split_first() else {
			let sidecar = sidecar_path(path);

			return fs::read_to_string(&sidecar)
				.map_err(|err| eyre::eyre!("Failed to read {}: {err}.", sidecar.display()));
		};
		let output = Command::new(program)
			.args(args)
			.arg(path)
			.output()
			.map_err(|err| eyre::eyre!("Failed to run the parser `{program}`: {err}."))?;

		if !output.status.success() {
			return Err(eyre::eyre!(
				"Parser `{program}` failed with {}: {}",
				output.status,
				String::from_utf8_lossy(&output.stderr).trim()
			));
		}

		String::from_utf8(output.stdout)
			.map_err(|err| eyre::eyre!("Parser `{program}` printed invalid UTF-8: {err}."))
	}
}

/// `<file>.ast.json` next to the source file.
pub fn sidecar_path(path: &Path) -> PathBuf {
	let mut name = path.as_os_str().to_owned();

	name.push(SIDECAR_SUFFIX);

	PathBuf::from(name)
}

fn is_module_path(path: &Path) -> bool {
	path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext))
}

fn read_source(path: &Path) -> Option<String> {
	match fs::read_to_string(path) {
		Ok(text) => Some(text),
		Err(err) => {
			tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable file.");

			None
		},
	}
}
