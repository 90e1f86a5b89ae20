//! Diagnostics and the per-rule reporter that collects them.

use std::path::Path;

use text_size::TextRange;

use crate::{patch::Patch, source::SourceFile};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixKind {
	/// Keeps program behavior; the host applies it on `fix`.
	Safe,
	/// Might change behavior; shown, never applied automatically.
	Suggestion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fix {
	pub kind: FixKind,
	pub patch: Patch,
	pub description: String,
}
impl Fix {
	pub fn safe(patch: Patch, description: impl Into<String>) -> Self {
		Self { kind: FixKind::Safe, patch, description: description.into() }
	}

	pub fn suggestion(patch: Patch, description: impl Into<String>) -> Self {
		Self { kind: FixKind::Suggestion, patch, description: description.into() }
	}

	/// Safe when `safe` holds, a suggestion otherwise.
	pub fn checked(safe: bool, patch: Patch, description: impl Into<String>) -> Self {
		if safe { Self::safe(patch, description) } else { Self::suggestion(patch, description) }
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
	pub rule: &'static str,
	pub range: TextRange,
	/// 1-based line of `range.start()`.
	pub line: usize,
	/// 1-based column of `range.start()`, in characters.
	pub column: usize,
	pub message: String,
	pub fix: Option<Fix>,
}
impl Diagnostic {
	pub fn new(
		rule: &'static str,
		source: &SourceFile,
		range: TextRange,
		message: impl Into<String>,
	) -> Self {
		Self {
			rule,
			range,
			line: source.line_of(range.start()),
			column: source.column_of(range.start()),
			message: message.into(),
			fix: None,
		}
	}

	pub fn with_fix(mut self, fix: Option<Fix>) -> Self {
		self.fix = fix;

		self
	}

	/// Whether `fix` would rewrite this diagnostic away.
	pub fn is_fixable(&self) -> bool {
		self.fix.as_ref().is_some_and(|fix| fix.kind == FixKind::Safe)
	}

	pub fn format(&self, path: &Path) -> String {
		let suffix = match self.fix.as_ref().map(|fix| fix.kind) {
			Some(FixKind::Safe) => " (fixable)",
			Some(FixKind::Suggestion) => " (suggestion)",
			None => "",
		};

		format!(
			"{}:{}:{}: [{}] {}{}",
			path.display(),
			self.line,
			self.column,
			self.rule,
			self.message,
			suffix
		)
	}
}

/// Collects the diagnostics of one rule over one file, in the order they are reported.
#[derive(Debug)]
pub struct Reporter<'a> {
	rule: &'static str,
	source: &'a SourceFile,
	diagnostics: Vec<Diagnostic>,
}
impl<'a> Reporter<'a> {
	pub fn new(rule: &'static str, source: &'a SourceFile) -> Self {
		Self { rule, source, diagnostics: Vec::new() }
	}

	pub fn report(&mut self, diagnostic: Diagnostic) {
		self.diagnostics.push(diagnostic);
	}

	/// Builds and reports a diagnostic of this reporter's rule.
	pub fn report_at(&mut self, range: TextRange, message: impl Into<String>, fix: Option<Fix>) {
		let diagnostic = Diagnostic::new(self.rule, self.source, range, message).with_fix(fix);

		self.report(diagnostic);
	}

	pub fn len(&self) -> usize {
		self.diagnostics.len()
	}

	pub fn is_empty(&self) -> bool {
		self.diagnostics.is_empty()
	}

	pub fn finish(self) -> Vec<Diagnostic> {
		self.diagnostics
	}
}
