//! Applies the safe fixes of one check pass to a file's text.

use crate::{
	patch::Patch,
	prelude::*,
	report::{Diagnostic, FixKind},
};

/// Result of applying one pass of fixes.
#[derive(Debug)]
pub struct FixOutcome {
	pub text: String,
	/// Indices of the diagnostics whose fixes were applied.
	pub accepted: Vec<usize>,
	/// Safe fixes skipped because they collide with an accepted one; a later pass retries them.
	pub conflicting: usize,
}
impl FixOutcome {
	pub fn applied(&self) -> usize {
		self.accepted.len()
	}
}

/// Accepts safe patches in diagnostic order, skipping any whose span intersects an accepted
/// patch, then applies the accepted ones together.
pub fn apply_fixes(text: &str, diagnostics: &[Diagnostic]) -> Result<FixOutcome> {
	let mut accepted = Vec::<(usize, &Patch)>::new();
	let mut conflicting = 0_usize;

	for (idx, diagnostic) in diagnostics.iter().enumerate() {
		let Some(fix) = diagnostic.fix.as_ref().filter(|fix| fix.kind == FixKind::Safe) else {
			continue;
		};

		if accepted.iter().any(|(_, patch)| patch.intersects(&fix.patch)) {
			conflicting += 1;

			continue;
		}

		accepted.push((idx, &fix.patch));
	}

	let indices = accepted.iter().map(|(idx, _)| *idx).collect::<Vec<_>>();
	let Some(combined) = accepted
		.into_iter()
		.map(|(_, patch)| patch.clone())
		.try_fold(None::<Patch>, |combined, patch| match combined {
			Some(combined) => combined.merge(patch).map(Some),
			None => Ok(Some(patch)),
		})
		.map_err(|err| eyre::eyre!("Failed to combine fixes: {err}"))?
	else {
		return Ok(FixOutcome { text: text.to_owned(), accepted: Vec::new(), conflicting });
	};
	let text = combined.apply(text).map_err(|err| eyre::eyre!("Failed to apply fixes: {err}"))?;

	Ok(FixOutcome { text, accepted: indices, conflicting })
}

#[cfg(test)]
mod tests {
	use text_size::{TextRange, TextSize};

	use super::*;
	use crate::{
		patch::Edit,
		report::{Fix, Reporter},
		testing,
	};

	fn replace(start: u32, end: u32, text: &str) -> (TextRange, Patch) {
		let range = TextRange::new(TextSize::from(start), TextSize::from(end));

		(range, Patch::single(Edit::replace(range, text)))
	}

	#[test]
	fn conflicting_and_unsafe_fixes_are_skipped() {
		let text = "[alpha, beta, gamma];\n";
		let file = testing::parse("a.js", text);
		let mut reporter = Reporter::new("JS-STYLE-TEST-001", &file.source);
		let (alpha, first) = replace(1, 6, "A");
		let (straddling, overlapping) = replace(4, 9, "X");
		let (beta, suggested) = replace(8, 12, "B");
		let (gamma, last) = replace(14, 19, "G");

		reporter.report_at(alpha, "First.", Some(Fix::safe(first, "A.")));
		reporter.report_at(straddling, "Overlaps.", Some(Fix::safe(overlapping, "X.")));
		reporter.report_at(beta, "Suggested.", Some(Fix::suggestion(suggested, "B.")));
		reporter.report_at(gamma, "Last.", Some(Fix::safe(last, "G.")));
		reporter.report_at(gamma, "No fix.", None);

		let outcome = apply_fixes(text, &reporter.finish()).expect("fixes apply");

		assert_eq!(outcome.text, "[A, beta, G];\n");
		assert_eq!((outcome.applied(), outcome.conflicting), (2, 1));
		assert_eq!(outcome.accepted, vec![0, 3]);
	}

	#[test]
	fn no_fixes_leave_the_text_alone() {
		let outcome = apply_fixes("a();\n", &[]).expect("fixes apply");

		assert_eq!(outcome.text, "a();\n");
		assert_eq!(outcome.applied(), 0);
	}
}
