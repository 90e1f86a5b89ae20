//! Patch synthesis: point edits, list reordering, scope-aware renaming, and blank-line edits.

mod edit;
mod rename;
mod reorder;

pub use edit::{Edit, Patch, PatchError};
pub use rename::{is_valid_identifier, rename_variable};
pub use reorder::{Separator, reorder};

use text_size::{TextRange, TextSize};

use crate::source::SourceFile;

/// Line terminator the file already uses.
pub fn newline(source: &SourceFile) -> &'static str {
	if source.text().contains("\r\n") { "\r\n" } else { "\n" }
}

/// Makes sure a blank line separates `prev_end` from `next_start`.
///
/// When both sit on one line the gap is split and the new line keeps the indentation of the
/// shared line. Returns `None` when a blank line is already there.
pub fn ensure_blank_line(
	source: &SourceFile,
	prev_end: TextSize,
	next_start: TextSize,
) -> Option<Edit> {
	if source.has_blank_line_between(prev_end, next_start) {
		return None;
	}

	let newline = newline(source);
	let prev_line = source.line_of(prev_end);
	let next_line = source.line_of(next_start);

	if prev_line == next_line {
		let indent = source.line_indent(prev_line);

		return Some(Edit::replace(
			TextRange::new(prev_end, next_start),
			format!("{newline}{newline}{indent}"),
		));
	}

	Some(Edit::insert(source.line_start(next_line)?, newline))
}

/// Removes every blank line between `prev_end` and `next_start`.
///
/// Only whitespace may separate the two positions; with a comment in between nothing is
/// removed.
pub fn collapse_blank_lines(
	source: &SourceFile,
	prev_end: TextSize,
	next_start: TextSize,
) -> Option<Edit> {
	if !source.has_blank_line_between(prev_end, next_start)
		|| !source.tokens().comments_between(prev_end, next_start).is_empty()
	{
		return None;
	}

	let start = source.line_end(source.line_of(prev_end))?;
	let end = source.line_start(source.line_of(next_start))?;

	(start < end).then(|| Edit::replace(TextRange::new(start, end), newline(source)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing;

	fn at(offset: u32) -> TextSize {
		TextSize::from(offset)
	}

	#[test]
	fn blank_line_is_inserted_before_the_next_line() {
		let text = "a();\nb();\n";
		let file = testing::parse("a.js", text);
		let edit = ensure_blank_line(&file.source, at(4), at(5)).expect("edit");

		assert_eq!(Patch::single(edit).apply(text).expect("applies"), "a();\n\nb();\n");
	}

	#[test]
	fn shared_line_is_split_keeping_indentation() {
		let text = "\ta(); b();\n";
		let file = testing::parse("a.js", text);
		let edit = ensure_blank_line(&file.source, at(5), at(6)).expect("edit");

		assert_eq!(Patch::single(edit).apply(text).expect("applies"), "\ta();\n\n\tb();\n");
	}

	#[test]
	fn existing_blank_line_needs_nothing() {
		let file = testing::parse("a.js", "a();\n\nb();\n");

		assert_eq!(ensure_blank_line(&file.source, at(4), at(6)), None);
	}

	#[test]
	fn blank_lines_collapse_to_one_terminator() {
		let text = "a();\n\n\n\tb();\n";
		let file = testing::parse("a.js", text);
		let edit = collapse_blank_lines(&file.source, at(4), at(8)).expect("edit");

		assert_eq!(Patch::single(edit).apply(text).expect("applies"), "a();\n\tb();\n");
	}

	#[test]
	fn crlf_files_keep_their_terminator() {
		let text = "a();\r\n\r\nb();\r\n";
		let file = testing::parse("a.js", text);
		let edit = collapse_blank_lines(&file.source, at(4), at(8)).expect("edit");

		assert_eq!(Patch::single(edit).apply(text).expect("applies"), "a();\r\nb();\r\n");
	}

	#[test]
	fn comments_between_block_collapsing() {
		let file = testing::parse("a.js", "a();\n\n// keep\nb();\n");

		assert_eq!(collapse_blank_lines(&file.source, at(4), at(14)), None);
	}
}
