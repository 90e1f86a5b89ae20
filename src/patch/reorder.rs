//! Reordering edits for sibling lists.
//!
//! Each element owns a slot: its attached leading comments, its body, its separator, and a
//! trailing comment on the same line. A changed position is rewritten with the moved
//! element's comments and body, followed by the separator that belonged to the position.

use text_size::{TextRange, TextSize};

use super::{Edit, Patch};
use crate::source::{NodeId, SourceFile, Token, TokenKind};

/// How list elements are separated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Separator {
	/// `,` after each element except possibly the last (properties, specifiers).
	Comma,
	/// Each element is a statement that may end in its own `;` (import declarations).
	Statement,
}

#[derive(Clone, Debug)]
struct Slot {
	range: TextRange,
	/// Leading comments plus the whitespace that separates them from the body.
	leading: TextRange,
	body: TextRange,
	separator: Option<TextRange>,
	/// Trailing comment plus the whitespace before it.
	trailing: Option<TextRange>,
	trailing_is_line_comment: bool,
}

/// Builds the patch that moves `elements[order[i]]` to position `i`.
///
/// Returns `None` when the permutation is the identity, when a comment would be lost or would
/// swallow code, or when the resulting edits are inconsistent.
pub fn reorder(
	source: &SourceFile,
	elements: &[NodeId],
	order: &[usize],
	separator: Separator,
) -> Option<Patch> {
	if elements.len() != order.len() || order.iter().enumerate().all(|(idx, from)| idx == *from) {
		return None;
	}

	let slots = elements
		.iter()
		.enumerate()
		.map(|(idx, element)| {
			let previous_end = idx.checked_sub(1).map(|prev| source.tree().range(elements[prev]).end());

			slot(source, *element, previous_end, separator)
		})
		.collect::<Option<Vec<_>>>()?;

	for slot in &slots {
		if has_stray_comment(source, slot) {
			return None;
		}
	}

	let overlapping = slots.windows(2).any(|pair| pair[0].range.end() > pair[1].range.start());

	if overlapping {
		return whole_list(source, &slots, order);
	}

	let mut edits = Vec::new();

	for (position, from) in order.iter().enumerate() {
		if position == *from {
			continue;
		}

		let target = &slots[position];
		let moved = &slots[*from];

		if moved.trailing_is_line_comment && !ends_line(source, target.range.end()) {
			return None;
		}

		edits.push(Edit::replace(target.range, render(source, moved, target)));
	}

	Patch::new(edits).ok()
}

fn slot(
	source: &SourceFile,
	element: NodeId,
	previous_end: Option<TextSize>,
	separator: Separator,
) -> Option<Slot> {
	let range = source.tree().range(element);
	let last = source.last_token(element)?;
	let (body, separator_range) = match separator {
		Separator::Statement if last.is_punctuator(";") => {
			let before = source.tokens().before(last.start(), true)?;

			(TextRange::new(range.start(), before.end().max(range.start())), Some(last.range))
		},
		Separator::Statement => (range, None),
		Separator::Comma => {
			let next = source.tokens().after(range.end(), false);
			let comma = next.filter(|token| token.is_punctuator(",")).map(|token| token.range);

			(range, comma)
		},
	};
	let leading_start = leading_comments_start(source, body.start(), previous_end);
	let tail_end = separator_range.map(TextRange::end).unwrap_or(body.end());
	let trailing = trailing_comment(source, tail_end);
	let end = trailing.map(|comment| comment.end()).unwrap_or(tail_end);

	Some(Slot {
		range: TextRange::new(leading_start, end),
		leading: TextRange::new(leading_start, body.start()),
		body,
		separator: separator_range,
		trailing: trailing.map(|comment| TextRange::new(tail_end, comment.end())),
		trailing_is_line_comment: trailing.is_some_and(|comment| comment.kind == TokenKind::LineComment),
	})
}

/// Start of the comment block attached above `start`: own-line comments with no blank line
/// between them and the element, after the previous element.
fn leading_comments_start(source: &SourceFile, start: TextSize, previous_end: Option<TextSize>) -> TextSize {
	let mut attached = start;
	let mut cursor = start;

	while let Some(comment) = source.tokens().before(cursor, true) {
		if !comment.is_comment()
			|| previous_end.is_some_and(|end| comment.start() < end)
			|| !source.starts_line(comment)
			|| source.has_blank_line_between(comment.end(), attached)
			|| previous_line_ends_with_code(source, comment)
		{
			break;
		}

		attached = comment.start();
		cursor = comment.start();
	}

	attached
}

/// Whether `comment` sits right after a trailing comment that belongs to the previous line's
/// code, which makes it a continuation of that trailing comment.
fn previous_line_ends_with_code(source: &SourceFile, comment: &Token) -> bool {
	let Some(before) = source.tokens().before(comment.start(), true) else {
		return false;
	};

	before.is_comment()
		&& !source.starts_line(before)
		&& source.line_of(before.end()) + 1 == source.line_of(comment.start())
}

fn trailing_comment(source: &SourceFile, tail_end: TextSize) -> Option<&Token> {
	let comment = source.tokens().after(tail_end, true).filter(|token| token.is_comment())?;

	if source.line_of(comment.start()) != source.line_of(tail_end) {
		return None;
	}

	match source.tokens().after(comment.end(), true) {
		Some(next) if source.line_of(next.start()) == source.line_of(comment.end()) => None,
		_ => Some(comment),
	}
}

/// Comments inside the slot that are neither leading nor trailing would be dropped.
fn has_stray_comment(source: &SourceFile, slot: &Slot) -> bool {
	let between_body_and_separator = match slot.separator {
		Some(separator) if separator.start() > slot.body.end() =>
			TextRange::new(slot.body.end(), separator.start()),
		_ => return false,
	};

	source.tokens().within(between_body_and_separator).iter().any(Token::is_comment)
}

fn ends_line(source: &SourceFile, offset: TextSize) -> bool {
	match source.tokens().after(offset, true) {
		Some(next) => source.line_of(next.start()) != source.line_of(offset),
		None => true,
	}
}

fn render(source: &SourceFile, moved: &Slot, target: &Slot) -> String {
	let mut out = String::new();

	out.push_str(source.text_of(moved.leading));
	out.push_str(source.text_of(moved.body));

	if let Some(separator) = target.separator {
		out.push_str(source.text_of(separator));
	}
	if let Some(trailing) = moved.trailing {
		out.push_str(source.text_of(trailing));
	}

	out
}

/// Rewrites the whole list at once; used when slots would overlap.
fn whole_list(source: &SourceFile, slots: &[Slot], order: &[usize]) -> Option<Patch> {
	let first = slots.first()?;
	let last = slots.last()?;
	let mut out = String::new();

	for (position, from) in order.iter().enumerate() {
		if position > 0 {
			let previous = &slots[position - 1].body;
			let current = &slots[position].body;

			if source.line_of(previous.end()) == source.line_of(current.start()) {
				out.push(' ');
			} else {
				out.push('\n');
				out.push_str(source.line_indent(source.line_of(current.start())));
			}
		}

		out.push_str(&render(source, &slots[*from], &slots[position]));
	}

	Patch::new(vec![Edit::replace(TextRange::new(first.range.start(), last.range.end()), out)]).ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		source::NodeKind,
		testing::{self, find},
	};

	fn properties(file: &crate::engine::FileContext, object: &str) -> Vec<NodeId> {
		let object = find(file, "ObjectExpression", object);

		match file.source.tree().kind(object) {
			NodeKind::ObjectExpression { properties } => properties.clone(),
			_ => unreachable!(),
		}
	}

	fn reordered(text: &str, object: &str, order: &[usize]) -> Option<String> {
		let file = testing::parse("a.js", text);
		let elements = properties(&file, object);
		let patch = reorder(&file.source, &elements, order, Separator::Comma)?;

		Some(patch.apply(text).expect("patch applies"))
	}

	#[test]
	fn swap_borrows_the_separator_of_each_position() {
		let text = "x = {ref: R, key: K};\n";
		let file = testing::parse("a.js", text);
		let elements = properties(&file, "{ref: R, key: K}");
		let patch =
			reorder(&file.source, &elements, &[1, 0], Separator::Comma).expect("patch is built");
		let replacements =
			patch.edits().iter().map(|edit| edit.replacement.as_str()).collect::<Vec<_>>();

		assert_eq!(replacements, vec!["key: K,", "ref: R"]);
		assert_eq!(patch.apply(text).expect("applies"), "x = {key: K, ref: R};\n");
	}

	#[test]
	fn attached_comments_move_with_their_element() {
		let text = "x = {\n\t// about b\n\tb: 2, // trailing b\n\n\t// detached\n\n\ta: 1,\n};\n";
		let object = &text[4..text.len() - 2];

		assert_eq!(
			reordered(text, object, &[1, 0]).as_deref(),
			Some("x = {\n\ta: 1,\n\n\t// detached\n\n\t// about b\n\tb: 2, // trailing b\n};\n")
		);
	}

	#[test]
	fn line_comment_that_would_swallow_code_declines() {
		let text = "x = {b: 2, // note\n\ta: 1, c: 3};\n";
		let object = &text[4..text.len() - 2];

		assert_eq!(reordered(text, object, &[1, 0, 2]), None);
	}

	#[test]
	fn statements_keep_their_terminators_in_place() {
		let text = "import b from 'b'\nimport a from 'a';\n";
		let file = testing::parse("a.js", text);
		let NodeKind::Program { body, .. } = file.source.tree().kind(file.source.tree().root()) else {
			unreachable!();
		};
		let patch =
			reorder(&file.source, body, &[1, 0], Separator::Statement).expect("patch is built");

		assert_eq!(patch.apply(text).expect("applies"), "import a from 'a'\nimport b from 'b';\n");
	}

	#[test]
	fn identity_order_builds_nothing() {
		assert_eq!(reordered("x = {a: 1, b: 2};\n", "{a: 1, b: 2}", &[0, 1]), None);
	}
}
