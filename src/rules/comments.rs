//! Line comment conventions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
	engine::{Rule, RuleContext, RuleMeta},
	patch::{Edit, Patch},
	report::Fix,
	source::{SourceFile, Token, TokenKind},
};

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^(?:eslint|globals?\b|@ts-|istanbul\b|prettier-ignore|falls? ?through\b)")
		.expect("Expected operation to succeed.")
});
static FORMAL_NOTE_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^(?:TODO|HACK): \S").expect("Expected operation to succeed."));
static INFORMAL_NOTE_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^(?i:(todo|fixme|hack|xxx))\b[\s:!.\-]*(.*)$").expect("Expected operation to succeed.")
});
static NOTE_PREFIX_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^(?i:note):\s*(.*)$").expect("Expected operation to succeed."));
static URL_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[a-z][a-z0-9+.\-]*://\S+").expect("Expected operation to succeed."));

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentStyleOptions {}

/// `//` comments start with a capital letter, mark notes as `TODO: ` or `HACK: `, and
/// introduce leading links with `See`.
pub struct CommentStyle;
impl Rule for CommentStyle {
	type Options = CommentStyleOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-COMMENT-001",
		name: "comment-style",
		description: "Line comments follow the note, link, and capitalization conventions.",
		fixable: true,
	};

	fn schema() -> Value {
		json!({ "type": "object", "additionalProperties": false })
	}

	fn check_file(cx: &mut RuleContext<'_>, _: &Self::Options, _: &mut ()) {
		let source = cx.source();

		for comment in source.tokens().comments().filter(|token| token.kind == TokenKind::LineComment) {
			let Some((message, replacement)) = classify(source, comment) else {
				continue;
			};
			let fix = replacement.map(|content| {
				let leading = comment_leading_space(comment);
				let edit = Edit::replace(comment.range, format!("//{leading}{content}"));

				Fix::safe(Patch::single(edit), "Rewrite the comment.")
			});

			cx.report(comment.range, message, fix);
		}
	}
}

/// Message and corrected comment text, or `None` when the comment is fine.
fn classify(source: &SourceFile, comment: &Token) -> Option<(String, Option<String>)> {
	let body = comment.comment_body()?;

	if body.starts_with('/') {
		return None;
	}

	let content = body.trim();

	if content.is_empty() || DIRECTIVE_RE.is_match(content) || FORMAL_NOTE_RE.is_match(content) {
		return None;
	}

	if let Some(captures) = INFORMAL_NOTE_RE.captures(content) {
		let tag = match captures[1].to_ascii_lowercase().as_str() {
			"todo" | "fixme" => "TODO",
			_ => "HACK",
		};
		let rest = captures[2].trim();
		let replacement = (!rest.is_empty()).then(|| format!("{tag}: {rest}"));

		return Some((format!("Write this note as \"{tag}: ...\"."), replacement));
	}

	if is_continuation(source, comment) {
		return None;
	}

	if let Some(captures) = NOTE_PREFIX_RE.captures(content) {
		let rest = captures[1].trim();
		let replacement = (!rest.is_empty()).then(|| capitalize(rest));

		return Some(("Drop the \"Note:\" prefix.".to_owned(), replacement));
	}

	if URL_RE.is_match(content) {
		return Some(("Introduce a leading link with \"See\".".to_owned(), Some(format!("See {content}"))));
	}

	let first = content.chars().next()?;

	if first.is_lowercase() && content.split_whitespace().nth(1).is_some() {
		return Some(("Start the comment with a capital letter.".to_owned(), Some(capitalize(content))));
	}

	None
}

/// An own-line comment directly below another own-line line comment at the same column.
fn is_continuation(source: &SourceFile, comment: &Token) -> bool {
	if !source.starts_line(comment) {
		return false;
	}

	let Some(previous) = source.tokens().before(comment.start(), true) else {
		return false;
	};

	previous.kind == TokenKind::LineComment
		&& source.starts_line(previous)
		&& source.line_of(previous.start()) + 1 == source.line_of(comment.start())
		&& source.column_of(previous.start()) == source.column_of(comment.start())
}

fn comment_leading_space(comment: &Token) -> &str {
	let body = comment.comment_body().unwrap_or_default();
	let content = body.trim_start();

	match &body[..body.len() - content.len()] {
		"" => " ",
		leading => leading,
	}
}

fn capitalize(text: &str) -> String {
	let mut chars = text.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
