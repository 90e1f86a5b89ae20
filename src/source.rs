//! Source model: one file's text, syntax tree, and token stream.

mod builder;
mod estree;
mod token;
mod tree;

pub use builder::{TreeBuilder, TreeError};
pub use estree::{LoadError, load_program};
pub use token::{Token, TokenIndex, TokenKind};
pub use tree::{
	Ancestors, Class, DeclarationKind, Descendants, Function, LiteralValue, MethodKind, NodeId,
	NodeKind, PropertyKind, SourceType, SyntaxTree,
};

use std::path::{Path, PathBuf};

use text_size::{TextRange, TextSize};

/// Read-only view over a parsed file. Nothing here mutates the tree.
#[derive(Debug)]
pub struct SourceFile {
	path: PathBuf,
	text: String,
	line_starts: Vec<usize>,
	tree: SyntaxTree,
	tokens: TokenIndex,
}
impl SourceFile {
	pub fn new(path: impl Into<PathBuf>, text: String, tree: SyntaxTree, tokens: Vec<Token>) -> Self {
		let line_starts = build_line_starts(&text);

		Self { path: path.into(), text, line_starts, tree, tokens: TokenIndex::new(tokens) }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn tree(&self) -> &SyntaxTree {
		&self.tree
	}

	pub fn tokens(&self) -> &TokenIndex {
		&self.tokens
	}

	pub fn text_of(&self, range: TextRange) -> &str {
		&self.text[range]
	}

	pub fn node_text(&self, node: NodeId) -> &str {
		self.text_of(self.tree.range(node))
	}

	/// Token ending at or before the start of `node`; `None` at the start of the file.
	pub fn token_before(&self, node: NodeId, include_comments: bool) -> Option<&Token> {
		self.tokens.before(self.tree.range(node).start(), include_comments)
	}

	/// Token starting at or after the end of `node`; `None` at the end of the file.
	pub fn token_after(&self, node: NodeId, include_comments: bool) -> Option<&Token> {
		self.tokens.after(self.tree.range(node).end(), include_comments)
	}

	/// Tokens lying entirely inside `range`, comments included.
	pub fn tokens_in(&self, range: TextRange) -> &[Token] {
		self.tokens.within(range)
	}

	pub fn first_token(&self, node: NodeId) -> Option<&Token> {
		self.tokens.first_code_within(self.tree.range(node))
	}

	pub fn last_token(&self, node: NodeId) -> Option<&Token> {
		self.tokens.last_code_within(self.tree.range(node))
	}

	/// Comments between the previous code token and `node`.
	pub fn comments_before(&self, node: NodeId) -> Vec<&Token> {
		let start = self.tree.range(node).start();
		let from = self.tokens.before(start, false).map(Token::end).unwrap_or_default();

		self.tokens.comments_between(from, start)
	}

	/// Comments between `node` and the next code token.
	pub fn comments_after(&self, node: NodeId) -> Vec<&Token> {
		let end = self.tree.range(node).end();
		let to = self
			.tokens
			.after(end, false)
			.map(Token::start)
			.unwrap_or_else(|| TextSize::of(self.text.as_str()));

		self.tokens.comments_between(end, to)
	}

	/// 1-based line of `offset`.
	pub fn line_of(&self, offset: TextSize) -> usize {
		line_from_offset(&self.line_starts, usize::from(offset))
	}

	/// 1-based column of `offset`, counted in characters.
	pub fn column_of(&self, offset: TextSize) -> usize {
		let line = self.line_of(offset);
		let start = self.line_starts[line - 1];

		self.text[start..usize::from(offset)].chars().count() + 1
	}

	pub fn line_count(&self) -> usize {
		self.line_starts.len()
	}

	/// Offset of the first character of the 1-based `line`.
	pub fn line_start(&self, line: usize) -> Option<TextSize> {
		let start = *self.line_starts.get(line.checked_sub(1)?)?;

		Some(to_size(start))
	}

	/// Offset of the line terminator of the 1-based `line` (or the end of the text).
	pub fn line_end(&self, line: usize) -> Option<TextSize> {
		let start = *self.line_starts.get(line.checked_sub(1)?)?;
		let end = match self.line_starts.get(line) {
			Some(next) => next.saturating_sub(1),
			None => self.text.len(),
		};
		let end = if end > start && self.text.as_bytes()[end - 1] == b'\r' { end - 1 } else { end };

		Some(to_size(end))
	}

	pub fn line_text(&self, line: usize) -> &str {
		match (self.line_start(line), self.line_end(line)) {
			(Some(start), Some(end)) => &self.text[TextRange::new(start, end)],
			_ => "",
		}
	}

	/// Leading whitespace of the 1-based `line`.
	pub fn line_indent(&self, line: usize) -> &str {
		let text = self.line_text(line);
		let trimmed = text.trim_start_matches([' ', '\t']);

		&text[..text.len() - trimmed.len()]
	}

	pub fn is_blank_line(&self, line: usize) -> bool {
		self.line_text(line).trim().is_empty()
	}

	/// Whether a blank line separates two positions that only have whitespace between them.
	pub fn has_blank_line_between(&self, end: TextSize, start: TextSize) -> bool {
		let first = self.line_of(end);
		let last = self.line_of(start);

		(first + 1..last).any(|line| self.is_blank_line(line))
	}

	/// Whether `token` is the first thing on its line.
	pub fn starts_line(&self, token: &Token) -> bool {
		match self.tokens.before(token.start(), true) {
			Some(prev) => self.line_of(prev.end()) < self.line_of(token.start()),
			None => true,
		}
	}
}

pub(crate) fn to_size(offset: usize) -> TextSize {
	TextSize::try_from(offset).unwrap_or(TextSize::from(u32::MAX))
}

fn line_from_offset(line_starts: &[usize], offset: usize) -> usize {
	match line_starts.binary_search(&offset) {
		Ok(pos) => pos + 1,
		Err(pos) => pos,
	}
}

fn build_line_starts(text: &str) -> Vec<usize> {
	let mut starts = vec![0_usize];

	for (idx, ch) in text.char_indices() {
		if ch == '\n' {
			starts.push(idx + 1);
		}
	}

	starts
}
