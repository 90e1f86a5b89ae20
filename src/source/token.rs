use text_size::{TextRange, TextSize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
	Identifier,
	Keyword,
	Punctuator,
	String,
	Numeric,
	Template,
	RegularExpression,
	Boolean,
	Null,
	PrivateIdentifier,
	JsxText,
	Other,
	LineComment,
	BlockComment,
	Hashbang,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
	pub kind: TokenKind,
	pub range: TextRange,
	/// Raw source text of the token, delimiters included.
	pub text: String,
}
impl Token {
	pub fn is_comment(&self) -> bool {
		matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment | TokenKind::Hashbang)
	}

	pub fn is_punctuator(&self, value: &str) -> bool {
		self.kind == TokenKind::Punctuator && self.text == value
	}

	/// Comment text without its `//`, `/* */`, or `#!` delimiters.
	pub fn comment_body(&self) -> Option<&str> {
		match self.kind {
			TokenKind::LineComment => self.text.strip_prefix("//"),
			TokenKind::BlockComment =>
				self.text.strip_prefix("/*").and_then(|rest| rest.strip_suffix("*/")),
			TokenKind::Hashbang => self.text.strip_prefix("#!"),
			_ => None,
		}
	}

	pub fn start(&self) -> TextSize {
		self.range.start()
	}

	pub fn end(&self) -> TextSize {
		self.range.end()
	}
}

/// Sorted token stream with a parallel index of code (non-comment) tokens.
#[derive(Clone, Debug, Default)]
pub struct TokenIndex {
	tokens: Vec<Token>,
	code: Vec<usize>,
}
impl TokenIndex {
	pub fn new(mut tokens: Vec<Token>) -> Self {
		tokens.sort_by_key(|token| (token.range.start(), token.range.end()));

		let code = tokens
			.iter()
			.enumerate()
			.filter(|(_, token)| !token.is_comment())
			.map(|(idx, _)| idx)
			.collect();

		Self { tokens, code }
	}

	pub fn all(&self) -> &[Token] {
		&self.tokens
	}

	pub fn comments(&self) -> impl Iterator<Item = &Token> {
		self.tokens.iter().filter(|token| token.is_comment())
	}

	/// Last token ending at or before `offset`.
	pub fn before(&self, offset: TextSize, include_comments: bool) -> Option<&Token> {
		if include_comments {
			let idx = self.tokens.partition_point(|token| token.range.end() <= offset);

			return idx.checked_sub(1).map(|idx| &self.tokens[idx]);
		}

		let idx = self.code.partition_point(|idx| self.tokens[*idx].range.end() <= offset);

		idx.checked_sub(1).map(|idx| &self.tokens[self.code[idx]])
	}

	/// First token starting at or after `offset`.
	pub fn after(&self, offset: TextSize, include_comments: bool) -> Option<&Token> {
		if include_comments {
			let idx = self.tokens.partition_point(|token| token.range.start() < offset);

			return self.tokens.get(idx);
		}

		let idx = self.code.partition_point(|idx| self.tokens[*idx].range.start() < offset);

		self.code.get(idx).map(|idx| &self.tokens[*idx])
	}

	/// Tokens lying entirely inside `range`, comments included.
	pub fn within(&self, range: TextRange) -> &[Token] {
		let start = self.tokens.partition_point(|token| token.range.start() < range.start());
		let end = self.tokens.partition_point(|token| token.range.end() <= range.end());

		if end <= start { &[] } else { &self.tokens[start..end] }
	}

	/// Comment tokens lying entirely between `start` and `end`.
	pub fn comments_between(&self, start: TextSize, end: TextSize) -> Vec<&Token> {
		if end < start {
			return Vec::new();
		}

		self.within(TextRange::new(start, end)).iter().filter(|token| token.is_comment()).collect()
	}

	/// First code token inside `range`.
	pub fn first_code_within(&self, range: TextRange) -> Option<&Token> {
		self.after(range.start(), false).filter(|token| token.range.end() <= range.end())
	}

	/// Last code token inside `range`.
	pub fn last_code_within(&self, range: TextRange) -> Option<&Token> {
		self.before(range.end(), false).filter(|token| token.range.start() >= range.start())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn token(kind: TokenKind, start: u32, text: &str) -> Token {
		Token {
			kind,
			range: TextRange::at(start.into(), TextSize::of(text)),
			text: text.to_owned(),
		}
	}

	fn sample() -> TokenIndex {
		// `a /* c */ = b; // t`
		TokenIndex::new(vec![
			token(TokenKind::LineComment, 15, "// t"),
			token(TokenKind::Identifier, 0, "a"),
			token(TokenKind::BlockComment, 2, "/* c */"),
			token(TokenKind::Punctuator, 10, "="),
			token(TokenKind::Identifier, 12, "b"),
			token(TokenKind::Punctuator, 13, ";"),
		])
	}

	#[test]
	fn navigation_skips_comments_on_request() {
		let index = sample();

		assert_eq!(index.before(TextSize::from(10), true).map(|t| t.text.as_str()), Some("/* c */"));
		assert_eq!(index.before(TextSize::from(10), false).map(|t| t.text.as_str()), Some("a"));
		assert_eq!(index.after(TextSize::from(1), true).map(|t| t.text.as_str()), Some("/* c */"));
		assert_eq!(index.after(TextSize::from(1), false).map(|t| t.text.as_str()), Some("="));
	}

	#[test]
	fn navigation_at_file_edges_returns_none() {
		let index = sample();

		assert!(index.before(TextSize::from(0), true).is_none());
		assert!(index.after(TextSize::from(19), true).is_none());
		assert!(index.after(TextSize::from(14), false).is_none());
	}

	#[test]
	fn comment_body_strips_delimiters() {
		let index = sample();
		let bodies = index.comments().filter_map(Token::comment_body).collect::<Vec<_>>();

		assert_eq!(bodies, vec![" c ", " t"]);
	}
}
