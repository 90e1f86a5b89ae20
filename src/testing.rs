//! Test fixtures parsed by oxc.
//!
//! Oxc's ESTree serializer gives the tree. The token and comment lists an espree parse would
//! carry are rebuilt around it, and byte offsets become UTF-16 ones. The resulting document
//! then goes through the same loader the host uses for sidecar ASTs.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
	engine::{Environment, FileContext, Rule, evaluate},
	fixes::apply_fixes,
	fs::MemoryFileSystem,
	host::MAX_FIX_PASSES,
	report::{Diagnostic, FixKind},
	source::{NodeId, load_program},
};

/// Punctuators and keywords between the tokens the tree pins down.
static CODE_TOKEN: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r"[\p{L}_$][\p{L}\p{N}_$]*|>>>=|\.\.\.|===|!==|\*\*=|<<=|>>=|>>>|&&=|\|\|=|\?\?=|=>|==|!=|<=|>=|&&|\|\||\?\?|\?\.|\+\+|--|[-+*/%&|^]=|\*\*|<<|>>|[^\s\w]",
	)
	.expect("Expected operation to succeed.")
});

/// Parses `text` and builds its file context.
pub(crate) fn parse(path: &str, text: &str) -> FileContext {
	let document = estree_document(path, text);
	let source = load_program(path, text.to_owned(), &document)
		.unwrap_or_else(|err| panic!("fixture `{path}` does not load: {err}"));

	FileContext::new(source)
}

/// ESTree JSON for `text` shaped like an espree parse with `range`, `tokens`, and `comment` on.
pub(crate) fn estree_document(path: &str, text: &str) -> String {
	let allocator = Allocator::default();
	let source_type =
		SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs()).with_module(true);
	let options = ParseOptions {
		allow_return_outside_function: true,
		preserve_parens: false,
		..ParseOptions::default()
	};
	let parsed = Parser::new(&allocator, text, source_type).with_options(options).parse();

	assert!(!parsed.panicked, "fixture `{path}` does not parse: {:?}", parsed.errors);

	let json = program_json(&parsed.program, source_type.is_typescript());
	let mut deserializer = serde_json::Deserializer::from_str(&json);

	deserializer.disable_recursion_limit();

	let mut document = Value::deserialize(&mut deserializer).expect("oxc emits valid JSON");
	let mut comments = parsed
		.program
		.comments
		.iter()
		.map(|comment| {
			let kind = if comment.is_line() { "Line" } else { "Block" };

			(kind, comment.span.start as usize, comment.span.end as usize)
		})
		.collect::<Vec<_>>();

	if let Some(hashbang) = &parsed.program.hashbang {
		comments.push(("Shebang", hashbang.span.start as usize, hashbang.span.end as usize));
	}

	let tokens = code_tokens(text, &tree_tokens(&document), &comments);
	let comments = comments
		.iter()
		.map(|(kind, start, end)| {
			let close = if *kind == "Block" { 2 } else { 0 };
			let value = text.get(start + 2..end.saturating_sub(close)).unwrap_or_default();

			json!({ "type": kind, "value": value, "range": [start, end] })
		})
		.collect::<Vec<_>>();

	if let Value::Object(program) = &mut document {
		program.insert("tokens".into(), Value::Array(tokens));
		program.insert("comments".into(), Value::Array(comments));
	}

	count_utf16(&mut document, text);

	document.to_string()
}

fn program_json(program: &Program<'_>, typescript: bool) -> String {
	if typescript { program.to_estree_ts_json(true) } else { program.to_estree_js_json(true) }
}

/// Tokens whose extent the tree fixes: names, literals, template pieces, and JSX text.
fn tree_tokens(document: &Value) -> BTreeMap<usize, (usize, &'static str)> {
	let mut spans = BTreeMap::new();
	let mut stack = vec![document];

	while let Some(value) = stack.pop() {
		let object = match value {
			Value::Object(object) => object,
			Value::Array(items) => {
				stack.extend(items);

				continue;
			},
			_ => continue,
		};

		stack.extend(object.values());

		let (Some(start), Some(end)) = (offset(object, "start"), offset(object, "end")) else {
			continue;
		};
		let kind = match object.get("type").and_then(Value::as_str).unwrap_or_default() {
			"Identifier" => {
				// Type annotations widen the node past its name.
				let len = object.get("name").and_then(Value::as_str).map_or(end - start, str::len);

				(start + len, "Identifier")
			},
			"PrivateIdentifier" => (end, "PrivateIdentifier"),
			"JSXIdentifier" => (end, "JSXIdentifier"),
			"JSXText" => (end, "JSXText"),
			"Literal" => (end, literal_kind(object)),
			"TemplateLiteral" => {
				for (piece_start, piece_end) in template_pieces(object, start, end) {
					spans.insert(piece_start, (piece_end, "Template"));
				}

				continue;
			},
			_ => continue,
		};

		spans.insert(start, kind);
	}

	spans
}

fn literal_kind(object: &Map<String, Value>) -> &'static str {
	if object.contains_key("regex") {
		return "RegularExpression";
	}
	if object.contains_key("bigint") {
		return "Numeric";
	}

	match object.get("value") {
		Some(Value::String(_)) => "String",
		Some(Value::Number(_)) => "Numeric",
		Some(Value::Bool(_)) => "Boolean",
		_ => "Null",
	}
}

/// Spans of `` `a${ `` , `` }b${ `` and `` }c` `` around the template's expressions.
fn template_pieces(object: &Map<String, Value>, start: usize, end: usize) -> Vec<(usize, usize)> {
	let expressions = object
		.get("expressions")
		.and_then(Value::as_array)
		.into_iter()
		.flatten()
		.filter_map(|expression| {
			let expression = expression.as_object()?;

			offset(expression, "start").zip(offset(expression, "end"))
		});
	let mut pieces = Vec::new();
	let mut cursor = start;

	for (expression_start, expression_end) in expressions {
		pieces.push((cursor, expression_start));
		cursor = expression_end;
	}

	pieces.push((cursor, end));

	pieces
}

/// Token list in source order. Gaps between tree tokens and comments are split into
/// punctuators and keywords.
fn code_tokens(
	text: &str,
	spans: &BTreeMap<usize, (usize, &'static str)>,
	comments: &[(&str, usize, usize)],
) -> Vec<Value> {
	let mut ordered = spans
		.iter()
		.map(|(start, (end, kind))| (*start, *end, Some(*kind)))
		.chain(comments.iter().map(|(_, start, end)| (*start, *end, None)))
		.collect::<Vec<_>>();
	let mut tokens = Vec::new();
	let mut cursor = 0;

	ordered.sort_unstable();
	ordered.push((text.len(), text.len(), None));

	for (start, end, kind) in ordered {
		if start < cursor {
			continue;
		}

		for found in CODE_TOKEN.find_iter(&text[cursor..start]) {
			let word = found.as_str().starts_with(|ch: char| ch.is_alphabetic() || ch == '_' || ch == '$');
			let kind = if word { "Keyword" } else { "Punctuator" };

			tokens.push(token(text, kind, cursor + found.start(), cursor + found.end()));
		}

		if let Some(kind) = kind {
			tokens.push(token(text, kind, start, end));
		}

		cursor = end;
	}

	tokens
}

fn token(text: &str, kind: &str, start: usize, end: usize) -> Value {
	json!({ "type": kind, "value": &text[start..end], "range": [start, end] })
}

fn offset(object: &Map<String, Value>, key: &str) -> Option<usize> {
	object.get(key).and_then(Value::as_u64).and_then(|offset| usize::try_from(offset).ok())
}

/// Rewrites every byte offset in `document` as a UTF-16 offset.
fn count_utf16(document: &mut Value, text: &str) {
	if text.is_ascii() {
		return;
	}

	let mut units = vec![0_u64; text.len() + 1];
	let mut unit = 0;

	for (idx, ch) in text.char_indices() {
		units[idx] = unit;
		unit += ch.len_utf16() as u64;
	}

	units[text.len()] = unit;

	let convert = |offset: &mut Value| {
		if let Some(byte) = offset.as_u64()
			&& let Some(unit) = usize::try_from(byte).ok().and_then(|byte| units.get(byte))
		{
			*offset = Value::from(*unit);
		}
	};
	let mut stack = vec![document];

	while let Some(value) = stack.pop() {
		match value {
			Value::Object(object) =>
				for (key, child) in object.iter_mut() {
					match (key.as_str(), child) {
						("start" | "end", offset) if offset.is_u64() => convert(offset),
						("range", Value::Array(pair)) => pair.iter_mut().for_each(convert),
						(_, child) => stack.push(child),
					}
				},
			Value::Array(items) => stack.extend(items.iter_mut()),
			_ => {},
		}
	}
}

/// In-memory environment holding `files` as `(path, contents)` pairs.
pub(crate) fn environment(files: &[(&str, &str)]) -> Environment {
	let mut fs = MemoryFileSystem::default();

	for (path, contents) in files {
		fs.add_file(path, contents);
	}

	Environment::new(fs)
}

/// Runs rule `R` over `text` with `options` in an empty environment.
pub(crate) fn check<R: Rule>(path: &str, text: &str, options: Value) -> Vec<Diagnostic> {
	check_in::<R>(&environment(&[]), path, text, options)
}

pub(crate) fn check_in<R: Rule>(
	env: &Environment,
	path: &str,
	text: &str,
	options: Value,
) -> Vec<Diagnostic> {
	let file = parse(path, text);
	let options = if options.is_null() { None } else { Some(&options) };

	evaluate::<R>(&file, env, options)
}

/// Applies every fix `R` offers, suggestions included, until none is left, and returns the
/// settled text. Panics if fixing does not settle within the host's pass limit.
pub(crate) fn assert_converges<R: Rule>(path: &str, text: &str, options: Value) -> String {
	assert_converges_in::<R>(&environment(&[]), path, text, options)
}

pub(crate) fn assert_converges_in<R: Rule>(
	env: &Environment,
	path: &str,
	text: &str,
	options: Value,
) -> String {
	let name = R::META.name;
	let mut text = text.to_owned();

	for _ in 0..MAX_FIX_PASSES {
		let mut diagnostics = check_in::<R>(env, path, &text, options.clone());

		if diagnostics.iter().all(|diagnostic| diagnostic.fix.is_none()) {
			return text;
		}

		for fix in diagnostics.iter_mut().filter_map(|diagnostic| diagnostic.fix.as_mut()) {
			fix.kind = FixKind::Safe;
		}

		let outcome = apply_fixes(&text, &diagnostics)
			.unwrap_or_else(|err| panic!("{name} fixes do not apply to {text:?}: {err}"));

		assert!(outcome.applied() > 0, "{name} offers fixes that never apply to {text:?}");

		text = outcome.text;
	}

	panic!("{name} fixes do not settle within {MAX_FIX_PASSES} passes, ending with {text:?}");
}

/// Applies the fix of `diagnostic` to `text`.
pub(crate) fn apply(text: &str, diagnostic: &Diagnostic) -> String {
	let fix = diagnostic.fix.as_ref().expect("diagnostic carries a fix");

	fix.patch.apply(text).expect("patch applies")
}

pub(crate) fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
	diagnostics.iter().map(|diagnostic| diagnostic.message.as_str()).collect()
}

/// First node of the given ESTree type whose text is `text`.
pub(crate) fn find(file: &FileContext, type_name: &str, text: &str) -> NodeId {
	let tree = file.source.tree();

	tree.preorder()
		.find(|id| tree.kind(*id).type_name() == type_name && file.source.node_text(*id) == text)
		.unwrap_or_else(|| panic!("no {type_name} node with text `{text}`"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::source::{NodeKind, TokenKind};

	#[test]
	fn fixtures_carry_espree_tokens_and_comments() {
		let file = parse("a.js", "// lead\nconst a = `x${b}y`; /* tail */\n");
		let tokens = file.source.tokens();
		let code = tokens
			.all()
			.iter()
			.filter(|token| !token.is_comment())
			.map(|token| token.text.as_str())
			.collect::<Vec<_>>();
		let comments = tokens.comments().map(|token| token.kind).collect::<Vec<_>>();

		assert_eq!(code, vec!["const", "a", "=", "`x${", "b", "}y`", ";"]);
		assert_eq!(comments, vec![TokenKind::LineComment, TokenKind::BlockComment]);
		assert_eq!(tokens.all()[2].kind, TokenKind::Identifier);
		assert_eq!(tokens.all()[4].kind, TokenKind::Template);
	}

	#[test]
	fn offsets_count_utf16_units() {
		let text = "const s = 'é😀';\nf(s);\n";
		let file = parse("a.js", text);
		let call = find(&file, "CallExpression", "f(s)");

		assert!(matches!(file.source.tree().kind(call), NodeKind::CallExpression { .. }));
		assert_eq!(u32::from(file.source.tree().range(call).start()), 20);
	}
}
