//! Blank-line layout between statements, inside blocks, and along call chains.

use serde::Deserialize;
use serde_json::{Value, json};
use text_size::{TextRange, TextSize};

use crate::{
	engine::{Rule, RuleContext, RuleMeta},
	patch::{Edit, Patch, collapse_blank_lines, ensure_blank_line, newline},
	report::Fix,
	source::{NodeId, NodeKind, SourceFile, SyntaxTree, Token},
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutOptions {}

fn layout_schema() -> Value {
	json!({ "type": "object", "additionalProperties": false })
}

fn safe_fix(edit: Option<Edit>, description: &str) -> Option<Fix> {
	edit.map(|edit| Fix::safe(Patch::single(edit), description))
}

/// Multi-line block statements and call chains are set apart by blank lines.
pub struct PaddingAroundMultiline;
impl Rule for PaddingAroundMultiline {
	type Options = LayoutOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-SPACE-001",
		name: "padding-around-multiline",
		description: "Multi-line blocks and call chains are surrounded by blank lines.",
		fixable: true,
	};

	fn schema() -> Value {
		layout_schema()
	}

	fn wants(kind: &NodeKind) -> bool {
		kind.statement_list().is_some()
	}

	fn check_node(cx: &mut RuleContext<'_>, _: &Self::Options, _: &mut (), node: NodeId) {
		let source = cx.source();
		let Some(statements) = source.tree().kind(node).statement_list() else {
			return;
		};

		for pair in statements.windows(2) {
			let (prev, next) = (pair[0], pair[1]);

			if !needs_padding(source, prev) && !needs_padding(source, next) {
				continue;
			}

			let prev_end = source.tree().range(prev).end();
			let next_start = source.tree().range(next).start();

			if source.has_blank_line_between(prev_end, next_start) {
				continue;
			}

			let (gap_start, gap_end) = comment_adjusted_gap(source, prev_end, next_start);
			let fix = safe_fix(ensure_blank_line(source, gap_start, gap_end), "Insert a blank line.");

			cx.report_node(
				next,
				"Expected a blank line between a multi-line statement and its neighbour.",
				fix,
			);
		}
	}
}

/// Gap between two statements with a trailing same-line comment kept on the earlier one and
/// leading comments kept with the later one.
fn comment_adjusted_gap(source: &SourceFile, prev_end: TextSize, next_start: TextSize) -> (TextSize, TextSize) {
	let comments = source.tokens().comments_between(prev_end, next_start);
	let prev_line = source.line_of(prev_end);
	let trailing = comments.iter().take_while(|comment| source.line_of(comment.start()) == prev_line).count();
	let gap_start = comments[..trailing].last().map_or(prev_end, |comment| comment.end());
	let gap_end = comments.get(trailing).map_or(next_start, |comment| comment.start());

	(gap_start, gap_end)
}

fn needs_padding(source: &SourceFile, statement: NodeId) -> bool {
	let tree = source.tree();
	let statement = match tree.kind(statement) {
		NodeKind::ExportNamedDeclaration { declaration: Some(declaration), .. }
		| NodeKind::ExportDefaultDeclaration { declaration } => *declaration,
		_ => statement,
	};

	match tree.kind(statement) {
		NodeKind::IfStatement { .. }
		| NodeKind::ForStatement { .. }
		| NodeKind::ForInStatement { .. }
		| NodeKind::ForOfStatement { .. }
		| NodeKind::WhileStatement { .. }
		| NodeKind::DoWhileStatement { .. }
		| NodeKind::TryStatement { .. }
		| NodeKind::SwitchStatement { .. }
		| NodeKind::BlockStatement { .. }
		| NodeKind::FunctionDeclaration(_)
		| NodeKind::ClassDeclaration(_) => is_multiline(source, statement),
		NodeKind::ExpressionStatement { expression, .. } => is_multiline_chain(source, *expression),
		NodeKind::VariableDeclaration { declarations, .. } => declarations.iter().any(|declarator| {
			matches!(
				tree.kind(*declarator),
				NodeKind::VariableDeclarator { init: Some(init), .. } if is_multiline_chain(source, *init)
			)
		}),
		_ => false,
	}
}

fn is_multiline(source: &SourceFile, node: NodeId) -> bool {
	let range = source.tree().range(node);

	source.line_of(range.start()) != source.line_of(range.end())
		|| source.tokens_in(range).iter().any(Token::is_comment)
}

/// Whether `expression` is a call chain with at least two calls spread over several lines.
fn is_multiline_chain(source: &SourceFile, expression: NodeId) -> bool {
	call_links(source.tree(), expression) >= 2 && is_multiline(source, expression)
}

fn call_links(tree: &SyntaxTree, expression: NodeId) -> usize {
	let mut current = expression;
	let mut calls = 0;

	loop {
		current = match tree.kind(current) {
			NodeKind::AwaitExpression { argument } => *argument,
			NodeKind::ChainExpression { expression } => *expression,
			NodeKind::CallExpression { callee, .. } => {
				calls += 1;

				*callee
			},
			NodeKind::MemberExpression { object, .. } => *object,
			_ => return calls,
		};
	}
}

/// Blocks neither start nor end with a blank line, except after a multi-line parameter list.
pub struct BlockPadding;
impl Rule for BlockPadding {
	type Options = LayoutOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-SPACE-002",
		name: "block-padding",
		description: "Blocks do not start or end with blank lines.",
		fixable: true,
	};

	fn schema() -> Value {
		layout_schema()
	}

	fn wants(kind: &NodeKind) -> bool {
		matches!(
			kind,
			NodeKind::BlockStatement { .. } | NodeKind::ClassBody { .. } | NodeKind::StaticBlock { .. }
		)
	}

	fn check_node(cx: &mut RuleContext<'_>, _: &Self::Options, _: &mut (), node: NodeId) {
		let source = cx.source();
		let tokens = source.tokens();
		let range = source.tree().range(node);
		let Some(open) = source.tokens_in(range).iter().find(|token| token.is_punctuator("{")) else {
			return;
		};
		let Some(close) = source.last_token(node).filter(|token| token.is_punctuator("}")) else {
			return;
		};
		let (Some(first), Some(last)) =
			(tokens.after(open.end(), true), tokens.before(close.start(), true))
		else {
			return;
		};

		if first.start() >= close.start() {
			return;
		}

		if has_multiline_params(source, node) {
			let open_line = source.line_of(open.end());
			let first_line = source.line_of(first.start());
			let blank_lines = first_line.saturating_sub(open_line + 1);

			if blank_lines != 1 {
				let fix = match (blank_lines, source.line_end(open_line), source.line_start(first_line)) {
					(0, ..) => ensure_blank_line(source, open.end(), first.start()),
					(_, Some(start), Some(end)) => {
						let newline = newline(source);

						Some(Edit::replace(TextRange::new(start, end), format!("{newline}{newline}")))
					},
					_ => None,
				};

				cx.report(
					TextRange::new(open.start(), first.start()),
					"Expected exactly one blank line after a multi-line parameter list.",
					safe_fix(fix, "Keep one blank line."),
				);
			}
		} else if source.has_blank_line_between(open.end(), first.start()) {
			cx.report(
				TextRange::new(open.start(), first.start()),
				"Block must not start with a blank line.",
				safe_fix(collapse_blank_lines(source, open.end(), first.start()), "Remove the blank line."),
			);
		}

		if source.has_blank_line_between(last.end(), close.start()) {
			cx.report(
				TextRange::new(last.end(), close.end()),
				"Block must not end with a blank line.",
				safe_fix(collapse_blank_lines(source, last.end(), close.start()), "Remove the blank line."),
			);
		}
	}
}

/// Whether `body` belongs to a function whose parameter parentheses sit on different lines.
fn has_multiline_params(source: &SourceFile, body: NodeId) -> bool {
	let tree = source.tree();
	let Some(function) = tree.parent(body) else {
		return false;
	};

	if tree.kind(function).function().is_none_or(|function| function.body != body) {
		return false;
	}

	let head = TextRange::new(tree.range(function).start(), tree.range(body).start());
	let tokens = source.tokens_in(head);
	let open = tokens.iter().find(|token| token.is_punctuator("("));
	let close = tokens.iter().rev().find(|token| token.is_punctuator(")"));

	match (open, close) {
		(Some(open), Some(close)) => source.line_of(open.start()) != source.line_of(close.start()),
		_ => false,
	}
}

/// Links of a call chain are not separated by blank lines.
pub struct NoBlankLinesInChain;
impl Rule for NoBlankLinesInChain {
	type Options = LayoutOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-SPACE-003",
		name: "no-blank-lines-in-chain",
		description: "Call chains have no blank lines between their links.",
		fixable: true,
	};

	fn schema() -> Value {
		layout_schema()
	}

	fn wants(kind: &NodeKind) -> bool {
		matches!(kind, NodeKind::MemberExpression { computed: false, .. })
	}

	fn check_node(cx: &mut RuleContext<'_>, _: &Self::Options, _: &mut (), node: NodeId) {
		let source = cx.source();
		let tokens = source.tokens();
		let NodeKind::MemberExpression { property, .. } = source.tree().kind(node) else {
			return;
		};
		let Some(dot) = tokens
			.before(source.tree().range(*property).start(), false)
			.filter(|token| token.is_punctuator(".") || token.is_punctuator("?."))
		else {
			return;
		};
		let Some(prev) = tokens.before(dot.start(), false) else {
			return;
		};

		if !source.has_blank_line_between(prev.end(), dot.start()) {
			return;
		}

		cx.report(
			dot.range,
			"Unexpected blank line in a call chain.",
			safe_fix(collapse_blank_lines(source, prev.end(), dot.start()), "Remove the blank line."),
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{apply, assert_converges, check, messages};

	#[test]
	fn multiline_blocks_are_padded() {
		let text = "const a = 1;\nif (a) {\n\tb();\n}\nconst c = 2;\n";
		let diagnostics = check::<PaddingAroundMultiline>("a.js", text, Value::Null);

		assert_eq!(diagnostics.len(), 2);
		assert_eq!((diagnostics[0].line, diagnostics[1].line), (2, 5));
		assert_eq!(apply(text, &diagnostics[0]), "const a = 1;\n\nif (a) {\n\tb();\n}\nconst c = 2;\n");
		assert_eq!(apply(text, &diagnostics[1]), "const a = 1;\nif (a) {\n\tb();\n}\n\nconst c = 2;\n");
	}

	#[test]
	fn shared_lines_and_leading_comments_are_split() {
		let shared = "\tfoo(); if (a) {\n\tb();\n}\n";
		let diagnostics = check::<PaddingAroundMultiline>("a.js", shared, Value::Null);

		assert_eq!(apply(shared, &diagnostics[0]), "\tfoo();\n\n\tif (a) {\n\tb();\n}\n");

		let commented = "a(); // first\n// explain\nif (x) {\n\ty();\n}\n";
		let diagnostics = check::<PaddingAroundMultiline>("a.js", commented, Value::Null);

		assert_eq!(
			apply(commented, &diagnostics[0]),
			"a(); // first\n\n// explain\nif (x) {\n\ty();\n}\n"
		);
	}

	#[test]
	fn call_chains_count_as_multiline() {
		let text = "const x = 1;\npromise\n\t.then(a)\n\t.catch(b);\ndone();\none().two();\n";
		let diagnostics = check::<PaddingAroundMultiline>("a.js", text, Value::Null);

		assert_eq!(messages(&diagnostics).len(), 2);
		assert!(
			check::<PaddingAroundMultiline>("a.js", "a();\nif (b) { c(); }\nd();\n", Value::Null)
				.is_empty()
		);
	}

	#[test]
	fn blocks_do_not_start_or_end_with_blank_lines() {
		let text = "function f() {\n\n\ta();\n\n}\n";
		let diagnostics = check::<BlockPadding>("a.js", text, Value::Null);

		assert_eq!(messages(&diagnostics), vec![
			"Block must not start with a blank line.",
			"Block must not end with a blank line."
		]);
		assert_eq!(apply(text, &diagnostics[0]), "function f() {\n\ta();\n\n}\n");
		assert_eq!(apply(text, &diagnostics[1]), "function f() {\n\n\ta();\n}\n");

		let class = "class A {\n\n\tm() {}\n}\n";

		assert_eq!(check::<BlockPadding>("a.js", class, Value::Null).len(), 1);
	}

	#[test]
	fn multiline_parameters_need_one_blank_line() {
		let missing = "function f(\n\ta,\n\tb\n) {\n\treturn a;\n}\n";
		let diagnostics = check::<BlockPadding>("a.js", missing, Value::Null);

		assert_eq!(apply(missing, &diagnostics[0]), "function f(\n\ta,\n\tb\n) {\n\n\treturn a;\n}\n");

		let doubled = "function f(\n\ta\n) {\n\n\n\treturn a;\n}\n";
		let diagnostics = check::<BlockPadding>("a.js", doubled, Value::Null);

		assert_eq!(apply(doubled, &diagnostics[0]), "function f(\n\ta\n) {\n\n\treturn a;\n}\n");

		let padded = "function f(\n\ta\n) {\n\n\treturn a;\n}\n";

		assert!(check::<BlockPadding>("a.js", padded, Value::Null).is_empty());
	}

	#[test]
	fn chains_have_no_blank_links() {
		let text = "promise\n\t.then(a)\n\n\t.catch(b);\n";
		let diagnostics = check::<NoBlankLinesInChain>("a.js", text, Value::Null);

		assert_eq!(messages(&diagnostics), vec!["Unexpected blank line in a call chain."]);
		assert_eq!(apply(text, &diagnostics[0]), "promise\n\t.then(a)\n\t.catch(b);\n");

		let commented = "a\n\n\t// why\n\t.b();\n";
		let diagnostics = check::<NoBlankLinesInChain>("a.js", commented, Value::Null);

		assert_eq!(diagnostics.len(), 1);
		assert!(diagnostics[0].fix.is_none());
	}

	#[test]
	fn spacing_fixes_settle() {
		assert_eq!(
			assert_converges::<PaddingAroundMultiline>(
				"a.js",
				"const a = 1;\nif (a) {\n\tb();\n}\nconst c = 2;\n",
				Value::Null
			),
			"const a = 1;\n\nif (a) {\n\tb();\n}\n\nconst c = 2;\n"
		);
		assert_eq!(
			assert_converges::<BlockPadding>("a.js", "function f() {\n\n\ta();\n\n}\n", Value::Null),
			"function f() {\n\ta();\n}\n"
		);
		assert_eq!(
			assert_converges::<NoBlankLinesInChain>(
				"a.js",
				"promise\n\t.then(a)\n\n\t.catch(b)\n\n\t.finally(c);\n",
				Value::Null
			),
			"promise\n\t.then(a)\n\t.catch(b)\n\t.finally(c);\n"
		);
	}
}
