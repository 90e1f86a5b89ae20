//! Bluebird collection helpers must bound their concurrency.

use std::{collections::HashSet, num::NonZeroU32};

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
	engine::{Rule, RuleContext, RuleMeta},
	patch::{Edit, Patch},
	report::Fix,
	rules::module_request,
	scope::VariableId,
	source::{NodeId, NodeKind, SyntaxTree},
};

const BLUEBIRD: &str = "bluebird";
const BOUNDED_METHODS: [&str; 2] = ["map", "filter"];

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConcurrencyOptions {
	concurrency: NonZeroU32,
}
impl Default for ConcurrencyOptions {
	fn default() -> Self {
		Self { concurrency: NonZeroU32::MIN }
	}
}

/// Bindings of the library and the candidate calls seen in one file.
#[derive(Debug, Default)]
pub struct BluebirdState {
	bindings: HashSet<VariableId>,
	calls: Vec<NodeId>,
}

/// `Promise.map` and `Promise.filter` from bluebird pass a `concurrency` option.
pub struct BluebirdMapConcurrency;
impl Rule for BluebirdMapConcurrency {
	type Options = ConcurrencyOptions;
	type State = BluebirdState;

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-ASYNC-001",
		name: "bluebird-map-concurrency",
		description: "Bluebird map and filter calls set a concurrency limit.",
		fixable: true,
	};

	fn schema() -> Value {
		json!({
			"type": "object",
			"properties": {
				"concurrency": { "type": "integer", "minimum": 1 }
			},
			"additionalProperties": false
		})
	}

	fn wants(kind: &NodeKind) -> bool {
		matches!(
			kind,
			NodeKind::ImportDeclaration { .. }
				| NodeKind::VariableDeclarator { .. }
				| NodeKind::CallExpression { .. }
		)
	}

	fn check_node(
		cx: &mut RuleContext<'_>,
		_: &Self::Options,
		state: &mut Self::State,
		node: NodeId,
	) {
		let tree = cx.tree();
		let scopes = cx.scopes();

		match tree.kind(node) {
			NodeKind::CallExpression { .. } if bounded_method(tree, node).is_some() => state.calls.push(node),
			NodeKind::ImportDeclaration { specifiers, .. } if imports_bluebird(tree, node) =>
				for specifier in specifiers {
					let (NodeKind::ImportDefaultSpecifier { local }
					| NodeKind::ImportNamespaceSpecifier { local }) = tree.kind(*specifier)
					else {
						continue;
					};

					state.bindings.extend(scopes.binding(*local));
				},
			NodeKind::VariableDeclarator { id, .. } if imports_bluebird(tree, node) =>
				state.bindings.extend(scopes.binding(*id)),
			_ => {},
		}
	}

	fn check_file(cx: &mut RuleContext<'_>, options: &Self::Options, state: &mut Self::State) {
		let tree = cx.tree();
		let scopes = cx.scopes();

		for call in &state.calls {
			let NodeKind::CallExpression { arguments, .. } = tree.kind(*call) else {
				continue;
			};
			let Some((object, method)) = bounded_method(tree, *call) else {
				continue;
			};
			let resolved = scopes.reference_at(object).and_then(|reference| reference.resolved);

			if !resolved.is_some_and(|variable| state.bindings.contains(&variable)) || arguments.len() < 2 {
				continue;
			}

			let concurrency = options.concurrency;
			let edit = match arguments.get(2).map(|argument| (*argument, tree.kind(*argument))) {
				None => Edit::insert(
					tree.range(arguments[1]).end(),
					format!(", {{ concurrency: {concurrency} }}"),
				),
				Some((_, NodeKind::ObjectExpression { properties })) if has_concurrency(tree, properties) =>
					continue,
				Some((_, NodeKind::ObjectExpression { properties })) if !properties.is_empty() =>
					Edit::insert(tree.range(properties[0]).start(), format!("concurrency: {concurrency}, ")),
				Some((literal, NodeKind::ObjectExpression { .. })) =>
					Edit::replace(tree.range(literal), format!("{{ concurrency: {concurrency} }}")),
				// Options built elsewhere cannot be checked here.
				Some(_) => continue,
			};
			let name = tree.identifier_name(object).unwrap_or(BLUEBIRD);

			cx.report_node(
				*call,
				format!("Expected \"{name}.{method}\" to set a \"concurrency\" option."),
				Some(Fix::suggestion(Patch::single(edit), "Limit the concurrency.")),
			);
		}
	}
}

/// Object identifier and method name of `X.map(...)` or `X.filter(...)`.
fn bounded_method(tree: &SyntaxTree, call: NodeId) -> Option<(NodeId, &str)> {
	let NodeKind::CallExpression { callee, .. } = tree.kind(call) else {
		return None;
	};
	let NodeKind::MemberExpression { object, property, computed: false, .. } = tree.kind(*callee) else {
		return None;
	};
	let method = tree.identifier_name(*property)?;

	(tree.identifier_name(*object).is_some() && BOUNDED_METHODS.contains(&method))
		.then_some((*object, method))
}

fn imports_bluebird(tree: &SyntaxTree, node: NodeId) -> bool {
	module_request(tree, node)
		.and_then(|request| tree.string_value(request.literal))
		.is_some_and(|specifier| specifier == BLUEBIRD)
}

fn has_concurrency(tree: &SyntaxTree, properties: &[NodeId]) -> bool {
	properties.iter().any(|property| match tree.kind(*property) {
		NodeKind::Property { key, computed, .. } =>
			tree.static_key_name(*key, *computed).as_deref() == Some("concurrency"),
		_ => false,
	})
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::{
		engine::validate_options,
		testing::{apply, assert_converges, check, messages},
	};

	#[test]
	fn unbounded_calls_get_a_concurrency_option() {
		let text = "const Promise = require('bluebird');\nPromise.map(items, fn);\nPromise.filter(items, fn, { concurrency: 2 });\nPromise.map(items, fn, { other: 1 });\nPromise.map(items, fn, opts);\nPromise.map(items, fn, {});\nlist.map(fn);\n";
		let diagnostics = check::<BluebirdMapConcurrency>("a.js", text, Value::Null);

		assert_eq!(messages(&diagnostics), vec![
			"Expected \"Promise.map\" to set a \"concurrency\" option.";
			3
		]);
		assert!(diagnostics.iter().all(|diagnostic| !diagnostic.is_fixable()));
		assert!(apply(text, &diagnostics[0]).contains("Promise.map(items, fn, { concurrency: 1 });\n"));
		assert!(apply(text, &diagnostics[1]).contains("Promise.map(items, fn, { concurrency: 1, other: 1 });\n"));
		assert!(apply(text, &diagnostics[2]).contains("Promise.map(items, fn, { concurrency: 1 });\nlist"));
	}

	#[test]
	fn imports_and_configured_limits_are_honoured() {
		let text = "import Bluebird from 'bluebird';\nBluebird.filter(a, b);\n";
		let diagnostics = check::<BluebirdMapConcurrency>("a.js", text, json!({ "concurrency": 4 }));

		assert_eq!(
			apply(text, &diagnostics[0]),
			"import Bluebird from 'bluebird';\nBluebird.filter(a, b, { concurrency: 4 });\n"
		);
	}

	#[test]
	fn zero_concurrency_is_rejected() {
		let text = "import B from 'bluebird';\nB.map(a, b);\n";

		assert!(validate_options::<BluebirdMapConcurrency>(&json!({ "concurrency": 0 })).is_err());
		assert!(validate_options::<BluebirdMapConcurrency>(&json!({ "concurrency": 3 })).is_ok());
		assert!(check::<BluebirdMapConcurrency>("a.js", text, json!({ "concurrency": 0 })).is_empty());
	}

	#[test]
	fn other_libraries_and_shadowed_names_are_ignored() {
		let text = "const Q = require('q');\nQ.map(a, b);\nconst Promise = require('bluebird');\nfunction f(Promise) {\n\treturn Promise.map(a, b);\n}\n";

		assert!(check::<BluebirdMapConcurrency>("a.js", text, Value::Null).is_empty());
	}

	#[test]
	fn added_limits_settle() {
		let text = "const Promise = require('bluebird');\nPromise.map(items, fn);\n";

		assert_eq!(
			assert_converges::<BluebirdMapConcurrency>("a.js", text, Value::Null),
			"const Promise = require('bluebird');\nPromise.map(items, fn, { concurrency: 1 });\n"
		);
	}
}
