//! Names derived from module paths and file names.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
	casing::{Case, Casing},
	engine::{Rule, RuleContext, RuleMeta},
	patch::{is_valid_identifier, rename_variable},
	report::Fix,
	rules::{WholeMatch, is_relative, module_base_name, module_request, resolve_specifier, substitute},
	scope::BindingKind,
	source::{NodeId, NodeKind},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultImportCase {
	Camel,
	Pascal,
	/// Camel or pascal; camel is suggested.
	#[default]
	Any,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameMapping {
	pattern: WholeMatch,
	name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportNameOptions {
	default: DefaultImportCase,
	mapping: Vec<NameMapping>,
	acronyms: Casing,
}

/// Default and namespace imports are named after the module they import.
pub struct ImportNameFromPath;
impl Rule for ImportNameFromPath {
	type Options = ImportNameOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-NAME-001",
		name: "import-name-from-path",
		description: "Default and namespace imports are named after the imported module.",
		fixable: true,
	};

	fn schema() -> Value {
		json!({
			"type": "object",
			"properties": {
				"default": { "enum": ["camel", "pascal", "any"] },
				"mapping": {
					"type": "array",
					"items": {
						"type": "object",
						"properties": {
							"pattern": { "type": "string" },
							"name": { "type": "string" }
						},
						"required": ["pattern", "name"],
						"additionalProperties": false
					}
				},
				"acronyms": { "type": "array", "items": { "type": "string" } }
			},
			"additionalProperties": false
		})
	}

	fn wants(kind: &NodeKind) -> bool {
		matches!(kind, NodeKind::ImportDeclaration { .. } | NodeKind::VariableDeclarator { .. })
	}

	fn check_node(cx: &mut RuleContext<'_>, options: &Self::Options, _: &mut (), node: NodeId) {
		let tree = cx.tree();
		let Some(request) = module_request(tree, node) else {
			return;
		};
		let Some(specifier) = tree.string_value(request.literal) else {
			return;
		};

		for (local, namespace) in default_bindings(cx, node) {
			let Some(actual) = tree.identifier_name(local) else {
				continue;
			};
			let Some(expected) = expected_import_name(cx, options, specifier, namespace, actual)
			else {
				continue;
			};

			if actual == expected || !is_valid_identifier(&expected) {
				continue;
			}

			let fix = cx
				.scopes()
				.binding(local)
				.and_then(|variable| rename_variable(cx.file, variable, &expected))
				.map(|patch| Fix::safe(patch, format!("Rename \"{actual}\" to \"{expected}\".")));

			cx.report_node(
				local,
				format!("Expected \"{actual}\" to be named \"{expected}\" after \"{specifier}\"."),
				fix,
			);
		}
	}
}

/// Local default/namespace bindings of an import or `const x = require(...)`, flagged when
/// they are namespaces.
fn default_bindings(cx: &RuleContext<'_>, node: NodeId) -> Vec<(NodeId, bool)> {
	let tree = cx.tree();

	match tree.kind(node) {
		NodeKind::ImportDeclaration { specifiers, .. } => specifiers
			.iter()
			.filter_map(|specifier| match tree.kind(*specifier) {
				NodeKind::ImportDefaultSpecifier { local } => Some((*local, false)),
				NodeKind::ImportNamespaceSpecifier { local } => Some((*local, true)),
				_ => None,
			})
			.collect(),
		NodeKind::VariableDeclarator { id, .. } if tree.identifier_name(*id).is_some() =>
			vec![(*id, false)],
		_ => Vec::new(),
	}
}

fn expected_import_name(
	cx: &RuleContext<'_>,
	options: &ImportNameOptions,
	specifier: &str,
	namespace: bool,
	actual: &str,
) -> Option<String> {
	for mapping in &options.mapping {
		if let Some(captures) = mapping.pattern.captures(specifier) {
			return Some(substitute(&mapping.name, &captures));
		}
	}

	if !is_relative(specifier) {
		return None;
	}

	let base = module_base_name(&resolve_specifier(cx.source(), specifier))?;
	let casing = &options.acronyms;

	if namespace {
		return Some(casing.convert(&base, Case::Pascal));
	}

	let camel = casing.convert(&base, Case::Camel);
	let pascal = casing.convert(&base, Case::Pascal);
	let expected = match options.default {
		DefaultImportCase::Camel => camel,
		DefaultImportCase::Pascal => pascal,
		DefaultImportCase::Any if actual == pascal => pascal,
		DefaultImportCase::Any => camel,
	};

	Some(expected)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportNameOptions {
	acronyms: Casing,
}

/// A named default export carries the name of its file.
pub struct ExportNameFromFile;
impl Rule for ExportNameFromFile {
	type Options = ExportNameOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-NAME-002",
		name: "export-name-from-file",
		description: "Named default exports match the file name.",
		fixable: true,
	};

	fn schema() -> Value {
		json!({
			"type": "object",
			"properties": {
				"acronyms": { "type": "array", "items": { "type": "string" } }
			},
			"additionalProperties": false
		})
	}

	fn wants(kind: &NodeKind) -> bool {
		matches!(kind, NodeKind::ExportDefaultDeclaration { .. })
	}

	fn check_node(cx: &mut RuleContext<'_>, options: &Self::Options, _: &mut (), node: NodeId) {
		let tree = cx.tree();
		let scopes = cx.scopes();
		let NodeKind::ExportDefaultDeclaration { declaration } = tree.kind(node) else {
			return;
		};
		let (identifier, variable, case) = match tree.kind(*declaration) {
			kind @ (NodeKind::FunctionDeclaration(_) | NodeKind::FunctionExpression(_)) => {
				let Some(id) = kind.function().and_then(|function| function.id) else {
					return;
				};

				(id, scopes.binding(id), Case::Camel)
			},
			kind @ (NodeKind::ClassDeclaration(_) | NodeKind::ClassExpression(_)) => {
				let Some(id) = kind.class().and_then(|class| class.id) else {
					return;
				};

				(id, scopes.binding(id), Case::Pascal)
			},
			NodeKind::Identifier { .. } => {
				let Some(variable) = scopes.reference_at(*declaration).and_then(|reference| reference.resolved)
				else {
					return;
				};
				let case = match scopes.variable(variable).kind {
					BindingKind::Import => return,
					BindingKind::Class => Case::Pascal,
					_ => Case::Camel,
				};

				(*declaration, Some(variable), case)
			},
			_ => return,
		};
		let Some(actual) = tree.identifier_name(identifier) else {
			return;
		};
		let Some(base) = module_base_name(cx.source().path()) else {
			return;
		};
		let expected = options.acronyms.convert(&base, case);

		if actual == expected || !is_valid_identifier(&expected) {
			return;
		}

		let fix = variable
			.and_then(|variable| rename_variable(cx.file, variable, &expected))
			.map(|patch| Fix::safe(patch, format!("Rename \"{actual}\" to \"{expected}\".")));

		cx.report_node(
			identifier,
			format!("Expected the default export \"{actual}\" to be named \"{expected}\" after its file."),
			fix,
		);
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::testing::{apply, assert_converges, check, messages};

	#[test]
	fn namespace_imports_use_pascal_case_with_acronyms() {
		let text = "import * as ApiClient from './api-client';\nApiClient.get();\n";
		let diagnostics = check::<ImportNameFromPath>("src/main.js", text, Value::Null);

		assert_eq!(messages(&diagnostics), vec![
			"Expected \"ApiClient\" to be named \"APIClient\" after \"./api-client\"."
		]);
		assert_eq!(
			apply(text, &diagnostics[0]),
			"import * as APIClient from './api-client';\nAPIClient.get();\n"
		);
	}

	#[test]
	fn index_modules_and_dot_paths_use_directory_names() {
		let text = "import * as X from '../api-client/index';\nimport here from '.';\n";
		let diagnostics = check::<ImportNameFromPath>("src/app/main.js", text, Value::Null);

		assert_eq!(messages(&diagnostics), vec![
			"Expected \"X\" to be named \"APIClient\" after \"../api-client/index\".",
			"Expected \"here\" to be named \"app\" after \".\"."
		]);
	}

	#[test]
	fn default_imports_follow_the_configured_case() {
		let text = "import Widget from './widget';\nimport widget2 from './widget';\n";
		let any = check::<ImportNameFromPath>("src/main.js", text, Value::Null);
		let camel = check::<ImportNameFromPath>("src/main.js", text, json!({ "default": "camel" }));

		assert_eq!(messages(&any), vec![
			"Expected \"widget2\" to be named \"widget\" after \"./widget\"."
		]);
		assert_eq!(camel.len(), 2);
	}

	#[test]
	fn requires_and_mappings_are_checked() {
		let text = "const m = require('lodash/map');\nconst wdg = require('./widget');\nm(wdg);\n";
		let options = json!({ "mapping": [{ "pattern": "lodash/(\\w+)", "name": "$1" }] });
		let diagnostics = check::<ImportNameFromPath>("src/main.js", text, options);

		assert_eq!(diagnostics.len(), 2);
		assert_eq!(
			apply(text, &diagnostics[1]),
			"const m = require('lodash/map');\nconst widget = require('./widget');\nm(widget);\n"
		);
	}

	#[test]
	fn colliding_rename_is_reported_without_a_fix() {
		let text = "import wdg from './widget';\nconst widget = wdg;\n";
		let diagnostics = check::<ImportNameFromPath>("src/main.js", text, Value::Null);

		assert_eq!(diagnostics.len(), 1);
		assert!(diagnostics[0].fix.is_none());
	}

	#[test]
	fn bare_imports_without_mapping_are_ignored() {
		assert!(check::<ImportNameFromPath>("src/main.js", "import _ from 'lodash';\n", Value::Null).is_empty());
	}

	#[test]
	fn default_exports_match_the_file_name() {
		let class = "export default class Foo {}\n";
		let diagnostics = check::<ExportNameFromFile>("src/user-service.js", class, Value::Null);

		assert_eq!(messages(&diagnostics), vec![
			"Expected the default export \"Foo\" to be named \"UserService\" after its file."
		]);
		assert_eq!(apply(class, &diagnostics[0]), "export default class UserService {}\n");

		let identifier = "function foo() {}\nexport default foo;\n";
		let diagnostics = check::<ExportNameFromFile>("src/make-thing.js", identifier, Value::Null);

		assert_eq!(
			apply(identifier, &diagnostics[0]),
			"function makeThing() {}\nexport default makeThing;\n"
		);
	}

	#[test]
	fn index_files_and_imported_defaults_are_accepted() {
		let index = "export default function widget() {}\n";
		let imported = "import foo from './foo';\nexport default foo;\n";

		assert!(check::<ExportNameFromFile>("src/widget/index.js", index, Value::Null).is_empty());
		assert!(check::<ExportNameFromFile>("src/other.js", imported, Value::Null).is_empty());
	}

	#[test]
	fn renames_settle_after_one_pass() {
		let namespace = "import * as ApiClient from './api-client';\nApiClient.get();\n";
		let export = "function foo() {}\nexport default foo;\n";

		assert_eq!(
			assert_converges::<ImportNameFromPath>("src/main.js", namespace, Value::Null),
			"import * as APIClient from './api-client';\nAPIClient.get();\n"
		);
		assert_eq!(
			assert_converges::<ExportNameFromFile>("src/make-thing.js", export, Value::Null),
			"function makeThing() {}\nexport default makeThing;\n"
		);
	}
}
