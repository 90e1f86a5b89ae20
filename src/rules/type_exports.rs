//! Imports checked against the package's type declarations.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
	engine::{Rule, RuleContext, RuleMeta},
	patch::{Edit, Patch},
	report::Fix,
	rules::file_directory,
	source::{NodeId, NodeKind},
	typedefs::split_package,
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportTypeExportsOptions {}

/// Default and named imports of bare packages must exist in the package's declaration file.
pub struct ImportTypeExports;
impl Rule for ImportTypeExports {
	type Options = ImportTypeExportsOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-IMPORT-002",
		name: "import-type-exports",
		description: "Imports of packages match the exports of their type declarations.",
		fixable: true,
	};

	fn schema() -> Value {
		json!({ "type": "object", "additionalProperties": false })
	}

	fn wants(kind: &NodeKind) -> bool {
		matches!(kind, NodeKind::ImportDeclaration { .. })
	}

	fn check_node(cx: &mut RuleContext<'_>, _: &Self::Options, _: &mut (), node: NodeId) {
		let tree = cx.tree();
		let NodeKind::ImportDeclaration { specifiers, source } = tree.kind(node) else {
			return;
		};
		let Some(specifier) = tree.string_value(*source) else {
			return;
		};

		if specifiers.is_empty() || split_package(specifier).is_none() {
			return;
		}

		let directory = file_directory(cx.source());
		let Some(definition) = cx.env.typedefs().lookup(cx.env.fs(), specifier, &directory) else {
			return;
		};

		for id in specifiers {
			match tree.kind(*id) {
				NodeKind::ImportDefaultSpecifier { local }
					if !definition.has_default && !definition.export_equals =>
				{
					// Only a lone default specifier can turn into `* as name`.
					let fix = match tree.identifier_name(*local) {
						Some(name) if specifiers.len() == 1 => Some(Fix::suggestion(
							Patch::single(Edit::replace(tree.range(*id), format!("* as {name}"))),
							format!("Import \"{specifier}\" as a namespace."),
						)),
						_ => None,
					};

					cx.report_node(
						*id,
						format!("\"{specifier}\" has no default export in its type declarations."),
						fix,
					);
				},
				NodeKind::ImportSpecifier { imported, .. } => {
					let Some(name) = tree.identifier_name(*imported).or_else(|| tree.string_value(*imported))
					else {
						continue;
					};

					if name == "default" || definition.exports(name) != Some(false) {
						continue;
					}

					cx.report_node(
						*imported,
						format!("\"{name}\" is not exported by the type declarations of \"{specifier}\"."),
						None,
					);
				},
				_ => {},
			}
		}
	}
}
