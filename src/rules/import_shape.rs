//! Required shape of imports and requires per module.

use serde::Deserialize;
use serde_json::{Value, json};
use text_size::TextRange;

use crate::{
	casing::{Case, convert},
	engine::{Rule, RuleContext, RuleMeta},
	patch::{Edit, Patch, rename_variable},
	report::Fix,
	rules::{WholeMatch, module_request, name_range, substitute},
	source::{NodeId, NodeKind, SyntaxTree},
};

/// `true` requires the binding, `false` forbids it, a string requires that exact name.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum BindingRequirement {
	Present(bool),
	Named(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShapeRule {
	path: WholeMatch,
	default: Option<BindingRequirement>,
	namespace: Option<BindingRequirement>,
	named: Option<Vec<String>>,
	#[serde(default = "rename_named_default")]
	rename_named: bool,
	case: Option<Case>,
}

fn rename_named_default() -> bool {
	true
}

#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct ImportShapeOptions(Vec<ShapeRule>);

/// Bindings one statement takes from a module.
#[derive(Debug, Default)]
struct Shape {
	default: Option<NodeId>,
	namespace: Option<NodeId>,
	named: Vec<NamedBinding>,
}

#[derive(Debug)]
struct NamedBinding {
	/// Specifier or pattern property.
	node: NodeId,
	imported: String,
	local: NodeId,
}

/// Imports of matching modules take the configured default, namespace and named bindings.
pub struct ImportShape;
impl Rule for ImportShape {
	type Options = ImportShapeOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-IMPORT-001",
		name: "import-shape",
		description: "Imports of configured modules use the required bindings.",
		fixable: true,
	};

	fn schema() -> Value {
		let requirement = json!({ "oneOf": [{ "type": "boolean" }, { "type": "string" }] });

		json!({
			"type": "array",
			"items": {
				"type": "object",
				"properties": {
					"path": { "type": "string" },
					"default": requirement,
					"namespace": requirement,
					"named": { "type": "array", "items": { "type": "string" } },
					"renameNamed": { "type": "boolean" },
					"case": { "enum": ["camel", "pascal", "snake", "upper"] }
				},
				"required": ["path"],
				"additionalProperties": false
			}
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
		let Some((rule, captures)) =
			options.0.iter().find_map(|rule| rule.path.captures(specifier).map(|found| (rule, found)))
		else {
			return;
		};
		let Some(shape) = shape_of(tree, node) else {
			return;
		};
		let expected_name = |template: &str| {
			let name = substitute(template, &captures);

			match rule.case {
				Some(case) => convert(&name, case),
				None => name,
			}
		};

		check_binding(cx, node, specifier, "default", shape.default, rule.default.as_ref(), &expected_name);
		check_binding(
			cx,
			node,
			specifier,
			"namespace",
			shape.namespace,
			rule.namespace.as_ref(),
			&expected_name,
		);

		for binding in &shape.named {
			if let Some(allowed) = &rule.named
				&& !allowed.contains(&binding.imported)
			{
				cx.report_node(
					binding.node,
					format!("Unexpected named import \"{}\" from \"{specifier}\".", binding.imported),
					None,
				);

				continue;
			}

			if !rule.rename_named && tree.identifier_name(binding.local) != Some(binding.imported.as_str()) {
				let fix = unrename(cx, binding).map(|patch| {
					Fix::safe(patch, format!("Import \"{}\" under its own name.", binding.imported))
				});

				cx.report_node(
					binding.node,
					format!("Do not rename the named import \"{}\".", binding.imported),
					fix,
				);
			}
		}
	}
}

fn check_binding(
	cx: &mut RuleContext<'_>,
	statement: NodeId,
	specifier: &str,
	label: &str,
	local: Option<NodeId>,
	requirement: Option<&BindingRequirement>,
	expected_name: &dyn Fn(&str) -> String,
) {
	let Some(requirement) = requirement else {
		return;
	};

	match (requirement, local) {
		(BindingRequirement::Present(false), Some(local)) => {
			cx.report_node(local, format!("Unexpected {label} import from \"{specifier}\"."), None);
		},
		(BindingRequirement::Present(true) | BindingRequirement::Named(_), None) => {
			cx.report_node(statement, format!("Expected a {label} import from \"{specifier}\"."), None);
		},
		(BindingRequirement::Named(template), Some(local)) => {
			let expected = expected_name(template);
			let Some(actual) = cx.tree().identifier_name(local) else {
				return;
			};

			if actual == expected {
				return;
			}

			let fix = cx
				.scopes()
				.binding(local)
				.and_then(|variable| rename_variable(cx.file, variable, &expected))
				.map(|patch| Fix::safe(patch, format!("Rename \"{actual}\" to \"{expected}\".")));

			cx.report_node(local, format!("Expected the {label} import to be \"{expected}\"."), fix);
		},
		_ => {},
	}
}

/// Bindings of an import declaration or a `require` declarator; `None` for side-effect imports
/// and patterns that bind nothing by name.
fn shape_of(tree: &SyntaxTree, node: NodeId) -> Option<Shape> {
	let mut shape = Shape::default();

	match tree.kind(node) {
		NodeKind::ImportDeclaration { specifiers, .. } => {
			if specifiers.is_empty() {
				return None;
			}

			for specifier in specifiers {
				match tree.kind(*specifier) {
					NodeKind::ImportDefaultSpecifier { local } => shape.default = Some(*local),
					NodeKind::ImportNamespaceSpecifier { local } => shape.namespace = Some(*local),
					NodeKind::ImportSpecifier { imported, local } => {
						let imported = tree
							.identifier_name(*imported)
							.or_else(|| tree.string_value(*imported))?
							.to_owned();

						shape.named.push(NamedBinding { node: *specifier, imported, local: *local });
					},
					_ => {},
				}
			}
		},
		NodeKind::VariableDeclarator { id, .. } => match tree.kind(*id) {
			NodeKind::Identifier { .. } => shape.default = Some(*id),
			NodeKind::ObjectPattern { properties } =>
				for property in properties {
					let NodeKind::Property { key, value, computed: false, .. } = tree.kind(*property)
					else {
						continue;
					};
					let Some(imported) = tree.static_key_name(*key, false) else {
						continue;
					};
					let local = match tree.kind(*value) {
						NodeKind::AssignmentPattern { left, .. } => *left,
						_ => *value,
					};

					if tree.identifier_name(local).is_none() {
						continue;
					}

					shape.named.push(NamedBinding { node: *property, imported, local });
				},
			_ => return None,
		},
		_ => return None,
	}

	Some(shape)
}

/// Rename patch for the local binding, with the edit at the binding itself widened to the whole
/// `imported as local` (or `imported: local`) span and collapsed to the imported name.
fn unrename(cx: &RuleContext<'_>, binding: &NamedBinding) -> Option<Patch> {
	let tree = cx.tree();
	let variable = cx.scopes().binding(binding.local)?;
	let patch = rename_variable(cx.file, variable, &binding.imported)?;
	let local = name_range(tree, binding.local);
	let mut edits = patch
		.edits()
		.iter()
		.filter(|edit| edit.range.start() != local.start())
		.cloned()
		.collect::<Vec<_>>();

	edits.push(Edit::replace(
		TextRange::new(tree.range(binding.node).start(), local.end()),
		binding.imported.clone(),
	));

	Patch::new(edits).ok()
}
