//! Priority-pattern ordering of object properties and import declarations.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
	engine::{Rule, RuleContext, RuleMeta},
	patch::{Separator, reorder},
	report::Fix,
	source::{NodeId, NodeKind, SyntaxTree},
};

/// One entry of a priority list: `name`, `prefix*`, `*suffix`, or `*`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Priority {
	Exact(String),
	Prefix(String),
	Suffix(String),
	/// Everything no other entry claims.
	Rest,
}
impl Priority {
	fn matches(&self, name: &str) -> bool {
		match self {
			Self::Exact(exact) => name == exact,
			Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
			Self::Suffix(suffix) => name.ends_with(suffix.as_str()),
			Self::Rest => true,
		}
	}
}
impl From<String> for Priority {
	fn from(pattern: String) -> Self {
		if pattern == "*" {
			Self::Rest
		} else if let Some(prefix) = pattern.strip_suffix('*') {
			Self::Prefix(prefix.to_owned())
		} else if let Some(suffix) = pattern.strip_prefix('*') {
			Self::Suffix(suffix.to_owned())
		} else {
			Self::Exact(pattern)
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderOptions {
	order: Vec<Priority>,
}

fn order_schema() -> Value {
	json!({
		"type": "object",
		"properties": {
			"order": { "type": "array", "items": { "type": "string" } }
		},
		"additionalProperties": false
	})
}

/// Position of `name` in the priority list: its first specific match, else the `*` entry,
/// else after every entry.
pub fn rank(priorities: &[Priority], name: &str) -> usize {
	priorities
		.iter()
		.position(|priority| *priority != Priority::Rest && priority.matches(name))
		.or_else(|| priorities.iter().position(|priority| *priority == Priority::Rest))
		.unwrap_or(priorities.len())
}

/// Stable sort permutation: `order[i]` is the index of the name that belongs at position `i`.
pub fn expected_order(priorities: &[Priority], names: &[String]) -> Vec<usize> {
	let mut order = (0..names.len()).collect::<Vec<_>>();

	order.sort_by_key(|idx| rank(priorities, &names[*idx]));

	order
}

fn first_divergence(order: &[usize]) -> Option<usize> {
	order.iter().enumerate().position(|(position, from)| position != *from)
}

/// Object literal properties follow the configured priority list.
pub struct PropOrder;
impl Rule for PropOrder {
	type Options = OrderOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-ORDER-001",
		name: "prop-order",
		description: "Object literal properties follow the configured order.",
		fixable: true,
	};

	fn schema() -> Value {
		order_schema()
	}

	fn wants(kind: &NodeKind) -> bool {
		matches!(kind, NodeKind::ObjectExpression { .. })
	}

	fn check_node(cx: &mut RuleContext<'_>, options: &Self::Options, _: &mut (), node: NodeId) {
		if options.order.is_empty() {
			return;
		}

		let tree = cx.tree();
		let NodeKind::ObjectExpression { properties } = tree.kind(node) else {
			return;
		};

		for segment in property_segments(tree, properties) {
			let names = segment.iter().map(|(_, name)| name.clone()).collect::<Vec<_>>();
			let order = expected_order(&options.order, &names);
			let Some(position) = first_divergence(&order) else {
				continue;
			};
			let elements = segment.iter().map(|(property, _)| *property).collect::<Vec<_>>();
			let unique = names.iter().collect::<HashSet<_>>().len() == names.len();
			let pure = elements.iter().all(|property| is_pure_property(tree, *property));
			let patch = if unique { reorder(cx.source(), &elements, &order, Separator::Comma) } else { None };
			let fix = patch.map(|patch| Fix::checked(pure, patch, "Sort the properties."));

			cx.report_node(
				elements[position],
				format!(
					"Expected \"{}\" to come before \"{}\".",
					names[order[position]], names[position]
				),
				fix,
			);
		}
	}
}

/// Runs of statically keyed properties; spreads and computed keys end a run.
fn property_segments(tree: &SyntaxTree, properties: &[NodeId]) -> Vec<Vec<(NodeId, String)>> {
	let mut segments = vec![Vec::new()];

	for property in properties {
		let name = match tree.kind(*property) {
			NodeKind::Property { key, computed: false, .. } => tree.static_key_name(*key, false),
			_ => None,
		};

		match (name, segments.last_mut()) {
			(Some(name), Some(segment)) => segment.push((*property, name)),
			_ => segments.push(Vec::new()),
		}
	}

	segments.retain(|segment| segment.len() > 1);

	segments
}

/// Whether evaluating the property's value can have side effects or observe them.
///
/// Function bodies are not evaluated when the literal is, so they are not entered.
fn is_pure_property(tree: &SyntaxTree, property: NodeId) -> bool {
	let NodeKind::Property { value, .. } = tree.kind(property) else {
		return false;
	};
	let mut stack = vec![*value];

	while let Some(node) = stack.pop() {
		match tree.kind(node) {
			NodeKind::CallExpression { .. }
			| NodeKind::NewExpression { .. }
			| NodeKind::MemberExpression { .. }
			| NodeKind::AssignmentExpression { .. }
			| NodeKind::UpdateExpression { .. }
			| NodeKind::AwaitExpression { .. }
			| NodeKind::YieldExpression { .. }
			| NodeKind::TaggedTemplateExpression { .. }
			| NodeKind::ImportExpression { .. } => return false,
			kind if kind.is_function() => {},
			_ => stack.extend(tree.children(node)),
		}
	}

	true
}

/// The leading imports of a module follow the configured priority list of module paths.
pub struct ImportOrder;
impl Rule for ImportOrder {
	type Options = OrderOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-ORDER-002",
		name: "import-order",
		description: "Leading imports follow the configured order of module paths.",
		fixable: true,
	};

	fn schema() -> Value {
		order_schema()
	}

	fn wants(kind: &NodeKind) -> bool {
		matches!(kind, NodeKind::Program { .. })
	}

	fn check_node(cx: &mut RuleContext<'_>, options: &Self::Options, _: &mut (), node: NodeId) {
		if options.order.is_empty() {
			return;
		}

		let tree = cx.tree();
		let NodeKind::Program { body, .. } = tree.kind(node) else {
			return;
		};
		let mut segments = vec![Vec::new()];

		for statement in body {
			let NodeKind::ImportDeclaration { specifiers, source } = tree.kind(*statement) else {
				break;
			};
			let Some(path) = tree.string_value(*source) else {
				break;
			};

			// Side-effect imports stay where they are.
			if specifiers.is_empty() {
				segments.push(Vec::new());
			} else if let Some(segment) = segments.last_mut() {
				segment.push((*statement, path.to_owned()));
			}
		}

		for segment in segments.iter().filter(|segment| segment.len() > 1) {
			let names = segment.iter().map(|(_, path)| path.clone()).collect::<Vec<_>>();
			let order = expected_order(&options.order, &names);
			let Some(position) = first_divergence(&order) else {
				continue;
			};
			let elements = segment.iter().map(|(statement, _)| *statement).collect::<Vec<_>>();
			let fix = reorder(cx.source(), &elements, &order, Separator::Statement)
				.map(|patch| Fix::safe(patch, "Sort the imports."));

			cx.report_node(
				elements[position],
				format!(
					"Expected \"{}\" to be imported before \"{}\".",
					names[order[position]], names[position]
				),
				fix,
			);
		}
	}
}
