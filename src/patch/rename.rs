//! Scope-aware renaming of one variable.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use text_size::{TextRange, TextSize};

use super::{Edit, Patch};
use crate::{
	engine::FileContext,
	scope::VariableId,
	source::{NodeId, NodeKind, SyntaxTree},
};

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("Expected operation to succeed.")
});

const RESERVED: [&str; 46] = [
	"await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
	"delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
	"if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
	"package", "private", "protected", "public", "return", "static", "super", "switch", "this",
	"throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub fn is_valid_identifier(name: &str) -> bool {
	IDENTIFIER_RE.is_match(name) && !RESERVED.contains(&name)
}

/// Renames `variable` to `new_name` at its bindings and every reference.
///
/// Only the name span of each identifier changes, so type annotations stay in place.
/// Returns `None` when the new name would collide with a binding of the declaring scope,
/// would be captured by an inner binding at a reference, would capture an outer reference,
/// or would change an exported name.
pub fn rename_variable(file: &FileContext, variable: VariableId, new_name: &str) -> Option<Patch> {
	let scopes = &file.scopes;
	let tree = file.source.tree();
	let target = scopes.variable(variable);
	let old_name = target.name.as_str();

	if old_name == new_name || !is_valid_identifier(new_name) {
		return None;
	}
	if scopes.find_in_scope(target.scope, new_name).is_some() {
		return None;
	}

	for reference in scopes.references(variable) {
		let captured = scopes
			.resolve(reference.from, new_name)
			.is_some_and(|other| scopes.is_within(scopes.variable(other).scope, target.scope));

		if captured {
			return None;
		}
	}

	let shadows_outer_use = scopes.all_references().any(|reference| {
		reference_name(tree, reference.identifier) == Some(new_name)
			&& scopes.is_within(reference.from, target.scope)
			&& reference.resolved.is_none_or(|other| {
				!scopes.is_within(scopes.variable(other).scope, target.scope)
			})
	});

	if shadows_outer_use {
		return None;
	}
	if target.identifiers.iter().any(|identifier| is_exported_binding(tree, *identifier)) {
		return None;
	}

	let identifiers = target
		.identifiers
		.iter()
		.copied()
		.chain(scopes.references(variable).map(|reference| reference.identifier))
		.collect::<BTreeSet<_>>();
	let edits = identifiers
		.into_iter()
		.map(|identifier| rename_edit(tree, identifier, old_name, new_name))
		.collect();

	Patch::new(edits).ok()
}

fn reference_name(tree: &SyntaxTree, identifier: NodeId) -> Option<&str> {
	match tree.kind(identifier) {
		NodeKind::Identifier { name, .. } | NodeKind::JsxIdentifier { name } => Some(name),
		_ => None,
	}
}

/// Whether the binding sits inside `export const ...`, `export function ...`, or
/// `export class ...`, where its name is also the exported name.
fn is_exported_binding(tree: &SyntaxTree, identifier: NodeId) -> bool {
	tree.ancestors(identifier).any(|node| {
		matches!(tree.kind(node), NodeKind::ExportNamedDeclaration { declaration: Some(_), .. })
	})
}

fn rename_edit(tree: &SyntaxTree, identifier: NodeId, old_name: &str, new_name: &str) -> Edit {
	let start = tree.range(identifier).start();
	let name_span = TextRange::at(start, TextSize::of(old_name));
	let replacement = match shorthand_owner(tree, identifier) {
		Some(Shorthand::Property) => format!("{old_name}: {new_name}"),
		Some(Shorthand::Export) => format!("{new_name} as {old_name}"),
		Some(Shorthand::Import) => format!("{old_name} as {new_name}"),
		None => new_name.to_owned(),
	};

	Edit::replace(name_span, replacement)
}

enum Shorthand {
	Property,
	Export,
	Import,
}

/// Forms where one identifier is both the outward name and the local binding.
fn shorthand_owner(tree: &SyntaxTree, identifier: NodeId) -> Option<Shorthand> {
	let parent = tree.parent(identifier)?;

	match tree.kind(parent) {
		NodeKind::Property { key, shorthand: true, .. } if *key == identifier =>
			Some(Shorthand::Property),
		NodeKind::AssignmentPattern { left, .. } if *left == identifier => {
			let owner = tree.parent(parent)?;

			match tree.kind(owner) {
				NodeKind::Property { key, shorthand: true, .. } if *key == identifier =>
					Some(Shorthand::Property),
				_ => None,
			}
		},
		NodeKind::ExportSpecifier { local, exported } if *local == *exported =>
			Some(Shorthand::Export),
		NodeKind::ImportSpecifier { imported, local } if *imported == *local =>
			Some(Shorthand::Import),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{self, find};

	fn renamed(text: &str, old_name: &str, new_name: &str) -> Option<String> {
		let file = testing::parse("a.js", text);
		let identifier = find(&file, "Identifier", old_name);
		let variable = file.scopes.binding(identifier).expect("first occurrence binds");
		let patch = rename_variable(&file, variable, new_name)?;

		Some(patch.apply(text).expect("patch applies"))
	}

	#[test]
	fn bindings_and_references_are_renamed() {
		assert_eq!(
			renamed("const a = 1;\nfoo(a, a + 1);\n", "a", "b").as_deref(),
			Some("const b = 1;\nfoo(b, b + 1);\n")
		);
	}

	#[test]
	fn shorthand_forms_keep_their_outward_name() {
		assert_eq!(
			renamed("const a = 1;\nx({a});\n", "a", "b").as_deref(),
			Some("const b = 1;\nx({a: b});\n")
		);
		assert_eq!(
			renamed("const {a} = o;\nf(a);\n", "a", "b").as_deref(),
			Some("const {a: b} = o;\nf(b);\n")
		);
		assert_eq!(
			renamed("const a = 1;\nexport { a };\n", "a", "b").as_deref(),
			Some("const b = 1;\nexport { b as a };\n")
		);
		assert_eq!(
			renamed("import { a } from 'm';\na();\n", "a", "b").as_deref(),
			Some("import { a as b } from 'm';\nb();\n")
		);
	}

	#[test]
	fn collisions_and_captures_decline() {
		assert_eq!(renamed("const a = 1;\nconst b = 2;\n", "a", "b"), None);
		assert_eq!(
			renamed("const a = 1;\nfunction f() {\n\tconst b = 2;\n\treturn a;\n}\n", "a", "b"),
			None
		);
		assert_eq!(renamed("const a = 1;\nfunction f() {\n\treturn b;\n}\n", "a", "b"), None);
	}

	#[test]
	fn inner_binding_of_the_same_name_elsewhere_is_fine() {
		assert_eq!(
			renamed("const a = 1;\nf(a);\nfunction g() {\n\tconst b = 2;\n\treturn b;\n}\n", "a", "b")
				.as_deref(),
			Some("const b = 1;\nf(b);\nfunction g() {\n\tconst b = 2;\n\treturn b;\n}\n")
		);
	}

	#[test]
	fn exported_declarations_and_invalid_names_decline() {
		assert_eq!(renamed("export const a = 1;\n", "a", "b"), None);
		assert_eq!(renamed("const a = 1;\n", "a", "class"), None);
		assert_eq!(renamed("const a = 1;\n", "a", "1a"), None);
		assert_eq!(renamed("const a = 1;\n", "a", "a"), None);
	}
}
