//! Relative import paths that should point at directory index modules.

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
	engine::{Rule, RuleContext, RuleMeta},
	fs::{FileSystem, normalize_path},
	report::Fix,
	rules::{
		MODULE_EXTENSIONS, file_directory, has_index_module, has_module_file, is_relative,
		module_request, replace_string_literal, resolve_specifier, strip_module_extension,
	},
	source::{NodeId, NodeKind, SyntaxTree},
};

static INDEX_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^(.+)/index(?:\.(?:js|jsx|mjs|cjs|ts|tsx|mts|cts))?$")
		.expect("Expected operation to succeed.")
});
static EXPORT_ALL_FROM_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"\bexport\s*\*\s*from\s*['"]([^'"]+)['"]"#).expect("Expected operation to succeed.")
});

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathOptions {}

fn wants_module_request(kind: &NodeKind) -> bool {
	matches!(
		kind,
		NodeKind::ImportDeclaration { .. }
			| NodeKind::ExportAllDeclaration { .. }
			| NodeKind::ExportNamedDeclaration { .. }
			| NodeKind::VariableDeclarator { .. }
	)
}

/// `./dir/index` is written `./dir`.
pub struct IndexImportPath;
impl Rule for IndexImportPath {
	type Options = PathOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-PATH-001",
		name: "index-import-path",
		description: "Imports of index modules name the directory.",
		fixable: true,
	};

	fn schema() -> Value {
		json!({ "type": "object", "additionalProperties": false })
	}

	fn wants(kind: &NodeKind) -> bool {
		wants_module_request(kind)
	}

	fn check_node(cx: &mut RuleContext<'_>, _: &Self::Options, _: &mut (), node: NodeId) {
		let tree = cx.tree();
		let Some(request) = module_request(tree, node) else {
			return;
		};
		let Some(specifier) = tree.string_value(request.literal) else {
			return;
		};

		if !is_relative(specifier) {
			return;
		}

		let Some(captures) = INDEX_SUFFIX_RE.captures(specifier) else {
			return;
		};
		let directory = captures.get(1).map_or("", |found| found.as_str());

		if directory.split('/').all(|segment| segment == "." || segment == "..") {
			return;
		}

		let resolved = resolve_specifier(cx.source(), directory);
		let fs = cx.env.fs();

		if !has_index_module(fs, &resolved) || has_module_file(fs, &resolved) {
			return;
		}

		let fix = Fix::safe(
			replace_string_literal(cx.source(), request.literal, directory),
			format!("Import \"{directory}\"."),
		);

		cx.report_node(
			request.literal,
			format!("Import \"{directory}\" instead of \"{specifier}\"."),
			Some(fix),
		);
	}
}

/// Imports reaching into a directory go through the nearest index module on the way.
pub struct NearestIndexImport;
impl Rule for NearestIndexImport {
	type Options = PathOptions;
	type State = ();

	const META: RuleMeta = RuleMeta {
		id: "JS-STYLE-PATH-002",
		name: "nearest-index-import",
		description: "Imports from other directories go through their nearest index module.",
		fixable: true,
	};

	fn schema() -> Value {
		json!({ "type": "object", "additionalProperties": false })
	}

	fn wants(kind: &NodeKind) -> bool {
		wants_module_request(kind)
	}

	fn check_node(cx: &mut RuleContext<'_>, _: &Self::Options, _: &mut (), node: NodeId) {
		let tree = cx.tree();
		let fs = cx.env.fs();
		let Some(request) = module_request(tree, node) else {
			return;
		};
		let Some(specifier) = tree.string_value(request.literal) else {
			return;
		};

		if !is_relative(specifier) {
			return;
		}

		let target = strip_module_extension(&resolve_specifier(cx.source(), specifier));

		if target.file_name().is_none_or(|name| name == "index") || fs.is_directory(&target) {
			return;
		}
		if !has_module_file(fs, &target) {
			return;
		}

		let importer = file_directory(cx.source());
		let shared = shared_ancestor(&importer, &target);
		let Some(index) = target
			.ancestors()
			.skip(1)
			.take_while(|ancestor| ancestor.starts_with(&shared) && *ancestor != shared.as_path())
			.find(|ancestor| has_index_module(fs, ancestor))
		else {
			return;
		};
		let replacement = relative_specifier(&importer, index, &shared);
		let safe = only_named_bindings(tree, node) && reexports_all_of(fs, index, &target);
		let fix = Fix::checked(
			safe,
			replace_string_literal(cx.source(), request.literal, &replacement),
			format!("Import \"{replacement}\"."),
		);

		cx.report_node(
			request.literal,
			format!("Import \"{replacement}\" instead of reaching into \"{specifier}\"."),
			Some(fix),
		);
	}
}

/// Longest common prefix of two normalized paths.
fn shared_ancestor(a: &Path, b: &Path) -> PathBuf {
	a.components().zip(b.components()).take_while(|(x, y)| x == y).map(|(x, _)| x).collect()
}

/// Specifier leading from `importer` to `directory`, both below `shared`.
fn relative_specifier(importer: &Path, directory: &Path, shared: &Path) -> String {
	let ups = importer.strip_prefix(shared).map_or(0, |rest| rest.components().count());
	let down = directory
		.strip_prefix(shared)
		.map(|rest| {
			rest.components()
				.filter_map(|component| match component {
					Component::Normal(name) => name.to_str(),
					_ => None,
				})
				.collect::<Vec<_>>()
				.join("/")
		})
		.unwrap_or_default();
	let prefix = if ups == 0 { "./".to_owned() } else { "../".repeat(ups) };

	format!("{prefix}{down}")
}

/// Whether the statement only takes named bindings, so a re-exporting index serves them all.
fn only_named_bindings(tree: &SyntaxTree, node: NodeId) -> bool {
	match tree.kind(node) {
		NodeKind::ImportDeclaration { specifiers, .. } =>
			!specifiers.is_empty()
				&& specifiers
					.iter()
					.all(|specifier| matches!(tree.kind(*specifier), NodeKind::ImportSpecifier { .. })),
		NodeKind::ExportNamedDeclaration { specifiers, .. } => !specifiers.is_empty(),
		_ => false,
	}
}

/// Whether the index module of `directory` has `export * from` resolving to `target`.
fn reexports_all_of(fs: &dyn FileSystem, directory: &Path, target: &Path) -> bool {
	let Some(text) = MODULE_EXTENSIONS
		.iter()
		.find_map(|ext| fs.read_file(&directory.join(format!("index.{ext}"))))
	else {
		return false;
	};

	EXPORT_ALL_FROM_RE.captures_iter(&text).any(|captures| {
		is_relative(&captures[1])
			&& strip_module_extension(&normalize_path(&directory.join(&captures[1]))) == target
	})
}
