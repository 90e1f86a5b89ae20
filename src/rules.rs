//! Rule catalogue and helpers shared by the rule families.

mod bluebird;
mod comments;
mod import_shape;
mod layout;
mod naming;
mod ordering;
mod paths;
mod type_exports;

pub use bluebird::BluebirdMapConcurrency;
pub use comments::CommentStyle;
pub use import_shape::ImportShape;
pub use layout::{BlockPadding, NoBlankLinesInChain, PaddingAroundMultiline};
pub use naming::{ExportNameFromFile, ImportNameFromPath};
pub use ordering::{ImportOrder, PropOrder};
pub use paths::{IndexImportPath, NearestIndexImport};
pub use type_exports::ImportTypeExports;

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, de::Error as _};
use text_size::TextRange;

use crate::{
	engine::RuleEntry,
	fs::{FileSystem, normalize_path},
	patch::{Edit, Patch},
	source::{NodeId, NodeKind, SourceFile, SyntaxTree},
};

/// Extensions tried when a relative specifier names a module without one.
pub const MODULE_EXTENSIONS: [&str; 8] = ["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

static BACK_REFERENCE_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\$(\d+)").expect("Expected operation to succeed."));

/// Every implemented rule, in id order.
pub fn registry() -> Vec<RuleEntry> {
	vec![
		RuleEntry::of::<ImportNameFromPath>(),
		RuleEntry::of::<ExportNameFromFile>(),
		RuleEntry::of::<ImportShape>(),
		RuleEntry::of::<ImportTypeExports>(),
		RuleEntry::of::<IndexImportPath>(),
		RuleEntry::of::<NearestIndexImport>(),
		RuleEntry::of::<PaddingAroundMultiline>(),
		RuleEntry::of::<BlockPadding>(),
		RuleEntry::of::<NoBlankLinesInChain>(),
		RuleEntry::of::<PropOrder>(),
		RuleEntry::of::<ImportOrder>(),
		RuleEntry::of::<CommentStyle>(),
		RuleEntry::of::<BluebirdMapConcurrency>(),
	]
}

/// Looks a rule up by configuration name or id.
pub fn find_rule(key: &str) -> Option<RuleEntry> {
	registry().into_iter().find(|entry| entry.meta.name == key || entry.meta.id == key)
}

/// Regex matched against a whole string, deserialized from its source text.
#[derive(Clone, Debug)]
pub struct WholeMatch(Regex);
impl WholeMatch {
	pub fn new(pattern: &str) -> Result<Self, regex::Error> {
		Regex::new(&format!("^(?:{pattern})$")).map(Self)
	}

	pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
		self.0.captures(text)
	}
}
impl<'de> Deserialize<'de> for WholeMatch {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let pattern = String::deserialize(deserializer)?;

		Self::new(&pattern).map_err(D::Error::custom)
	}
}

/// Replaces `$n` with the n-th capture group; missing groups expand to nothing.
pub fn substitute(template: &str, captures: &Captures<'_>) -> String {
	BACK_REFERENCE_RE
		.replace_all(template, |found: &Captures<'_>| {
			found[1]
				.parse::<usize>()
				.ok()
				.and_then(|group| captures.get(group))
				.map(|matched| matched.as_str().to_owned())
				.unwrap_or_default()
		})
		.into_owned()
}

/// One module request in a file: its source literal and the statement that makes it.
#[derive(Clone, Copy, Debug)]
pub struct ModuleRequest {
	pub statement: NodeId,
	pub literal: NodeId,
}

/// Source literal of an import, a re-export, or a top-level `require('...')` declarator.
pub fn module_request(tree: &SyntaxTree, node: NodeId) -> Option<ModuleRequest> {
	let literal = match tree.kind(node) {
		NodeKind::ImportDeclaration { source, .. }
		| NodeKind::ExportAllDeclaration { source, .. }
		| NodeKind::ExportNamedDeclaration { source: Some(source), .. } => *source,
		NodeKind::VariableDeclarator { init: Some(init), .. } => require_argument(tree, *init)?,
		_ => return None,
	};

	tree.string_value(literal)?;

	Some(ModuleRequest { statement: node, literal })
}

/// The string literal of `require('m')`.
pub fn require_argument(tree: &SyntaxTree, call: NodeId) -> Option<NodeId> {
	let NodeKind::CallExpression { callee, arguments, optional: false } = tree.kind(call) else {
		return None;
	};

	if tree.identifier_name(*callee) != Some("require") || arguments.len() != 1 {
		return None;
	}

	tree.string_value(arguments[0]).map(|_| arguments[0])
}

pub fn is_relative(specifier: &str) -> bool {
	specifier == "." || specifier == ".." || specifier.starts_with("./") || specifier.starts_with("../")
}

/// Directory holding the file being checked.
pub fn file_directory(source: &SourceFile) -> PathBuf {
	source.path().parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Lexical resolution of a relative specifier against the importing file.
pub fn resolve_specifier(source: &SourceFile, specifier: &str) -> PathBuf {
	normalize_path(&file_directory(source).join(specifier))
}

/// `path` without a known module extension.
pub fn strip_module_extension(path: &Path) -> PathBuf {
	match path.extension().and_then(|ext| ext.to_str()) {
		Some(ext) if MODULE_EXTENSIONS.contains(&ext) => path.with_extension(""),
		_ => path.to_path_buf(),
	}
}

/// Whether `directory` holds an `index` module.
pub fn has_index_module(fs: &dyn FileSystem, directory: &Path) -> bool {
	fs.is_directory(directory)
		&& MODULE_EXTENSIONS.iter().any(|ext| fs.exists(&directory.join(format!("index.{ext}"))))
}

/// Whether a file `<path>.<ext>` exists for a known extension.
pub fn has_module_file(fs: &dyn FileSystem, path: &Path) -> bool {
	let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
		return false;
	};

	MODULE_EXTENSIONS.iter().any(|ext| fs.exists(&path.with_file_name(format!("{name}.{ext}"))))
}

/// Base name a module is known by: its file stem, or its directory for `index` modules.
pub fn module_base_name(path: &Path) -> Option<String> {
	let path = strip_module_extension(path);
	let stem = path.file_name()?.to_str()?;

	if stem == "index" {
		return path.parent()?.file_name()?.to_str().map(str::to_owned);
	}

	Some(stem.to_owned())
}

/// Patch rewriting the value of a string literal, keeping its quote style.
pub fn replace_string_literal(source: &SourceFile, literal: NodeId, value: &str) -> Patch {
	let range = source.tree().range(literal);
	let quote = source.node_text(literal).chars().next().unwrap_or('\'');

	Patch::single(Edit::replace(range, format!("{quote}{value}{quote}")))
}

/// Name span of an identifier node (type annotations excluded).
pub fn name_range(tree: &SyntaxTree, identifier: NodeId) -> TextRange {
	let range = tree.range(identifier);

	match tree.identifier_name(identifier) {
		Some(name) => TextRange::at(range.start(), text_size::TextSize::of(name)),
		None => range,
	}
}
