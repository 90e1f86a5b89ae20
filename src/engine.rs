//! Rule trait and the per-file evaluation driver.

use serde::de::DeserializeOwned;
use serde_json::Value;
use text_size::TextRange;

use crate::{
	fs::{CachedFileSystem, FileSystem},
	report::{Diagnostic, Fix, Reporter},
	scope::ScopeGraph,
	source::{NodeId, NodeKind, SourceFile, SyntaxTree},
	typedefs::TypeDefinitionCache,
};

/// A parsed file plus its scope graph.
#[derive(Debug)]
pub struct FileContext {
	pub source: SourceFile,
	pub scopes: ScopeGraph,
}
impl FileContext {
	pub fn new(source: SourceFile) -> Self {
		let scopes = ScopeGraph::build(source.tree());

		Self { source, scopes }
	}
}

/// Collaborators shared by every rule during one host run.
pub struct Environment {
	fs: CachedFileSystem,
	typedefs: TypeDefinitionCache,
}
impl Environment {
	pub fn new(fs: impl FileSystem + 'static) -> Self {
		Self { fs: CachedFileSystem::new(fs), typedefs: TypeDefinitionCache::default() }
	}

	pub fn fs(&self) -> &dyn FileSystem {
		&self.fs
	}

	pub fn typedefs(&self) -> &TypeDefinitionCache {
		&self.typedefs
	}

	/// Drops memoized file contents and the declarations parsed from them after a write.
	pub fn forget_contents(&self) {
		self.fs.forget_contents();
		self.typedefs.clear();
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleMeta {
	/// Stable id, `JS-STYLE-<FAMILY>-<NNN>`.
	pub id: &'static str,
	/// Configuration key.
	pub name: &'static str,
	pub description: &'static str,
	pub fixable: bool,
}

/// One style rule.
///
/// Options come from configuration; state is created fresh for every file and dropped when
/// the file is done.
pub trait Rule {
	const META: RuleMeta;

	type Options: DeserializeOwned + Default;
	type State: Default;

	/// JSON schema of the accepted options.
	fn schema() -> Value;

	/// Node kinds passed to [`Rule::check_node`].
	fn wants(_kind: &NodeKind) -> bool {
		false
	}

	fn check_node(
		_cx: &mut RuleContext<'_>,
		_options: &Self::Options,
		_state: &mut Self::State,
		_node: NodeId,
	) {
	}

	/// Runs once after the traversal.
	fn check_file(_cx: &mut RuleContext<'_>, _options: &Self::Options, _state: &mut Self::State) {}
}

/// What a rule sees while it runs over one file.
pub struct RuleContext<'a> {
	pub file: &'a FileContext,
	pub env: &'a Environment,
	reporter: Reporter<'a>,
}
impl<'a> RuleContext<'a> {
	pub fn new(rule: &'static str, file: &'a FileContext, env: &'a Environment) -> Self {
		Self { file, env, reporter: Reporter::new(rule, &file.source) }
	}

	pub fn source(&self) -> &'a SourceFile {
		&self.file.source
	}

	pub fn tree(&self) -> &'a SyntaxTree {
		self.file.source.tree()
	}

	pub fn scopes(&self) -> &'a ScopeGraph {
		&self.file.scopes
	}

	pub fn report(&mut self, range: TextRange, message: impl Into<String>, fix: Option<Fix>) {
		self.reporter.report_at(range, message, fix);
	}

	pub fn report_node(&mut self, node: NodeId, message: impl Into<String>, fix: Option<Fix>) {
		let range = self.tree().range(node);

		self.report(range, message, fix);
	}

	pub fn finish(self) -> Vec<Diagnostic> {
		self.reporter.finish()
	}
}

/// Runs rule `R` over one file.
///
/// Options that do not deserialize make the rule decline: nothing is reported and a warning
/// is logged. `None` uses the rule's defaults.
pub fn evaluate<R: Rule>(file: &FileContext, env: &Environment, options: Option<&Value>) -> Vec<Diagnostic> {
	let options = match options {
		Some(value) => match serde_json::from_value::<R::Options>(value.clone()) {
			Ok(options) => options,
			Err(err) => {
				tracing::warn!(rule = R::META.id, error = %err, "Skipping rule with invalid options.");

				return Vec::new();
			},
		},
		None => R::Options::default(),
	};
	let mut state = R::State::default();
	let mut cx = RuleContext::new(R::META.id, file, env);
	let tree = file.source.tree();

	for node in tree.preorder() {
		if R::wants(tree.kind(node)) {
			R::check_node(&mut cx, &options, &mut state, node);
		}
	}

	R::check_file(&mut cx, &options, &mut state);

	cx.finish()
}

/// Deserializes `options` for rule `R`, returning the error text on failure.
pub fn validate_options<R: Rule>(options: &Value) -> Result<(), String> {
	serde_json::from_value::<R::Options>(options.clone()).map(|_| ()).map_err(|err| err.to_string())
}

/// Type-erased handle to one rule, for the registry and the host.
#[derive(Clone, Copy)]
pub struct RuleEntry {
	pub meta: RuleMeta,
	pub schema: fn() -> Value,
	pub evaluate: fn(&FileContext, &Environment, Option<&Value>) -> Vec<Diagnostic>,
	pub validate: fn(&Value) -> Result<(), String>,
}
impl RuleEntry {
	pub fn of<R: Rule>() -> Self {
		Self { meta: R::META, schema: R::schema, evaluate: evaluate::<R>, validate: validate_options::<R> }
	}
}
impl std::fmt::Debug for RuleEntry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RuleEntry").field("meta", &self.meta).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use serde::Deserialize;
	use serde_json::json;

	use super::*;
	use crate::testing;

	#[derive(Debug, Default, Deserialize)]
	#[serde(deny_unknown_fields)]
	struct CallOptions {
		#[serde(default)]
		prefix: String,
	}

	#[derive(Debug, Default)]
	struct CallState {
		seen: usize,
	}

	struct CountCalls;
	impl Rule for CountCalls {
		type Options = CallOptions;
		type State = CallState;

		const META: RuleMeta = RuleMeta {
			id: "JS-STYLE-TEST-001",
			name: "count-calls",
			description: "Reports every call.",
			fixable: false,
		};

		fn schema() -> Value {
			json!({ "type": "object" })
		}

		fn wants(kind: &NodeKind) -> bool {
			matches!(kind, NodeKind::CallExpression { .. })
		}

		fn check_node(
			cx: &mut RuleContext<'_>,
			options: &Self::Options,
			state: &mut Self::State,
			node: NodeId,
		) {
			state.seen += 1;

			cx.report_node(node, format!("{}{}", options.prefix, state.seen), None);
		}

		fn check_file(cx: &mut RuleContext<'_>, _options: &Self::Options, state: &mut Self::State) {
			cx.report(TextRange::default(), format!("total {}", state.seen), None);
		}
	}

	#[test]
	fn nodes_are_visited_in_pre_order_with_fresh_state() {
		let text = "a(b());\nc();\n";

		for _ in 0..2 {
			let diagnostics = testing::check::<CountCalls>("a.js", text, json!({ "prefix": "#" }));

			assert_eq!(testing::messages(&diagnostics), vec!["#1", "#2", "#3", "total 3"]);
			assert_eq!(diagnostics[1].column, 3);
		}
	}

	#[test]
	fn invalid_options_decline() {
		let diagnostics = testing::check::<CountCalls>("a.js", "a();\n", json!({ "prefix": 1 }));

		assert!(diagnostics.is_empty());
		assert!(validate_options::<CountCalls>(&json!({ "other": true })).is_err());
		assert!(validate_options::<CountCalls>(&json!({})).is_ok());
	}

	#[test]
	fn entries_erase_the_rule_type() {
		let entry = RuleEntry::of::<CountCalls>();
		let file = testing::parse("a.js", "a();\n");
		let env = testing::environment(&[]);

		assert_eq!(entry.meta.name, "count-calls");
		assert_eq!((entry.evaluate)(&file, &env, None).len(), 2);
	}
}
