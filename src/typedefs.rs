//! Companion type-declaration lookup for bare package imports.
//!
//! Declaration files are found under `node_modules` by walking up from the importing file and
//! scanned for their export surface. Results are memoized per `(package, directory)` for one
//! host run.

use std::{
	cell::RefCell,
	collections::{BTreeSet, HashMap},
	path::{Path, PathBuf},
	rc::Rc,
};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fs::{FileSystem, escape_glob, normalize_path};

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").expect("Expected operation to succeed.")
});
static EXPORT_DEFAULT_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\bexport\s+default\b").expect("Expected operation to succeed."));
static EXPORT_EQUALS_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\bexport\s*=").expect("Expected operation to succeed."));
static EXPORT_ALL_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\bexport\s*\*\s*(?:as\s+([A-Za-z_$][\w$]*)\s+)?from\b")
		.expect("Expected operation to succeed.")
});
static EXPORT_LIST_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\bexport\s+(?:type\s+)?\{([^}]*)\}").expect("Expected operation to succeed.")
});
static EXPORT_DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r"\bexport\s+(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:const|let|var|function\*?|class|interface|type|enum|namespace|module)\s+([A-Za-z_$][\w$]*)",
	)
	.expect("Expected operation to succeed.")
});

/// Export surface of one declaration file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeDefinition {
	pub path: PathBuf,
	pub has_default: bool,
	/// `export = x`: the module object itself is the export.
	pub export_equals: bool,
	/// `export * from '...'`: names may come from elsewhere.
	pub export_all: bool,
	pub named: BTreeSet<String>,
}
impl TypeDefinition {
	pub fn parse(path: impl Into<PathBuf>, text: &str) -> Self {
		let text = COMMENT_RE.replace_all(text, "");
		let mut definition = Self {
			path: path.into(),
			has_default: EXPORT_DEFAULT_RE.is_match(&text),
			export_equals: EXPORT_EQUALS_RE.is_match(&text),
			..Self::default()
		};

		for captures in EXPORT_ALL_RE.captures_iter(&text) {
			match captures.get(1) {
				Some(alias) => {
					definition.named.insert(alias.as_str().to_owned());
				},
				None => definition.export_all = true,
			}
		}
		for captures in EXPORT_LIST_RE.captures_iter(&text) {
			for specifier in captures[1].split(',') {
				let specifier = specifier.trim().trim_start_matches("type ").trim();
				let Some(exported) = specifier.split_whitespace().last() else {
					continue;
				};

				if exported == "default" {
					definition.has_default = true;
				} else {
					definition.named.insert(exported.to_owned());
				}
			}
		}
		for captures in EXPORT_DECLARATION_RE.captures_iter(&text) {
			definition.named.insert(captures[1].to_owned());
		}

		definition
	}

	/// Whether `name` is exported; `None` when a star export or `export =` makes it unknowable.
	pub fn exports(&self, name: &str) -> Option<bool> {
		if self.named.contains(name) {
			return Some(true);
		}
		if self.export_all || self.export_equals {
			return None;
		}

		Some(false)
	}
}

/// Memoized lookups, owned by one host run.
#[derive(Debug, Default)]
pub struct TypeDefinitionCache {
	entries: RefCell<HashMap<(String, PathBuf), Option<Rc<TypeDefinition>>>>,
}
impl TypeDefinitionCache {
	/// Declaration file of `package` as seen from `directory`, if one can be found and read.
	pub fn lookup(
		&self,
		fs: &dyn FileSystem,
		package: &str,
		directory: &Path,
	) -> Option<Rc<TypeDefinition>> {
		let key = (package.to_owned(), directory.to_path_buf());

		if let Some(hit) = self.entries.borrow().get(&key) {
			return hit.clone();
		}

		let found = find_definition(fs, package, directory).map(Rc::new);

		tracing::debug!(
			package,
			directory = %directory.display(),
			found = found.as_ref().map(|definition| definition.path.display().to_string()),
			"Resolved type definitions."
		);

		self.entries.borrow_mut().insert(key, found.clone());

		found
	}

	pub fn clear(&self) {
		self.entries.borrow_mut().clear();
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}

/// Splits a bare specifier into its package name and subpath (`@a/b/c` -> `@a/b`, `c`).
pub fn split_package(specifier: &str) -> Option<(&str, Option<&str>)> {
	if specifier.is_empty() || specifier.starts_with('.') || specifier.starts_with('/') {
		return None;
	}

	let mut slashes = specifier.match_indices('/').map(|(idx, _)| idx);
	let end = if specifier.starts_with('@') {
		slashes.next()?;
		slashes.next()
	} else {
		slashes.next()
	};

	match end {
		Some(end) => Some((&specifier[..end], Some(&specifier[end + 1..]))),
		None => Some((specifier, None)),
	}
}

/// `@scope/name` -> `scope__name`, the DefinitelyTyped folder name.
pub fn types_package_name(package: &str) -> String {
	package
		.strip_prefix('@')
		.map(|scoped| scoped.replacen('/', "__", 1))
		.unwrap_or_else(|| package.to_owned())
}

fn find_definition(fs: &dyn FileSystem, specifier: &str, directory: &Path) -> Option<TypeDefinition> {
	let (package, subpath) = split_package(specifier)?;
	let directory = normalize_path(directory);

	for ancestor in directory.ancestors() {
		let modules = ancestor.join("node_modules");

		if !fs.is_directory(&modules) {
			continue;
		}

		let own = modules.join(package);
		let typed = modules.join("@types").join(types_package_name(package));
		let candidates = match subpath {
			Some(subpath) => [own.as_path(), typed.as_path()]
				.into_iter()
				.flat_map(|base| {
					[base.join(format!("{subpath}.d.ts")), base.join(subpath).join("index.d.ts")]
				})
				.collect::<Vec<_>>(),
			None => package_candidates(fs, &own, &typed),
		};

		for candidate in candidates {
			if let Some(text) = fs.read_file(&candidate) {
				return Some(TypeDefinition::parse(candidate, &text));
			}
		}
	}

	None
}

fn package_candidates(fs: &dyn FileSystem, own: &Path, typed: &Path) -> Vec<PathBuf> {
	let mut candidates = Vec::new();

	if let Some(manifest) = fs.read_file(&own.join("package.json"))
		&& let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&manifest)
		&& let Some(types) =
			manifest.get("types").or_else(|| manifest.get("typings")).and_then(|value| value.as_str())
	{
		candidates.push(normalize_path(&own.join(types)));
	}

	candidates.push(own.join("index.d.ts"));

	if fs.is_directory(own) {
		candidates.extend(fs.list_files_matching(&format!("{}/*.d.ts", escape_glob(own))));
	}

	candidates.push(typed.join("index.d.ts"));

	candidates
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fs::MemoryFileSystem;

	#[test]
	fn export_surface_is_scanned() {
		let definition = TypeDefinition::parse(
			"index.d.ts",
			"// export default nothing\nexport declare function get(): void;\nexport { a, b as c };\nexport * from './more';\nexport * as ns from './ns';\n",
		);

		assert!(!definition.has_default);
		assert!(definition.export_all);
		assert_eq!(definition.named.iter().map(String::as_str).collect::<Vec<_>>(), vec![
			"a", "c", "get", "ns"
		]);
		assert!(
			TypeDefinition::parse("x.d.ts", "declare const x: X;\nexport { x as default };").has_default
		);
		assert_eq!(TypeDefinition::parse("x.d.ts", "export = x;").exports("anything"), None);
	}

	#[test]
	fn specifiers_split_into_package_and_subpath() {
		assert_eq!(split_package("lodash"), Some(("lodash", None)));
		assert_eq!(split_package("lodash/fp"), Some(("lodash", Some("fp"))));
		assert_eq!(split_package("@scope/pkg/sub"), Some(("@scope/pkg", Some("sub"))));
		assert_eq!(split_package("./local"), None);
		assert_eq!(types_package_name("@scope/pkg"), "scope__pkg");
	}

	#[test]
	fn lookup_walks_up_and_prefers_the_manifest() {
		let mut fs = MemoryFileSystem::default();

		fs.add_file("/p/node_modules/a/package.json", r#"{ "types": "./lib/a.d.ts" }"#);
		fs.add_file("/p/node_modules/a/lib/a.d.ts", "export default a;");
		fs.add_file("/p/node_modules/a/index.d.ts", "export const b: number;");
		fs.add_file("/p/node_modules/@types/s__b/index.d.ts", "export const c: number;");

		let cache = TypeDefinitionCache::default();
		let a = cache.lookup(&fs, "a", Path::new("/p/src/deep")).expect("found");
		let scoped = cache.lookup(&fs, "@s/b", Path::new("/p/src")).expect("found");

		assert_eq!(a.path, PathBuf::from("/p/node_modules/a/lib/a.d.ts"));
		assert!(a.has_default);
		assert_eq!(scoped.exports("c"), Some(true));
		assert!(cache.lookup(&fs, "missing", Path::new("/p/src")).is_none());
		assert_eq!(cache.len(), 3);

		cache.clear();

		assert!(cache.is_empty());
	}
}
