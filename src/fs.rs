//! File-system access for the path-resolution and type-definition rules.
//!
//! Every query fails soft: an unreadable path reads as missing.

use std::{
	cell::RefCell,
	collections::{BTreeMap, BTreeSet, HashMap},
	fs,
	path::{Component, Path, PathBuf},
};

pub trait FileSystem {
	fn exists(&self, path: &Path) -> bool;

	fn is_directory(&self, path: &Path) -> bool;

	fn read_file(&self, path: &Path) -> Option<String>;

	/// Files matching a glob pattern, sorted.
	fn list_files_matching(&self, pattern: &str) -> Vec<PathBuf>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OsFileSystem;
impl FileSystem for OsFileSystem {
	fn exists(&self, path: &Path) -> bool {
		path.exists()
	}

	fn is_directory(&self, path: &Path) -> bool {
		path.is_dir()
	}

	fn read_file(&self, path: &Path) -> Option<String> {
		fs::read_to_string(path).ok()
	}

	fn list_files_matching(&self, pattern: &str) -> Vec<PathBuf> {
		let Ok(paths) = glob::glob(pattern) else {
			tracing::debug!(pattern, "Ignoring invalid glob pattern.");

			return Vec::new();
		};
		let mut files = paths.filter_map(Result::ok).filter(|path| path.is_file()).collect::<Vec<_>>();

		files.sort();

		files
	}
}

/// Files held in memory; directories are implied by file paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryFileSystem {
	files: BTreeMap<PathBuf, String>,
	directories: BTreeSet<PathBuf>,
}
impl MemoryFileSystem {
	pub fn add_file(&mut self, path: impl AsRef<Path>, contents: &str) {
		let path = normalize_path(path.as_ref());

		for ancestor in path.ancestors().skip(1) {
			if ancestor.as_os_str().is_empty() {
				break;
			}

			self.directories.insert(ancestor.to_path_buf());
		}

		self.files.insert(path, contents.to_owned());
	}
}
impl FileSystem for MemoryFileSystem {
	fn exists(&self, path: &Path) -> bool {
		let path = normalize_path(path);

		self.files.contains_key(&path) || self.directories.contains(&path)
	}

	fn is_directory(&self, path: &Path) -> bool {
		self.directories.contains(&normalize_path(path))
	}

	fn read_file(&self, path: &Path) -> Option<String> {
		self.files.get(&normalize_path(path)).cloned()
	}

	fn list_files_matching(&self, pattern: &str) -> Vec<PathBuf> {
		let Ok(pattern) = glob::Pattern::new(pattern) else {
			return Vec::new();
		};

		self.files.keys().filter(|path| pattern.matches_path(path)).cloned().collect()
	}
}

/// Memoizes every query of the wrapped file system for one host run.
pub struct CachedFileSystem {
	inner: Box<dyn FileSystem>,
	exists: RefCell<HashMap<PathBuf, bool>>,
	directories: RefCell<HashMap<PathBuf, bool>>,
	contents: RefCell<HashMap<PathBuf, Option<String>>>,
	listings: RefCell<HashMap<String, Vec<PathBuf>>>,
}
impl CachedFileSystem {
	pub fn new(inner: impl FileSystem + 'static) -> Self {
		Self {
			inner: Box::new(inner),
			exists: RefCell::default(),
			directories: RefCell::default(),
			contents: RefCell::default(),
			listings: RefCell::default(),
		}
	}

	/// Forgets every file read so far. Existence and listings stay cached.
	pub fn forget_contents(&self) {
		self.contents.borrow_mut().clear();
	}
}
impl FileSystem for CachedFileSystem {
	fn exists(&self, path: &Path) -> bool {
		if let Some(hit) = self.exists.borrow().get(path) {
			return *hit;
		}

		let found = self.inner.exists(path);

		self.exists.borrow_mut().insert(path.to_path_buf(), found);

		found
	}

	fn is_directory(&self, path: &Path) -> bool {
		if let Some(hit) = self.directories.borrow().get(path) {
			return *hit;
		}

		let found = self.inner.is_directory(path);

		self.directories.borrow_mut().insert(path.to_path_buf(), found);

		found
	}

	fn read_file(&self, path: &Path) -> Option<String> {
		if let Some(hit) = self.contents.borrow().get(path) {
			return hit.clone();
		}

		let contents = self.inner.read_file(path);

		self.contents.borrow_mut().insert(path.to_path_buf(), contents.clone());

		contents
	}

	fn list_files_matching(&self, pattern: &str) -> Vec<PathBuf> {
		if let Some(hit) = self.listings.borrow().get(pattern) {
			return hit.clone();
		}

		let files = self.inner.list_files_matching(pattern);

		self.listings.borrow_mut().insert(pattern.to_owned(), files.clone());

		files
	}
}

/// Resolves `.` and `..` components lexically, without touching the disk.
///
/// `..` above a relative root is kept so `../x` stays `../x`.
pub fn normalize_path(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {},
			Component::ParentDir => {
				let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
					&& out.pop();

				if !popped && !out.has_root() {
					out.push("..");
				}
			},
			other => out.push(other.as_os_str()),
		}
	}

	out
}

/// Escapes glob metacharacters so `path` matches itself.
pub fn escape_glob(path: &Path) -> String {
	glob::Pattern::escape(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	#[test]
	fn paths_normalize_lexically() {
		assert_eq!(normalize_path(Path::new("/a/b/./../c")), PathBuf::from("/a/c"));
		assert_eq!(normalize_path(Path::new("../x/./y")), PathBuf::from("../x/y"));
		assert_eq!(normalize_path(Path::new("/..")), PathBuf::from("/"));
	}

	#[test]
	fn memory_file_system_implies_directories() {
		let mut fs = MemoryFileSystem::default();

		fs.add_file("/p/src/lib/index.js", "");
		fs.add_file("/p/src/main.js", "");

		assert!(fs.is_directory(Path::new("/p/src/lib")));
		assert!(fs.exists(Path::new("/p/src/./lib/index.js")));
		assert!(!fs.is_directory(Path::new("/p/src/main.js")));
		assert_eq!(fs.list_files_matching("/p/src/lib/*.js"), vec![PathBuf::from(
			"/p/src/lib/index.js"
		)]);
	}

	struct Counting(&'static Cell<usize>);
	impl FileSystem for Counting {
		fn exists(&self, _: &Path) -> bool {
			self.0.set(self.0.get() + 1);

			true
		}

		fn is_directory(&self, _: &Path) -> bool {
			false
		}

		fn read_file(&self, _: &Path) -> Option<String> {
			None
		}

		fn list_files_matching(&self, _: &str) -> Vec<PathBuf> {
			Vec::new()
		}
	}

	struct Shared(&'static RefCell<String>);
	impl FileSystem for Shared {
		fn exists(&self, _: &Path) -> bool {
			true
		}

		fn is_directory(&self, _: &Path) -> bool {
			false
		}

		fn read_file(&self, _: &Path) -> Option<String> {
			Some(self.0.borrow().clone())
		}

		fn list_files_matching(&self, _: &str) -> Vec<PathBuf> {
			Vec::new()
		}
	}

	#[test]
	fn forgotten_contents_are_read_again() {
		let text: &'static RefCell<String> = Box::leak(Box::new(RefCell::new(String::from("a"))));
		let fs = CachedFileSystem::new(Shared(text));
		let index = Path::new("/p/index.js");

		assert_eq!(fs.read_file(index).as_deref(), Some("a"));

		*text.borrow_mut() = String::from("b");

		assert_eq!(fs.read_file(index).as_deref(), Some("a"));

		fs.forget_contents();

		assert_eq!(fs.read_file(index).as_deref(), Some("b"));
	}

	#[test]
	fn cached_file_system_asks_once_per_path() {
		let calls: &'static Cell<usize> = Box::leak(Box::new(Cell::new(0)));
		let fs = CachedFileSystem::new(Counting(calls));

		assert!(fs.exists(Path::new("/a")));
		assert!(fs.exists(Path::new("/a")));
		assert!(fs.exists(Path::new("/b")));
		assert_eq!(calls.get(), 2);
	}
}
