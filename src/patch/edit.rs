use std::fmt;

use text_size::{TextRange, TextSize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
	pub range: TextRange,
	pub replacement: String,
}
impl Edit {
	pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
		Self { range: TextRange::empty(offset), replacement: text.into() }
	}

	pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
		Self { range, replacement: text.into() }
	}

	pub fn delete(range: TextRange) -> Self {
		Self { range, replacement: String::new() }
	}

	/// Whether two edits cannot be applied together. Zero-width inserts at the same offset, or
	/// an insert at the start of a replacement, conflict because their order is ambiguous.
	pub fn conflicts_with(&self, other: &Self) -> bool {
		let (a, b) = (self.range, other.range);

		a.start() == b.start() || (a.start() < b.end() && b.start() < a.end())
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchError {
	Empty,
	Overlap { first: TextRange, second: TextRange },
	OutOfBounds { range: TextRange, len: usize },
	NotCharBoundary { offset: TextSize },
}
impl fmt::Display for PatchError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => write!(f, "Patch has no edits."),
			Self::Overlap { first, second } =>
				write!(f, "Edits at {first:?} and {second:?} overlap."),
			Self::OutOfBounds { range, len } =>
				write!(f, "Edit at {range:?} is outside of a text of {len} bytes."),
			Self::NotCharBoundary { offset } =>
				write!(f, "Edit boundary {offset:?} splits a character."),
		}
	}
}
impl std::error::Error for PatchError {}

/// Sorted, pairwise non-overlapping edits over one source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
	edits: Vec<Edit>,
}
impl Patch {
	pub fn new(mut edits: Vec<Edit>) -> Result<Self, PatchError> {
		if edits.is_empty() {
			return Err(PatchError::Empty);
		}

		edits.sort_by_key(|edit| (edit.range.start(), edit.range.end()));

		for pair in edits.windows(2) {
			if pair[0].conflicts_with(&pair[1]) {
				return Err(PatchError::Overlap { first: pair[0].range, second: pair[1].range });
			}
		}

		Ok(Self { edits })
	}

	pub fn single(edit: Edit) -> Self {
		Self { edits: vec![edit] }
	}

	pub fn edits(&self) -> &[Edit] {
		&self.edits
	}

	/// Range from the first edit's start to the last edit's end.
	pub fn cover(&self) -> TextRange {
		let start = self.edits.first().map(|edit| edit.range.start()).unwrap_or_default();
		let end = self.edits.last().map(|edit| edit.range.end()).unwrap_or_default();

		TextRange::new(start, end.max(start))
	}

	/// Whether the covers of two patches collide.
	pub fn intersects(&self, other: &Self) -> bool {
		let (a, b) = (self.cover(), other.cover());

		a.start() == b.start() || (a.start() < b.end() && b.start() < a.end())
	}

	pub fn merge(self, other: Self) -> Result<Self, PatchError> {
		let mut edits = self.edits;

		edits.extend(other.edits);

		Self::new(edits)
	}

	/// Applies every edit right to left so earlier offsets stay valid.
	pub fn apply(&self, text: &str) -> Result<String, PatchError> {
		let mut out = text.to_owned();

		for edit in self.edits.iter().rev() {
			let (start, end) = (usize::from(edit.range.start()), usize::from(edit.range.end()));

			if end > out.len() {
				return Err(PatchError::OutOfBounds { range: edit.range, len: text.len() });
			}
			if !out.is_char_boundary(start) {
				return Err(PatchError::NotCharBoundary { offset: edit.range.start() });
			}
			if !out.is_char_boundary(end) {
				return Err(PatchError::NotCharBoundary { offset: edit.range.end() });
			}

			out.replace_range(start..end, &edit.replacement);
		}

		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn range(start: u32, end: u32) -> TextRange {
		TextRange::new(TextSize::from(start), TextSize::from(end))
	}

	#[test]
	fn edits_are_sorted_and_applied_right_to_left() {
		let patch = Patch::new(vec![
			Edit::replace(range(6, 9), "key"),
			Edit::replace(range(0, 3), "ref"),
			Edit::insert(TextSize::from(4), "!"),
		])
		.expect("valid patch");

		assert_eq!(patch.edits()[0].range, range(0, 3));
		assert_eq!(patch.apply("abc d efg h").expect("applies"), "ref !d key h");
		assert_eq!(patch.cover(), range(0, 9));
	}

	#[test]
	fn overlapping_and_ambiguous_edits_are_rejected() {
		assert!(matches!(
			Patch::new(vec![Edit::replace(range(0, 4), "x"), Edit::replace(range(3, 5), "y")]),
			Err(PatchError::Overlap { .. })
		));
		assert!(matches!(
			Patch::new(vec![
				Edit::insert(TextSize::from(2), "x"),
				Edit::insert(TextSize::from(2), "y")
			]),
			Err(PatchError::Overlap { .. })
		));
		assert!(matches!(
			Patch::new(vec![Edit::insert(TextSize::from(2), "x"), Edit::delete(range(2, 3))]),
			Err(PatchError::Overlap { .. })
		));
		assert!(Patch::new(vec![Edit::delete(range(0, 2)), Edit::insert(TextSize::from(2), "x")]).is_ok());
	}

	#[test]
	fn apply_rejects_out_of_bounds_and_split_characters() {
		let patch = Patch::single(Edit::delete(range(1, 2)));

		assert!(matches!(patch.apply("é"), Err(PatchError::NotCharBoundary { .. })));
		assert!(matches!(patch.apply("a"), Err(PatchError::OutOfBounds { .. })));
	}

	#[test]
	fn patches_with_touching_covers_do_not_intersect() {
		let first = Patch::single(Edit::replace(range(0, 3), "a"));
		let second = Patch::single(Edit::replace(range(3, 5), "b"));
		let third = Patch::single(Edit::insert(TextSize::from(4), "c"));

		assert!(!first.intersects(&second));
		assert!(second.intersects(&third));
	}
}
