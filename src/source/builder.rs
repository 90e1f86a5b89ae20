use std::fmt;

use text_size::TextRange;

use super::tree::{NodeId, NodeKind, SyntaxTree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
	DanglingChild { parent: NodeId, child: NodeId },
	SharedChild { child: NodeId },
	ChildOutsideParent { parent: String, child: String, parent_range: TextRange, child_range: TextRange },
	OverlappingSiblings { first: String, second: String, at: TextRange },
}
impl fmt::Display for TreeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::DanglingChild { parent, child } =>
				write!(f, "Node {parent} refers to missing child {child}."),
			Self::SharedChild { child } => write!(f, "Node {child} has more than one parent."),
			Self::ChildOutsideParent { parent, child, parent_range, child_range } => write!(
				f,
				"{child} at {child_range:?} is not contained in its parent {parent} at {parent_range:?}."
			),
			Self::OverlappingSiblings { first, second, at } =>
				write!(f, "Sibling nodes {first} and {second} overlap at {at:?}."),
		}
	}
}
impl std::error::Error for TreeError {}

/// Bottom-up arena builder: children are pushed before the node that owns them.
#[derive(Debug, Default)]
pub struct TreeBuilder {
	nodes: Vec<(NodeKind, TextRange)>,
}
impl TreeBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
		let id = NodeId::new(self.nodes.len());

		self.nodes.push((kind, range));

		id
	}

	pub fn kind(&self, id: NodeId) -> &NodeKind {
		&self.nodes[id.index()].0
	}

	pub fn range(&self, id: NodeId) -> TextRange {
		self.nodes[id.index()].1
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Links parents, sorts children by position, and checks the range invariants.
	pub fn finish(self, root: NodeId) -> Result<SyntaxTree, TreeError> {
		let count = self.nodes.len();
		let mut children = Vec::with_capacity(count);
		let mut parents = vec![None; count];

		for (idx, (kind, range)) in self.nodes.iter().enumerate() {
			let parent = NodeId::new(idx);
			let mut ids = kind.child_ids();

			ids.sort_by_key(|id| (id.index() < count).then(|| self.nodes[id.index()].1.start()));
			ids.dedup();

			for child in &ids {
				if child.index() >= count {
					return Err(TreeError::DanglingChild { parent, child: *child });
				}
				if parents[child.index()].is_some_and(|existing| existing != parent) {
					return Err(TreeError::SharedChild { child: *child });
				}

				parents[child.index()] = Some(parent);

				let (child_kind, child_range) = &self.nodes[child.index()];

				if !range.contains_range(*child_range) {
					return Err(TreeError::ChildOutsideParent {
						parent: kind.type_name().to_owned(),
						child: child_kind.type_name().to_owned(),
						parent_range: *range,
						child_range: *child_range,
					});
				}
			}
			for pair in ids.windows(2) {
				let (first_kind, first_range) = &self.nodes[pair[0].index()];
				let (second_kind, second_range) = &self.nodes[pair[1].index()];

				if first_range.end() > second_range.start() {
					return Err(TreeError::OverlappingSiblings {
						first: first_kind.type_name().to_owned(),
						second: second_kind.type_name().to_owned(),
						at: *second_range,
					});
				}
			}

			children.push(ids);
		}

		Ok(SyntaxTree::from_parts(self.nodes, children, parents, root))
	}
}
