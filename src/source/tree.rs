//! Arena-allocated syntax tree.
//!
//! Every node of one parsed file lives in a single `Vec`; parent and child links are
//! [`NodeId`] indices into it. The arena is built once by [`super::TreeBuilder`] and never
//! mutated afterwards.

use std::fmt;

use text_size::TextRange;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);
impl NodeId {
	pub(crate) fn new(index: usize) -> Self {
		Self(index as u32)
	}

	/// Position of the node in the arena.
	pub fn index(self) -> usize {
		self.0 as usize
	}
}
impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceType {
	Script,
	Module,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclarationKind {
	Var,
	Let,
	Const,
}
impl DeclarationKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Var => "var",
			Self::Let => "let",
			Self::Const => "const",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
	Init,
	Get,
	Set,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
	Constructor,
	Method,
	Get,
	Set,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
	String(String),
	Number(f64),
	Boolean(bool),
	Null,
	RegExp { pattern: String, flags: String },
	BigInt(String),
}

/// Shared shape of function declarations, function expressions and arrow functions.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
	pub id: Option<NodeId>,
	pub params: Vec<NodeId>,
	/// A `BlockStatement`, or any expression for concise arrow bodies.
	pub body: NodeId,
	pub is_async: bool,
	pub is_generator: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Class {
	pub id: Option<NodeId>,
	pub super_class: Option<NodeId>,
	pub body: NodeId,
}

/// Closed set of node shapes the matchers understand.
///
/// Node types that no matcher inspects (JSX, TypeScript type nodes, decorators, ...) load as
/// [`NodeKind::Unknown`] so the tree stays complete and range invariants still hold.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
	Program { body: Vec<NodeId>, source_type: SourceType },

	ExpressionStatement { expression: NodeId, directive: Option<String> },
	BlockStatement { body: Vec<NodeId> },
	StaticBlock { body: Vec<NodeId> },
	EmptyStatement,
	DebuggerStatement,
	ReturnStatement { argument: Option<NodeId> },
	IfStatement { test: NodeId, consequent: NodeId, alternate: Option<NodeId> },
	ForStatement { init: Option<NodeId>, test: Option<NodeId>, update: Option<NodeId>, body: NodeId },
	ForInStatement { left: NodeId, right: NodeId, body: NodeId },
	ForOfStatement { left: NodeId, right: NodeId, body: NodeId, is_await: bool },
	WhileStatement { test: NodeId, body: NodeId },
	DoWhileStatement { body: NodeId, test: NodeId },
	TryStatement { block: NodeId, handler: Option<NodeId>, finalizer: Option<NodeId> },
	CatchClause { param: Option<NodeId>, body: NodeId },
	ThrowStatement { argument: NodeId },
	SwitchStatement { discriminant: NodeId, cases: Vec<NodeId> },
	SwitchCase { test: Option<NodeId>, consequent: Vec<NodeId> },
	BreakStatement { label: Option<NodeId> },
	ContinueStatement { label: Option<NodeId> },
	LabeledStatement { label: NodeId, body: NodeId },
	VariableDeclaration { kind: DeclarationKind, declarations: Vec<NodeId> },
	VariableDeclarator { id: NodeId, init: Option<NodeId> },
	FunctionDeclaration(Function),
	ClassDeclaration(Class),
	ClassBody { body: Vec<NodeId> },
	MethodDefinition { key: NodeId, value: NodeId, kind: MethodKind, computed: bool, is_static: bool },
	PropertyDefinition { key: NodeId, value: Option<NodeId>, computed: bool, is_static: bool },

	ImportDeclaration { specifiers: Vec<NodeId>, source: NodeId },
	ImportDefaultSpecifier { local: NodeId },
	ImportNamespaceSpecifier { local: NodeId },
	/// `imported` and `local` are the same node for `import { a }`.
	ImportSpecifier { imported: NodeId, local: NodeId },
	ExportNamedDeclaration { declaration: Option<NodeId>, specifiers: Vec<NodeId>, source: Option<NodeId> },
	ExportDefaultDeclaration { declaration: NodeId },
	ExportAllDeclaration { exported: Option<NodeId>, source: NodeId },
	/// `local` and `exported` are the same node for `export { a }`.
	ExportSpecifier { local: NodeId, exported: NodeId },

	Identifier { name: String, type_annotation: Option<NodeId>, optional: bool },
	PrivateIdentifier { name: String },
	JsxIdentifier { name: String },
	Literal { value: LiteralValue, raw: String },
	TemplateLiteral { quasis: Vec<NodeId>, expressions: Vec<NodeId> },
	TemplateElement { raw: String, tail: bool },
	TaggedTemplateExpression { tag: NodeId, quasi: NodeId },
	ThisExpression,
	Super,
	ArrayExpression { elements: Vec<Option<NodeId>> },
	ObjectExpression { properties: Vec<NodeId> },
	/// `key` and `value` are the same node (or `key` sits inside `value`) when `shorthand`.
	Property { key: NodeId, value: NodeId, kind: PropertyKind, computed: bool, shorthand: bool, method: bool },
	SpreadElement { argument: NodeId },
	FunctionExpression(Function),
	ArrowFunctionExpression(Function),
	ClassExpression(Class),
	UnaryExpression { operator: String, argument: NodeId },
	UpdateExpression { operator: String, prefix: bool, argument: NodeId },
	BinaryExpression { operator: String, left: NodeId, right: NodeId },
	LogicalExpression { operator: String, left: NodeId, right: NodeId },
	AssignmentExpression { operator: String, left: NodeId, right: NodeId },
	ConditionalExpression { test: NodeId, consequent: NodeId, alternate: NodeId },
	CallExpression { callee: NodeId, arguments: Vec<NodeId>, optional: bool },
	NewExpression { callee: NodeId, arguments: Vec<NodeId> },
	MemberExpression { object: NodeId, property: NodeId, computed: bool, optional: bool },
	ChainExpression { expression: NodeId },
	SequenceExpression { expressions: Vec<NodeId> },
	AwaitExpression { argument: NodeId },
	YieldExpression { argument: Option<NodeId>, delegate: bool },
	ImportExpression { source: NodeId },
	MetaProperty { meta: NodeId, property: NodeId },

	ObjectPattern { properties: Vec<NodeId> },
	ArrayPattern { elements: Vec<Option<NodeId>> },
	RestElement { argument: NodeId },
	AssignmentPattern { left: NodeId, right: NodeId },

	Unknown { type_name: String, children: Vec<NodeId> },
}
impl NodeKind {
	/// ESTree `type` name of the node.
	pub fn type_name(&self) -> &str {
		match self {
			Self::Program { .. } => "Program",
			Self::ExpressionStatement { .. } => "ExpressionStatement",
			Self::BlockStatement { .. } => "BlockStatement",
			Self::StaticBlock { .. } => "StaticBlock",
			Self::EmptyStatement => "EmptyStatement",
			Self::DebuggerStatement => "DebuggerStatement",
			Self::ReturnStatement { .. } => "ReturnStatement",
			Self::IfStatement { .. } => "IfStatement",
			Self::ForStatement { .. } => "ForStatement",
			Self::ForInStatement { .. } => "ForInStatement",
			Self::ForOfStatement { .. } => "ForOfStatement",
			Self::WhileStatement { .. } => "WhileStatement",
			Self::DoWhileStatement { .. } => "DoWhileStatement",
			Self::TryStatement { .. } => "TryStatement",
			Self::CatchClause { .. } => "CatchClause",
			Self::ThrowStatement { .. } => "ThrowStatement",
			Self::SwitchStatement { .. } => "SwitchStatement",
			Self::SwitchCase { .. } => "SwitchCase",
			Self::BreakStatement { .. } => "BreakStatement",
			Self::ContinueStatement { .. } => "ContinueStatement",
			Self::LabeledStatement { .. } => "LabeledStatement",
			Self::VariableDeclaration { .. } => "VariableDeclaration",
			Self::VariableDeclarator { .. } => "VariableDeclarator",
			Self::FunctionDeclaration(_) => "FunctionDeclaration",
			Self::ClassDeclaration(_) => "ClassDeclaration",
			Self::ClassBody { .. } => "ClassBody",
			Self::MethodDefinition { .. } => "MethodDefinition",
			Self::PropertyDefinition { .. } => "PropertyDefinition",
			Self::ImportDeclaration { .. } => "ImportDeclaration",
			Self::ImportDefaultSpecifier { .. } => "ImportDefaultSpecifier",
			Self::ImportNamespaceSpecifier { .. } => "ImportNamespaceSpecifier",
			Self::ImportSpecifier { .. } => "ImportSpecifier",
			Self::ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
			Self::ExportDefaultDeclaration { .. } => "ExportDefaultDeclaration",
			Self::ExportAllDeclaration { .. } => "ExportAllDeclaration",
			Self::ExportSpecifier { .. } => "ExportSpecifier",
			Self::Identifier { .. } => "Identifier",
			Self::PrivateIdentifier { .. } => "PrivateIdentifier",
			Self::JsxIdentifier { .. } => "JSXIdentifier",
			Self::Literal { .. } => "Literal",
			Self::TemplateLiteral { .. } => "TemplateLiteral",
			Self::TemplateElement { .. } => "TemplateElement",
			Self::TaggedTemplateExpression { .. } => "TaggedTemplateExpression",
			Self::ThisExpression => "ThisExpression",
			Self::Super => "Super",
			Self::ArrayExpression { .. } => "ArrayExpression",
			Self::ObjectExpression { .. } => "ObjectExpression",
			Self::Property { .. } => "Property",
			Self::SpreadElement { .. } => "SpreadElement",
			Self::FunctionExpression(_) => "FunctionExpression",
			Self::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
			Self::ClassExpression(_) => "ClassExpression",
			Self::UnaryExpression { .. } => "UnaryExpression",
			Self::UpdateExpression { .. } => "UpdateExpression",
			Self::BinaryExpression { .. } => "BinaryExpression",
			Self::LogicalExpression { .. } => "LogicalExpression",
			Self::AssignmentExpression { .. } => "AssignmentExpression",
			Self::ConditionalExpression { .. } => "ConditionalExpression",
			Self::CallExpression { .. } => "CallExpression",
			Self::NewExpression { .. } => "NewExpression",
			Self::MemberExpression { .. } => "MemberExpression",
			Self::ChainExpression { .. } => "ChainExpression",
			Self::SequenceExpression { .. } => "SequenceExpression",
			Self::AwaitExpression { .. } => "AwaitExpression",
			Self::YieldExpression { .. } => "YieldExpression",
			Self::ImportExpression { .. } => "ImportExpression",
			Self::MetaProperty { .. } => "MetaProperty",
			Self::ObjectPattern { .. } => "ObjectPattern",
			Self::ArrayPattern { .. } => "ArrayPattern",
			Self::RestElement { .. } => "RestElement",
			Self::AssignmentPattern { .. } => "AssignmentPattern",
			Self::Unknown { type_name, .. } => type_name.as_str(),
		}
	}

	/// Child ids in field order. Shared ids (shorthand forms) may repeat; the tree dedups
	/// and sorts them by range when it is finished.
	pub(crate) fn child_ids(&self) -> Vec<NodeId> {
		let mut out = Vec::new();

		match self {
			Self::Program { body, .. }
			| Self::BlockStatement { body }
			| Self::StaticBlock { body }
			| Self::ClassBody { body } => out.extend(body),
			Self::ExpressionStatement { expression, .. } => out.push(*expression),
			Self::EmptyStatement
			| Self::DebuggerStatement
			| Self::ThisExpression
			| Self::Super
			| Self::PrivateIdentifier { .. }
			| Self::JsxIdentifier { .. }
			| Self::Literal { .. }
			| Self::TemplateElement { .. } => {},
			Self::ReturnStatement { argument } | Self::YieldExpression { argument, .. } =>
				out.extend(argument),
			Self::IfStatement { test, consequent, alternate } => {
				out.push(*test);
				out.push(*consequent);
				out.extend(alternate);
			},
			Self::ConditionalExpression { test, consequent, alternate } => {
				out.extend([*test, *consequent, *alternate]);
			},
			Self::ForStatement { init, test, update, body } => {
				out.extend(init);
				out.extend(test);
				out.extend(update);
				out.push(*body);
			},
			Self::ForInStatement { left, right, body }
			| Self::ForOfStatement { left, right, body, .. } => out.extend([*left, *right, *body]),
			Self::WhileStatement { test, body } | Self::DoWhileStatement { body, test } =>
				out.extend([*test, *body]),
			Self::TryStatement { block, handler, finalizer } => {
				out.push(*block);
				out.extend(handler);
				out.extend(finalizer);
			},
			Self::CatchClause { param, body } => {
				out.extend(param);
				out.push(*body);
			},
			Self::ThrowStatement { argument }
			| Self::SpreadElement { argument }
			| Self::AwaitExpression { argument }
			| Self::RestElement { argument }
			| Self::UnaryExpression { argument, .. }
			| Self::UpdateExpression { argument, .. } => out.push(*argument),
			Self::SwitchStatement { discriminant, cases } => {
				out.push(*discriminant);
				out.extend(cases);
			},
			Self::SwitchCase { test, consequent } => {
				out.extend(test);
				out.extend(consequent);
			},
			Self::BreakStatement { label } | Self::ContinueStatement { label } => out.extend(label),
			Self::LabeledStatement { label, body } => out.extend([*label, *body]),
			Self::VariableDeclaration { declarations, .. } => out.extend(declarations),
			Self::VariableDeclarator { id, init } => {
				out.push(*id);
				out.extend(init);
			},
			Self::FunctionDeclaration(function)
			| Self::FunctionExpression(function)
			| Self::ArrowFunctionExpression(function) => {
				out.extend(function.id);
				out.extend(&function.params);
				out.push(function.body);
			},
			Self::ClassDeclaration(class) | Self::ClassExpression(class) => {
				out.extend(class.id);
				out.extend(class.super_class);
				out.push(class.body);
			},
			Self::MethodDefinition { key, value, .. } => out.extend([*key, *value]),
			Self::PropertyDefinition { key, value, .. } => {
				out.push(*key);
				out.extend(value);
			},
			Self::ImportDeclaration { specifiers, source } => {
				out.extend(specifiers);
				out.push(*source);
			},
			Self::ImportDefaultSpecifier { local } | Self::ImportNamespaceSpecifier { local } =>
				out.push(*local),
			Self::ImportSpecifier { imported, local } => out.extend([*imported, *local]),
			Self::ExportNamedDeclaration { declaration, specifiers, source } => {
				out.extend(declaration);
				out.extend(specifiers);
				out.extend(source);
			},
			Self::ExportDefaultDeclaration { declaration } => out.push(*declaration),
			Self::ExportAllDeclaration { exported, source } => {
				out.extend(exported);
				out.push(*source);
			},
			Self::ExportSpecifier { local, exported } => out.extend([*local, *exported]),
			Self::Identifier { type_annotation, .. } => out.extend(type_annotation),
			Self::TemplateLiteral { quasis, expressions } => {
				out.extend(quasis);
				out.extend(expressions);
			},
			Self::TaggedTemplateExpression { tag, quasi } => out.extend([*tag, *quasi]),
			Self::ArrayExpression { elements } | Self::ArrayPattern { elements } =>
				out.extend(elements.iter().flatten()),
			Self::ObjectExpression { properties } | Self::ObjectPattern { properties } =>
				out.extend(properties),
			Self::Property { key, value, shorthand, .. } => {
				if !*shorthand {
					out.push(*key);
				}

				out.push(*value);
			},
			Self::BinaryExpression { left, right, .. }
			| Self::LogicalExpression { left, right, .. }
			| Self::AssignmentExpression { left, right, .. }
			| Self::AssignmentPattern { left, right } => out.extend([*left, *right]),
			Self::CallExpression { callee, arguments, .. }
			| Self::NewExpression { callee, arguments } => {
				out.push(*callee);
				out.extend(arguments);
			},
			Self::MemberExpression { object, property, .. } => out.extend([*object, *property]),
			Self::ChainExpression { expression } => out.push(*expression),
			Self::SequenceExpression { expressions } => out.extend(expressions),
			Self::ImportExpression { source } => out.push(*source),
			Self::MetaProperty { meta, property } => out.extend([*meta, *property]),
			Self::Unknown { children, .. } => out.extend(children),
		}

		out
	}

	pub fn is_function(&self) -> bool {
		matches!(
			self,
			Self::FunctionDeclaration(_)
				| Self::FunctionExpression(_)
				| Self::ArrowFunctionExpression(_)
		)
	}

	pub fn function(&self) -> Option<&Function> {
		match self {
			Self::FunctionDeclaration(function)
			| Self::FunctionExpression(function)
			| Self::ArrowFunctionExpression(function) => Some(function),
			_ => None,
		}
	}

	pub fn class(&self) -> Option<&Class> {
		match self {
			Self::ClassDeclaration(class) | Self::ClassExpression(class) => Some(class),
			_ => None,
		}
	}

	/// Statement list owned by this node, if it owns one.
	pub fn statement_list(&self) -> Option<&[NodeId]> {
		match self {
			Self::Program { body, .. }
			| Self::BlockStatement { body }
			| Self::StaticBlock { body } => Some(body),
			Self::SwitchCase { consequent, .. } => Some(consequent),
			_ => None,
		}
	}
}

#[derive(Clone, Debug)]
struct NodeData {
	kind: NodeKind,
	range: TextRange,
	parent: Option<NodeId>,
}

/// Owning store for every node of one file.
#[derive(Clone, Debug)]
pub struct SyntaxTree {
	nodes: Vec<NodeData>,
	children: Vec<Vec<NodeId>>,
	root: NodeId,
}
impl SyntaxTree {
	pub(crate) fn from_parts(
		nodes: Vec<(NodeKind, TextRange)>,
		children: Vec<Vec<NodeId>>,
		parents: Vec<Option<NodeId>>,
		root: NodeId,
	) -> Self {
		let nodes = nodes
			.into_iter()
			.zip(parents)
			.map(|((kind, range), parent)| NodeData { kind, range, parent })
			.collect();

		Self { nodes, children, root }
	}

	pub fn root(&self) -> NodeId {
		self.root
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn kind(&self, id: NodeId) -> &NodeKind {
		&self.nodes[id.index()].kind
	}

	pub fn range(&self, id: NodeId) -> TextRange {
		self.nodes[id.index()].range
	}

	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.nodes[id.index()].parent
	}

	/// Children sorted by source position, shared shorthand nodes listed once.
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		&self.children[id.index()]
	}

	pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
		Ancestors { tree: self, next: self.parent(id) }
	}

	/// Pre-order walk of `id` and everything below it, driven by an explicit stack.
	pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
		Descendants { tree: self, stack: vec![id] }
	}

	pub fn preorder(&self) -> Descendants<'_> {
		self.descendants(self.root)
	}

	pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
		let parent = self.parent(id)?;
		let siblings = self.children(parent);
		let pos = siblings.iter().position(|sibling| *sibling == id)?;

		siblings.get(pos + 1).copied()
	}

	pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
		let parent = self.parent(id)?;
		let siblings = self.children(parent);
		let pos = siblings.iter().position(|sibling| *sibling == id)?;

		pos.checked_sub(1).map(|prev| siblings[prev])
	}

	pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
		match self.kind(id) {
			NodeKind::Identifier { name, .. } => Some(name),
			_ => None,
		}
	}

	pub fn string_value(&self, id: NodeId) -> Option<&str> {
		match self.kind(id) {
			NodeKind::Literal { value: LiteralValue::String(value), .. } => Some(value),
			_ => None,
		}
	}

	/// Static name of a property-like key: identifiers and string/number literals.
	pub fn static_key_name(&self, key: NodeId, computed: bool) -> Option<String> {
		match self.kind(key) {
			NodeKind::Identifier { name, .. } if !computed => Some(name.clone()),
			NodeKind::Literal { value: LiteralValue::String(value), .. } => Some(value.clone()),
			NodeKind::Literal { value: LiteralValue::Number(_), raw } => Some(raw.clone()),
			_ => None,
		}
	}

	/// Whether `ancestor` is `id` or one of its ancestors.
	pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
		id == ancestor || self.ancestors(id).any(|node| node == ancestor)
	}

	/// Smallest node whose range covers `range`.
	pub fn covering_node(&self, range: TextRange) -> NodeId {
		let mut current = self.root;

		'descend: loop {
			for child in self.children(current) {
				if self.range(*child).contains_range(range) {
					current = *child;

					continue 'descend;
				}
			}

			return current;
		}
	}
}

pub struct Ancestors<'a> {
	tree: &'a SyntaxTree,
	next: Option<NodeId>,
}
impl Iterator for Ancestors<'_> {
	type Item = NodeId;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next?;

		self.next = self.tree.parent(current);

		Some(current)
	}
}

pub struct Descendants<'a> {
	tree: &'a SyntaxTree,
	stack: Vec<NodeId>,
}
impl Iterator for Descendants<'_> {
	type Item = NodeId;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.stack.pop()?;

		self.stack.extend(self.tree.children(current).iter().rev());

		Some(current)
	}
}
