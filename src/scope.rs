//! Lexical scopes and the variable/reference graph of one file.
//!
//! Built once from a finished [`SyntaxTree`] with explicit work lists, so deeply nested input
//! cannot exhaust the stack. Block scope holds `let`, `const`, and `class` bindings; function
//! scope holds parameters and hoisted `var` bindings; module scope holds imports.

use std::collections::{HashMap, HashSet};

use crate::source::{DeclarationKind, NodeId, NodeKind, SourceType, SyntaxTree};

/// Unknown parent node types whose identifier children are value references.
const REFERENCE_PARENTS: [&str; 15] = [
	"TSAsExpression",
	"TSNonNullExpression",
	"TSSatisfiesExpression",
	"TSTypeAssertion",
	"TSInstantiationExpression",
	"TSExportAssignment",
	"TSTypeQuery",
	"TSClassImplements",
	"TSInterfaceHeritage",
	"TSExpressionWithTypeArguments",
	"JSXExpressionContainer",
	"JSXSpreadAttribute",
	"JSXSpreadChild",
	"ParenthesizedExpression",
	"Decorator",
];
/// Unknown parent node types whose first child is a reference (`A` in `A.B`).
const QUALIFIER_PARENTS: [&str; 5] = [
	"TSTypeReference",
	"TSQualifiedName",
	"JSXMemberExpression",
	"JSXOpeningElement",
	"JSXClosingElement",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u32);
impl ScopeId {
	fn index(self) -> usize {
		self.0 as usize
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(u32);
impl VariableId {
	fn index(self) -> usize {
		self.0 as usize
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReferenceId(u32);
impl ReferenceId {
	fn index(self) -> usize {
		self.0 as usize
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
	Global,
	Module,
	Function,
	Block,
	Class,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
	Var,
	Let,
	Const,
	Function,
	Class,
	Parameter,
	Import,
	CatchParameter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
	Read,
	Write,
	ReadWrite,
}
impl Access {
	pub fn is_read(self) -> bool {
		matches!(self, Self::Read | Self::ReadWrite)
	}

	pub fn is_write(self) -> bool {
		matches!(self, Self::Write | Self::ReadWrite)
	}
}

#[derive(Clone, Debug)]
pub struct Scope {
	pub kind: ScopeKind,
	/// Node that introduced the scope.
	pub node: NodeId,
	pub parent: Option<ScopeId>,
	pub children: Vec<ScopeId>,
	variables: Vec<VariableId>,
	names: HashMap<String, VariableId>,
}

#[derive(Clone, Debug)]
pub struct Variable {
	pub name: String,
	pub scope: ScopeId,
	pub kind: BindingKind,
	/// Binding identifier nodes, more than one for repeated `var` or overloads.
	pub identifiers: Vec<NodeId>,
	/// Declaration-like nodes that introduced the binding.
	pub definitions: Vec<NodeId>,
	pub references: Vec<ReferenceId>,
}

#[derive(Clone, Debug)]
pub struct Reference {
	pub identifier: NodeId,
	pub from: ScopeId,
	pub resolved: Option<VariableId>,
	pub access: Access,
	/// Write performed by the declaration's own initializer.
	pub init: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
	Binding,
	Reference(Access),
	Skip,
}

#[derive(Clone, Debug)]
pub struct ScopeGraph {
	scopes: Vec<Scope>,
	variables: Vec<Variable>,
	references: Vec<Reference>,
	node_scopes: Vec<ScopeId>,
	declared: HashMap<NodeId, Vec<VariableId>>,
	bindings: HashMap<NodeId, VariableId>,
	identifier_references: HashMap<NodeId, ReferenceId>,
}
impl ScopeGraph {
	pub fn build(tree: &SyntaxTree) -> Self {
		let mut graph = Self {
			scopes: Vec::new(),
			variables: Vec::new(),
			references: Vec::new(),
			node_scopes: vec![ScopeId(0); tree.len()],
			declared: HashMap::new(),
			bindings: HashMap::new(),
			identifier_references: HashMap::new(),
		};
		let initialized = graph.declare_all(tree);

		graph.collect_references(tree, &initialized);

		graph
	}

	pub fn global(&self) -> ScopeId {
		ScopeId(0)
	}

	pub fn scope(&self, id: ScopeId) -> &Scope {
		&self.scopes[id.index()]
	}

	pub fn variable(&self, id: VariableId) -> &Variable {
		&self.variables[id.index()]
	}

	pub fn reference(&self, id: ReferenceId) -> &Reference {
		&self.references[id.index()]
	}

	/// Innermost scope containing `node`; a scope-creating node maps to its own scope.
	pub fn scope_of(&self, node: NodeId) -> ScopeId {
		self.node_scopes.get(node.index()).copied().unwrap_or(ScopeId(0))
	}

	/// Variables declared directly in `scope`. Outer scopes are not consulted.
	pub fn variables_in_scope(&self, scope: ScopeId) -> impl Iterator<Item = &Variable> + '_ {
		self.scope(scope).variables.iter().map(|id| self.variable(*id))
	}

	/// Variables introduced by a declaration-like node: a variable declaration or declarator,
	/// a function (name and parameters), a class, an import declaration or specifier, or a
	/// catch clause.
	pub fn declared_variables(&self, node: NodeId) -> &[VariableId] {
		self.declared.get(&node).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn find_in_scope(&self, scope: ScopeId, name: &str) -> Option<VariableId> {
		self.scope(scope).names.get(name).copied()
	}

	/// Resolves `name` from `scope` outwards.
	pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<VariableId> {
		let mut current = Some(scope);

		while let Some(scope) = current {
			if let Some(found) = self.find_in_scope(scope, name) {
				return Some(found);
			}

			current = self.scope(scope).parent;
		}

		None
	}

	pub fn references(&self, variable: VariableId) -> impl Iterator<Item = &Reference> + '_ {
		self.variable(variable).references.iter().map(|id| self.reference(*id))
	}

	/// Reference recorded for a use-site identifier.
	pub fn reference_at(&self, identifier: NodeId) -> Option<&Reference> {
		self.identifier_references.get(&identifier).map(|id| self.reference(*id))
	}

	/// Variable declared by a binding identifier.
	pub fn binding(&self, identifier: NodeId) -> Option<VariableId> {
		self.bindings.get(&identifier).copied()
	}

	pub fn all_references(&self) -> impl Iterator<Item = &Reference> + '_ {
		self.references.iter()
	}

	/// References that resolved to no declared variable.
	pub fn unresolved(&self) -> impl Iterator<Item = &Reference> + '_ {
		self.references.iter().filter(|reference| reference.resolved.is_none())
	}

	/// Whether `scope` is `ancestor` or nested inside it.
	pub fn is_within(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
		let mut current = Some(scope);

		while let Some(scope) = current {
			if scope == ancestor {
				return true;
			}

			current = self.scope(scope).parent;
		}

		false
	}

	/// Whether the variable is read anywhere besides its own initializer.
	pub fn is_used(&self, variable: VariableId) -> bool {
		self.references(variable).any(|reference| reference.access.is_read())
	}

	fn add_scope(&mut self, kind: ScopeKind, node: NodeId, parent: Option<ScopeId>) -> ScopeId {
		let id = ScopeId(self.scopes.len() as u32);

		self.scopes.push(Scope {
			kind,
			node,
			parent,
			children: Vec::new(),
			variables: Vec::new(),
			names: HashMap::new(),
		});

		if let Some(parent) = parent {
			self.scopes[parent.index()].children.push(id);
		}

		id
	}

	fn declare(
		&mut self,
		tree: &SyntaxTree,
		scope: ScopeId,
		identifier: NodeId,
		kind: BindingKind,
		definition: NodeId,
	) -> Option<VariableId> {
		let name = tree.identifier_name(identifier)?;
		let id = match self.find_in_scope(scope, name) {
			Some(existing) => existing,
			None => {
				let id = VariableId(self.variables.len() as u32);

				self.variables.push(Variable {
					name: name.to_owned(),
					scope,
					kind,
					identifiers: Vec::new(),
					definitions: Vec::new(),
					references: Vec::new(),
				});

				let scope = &mut self.scopes[scope.index()];

				scope.variables.push(id);
				scope.names.insert(name.to_owned(), id);

				id
			},
		};
		let variable = &mut self.variables[id.index()];

		variable.identifiers.push(identifier);
		variable.definitions.push(definition);
		self.bindings.insert(identifier, id);

		Some(id)
	}

	fn record_declared(&mut self, nodes: &[NodeId], variable: Option<VariableId>) {
		let Some(variable) = variable else {
			return;
		};

		for node in nodes {
			let declared = self.declared.entry(*node).or_default();

			if !declared.contains(&variable) {
				declared.push(variable);
			}
		}
	}

	fn hoisting_target(&self, scope: ScopeId) -> ScopeId {
		let mut current = scope;

		loop {
			let data = self.scope(current);

			match (data.kind, data.parent) {
				(ScopeKind::Function | ScopeKind::Module | ScopeKind::Global, _) | (_, None) =>
					return current,
				(_, Some(parent)) => current = parent,
			}
		}
	}

	/// Creates every scope and declares every binding. Returns the binding identifiers that
	/// have an initializer.
	fn declare_all(&mut self, tree: &SyntaxTree) -> HashSet<NodeId> {
		let root = tree.root();
		let global = self.add_scope(ScopeKind::Global, root, None);
		let top = match tree.kind(root) {
			NodeKind::Program { source_type: SourceType::Module, .. } =>
				self.add_scope(ScopeKind::Module, root, Some(global)),
			_ => global,
		};
		let mut initialized = HashSet::new();
		let mut stack = tree.children(root).iter().rev().map(|child| (*child, top)).collect::<Vec<_>>();

		self.node_scopes[root.index()] = top;

		while let Some((node, outer)) = stack.pop() {
			let kind = tree.kind(node);

			match kind {
				NodeKind::FunctionDeclaration(function) =>
					if let Some(id) = function.id {
						let variable = self.declare(tree, outer, id, BindingKind::Function, node);

						self.record_declared(&[node], variable);
					},
				NodeKind::ClassDeclaration(class) =>
					if let Some(id) = class.id {
						let variable = self.declare(tree, outer, id, BindingKind::Class, node);

						self.record_declared(&[node], variable);
					},
				NodeKind::VariableDeclaration { kind: declaration_kind, declarations } => {
					let (target, binding_kind) = match declaration_kind {
						DeclarationKind::Var => (self.hoisting_target(outer), BindingKind::Var),
						DeclarationKind::Let => (outer, BindingKind::Let),
						DeclarationKind::Const => (outer, BindingKind::Const),
					};

					for declarator in declarations {
						let NodeKind::VariableDeclarator { id, init } = tree.kind(*declarator) else {
							continue;
						};

						for identifier in binding_identifiers(tree, *id) {
							let variable =
								self.declare(tree, target, identifier, binding_kind, *declarator);

							self.record_declared(&[node, *declarator], variable);

							if init.is_some() {
								initialized.insert(identifier);
							}
						}
					}
				},
				NodeKind::ImportDeclaration { specifiers, .. } =>
					for specifier in specifiers {
						let local = match tree.kind(*specifier) {
							NodeKind::ImportSpecifier { local, .. }
							| NodeKind::ImportDefaultSpecifier { local }
							| NodeKind::ImportNamespaceSpecifier { local } => *local,
							_ => continue,
						};
						let variable = self.declare(tree, outer, local, BindingKind::Import, *specifier);

						self.record_declared(&[node, *specifier], variable);
					},
				_ => {},
			}

			let current = match scope_kind(tree, node) {
				Some(scope_kind) => {
					let scope = self.add_scope(scope_kind, node, Some(outer));

					self.declare_inner(tree, node, scope);

					scope
				},
				None => outer,
			};

			self.node_scopes[node.index()] = current;

			stack.extend(tree.children(node).iter().rev().map(|child| (*child, current)));
		}

		initialized
	}

	/// Bindings that live inside the scope a node creates: parameters, expression names, and
	/// the catch parameter.
	fn declare_inner(&mut self, tree: &SyntaxTree, node: NodeId, scope: ScopeId) {
		let kind = tree.kind(node);

		if let Some(function) = kind.function() {
			if let (NodeKind::FunctionExpression(_), Some(id)) = (kind, function.id) {
				let variable = self.declare(tree, scope, id, BindingKind::Function, node);

				self.record_declared(&[node], variable);
			}

			for param in &function.params {
				for identifier in binding_identifiers(tree, *param) {
					let variable = self.declare(tree, scope, identifier, BindingKind::Parameter, node);

					self.record_declared(&[node], variable);
				}
			}

			return;
		}

		match kind {
			NodeKind::ClassExpression(class) =>
				if let Some(id) = class.id {
					let variable = self.declare(tree, scope, id, BindingKind::Class, node);

					self.record_declared(&[node], variable);
				},
			NodeKind::CatchClause { param: Some(param), .. } =>
				for identifier in binding_identifiers(tree, *param) {
					let variable =
						self.declare(tree, scope, identifier, BindingKind::CatchParameter, node);

					self.record_declared(&[node], variable);
				},
			_ => {},
		}
	}

	fn collect_references(&mut self, tree: &SyntaxTree, initialized: &HashSet<NodeId>) {
		for node in tree.preorder() {
			let name = match tree.kind(node) {
				NodeKind::Identifier { name, .. } | NodeKind::JsxIdentifier { name } => name,
				_ => continue,
			};
			let from = self.scope_of(node);

			match classify(tree, node) {
				Role::Reference(access) => {
					let resolved = self.resolve(from, name);

					self.push_reference(node, from, resolved, access, false);
				},
				Role::Binding if initialized.contains(&node) => {
					let resolved = self.binding(node);

					self.push_reference(node, from, resolved, Access::Write, true);
				},
				Role::Binding | Role::Skip => {},
			}
		}
	}

	fn push_reference(
		&mut self,
		identifier: NodeId,
		from: ScopeId,
		resolved: Option<VariableId>,
		access: Access,
		init: bool,
	) {
		let id = ReferenceId(self.references.len() as u32);

		self.references.push(Reference { identifier, from, resolved, access, init });
		self.identifier_references.insert(identifier, id);

		if let Some(variable) = resolved {
			self.variables[variable.index()].references.push(id);
		}
	}
}

fn scope_kind(tree: &SyntaxTree, node: NodeId) -> Option<ScopeKind> {
	match tree.kind(node) {
		kind if kind.is_function() => Some(ScopeKind::Function),
		NodeKind::StaticBlock { .. } => Some(ScopeKind::Function),
		NodeKind::ClassDeclaration(_) | NodeKind::ClassExpression(_) => Some(ScopeKind::Class),
		NodeKind::BlockStatement { .. } => {
			// Function and catch bodies share the scope of their owner.
			let owner = tree.parent(node).map(|parent| tree.kind(parent));

			match owner {
				Some(kind) if kind.is_function() => None,
				Some(NodeKind::CatchClause { .. }) => None,
				_ => Some(ScopeKind::Block),
			}
		},
		NodeKind::ForStatement { .. }
		| NodeKind::ForInStatement { .. }
		| NodeKind::ForOfStatement { .. }
		| NodeKind::SwitchStatement { .. }
		| NodeKind::CatchClause { .. } => Some(ScopeKind::Block),
		_ => None,
	}
}

/// Identifier nodes bound by a binding pattern, in source order.
pub fn binding_identifiers(tree: &SyntaxTree, pattern: NodeId) -> Vec<NodeId> {
	let mut out = Vec::new();
	let mut stack = vec![pattern];

	while let Some(node) = stack.pop() {
		match tree.kind(node) {
			NodeKind::Identifier { .. } => out.push(node),
			NodeKind::ObjectPattern { properties } => stack.extend(properties),
			NodeKind::Property { value, .. } => stack.push(*value),
			NodeKind::ArrayPattern { elements } => stack.extend(elements.iter().flatten()),
			NodeKind::RestElement { argument } => stack.push(*argument),
			NodeKind::AssignmentPattern { left, .. } => stack.push(*left),
			_ => {},
		}
	}

	out.sort_by_key(|id| tree.range(*id).start());

	out
}

fn classify(tree: &SyntaxTree, id: NodeId) -> Role {
	let Some(parent) = tree.parent(id) else {
		return Role::Reference(Access::Read);
	};

	match tree.kind(parent) {
		NodeKind::MemberExpression { property, computed: false, .. } if *property == id =>
			Role::Skip,
		NodeKind::MethodDefinition { key, computed: false, .. }
		| NodeKind::PropertyDefinition { key, computed: false, .. }
		| NodeKind::Property { key, computed: false, shorthand: false, .. }
			if *key == id =>
			Role::Skip,
		NodeKind::LabeledStatement { .. }
		| NodeKind::BreakStatement { .. }
		| NodeKind::ContinueStatement { .. }
		| NodeKind::MetaProperty { .. }
		| NodeKind::ExportAllDeclaration { .. } => Role::Skip,
		NodeKind::ImportSpecifier { local, .. }
		| NodeKind::ImportDefaultSpecifier { local }
		| NodeKind::ImportNamespaceSpecifier { local } =>
			if *local == id {
				Role::Binding
			} else {
				Role::Skip
			},
		NodeKind::ExportSpecifier { local, .. } => {
			let re_export = tree.parent(parent).is_some_and(|declaration| {
				matches!(
					tree.kind(declaration),
					NodeKind::ExportNamedDeclaration { source: Some(_), .. }
				)
			});

			if *local == id && !re_export { Role::Reference(Access::Read) } else { Role::Skip }
		},
		NodeKind::FunctionDeclaration(function)
		| NodeKind::FunctionExpression(function)
		| NodeKind::ArrowFunctionExpression(function)
			if function.id == Some(id) =>
			Role::Binding,
		NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class)
			if class.id == Some(id) =>
			Role::Binding,
		NodeKind::Unknown { type_name, children } => {
			let first = children.first() == Some(&id);
			let is_reference = REFERENCE_PARENTS.contains(&type_name.as_str())
				|| (first && QUALIFIER_PARENTS.contains(&type_name.as_str()));
			let intrinsic_element = matches!(
				tree.kind(id),
				NodeKind::JsxIdentifier { name } if !name.starts_with(char::is_uppercase)
			) && type_name != "JSXMemberExpression";

			if is_reference && !intrinsic_element { Role::Reference(Access::Read) } else { Role::Skip }
		},
		_ if matches!(tree.kind(id), NodeKind::JsxIdentifier { .. }) => Role::Skip,
		_ => pattern_role(tree, id),
	}
}

/// Climbs through enclosing patterns to find out whether `id` binds, assigns, or reads.
fn pattern_role(tree: &SyntaxTree, id: NodeId) -> Role {
	let mut current = id;

	loop {
		let Some(parent) = tree.parent(current) else {
			return Role::Reference(Access::Read);
		};
		let in_object_pattern = || {
			tree.parent(parent)
				.is_some_and(|owner| matches!(tree.kind(owner), NodeKind::ObjectPattern { .. }))
		};

		match tree.kind(parent) {
			NodeKind::ObjectPattern { .. }
			| NodeKind::ArrayPattern { .. }
			| NodeKind::RestElement { .. } => current = parent,
			NodeKind::Property { value, .. } if *value == current && in_object_pattern() =>
				current = parent,
			NodeKind::AssignmentPattern { left, .. } if *left == current => current = parent,
			NodeKind::VariableDeclarator { id: target, .. } if *target == current =>
				return Role::Binding,
			NodeKind::CatchClause { param: Some(param), .. } if *param == current =>
				return Role::Binding,
			kind if kind.function().is_some_and(|function| function.params.contains(&current)) =>
				return Role::Binding,
			NodeKind::AssignmentExpression { left, operator, .. } if *left == current => {
				let access =
					if current == id && operator != "=" { Access::ReadWrite } else { Access::Write };

				return Role::Reference(access);
			},
			NodeKind::ForInStatement { left, .. } | NodeKind::ForOfStatement { left, .. }
				if *left == current =>
				return Role::Reference(Access::Write),
			NodeKind::UpdateExpression { .. } if current == id =>
				return Role::Reference(Access::ReadWrite),
			_ => return Role::Reference(Access::Read),
		}
	}
}

#[cfg(test)]
mod tests {
	use text_size::{TextRange, TextSize};

	use super::*;
	use crate::{
		source::TreeBuilder,
		testing::{self, find},
	};

	fn names(graph: &ScopeGraph, scope: ScopeId) -> Vec<&str> {
		graph.variables_in_scope(scope).map(|variable| variable.name.as_str()).collect()
	}

	#[test]
	fn var_is_hoisted_and_let_stays_in_its_block() {
		let file = testing::parse(
			"a.js",
			"function f(p) {\n\tif (p) {\n\t\tvar v = 1;\n\t\tlet l = 2;\n\t}\n}\n",
		);
		let graph = &file.scopes;
		let function = find(&file, "FunctionDeclaration", file.source.text().trim_end());
		let block = find(&file, "BlockStatement", "{\n\t\tvar v = 1;\n\t\tlet l = 2;\n\t}");
		let function_scope = graph.scope_of(function);

		assert_eq!(graph.scope(function_scope).kind, ScopeKind::Function);
		assert_eq!(names(graph, function_scope), vec!["p", "v"]);
		assert_eq!(names(graph, graph.scope_of(block)), vec!["l"]);
		assert!(graph.resolve(graph.scope_of(block), "v").is_some());
		assert!(graph.resolve(function_scope, "l").is_none());
	}

	#[test]
	fn reference_access_is_classified() {
		let file = testing::parse("a.js", "import a from 'a';\na = 1;\na += 2;\na++;\nuse(a);\n");
		let graph = &file.scopes;
		let import = find(&file, "ImportDeclaration", "import a from 'a';");
		let variable = graph.declared_variables(import)[0];
		let accesses =
			graph.references(variable).map(|reference| reference.access).collect::<Vec<_>>();

		assert_eq!(graph.variable(variable).kind, BindingKind::Import);
		assert_eq!(accesses, vec![Access::Write, Access::ReadWrite, Access::ReadWrite, Access::Read]);
		assert!(graph.is_used(variable));
		assert_eq!(graph.unresolved().count(), 1);
	}

	#[test]
	fn property_names_are_not_references() {
		let file = testing::parse(
			"a.js",
			"const { x, y: z = 1 } = o;\nconst w = { x, k: z };\nw.x;\n",
		);
		let graph = &file.scopes;
		let module = graph.scope_of(file.source.tree().root());

		assert_eq!(names(graph, module), vec!["x", "z", "w"]);

		let x = graph.find_in_scope(module, "x").expect("x is declared");
		let x_references = graph.references(x).collect::<Vec<_>>();

		assert_eq!(x_references.len(), 2);
		assert!(x_references[0].init);
		assert_eq!(x_references[1].access, Access::Read);

		let unresolved = graph
			.unresolved()
			.map(|reference| file.source.node_text(reference.identifier))
			.collect::<Vec<_>>();

		assert_eq!(unresolved, vec!["o"]);
	}

	#[test]
	fn catch_parameter_is_block_scoped() {
		let file = testing::parse("a.js", "try {\n\tf();\n} catch (error) {\n\tlog(error);\n}\n");
		let graph = &file.scopes;
		let clause = find(&file, "CatchClause", "catch (error) {\n\tlog(error);\n}");
		let declared = graph.declared_variables(clause);

		assert_eq!(declared.len(), 1);
		assert_eq!(graph.variable(declared[0]).kind, BindingKind::CatchParameter);
		assert!(graph.resolve(graph.scope_of(file.source.tree().root()), "error").is_none());
		assert_eq!(graph.references(declared[0]).count(), 1);
	}

	#[test]
	fn deeply_nested_blocks_build_without_recursion() {
		let depth = 50_000_u32;
		let mut builder = TreeBuilder::new();
		let mut inner = builder.push(
			NodeKind::BlockStatement { body: Vec::new() },
			TextRange::new(TextSize::from(depth), TextSize::from(depth + 2)),
		);

		for level in (0..depth).rev() {
			inner = builder.push(
				NodeKind::BlockStatement { body: vec![inner] },
				TextRange::new(TextSize::from(level), TextSize::from(2 * depth + 2 - level)),
			);
		}

		let end = TextSize::from(2 * depth + 2);
		let root = builder.push(
			NodeKind::Program { body: vec![inner], source_type: SourceType::Script },
			TextRange::new(TextSize::from(0), end),
		);
		let tree = builder.finish(root).expect("valid tree");
		let graph = ScopeGraph::build(&tree);

		assert_eq!(graph.scopes.len(), depth as usize + 2);
	}
}
