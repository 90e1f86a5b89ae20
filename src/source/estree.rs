//! ESTree JSON loader.
//!
//! Accepts the document an espree or typescript-estree parse produces with `range`, `tokens`,
//! and `comment` enabled. Ranges in that document count UTF-16 code units; they are converted
//! to byte offsets here. Nodes are converted bottom-up on an explicit stack, so nesting depth
//! is bounded by memory rather than by the call stack.

use std::{collections::HashMap, fmt, path::PathBuf, ptr};

use serde::Deserialize;
use serde_json::{Map, Value};
use text_size::{TextRange, TextSize};

use super::{
	SourceFile,
	builder::{TreeBuilder, TreeError},
	to_size,
	token::{Token, TokenKind},
	tree::{
		Class, DeclarationKind, Function, LiteralValue, MethodKind, NodeId, NodeKind,
		PropertyKind, SourceType,
	},
};

const SKIPPED_FIELDS: [&str; 9] =
	["type", "range", "loc", "start", "end", "parent", "tokens", "comments", "decorators"];

#[derive(Debug)]
pub enum LoadError {
	Json(serde_json::Error),
	NotAProgram(String),
	NotANode,
	MissingField { node: String, field: &'static str },
	BadRange { node: String },
	Tree(TreeError),
}
impl fmt::Display for LoadError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Json(err) => write!(f, "Failed to decode the syntax tree JSON: {err}."),
			Self::NotAProgram(found) => write!(f, "Expected a Program node but found {found}."),
			Self::NotANode => write!(f, "Expected a syntax node object."),
			Self::MissingField { node, field } =>
				write!(f, "{node} node is missing the `{field}` field."),
			Self::BadRange { node } => write!(f, "{node} node has no usable range."),
			Self::Tree(err) => write!(f, "Syntax tree is inconsistent: {err}"),
		}
	}
}
impl std::error::Error for LoadError {}
impl From<serde_json::Error> for LoadError {
	fn from(err: serde_json::Error) -> Self {
		Self::Json(err)
	}
}
impl From<TreeError> for LoadError {
	fn from(err: TreeError) -> Self {
		Self::Tree(err)
	}
}

/// Builds a [`SourceFile`] from source text and the parser's ESTree JSON for it.
pub fn load_program(
	path: impl Into<PathBuf>,
	text: String,
	ast_json: &str,
) -> Result<SourceFile, LoadError> {
	let program = parse_document(ast_json)?;
	let offsets = OffsetMap::new(&text);
	// Parsers start the program at its first token; widen it so leading comments sit inside.
	let whole = TextRange::new(TextSize::from(0), TextSize::of(text.as_str()));
	let mut loader = Loader {
		builder: TreeBuilder::new(),
		offsets: &offsets,
		whole,
		converted: HashMap::new(),
		pending: Vec::new(),
	};
	let root = loader.load(&program)?;
	let tree = loader.builder.finish(root)?;
	let tokens = load_tokens(&program, &text, &offsets);

	Ok(SourceFile::new(path, text, tree, tokens))
}

/// Decodes the document without `serde_json`'s default nesting limit of 128.
fn parse_document(ast_json: &str) -> Result<Value, LoadError> {
	let mut deserializer = serde_json::Deserializer::from_str(ast_json);

	deserializer.disable_recursion_limit();

	let document = Value::deserialize(&mut deserializer)?;

	deserializer.end()?;

	Ok(document)
}

/// Maps UTF-16 code-unit offsets onto UTF-8 byte offsets.
struct OffsetMap {
	utf16_to_byte: Option<Vec<usize>>,
	len: usize,
}
impl OffsetMap {
	fn new(text: &str) -> Self {
		if text.is_ascii() {
			return Self { utf16_to_byte: None, len: text.len() };
		}

		let mut map = Vec::with_capacity(text.len() + 1);

		for (idx, ch) in text.char_indices() {
			for _ in 0..ch.len_utf16() {
				map.push(idx);
			}
		}

		map.push(text.len());

		Self { utf16_to_byte: Some(map), len: text.len() }
	}

	fn byte_offset(&self, utf16: usize) -> Option<usize> {
		match &self.utf16_to_byte {
			None => (utf16 <= self.len).then_some(utf16),
			Some(map) => map.get(utf16).copied(),
		}
	}

	fn range(&self, start: u64, end: u64) -> Option<TextRange> {
		let start = self.byte_offset(usize::try_from(start).ok()?)?;
		let end = self.byte_offset(usize::try_from(end).ok()?)?;

		(start <= end).then(|| TextRange::new(to_size(start), to_size(end)))
	}
}

/// Converts JSON nodes into arena nodes, children first.
///
/// A node whose children are not converted yet queues them in `pending` and is converted
/// again once they are.
struct Loader<'a, 'v> {
	builder: TreeBuilder,
	offsets: &'a OffsetMap,
	whole: TextRange,
	converted: HashMap<*const Value, NodeId>,
	pending: Vec<&'v Value>,
}
impl<'v> Loader<'_, 'v> {
	fn load(&mut self, program: &'v Value) -> Result<NodeId, LoadError> {
		let object =
			program.as_object().ok_or_else(|| LoadError::NotAProgram("a non-object".into()))?;
		let ty = type_of(object);

		if ty != "Program" {
			return Err(LoadError::NotAProgram(ty.to_owned()));
		}

		let mut stack = vec![program];

		while let Some(&value) = stack.last() {
			if self.id_of(value).is_some() {
				stack.pop();

				continue;
			}

			let Some(object) = value.as_object() else {
				return Err(LoadError::NotANode);
			};
			let ty = type_of(object);
			let range = if ty == "Program" { self.whole } else { self.range_of(object, ty)? };
			let kind = self.kind(object, ty)?;

			if self.pending.is_empty() {
				let id = self.builder.push(kind, range);

				self.converted.insert(ptr::from_ref(value), id);
				stack.pop();
			} else {
				stack.append(&mut self.pending);
			}
		}

		self.id_of(program).ok_or(LoadError::NotANode)
	}

	fn id_of(&self, value: &Value) -> Option<NodeId> {
		self.converted.get(&ptr::from_ref(value)).copied()
	}

	/// Id of a converted child. An unconverted child is queued and a placeholder returned;
	/// the caller's result is then discarded and rebuilt later.
	fn node(&mut self, value: &'v Value) -> Result<NodeId, LoadError> {
		if !value.is_object() {
			return Err(LoadError::NotANode);
		}

		match self.id_of(value) {
			Some(id) => Ok(id),
			None => {
				self.pending.push(value);

				Ok(NodeId::new(0))
			},
		}
	}

	fn kind(&mut self, o: &'v Map<String, Value>, ty: &str) -> Result<NodeKind, LoadError> {
		let kind = match ty {
			"Program" => NodeKind::Program {
				body: self.nodes(o, ty, "body")?,
				source_type: match o.get("sourceType").and_then(Value::as_str) {
					Some("module") => SourceType::Module,
					_ => SourceType::Script,
				},
			},
			"ExpressionStatement" => NodeKind::ExpressionStatement {
				expression: self.child(o, ty, "expression")?,
				directive: o.get("directive").and_then(Value::as_str).map(ToOwned::to_owned),
			},
			"BlockStatement" => NodeKind::BlockStatement { body: self.nodes(o, ty, "body")? },
			"StaticBlock" => NodeKind::StaticBlock { body: self.nodes(o, ty, "body")? },
			"EmptyStatement" => NodeKind::EmptyStatement,
			"DebuggerStatement" => NodeKind::DebuggerStatement,
			"ReturnStatement" => NodeKind::ReturnStatement { argument: self.opt(o, "argument")? },
			"IfStatement" => NodeKind::IfStatement {
				test: self.child(o, ty, "test")?,
				consequent: self.child(o, ty, "consequent")?,
				alternate: self.opt(o, "alternate")?,
			},
			"ForStatement" => NodeKind::ForStatement {
				init: self.opt(o, "init")?,
				test: self.opt(o, "test")?,
				update: self.opt(o, "update")?,
				body: self.child(o, ty, "body")?,
			},
			"ForInStatement" => NodeKind::ForInStatement {
				left: self.child(o, ty, "left")?,
				right: self.child(o, ty, "right")?,
				body: self.child(o, ty, "body")?,
			},
			"ForOfStatement" => NodeKind::ForOfStatement {
				left: self.child(o, ty, "left")?,
				right: self.child(o, ty, "right")?,
				body: self.child(o, ty, "body")?,
				is_await: flag(o, "await"),
			},
			"WhileStatement" => NodeKind::WhileStatement {
				test: self.child(o, ty, "test")?,
				body: self.child(o, ty, "body")?,
			},
			"DoWhileStatement" => NodeKind::DoWhileStatement {
				body: self.child(o, ty, "body")?,
				test: self.child(o, ty, "test")?,
			},
			"TryStatement" => NodeKind::TryStatement {
				block: self.child(o, ty, "block")?,
				handler: self.opt(o, "handler")?,
				finalizer: self.opt(o, "finalizer")?,
			},
			"CatchClause" => NodeKind::CatchClause {
				param: self.opt(o, "param")?,
				body: self.child(o, ty, "body")?,
			},
			"ThrowStatement" => NodeKind::ThrowStatement { argument: self.child(o, ty, "argument")? },
			"SwitchStatement" => NodeKind::SwitchStatement {
				discriminant: self.child(o, ty, "discriminant")?,
				cases: self.nodes(o, ty, "cases")?,
			},
			"SwitchCase" => NodeKind::SwitchCase {
				test: self.opt(o, "test")?,
				consequent: self.nodes(o, ty, "consequent")?,
			},
			"BreakStatement" => NodeKind::BreakStatement { label: self.opt(o, "label")? },
			"ContinueStatement" => NodeKind::ContinueStatement { label: self.opt(o, "label")? },
			"LabeledStatement" => NodeKind::LabeledStatement {
				label: self.child(o, ty, "label")?,
				body: self.child(o, ty, "body")?,
			},
			"VariableDeclaration" => NodeKind::VariableDeclaration {
				kind: match o.get("kind").and_then(Value::as_str) {
					Some("var") => DeclarationKind::Var,
					Some("let") => DeclarationKind::Let,
					_ => DeclarationKind::Const,
				},
				declarations: self.nodes(o, ty, "declarations")?,
			},
			"VariableDeclarator" => NodeKind::VariableDeclarator {
				id: self.child(o, ty, "id")?,
				init: self.opt(o, "init")?,
			},
			"FunctionDeclaration" => NodeKind::FunctionDeclaration(self.function(o, ty)?),
			"FunctionExpression" => NodeKind::FunctionExpression(self.function(o, ty)?),
			"ArrowFunctionExpression" => NodeKind::ArrowFunctionExpression(self.function(o, ty)?),
			"ClassDeclaration" => NodeKind::ClassDeclaration(self.class(o, ty)?),
			"ClassExpression" => NodeKind::ClassExpression(self.class(o, ty)?),
			"ClassBody" => NodeKind::ClassBody { body: self.nodes(o, ty, "body")? },
			"MethodDefinition" => NodeKind::MethodDefinition {
				key: self.child(o, ty, "key")?,
				value: self.child(o, ty, "value")?,
				kind: match o.get("kind").and_then(Value::as_str) {
					Some("constructor") => MethodKind::Constructor,
					Some("get") => MethodKind::Get,
					Some("set") => MethodKind::Set,
					_ => MethodKind::Method,
				},
				computed: flag(o, "computed"),
				is_static: flag(o, "static"),
			},
			"PropertyDefinition" | "ClassProperty" => NodeKind::PropertyDefinition {
				key: self.child(o, ty, "key")?,
				value: self.opt(o, "value")?,
				computed: flag(o, "computed"),
				is_static: flag(o, "static"),
			},
			"ImportDeclaration" => NodeKind::ImportDeclaration {
				specifiers: self.nodes(o, ty, "specifiers")?,
				source: self.child(o, ty, "source")?,
			},
			"ImportDefaultSpecifier" =>
				NodeKind::ImportDefaultSpecifier { local: self.child(o, ty, "local")? },
			"ImportNamespaceSpecifier" =>
				NodeKind::ImportNamespaceSpecifier { local: self.child(o, ty, "local")? },
			"ImportSpecifier" => {
				let (imported, local) = self.shared_pair(o, ty, "imported", "local")?;

				NodeKind::ImportSpecifier { imported, local }
			},
			"ExportNamedDeclaration" => NodeKind::ExportNamedDeclaration {
				declaration: self.opt(o, "declaration")?,
				specifiers: self.nodes(o, ty, "specifiers")?,
				source: self.opt(o, "source")?,
			},
			"ExportDefaultDeclaration" =>
				NodeKind::ExportDefaultDeclaration { declaration: self.child(o, ty, "declaration")? },
			"ExportAllDeclaration" => NodeKind::ExportAllDeclaration {
				exported: self.opt(o, "exported")?,
				source: self.child(o, ty, "source")?,
			},
			"ExportSpecifier" => {
				let (local, exported) = self.shared_pair(o, ty, "local", "exported")?;

				NodeKind::ExportSpecifier { local, exported }
			},
			"Identifier" => NodeKind::Identifier {
				name: string(o, ty, "name")?,
				type_annotation: self.opt(o, "typeAnnotation")?,
				optional: flag(o, "optional"),
			},
			"JSXIdentifier" => NodeKind::JsxIdentifier { name: string(o, ty, "name")? },
			"PrivateIdentifier" => NodeKind::PrivateIdentifier { name: string(o, ty, "name")? },
			"Literal" => NodeKind::Literal {
				value: literal_value(o),
				raw: o.get("raw").and_then(Value::as_str).unwrap_or_default().to_owned(),
			},
			"TemplateLiteral" => NodeKind::TemplateLiteral {
				quasis: self.nodes(o, ty, "quasis")?,
				expressions: self.nodes(o, ty, "expressions")?,
			},
			"TemplateElement" => NodeKind::TemplateElement {
				raw: o
					.get("value")
					.and_then(|value| value.get("raw"))
					.and_then(Value::as_str)
					.unwrap_or_default()
					.to_owned(),
				tail: flag(o, "tail"),
			},
			"TaggedTemplateExpression" => NodeKind::TaggedTemplateExpression {
				tag: self.child(o, ty, "tag")?,
				quasi: self.child(o, ty, "quasi")?,
			},
			"ThisExpression" => NodeKind::ThisExpression,
			"Super" => NodeKind::Super,
			"ArrayExpression" => NodeKind::ArrayExpression { elements: self.holes(o, ty, "elements")? },
			"ObjectExpression" =>
				NodeKind::ObjectExpression { properties: self.nodes(o, ty, "properties")? },
			"Property" => self.property(o, ty)?,
			"SpreadElement" => NodeKind::SpreadElement { argument: self.child(o, ty, "argument")? },
			"UnaryExpression" => NodeKind::UnaryExpression {
				operator: string(o, ty, "operator")?,
				argument: self.child(o, ty, "argument")?,
			},
			"UpdateExpression" => NodeKind::UpdateExpression {
				operator: string(o, ty, "operator")?,
				prefix: flag(o, "prefix"),
				argument: self.child(o, ty, "argument")?,
			},
			"BinaryExpression" => NodeKind::BinaryExpression {
				operator: string(o, ty, "operator")?,
				left: self.child(o, ty, "left")?,
				right: self.child(o, ty, "right")?,
			},
			"LogicalExpression" => NodeKind::LogicalExpression {
				operator: string(o, ty, "operator")?,
				left: self.child(o, ty, "left")?,
				right: self.child(o, ty, "right")?,
			},
			"AssignmentExpression" => NodeKind::AssignmentExpression {
				operator: string(o, ty, "operator")?,
				left: self.child(o, ty, "left")?,
				right: self.child(o, ty, "right")?,
			},
			"ConditionalExpression" => NodeKind::ConditionalExpression {
				test: self.child(o, ty, "test")?,
				consequent: self.child(o, ty, "consequent")?,
				alternate: self.child(o, ty, "alternate")?,
			},
			"CallExpression" => NodeKind::CallExpression {
				callee: self.child(o, ty, "callee")?,
				arguments: self.nodes(o, ty, "arguments")?,
				optional: flag(o, "optional"),
			},
			"NewExpression" => NodeKind::NewExpression {
				callee: self.child(o, ty, "callee")?,
				arguments: self.nodes(o, ty, "arguments")?,
			},
			"MemberExpression" => NodeKind::MemberExpression {
				object: self.child(o, ty, "object")?,
				property: self.child(o, ty, "property")?,
				computed: flag(o, "computed"),
				optional: flag(o, "optional"),
			},
			"ChainExpression" =>
				NodeKind::ChainExpression { expression: self.child(o, ty, "expression")? },
			"SequenceExpression" =>
				NodeKind::SequenceExpression { expressions: self.nodes(o, ty, "expressions")? },
			"AwaitExpression" => NodeKind::AwaitExpression { argument: self.child(o, ty, "argument")? },
			"YieldExpression" => NodeKind::YieldExpression {
				argument: self.opt(o, "argument")?,
				delegate: flag(o, "delegate"),
			},
			"ImportExpression" => NodeKind::ImportExpression { source: self.child(o, ty, "source")? },
			"MetaProperty" => NodeKind::MetaProperty {
				meta: self.child(o, ty, "meta")?,
				property: self.child(o, ty, "property")?,
			},
			"ObjectPattern" => NodeKind::ObjectPattern { properties: self.nodes(o, ty, "properties")? },
			"ArrayPattern" => NodeKind::ArrayPattern { elements: self.holes(o, ty, "elements")? },
			"RestElement" => NodeKind::RestElement { argument: self.child(o, ty, "argument")? },
			"AssignmentPattern" => NodeKind::AssignmentPattern {
				left: self.child(o, ty, "left")?,
				right: self.child(o, ty, "right")?,
			},
			_ => NodeKind::Unknown { type_name: ty.to_owned(), children: self.generic_children(o)? },
		};

		Ok(kind)
	}

	fn function(&mut self, o: &'v Map<String, Value>, ty: &str) -> Result<Function, LoadError> {
		Ok(Function {
			id: self.opt(o, "id")?,
			params: self.nodes(o, ty, "params")?,
			body: self.child(o, ty, "body")?,
			is_async: flag(o, "async"),
			is_generator: flag(o, "generator"),
		})
	}

	fn class(&mut self, o: &'v Map<String, Value>, ty: &str) -> Result<Class, LoadError> {
		Ok(Class {
			id: self.opt(o, "id")?,
			super_class: self.opt(o, "superClass")?,
			body: self.child(o, ty, "body")?,
		})
	}

	fn property(&mut self, o: &'v Map<String, Value>, ty: &str) -> Result<NodeKind, LoadError> {
		let shorthand = flag(o, "shorthand");
		let value = self.child(o, ty, "value")?;
		let key = if shorthand {
			match self.id_of(field(o, ty, "value")?).map(|id| self.builder.kind(id)) {
				Some(NodeKind::AssignmentPattern { left, .. }) => *left,
				_ => value,
			}
		} else {
			self.child(o, ty, "key")?
		};

		Ok(NodeKind::Property {
			key,
			value,
			kind: match o.get("kind").and_then(Value::as_str) {
				Some("get") => PropertyKind::Get,
				Some("set") => PropertyKind::Set,
				_ => PropertyKind::Init,
			},
			computed: flag(o, "computed"),
			shorthand,
			method: flag(o, "method"),
		})
	}

	/// Loads two fields that parsers emit as separate objects for the same source span.
	fn shared_pair(
		&mut self,
		o: &'v Map<String, Value>,
		ty: &str,
		first: &'static str,
		second: &'static str,
	) -> Result<(NodeId, NodeId), LoadError> {
		let first_id = self.child(o, ty, first)?;
		let range = |value: &Value| value.as_object().and_then(|object| self.range_of(object, ty).ok());
		let first_range = range(field(o, ty, first)?);
		let second_value = field(o, ty, second)?;

		if first_range.is_some() && first_range == range(second_value) {
			return Ok((first_id, first_id));
		}

		let second_id = self.node(second_value)?;

		Ok((first_id, second_id))
	}

	fn child(
		&mut self,
		o: &'v Map<String, Value>,
		ty: &str,
		name: &'static str,
	) -> Result<NodeId, LoadError> {
		let value = field(o, ty, name)?;

		if value.is_null() {
			return Err(LoadError::MissingField { node: ty.to_owned(), field: name });
		}

		self.node(value)
	}

	fn opt(&mut self, o: &'v Map<String, Value>, name: &str) -> Result<Option<NodeId>, LoadError> {
		match o.get(name) {
			None | Some(Value::Null) => Ok(None),
			Some(value) => self.node(value).map(Some),
		}
	}

	fn nodes(
		&mut self,
		o: &'v Map<String, Value>,
		ty: &str,
		name: &'static str,
	) -> Result<Vec<NodeId>, LoadError> {
		let Some(items) = field(o, ty, name)?.as_array() else {
			return Err(LoadError::MissingField { node: ty.to_owned(), field: name });
		};

		items.iter().map(|item| self.node(item)).collect()
	}

	fn holes(
		&mut self,
		o: &'v Map<String, Value>,
		ty: &str,
		name: &'static str,
	) -> Result<Vec<Option<NodeId>>, LoadError> {
		let Some(items) = field(o, ty, name)?.as_array() else {
			return Err(LoadError::MissingField { node: ty.to_owned(), field: name });
		};

		items
			.iter()
			.map(|item| if item.is_null() { Ok(None) } else { self.node(item).map(Some) })
			.collect()
	}

	fn generic_children(&mut self, o: &'v Map<String, Value>) -> Result<Vec<NodeId>, LoadError> {
		let mut children = Vec::new();

		for (name, value) in o {
			if SKIPPED_FIELDS.contains(&name.as_str()) {
				continue;
			}

			match value {
				Value::Object(object) if object.contains_key("type") =>
					children.push(self.node(value)?),
				Value::Array(items) =>
					for item in items {
						if item.as_object().is_some_and(|object| object.contains_key("type")) {
							children.push(self.node(item)?);
						}
					},
				_ => {},
			}
		}

		Ok(children)
	}

	fn range_of(&self, o: &Map<String, Value>, ty: &str) -> Result<TextRange, LoadError> {
		let bad = || LoadError::BadRange { node: ty.to_owned() };
		let (start, end) = match o.get("range").and_then(Value::as_array) {
			Some(pair) if pair.len() == 2 => (pair[0].as_u64(), pair[1].as_u64()),
			_ => (o.get("start").and_then(Value::as_u64), o.get("end").and_then(Value::as_u64)),
		};

		self.offsets.range(start.ok_or_else(bad)?, end.ok_or_else(bad)?).ok_or_else(bad)
	}
}

fn load_tokens(program: &Value, text: &str, offsets: &OffsetMap) -> Vec<Token> {
	let mut tokens = Vec::new();
	let lists = [("tokens", false), ("comments", true)];

	for (field, comments) in lists {
		let Some(items) = program.get(field).and_then(Value::as_array) else {
			continue;
		};

		for item in items {
			let Some(object) = item.as_object() else {
				continue;
			};
			let kind = token_kind(type_of(object), comments);
			let range = match object.get("range").and_then(Value::as_array) {
				Some(pair) if pair.len() == 2 => pair[0]
					.as_u64()
					.zip(pair[1].as_u64())
					.and_then(|(start, end)| offsets.range(start, end)),
				_ => None,
			};
			let Some(range) = range else {
				tracing::debug!(field, "Skipped a token without a usable range.");

				continue;
			};
			let Some(token_text) = text.get(usize::from(range.start())..usize::from(range.end()))
			else {
				continue;
			};

			tokens.push(Token { kind, range, text: token_text.to_owned() });
		}
	}

	tokens
}

fn token_kind(ty: &str, comment: bool) -> TokenKind {
	if comment {
		return match ty {
			"Line" => TokenKind::LineComment,
			"Shebang" | "Hashbang" => TokenKind::Hashbang,
			_ => TokenKind::BlockComment,
		};
	}

	match ty {
		"Identifier" | "JSXIdentifier" => TokenKind::Identifier,
		"Keyword" => TokenKind::Keyword,
		"Punctuator" => TokenKind::Punctuator,
		"String" => TokenKind::String,
		"Numeric" => TokenKind::Numeric,
		"Template" => TokenKind::Template,
		"RegularExpression" => TokenKind::RegularExpression,
		"Boolean" => TokenKind::Boolean,
		"Null" => TokenKind::Null,
		"PrivateIdentifier" => TokenKind::PrivateIdentifier,
		"JSXText" => TokenKind::JsxText,
		_ => TokenKind::Other,
	}
}

fn literal_value(o: &Map<String, Value>) -> LiteralValue {
	if let Some(regex) = o.get("regex").and_then(Value::as_object) {
		let part = |name: &str| {
			regex.get(name).and_then(Value::as_str).unwrap_or_default().to_owned()
		};

		return LiteralValue::RegExp { pattern: part("pattern"), flags: part("flags") };
	}
	if let Some(bigint) = o.get("bigint").and_then(Value::as_str) {
		return LiteralValue::BigInt(bigint.to_owned());
	}

	match o.get("value") {
		Some(Value::String(value)) => LiteralValue::String(value.clone()),
		Some(Value::Number(value)) => LiteralValue::Number(value.as_f64().unwrap_or_default()),
		Some(Value::Bool(value)) => LiteralValue::Boolean(*value),
		_ => LiteralValue::Null,
	}
}

fn type_of(o: &Map<String, Value>) -> &str {
	o.get("type").and_then(Value::as_str).unwrap_or("Unknown")
}

fn field<'v>(
	o: &'v Map<String, Value>,
	ty: &str,
	name: &'static str,
) -> Result<&'v Value, LoadError> {
	o.get(name).ok_or_else(|| LoadError::MissingField { node: ty.to_owned(), field: name })
}

fn string(o: &Map<String, Value>, ty: &str, name: &'static str) -> Result<String, LoadError> {
	o.get(name)
		.and_then(Value::as_str)
		.map(ToOwned::to_owned)
		.ok_or_else(|| LoadError::MissingField { node: ty.to_owned(), field: name })
}

fn flag(o: &Map<String, Value>, name: &str) -> bool {
	o.get(name).and_then(Value::as_bool).unwrap_or(false)
}
