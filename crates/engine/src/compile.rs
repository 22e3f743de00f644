use crate::filter::builtin_filter;
use crate::{
	Action, AssignEditor, CardinalityFilter, CompiledBody, CompiledRule, EditError, Filter,
	FunctionError, IdFieldRef, IdFilter, IdPattern, MappingFormatter, ReplaceEditor, RuleEngine,
	RuleId, TransformApplication,
};
use sssom_t_core::{PrefixError, PrefixManager, UriExpressionRegistry};
use sssom_t_syntax::{
	self as ast, ParseError, ParseErrors, Position, RuleSet, TemplateError,
};
use std::fmt;

/// Everything a function resolver may consult while a rule set is
/// being compiled.
pub struct CompileContext<'a> {
	pub prefixes: &'a PrefixManager,
	pub formatter: &'a MappingFormatter,
	pub uriexpr: &'a UriExpressionRegistry,
}

/// One compile-time problem, with the source position when one is
/// known.
#[derive(Debug)]
pub struct CompileError {
	pub position: Option<Position>,
	pub kind: CompileErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileErrorKind {
	#[error("{0}")]
	Parse(ParseError),

	#[error("unknown function `{0}`")]
	UnknownFunction(String),

	#[error("arity mismatch for `{name}`: signature `{expected}` does not accept {got} argument(s)")]
	ArityMismatch {
		name: String,
		expected: String,
		got: usize,
	},

	#[error("unknown mapping field `{0}`")]
	UnknownField(String),

	#[error("unknown template modifier `{0}`")]
	UnknownModifier(String),

	#[error("`include()` is not supported by this application")]
	UnsupportedInclude,

	#[error(transparent)]
	Template(TemplateError),

	#[error(transparent)]
	Edit(EditError),

	#[error("invalid value `{value}` for filter `{field}`")]
	InvalidFilterValue { field: String, value: String },

	#[error(transparent)]
	Function(FunctionError),

	#[error(transparent)]
	Prefix(PrefixError),
}

impl CompileError {
	pub fn new(kind: CompileErrorKind) -> Self {
		Self {
			position: None,
			kind,
		}
	}

	pub fn at(kind: CompileErrorKind, position: Position) -> Self {
		Self {
			position: Some(position),
			kind,
		}
	}
}

impl fmt::Display for CompileError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.position {
			Some(position) => write!(f, "{position}: {}", self.kind),
			None => self.kind.fmt(f),
		}
	}
}

impl std::error::Error for CompileError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.kind)
	}
}

impl From<ParseError> for CompileError {
	fn from(e: ParseError) -> Self {
		// The parse error displays its own position.
		Self::new(CompileErrorKind::Parse(e))
	}
}

/// All the problems found while compiling one rule set.
#[derive(Debug, Default)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
		self.0.iter()
	}
}

impl fmt::Display for CompileErrors {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for (i, e) in self.0.iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			write!(f, "{e}")?;
		}
		Ok(())
	}
}

impl std::error::Error for CompileErrors {}

impl From<ParseErrors> for CompileErrors {
	fn from(errors: ParseErrors) -> Self {
		Self(errors.0.into_iter().map(CompileError::from).collect())
	}
}

/// Parses and compiles a transformation source in one go, merging the
/// two error streams.
pub fn compile_source<A: TransformApplication>(
	source: &str,
	application: &A,
) -> Result<RuleEngine<A::Product>, CompileErrors> {
	let ruleset = sssom_t_syntax::parse(source)?;
	compile(&ruleset, application)
}

/// Compiles a parsed rule set against an application's registries.
///
/// Problems are accumulated over the whole rule set; any problem means
/// no engine is produced.
pub fn compile<A: TransformApplication>(
	ruleset: &RuleSet,
	application: &A,
) -> Result<RuleEngine<A::Product>, CompileErrors> {
	let mut errors = Vec::new();

	let mut prefixes = PrefixManager::new();
	application.on_init(&mut prefixes);
	for decl in &ruleset.prefixes {
		if let Err(e) = prefixes.add(&decl.name, &decl.iri) {
			errors.push(CompileError::at(CompileErrorKind::Prefix(e), decl.position));
		}
	}

	let mut formatter = MappingFormatter::new();
	application.register_modifiers(&mut formatter);

	let uriexpr = application.uri_expression_registry();

	let rules = {
		let mut compiler = Compiler {
			application,
			context: CompileContext {
				prefixes: &prefixes,
				formatter: &formatter,
				uriexpr: &uriexpr,
			},
			errors: &mut errors,
		};
		compiler.rules(&ruleset.rules, &[], "")
	};

	if errors.is_empty() {
		Ok(RuleEngine::new(
			prefixes,
			uriexpr,
			application.entity_checker(),
			application.inverse_predicates(),
			rules,
		))
	} else {
		Err(CompileErrors(errors))
	}
}

struct Compiler<'a, A: TransformApplication> {
	application: &'a A,
	context: CompileContext<'a>,
	errors: &'a mut Vec<CompileError>,
}

impl<'a, A: TransformApplication> Compiler<'a, A> {
	fn error(&mut self, kind: CompileErrorKind, position: Position) {
		self.errors.push(CompileError::at(kind, position));
	}

	fn rules(
		&mut self,
		rules: &[ast::Rule],
		inherited_tags: &[String],
		path: &str,
	) -> Vec<CompiledRule<A::Product>> {
		rules
			.iter()
			.enumerate()
			.filter_map(|(index, rule)| {
				let path = if path.is_empty() {
					format!("{}", index + 1)
				} else {
					format!("{path}.{}", index + 1)
				};
				self.rule(rule, inherited_tags, path)
			})
			.collect()
	}

	fn rule(
		&mut self,
		rule: &ast::Rule,
		inherited_tags: &[String],
		path: String,
	) -> Option<CompiledRule<A::Product>> {
		// The effective tag set of a rule is the union of the tags of
		// every enclosing rule and its own.
		let mut tags = inherited_tags.to_vec();
		for tag in &rule.tags {
			if !tags.contains(tag) {
				tags.push(tag.clone());
			}
		}

		let filter = self.filter(&rule.filter);

		let body = match &rule.body {
			ast::RuleBody::Actions(actions) => {
				let compiled: Vec<_> = actions
					.iter()
					.filter_map(|action| self.action(action))
					.collect();
				(compiled.len() == actions.len()).then_some(CompiledBody::Actions(compiled))
			}
			ast::RuleBody::Rules(rules) => {
				Some(CompiledBody::Rules(self.rules(rules, &tags, &path)))
			}
		};

		Some(CompiledRule {
			id: RuleId { path, tags },
			filter: filter?,
			body: body?,
		})
	}

	fn filter(&mut self, expr: &ast::FilterExpr) -> Option<Filter> {
		match expr {
			ast::FilterExpr::IdMatch {
				field,
				value,
				position,
			} => {
				if field == "cardinality" {
					return match CardinalityFilter::parse(value) {
						Some(filter) => Some(Filter::Cardinality(filter)),
						None => {
							self.error(
								CompileErrorKind::InvalidFilterValue {
									field: field.clone(),
									value: value.clone(),
								},
								*position,
							);
							None
						}
					};
				}

				match IdFieldRef::from_name(field) {
					Some(id_field) => {
						let expanded = self.context.prefixes.expand(value);
						Some(Filter::Id(IdFilter {
							field: id_field,
							pattern: IdPattern::from_expanded(&expanded),
						}))
					}
					None => {
						self.error(CompileErrorKind::UnknownField(field.clone()), *position);
						None
					}
				}
			}
			ast::FilterExpr::PredicateModifierIsNot => Some(Filter::PredicateModifierIsNot),
			ast::FilterExpr::Not(inner) => Some(Filter::Not(Box::new(self.filter(inner)?))),
			ast::FilterExpr::And(a, b) => {
				let a = self.filter(a);
				let b = self.filter(b);
				Some(Filter::And(Box::new(a?), Box::new(b?)))
			}
			ast::FilterExpr::Or(a, b) => {
				let a = self.filter(a);
				let b = self.filter(b);
				Some(Filter::Or(Box::new(a?), Box::new(b?)))
			}
			ast::FilterExpr::Group(inner) => Some(Filter::Group(Box::new(self.filter(inner)?))),
			ast::FilterExpr::Call(call) => {
				let function = match builtin_filter(&call.name) {
					Some(function) => function,
					None => match self.application.functions().and_then(|r| r.filter(&call.name)) {
						Some(function) => function,
						None => {
							self.error(
								CompileErrorKind::UnknownFunction(call.name.clone()),
								call.position,
							);
							return None;
						}
					},
				};

				if !crate::signature_accepts(function.signature(), call.args.len()) {
					self.error(
						CompileErrorKind::ArityMismatch {
							name: call.name.clone(),
							expected: function.signature().to_owned(),
							got: call.args.len(),
						},
						call.position,
					);
					return None;
				}

				match function.resolve(call, &self.context) {
					Ok(filter) => Some(Filter::Call(filter)),
					Err(e) => {
						self.error(CompileErrorKind::Function(e), call.position);
						None
					}
				}
			}
		}
	}

	fn action(&mut self, action: &ast::Action) -> Option<Action<A::Product>> {
		match action {
			ast::Action::Stop => Some(Action::Stop),
			ast::Action::Invert => Some(Action::Invert),
			ast::Action::Include { position } => match self.application.include_action() {
				Some(action) => Some(Action::Call(action)),
				None => {
					self.error(CompileErrorKind::UnsupportedInclude, *position);
					None
				}
			},
			ast::Action::Assign { pairs, position } => {
				let pairs = pairs.iter().map(|(field, value)| {
					(field.as_str(), Some(value.clone()).filter(|v| !v.is_empty()))
				});
				match AssignEditor::new(pairs) {
					Ok(editor) => Some(Action::Assign(editor)),
					Err(e) => {
						self.error(CompileErrorKind::Edit(e), *position);
						None
					}
				}
			}
			ast::Action::Replace {
				field,
				pattern,
				replacement,
				position,
			} => match ReplaceEditor::new(field, pattern, replacement) {
				Ok(editor) => Some(Action::Replace(editor)),
				Err(e) => {
					self.error(CompileErrorKind::Edit(e), *position);
					None
				}
			},
			ast::Action::Call(call) => {
				let function = match self.application.functions().and_then(|r| r.action(&call.name)) {
					Some(function) => function,
					None => {
						self.error(
							CompileErrorKind::UnknownFunction(call.name.clone()),
							call.position,
						);
						return None;
					}
				};

				if !crate::signature_accepts(function.signature(), call.args.len()) {
					self.error(
						CompileErrorKind::ArityMismatch {
							name: call.name.clone(),
							expected: function.signature().to_owned(),
							got: call.args.len(),
						},
						call.position,
					);
					return None;
				}

				match function.resolve(call, &self.context) {
					Ok(action) => Some(Action::Call(action)),
					Err(e) => {
						self.error(CompileErrorKind::Function(e), call.position);
						None
					}
				}
			}
		}
	}
}
