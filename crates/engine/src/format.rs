use crate::{CompileError, CompileErrorKind, CompileErrors, EngineContext};
use indexmap::IndexMap;
use sssom_t_core::{Mapping, MappingField, UriExpression};
use sssom_t_syntax::{parse_template, TemplateSegment};
use std::sync::Arc;

use crate::function::signature_accepts;

/// Error raised while rendering a template against a mapping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
	/// The template failed to compile; every rendering fails.
	#[error("template `{0}` did not compile")]
	InvalidTemplate(String),

	#[error("modifier `{name}` failed in template `{template}`: {message}")]
	Modifier {
		template: String,
		name: String,
		message: String,
	},
}

/// A named value transformation applicable inside a `%{…}` placeholder.
pub trait FormatModifier {
	/// The arity signature of the modifier's declared arguments (the
	/// piped value is not counted).
	fn signature(&self) -> &str;

	fn apply(
		&self,
		value: &str,
		args: &[String],
		context: &EngineContext,
	) -> Result<String, FormatError>;
}

/// Compiles template strings into mapping-to-string transformers,
/// dispatching `|modifiers` to a registry.
pub struct MappingFormatter {
	modifiers: IndexMap<String, Arc<dyn FormatModifier>>,
}

impl MappingFormatter {
	/// A formatter with the built-in modifiers (`short`,
	/// `uriexpr_slot_value`, `uriexpr_expand`) registered.
	pub fn new() -> Self {
		let mut formatter = Self {
			modifiers: IndexMap::new(),
		};
		formatter.register_modifier("short", Short);
		formatter.register_modifier("uriexpr_slot_value", UriExprSlotValue);
		formatter.register_modifier("uriexpr_expand", UriExprExpand);
		formatter
	}

	pub fn register_modifier(&mut self, name: impl Into<String>, modifier: impl FormatModifier + 'static) {
		let name = name.into();
		if self.modifiers.insert(name.clone(), Arc::new(modifier)).is_some() {
			log::debug!("format modifier `{name}` re-registered");
		}
	}

	/// Compiles a template, appending any problem to `errors`. On
	/// failure the returned transformer fails every rendering, so that
	/// compilation of the rest of the file can go on.
	pub fn compile(&self, source: &str, errors: &mut Vec<CompileError>) -> CompiledTemplate {
		let before = errors.len();

		let template = match parse_template(source) {
			Ok(template) => template,
			Err(e) => {
				errors.push(CompileError::new(CompileErrorKind::Template(e)));
				return CompiledTemplate::invalid(source);
			}
		};

		let mut segments = Vec::with_capacity(template.segments.len());
		for segment in &template.segments {
			match segment {
				TemplateSegment::Literal(text) => {
					segments.push(CompiledSegment::Literal(text.clone()))
				}
				TemplateSegment::Placeholder(placeholder) => {
					let accessor = match FieldAccessor::resolve(&placeholder.field) {
						Some(accessor) => accessor,
						None => {
							errors.push(CompileError::new(CompileErrorKind::UnknownField(
								placeholder.field.clone(),
							)));
							continue;
						}
					};

					let mut modifiers = Vec::with_capacity(placeholder.modifiers.len());
					for call in &placeholder.modifiers {
						let modifier = match self.modifiers.get(&call.name) {
							Some(modifier) => modifier,
							None => {
								errors.push(CompileError::new(CompileErrorKind::UnknownModifier(
									call.name.clone(),
								)));
								continue;
							}
						};

						if !signature_accepts(modifier.signature(), call.args.len()) {
							errors.push(CompileError::new(CompileErrorKind::ArityMismatch {
								name: call.name.clone(),
								expected: modifier.signature().to_owned(),
								got: call.args.len(),
							}));
							continue;
						}

						modifiers.push(BoundModifier {
							name: call.name.clone(),
							modifier: Arc::clone(modifier),
							args: call.args.clone(),
						});
					}

					segments.push(CompiledSegment::Placeholder { accessor, modifiers });
				}
			}
		}

		if errors.len() > before {
			CompiledTemplate::invalid(source)
		} else {
			CompiledTemplate {
				source: source.to_owned(),
				segments: Some(segments),
			}
		}
	}

	/// Compiles a single template, failing on the first problem.
	pub fn try_compile(&self, source: &str) -> Result<CompiledTemplate, CompileErrors> {
		let mut errors = Vec::new();
		let template = self.compile(source, &mut errors);
		if errors.is_empty() {
			Ok(template)
		} else {
			Err(CompileErrors(errors))
		}
	}
}

impl Default for MappingFormatter {
	fn default() -> Self {
		Self::new()
	}
}

/// A template compiled against the formatter's registries, reusable
/// across mappings.
#[derive(Clone)]
pub struct CompiledTemplate {
	source: String,
	segments: Option<Vec<CompiledSegment>>,
}

#[derive(Clone)]
enum CompiledSegment {
	Literal(String),
	Placeholder {
		accessor: FieldAccessor,
		modifiers: Vec<BoundModifier>,
	},
}

#[derive(Clone)]
struct BoundModifier {
	name: String,
	modifier: Arc<dyn FormatModifier>,
	args: Vec<String>,
}

impl std::fmt::Debug for CompiledTemplate {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.debug_struct("CompiledTemplate")
			.field("source", &self.source)
			.field("valid", &self.segments.is_some())
			.finish()
	}
}

impl CompiledTemplate {
	fn invalid(source: &str) -> Self {
		Self {
			source: source.to_owned(),
			segments: None,
		}
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn render(&self, mapping: &Mapping, context: &EngineContext) -> Result<String, FormatError> {
		let segments = self
			.segments
			.as_ref()
			.ok_or_else(|| FormatError::InvalidTemplate(self.source.clone()))?;

		let mut out = String::new();
		for segment in segments {
			match segment {
				CompiledSegment::Literal(text) => out.push_str(text),
				CompiledSegment::Placeholder { accessor, modifiers } => {
					let mut value = accessor.render(mapping, context);
					for bound in modifiers {
						value = bound.modifier.apply(&value, &bound.args, context)?;
					}
					out.push_str(&value);
				}
			}
		}

		Ok(out)
	}
}

/// Dereferences a placeholder field against a mapping.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum FieldAccessor {
	Field(MappingField),
	SubjectCurie,
	ObjectCurie,
}

impl FieldAccessor {
	fn resolve(name: &str) -> Option<Self> {
		match name {
			"subject_curie" => Some(Self::SubjectCurie),
			"object_curie" => Some(Self::ObjectCurie),
			other => MappingField::from_name(other).map(Self::Field),
		}
	}

	fn render(&self, mapping: &Mapping, context: &EngineContext) -> String {
		match self {
			Self::Field(field) => field.get(mapping).render(),
			Self::SubjectCurie => context
				.prefixes
				.shorten(&mapping.subject_id)
				.unwrap_or_else(|| mapping.subject_id.clone()),
			Self::ObjectCurie => context
				.prefixes
				.shorten(&mapping.object_id)
				.unwrap_or_else(|| mapping.object_id.clone()),
		}
	}
}

/// `short`: shortens the value into a CURIE when a registered prefix
/// matches, and leaves it alone otherwise.
struct Short;

impl FormatModifier for Short {
	fn signature(&self) -> &str {
		""
	}

	fn apply(&self, value: &str, _: &[String], context: &EngineContext) -> Result<String, FormatError> {
		Ok(context
			.prefixes
			.shorten(value)
			.unwrap_or_else(|| value.to_owned()))
	}
}

/// `uriexpr_slot_value(slot)`: the expanded IRI held by a slot of a
/// URI expression value. A value that is not a URI expression, or an
/// absent slot, leaves the value unchanged.
struct UriExprSlotValue;

impl FormatModifier for UriExprSlotValue {
	fn signature(&self) -> &str {
		"S"
	}

	fn apply(&self, value: &str, args: &[String], context: &EngineContext) -> Result<String, FormatError> {
		match UriExpression::parse(value, context.prefixes) {
			Some(expr) => match expr.component(&args[0]) {
				Some(iri) => Ok(iri.to_owned()),
				None => Ok(value.to_owned()),
			},
			None => Ok(value.to_owned()),
		}
	}
}

/// `uriexpr_expand` / `uriexpr_expand(syntax)`: renders a URI
/// expression value through a registered template. Without an argument
/// the schema must have exactly one registered syntax. Values that are
/// not URI expressions, or schemas without a matching template, are
/// left unchanged.
struct UriExprExpand;

impl FormatModifier for UriExprExpand {
	fn signature(&self) -> &str {
		"*"
	}

	fn apply(&self, value: &str, args: &[String], context: &EngineContext) -> Result<String, FormatError> {
		if args.len() > 1 {
			return Err(FormatError::Modifier {
				template: String::new(),
				name: "uriexpr_expand".to_owned(),
				message: "at most one syntax argument is accepted".to_owned(),
			});
		}

		let expr = match UriExpression::parse(value, context.prefixes) {
			Some(expr) => expr,
			None => return Ok(value.to_owned()),
		};

		let rendered = match args.first() {
			Some(syntax) => context.uriexpr.apply_template(&expr, syntax),
			None => {
				let mut syntaxes = context.uriexpr.syntaxes_for(expr.schema());
				match (syntaxes.next(), syntaxes.next()) {
					(Some(syntax), None) => context.uriexpr.apply_template(&expr, syntax),
					_ => None,
				}
			}
		};

		Ok(rendered.unwrap_or_else(|| value.to_owned()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::SetEntityChecker;
	use sssom_t_core::{PrefixManager, UriExpressionRegistry};

	fn prefixes() -> PrefixManager {
		let mut p = PrefixManager::new();
		p.add("ORGENT", "https://example.org/entities/").unwrap();
		p.add("COMENT", "https://example.com/entities/").unwrap();
		p
	}

	fn mapping() -> Mapping {
		let mut m = Mapping::new(
			"https://example.org/schema/0001/(field1:'ORGENT:0001',field2:'COMENT:0011')",
			"http://www.w3.org/2004/02/skos/core#exactMatch",
			"https://example.com/entities/0011",
		);
		m.subject_label = Some("alpha".to_owned());
		m
	}

	fn render(template: &str, mapping: &Mapping) -> String {
		let prefixes = prefixes();
		let mut uriexpr = UriExpressionRegistry::new();
		uriexpr.register_template(
			"https://example.org/schema/0001",
			"Manchester",
			"{field1} and {field2}",
		);
		let entities = SetEntityChecker::new();
		let context = EngineContext {
			prefixes: &prefixes,
			uriexpr: &uriexpr,
			entities: &entities,
		};

		let formatter = MappingFormatter::new();
		let compiled = formatter.try_compile(template).unwrap();
		compiled.render(mapping, &context).unwrap()
	}

	#[test]
	fn literal_and_fields() {
		assert_eq!(
			render("%{subject_label} -> %{object_curie}", &mapping()),
			"alpha -> COMENT:0011"
		);
	}

	#[test]
	fn slot_value_extraction() {
		assert_eq!(
			render("%{subject_id|uriexpr_slot_value(field1)}", &mapping()),
			"https://example.org/entities/0001"
		);
		assert_eq!(
			render("%{subject_id|uriexpr_slot_value(field1)|short}", &mapping()),
			"ORGENT:0001"
		);
	}

	#[test]
	fn slot_value_on_absent_slot_keeps_the_value() {
		assert_eq!(
			render("%{subject_id|uriexpr_slot_value(field3)}", &mapping()),
			mapping().subject_id
		);
	}

	#[test]
	fn slot_value_on_plain_iri_keeps_the_value() {
		let mut m = mapping();
		m.subject_id = "https://example.org/entities/0001".to_owned();
		assert_eq!(
			render("%{subject_id|uriexpr_slot_value(field1)}", &m),
			"https://example.org/entities/0001"
		);
	}

	#[test]
	fn uriexpr_expansion_with_single_registered_syntax() {
		assert_eq!(
			render("%{subject_id|uriexpr_expand}", &mapping()),
			"<https://example.org/entities/0001> and <https://example.com/entities/0011>"
		);
	}

	#[test]
	fn unknown_field_is_a_compile_error() {
		let formatter = MappingFormatter::new();
		let err = formatter.try_compile("%{subject_identifier}").unwrap_err();
		assert_eq!(err.0.len(), 1);
		assert!(err.0[0].to_string().contains("unknown mapping field"));
	}

	#[test]
	fn unknown_modifier_is_a_compile_error() {
		let formatter = MappingFormatter::new();
		let err = formatter.try_compile("%{subject_id|shorten}").unwrap_err();
		assert_eq!(err.0.len(), 1);
		assert!(err.0[0].to_string().contains("unknown template modifier"));
	}

	#[test]
	fn modifier_arity_is_checked() {
		let formatter = MappingFormatter::new();
		let err = formatter.try_compile("%{subject_id|short(now)}").unwrap_err();
		assert!(err.0[0].to_string().contains("arity mismatch"));
	}

	#[test]
	fn invalid_template_always_fails_to_render() {
		let formatter = MappingFormatter::new();
		let mut errors = Vec::new();
		let compiled = formatter.compile("%{oops", &mut errors);
		assert_eq!(errors.len(), 1);

		let prefixes = prefixes();
		let uriexpr = UriExpressionRegistry::new();
		let entities = SetEntityChecker::new();
		let context = EngineContext {
			prefixes: &prefixes,
			uriexpr: &uriexpr,
			entities: &entities,
		};
		assert!(matches!(
			compiled.render(&mapping(), &context),
			Err(FormatError::InvalidTemplate(_))
		));
	}

	#[test]
	fn list_fields_join_with_pipe() {
		let mut m = mapping();
		m.subject_match_field = vec!["label".to_owned(), "synonym".to_owned()];
		assert_eq!(render("%{subject_match_field}", &m), "label|synonym");
	}
}
