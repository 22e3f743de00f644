use crate::{
	CompileContext, CompiledTemplate, EngineContext, FilterFunction, FunctionError, MappingFilter,
};
use sssom_t_core::{Mapping, PredicateModifier, UriExpression};
use sssom_t_syntax::FunctionCall;

/// A compiled filter expression, evaluated against one mapping at a
/// time. `And`/`Or` short-circuit.
pub enum Filter {
	Id(IdFilter),
	Cardinality(CardinalityFilter),
	PredicateModifierIsNot,
	Not(Box<Filter>),
	And(Box<Filter>, Box<Filter>),
	Or(Box<Filter>, Box<Filter>),
	Group(Box<Filter>),
	Call(Box<dyn MappingFilter>),
}

impl Filter {
	pub fn filter(&self, mapping: &Mapping, context: &EngineContext) -> bool {
		match self {
			Self::Id(f) => f.matches(mapping),
			Self::Cardinality(f) => f.matches(mapping),
			Self::PredicateModifierIsNot => {
				mapping.predicate_modifier == Some(PredicateModifier::Not)
			}
			Self::Not(f) => !f.filter(mapping, context),
			Self::And(a, b) => a.filter(mapping, context) && b.filter(mapping, context),
			Self::Or(a, b) => a.filter(mapping, context) || b.filter(mapping, context),
			Self::Group(f) => f.filter(mapping, context),
			Self::Call(f) => f.filter(mapping, context),
		}
	}
}

/// The identifier fields addressable by `field==value` filters.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IdFieldRef {
	Subject,
	Predicate,
	Object,
	MappingJustification,
	SubjectSource,
	ObjectSource,
}

impl IdFieldRef {
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"subject" => Some(Self::Subject),
			"predicate" => Some(Self::Predicate),
			"object" => Some(Self::Object),
			"mapping_justification" => Some(Self::MappingJustification),
			"subject_source" => Some(Self::SubjectSource),
			"object_source" => Some(Self::ObjectSource),
			_ => None,
		}
	}

	fn value<'a>(&self, mapping: &'a Mapping) -> Option<&'a str> {
		match self {
			Self::Subject => Some(&mapping.subject_id),
			Self::Predicate => Some(&mapping.predicate_id),
			Self::Object => Some(&mapping.object_id),
			Self::MappingJustification => mapping.mapping_justification.as_deref(),
			Self::SubjectSource => mapping.subject_source.as_deref(),
			Self::ObjectSource => mapping.object_source.as_deref(),
		}
	}
}

/// How an id filter value matches: exact expanded IRI, expanded IRI
/// prefix (`value` ended with `*`), or mere presence (`*`).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum IdPattern {
	Any,
	Prefix(String),
	Exact(String),
}

impl IdPattern {
	/// Builds a pattern from a filter value already expanded through
	/// the prefix table.
	pub fn from_expanded(value: &str) -> Self {
		if value == "*" {
			Self::Any
		} else if let Some(stem) = value.strip_suffix('*') {
			Self::Prefix(stem.to_owned())
		} else {
			Self::Exact(value.to_owned())
		}
	}

	pub fn matches(&self, value: &str) -> bool {
		match self {
			Self::Any => !value.is_empty(),
			Self::Prefix(stem) => value.starts_with(stem),
			Self::Exact(exact) => value == exact,
		}
	}
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IdFilter {
	pub field: IdFieldRef,
	pub pattern: IdPattern,
}

impl IdFilter {
	fn matches(&self, mapping: &Mapping) -> bool {
		match self.field.value(mapping) {
			Some(value) => self.pattern.matches(value),
			None => false,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CardinalityPart {
	One,
	Many,
	Zero,
	Any,
}

impl CardinalityPart {
	fn parse(s: &str) -> Option<Self> {
		match s {
			"1" => Some(Self::One),
			"n" => Some(Self::Many),
			"0" => Some(Self::Zero),
			"*" => Some(Self::Any),
			_ => None,
		}
	}

	fn matches(&self, s: &str) -> bool {
		match self {
			Self::One => s == "1",
			Self::Many => s == "n",
			Self::Zero => s == "0",
			Self::Any => true,
		}
	}
}

/// The `cardinality==L:R` pseudo-field filter, where each side is `1`,
/// `n`, `0` or `*`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CardinalityFilter {
	left: CardinalityPart,
	right: CardinalityPart,
}

impl CardinalityFilter {
	pub fn parse(value: &str) -> Option<Self> {
		let (left, right) = value.split_once(':')?;
		Some(Self {
			left: CardinalityPart::parse(left)?,
			right: CardinalityPart::parse(right)?,
		})
	}

	fn matches(&self, mapping: &Mapping) -> bool {
		match mapping.mapping_cardinality {
			Some(cardinality) => {
				let (left, right) = cardinality
					.as_str()
					.split_once(':')
					.unwrap_or((cardinality.as_str(), ""));
				self.left.matches(left) && self.right.matches(right)
			}
			None => false,
		}
	}
}

/// `exists(entity)`: true when the application's entity checker knows
/// the entity. The argument is a format template; its rendering is
/// expanded through the prefix table before the lookup.
pub(crate) struct ExistsFunction;

pub(crate) static EXISTS: ExistsFunction = ExistsFunction;

impl FilterFunction for ExistsFunction {
	fn signature(&self) -> &str {
		"S"
	}

	fn resolve(
		&self,
		call: &FunctionCall,
		context: &CompileContext,
	) -> Result<Box<dyn MappingFilter>, FunctionError> {
		let template = context
			.formatter
			.try_compile(&call.args[0])
			.map_err(|e| FunctionError::new("exists", e))?;
		Ok(Box::new(ExistsFilter { template }))
	}
}

struct ExistsFilter {
	template: CompiledTemplate,
}

impl MappingFilter for ExistsFilter {
	fn filter(&self, mapping: &Mapping, context: &EngineContext) -> bool {
		match self.template.render(mapping, context) {
			Ok(value) => context.entities.exists(&context.prefixes.expand(&value)),
			Err(e) => {
				log::warn!("exists(): {e}");
				false
			}
		}
	}
}

/// `uriexpr_contains(value, slot, pattern)`: true when `value` renders
/// to a URI expression whose `slot` matches `pattern` (a CURIE, or a
/// CURIE ending in `*` for a prefix match). A value that is not a URI
/// expression does not match.
pub(crate) struct UriExprContainsFunction;

pub(crate) static URIEXPR_CONTAINS: UriExprContainsFunction = UriExprContainsFunction;

impl FilterFunction for UriExprContainsFunction {
	fn signature(&self) -> &str {
		"SSS"
	}

	fn resolve(
		&self,
		call: &FunctionCall,
		context: &CompileContext,
	) -> Result<Box<dyn MappingFilter>, FunctionError> {
		let template = context
			.formatter
			.try_compile(&call.args[0])
			.map_err(|e| FunctionError::new("uriexpr_contains", e))?;
		let pattern = IdPattern::from_expanded(&context.prefixes.expand(&call.args[2]));

		Ok(Box::new(UriExprContainsFilter {
			template,
			slot: call.args[1].clone(),
			pattern,
		}))
	}
}

struct UriExprContainsFilter {
	template: CompiledTemplate,
	slot: String,
	pattern: IdPattern,
}

impl MappingFilter for UriExprContainsFilter {
	fn filter(&self, mapping: &Mapping, context: &EngineContext) -> bool {
		let value = match self.template.render(mapping, context) {
			Ok(value) => value,
			Err(e) => {
				log::warn!("uriexpr_contains(): {e}");
				return false;
			}
		};

		match UriExpression::parse(&value, context.prefixes) {
			Some(expr) => match expr.component(&self.slot) {
				Some(iri) => self.pattern.matches(iri),
				None => false,
			},
			None => false,
		}
	}
}

/// The filter functions every application gets for free.
pub(crate) fn builtin_filter(name: &str) -> Option<&'static dyn FilterFunction> {
	match name {
		"exists" => Some(&EXISTS),
		"uriexpr_contains" => Some(&URIEXPR_CONTAINS),
		_ => None,
	}
}
