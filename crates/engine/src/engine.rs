use crate::{Action, EngineContext, EntityChecker, Filter, FunctionError};
use hashbrown::HashSet;
use sssom_t_core::{InversePredicateMap, Mapping, PrefixManager, UriExpressionRegistry};
use std::fmt;

/// Identity of a compiled rule: its position path in the rule file
/// (`"3"`, `"3.1"`, …) and its effective tag set.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RuleId {
	pub path: String,
	pub tags: Vec<String>,
}

impl fmt::Display for RuleId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "rule {}", self.path)
	}
}

/// A rule compiled against an application, ready for evaluation.
pub struct CompiledRule<T> {
	pub id: RuleId,
	pub filter: Filter,
	pub body: CompiledBody<T>,
}

pub enum CompiledBody<T> {
	Actions(Vec<Action<T>>),
	Rules(Vec<CompiledRule<T>>),
}

/// Which rules run, by tag. Include and exclude lists are mutually
/// exclusive by construction; use [`TagSelection::new`] to build one
/// from possibly-both option sets.
#[derive(Clone, Debug, Default)]
pub enum TagSelection {
	#[default]
	All,
	Include(HashSet<String>),
	Exclude(HashSet<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("include-tags and exclude-tags are mutually exclusive")]
pub struct TagSelectionError;

impl TagSelection {
	pub fn include<I: IntoIterator<Item = S>, S: Into<String>>(tags: I) -> Self {
		Self::Include(tags.into_iter().map(Into::into).collect())
	}

	pub fn exclude<I: IntoIterator<Item = S>, S: Into<String>>(tags: I) -> Self {
		Self::Exclude(tags.into_iter().map(Into::into).collect())
	}

	/// Builds a selection from optional include and exclude sets, as a
	/// command-line host would collect them. Supplying both is an
	/// error.
	pub fn new(
		include: Option<Vec<String>>,
		exclude: Option<Vec<String>>,
	) -> Result<Self, TagSelectionError> {
		match (include, exclude) {
			(Some(_), Some(_)) => Err(TagSelectionError),
			(Some(tags), None) => Ok(Self::include(tags)),
			(None, Some(tags)) => Ok(Self::exclude(tags)),
			(None, None) => Ok(Self::All),
		}
	}

	fn enables(&self, tags: &[String]) -> bool {
		match self {
			Self::All => true,
			Self::Include(selected) => tags.iter().any(|t| selected.contains(t.as_str())),
			Self::Exclude(selected) => !tags.iter().any(|t| selected.contains(t.as_str())),
		}
	}
}

/// Error terminating a strict run.
#[derive(Debug, thiserror::Error)]
#[error("processing stopped at mapping {index}: {source}")]
pub struct ProcessError {
	pub index: usize,
	#[source]
	pub source: FunctionError,
}

type Listener<T> = Box<dyn FnMut(&RuleId, &Mapping, &T)>;

/// The compiled rule engine: applies a rule tree to mappings, emitting
/// the application's products in deterministic order.
///
/// Built by [`compile`](crate::compile); the registries it carries are
/// frozen at that point.
pub struct RuleEngine<T> {
	prefixes: PrefixManager,
	uriexpr: UriExpressionRegistry,
	entities: Box<dyn EntityChecker>,
	inverse_predicates: InversePredicateMap,
	rules: Vec<CompiledRule<T>>,
	selection: TagSelection,
	strict: bool,
	listeners: Vec<Listener<T>>,
}

enum Flow {
	Continue,
	Halt,
}

impl<T> fmt::Debug for RuleEngine<T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("RuleEngine")
			.field("rules", &self.rules.len())
			.field("selection", &self.selection)
			.field("strict", &self.strict)
			.finish_non_exhaustive()
	}
}

impl<T> RuleEngine<T> {
	pub(crate) fn new(
		prefixes: PrefixManager,
		uriexpr: UriExpressionRegistry,
		entities: Box<dyn EntityChecker>,
		inverse_predicates: InversePredicateMap,
		rules: Vec<CompiledRule<T>>,
	) -> Self {
		Self {
			prefixes,
			uriexpr,
			entities,
			inverse_predicates,
			rules,
			selection: TagSelection::All,
			strict: false,
			listeners: Vec::new(),
		}
	}

	/// The effective prefix table: built-ins, application prefixes and
	/// the rule file's own declarations.
	pub fn prefix_manager(&self) -> &PrefixManager {
		&self.prefixes
	}

	pub fn uri_expression_registry(&self) -> &UriExpressionRegistry {
		&self.uriexpr
	}

	pub fn entity_checker_mut(&mut self) -> &mut dyn EntityChecker {
		&mut *self.entities
	}

	pub fn rules(&self) -> &[CompiledRule<T>] {
		&self.rules
	}

	/// In strict mode a run-time function error aborts the whole run
	/// instead of dropping the offending mapping.
	pub fn set_strict(&mut self, strict: bool) {
		self.strict = strict
	}

	pub fn set_tag_selection(&mut self, selection: TagSelection) {
		self.selection = selection
	}

	/// Registers a listener invoked with `(rule, mapping, product)`
	/// after each product emission, in emission order.
	pub fn add_listener(&mut self, listener: impl FnMut(&RuleId, &Mapping, &T) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	/// Runs every enabled rule over every mapping, in rule-file order
	/// per mapping, and returns the emitted products.
	///
	/// A run-time function error drops the offending mapping with a
	/// warning (strict mode instead aborts); products already emitted
	/// for it are kept.
	pub fn process(&mut self, mappings: &[Mapping]) -> Result<Vec<T>, ProcessError> {
		let mut products = Vec::new();

		for (index, mapping) in mappings.iter().enumerate() {
			let context = EngineContext {
				prefixes: &self.prefixes,
				uriexpr: &self.uriexpr,
				entities: &*self.entities,
			};

			let mut current = mapping.clone();
			let outcome = eval_rules(
				&self.rules,
				&context,
				&self.selection,
				&self.inverse_predicates,
				&mut current,
				&mut products,
				&mut self.listeners,
			);

			if let Err(e) = outcome {
				if self.strict {
					return Err(ProcessError { index, source: e });
				}
				log::warn!("dropping mapping {index} ({}): {e}", mapping.subject_id);
			}
		}

		Ok(products)
	}
}

fn eval_rules<T>(
	rules: &[CompiledRule<T>],
	context: &EngineContext,
	selection: &TagSelection,
	inverse_predicates: &InversePredicateMap,
	current: &mut Mapping,
	products: &mut Vec<T>,
	listeners: &mut [Listener<T>],
) -> Result<Flow, FunctionError> {
	for rule in rules {
		if let Flow::Halt = eval_rule(
			rule,
			context,
			selection,
			inverse_predicates,
			current,
			products,
			listeners,
		)? {
			return Ok(Flow::Halt);
		}
	}
	Ok(Flow::Continue)
}

fn eval_rule<T>(
	rule: &CompiledRule<T>,
	context: &EngineContext,
	selection: &TagSelection,
	inverse_predicates: &InversePredicateMap,
	current: &mut Mapping,
	products: &mut Vec<T>,
	listeners: &mut [Listener<T>],
) -> Result<Flow, FunctionError> {
	match &rule.body {
		CompiledBody::Actions(actions) => {
			// Tag selection applies to action rules only; grouping
			// rules are traversed so that enabled descendants run.
			if !selection.enables(&rule.id.tags) {
				return Ok(Flow::Continue);
			}

			if !rule.filter.filter(current, context) {
				return Ok(Flow::Continue);
			}

			for action in actions {
				match action {
					Action::Stop => return Ok(Flow::Halt),
					Action::Invert => *current = current.inverted(inverse_predicates),
					Action::Assign(editor) => {
						*current = editor
							.apply(current)
							.map_err(|e| FunctionError::new("assign", e))?
					}
					Action::Replace(editor) => {
						*current = editor
							.apply(current)
							.map_err(|e| FunctionError::new("replace", e))?
					}
					Action::Call(function) => {
						if let Some(product) = function.apply(current, context)? {
							for listener in listeners.iter_mut() {
								listener(&rule.id, current, &product);
							}
							products.push(product);
						}
					}
				}
			}

			Ok(Flow::Continue)
		}
		CompiledBody::Rules(rules) => {
			if !rule.filter.filter(current, context) {
				return Ok(Flow::Continue);
			}
			eval_rules(
				rules,
				context,
				selection,
				inverse_predicates,
				current,
				products,
				listeners,
			)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tag_selection() {
		let tagged = ["a".to_owned(), "b".to_owned()];
		let untagged: [String; 0] = [];

		assert!(TagSelection::All.enables(&tagged));
		assert!(TagSelection::All.enables(&untagged));

		let include = TagSelection::include(["a"]);
		assert!(include.enables(&tagged));
		assert!(!include.enables(&untagged));

		let exclude = TagSelection::exclude(["a"]);
		assert!(!exclude.enables(&tagged));
		assert!(exclude.enables(&untagged));
	}

	#[test]
	fn both_tag_lists_are_rejected() {
		assert_eq!(
			TagSelection::new(Some(vec!["a".to_owned()]), Some(vec!["b".to_owned()])).err(),
			Some(TagSelectionError)
		);
	}
}
