use crate::{
	EngineContext, EntityChecker, FunctionError, FunctionRegistry, MappingAction,
	SetEntityChecker, TransformApplication,
};
use sssom_t_core::{InversePredicateMap, Mapping, UriExpressionRegistry};

/// The application whose product is the mapping itself: rules select,
/// edit and re-orient mappings, and `include()` emits the current
/// mapping.
///
/// This is the application behind mapping-set filtering hosts, where
/// the engine's output is a new mapping set.
#[derive(Default)]
pub struct MappingFilterApplication {
	functions: FunctionRegistry<Mapping>,
	uriexpr: UriExpressionRegistry,
	entities: SetEntityChecker,
	inverse_predicates: InversePredicateMap,
}

impl MappingFilterApplication {
	pub fn new() -> Self {
		Self::default()
	}

	/// The function registries, for registering host extensions.
	pub fn functions_mut(&mut self) -> &mut FunctionRegistry<Mapping> {
		&mut self.functions
	}

	pub fn uri_expression_registry_mut(&mut self) -> &mut UriExpressionRegistry {
		&mut self.uriexpr
	}

	pub fn entity_checker_mut(&mut self) -> &mut SetEntityChecker {
		&mut self.entities
	}

	pub fn inverse_predicates_mut(&mut self) -> &mut InversePredicateMap {
		&mut self.inverse_predicates
	}
}

impl TransformApplication for MappingFilterApplication {
	type Product = Mapping;

	fn functions(&self) -> Option<&FunctionRegistry<Mapping>> {
		Some(&self.functions)
	}

	fn uri_expression_registry(&self) -> UriExpressionRegistry {
		self.uriexpr.clone()
	}

	fn entity_checker(&self) -> Box<dyn EntityChecker> {
		Box::new(self.entities.clone())
	}

	fn inverse_predicates(&self) -> InversePredicateMap {
		self.inverse_predicates.clone()
	}

	fn include_action(&self) -> Option<Box<dyn MappingAction<Mapping>>> {
		Some(Box::new(IncludeAction))
	}
}

/// `include()`: emits the current (possibly edited or inverted)
/// mapping as the product.
pub struct IncludeAction;

impl MappingAction<Mapping> for IncludeAction {
	fn apply(&self, mapping: &Mapping, _: &EngineContext) -> Result<Option<Mapping>, FunctionError> {
		Ok(Some(mapping.clone()))
	}
}
