//! The SSSOM/T rule engine: compiles parsed rule sets against an
//! application's registries and applies them to streams of mappings.
use sssom_t_core::{PrefixManager, UriExpressionRegistry};

mod action;
mod application;
mod compile;
mod engine;
mod filter;
mod filtering;
mod format;
mod function;

pub use action::*;
pub use application::*;
pub use compile::*;
pub use engine::*;
pub use filter::{CardinalityFilter, CardinalityPart, Filter, IdFieldRef, IdFilter, IdPattern};
pub use filtering::*;
pub use format::*;
pub use function::*;

/// Everything a filter, action or format modifier may consult while a
/// mapping is being processed.
pub struct EngineContext<'a> {
	pub prefixes: &'a PrefixManager,
	pub uriexpr: &'a UriExpressionRegistry,
	pub entities: &'a dyn EntityChecker,
}
