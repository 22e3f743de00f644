use crate::{CompileContext, EngineContext};
use educe::Educe;
use indexmap::IndexMap;
use sssom_t_core::Mapping;
use sssom_t_syntax::FunctionCall;

/// Error raised by a function while resolving a call or processing a
/// mapping.
#[derive(Debug, thiserror::Error)]
#[error("function `{name}` failed: {cause}")]
pub struct FunctionError {
	pub name: String,
	#[source]
	pub cause: Box<dyn std::error::Error + Send + Sync>,
}

impl FunctionError {
	pub fn new(
		name: impl Into<String>,
		cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
	) -> Self {
		Self {
			name: name.into(),
			cause: cause.into(),
		}
	}
}

/// A compiled predicate over mappings.
pub trait MappingFilter {
	fn filter(&self, mapping: &Mapping, context: &EngineContext) -> bool;
}

/// A compiled action; applying it to a mapping may produce a product.
pub trait MappingAction<T> {
	fn apply(&self, mapping: &Mapping, context: &EngineContext) -> Result<Option<T>, FunctionError>;
}

/// A named function usable in filter position. Resolution happens once
/// per call site, at compile time.
pub trait FilterFunction {
	/// The arity signature of the function (see [`signature_accepts`]).
	fn signature(&self) -> &str;

	fn resolve(
		&self,
		call: &FunctionCall,
		context: &CompileContext,
	) -> Result<Box<dyn MappingFilter>, FunctionError>;
}

/// A named function usable in action position, producing actions of
/// product type `T`.
pub trait ActionFunction<T> {
	fn signature(&self) -> &str;

	fn resolve(
		&self,
		call: &FunctionCall,
		context: &CompileContext,
	) -> Result<Box<dyn MappingAction<T>>, FunctionError>;
}

/// The two per-application function registries: filter-producing and
/// action-producing, both keyed by call name.
#[derive(Educe)]
#[educe(Default)]
pub struct FunctionRegistry<T> {
	filters: IndexMap<String, Box<dyn FilterFunction>>,
	actions: IndexMap<String, Box<dyn ActionFunction<T>>>,
}

impl<T> FunctionRegistry<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_filter(&mut self, name: impl Into<String>, function: impl FilterFunction + 'static) {
		let name = name.into();
		if self.filters.insert(name.clone(), Box::new(function)).is_some() {
			log::debug!("filter function `{name}` re-registered");
		}
	}

	pub fn register_action(&mut self, name: impl Into<String>, function: impl ActionFunction<T> + 'static) {
		let name = name.into();
		if self.actions.insert(name.clone(), Box::new(function)).is_some() {
			log::debug!("action function `{name}` re-registered");
		}
	}

	pub fn filter(&self, name: &str) -> Option<&dyn FilterFunction> {
		self.filters.get(name).map(Box::as_ref)
	}

	pub fn action(&self, name: &str) -> Option<&dyn ActionFunction<T>> {
		self.actions.get(name).map(Box::as_ref)
	}
}

/// Checks an argument count against an arity signature.
///
/// The signature grammar is a sequence of `S` (string) and `I`
/// (integer) argument letters, optionally with parenthesised
/// one-or-more groups like `(SS)+`; `*` alone accepts anything. A
/// malformed signature accepts nothing.
pub fn signature_accepts(signature: &str, argc: usize) -> bool {
	if signature == "*" {
		return true;
	}

	let mut fixed = 0usize;
	let mut groups = Vec::new();
	let mut chars = signature.chars();
	while let Some(c) = chars.next() {
		match c {
			'S' | 'I' => fixed += 1,
			'(' => {
				let mut len = 0usize;
				loop {
					match chars.next() {
						Some('S' | 'I') => len += 1,
						Some(')') => break,
						_ => return false,
					}
				}
				if chars.next() != Some('+') || len == 0 {
					return false;
				}
				groups.push(len);
			}
			_ => return false,
		}
	}

	argc >= fixed && fits(argc - fixed, &groups)
}

fn fits(rest: usize, groups: &[usize]) -> bool {
	match groups.split_first() {
		None => rest == 0,
		Some((&len, tail)) => {
			let mut n = 1;
			while len * n <= rest {
				if fits(rest - len * n, tail) {
					return true;
				}
				n += 1;
			}
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fixed_signatures() {
		assert!(signature_accepts("", 0));
		assert!(!signature_accepts("", 1));
		assert!(signature_accepts("S", 1));
		assert!(!signature_accepts("S", 0));
		assert!(signature_accepts("SIS", 3));
		assert!(!signature_accepts("SIS", 2));
	}

	#[test]
	fn variadic_signature() {
		for n in 0..5 {
			assert!(signature_accepts("*", n));
		}
	}

	#[test]
	fn pair_group_signature() {
		assert!(!signature_accepts("(SS)+", 0));
		assert!(!signature_accepts("(SS)+", 1));
		assert!(signature_accepts("(SS)+", 2));
		assert!(!signature_accepts("(SS)+", 3));
		assert!(signature_accepts("(SS)+", 4));
	}

	#[test]
	fn fixed_prefix_with_group() {
		assert!(signature_accepts("S(SS)+", 3));
		assert!(!signature_accepts("S(SS)+", 2));
		assert!(signature_accepts("S(SS)+", 5));
	}

	#[test]
	fn malformed_signatures_accept_nothing() {
		assert!(!signature_accepts("(SS", 2));
		assert!(!signature_accepts("(SS)", 2));
		assert!(!signature_accepts("X", 1));
	}
}
