//! This library implements the SSSOM/T transformation language: a
//! small rule language whose programs filter, edit and re-orient
//! [SSSOM](https://mapping-commons.github.io/sssom/) semantic mappings
//! and turn them into application-defined products.
//!
//! A host supplies a [`TransformApplication`] that registers prefixes,
//! functions and format modifiers; [`parse`] reads a rule file into an
//! AST; [`compile`] binds the AST to the application's registries; the
//! resulting [`RuleEngine`] is then applied to any number of mappings.
pub use sssom_t_core::*;
pub use sssom_t_engine::*;
pub use sssom_t_syntax::{
	parse, parse_template, ModifierCall, ParseError, ParseErrors, Placeholder, Position,
	PrefixDecl, Rule, RuleBody, RuleSet, Template, TemplateError, TemplateSegment,
};
pub use sssom_t_syntax::{Action as AstAction, FilterExpr, FunctionCall};
