use crate::Position;
use indexmap::IndexMap;
use smallvec::SmallVec;

/// A parsed transformation file: prefix declarations followed by rules.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct RuleSet {
	pub prefixes: Vec<PrefixDecl>,
	pub rules: Vec<Rule>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PrefixDecl {
	pub name: String,
	pub iri: String,
	pub position: Position,
}

/// One rule: an optional tag list, a filter, and either actions or a
/// nested block of rules whose filters are AND-composed with this one.
#[derive(Clone, PartialEq, Debug)]
pub struct Rule {
	pub tags: SmallVec<[String; 2]>,
	pub filter: FilterExpr,
	pub body: RuleBody,
	pub position: Position,
}

#[derive(Clone, PartialEq, Debug)]
pub enum RuleBody {
	Actions(Vec<Action>),
	Rules(Vec<Rule>),
}

#[derive(Clone, PartialEq, Debug)]
pub enum FilterExpr {
	/// `field==value` where `value` is a CURIE, a CURIE ending in `*`,
	/// `*`, or a cardinality pattern.
	IdMatch {
		field: String,
		value: String,
		position: Position,
	},

	/// The literal `predicate_modifier==Not` filter.
	PredicateModifierIsNot,

	Not(Box<FilterExpr>),
	And(Box<FilterExpr>, Box<FilterExpr>),
	Or(Box<FilterExpr>, Box<FilterExpr>),
	Group(Box<FilterExpr>),
	Call(FunctionCall),
}

#[derive(Clone, PartialEq, Debug)]
pub enum Action {
	Stop,
	Invert,
	Include {
		position: Position,
	},
	Assign {
		pairs: Vec<(String, String)>,
		position: Position,
	},
	Replace {
		field: String,
		pattern: String,
		replacement: String,
		position: Position,
	},
	Call(FunctionCall),
}

/// A call to a registered function, in filter or action position.
#[derive(Clone, PartialEq, Debug)]
pub struct FunctionCall {
	pub name: String,
	pub args: SmallVec<[String; 4]>,
	pub named: IndexMap<String, String>,
	pub position: Position,
}

impl FunctionCall {
	pub fn new(name: impl Into<String>, position: Position) -> Self {
		Self {
			name: name.into(),
			args: SmallVec::new(),
			named: IndexMap::new(),
			position,
		}
	}
}
