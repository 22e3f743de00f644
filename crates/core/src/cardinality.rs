use std::fmt;
use std::str::FromStr;

/// The `mapping_cardinality` vocabulary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cardinality {
	#[cfg_attr(feature = "serde", serde(rename = "1:1"))]
	OneToOne,

	#[cfg_attr(feature = "serde", serde(rename = "1:n"))]
	OneToMany,

	#[cfg_attr(feature = "serde", serde(rename = "n:1"))]
	ManyToOne,

	#[cfg_attr(feature = "serde", serde(rename = "n:n"))]
	ManyToMany,

	#[cfg_attr(feature = "serde", serde(rename = "1:0"))]
	OneToNone,

	#[cfg_attr(feature = "serde", serde(rename = "0:1"))]
	NoneToOne,
}

impl Cardinality {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::OneToOne => "1:1",
			Self::OneToMany => "1:n",
			Self::ManyToOne => "n:1",
			Self::ManyToMany => "n:n",
			Self::OneToNone => "1:0",
			Self::NoneToOne => "0:1",
		}
	}

	/// The cardinality of the mapping read in the other direction.
	pub fn inverted(&self) -> Self {
		match self {
			Self::OneToMany => Self::ManyToOne,
			Self::ManyToOne => Self::OneToMany,
			Self::OneToNone => Self::NoneToOne,
			Self::NoneToOne => Self::OneToNone,
			other => *other,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mapping cardinality `{0}`")]
pub struct InvalidCardinality(pub String);

impl FromStr for Cardinality {
	type Err = InvalidCardinality;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"1:1" => Ok(Self::OneToOne),
			"1:n" => Ok(Self::OneToMany),
			"n:1" => Ok(Self::ManyToOne),
			"n:n" => Ok(Self::ManyToMany),
			"1:0" => Ok(Self::OneToNone),
			"0:1" => Ok(Self::NoneToOne),
			other => Err(InvalidCardinality(other.to_owned())),
		}
	}
}

impl fmt::Display for Cardinality {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The `predicate_modifier` vocabulary. `Not` negates the predicate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PredicateModifier {
	Not,
}

impl PredicateModifier {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Not => "Not",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid predicate modifier `{0}`")]
pub struct InvalidPredicateModifier(pub String);

impl FromStr for PredicateModifier {
	type Err = InvalidPredicateModifier;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Not" => Ok(Self::Not),
			other => Err(InvalidPredicateModifier(other.to_owned())),
		}
	}
}

impl fmt::Display for PredicateModifier {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn inversion_is_involutive() {
		for c in [
			Cardinality::OneToOne,
			Cardinality::OneToMany,
			Cardinality::ManyToOne,
			Cardinality::ManyToMany,
			Cardinality::OneToNone,
			Cardinality::NoneToOne,
		] {
			assert_eq!(c.inverted().inverted(), c);
		}
	}

	#[test]
	fn parse_round_trip() {
		assert_eq!("n:1".parse::<Cardinality>(), Ok(Cardinality::ManyToOne));
		assert_eq!(Cardinality::ManyToOne.to_string(), "n:1");
		assert!("2:1".parse::<Cardinality>().is_err());
	}
}
