use crate::{Cardinality, PredicateModifier, PrefixManager};
use indexmap::IndexMap;

/// One semantic mapping relating a subject term to an object term
/// through a predicate.
///
/// Identifier fields hold full IRIs at run time; CURIEs found in source
/// documents are expanded by the loader before mappings reach the
/// engine.
#[derive(Clone, PartialEq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mapping {
	pub subject_id: String,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub subject_label: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub subject_category: Option<String>,

	pub predicate_id: String,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub predicate_label: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub predicate_modifier: Option<PredicateModifier>,

	pub object_id: String,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub object_label: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub object_category: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub mapping_justification: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub author_id: Vec<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub reviewer_id: Vec<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub creator_id: Vec<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub license: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub subject_type: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub object_type: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub subject_source: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub subject_source_version: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub object_source: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub object_source_version: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub mapping_provider: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub mapping_cardinality: Option<Cardinality>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub mapping_tool: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub mapping_date: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub subject_match_field: Vec<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub object_match_field: Vec<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub subject_preprocessing: Vec<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub object_preprocessing: Vec<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub similarity_score: Option<f64>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub similarity_measure: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub confidence: Option<f64>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub comment: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub see_also: Vec<String>,
}

impl Mapping {
	/// Creates a mapping with the three required identifier fields set
	/// and everything else empty.
	pub fn new(
		subject_id: impl Into<String>,
		predicate_id: impl Into<String>,
		object_id: impl Into<String>,
	) -> Self {
		Self {
			subject_id: subject_id.into(),
			predicate_id: predicate_id.into(),
			object_id: object_id.into(),
			..Self::default()
		}
	}
}

/// A set of mappings with its set-level metadata.
#[derive(Clone, PartialEq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MappingSet {
	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub mapping_set_id: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub mapping_set_version: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub mapping_set_title: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub license: Option<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub creator_id: Vec<String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "IndexMap::is_empty"))]
	pub curie_map: IndexMap<String, String>,

	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
	pub mappings: Vec<Mapping>,
}

impl MappingSet {
	/// Builds a prefix manager from the built-in prefixes extended with
	/// this set's CURIE map.
	pub fn prefix_manager(&self) -> PrefixManager {
		let mut prefixes = PrefixManager::new();
		for (name, iri) in &self.curie_map {
			if let Err(e) = prefixes.add(name, iri) {
				log::warn!("ignoring CURIE map entry: {e}");
			}
		}
		prefixes
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn curie_map_extends_builtins() {
		let mut set = MappingSet::default();
		set.curie_map
			.insert("FBbt".to_owned(), "http://purl.obolibrary.org/obo/FBbt_".to_owned());

		let prefixes = set.prefix_manager();
		assert!(prefixes.is_known_prefix("skos"));
		assert_eq!(
			prefixes.expand("FBbt:00000001"),
			"http://purl.obolibrary.org/obo/FBbt_00000001"
		);
	}
}
