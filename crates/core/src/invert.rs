use crate::Mapping;
use indexmap::IndexMap;
use iref::Iri;
use static_iref::iri;
use std::mem::swap;

/// Pairs of predicates that are each other's inverse, keyed by full
/// IRI. Both directions of every pair are registered.
#[derive(Clone, Debug)]
pub struct InversePredicateMap {
	map: IndexMap<String, String>,
}

const SKOS_BROAD_MATCH: &Iri = iri!("http://www.w3.org/2004/02/skos/core#broadMatch");
const SKOS_NARROW_MATCH: &Iri = iri!("http://www.w3.org/2004/02/skos/core#narrowMatch");

impl InversePredicateMap {
	/// An empty map; `invert` leaves every predicate untouched.
	pub fn empty() -> Self {
		Self { map: IndexMap::new() }
	}

	pub fn insert_pair(&mut self, a: &str, b: &str) {
		self.map.insert(a.to_owned(), b.to_owned());
		self.map.insert(b.to_owned(), a.to_owned());
	}

	pub fn inverse_of(&self, predicate: &str) -> Option<&str> {
		self.map.get(predicate).map(String::as_str)
	}
}

impl Default for InversePredicateMap {
	/// The SSSOM-recommended inversions.
	fn default() -> Self {
		let mut map = Self::empty();
		map.insert_pair(SKOS_BROAD_MATCH.as_str(), SKOS_NARROW_MATCH.as_str());
		map
	}
}

impl Mapping {
	/// Returns the mapping read in the object-to-subject direction.
	///
	/// The subject and object column families (id, label, category,
	/// type, source, source version, match field, preprocessing) are
	/// swapped, the cardinality is flipped, and the predicate is
	/// replaced by its registered inverse when `predicates` has one.
	pub fn inverted(&self, predicates: &InversePredicateMap) -> Self {
		let mut m = self.clone();

		swap(&mut m.subject_id, &mut m.object_id);
		swap(&mut m.subject_label, &mut m.object_label);
		swap(&mut m.subject_category, &mut m.object_category);
		swap(&mut m.subject_type, &mut m.object_type);
		swap(&mut m.subject_source, &mut m.object_source);
		swap(&mut m.subject_source_version, &mut m.object_source_version);
		swap(&mut m.subject_match_field, &mut m.object_match_field);
		swap(&mut m.subject_preprocessing, &mut m.object_preprocessing);

		m.mapping_cardinality = m.mapping_cardinality.map(|c| c.inverted());

		if let Some(inverse) = predicates.inverse_of(&m.predicate_id) {
			m.predicate_id = inverse.to_owned();
			m.predicate_label = None;
		}

		m
	}
}
