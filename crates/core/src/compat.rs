use indexmap::IndexMap;

const RENAMED_KEYS: &[(&str, &str)] = &[
	("semantic_similarity_score", "similarity_score"),
	("semantic_similarity_measure", "similarity_measure"),
];

/// Upgrades the deprecated slot names of a raw record in place.
///
/// This is the pre-engine hook loaders apply to each record before
/// turning it into a [`Mapping`](crate::Mapping): the value of a
/// deprecated key is moved to its modern name when the modern name is
/// absent, and the deprecated key is removed either way.
pub fn upgrade_legacy_keys(record: &mut IndexMap<String, String>) {
	for (deprecated, modern) in RENAMED_KEYS {
		if let Some(value) = record.shift_remove(*deprecated) {
			if record.contains_key(*modern) {
				log::warn!("dropping deprecated key `{deprecated}`: `{modern}` is also present");
			} else {
				log::debug!("renaming deprecated key `{deprecated}` to `{modern}`");
				record.insert((*modern).to_owned(), value);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
			.collect()
	}

	#[test]
	fn deprecated_keys_are_renamed() {
		let mut r = record(&[
			("subject_id", "A:1"),
			("semantic_similarity_score", "0.9"),
			("semantic_similarity_measure", "Levenshtein"),
		]);
		upgrade_legacy_keys(&mut r);

		assert_eq!(r.get("similarity_score").map(String::as_str), Some("0.9"));
		assert_eq!(r.get("similarity_measure").map(String::as_str), Some("Levenshtein"));
		assert!(!r.contains_key("semantic_similarity_score"));
		assert!(!r.contains_key("semantic_similarity_measure"));
	}

	#[test]
	fn modern_keys_take_precedence() {
		let mut r = record(&[
			("similarity_score", "0.5"),
			("semantic_similarity_score", "0.9"),
		]);
		upgrade_legacy_keys(&mut r);

		assert_eq!(r.get("similarity_score").map(String::as_str), Some("0.5"));
		assert!(!r.contains_key("semantic_similarity_score"));
	}
}
