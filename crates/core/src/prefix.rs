use indexmap::IndexMap;
use iref::Iri;
use regex::Regex;
use static_iref::iri;

/// Prefixes every manager starts with. They may be overridden by the
/// application or by a transformation file.
pub const BUILTIN_PREFIXES: &[(&str, &Iri)] = &[
	("owl", iri!("http://www.w3.org/2002/07/owl#")),
	("rdf", iri!("http://www.w3.org/1999/02/22-rdf-syntax-ns#")),
	("rdfs", iri!("http://www.w3.org/2000/01/rdf-schema#")),
	("xsd", iri!("http://www.w3.org/2001/XMLSchema#")),
	("skos", iri!("http://www.w3.org/2004/02/skos/core#")),
	("semapv", iri!("https://w3id.org/semapv/vocab/")),
	("sssom", iri!("https://w3id.org/sssom/")),
];

/// Error raised when registering a prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefixError {
	/// Strict-mode re-registration of a name with a different expansion.
	#[error("prefix `{0}` is already registered with a different expansion")]
	Conflict(String),

	#[error("invalid prefix name `{0}`")]
	InvalidName(String),
}

/// Table of prefix/expansion pairs used to expand CURIEs into full IRIs
/// and to shorten IRIs back into CURIEs.
///
/// Insertion order is preserved: when two registered expansions of equal
/// length match an IRI being shortened, the first registered one wins.
#[derive(Clone, Debug)]
pub struct PrefixManager {
	prefixes: IndexMap<String, String>,
	curie: Regex,
	strict: bool,
}

impl PrefixManager {
	/// Creates a manager preloaded with [`BUILTIN_PREFIXES`].
	pub fn new() -> Self {
		let mut prefixes = IndexMap::new();
		for (name, iri) in BUILTIN_PREFIXES {
			prefixes.insert((*name).to_owned(), iri.to_string());
		}

		Self {
			prefixes,
			curie: Regex::new("^[A-Za-z0-9_]+:[A-Za-z0-9_*./#-]+$").unwrap(),
			strict: false,
		}
	}

	/// In strict mode, re-registering a known prefix with a different
	/// expansion is a [`PrefixError::Conflict`] instead of a replacement.
	pub fn set_strict(&mut self, strict: bool) {
		self.strict = strict
	}

	pub fn is_strict(&self) -> bool {
		self.strict
	}

	/// Registers `name` as a shorthand for `iri`, replacing any previous
	/// registration unless the manager is strict.
	pub fn add(&mut self, name: &str, iri: &str) -> Result<(), PrefixError> {
		if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
			return Err(PrefixError::InvalidName(name.to_owned()));
		}

		match self.prefixes.get(name) {
			Some(previous) if previous == iri => Ok(()),
			Some(previous) => {
				if self.strict {
					return Err(PrefixError::Conflict(name.to_owned()));
				}

				log::debug!("prefix `{name}` redefined from <{previous}> to <{iri}>");
				self.prefixes.insert(name.to_owned(), iri.to_owned());
				Ok(())
			}
			None => {
				self.prefixes.insert(name.to_owned(), iri.to_owned());
				Ok(())
			}
		}
	}

	pub fn is_known_prefix(&self, name: &str) -> bool {
		self.prefixes.contains_key(name)
	}

	pub fn expansion(&self, name: &str) -> Option<&str> {
		self.prefixes.get(name).map(String::as_str)
	}

	/// Iterates over the registered `(prefix, expansion)` pairs in
	/// insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.prefixes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Expands a CURIE token into a full IRI.
	///
	/// A token is treated as a CURIE when it matches the CURIE token
	/// grammar and its prefix is registered; anything else (full IRIs,
	/// `<>`-wrapped IRIs, unknown prefixes) is returned unchanged.
	pub fn expand(&self, token: &str) -> String {
		if token.starts_with("http") || token.starts_with('<') {
			return token.to_owned();
		}

		if !self.curie.is_match(token) {
			return token.to_owned();
		}

		let (name, local) = match token.split_once(':') {
			Some(parts) => parts,
			None => return token.to_owned(),
		};

		match self.prefixes.get(name) {
			Some(expansion) => format!("{expansion}{local}"),
			None => token.to_owned(),
		}
	}

	/// Shortens a full IRI into a CURIE using the registered prefix with
	/// the longest matching expansion, or returns `None` when no
	/// expansion matches.
	pub fn shorten(&self, iri: &str) -> Option<String> {
		let mut best: Option<(&str, &str)> = None;
		for (name, expansion) in &self.prefixes {
			if iri.starts_with(expansion.as_str()) {
				match best {
					Some((_, e)) if expansion.len() <= e.len() => {}
					_ => best = Some((name.as_str(), expansion.as_str())),
				}
			}
		}

		best.map(|(name, expansion)| format!("{name}:{}", &iri[expansion.len()..]))
	}
}

impl Default for PrefixManager {
	fn default() -> Self {
		Self::new()
	}
}
