use crate::PrefixManager;
use indexmap::IndexMap;

/// A structured identifier embedding named slot/value pairs into a URI,
/// of the form `<schema>/(k1:'v1',k2:'v2')` where values are CURIEs.
///
/// Slot order is the order of appearance and is preserved through
/// serialization; slot values are stored expanded.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UriExpression {
	schema: String,
	components: IndexMap<String, String>,
}

fn is_slot_name(s: &str) -> bool {
	let mut bytes = s.bytes();
	match bytes.next() {
		Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
		_ => return false,
	}
	bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

impl UriExpression {
	pub fn new(schema: impl Into<String>) -> Self {
		Self {
			schema: schema.into(),
			components: IndexMap::new(),
		}
	}

	/// Adds a slot holding the given (expanded) IRI. A slot added twice
	/// keeps its original position and takes the new value.
	pub fn add_component(&mut self, name: impl Into<String>, iri: impl Into<String>) {
		self.components.insert(name.into(), iri.into());
	}

	/// Parses `text` as a URI expression. Returns `None` when `text` is
	/// not one: no `/(…)` tail, malformed pairs, duplicate keys, or a
	/// value that is not a CURIE with a registered prefix.
	pub fn parse(text: &str, prefixes: &PrefixManager) -> Option<Self> {
		let (schema, tail) = text.split_at(text.find("/(")?);
		if schema.is_empty() {
			return None;
		}

		let inner = tail.strip_prefix("/(")?.strip_suffix(')')?;
		if inner.contains(')') {
			return None;
		}

		let mut components = IndexMap::new();
		for pair in inner.split(',') {
			let (key, value) = pair.split_once(':')?;
			if !is_slot_name(key) || components.contains_key(key) {
				return None;
			}

			let curie = value.strip_prefix('\'')?.strip_suffix('\'')?;
			let (prefix, _) = curie.split_once(':')?;
			if !prefixes.is_known_prefix(prefix) {
				return None;
			}

			let iri = prefixes.expand(curie);
			if iri == curie {
				return None;
			}

			components.insert(key.to_owned(), iri);
		}

		Some(Self {
			schema: schema.to_owned(),
			components,
		})
	}

	/// Serializes back to the canonical text form, slot order preserved
	/// and values shortened through `prefixes`.
	pub fn serialize(&self, prefixes: &PrefixManager) -> String {
		let mut out = String::with_capacity(self.schema.len() + 16 * self.components.len());
		out.push_str(&self.schema);
		out.push_str("/(");
		for (i, (key, iri)) in self.components.iter().enumerate() {
			if i > 0 {
				out.push(',');
			}
			let value = prefixes.shorten(iri).unwrap_or_else(|| iri.clone());
			out.push_str(key);
			out.push_str(":'");
			out.push_str(&value);
			out.push('\'');
		}
		out.push(')');
		out
	}

	pub fn schema(&self) -> &str {
		&self.schema
	}

	/// The expanded IRI held by the named slot.
	pub fn component(&self, name: &str) -> Option<&str> {
		self.components.get(name).map(String::as_str)
	}

	pub fn component_names(&self) -> impl Iterator<Item = &str> {
		self.components.keys().map(String::as_str)
	}
}

/// Registry of serialization templates for URI expression schemas.
///
/// A template is registered for a `(schema, syntax)` pair, e.g. the
/// "Manchester" rendering of a given schema, and is a literal string
/// with `{slot}` placeholders.
#[derive(Clone, Debug, Default)]
pub struct UriExpressionRegistry {
	templates: IndexMap<(String, String), String>,
}

impl UriExpressionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_template(
		&mut self,
		schema: impl Into<String>,
		syntax: impl Into<String>,
		template: impl Into<String>,
	) {
		self.templates
			.insert((schema.into(), syntax.into()), template.into());
	}

	pub fn has_template(&self, schema: &str, syntax: &str) -> bool {
		self.templates
			.contains_key(&(schema.to_owned(), syntax.to_owned()))
	}

	/// The syntaxes registered for a schema, in registration order.
	pub fn syntaxes_for(&self, schema: &str) -> impl Iterator<Item = &str> {
		let schema = schema.to_owned();
		self.templates
			.keys()
			.filter(move |(s, _)| *s == schema)
			.map(|(_, syntax)| syntax.as_str())
	}

	/// Renders `expr` with the template registered for its schema under
	/// `syntax`, replacing every `{slot}` with the `<…>`-wrapped IRI of
	/// that slot. `None` when there is no template or a slot is absent.
	pub fn apply_template(&self, expr: &UriExpression, syntax: &str) -> Option<String> {
		let template = self
			.templates
			.get(&(expr.schema().to_owned(), syntax.to_owned()))?;

		let mut out = String::with_capacity(template.len());
		let mut rest = template.as_str();
		while let Some(start) = rest.find('{') {
			let (head, tail) = rest.split_at(start);
			out.push_str(head);
			let end = tail.find('}')?;
			let slot = &tail[1..end];
			out.push('<');
			out.push_str(expr.component(slot)?);
			out.push('>');
			rest = &tail[end + 1..];
		}
		out.push_str(rest);
		Some(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn prefixes() -> PrefixManager {
		let mut p = PrefixManager::new();
		p.add("COMENT", "https://example.com/entities/").unwrap();
		p.add("ORGENT", "https://example.org/entities/").unwrap();
		p
	}

	#[test]
	fn parse_two_slots() {
		let p = prefixes();
		let expr = UriExpression::parse(
			"https://example.org/schema/0001/(field1:'ORGENT:0001',field2:'COMENT:0011')",
			&p,
		)
		.unwrap();

		assert_eq!(expr.schema(), "https://example.org/schema/0001");
		assert_eq!(expr.component("field1"), Some("https://example.org/entities/0001"));
		assert_eq!(expr.component("field2"), Some("https://example.com/entities/0011"));
		assert_eq!(expr.component("field3"), None);
		assert_eq!(expr.component_names().collect::<Vec<_>>(), ["field1", "field2"]);
	}

	#[test]
	fn parse_rejects_malformed_input() {
		let p = prefixes();
		// No expression tail at all.
		assert_eq!(UriExpression::parse("https://example.org/entities/0001", &p), None);
		// Unquoted value.
		assert_eq!(
			UriExpression::parse("https://example.org/s/(field1:ORGENT:0001)", &p),
			None
		);
		// Unknown value prefix.
		assert_eq!(
			UriExpression::parse("https://example.org/s/(field1:'NOPE:0001')", &p),
			None
		);
		// Duplicate key.
		assert_eq!(
			UriExpression::parse(
				"https://example.org/s/(field1:'ORGENT:1',field1:'ORGENT:2')",
				&p
			),
			None
		);
		// Missing closing parenthesis.
		assert_eq!(
			UriExpression::parse("https://example.org/s/(field1:'ORGENT:1'", &p),
			None
		);
	}

	#[test]
	fn serialization_round_trips() {
		let p = prefixes();
		let source = "https://example.org/schema/0001/(field1:'ORGENT:0001',field2:'COMENT:0011')";
		let expr = UriExpression::parse(source, &p).unwrap();
		assert_eq!(expr.serialize(&p), source);
	}

	#[test]
	fn template_application() {
		let p = prefixes();
		let mut registry = UriExpressionRegistry::new();
		registry.register_template(
			"https://example.org/schema/0001",
			"Manchester",
			"{field1} and (part_of some {field2})",
		);

		let expr = UriExpression::parse(
			"https://example.org/schema/0001/(field1:'ORGENT:0001',field2:'COMENT:0011')",
			&p,
		)
		.unwrap();

		assert_eq!(
			registry.apply_template(&expr, "Manchester").as_deref(),
			Some(
				"<https://example.org/entities/0001> and (part_of some <https://example.com/entities/0011>)"
			)
		);

		// Unregistered syntax.
		assert_eq!(registry.apply_template(&expr, "Functional"), None);

		// Template referencing an absent slot.
		registry.register_template("https://example.org/schema/0001", "Bad", "{field3}");
		assert_eq!(registry.apply_template(&expr, "Bad"), None);
	}
}
