use crate::MappingAction;
use regex::Regex;
use sssom_t_core::{FieldError, Mapping, MappingField};

/// A compiled action. `Stop`, `Invert` and the editors are interpreted
/// by the engine itself; `Call` actions come from the function
/// registries and may emit products.
pub enum Action<T> {
	Stop,
	Invert,
	Assign(AssignEditor),
	Replace(ReplaceEditor),
	Call(Box<dyn MappingAction<T>>),
}

/// Error raised while building or applying an editing action.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EditError {
	#[error("unknown mapping field `{0}`")]
	UnknownField(String),

	#[error(transparent)]
	Field(#[from] FieldError),

	#[error("invalid replacement pattern `{pattern}`: {source}")]
	InvalidPattern {
		pattern: String,
		source: regex::Error,
	},
}

/// `assign(field, value, …)`: writes literal values into mapping
/// slots, an empty value clearing the slot.
///
/// All pairs are validated against a scratch mapping up front, so that
/// an editor that constructed successfully cannot fail halfway through
/// an edit.
pub struct AssignEditor {
	pairs: Vec<(MappingField, Option<String>)>,
}

impl AssignEditor {
	pub fn new<I, S>(pairs: I) -> Result<Self, EditError>
	where
		I: IntoIterator<Item = (S, Option<String>)>,
		S: AsRef<str>,
	{
		let mut scratch = Mapping::default();
		let mut validated = Vec::new();

		for (name, value) in pairs {
			let field = MappingField::from_name(name.as_ref())
				.ok_or_else(|| EditError::UnknownField(name.as_ref().to_owned()))?;
			let value = value.filter(|v| !v.is_empty());
			field.set(&mut scratch, value.as_deref())?;
			validated.push((field, value));
		}

		Ok(Self { pairs: validated })
	}

	pub fn apply(&self, mapping: &Mapping) -> Result<Mapping, EditError> {
		let mut edited = mapping.clone();
		for (field, value) in &self.pairs {
			field.set(&mut edited, value.as_deref())?;
		}
		Ok(edited)
	}
}

/// `replace(field, pattern, replacement)`: regular-expression
/// substitution over a mapping slot, with `$n` capture references.
/// List slots are edited element-wise.
pub struct ReplaceEditor {
	field: MappingField,
	pattern: Regex,
	replacement: String,
}

impl ReplaceEditor {
	pub fn new(field: &str, pattern: &str, replacement: &str) -> Result<Self, EditError> {
		let field =
			MappingField::from_name(field).ok_or_else(|| EditError::UnknownField(field.to_owned()))?;
		let pattern = Regex::new(pattern).map_err(|source| EditError::InvalidPattern {
			pattern: pattern.to_owned(),
			source,
		})?;

		Ok(Self {
			field,
			pattern,
			replacement: replacement.to_owned(),
		})
	}

	pub fn apply(&self, mapping: &Mapping) -> Result<Mapping, EditError> {
		use sssom_t_core::FieldValue;

		let replaced = match self.field.get(mapping) {
			FieldValue::None => return Ok(mapping.clone()),
			FieldValue::Text(value) => self
				.pattern
				.replace_all(value, self.replacement.as_str())
				.into_owned(),
			FieldValue::Double(value) => self
				.pattern
				.replace_all(&value.to_string(), self.replacement.as_str())
				.into_owned(),
			FieldValue::List(values) => values
				.iter()
				.map(|v| self.pattern.replace_all(v, self.replacement.as_str()))
				.collect::<Vec<_>>()
				.join("|"),
		};

		let mut edited = mapping.clone();
		self.field.set(&mut edited, Some(&replaced))?;
		Ok(edited)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn assign_overwrites_a_field() {
		let editor = AssignEditor::new([(
			"object_id",
			Some("https://example.org/anotherObject".to_owned()),
		)])
		.unwrap();

		let m = Mapping::new("s", "p", "https://example.org/object");
		let edited = editor.apply(&m).unwrap();
		assert_eq!(edited.object_id, "https://example.org/anotherObject");
		// The input mapping is untouched.
		assert_eq!(m.object_id, "https://example.org/object");
	}

	#[test]
	fn assign_clears_with_empty_or_missing_value() {
		let m = {
			let mut m = Mapping::new("s", "p", "o");
			m.mapping_justification = Some("https://w3id.org/semapv/vocab/LexicalMatching".to_owned());
			m
		};

		let editor = AssignEditor::new([("mapping_justification", Some(String::new()))]).unwrap();
		assert_eq!(editor.apply(&m).unwrap().mapping_justification, None);

		let editor = AssignEditor::new([("mapping_justification", None)]).unwrap();
		assert_eq!(editor.apply(&m).unwrap().mapping_justification, None);
	}

	#[test]
	fn assign_rejects_clearing_required_fields() {
		assert!(matches!(
			AssignEditor::new([("object_id", None)]),
			Err(EditError::Field(FieldError::RequiredField("object_id")))
		));
	}

	#[test]
	fn assign_rejects_unknown_fields() {
		assert!(matches!(
			AssignEditor::new([("object", Some("x".to_owned()))]),
			Err(EditError::UnknownField(_))
		));
	}

	#[test]
	fn replace_with_capture_groups() {
		let editor =
			ReplaceEditor::new("object_id", "example.org/([a-z]+)$", "example.net/$1").unwrap();
		let m = Mapping::new("s", "p", "https://example.org/object");
		assert_eq!(editor.apply(&m).unwrap().object_id, "https://example.net/object");
	}

	#[test]
	fn replace_leaves_unmatched_values_alone() {
		let editor = ReplaceEditor::new("comment", "foo", "bar").unwrap();
		let mut m = Mapping::new("s", "p", "o");
		m.comment = Some("nothing to see".to_owned());
		assert_eq!(editor.apply(&m).unwrap().comment.as_deref(), Some("nothing to see"));
	}

	#[test]
	fn replace_edits_list_elements() {
		let editor = ReplaceEditor::new("subject_match_field", "^oio:", "oboInOwl:").unwrap();
		let mut m = Mapping::new("s", "p", "o");
		m.subject_match_field = vec!["oio:hasDbXref".to_owned(), "rdfs:label".to_owned()];
		assert_eq!(
			editor.apply(&m).unwrap().subject_match_field,
			["oboInOwl:hasDbXref", "rdfs:label"]
		);
	}

	#[test]
	fn replace_rejects_bad_patterns() {
		assert!(matches!(
			ReplaceEditor::new("comment", "(unclosed", "x"),
			Err(EditError::InvalidPattern { .. })
		));
	}
}
