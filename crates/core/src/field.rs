use crate::Mapping;

/// The fixed table of mapping accessors. Every slot of [`Mapping`] is
/// addressable by its SSSOM name, for use by template placeholders and
/// by the editing actions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MappingField {
	SubjectId,
	SubjectLabel,
	SubjectCategory,
	PredicateId,
	PredicateLabel,
	PredicateModifier,
	ObjectId,
	ObjectLabel,
	ObjectCategory,
	MappingJustification,
	AuthorId,
	ReviewerId,
	CreatorId,
	License,
	SubjectType,
	ObjectType,
	SubjectSource,
	SubjectSourceVersion,
	ObjectSource,
	ObjectSourceVersion,
	MappingProvider,
	MappingCardinality,
	MappingTool,
	MappingDate,
	SubjectMatchField,
	ObjectMatchField,
	SubjectPreprocessing,
	ObjectPreprocessing,
	SimilarityScore,
	SimilarityMeasure,
	Confidence,
	Comment,
	SeeAlso,
}

/// The value held by a mapping slot.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FieldValue<'a> {
	None,
	Text(&'a str),
	List(&'a [String]),
	Double(f64),
}

impl<'a> FieldValue<'a> {
	pub fn is_empty(&self) -> bool {
		match self {
			Self::None => true,
			Self::Text(s) => s.is_empty(),
			Self::List(l) => l.is_empty(),
			Self::Double(_) => false,
		}
	}

	/// Renders the value as text. List values are joined with `|`.
	pub fn render(&self) -> String {
		match self {
			Self::None => String::new(),
			Self::Text(s) => (*s).to_owned(),
			Self::List(l) => l.join("|"),
			Self::Double(d) => d.to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
	/// Clearing a field that every mapping must carry.
	#[error("field `{0}` cannot be cleared")]
	RequiredField(&'static str),

	#[error("invalid value `{value}` for field `{field}`")]
	InvalidValue { field: &'static str, value: String },
}

impl MappingField {
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"subject_id" => Some(Self::SubjectId),
			"subject_label" => Some(Self::SubjectLabel),
			"subject_category" => Some(Self::SubjectCategory),
			"predicate_id" => Some(Self::PredicateId),
			"predicate_label" => Some(Self::PredicateLabel),
			"predicate_modifier" => Some(Self::PredicateModifier),
			"object_id" => Some(Self::ObjectId),
			"object_label" => Some(Self::ObjectLabel),
			"object_category" => Some(Self::ObjectCategory),
			"mapping_justification" => Some(Self::MappingJustification),
			"author_id" => Some(Self::AuthorId),
			"reviewer_id" => Some(Self::ReviewerId),
			"creator_id" => Some(Self::CreatorId),
			"license" => Some(Self::License),
			"subject_type" => Some(Self::SubjectType),
			"object_type" => Some(Self::ObjectType),
			"subject_source" => Some(Self::SubjectSource),
			"subject_source_version" => Some(Self::SubjectSourceVersion),
			"object_source" => Some(Self::ObjectSource),
			"object_source_version" => Some(Self::ObjectSourceVersion),
			"mapping_provider" => Some(Self::MappingProvider),
			"mapping_cardinality" => Some(Self::MappingCardinality),
			"mapping_tool" => Some(Self::MappingTool),
			"mapping_date" => Some(Self::MappingDate),
			"subject_match_field" => Some(Self::SubjectMatchField),
			"object_match_field" => Some(Self::ObjectMatchField),
			"subject_preprocessing" => Some(Self::SubjectPreprocessing),
			"object_preprocessing" => Some(Self::ObjectPreprocessing),
			"similarity_score" => Some(Self::SimilarityScore),
			"similarity_measure" => Some(Self::SimilarityMeasure),
			"confidence" => Some(Self::Confidence),
			"comment" => Some(Self::Comment),
			"see_also" => Some(Self::SeeAlso),
			_ => None,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Self::SubjectId => "subject_id",
			Self::SubjectLabel => "subject_label",
			Self::SubjectCategory => "subject_category",
			Self::PredicateId => "predicate_id",
			Self::PredicateLabel => "predicate_label",
			Self::PredicateModifier => "predicate_modifier",
			Self::ObjectId => "object_id",
			Self::ObjectLabel => "object_label",
			Self::ObjectCategory => "object_category",
			Self::MappingJustification => "mapping_justification",
			Self::AuthorId => "author_id",
			Self::ReviewerId => "reviewer_id",
			Self::CreatorId => "creator_id",
			Self::License => "license",
			Self::SubjectType => "subject_type",
			Self::ObjectType => "object_type",
			Self::SubjectSource => "subject_source",
			Self::SubjectSourceVersion => "subject_source_version",
			Self::ObjectSource => "object_source",
			Self::ObjectSourceVersion => "object_source_version",
			Self::MappingProvider => "mapping_provider",
			Self::MappingCardinality => "mapping_cardinality",
			Self::MappingTool => "mapping_tool",
			Self::MappingDate => "mapping_date",
			Self::SubjectMatchField => "subject_match_field",
			Self::ObjectMatchField => "object_match_field",
			Self::SubjectPreprocessing => "subject_preprocessing",
			Self::ObjectPreprocessing => "object_preprocessing",
			Self::SimilarityScore => "similarity_score",
			Self::SimilarityMeasure => "similarity_measure",
			Self::Confidence => "confidence",
			Self::Comment => "comment",
			Self::SeeAlso => "see_also",
		}
	}

	pub fn is_list(&self) -> bool {
		matches!(
			self,
			Self::AuthorId
				| Self::ReviewerId
				| Self::CreatorId
				| Self::SubjectMatchField
				| Self::ObjectMatchField
				| Self::SubjectPreprocessing
				| Self::ObjectPreprocessing
				| Self::SeeAlso
		)
	}

	/// Required identifier fields can never be cleared.
	pub fn is_required(&self) -> bool {
		matches!(self, Self::SubjectId | Self::PredicateId | Self::ObjectId)
	}

	pub fn get<'a>(&self, m: &'a Mapping) -> FieldValue<'a> {
		fn opt(value: &Option<String>) -> FieldValue {
			match value {
				Some(s) => FieldValue::Text(s),
				None => FieldValue::None,
			}
		}

		match self {
			Self::SubjectId => FieldValue::Text(&m.subject_id),
			Self::SubjectLabel => opt(&m.subject_label),
			Self::SubjectCategory => opt(&m.subject_category),
			Self::PredicateId => FieldValue::Text(&m.predicate_id),
			Self::PredicateLabel => opt(&m.predicate_label),
			Self::PredicateModifier => match m.predicate_modifier {
				Some(pm) => FieldValue::Text(pm.as_str()),
				None => FieldValue::None,
			},
			Self::ObjectId => FieldValue::Text(&m.object_id),
			Self::ObjectLabel => opt(&m.object_label),
			Self::ObjectCategory => opt(&m.object_category),
			Self::MappingJustification => opt(&m.mapping_justification),
			Self::AuthorId => FieldValue::List(&m.author_id),
			Self::ReviewerId => FieldValue::List(&m.reviewer_id),
			Self::CreatorId => FieldValue::List(&m.creator_id),
			Self::License => opt(&m.license),
			Self::SubjectType => opt(&m.subject_type),
			Self::ObjectType => opt(&m.object_type),
			Self::SubjectSource => opt(&m.subject_source),
			Self::SubjectSourceVersion => opt(&m.subject_source_version),
			Self::ObjectSource => opt(&m.object_source),
			Self::ObjectSourceVersion => opt(&m.object_source_version),
			Self::MappingProvider => opt(&m.mapping_provider),
			Self::MappingCardinality => match m.mapping_cardinality {
				Some(c) => FieldValue::Text(c.as_str()),
				None => FieldValue::None,
			},
			Self::MappingTool => opt(&m.mapping_tool),
			Self::MappingDate => opt(&m.mapping_date),
			Self::SubjectMatchField => FieldValue::List(&m.subject_match_field),
			Self::ObjectMatchField => FieldValue::List(&m.object_match_field),
			Self::SubjectPreprocessing => FieldValue::List(&m.subject_preprocessing),
			Self::ObjectPreprocessing => FieldValue::List(&m.object_preprocessing),
			Self::SimilarityScore => match m.similarity_score {
				Some(d) => FieldValue::Double(d),
				None => FieldValue::None,
			},
			Self::SimilarityMeasure => opt(&m.similarity_measure),
			Self::Confidence => match m.confidence {
				Some(d) => FieldValue::Double(d),
				None => FieldValue::None,
			},
			Self::Comment => opt(&m.comment),
			Self::SeeAlso => FieldValue::List(&m.see_also),
		}
	}

	/// Writes `value` into the slot, `None` or an empty string clearing
	/// it. Clearing a required field or writing a value the slot cannot
	/// hold is a [`FieldError`].
	pub fn set(&self, m: &mut Mapping, value: Option<&str>) -> Result<(), FieldError> {
		let value = value.filter(|v| !v.is_empty());

		if self.is_required() && value.is_none() {
			return Err(FieldError::RequiredField(self.name()));
		}

		fn text(value: Option<&str>) -> Option<String> {
			value.map(ToOwned::to_owned)
		}

		fn list(value: Option<&str>) -> Vec<String> {
			match value {
				Some(v) => v.split('|').map(ToOwned::to_owned).collect(),
				None => Vec::new(),
			}
		}

		let invalid = |value: &str| FieldError::InvalidValue {
			field: self.name(),
			value: value.to_owned(),
		};

		fn double(value: Option<&str>, invalid: impl Fn(&str) -> FieldError) -> Result<Option<f64>, FieldError> {
			value.map(|v| v.parse().map_err(|_| invalid(v))).transpose()
		}

		match self {
			Self::SubjectId => m.subject_id = value.unwrap_or_default().to_owned(),
			Self::SubjectLabel => m.subject_label = text(value),
			Self::SubjectCategory => m.subject_category = text(value),
			Self::PredicateId => m.predicate_id = value.unwrap_or_default().to_owned(),
			Self::PredicateLabel => m.predicate_label = text(value),
			Self::PredicateModifier => {
				m.predicate_modifier = value.map(|v| v.parse().map_err(|_| invalid(v))).transpose()?
			}
			Self::ObjectId => m.object_id = value.unwrap_or_default().to_owned(),
			Self::ObjectLabel => m.object_label = text(value),
			Self::ObjectCategory => m.object_category = text(value),
			Self::MappingJustification => m.mapping_justification = text(value),
			Self::AuthorId => m.author_id = list(value),
			Self::ReviewerId => m.reviewer_id = list(value),
			Self::CreatorId => m.creator_id = list(value),
			Self::License => m.license = text(value),
			Self::SubjectType => m.subject_type = text(value),
			Self::ObjectType => m.object_type = text(value),
			Self::SubjectSource => m.subject_source = text(value),
			Self::SubjectSourceVersion => m.subject_source_version = text(value),
			Self::ObjectSource => m.object_source = text(value),
			Self::ObjectSourceVersion => m.object_source_version = text(value),
			Self::MappingProvider => m.mapping_provider = text(value),
			Self::MappingCardinality => {
				m.mapping_cardinality = value.map(|v| v.parse().map_err(|_| invalid(v))).transpose()?
			}
			Self::MappingTool => m.mapping_tool = text(value),
			Self::MappingDate => m.mapping_date = text(value),
			Self::SubjectMatchField => m.subject_match_field = list(value),
			Self::ObjectMatchField => m.object_match_field = list(value),
			Self::SubjectPreprocessing => m.subject_preprocessing = list(value),
			Self::ObjectPreprocessing => m.object_preprocessing = list(value),
			Self::SimilarityScore => m.similarity_score = double(value, invalid)?,
			Self::SimilarityMeasure => m.similarity_measure = text(value),
			Self::Confidence => m.confidence = double(value, invalid)?,
			Self::Comment => m.comment = text(value),
			Self::SeeAlso => m.see_also = list(value),
		}

		Ok(())
	}
}
