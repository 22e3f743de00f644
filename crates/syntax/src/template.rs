/// A parsed format template: literal text interleaved with `%{…}`
/// placeholders.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Template {
	pub source: String,
	pub segments: Vec<TemplateSegment>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TemplateSegment {
	Literal(String),
	Placeholder(Placeholder),
}

/// A `%{field|mod1|mod2(args)}` placeholder.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Placeholder {
	pub field: String,
	pub modifiers: Vec<ModifierCall>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModifierCall {
	pub name: String,
	pub args: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum TemplateError {
	#[error("unbalanced braces in template `{0}`")]
	UnbalancedBraces(String),

	#[error("empty placeholder in template `{0}`")]
	EmptyPlaceholder(String),

	#[error("malformed modifier `{modifier}` in template `{template}`")]
	MalformedModifier { template: String, modifier: String },
}

fn is_identifier(s: &str) -> bool {
	let mut bytes = s.bytes();
	match bytes.next() {
		Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
		_ => return false,
	}
	bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Parses a template string.
///
/// `%{field}` and the shorthand `%field` introduce a placeholder; `%%`
/// is a literal percent sign; a `%` followed by anything else stands
/// for itself.
pub fn parse_template(source: &str) -> Result<Template, TemplateError> {
	let mut segments = Vec::new();
	let mut literal = String::new();
	let mut chars = source.char_indices().peekable();

	let flush = |literal: &mut String, segments: &mut Vec<TemplateSegment>| {
		if !literal.is_empty() {
			segments.push(TemplateSegment::Literal(std::mem::take(literal)));
		}
	};

	while let Some((_, c)) = chars.next() {
		if c != '%' {
			literal.push(c);
			continue;
		}

		match chars.peek().copied() {
			Some((_, '%')) => {
				chars.next();
				literal.push('%');
			}
			Some((start, '{')) => {
				chars.next();
				let mut inner = None;
				for (i, c) in chars.by_ref() {
					if c == '}' {
						inner = Some(&source[start + 1..i]);
						break;
					}
				}
				let inner =
					inner.ok_or_else(|| TemplateError::UnbalancedBraces(source.to_owned()))?;

				flush(&mut literal, &mut segments);
				segments.push(TemplateSegment::Placeholder(parse_placeholder(
					source, inner,
				)?));
			}
			Some((start, c)) if c.is_ascii_alphabetic() || c == '_' => {
				let mut end = start + c.len_utf8();
				chars.next();
				while let Some((i, c)) = chars.peek().copied() {
					if c.is_ascii_alphanumeric() || c == '_' {
						end = i + c.len_utf8();
						chars.next();
					} else {
						break;
					}
				}

				flush(&mut literal, &mut segments);
				segments.push(TemplateSegment::Placeholder(Placeholder {
					field: source[start..end].to_owned(),
					modifiers: Vec::new(),
				}));
			}
			_ => literal.push('%'),
		}
	}

	flush(&mut literal, &mut segments);

	Ok(Template {
		source: source.to_owned(),
		segments,
	})
}

fn parse_placeholder(source: &str, inner: &str) -> Result<Placeholder, TemplateError> {
	let mut parts = inner.split('|');

	let field = parts
		.next()
		.map(str::trim)
		.filter(|f| !f.is_empty())
		.ok_or_else(|| TemplateError::EmptyPlaceholder(source.to_owned()))?;

	let mut modifiers = Vec::new();
	for part in parts {
		let part = part.trim();
		let malformed = || TemplateError::MalformedModifier {
			template: source.to_owned(),
			modifier: part.to_owned(),
		};

		let (name, args) = match part.split_once('(') {
			None => (part, Vec::new()),
			Some((name, rest)) => {
				let rest = rest.strip_suffix(')').ok_or_else(malformed)?;
				let args = if rest.is_empty() {
					Vec::new()
				} else {
					rest.split(',').map(|a| unquote(a.trim()).to_owned()).collect()
				};
				(name, args)
			}
		};

		if !is_identifier(name) {
			return Err(malformed());
		}

		modifiers.push(ModifierCall {
			name: name.to_owned(),
			args,
		});
	}

	Ok(Placeholder {
		field: field.to_owned(),
		modifiers,
	})
}

fn unquote(s: &str) -> &str {
	if s.len() >= 2 {
		let bytes = s.as_bytes();
		if (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'')
			|| (bytes[0] == b'"' && bytes[s.len() - 1] == b'"')
		{
			return &s[1..s.len() - 1];
		}
	}
	s
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn literal_only() {
		let t = parse_template("hello world").unwrap();
		assert_eq!(t.segments, [TemplateSegment::Literal("hello world".to_owned())]);
	}

	#[test]
	fn placeholder_with_modifiers() {
		let t = parse_template("%{subject_id|uriexpr_slot_value(field1)|short}").unwrap();
		match &t.segments[..] {
			[TemplateSegment::Placeholder(p)] => {
				assert_eq!(p.field, "subject_id");
				assert_eq!(p.modifiers.len(), 2);
				assert_eq!(p.modifiers[0].name, "uriexpr_slot_value");
				assert_eq!(p.modifiers[0].args, ["field1"]);
				assert_eq!(p.modifiers[1].name, "short");
				assert!(p.modifiers[1].args.is_empty());
			}
			other => panic!("unexpected segments: {other:?}"),
		}
	}

	#[test]
	fn shorthand_placeholder() {
		let t = parse_template("subject is %subject_label.").unwrap();
		assert_eq!(
			t.segments,
			[
				TemplateSegment::Literal("subject is ".to_owned()),
				TemplateSegment::Placeholder(Placeholder {
					field: "subject_label".to_owned(),
					modifiers: Vec::new(),
				}),
				TemplateSegment::Literal(".".to_owned()),
			]
		);
	}

	#[test]
	fn escaped_and_stray_percent() {
		let t = parse_template("100%% done, 50% off").unwrap();
		assert_eq!(
			t.segments,
			[TemplateSegment::Literal("100% done, 50% off".to_owned())]
		);
	}

	#[test]
	fn quoted_modifier_arguments() {
		let t = parse_template("%{comment|wrap('[', ']')}").unwrap();
		match &t.segments[..] {
			[TemplateSegment::Placeholder(p)] => {
				assert_eq!(p.modifiers[0].args, ["[", "]"]);
			}
			other => panic!("unexpected segments: {other:?}"),
		}
	}

	#[test]
	fn unbalanced_braces() {
		assert!(matches!(
			parse_template("%{subject_id"),
			Err(TemplateError::UnbalancedBraces(_))
		));
	}

	#[test]
	fn malformed_modifier() {
		assert!(matches!(
			parse_template("%{subject_id|short("),
			Err(TemplateError::UnbalancedBraces(_))
		));
		assert!(matches!(
			parse_template("%{subject_id|mod(x}"),
			Err(TemplateError::MalformedModifier { .. })
		));
	}
}
