use std::fmt;

/// A line/column location in a transformation file, 1-based.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
	pub line: u32,
	pub column: u32,
}

impl Position {
	pub fn new(line: u32, column: u32) -> Self {
		Self { line, column }
	}
}

impl Default for Position {
	fn default() -> Self {
		Self { line: 1, column: 1 }
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "line {}, column {}", self.line, self.column)
	}
}

/// A single syntax error with its location.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("{position}: {message}")]
pub struct ParseError {
	pub position: Position,
	pub message: String,
}

impl ParseError {
	pub fn new(position: Position, message: impl Into<String>) -> Self {
		Self {
			position,
			message: message.into(),
		}
	}
}

/// All the syntax errors collected over one source file.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
		self.0.iter()
	}
}

impl fmt::Display for ParseErrors {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for (i, e) in self.0.iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			write!(f, "{e}")?;
		}
		Ok(())
	}
}

impl std::error::Error for ParseErrors {}
