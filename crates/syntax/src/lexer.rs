use crate::{ParseError, Position};

/// A lexical token of the SSSOM/T language.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
	/// An unquoted word: identifier, CURIE, number, cardinality or
	/// wildcard pattern, or `%…` placeholder.
	Word(String),

	/// A quoted string literal, unescaped.
	Str(String),

	/// An `<…>`-wrapped IRI, brackets stripped.
	Iri(String),

	LParen,
	RParen,
	LBrace,
	RBrace,
	LBracket,
	RBracket,
	Comma,
	Semicolon,
	Arrow,
	AndAnd,
	OrOr,
	Bang,
	EqEq,
	Eq,
	Slash,
}

impl TokenKind {
	pub fn describe(&self) -> String {
		match self {
			Self::Word(w) => format!("`{w}`"),
			Self::Str(_) => "string literal".to_owned(),
			Self::Iri(_) => "IRI".to_owned(),
			Self::LParen => "`(`".to_owned(),
			Self::RParen => "`)`".to_owned(),
			Self::LBrace => "`{`".to_owned(),
			Self::RBrace => "`}`".to_owned(),
			Self::LBracket => "`[`".to_owned(),
			Self::RBracket => "`]`".to_owned(),
			Self::Comma => "`,`".to_owned(),
			Self::Semicolon => "`;`".to_owned(),
			Self::Arrow => "`->`".to_owned(),
			Self::AndAnd => "`&&`".to_owned(),
			Self::OrOr => "`||`".to_owned(),
			Self::Bang => "`!`".to_owned(),
			Self::EqEq => "`==`".to_owned(),
			Self::Eq => "`=`".to_owned(),
			Self::Slash => "`/`".to_owned(),
		}
	}
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
	pub kind: TokenKind,
	pub position: Position,
}

fn is_word_start(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '_' | '*' | '%')
}

fn is_word_continue(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '*' | '.' | '/' | '#' | '-')
}

struct Cursor<'a> {
	rest: std::str::Chars<'a>,
	line: u32,
	column: u32,
}

impl<'a> Cursor<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			rest: source.chars(),
			line: 1,
			column: 1,
		}
	}

	fn position(&self) -> Position {
		Position::new(self.line, self.column)
	}

	fn peek(&self) -> Option<char> {
		self.rest.clone().next()
	}

	fn peek2(&self) -> Option<char> {
		let mut it = self.rest.clone();
		it.next();
		it.next()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.rest.next()?;
		if c == '\n' {
			self.line += 1;
			self.column = 1;
		} else {
			self.column += 1;
		}
		Some(c)
	}
}

/// Tokenizes a whole source file, collecting errors instead of
/// stopping at the first one.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<ParseError>) {
	let mut cursor = Cursor::new(source);
	let mut tokens = Vec::new();
	let mut errors = Vec::new();

	loop {
		// Skip whitespace and comments.
		loop {
			match cursor.peek() {
				Some(c) if c.is_whitespace() => {
					cursor.bump();
				}
				Some('#') => {
					while let Some(c) = cursor.peek() {
						if c == '\n' {
							break;
						}
						cursor.bump();
					}
				}
				_ => break,
			}
		}

		let position = cursor.position();
		let c = match cursor.peek() {
			Some(c) => c,
			None => break,
		};

		let kind = match c {
			'(' => {
				cursor.bump();
				Some(TokenKind::LParen)
			}
			')' => {
				cursor.bump();
				Some(TokenKind::RParen)
			}
			'{' => {
				cursor.bump();
				Some(TokenKind::LBrace)
			}
			'}' => {
				cursor.bump();
				Some(TokenKind::RBrace)
			}
			'[' => {
				cursor.bump();
				Some(TokenKind::LBracket)
			}
			']' => {
				cursor.bump();
				Some(TokenKind::RBracket)
			}
			',' => {
				cursor.bump();
				Some(TokenKind::Comma)
			}
			';' => {
				cursor.bump();
				Some(TokenKind::Semicolon)
			}
			'!' => {
				cursor.bump();
				Some(TokenKind::Bang)
			}
			'-' => {
				cursor.bump();
				if cursor.peek() == Some('>') {
					cursor.bump();
					Some(TokenKind::Arrow)
				} else {
					errors.push(ParseError::new(position, "unexpected character `-`"));
					None
				}
			}
			'&' => {
				cursor.bump();
				if cursor.peek() == Some('&') {
					cursor.bump();
					Some(TokenKind::AndAnd)
				} else {
					errors.push(ParseError::new(position, "expected `&&`"));
					None
				}
			}
			'|' => {
				cursor.bump();
				if cursor.peek() == Some('|') {
					cursor.bump();
					Some(TokenKind::OrOr)
				} else {
					errors.push(ParseError::new(position, "expected `||`"));
					None
				}
			}
			'=' => {
				cursor.bump();
				if cursor.peek() == Some('=') {
					cursor.bump();
					Some(TokenKind::EqEq)
				} else {
					Some(TokenKind::Eq)
				}
			}
			'/' => {
				cursor.bump();
				Some(TokenKind::Slash)
			}
			'<' => {
				cursor.bump();
				let mut iri = String::new();
				loop {
					match cursor.peek() {
						Some('>') => {
							cursor.bump();
							break;
						}
						Some('\n') | None => {
							errors.push(ParseError::new(position, "unterminated IRI"));
							break;
						}
						Some(c) => {
							iri.push(c);
							cursor.bump();
						}
					}
				}
				Some(TokenKind::Iri(iri))
			}
			quote @ ('\'' | '"') => {
				cursor.bump();
				let mut value = String::new();
				loop {
					match cursor.peek() {
						Some(c) if c == quote => {
							cursor.bump();
							break;
						}
						Some('\\') => {
							cursor.bump();
							match cursor.peek() {
								Some(e @ ('\\' | '\'' | '"')) => {
									value.push(e);
									cursor.bump();
								}
								_ => {
									errors.push(ParseError::new(
										cursor.position(),
										"invalid escape sequence",
									));
									cursor.bump();
								}
							}
						}
						Some('\n') | None => {
							errors.push(ParseError::new(position, "unterminated string literal"));
							break;
						}
						Some(c) => {
							value.push(c);
							cursor.bump();
						}
					}
				}
				Some(TokenKind::Str(value))
			}
			'%' => {
				let mut word = String::from('%');
				cursor.bump();
				match cursor.peek() {
					Some('{') => {
						word.push('{');
						cursor.bump();
						loop {
							match cursor.peek() {
								Some('}') => {
									word.push('}');
									cursor.bump();
									break;
								}
								Some('\n') | None => {
									errors.push(ParseError::new(position, "unterminated placeholder"));
									break;
								}
								Some(c) => {
									word.push(c);
									cursor.bump();
								}
							}
						}
						Some(TokenKind::Word(word))
					}
					Some(c) if c.is_ascii_alphabetic() || c == '_' => {
						while let Some(c) = cursor.peek() {
							if c.is_ascii_alphanumeric() || c == '_' {
								word.push(c);
								cursor.bump();
							} else {
								break;
							}
						}
						Some(TokenKind::Word(word))
					}
					_ => {
						errors.push(ParseError::new(position, "unexpected character `%`"));
						None
					}
				}
			}
			c if is_word_start(c) => {
				let mut word = String::new();
				while let Some(c) = cursor.peek() {
					if !is_word_continue(c) {
						break;
					}
					// Let `->` terminate a word so that `A:*->` lexes
					// as a word followed by an arrow.
					if c == '-' && cursor.peek2() == Some('>') {
						break;
					}
					word.push(c);
					cursor.bump();
				}
				Some(TokenKind::Word(word))
			}
			c => {
				cursor.bump();
				errors.push(ParseError::new(position, format!("unexpected character `{c}`")));
				None
			}
		};

		if let Some(kind) = kind {
			tokens.push(Token { kind, position });
		}
	}

	(tokens, errors)
}
