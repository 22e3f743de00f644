use crate::lexer::{tokenize, Token, TokenKind};
use crate::{
	Action, FilterExpr, FunctionCall, ParseError, ParseErrors, Position, PrefixDecl, Rule,
	RuleBody, RuleSet,
};
use smallvec::SmallVec;

/// Parses a whole SSSOM/T source file.
///
/// Errors do not stop the parse: the parser re-synchronizes on rule
/// boundaries and keeps going, so that one pass reports every problem
/// in the file. A source with any error yields `Err` with the full,
/// position-sorted list.
pub fn parse(source: &str) -> Result<RuleSet, ParseErrors> {
	let (tokens, lex_errors) = tokenize(source);
	let mut parser = Parser {
		tokens,
		index: 0,
		errors: lex_errors,
	};

	let ruleset = parser.parse_ruleset();

	if parser.errors.is_empty() {
		Ok(ruleset)
	} else {
		parser.errors.sort_by_key(|e| (e.position.line, e.position.column));
		Err(ParseErrors(parser.errors))
	}
}

/// Marker for an error that has already been recorded; the caller is
/// expected to re-synchronize.
struct Recovery;

type PResult<T> = Result<T, Recovery>;

struct Parser {
	tokens: Vec<Token>,
	index: usize,
	errors: Vec<ParseError>,
}

impl Parser {
	fn peek(&self) -> Option<&TokenKind> {
		self.tokens.get(self.index).map(|t| &t.kind)
	}

	fn nth(&self, n: usize) -> Option<&TokenKind> {
		self.tokens.get(self.index + n).map(|t| &t.kind)
	}

	fn position(&self) -> Position {
		self.tokens
			.get(self.index)
			.or_else(|| self.tokens.last())
			.map(|t| t.position)
			.unwrap_or_default()
	}

	fn bump(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.index).cloned();
		if token.is_some() {
			self.index += 1;
		}
		token
	}

	fn eat(&mut self, kind: TokenKind) -> bool {
		if self.peek() == Some(&kind) {
			self.index += 1;
			true
		} else {
			false
		}
	}

	fn error(&mut self, position: Position, message: impl Into<String>) -> Recovery {
		self.errors.push(ParseError::new(position, message));
		Recovery
	}

	fn error_here(&mut self, message: impl Into<String>) -> Recovery {
		let position = self.position();
		self.error(position, message)
	}

	fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<()> {
		if self.eat(kind) {
			Ok(())
		} else {
			let found = match self.peek() {
				Some(k) => format!("found {}", k.describe()),
				None => "found end of file".to_owned(),
			};
			Err(self.error_here(format!("expected {what}, {found}")))
		}
	}

	fn expect_word(&mut self, what: &str) -> PResult<(String, Position)> {
		match self.peek() {
			Some(TokenKind::Word(_)) => {
				let token = self.bump().unwrap();
				match token.kind {
					TokenKind::Word(w) => Ok((w, token.position)),
					_ => unreachable!(),
				}
			}
			_ => Err(self.error_here(format!("expected {what}"))),
		}
	}

	/// Skips tokens until after a `;`, or up to (not including) a `}`,
	/// balancing any braces skipped over.
	fn synchronize(&mut self) {
		let mut depth = 0usize;
		loop {
			match self.peek() {
				None => return,
				Some(TokenKind::RBrace) if depth == 0 => return,
				_ => {}
			}

			match self.bump().map(|t| t.kind) {
				Some(TokenKind::Semicolon) if depth == 0 => return,
				Some(TokenKind::LBrace) => depth += 1,
				Some(TokenKind::RBrace) => depth -= 1,
				_ => {}
			}
		}
	}

	fn parse_ruleset(&mut self) -> RuleSet {
		let mut ruleset = RuleSet::default();

		while self.peek().is_some() {
			if self.eat(TokenKind::Semicolon) {
				continue;
			}

			if self.at_prefix_decl() {
				if let Some(decl) = self.parse_prefix_decl() {
					ruleset.prefixes.push(decl);
				}
			} else {
				match self.parse_rule() {
					Ok(rule) => ruleset.rules.push(rule),
					Err(Recovery) => self.synchronize(),
				}
			}
		}

		ruleset
	}

	fn at_prefix_decl(&self) -> bool {
		matches!(self.peek(), Some(TokenKind::Word(w)) if w == "prefix")
			&& matches!(self.nth(1), Some(TokenKind::Word(_)))
			&& matches!(self.nth(2), Some(TokenKind::Iri(_)))
	}

	/// Parses `prefix NAME: <IRI>`. The token shape is guaranteed by
	/// [`Self::at_prefix_decl`], so this only performs validation and
	/// never needs re-synchronization.
	fn parse_prefix_decl(&mut self) -> Option<PrefixDecl> {
		let position = self.position();
		self.bump();

		let (raw_name, name_position) = match self.bump() {
			Some(Token {
				kind: TokenKind::Word(w),
				position,
			}) => (w, position),
			_ => unreachable!(),
		};

		let iri = match self.bump() {
			Some(Token {
				kind: TokenKind::Iri(iri),
				..
			}) => iri,
			_ => unreachable!(),
		};

		let name = raw_name.strip_suffix(':').unwrap_or(&raw_name);
		let mut valid = true;

		if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
			self.error(name_position, format!("invalid prefix name `{raw_name}`"));
			valid = false;
		}

		if iref::Iri::new(iri.as_str()).is_err() {
			self.error(position, format!("invalid IRI `<{iri}>`"));
			valid = false;
		}

		valid.then(|| PrefixDecl {
			name: name.to_owned(),
			iri,
			position,
		})
	}

	fn parse_rule(&mut self) -> PResult<Rule> {
		let position = self.position();

		let tags = if self.peek() == Some(&TokenKind::LBracket) {
			self.parse_tags()?
		} else {
			SmallVec::new()
		};

		let filter = self.parse_or()?;

		let body = match self.peek() {
			Some(TokenKind::Arrow) => {
				self.bump();
				RuleBody::Actions(self.parse_action_set()?)
			}
			Some(TokenKind::LBrace) => {
				self.bump();
				RuleBody::Rules(self.parse_rule_block()?)
			}
			_ => return Err(self.error_here("expected `->` or `{` after filter")),
		};

		Ok(Rule {
			tags,
			filter,
			body,
			position,
		})
	}

	fn parse_tags(&mut self) -> PResult<SmallVec<[String; 2]>> {
		self.bump();
		let mut tags = SmallVec::new();
		loop {
			let (tag, _) = self.expect_word("tag")?;
			tags.push(tag);
			match self.peek() {
				Some(TokenKind::Comma) => {
					self.bump();
				}
				Some(TokenKind::RBracket) => {
					self.bump();
					return Ok(tags);
				}
				_ => return Err(self.error_here("expected `,` or `]` in tag list")),
			}
		}
	}

	fn parse_rule_block(&mut self) -> PResult<Vec<Rule>> {
		let mut rules = Vec::new();
		loop {
			match self.peek() {
				Some(TokenKind::RBrace) => {
					self.bump();
					break;
				}
				None => return Err(self.error_here("expected `}`")),
				_ => match self.parse_rule() {
					Ok(rule) => rules.push(rule),
					Err(Recovery) => self.synchronize(),
				},
			}
		}

		if rules.is_empty() {
			return Err(self.error_here("expected at least one rule in block"));
		}

		Ok(rules)
	}

	fn parse_or(&mut self) -> PResult<FilterExpr> {
		let mut left = self.parse_and()?;
		while self.eat(TokenKind::OrOr) {
			let right = self.parse_and()?;
			left = FilterExpr::Or(Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn parse_and(&mut self) -> PResult<FilterExpr> {
		let mut left = self.parse_unary()?;
		while self.eat(TokenKind::AndAnd) {
			let right = self.parse_unary()?;
			left = FilterExpr::And(Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn parse_unary(&mut self) -> PResult<FilterExpr> {
		match self.peek() {
			Some(TokenKind::Bang) => {
				self.bump();
				Ok(FilterExpr::Not(Box::new(self.parse_unary()?)))
			}
			Some(TokenKind::LParen) => {
				self.bump();
				let inner = self.parse_or()?;
				self.expect(TokenKind::RParen, "`)`")?;
				Ok(FilterExpr::Group(Box::new(inner)))
			}
			Some(TokenKind::Word(_)) => {
				let (word, position) = self.expect_word("filter")?;
				match self.peek() {
					Some(TokenKind::EqEq) => {
						self.bump();
						let (value, value_position) = match self.peek() {
							Some(TokenKind::Word(_)) => self.expect_word("value")?,
							_ => return Err(self.error_here("expected value after `==`")),
						};

						if word == "predicate_modifier" {
							if value == "Not" {
								Ok(FilterExpr::PredicateModifierIsNot)
							} else {
								Err(self.error(
									value_position,
									"`predicate_modifier` can only be matched against `Not`",
								))
							}
						} else {
							Ok(FilterExpr::IdMatch {
								field: word,
								value,
								position,
							})
						}
					}
					Some(TokenKind::LParen) => {
						self.bump();
						Ok(FilterExpr::Call(self.parse_call_args(word, position)?))
					}
					_ => Err(self.error_here(format!("expected `==` or `(` after `{word}`"))),
				}
			}
			_ => Err(self.error_here("expected filter expression")),
		}
	}

	/// Parses the argument list of a call whose name and opening `(`
	/// have already been consumed.
	fn parse_call_args(&mut self, name: String, position: Position) -> PResult<FunctionCall> {
		let mut call = FunctionCall::new(name, position);

		if self.eat(TokenKind::RParen) {
			return Ok(call);
		}

		loop {
			if self.eat(TokenKind::Slash) {
				let (arg_name, arg_position) = self.expect_word("argument name")?;
				self.expect(TokenKind::Eq, "`=`")?;
				let value = self.parse_arg()?;
				if call.named.insert(arg_name.clone(), value).is_some() {
					self.error(arg_position, format!("duplicate named argument `{arg_name}`"));
				}
			} else {
				if !call.named.is_empty() {
					let position = self.position();
					self.error(position, "positional argument after named arguments");
				}
				let value = self.parse_arg()?;
				call.args.push(value);
			}

			match self.peek() {
				Some(TokenKind::Comma) => {
					self.bump();
				}
				Some(TokenKind::RParen) => {
					self.bump();
					return Ok(call);
				}
				_ => return Err(self.error_here("expected `,` or `)` in argument list")),
			}
		}
	}

	fn parse_arg(&mut self) -> PResult<String> {
		match self.peek() {
			Some(TokenKind::Word(_) | TokenKind::Str(_) | TokenKind::Iri(_)) => {
				let token = self.bump().unwrap();
				Ok(match token.kind {
					TokenKind::Word(w) => w,
					TokenKind::Str(s) => s,
					TokenKind::Iri(i) => i,
					_ => unreachable!(),
				})
			}
			_ => Err(self.error_here("expected argument")),
		}
	}

	fn parse_action_set(&mut self) -> PResult<Vec<Action>> {
		let actions = if self.eat(TokenKind::LBrace) {
			let mut actions = Vec::new();
			loop {
				match self.peek() {
					Some(TokenKind::RBrace) => {
						self.bump();
						break;
					}
					None => return Err(self.error_here("expected `}`")),
					_ => actions.push(self.parse_action()?),
				}
			}
			if actions.is_empty() {
				return Err(self.error_here("expected at least one action"));
			}
			actions
		} else {
			vec![self.parse_action()?]
		};

		self.eat(TokenKind::Semicolon);
		Ok(actions)
	}

	fn parse_action(&mut self) -> PResult<Action> {
		let (name, position) = self.expect_word("action")?;
		self.expect(TokenKind::LParen, "`(`")?;
		let call = self.parse_call_args(name, position)?;
		self.expect(TokenKind::Semicolon, "`;` after action")?;
		Ok(self.convert_action(call))
	}

	/// Recognizes the built-in editing actions and checks their shape.
	/// A shape error is recorded but still yields a placeholder node:
	/// the tokens are already consumed, so there is nothing to skip.
	fn convert_action(&mut self, call: FunctionCall) -> Action {
		let no_args = |parser: &mut Self, call: &FunctionCall| {
			if !call.args.is_empty() || !call.named.is_empty() {
				parser.error(
					call.position,
					format!("`{}()` takes no arguments", call.name),
				);
			}
		};

		match call.name.as_str() {
			"stop" => {
				no_args(self, &call);
				Action::Stop
			}
			"invert" => {
				no_args(self, &call);
				Action::Invert
			}
			"include" => {
				no_args(self, &call);
				Action::Include {
					position: call.position,
				}
			}
			"assign" => {
				if call.args.len() < 2 || call.args.len() % 2 != 0 || !call.named.is_empty() {
					self.error(
						call.position,
						"`assign()` takes one or more field/value pairs",
					);
				}
				let pairs = call
					.args
					.chunks_exact(2)
					.map(|pair| (pair[0].clone(), pair[1].clone()))
					.collect();
				Action::Assign {
					pairs,
					position: call.position,
				}
			}
			"replace" => {
				if call.args.len() != 3 || !call.named.is_empty() {
					self.error(
						call.position,
						"`replace()` takes a field, a pattern and a replacement",
					);
					return Action::Call(call);
				}
				Action::Replace {
					field: call.args[0].clone(),
					pattern: call.args[1].clone(),
					replacement: call.args[2].clone(),
					position: call.position,
				}
			}
			_ => Action::Call(call),
		}
	}
}
