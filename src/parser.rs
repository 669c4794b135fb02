use std::{iter::Peekable, vec::IntoIter};

use crate::{
    env::Env,
    errors::JSONPathError,
    query::{Operand, Operator, Predicate},
    token::{Token, TokenType},
    unescape::unescape,
    value::{Canonical, Number},
};

use TokenType::*;

const EOQ_TOKEN: Token = Token {
    kind: Eoq,
    index: 0,
};

type Tokens = Peekable<IntoIter<Token>>;

pub struct Parser {
    env: Env,
}

impl Parser {
    pub fn new(env: Env) -> Self {
        Parser { env }
    }

    pub fn parse(&self, tokens: Vec<Token>) -> Result<Vec<Operator>, JSONPathError> {
        let mut it = tokens.into_iter().peekable();

        match it.next().unwrap_or(EOQ_TOKEN) {
            Token { kind: Root, .. } => {
                let operators = self.parse_operators(&mut it)?;

                // a trailing '+' asks for values, which are always reported
                if matches!(it.peek(), Some(Token { kind: Plus, .. })) {
                    it.next();
                }

                match it.next() {
                    Some(Token { kind: Eoq, .. }) | None => Ok(operators),
                    Some(token) => Err(unexpected(&token, "expected end of query")),
                }
            }
            token => Err(unexpected(&token, "expected '$'")),
        }
    }

    fn parse_operators(&self, it: &mut Tokens) -> Result<Vec<Operator>, JSONPathError> {
        let mut operators: Vec<Operator> = Vec::new();

        loop {
            match it.peek().map(|t| &t.kind) {
                Some(Name { .. }) => {
                    if let Some(Token {
                        kind: Name { value },
                        ..
                    }) = it.next()
                    {
                        operators.push(Operator::Name(value.to_string()));
                    }
                }
                Some(Wild) => {
                    it.next();
                    operators.push(Operator::WildcardName);
                }
                Some(LBracket) => operators.push(self.parse_bracketed(it)?),
                Some(Filter) => operators.push(self.parse_filter(it)?),
                _ => break,
            }
        }

        Ok(operators)
    }

    fn parse_bracketed(&self, it: &mut Tokens) -> Result<Operator, JSONPathError> {
        #[cfg(debug_assertions)]
        debug_assert!(
            matches!(it.peek(), Some(Token { kind: LBracket, .. })),
            "expected the start of a bracketed selection"
        );

        let open = it.next().unwrap_or(EOQ_TOKEN);

        let operator = match it.next().unwrap_or(EOQ_TOKEN) {
            Token { kind: RBracket, .. } => {
                return Err(JSONPathError::syntax(
                    String::from("empty bracketed selection"),
                    open.index,
                ))
            }
            Token {
                kind: DoubleQuoteString { value },
                index,
            } => Operator::Name(unescape(value.as_bytes(), index)?),
            Token {
                kind: SingleQuoteString { value },
                index,
            } => Operator::Name(unescape_single_quoted(&value, index)?),
            Token { kind: Wild, .. } => Operator::WildcardIndex,
            Token {
                kind: Index { value },
                index,
            } => {
                let start = self.parse_index(&value, index)?;
                if matches!(it.peek(), Some(Token { kind: Colon, .. })) {
                    it.next();
                    self.parse_range(it, start)?
                } else {
                    Operator::Index(start)
                }
            }
            Token { kind: Colon, .. } => self.parse_range(it, 0)?,
            Token {
                kind: Eoq | Error { .. },
                ..
            } => {
                return Err(JSONPathError::syntax(
                    String::from("unclosed bracketed selection"),
                    open.index,
                ))
            }
            token => return Err(unexpected(&token, "unexpected token in bracketed selection")),
        };

        match it.next().unwrap_or(EOQ_TOKEN) {
            Token { kind: RBracket, .. } => Ok(operator),
            Token {
                kind: Comma, index, ..
            } => Err(JSONPathError::syntax(
                String::from("union selectors are not supported"),
                index,
            )),
            Token {
                kind: Colon, index, ..
            } => Err(JSONPathError::syntax(
                String::from("slice steps are not supported"),
                index,
            )),
            token => Err(unexpected(&token, "expected ']'")),
        }
    }

    /// Parse the end of a range, `start` and the colon having been consumed.
    fn parse_range(&self, it: &mut Tokens, start: usize) -> Result<Operator, JSONPathError> {
        let end = match it.peek() {
            Some(Token {
                kind: Index { value },
                index,
            }) => Some(self.parse_index(value, *index)?),
            _ => None,
        };

        if end.is_some() {
            it.next();
        }

        Ok(Operator::IndexRange { start, end })
    }

    fn parse_index(&self, value: &str, index: usize) -> Result<usize, JSONPathError> {
        if value.starts_with('-') {
            return Err(JSONPathError::syntax(
                String::from("negative indices are not supported"),
                index,
            ));
        }

        if value.len() > 1 && value.starts_with('0') {
            return Err(JSONPathError::syntax(
                String::from("array indices with a leading zero are not allowed"),
                index,
            ));
        }

        value
            .parse::<usize>()
            .ok()
            .filter(|i| *i <= self.env.max_index)
            .ok_or_else(|| JSONPathError::syntax(String::from("index out of range"), index))
    }

    fn parse_filter(&self, it: &mut Tokens) -> Result<Operator, JSONPathError> {
        #[cfg(debug_assertions)]
        debug_assert!(
            matches!(it.peek(), Some(Token { kind: Filter, .. })),
            "expected the start of a filter"
        );

        let filter = it.next().unwrap_or(EOQ_TOKEN);

        match it.next().unwrap_or(EOQ_TOKEN) {
            Token { kind: LParen, .. } => (),
            token => return Err(unexpected(&token, "expected '(' after '?'")),
        }

        if matches!(it.peek(), Some(Token { kind: RParen, .. })) {
            return Err(JSONPathError::syntax(
                String::from("expected a filter expression"),
                filter.index,
            ));
        }

        let left = self.parse_operand(it)?;

        match it.next().unwrap_or(EOQ_TOKEN) {
            Token { kind: Eq, .. } => (),
            token => return Err(unexpected(&token, "expected '=='")),
        }

        let right = self.parse_operand(it)?;

        match it.next().unwrap_or(EOQ_TOKEN) {
            Token { kind: RParen, .. } => Ok(Operator::Filter(Predicate { left, right })),
            Token {
                kind: Eoq | Error { .. },
                ..
            } => Err(JSONPathError::syntax(
                String::from("unbalanced parentheses"),
                filter.index,
            )),
            token => Err(unexpected(&token, "expected ')'")),
        }
    }

    fn parse_operand(&self, it: &mut Tokens) -> Result<Operand, JSONPathError> {
        let token = it.next().unwrap_or(EOQ_TOKEN);

        let literal = match token.kind {
            Current => return Ok(Operand::Relative(self.parse_operators(it)?)),
            DoubleQuoteString { value } => Canonical::String(unescape(value.as_bytes(), token.index)?),
            SingleQuoteString { value } => {
                Canonical::String(unescape_single_quoted(&value, token.index)?)
            }
            Int { value } | Float { value } => match Number::parse(value.as_bytes()) {
                Some(number) => Canonical::Number(number),
                None => {
                    return Err(JSONPathError::syntax(
                        format!("invalid number literal '{}'", value),
                        token.index,
                    ))
                }
            },
            True => Canonical::Bool(true),
            False => Canonical::Bool(false),
            Null => Canonical::Null,
            kind => {
                return Err(JSONPathError::syntax(
                    format!("expected a literal or relative path, found {}", kind),
                    token.index,
                ))
            }
        };

        Ok(Operand::Literal(literal))
    }
}

fn unescape_single_quoted(value: &str, index: usize) -> Result<String, JSONPathError> {
    unescape(value.replace("\\'", "'").as_bytes(), index)
}

fn unexpected(token: &Token, msg: &str) -> JSONPathError {
    match &token.kind {
        Error { msg } => JSONPathError::syntax(msg.to_string(), token.index),
        kind => JSONPathError::syntax(format!("{}, found {}", msg, kind), token.index),
    }
}
