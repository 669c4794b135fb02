//! Query tokenizer.
//!
//! A query string is scanned once, left to right, by a small state machine. Each
//! state function consumes some input, emits zero or more tokens and returns the
//! next state. Lexing stops at the end of the query or at the first error, in
//! which case the last token is a [`TokenType::Error`].
use crate::{
    errors::JSONPathError,
    token::{Token, TokenType, EOQ},
};

use std::str::CharIndices;

enum State {
    Error,
    EndOfQuery,
    LexRoot,
    LexSegment,
    LexShorthandSegment,
    LexInsideBracketedSegment,
    LexInsideFilter,
    LexInsideSingleQuotedString,
    LexInsideDoubleQuotedString,
    LexInsideSingleQuotedFilterString,
    LexInsideDoubleQuotedFilterString,
}

/// A query tokenizer, producing a vector of tokens.
struct Lexer<'q> {
    query: &'q str,
    tokens: Vec<Token>,

    chars: CharIndices<'q>,
    start: usize,
    pos: usize,

    filter_depth: u32,
}

impl<'q> Lexer<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            tokens: Vec::new(),
            start: 0,
            pos: 0,
            chars: query.char_indices(),
            filter_depth: 0,
        }
    }

    fn run(&mut self) {
        let mut state = State::LexRoot;
        loop {
            match state {
                State::Error | State::EndOfQuery => break,
                State::LexRoot => state = lex_root(self),
                State::LexSegment => state = lex_segment(self),
                State::LexShorthandSegment => state = lex_shorthand_selector(self),
                State::LexInsideBracketedSegment => state = lex_inside_bracketed_segment(self),
                State::LexInsideFilter => state = lex_inside_filter(self),
                State::LexInsideSingleQuotedString => {
                    state = lex_string(self, '\'', State::LexInsideBracketedSegment)
                }
                State::LexInsideDoubleQuotedString => {
                    state = lex_string(self, '"', State::LexInsideBracketedSegment)
                }
                State::LexInsideSingleQuotedFilterString => {
                    state = lex_string(self, '\'', State::LexInsideFilter)
                }
                State::LexInsideDoubleQuotedFilterString => {
                    state = lex_string(self, '"', State::LexInsideFilter)
                }
            }
        }
    }

    fn emit(&mut self, t: TokenType) {
        self.tokens.push(Token::new(t, self.start));
        self.start = self.pos;
    }

    fn value(&self) -> &str {
        // start and pos always sit on char boundaries
        self.query.get(self.start..self.pos).unwrap_or_default()
    }

    fn boxed_value(&self) -> Box<str> {
        self.value().to_string().into_boxed_str()
    }

    fn next(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();

            #[cfg(debug_assertions)]
            debug_assert!(
                self.pos <= self.query.len(),
                "current position is out of bounds"
            );

            Some(ch)
        } else {
            None
        }
    }

    fn ignore(&mut self) {
        self.start = self.pos;
    }

    fn peek(&mut self) -> char {
        if let Some((_, ch)) = self.chars.clone().next() {
            ch
        } else {
            EOQ
        }
    }

    fn accept(&mut self, ch: char) -> bool {
        if self.peek() == ch {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_if(&mut self, pred: impl FnOnce(char) -> bool) -> bool {
        if pred(self.peek()) {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_run(&mut self, pred: impl Fn(char) -> bool) -> bool {
        let mut accepted = false;
        while self.peek() != EOQ && pred(self.peek()) {
            self.next();
            accepted = true;
        }
        accepted
    }

    fn ignore_whitespace(&mut self) -> bool {
        #[cfg(debug_assertions)]
        debug_assert!(
            self.pos == self.start,
            "must emit or ignore before eating whitespace"
        );

        if self.accept_run(is_whitespace_char) {
            self.ignore();
            true
        } else {
            false
        }
    }

    fn error(&mut self, msg: String) -> State {
        self.tokens.push(Token::new(
            TokenType::Error {
                msg: msg.into_boxed_str(),
            },
            self.start,
        ));
        State::Error
    }
}

pub fn tokenize(query: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(query);
    lexer.run();
    lexer.tokens
}

pub fn lex(query: &str) -> Result<Vec<Token>, JSONPathError> {
    let tokens = tokenize(query);

    match tokens.last() {
        Some(Token {
            kind: TokenType::Error { msg },
            index,
        }) => Err(JSONPathError::syntax((*msg).to_string(), *index)),
        _ => Ok(tokens),
    }
}

fn lex_root(l: &mut Lexer) -> State {
    if l.accept('$') {
        l.emit(TokenType::Root);
        State::LexSegment
    } else {
        let msg = format!("expected '$', found '{}'", l.next().unwrap_or(EOQ));
        l.error(msg)
    }
}

fn lex_segment(l: &mut Lexer) -> State {
    if l.ignore_whitespace() && l.peek() == EOQ {
        return l.error(String::from("unexpected trailing whitespace"));
    }

    if l.accept('.') {
        if l.peek() == '.' {
            return l.error(String::from("recursive descent is not supported"));
        }
        State::LexShorthandSegment
    } else if l.accept('[') {
        l.emit(TokenType::LBracket);
        State::LexInsideBracketedSegment
    } else if l.accept('?') {
        l.emit(TokenType::Filter);
        if l.accept('(') {
            l.emit(TokenType::LParen);
            l.filter_depth += 1;
            State::LexInsideFilter
        } else {
            let msg = format!("expected '(' after '?', found '{}'", l.peek());
            l.error(msg)
        }
    } else if l.filter_depth > 0 {
        State::LexInsideFilter
    } else if l.accept('+') {
        l.emit(TokenType::Plus);
        State::LexSegment
    } else if l.peek() == EOQ {
        l.next();
        l.emit(TokenType::Eoq);
        State::EndOfQuery
    } else {
        let msg = format!(
            "expected '.', '[' or '?(', found '{}'",
            l.next().unwrap_or(EOQ)
        );
        l.error(msg)
    }
}

fn lex_shorthand_selector(l: &mut Lexer) -> State {
    l.ignore(); // ignore dot

    if l.accept_run(is_whitespace_char) {
        return l.error(String::from("unexpected whitespace after dot"));
    }

    let name_char = if l.filter_depth > 0 {
        is_filter_name_char
    } else {
        is_name_char
    };

    if l.accept('*') {
        l.emit(TokenType::Wild);
        State::LexSegment
    } else if l.accept_run(name_char) {
        l.emit(TokenType::Name {
            value: l.boxed_value(),
        });
        State::LexSegment
    } else {
        let msg = format!(
            "unexpected shorthand selector '{}'",
            l.next().unwrap_or(EOQ)
        );
        l.error(msg)
    }
}

fn lex_inside_bracketed_segment(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        ']' => {
            l.next();
            l.emit(TokenType::RBracket);
            State::LexSegment
        }
        '*' => {
            l.next();
            l.emit(TokenType::Wild);
            State::LexInsideBracketedSegment
        }
        ':' => {
            l.next();
            l.emit(TokenType::Colon);
            State::LexInsideBracketedSegment
        }
        ',' => {
            l.next();
            l.emit(TokenType::Comma);
            State::LexInsideBracketedSegment
        }
        '\'' => {
            l.next();
            State::LexInsideSingleQuotedString
        }
        '"' => {
            l.next();
            State::LexInsideDoubleQuotedString
        }
        '-' => {
            // negative array index, rejected by the parser
            l.next();
            if l.accept_run(is_digit) {
                l.emit(TokenType::Index {
                    value: l.boxed_value(),
                });
                State::LexInsideBracketedSegment
            } else {
                let msg = format!("expected a digit after '-', found '{}'", l.peek());
                l.error(msg)
            }
        }
        EOQ => l.error(String::from("unclosed bracketed selection")),
        _ => {
            if l.accept_run(is_digit) {
                l.emit(TokenType::Index {
                    value: l.boxed_value(),
                });
                State::LexInsideBracketedSegment
            } else {
                let msg = format!("unexpected '{}' in bracketed selection", l.peek());
                l.error(msg)
            }
        }
    }
}

fn lex_inside_filter(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        EOQ => l.error(String::from("unclosed filter expression")),
        ')' => {
            l.next();
            l.emit(TokenType::RParen);
            l.filter_depth -= 1;
            State::LexSegment
        }
        '(' => l.error(String::from("unexpected '(' in filter expression")),
        '\'' => {
            l.next();
            State::LexInsideSingleQuotedFilterString
        }
        '"' => {
            l.next();
            State::LexInsideDoubleQuotedFilterString
        }
        '$' => {
            l.next();
            l.emit(TokenType::Root);
            State::LexSegment
        }
        '@' => {
            l.next();
            l.emit(TokenType::Current);
            State::LexSegment
        }
        '=' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Eq);
                State::LexInsideFilter
            } else {
                l.error(String::from("expected '==', found '='"))
            }
        }
        '!' | '<' | '>' | '&' | '|' => {
            let msg = format!(
                "unsupported operator '{}', only '==' comparisons are allowed",
                l.peek()
            );
            l.error(msg)
        }
        '-' => {
            // negative number
            l.next();
            lex_number(l)
        }
        _ => {
            if is_digit(l.peek()) {
                lex_number(l)
            } else if l.accept_run(is_keyword_char) {
                match l.value() {
                    "true" => l.emit(TokenType::True),
                    "false" => l.emit(TokenType::False),
                    "null" => l.emit(TokenType::Null),
                    keyword => {
                        let msg = format!("unknown keyword '{}'", keyword);
                        return l.error(msg);
                    }
                }
                State::LexInsideFilter
            } else {
                let msg = format!("unexpected filter expression token '{}'", l.peek());
                l.error(msg)
            }
        }
    }
}

fn lex_string(l: &mut Lexer, quote: char, next_state: State) -> State {
    l.ignore(); // ignore open quote

    loop {
        match l.peek() {
            '\\' => {
                l.next();
                if !l.accept_if(|c| is_escape_char(c) || c == quote) {
                    return l.error(String::from("invalid escape sequence"));
                }
            }
            EOQ => {
                let msg = format!("unclosed string starting at index {}", l.start - 1);
                return l.error(msg);
            }
            ch => {
                if ch == quote {
                    let value = l.boxed_value();
                    l.emit(if quote == '\'' {
                        TokenType::SingleQuoteString { value }
                    } else {
                        TokenType::DoubleQuoteString { value }
                    });
                    l.next();
                    l.ignore(); // ignore closing quote
                    return next_state;
                }
                l.next();
            }
        }
    }
}

fn lex_number(l: &mut Lexer) -> State {
    if !l.accept_run(is_digit) {
        let msg = format!("expected a digit, found '{}'", l.peek());
        return l.error(msg);
    }

    let mut float = false;

    if l.accept('.') {
        if !l.accept_run(is_digit) {
            return l.error(String::from(
                "a fractional digit is required after a decimal point",
            ));
        }
        float = true;
    }

    // exponent
    if l.accept_if(|ch| ch == 'e' || ch == 'E') {
        l.accept_if(|ch| ch == '+' || ch == '-');
        if !l.accept_run(is_digit) {
            return l.error(String::from("at least one exponent digit is required"));
        }
        float = true;
    }

    let value = l.boxed_value();
    if float {
        l.emit(TokenType::Float { value });
    } else {
        l.emit(TokenType::Int { value });
    }

    State::LexInsideFilter
}

fn is_name_char(ch: char) -> bool {
    !matches!(ch, '.' | '[' | ']' | '(' | ')' | '?' | '=' | '+') && !is_whitespace_char(ch)
}

/// Inside a filter, a name also stops at the start of a comparison operator.
fn is_filter_name_char(ch: char) -> bool {
    is_name_char(ch) && !matches!(ch, '!' | '<' | '>' | '&' | '|')
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_keyword_char(ch: char) -> bool {
    ch.is_ascii_lowercase()
}

fn is_escape_char(ch: char) -> bool {
    matches!(ch, '"' | 'b' | 'f' | 'n' | 'r' | 't' | 'u' | '/' | '\\')
}

fn is_whitespace_char(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str, index: usize) -> Token {
        Token::new(
            TokenType::Name {
                value: value.to_string().into_boxed_str(),
            },
            index,
        )
    }

    fn error(msg: &str, index: usize) -> Token {
        Token::new(
            TokenType::Error {
                msg: msg.to_string().into_boxed_str(),
            },
            index,
        )
    }

    #[test]
    fn basic_shorthand_name() {
        let tokens = tokenize("$.foo.bar");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                name("foo", 2),
                name("bar", 6),
                Token::new(TokenType::Eoq, 9),
            ]
        )
    }

    #[test]
    fn names_may_start_with_a_digit() {
        let tokens = tokenize("$.1Key");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                name("1Key", 2),
                Token::new(TokenType::Eoq, 6),
            ]
        )
    }

    #[test]
    fn bracketed_name() {
        let tokens = tokenize("$['foo'][\"bar\"]");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                Token::new(TokenType::LBracket, 1),
                Token::new(
                    TokenType::SingleQuoteString {
                        value: "foo".to_string().into_boxed_str()
                    },
                    3
                ),
                Token::new(TokenType::RBracket, 7),
                Token::new(TokenType::LBracket, 8),
                Token::new(
                    TokenType::DoubleQuoteString {
                        value: "bar".to_string().into_boxed_str()
                    },
                    10
                ),
                Token::new(TokenType::RBracket, 14),
                Token::new(TokenType::Eoq, 15),
            ]
        )
    }

    #[test]
    fn basic_index() {
        let tokens = tokenize("$.foo[1]");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                name("foo", 2),
                Token::new(TokenType::LBracket, 5),
                Token::new(
                    TokenType::Index {
                        value: "1".to_string().into_boxed_str()
                    },
                    6
                ),
                Token::new(TokenType::RBracket, 7),
                Token::new(TokenType::Eoq, 8),
            ]
        )
    }

    #[test]
    fn slice_without_stop() {
        let tokens = tokenize("$[1:]");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                Token::new(TokenType::LBracket, 1),
                Token::new(
                    TokenType::Index {
                        value: "1".to_string().into_boxed_str()
                    },
                    2
                ),
                Token::new(TokenType::Colon, 3),
                Token::new(TokenType::RBracket, 4),
                Token::new(TokenType::Eoq, 5),
            ]
        )
    }

    #[test]
    fn just_a_hyphen() {
        let tokens = tokenize("$.foo[-]");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                name("foo", 2),
                Token::new(TokenType::LBracket, 5),
                error("expected a digit after '-', found ']'", 6),
            ]
        )
    }

    #[test]
    fn missing_root_selector() {
        let tokens = tokenize("foo.bar");
        assert_eq!(tokens, vec![error("expected '$', found 'f'", 0)])
    }

    #[test]
    fn filter_with_relative_path() {
        let tokens = tokenize("$[*]?(@.name == \"bravo\").value");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                Token::new(TokenType::LBracket, 1),
                Token::new(TokenType::Wild, 2),
                Token::new(TokenType::RBracket, 3),
                Token::new(TokenType::Filter, 4),
                Token::new(TokenType::LParen, 5),
                Token::new(TokenType::Current, 6),
                name("name", 8),
                Token::new(TokenType::Eq, 13),
                Token::new(
                    TokenType::DoubleQuoteString {
                        value: "bravo".to_string().into_boxed_str()
                    },
                    17
                ),
                Token::new(TokenType::RParen, 23),
                name("value", 25),
                Token::new(TokenType::Eoq, 30),
            ]
        )
    }

    #[test]
    fn filter_number_literals() {
        let tokens = tokenize("$?(-1.5e3 == 10)");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                Token::new(TokenType::Filter, 1),
                Token::new(TokenType::LParen, 2),
                Token::new(
                    TokenType::Float {
                        value: "-1.5e3".to_string().into_boxed_str()
                    },
                    3
                ),
                Token::new(TokenType::Eq, 10),
                Token::new(
                    TokenType::Int {
                        value: "10".to_string().into_boxed_str()
                    },
                    13
                ),
                Token::new(TokenType::RParen, 15),
                Token::new(TokenType::Eoq, 16),
            ]
        )
    }

    #[test]
    fn names_with_punctuation() {
        let tokens = tokenize("$.a:b.it's.a@b");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                name("a:b", 2),
                name("it's", 6),
                name("a@b", 11),
                Token::new(TokenType::Eoq, 14),
            ]
        )
    }

    #[test]
    fn error_index_is_a_byte_offset() {
        let tokens = tokenize("$.é)");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                name("é", 2),
                error("expected '.', '[' or '?(', found ')'", 4),
            ]
        )
    }

    #[test]
    fn filter_names_stop_at_operators() {
        let tokens = tokenize("$?(@.a!=1)");
        assert_eq!(
            tokens.last(),
            Some(&error(
                "unsupported operator '!', only '==' comparisons are allowed",
                6
            ))
        )
    }

    #[test]
    fn trailing_plus() {
        let tokens = tokenize("$.aKey+");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Root, 0),
                name("aKey", 2),
                Token::new(TokenType::Plus, 6),
                Token::new(TokenType::Eoq, 7),
            ]
        )
    }

    #[test]
    fn unsupported_comparison() {
        let tokens = tokenize("$?(@.a != 1)");
        assert_eq!(
            tokens.last(),
            Some(&error(
                "unsupported operator '!', only '==' comparisons are allowed",
                7
            ))
        )
    }

    #[test]
    fn unclosed_string() {
        let tokens = tokenize("$['foo");
        assert_eq!(
            tokens.last(),
            Some(&error("unclosed string starting at index 2", 3))
        )
    }

    #[test]
    fn recursive_descent() {
        let err = lex("$..foo").unwrap_err();
        assert_eq!(err.msg, "recursive descent is not supported");
    }
}
