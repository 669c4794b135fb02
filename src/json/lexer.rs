use std::mem;

use crate::env::Env;

use super::{
    source::{ByteSource, SliceSource},
    token::{Container, JsonToken, JsonTokenKind},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    End,
    Root,
    ObjectOpen,
    ArrayOpen,
    Object,
    Array,
    Key,
    Colon,
    Value,
    String,
    Number,
    Bool,
    Null,
    AfterValue,
    AfterRoot,
}

/// A pull-based JSON tokenizer.
///
/// Each call to [`Iterator::next`] runs the state machine until it emits exactly
/// one token. The stream ends after an [`JsonTokenKind::Eof`] or
/// [`JsonTokenKind::Error`] token.
#[derive(Debug)]
pub struct JsonLexer<S> {
    source: S,
    state: State,
    stack: Vec<Container>,
    max_depth: usize,

    lexeme: Vec<u8>,
    start: usize,
    token: Option<JsonToken>,
}

impl<S: ByteSource> JsonLexer<S> {
    pub fn new(source: S) -> Self {
        Self::with_max_depth(source, Env::standard().max_depth)
    }

    pub fn with_max_depth(source: S, max_depth: usize) -> Self {
        Self {
            source,
            state: State::Root,
            stack: Vec::new(),
            max_depth,
            lexeme: Vec::with_capacity(64),
            start: 0,
            token: None,
        }
    }

    /// The number of currently open objects and arrays.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn into_source(self) -> S {
        self.source
    }

    fn step(&mut self) -> Option<JsonToken> {
        loop {
            if let Some(token) = self.token.take() {
                return Some(token);
            }

            self.state = match self.state {
                State::End => return None,
                State::Root => lex_root(self),
                State::ObjectOpen => lex_container_open(self, Container::Object),
                State::ArrayOpen => lex_container_open(self, Container::Array),
                State::Object => lex_object(self),
                State::Array => lex_array(self),
                State::Key => lex_key(self),
                State::Colon => lex_colon(self),
                State::Value => lex_value(self),
                State::String => lex_string(self),
                State::Number => lex_number(self),
                State::Bool => lex_bool(self),
                State::Null => lex_null(self),
                State::AfterValue => lex_after_value(self),
                State::AfterRoot => lex_after_root(self),
            };
        }
    }

    fn emit(&mut self, kind: JsonTokenKind) {
        let value = mem::take(&mut self.lexeme).into_boxed_slice();
        self.token = Some(JsonToken::new(kind, self.start, value));
        self.ignore_whitespace();
    }

    fn peek(&mut self) -> Option<u8> {
        self.source.peek()
    }

    fn take(&mut self) -> Option<u8> {
        let b = self.source.take()?;
        self.lexeme.push(b);
        Some(b)
    }

    fn accept(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.take();
            true
        } else {
            false
        }
    }

    fn accept_run(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        let mut accepted = false;
        while self.peek().is_some_and(&pred) {
            self.take();
            accepted = true;
        }
        accepted
    }

    fn accept_exact(&mut self, expected: &[u8]) -> bool {
        expected.iter().all(|b| self.accept(*b))
    }

    fn ignore_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.source.take();
        }
        self.start = self.source.position();
    }

    fn error(&mut self, msg: String) -> State {
        let msg = match self.source.take_error() {
            Some(err) => format!("read error: {err}"),
            None => msg,
        };

        log::debug!("json lexer error at {}: {}", self.start, msg);
        self.lexeme.clear();
        self.token = Some(JsonToken::new(
            JsonTokenKind::Error {
                msg: msg.into_boxed_str(),
            },
            self.start,
            Box::default(),
        ));
        State::End
    }

    /// Consume a string literal, from its opening quote to the first unescaped
    /// closing quote, validating escape sequences along the way.
    fn take_string(&mut self) -> Result<(), String> {
        if !self.accept(b'"') {
            return Err(format!(
                "expected '\"' as start of string instead of {}",
                describe(self.peek())
            ));
        }

        loop {
            match self.take() {
                None => return Err(String::from("unexpected end of input in string")),
                Some(b'"') => return Ok(()),
                Some(b'\\') => match self.take() {
                    Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => (),
                    Some(b'u') => {
                        for _ in 0..4 {
                            if !self.accept_if(|b| b.is_ascii_hexdigit()) {
                                return Err(String::from("invalid \\u escape in string"));
                            }
                        }
                    }
                    Some(b) => {
                        return Err(format!(
                            "invalid escape sequence '\\{}' in string",
                            b.escape_ascii()
                        ))
                    }
                    None => return Err(String::from("unexpected end of input in string")),
                },
                Some(b) if b < 0x20 => {
                    return Err(String::from("unescaped control character in string"))
                }
                Some(_) => (),
            }
        }
    }

    fn accept_if(&mut self, pred: impl FnOnce(u8) -> bool) -> bool {
        if self.peek().is_some_and(pred) {
            self.take();
            true
        } else {
            false
        }
    }

    /// Consume the longest prefix matching the JSON number grammar.
    fn take_number(&mut self) -> Result<(), String> {
        self.accept(b'-');

        match self.peek() {
            Some(b'0') => {
                self.take();
            }
            Some(b'1'..=b'9') => {
                self.accept_run(|b| b.is_ascii_digit());
            }
            other => return Err(format!("expected a digit instead of {}", describe(other))),
        }

        if self.accept(b'.') && !self.accept_run(|b| b.is_ascii_digit()) {
            return Err(String::from(
                "a fractional digit is required after a decimal point",
            ));
        }

        if self.accept_if(|b| b == b'e' || b == b'E') {
            self.accept_if(|b| b == b'+' || b == b'-');
            if !self.accept_run(|b| b.is_ascii_digit()) {
                return Err(String::from("at least one exponent digit is required"));
            }
        }

        Ok(())
    }

    /// Emit the closing token for `container` if it matches the innermost open
    /// container.
    fn close(&mut self, container: Container) -> State {
        let top = self.stack.last().copied();
        let found = describe(self.peek());

        match top {
            Some(open) if open == container => {
                self.take();
                self.stack.pop();
                self.emit(match container {
                    Container::Object => JsonTokenKind::BraceRight,
                    Container::Array => JsonTokenKind::BracketRight,
                });
                if self.stack.is_empty() {
                    State::AfterRoot
                } else {
                    State::AfterValue
                }
            }
            Some(Container::Object) => self.error(format!("unexpected {found} in object")),
            Some(Container::Array) => self.error(format!("unexpected {found} in array")),
            None => self.error(format!("found {found} outside of array or object")),
        }
    }
}

impl<S: ByteSource> Iterator for JsonLexer<S> {
    type Item = JsonToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}

/// Tokenize a complete in-memory document.
pub fn tokenize(bytes: &[u8]) -> Vec<JsonToken> {
    JsonLexer::new(SliceSource::new(bytes)).collect()
}

fn lex_root<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    l.ignore_whitespace();

    match l.peek() {
        Some(b'{') => State::ObjectOpen,
        Some(b'[') => State::ArrayOpen,
        other => {
            let msg = format!(
                "expected '{{' or '[' at root of JSON instead of {}",
                describe(other)
            );
            l.error(msg)
        }
    }
}

fn lex_container_open<S: ByteSource>(l: &mut JsonLexer<S>, container: Container) -> State {
    if l.stack.len() >= l.max_depth {
        let msg = format!("maximum nesting depth of {} exceeded", l.max_depth);
        return l.error(msg);
    }

    l.take();
    l.stack.push(container);

    match container {
        Container::Object => {
            l.emit(JsonTokenKind::BraceLeft);
            State::Object
        }
        Container::Array => {
            l.emit(JsonTokenKind::BracketLeft);
            State::Array
        }
    }
}

fn lex_object<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    match l.peek() {
        Some(b'}') => l.close(Container::Object),
        Some(b'"') => State::Key,
        None => l.error(String::from("unexpected end of input in object")),
        other => {
            let msg = format!(
                "expected '}}' or '\"' within an object instead of {}",
                describe(other)
            );
            l.error(msg)
        }
    }
}

fn lex_array<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    match l.peek() {
        Some(b']') => l.close(Container::Array),
        _ => State::Value,
    }
}

fn lex_key<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    if let Err(msg) = l.take_string() {
        return l.error(msg);
    }
    l.emit(JsonTokenKind::Key);
    State::Colon
}

fn lex_colon<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    if l.accept(b':') {
        l.emit(JsonTokenKind::Colon);
        State::Value
    } else {
        let msg = format!("expected ':' after key instead of {}", describe(l.peek()));
        l.error(msg)
    }
}

fn lex_value<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    match l.peek() {
        None => l.error(String::from("unexpected end of input instead of value")),
        Some(b'"') => State::String,
        Some(b'-' | b'0'..=b'9') => State::Number,
        Some(b't' | b'f') => State::Bool,
        Some(b'n') => State::Null,
        Some(b'{') => State::ObjectOpen,
        Some(b'[') => State::ArrayOpen,
        other => {
            let msg = format!("unexpected {} as start of value", describe(other));
            l.error(msg)
        }
    }
}

fn lex_string<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    if let Err(msg) = l.take_string() {
        return l.error(msg);
    }
    l.emit(JsonTokenKind::String);
    State::AfterValue
}

fn lex_number<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    if let Err(msg) = l.take_number() {
        return l.error(msg);
    }
    // a read error may have cut the number short
    if l.source.has_error() {
        return l.error(String::from("unexpected end of input in number"));
    }
    l.emit(JsonTokenKind::Number);
    State::AfterValue
}

fn lex_bool<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    let expected: &[u8] = if l.peek() == Some(b't') {
        b"true"
    } else {
        b"false"
    };

    if !l.accept_exact(expected) {
        let msg = format!(
            "invalid literal, expected '{}'",
            String::from_utf8_lossy(expected)
        );
        return l.error(msg);
    }
    l.emit(JsonTokenKind::Bool);
    State::AfterValue
}

fn lex_null<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    if !l.accept_exact(b"null") {
        return l.error(String::from("invalid literal, expected 'null'"));
    }
    l.emit(JsonTokenKind::Null);
    State::AfterValue
}

fn lex_after_value<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    match l.peek() {
        Some(b',') => match l.stack.last() {
            Some(Container::Object) => {
                l.take();
                l.emit(JsonTokenKind::Comma);
                State::Key
            }
            Some(Container::Array) => {
                l.take();
                l.emit(JsonTokenKind::Comma);
                State::Value
            }
            None => l.error(String::from("found ',' outside of array or object")),
        },
        Some(b'}') => l.close(Container::Object),
        Some(b']') => l.close(Container::Array),
        None if l.source.has_error() => l.error(String::from("unexpected end of input")),
        None => {
            if l.stack.is_empty() {
                l.emit(JsonTokenKind::Eof);
                State::End
            } else {
                l.error(String::from(
                    "unexpected end of input, expected ',' or a closing bracket",
                ))
            }
        }
        other => {
            let msg = format!("unexpected {} after value", describe(other));
            l.error(msg)
        }
    }
}

fn lex_after_root<S: ByteSource>(l: &mut JsonLexer<S>) -> State {
    match l.peek() {
        None if l.source.has_error() => l.error(String::from("unexpected end of input")),
        None => {
            l.emit(JsonTokenKind::Eof);
            State::End
        }
        other => {
            let msg = format!(
                "expected end of input instead of {} after root value",
                describe(other)
            );
            l.error(msg)
        }
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn describe(b: Option<u8>) -> String {
    match b {
        None => String::from("end of input"),
        Some(b) if b.is_ascii_graphic() => format!("'{}'", b as char),
        Some(b) => format!("byte 0x{b:02x}"),
    }
}
