//! Streaming query evaluation.
//!
//! A [`Matcher`] pulls JSON tokens one at a time and keeps a stack of [`Frame`]s,
//! one for each open container on a branch that can still match. Members and
//! elements the current operator doesn't select are skipped token by token
//! without being materialized. Only two things are ever buffered: a matched
//! value, to build its compact text, and a value being tested by a filter.
use std::{collections::BTreeMap, io::Read, rc::Rc, slice};

use lazy_static::lazy_static;

use crate::{
    env::Env,
    errors::JSONPathError,
    json::{ByteSource, Container, JsonLexer, JsonToken, JsonTokenKind, ReaderSource, SliceSource},
    node::{Node, PathElement},
    query::{Operator, Query},
    unescape::unescape_lossy,
    value::ValueType,
};

lazy_static! {
    static ref ENV: Env = Env::standard();
}

/// Lifecycle of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalState {
    /// No token has been read yet.
    Ready,
    Running,
    /// The document was read to the end and every match has been yielded.
    Exhausted,
    /// The document was malformed or the token stream ended early.
    Failed,
}

/// The results of one or more queries over a JSON document, produced lazily.
///
/// Each call to `next` reads just enough of the document to find the next
/// match. When the document turns out to be malformed, iteration stops and the
/// error is available from [`Eval::error`]. Nodes yielded before the error are
/// still valid.
///
/// With several queries, the document is still read once. Nodes come out in
/// document order, and [`Node::query`] tells which query matched. A value
/// matched by more than one query is yielded once per query, in query order.
pub struct Eval<'q, S: ByteSource> {
    matcher: Matcher<'q, JsonLexer<S>>,
    state: EvalState,
    error: Option<JSONPathError>,
}

impl<'q, 'a> Eval<'q, SliceSource<'a>> {
    pub fn from_bytes(bytes: &'a [u8], query: &'q Query) -> Self {
        Eval::from_bytes_many(bytes, slice::from_ref(query))
    }

    pub fn from_bytes_many(bytes: &'a [u8], queries: &'q [Query]) -> Self {
        Eval::with_env(SliceSource::new(bytes), queries, &ENV)
    }
}

impl<'q, R: Read> Eval<'q, ReaderSource<R>> {
    pub fn from_reader(reader: R, query: &'q Query) -> Self {
        Eval::from_reader_many(reader, slice::from_ref(query))
    }

    pub fn from_reader_many(reader: R, queries: &'q [Query]) -> Self {
        let source = ReaderSource::with_capacity(ENV.read_buffer_size, reader);
        Eval::with_env(source, queries, &ENV)
    }

    /// Stop evaluating and recover the reader.
    pub fn into_inner(self) -> R {
        self.matcher.into_tokens().into_source().into_inner()
    }
}

impl<'q, S: ByteSource> Eval<'q, S> {
    pub fn with_env(source: S, queries: &'q [Query], env: &Env) -> Self {
        let lexer = JsonLexer::with_max_depth(source, env.max_depth);
        let paths: Rc<[&'q [Operator]]> = queries.iter().map(|q| q.operators.as_slice()).collect();
        let roots = (0..queries.len()).map(|query| Cursor { query, op: 0 }).collect();
        Eval {
            matcher: Matcher::new(lexer, paths, roots, Vec::new()),
            state: EvalState::Ready,
            error: None,
        }
    }

    pub fn state(&self) -> EvalState {
        self.state
    }

    /// The error that ended this evaluation, if any.
    pub fn error(&self) -> Option<&JSONPathError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<JSONPathError> {
        self.error.take()
    }
}

impl<S: ByteSource> Iterator for Eval<'_, S> {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            EvalState::Exhausted | EvalState::Failed => return None,
            EvalState::Ready => self.state = EvalState::Running,
            EvalState::Running => (),
        }

        match self.matcher.advance() {
            Ok(Some(node)) => Some(node),
            Ok(None) => {
                self.state = EvalState::Exhausted;
                None
            }
            Err(err) => {
                log::warn!("evaluation failed: {}", err);
                self.state = EvalState::Failed;
                self.error = Some(err);
                None
            }
        }
    }
}

/// Tokens of a value buffered for a filter, shared by the predicate and the
/// matchers that continue past it.
#[derive(Debug, Clone)]
pub(crate) struct Buffered {
    tokens: Rc<[JsonToken]>,
    pos: usize,
}

impl Buffered {
    pub(crate) fn new(tokens: Rc<[JsonToken]>) -> Self {
        Buffered { tokens, pos: 0 }
    }
}

impl Iterator for Buffered {
    type Item = JsonToken;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.get(self.pos)?.clone();
        self.pos += 1;
        Some(token)
    }
}

/// One query's progress along a branch of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    /// Position of the query in the matcher's path list.
    query: usize,
    /// Index of the next operator to apply.
    op: usize,
}

/// A container value whose tokens are being kept, because a query ends at it
/// or a filter has to test it.
#[derive(Debug)]
struct Recording {
    /// Document offset of the value's first token.
    index: usize,
    /// Position of the value's first token in the matcher's token log.
    from: usize,
    kind: ValueType,
    location: Vec<PathElement>,
    captures: Vec<usize>,
    filters: Vec<Cursor>,
}

/// An open container on a live branch.
#[derive(Debug)]
struct Frame {
    container: Container,
    /// Cursors choosing among this container's children.
    cursors: Vec<Cursor>,
    /// Position of the next array element.
    next_index: usize,
    /// The most recent object key, waiting for its value.
    key: Option<String>,
    /// Whether entering this container pushed onto the location.
    pushed: bool,
    recording: Option<Recording>,
}

pub(crate) struct Matcher<'q, T> {
    tokens: T,
    paths: Rc<[&'q [Operator]]>,
    /// Cursors applied to the root value.
    roots: Vec<Cursor>,
    frames: Vec<Frame>,
    location: Vec<PathElement>,
    /// Every token read since the outermost open recording started.
    log: Vec<JsonToken>,
    recordings: usize,
    /// Matches keyed by document offset, query and arrival. A match is held
    /// back while a value that started at or before it is still recording.
    pending: BTreeMap<(usize, usize, usize), Node>,
    arrivals: usize,
    failure: Option<JSONPathError>,
    root_seen: bool,
    done: bool,
    last_index: usize,
}

impl<'q, T: Iterator<Item = JsonToken>> Matcher<'q, T> {
    /// A matcher applying the cursors in `roots` to the single value in
    /// `tokens`, with locations reported relative to `location`.
    fn new(
        tokens: T,
        paths: Rc<[&'q [Operator]]>,
        roots: Vec<Cursor>,
        location: Vec<PathElement>,
    ) -> Self {
        Matcher {
            tokens,
            paths,
            roots,
            frames: Vec::new(),
            location,
            log: Vec::new(),
            recordings: 0,
            pending: BTreeMap::new(),
            arrivals: 0,
            failure: None,
            root_seen: false,
            done: false,
            last_index: 0,
        }
    }

    /// A matcher for one list of operators.
    pub(crate) fn single(tokens: T, operators: &'q [Operator], location: Vec<PathElement>) -> Self {
        Matcher::new(
            tokens,
            Rc::from(vec![operators]),
            vec![Cursor { query: 0, op: 0 }],
            location,
        )
    }

    pub(crate) fn into_tokens(self) -> T {
        self.tokens
    }

    /// Read tokens until the next match or the end of the document.
    pub(crate) fn advance(&mut self) -> Result<Option<Node>, JSONPathError> {
        Ok(self.next_match()?.map(|(_, node)| node))
    }

    /// Like [`Matcher::advance`], with the document offset of the match.
    fn next_match(&mut self) -> Result<Option<(usize, Node)>, JSONPathError> {
        loop {
            if let Some(found) = self.release() {
                return Ok(Some(found));
            }

            if let Some(err) = self.failure.take() {
                return Err(err);
            }

            if self.done {
                return Ok(None);
            }

            if let Err(err) = self.step() {
                // matches held back by a value the error cut short go out first
                self.failure = Some(err);
                self.done = true;
            }
        }
    }

    fn release(&mut self) -> Option<(usize, Node)> {
        let (&(index, _, _), _) = self.pending.first_key_value()?;
        let held = self.failure.is_none()
            && self
                .frames
                .iter()
                .find_map(|frame| frame.recording.as_ref())
                .is_some_and(|recording| recording.index <= index);

        if held {
            return None;
        }

        self.pending
            .pop_first()
            .map(|((index, _, _), node)| (index, node))
    }

    fn queue(&mut self, index: usize, node: Node) {
        self.pending.insert((index, node.query, self.arrivals), node);
        self.arrivals += 1;
    }

    fn next_token(&mut self) -> Option<JsonToken> {
        let token = self.tokens.next()?;
        if self.recordings > 0 {
            self.log.push(token.clone());
        }
        Some(token)
    }

    fn step(&mut self) -> Result<(), JSONPathError> {
        let token = match self.next_token() {
            Some(token) => token,
            None if self.root_seen && self.frames.is_empty() => {
                self.done = true;
                return Ok(());
            }
            None => {
                return Err(JSONPathError::evaluation(
                    String::from("token reader is not sending anymore tokens"),
                    self.last_index,
                ))
            }
        };

        self.last_index = token.index;

        match &token.kind {
            JsonTokenKind::Error { msg } => {
                Err(JSONPathError::structural(msg.to_string(), token.index))
            }
            JsonTokenKind::Eof => {
                if !self.frames.is_empty() || !self.root_seen {
                    return Err(JSONPathError::evaluation(
                        String::from("unexpected end of document"),
                        token.index,
                    ));
                }
                self.done = true;
                Ok(())
            }
            JsonTokenKind::Colon | JsonTokenKind::Comma => Ok(()),
            JsonTokenKind::Key => self.key(&token),
            JsonTokenKind::BraceRight | JsonTokenKind::BracketRight => self.close(&token),
            _ => self.value(token),
        }
    }

    fn key(&mut self, token: &JsonToken) -> Result<(), JSONPathError> {
        let frame = match self.frames.last_mut() {
            Some(frame) if frame.container == Container::Object => frame,
            _ => {
                return Err(JSONPathError::evaluation(
                    String::from("found a key outside of an object"),
                    token.index,
                ))
            }
        };

        // a key nobody selects on is never compared
        if !frame.cursors.is_empty() {
            let inner = token
                .value
                .get(1..token.value.len().saturating_sub(1))
                .unwrap_or_default();
            frame.key = Some(unescape_lossy(inner));
        }

        Ok(())
    }

    fn close(&mut self, token: &JsonToken) -> Result<(), JSONPathError> {
        let frame = self.frames.pop().ok_or_else(|| {
            JSONPathError::evaluation(
                format!("unbalanced {}", token.kind),
                token.index,
            )
        })?;

        if Container::closed_by(&token.kind) != Some(frame.container) {
            return Err(JSONPathError::evaluation(
                format!("mismatched {}", token.kind),
                token.index,
            ));
        }

        if let Some(recording) = frame.recording {
            self.recordings -= 1;
            let tokens: Rc<[JsonToken]> = self.log.get(recording.from..).unwrap_or_default().into();
            if self.recordings == 0 {
                self.log.clear();
            }
            self.finish(recording, tokens)?;
        }

        if frame.pushed {
            self.location.pop();
        }

        Ok(())
    }

    /// Handle the first token of a value: the root, an object member or an
    /// array element.
    fn value(&mut self, token: JsonToken) -> Result<(), JSONPathError> {
        let Some(frame) = self.frames.last_mut() else {
            if self.root_seen {
                return Err(JSONPathError::evaluation(
                    String::from("unexpected value after the root value"),
                    token.index,
                ));
            }
            self.root_seen = true;
            let roots = self.roots.clone();
            return self.enter(token, None, roots);
        };

        if frame.cursors.is_empty() {
            return self.skip(token);
        }

        let element = match frame.container {
            Container::Object => match frame.key.take() {
                Some(key) => PathElement::Name(key),
                None => {
                    return Err(JSONPathError::evaluation(
                        String::from("object member without a key"),
                        token.index,
                    ))
                }
            },
            Container::Array => {
                let index = frame.next_index;
                frame.next_index += 1;
                PathElement::Index(index)
            }
        };

        let paths = &self.paths;
        let cursors: Vec<Cursor> = frame
            .cursors
            .iter()
            .filter(|cursor| paths[cursor.query][cursor.op].selects(&element))
            .map(|cursor| Cursor {
                query: cursor.query,
                op: cursor.op + 1,
            })
            .collect();

        if cursors.is_empty() {
            log::trace!("skipping {:?}", element);
            return self.skip(token);
        }

        log::trace!("entering {:?} with {} cursor(s)", element, cursors.len());
        self.enter(token, Some(element), cursors)
    }

    /// Apply `cursors` to the value starting with `token`. Each cursor either
    /// ends at this value, stops at a filter over it, or carries on into its
    /// children.
    fn enter(
        &mut self,
        token: JsonToken,
        element: Option<PathElement>,
        cursors: Vec<Cursor>,
    ) -> Result<(), JSONPathError> {
        let kind = ValueType::of(&token).ok_or_else(|| {
            JSONPathError::evaluation(
                format!("expected a value, found {}", token.kind),
                token.index,
            )
        })?;

        let mut captures = Vec::new();
        let mut filters = Vec::new();
        let mut children = Vec::new();

        for cursor in cursors {
            match self.paths[cursor.query].get(cursor.op) {
                None => captures.push(cursor.query),
                Some(Operator::Filter(_)) => filters.push(cursor),
                Some(_) => children.push(cursor),
            }
        }

        let pushed = element.is_some();
        if let Some(element) = element {
            self.location.push(element);
        }

        let Some(container) = Container::opened_by(&token.kind) else {
            // a scalar, so cursors wanting its children find nothing
            if !captures.is_empty() || !filters.is_empty() {
                let recording = Recording {
                    index: token.index,
                    from: 0,
                    kind,
                    location: self.location.clone(),
                    captures,
                    filters,
                };
                self.finish(recording, Rc::from(vec![token]))?;
            }
            if pushed {
                self.location.pop();
            }
            return Ok(());
        };

        let recording = if captures.is_empty() && filters.is_empty() {
            None
        } else {
            let from = if self.recordings > 0 {
                // already logged by next_token
                self.log.len().saturating_sub(1)
            } else {
                self.log.push(token.clone());
                0
            };
            self.recordings += 1;
            Some(Recording {
                index: token.index,
                from,
                kind,
                location: self.location.clone(),
                captures,
                filters,
            })
        };

        self.frames.push(Frame {
            container,
            cursors: children,
            next_index: 0,
            key: None,
            pushed,
            recording,
        });

        Ok(())
    }

    /// Emit the captures of a recorded value and run its filters.
    fn finish(&mut self, recording: Recording, tokens: Rc<[JsonToken]>) -> Result<(), JSONPathError> {
        let Recording {
            index,
            kind,
            location,
            captures,
            filters,
            ..
        } = recording;

        if !captures.is_empty() {
            let value: Vec<u8> = tokens.iter().flat_map(|t| t.value.iter().copied()).collect();
            for query in captures {
                let mut node = Node::new(value.clone(), kind, location.clone());
                node.query = query;
                self.queue(index, node);
            }
        }

        let paths = Rc::clone(&self.paths);
        for cursor in filters {
            let Some(Operator::Filter(predicate)) = paths[cursor.query].get(cursor.op) else {
                continue;
            };

            let passed = predicate.test(&tokens, index)?;
            log::debug!("filter {} at {} is {}", predicate, index, passed);

            if passed {
                let mut matcher = Matcher::new(
                    Buffered::new(Rc::clone(&tokens)),
                    Rc::clone(&paths),
                    vec![Cursor {
                        query: cursor.query,
                        op: cursor.op + 1,
                    }],
                    location.clone(),
                );
                while let Some((at, node)) = matcher.next_match()? {
                    self.queue(at, node);
                }
            }
        }

        Ok(())
    }

    /// Read past the value starting with `first`.
    fn skip(&mut self, first: JsonToken) -> Result<(), JSONPathError> {
        if !first.is_open() {
            return Ok(());
        }

        let mut depth: usize = 1;
        let mut last_index = first.index;

        while depth > 0 {
            let token = self.next_token().ok_or_else(|| {
                JSONPathError::evaluation(
                    String::from("token reader is not sending anymore tokens"),
                    last_index,
                )
            })?;

            last_index = token.index;

            match &token.kind {
                JsonTokenKind::Error { msg } => {
                    return Err(JSONPathError::structural(msg.to_string(), token.index))
                }
                JsonTokenKind::Eof => {
                    return Err(JSONPathError::evaluation(
                        String::from("unexpected end of document"),
                        token.index,
                    ))
                }
                _ if token.is_open() => depth += 1,
                _ if token.is_close() => depth -= 1,
                _ => (),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::tokenize;

    fn matches(query: &str, doc: &str) -> Vec<(String, String)> {
        let query = Query::new(query).unwrap();
        let tokens: Rc<[JsonToken]> = tokenize(doc.as_bytes()).into();
        let mut matcher = Matcher::single(Buffered::new(tokens), &query.operators, Vec::new());
        let mut rv = Vec::new();
        while let Some(node) = matcher.advance().unwrap() {
            rv.push((node.path(), node.value_str().into_owned()));
        }
        rv
    }

    #[test]
    fn matcher_over_buffered_tokens() {
        assert_eq!(
            matches("$.a[1]", r#"{"a": [1, {"b": 2}]}"#),
            vec![(String::from("$['a'][1]"), String::from(r#"{"b":2}"#))]
        );
    }

    #[test]
    fn skipped_subtrees_leave_location_alone() {
        assert_eq!(
            matches("$.*.x", r#"{"a": {"y": [1, {"x": 0}]}, "b": {"x": true}}"#),
            vec![(String::from("$['b']['x']"), String::from("true"))]
        );
    }

    #[test]
    fn scalar_root_in_buffer() {
        let tokens: Rc<[JsonToken]> =
            vec![JsonToken::new(JsonTokenKind::Number, 0, b"1".to_vec().into())].into();
        let mut matcher = Matcher::single(Buffered::new(tokens), &[], Vec::new());
        let node = matcher.advance().unwrap().unwrap();
        assert_eq!(node.kind, ValueType::Number);
        assert_eq!(matcher.advance().unwrap(), None);
    }

    #[test]
    fn truncated_token_stream() {
        let query = Query::new("$.a").unwrap();
        let tokens: Rc<[JsonToken]> = tokenize(b"{\"a\":1").into();
        let mut matcher = Matcher::single(Buffered::new(tokens), &query.operators, Vec::new());
        assert!(matcher.advance().unwrap().is_some());
        assert!(matcher.advance().is_err());
    }

    #[test]
    fn state_transitions() {
        let query = Query::new("$[0]").unwrap();
        let mut it = Eval::from_bytes(b"[1, 2]", &query);
        assert_eq!(it.state(), EvalState::Ready);
        assert!(it.next().is_some());
        assert_eq!(it.state(), EvalState::Running);
        assert!(it.next().is_none());
        assert_eq!(it.state(), EvalState::Exhausted);
        assert!(it.error().is_none());
    }
}
