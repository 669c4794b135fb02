use core::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum JsonTokenKind {
    Eof,
    Error { msg: Box<str> },

    BraceLeft,
    BraceRight,
    BracketLeft,
    BracketRight,
    Colon,
    Comma,
    Number,
    String,
    Null,
    Key,
    Bool,
}

impl fmt::Display for JsonTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonTokenKind::Eof => f.write_str("EOF"),
            JsonTokenKind::Error { msg } => write!(f, "ERROR: {}", *msg),
            JsonTokenKind::BraceLeft => f.write_str("'{'"),
            JsonTokenKind::BraceRight => f.write_str("'}'"),
            JsonTokenKind::BracketLeft => f.write_str("'['"),
            JsonTokenKind::BracketRight => f.write_str("']'"),
            JsonTokenKind::Colon => f.write_str("':'"),
            JsonTokenKind::Comma => f.write_str("','"),
            JsonTokenKind::Number => f.write_str("NUMBER"),
            JsonTokenKind::String => f.write_str("STRING"),
            JsonTokenKind::Null => f.write_str("NULL"),
            JsonTokenKind::Key => f.write_str("KEY"),
            JsonTokenKind::Bool => f.write_str("BOOL"),
        }
    }
}

/// A JSON token, as produced by [`JsonLexer`](super::JsonLexer).
///
/// `value` holds the token's bytes exactly as they appear in the document,
/// including the quotes and escape sequences of strings and keys. Concatenating
/// the values of a run of tokens gives compact JSON.
#[derive(Debug, PartialEq, Clone)]
pub struct JsonToken {
    pub kind: JsonTokenKind,
    pub index: usize,
    pub value: Box<[u8]>,
}

impl JsonToken {
    pub fn new(kind: JsonTokenKind, index: usize, value: Box<[u8]>) -> Self {
        Self { kind, index, value }
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.kind,
            JsonTokenKind::BraceLeft | JsonTokenKind::BracketLeft
        )
    }

    pub fn is_close(&self) -> bool {
        matches!(
            self.kind,
            JsonTokenKind::BraceRight | JsonTokenKind::BracketRight
        )
    }
}

/// The kind of container a nesting stack entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Object,
    Array,
}

impl Container {
    /// The container closed by `kind`, if `kind` is a closing token.
    pub fn closed_by(kind: &JsonTokenKind) -> Option<Self> {
        match kind {
            JsonTokenKind::BraceRight => Some(Container::Object),
            JsonTokenKind::BracketRight => Some(Container::Array),
            _ => None,
        }
    }

    /// The container opened by `kind`, if `kind` is an opening token.
    pub fn opened_by(kind: &JsonTokenKind) -> Option<Self> {
        match kind {
            JsonTokenKind::BraceLeft => Some(Container::Object),
            JsonTokenKind::BracketLeft => Some(Container::Array),
            _ => None,
        }
    }
}
