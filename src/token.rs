use core::fmt;

pub const EOQ: char = '\0';

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    Eoq,
    Error { msg: Box<str> },

    Colon,
    Comma,
    Filter,
    Index { value: Box<str> },
    LBracket,
    Name { value: Box<str> },
    Plus,
    RBracket,
    Root,
    Wild,

    Current,
    DoubleQuoteString { value: Box<str> },
    Eq,
    False,
    Float { value: Box<str> },
    Int { value: Box<str> },
    LParen,
    Null,
    RParen,
    SingleQuoteString { value: Box<str> },
    True,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Eoq => f.write_str("'end of query'"),
            TokenType::Error { msg } => write!(f, "error: {}", *msg),
            TokenType::Colon => f.write_str("':'"),
            TokenType::Comma => f.write_str("','"),
            TokenType::Filter => f.write_str("'?'"),
            TokenType::Index { value } => write!(f, "'{}'", *value),
            TokenType::LBracket => f.write_str("'['"),
            TokenType::Name { value } => write!(f, "'{}'", *value),
            TokenType::Plus => f.write_str("'+'"),
            TokenType::RBracket => f.write_str("']'"),
            TokenType::Root => f.write_str("'$'"),
            TokenType::Wild => f.write_str("'*'"),
            TokenType::Current => f.write_str("'@'"),
            TokenType::DoubleQuoteString { value } => write!(f, "'{}'", *value),
            TokenType::Eq => f.write_str("'=='"),
            TokenType::False => f.write_str("'false'"),
            TokenType::Float { value } => write!(f, "{}", *value),
            TokenType::Int { value } => write!(f, "{}", *value),
            TokenType::LParen => f.write_str("'('"),
            TokenType::Null => f.write_str("'null'"),
            TokenType::RParen => f.write_str("')'"),
            TokenType::SingleQuoteString { value } => write!(f, "'{}'", *value),
            TokenType::True => f.write_str("'true'"),
        }
    }
}

/// A query token, as produced by the query lexer.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenType,
    pub index: usize,
}

impl Token {
    pub fn new(kind: TokenType, index: usize) -> Self {
        Self { kind, index }
    }
}
