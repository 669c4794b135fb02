use std::fmt::{self, Write};

use crate::{
    env::Env,
    errors::JSONPathError,
    eval::Eval,
    lexer::lex,
    node::{NodeList, PathElement},
    parser::Parser,
    value::Canonical,
};

use lazy_static::lazy_static;

lazy_static! {
    static ref PARSER: Parser = Parser::new(Env::standard());
}

/// A compiled query: an ordered list of operators, applied one level of
/// nesting at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub operators: Vec<Operator>,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", display_operators(&self.operators))
    }
}

impl Query {
    pub fn new(expr: &str) -> Result<Self, JSONPathError> {
        Query::with_parser(expr, &PARSER)
    }

    /// Compile `expr` with a parser configured with non-default limits.
    pub fn with_parser(expr: &str, parser: &Parser) -> Result<Self, JSONPathError> {
        let query = Query {
            operators: parser.parse(lex(expr)?)?,
        };
        log::debug!("compiled {:?} to {}", expr, query);
        Ok(query)
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// True if this query can match at most one value.
    pub fn is_singular(&self) -> bool {
        self.operators
            .iter()
            .all(|op| matches!(op, Operator::Name(_) | Operator::Index(_)))
    }

    /// Collect every value matching this query in an in-memory document.
    pub fn find(&self, bytes: &[u8]) -> Result<NodeList, JSONPathError> {
        let mut it = Eval::from_bytes(bytes, self);
        let nodes: NodeList = it.by_ref().collect();
        match it.take_error() {
            Some(err) => Err(err),
            None => Ok(nodes),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Name(String),
    WildcardName,
    Index(usize),
    WildcardIndex,
    IndexRange { start: usize, end: Option<usize> },
    Filter(Predicate),
}

impl Operator {
    /// True if this operator selects the object member or array element at
    /// `element`.
    ///
    /// Filters test values rather than positions and are handled by the
    /// evaluator before any container is entered.
    pub fn selects(&self, element: &PathElement) -> bool {
        match (self, element) {
            (Operator::Name(name), PathElement::Name(key)) => name == key,
            (Operator::WildcardName, PathElement::Name(_)) => true,
            (Operator::Index(index), PathElement::Index(i)) => index == i,
            (Operator::WildcardIndex, PathElement::Index(_)) => true,
            (Operator::IndexRange { start, end }, PathElement::Index(i)) => {
                i >= start && end.map_or(true, |end| *i < end)
            }
            (Operator::Filter(_), _) => {
                debug_assert!(false, "filters don't select by position");
                false
            }
            _ => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Name(name) => {
                f.write_str("[")?;
                write_quoted_name(f, name)?;
                f.write_str("]")
            }
            Operator::WildcardName => f.write_str(".*"),
            Operator::Index(index) => write!(f, "[{index}]"),
            Operator::WildcardIndex => f.write_str("[*]"),
            Operator::IndexRange {
                start,
                end: Some(end),
            } => write!(f, "[{start}:{end}]"),
            Operator::IndexRange { start, end: None } => write!(f, "[{start}:]"),
            Operator::Filter(predicate) => write!(f, "?({predicate})"),
        }
    }
}

/// An equality test between two operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub left: Operand,
    pub right: Operand,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.left, self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Canonical),
    /// A path relative to the value being filtered, written `@...`.
    Relative(Vec<Operator>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{value}"),
            Operand::Relative(operators) => write!(f, "@{}", display_operators(operators)),
        }
    }
}

fn display_operators(operators: &[Operator]) -> String {
    operators
        .iter()
        .map(|op| op.to_string())
        .collect::<Vec<String>>()
        .join("")
}

/// Write `name` as a single-quoted string literal.
pub(crate) fn write_quoted_name(f: &mut impl Write, name: &str) -> fmt::Result {
    f.write_char('\'')?;
    for ch in name.chars() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{08}' => f.write_str("\\b")?,
            '\u{0C}' => f.write_str("\\f")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}
