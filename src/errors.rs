use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JSONPathErrorType {
    SyntaxError,
    StructuralError,
    EvaluationError,
}

impl fmt::Display for JSONPathErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JSONPathErrorType::SyntaxError => f.write_str("syntax error:"),
            JSONPathErrorType::StructuralError => f.write_str("structural error:"),
            JSONPathErrorType::EvaluationError => f.write_str("evaluation error:"),
        }
    }
}

/// An error raised while compiling a query or evaluating it against a JSON
/// document.
///
/// For syntax errors `index` is a byte offset into the query. For
/// structural and evaluation errors it is a byte offset into the document.
#[derive(Debug, Clone, PartialEq)]
pub struct JSONPathError {
    pub kind: JSONPathErrorType,
    pub msg: String,
    pub index: usize,
}

impl JSONPathError {
    pub fn new(kind: JSONPathErrorType, msg: String, index: usize) -> Self {
        Self { kind, msg, index }
    }

    pub fn syntax(msg: String, index: usize) -> Self {
        Self {
            kind: JSONPathErrorType::SyntaxError,
            msg,
            index,
        }
    }

    pub fn structural(msg: String, index: usize) -> Self {
        Self {
            kind: JSONPathErrorType::StructuralError,
            msg,
            index,
        }
    }

    pub fn evaluation(msg: String, index: usize) -> Self {
        Self {
            kind: JSONPathErrorType::EvaluationError,
            msg,
            index,
        }
    }
}

impl std::error::Error for JSONPathError {}

impl fmt::Display for JSONPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.msg, self.index)
    }
}
