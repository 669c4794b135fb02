use std::fmt;

use crate::{
    errors::JSONPathError,
    json::{JsonToken, JsonTokenKind},
    unescape::unescape_lossy,
};

/// The JSON type of a matched value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl ValueType {
    /// The type of the value starting with `token`, if a value can start there.
    pub fn of(token: &JsonToken) -> Option<Self> {
        match token.kind {
            JsonTokenKind::BraceLeft => Some(ValueType::Object),
            JsonTokenKind::BracketLeft => Some(ValueType::Array),
            JsonTokenKind::String => Some(ValueType::String),
            JsonTokenKind::Number => Some(ValueType::Number),
            JsonTokenKind::Bool => Some(ValueType::Bool),
            JsonTokenKind::Null => Some(ValueType::Null),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Object => f.write_str("object"),
            ValueType::Array => f.write_str("array"),
            ValueType::String => f.write_str("string"),
            ValueType::Number => f.write_str("number"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Null => f.write_str("null"),
        }
    }
}

/// A JSON number reduced to sign, significant digits and a decimal exponent.
///
/// The value is `0.DIGITS * 10^exponent`. Zero has no digits, so `0`, `-0.0`
/// and `0e10` are all equal, as are `1`, `1.0`, `10e-1` and `0.1e1`. The
/// source text is kept for display only.
#[derive(Debug, Clone)]
pub struct Number {
    negative: bool,
    digits: String,
    exponent: i64,
    text: String,
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.negative == other.negative
            && self.digits == other.digits
            && self.exponent == other.exponent
    }
}

impl Eq for Number {}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Number {
    /// Parse the text of a JSON number. Returns `None` if `raw` is not one.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let text = String::from_utf8(raw.to_vec()).ok()?;
        let (negative, rest) = match raw.split_first() {
            Some((b'-', rest)) => (true, rest),
            _ => (false, raw),
        };

        let int_len = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if int_len == 0 {
            return None;
        }
        let (int_part, rest) = rest.split_at(int_len);

        let (frac_part, rest) = match rest.split_first() {
            Some((b'.', rest)) => {
                let frac_len = rest.iter().take_while(|b| b.is_ascii_digit()).count();
                if frac_len == 0 {
                    return None;
                }
                rest.split_at(frac_len)
            }
            _ => (&rest[..0], rest),
        };

        let exponent = match rest.split_first() {
            None => 0,
            Some((b'e' | b'E', rest)) => parse_exponent(rest)?,
            Some(_) => return None,
        };

        let mut point = int_part.len() as i64;
        let mut digits: Vec<u8> = int_part.iter().chain(frac_part).copied().collect();

        let leading = digits.iter().take_while(|b| **b == b'0').count();
        digits.drain(..leading);
        point -= leading as i64;

        while digits.last() == Some(&b'0') {
            digits.pop();
        }

        if digits.is_empty() {
            return Some(Number {
                negative: false,
                digits: String::new(),
                exponent: 0,
                text,
            });
        }

        Some(Number {
            negative,
            digits: String::from_utf8(digits).ok()?,
            exponent: point.saturating_add(exponent),
            text,
        })
    }
}

fn parse_exponent(raw: &[u8]) -> Option<i64> {
    let (negative, digits) = match raw.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, raw),
    };

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let magnitude = digits.iter().fold(0_i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });

    Some(if negative { -magnitude } else { magnitude })
}

/// The form in which values are compared by filter predicates.
///
/// Comparison is type-aware: a string never equals a number with the same text.
#[derive(Debug, Clone, PartialEq)]
pub enum Canonical {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
    /// Objects and arrays, compared by their compact text.
    Compound(ValueType, Vec<u8>),
}

impl Canonical {
    /// Canonicalize a value given its type and its compact JSON text.
    pub fn from_json(kind: ValueType, raw: &[u8], index: usize) -> Result<Self, JSONPathError> {
        match kind {
            ValueType::String => {
                let inner = raw
                    .get(1..raw.len().saturating_sub(1))
                    .unwrap_or_default();
                Ok(Canonical::String(unescape_lossy(inner)))
            }
            ValueType::Number => Number::parse(raw).map(Canonical::Number).ok_or_else(|| {
                JSONPathError::structural(
                    format!("invalid number '{}'", String::from_utf8_lossy(raw)),
                    index,
                )
            }),
            ValueType::Bool => Ok(Canonical::Bool(raw == b"true")),
            ValueType::Null => Ok(Canonical::Null),
            ValueType::Object | ValueType::Array => Ok(Canonical::Compound(kind, raw.to_vec())),
        }
    }
}

impl fmt::Display for Canonical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Canonical::String(value) => {
                f.write_str("\"")?;
                for ch in value.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        '\u{08}' => f.write_str("\\b")?,
                        '\u{0C}' => f.write_str("\\f")?,
                        c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Canonical::Number(number) => write!(f, "{number}"),
            Canonical::Bool(value) => write!(f, "{value}"),
            Canonical::Null => f.write_str("null"),
            Canonical::Compound(_, raw) => f.write_str(&String::from_utf8_lossy(raw)),
        }
    }
}
