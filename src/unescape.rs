use core::str;

use crate::errors::JSONPathError;

/// Decode the JSON escape sequences in the contents of a string literal,
/// without its surrounding quotes.
///
/// `offset` is the position of `value` in its source and is only used for
/// error reporting.
pub fn unescape(value: &[u8], offset: usize) -> Result<String, JSONPathError> {
    let length = value.len();
    let mut rv: Vec<u8> = Vec::with_capacity(length);
    let mut index: usize = 0;

    while index < length {
        let b = value[index];
        if b == b'\\' {
            index += 1;
            match value.get(index) {
                Some(b'"') => rv.push(b'"'),
                Some(b'\\') => rv.push(b'\\'),
                Some(b'/') => rv.push(b'/'),
                Some(b'b') => rv.push(b'\x08'),
                Some(b'f') => rv.push(b'\x0C'),
                Some(b'n') => rv.push(b'\n'),
                Some(b'r') => rv.push(b'\r'),
                Some(b't') => rv.push(b'\t'),
                Some(b'u') => {
                    let (code_point, end) = decode_hex_char(value, index, offset)?;
                    encode_code_point(code_point, &mut rv, offset + index)?;
                    index = end;
                }
                _ => {
                    return Err(JSONPathError::syntax(
                        String::from("unknown escape sequence"),
                        offset + index,
                    ))
                }
            }
        } else {
            rv.push(b);
        }
        index += 1;
    }

    String::from_utf8(rv)
        .map_err(|_| JSONPathError::syntax(String::from("invalid UTF-8 in string"), offset))
}

/// Decode the escape sequences of a document string the JSON lexer has
/// already accepted.
///
/// Never fails: lone surrogates become U+FFFD and invalid UTF-8 is replaced
/// the way [`String::from_utf8_lossy`] does.
pub fn unescape_lossy(value: &[u8]) -> String {
    let length = value.len();
    let mut rv: Vec<u8> = Vec::with_capacity(length);
    let mut index: usize = 0;

    while index < length {
        let b = value[index];
        if b != b'\\' {
            rv.push(b);
            index += 1;
            continue;
        }

        match value.get(index + 1) {
            Some(b'u') => {
                let (ch, end) = decode_hex_char_lossy(value, index + 1);
                let mut utf8 = [0; 4];
                rv.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                index = end + 1;
            }
            Some(&escaped) => {
                rv.push(match escaped {
                    b'b' => b'\x08',
                    b'f' => b'\x0C',
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    other => other,
                });
                index += 2;
            }
            None => {
                rv.push(b);
                index += 1;
            }
        }
    }

    match String::from_utf8(rv) {
        Ok(s) => s,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

/// Like [`decode_hex_char`], substituting U+FFFD for anything that isn't a
/// valid code point or surrogate pair.
fn decode_hex_char_lossy(bytes: &[u8], index: usize) -> (char, usize) {
    let hex = |at: usize| {
        bytes
            .get(at..at + 4)
            .and_then(|digits| str::from_utf8(digits).ok())
            .and_then(|digits| u32::from_str_radix(digits, 16).ok())
    };

    let Some(code_point) = hex(index + 1) else {
        return (char::REPLACEMENT_CHARACTER, (index + 4).min(bytes.len() - 1));
    };

    if is_high_surrogate(code_point) && bytes.get(index + 5..index + 7) == Some(&b"\\u"[..]) {
        if let Some(low) = hex(index + 7).filter(|low| is_low_surrogate(*low)) {
            let code_point = 0x10000 + (((code_point & 0x03FF) << 10) | (low & 0x03FF));
            let ch = char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER);
            return (ch, index + 10);
        }
    }

    let ch = char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER);
    (ch, index + 4)
}

/// Decode `\uXXXX`, or a surrogate pair `\uXXXX\uXXXX`, where `index` points at
/// the first `u`. Returns the code point and the index of its last hex digit.
fn decode_hex_char(
    bytes: &[u8],
    index: usize,
    offset: usize,
) -> Result<(u32, usize), JSONPathError> {
    let length = bytes.len();

    if index + 4 >= length {
        return Err(JSONPathError::syntax(
            String::from("incomplete escape sequence"),
            offset + index,
        ));
    }

    let index = index + 1; // move past 'u'
    let mut code_point = parse_hex_digits(&bytes[index..index + 4], offset + index)?;

    if is_low_surrogate(code_point) {
        return Err(JSONPathError::syntax(
            String::from("unexpected low surrogate code point"),
            offset + index,
        ));
    }

    if is_high_surrogate(code_point) {
        if !(index + 9 < length && bytes[index + 4] == b'\\' && bytes[index + 5] == b'u') {
            return Err(JSONPathError::syntax(
                String::from("incomplete escape sequence"),
                offset + index,
            ));
        }

        let low_surrogate = parse_hex_digits(&bytes[index + 6..index + 10], offset + index + 6)?;

        if !is_low_surrogate(low_surrogate) {
            return Err(JSONPathError::syntax(
                String::from("unexpected code point"),
                offset + index + 6,
            ));
        }

        code_point = 0x10000 + (((code_point & 0x03FF) << 10) | (low_surrogate & 0x03FF));
        return Ok((code_point, index + 9));
    }

    Ok((code_point, index + 3))
}

fn parse_hex_digits(digits: &[u8], offset: usize) -> Result<u32, JSONPathError> {
    str::from_utf8(digits)
        .ok()
        .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|s| u32::from_str_radix(s, 16).ok())
        .ok_or_else(|| JSONPathError::syntax(String::from("invalid escape sequence"), offset))
}

fn encode_code_point(
    code_point: u32,
    buf: &mut Vec<u8>,
    offset: usize,
) -> Result<(), JSONPathError> {
    let ch = char::from_u32(code_point)
        .ok_or_else(|| JSONPathError::syntax(String::from("invalid character"), offset))?;
    let mut utf8 = [0; 4];
    buf.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    Ok(())
}

fn is_high_surrogate(code_point: u32) -> bool {
    (0xD800..=0xDBFF).contains(&code_point)
}

fn is_low_surrogate(code_point: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&code_point)
}
