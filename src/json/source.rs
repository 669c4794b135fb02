use std::io::{self, BufRead, BufReader, Read};

/// Where the JSON lexer gets its bytes from.
///
/// The lexer only ever looks one byte ahead, so a source needs nothing more
/// than `peek` and `take`.
pub trait ByteSource {
    /// The next byte, without consuming it. `None` at the end of input.
    fn peek(&mut self) -> Option<u8>;

    /// Consume and return the next byte. `None` at the end of input.
    fn take(&mut self) -> Option<u8>;

    /// The number of bytes consumed so far.
    fn position(&self) -> usize;

    /// The I/O error that ended the input early, if any.
    fn take_error(&mut self) -> Option<io::Error> {
        None
    }

    /// True if the input ended early with an error that hasn't been taken.
    fn has_error(&self) -> bool {
        false
    }
}

/// A byte source over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn peek(&mut self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn take(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn position(&self) -> usize {
        self.pos
    }
}

/// A byte source reading incrementally from any [`Read`].
///
/// Reads go through a [`BufReader`], so the wrapped reader sees a few large
/// reads rather than one per byte. An I/O error ends the input; the lexer
/// reports it through [`ByteSource::take_error`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: BufReader<R>,
    pos: usize,
    error: Option<io::Error>,
    failed: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(8 * 1024, reader)
    }

    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity.max(1), reader),
            pos: 0,
            error: None,
            failed: false,
        }
    }

    /// Unwrap the underlying reader. Buffered, unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn peek(&mut self) -> Option<u8> {
        if self.failed {
            return None;
        }

        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return buf.first().copied(),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    log::debug!("reader failed after {} bytes: {}", self.pos, err);
                    self.error = Some(err);
                    self.failed = true;
                    return None;
                }
            }
        }
    }

    fn take(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.reader.consume(1);
        self.pos += 1;
        Some(b)
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader {
        remaining: &'static [u8],
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining.is_empty() {
                return Err(io::Error::new(io::ErrorKind::Other, "connection reset"));
            }
            let n = buf.len().min(self.remaining.len());
            buf[..n].copy_from_slice(&self.remaining[..n]);
            self.remaining = &self.remaining[n..];
            Ok(n)
        }
    }

    #[test]
    fn slice_source_positions() {
        let mut source = SliceSource::new(b"ab");
        assert_eq!(source.peek(), Some(b'a'));
        assert_eq!(source.position(), 0);
        assert_eq!(source.take(), Some(b'a'));
        assert_eq!(source.take(), Some(b'b'));
        assert_eq!(source.position(), 2);
        assert_eq!(source.take(), None);
        assert_eq!(source.position(), 2);
    }

    #[test]
    fn reader_source_matches_slice_source() {
        let bytes = b"{\"a\": [1, 2]}";
        let mut slice = SliceSource::new(bytes);
        let mut reader = ReaderSource::with_capacity(3, &bytes[..]);

        loop {
            let expected = slice.take();
            assert_eq!(reader.take(), expected);
            assert_eq!(reader.position(), slice.position());
            if expected.is_none() {
                break;
            }
        }
    }

    #[test]
    fn reader_errors_end_the_input() {
        let mut source = ReaderSource::with_capacity(2, FailingReader { remaining: b"[1" });
        assert_eq!(source.take(), Some(b'['));
        assert_eq!(source.take(), Some(b'1'));
        assert_eq!(source.take(), None);
        assert_eq!(source.peek(), None);
        assert!(source.has_error());

        let err = source.take_error().unwrap();
        assert_eq!(err.to_string(), "connection reset");
        assert!(source.take_error().is_none());
    }
}
