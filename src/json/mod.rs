//! A streaming JSON tokenizer.
//!
//! [`JsonLexer`] pulls bytes from a [`ByteSource`] and yields [`JsonToken`]s one
//! at a time. Whitespace is skipped, nesting is validated with an explicit
//! stack of [`Container`] markers and the first error ends the token stream.
mod lexer;
mod source;
mod token;

pub use lexer::tokenize;
pub use lexer::JsonLexer;
pub use source::ByteSource;
pub use source::ReaderSource;
pub use source::SliceSource;
pub use token::Container;
pub use token::JsonToken;
pub use token::JsonTokenKind;
