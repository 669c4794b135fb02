//! Streaming JSONPath queries over JSON byte streams.
//!
//! A query is compiled once into a list of operators, then evaluated against
//! any number of documents. Evaluation pulls JSON tokens one at a time, so
//! large documents and network streams are never loaded whole. Only matched
//! values, and values under test by a filter, are buffered.
//!
//! ## Finding values
//!
//! ```
//! use jsonpath_stream::{errors::JSONPathError, find};
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let doc = br#"{"items": [{"name": "alpha", "value": 11}, {"name": "bravo", "value": 22}]}"#;
//!     let nodes = find(r#"$.items[*]?(@.name == "bravo").value"#, doc)?;
//!
//!     assert_eq!(nodes.len(), 1);
//!     assert_eq!(nodes[0].value_str(), "22");
//!     assert_eq!(nodes[0].path(), "$['items'][1]['value']");
//!     Ok(())
//! }
//! ```
//!
//! ## Lazy evaluation
//!
//! [`Eval`] is an iterator of [`Node`]s. It reads from a byte slice or from any
//! [`std::io::Read`], and stops reading as soon as the caller stops pulling.
//! A malformed document ends iteration; the error is kept on the [`Eval`].
//!
//! ```
//! use jsonpath_stream::{errors::JSONPathError, Eval, Query};
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let query = Query::new("$[*]")?;
//!     let mut it = Eval::from_reader(&b"[1, 2, 3}"[..], &query);
//!
//!     let values: Vec<String> = it.by_ref().map(|n| n.value_str().into_owned()).collect();
//!     assert_eq!(values, vec!["1", "2", "3"]);
//!     assert!(it.error().is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Several queries at once
//!
//! A slice of queries can share one pass over the document. Nodes come out in
//! document order and [`Node::query`] tells which query matched.
//!
//! ```
//! use jsonpath_stream::{errors::JSONPathError, Eval, Query};
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let queries = [Query::new("$.b")?, Query::new("$.a")?];
//!     let found: Vec<(usize, String)> = Eval::from_bytes_many(br#"{"a": 1, "b": 2}"#, &queries)
//!         .map(|n| (n.query, n.value_str().into_owned()))
//!         .collect();
//!
//!     assert_eq!(found, vec![(1, String::from("1")), (0, String::from("2"))]);
//!     Ok(())
//! }
//! ```
//!
//! ## Query syntax
//!
//! | Syntax                   | Selects                                        |
//! | ------------------------ | ---------------------------------------------- |
//! | `$`                      | the root value                                 |
//! | `.name`, `['name']`      | the object member `name`                       |
//! | `.*`                     | every object member                            |
//! | `[3]`                    | the array element at index 3                   |
//! | `[*]`                    | every array element                            |
//! | `[1:3]`, `[:3]`, `[1:]`  | array elements in a half-open range            |
//! | `?(@.a == "x")`          | the current value, if the comparison holds     |
//!
//! Note that a [`Query`] is displayed in its canonical form when printed.
//!
//! ```text
//! $['items'][*]?(@['name'] == "bravo")['value']
//! ```
pub mod env;
pub mod errors;
pub mod eval;
pub mod filter;
pub mod json;
pub mod jsonpath;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod query;
mod token;
mod unescape;
pub mod value;

pub use env::Env;
pub use errors::JSONPathError;
pub use errors::JSONPathErrorType;
pub use eval::Eval;
pub use eval::EvalState;
pub use jsonpath::find;
pub use jsonpath::find_in_reader;
pub use node::Node;
pub use node::NodeList;
pub use node::PathElement;
pub use parser::Parser;
pub use query::Operator;
pub use query::Query;
