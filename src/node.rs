use std::borrow::Cow;

use crate::{query::write_quoted_name, value::ValueType};

pub type NodeList = Vec<Node>;

/// A value matched by a query, with the location it was found at.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The value as compact JSON text.
    pub value: Vec<u8>,
    pub kind: ValueType,
    pub location: Vec<PathElement>,
    /// Position of the matching query among those evaluated together. Always
    /// zero for a single query.
    pub query: usize,
}

/// An array element index or object member name in a Node's location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    Index(usize),
    Name(String),
}

impl Node {
    pub fn new(value: Vec<u8>, kind: ValueType, location: Vec<PathElement>) -> Self {
        Node {
            value,
            kind,
            location,
            query: 0,
        }
    }

    pub fn value_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }

    /// The location of this node's value in the document as a normalized path.
    pub fn path(&self) -> String {
        let mut path = String::from("$");
        for element in &self.location {
            match element {
                PathElement::Index(i) => path.push_str(&format!("[{}]", i)),
                PathElement::Name(name) => {
                    path.push('[');
                    // writing to a String never fails
                    let _ = write_quoted_name(&mut path, name);
                    path.push(']');
                }
            }
        }
        path
    }
}
