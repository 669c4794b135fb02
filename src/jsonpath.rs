use std::io::Read;

use crate::{errors::JSONPathError, eval::Eval, node::NodeList, query::Query};

/// Find all values matching the query `expr` in the JSON document `bytes`.
pub fn find(expr: &str, bytes: &[u8]) -> Result<NodeList, JSONPathError> {
    Query::new(expr)?.find(bytes)
}

/// Find all values matching the query `expr` in the JSON document read from
/// `reader`.
pub fn find_in_reader<R: Read>(expr: &str, reader: R) -> Result<NodeList, JSONPathError> {
    let query = Query::new(expr)?;
    let mut it = Eval::from_reader(reader, &query);
    let nodes: NodeList = it.by_ref().collect();
    match it.take_error() {
        Some(err) => Err(err),
        None => Ok(nodes),
    }
}
