/// Limits shared by the query parser and the evaluator.
#[derive(Debug, Clone)]
pub struct Env {
    /// The largest array index a query may name.
    pub max_index: usize,
    /// The deepest nesting of objects and arrays a document may have.
    pub max_depth: usize,
    /// Capacity of the buffer placed in front of a reader source.
    pub read_buffer_size: usize,
}

impl Env {
    pub fn standard() -> Self {
        Env {
            max_index: usize::try_from(2_u64.pow(53) - 1).unwrap_or(usize::MAX),
            max_depth: 512,
            read_buffer_size: 8 * 1024,
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Env::standard()
    }
}
