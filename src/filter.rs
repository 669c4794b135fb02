use std::rc::Rc;

use crate::{
    errors::JSONPathError,
    eval::{Buffered, Matcher},
    json::JsonToken,
    query::{Operand, Predicate},
    value::Canonical,
};

impl Predicate {
    /// Test the buffered value `candidate`, which started at `index` in the
    /// document.
    ///
    /// Both operands must resolve to a value for the predicate to hold. A
    /// relative path resolves to the first value it matches.
    pub fn test(&self, candidate: &Rc<[JsonToken]>, index: usize) -> Result<bool, JSONPathError> {
        let Some(left) = self.left.resolve(candidate, index)? else {
            return Ok(false);
        };

        let Some(right) = self.right.resolve(candidate, index)? else {
            return Ok(false);
        };

        Ok(left == right)
    }
}

impl Operand {
    fn resolve(
        &self,
        candidate: &Rc<[JsonToken]>,
        index: usize,
    ) -> Result<Option<Canonical>, JSONPathError> {
        match self {
            Operand::Literal(value) => Ok(Some(value.clone())),
            Operand::Relative(operators) => {
                let tokens = Buffered::new(Rc::clone(candidate));
                let mut matcher = Matcher::single(tokens, operators, Vec::new());
                match matcher.advance()? {
                    Some(node) => Canonical::from_json(node.kind, &node.value, index).map(Some),
                    None => Ok(None),
                }
            }
        }
    }
}
