use jsonpath_stream::Query;

mod errors {
    use super::*;

    #[test]
    #[should_panic(expected = "expected '$', found 'f'")]
    fn missing_root() {
        Query::new("foo.bar").unwrap();
    }

    #[test]
    #[should_panic(expected = "recursive descent is not supported")]
    fn recursive_descent() {
        Query::new("$..foo").unwrap();
    }

    #[test]
    #[should_panic(expected = "union selectors are not supported")]
    fn union_selector() {
        Query::new("$[1,2]").unwrap();
    }

    #[test]
    #[should_panic(expected = "negative indices are not supported")]
    fn negative_index() {
        Query::new("$.a[-1]").unwrap();
    }

    #[test]
    #[should_panic(expected = "array indices with a leading zero are not allowed")]
    fn leading_zero() {
        Query::new("$[01]").unwrap();
    }

    #[test]
    #[should_panic(expected = "index out of range")]
    fn index_too_large() {
        Query::new("$[99999999999999999999]").unwrap();
    }

    #[test]
    #[should_panic(expected = "slice steps are not supported")]
    fn slice_step() {
        Query::new("$[1:5:2]").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty bracketed selection")]
    fn empty_brackets() {
        Query::new("$.a[]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unclosed bracketed selection")]
    fn unclosed_bracketed_selection() {
        Query::new("$[1").unwrap();
    }

    #[test]
    #[should_panic(expected = "unclosed string starting at index 2")]
    fn unclosed_string() {
        Query::new("$['foo").unwrap();
    }

    #[test]
    #[should_panic(expected = "invalid escape sequence")]
    fn invalid_escape() {
        Query::new(r"$['a\q']").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '.', '[' or '?(', found 'b'")]
    fn unknown_segment() {
        Query::new("$.a b").unwrap();
    }

    #[test]
    #[should_panic(expected = "unexpected trailing whitespace")]
    fn trailing_whitespace() {
        Query::new("$.a ").unwrap();
    }

    #[test]
    #[should_panic(expected = "unsupported operator '!', only '==' comparisons are allowed")]
    fn not_equal() {
        Query::new("$?(@.a != 1)").unwrap();
    }

    #[test]
    #[should_panic(expected = "unsupported operator '<', only '==' comparisons are allowed")]
    fn less_than() {
        Query::new("$[*]?(@.a < 1)").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '==', found ')'")]
    fn missing_comparison() {
        Query::new("$?(@.a)").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '==', found '='")]
    fn single_equals() {
        Query::new("$?(@.a = 1)").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected a literal or relative path, found '$'")]
    fn root_in_filter() {
        Query::new("$?(@.a == $.b)").unwrap();
    }

    #[test]
    #[should_panic(expected = "unknown keyword 'tru'")]
    fn unknown_keyword() {
        Query::new("$?(@.a == tru)").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected a filter expression")]
    fn empty_parens() {
        Query::new("$?()").unwrap();
    }

    #[test]
    #[should_panic(expected = "unclosed filter expression")]
    fn unclosed_filter() {
        Query::new("$?(@.a == 1").unwrap();
    }
}
