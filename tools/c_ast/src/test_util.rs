//! Place to put utilities that are only used by tests.

use crate::{Clang, HeaderParser, ParseError, ParsedHeader, macros};
use clang_ast::Node;
use serde_json::{Map, Value, json};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// A header parser that can be programmed to have many different behaviors, for testing code that
/// calls `HeaderParser`'s methods without a clang installation.
pub struct MockParser {
    name: &'static str,
    #[allow(clippy::type_complexity)]
    parse: Box<dyn Fn(&Path) -> Result<ParsedHeader, ParseError>>,
    calls: RefCell<Vec<PathBuf>>,
}

impl Default for MockParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder-style API for configuring how this MockParser behaves.
///
/// # Example
/// ```
/// use c_ast::ParsedHeader;
/// use c_ast::test_util::MockParser;
/// let parser = MockParser::new().parse(|path| {
///     Ok(ParsedHeader { path: path.into(), ..Default::default() })
/// });
/// ```
impl MockParser {
    /// Creates a new MockParser that returns an empty header for every path.
    pub fn new() -> MockParser {
        MockParser {
            name: "mock_parser",
            parse: Box::new(|path| {
                Ok(ParsedHeader {
                    path: path.into(),
                    ..Default::default()
                })
            }),
            calls: RefCell::new(vec![]),
        }
    }

    /// Sets the return value of `HeaderParser::name`.
    pub fn name(mut self, name: &'static str) -> MockParser {
        self.name = name;
        self
    }

    /// Sets a closure to be run when `HeaderParser::parse` is called.
    pub fn parse<F: Fn(&Path) -> Result<ParsedHeader, ParseError> + 'static>(
        mut self,
        f: F,
    ) -> MockParser {
        self.parse = Box::new(f);
        self
    }

    /// The headers `parse` has been called with, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }
}

impl HeaderParser for MockParser {
    fn name(&self) -> &'static str {
        self.name
    }

    fn parse(&self, header: &Path) -> Result<ParsedHeader, ParseError> {
        self.calls.borrow_mut().push(header.to_path_buf());
        (self.parse)(header)
    }
}

/// A source location in `file`, in the shape clang writes it.
pub fn loc(file: &str) -> Value {
    json!({ "offset": 0, "file": file, "line": 1, "col": 1, "tokLen": 1 })
}

/// Decodes a hand-written AST. Every object with a `kind` gets a unique `id`, so tests only need
/// to spell out the fields the generator reads.
pub fn ast(mut value: Value) -> Node<Clang> {
    let mut next_id = 1;
    assign_ids(&mut value, &mut next_id);
    serde_json::from_value(value).expect("test AST does not decode")
}

fn assign_ids(value: &mut Value, next_id: &mut u64) {
    match value {
        Value::Object(map) => {
            if map.contains_key("kind") && !map.contains_key("id") {
                map.insert("id".into(), Value::String(format!("0x{next_id:x}")));
                *next_id += 1;
            }
            // clang_ast reads `kind` before anything else, and clang writes `id` first.
            let mut ordered = Map::new();
            for key in ["id", "kind"] {
                if let Some(value) = map.remove(key) {
                    ordered.insert(key.to_string(), value);
                }
            }
            ordered.append(map);
            *map = ordered;
            if let Some(inner) = map.get_mut("inner") {
                assign_ids(inner, next_id);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| assign_ids(item, next_id)),
        _ => {}
    }
}

/// Builds a header from a translation unit's top-level declarations and a `clang -E -dD` dump,
/// keeping everything regardless of location.
pub fn header_from_json(path: &str, decls: Vec<Value>, macro_dump: &str) -> ParsedHeader {
    let root = ast(json!({ "kind": "TranslationUnitDecl", "inner": decls }));
    ParsedHeader::from_ast(path, &root, macros::parse_macro_dump(macro_dump, None), None)
}
