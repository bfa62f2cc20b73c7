//! Place to put utilities that are only used by tests.

use crate::collector::Collection;
use c_ast::ParsedHeader;
use c_ast::test_util::{header_from_json, loc};
use csbind_core::config::Config;
use serde_json::{Value, json};

const FILE: &str = "/inc/SDL3/SDL_test.h";

/// A header at a fixed path with the given top-level declarations and `#define` lines.
pub fn header(decls: Vec<Value>, defines: &str) -> ParsedHeader {
    let dump = format!("# 1 \"{FILE}\"\n{defines}");
    header_from_json(FILE, decls, &dump)
}

/// Collects a single header with the default configuration.
pub fn collect(decls: Vec<Value>, defines: &str) -> Collection {
    Collection::build(&Config::mock().collect, &[header(decls, defines)])
}

pub fn typedef(name: &str, qual_type: &str) -> Value {
    json!({ "kind": "TypedefDecl", "loc": loc(FILE), "name": name, "type": { "qualType": qual_type } })
}

pub fn field(name: &str, qual_type: &str) -> Value {
    json!({ "kind": "FieldDecl", "loc": loc(FILE), "name": name, "type": { "qualType": qual_type } })
}

/// A complete record. `tag` is `struct` or `union`; `inner` holds fields and nested records.
pub fn record(name: Option<&str>, tag: &str, inner: Vec<Value>) -> Value {
    json!({
        "kind": "RecordDecl", "loc": loc(FILE), "name": name, "tagUsed": tag,
        "completeDefinition": true, "inner": inner
    })
}

/// `struct name;`
pub fn forward(name: &str) -> Value {
    json!({ "kind": "RecordDecl", "loc": loc(FILE), "name": name, "tagUsed": "struct" })
}

/// An enum whose members have explicit values.
pub fn enumeration(name: Option<&str>, members: &[(&str, i64)]) -> Value {
    let inner: Vec<Value> = members
        .iter()
        .map(|(member, value)| {
            json!({
                "kind": "EnumConstantDecl", "loc": loc(FILE), "name": member,
                "type": { "qualType": "int" },
                "inner": [{ "kind": "ConstantExpr", "value": value.to_string() }]
            })
        })
        .collect();
    json!({ "kind": "EnumDecl", "loc": loc(FILE), "name": name, "inner": inner })
}

/// A function with type `qual_type` (such as `int (const char *)`) and named parameters.
pub fn function(name: &str, qual_type: &str, params: &[(Option<&str>, &str)]) -> Value {
    let inner: Vec<Value> = params
        .iter()
        .map(|(param, ty)| {
            json!({ "kind": "ParmVarDecl", "loc": loc(FILE), "name": param, "type": { "qualType": ty } })
        })
        .collect();
    json!({
        "kind": "FunctionDecl", "loc": loc(FILE), "name": name,
        "type": { "qualType": qual_type }, "inner": inner
    })
}
