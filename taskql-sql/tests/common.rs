#![allow(dead_code)]
//! Shared helpers for `taskql-sql` integration tests.

use jiff::Timestamp;
use std::collections::BTreeMap;
use taskql_sql::*;

pub fn fixed_now() -> Timestamp {
    "2026-10-19T10:00:00Z".parse().unwrap()
}

pub fn tag(name: &str) -> String {
    format!("id IN (SELECT id FROM columns WHERE name = '{name}')")
}

pub fn compile_with(
    saved: &BTreeMap<String, String>,
    input: &str,
    predicate: Option<&dyn Clause>,
) -> Result<CompiledQuery, CompileError> {
    let schema = Schema::default();
    SqlCompiler::new(&SqliteQuoter, saved, &schema)
        .with_now(fixed_now())
        .compile_text(input, 0, predicate)
}

pub fn compile_ok(input: &str) -> CompiledQuery {
    compile_with(&BTreeMap::new(), input, None).unwrap()
}

pub fn compile_err(input: &str) -> CompileError {
    compile_with(&BTreeMap::new(), input, None).unwrap_err()
}

pub fn saved(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(name, text)| (name.to_string(), text.to_string()))
        .collect()
}
