#![allow(dead_code)]
//! Shared helpers for `taskql-syntax` integration tests.

use jiff::Timestamp;
use taskql_syntax::*;

/// Monday 2026-10-19 09:00 UTC.
pub fn fixed_now() -> Timestamp {
    "2026-10-19T09:00:00Z".parse().unwrap()
}

pub fn parse_ok(input: &str) -> ParseResult {
    Parser::with_now(input, 0, fixed_now())
        .unwrap()
        .parse()
        .unwrap()
}

pub fn drain(input: &str) -> Vec<String> {
    let mut tokenizer = Tokenizer::new(input);
    std::iter::from_fn(|| {
        let token = tokenizer.next();
        (!token.is_empty()).then_some(token)
    })
    .collect()
}

pub fn as_simple(expr: &Expr) -> &SimpleExpr {
    match expr {
        Expr::Simple(simple) => simple,
        other => panic!("expected Simple, got: {other:?}"),
    }
}

pub fn include_names(result: &ParseResult) -> Vec<&str> {
    result
        .include
        .parts
        .iter()
        .map(|part| as_simple(part).name.as_str())
        .collect()
}
