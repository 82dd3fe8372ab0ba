//! # Tag query syntax
//!
//! `taskql-syntax` turns the free-form text typed into a task list's search box
//! into a [`ParseResult`]: free text, included and excluded tag tests, bare
//! options, a saved-search reference and the out-of-band `#+extra` / `#!command`
//! payloads. Lowering the result to SQL is the job of `taskql-sql`.
//!
//! ## Example
//! ```
//! use taskql_syntax::{parse_query, Expr, SimpleExpr};
//!
//! let parsed = parse_query("call bob #phone -#waiting #:w/done", 0).unwrap();
//! assert_eq!(parsed.text, "call bob");
//! assert_eq!(parsed.include.parts, vec![Expr::Simple(SimpleExpr::tag("phone"))]);
//! assert_eq!(parsed.exclude.parts, vec![Expr::Simple(SimpleExpr::tag("waiting"))]);
//! assert!(parsed.has_option("w/done"));
//! ```
//!
//! ## Grammar
//!
//! | Syntax              | Meaning                                               |
//! |---------------------|-------------------------------------------------------|
//! | `#tag` / `@tag`     | task carries `tag`                                    |
//! | `#tag<op>value`     | tag value comparison (`=`, `!=`, `<`, `>`, `<=`, `>=`) |
//! | `#tag!`, `#tag?`    | show `tag` as a column (`?` adds no filter)           |
//! | `-#tag`             | task does not carry `tag`                             |
//! | `#l`, `#now`, `#d`  | priority shorthand                                    |
//! | `#2026-10-20+weekly`| trigger date with optional repetition                 |
//! | `#:flag`            | option (`w/done`, `sub`, `ssort`)                     |
//! | `#:field<op>value`  | pseudo-field comparison (`#:id=3`)                    |
//! | `#%name`            | saved search                                          |
//! | `##`, `@@`          | literal `#` / `@` in the free text                    |
//! | `#+ ...`            | extra payload up to `#!`                              |
//! | `#! ...`            | command payload, rest of the input                    |

mod ast;
mod datetime;
mod parser;
mod tokenizer;

pub use ast::*;
pub use datetime::{DateTimeError, DateTimeParser, TRIGGER_AT_FORMAT, fixed_zone, format_trigger_at};
pub use parser::{ParseResult, Parser};
pub use tokenizer::{Mark, Tokenizer, is_tag_name};

/// Parses `input` with dates interpreted at `timezone` hours from UTC.
pub fn parse_query(input: &str, timezone: i8) -> Result<ParseResult, ParseError> {
    Parser::new(input, timezone)?.parse()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No tokenizer rule matched. The catch-all rule makes this unreachable
    /// for valid UTF-8, so seeing it means the rule table is broken.
    #[error("no token rule matched at byte {position}")]
    Lex { position: usize },
    #[error("timezone offset {hours}h is out of range")]
    InvalidTimezone { hours: i8 },
}
