//! Backtracking grammar over the token stream.
//!
//! Every alternative runs through [`Parser::speculate`], which restores the
//! read cursor unless the rule reports success. Rules only touch the result
//! once they have matched completely, so a failed rule leaves no trace.

use crate::{
    ParseError,
    ast::{BoolExpr, Frequency, Priority, SimpleExpr},
    datetime::DateTimeParser,
    tokenizer::{Tokenizer, is_operator, is_tag_name, is_tag_start, is_word},
};
use jiff::Timestamp;
use std::collections::BTreeSet;
use tracing::debug;

/// Everything extracted from one query string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseResult {
    /// Search terms outside tag syntax.
    pub text: String,
    /// Conjunction of positive tag and pseudo-field tests.
    pub include: BoolExpr,
    /// Conjunction of tag tests that must not hold.
    pub exclude: BoolExpr,
    /// Bare `#:flag` options (`w/done`, `sub`, `ssort` ...).
    pub options: BTreeSet<String>,
    /// Name referenced by `#%name`.
    pub saved_search: Option<String>,
    /// Raw text after a `#+` separator.
    pub extra: Option<String>,
    /// Raw text after a `#!` separator.
    pub command: Option<String>,
    /// Tags to surface as extra result columns (`#tag?`, `#tag!`).
    pub show_cols: Vec<String>,
    /// Hour offset every time in this result was interpreted under.
    pub timezone: i8,
}

impl ParseResult {
    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains(name)
    }

    /// No tag, pseudo-field or free text constraint at all.
    pub fn is_unconstrained(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty() && self.text.is_empty()
    }
}

type Rule<'a> = fn(&mut Parser<'a>) -> bool;

pub struct Parser<'a> {
    tokens: Tokenizer<'a>,
    dates: DateTimeParser,
    result: ParseResult,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, timezone: i8) -> Result<Self, ParseError> {
        Self::with_now(input, timezone, Timestamp::now())
    }

    /// Parser whose relative dates (`#fri`, `#18:00`) resolve against `now`.
    pub fn with_now(input: &'a str, timezone: i8, now: Timestamp) -> Result<Self, ParseError> {
        let dates = DateTimeParser::with_now(timezone, now)
            .map_err(|_| ParseError::InvalidTimezone { hours: timezone })?;
        Ok(Self {
            tokens: Tokenizer::new(input),
            dates,
            result: ParseResult {
                timezone,
                ..ParseResult::default()
            },
        })
    }

    pub fn parse(mut self) -> Result<ParseResult, ParseError> {
        // Alternatives in priority order. Earlier entries win when the same
        // text could be read more than one way.
        let rules: [Rule<'a>; 9] = [
            Self::space,
            Self::saved_search,
            Self::option,
            Self::show_column,
            Self::exclusion,
            Self::priority,
            Self::when,
            Self::simple_tag,
            Self::free_text,
        ];

        while !self.speculate(Self::end_of_input) {
            // `free_text` always consumes a token, so the loop makes progress.
            let matched = rules.iter().any(|rule| self.speculate(*rule));
            debug_assert!(matched);
        }

        if let Some(position) = self.tokens.fault() {
            return Err(ParseError::Lex { position });
        }

        self.result.text = self.result.text.trim().to_string();
        self.result.extra = self.tokens.extra().map(str::to_string);
        self.result.command = self.tokens.command().map(str::to_string);
        debug!(result = ?self.result, "parsed query");
        Ok(self.result)
    }

    /// Runs `rule`, rewinding the read cursor unless it succeeded.
    pub fn speculate(&mut self, rule: impl FnOnce(&mut Self) -> bool) -> bool {
        let mark = self.tokens.position();
        if rule(self) {
            true
        } else {
            self.tokens.rewind(mark);
            false
        }
    }

    fn end_of_input(&mut self) -> bool {
        self.tokens.next().is_empty()
    }

    fn space(&mut self) -> bool {
        if self.tokens.next() != " " {
            return false;
        }
        let text = &mut self.result.text;
        if !text.is_empty() && !text.ends_with(' ') {
            text.push(' ');
        }
        true
    }

    /// `#%name`
    fn saved_search(&mut self) -> bool {
        if !matches!(self.tokens.next().as_str(), "#%" | "@%") {
            return false;
        }
        let name = self.tokens.next();
        if !is_tag_name(&name) {
            return false;
        }
        self.result.saved_search = Some(name);
        true
    }

    /// `#:flag` or `#:field<op>value`
    fn option(&mut self) -> bool {
        if !matches!(self.tokens.next().as_str(), "#:" | "@:") {
            return false;
        }
        let name = self.tokens.next();
        if !is_tag_name(&name) {
            return false;
        }

        let mut valued = None;
        self.speculate(|p| {
            let op = p.tokens.next();
            if !is_operator(&op) {
                return false;
            }
            let value = p.word_run();
            if value.is_empty() {
                return false;
            }
            valued = Some((op, value));
            true
        });

        match valued {
            None => {
                self.result.options.insert(name);
            }
            Some((op, value)) => {
                let expr = self.pseudo_field(&name, op, value);
                self.result.include.push(expr);
            }
        }
        true
    }

    /// Parses what it can up front; whatever stays unparsed is reported when
    /// the clause is compiled.
    fn pseudo_field(&self, name: &str, op: String, value: String) -> SimpleExpr {
        let mut expr = SimpleExpr::compare(format!(":{name}"), op, value);
        match name {
            "when" => expr.time = self.dates.parse(&expr.value).ok().map(|z| z.timestamp()),
            "priority" => {
                expr.priority = Priority::from_shorthand(&expr.value).or_else(|| {
                    expr.value
                        .parse::<i64>()
                        .ok()
                        .and_then(Priority::from_value)
                })
            }
            _ => {}
        }
        expr
    }

    /// `#name?`
    fn show_column(&mut self) -> bool {
        if !is_tag_start(&self.tokens.next()) {
            return false;
        }
        let name = self.tokens.next();
        if !is_tag_name(&name) || self.tokens.next() != "?" {
            return false;
        }
        self.result.show_cols.push(name);
        true
    }

    /// `-#name[...][?]`
    fn exclusion(&mut self) -> bool {
        if self.tokens.next() != "-" {
            return false;
        }
        let Some((expr, show)) = self.tag_expression() else {
            return false;
        };
        let asked = self.speculate(|p| p.tokens.next() == "?");
        if show || asked {
            self.result.show_cols.push(expr.name.clone());
        }
        self.result.exclude.push(expr);
        true
    }

    /// `#l`, `#now`, `#done` ...
    fn priority(&mut self) -> bool {
        if !is_tag_start(&self.tokens.next()) {
            return false;
        }
        let name = self.tokens.next();
        let Some(priority) = Priority::from_shorthand(&name) else {
            return false;
        };
        if !self.at_shorthand_boundary() {
            return false;
        }
        self.result.include.push(SimpleExpr::priority(priority, name));
        true
    }

    /// `#<date>[+<freq>]`
    fn when(&mut self) -> bool {
        if !is_tag_start(&self.tokens.next()) {
            return false;
        }
        let raw = self.tokens.next();
        if !is_tag_name(&raw) {
            return false;
        }
        let (date, frequency) = match raw.split_once('+') {
            Some((date, frequency)) => match frequency.parse::<Frequency>() {
                Ok(frequency) => (date, Some(frequency)),
                Err(()) => return false,
            },
            None => (raw.as_str(), None),
        };
        let Ok(time) = self.dates.parse(date) else {
            return false;
        };
        if !self.at_shorthand_boundary() {
            return false;
        }
        let expr = SimpleExpr::when(date, time.timestamp(), frequency);
        self.result.include.push(expr);
        true
    }

    /// `#name[!][<op>value]`
    fn simple_tag(&mut self) -> bool {
        let Some((expr, show)) = self.tag_expression() else {
            return false;
        };
        if show {
            self.result.show_cols.push(expr.name.clone());
        }
        self.result.include.push(expr);
        true
    }

    /// One raw token into the free text, with `@@`/`##` decoded. Stray
    /// operators and terminators are dropped; full-text search rejects them.
    fn free_text(&mut self) -> bool {
        let token = self.tokens.next();
        if is_operator(&token) || matches!(token.as_str(), "!" | "?") {
            return true;
        }
        let decoded = match token.as_str() {
            "@@" => "@",
            "##" => "#",
            other => other,
        };
        self.result.text.push_str(decoded);
        true
    }

    /// Shared body of the generic and the excluded tag forms. Returns the
    /// expression and whether the tag asked to be shown as a column.
    fn tag_expression(&mut self) -> Option<(SimpleExpr, bool)> {
        if !is_tag_start(&self.tokens.next()) {
            return None;
        }
        let name = self.tokens.next();
        if !starts_tag_name(&name) {
            return None;
        }
        let show = self.speculate(|p| p.tokens.next() == "!");

        let mut comparison = None;
        self.speculate(|p| {
            let op = p.tokens.next();
            if !is_operator(&op) {
                return false;
            }
            let value = p.word_run();
            if value.is_empty() {
                return false;
            }
            comparison = Some((op, value));
            true
        });

        let expr = match comparison {
            Some((op, value)) => SimpleExpr::compare(name, op, value),
            None => SimpleExpr::tag(name),
        };
        Some((expr, show))
    }

    /// Priority and date shorthands must not be followed by something that
    /// would turn them into a tag comparison.
    fn at_shorthand_boundary(&mut self) -> bool {
        let mark = self.tokens.position();
        let next = self.tokens.next();
        self.tokens.rewind(mark);
        !is_operator(&next) && next != "!" && next != "?"
    }

    /// Concatenates consecutive word tokens, e.g. a value like `12.5`.
    fn word_run(&mut self) -> String {
        let mut value = String::new();
        loop {
            let mark = self.tokens.position();
            let token = self.tokens.next();
            if !is_word(&token) {
                self.tokens.rewind(mark);
                return value;
            }
            value.push_str(&token);
        }
    }
}

/// A tag name has to open with a letter, digit or underscore.
fn starts_tag_name(token: &str) -> bool {
    is_tag_name(token)
        && token
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
}
