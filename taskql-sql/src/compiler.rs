use crate::{Clause, CompileContext, CompileError, Quoter, Schema};
use itertools::Itertools;
use jiff::Timestamp;
use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
};
use taskql_syntax::{BoolOp, DateTimeParser, ParseError, ParseResult, Parser, Priority, SimpleExpr};
use tracing::{debug, info};

/// Columns every compiled query selects.
pub const SELECT_COLUMNS: &str =
    "id, title_field, text_field, priority, repeat_field, trigger_at_field, sort";

/// Option that keeps completed tasks in the result.
pub const WITH_DONE_OPTION: &str = "w/done";
/// Option that orders by the manual sort key only.
pub const SORT_OPTION: &str = "ssort";

/// Source of stored query texts for `#%name`.
pub trait SavedSearches {
    fn lookup(&self, name: &str) -> Option<String>;
}

impl SavedSearches for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Lookup that knows no saved searches at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSavedSearches;

impl SavedSearches for NoSavedSearches {
    fn lookup(&self, _name: &str) -> Option<String> {
        None
    }
}

/// A compiled `SELECT` split into its clauses, plus what the front end needs
/// to render the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub select: String,
    /// `WHERE ...`, or empty when nothing is filtered.
    pub where_clause: String,
    pub group_by: String,
    pub order_by: String,
    /// First saved search that was substituted, if any.
    pub saved_search: Option<String>,
    pub options: BTreeSet<String>,
    pub show_cols: Vec<String>,
    /// Neither tag nor free-text constraints were given.
    pub is_empty: bool,
}

impl CompiledQuery {
    pub fn sql(&self) -> String {
        [
            &self.select,
            &self.where_clause,
            &self.group_by,
            &self.order_by,
        ]
        .into_iter()
        .filter(|clause| !clause.is_empty())
        .join(" ")
    }
}

pub struct SqlCompiler<'a> {
    quoter: &'a dyn Quoter,
    saved: &'a dyn SavedSearches,
    schema: &'a Schema,
    now: Option<Timestamp>,
}

impl<'a> SqlCompiler<'a> {
    pub fn new(quoter: &'a dyn Quoter, saved: &'a dyn SavedSearches, schema: &'a Schema) -> Self {
        Self {
            quoter,
            saved,
            schema,
            now: None,
        }
    }

    /// Pins the clock used for relative dates in saved searches and `:when`
    /// values.
    pub fn with_now(mut self, now: Timestamp) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> Timestamp {
        self.now.unwrap_or_else(Timestamp::now)
    }

    /// Parses and compiles `input` in one go.
    pub fn compile_text(
        &self,
        input: &str,
        timezone: i8,
        predicate: Option<&dyn Clause>,
    ) -> Result<CompiledQuery, CompileError> {
        let parsed = self.parse(input, timezone)?;
        self.compile(&parsed, predicate)
    }

    pub fn compile(
        &self,
        result: &ParseResult,
        predicate: Option<&dyn Clause>,
    ) -> Result<CompiledQuery, CompileError> {
        let (effective, saved_search) = self.resolve(result)?;
        let dates = DateTimeParser::with_now(effective.timezone, self.now()).map_err(|_| {
            ParseError::InvalidTimezone {
                hours: effective.timezone,
            }
        })?;
        let ctx = CompileContext {
            quoter: self.quoter,
            schema: self.schema,
            dates,
        };

        let mut clauses = Vec::new();
        let include_depth = usize::from(effective.include.op == BoolOp::Or);
        clauses.extend(effective.include.to_clause(&ctx, false, include_depth)?);
        if !effective.text.is_empty() {
            let search = SimpleExpr::compare(":search", "match", effective.text.as_str());
            clauses.extend(search.to_clause(&ctx, false, 0)?);
        }
        if wants_default_filter(&effective, predicate) {
            clauses.push(format!("priority <> {}", Priority::Done.value()));
        }
        // Each excluded test must fail on its own, so they stay AND-ed. Depth 1
        // keeps a negated conjunction's OR inside parentheses.
        for part in &effective.exclude.parts {
            clauses.extend(part.to_clause(&ctx, true, 1)?);
        }
        if let Some(predicate) = predicate {
            clauses.extend(predicate.to_clause(&ctx, false, 1)?);
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.iter().join(" AND "))
        };
        let order_by = if effective.has_option(SORT_OPTION) {
            "ORDER BY sort ASC"
        } else {
            "ORDER BY priority ASC, trigger_at_field ASC, sort DESC"
        };

        let compiled = CompiledQuery {
            select: format!("SELECT {SELECT_COLUMNS} FROM {}", self.schema.tasks_table),
            where_clause,
            group_by: "GROUP BY id".to_string(),
            order_by: order_by.to_string(),
            saved_search,
            options: effective.options.clone(),
            show_cols: effective.show_cols.clone(),
            is_empty: effective.is_unconstrained(),
        };
        debug!(sql = %compiled.sql(), "compiled query");
        Ok(compiled)
    }

    fn parse(&self, input: &str, timezone: i8) -> Result<ParseResult, ParseError> {
        Parser::with_now(input, timezone, self.now())?.parse()
    }

    /// Follows `#%name` references until a query without one is reached.
    fn resolve<'r>(
        &self,
        result: &'r ParseResult,
    ) -> Result<(Cow<'r, ParseResult>, Option<String>), CompileError> {
        let mut visited: Vec<String> = Vec::new();
        let mut current = Cow::Borrowed(result);
        while let Some(name) = current.saved_search.clone() {
            if visited.contains(&name) {
                return Err(CompileError::SavedSearchCycle { name });
            }
            let Some(text) = self.saved.lookup(&name) else {
                return Err(CompileError::UnknownSavedSearch { name });
            };
            info!(%name, %text, "substituting saved search");
            current = Cow::Owned(self.parse(&text, result.timezone)?);
            visited.push(name);
        }
        Ok((current, visited.into_iter().next()))
    }
}

/// Completed tasks are hidden unless asked for or priority is already
/// filtered on, by the query or by the predicate.
fn wants_default_filter(result: &ParseResult, predicate: Option<&dyn Clause>) -> bool {
    !result.has_option(WITH_DONE_OPTION)
        && !result.include.constrains_priority()
        && !predicate.is_some_and(|predicate| predicate.constrains_priority())
}
