use crate::{EngineConfig, EngineError, SavedSearchStore};
use jiff::Timestamp;
use serde::Serialize;
use std::collections::BTreeSet;
use taskql_sql::{Clause, Quoter, SqlCompiler, SqliteQuoter};
use taskql_syntax::{ParseResult, Parser};
use tracing::debug;

/// What a front end needs to run a query and render its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    pub sql: String,
    /// Text after `#!`, for the caller to act on.
    pub command: Option<String>,
    /// Text after `#+`, for the scripting hook.
    pub extra: Option<String>,
    pub saved_search: Option<String>,
    pub is_empty: bool,
    pub show_cols: Vec<String>,
    pub options: BTreeSet<String>,
    pub timezone: i8,
}

/// Parses and compiles queries against one configuration and one set of
/// saved searches.
pub struct QueryEngine {
    config: EngineConfig,
    saved: SavedSearchStore,
    quoter: Box<dyn Quoter>,
    now: Option<Timestamp>,
}

impl QueryEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            saved: SavedSearchStore::default(),
            quoter: Box::new(SqliteQuoter),
            now: None,
        })
    }

    pub fn with_saved_searches(mut self, saved: SavedSearchStore) -> Self {
        self.saved = saved;
        self
    }

    pub fn with_quoter(mut self, quoter: impl Quoter + 'static) -> Self {
        self.quoter = Box::new(quoter);
        self
    }

    /// Freezes the clock relative dates are resolved against.
    pub fn with_now(mut self, now: Timestamp) -> Self {
        self.now = Some(now);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn saved_searches(&self) -> &SavedSearchStore {
        &self.saved
    }

    pub fn saved_searches_mut(&mut self) -> &mut SavedSearchStore {
        &mut self.saved
    }

    fn now(&self) -> Timestamp {
        self.now.unwrap_or_else(Timestamp::now)
    }

    pub fn parse(&self, query: &str) -> Result<ParseResult, EngineError> {
        let parser = Parser::with_now(query, self.config.timezone_offset_hours, self.now())?;
        Ok(parser.parse()?)
    }

    pub fn plan(&self, query: &str) -> Result<QueryPlan, EngineError> {
        self.plan_with(query, None)
    }

    /// Like [`QueryEngine::plan`], AND-ing `predicate` into the filter.
    pub fn plan_with(
        &self,
        query: &str,
        predicate: Option<&dyn Clause>,
    ) -> Result<QueryPlan, EngineError> {
        let parsed = self.parse(query)?;
        let compiled = SqlCompiler::new(self.quoter.as_ref(), &self.saved, &self.config.schema)
            .with_now(self.now())
            .compile(&parsed, predicate)?;
        let plan = QueryPlan {
            sql: compiled.sql(),
            command: parsed.command,
            extra: parsed.extra,
            saved_search: compiled.saved_search,
            is_empty: compiled.is_empty,
            show_cols: compiled.show_cols,
            options: compiled.options,
            timezone: parsed.timezone,
        };
        debug!(query, ?plan, "planned query");
        Ok(plan)
    }
}
