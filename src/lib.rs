//! Task query engine: parses the search-box language and lowers it to SQL.
//!
//! ```
//! use taskql::{EngineConfig, QueryEngine};
//!
//! let engine = QueryEngine::new(EngineConfig::default()).unwrap();
//! let plan = engine.plan("#l #! archive").unwrap();
//! assert!(plan.sql.contains("WHERE priority = 2"));
//! assert_eq!(plan.command.as_deref(), Some("archive"));
//! ```

mod config;
mod engine;
mod error;
mod saved;

pub use config::EngineConfig;
pub use engine::{QueryEngine, QueryPlan};
pub use error::EngineError;
pub use saved::SavedSearchStore;

pub use taskql_sql::{
    Clause, CompileError, CompiledQuery, Quoter, SavedSearches, Schema, ScriptPredicate,
    SqliteQuoter, predicate,
};
pub use taskql_syntax::{ParseError, ParseResult, Priority, parse_query};
