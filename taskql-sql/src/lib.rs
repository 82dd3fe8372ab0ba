//! Lowers parsed task queries to SQLite `SELECT` statements.
//!
//! ```
//! use taskql_sql::{NoSavedSearches, Schema, SqlCompiler, SqliteQuoter};
//!
//! let schema = Schema::default();
//! let compiler = SqlCompiler::new(&SqliteQuoter, &NoSavedSearches, &schema);
//! let compiled = compiler.compile_text("#l", 0, None).unwrap();
//! assert_eq!(compiled.where_clause, "WHERE priority = 2");
//! ```

mod clause;
mod compiler;
mod error;
pub mod predicate;
mod quote;

pub use clause::{Clause, CompileContext, Schema};
pub use compiler::{
    CompiledQuery, NoSavedSearches, SELECT_COLUMNS, SORT_OPTION, SavedSearches, SqlCompiler,
    WITH_DONE_OPTION,
};
pub use error::CompileError;
pub use predicate::ScriptPredicate;
pub use quote::{Quoter, SqliteQuoter};
