use taskql_syntax::{DateTimeError, ParseError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("unknown pseudo-field {field:?}")]
    UnknownPseudoField { field: String },
    #[error("operator {op:?} is not supported for {field:?}")]
    UnknownOperator { field: String, op: String },
    #[error("invalid date {fragment:?}")]
    InvalidDate {
        fragment: String,
        #[source]
        source: DateTimeError,
    },
    #[error("invalid priority {fragment:?}")]
    InvalidPriority { fragment: String },
    #[error("saved search {name:?} does not exist")]
    UnknownSavedSearch { name: String },
    #[error("saved search {name:?} refers back to itself")]
    SavedSearchCycle { name: String },
    #[error(transparent)]
    Parse(#[from] ParseError),
}
