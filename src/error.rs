use std::path::PathBuf;
use taskql_sql::CompileError;
use taskql_syntax::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("timezone offset {hours}h is out of range")]
    InvalidTimezone { hours: i8 },
    #[error("{name:?} cannot be used as a saved search name")]
    InvalidSavedSearchName { name: String },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}
