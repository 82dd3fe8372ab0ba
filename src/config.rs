use crate::EngineError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use taskql_sql::Schema;
use taskql_syntax::fixed_zone;
use tracing::info;

/// Engine settings. Every field falls back to its default when missing from
/// the file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hours from UTC that date literals are read in.
    pub timezone_offset_hours: i8,
    pub schema: Schema,
}

impl EngineConfig {
    /// Loads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| EngineError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        fixed_zone(self.timezone_offset_hours).map_err(|_| EngineError::InvalidTimezone {
            hours: self.timezone_offset_hours,
        })?;
        Ok(())
    }
}
