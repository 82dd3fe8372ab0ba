use crate::EngineError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use taskql_sql::SavedSearches;
use taskql_syntax::is_tag_name;
use tracing::{info, warn};

/// Named query texts, referenced from queries as `#%name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedSearchStore {
    searches: BTreeMap<String, String>,
}

impl SavedSearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON object mapping names to query texts.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store: Self = serde_json::from_str(&text).map_err(|source| EngineError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(name) = store.searches.keys().find(|name| !is_tag_name(name)) {
            warn!(%name, path = %path.display(), "saved search name is not referencable");
        }
        info!(count = store.len(), path = %path.display(), "loaded saved searches");
        Ok(store)
    }

    /// Stores `query` under `name`, returning the text it replaced. The name
    /// has to be writable after `#%`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        query: impl Into<String>,
    ) -> Result<Option<String>, EngineError> {
        let name = name.into();
        if !is_tag_name(&name) {
            return Err(EngineError::InvalidSavedSearchName { name });
        }
        Ok(self.searches.insert(name, query.into()))
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.searches.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.searches.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.searches.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }
}

impl SavedSearches for SavedSearchStore {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replace_remove() {
        let mut store = SavedSearchStore::new();
        assert_eq!(store.insert("inbox", "#n").unwrap(), None);
        assert_eq!(store.insert("inbox", "#n #l").unwrap().as_deref(), Some("#n"));
        assert_eq!(store.lookup("inbox").as_deref(), Some("#n #l"));
        assert_eq!(store.remove("inbox").as_deref(), Some("#n #l"));
        assert!(store.is_empty());
    }

    #[test]
    fn names_must_be_referencable() {
        let mut store = SavedSearchStore::new();
        assert!(matches!(
            store.insert("two words", "#x"),
            Err(EngineError::InvalidSavedSearchName { .. })
        ));
        assert!(store.insert("", "#x").is_err());
    }

    #[test]
    fn names_are_sorted() {
        let mut store = SavedSearchStore::new();
        store.insert("work", "#w").unwrap();
        store.insert("home", "#h").unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), ["home", "work"]);
    }
}
