use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::error::PrepareError;
use super::table::Table;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MappingEntry {
    /// Source column names; the first one is renamed to the entry's key.
    pub features: Vec<String>,
}

/// Column dictionary: `{ "<new name>": { "features": ["<source name>", ...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    entries: BTreeMap<String, MappingEntry>,
}

impl ColumnMapping {
    pub fn from_json_str(json: &str) -> Result<Self, PrepareError> {
        let mapping: Self = serde_json::from_str(json)?;
        if let Some((key, _)) = mapping.entries.iter().find(|(_, e)| e.features.is_empty()) {
            return Err(PrepareError::EmptyMappingEntry { key: key.clone() });
        }
        Ok(mapping)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, PrepareError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PrepareError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let mapping = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        debug!(path = %path.display(), entries = mapping.len(), "Loaded column mapping");
        Ok(mapping)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MappingEntry> {
        self.entries.get(key)
    }

    /// Renames each entry's first source column to the entry key. Returns the number renamed.
    pub fn apply(&self, table: &mut Table) -> Result<usize, PrepareError> {
        let mut renamed = 0;
        for (key, entry) in &self.entries {
            let Some(source) = entry.features.first() else {
                continue;
            };
            if source != key && table.rename_column(source, key)? {
                renamed += 1;
            }
        }
        info!(renamed, entries = self.len(), "Applied column mapping");
        Ok(renamed)
    }

    /// Keeps only columns named by a mapping key, in table order. Returns the dropped names.
    ///
    /// Expects [`apply`](Self::apply) to have run first.
    pub fn filter(&self, table: &mut Table) -> Result<Vec<String>, PrepareError> {
        let keys: HashSet<&str> = self.entries.keys().map(String::as_str).collect();
        if !table.columns().iter().any(|c| keys.contains(c.name.as_str())) {
            return Err(PrepareError::NoMatchingColumns);
        }
        let dropped = table.retain_columns(|c| keys.contains(c.name.as_str()));
        info!(kept = table.width(), dropped = dropped.len(), "Filtered columns by mapping");
        Ok(dropped)
    }
}
