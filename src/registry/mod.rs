use std::path::{Path, PathBuf};

/// Central registry of tables provisioned during this run.
///
/// Maps each table name to the file whose header defined the table's current
/// shape. In-memory only: after a restart every file takes the provisioning
/// path again, even when the warehouse-side table still exists.
pub struct TableRegistry {
    entries: Vec<RegistryEntry>,
}

struct RegistryEntry {
    table_name: String,
    defining_path: PathBuf,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The first registered name, in insertion order, that is a prefix of
    /// `candidate`, together with its defining file. Insertion order is the
    /// tie-break when several names qualify.
    pub fn find_prefix_match(&self, candidate: &str) -> Option<(&str, &Path)> {
        self.entries
            .iter()
            .find(|e| candidate.starts_with(&e.table_name))
            .map(|e| (e.table_name.as_str(), e.defining_path.as_path()))
    }

    /// Path of the file that defined `table_name`'s current header.
    pub fn defining_path(&self, table_name: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| e.table_name == table_name)
            .map(|e| e.defining_path.as_path())
    }

    /// Insert a table, or repoint an existing entry at a new defining file.
    /// Overwriting keeps the entry's original insertion position.
    pub fn put(&mut self, table_name: &str, defining_path: impl Into<PathBuf>) {
        let defining_path = defining_path.into();
        match self.entries.iter_mut().find(|e| e.table_name == table_name) {
            Some(entry) => entry.defining_path = defining_path,
            None => self.entries.push(RegistryEntry {
                table_name: table_name.to_string(),
                defining_path,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
