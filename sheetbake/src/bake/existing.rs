use super::artifacts::ArtifactStore;
use crate::error::BakeError;
use std::collections::BTreeSet;

/// Row keys persisted by a previous bake for the sheet being processed. Loaded per sheet and cleared after it.
#[derive(Debug, Default)]
pub struct ExistingArtifacts {
    file_name: Option<String>,
    keys: BTreeSet<String>,
}

/// Outcome of matching current row keys against persisted ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowDiff {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    /// Persisted keys no current row claimed, to be deleted on save.
    pub removed: Vec<String>,
}

impl ExistingArtifacts {
    pub fn load(&mut self, store: &ArtifactStore, file_name: &str) -> Result<(), BakeError> {
        self.clear();
        self.keys = store.row_keys(file_name)?;
        self.file_name = Some(file_name.to_string());
        Ok(())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Consumes persisted keys matched by `current`; whatever is left is removed.
    pub fn diff<I: IntoIterator<Item = String>>(&mut self, current: I) -> RowDiff {
        let mut diff = RowDiff::default();
        for key in current {
            if self.keys.remove(&key) {
                diff.updated.push(key);
            } else {
                diff.created.push(key);
            }
        }
        diff.removed = std::mem::take(&mut self.keys).into_iter().collect();
        diff
    }

    pub fn clear(&mut self) {
        self.file_name = None;
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_consumes_matched_keys() {
        let mut existing = ExistingArtifacts { file_name: Some("Heroes".into()), keys: ["1", "2", "3"].into_iter().map(String::from).collect() };
        let diff = existing.diff(["3", "1", "4"].into_iter().map(String::from));
        assert_eq!(diff.updated, vec!["3".to_string(), "1".to_string()]);
        assert_eq!(diff.created, vec!["4".to_string()]);
        assert_eq!(diff.removed, vec!["2".to_string()]);
        assert!(existing.is_empty());
        existing.clear();
        assert_eq!(existing.file_name(), None);
    }
}
