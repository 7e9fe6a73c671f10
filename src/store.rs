//! JSON persistence for canonical metadata records.
//!
//! Records are written one file per dashboard/flow, keyed by a caller-supplied
//! identifier: `<metadata_dir>/workbooks/<key>.json` and
//! `<metadata_dir>/prep_flows/<key>.json`. Written offline by the parse
//! commands, read online by the assembly path.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::{DashboardKind, DashboardMetadata};

/// File-backed store of canonical metadata records.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    metadata_dir: PathBuf,
}

impl MetadataStore {
    pub fn new(metadata_dir: &Path) -> MetadataStore {
        MetadataStore {
            metadata_dir: metadata_dir.to_path_buf(),
        }
    }

    fn record_path(&self, key: &str, kind: DashboardKind) -> PathBuf {
        self.metadata_dir
            .join(kind.subdir())
            .join(format!("{}.json", key))
    }

    /// Writes a record as pretty-printed JSON, creating parent directories.
    /// Returns the path written.
    pub fn save(&self, metadata: &DashboardMetadata, key: &str) -> Result<PathBuf> {
        let path = self.record_path(key, metadata.kind());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(metadata)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write metadata file: {}", path.display()))?;
        Ok(path)
    }

    /// Loads the record for `key`, or `None` when it is absent or unreadable.
    /// A lookup miss is not an error — the assembler renders a placeholder.
    pub fn load(&self, key: &str, kind: DashboardKind) -> Option<DashboardMetadata> {
        let path = self.record_path(key, kind);
        if !path.exists() {
            eprintln!("Warning: metadata file not found: {}", path.display());
            return None;
        }
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                eprintln!("Error loading metadata from {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                eprintln!("Error loading metadata from {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrepFlowMetadata, WorkbookMetadata};

    fn workbook_record(name: &str) -> DashboardMetadata {
        DashboardMetadata::Workbook(WorkbookMetadata {
            name: name.to_string(),
            datasources: vec![],
            calculated_fields: vec![],
            parameters: vec![],
            filters: vec![],
            joins: vec![],
            source_file: "sample.twb".to_string(),
        })
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(dir.path());

        let record = workbook_record("sales_dashboard");
        let path = store.save(&record, "sales_dashboard").unwrap();
        assert!(path.ends_with("workbooks/sales_dashboard.json"));

        let loaded = store.load("sales_dashboard", DashboardKind::Workbook);
        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn kinds_are_stored_in_separate_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(dir.path());

        let flow = DashboardMetadata::PrepFlow(PrepFlowMetadata {
            flow_name: "customer_prep_flow".to_string(),
            input_sources: vec![],
            steps: vec![],
            joins: vec![],
            outputs: vec![],
            source_file: "sample.tfl".to_string(),
        });
        let path = store.save(&flow, "customer_prep_flow").unwrap();
        assert!(path.ends_with("prep_flows/customer_prep_flow.json"));
        assert!(store
            .load("customer_prep_flow", DashboardKind::Workbook)
            .is_none());
    }

    #[test]
    fn missing_record_is_a_lookup_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        assert!(store.load("unknown", DashboardKind::Workbook).is_none());
    }

    #[test]
    fn unparseable_record_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        let path = dir.path().join("workbooks");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("broken.json"), "not json").unwrap();
        assert!(store.load("broken", DashboardKind::Workbook).is_none());
    }
}
