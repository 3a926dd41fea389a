use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::record::LastModifiedRecord;
use crate::error::Error;
use crate::metadata::MetadataType;

const STORE_DIR: &str = ".sfnav/lastmodified";

/// On-disk record store: one JSON file per (org, metadata type, api name)
/// under the workspace's hidden helper folder. Records are overwritten whole
/// after each successful fetch; there are no partial updates.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(workspace_root: &Path) -> Self {
        Self {
            root: workspace_root.join(STORE_DIR),
        }
    }

    fn record_path(&self, org_id: &str, metadata_type: MetadataType, api_name: &str) -> PathBuf {
        self.root
            .join(sanitize(org_id))
            .join(format!("{}_{}.json", metadata_type, sanitize(api_name)))
    }

    /// Read a stored record. Any failure (missing file, unreadable JSON)
    /// degrades to "no data" and is logged.
    pub fn load(
        &self,
        org_id: &str,
        metadata_type: MetadataType,
        api_name: &str,
    ) -> Option<LastModifiedRecord> {
        let path = self.record_path(org_id, metadata_type, api_name);

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("failed to read record {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("discarding unreadable record {}: {e}", path.display());
                None
            }
        }
    }

    pub fn save(
        &self,
        org_id: &str,
        metadata_type: MetadataType,
        api_name: &str,
        record: &LastModifiedRecord,
    ) -> Result<(), Error> {
        let path = self.record_path(org_id, metadata_type, api_name);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let raw = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, raw).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;

        debug!("stored record at {}", path.display());
        Ok(())
    }
}

// Keep file names portable; API names are alphanumeric plus underscores, but
// org ids can arrive in forms like "user@example.com" from CLI tooling.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_record() -> LastModifiedRecord {
        LastModifiedRecord {
            last_modified_by: "Ada Admin".to_string(),
            last_modified_date: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            last_modified_by_id: "005xx0000012345".to_string(),
            retrieved_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 27, 0).unwrap(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let workspace = tempfile::tempdir().unwrap();
        let store = RecordStore::new(workspace.path());
        let record = sample_record();

        store
            .save("00Dxx000000001", MetadataType::ApexClass, "Invoice", &record)
            .unwrap();

        let loaded = store
            .load("00Dxx000000001", MetadataType::ApexClass, "Invoice")
            .unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn save_overwrites_the_previous_record() {
        let workspace = tempfile::tempdir().unwrap();
        let store = RecordStore::new(workspace.path());

        let mut record = sample_record();
        store
            .save("org", MetadataType::ApexClass, "Invoice", &record)
            .unwrap();

        record.last_modified_by_id = "005yy0000054321".to_string();
        store
            .save("org", MetadataType::ApexClass, "Invoice", &record)
            .unwrap();

        let loaded = store.load("org", MetadataType::ApexClass, "Invoice").unwrap();
        assert_eq!(loaded.last_modified_by_id, "005yy0000054321");
    }

    #[test]
    fn missing_and_corrupt_records_read_as_no_data() {
        let workspace = tempfile::tempdir().unwrap();
        let store = RecordStore::new(workspace.path());

        assert!(store.load("org", MetadataType::ApexClass, "Missing").is_none());

        let dir = workspace.path().join(STORE_DIR).join("org");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ApexClass_Broken.json"), "not json").unwrap();
        assert!(store.load("org", MetadataType::ApexClass, "Broken").is_none());
    }

    #[test]
    fn org_identifiers_are_sanitized_for_the_filesystem() {
        let workspace = tempfile::tempdir().unwrap();
        let store = RecordStore::new(workspace.path());
        let record = sample_record();

        store
            .save("dev@example.com", MetadataType::ApexTrigger, "Sync", &record)
            .unwrap();
        assert!(store
            .load("dev@example.com", MetadataType::ApexTrigger, "Sync")
            .is_some());
    }
}
