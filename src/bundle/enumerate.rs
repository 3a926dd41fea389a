use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::roles::{classify_member, ComponentKind, FileRole};
use crate::host::OpenDocuments;
use crate::metadata::classify;

/// One file discovered in a bundle directory, classified and ready to sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFile {
    pub path: PathBuf,
    pub name: String,
    pub role: FileRole,
    pub priority: u8,
    pub is_base_file: bool,
    pub is_unsaved: bool,
}

/// List and classify every file in the bundle that `path` belongs to.
///
/// Returns an empty list when the path cannot be classified or the bundle
/// directory cannot be read; both conditions are logged, never raised. The
/// result is sorted ascending by priority with ties broken by file name, so
/// repeated calls over an unchanged directory yield identical output.
pub fn enumerate(path: &Path, open_docs: &dyn OpenDocuments) -> Vec<ComponentFile> {
    let Some(info) = classify(path) else {
        debug!("not a recognized metadata file: {}", path.display());
        return Vec::new();
    };
    let kind = ComponentKind::from_metadata(info.metadata_type);

    let Some(bundle_dir) = path.parent() else {
        debug!("no parent directory for {}", path.display());
        return Vec::new();
    };

    let entries = match std::fs::read_dir(bundle_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to read bundle directory {}: {e}", bundle_dir.display());
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }
        let Some(name) = entry_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let (role, priority, is_base_file) = classify_member(kind, name, &info.api_name);
        let is_unsaved = open_docs.is_unsaved(&entry_path);

        files.push(ComponentFile {
            name: name.to_string(),
            path: entry_path,
            role,
            priority,
            is_base_file,
            is_unsaved,
        });
    }

    // Stable order independent of how the OS returns directory entries.
    files.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

    debug!(
        "enumerated {} files for {} bundle '{}'",
        files.len(),
        info.metadata_type,
        info.api_name
    );

    files
}
