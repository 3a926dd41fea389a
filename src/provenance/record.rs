use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance fields returned by the remote metadata API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteModification {
    pub last_modified_by: String,
    pub last_modified_date: DateTime<Utc>,
    pub last_modified_by_id: String,
}

/// Cached "last modified" snapshot for one piece of metadata, persisted per
/// (metadata type, api name, org) and overwritten whole on each fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastModifiedRecord {
    pub last_modified_by: String,
    pub last_modified_date: DateTime<Utc>,
    pub last_modified_by_id: String,
    pub retrieved_at: DateTime<Utc>,
}

impl LastModifiedRecord {
    pub fn from_remote(remote: RemoteModification, retrieved_at: DateTime<Utc>) -> Self {
        Self {
            last_modified_by: remote.last_modified_by,
            last_modified_date: remote.last_modified_date,
            last_modified_by_id: remote.last_modified_by_id,
            retrieved_at,
        }
    }
}
