mod logparse;
mod rest;

pub use logparse::extract_entry_method;
pub use rest::SalesforceClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Error;
use crate::metadata::MetadataType;
use crate::provenance::RemoteModification;

/// One ApexLog row as shown in the debug-log panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugLogRecord {
    pub id: String,
    pub log_user: String,
    pub operation: String,
    pub status: String,
    pub log_length: u64,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub username: String,
}

/// Remote metadata operations the navigation features depend on. The live
/// implementation talks to the Salesforce REST and Tooling APIs; tests
/// substitute stubs.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    async fn fetch_last_modified(
        &self,
        metadata_type: MetadataType,
        api_name: &str,
    ) -> Result<RemoteModification, Error>;

    async fn list_debug_logs(&self, user_id: Option<&str>)
        -> Result<Vec<DebugLogRecord>, Error>;

    async fn fetch_log_body(&self, log_id: &str) -> Result<String, Error>;

    async fn delete_log(&self, log_id: &str) -> Result<(), Error>;

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>, Error>;
}
