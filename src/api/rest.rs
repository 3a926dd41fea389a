use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{DebugLogRecord, MetadataApi, UserRecord};
use crate::error::Error;
use crate::metadata::MetadataType;
use crate::provenance::RemoteModification;

const DEFAULT_API_VERSION: &str = "v61.0";
const LOG_LIST_LIMIT: usize = 100;
const USER_LIST_LIMIT: usize = 50;

/// Client for the Salesforce REST and Tooling APIs.
///
/// Authentication is delegated: the caller supplies an instance URL and a
/// ready access token (typically from the org's CLI tooling). The client
/// never refreshes credentials itself.
pub struct SalesforceClient {
    http: reqwest::Client,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl SalesforceClient {
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::with_api_version(instance_url, access_token, DEFAULT_API_VERSION)
    }

    pub fn with_api_version(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let mut instance_url = instance_url.into();
        while instance_url.ends_with('/') {
            instance_url.pop();
        }

        Self {
            http: reqwest::Client::new(),
            instance_url,
            access_token: access_token.into(),
            api_version: api_version.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/services/data/{}/{path}",
            self.instance_url, self.api_version
        )
    }

    async fn query<T: DeserializeOwned>(&self, path: &str, soql: &str) -> Result<Vec<T>, Error> {
        debug!("soql via {path}: {soql}");

        let response = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(&self.access_token)
            .query(&[("q", soql)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("{status}: {body}")));
        }

        let payload: QueryResponse<T> = response.json().await?;
        Ok(payload.records)
    }
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    records: Vec<T>,
}

#[derive(Deserialize)]
struct NameRef {
    #[serde(rename = "Name")]
    name: Option<String>,
}

#[derive(Deserialize)]
struct ModificationRow {
    #[serde(rename = "LastModifiedDate")]
    last_modified_date: String,
    #[serde(rename = "LastModifiedById")]
    last_modified_by_id: String,
    #[serde(rename = "LastModifiedBy")]
    last_modified_by: Option<NameRef>,
}

#[derive(Deserialize)]
struct LogRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "LogUser")]
    log_user: Option<NameRef>,
    #[serde(rename = "Operation")]
    operation: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "LogLength")]
    log_length: u64,
    #[serde(rename = "StartTime")]
    start_time: String,
}

#[derive(Deserialize)]
struct UserRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Username")]
    username: String,
}

#[async_trait]
impl MetadataApi for SalesforceClient {
    async fn fetch_last_modified(
        &self,
        metadata_type: MetadataType,
        api_name: &str,
    ) -> Result<RemoteModification, Error> {
        // Tooling exposes custom objects by developer name, without the __c suffix.
        let name = match metadata_type {
            MetadataType::CustomObject => api_name.trim_end_matches("__c"),
            _ => api_name,
        };

        let soql = format!(
            "SELECT LastModifiedBy.Name, LastModifiedDate, LastModifiedById FROM {} WHERE {} = '{}' LIMIT 1",
            metadata_type.tooling_object(),
            metadata_type.tooling_name_field(),
            escape_soql(name)
        );

        let rows: Vec<ModificationRow> = self.query("tooling/query", &soql).await?;
        let row = rows.into_iter().next().ok_or_else(|| {
            Error::Payload(format!("no {metadata_type} named '{api_name}' in the org"))
        })?;

        Ok(RemoteModification {
            last_modified_by: display_name(row.last_modified_by),
            last_modified_date: parse_salesforce_datetime(&row.last_modified_date)?,
            last_modified_by_id: row.last_modified_by_id,
        })
    }

    async fn list_debug_logs(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<DebugLogRecord>, Error> {
        let filter = match user_id {
            Some(id) => format!(" WHERE LogUserId = '{}'", escape_soql(id)),
            None => String::new(),
        };
        let soql = format!(
            "SELECT Id, LogUser.Name, Operation, Status, LogLength, StartTime FROM ApexLog{filter} \
             ORDER BY StartTime DESC LIMIT {LOG_LIST_LIMIT}"
        );

        let rows: Vec<LogRow> = self.query("tooling/query", &soql).await?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in rows {
            logs.push(DebugLogRecord {
                start_time: parse_salesforce_datetime(&row.start_time)?,
                id: row.id,
                log_user: display_name(row.log_user),
                operation: row.operation,
                status: row.status,
                log_length: row.log_length,
            });
        }

        Ok(logs)
    }

    async fn fetch_log_body(&self, log_id: &str) -> Result<String, Error> {
        let response = self
            .http
            .get(self.endpoint(&format!("tooling/sobjects/ApexLog/{log_id}/Body")))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("{status}: {body}")));
        }

        Ok(response.text().await?)
    }

    async fn delete_log(&self, log_id: &str) -> Result<(), Error> {
        let response = self
            .http
            .delete(self.endpoint(&format!("tooling/sobjects/ApexLog/{log_id}")))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("{status}: {body}")));
        }

        Ok(())
    }

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>, Error> {
        let filter = match search {
            Some(term) if !term.is_empty() => {
                let pattern = format!("%{}%", escape_like(term));
                format!(
                    " AND (Name LIKE '{pattern}' OR Username LIKE '{pattern}')",
                )
            }
            _ => String::new(),
        };
        let soql = format!(
            "SELECT Id, Name, Username FROM User WHERE IsActive = true{filter} \
             ORDER BY Name LIMIT {USER_LIST_LIMIT}"
        );

        let rows: Vec<UserRow> = self.query("query", &soql).await?;
        Ok(rows
            .into_iter()
            .map(|row| UserRecord {
                id: row.id,
                name: row.name,
                username: row.username,
            })
            .collect())
    }
}

fn display_name(name: Option<NameRef>) -> String {
    name.and_then(|n| n.name)
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Salesforce emits `2026-03-14T09:26:53.000+0000`, which is not RFC 3339
/// (no colon in the offset), so try both layouts.
fn parse_salesforce_datetime(raw: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| Error::Payload(format!("unparseable datetime '{raw}': {e}")))
}

fn escape_soql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn escape_like(value: &str) -> String {
    escape_soql(value).replace('%', "\\%").replace('_', "\\_")
}
