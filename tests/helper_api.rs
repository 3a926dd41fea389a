use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use chrono::Duration;
use sfnav::api::{DebugLogRecord, MetadataApi, UserRecord};
use sfnav::clock::SystemClock;
use sfnav::error::Error;
use sfnav::host::{LoggingBridge, NoOpenDocuments};
use sfnav::metadata::MetadataType;
use sfnav::provenance::{ProvenanceService, RecordStore, RemoteModification};
use sfnav::server::{router, AppState, SECRET_HEADER};

const SECRET: &str = "sesame";

const LOG_BODY: &str = "\
12:00:01.2 (2345)|EXECUTION_STARTED
12:00:01.2 (2400)|CODE_UNIT_STARTED|[EXTERNAL]|01pxx0000001AbC|InvoiceService.recalculate
12:00:02.0 (100000)|EXECUTION_FINISHED
";

// ---------------------------------------------------------------------------
// Stub remote API
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StubApi {
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl MetadataApi for StubApi {
    async fn fetch_last_modified(
        &self,
        _metadata_type: MetadataType,
        _api_name: &str,
    ) -> Result<RemoteModification, Error> {
        Ok(RemoteModification {
            last_modified_by: "Ada Admin".to_string(),
            last_modified_date: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            last_modified_by_id: "005A".to_string(),
        })
    }

    async fn list_debug_logs(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<DebugLogRecord>, Error> {
        let logs = vec![
            DebugLogRecord {
                id: "07L000000000001".to_string(),
                log_user: "Ada Admin".to_string(),
                operation: "ApexTestHandler".to_string(),
                status: "Success".to_string(),
                log_length: 2048,
                start_time: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
            },
            DebugLogRecord {
                id: "07L000000000002".to_string(),
                log_user: "Bea Builder".to_string(),
                operation: "VFRemoting".to_string(),
                status: "Success".to_string(),
                log_length: 512,
                start_time: Utc.with_ymd_and_hms(2026, 3, 14, 9, 5, 0).unwrap(),
            },
        ];

        Ok(match user_id {
            Some(id) => logs.into_iter().filter(|l| l.id.ends_with(id)).collect(),
            None => logs,
        })
    }

    async fn fetch_log_body(&self, log_id: &str) -> Result<String, Error> {
        if log_id == "missing" {
            return Err(Error::Remote("404 Not Found: no such log".to_string()));
        }
        Ok(LOG_BODY.to_string())
    }

    async fn delete_log(&self, log_id: &str) -> Result<(), Error> {
        if log_id == "stuck" {
            return Err(Error::Remote("500: cannot delete".to_string()));
        }
        self.deleted.lock().unwrap().push(log_id.to_string());
        Ok(())
    }

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>, Error> {
        let users = vec![UserRecord {
            id: "005A".to_string(),
            name: "Ada Admin".to_string(),
            username: "ada@example.com".to_string(),
        }];
        Ok(match search {
            Some(term) => users
                .into_iter()
                .filter(|u| u.name.contains(term))
                .collect(),
            None => users,
        })
    }
}

async fn start_server(workspace: &Path) -> (SocketAddr, Arc<StubApi>) {
    let api = Arc::new(StubApi::default());
    let provenance = ProvenanceService::new(
        SystemClock,
        api.clone(),
        RecordStore::new(workspace),
        "00Dxx0000001gPL",
        Duration::seconds(5),
    );
    let state = AppState {
        api: api.clone(),
        bridge: Arc::new(LoggingBridge),
        open_docs: Arc::new(NoOpenDocuments),
        provenance: Arc::new(tokio::sync::Mutex::new(provenance)),
        workspace_root: workspace.to_path_buf(),
        secret: SECRET.to_string(),
        org_id: "00Dxx0000001gPL".to_string(),
        instance_url: "https://example.my.salesforce.com".to_string(),
        started_at: Instant::now(),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    (addr, api)
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn requests_without_the_shared_secret_are_rejected() {
    let workspace = tempfile::tempdir().unwrap();
    let (addr, _api) = start_server(workspace.path()).await;

    let response = client()
        .get(format!("http://{addr}/api/status"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    let payload: Value = response.json().await.unwrap();
    assert_eq!(payload["success"], Value::Bool(false));
}

#[tokio::test]
async fn status_reports_org_and_version() {
    let workspace = tempfile::tempdir().unwrap();
    let (addr, _api) = start_server(workspace.path()).await;

    let payload: Value = client()
        .get(format!("http://{addr}/api/status"))
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(payload["success"], Value::Bool(true));
    assert_eq!(payload["orgId"], "00Dxx0000001gPL");
    assert_eq!(payload["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn debug_logs_list_and_filter_by_user() {
    let workspace = tempfile::tempdir().unwrap();
    let (addr, _api) = start_server(workspace.path()).await;

    let payload: Value = client()
        .get(format!("http://{addr}/api/debugLogs"))
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(payload["success"], Value::Bool(true));
    assert_eq!(payload["logs"].as_array().unwrap().len(), 2);
    assert_eq!(payload["logs"][0]["logUser"], "Ada Admin");

    let payload: Value = client()
        .get(format!("http://{addr}/api/debugLogs?user=1"))
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(payload["logs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn log_download_and_method_name_use_the_log_body() {
    let workspace = tempfile::tempdir().unwrap();
    let (addr, _api) = start_server(workspace.path()).await;

    let response = client()
        .get(format!("http://{addr}/api/debugLogs/07L1/download"))
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("07L1.log"));
    assert_eq!(response.text().await.unwrap(), LOG_BODY);

    let payload: Value = client()
        .get(format!("http://{addr}/api/debugLogs/07L1/methodName"))
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(payload["methodName"], "InvoiceService.recalculate");

    // Remote failures surface as a failure envelope, not a crash.
    let response = client()
        .get(format!("http://{addr}/api/debugLogs/missing/download"))
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let payload: Value = response.json().await.unwrap();
    assert_eq!(payload["success"], Value::Bool(false));
}

#[tokio::test]
async fn logs_can_be_deleted_individually_and_in_bulk() {
    let workspace = tempfile::tempdir().unwrap();
    let (addr, api) = start_server(workspace.path()).await;

    let payload: Value = client()
        .delete(format!("http://{addr}/api/debugLogs/07L1"))
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(payload["success"], Value::Bool(true));

    let payload: Value = client()
        .post(format!("http://{addr}/api/debugLogs/delete"))
        .header(SECRET_HEADER, SECRET)
        .json(&serde_json::json!({ "ids": ["07L2", "07L3"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(payload["deleted"], 2);

    assert_eq!(
        *api.deleted.lock().unwrap(),
        vec!["07L1".to_string(), "07L2".to_string(), "07L3".to_string()]
    );

    // A partial bulk failure reports a failure envelope.
    let response = client()
        .post(format!("http://{addr}/api/debugLogs/delete"))
        .header(SECRET_HEADER, SECRET)
        .json(&serde_json::json!({ "ids": ["07L4", "stuck"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn files_endpoint_enumerates_a_bundle_inside_the_workspace() {
    let workspace = tempfile::tempdir().unwrap();
    let bundle = workspace
        .path()
        .join("force-app")
        .join("main")
        .join("default")
        .join("lwc")
        .join("Foo");
    fs::create_dir_all(&bundle).unwrap();
    for name in ["Foo.js", "Foo.html", "Foo.js-meta.xml"] {
        fs::write(bundle.join(name), "content").unwrap();
    }

    let (addr, _api) = start_server(workspace.path()).await;

    let payload: Value = client()
        .get(format!("http://{addr}/api/files"))
        .query(&[("path", bundle.join("Foo.js").to_str().unwrap())])
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(payload["success"], Value::Bool(true));
    let files = payload["files"].as_array().unwrap();
    let names: Vec<_> = files.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Foo.js", "Foo.html", "Foo.js-meta.xml"]);
    assert_eq!(files[0]["isBaseFile"], Value::Bool(true));

    let entries = payload["entries"].as_array().unwrap();
    assert_eq!(entries[0]["label"], "$(file-code) Foo.js");
    assert_eq!(entries[0]["isDefault"], Value::Bool(true));
}

#[tokio::test]
async fn paths_outside_the_workspace_are_rejected() {
    let workspace = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let stray = outside.path().join("Foo.cls");
    fs::write(&stray, "public class Foo {}").unwrap();

    let (addr, _api) = start_server(workspace.path()).await;

    let response = client()
        .get(format!("http://{addr}/api/files"))
        .query(&[("path", stray.to_str().unwrap())])
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let payload: Value = response.json().await.unwrap();
    assert_eq!(payload["success"], Value::Bool(false));
}

#[tokio::test]
async fn last_modified_fetches_then_debounces() {
    let workspace = tempfile::tempdir().unwrap();
    let classes = workspace.path().join("force-app").join("classes");
    fs::create_dir_all(&classes).unwrap();
    let class_file = classes.join("Invoice.cls");
    fs::write(&class_file, "public class Invoice {}").unwrap();

    let (addr, _api) = start_server(workspace.path()).await;

    let payload: Value = client()
        .get(format!("http://{addr}/api/lastModified"))
        .query(&[("path", class_file.to_str().unwrap())])
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(payload["success"], Value::Bool(true));
    assert_eq!(payload["metadataType"], "ApexClass");
    assert_eq!(payload["apiName"], "Invoice");
    assert_eq!(payload["debounced"], Value::Bool(false));
    assert_eq!(payload["externalChange"], Value::Bool(false));
    assert_eq!(payload["record"]["lastModifiedBy"], "Ada Admin");

    // An immediate second request lands inside the debounce window but still
    // answers with the stored record.
    let payload: Value = client()
        .get(format!("http://{addr}/api/lastModified"))
        .query(&[("path", class_file.to_str().unwrap())])
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(payload["debounced"], Value::Bool(true));
    assert_eq!(payload["record"]["lastModifiedById"], "005A");
}

#[tokio::test]
async fn open_requests_inside_the_workspace_are_accepted() {
    let workspace = tempfile::tempdir().unwrap();
    let file = workspace.path().join("Foo.cls");
    fs::write(&file, "public class Foo {}").unwrap();

    let (addr, _api) = start_server(workspace.path()).await;

    let payload: Value = client()
        .post(format!("http://{addr}/api/files/open"))
        .header(SECRET_HEADER, SECRET)
        .json(&serde_json::json!({ "path": file.to_str().unwrap() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(payload["success"], Value::Bool(true));
}
