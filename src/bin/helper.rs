use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::info;

use sfnav::api::{MetadataApi, SalesforceClient};
use sfnav::clock::SystemClock;
use sfnav::config::Config;
use sfnav::host::{HostBridge, LoggingBridge, NoOpenDocuments};
use sfnav::provenance::{ProvenanceService, RecordStore, RefreshOutcome};
use sfnav::server::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    if !config.workspace_root.is_dir() {
        return Err(
            sfnav::Error::InvalidPath(config.workspace_root.display().to_string()).into(),
        );
    }

    let log_dir = config.workspace_root.join(".sfnav").join("logs");
    let _log_guard = sfnav::logging::init(Some(&log_dir));

    let api: Arc<dyn MetadataApi> = Arc::new(SalesforceClient::with_api_version(
        config.instance_url.clone(),
        config.access_token.clone(),
        config.api_version.clone(),
    ));
    let bridge: Arc<dyn HostBridge> = Arc::new(LoggingBridge);

    let provenance = Arc::new(tokio::sync::Mutex::new(ProvenanceService::new(
        SystemClock,
        Arc::clone(&api),
        RecordStore::new(&config.workspace_root),
        config.org_id.clone(),
        chrono::Duration::seconds(config.refresh_min_interval_secs as i64),
    )));

    spawn_deferred_poll(
        Arc::clone(&provenance),
        Arc::clone(&bridge),
        config.poll_interval_secs,
    );

    let state = AppState {
        api,
        bridge,
        open_docs: Arc::new(NoOpenDocuments),
        provenance,
        workspace_root: config.workspace_root.clone(),
        secret: config.secret.clone(),
        org_id: config.org_id.clone(),
        instance_url: config.instance_url.clone(),
        started_at: Instant::now(),
    };

    let listener = TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!(
        "helper server for org {} listening on {}",
        config.org_id,
        listener.local_addr()?
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Periodically release refreshes that the debounce gate deferred, and
/// surface external edits to the host as status text.
fn spawn_deferred_poll(
    provenance: Arc<tokio::sync::Mutex<ProvenanceService<SystemClock>>>,
    bridge: Arc<dyn HostBridge>,
    poll_interval_secs: u64,
) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(poll_interval_secs.max(1)));
        interval.tick().await; // first tick fires immediately, skip it

        loop {
            interval.tick().await;

            let released = provenance.lock().await.flush_due().await;
            for (info, outcome) in released {
                if let RefreshOutcome::ExternalChange(record) = outcome {
                    bridge
                        .show_status(
                            &format!(
                                "{} '{}' was modified by {}",
                                info.metadata_type, info.api_name, record.last_modified_by
                            ),
                            Some(&record.last_modified_date.to_rfc3339()),
                        )
                        .await;
                }
            }
        }
    });
}
