use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::error::Error;

/// View of the host editor's open, modified documents. Membership is decided
/// by exact path equality against the host's open-document set.
pub trait OpenDocuments: Send + Sync {
    fn is_unsaved(&self, path: &Path) -> bool;
}

/// Host with no document tracking. Every file reads as saved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpenDocuments;

impl OpenDocuments for NoOpenDocuments {
    fn is_unsaved(&self, _path: &Path) -> bool {
        false
    }
}

/// Capabilities the host editor exposes back to the helper: opening a file
/// in an editor tab and surfacing short status text.
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn open_file(&self, path: &Path) -> Result<(), Error>;

    async fn show_status(&self, text: &str, tooltip: Option<&str>);
}

/// Bridge used when no host is attached. Requests are logged and accepted so
/// the helper server stays usable on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBridge;

#[async_trait]
impl HostBridge for LoggingBridge {
    async fn open_file(&self, path: &Path) -> Result<(), Error> {
        info!("open requested for {}", path.display());
        Ok(())
    }

    async fn show_status(&self, text: &str, tooltip: Option<&str>) {
        info!(?tooltip, "status: {text}");
    }
}
