use crate::domain::AuditEvent;
use crate::error::{AuditError, AuditResult};
use crate::ports::AuditLog;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Append-only audit file, one JSON object per line.
///
/// The file is opened in append mode for every event and writes are
/// serialised so lines never interleave.
pub struct JsonLinesAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every event back, in append order.
    pub async fn read_all(&self) -> AuditResult<Vec<AuditEvent>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AuditError::Sink {
                    reason: e.to_string(),
                })
            }
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| AuditError::Encoding {
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

fn sink_error(e: std::io::Error) -> AuditError {
    AuditError::Sink {
        reason: e.to_string(),
    }
}

#[async_trait]
impl AuditLog for JsonLinesAuditLog {
    async fn append(&self, event: AuditEvent) -> AuditResult<()> {
        let mut line = serde_json::to_vec(&event).map_err(|e| AuditError::Encoding {
            reason: e.to_string(),
        })?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(sink_error)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(sink_error)?;
        file.write_all(&line).await.map_err(sink_error)?;
        file.flush().await.map_err(sink_error)?;

        debug!(
            delivery_id = %event.delivery_id,
            event_type = event.event_type(),
            "[sd-04] Audit event appended"
        );
        Ok(())
    }
}
