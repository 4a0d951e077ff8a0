//! Downstream event queue seam and its JSONL-file default implementation.

use std::{
    io::Write,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use vigil_core::current_unix_timestamp_ms;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue publish failed: {0}")]
    Publish(String),
}

/// Narrow interface over the external durable queue: a single publish that
/// returns the queue-assigned message id.
#[async_trait]
pub trait EventQueue: Send + Sync {
    async fn publish(&self, record: &Value) -> Result<String, QueueError>;
}

/// Append-only JSONL queue file, one record per line.
pub struct JsonlEventQueue {
    path: PathBuf,
    file: Arc<Mutex<std::fs::File>>,
    sequence: AtomicU64,
}

impl JsonlEventQueue {
    pub fn open(path: PathBuf) -> Result<Self, QueueError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|error| {
                    QueueError::Publish(format!("create {}: {error}", parent.display()))
                })?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| QueueError::Publish(format!("open {}: {error}", path.display())))?;
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
            sequence: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl EventQueue for JsonlEventQueue {
    async fn publish(&self, record: &Value) -> Result<String, QueueError> {
        let line = serde_json::to_string(record)
            .map_err(|error| QueueError::Publish(format!("encode record: {error}")))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| QueueError::Publish("queue file mutex is poisoned".to_string()))?;
        writeln!(file, "{line}")
            .map_err(|error| QueueError::Publish(format!("append {}: {error}", self.path.display())))?;
        file.flush()
            .map_err(|error| QueueError::Publish(format!("flush {}: {error}", self.path.display())))?;
        Ok(format!(
            "msg-{}-{}",
            current_unix_timestamp_ms(),
            self.sequence.fetch_add(1, Ordering::SeqCst)
        ))
    }
}
