//! Writes a run's event timeline to a newline-delimited JSON file (spec
//! §6 `events.jsonl` artifact).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chaos_core::error::SinkError;
use chaos_core::event::Event;
use chaos_core::sink::EventSink;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends each event as one JSON object per line to a file on disk.
///
/// The file is opened (and its parent directory created) lazily on the
/// first `emit`, so constructing a sink that never receives an event
/// never touches the filesystem.
pub struct JsonlFileSink {
    path: PathBuf,
    file: Mutex<Option<tokio::fs::File>>,
    closed: Mutex<bool>,
}

impl JsonlFileSink {
    /// Point a new sink at a file path. Nothing is created yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
            closed: Mutex::new(false),
        }
    }

    /// The path this sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<(), SinkError> {
        let mut guard = self.file.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SinkError::Write(e.to_string()))?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SinkError::Write(e.to_string()))?;
        *guard = Some(file);
        Ok(())
    }
}

#[async_trait]
impl EventSink for JsonlFileSink {
    async fn emit(&self, event: &Event) -> Result<(), SinkError> {
        if *self.closed.lock().await {
            return Err(SinkError::Closed);
        }
        self.open().await?;
        let mut line = serde_json::to_vec(event).map_err(|e| SinkError::Write(e.to_string()))?;
        line.push(b'\n');
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().expect("file opened above");
        file.write_all(&line).await.map_err(|e| SinkError::Write(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        *self.closed.lock().await = true;
        let mut guard = self.file.lock().await;
        if let Some(file) = guard.as_mut() {
            file.flush().await.map_err(|e| SinkError::Write(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaos_core::event::EventType;
    use chaos_core::id::TraceId;

    #[tokio::test]
    async fn writes_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = JsonlFileSink::new(&path);
        for i in 0..3 {
            let event = Event::new(
                TraceId::new("t1"),
                None,
                None,
                EventType::SpanStart,
                serde_json::json!({"i": i}),
            );
            sink.emit(&event).await.unwrap();
        }
        sink.close().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            serde_json::from_str::<serde_json::Value>(line).unwrap();
        }
    }

    #[tokio::test]
    async fn emit_after_close_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = JsonlFileSink::new(&path);
        sink.close().await.unwrap();
        let event = Event::new(TraceId::new("t1"), None, None, EventType::TraceStart, serde_json::json!({}));
        let err = sink.emit(&event).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed));
    }

    #[tokio::test]
    async fn creates_parent_directories_as_needed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("events.jsonl");
        let sink = JsonlFileSink::new(&path);
        let event = Event::new(TraceId::new("t1"), None, None, EventType::TraceStart, serde_json::json!({}));
        sink.emit(&event).await.unwrap();
        assert!(tokio::fs::metadata(&path).await.is_ok());
    }
}
