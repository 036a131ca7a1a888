//! Append-only diagnostic log of raw API responses.
//!
//! One file per session, named after the moment it was opened. Each response
//! becomes a block headed by `########## <operation> ##########`.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::pretty::prettify_json;

/// How a response body is written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Reformat through [`prettify_json`].
    PrettyJson,
    /// Write exactly as received.
    Raw,
}

/// Session-scoped response log.
#[derive(Debug)]
pub struct DiagnosticLog {
    path: PathBuf,
    // Serializes appends from concurrent bulk queries sharing one session.
    write_lock: Mutex<()>,
}

impl DiagnosticLog {
    /// Create the log directory if needed and pick a timestamped file name in it.
    /// The file itself is created on first append.
    pub fn create(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let file_name = format!(
            "BulkApiResponses_{}.txt",
            chrono::Local::now().format("%Y-%m-%d_%-H-%M-%S")
        );

        Ok(Self {
            path: dir.join(file_name),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one response block.
    pub async fn append(
        &self,
        operation: &str,
        body: &str,
        format: LogFormat,
    ) -> std::io::Result<()> {
        let body = match format {
            LogFormat::PrettyJson => prettify_json(body),
            LogFormat::Raw => body.to_string(),
        };
        let block = format!("########## {operation} ##########\n{body}\n\n\n");

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await
    }
}
