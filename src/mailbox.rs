//! The file-based OBD mailbox.
//!
//! A single-record store shared with the external diagnostic transport: one
//! JSON input record, one JSON snapshot. Writes replace the whole record
//! atomically (temp file + rename) so a concurrent reader always observes a
//! complete old or new snapshot, never a partial mix. A missing or corrupt
//! input file never aborts a cycle.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::protocol::{InputFrame, Snapshot};

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("mailbox i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Mailbox {
    input_path: PathBuf,
    output_path: PathBuf,
}

impl Mailbox {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Read the input record, substituting the documented defaults when the
    /// file is missing or unparseable. Never fails: the simulation retries
    /// next period.
    pub fn read_input(&self) -> InputFrame {
        match fs::read_to_string(&self.input_path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(path = %self.input_path.display(), "corrupt input record, using defaults: {e}");
                    InputFrame::default()
                }
            },
            Err(e) => {
                warn!(path = %self.input_path.display(), "input record unreadable, using defaults: {e}");
                InputFrame::default()
            }
        }
    }

    /// Replace the output record with this snapshot. The rename makes the
    /// replacement atomic at the storage layer.
    pub fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), MailboxError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.output_path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.output_path)?;
        Ok(())
    }
}
