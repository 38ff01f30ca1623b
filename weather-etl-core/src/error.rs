use std::{path::PathBuf, time::Duration};

use reqwest::StatusCode;
use thiserror::Error;

/// Every way a pipeline task can fail.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Weather endpoint did not become ready within {waited:?}")]
    NotReady { waited: Duration },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Weather endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Response body is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Weather reading is missing expected data: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Weather reading has an empty description list")]
    EmptyDescription,

    #[error("Timestamp {epoch} (offset {offset}s) is out of range")]
    Timestamp { epoch: i64, offset: i64 },

    #[error("Failed to save report to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to send failure notification: {0}")]
    Notify(String),

    #[error("Invalid schedule '{expr}': {reason}")]
    Schedule { expr: String, reason: String },
}

impl PipelineError {
    /// Path the persister was asked to write, for persistence failures.
    pub fn intended_path(&self) -> Option<&PathBuf> {
        match self {
            PipelineError::Persist { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
