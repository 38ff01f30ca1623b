use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::{error::PipelineError, model::WeatherReport};

/// Write `report` as JSON to `path`, replacing whatever was there.
///
/// The file is written in place, so a crash mid-write can leave it truncated.
pub async fn save_to_json(report: &WeatherReport, path: &Path) -> Result<PathBuf, PipelineError> {
    let bytes = serde_json::to_vec(report).map_err(PipelineError::Serialize)?;
    let persist_err = |source: std::io::Error| PipelineError::Persist { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(persist_err)?;
    }

    tokio::fs::write(path, &bytes).await.map_err(persist_err)?;

    info!(path = %path.display(), bytes = bytes.len(), "JSON file saved");
    Ok(path.to_path_buf())
}

/// Read a previously saved report.
pub async fn load_report(path: &Path) -> anyhow::Result<WeatherReport> {
    let contents = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read report: {}", path.display()))?;

    serde_json::from_slice(&contents)
        .with_context(|| format!("Failed to parse report: {}", path.display()))
}
