//! Result document export.
//!
//! The scored [`ExperimentResult`] is written as pretty-printed JSON to
//! `google-effect-<participant>.json`.

use crate::scoring::ExperimentResult;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from exporting a result.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No result to export yet")]
    NotReady,
}

/// File name for a participant's result document.
pub fn file_name(participant_id: &str) -> String {
    let safe: String = participant_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("google-effect-{safe}.json")
}

/// Serialize a result to the document format.
pub fn to_json(result: &ExperimentResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Write a result into `dir`, creating it if needed. Returns the file path.
pub async fn export(result: &ExperimentResult, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;

    let path = dir.join(file_name(&result.participant_id));
    let content = to_json(result)?;
    fs::write(&path, content).await?;

    tracing::info!(path = %path.display(), "result exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("P1735689600000"), "google-effect-P1735689600000.json");
        assert_eq!(file_name("pilot 07"), "google-effect-pilot_07.json");
        assert_eq!(file_name("../x"), "google-effect-.._x.json");
    }
}
