//! Sink writer: the snapshot as a single JSON artifact.
//!
//! Writing returns an explicit result so callers can observe failure; the
//! pipeline decides whether that failure matters.

use std::path::{Path, PathBuf};

use crate::error::{SinkError, SinkResult};
use crate::models::Snapshot;
use crate::validation::validate_snapshot;

/// Serialise `snapshot`, optionally check it against the embedded schema,
/// and write it to `path`, creating parent directories.
///
/// Returns the path written.
pub async fn write_snapshot(
    path: &Path,
    snapshot: &Snapshot,
    pretty: bool,
    validate: bool,
) -> SinkResult<PathBuf> {
    let value = serde_json::to_value(snapshot)?;

    if validate {
        validate_snapshot(&value).map_err(|errors| SinkError::Schema { errors })?;
    }

    let content = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };

    let io_err = |source: std::io::Error| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, content).await.map_err(io_err)?;

    Ok(path.to_path_buf())
}

/// Load a previously written snapshot.
pub async fn load_snapshot(path: &Path) -> SinkResult<Snapshot> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&content)?)
}
