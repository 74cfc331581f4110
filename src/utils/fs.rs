/// Crash-safe file persistence helpers
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, TradingError};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write bytes to a sibling temp file, then rename over the target
pub async fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes).await.map_err(|e| {
        TradingError::FileWriteFailed(format!("{}: {}", tmp.display(), e))
    })?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        TradingError::FileWriteFailed(format!("{}: {}", path.display(), e))
    })?;
    Ok(())
}

pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    write_bytes_atomic(path, &json).await
}

/// Read and decode a JSON document; a missing file maps to `FileNotFound`
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TradingError::FileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&content)?)
}
