use std::{fs, io::Write, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

/// Unflushed empty-command count carried across a restart.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoredNewlines {
    #[serde(rename = "pendingNewlines")]
    pub pending_newlines: u32,
}

pub fn data_dir() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.data_dir().join("zterm"))
}

pub fn pending_path() -> Option<PathBuf> {
    Some(data_dir()?.join("pending_newlines.json"))
}

pub fn load_pending() -> Result<Option<u32>> {
    match pending_path() {
        Some(path) => load_pending_from(&path),
        None => Ok(None),
    }
}

// An unreadable entry counts as zero, but is still reported as present so it
// gets cleared.
pub fn load_pending_from(path: &Path) -> Result<Option<u32>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).with_context(|| format!("read pending file: {}", path.display()))?;
    let stored: StoredNewlines = serde_json::from_slice(&data).unwrap_or_default();
    Ok(Some(stored.pending_newlines))
}

pub fn store_pending_at(path: &Path, count: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let data = serde_json::to_vec_pretty(&StoredNewlines { pending_newlines: count })?;
    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");
    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("create tmp: {}", tmp.display()))?;
        f.write_all(&data)?;
        f.flush()?;
    }
    fs::rename(tmp, path).with_context(|| format!("persist pending to {}", path.display()))?;
    Ok(())
}

pub fn clear_pending_at(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_means_nothing_stored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending_newlines.json");
        assert_eq!(load_pending_from(&path).unwrap(), None);
        clear_pending_at(&path).unwrap();
    }

    #[test]
    fn store_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pending_newlines.json");
        store_pending_at(&path, 4).unwrap();
        assert_eq!(load_pending_from(&path).unwrap(), Some(4));
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("pendingNewlines"));
        clear_pending_at(&path).unwrap();
        assert_eq!(load_pending_from(&path).unwrap(), None);
    }

    #[test]
    fn garbage_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending_newlines.json");
        fs::write(&path, b"not json").unwrap();
        assert_eq!(load_pending_from(&path).unwrap(), Some(0));
    }
}
