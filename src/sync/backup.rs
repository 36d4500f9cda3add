//! Local backups taken before a pull overwrites.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The sibling `.bak` path for a local file.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Copy `path` to its `.bak` sibling if it exists. Pulls replace local data
/// with whatever is on the device, so the previous copy must survive the
/// run. An existing `.bak` from an earlier run is overwritten; only the
/// latest pre-pull state is kept.
///
/// Best-effort: a missing source is a no-op and a failed copy is logged,
/// never fatal. Returns true if a backup was written.
pub fn protect(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let bak = backup_path(path);
    match std::fs::copy(path, &bak) {
        Ok(_) => {
            info!("backed up {} -> {}", path.display(), bak.display());
            true
        }
        Err(err) => {
            warn!("could not back up {}: {}", path.display(), err);
            false
        }
    }
}
