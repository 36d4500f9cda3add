//! Modification-time reads on both sides of the bridge.
//!
//! All comparisons use whole epoch seconds in UTC. A read that fails for
//! any reason yields `None`; the policy layer treats that as "unknown" and
//! transfers rather than guessing.

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, warn};

use crate::bridge::command::BridgeCommand;
use crate::bridge::executor::BridgeExecutor;

/// Read a local file's mtime, truncated to whole seconds.
pub fn local_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(err) => {
            debug!("no local mtime for {}: {}", path.display(), err);
            return None;
        }
    };
    let modified = match metadata.modified() {
        Ok(t) => t,
        Err(err) => {
            warn!("mtime unsupported for {}: {}", path.display(), err);
            return None;
        }
    };
    let secs = modified
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_secs();
    DateTime::from_timestamp(secs as i64, 0)
}

/// Read a device file's mtime through the bridge.
pub async fn remote_mtime(bridge: &dyn BridgeExecutor, path: &str) -> Option<DateTime<Utc>> {
    let cmd = BridgeCommand::ReadMtime {
        path: path.to_string(),
    };
    let out = match bridge.run(&cmd).await {
        Ok(out) => out,
        Err(err) => {
            warn!("mtime read failed for {}: {}", path, err);
            return None;
        }
    };
    if !out.success {
        debug!("no remote mtime for {} (exit code {})", path, out.exit_code);
        return None;
    }
    parse_remote_mtime(&out.text)
}

/// Parse `stat -c %Y` output. Strict: after trimming, the text must be
/// non-empty and all ASCII digits. `stat` error messages ("No such file or
/// directory") can arrive with a zero exit status on some toolbox builds,
/// so the exit code alone is not trusted.
pub fn parse_remote_mtime(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs: i64 = trimmed.parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}
