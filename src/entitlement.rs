//! Pro entitlement.
//!
//! Smart sync and the Geode/GDH jobs are pro features. The rest of the
//! program only ever asks the provider for a boolean; where the answer
//! comes from is this module's business.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::unquote;

/// Keys accepted by `activate`. Exact, case-sensitive match.
const VALID_KEYS: [&str; 2] = ["GDSYNC-PRO-7F3A-91C2", "GDSYNC-PRO-4B8E-D650"];

pub trait EntitlementProvider {
    fn is_pro_enabled(&self) -> bool;
}

/// Entitlement backed by a `LICENSE_KEY="..."` file on disk.
pub struct LicenseFile {
    key: Option<String>,
}

impl LicenseFile {
    /// Read the license file. A missing file means no entitlement; a key
    /// that fails validation is treated as absent, with a warning.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self { key: None },
        };

        let key = text.lines().find_map(|line| {
            let (name, raw) = line.split_once('=')?;
            if name != "LICENSE_KEY" {
                return None;
            }
            Some(unquote(raw.trim_end()).to_string())
        });

        match key {
            Some(key) if is_valid_key(&key) => Self { key: Some(key) },
            Some(_) => {
                warn!("license key in {} is not valid, ignoring it", path.display());
                Self { key: None }
            }
            None => Self { key: None },
        }
    }

    /// Validate and persist a key. Rejected keys are not written.
    pub fn activate(path: &Path, key: &str) -> Result<Self> {
        if !is_valid_key(key) {
            bail!("invalid license key. Check the key and try again");
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, format!("LICENSE_KEY=\"{}\"\n", key))
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(Self {
            key: Some(key.to_string()),
        })
    }
}

impl EntitlementProvider for LicenseFile {
    fn is_pro_enabled(&self) -> bool {
        self.key.is_some()
    }
}

pub fn is_valid_key(key: &str) -> bool {
    VALID_KEYS.contains(&key)
}

/// Default location: `<config_dir>/gdsync/gdsync.license`.
pub fn default_license_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("could not determine the configuration directory")?;
    Ok(dir.join("gdsync").join("gdsync.license"))
}
