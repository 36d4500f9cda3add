//! Session configuration.
//!
//! Six paths (PC and phone roots for save data, Geode mods, and GDH
//! replays) loaded once at startup from a flat `KEY="value"` file. The
//! loaded value is immutable for the session; `config set` writes the file
//! for the next run.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::sync::engine::SyncTarget;

const DEFAULT_PHONE_GD_PATH: &str = "/storage/emulated/0/Android/media/com.geode.launcher/save";
const DEFAULT_PHONE_GEODE_PATH: &str =
    "/storage/emulated/0/Android/media/com.geode.launcher/game/geode/mods";
const DEFAULT_PHONE_GDH_PATH: &str =
    "/storage/emulated/0/Android/media/com.geode.launcher/save/geode/mods/tobyadd.gdh/Macros";

/// Recognized configuration keys, in file order.
pub const CONFIG_KEYS: [&str; 6] = [
    "PC_GD_PATH",
    "PHONE_GD_PATH",
    "PC_GEODE_PATH",
    "PHONE_GEODE_PATH",
    "PC_GDH_PATH",
    "PHONE_GDH_PATH",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub pc_gd_path: PathBuf,
    pub phone_gd_path: String,
    pub pc_geode_path: PathBuf,
    pub phone_geode_path: String,
    pub pc_gdh_path: PathBuf,
    pub phone_gdh_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        // Geode and GDH live under the game directory by default.
        let pc_gd_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("GeometryDash");
        let pc_geode_path = pc_gd_path.join("geode").join("mods");
        let pc_gdh_path = pc_geode_path.join("tobyadd.gdh").join("Macros");
        Self {
            pc_gd_path,
            phone_gd_path: DEFAULT_PHONE_GD_PATH.to_string(),
            pc_geode_path,
            phone_geode_path: DEFAULT_PHONE_GEODE_PATH.to_string(),
            pc_gdh_path,
            phone_gdh_path: DEFAULT_PHONE_GDH_PATH.to_string(),
        }
    }
}

impl SessionConfig {
    /// Load from the flat key=value file, starting from defaults. A missing
    /// file just means defaults. Unknown keys are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config file at {}, using defaults", path.display());
                return Ok(config);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", path.display()));
            }
        };

        for line in text.lines() {
            let Some((key, raw)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(raw.trim_end());
            // Unknown keys pass through silently, matching the file's role
            // as a hand-editable settings store.
            let _ = config.set(key, value);
        }
        Ok(config)
    }

    /// Write every key, quoted, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut text = String::new();
        for (key, value) in self.entries() {
            text.push_str(&format!("{}=\"{}\"\n", key, value));
        }
        std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Set one key by its file name. Errors on an unrecognized key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "PC_GD_PATH" => self.pc_gd_path = PathBuf::from(value),
            "PHONE_GD_PATH" => self.phone_gd_path = value.to_string(),
            "PC_GEODE_PATH" => self.pc_geode_path = PathBuf::from(value),
            "PHONE_GEODE_PATH" => self.phone_geode_path = value.to_string(),
            "PC_GDH_PATH" => self.pc_gdh_path = PathBuf::from(value),
            "PHONE_GDH_PATH" => self.phone_gdh_path = value.to_string(),
            other => bail!(
                "unknown configuration key '{}' (expected one of {})",
                other,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// All keys and their current values, in file order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("PC_GD_PATH", self.pc_gd_path.display().to_string()),
            ("PHONE_GD_PATH", self.phone_gd_path.clone()),
            ("PC_GEODE_PATH", self.pc_geode_path.display().to_string()),
            ("PHONE_GEODE_PATH", self.phone_geode_path.clone()),
            ("PC_GDH_PATH", self.pc_gdh_path.display().to_string()),
            ("PHONE_GDH_PATH", self.phone_gdh_path.clone()),
        ]
    }

    /// The main save-data directory pair.
    pub fn game_data_target(&self) -> SyncTarget {
        SyncTarget {
            name: "save data".to_string(),
            local_root: self.pc_gd_path.clone(),
            remote_root: self.phone_gd_path.clone(),
            name_filter: None,
            requires_install_check: false,
        }
    }

    /// The Geode mods pair. Pushing checks that Geode is installed first.
    pub fn geode_target(&self) -> Result<SyncTarget> {
        Ok(SyncTarget {
            name: "Geode mods".to_string(),
            local_root: self.pc_geode_path.clone(),
            remote_root: self.phone_geode_path.clone(),
            name_filter: Some(glob::Pattern::new("*.geode")?),
            requires_install_check: true,
        })
    }

    /// The GDH replay macros pair.
    pub fn gdh_target(&self) -> Result<SyncTarget> {
        Ok(SyncTarget {
            name: "GDH replays".to_string(),
            local_root: self.pc_gdh_path.clone(),
            remote_root: self.phone_gdh_path.clone(),
            name_filter: Some(glob::Pattern::new("*.macro")?),
            requires_install_check: true,
        })
    }
}

/// Default location: `<config_dir>/gdsync/gdsync.conf`.
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("could not determine the configuration directory")?;
    Ok(dir.join("gdsync").join("gdsync.conf"))
}

/// Strip one pair of surrounding double quotes, if present. Shared with the
/// license file, which uses the same quoting.
pub(crate) fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
