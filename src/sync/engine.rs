//! Directory sync engine.
//!
//! A run is: preflight the bridge, then mirror each planned target pair in
//! one direction, one file at a time. Per-file problems are counted and the
//! job continues; only a broken bridge or a failed preflight aborts the run.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bridge::command::BridgeCommand;
use crate::bridge::device;
use crate::bridge::executor::BridgeExecutor;
use crate::game;
use crate::sync::backup;
use crate::sync::classify::{self, CRITICAL_FILES};
use crate::sync::mtime;
use crate::sync::policy::{self, SyncDirection, TransferAction};

/// Which files a job considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Only the fixed critical-save registry.
    CriticalOnly,
    /// Everything at depth 1 under the roots, honoring the target's filter.
    AllFiles,
}

/// One directory pair to mirror.
#[derive(Debug, Clone)]
pub struct SyncTarget {
    /// Operator-facing label used in logs and summaries.
    pub name: String,
    pub local_root: PathBuf,
    pub remote_root: String,
    /// Filename filter for AllFiles enumeration, e.g. `*.geode`.
    pub name_filter: Option<glob::Pattern>,
    /// Push-side guard: skip the job when the remote install directory is
    /// absent, instead of creating it and stranding files there.
    pub requires_install_check: bool,
}

/// One target with its enumeration mode.
#[derive(Debug, Clone)]
pub struct SyncJob {
    pub target: SyncTarget,
    pub mode: SyncMode,
}

/// A whole run: one direction, jobs executed in order.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub direction: SyncDirection,
    pub jobs: Vec<SyncJob>,
}

/// Per-target accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub target: String,
    pub transferred: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncSummary {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            transferred: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

pub struct SyncEngine {
    bridge: Arc<dyn BridgeExecutor>,
    smart_sync: bool,
}

impl SyncEngine {
    pub fn new(bridge: Arc<dyn BridgeExecutor>, smart_sync: bool) -> Self {
        Self { bridge, smart_sync }
    }

    /// Verify the bridge answers and an authorized device is attached.
    /// Either failure aborts the run before any file is touched.
    pub async fn preflight(&self) -> Result<()> {
        let version = device::probe_version(self.bridge.as_ref()).await?;
        info!("device bridge ready: {}", version);
        device::authorized_device_attached(self.bridge.as_ref()).await
    }

    /// Execute a whole plan. Returns one summary per executed job.
    pub async fn run(&self, plan: &SyncPlan) -> Result<Vec<SyncSummary>> {
        if game::is_game_running() {
            bail!(
                "Geometry Dash is running. Close the game first so save files \
                 are not rewritten mid-transfer"
            );
        }
        self.preflight().await?;

        let mut summaries = Vec::with_capacity(plan.jobs.len());
        for job in &plan.jobs {
            let summary = self
                .sync_target(&job.target, plan.direction, job.mode)
                .await?;
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Mirror one target pair. Per-file failures are counted, not fatal.
    pub async fn sync_target(
        &self,
        target: &SyncTarget,
        direction: SyncDirection,
        mode: SyncMode,
    ) -> Result<SyncSummary> {
        let mut summary = SyncSummary::new(&target.name);
        info!(
            "syncing {}: {} <-> {}",
            target.name,
            target.local_root.display(),
            target.remote_root
        );

        if target.requires_install_check && direction == SyncDirection::LocalToRemote {
            if !self.remote_dir_exists(&target.remote_root).await? {
                warn!(
                    "{}: {} not found on the device, is it installed? Skipping",
                    target.name, target.remote_root
                );
                return Ok(summary);
            }
        }

        // Make sure the destination root exists before any transfer.
        match direction {
            SyncDirection::LocalToRemote => {
                let out = self
                    .bridge
                    .run(&BridgeCommand::MkdirP {
                        path: target.remote_root.clone(),
                    })
                    .await?;
                if !out.success {
                    warn!(
                        "{}: could not create {} on the device (exit code {})",
                        target.name, target.remote_root, out.exit_code
                    );
                }
            }
            SyncDirection::RemoteToLocal => {
                std::fs::create_dir_all(&target.local_root).with_context(|| {
                    format!("failed to create {}", target.local_root.display())
                })?;
            }
        }

        for name in self.enumerate(target, direction, mode).await? {
            self.sync_file(target, direction, &name, &mut summary)
                .await?;
        }

        info!(
            "{}: {} transferred, {} skipped, {} failed",
            summary.target, summary.transferred, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    /// Candidate filenames at the source side of the transfer.
    async fn enumerate(
        &self,
        target: &SyncTarget,
        direction: SyncDirection,
        mode: SyncMode,
    ) -> Result<Vec<String>> {
        match (mode, direction) {
            (SyncMode::CriticalOnly, SyncDirection::LocalToRemote) => Ok(CRITICAL_FILES
                .iter()
                .filter(|name| target.local_root.join(name).is_file())
                .map(|name| name.to_string())
                .collect()),
            (SyncMode::CriticalOnly, SyncDirection::RemoteToLocal) => {
                let mut names = Vec::new();
                for name in CRITICAL_FILES {
                    let path = remote_join(&target.remote_root, name);
                    if self.remote_file_exists(&path).await? {
                        names.push(name.to_string());
                    } else {
                        debug!("{} not found on the device, skipping", name);
                    }
                }
                Ok(names)
            }
            (SyncMode::AllFiles, SyncDirection::LocalToRemote) => {
                Ok(list_local(target))
            }
            (SyncMode::AllFiles, SyncDirection::RemoteToLocal) => {
                let out = self
                    .bridge
                    .run(&BridgeCommand::ListDir {
                        path: target.remote_root.clone(),
                        name_glob: target.name_filter.as_ref().map(|p| p.as_str().to_string()),
                    })
                    .await?;
                if !out.success {
                    warn!(
                        "{}: could not list {} on the device (exit code {})",
                        target.name, target.remote_root, out.exit_code
                    );
                    return Ok(Vec::new());
                }
                Ok(out
                    .text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect())
            }
        }
    }

    /// Decide and, if warranted, transfer one file.
    async fn sync_file(
        &self,
        target: &SyncTarget,
        direction: SyncDirection,
        name: &str,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        let critical = classify::is_critical(name);
        let local_path = target.local_root.join(name);
        let remote_path = remote_join(&target.remote_root, name);

        // Timestamps cost a bridge round trip each; only resolve them when
        // the decision can actually depend on them.
        let (local_mt, remote_mt) = if self.smart_sync && !critical {
            (
                mtime::local_mtime(&local_path),
                mtime::remote_mtime(self.bridge.as_ref(), &remote_path).await,
            )
        } else {
            (None, None)
        };

        let action = policy::decide(critical, self.smart_sync, direction, local_mt, remote_mt);
        let cmd = match action {
            TransferAction::Skip => {
                debug!("{} is up to date, skipping", name);
                summary.skipped += 1;
                return Ok(());
            }
            TransferAction::Push => BridgeCommand::Push {
                local: local_path.clone(),
                remote: remote_path.clone(),
            },
            TransferAction::Pull => {
                backup::protect(&local_path);
                BridgeCommand::Pull {
                    remote: remote_path.clone(),
                    local: local_path.clone(),
                }
            }
        };

        let out = self.bridge.run(&cmd).await?;
        if out.success {
            info!("transferred {}", name);
            summary.transferred += 1;
        } else {
            warn!(
                "transfer failed for {} (exit code {}): {}",
                name,
                out.exit_code,
                out.text.trim()
            );
            summary.failed += 1;
        }
        Ok(())
    }

    async fn remote_file_exists(&self, path: &str) -> Result<bool> {
        let out = self
            .bridge
            .run(&BridgeCommand::FileExists {
                path: path.to_string(),
            })
            .await?;
        // The test command exits non-zero on a miss; only the marker in the
        // captured text counts as a hit.
        Ok(out.text.contains("EXISTS"))
    }

    async fn remote_dir_exists(&self, path: &str) -> Result<bool> {
        let out = self
            .bridge
            .run(&BridgeCommand::DirExists {
                path: path.to_string(),
            })
            .await?;
        Ok(out.text.contains("EXISTS"))
    }
}

/// Depth-1 regular files under the local root, honoring the name filter.
/// A missing or unreadable root yields no candidates.
fn list_local(target: &SyncTarget) -> Vec<String> {
    let entries = match std::fs::read_dir(&target.local_root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                "{}: could not list {}: {}",
                target.name,
                target.local_root.display(),
                err
            );
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    for entry in entries.flatten() {
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(filter) = &target.name_filter {
            if !filter.matches(&name) {
                continue;
            }
        }
        names.push(name);
    }
    names
}

/// Join a device path. Remote roots are always forward-slash paths.
fn remote_join(root: &str, name: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), name)
}
