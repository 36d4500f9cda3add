use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::bridge::command::BridgeCommand;

/// Default cap on captured command output. Device listings of save
/// directories are small; anything past this is truncated, not buffered.
const DEFAULT_OUTPUT_LIMIT: usize = 64 * 1024;

/// Captured result of one bridge invocation.
#[derive(Debug, Clone)]
pub struct BridgeOutput {
    /// True iff the process exited with code zero.
    pub success: bool,
    /// Raw exit code (-1 if terminated without one).
    pub exit_code: i32,
    /// Combined stdout+stderr text, truncated at the configured limit.
    pub text: String,
}

/// Executes bridge commands. The engine only ever sees this trait, so tests
/// can script device behavior without a device attached.
#[async_trait]
pub trait BridgeExecutor: Send + Sync {
    /// Run one command to completion and capture its output.
    ///
    /// An `Err` means the bridge process could not be spawned at all; the
    /// caller must treat that as "unknown state", never as "remote absent".
    async fn run(&self, cmd: &BridgeCommand) -> Result<BridgeOutput>;
}

/// The real adb-backed executor.
pub struct AdbBridge {
    adb_path: PathBuf,
    output_limit: usize,
}

impl AdbBridge {
    pub fn new(adb_path: PathBuf) -> Self {
        Self {
            adb_path,
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    /// Resolve the adb executable: prefer one shipped next to our own
    /// executable, otherwise fall back to the default search path.
    pub fn locate() -> PathBuf {
        let name = if cfg!(windows) { "adb.exe" } else { "adb" };
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let sibling = dir.join(name);
                if sibling.is_file() {
                    return sibling;
                }
            }
        }
        PathBuf::from(name)
    }
}

#[async_trait]
impl BridgeExecutor for AdbBridge {
    async fn run(&self, cmd: &BridgeCommand) -> Result<BridgeOutput> {
        let args = cmd.args();
        info!("executing: {} {}", self.adb_path.display(), args.join(" "));

        let mut child = tokio::process::Command::new(&self.adb_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!("Failed to run device bridge: {}", self.adb_path.display())
            })?;

        // Both pipes are drained concurrently so a transfer that fills one
        // of them (adb progress output) never deadlocks the child.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (out, err) = tokio::join!(
            read_capped(stdout, self.output_limit),
            read_capped(stderr, self.output_limit),
        );
        let out = out.context("failed to read bridge stdout")?;
        let err = err.context("failed to read bridge stderr")?;

        let status = child
            .wait()
            .await
            .context("failed to wait for the device bridge to exit")?;

        let mut text = String::from_utf8_lossy(&out).into_owned();
        text.push_str(&String::from_utf8_lossy(&err));
        if text.len() > self.output_limit {
            let mut cut = self.output_limit;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }

        let exit_code = status.code().unwrap_or(-1);
        debug!("bridge command finished with exit code {}", exit_code);

        Ok(BridgeOutput {
            success: status.success(),
            exit_code,
            text,
        })
    }
}

/// Drain a stream to EOF, keeping at most `limit` bytes. Bytes past the cap
/// are read and discarded: the child keeps writing after we stop keeping,
/// so nothing accumulates beyond the cap and the pipe never backs up.
async fn read_capped<R>(stream: Option<R>, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut stream) = stream else {
        return Ok(Vec::new());
    };
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if kept.len() < limit {
            let take = n.min(limit - kept.len());
            kept.extend_from_slice(&chunk[..take]);
        }
    }
    Ok(kept)
}
