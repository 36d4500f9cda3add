use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use gdsync::bridge::command::BridgeCommand;
use gdsync::bridge::executor::{BridgeExecutor, BridgeOutput};
use gdsync::sync::engine::{SyncEngine, SyncJob, SyncMode, SyncPlan, SyncTarget};
use gdsync::sync::policy::SyncDirection;

fn ok(text: &str) -> BridgeOutput {
    BridgeOutput {
        success: true,
        exit_code: 0,
        text: text.to_string(),
    }
}

fn fail(text: &str) -> BridgeOutput {
    BridgeOutput {
        success: false,
        exit_code: 1,
        text: text.to_string(),
    }
}

/// Scripted bridge. Responses are keyed by the rendered argument vector;
/// anything unscripted gets a sensible default (bridge up, one authorized
/// device, every existence probe a miss, every transfer a success).
struct FakeBridge {
    responses: Mutex<HashMap<Vec<String>, BridgeOutput>>,
    invocations: Mutex<Vec<Vec<String>>>,
}

impl FakeBridge {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(HashMap::new()),
            invocations: Mutex::new(Vec::new()),
        })
    }

    fn respond(&self, cmd: &BridgeCommand, output: BridgeOutput) {
        self.responses.lock().unwrap().insert(cmd.args(), output);
    }

    fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().unwrap().clone()
    }

    fn count_starting_with(&self, first_arg: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|args| args.first().map(String::as_str) == Some(first_arg))
            .count()
    }
}

#[async_trait]
impl BridgeExecutor for FakeBridge {
    async fn run(&self, cmd: &BridgeCommand) -> Result<BridgeOutput> {
        let args = cmd.args();
        self.invocations.lock().unwrap().push(args.clone());
        if let Some(output) = self.responses.lock().unwrap().get(&args) {
            return Ok(output.clone());
        }
        Ok(match cmd {
            BridgeCommand::Version => ok("Android Debug Bridge version 1.0.41"),
            BridgeCommand::ListDevices => ok("List of devices attached\nR58M123ABC\tdevice\n"),
            BridgeCommand::FileExists { .. }
            | BridgeCommand::DirExists { .. }
            | BridgeCommand::ReadMtime { .. } => fail(""),
            BridgeCommand::ListDir { .. }
            | BridgeCommand::MkdirP { .. }
            | BridgeCommand::Push { .. }
            | BridgeCommand::Pull { .. } => ok(""),
        })
    }
}

fn save_target(local_root: &Path) -> SyncTarget {
    SyncTarget {
        name: "save data".to_string(),
        local_root: local_root.to_path_buf(),
        remote_root: "/sdcard/save".to_string(),
        name_filter: None,
        requires_install_check: false,
    }
}

fn plan(direction: SyncDirection, target: SyncTarget, mode: SyncMode) -> SyncPlan {
    SyncPlan {
        direction,
        jobs: vec![SyncJob { target, mode }],
    }
}

#[tokio::test]
async fn all_files_pull_without_smart_transfers_everything() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.dat"), b"old local").unwrap();

    let bridge = FakeBridge::new();
    bridge.respond(
        &BridgeCommand::ListDir {
            path: "/sdcard/save".to_string(),
            name_glob: None,
        },
        ok("a.dat\nb.ogg\n"),
    );

    let engine = SyncEngine::new(bridge.clone(), false);
    let summaries = engine
        .run(&plan(
            SyncDirection::RemoteToLocal,
            save_target(dir.path()),
            SyncMode::AllFiles,
        ))
        .await
        .unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].transferred, 2);
    assert_eq!(summaries[0].skipped, 0);
    assert_eq!(summaries[0].failed, 0);
    assert_eq!(bridge.count_starting_with("pull"), 2);

    // The preexisting local file was backed up before the overwrite; the
    // fresh file was not.
    assert_eq!(fs::read(dir.path().join("a.dat.bak")).unwrap(), b"old local");
    assert!(!dir.path().join("b.ogg.bak").exists());
}

#[tokio::test]
async fn smart_pull_skips_current_files_but_still_pulls_critical() {
    let dir = tempfile::tempdir().unwrap();
    // The local copy is written now, far newer than the scripted remote
    // timestamp below.
    fs::write(dir.path().join("theme.ogg"), b"audio").unwrap();
    fs::write(dir.path().join("CCGameManager.dat"), b"save").unwrap();

    let bridge = FakeBridge::new();
    bridge.respond(
        &BridgeCommand::ListDir {
            path: "/sdcard/save".to_string(),
            name_glob: None,
        },
        ok("theme.ogg\nCCGameManager.dat\n"),
    );
    bridge.respond(
        &BridgeCommand::ReadMtime {
            path: "/sdcard/save/theme.ogg".to_string(),
        },
        ok("100\n"),
    );

    let engine = SyncEngine::new(bridge.clone(), true);
    let summaries = engine
        .run(&plan(
            SyncDirection::RemoteToLocal,
            save_target(dir.path()),
            SyncMode::AllFiles,
        ))
        .await
        .unwrap();

    assert_eq!(summaries[0].transferred, 1);
    assert_eq!(summaries[0].skipped, 1);
    assert_eq!(bridge.count_starting_with("pull"), 1);

    // Critical saves never cost a timestamp lookup.
    let mtime_reads: Vec<_> = bridge
        .invocations()
        .into_iter()
        .filter(|args| args.len() == 2 && args[1].starts_with("stat"))
        .collect();
    assert_eq!(mtime_reads.len(), 1);
    assert!(mtime_reads[0][1].contains("theme.ogg"));
}

#[tokio::test]
async fn second_smart_pull_is_idempotent_for_noncritical() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("theme.ogg"), b"audio").unwrap();

    let bridge = FakeBridge::new();
    bridge.respond(
        &BridgeCommand::ListDir {
            path: "/sdcard/save".to_string(),
            name_glob: None,
        },
        ok("theme.ogg\n"),
    );
    // Remote and local mtimes tie exactly.
    let local_mtime = gdsync::sync::mtime::local_mtime(&dir.path().join("theme.ogg")).unwrap();
    bridge.respond(
        &BridgeCommand::ReadMtime {
            path: "/sdcard/save/theme.ogg".to_string(),
        },
        ok(&format!("{}\n", local_mtime.timestamp())),
    );

    let engine = SyncEngine::new(bridge.clone(), true);
    let p = plan(
        SyncDirection::RemoteToLocal,
        save_target(dir.path()),
        SyncMode::AllFiles,
    );
    let summaries = engine.run(&p).await.unwrap();

    assert_eq!(summaries[0].transferred, 0);
    assert_eq!(summaries[0].skipped, 1);
    assert_eq!(bridge.count_starting_with("pull"), 0);
    assert!(!dir.path().join("theme.ogg.bak").exists());
}

#[tokio::test]
async fn offline_device_aborts_before_any_transfer() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("CCGameManager.dat"), b"save").unwrap();

    let bridge = FakeBridge::new();
    bridge.respond(
        &BridgeCommand::ListDevices,
        ok("List of devices attached\nEMULATOR1\toffline\n"),
    );

    let engine = SyncEngine::new(bridge.clone(), false);
    let err = engine
        .run(&plan(
            SyncDirection::LocalToRemote,
            save_target(dir.path()),
            SyncMode::CriticalOnly,
        ))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no authorized Android device"));
    assert_eq!(bridge.count_starting_with("push"), 0);
    assert_eq!(bridge.count_starting_with("pull"), 0);
    // Nothing past the device listing was attempted.
    assert_eq!(bridge.count_starting_with("shell"), 0);
}

#[tokio::test]
async fn geode_push_is_skipped_when_not_installed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cool-mod.geode"), b"mod").unwrap();

    let bridge = FakeBridge::new();
    // The default DirExists response is a miss, so no scripting needed.
    let target = SyncTarget {
        name: "Geode mods".to_string(),
        local_root: dir.path().to_path_buf(),
        remote_root: "/sdcard/game/geode/mods".to_string(),
        name_filter: Some(glob::Pattern::new("*.geode").unwrap()),
        requires_install_check: true,
    };

    let engine = SyncEngine::new(bridge.clone(), false);
    let summaries = engine
        .run(&plan(
            SyncDirection::LocalToRemote,
            target,
            SyncMode::AllFiles,
        ))
        .await
        .unwrap();

    assert_eq!(summaries[0].transferred, 0);
    assert_eq!(summaries[0].skipped, 0);
    assert_eq!(summaries[0].failed, 0);
    assert_eq!(bridge.count_starting_with("push"), 0);
    // The job bailed before even creating the remote directory.
    let mkdirs = bridge
        .invocations()
        .into_iter()
        .filter(|args| args.len() == 2 && args[1].starts_with("mkdir"))
        .count();
    assert_eq!(mkdirs, 0);
}

#[tokio::test]
async fn critical_only_pull_fetches_only_files_present_remotely() {
    let dir = tempfile::tempdir().unwrap();

    let bridge = FakeBridge::new();
    bridge.respond(
        &BridgeCommand::FileExists {
            path: "/sdcard/save/CCLocalLevels.dat".to_string(),
        },
        ok("EXISTS\n"),
    );

    let engine = SyncEngine::new(bridge.clone(), false);
    let summaries = engine
        .run(&plan(
            SyncDirection::RemoteToLocal,
            save_target(dir.path()),
            SyncMode::CriticalOnly,
        ))
        .await
        .unwrap();

    assert_eq!(summaries[0].transferred, 1);
    assert_eq!(bridge.count_starting_with("pull"), 1);
    let pulls: Vec<_> = bridge
        .invocations()
        .into_iter()
        .filter(|args| args.first().map(String::as_str) == Some("pull"))
        .collect();
    assert_eq!(pulls[0][1], "/sdcard/save/CCLocalLevels.dat");
}

/// In-memory log sink for asserting on emitted diagnostics.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn missing_remote_critical_file_is_logged_by_name() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = tempfile::tempdir().unwrap();
    let bridge = FakeBridge::new();
    bridge.respond(
        &BridgeCommand::FileExists {
            path: "/sdcard/save/CCLocalLevels.dat".to_string(),
        },
        ok("EXISTS\n"),
    );

    let engine = SyncEngine::new(bridge.clone(), false);
    engine
        .run(&plan(
            SyncDirection::RemoteToLocal,
            save_target(dir.path()),
            SyncMode::CriticalOnly,
        ))
        .await
        .unwrap();

    // The three registry files absent on the device each leave a trace.
    let text = logs.contents();
    assert!(text.contains("CCLocalLevels2.dat not found on the device"));
    assert!(text.contains("CCGameManager.dat not found on the device"));
    assert!(text.contains("CCGameManager2.dat not found on the device"));
}

#[tokio::test]
async fn failed_transfer_is_counted_and_the_job_continues() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("CCGameManager.dat"), b"save").unwrap();
    fs::write(dir.path().join("CCLocalLevels.dat"), b"levels").unwrap();

    let bridge = FakeBridge::new();
    bridge.respond(
        &BridgeCommand::Push {
            local: dir.path().join("CCGameManager.dat"),
            remote: "/sdcard/save/CCGameManager.dat".to_string(),
        },
        fail("adb: error: failed to copy"),
    );

    let engine = SyncEngine::new(bridge.clone(), false);
    let summaries = engine
        .run(&plan(
            SyncDirection::LocalToRemote,
            save_target(dir.path()),
            SyncMode::CriticalOnly,
        ))
        .await
        .unwrap();

    assert_eq!(summaries[0].transferred, 1);
    assert_eq!(summaries[0].failed, 1);
    assert_eq!(bridge.count_starting_with("push"), 2);
}
