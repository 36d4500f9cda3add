//! Running-game detection.

use std::ffi::OsStr;
use sysinfo::System;
use tracing::debug;

/// Process image names the game runs under. Exact match only: editors and
/// helper tools with "GeometryDash" somewhere in their name must not trip
/// the guard.
const GAME_PROCESS_NAMES: [&str; 2] = ["GeometryDash.exe", "GeometryDash"];

/// Whether the game is currently running. Syncing while it is open would
/// race its own save writes.
pub fn is_game_running() -> bool {
    let system = System::new_all();
    let running = system.processes().values().any(|process| {
        GAME_PROCESS_NAMES
            .iter()
            .any(|name| process.name() == OsStr::new(name))
    });
    debug!("game running check: {}", running);
    running
}
