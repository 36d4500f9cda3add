//! Preflight probes against the device bridge.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::bridge::command::BridgeCommand;
use crate::bridge::executor::BridgeExecutor;

/// Marker adb prints for a device that is attached and authorized.
/// `offline` and `unauthorized` states must not match.
const ATTACHED_MARKER: &str = "\tdevice";

/// Verify the bridge tool itself answers. Returns its version banner line.
pub async fn probe_version(bridge: &dyn BridgeExecutor) -> Result<String> {
    let out = bridge
        .run(&BridgeCommand::Version)
        .await
        .context("adb not found or not working. Place adb next to the gdsync executable or on the search path")?;

    if !out.success {
        bail!(
            "adb did not answer the version probe (exit code {}). Reinstall platform-tools or point --adb at a working binary",
            out.exit_code
        );
    }

    Ok(out.text.lines().next().unwrap_or("").to_string())
}

/// Check that at least one authorized device is attached.
pub async fn authorized_device_attached(bridge: &dyn BridgeExecutor) -> Result<()> {
    let out = bridge
        .run(&BridgeCommand::ListDevices)
        .await
        .context("failed to execute the device-list command")?;

    if !out.success {
        bail!(
            "adb could not list devices (exit code {})",
            out.exit_code
        );
    }

    if has_authorized_device(&out.text) {
        info!("authorized device found");
        return Ok(());
    }

    bail!(
        "no authorized Android device detected.\n\
         - Enable USB debugging on the phone\n\
         - Check the phone screen for an authorization prompt\n\
         - Make sure the correct drivers are installed"
    );
}

/// Parse `adb devices` output: the first line is a header, every following
/// line is `<serial>\t<state>`.
fn has_authorized_device(output: &str) -> bool {
    output
        .lines()
        .skip(1)
        .any(|line| line.contains(ATTACHED_MARKER))
}
