//! Per-file transfer decision.

use chrono::{DateTime, Utc};

/// Direction of a whole sync run. A run is entirely one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// PC to phone.
    LocalToRemote,
    /// Phone to PC.
    RemoteToLocal,
}

impl SyncDirection {
    /// The transfer action matching this direction.
    pub fn transfer_action(&self) -> TransferAction {
        match self {
            Self::LocalToRemote => TransferAction::Push,
            Self::RemoteToLocal => TransferAction::Pull,
        }
    }
}

/// What to do with one candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    Push,
    Pull,
    Skip,
}

/// Decide the action for one file.
///
/// Rules in order:
/// 1. Critical files follow the direction unconditionally.
/// 2. With smart sync off, everything follows the direction.
/// 3. Otherwise skip only when both timestamps are known and the
///    destination is at least as new as the source. An unknown timestamp
///    must never suppress a transfer: smart sync is a throughput
///    optimization, not a correctness gate.
pub fn decide(
    critical: bool,
    smart_sync: bool,
    direction: SyncDirection,
    local: Option<DateTime<Utc>>,
    remote: Option<DateTime<Utc>>,
) -> TransferAction {
    if critical || !smart_sync {
        return direction.transfer_action();
    }

    match (local, remote) {
        (Some(local), Some(remote)) => {
            // Ties count as "already in sync": <= is kept as-is for
            // compatibility with existing installs.
            let destination_current = match direction {
                SyncDirection::LocalToRemote => local <= remote,
                SyncDirection::RemoteToLocal => remote <= local,
            };
            if destination_current {
                TransferAction::Skip
            } else {
                direction.transfer_action()
            }
        }
        _ => direction.transfer_action(),
    }
}
