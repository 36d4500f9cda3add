//! Typed adb command construction.
//!
//! Every remote operation is one variant here, rendered to an argument
//! vector just before spawning. Centralizing the rendering keeps remote-path
//! quoting in one place and lets tests assert on the exact arguments without
//! spawning anything.

use std::path::PathBuf;

/// One invocation of the device bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Probe that the bridge tool itself is runnable.
    Version,
    /// List attached devices (header line + one line per device).
    ListDevices,
    /// Test whether a regular file exists on the device.
    FileExists { path: String },
    /// Test whether a directory exists on the device.
    DirExists { path: String },
    /// Print the numeric mtime (epoch seconds) of a device file.
    ReadMtime { path: String },
    /// List files (depth 1, files only) under a device directory,
    /// optionally restricted by a shell name glob.
    ListDir {
        path: String,
        name_glob: Option<String>,
    },
    /// Create a device directory, parents included.
    MkdirP { path: String },
    /// Copy a local file onto the device.
    Push { local: PathBuf, remote: String },
    /// Copy a device file onto the local filesystem.
    Pull { remote: String, local: PathBuf },
}

impl BridgeCommand {
    /// Render the adb argument vector for this command.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Version => vec!["version".into()],
            Self::ListDevices => vec!["devices".into()],
            Self::FileExists { path } => shell(format!(
                "[ -f {} ] && echo EXISTS",
                quote(path)
            )),
            Self::DirExists { path } => shell(format!(
                "[ -d {} ] && echo EXISTS",
                quote(path)
            )),
            Self::ReadMtime { path } => shell(format!("stat -c %Y {}", quote(path))),
            Self::ListDir { path, name_glob } => {
                let name_filter = match name_glob {
                    Some(pattern) => format!(" -name '{}'", pattern),
                    None => String::new(),
                };
                shell(format!(
                    "find {} -maxdepth 1{} -type f -printf '%f\\n'",
                    quote(path),
                    name_filter
                ))
            }
            Self::MkdirP { path } => shell(format!("mkdir -p {}", quote(path))),
            Self::Push { local, remote } => vec![
                "push".into(),
                local.to_string_lossy().into_owned(),
                remote.clone(),
            ],
            Self::Pull { remote, local } => vec![
                "pull".into(),
                remote.clone(),
                local.to_string_lossy().into_owned(),
            ],
        }
    }
}

fn shell(command: String) -> Vec<String> {
    vec!["shell".into(), command]
}

/// Quote a remote path for the device shell. Device paths come from
/// configuration, not user-per-file input, so double quotes suffice.
fn quote(path: &str) -> String {
    format!("\"{}\"", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_and_devices() {
        assert_eq!(BridgeCommand::Version.args(), vec!["version"]);
        assert_eq!(BridgeCommand::ListDevices.args(), vec!["devices"]);
    }

    #[test]
    fn test_read_mtime_args() {
        let cmd = BridgeCommand::ReadMtime {
            path: "/sdcard/save/CCGameManager.dat".to_string(),
        };
        assert_eq!(
            cmd.args(),
            vec!["shell", "stat -c %Y \"/sdcard/save/CCGameManager.dat\""]
        );
    }

    #[test]
    fn test_file_exists_args() {
        let cmd = BridgeCommand::FileExists {
            path: "/sdcard/save/a.dat".to_string(),
        };
        assert_eq!(
            cmd.args(),
            vec!["shell", "[ -f \"/sdcard/save/a.dat\" ] && echo EXISTS"]
        );
    }

    #[test]
    fn test_list_dir_without_glob() {
        let cmd = BridgeCommand::ListDir {
            path: "/sdcard/save".to_string(),
            name_glob: None,
        };
        assert_eq!(
            cmd.args(),
            vec![
                "shell",
                "find \"/sdcard/save\" -maxdepth 1 -type f -printf '%f\\n'"
            ]
        );
    }

    #[test]
    fn test_list_dir_with_glob() {
        let cmd = BridgeCommand::ListDir {
            path: "/sdcard/mods".to_string(),
            name_glob: Some("*.geode".to_string()),
        };
        assert_eq!(
            cmd.args(),
            vec![
                "shell",
                "find \"/sdcard/mods\" -maxdepth 1 -name '*.geode' -type f -printf '%f\\n'"
            ]
        );
    }

    #[test]
    fn test_push_pull_args() {
        let push = BridgeCommand::Push {
            local: PathBuf::from("/home/op/save/a.dat"),
            remote: "/sdcard/save/a.dat".to_string(),
        };
        assert_eq!(
            push.args(),
            vec!["push", "/home/op/save/a.dat", "/sdcard/save/a.dat"]
        );

        let pull = BridgeCommand::Pull {
            remote: "/sdcard/save/a.dat".to_string(),
            local: PathBuf::from("/home/op/save/a.dat"),
        };
        assert_eq!(
            pull.args(),
            vec!["pull", "/sdcard/save/a.dat", "/home/op/save/a.dat"]
        );
    }
}
