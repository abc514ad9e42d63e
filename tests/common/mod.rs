//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, path::Path};

use arch_installer::{
    cmd::{CommandOutput, CommandRunner, CommandSpec},
    config::{FilesystemType, InstallConfig},
    error::{InstallerError, Result},
    host::HostProbe,
};

pub const ROOT_UUID: &str = "3f1c2b9e-5d6a-4e8f-9a7b-0c1d2e3f4a5b";
pub const FSTAB_ENTRIES: &str = "# /dev/sda3\nUUID=3f1c2b9e-5d6a-4e8f-9a7b-0c1d2e3f4a5b\t/\text4\trw,relatime\t0 1";

/// `arch-chroot <root> <program>` is keyed by `program`, everything else by
/// the program itself.
pub fn command_key(spec: &CommandSpec) -> String {
    if spec.program() == "arch-chroot" {
        spec.arguments().get(1).cloned().unwrap_or_default()
    } else {
        spec.program().to_string()
    }
}

/// Records every command and answers the few queries the installer makes.
pub struct RecordingRunner {
    pub calls: RefCell<Vec<CommandSpec>>,
    fail_key: Option<String>,
    responses: HashMap<String, String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        let mut responses = HashMap::new();
        responses.insert("findmnt".to_string(), "/dev/sda3".to_string());
        responses.insert("blkid".to_string(), ROOT_UUID.to_string());
        responses.insert("genfstab".to_string(), FSTAB_ENTRIES.to_string());
        RecordingRunner {
            calls: RefCell::new(Vec::new()),
            fail_key: None,
            responses,
        }
    }

    /// Makes the first command with this key exit 1.
    pub fn failing_on(key: &str) -> Self {
        RecordingRunner {
            fail_key: Some(key.to_string()),
            ..RecordingRunner::new()
        }
    }

    pub fn respond(mut self, key: &str, stdout: &str) -> Self {
        self.responses.insert(key.to_string(), stdout.to_string());
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.calls.borrow().iter().map(command_key).collect()
    }

    /// Rendered command lines with `root` replaced by `/mnt`.
    pub fn lines(&self, root: &Path) -> Vec<String> {
        let root = root.display().to_string();
        self.calls
            .borrow()
            .iter()
            .map(|c| c.to_string().replace(&root, "/mnt"))
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn execute(&self, spec: &CommandSpec, fail_on_non_zero: bool) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let key = command_key(spec);

        let out = if self.fail_key.as_deref() == Some(key.as_str()) {
            CommandOutput {
                stdout: String::new(),
                stderr: format!("{}: simulated failure", key),
                exit_code: 1,
            }
        } else {
            CommandOutput {
                stdout: self.responses.get(&key).cloned().unwrap_or_default(),
                ..CommandOutput::default()
            }
        };
        out.check(spec, fail_on_non_zero)
    }
}

pub struct FakeHost {
    pub mem_kib: Option<u64>,
    pub root_mounted: bool,
    pub busy: Vec<String>,
}

impl FakeHost {
    pub fn with_ram(mem_kib: u64) -> Self {
        FakeHost {
            mem_kib: Some(mem_kib),
            root_mounted: false,
            busy: vec!["/dev/sdb1".to_string()],
        }
    }
}

impl HostProbe for FakeHost {
    fn mem_total_kib(&self) -> Result<u64> {
        self.mem_kib
            .ok_or_else(|| InstallerError::precondition("MemTotal missing from /proc/meminfo"))
    }

    fn is_mount_point(&self, _path: &Path) -> Result<bool> {
        Ok(self.root_mounted)
    }

    fn busy_devices(&self) -> Result<Vec<String>> {
        Ok(self.busy.clone())
    }
}

pub fn config(disk: &str, fs: FilesystemType) -> InstallConfig {
    InstallConfig::new(disk, fs, "Europe/Moscow", "alice", "correct horse", "correct horse")
        .expect("valid test config")
}
