use std::{fs, path::Path};

use tracing::debug;

use crate::error::{InstallerError, Result};

/// Read-only view of the machine the installer runs on.
pub trait HostProbe {
    /// `MemTotal` in KiB.
    fn mem_total_kib(&self) -> Result<u64>;

    /// `true` if something is mounted exactly at `path`.
    fn is_mount_point(&self, path: &Path) -> Result<bool>;

    /// Device nodes currently mounted or active as swap.
    fn busy_devices(&self) -> Result<Vec<String>>;
}

/// Probe backed by the real `/proc` filesystem.
#[derive(Debug, Default)]
pub struct LinuxHost;

impl HostProbe for LinuxHost {
    fn mem_total_kib(&self) -> Result<u64> {
        let meminfo = fs::read_to_string("/proc/meminfo")
            .map_err(|e| InstallerError::precondition(format!("cannot read /proc/meminfo: {e}")))?;
        let kib = parse_mem_total(&meminfo)
            .ok_or_else(|| InstallerError::precondition("MemTotal missing from /proc/meminfo"))?;
        debug!(kib, "detected system memory");
        Ok(kib)
    }

    fn is_mount_point(&self, path: &Path) -> Result<bool> {
        let mountinfo = fs::read_to_string("/proc/self/mountinfo")?;
        let wanted = path.display().to_string();
        let mounted = mount_points(&mountinfo).any(|p| p == wanted);
        Ok(mounted)
    }

    fn busy_devices(&self) -> Result<Vec<String>> {
        let mounts = fs::read_to_string("/proc/self/mounts")?;
        let mut devices: Vec<String> = mounts
            .lines()
            .filter_map(|l| l.split_whitespace().next())
            .filter(|src| src.starts_with("/dev/"))
            .map(unescape)
            .collect();

        // /proc/swaps is absent when the kernel has no swap support.
        if let Ok(swaps) = fs::read_to_string("/proc/swaps") {
            devices.extend(active_swaps(&swaps));
        }
        Ok(devices)
    }
}

/// Returns `true` when the effective UID is 0.
pub fn is_root() -> bool {
    fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|s| effective_uid(&s))
        .map(|uid| uid == 0)
        .unwrap_or(false) // unreadable means we cannot prove we are root
}

// ── /proc parsers ─────────────────────────────────────────────────────────────

/// `MemTotal:       16314328 kB`
pub fn parse_mem_total(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find(|l| l.starts_with("MemTotal:"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
}

/// `Uid:  real  effective  saved  fs`
pub fn effective_uid(status: &str) -> Option<u32> {
    status
        .lines()
        .find(|l| l.starts_with("Uid:"))
        .and_then(|l| l.split_whitespace().nth(2))
        .and_then(|v| v.parse().ok())
}

/// Mount points (field 5) of `/proc/self/mountinfo`, octal escapes decoded.
pub fn mount_points(mountinfo: &str) -> impl Iterator<Item = String> + '_ {
    mountinfo
        .lines()
        .filter_map(|l| l.split_whitespace().nth(4))
        .map(unescape)
}

/// Device column of `/proc/swaps`, header skipped.
pub fn active_swaps(swaps: &str) -> impl Iterator<Item = String> + '_ {
    swaps
        .lines()
        .skip(1)
        .filter_map(|l| l.split_whitespace().next())
        .map(unescape)
}

/// The kernel escapes space, tab, newline and backslash as `\ooo`.
fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 4);
        match code.and_then(|c| u8::from_str_radix(c, 8).ok()) {
            Some(byte) => {
                out.push(byte as char);
                rest = &rest[pos + 4..];
            }
            None => {
                out.push('\\');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
