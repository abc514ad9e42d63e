use std::{
    fmt,
    path::{Path, PathBuf},
};

use strum::{Display, EnumIter, EnumString};

use crate::validation::{self, ValidationError};

// ── Fixed installation constants ──────────────────────────────────────────────

pub const MOUNT_ROOT: &str = "/mnt";
pub const HOSTNAME: &str = "archlinux";
pub const FQDN: &str = "archlinux.localdomain";
pub const LANG: &str = "en_US.UTF-8";
pub const LOCALES: [&str; 2] = ["en_US.UTF-8 UTF-8", "ru_RU.UTF-8 UTF-8"];
pub const CONSOLE_FONT: &str = "cyr-sun16";
pub const LOADER_TIMEOUT_SECS: u32 = 3;
pub const BOOT_ENTRY: &str = "arch.conf";

pub const BASE_PACKAGES: [&str; 4] = ["base", "base-devel", "linux", "linux-firmware"];

pub const EXTRA_PACKAGES: [&str; 13] = [
    "networkmanager",
    "sudo",
    "vim",
    "bash-completion",
    "git",
    "openssh",
    "htop",
    "man-db",
    "man-pages",
    "texinfo",
    "gdm",
    "gnome",
    "gnome-tweaks",
];

pub const NETWORK_SERVICES: [&str; 2] = ["systemd-networkd", "systemd-resolved"];

// ── Filesystem choice ─────────────────────────────────────────────────────────

/// Root filesystem offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FilesystemType {
    Ext4,
    Btrfs,
    Xfs,
    Ext3,
}

impl FilesystemType {
    /// `mkfs` invocation for the root partition, minus the device argument.
    pub fn mkfs_command(self) -> (&'static str, &'static str) {
        match self {
            FilesystemType::Ext4 => ("mkfs.ext4", "-F"),
            FilesystemType::Ext3 => ("mkfs.ext3", "-F"),
            FilesystemType::Btrfs => ("mkfs.btrfs", "-f"),
            FilesystemType::Xfs => ("mkfs.xfs", "-f"),
        }
    }

    /// Userspace tools needed to fsck/maintain the filesystem after boot.
    pub fn support_package(self) -> &'static str {
        match self {
            FilesystemType::Ext4 | FilesystemType::Ext3 => "e2fsprogs",
            FilesystemType::Btrfs => "btrfs-progs",
            FilesystemType::Xfs => "xfsprogs",
        }
    }

    /// Initial ramdisk referenced by the boot entry.
    pub fn initramfs_image(self) -> &'static str {
        match self {
            FilesystemType::Btrfs => "initramfs-linux-btrfs.img",
            _ => "initramfs-linux.img",
        }
    }

    /// Human-readable label shown to the user.
    pub fn display_name(self) -> &'static str {
        match self {
            FilesystemType::Ext4 => "ext4   journaling, the safe default",
            FilesystemType::Btrfs => "btrfs  copy-on-write, snapshots",
            FilesystemType::Xfs => "xfs    high-throughput, large files",
            FilesystemType::Ext3 => "ext3   legacy journaling",
        }
    }
}

// ── Secrets ───────────────────────────────────────────────────────────────────

/// A password that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ── User choices ──────────────────────────────────────────────────────────────

/// Every choice the user made, validated once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    disk: String,
    filesystem: FilesystemType,
    timezone: String,
    username: String,
    password: Secret,
}

impl InstallConfig {
    /// Builds the configuration, checking the username format and that the
    /// password was entered identically twice.
    pub fn new(
        disk: impl Into<String>,
        filesystem: FilesystemType,
        timezone: impl Into<String>,
        username: impl Into<String>,
        password: &str,
        confirmation: &str,
    ) -> Result<Self, ValidationError> {
        let username = username.into();
        validation::validate_username(&username)?;
        validation::check_password_pair(password, confirmation)?;

        Ok(InstallConfig {
            disk: disk.into(),
            filesystem,
            timezone: timezone.into(),
            username,
            password: Secret::new(password),
        })
    }

    pub fn disk(&self) -> &str {
        &self.disk
    }

    pub fn filesystem(&self) -> FilesystemType {
        self.filesystem
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &Secret {
        &self.password
    }
}

// ── Target tree ───────────────────────────────────────────────────────────────

/// The mount root the new system is assembled under, plus the paths inside it
/// that the installer writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    root: PathBuf,
}

impl Default for Target {
    fn default() -> Self {
        Target::new(MOUNT_ROOT)
    }
}

impl Target {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Target { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The root as a command argument.
    pub fn root_arg(&self) -> String {
        self.root.display().to_string()
    }

    pub fn boot(&self) -> PathBuf {
        self.root.join("boot")
    }

    /// A path inside the new system, e.g. `path("etc/hostname")`.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }
}
