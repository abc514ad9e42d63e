use std::fmt;

use crate::error::{InstallerError, Result};

/// Start of the first partition, leaving room for the GPT header.
pub const EFI_START_MIB: u64 = 1;
pub const EFI_SIZE_MIB: u64 = 512;

pub const EFI_PARTITION: u32 = 1;
pub const SWAP_PARTITION: u32 = 2;
pub const ROOT_PARTITION: u32 = 3;

/// Where a partition ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionEnd {
    /// Exclusive end offset in MiB.
    Mib(u64),
    /// Up to the end of the disk.
    Rest,
}

impl fmt::Display for PartitionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionEnd::Mib(n) => write!(f, "{}MiB", n),
            PartitionEnd::Rest => f.write_str("100%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSpec {
    /// 1-based partition number on the disk.
    pub number: u32,
    /// Device node, e.g. `/dev/sda1` or `/dev/nvme0n1p1`.
    pub device: String,
    pub start_mib: u64,
    pub end: PartitionEnd,
    /// `parted mkpart` filesystem-type hint; empty for none.
    pub parted_type: &'static str,
}

impl PartitionSpec {
    pub fn start_arg(&self) -> String {
        format!("{}MiB", self.start_mib)
    }

    pub fn end_arg(&self) -> String {
        self.end.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskLayout {
    pub disk: String,
    pub efi: PartitionSpec,
    pub swap: PartitionSpec,
    pub root: PartitionSpec,
    pub swap_size_mib: u64,
}

impl DiskLayout {
    /// Partitions in on-disk order.
    pub fn partitions(&self) -> [&PartitionSpec; 3] {
        [&self.efi, &self.swap, &self.root]
    }
}

/// Device node for partition `number` of `disk`.
///
/// NVMe namespaces and MMC cards end in a digit, so their partitions take a
/// `p` separator (`/dev/nvme0n1p1`, `/dev/mmcblk0p1`); SCSI-style disks take
/// the bare number (`/dev/sda1`).
pub fn partition_device(disk: &str, number: u32) -> String {
    let name = disk.rsplit('/').next().unwrap_or(disk);
    if name.contains("nvme") || name.contains("mmcblk") {
        format!("{}p{}", disk, number)
    } else {
        format!("{}{}", disk, number)
    }
}

/// Computes the layout for `disk` on a machine with `ram_kib` KiB of memory.
///
/// ```text
/// 1MiB      513MiB               513+swap MiB            100%
///  ├── EFI ───┼──── swap (= RAM) ────┼──────── root ────────┤
/// ```
///
/// Swap is sized to match RAM (`ram_kib / 1024`, rounded down). A machine
/// reporting less than 1MiB of RAM would yield a zero-width swap partition,
/// so that is rejected rather than defaulted.
pub fn plan(disk: &str, ram_kib: u64) -> Result<DiskLayout> {
    let swap_size_mib = ram_kib / 1024;
    if swap_size_mib == 0 {
        return Err(InstallerError::precondition(format!(
            "system memory of {} KiB is too small to size the swap partition",
            ram_kib
        )));
    }

    let efi_end = EFI_START_MIB + EFI_SIZE_MIB;
    let swap_end = efi_end + swap_size_mib;

    Ok(DiskLayout {
        disk: disk.to_string(),
        efi: PartitionSpec {
            number: EFI_PARTITION,
            device: partition_device(disk, EFI_PARTITION),
            start_mib: EFI_START_MIB,
            end: PartitionEnd::Mib(efi_end),
            parted_type: "fat32",
        },
        swap: PartitionSpec {
            number: SWAP_PARTITION,
            device: partition_device(disk, SWAP_PARTITION),
            start_mib: efi_end,
            end: PartitionEnd::Mib(swap_end),
            parted_type: "linux-swap",
        },
        root: PartitionSpec {
            number: ROOT_PARTITION,
            device: partition_device(disk, ROOT_PARTITION),
            start_mib: swap_end,
            end: PartitionEnd::Rest,
            parted_type: "",
        },
        swap_size_mib,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_device_sata() {
        assert_eq!(partition_device("/dev/sda", 1), "/dev/sda1");
        assert_eq!(partition_device("/dev/vdb", 3), "/dev/vdb3");
    }

    #[test]
    fn test_partition_device_nvme_and_mmc() {
        assert_eq!(partition_device("/dev/nvme0n1", 1), "/dev/nvme0n1p1");
        assert_eq!(partition_device("/dev/nvme0n1", 3), "/dev/nvme0n1p3");
        assert_eq!(partition_device("/dev/mmcblk0", 2), "/dev/mmcblk0p2");
    }

    #[test]
    fn test_plan_eight_gib() {
        let layout = plan("/dev/sda", 8_388_608).expect("valid ram");
        assert_eq!(layout.swap_size_mib, 8192);
        assert_eq!(layout.efi.start_arg(), "1MiB");
        assert_eq!(layout.efi.end_arg(), "513MiB");
        assert_eq!(layout.swap.start_arg(), "513MiB");
        assert_eq!(layout.swap.end_arg(), "8705MiB");
        assert_eq!(layout.root.start_mib, 8705);
        assert_eq!(layout.root.end_arg(), "100%");
    }

    #[test]
    fn test_plan_names_follow_disk() {
        let layout = plan("/dev/nvme0n1", 4_194_304).expect("valid ram");
        let devices: Vec<&str> = layout.partitions().iter().map(|p| p.device.as_str()).collect();
        assert_eq!(devices, ["/dev/nvme0n1p1", "/dev/nvme0n1p2", "/dev/nvme0n1p3"]);

        let layout = plan("/dev/sda", 4_194_304).expect("valid ram");
        let devices: Vec<&str> = layout.partitions().iter().map(|p| p.device.as_str()).collect();
        assert_eq!(devices, ["/dev/sda1", "/dev/sda2", "/dev/sda3"]);
    }

    #[test]
    fn test_plan_truncates_fractional_mib() {
        let layout = plan("/dev/sda", 2047).expect("valid ram");
        assert_eq!(layout.swap_size_mib, 1);
    }

    #[test]
    fn test_plan_rejects_zero_ram() {
        assert!(matches!(plan("/dev/sda", 0), Err(InstallerError::Precondition(_))));
        assert!(matches!(plan("/dev/sda", 1023), Err(InstallerError::Precondition(_))));
    }
}
