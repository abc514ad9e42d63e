use tracing::info;

use crate::{
    cmd::CommandSpec,
    config::InstallConfig,
    error::{InstallerError, Result},
    host::HostProbe,
    layout::{self, DiskLayout},
    steps::{format, mount, ProvisioningStep, StepContext},
    ui,
};

/// Wipes the disk, writes the EFI/swap/root GPT layout, formats and mounts it.
pub struct Partition;

impl ProvisioningStep for Partition {
    fn name(&self) -> &'static str {
        "partition"
    }

    fn title(&self) -> &'static str {
        "Disk Partitioning"
    }

    fn run(&self, config: &InstallConfig, ctx: &StepContext<'_>) -> Result<()> {
        let disk = config.disk();
        ensure_disk_idle(disk, ctx.host)?;

        let ram_kib = ctx.host.mem_total_kib()?;
        let layout = layout::plan(disk, ram_kib)?;
        info!(
            disk,
            swap_mib = layout.swap_size_mib,
            root_start_mib = layout.root.start_mib,
            "planned disk layout"
        );
        show_layout(&layout);

        write_table(&layout, ctx)?;
        ui::print_success(&format!("Partition table written to {}.", disk));

        format::run(&layout, config.filesystem(), ctx)?;
        mount::run(&layout, ctx)?;
        Ok(())
    }
}

/// Refuses to touch a disk that has any mounted partition or active swap.
fn ensure_disk_idle(disk: &str, host: &dyn HostProbe) -> Result<()> {
    if let Some(dev) = host.busy_devices()?.into_iter().find(|d| belongs_to(d, disk)) {
        return Err(InstallerError::precondition(format!(
            "{} is in use ({} is mounted or active swap)",
            disk, dev
        )));
    }
    Ok(())
}

/// `true` for the disk itself and for `<disk>N` / `<disk>pN`.
fn belongs_to(device: &str, disk: &str) -> bool {
    let Some(rest) = device.strip_prefix(disk) else {
        return false;
    };
    let digits = rest.strip_prefix('p').unwrap_or(rest);
    rest.is_empty() || (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

fn show_layout(layout: &DiskLayout) {
    let efi = format!("{}  {} → {}", layout.efi.device, layout.efi.start_arg(), layout.efi.end_arg());
    let swap = format!("{}  {} MiB", layout.swap.device, layout.swap_size_mib);
    let root = format!("{}  {} → {}", layout.root.device, layout.root.start_arg(), layout.root.end_arg());

    println!();
    ui::print_kv_box(
        "Partition Layout",
        &[
            ("EFI  (FAT32)", efi.as_str()),
            ("Swap", swap.as_str()),
            ("Root", root.as_str()),
        ],
    );
    println!();
}

fn write_table(layout: &DiskLayout, ctx: &StepContext<'_>) -> Result<()> {
    let parted = || CommandSpec::new("parted").arg("-s").arg(layout.disk.as_str());

    ctx.runner.run(&parted().args(["mklabel", "gpt"]))?;

    for part in layout.partitions() {
        let mut mkpart = parted().args(["mkpart", "primary"]);
        if !part.parted_type.is_empty() {
            mkpart = mkpart.arg(part.parted_type);
        }
        ctx.runner.run(&mkpart.arg(part.start_arg()).arg(part.end_arg()))?;

        if part.number == layout.efi.number {
            ctx.runner.run(
                &parted()
                    .arg("set")
                    .arg(part.number.to_string())
                    .args(["esp", "on"]),
            )?;
        }
    }
    Ok(())
}
