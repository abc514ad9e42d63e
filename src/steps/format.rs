use crate::{
    cmd::CommandSpec,
    config::FilesystemType,
    error::Result,
    layout::DiskLayout,
    steps::StepContext,
    ui,
};

/// Formats each partition: FAT32 (EFI), swap, and the chosen root filesystem.
pub fn run(layout: &DiskLayout, fs: FilesystemType, ctx: &StepContext<'_>) -> Result<()> {
    ctx.runner
        .run(&CommandSpec::new("mkfs.fat").args(["-F32", layout.efi.device.as_str()]))?;
    ui::print_success(&format!("{} formatted as FAT32 (EFI).", layout.efi.device));

    ctx.runner
        .run(&CommandSpec::new("mkswap").arg(layout.swap.device.as_str()))?;
    ui::print_success(&format!("{} initialised as swap.", layout.swap.device));

    let (mkfs, force) = fs.mkfs_command();
    ctx.runner
        .run(&CommandSpec::new(mkfs).args([force, layout.root.device.as_str()]))?;
    ui::print_success(&format!("{} formatted as {} (root).", layout.root.device, fs));

    Ok(())
}
