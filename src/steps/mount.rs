use crate::{cmd::CommandSpec, error::Result, layout::DiskLayout, steps::StepContext, ui};

/// Mounts the new partitions under the target root.
///
/// Mount order:
///   1. Root  → /mnt
///   2. Create /mnt/boot
///   3. EFI   → /mnt/boot
///   4. Swap  → swapon
pub fn run(layout: &DiskLayout, ctx: &StepContext<'_>) -> Result<()> {
    let root = ctx.target.root_arg();
    let boot = ctx.target.boot().display().to_string();

    ctx.runner
        .run(&CommandSpec::new("mount").args([layout.root.device.as_str(), root.as_str()]))?;
    ui::print_success(&format!("{} mounted at {}.", layout.root.device, root));

    ctx.runner
        .run(&CommandSpec::new("mkdir").args(["-p", boot.as_str()]))?;

    ctx.runner
        .run(&CommandSpec::new("mount").args([layout.efi.device.as_str(), boot.as_str()]))?;
    ui::print_success(&format!("{} mounted at {}.", layout.efi.device, boot));

    ctx.runner
        .run(&CommandSpec::new("swapon").arg(layout.swap.device.as_str()))?;
    ui::print_success(&format!("Swap on {} activated.", layout.swap.device));

    Ok(())
}
