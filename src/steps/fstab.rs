use crate::{
    cmd::CommandSpec,
    error::Result,
    steps::{append_file, StepContext},
    ui,
};

/// Appends UUID-based entries for everything mounted under the target to its
/// `etc/fstab`.
///
/// Equivalent to: `genfstab -U /mnt >> /mnt/etc/fstab`
pub fn generate(ctx: &StepContext<'_>) -> Result<()> {
    let fstab = ctx.target.path("etc/fstab");
    let out = ctx
        .runner
        .run(&CommandSpec::new("genfstab").args(["-U", ctx.target.root_arg().as_str()]))?;

    let mut entries = out.stdout;
    if !entries.is_empty() {
        entries.push('\n');
    }
    append_file(&fstab, &entries)?;

    ui::print_success(&format!("fstab written to {}.", fstab.display()));
    Ok(())
}
