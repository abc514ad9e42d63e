use tracing::info;

use crate::{
    cmd::CommandSpec,
    config::{
        FilesystemType, InstallConfig, BOOT_ENTRY, FQDN, HOSTNAME, LANG, LOADER_TIMEOUT_SECS,
        LOCALES, NETWORK_SERVICES,
    },
    error::{InstallerError, Result},
    steps::{append_file, fstab, write_file, ProvisioningStep, StepContext},
    ui,
};

/// Uncomments the wheel rule in `/etc/sudoers`, with or without the
/// `(ALL:ALL)` runas group form.
const SUDOERS_WHEEL_SED: &str = r"s/^# \(%wheel ALL=(ALL\(:ALL\)\?) ALL\)$/\1/";

/// Turns the freshly installed tree into a bootable, loggable-in system:
/// fstab, clock, locale, identity, accounts, boot loader and networking.
pub struct Configure;

impl ProvisioningStep for Configure {
    fn name(&self) -> &'static str {
        "configure"
    }

    fn title(&self) -> &'static str {
        "System Configuration"
    }

    fn run(&self, config: &InstallConfig, ctx: &StepContext<'_>) -> Result<()> {
        fstab::generate(ctx)?;
        set_clock(config.timezone(), ctx)?;
        set_locale(ctx)?;
        set_identity(ctx)?;
        create_accounts(config, ctx)?;
        install_boot_loader(config.filesystem(), ctx)?;
        enable_networking(ctx)?;
        Ok(())
    }
}

// ── File contents ─────────────────────────────────────────────────────────────

pub fn locale_gen_lines() -> String {
    LOCALES.iter().map(|l| format!("{}\n", l)).collect()
}

pub fn locale_conf() -> String {
    format!("LANG={}\n", LANG)
}

pub fn hostname_file() -> String {
    format!("{}\n", HOSTNAME)
}

pub fn hosts_file() -> String {
    format!(
        "127.0.0.1\tlocalhost\n::1\t\tlocalhost\n127.0.1.1\t{}\t{}\n",
        FQDN, HOSTNAME
    )
}

pub fn loader_conf() -> String {
    format!(
        "default {}\ntimeout {}\neditor no\n",
        BOOT_ENTRY, LOADER_TIMEOUT_SECS
    )
}

pub fn boot_entry(fs: FilesystemType, root_uuid: &str) -> String {
    format!(
        "title Arch Linux\nlinux /vmlinuz-linux\ninitrd /{}\noptions root=UUID={} rw\n",
        fs.initramfs_image(),
        root_uuid
    )
}

// ── Configuration stages ──────────────────────────────────────────────────────

fn set_clock(timezone: &str, ctx: &StepContext<'_>) -> Result<()> {
    let zoneinfo = format!("/usr/share/zoneinfo/{}", timezone);
    ctx.runner.run(
        &CommandSpec::chroot(ctx.target, "ln").args(["-sf", zoneinfo.as_str(), "/etc/localtime"]),
    )?;
    ctx.runner
        .run(&CommandSpec::chroot(ctx.target, "hwclock").arg("--systohc"))?;
    ui::print_success(&format!("Timezone set to {}.", timezone));
    Ok(())
}

fn set_locale(ctx: &StepContext<'_>) -> Result<()> {
    append_file(&ctx.target.path("etc/locale.gen"), &locale_gen_lines())?;
    ctx.runner.run(&CommandSpec::chroot(ctx.target, "locale-gen"))?;
    write_file(&ctx.target.path("etc/locale.conf"), &locale_conf())?;
    ui::print_success("Locales generated.");
    Ok(())
}

fn set_identity(ctx: &StepContext<'_>) -> Result<()> {
    write_file(&ctx.target.path("etc/hostname"), &hostname_file())?;
    write_file(&ctx.target.path("etc/hosts"), &hosts_file())?;
    ui::print_success(&format!("Hostname set to {}.", HOSTNAME));
    Ok(())
}

fn set_password(user: &str, password: &str, ctx: &StepContext<'_>) -> Result<()> {
    ctx.runner.run(
        &CommandSpec::chroot(ctx.target, "chpasswd").stdin(format!("{}:{}\n", user, password)),
    )?;
    Ok(())
}

fn create_accounts(config: &InstallConfig, ctx: &StepContext<'_>) -> Result<()> {
    let password = config.password().expose();
    set_password("root", password, ctx)?;

    let user = config.username();
    ctx.runner.run(
        &CommandSpec::chroot(ctx.target, "useradd").args(["-m", "-G", "wheel", "-s", "/bin/bash", user]),
    )?;
    set_password(user, password, ctx)?;

    ctx.runner.run(
        &CommandSpec::chroot(ctx.target, "sed").args(["-i", SUDOERS_WHEEL_SED, "/etc/sudoers"]),
    )?;
    info!(user, "created administrative user");
    ui::print_success(&format!("User '{}' created with sudo rights.", user));
    Ok(())
}

/// Resolves the filesystem UUID of whatever is mounted at the target root.
fn root_uuid(ctx: &StepContext<'_>) -> Result<String> {
    let source = ctx.runner.run(
        &CommandSpec::new("findmnt").args(["-n", "-o", "SOURCE", ctx.target.root_arg().as_str()]),
    )?;
    // btrfs reports `/dev/sda3[/subvol]`.
    let device = source.stdout.split('[').next().unwrap_or_default().trim().to_string();
    if device.is_empty() {
        return Err(InstallerError::precondition(format!(
            "nothing is mounted at {}",
            ctx.target.root().display()
        )));
    }

    let uuid = ctx
        .runner
        .run(&CommandSpec::new("blkid").args(["-s", "UUID", "-o", "value", device.as_str()]))?
        .stdout;
    if uuid.is_empty() {
        return Err(InstallerError::precondition(format!(
            "blkid returned no UUID for {}",
            device
        )));
    }
    Ok(uuid)
}

fn install_boot_loader(fs: FilesystemType, ctx: &StepContext<'_>) -> Result<()> {
    ctx.runner
        .run(&CommandSpec::chroot(ctx.target, "bootctl").arg("install"))?;

    write_file(&ctx.target.path("boot/loader/loader.conf"), &loader_conf())?;

    let uuid = root_uuid(ctx)?;
    let entry = ctx.target.path(&format!("boot/loader/entries/{}", BOOT_ENTRY));
    write_file(&entry, &boot_entry(fs, &uuid))?;

    info!(root_uuid = %uuid, initrd = fs.initramfs_image(), "boot entry written");
    ui::print_success("systemd-boot installed.");
    Ok(())
}

fn enable_networking(ctx: &StepContext<'_>) -> Result<()> {
    ctx.runner.run(
        &CommandSpec::chroot(ctx.target, "systemctl")
            .arg("enable")
            .args(NETWORK_SERVICES),
    )?;
    ui::print_success("Networking services enabled.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosts_file_has_three_records() {
        let hosts = hosts_file();
        let lines: Vec<&str> = hosts.lines().collect();
        assert_eq!(
            lines,
            [
                "127.0.0.1\tlocalhost",
                "::1\t\tlocalhost",
                "127.0.1.1\tarchlinux.localdomain\tarchlinux",
            ]
        );
    }

    #[test]
    fn test_loader_conf() {
        assert_eq!(loader_conf(), "default arch.conf\ntimeout 3\neditor no\n");
    }

    #[test]
    fn test_boot_entry_initrd_per_filesystem() {
        let btrfs = boot_entry(FilesystemType::Btrfs, "abcd-1234");
        assert!(btrfs.contains("initrd /initramfs-linux-btrfs.img\n"));
        assert!(btrfs.ends_with("options root=UUID=abcd-1234 rw\n"));

        let ext4 = boot_entry(FilesystemType::Ext4, "abcd-1234");
        assert!(ext4.contains("initrd /initramfs-linux.img\n"));
        assert!(ext4.starts_with("title Arch Linux\nlinux /vmlinuz-linux\n"));
    }

    #[test]
    fn test_locale_contents() {
        assert_eq!(locale_gen_lines(), "en_US.UTF-8 UTF-8\nru_RU.UTF-8 UTF-8\n");
        assert_eq!(locale_conf(), "LANG=en_US.UTF-8\n");
        assert_eq!(hostname_file(), "archlinux\n");
    }
}
