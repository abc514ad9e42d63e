use console::style;
use tracing::info;

use crate::{
    cmd::CommandSpec,
    config::{InstallConfig, BASE_PACKAGES, EXTRA_PACKAGES},
    error::Result,
    steps::{ProvisioningStep, StepContext},
    ui,
};

// ── Base system ───────────────────────────────────────────────────────────────

/// Installs the base Arch packages, kernel and firmware via `pacstrap`.
pub struct InstallBase;

impl InstallBase {
    /// Base set plus the userspace tools for the chosen root filesystem.
    pub fn packages(config: &InstallConfig) -> Vec<&'static str> {
        let mut packages = BASE_PACKAGES.to_vec();
        packages.push(config.filesystem().support_package());
        packages
    }
}

impl ProvisioningStep for InstallBase {
    fn name(&self) -> &'static str {
        "install-base"
    }

    fn title(&self) -> &'static str {
        "Base System Installation"
    }

    fn run(&self, config: &InstallConfig, ctx: &StepContext<'_>) -> Result<()> {
        let packages = Self::packages(config);
        ui::print_info(&format!(
            "Installing {} into {}…",
            style(packages.join(" ")).cyan().bold(),
            ctx.target.root().display()
        ));

        ctx.runner.run(
            &CommandSpec::new("pacstrap")
                .args(["-K", ctx.target.root_arg().as_str()])
                .args(packages.iter().copied()),
        )?;

        info!(count = packages.len(), "base system installed");
        ui::print_success("Base system installed.");
        Ok(())
    }
}

// ── Extra packages ────────────────────────────────────────────────────────────

/// Installs the desktop and convenience packages and enables NetworkManager.
pub struct InstallPackages;

impl ProvisioningStep for InstallPackages {
    fn name(&self) -> &'static str {
        "install-packages"
    }

    fn title(&self) -> &'static str {
        "Additional Packages"
    }

    fn run(&self, _config: &InstallConfig, ctx: &StepContext<'_>) -> Result<()> {
        ui::print_info(&format!("Installing {} packages…", EXTRA_PACKAGES.len()));

        ctx.runner.run(
            &CommandSpec::chroot(ctx.target, "pacman")
                .args(["-S", "--noconfirm", "--needed"])
                .args(EXTRA_PACKAGES),
        )?;
        ctx.runner.run(
            &CommandSpec::chroot(ctx.target, "systemctl").args(["enable", "NetworkManager"]),
        )?;

        info!(count = EXTRA_PACKAGES.len(), "additional packages installed");
        ui::print_success("Additional packages installed, NetworkManager enabled.");
        Ok(())
    }
}
