use console::style;
use dialoguer::{Confirm, Input, Password, Select};
use strum::IntoEnumIterator;

use crate::{
    cmd::{CommandRunner, CommandSpec},
    config::{FilesystemType, InstallConfig},
    error::{InstallerError, Result},
    lsblk,
    validation::{self, ValidationError},
    ui,
};

const DEFAULT_TIMEZONE: &str = "UTC";

/// Runs every prompt in order and returns the validated configuration.
///
/// `runner` is only used for read-only queries (`lsblk`, `timedatectl`).
pub fn collect(runner: &dyn CommandRunner) -> Result<InstallConfig> {
    ui::print_heading("Target Disk");
    let disk = select_disk(runner)?;

    ui::print_heading("Timezone");
    let timezones = list_timezones(runner)?;
    let timezone = select_timezone(&timezones)?;

    ui::print_heading("User Account");
    let username = ask_username()?;
    let password = ask_password()?;

    ui::print_heading("Root Filesystem");
    let filesystem = select_filesystem()?;

    // The password was already confirmed interactively.
    let config = InstallConfig::new(disk, filesystem, timezone, username, &password, &password)?;
    Ok(config)
}

/// Shows the summary and the erase warning. Declining is `Cancelled`.
pub fn confirm(config: &InstallConfig) -> Result<()> {
    ui::clear_screen();
    ui::print_heading("Installation Summary");
    let filesystem = config.filesystem().to_string();
    ui::print_kv_box(
        "Summary",
        &[
            ("Disk", config.disk()),
            ("Timezone", config.timezone()),
            ("Username", config.username()),
            ("Filesystem", filesystem.as_str()),
        ],
    );
    println!();
    println!(
        "  {}",
        style(format!("⚠  ALL DATA ON {} WILL BE ERASED.", config.disk()))
            .red()
            .bold()
    );
    println!();

    if !Confirm::new()
        .with_prompt("Continue with the installation?")
        .default(false)
        .interact()?
    {
        return Err(InstallerError::Cancelled);
    }
    Ok(())
}

/// Offers a reboot once everything succeeded.
pub fn ask_reboot() -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt("Reboot now?")
        .default(true)
        .interact()?)
}

// ── Disk selection ────────────────────────────────────────────────────────────

fn select_disk(runner: &dyn CommandRunner) -> Result<String> {
    let disks = lsblk::list_disks(runner);

    if disks.is_empty() {
        // lsblk unavailable, fall back to manual input.
        ui::print_warning("Could not detect disks automatically.");
        let path: String = Input::new()
            .with_prompt("Enter disk path (e.g. /dev/sda)")
            .validate_with(|p: &String| {
                if p.starts_with("/dev/") {
                    Ok(())
                } else {
                    Err("Disk path must start with /dev/")
                }
            })
            .interact_text()?;
        return Ok(path);
    }

    ui::print_info("Use ↑ ↓ arrow keys to select the target disk, then press Enter.");
    println!(
        "  {:<14}  {:>8}   {}",
        style("DISK").dim(),
        style("SIZE").dim(),
        style("MODEL").dim()
    );
    println!("  {}", style("─".repeat(44)).dim());

    let labels: Vec<String> = disks.iter().map(|d| d.display()).collect();

    let idx = Select::new()
        .with_prompt("Target disk")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(disks[idx].path.clone())
}

// ── Timezone ──────────────────────────────────────────────────────────────────

fn list_timezones(runner: &dyn CommandRunner) -> Result<Vec<String>> {
    let out = runner.run(&CommandSpec::new("timedatectl").arg("list-timezones"))?;
    let zones: Vec<String> = out
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    if zones.is_empty() {
        return Err(InstallerError::precondition("timedatectl returned no timezones"));
    }
    Ok(zones)
}

fn select_timezone(timezones: &[String]) -> Result<String> {
    let modes = ["Type a timezone (e.g. Europe/Moscow)", "Pick from the full list"];
    let mode = Select::new()
        .with_prompt("How do you want to choose the timezone?")
        .items(&modes)
        .default(0)
        .interact()?;

    if mode == 1 {
        let default = timezones
            .iter()
            .position(|t| t == DEFAULT_TIMEZONE)
            .unwrap_or(0);
        let idx = Select::new()
            .with_prompt("Timezone")
            .items(timezones)
            .default(default)
            .max_length(15)
            .interact()?;
        return Ok(timezones[idx].clone());
    }

    let tz: String = Input::new()
        .with_prompt("Timezone")
        .default(DEFAULT_TIMEZONE.to_string())
        .validate_with(|t: &String| validation::validate_timezone(t.trim(), timezones))
        .interact_text()?;
    Ok(tz.trim().to_string())
}

// ── User account ──────────────────────────────────────────────────────────────

fn ask_username() -> Result<String> {
    let name: String = Input::new()
        .with_prompt("Username")
        .validate_with(|n: &String| validation::validate_username(n.trim()))
        .interact_text()?;
    Ok(name.trim().to_string())
}

/// Asks twice until both entries are non-empty and identical.
fn ask_password() -> Result<String> {
    loop {
        let password = Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()?;
        if let Err(e) = validation::validate_password(&password) {
            ui::print_warning(&e.to_string());
            continue;
        }

        let confirmation = Password::new()
            .with_prompt("Confirm password")
            .allow_empty_password(true)
            .interact()?;

        match validation::check_password_pair(&password, &confirmation) {
            Ok(()) => return Ok(password),
            Err(ValidationError::PasswordMismatch) => {
                ui::print_warning("Passwords do not match. Try again.");
            }
            Err(e) => ui::print_warning(&e.to_string()),
        }
    }
}

// ── Filesystem ────────────────────────────────────────────────────────────────

fn select_filesystem() -> Result<FilesystemType> {
    let choices: Vec<FilesystemType> = FilesystemType::iter().collect();
    let labels: Vec<&str> = choices.iter().map(|f| f.display_name()).collect();

    let idx = Select::new()
        .with_prompt("Root filesystem")
        .items(&labels)
        .default(0)
        .interact()?;

    let fs = choices[idx];
    ui::print_info(&format!("Selected: {}", fs));
    Ok(fs)
}
